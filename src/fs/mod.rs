mod dir;

pub use dir::FsDirectory;
