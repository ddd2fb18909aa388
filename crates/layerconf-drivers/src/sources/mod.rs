pub mod dir;
pub mod env;
pub mod file;
pub mod observable_file;
pub mod observable_rest;
pub mod rest;

pub use dir::DirSource;
pub use env::EnvSource;
pub use file::FileSource;
pub use observable_file::ObservableFileSource;
pub use observable_rest::ObservableRestSource;
pub use rest::RestSource;
