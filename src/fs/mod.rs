//! FileSystem abstraction so compose files can be parsed from memory in tests

mod mock;
mod real;
mod r#trait;

pub use mock::MockFileSystem;
pub use r#trait::FileSystem;
pub use real::RealFileSystem;
