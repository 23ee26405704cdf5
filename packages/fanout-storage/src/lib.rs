//! Durable tier of the result cache: one framed file per key on local disk.

pub mod disk;
pub mod frame;

mod error;

pub use disk::{DiskStore, StoredEntry};
pub use error::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;
