//! A minimal Unix-style filesystem engine over a fixed-size block device
//! image: a superblock, two bitmaps, an inode region, and a data region,
//! with all mutating operations wrapped in disk transactions.

pub mod disk;
pub mod engine;
pub mod error;
pub mod layout;

pub use disk::Disk;
pub use engine::Engine;
pub use error::UfsError;
