//! The engine's fixed error taxonomy.

use std::io;
use thiserror::Error;

/// Errors returned by `ufs::engine::Engine` operations.
///
/// These mirror the source's fixed set of negative error codes, one variant
/// per code, plus `Io` for device-level failures the source did not model
/// (it aborted the process on a failed disk read/write instead).
#[derive(Debug, Error)]
pub enum UfsError {
	#[error("invalid inode")]
	InvalidInode,
	#[error("invalid size")]
	InvalidSize,
	#[error("invalid name")]
	InvalidName,
	#[error("invalid type")]
	InvalidType,
	#[error("inode not allocated")]
	NotAllocated,
	#[error("cannot write to a directory")]
	WriteToDir,
	#[error("not enough space")]
	NotEnoughSpace,
	#[error("not found")]
	NotFound,
	#[error("directory not empty")]
	DirNotEmpty,
	#[error("I/O error: {0}")]
	Io(#[from] io::Error),
}
