//! The block device: a fixed-size block array backed by a file, with a
//! transactional write buffer layered on top.

use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

/// Presents an image file as an array of fixed-size blocks, with a
/// transaction bracket (`begin_transaction`/`commit`/`rollback`).
pub struct Disk {
	file: File,
	block_size: usize,
	/// Buffered writes since the last `begin_transaction`, keyed by block index.
	/// `None` when no transaction is open.
	buffer: Option<BTreeMap<u64, Vec<u8>>>,
}

impl Disk {
	/// Opens the image file at `path` for read/write access.
	pub fn open<P: AsRef<Path>>(path: P, block_size: usize) -> io::Result<Self> {
		let file = OpenOptions::new().read(true).write(true).open(path)?;
		Ok(Self {
			file,
			block_size,
			buffer: None,
		})
	}

	pub fn block_size(&self) -> usize {
		self.block_size
	}

	fn check_range(&self, idx: u64) -> io::Result<()> {
		let len = self.file.metadata()?.len();
		if (idx + 1) * self.block_size as u64 > len {
			return Err(io::Error::new(io::ErrorKind::InvalidInput, "block index out of range"));
		}
		Ok(())
	}

	/// Returns the current logical contents of block `idx`: the buffered value if
	/// written since `begin_transaction`, otherwise the on-disk value.
	pub fn read_block(&mut self, idx: u64) -> io::Result<Vec<u8>> {
		if let Some(buf) = self.buffer.as_ref().and_then(|b| b.get(&idx)) {
			return Ok(buf.clone());
		}
		self.check_range(idx)?;
		let mut block = vec![0u8; self.block_size];
		self.file.seek(SeekFrom::Start(idx * self.block_size as u64))?;
		self.file.read_exact(&mut block)?;
		Ok(block)
	}

	/// Buffers a write to block `idx`. Fails only if `idx` is out of range.
	pub fn write_block(&mut self, idx: u64, bytes: &[u8]) -> io::Result<()> {
		assert_eq!(bytes.len(), self.block_size, "write_block requires a whole block");
		self.check_range(idx)?;
		match self.buffer.as_mut() {
			Some(buf) => {
				buf.insert(idx, bytes.to_vec());
			}
			None => {
				// No open transaction: write through immediately.
				self.file.seek(SeekFrom::Start(idx * self.block_size as u64))?;
				self.file.write_all(bytes)?;
			}
		}
		Ok(())
	}

	/// Opens a buffering scope. Nested begins are not permitted.
	pub fn begin_transaction(&mut self) {
		assert!(self.buffer.is_none(), "begin_transaction called with a transaction already open");
		self.buffer = Some(BTreeMap::new());
	}

	/// Flushes all buffered writes to the backing file, each exactly once, then
	/// clears the buffer.
	pub fn commit(&mut self) -> io::Result<()> {
		let buffer = self.buffer.take().unwrap_or_default();
		for (idx, bytes) in buffer {
			self.file.seek(SeekFrom::Start(idx * self.block_size as u64))?;
			self.file.write_all(&bytes)?;
		}
		self.file.flush()
	}

	/// Discards the buffer without touching the file.
	pub fn rollback(&mut self) {
		self.buffer = None;
	}

	/// Whether a transaction is currently open.
	pub fn in_transaction(&self) -> bool {
		self.buffer.is_some()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::fs::OpenOptions as StdOpenOptions;
	use std::sync::atomic::{AtomicU64, Ordering};

	static COUNTER: AtomicU64 = AtomicU64::new(0);

	fn temp_image(blocks: usize, block_size: usize) -> std::path::PathBuf {
		let n = COUNTER.fetch_add(1, Ordering::Relaxed);
		let path = std::env::temp_dir().join(format!("ufs-disk-test-{}-{}.img", std::process::id(), n));
		let file = StdOpenOptions::new()
			.create(true)
			.write(true)
			.truncate(true)
			.open(&path)
			.unwrap();
		file.set_len((blocks * block_size) as u64).unwrap();
		path
	}

	#[test]
	fn read_uninitialized_block_is_zero() {
		let path = temp_image(4, 512);
		let mut disk = Disk::open(&path, 512).unwrap();
		let block = disk.read_block(1).unwrap();
		assert!(block.iter().all(|&b| b == 0));
	}

	#[test]
	fn write_without_transaction_is_immediate() {
		let path = temp_image(4, 512);
		let mut disk = Disk::open(&path, 512).unwrap();
		let data = vec![7u8; 512];
		disk.write_block(0, &data).unwrap();
		drop(disk);

		let mut disk2 = Disk::open(&path, 512).unwrap();
		assert_eq!(disk2.read_block(0).unwrap(), data);
	}

	#[test]
	fn rollback_discards_buffered_writes() {
		let path = temp_image(4, 512);
		let mut disk = Disk::open(&path, 512).unwrap();
		let before = disk.read_block(2).unwrap();

		disk.begin_transaction();
		disk.write_block(2, &vec![9u8; 512]).unwrap();
		assert_eq!(disk.read_block(2).unwrap(), vec![9u8; 512]);
		disk.rollback();

		assert_eq!(disk.read_block(2).unwrap(), before);
	}

	#[test]
	fn commit_publishes_all_buffered_writes() {
		let path = temp_image(4, 512);
		let mut disk = Disk::open(&path, 512).unwrap();

		disk.begin_transaction();
		disk.write_block(0, &vec![1u8; 512]).unwrap();
		disk.write_block(3, &vec![2u8; 512]).unwrap();
		disk.commit().unwrap();

		let mut disk2 = Disk::open(&path, 512).unwrap();
		assert_eq!(disk2.read_block(0).unwrap(), vec![1u8; 512]);
		assert_eq!(disk2.read_block(3).unwrap(), vec![2u8; 512]);
	}

	#[test]
	#[should_panic]
	fn nested_transactions_panic() {
		let path = temp_image(2, 512);
		let mut disk = Disk::open(&path, 512).unwrap();
		disk.begin_transaction();
		disk.begin_transaction();
	}

	#[test]
	fn out_of_range_block_fails() {
		let path = temp_image(2, 512);
		let mut disk = Disk::open(&path, 512).unwrap();
		assert!(disk.read_block(5).is_err());
		assert!(disk.write_block(5, &vec![0u8; 512]).is_err());
	}
}
