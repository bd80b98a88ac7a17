//! The filesystem engine: operations over the on-disk layout.
//!
//! The engine borrows a [`Disk`] and never opens a transaction itself —
//! callers bracket mutating operations with `begin_transaction`/`commit`/
//! `rollback`, the same boundary the CLI front-ends in this workspace use.

use crate::disk::Disk;
use crate::error::UfsError;
use crate::layout::{
	BitmapViewMut, DirEntry, Inode, InodeType, Superblock, BLOCK_SIZE, DIRECT_PTRS,
	DIR_ENT_NAME_SIZE, FORBIDDEN_NAME_CHARS,
};

/// Borrows a [`Disk`] and interprets its contents as a UFS-style image.
pub struct Engine<'a> {
	disk: &'a mut Disk,
}

impl<'a> Engine<'a> {
	pub fn new(disk: &'a mut Disk) -> Self {
		Self { disk }
	}

	fn read_superblock(&mut self) -> Result<Superblock, UfsError> {
		let block = self.disk.read_block(0)?;
		let buf: [u8; BLOCK_SIZE] = block.try_into().expect("block has the device's block size");
		Ok(Superblock::decode(&buf))
	}

	fn read_bitmap(&mut self, addr: u32, len: u32) -> Result<Vec<u8>, UfsError> {
		let mut bytes = Vec::with_capacity(len as usize * BLOCK_SIZE);
		for i in 0..len as u64 {
			bytes.extend(self.disk.read_block(addr as u64 + i)?);
		}
		Ok(bytes)
	}

	fn write_bitmap(&mut self, addr: u32, len: u32, bytes: &[u8]) -> Result<(), UfsError> {
		for i in 0..len as u64 {
			let off = i as usize * BLOCK_SIZE;
			self.disk.write_block(addr as u64 + i, &bytes[off..off + BLOCK_SIZE])?;
		}
		Ok(())
	}

	fn read_inode_bitmap(&mut self, sb: &Superblock) -> Result<Vec<u8>, UfsError> {
		self.read_bitmap(sb.inode_bitmap_addr, sb.inode_bitmap_len)
	}

	fn write_inode_bitmap(&mut self, sb: &Superblock, bytes: &[u8]) -> Result<(), UfsError> {
		self.write_bitmap(sb.inode_bitmap_addr, sb.inode_bitmap_len, bytes)
	}

	fn read_data_bitmap(&mut self, sb: &Superblock) -> Result<Vec<u8>, UfsError> {
		self.read_bitmap(sb.data_bitmap_addr, sb.data_bitmap_len)
	}

	fn write_data_bitmap(&mut self, sb: &Superblock, bytes: &[u8]) -> Result<(), UfsError> {
		self.write_bitmap(sb.data_bitmap_addr, sb.data_bitmap_len, bytes)
	}

	/// Reads the inode record for `inum`, without consulting the inode bitmap.
	fn read_inode_raw(&mut self, sb: &Superblock, inum: u32) -> Result<Inode, UfsError> {
		let per_block = sb.inodes_per_block();
		let block_idx = sb.inode_region_addr as u64 + (inum as usize / per_block) as u64;
		let off = (inum as usize % per_block) * Inode::ENCODED_SIZE;
		let block = self.disk.read_block(block_idx)?;
		Ok(Inode::decode(&block[off..off + Inode::ENCODED_SIZE]))
	}

	fn write_inode_raw(&mut self, sb: &Superblock, inum: u32, inode: &Inode) -> Result<(), UfsError> {
		let per_block = sb.inodes_per_block();
		let block_idx = sb.inode_region_addr as u64 + (inum as usize / per_block) as u64;
		let off = (inum as usize % per_block) * Inode::ENCODED_SIZE;
		let mut block = self.disk.read_block(block_idx)?;
		block[off..off + Inode::ENCODED_SIZE].copy_from_slice(&inode.encode());
		self.disk.write_block(block_idx, &block)?;
		Ok(())
	}

	/// Reads the superblock. Exposed for CLI front-ends that report raw
	/// layout fields (e.g. `bits`) and have no other reason to reach into
	/// `ufs::layout` directly.
	pub fn superblock(&mut self) -> Result<Superblock, UfsError> {
		self.read_superblock()
	}

	/// Reads the full inode bitmap, `inode_bitmap_len` blocks starting at
	/// `inode_bitmap_addr`.
	pub fn inode_bitmap(&mut self) -> Result<Vec<u8>, UfsError> {
		let sb = self.read_superblock()?;
		self.read_inode_bitmap(&sb)
	}

	/// Reads the full data bitmap, `data_bitmap_len` blocks starting at
	/// `data_bitmap_addr`.
	pub fn data_bitmap(&mut self) -> Result<Vec<u8>, UfsError> {
		let sb = self.read_superblock()?;
		self.read_data_bitmap(&sb)
	}

	/// spec §4.2 `stat`.
	pub fn stat(&mut self, inode_no: u32) -> Result<Inode, UfsError> {
		let sb = self.read_superblock()?;
		if inode_no >= sb.num_inodes {
			return Err(UfsError::InvalidInode);
		}
		let inode = self.read_inode_raw(&sb, inode_no)?;
		if inode.ty().is_none() {
			return Err(UfsError::InvalidInode);
		}
		Ok(inode)
	}

	/// spec §4.2 `lookup`. Resolves `stat` first, then validates `type` —
	/// the corrected ordering noted in spec.md §9 (the source's own `lookup`
	/// checks an uninitialized `type` field before calling `stat`).
	pub fn lookup(&mut self, parent_inode_no: u32, name: &str) -> Result<u32, UfsError> {
		let parent = self.stat(parent_inode_no)?;
		if parent.ty() != Some(InodeType::Directory) {
			return Err(UfsError::InvalidInode);
		}
		let payload = self.read(parent_inode_no, parent.size as i64)?;
		for chunk in payload.chunks_exact(DirEntry::ENCODED_SIZE) {
			let entry = DirEntry::decode(chunk);
			if !entry.is_tombstone() && entry.name_bytes() == name.as_bytes() {
				return Ok(entry.inum as u32);
			}
		}
		Err(UfsError::NotFound)
	}

	/// spec §4.2 `read`.
	pub fn read(&mut self, inode_no: u32, size: i64) -> Result<Vec<u8>, UfsError> {
		if size < 0 {
			return Err(UfsError::InvalidSize);
		}
		let inode = self.stat(inode_no)?;
		let to_read = (size as usize).min(inode.size as usize);

		let mut out = Vec::with_capacity(to_read);
		let mut block_idx = 0;
		while out.len() < to_read && block_idx < DIRECT_PTRS {
			let addr = inode.direct[block_idx];
			if addr == 0 {
				break;
			}
			let block = self.disk.read_block(addr as u64)?;
			let remaining = to_read - out.len();
			let take = remaining.min(BLOCK_SIZE);
			out.extend_from_slice(&block[..take]);
			block_idx += 1;
		}
		Ok(out)
	}

	/// spec §4.2 `write`.
	pub fn write(&mut self, inode_no: u32, buf: &[u8], size: i64) -> Result<i64, UfsError> {
		if size < 0 {
			return Err(UfsError::InvalidSize);
		}
		let size = size as usize;
		debug_assert!(buf.len() >= size, "caller must supply at least `size` bytes");

		let sb = self.read_superblock()?;
		if inode_no >= sb.num_inodes {
			return Err(UfsError::InvalidInode);
		}
		let inode_bitmap = self.read_inode_bitmap(&sb)?;
		if !bitmap_get(&inode_bitmap, inode_no as usize) {
			return Err(UfsError::NotAllocated);
		}
		let mut inode = self.read_inode_raw(&sb, inode_no)?;
		if inode.ty() != Some(InodeType::RegularFile) {
			return Err(UfsError::WriteToDir);
		}
		let required_blocks = size.div_ceil(BLOCK_SIZE);
		if required_blocks > DIRECT_PTRS {
			return Err(UfsError::InvalidSize);
		}

		let current_blocks = Inode::blocks_for_size(inode.size);
		let mut data_bitmap = self.read_data_bitmap(&sb)?;

		if required_blocks > current_blocks {
			let mut newly_allocated = Vec::new();
			{
				let mut view = BitmapViewMut::new(&mut data_bitmap);
				for _ in current_blocks..required_blocks {
					let Some(bit) = view.first_clear(sb.num_data as usize) else {
						return Err(UfsError::NotEnoughSpace);
					};
					view.set(bit, true);
					newly_allocated.push(bit);
				}
			}
			for (slot, bit) in (current_blocks..required_blocks).zip(newly_allocated) {
				inode.direct[slot] = sb.data_region_addr + bit as u32;
			}
		} else if required_blocks < current_blocks {
			let mut view = BitmapViewMut::new(&mut data_bitmap);
			for slot in required_blocks..current_blocks {
				let addr = inode.direct[slot];
				if addr != 0 {
					let bit = (addr - sb.data_region_addr) as usize;
					view.set(bit, false);
				}
				inode.direct[slot] = 0;
			}
		}

		self.write_data_bitmap(&sb, &data_bitmap)?;

		for i in 0..required_blocks {
			let mut block = [0u8; BLOCK_SIZE];
			let start = i * BLOCK_SIZE;
			let take = (size - start).min(BLOCK_SIZE);
			block[..take].copy_from_slice(&buf[start..start + take]);
			self.disk.write_block(inode.direct[i] as u64, &block)?;
		}

		inode.size = size as u32;
		self.write_inode_raw(&sb, inode_no, &inode)?;

		Ok(size as i64)
	}

	fn validate_name(name: &str) -> Result<(), UfsError> {
		if name.len() >= DIR_ENT_NAME_SIZE || name.chars().any(|c| FORBIDDEN_NAME_CHARS.contains(&c)) {
			return Err(UfsError::InvalidName);
		}
		Ok(())
	}

	/// Writes `bytes` at byte offset `payload_offset` within `inode`'s direct
	/// blocks, without allocating new blocks or consulting block boundaries —
	/// matches the source's behavior for directory-entry appends (spec.md §4.2
	/// step 5, §9).
	fn write_into_direct_blocks(&mut self, inode: &Inode, payload_offset: usize, bytes: &[u8]) -> Result<(), UfsError> {
		let block_index = payload_offset / BLOCK_SIZE;
		let offset_in_block = payload_offset % BLOCK_SIZE;
		let addr = inode.direct[block_index];
		let mut block = self.disk.read_block(addr as u64)?;
		block[offset_in_block..offset_in_block + bytes.len()].copy_from_slice(bytes);
		self.disk.write_block(addr as u64, &block)?;
		Ok(())
	}

	/// spec §4.2 `create`.
	pub fn create(&mut self, parent_inode_no: u32, ty: InodeType, name: &str) -> Result<u32, UfsError> {
		let parent = self.stat(parent_inode_no)?;
		if parent.ty() != Some(InodeType::Directory) {
			return Err(UfsError::InvalidInode);
		}
		Self::validate_name(name)?;

		match self.lookup(parent_inode_no, name) {
			Ok(existing_inum) => {
				let existing = self.stat(existing_inum)?;
				return if existing.ty() == Some(ty) {
					Ok(existing_inum)
				} else {
					Err(UfsError::InvalidType)
				};
			}
			Err(UfsError::NotFound) => {}
			Err(e) => return Err(e),
		}

		let sb = self.read_superblock()?;

		// 1. Allocate a new inode number.
		let mut inode_bitmap = self.read_inode_bitmap(&sb)?;
		let new_inum = {
			let mut view = BitmapViewMut::new(&mut inode_bitmap);
			let bit = view.first_clear(sb.num_inodes as usize).ok_or(UfsError::NotEnoughSpace)?;
			view.set(bit, true);
			bit as u32
		};
		self.write_inode_bitmap(&sb, &inode_bitmap)?;

		// 2. Initialize the new inode.
		let mut new_inode = Inode::new(ty);
		if ty == InodeType::Directory {
			new_inode.size = 2 * DirEntry::ENCODED_SIZE as u32;
		}

		// 3. For a directory, allocate one data block and populate `.`/`..`.
		if ty == InodeType::Directory {
			let mut data_bitmap = self.read_data_bitmap(&sb)?;
			let bit = {
				let mut view = BitmapViewMut::new(&mut data_bitmap);
				let bit = view.first_clear(sb.num_data as usize).ok_or(UfsError::NotEnoughSpace)?;
				view.set(bit, true);
				bit
			};
			self.write_data_bitmap(&sb, &data_bitmap)?;

			let addr = sb.data_region_addr + bit as u32;
			let mut block = [0u8; BLOCK_SIZE];
			block[0..DirEntry::ENCODED_SIZE].copy_from_slice(&DirEntry::new(".", new_inum).encode());
			block[DirEntry::ENCODED_SIZE..2 * DirEntry::ENCODED_SIZE]
				.copy_from_slice(&DirEntry::new("..", parent_inode_no).encode());
			self.disk.write_block(addr as u64, &block)?;

			new_inode.direct[0] = addr;
		}

		// 4. Persist the new inode.
		self.write_inode_raw(&sb, new_inum, &new_inode)?;

		// 5. Append a directory entry into the parent.
		let entry_bytes = DirEntry::new(name, new_inum).encode();
		self.write_into_direct_blocks(&parent, parent.size as usize, &entry_bytes)?;
		let mut parent = parent;
		parent.size += DirEntry::ENCODED_SIZE as u32;
		self.write_inode_raw(&sb, parent_inode_no, &parent)?;

		Ok(new_inum)
	}

	/// spec §4.2 `unlink`.
	pub fn unlink(&mut self, parent_inode_no: u32, name: &str) -> Result<(), UfsError> {
		let target_inum = self.lookup(parent_inode_no, name)?;
		if name == "." || name == ".." {
			return Err(UfsError::InvalidName);
		}

		let target = self.stat(target_inum)?;
		if target.ty() == Some(InodeType::Directory) {
			let payload = self.read(target_inum, target.size as i64)?;
			let live_entries = payload
				.chunks_exact(DirEntry::ENCODED_SIZE)
				.map(DirEntry::decode)
				.filter(|e| !e.is_tombstone())
				.count();
			if live_entries > 2 {
				return Err(UfsError::DirNotEmpty);
			}
		}

		let sb = self.read_superblock()?;

		// Free the target's data blocks.
		let mut data_bitmap = self.read_data_bitmap(&sb)?;
		{
			let mut view = BitmapViewMut::new(&mut data_bitmap);
			for addr in target.direct {
				if addr != 0 {
					view.set((addr - sb.data_region_addr) as usize, false);
				}
			}
		}
		self.write_data_bitmap(&sb, &data_bitmap)?;

		let freed_inode = Inode::default();
		self.write_inode_raw(&sb, target_inum, &freed_inode)?;

		let mut inode_bitmap = self.read_inode_bitmap(&sb)?;
		BitmapViewMut::new(&mut inode_bitmap).set(target_inum as usize, false);
		self.write_inode_bitmap(&sb, &inode_bitmap)?;

		// Tombstone the parent's directory entry, in place.
		let parent = self.stat(parent_inode_no)?;
		let payload = self.read(parent_inode_no, parent.size as i64)?;
		let offset = payload
			.chunks_exact(DirEntry::ENCODED_SIZE)
			.enumerate()
			.find_map(|(i, chunk)| {
				let entry = DirEntry::decode(chunk);
				(!entry.is_tombstone() && entry.name_bytes() == name.as_bytes())
					.then_some(i * DirEntry::ENCODED_SIZE)
			})
			.expect("lookup already confirmed this entry exists");
		self.write_into_direct_blocks(&parent, offset, &DirEntry::tombstone().encode())?;

		Ok(())
	}
}

fn bitmap_get(bytes: &[u8], i: usize) -> bool {
	(bytes[i / 8] & (1 << (i % 8))) != 0
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::layout::{BitmapViewMut, SUPERBLOCK_SIZE};
	use std::fs::OpenOptions;
	use std::sync::atomic::{AtomicU64, Ordering};

	static COUNTER: AtomicU64 = AtomicU64::new(0);

	/// Builds a tiny, fresh image by hand (mirroring what `mkfs-ufs` does) so
	/// engine tests do not depend on another crate in the workspace.
	fn fresh_image(num_inodes: u32, num_data: u32) -> Disk {
		let inode_bitmap_addr = 1u32;
		let inode_bitmap_len = 1u32;
		let data_bitmap_addr = 2u32;
		let data_bitmap_len = 1u32;
		let inode_region_addr = 3u32;
		let inode_region_len =
			(num_inodes as usize * Inode::ENCODED_SIZE).div_ceil(BLOCK_SIZE) as u32;
		let data_region_addr = inode_region_addr + inode_region_len;
		let data_region_len = num_data;
		let total_blocks = data_region_addr as u64 + data_region_len as u64;

		let n = COUNTER.fetch_add(1, Ordering::Relaxed);
		let path = std::env::temp_dir().join(format!("ufs-engine-test-{}-{}.img", std::process::id(), n));
		let file = OpenOptions::new()
			.create(true)
			.write(true)
			.truncate(true)
			.open(&path)
			.unwrap();
		file.set_len(total_blocks * BLOCK_SIZE as u64).unwrap();
		drop(file);

		let mut disk = Disk::open(&path, BLOCK_SIZE).unwrap();

		let sb = Superblock {
			inode_bitmap_addr,
			inode_bitmap_len,
			data_bitmap_addr,
			data_bitmap_len,
			inode_region_addr,
			inode_region_len,
			data_region_addr,
			data_region_len,
			num_inodes,
			num_data,
		};
		disk.write_block(0, &sb.encode()).unwrap();
		assert!(SUPERBLOCK_SIZE <= BLOCK_SIZE);

		// Inode bitmap: only the root inode is allocated.
		let mut inode_bitmap = vec![0u8; inode_bitmap_len as usize * BLOCK_SIZE];
		BitmapViewMut::new(&mut inode_bitmap).set(0, true);
		disk.write_block(inode_bitmap_addr as u64, &inode_bitmap).unwrap();

		// Data bitmap: only the root directory's data block is allocated.
		let mut data_bitmap = vec![0u8; data_bitmap_len as usize * BLOCK_SIZE];
		BitmapViewMut::new(&mut data_bitmap).set(0, true);
		disk.write_block(data_bitmap_addr as u64, &data_bitmap).unwrap();

		// Root inode.
		let mut root_inode = Inode::new(InodeType::Directory);
		root_inode.size = 2 * DirEntry::ENCODED_SIZE as u32;
		root_inode.direct[0] = data_region_addr;
		let mut inode_block = vec![0u8; BLOCK_SIZE];
		inode_block[0..Inode::ENCODED_SIZE].copy_from_slice(&root_inode.encode());
		disk.write_block(inode_region_addr as u64, &inode_block).unwrap();

		// Root directory block: `.` and `..` both point at the root.
		let mut dir_block = [0u8; BLOCK_SIZE];
		dir_block[0..DirEntry::ENCODED_SIZE].copy_from_slice(&DirEntry::new(".", 0).encode());
		dir_block[DirEntry::ENCODED_SIZE..2 * DirEntry::ENCODED_SIZE]
			.copy_from_slice(&DirEntry::new("..", 0).encode());
		disk.write_block(data_region_addr as u64, &dir_block).unwrap();

		disk
	}

	fn image_bytes(disk: &mut Disk, total_blocks: u64) -> Vec<u8> {
		let mut bytes = Vec::new();
		for i in 0..total_blocks {
			bytes.extend(disk.read_block(i).unwrap());
		}
		bytes
	}

	#[test]
	fn stat_root_is_a_directory() {
		let mut disk = fresh_image(64, 16);
		let mut engine = Engine::new(&mut disk);
		let root = engine.stat(0).unwrap();
		assert_eq!(root.ty(), Some(InodeType::Directory));
		assert_eq!(root.size, 64);
	}

	#[test]
	fn stat_out_of_range_is_invalid_inode() {
		let mut disk = fresh_image(64, 16);
		let mut engine = Engine::new(&mut disk);
		assert!(matches!(engine.stat(1000), Err(UfsError::InvalidInode)));
	}

	#[test]
	fn lookup_finds_dot_and_dotdot() {
		let mut disk = fresh_image(64, 16);
		let mut engine = Engine::new(&mut disk);
		assert_eq!(engine.lookup(0, ".").unwrap(), 0);
		assert_eq!(engine.lookup(0, "..").unwrap(), 0);
		assert!(matches!(engine.lookup(0, "nope"), Err(UfsError::NotFound)));
	}

	// Scenario 1: touch then ls.
	#[test]
	fn create_file_then_lookup() {
		let mut disk = fresh_image(64, 16);
		let mut engine = Engine::new(&mut disk);

		let inum = engine.create(0, InodeType::RegularFile, "a.txt").unwrap();
		assert_eq!(inum, 1);
		assert_eq!(engine.lookup(0, "a.txt").unwrap(), 1);

		let root = engine.stat(0).unwrap();
		assert_eq!(root.size, 3 * DirEntry::ENCODED_SIZE as u32);
	}

	// Scenario 2: write then cat-style read back, including the direct block list.
	#[test]
	fn write_then_read_roundtrip() {
		let mut disk = fresh_image(64, 16);
		let mut engine = Engine::new(&mut disk);

		let inum = engine.create(0, InodeType::RegularFile, "hello.txt").unwrap();
		let data = b"hello";
		let written = engine.write(inum, data, data.len() as i64).unwrap();
		assert_eq!(written, data.len() as i64);

		let stat = engine.stat(inum).unwrap();
		assert_eq!(stat.size, data.len() as u32);
		assert_ne!(stat.direct[0], 0);
		assert_eq!(stat.direct[1..], [0; DIRECT_PTRS - 1]);

		let out = engine.read(inum, data.len() as i64).unwrap();
		assert_eq!(out, data);
	}

	// Scenario 3: touch the same name twice is idempotent and costs one inode.
	#[test]
	fn create_is_idempotent() {
		let mut disk = fresh_image(64, 16);
		let mut engine = Engine::new(&mut disk);

		let first = engine.create(0, InodeType::RegularFile, "a.txt").unwrap();
		let second = engine.create(0, InodeType::RegularFile, "a.txt").unwrap();
		assert_eq!(first, second);

		let root = engine.stat(0).unwrap();
		// Only one entry was appended, not two.
		assert_eq!(root.size, 3 * DirEntry::ENCODED_SIZE as u32);
	}

	#[test]
	fn create_same_name_different_type_is_invalid_type() {
		let mut disk = fresh_image(64, 16);
		let mut engine = Engine::new(&mut disk);

		engine.create(0, InodeType::RegularFile, "a").unwrap();
		let err = engine.create(0, InodeType::Directory, "a").unwrap_err();
		assert!(matches!(err, UfsError::InvalidType));
	}

	// Scenario 4: write N bytes then write 0 bytes frees the blocks back.
	#[test]
	fn shrinking_write_frees_blocks() {
		let mut disk = fresh_image(64, 16);
		let mut engine = Engine::new(&mut disk);

		let inum = engine.create(0, InodeType::RegularFile, "f").unwrap();
		let data = vec![0x42u8; BLOCK_SIZE];
		engine.write(inum, &data, data.len() as i64).unwrap();
		let after_write = engine.stat(inum).unwrap();
		assert_ne!(after_write.direct[0], 0);

		engine.write(inum, &[], 0).unwrap();
		let after_shrink = engine.stat(inum).unwrap();
		assert_eq!(after_shrink.size, 0);
		assert_eq!(after_shrink.direct, [0; DIRECT_PTRS]);
	}

	#[test]
	fn write_tail_block_is_zero_padded() {
		let mut disk = fresh_image(64, 16);
		let mut engine = Engine::new(&mut disk);

		let inum = engine.create(0, InodeType::RegularFile, "f").unwrap();
		let data = b"hi";
		engine.write(inum, data, data.len() as i64).unwrap();

		let stat = engine.stat(inum).unwrap();
		let addr = stat.direct[0];
		let block = disk.read_block(addr as u64).unwrap();
		assert_eq!(&block[..2], b"hi");
		assert!(block[2..].iter().all(|&b| b == 0));
	}

	#[test]
	fn write_exceeding_direct_budget_is_invalid_size() {
		let mut disk = fresh_image(64, 4);
		let mut engine = Engine::new(&mut disk);

		let inum = engine.create(0, InodeType::RegularFile, "f").unwrap();
		let size = (DIRECT_PTRS + 1) * BLOCK_SIZE;
		let data = vec![0u8; size];
		let err = engine.write(inum, &data, size as i64).unwrap_err();
		assert!(matches!(err, UfsError::InvalidSize));
	}

	#[test]
	fn write_negative_size_is_invalid() {
		let mut disk = fresh_image(64, 16);
		let mut engine = Engine::new(&mut disk);
		let inum = engine.create(0, InodeType::RegularFile, "f").unwrap();
		let err = engine.write(inum, &[], -1).unwrap_err();
		assert!(matches!(err, UfsError::InvalidSize));
	}

	#[test]
	fn write_to_directory_is_rejected() {
		let mut disk = fresh_image(64, 16);
		let mut engine = Engine::new(&mut disk);
		let err = engine.write(0, b"x", 1).unwrap_err();
		assert!(matches!(err, UfsError::WriteToDir));
	}

	#[test]
	fn write_not_allocated_inode_is_rejected() {
		let mut disk = fresh_image(64, 16);
		let mut engine = Engine::new(&mut disk);
		// Inode 5 was never created.
		let err = engine.write(5, b"x", 1).unwrap_err();
		assert!(matches!(err, UfsError::NotAllocated));
	}

	// Scenario 5: creating a file with a forbidden character fails cleanly and,
	// because the caller rolls back the transaction, never touches the image.
	#[test]
	fn create_invalid_name_leaves_image_untouched() {
		let mut disk = fresh_image(64, 16);
		let total_blocks = 4 /* sb + bitmaps + inode region */ + 16;
		let before = image_bytes(&mut disk, total_blocks);

		disk.begin_transaction();
		let mut engine = Engine::new(&mut disk);
		let result = engine.create(0, InodeType::RegularFile, "bad:name");
		assert!(matches!(result, Err(UfsError::InvalidName)));
		disk.rollback();

		let after = image_bytes(&mut disk, total_blocks);
		assert_eq!(before, after);
	}

	#[test]
	fn create_directory_nests_and_has_dot_dotdot() {
		let mut disk = fresh_image(64, 16);
		let mut engine = Engine::new(&mut disk);

		let dir_inum = engine.create(0, InodeType::Directory, "sub").unwrap();
		assert_eq!(engine.lookup(dir_inum, ".").unwrap(), dir_inum);
		assert_eq!(engine.lookup(dir_inum, "..").unwrap(), 0);
	}

	#[test]
	fn unlink_removes_file_and_tombstones_entry() {
		let mut disk = fresh_image(64, 16);
		let mut engine = Engine::new(&mut disk);

		let inum = engine.create(0, InodeType::RegularFile, "f").unwrap();
		engine.write(inum, b"x", 1).unwrap();
		engine.unlink(0, "f").unwrap();

		assert!(matches!(engine.lookup(0, "f"), Err(UfsError::NotFound)));
		assert!(matches!(engine.stat(inum), Err(UfsError::InvalidInode)));

		// The freed inode can be reused by a later create.
		let reused = engine.create(0, InodeType::RegularFile, "g").unwrap();
		assert_eq!(reused, inum);
	}

	#[test]
	fn unlink_nonempty_directory_fails() {
		let mut disk = fresh_image(64, 16);
		let mut engine = Engine::new(&mut disk);

		let dir_inum = engine.create(0, InodeType::Directory, "sub").unwrap();
		engine.create(dir_inum, InodeType::RegularFile, "inner").unwrap();

		let err = engine.unlink(0, "sub").unwrap_err();
		assert!(matches!(err, UfsError::DirNotEmpty));
	}

	#[test]
	fn unlink_dot_is_invalid_name() {
		let mut disk = fresh_image(64, 16);
		let mut engine = Engine::new(&mut disk);
		let err = engine.unlink(0, ".").unwrap_err();
		assert!(matches!(err, UfsError::InvalidName));
	}

	#[test]
	fn unlink_missing_entry_is_not_found() {
		let mut disk = fresh_image(64, 16);
		let mut engine = Engine::new(&mut disk);
		let err = engine.unlink(0, "ghost").unwrap_err();
		assert!(matches!(err, UfsError::NotFound));
	}

	// P4: read is idempotent and does not mutate the image.
	#[test]
	fn read_is_idempotent() {
		let mut disk = fresh_image(64, 16);
		let mut engine = Engine::new(&mut disk);
		let inum = engine.create(0, InodeType::RegularFile, "f").unwrap();
		engine.write(inum, b"abcdef", 6).unwrap();

		let first = engine.read(inum, 6).unwrap();
		let second = engine.read(inum, 6).unwrap();
		assert_eq!(first, second);
		assert_eq!(first, b"abcdef");
	}

	// P7 groundwork: directory listing order is established by the CLI, but
	// the engine must return entries (including tombstones) in on-disk order
	// so the CLI can sort and skip.
	#[test]
	fn read_returns_tombstones_for_cli_to_filter() {
		let mut disk = fresh_image(64, 16);
		let mut engine = Engine::new(&mut disk);
		let inum = engine.create(0, InodeType::RegularFile, "f").unwrap();
		engine.unlink(0, "f").unwrap();

		let payload = engine.read(0, 999).unwrap();
		let entries: Vec<_> = payload.chunks_exact(DirEntry::ENCODED_SIZE).map(DirEntry::decode).collect();
		assert_eq!(entries.len(), 3);
		assert!(entries[2].is_tombstone());
		let _ = inum;
	}
}

