//! On-disk layout: superblock, inode, directory entry, and bitmap helpers.
//!
//! All persisted integers are little-endian, packed with no padding, so that
//! an image produced on one platform can be read back on any other.

use std::mem::size_of;

/// Size of a block in bytes.
pub const BLOCK_SIZE: usize = 4096;

/// Number of direct block pointers stored in an inode.
pub const DIRECT_PTRS: usize = 12;

/// Maximum length of a directory entry name, including the NUL terminator.
pub const DIR_ENT_NAME_SIZE: usize = 28;

/// Inode number of the root directory. Always allocated.
pub const ROOT_INODE: u32 = 0;

/// Inode-number value marking a directory entry as a tombstone.
pub const TOMBSTONE: i32 = -1;

/// Characters a file name may not contain.
pub const FORBIDDEN_NAME_CHARS: &[char] = &[':', '/', '*', '?', '"', '<', '>', '|'];

/// Maximum file size addressable through direct pointers alone.
pub const MAX_FILE_SIZE: usize = DIRECT_PTRS * BLOCK_SIZE;

/// An inode's type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InodeType {
	Directory,
	RegularFile,
}

impl InodeType {
	fn to_raw(self) -> u32 {
		match self {
			Self::Directory => 1,
			Self::RegularFile => 2,
		}
	}

	fn from_raw(raw: u32) -> Option<Self> {
		match raw {
			1 => Some(Self::Directory),
			2 => Some(Self::RegularFile),
			_ => None,
		}
	}
}

/// The filesystem's superblock. Lives at block 0.
#[derive(Debug, Clone, Copy, Default)]
pub struct Superblock {
	pub inode_bitmap_addr: u32,
	pub inode_bitmap_len: u32,
	pub data_bitmap_addr: u32,
	pub data_bitmap_len: u32,
	pub inode_region_addr: u32,
	pub inode_region_len: u32,
	pub data_region_addr: u32,
	pub data_region_len: u32,
	pub num_inodes: u32,
	pub num_data: u32,
}

/// Encoded size of a superblock on disk.
pub const SUPERBLOCK_SIZE: usize = 10 * size_of::<u32>();

impl Superblock {
	/// Encodes the superblock into the first bytes of a whole block buffer.
	pub fn encode(&self) -> [u8; BLOCK_SIZE] {
		let mut buf = [0u8; BLOCK_SIZE];
		let fields = [
			self.inode_bitmap_addr,
			self.inode_bitmap_len,
			self.data_bitmap_addr,
			self.data_bitmap_len,
			self.inode_region_addr,
			self.inode_region_len,
			self.data_region_addr,
			self.data_region_len,
			self.num_inodes,
			self.num_data,
		];
		for (i, field) in fields.iter().enumerate() {
			let off = i * size_of::<u32>();
			buf[off..off + 4].copy_from_slice(&field.to_le_bytes());
		}
		buf
	}

	/// Decodes a superblock from a whole block buffer.
	pub fn decode(buf: &[u8; BLOCK_SIZE]) -> Self {
		let read_u32 = |i: usize| {
			let off = i * size_of::<u32>();
			u32::from_le_bytes(buf[off..off + 4].try_into().unwrap())
		};
		Self {
			inode_bitmap_addr: read_u32(0),
			inode_bitmap_len: read_u32(1),
			data_bitmap_addr: read_u32(2),
			data_bitmap_len: read_u32(3),
			inode_region_addr: read_u32(4),
			inode_region_len: read_u32(5),
			data_region_addr: read_u32(6),
			data_region_len: read_u32(7),
			num_inodes: read_u32(8),
			num_data: read_u32(9),
		}
	}

	/// Number of inodes that fit in one block of the inode region.
	pub fn inodes_per_block(&self) -> usize {
		BLOCK_SIZE / Inode::ENCODED_SIZE
	}
}

/// A fixed-size inode record.
#[derive(Debug, Clone, Copy)]
pub struct Inode {
	/// `None` represents a corrupt/unrecognized type value.
	pub raw_type: u32,
	pub size: u32,
	pub direct: [u32; DIRECT_PTRS],
}

impl Default for Inode {
	fn default() -> Self {
		Self {
			raw_type: 0,
			size: 0,
			direct: [0; DIRECT_PTRS],
		}
	}
}

impl Inode {
	/// Encoded, on-disk size of one inode record.
	pub const ENCODED_SIZE: usize = 2 * size_of::<u32>() + DIRECT_PTRS * size_of::<u32>();

	pub fn new(ty: InodeType) -> Self {
		Self {
			raw_type: ty.to_raw(),
			size: 0,
			direct: [0; DIRECT_PTRS],
		}
	}

	/// Returns the inode's type, or `None` if `raw_type` is not a recognized value.
	pub fn ty(&self) -> Option<InodeType> {
		InodeType::from_raw(self.raw_type)
	}

	pub fn encode(&self) -> [u8; Self::ENCODED_SIZE] {
		let mut buf = [0u8; Self::ENCODED_SIZE];
		buf[0..4].copy_from_slice(&self.raw_type.to_le_bytes());
		buf[4..8].copy_from_slice(&self.size.to_le_bytes());
		for (i, ptr) in self.direct.iter().enumerate() {
			let off = 8 + i * size_of::<u32>();
			buf[off..off + 4].copy_from_slice(&ptr.to_le_bytes());
		}
		buf
	}

	pub fn decode(buf: &[u8]) -> Self {
		let raw_type = u32::from_le_bytes(buf[0..4].try_into().unwrap());
		let size = u32::from_le_bytes(buf[4..8].try_into().unwrap());
		let mut direct = [0u32; DIRECT_PTRS];
		for (i, ptr) in direct.iter_mut().enumerate() {
			let off = 8 + i * size_of::<u32>();
			*ptr = u32::from_le_bytes(buf[off..off + 4].try_into().unwrap());
		}
		Self {
			raw_type,
			size,
			direct,
		}
	}

	/// Number of direct entries required to hold `size` bytes.
	pub fn blocks_for_size(size: u32) -> usize {
		(size as usize).div_ceil(BLOCK_SIZE)
	}
}

/// A fixed-size directory entry: a NUL-padded name and an inode number.
#[derive(Debug, Clone, Copy)]
pub struct DirEntry {
	pub name: [u8; DIR_ENT_NAME_SIZE],
	/// `-1` denotes a tombstone.
	pub inum: i32,
}

impl DirEntry {
	pub const ENCODED_SIZE: usize = DIR_ENT_NAME_SIZE + size_of::<i32>();

	/// Builds a live entry from a name. Panics if `name` (plus NUL) does not fit.
	pub fn new(name: &str, inum: u32) -> Self {
		assert!(name.len() < DIR_ENT_NAME_SIZE, "name too long for a directory entry");
		let mut buf = [0u8; DIR_ENT_NAME_SIZE];
		buf[..name.len()].copy_from_slice(name.as_bytes());
		Self {
			name: buf,
			inum: inum as i32,
		}
	}

	pub fn tombstone() -> Self {
		Self {
			name: [0u8; DIR_ENT_NAME_SIZE],
			inum: TOMBSTONE,
		}
	}

	pub fn is_tombstone(&self) -> bool {
		self.inum == TOMBSTONE
	}

	/// Name up to the first NUL, as a UTF-8 lossy string is not attempted: names are
	/// treated as raw bytes, matching the source's `char[]` + `strcmp` semantics.
	pub fn name_bytes(&self) -> &[u8] {
		let end = self.name.iter().position(|&b| b == 0).unwrap_or(self.name.len());
		&self.name[..end]
	}

	pub fn encode(&self) -> [u8; Self::ENCODED_SIZE] {
		let mut buf = [0u8; Self::ENCODED_SIZE];
		buf[..DIR_ENT_NAME_SIZE].copy_from_slice(&self.name);
		buf[DIR_ENT_NAME_SIZE..].copy_from_slice(&self.inum.to_le_bytes());
		buf
	}

	pub fn decode(buf: &[u8]) -> Self {
		let mut name = [0u8; DIR_ENT_NAME_SIZE];
		name.copy_from_slice(&buf[..DIR_ENT_NAME_SIZE]);
		let inum = i32::from_le_bytes(buf[DIR_ENT_NAME_SIZE..Self::ENCODED_SIZE].try_into().unwrap());
		Self { name, inum }
	}
}

/// Read-only view over a bit-packed, LSB-first bitmap.
pub struct BitmapView<'a> {
	bytes: &'a [u8],
}

impl<'a> BitmapView<'a> {
	pub fn new(bytes: &'a [u8]) -> Self {
		Self { bytes }
	}

	pub fn get(&self, i: usize) -> bool {
		let byte = self.bytes[i / 8];
		(byte & (1 << (i % 8))) != 0
	}
}

/// Mutable view over a bit-packed, LSB-first bitmap.
pub struct BitmapViewMut<'a> {
	bytes: &'a mut [u8],
}

impl<'a> BitmapViewMut<'a> {
	pub fn new(bytes: &'a mut [u8]) -> Self {
		Self { bytes }
	}

	pub fn get(&self, i: usize) -> bool {
		let byte = self.bytes[i / 8];
		(byte & (1 << (i % 8))) != 0
	}

	pub fn set(&mut self, i: usize, value: bool) {
		if value {
			self.bytes[i / 8] |= 1 << (i % 8);
		} else {
			self.bytes[i / 8] &= !(1 << (i % 8));
		}
	}

	/// First-fit: returns the lowest-index clear bit below `limit`, if any.
	pub fn first_clear(&self, limit: usize) -> Option<usize> {
		(0..limit).find(|&i| !self.get(i))
	}
}
