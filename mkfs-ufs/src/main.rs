//! Builds a fresh UFS image file: a superblock, zeroed bitmaps with the root
//! bit set, an inode region with a populated root inode, and an initial root
//! directory data block.

use std::env;
use std::fs::OpenOptions;
use std::io;
use std::io::{Seek, SeekFrom, Write};
use std::path::PathBuf;
use std::process::exit;

use ufs::layout::{
	BitmapViewMut, DirEntry, Inode, InodeType, Superblock, BLOCK_SIZE,
};

const DEFAULT_NUM_INODES: u32 = 128;
const DEFAULT_NUM_DATA: u32 = 256;

/// Structure storing command line arguments.
#[derive(Default)]
struct Args {
	/// The name of the current program used in command line.
	prog: String,

	/// If true, print command line help.
	help: bool,

	/// The path of the image file to create.
	image_path: Option<PathBuf>,

	/// Number of inodes to provision.
	num_inodes: Option<u32>,

	/// Number of data blocks to provision.
	num_data: Option<u32>,
}

fn parse_args() -> Args {
	let mut args: Args = Default::default();
	let mut iter = env::args();

	args.prog = iter.next().unwrap_or_else(|| "mkfs-ufs".to_owned());

	while let Some(arg) = iter.next() {
		match arg.as_str() {
			"-h" | "--help" => args.help = true,

			"-i" => {
				let n = iter.next().unwrap_or_else(|| {
					eprintln!("{}: -i requires a value", args.prog);
					exit(1);
				});
				args.num_inodes = Some(n.parse().unwrap_or_else(|_| {
					eprintln!("{}: invalid inode count `{}`", args.prog, n);
					exit(1);
				}));
			}

			"-d" => {
				let n = iter.next().unwrap_or_else(|| {
					eprintln!("{}: -d requires a value", args.prog);
					exit(1);
				});
				args.num_data = Some(n.parse().unwrap_or_else(|_| {
					eprintln!("{}: invalid data block count `{}`", args.prog, n);
					exit(1);
				}));
			}

			_ => {
				args.image_path = Some(PathBuf::from(arg));
			}
		}
	}

	args
}

fn print_usage(prog: &str) {
	eprintln!("{}: [-i num_inodes] [-d num_data] image_path", prog);
	eprintln!("For example:");
	eprintln!("    $ {} -i 128 -d 256 a.img", prog);
}

/// Lays out and writes a fresh image at `path`, sized to hold `num_inodes`
/// inodes and `num_data` data blocks.
fn build_image(path: &PathBuf, num_inodes: u32, num_data: u32) -> io::Result<()> {
	let inode_bitmap_addr = 1u32;
	let inode_bitmap_len = 1u32;
	let data_bitmap_addr = inode_bitmap_addr + inode_bitmap_len;
	let data_bitmap_len = 1u32;
	let inode_region_addr = data_bitmap_addr + data_bitmap_len;
	let inode_region_len =
		(num_inodes as usize * Inode::ENCODED_SIZE).div_ceil(BLOCK_SIZE) as u32;
	let data_region_addr = inode_region_addr + inode_region_len;
	let data_region_len = num_data;
	let total_blocks = data_region_addr as u64 + data_region_len as u64;

	let mut dev = OpenOptions::new()
		.create(true)
		.write(true)
		.truncate(true)
		.open(path)?;
	dev.set_len(total_blocks * BLOCK_SIZE as u64)?;

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
	write_at(&mut dev, 0, &sb.encode())?;

	// Inode bitmap: only the root inode is allocated.
	let mut inode_bitmap = vec![0u8; inode_bitmap_len as usize * BLOCK_SIZE];
	BitmapViewMut::new(&mut inode_bitmap).set(0, true);
	write_at(&mut dev, inode_bitmap_addr as u64, &inode_bitmap)?;

	// Data bitmap: only the root directory's data block is allocated.
	let mut data_bitmap = vec![0u8; data_bitmap_len as usize * BLOCK_SIZE];
	BitmapViewMut::new(&mut data_bitmap).set(0, true);
	write_at(&mut dev, data_bitmap_addr as u64, &data_bitmap)?;

	// Root inode: a directory containing `.` and `..`, both pointing at itself.
	let mut root_inode = Inode::new(InodeType::Directory);
	root_inode.size = 2 * DirEntry::ENCODED_SIZE as u32;
	root_inode.direct[0] = data_region_addr;
	let mut inode_region = vec![0u8; inode_region_len as usize * BLOCK_SIZE];
	inode_region[0..Inode::ENCODED_SIZE].copy_from_slice(&root_inode.encode());
	write_at(&mut dev, inode_region_addr as u64, &inode_region)?;

	let mut root_dir_block = [0u8; BLOCK_SIZE];
	root_dir_block[0..DirEntry::ENCODED_SIZE].copy_from_slice(&DirEntry::new(".", 0).encode());
	root_dir_block[DirEntry::ENCODED_SIZE..2 * DirEntry::ENCODED_SIZE]
		.copy_from_slice(&DirEntry::new("..", 0).encode());
	write_at(&mut dev, data_region_addr as u64, &root_dir_block)?;

	dev.flush()
}

/// Writes `bytes` starting at block `addr`, independent of the running
/// transaction semantics `ufs::Disk` layers on top of a built image.
fn write_at(dev: &mut (impl Write + Seek), addr: u64, bytes: &[u8]) -> io::Result<()> {
	dev.seek(SeekFrom::Start(addr * BLOCK_SIZE as u64))?;
	dev.write_all(bytes)
}

fn main() {
	let args = parse_args();

	if args.help {
		print_usage(&args.prog);
		return;
	}

	let image_path = args.image_path.unwrap_or_else(|| {
		print_usage(&args.prog);
		exit(1);
	});
	let num_inodes = args.num_inodes.unwrap_or(DEFAULT_NUM_INODES);
	let num_data = args.num_data.unwrap_or(DEFAULT_NUM_DATA);

	build_image(&image_path, num_inodes, num_data).unwrap_or_else(|e| {
		eprintln!("{}: {}: {}", args.prog, image_path.display(), e);
		exit(1);
	});
}
