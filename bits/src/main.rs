//! `bits` prints a UFS image's superblock fields and its inode and data
//! bitmaps as space-separated decimal byte values.

use std::env;
use std::path::PathBuf;
use std::process::exit;

use ufs::disk::Disk;
use ufs::engine::Engine;
use ufs::layout::BLOCK_SIZE;

/// Structure storing command line arguments.
#[derive(Default)]
struct Args {
	/// The name of the current program used in command line.
	prog: String,

	/// The path of the image file to inspect.
	image_path: Option<PathBuf>,
}

fn parse_args() -> Args {
	let mut args: Args = Default::default();
	let mut iter = env::args();

	args.prog = iter.next().unwrap_or_else(|| "bits".to_owned());
	args.image_path = iter.next().map(PathBuf::from);

	args
}

fn print_usage(prog: &str) {
	eprintln!("{}: <image>", prog);
}

fn bytes_line(bytes: &[u8]) -> String {
	bytes.iter().map(|b| b.to_string()).collect::<Vec<_>>().join(" ")
}

fn main() {
	let args = parse_args();

	let image_path = args.image_path.unwrap_or_else(|| {
		print_usage(&args.prog);
		exit(1);
	});

	let mut disk = Disk::open(&image_path, BLOCK_SIZE).unwrap_or_else(|e| {
		eprintln!("{}: {}: {}", args.prog, image_path.display(), e);
		exit(1);
	});
	let mut engine = Engine::new(&mut disk);

	let sb = engine.superblock().unwrap_or_else(|e| {
		eprintln!("{}: {}", args.prog, e);
		exit(1);
	});

	println!("inode_bitmap_addr {}", sb.inode_bitmap_addr);
	println!("inode_bitmap_len {}", sb.inode_bitmap_len);
	println!("data_bitmap_addr {}", sb.data_bitmap_addr);
	println!("data_bitmap_len {}", sb.data_bitmap_len);
	println!("inode_region_addr {}", sb.inode_region_addr);
	println!("inode_region_len {}", sb.inode_region_len);
	println!("data_region_addr {}", sb.data_region_addr);
	println!("data_region_len {}", sb.data_region_len);
	println!("num_inodes {}", sb.num_inodes);
	println!("num_data {}", sb.num_data);

	let inode_bitmap = engine.inode_bitmap().unwrap_or_else(|e| {
		eprintln!("{}: {}", args.prog, e);
		exit(1);
	});
	println!("{}", bytes_line(&inode_bitmap));

	let data_bitmap = engine.data_bitmap().unwrap_or_else(|e| {
		eprintln!("{}: {}", args.prog, e);
		exit(1);
	});
	println!("{}", bytes_line(&data_bitmap));
}
