//! `cp` reads a file from the host filesystem and writes its entire contents
//! to a UFS inode inside a single transaction.

use std::env;
use std::fs;
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

	/// The path of the image file to write into.
	image_path: Option<PathBuf>,

	/// The host file to copy in.
	src_path: Option<PathBuf>,

	/// The destination inode.
	dst_inode: Option<u32>,
}

fn parse_args() -> Args {
	let mut args: Args = Default::default();
	let mut iter = env::args();

	args.prog = iter.next().unwrap_or_else(|| "cp".to_owned());
	args.image_path = iter.next().map(PathBuf::from);
	args.src_path = iter.next().map(PathBuf::from);
	args.dst_inode = iter.next().and_then(|s| s.parse().ok());

	args
}

fn print_usage(prog: &str) {
	eprintln!("{}: <image> <src_file> <dst_inode>", prog);
}

fn main() {
	let args = parse_args();

	let (image_path, src_path, dst_inode) = match (args.image_path, args.src_path, args.dst_inode) {
		(Some(i), Some(s), Some(d)) => (i, s, d),
		_ => {
			print_usage(&args.prog);
			exit(1);
		}
	};

	let contents = fs::read(&src_path).unwrap_or_else(|e| {
		eprintln!("{}: {}: {}", args.prog, src_path.display(), e);
		exit(1);
	});

	let mut disk = Disk::open(&image_path, BLOCK_SIZE).unwrap_or_else(|e| {
		eprintln!("{}: {}: {}", args.prog, image_path.display(), e);
		exit(1);
	});

	disk.begin_transaction();
	let result = {
		let mut engine = Engine::new(&mut disk);
		engine.write(dst_inode, &contents, contents.len() as i64)
	};

	match result {
		Ok(_) => disk.commit().unwrap_or_else(|e| {
			eprintln!("{}: {}", args.prog, e);
			exit(1);
		}),
		Err(e) => {
			disk.rollback();
			eprintln!("{}: {}", args.prog, e);
			exit(1);
		}
	}
}
