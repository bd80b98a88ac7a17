//! `touch` creates a regular file in a parent directory inside a single
//! transaction.

use std::env;
use std::path::PathBuf;
use std::process::exit;

use ufs::disk::Disk;
use ufs::engine::Engine;
use ufs::layout::{InodeType, BLOCK_SIZE};

/// Structure storing command line arguments.
#[derive(Default)]
struct Args {
	/// The name of the current program used in command line.
	prog: String,

	/// The path of the image file to write into.
	image_path: Option<PathBuf>,

	/// The parent directory's inode number.
	parent_inode: Option<u32>,

	/// The name of the file to create.
	name: Option<String>,
}

fn parse_args() -> Args {
	let mut args: Args = Default::default();
	let mut iter = env::args();

	args.prog = iter.next().unwrap_or_else(|| "touch".to_owned());
	args.image_path = iter.next().map(PathBuf::from);
	args.parent_inode = iter.next().and_then(|s| s.parse().ok());
	args.name = iter.next();

	args
}

fn print_usage(prog: &str) {
	eprintln!("{}: <image> <parent_inode> <name>", prog);
}

fn main() {
	let args = parse_args();

	let (image_path, parent_inode, name) = match (args.image_path, args.parent_inode, args.name) {
		(Some(i), Some(p), Some(n)) => (i, p, n),
		_ => {
			print_usage(&args.prog);
			exit(1);
		}
	};

	let mut disk = Disk::open(&image_path, BLOCK_SIZE).unwrap_or_else(|e| {
		eprintln!("{}: {}: {}", args.prog, image_path.display(), e);
		exit(1);
	});

	disk.begin_transaction();
	let result = {
		let mut engine = Engine::new(&mut disk);
		engine.create(parent_inode, InodeType::RegularFile, &name)
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
