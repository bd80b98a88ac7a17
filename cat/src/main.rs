//! `cat` prints an inode's direct block indices, a blank line, then the raw
//! file payload.

use std::env;
use std::io::{self, Write};
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

	/// The path of the image file to read.
	image_path: Option<PathBuf>,

	/// The inode to print.
	inode: Option<u32>,
}

fn parse_args() -> Args {
	let mut args: Args = Default::default();
	let mut iter = env::args();

	args.prog = iter.next().unwrap_or_else(|| "cat".to_owned());
	args.image_path = iter.next().map(PathBuf::from);
	args.inode = iter.next().and_then(|s| s.parse().ok());

	args
}

fn print_usage(prog: &str) {
	eprintln!("{}: <image> <inode>", prog);
}

fn main() {
	let args = parse_args();

	let (image_path, inode_no) = match (args.image_path, args.inode) {
		(Some(p), Some(n)) => (p, n),
		_ => {
			print_usage(&args.prog);
			exit(1);
		}
	};

	let mut disk = Disk::open(&image_path, BLOCK_SIZE).unwrap_or_else(|e| {
		eprintln!("{}: {}: {}", args.prog, image_path.display(), e);
		exit(1);
	});
	let mut engine = Engine::new(&mut disk);

	let inode = engine.stat(inode_no).unwrap_or_else(|e| {
		eprintln!("{}: {}", args.prog, e);
		exit(1);
	});

	for &addr in inode.direct.iter() {
		if addr != 0 {
			println!("{}", addr);
		}
	}
	println!();

	let payload = engine.read(inode_no, inode.size as i64).unwrap_or_else(|e| {
		eprintln!("{}: {}", args.prog, e);
		exit(1);
	});
	io::stdout().write_all(&payload).unwrap_or_else(|e| {
		eprintln!("{}: {}", args.prog, e);
		exit(1);
	});
}
