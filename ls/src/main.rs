//! `ls` resolves a `/`-separated path from the root inode and lists it: a
//! directory's entries sorted by name, or a single line for a regular file.

use std::env;
use std::path::PathBuf;
use std::process::exit;

use ufs::disk::Disk;
use ufs::engine::Engine;
use ufs::error::UfsError;
use ufs::layout::{DirEntry, InodeType, BLOCK_SIZE, ROOT_INODE};

/// Structure storing command line arguments.
#[derive(Default)]
struct Args {
	/// The name of the current program used in command line.
	prog: String,

	/// The path of the image file to read.
	image_path: Option<PathBuf>,

	/// The `/`-separated path to list, relative to the root inode.
	target_path: Option<String>,
}

fn parse_args() -> Args {
	let mut args: Args = Default::default();
	let mut iter = env::args();

	args.prog = iter.next().unwrap_or_else(|| "ls".to_owned());
	args.image_path = iter.next().map(PathBuf::from);
	args.target_path = iter.next();

	args
}

fn print_usage(prog: &str) {
	eprintln!("{}: <image> <path>", prog);
}

/// Walks `path`'s `/`-separated components from the root inode, returning
/// the resolved inode and the name under which its parent refers to it (used
/// only when the result turns out to be a regular file; the root has no such
/// name, but it is never a regular file so the fallback is never observed).
fn resolve(engine: &mut Engine, path: &str) -> Result<(u32, String), UfsError> {
	let mut current = ROOT_INODE;
	let mut name = String::from(".");
	for component in path.split('/').filter(|s| !s.is_empty()) {
		current = engine.lookup(current, component)?;
		name = component.to_owned();
	}
	Ok((current, name))
}

fn main() {
	let args = parse_args();

	let (image_path, target_path) = match (args.image_path, args.target_path) {
		(Some(i), Some(p)) => (i, p),
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

	let (inode_no, name) = resolve(&mut engine, &target_path).unwrap_or_else(|e| {
		eprintln!("{}: {}: {}", args.prog, target_path, e);
		exit(1);
	});
	let inode = engine.stat(inode_no).unwrap_or_else(|e| {
		eprintln!("{}: {}", args.prog, e);
		exit(1);
	});

	match inode.ty() {
		Some(InodeType::Directory) => {
			let payload = engine.read(inode_no, inode.size as i64).unwrap_or_else(|e| {
				eprintln!("{}: {}", args.prog, e);
				exit(1);
			});
			let mut entries: Vec<(u32, Vec<u8>)> = payload
				.chunks_exact(DirEntry::ENCODED_SIZE)
				.map(DirEntry::decode)
				.filter(|e| !e.is_tombstone())
				.map(|e| (e.inum as u32, e.name_bytes().to_vec()))
				.collect();
			entries.sort_by(|a, b| a.1.cmp(&b.1));
			for (inum, name) in entries {
				println!("{}\t{}", inum, String::from_utf8_lossy(&name));
			}
		}
		Some(InodeType::RegularFile) => {
			println!("{}\t{}", inode_no, name);
		}
		None => {
			eprintln!("{}: {}: invalid inode", args.prog, target_path);
			exit(1);
		}
	}
}
