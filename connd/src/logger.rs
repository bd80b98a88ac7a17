//! Serialized event logging: one line per state transition, guarded by a
//! mutex so concurrent worker threads don't interleave output. This carries
//! forward the source's `sync_print(tag, payload)` calls, its only non-HTTP
//! ambient-stack concern.

use std::fs::File;
use std::io::{self, Write};
use std::sync::Mutex;

pub struct Logger {
	out: Mutex<Box<dyn Write + Send>>,
}

impl Logger {
	pub fn stdout() -> Self {
		Self {
			out: Mutex::new(Box::new(io::stdout())),
		}
	}

	pub fn to_file(path: &str) -> io::Result<Self> {
		let file = File::create(path)?;
		Ok(Self {
			out: Mutex::new(Box::new(file)),
		})
	}

	/// Writes one `event detail` line. Logging failures are not fatal to the
	/// dispatcher, matching the source's `sync_print`, which never checks
	/// its own write for errors.
	pub fn log(&self, event: &str, detail: &str) {
		let mut out = self.out.lock().unwrap();
		let _ = writeln!(out, "{} {}", event, detail);
	}
}
