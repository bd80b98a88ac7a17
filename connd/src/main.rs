//! `connd` decouples a TCP accept loop from a fixed-size pool of connection
//! handlers through a bounded FIFO queue (spec §4.3).
//!
//! HTTP parsing, path routing, and static file service are out of scope:
//! each worker drains and closes its connection, which is the full extent
//! of "request handling" here.

mod dispatcher;
mod logger;

use std::env;
use std::io::Read;
use std::net::{TcpListener, TcpStream};
use std::process::exit;
use std::sync::Arc;

use dispatcher::Dispatcher;
use logger::Logger;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_POOL_SIZE: usize = 1;
const DEFAULT_BUFFER_SIZE: usize = 1;

/// Structure storing command line arguments.
#[derive(Default)]
struct Args {
	/// The name of the current program used in command line.
	prog: String,

	port: Option<u16>,
	pool_size: Option<usize>,
	buffer_size: Option<usize>,
	log_file: Option<String>,
}

fn parse_args() -> Args {
	let mut args: Args = Default::default();
	let mut iter = env::args();
	args.prog = iter.next().unwrap_or_else(|| "connd".to_owned());

	while let Some(arg) = iter.next() {
		match arg.as_str() {
			"-p" => {
				args.port = iter.next().and_then(|s| s.parse().ok());
			}
			"-t" => {
				args.pool_size = iter.next().and_then(|s| s.parse().ok());
			}
			"-b" => {
				args.buffer_size = iter.next().and_then(|s| s.parse().ok());
			}
			"-l" => {
				args.log_file = iter.next();
			}

			// Flags from the HTTP-serving original (`-d` basedir, `-s`
			// schedalg) are out of scope; accepted and ignored so scripts
			// written against the original's CLI don't hard-fail here.
			"-d" | "-s" => {
				iter.next();
			}

			_ => {
				eprintln!("{}: unrecognized option `{}`", args.prog, arg);
				exit(1);
			}
		}
	}

	args
}

/// Drains whatever the peer sent and closes the connection. HTTP parsing,
/// routing, and response composition are out of scope (spec.md §1); this is
/// the full extent of "request handling" this dispatcher performs.
fn handle_connection(mut stream: TcpStream, logger: &Logger) {
	let peer = stream.peer_addr().map(|a| a.to_string()).unwrap_or_else(|_| "?".to_owned());
	logger.log("read_request_enter", &format!("client: {}", peer));
	let mut buf = [0u8; 4096];
	let _ = stream.read(&mut buf);
	logger.log("read_request_return", &format!("client: {}", peer));
	logger.log("close_connection", &format!("client: {}", peer));
}

fn main() {
	// A write to a closed peer must surface as a bounded I/O error in the
	// handler, not kill the process.
	unsafe {
		libc::signal(libc::SIGPIPE, libc::SIG_IGN);
	}

	let args = parse_args();
	let port = args.port.unwrap_or(DEFAULT_PORT);
	let pool_size = args.pool_size.unwrap_or(DEFAULT_POOL_SIZE).max(1);
	let buffer_size = args.buffer_size.unwrap_or(DEFAULT_BUFFER_SIZE).max(1);

	let logger = Arc::new(match args.log_file {
		Some(path) => Logger::to_file(&path).unwrap_or_else(|e| {
			eprintln!("{}: {}: {}", args.prog, path, e);
			exit(1);
		}),
		None => Logger::stdout(),
	});
	logger.log("init", "");

	let listener = TcpListener::bind(("0.0.0.0", port)).unwrap_or_else(|e| {
		eprintln!("{}: bind port {}: {}", args.prog, port, e);
		exit(1);
	});

	let worker_logger = Arc::clone(&logger);
	let dispatcher = Dispatcher::new(pool_size, buffer_size, move |stream: TcpStream| {
		handle_connection(stream, &worker_logger);
	});

	loop {
		logger.log("waiting_to_accept", "");
		let stream = match listener.accept() {
			Ok((stream, _addr)) => stream,
			Err(_) => continue,
		};
		logger.log("client_accepted", "");
		dispatcher.dispatch(stream);
	}
}
