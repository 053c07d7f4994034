//! `dapperc`: send one command to the running dapper daemon.
//!
//! ```text
//! dapperc term
//! dapperc web --pull
//! ```

use dapper::ipc::client::send_command;
use dapper::ipc::listener::SOCKET_PATH;
use std::path::Path;

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if let Err(e) = send_command(Path::new(SOCKET_PATH), &args) {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
