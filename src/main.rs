//! Entry point for the **dapper** daemon.
//!
//! Loads the config, binds the command socket, claims a desktop per app and
//! then handles window-manager events and client commands on the main
//! thread until SIGINT or SIGTERM.  The event feed and the socket are read
//! on background threads that only forward into a channel.

use dapper::bspwm::events::BspcSubscriber;
use dapper::bspwm::wm::BspwmWm;
use dapper::config::Config;
use dapper::daemon::{Daemon, Event};
use dapper::dispatcher::Dispatcher;
use dapper::ipc::listener::{remove_socket, UnixSocketListener, SOCKET_PATH};
use dapper::traits::EventSource;
use log::{error, info};
use signal_hook::consts::{SIGINT, SIGTERM};
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::{mpsc, Arc};

/// Resolve the config directory (`$XDG_CONFIG_HOME/dapper`).
fn config_dir() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME").unwrap_or_else(|_| {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        format!("{}/.config", home)
    });
    PathBuf::from(base).join("dapper")
}

/// Print `what` and exit with status 1.
fn fatal(what: impl std::fmt::Display) -> ! {
    error!("{}", what);
    std::process::exit(1);
}

fn main() {
    env_logger::init();

    let path = config_dir().join("config.json");
    let registry = match Config::load(&path) {
        Ok(cfg) => {
            info!("loaded config from {}", path.display());
            cfg.registry()
        }
        Err(e) => fatal(e),
    };

    let shutdown = Arc::new(AtomicBool::new(false));
    for signal in [SIGINT, SIGTERM] {
        if let Err(e) = signal_hook::flag::register(signal, Arc::clone(&shutdown)) {
            fatal(format!("failed to install signal handler: {}", e));
        }
    }

    let socket = Path::new(SOCKET_PATH);
    let listener = UnixSocketListener::bind(socket).unwrap_or_else(|e| fatal(e));

    // Subscribe before the initial enumeration so no window slips between
    // the two; one seen twice is simply classified twice.
    let subscriber = BspcSubscriber::spawn().unwrap_or_else(|e| {
        remove_socket(socket);
        fatal(e)
    });

    // `fatal` skips destructors, so the feed is stopped by hand.
    let feed = subscriber.handle();

    let mut daemon = match Daemon::start(BspwmWm::new(), registry, Dispatcher::default()) {
        Ok(d) => d,
        Err(e) => {
            feed.stop();
            remove_socket(socket);
            fatal(e)
        }
    };

    let (tx, rx) = mpsc::channel::<Event>();
    spawn_source(listener, tx.clone(), "socket listener");
    spawn_source(subscriber, tx, "event feed");

    daemon.run(&rx, &shutdown);

    daemon.shutdown();
    feed.stop();
    remove_socket(socket);
    info!("bye");
}

fn spawn_source<S: EventSource + 'static>(mut source: S, tx: mpsc::Sender<Event>, name: &'static str) {
    std::thread::spawn(move || {
        if let Err(e) = source.run(tx) {
            error!("{} error: {}", name, e);
        }
    });
}
