use std::env;
use std::process::exit;
use std::sync::Arc;
use std::thread;

use log::{error, info};
use signal_hook::iterator::Signals;

use stream_server::hw::{BoardRegisters, BoardView};
use stream_server::logging;
use stream_server::StreamServer;

const SERVER_LOG_FILE: &str = "stream_server.log";

fn usage_exit(program: &str) -> ! {
    eprintln!("Usage:\t{} port", program);
    eprintln!("Stream Server for dumping audio/video data.");
    exit(1);
}

fn main() {
    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("stream_server");

    if args.len() < 2 {
        eprintln!("ERROR, no port provided");
        usage_exit(program);
    }
    let port: u16 = match args[1].parse() {
        Ok(port) => port,
        Err(_) => {
            eprintln!("ERROR, invalid port '{}'", args[1]);
            usage_exit(program);
        }
    };

    if let Err(err) = logging::init(SERVER_LOG_FILE, log::LevelFilter::Debug) {
        eprintln!("ERROR, init log fail: {}", err);
        exit(1);
    }

    info!("start stream server with port {}", port);

    let board: Arc<dyn BoardRegisters> = match BoardView::open() {
        Ok(board) => Arc::new(board),
        Err(err) => {
            eprintln!("{}", err);
            error!("{}", err);
            exit(1);
        }
    };

    let server = match StreamServer::bind(port) {
        Ok(server) => server,
        Err(err) => {
            eprintln!("{}", err);
            error!("{}", err);
            exit(1);
        }
    };

    let signals = match Signals::new(&[signal_hook::SIGINT]) {
        Ok(signals) => signals,
        Err(err) => {
            eprintln!("can't catch SIGINT: {}", err);
            exit(1);
        }
    };
    /*
     * Exiting releases the listener socket and the register mappings;
     * nothing else persists.
     */
    thread::spawn(move || {
        for _ in signals.forever() {
            info!("caught SIGINT, shutting down");
            exit(0);
        }
    });

    if let Err(err) = server.run(board) {
        error!("{}", err);
        exit(1);
    }
}
