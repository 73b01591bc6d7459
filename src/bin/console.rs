//! LodeKV Console Binary
//!
//! Interactive line console over an embedded engine.

use std::io::{self, BufRead, Write};

use clap::Parser;
use lodekv::{Config, Engine, LodeError};
use tracing_subscriber::{fmt, EnvFilter};

/// LodeKV Console
#[derive(Parser, Debug)]
#[command(name = "lodekv-console")]
#[command(about = "Interactive console for the LodeKV key-value store")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, default_value = "./lodekv_data")]
    data_dir: String,

    /// Memtable size in bytes above which it is flushed to a segment
    #[arg(short, long, default_value = "20")]
    flush_threshold: usize,

    /// WAL block size in bytes
    #[arg(short, long, default_value = "100")]
    block_size: usize,
}

fn main() {
    // Initialize tracing/logging (stderr, so it doesn't mix with replies)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,lodekv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    tracing::info!("LodeKV Console v{}", lodekv::VERSION);
    tracing::info!("Data directory: {}", args.data_dir);

    let config = Config::builder()
        .data_dir(&args.data_dir)
        .memtable_flush_threshold(args.flush_threshold)
        .wal_block_size(args.block_size)
        .build();

    let engine = match Engine::open(config) {
        Ok(e) => e,
        Err(e) => {
            tracing::error!("Failed to open engine: {}", e);
            std::process::exit(1);
        }
    };

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("> ");
        if stdout.flush().is_err() {
            break;
        }

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::error!("Failed to read input: {}", e);
                break;
            }
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some((&cmd, args)) = parts.split_first() else {
            continue;
        };

        match (cmd, args) {
            ("set", [key, value]) => match engine.set(key.as_bytes(), value.as_bytes()) {
                Ok(()) => println!("OK"),
                Err(e) => println!("ERROR: {}", e),
            },
            ("get", [key]) => match engine.get(key.as_bytes()) {
                Ok(value) => println!("{}", String::from_utf8_lossy(&value)),
                Err(LodeError::KeyNotFound) => println!("(nil)"),
                Err(e) => println!("ERROR: {}", e),
            },
            ("del", [key]) => match engine.del(key.as_bytes()) {
                Ok(value) => println!("{}", String::from_utf8_lossy(&value)),
                Err(LodeError::KeyNotFound) => println!("(nil)"),
                Err(e) => println!("ERROR: {}", e),
            },
            ("flush", []) => match engine.flush() {
                Ok(()) => println!("OK ({} segments)", engine.segment_count()),
                Err(e) => println!("ERROR: {}", e),
            },
            ("stats", []) => {
                println!("memtable entries: {}", engine.memtable_entry_count());
                println!("memtable bytes:   {}", engine.memtable_size());
                println!("segments:         {}", engine.segment_count());
            }
            ("exit" | "quit", []) => break,
            ("set", _) => println!("usage: set <key> <value>"),
            ("get" | "del", _) => println!("usage: {} <key>", cmd),
            _ => println!("unknown command: {}", cmd),
        }
    }

    if let Err(e) = engine.close() {
        tracing::error!("Failed to close engine: {}", e);
        std::process::exit(1);
    }
    println!("Bye!");
}
