//! tabletkv CLI
//!
//! Inspect tablets and logs, and read or write a database directory.

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tabletkv::wal::WalReader;
use tabletkv::{
    ByteView, Config, Database, DiskFileSystem, KeyValue, ReaderOptions, StreamTablet, Tablet,
};
use tracing_subscriber::{fmt, EnvFilter};

/// tabletkv CLI
#[derive(Parser, Debug)]
#[command(name = "tabletkv-cli")]
#[command(about = "Inspect and query tabletkv databases")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print every entry of a tablet file
    DumpTablet {
        /// Tablet file
        path: PathBuf,

        /// Read front to back without using the index
        #[arg(long)]
        stream: bool,

        /// Verify block checksums
        #[arg(long)]
        verify: bool,
    },

    /// Print every transaction of a write-ahead log
    DumpLog {
        /// Log file
        path: PathBuf,
    },

    /// Get a value by key
    ///
    /// Opening replays write.log into a new tablet and truncates the log,
    /// so this modifies the directory. The directory must already exist.
    Get {
        /// Database directory
        dir: PathBuf,

        /// The key to get
        key: String,
    },

    /// Set a key-value pair
    Put {
        /// Database directory
        dir: PathBuf,

        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },

    /// List live entries in key order
    ///
    /// Opening replays write.log into a new tablet and truncates the log,
    /// so this modifies the directory. The directory must already exist.
    Scan {
        /// Database directory
        dir: PathBuf,

        /// Only keys starting with this prefix
        #[arg(short, long)]
        prefix: Option<String>,
    },
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tabletkv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args.command) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(command: Commands) -> tabletkv::Result<()> {
    match command {
        Commands::DumpTablet {
            path,
            stream,
            verify,
        } => {
            let opts = ReaderOptions::default().verify_checksums(verify);
            if stream {
                let reader = BufReader::new(File::open(&path)?);
                for kv in StreamTablet::new(reader, opts).find(None)? {
                    print_kv(&kv?);
                }
            } else {
                let tablet = Tablet::open(ByteView::from(std::fs::read(&path)?), opts)?;
                for (i, record) in tablet.index().iter().enumerate() {
                    let header = tablet.block_header(i)?;
                    println!(
                        "# block {} offset={} length={} type={} checksum=0x{:08x} first_key={}",
                        i, record.offset, record.length, header.block_type, header.checksum,
                        record.first_key
                    );
                }
                for kv in tablet.iter()? {
                    print_kv(&kv?);
                }
            }
        }
        Commands::DumpLog { path } => {
            let log = ByteView::from(std::fs::read(&path)?);
            for (i, transaction) in WalReader::new(log).transactions().enumerate() {
                match transaction {
                    Ok(bytes) => {
                        println!("# transaction {} ({} bytes)", i, bytes.len());
                        for kv in tabletkv::Batch::from_view(bytes) {
                            print_kv(&kv?);
                        }
                    }
                    Err(e) => println!("# transaction {} skipped: {}", i, e),
                }
            }
        }
        Commands::Get { dir, key } => {
            let db = open(dir, false)?;
            match db.get(key.as_bytes())? {
                Some(value) => println!("{}", value),
                None => println!("(nil)"),
            }
        }
        Commands::Put { dir, key, value } => {
            let db = open(dir, true)?;
            db.put(key.as_bytes(), value.as_bytes())?;
            db.close()?;
            println!("OK");
        }
        Commands::Scan { dir, prefix } => {
            let db = open(dir, false)?;
            let scan = match &prefix {
                Some(p) => db.find_by_prefix(p.as_bytes())?,
                None => db.find(None)?,
            };
            for kv in scan {
                print_kv(&kv?);
            }
        }
    }
    Ok(())
}

fn open(dir: PathBuf, create: bool) -> tabletkv::Result<Database> {
    let config = Config::builder().data_dir(dir).create_if_missing(create).build();
    Database::open(config, Arc::new(DiskFileSystem::new()))
}

fn print_kv(kv: &KeyValue) {
    match &kv.value {
        Some(value) => println!("{}\t{}", kv.key, value),
        None => println!("{}\t<deleted>", kv.key),
    }
}
