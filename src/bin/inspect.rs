//! arenastore snapshot inspector
//!
//! Prints the header and slot geometry of a store snapshot, optionally
//! loading it to verify the id index can be rebuilt.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use arenastore::store::{Header, RecordStore};
use arenastore::{BufferOps, BytesBufferOps, HeapBufferOps, Result};
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

/// arenastore snapshot inspector
#[derive(Parser, Debug)]
#[command(name = "arenastore-inspect")]
#[command(about = "Inspect an arenastore snapshot file")]
#[command(version)]
struct Args {
    /// Snapshot file written by RecordStore::save
    file: PathBuf,

    /// Load the snapshot and rebuild its id index
    #[arg(short, long)]
    verify: bool,

    /// Print every live id (implies --verify)
    #[arg(short, long)]
    list: bool,

    /// Snapshot was written with the native-order adapter
    #[arg(short, long)]
    native: bool,
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,arenastore=debug"));

    fmt().with_env_filter(filter).with_target(true).init();

    let args = Args::parse();

    if let Err(e) = run(&args) {
        tracing::error!("Failed to inspect {}: {}", args.file.display(), e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<()> {
    let mut contents = Vec::new();
    File::open(&args.file)?.read_to_end(&mut contents)?;

    let header = Header::from_bytes(&contents)?;
    let region = &contents[Header::LENGTH.min(contents.len())..];
    let slot_length = header.slot_length();

    println!("file:               {}", args.file.display());
    println!("version:            {}", header.version);
    println!("store length:       {} bytes", header.store_length);
    println!("max record length:  {} bytes", header.max_record_length);
    println!("slot length:        {} bytes", slot_length);
    println!("slot capacity:      {}", header.store_length as usize / slot_length);
    println!("next write offset:  {}", header.next_write_offset);
    println!("live records:       {}", header.live_slots());
    if header.store_length > 0 {
        let used = (header.next_write_offset as usize).saturating_sub(Header::LENGTH);
        println!(
            "utilisation:        {:.1}%",
            used as f64 * 100.0 / header.store_length as f64
        );
    }
    println!("region crc32:       {:08x}", crc32fast::hash(region));

    header.check_version()?;

    if args.verify || args.list {
        if args.native {
            verify(BytesBufferOps, &args.file, args.list)
        } else {
            verify(HeapBufferOps, &args.file, args.list)
        }
    } else {
        Ok(())
    }
}

fn verify<O: BufferOps>(ops: O, path: &Path, list: bool) -> Result<()> {
    let store = RecordStore::open_with(ops, path)?;
    println!("verified records:   {}", store.size());

    if list {
        let mut ids: Vec<i64> = store.ids().collect();
        ids.sort_unstable();
        for id in ids {
            println!("{}", id);
        }
    }
    Ok(())
}
