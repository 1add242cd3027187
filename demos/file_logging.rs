//! File logging example
//!
//! Writes framed entries to a file, then reads them back with a stream
//! decoder filtered by level.
//!
//! Run with: cargo run --example file_logging

use rust_typed_logger::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct JobId(u32);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ItemProcessed {
    index: u32,
    elapsed_ms: u64,
}

fn spec() -> Specification {
    Specification::new()
        .context::<JobId>()
        .event::<ItemProcessed>()
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    println!("=== Rust Typed Logger - File Logging Example ===\n");

    let path = "application.log";
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
        .map_err(|e| LoggerError::io_operation("opening log file", e))?;

    let logger = Logger::builder()
        .specification(spec())
        .sink(file)
        .encoder(FrameEncoder)
        .build()?;

    println!("1. Processing items:");
    let job = logger.with_context(JobId(7));
    for index in 1..=5 {
        let elapsed_ms = if index == 3 { 900 } else { 40 };
        let event = ItemProcessed { index, elapsed_ms };
        if elapsed_ms > 500 {
            job.warn(event);
        } else {
            job.info(event);
        }
    }
    job.unstructured().info("all items processed");
    logger.flush()?;
    println!("   wrote {} entries to {}", logger.metrics().entries_written(), path);

    println!("\n2. Reading back warnings only:");
    let source = File::open(path).map_err(|e| LoggerError::io_operation("opening log file", e))?;
    let decoder = StreamDecoder::builder()
        .specification(spec())
        .filter(LevelFilter::warn())
        .build(source)?;

    for entry in BlockingReader::new(decoder).entries()? {
        println!("   [{}] {} {:?}", entry.level, entry.id, entry.event);
    }

    println!("\n=== Example completed successfully! ===");
    Ok(())
}
