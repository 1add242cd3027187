//! Stream reading example
//!
//! Decodes a framed stream on a worker thread, showing how a corrupt frame
//! is reported in place and how a consumer cancels mid-stream.
//!
//! Run with: cargo run --example stream_reading

use rust_typed_logger::fake::FakeLogger;
use rust_typed_logger::prelude::*;
use serde::{Deserialize, Serialize};
use std::io::Cursor;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Heartbeat {
    seq: u32,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    println!("=== Rust Typed Logger - Stream Reading Example ===\n");

    let spec = Specification::new().event::<Heartbeat>();
    let fake = FakeLogger::new(spec.clone())?;

    let mut frame_ends = Vec::new();
    for seq in 0..6 {
        fake.info(Heartbeat { seq });
        fake.add_time_secs(1);
        frame_ends.push(fake.bytes().len());
    }

    println!("1. Streaming with one corrupt frame:");
    let mut bytes = fake.bytes();
    bytes[frame_ends[2] - 1] = b'?';
    let decoder = StreamDecoder::new(&spec, Cursor::new(bytes.clone()))?;
    for result in decoder.iter() {
        match result {
            Ok(entry) => println!("   entry {} at {}: {:?}", entry.id, entry.time, entry.event),
            Err(e) => println!("   error: {}", e),
        }
    }
    println!("   decoder finished as {}", decoder.state());

    println!("\n2. Collecting with a blocking reader, cancelling after three entries:");
    let decoder = StreamDecoder::builder()
        .specification(spec)
        .buffer_size(8)
        .build(Cursor::new(bytes))?;
    let mut seen = 0;
    let mut drained = BlockingReader::new(decoder)
        .on_entry(|_, cancel| {
            seen += 1;
            if seen == 3 {
                cancel.cancel();
            }
        })
        .drain();

    println!("   collected {} entries", drained.entries.len());
    if let Some(e) = drained.error() {
        println!("   errors: {}", e);
    }

    println!("\n=== Example completed successfully! ===");
    Ok(())
}
