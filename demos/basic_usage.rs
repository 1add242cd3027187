//! Basic logger usage example
//!
//! Declares a context and an event type, then logs at different levels as
//! JSON lines on stdout.
//!
//! Run with: cargo run --example basic_usage

use rust_typed_logger::prelude::*;
use rust_typed_logger::{info, warn};
use serde::{Deserialize, Serialize};
use std::io;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct RequestId(String);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct UserLogin {
    user: String,
    success: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_writer(io::stderr).init();
    println!("=== Rust Typed Logger - Basic Usage Example ===\n");

    let spec = Specification::new()
        .context::<RequestId>()
        .event::<UserLogin>();

    let logger = Logger::builder()
        .specification(spec)
        .sink(io::stdout())
        .marshaller(JsonMarshaller::new())
        .level(Level::Info)
        .build()?;

    println!("1. Typed events:");
    logger.info(UserLogin {
        user: "ana".into(),
        success: true,
    });
    logger.debug(UserLogin {
        user: "hidden".into(),
        success: true,
    });

    println!("\n2. Contexts attach to every entry of a derived logger:");
    let request = logger.with_context(RequestId("r-17".into()));
    request.warn(UserLogin {
        user: "bob".into(),
        success: false,
    });

    println!("\n3. Undeclared types are rejected before anything is written:");
    if let Err(e) = logger.emit(Level::Info, RequestId("not an event".into())) {
        println!("   rejected: {}", e);
    }

    println!("\n4. Unstructured messages and macros:");
    let text = request.unstructured().with_field("attempt", 2);
    text.info("retrying login");
    info!(logger, "listening on port {}", 8080);
    warn!(text, "slow response: {}ms", 950);

    println!("\n=== Example completed successfully! ===");
    Ok(())
}
