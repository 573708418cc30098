//! # udpmux — session-multiplexed reliable delivery over UDP
//!
//! Many logical conversations share one UDP socket; each conversation gets
//! ordered, reliable delivery (retransmission, acknowledgment, rate pacing)
//! without a socket per peer, exposed as an async packet-stream API.
//!
//! ## Features
//!
//! - **Multiplexed**: unbounded conversations per socket, dispatched by a
//!   4-byte conversation id, idle ones evicted automatically
//! - **Reliable**: ARQ engine per conversation with a low-latency
//!   retransmission profile ([`udpmux_core`])
//! - **Bounded delivery**: per-session channel of 64 reassembled payloads
//!   with explicit drop accounting — ingestion never blocks
//! - **Two topologies**: single-driver [`Client`], per-session-task
//!   [`Server`], built on one shared [`Endpoint`]
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use udpmux::{frame, Addr, Client, MuxConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::bind(&Addr::new("0.0.0.0", 0), MuxConfig::default()).await?;
//!     let session = client.connect(1, &Addr::new("127.0.0.1", 8080));
//!
//!     // Send a framed message
//!     let mut buf = [0u8; 1400];
//!     let packet = frame::encode(&mut buf, 0x1300, b"hello")?;
//!     session.send(bytes::Bytes::copy_from_slice(packet))?;
//!
//!     // Wait for the reply
//!     let reply = session.recv().await?;
//!     let (command, payload) = frame::decode(&reply)?;
//!     println!("{command:#x}: {payload:?}");
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────┐
//! │   Client / Server    │  topologies, driver tasks
//! ├──────────────────────┤
//! │   Endpoint           │  session table, dispatch, eviction
//! ├──────────────────────┤
//! │   Session            │  reliability engine + delivery channel
//! ├──────────────────────┤
//! │   Transport          │  bound UDP socket, receive loop
//! └──────────────────────┘
//! ```

pub mod addr;
pub mod client;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod frame;
pub mod server;
pub mod session;
pub mod transport;

// Re-exports
pub use addr::Addr;
pub use client::Client;
pub use config::{MuxConfig, DELIVERY_CAPACITY};
pub use endpoint::{Endpoint, EndpointHooks};
pub use error::{MuxError, Result};
pub use server::{Server, SessionHandler};
pub use session::Session;
pub use transport::{Transport, UdpTransport};

// Engine surface from the core crate
pub use udpmux_core::{
    current_timestamp, peek_conv_id, random_conv_id, ConvId, EngineConfig, EngineStats,
    LatencyProfile, ReliabilityEngine, Timestamp,
};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
