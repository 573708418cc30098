//! Pure synchronous reliability engine.
//!
//! This crate implements the per-conversation ARQ state machine with zero
//! runtime dependencies — no tokio, no async, no I/O. It only depends on
//! `bytes` and `tracing`.
//!
//! ```text
//! ┌──────────────────────────────┐
//! │  udpmux-core                 │
//! │                              │
//! │  protocol  ← wire segments   │
//! │  config    ← tuning          │
//! │  error     ← 3 variants      │
//! │  engine    ← state machine   │
//! └──────────────────────────────┘
//! ```
//!
//! Outgoing wire packets accumulate in an internal queue; the owner drains
//! them with [`ReliabilityEngine::drain_output`] and puts them on the wire
//! however it likes.

pub mod config;
pub mod engine;
pub mod error;
pub mod protocol;

pub use config::{EngineConfig, LatencyProfile};
pub use engine::ReliabilityEngine;
pub use error::{EngineError, EngineResult};
pub use protocol::*;
