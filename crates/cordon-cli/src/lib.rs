//! # Cordon CLI
//!
//! Command-line driver for Cordon group storage.
//!
//! This crate provides:
//! - **Configuration**: `CordonConfig`, filled from flags, environment and `.env`
//! - **State**: The operator context over IPFS or in-memory storage
//! - **Demo**: An owner/member walkthrough of upload, revocation and recovery
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │         cordon binary (clap)            │
//! ├─────────────────────────────────────────┤
//! │      AppState: config + Operator        │
//! ├─────────────────────────────────────────┤
//! │              cordon-core                │
//! │ (registry, ledger, revocation workflow) │
//! ├─────────────────────────────────────────┤
//! │           cordon-blockstore             │
//! │          (IPFS or in-memory)            │
//! └─────────────────────────────────────────┘
//! ```

pub mod config;
pub mod demo;
pub mod state;

pub use config::CordonConfig;
pub use demo::{run_demo, DemoOutcome};
pub use state::AppState;
