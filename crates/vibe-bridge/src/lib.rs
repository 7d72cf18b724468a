//! Vibe Bridge: pushes Vibe Engine grades into DaVinci Resolve.
//!
//! Two entry points share one engine: a live HTTP bridge the browser client
//! posts grades to, and a one-shot import of a grade blueprint file.

pub mod config;
pub mod import;
pub mod ipc;
pub mod server;

pub use config::BridgeConfig;
pub use server::BridgeState;
