#![forbid(unsafe_code)]
//! recall-core library.
//!
//! # Conventions
//!
//! - **Errors**: Use `anyhow::Result` at I/O boundaries and `thiserror` enums
//!   where callers need to branch on the failure.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).
//! - **Time**: Nothing here reads the wall clock. Callers pass `now`.

pub mod catalog;
pub mod config;
pub mod content;
pub mod email;
pub mod error;
pub mod history;
pub mod leitner;
pub mod model;
pub mod notify;
pub mod tags;
pub mod trigger;
