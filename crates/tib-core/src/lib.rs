//! Core domain + application logic for the tracker issue bot.
//!
//! This crate is intentionally framework-agnostic. Telegram and the tracker
//! HTTP API live behind ports (traits) implemented in adapter crates.

pub mod config;
pub mod domain;
pub mod errors;
pub mod formatting;
pub mod freshness;
pub mod logging;
pub mod normalize;
pub mod pipeline;
pub mod ports;
pub mod session;
pub mod subscription;
pub mod timewindow;

pub use errors::{Error, Result};
