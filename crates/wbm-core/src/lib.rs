//! Core domain + dispatch logic for the group broadcast dispatcher.
//!
//! This crate is intentionally platform-agnostic. The messaging gateway and the
//! report storage live behind ports (traits); the Whapi adapter lives in its own
//! crate.

pub mod batch;
pub mod config;
pub mod dispatch;
pub mod domain;
pub mod dry_run;
pub mod errors;
pub mod logging;
pub mod ports;
pub mod report;
pub mod store;

pub use errors::{Error, Result};
