#![deny(clippy::unwrap_used)]

//! Provision the Android Debug Bridge and batch-install a folder of
//! APKs onto the first connected device.
//!
//! The pipeline is deliberately sequential and blocking: check for
//! adb, fetch platform-tools if missing, poll for a device, install
//! each package once, log every outcome, clean up.

pub mod adb;
pub mod config;
pub mod device;
pub mod error;
pub mod install;
pub mod provision;
pub mod run;

pub use config::Config;
pub use error::{Error, Result};
