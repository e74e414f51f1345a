//! evlogs searches EVM networks for Airnode protocol event logs.
//!
//! The library splits into a handful of small layers: [`range`] turns user
//! input into a concrete block range, [`registry`] and [`events`] describe
//! what to search for, [`scanner`] walks the range in chunks through the
//! [`rpc::LogSource`] capability, and [`output`] streams matches to the
//! console or a JSON/CSV file. [`cli`] wires them to the command line.

pub mod classify;
pub mod cli;
pub mod config;
pub mod dater;
pub mod error;
pub mod events;
pub mod output;
pub mod range;
pub mod registry;
pub mod rpc;
pub mod scanner;
pub mod session;

pub use error::{Error, Result};
