//! Provisioning tools for the Customer 360 & AI Assistant warehouse demo.
//!
//! Every capability of the demo (tables, search services, agents) lives in the
//! remote warehouse. This crate only sequences the SQL assets of the demo
//! project through the vendor query tool and reports on what came out.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod cli;
pub mod config;
pub mod error;
pub mod manager;
pub mod remote;
pub mod sequence;
pub mod status;

pub use error::{ProvisionError, Result};
