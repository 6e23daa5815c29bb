//! Output formatters for scan results.
//!
//! This module provides different output formats for a [`ScanSession`]:
//! - Plain text for people
//! - JSON for automation and scripting
//!
//! Both write to any [`std::io::Write`]; nothing is persisted.
//!
//! # Example
//!
//! ```no_run
//! use arcdupe::error::ExitCode;
//! use arcdupe::output::JsonOutput;
//! use std::path::Path;
//!
//! let session = arcdupe::scan(Path::new(".")).unwrap();
//! let output = JsonOutput::from_session(&session, ExitCode::Success);
//! println!("{}", output.to_json_pretty().unwrap());
//! ```
//!
//! [`ScanSession`]: crate::session::ScanSession

pub mod json;
pub mod text;

pub use json::{JsonOutput, JsonOutputError};
pub use text::{write_report, TextOutput};
