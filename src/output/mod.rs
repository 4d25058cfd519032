//! Report writers for scan results.
//!
//! - [`manifest`]: the tab-separated text manifest (default)
//! - [`json`]: a JSON document for scripting
//!
//! # Example
//!
//! ```no_run
//! use bytedupe::duplicates::DuplicateFinder;
//! use bytedupe::output::{ManifestTarget, ManifestWriter};
//! use std::path::PathBuf;
//!
//! let result = DuplicateFinder::with_defaults()
//!     .find_duplicates(&[PathBuf::from(".")])
//!     .unwrap();
//! let mut stdout = std::io::stdout();
//! ManifestWriter::new(&result, ManifestTarget::Console)
//!     .write_to(&mut stdout)
//!     .unwrap();
//! ```

pub mod json;
pub mod manifest;

pub use json::{JsonOutput, JsonOutputError};
pub use manifest::{ManifestTarget, ManifestWriter};
