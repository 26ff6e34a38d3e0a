//! Archive engine for TAR, TAR+gzip, ZIP and single-file GZIP.
//!
//! `fulpack-core` creates, extracts, scans and verifies archives. Every
//! extracted path is validated against the destination root before anything
//! is written, content is checked against embedded or container-native
//! checksums, and per-entry failures are reported in the result instead of
//! aborting the whole operation.
//!
//! # Examples
//!
//! ```no_run
//! use fulpack_core::CreateOptions;
//! use fulpack_core::ExtractOptions;
//! use fulpack_core::VerifyOptions;
//!
//! # fn main() -> Result<(), fulpack_core::FulpackError> {
//! let info = fulpack_core::create(&["dirA"], "out.tar.gz", &CreateOptions::default())?;
//! println!("{} entries", info.entry_count);
//!
//! let validation = fulpack_core::verify("out.tar.gz", &VerifyOptions::default())?;
//! assert!(validation.valid);
//!
//! let result = fulpack_core::extract("out.tar.gz", "dest", &ExtractOptions::default())?;
//! println!("extracted {}, failed {}", result.extracted_count, result.error_count);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod api;
pub mod checksum;
pub mod config;
pub mod creation;
pub mod error;
mod extraction;
pub mod formats;
pub mod inspection;
pub mod io;
pub mod report;
pub mod security;
pub mod types;

#[cfg(test)]
pub(crate) mod test_utils;

pub use api::create;
pub use api::extract;
pub use api::info;
pub use api::scan;
pub use api::verify;
pub use config::CreateOptions;
pub use config::EntryLimitPolicy;
pub use config::ExtractOptions;
pub use config::OverwritePolicy;
pub use config::ScanOptions;
pub use config::VerifyOptions;
pub use error::FulpackError;
pub use error::Result;
pub use formats::ArchiveFormat;
pub use formats::ArchiveHandler;
pub use formats::detect_format;
pub use formats::handler_for;
pub use inspection::ArchiveScanner;
pub use report::ArchiveInfo;
pub use report::Check;
pub use report::EntryError;
pub use report::ExtractResult;
pub use report::ValidationResult;
pub use security::is_safe_path;
pub use security::validate_path;
pub use types::ArchiveEntry;
pub use types::DestDir;
pub use types::EntryKind;
pub use types::SafePath;
