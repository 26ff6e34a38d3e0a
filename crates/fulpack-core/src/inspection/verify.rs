//! Verification bookkeeping shared by the format handlers.

use std::path::Path;

use crate::checksum;
use crate::checksum::Digest;
use crate::config::VerifyOptions;
use crate::formats::ArchiveFormat;
use crate::report::Check;
use crate::report::EntryError;
use crate::report::ValidationResult;
use crate::security::validate_path;

/// Accumulates the outcome of one `verify()` call.
///
/// Content problems are recorded, never raised: the caller always gets a
/// [`ValidationResult`].
pub(crate) struct Verification<'a> {
    format: ArchiveFormat,
    archive: &'a Path,
    options: &'a VerifyOptions,
    result: ValidationResult,
}

impl<'a> Verification<'a> {
    pub fn new(format: ArchiveFormat, archive: &'a Path, options: &'a VerifyOptions) -> Self {
        let mut result = ValidationResult::default();
        result.checks_performed.insert(Check::StructureValid);
        if options.check_paths {
            result.checks_performed.insert(Check::PathSafety);
        }
        if options.verify_checksums {
            result.checks_performed.insert(Check::ChecksumsVerified);
        }
        Self {
            format,
            archive,
            options,
            result,
        }
    }

    pub const fn verify_checksums(&self) -> bool {
        self.options.verify_checksums
    }

    /// Counts an entry and checks its path.
    pub fn entry(&mut self, path: &str) {
        self.result.entry_count += 1;
        if self.options.check_paths
            && let Err(e) = validate_path(path)
        {
            self.error(path, e);
        }
    }

    /// Compares a recomputed digest with the recorded one.
    pub fn checksum(&mut self, path: &str, expected: &Digest, actual: &Digest) {
        match checksum::ensure_match(path, expected, actual) {
            Ok(()) => self.result.checksums_verified += 1,
            Err(e) => self.error(path, e),
        }
    }

    /// Counts a checksum the container format verified while reading.
    pub fn checksum_verified(&mut self) {
        self.result.checksums_verified += 1;
    }

    pub fn error(&mut self, path: &str, reason: impl ToString) {
        let error = EntryError::new(path, reason);
        tracing::debug!(path, reason = %error.reason, "verification problem");
        self.result.errors.push(error);
    }

    /// Records a problem with the container itself.
    pub fn stream_error(&mut self, reason: impl ToString) {
        let path = self.archive.display().to_string();
        self.error(&path, reason);
    }

    pub fn finish(mut self) -> ValidationResult {
        self.result.valid = self.result.errors.is_empty();
        tracing::info!(
            archive = %self.archive.display(),
            format = %self.format,
            valid = self.result.valid,
            entries = self.result.entry_count,
            checksums_verified = self.result.checksums_verified,
            errors = self.result.errors.len(),
            "verified archive"
        );
        self.result
    }
}
