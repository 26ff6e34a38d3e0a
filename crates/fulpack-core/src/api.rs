//! High-level API.
//!
//! Each function detects the archive format from the file name and
//! dispatches to the matching handler. To force a format, set
//! [`CreateOptions::format`] or call the handler from
//! [`handler_for`](crate::formats::handler_for) directly.

use std::path::Path;
use std::path::PathBuf;

use crate::Result;
use crate::config::CreateOptions;
use crate::config::ExtractOptions;
use crate::config::ScanOptions;
use crate::config::VerifyOptions;
use crate::formats::detect_format;
use crate::formats::handler_for;
use crate::inspection::ArchiveScanner;
use crate::report::ArchiveInfo;
use crate::report::ExtractResult;
use crate::report::ValidationResult;

/// Creates an archive from source files and directories.
///
/// The format comes from `options.format`, or from the output file name
/// when unset. Directory sources are stored under their own name, walked in
/// sorted order; symbolic links are followed.
///
/// # Errors
///
/// Returns an error if:
/// - The format cannot be determined or the options are invalid
/// - No sources are given, or a source does not exist
/// - The sources violate a format constraint (GZIP takes one file)
/// - An I/O operation fails
///
/// On error no output file is left behind.
///
/// # Examples
///
/// ```no_run
/// use fulpack_core::CreateOptions;
/// use fulpack_core::create;
///
/// # fn main() -> Result<(), fulpack_core::FulpackError> {
/// let info = create(&["dirA"], "out.tar.gz", &CreateOptions::default())?;
/// println!("{} entries, ratio {:.2}", info.entry_count, info.compression_ratio);
/// # Ok(())
/// # }
/// ```
pub fn create<P: AsRef<Path>, Q: AsRef<Path>>(
    sources: &[P],
    output: Q,
    options: &CreateOptions,
) -> Result<ArchiveInfo> {
    let output = output.as_ref();
    options.validate()?;
    let format = match options.format {
        Some(format) => format,
        None => detect_format(output)?,
    };
    let sources: Vec<PathBuf> = sources.iter().map(|s| s.as_ref().to_path_buf()).collect();

    tracing::debug!(output = %output.display(), %format, sources = sources.len(), "creating archive");
    handler_for(format).create(&sources, output, options)
}

/// Extracts an archive into `dest`, creating it if needed.
///
/// Entries that fail (unsafe path, existing target, I/O error, checksum
/// mismatch) are recorded in the result and extraction moves on, unless
/// `options.strict` is set.
///
/// # Errors
///
/// Returns an error only if the format is unknown, the archive cannot be
/// opened, the destination cannot be prepared, or strict mode hits a failed
/// entry.
///
/// # Examples
///
/// ```no_run
/// use fulpack_core::ExtractOptions;
/// use fulpack_core::extract;
///
/// # fn main() -> Result<(), fulpack_core::FulpackError> {
/// let result = extract("out.tar.gz", "dest", &ExtractOptions::default())?;
/// for error in &result.errors {
///     eprintln!("skipped {error}");
/// }
/// # Ok(())
/// # }
/// ```
pub fn extract<P: AsRef<Path>, Q: AsRef<Path>>(
    archive: P,
    dest: Q,
    options: &ExtractOptions,
) -> Result<ExtractResult> {
    let archive = archive.as_ref();
    let format = detect_format(archive)?;
    handler_for(format).extract(archive, dest.as_ref(), options)
}

/// Opens a lazy, restartable scan over an archive's entries.
///
/// # Errors
///
/// Returns an error if the format is unknown or the archive cannot be
/// opened.
pub fn scan<P: AsRef<Path>>(archive: P, options: &ScanOptions) -> Result<ArchiveScanner> {
    let archive = archive.as_ref();
    let format = detect_format(archive)?;
    handler_for(format).scan(archive, options)
}

/// Verifies an archive without writing anything.
///
/// Content problems make the result invalid; they are never returned as
/// errors.
///
/// # Errors
///
/// Returns an error only if the format is unknown or the archive file cannot
/// be opened.
///
/// # Examples
///
/// ```no_run
/// use fulpack_core::VerifyOptions;
/// use fulpack_core::verify;
///
/// # fn main() -> Result<(), fulpack_core::FulpackError> {
/// let result = verify("backup.zip", &VerifyOptions::default())?;
/// if !result.valid {
///     for error in &result.errors {
///         eprintln!("{error}");
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub fn verify<P: AsRef<Path>>(archive: P, options: &VerifyOptions) -> Result<ValidationResult> {
    let archive = archive.as_ref();
    let format = detect_format(archive)?;
    handler_for(format).verify(archive, options)
}

/// Summarizes an archive.
///
/// `entry_count` equals the number of entries an unfiltered [`scan`]
/// yields.
///
/// # Errors
///
/// Returns an error if the format is unknown, the archive cannot be opened,
/// or an entry header is unreadable.
pub fn info<P: AsRef<Path>>(archive: P) -> Result<ArchiveInfo> {
    let archive = archive.as_ref();
    let format = detect_format(archive)?;
    handler_for(format).info(archive)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::FulpackError;
    use crate::formats::ArchiveFormat;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_create_detects_format() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("a.txt");
        fs::write(&file, "a").unwrap();

        let info = create(&[&file], temp.path().join("a.zip"), &CreateOptions::default()).unwrap();
        assert_eq!(info.format, ArchiveFormat::Zip);
    }

    #[test]
    fn test_create_explicit_format_overrides_name() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("a.txt");
        fs::write(&file, "a").unwrap();

        let output = temp.path().join("archive.bin");
        let options = CreateOptions::default().with_format(Some(ArchiveFormat::Tar));
        let info = create(&[&file], &output, &options).unwrap();
        assert_eq!(info.format, ArchiveFormat::Tar);

        let summary = handler_for(ArchiveFormat::Tar).info(&output).unwrap();
        assert_eq!(summary.entry_count, 1);
    }

    #[test]
    fn test_create_unknown_extension() {
        let temp = TempDir::new().unwrap();
        let err = create(&[temp.path()], temp.path().join("out.rar"), &CreateOptions::default())
            .unwrap_err();
        assert!(matches!(err, FulpackError::UnsupportedFormat { .. }));
    }

    #[test]
    fn test_create_invalid_level() {
        let temp = TempDir::new().unwrap();
        let options = CreateOptions::default().with_compression_level(12);
        let err = create(&[temp.path()], temp.path().join("out.zip"), &options).unwrap_err();
        assert!(matches!(err, FulpackError::InvalidCompressionLevel { level: 12 }));
    }

    #[test]
    fn test_missing_archive_is_fatal() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("missing.tar.gz");
        assert!(matches!(
            extract(&missing, temp.path().join("dest"), &ExtractOptions::default()),
            Err(FulpackError::ArchiveNotFound { .. })
        ));
        assert!(matches!(
            verify(&missing, &VerifyOptions::default()),
            Err(FulpackError::ArchiveNotFound { .. })
        ));
        assert!(matches!(info(&missing), Err(FulpackError::ArchiveNotFound { .. })));
    }
}
