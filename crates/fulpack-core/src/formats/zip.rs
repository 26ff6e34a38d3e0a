//! ZIP handler.
//!
//! Every ZIP entry carries a CRC-32 in the central directory. The `zip`
//! crate checks it while an entry is read to the end, so verification and
//! extraction get content checks without hashing twice.

use std::fs::File;
use std::io;
use std::io::BufReader;
use std::io::BufWriter;
use std::path::Path;
use std::path::PathBuf;
use std::time::SystemTime;

use zip::CompressionMethod;
use zip::ZipArchive;
use zip::ZipWriter;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;

use crate::FulpackError;
use crate::Result;
use crate::checksum::Digest;
use crate::config::CreateOptions;
use crate::config::ExtractOptions;
use crate::config::VerifyOptions;
use crate::creation;
use crate::creation::SourceKind;
use crate::extraction::ExtractSession;
use crate::extraction::Flow;
use crate::extraction::PendingEntry;
use crate::formats::ArchiveFormat;
use crate::formats::ArchiveHandler;
use crate::formats::common::from_unix_secs;
use crate::formats::common::to_unix_secs;
use crate::formats::open_archive;
use crate::inspection::verify::Verification;
use crate::io::PartialOutput;
use crate::report::ArchiveInfo;
use crate::report::ExtractResult;
use crate::report::ValidationResult;
use crate::security::sanitize_mode;
use crate::types::ArchiveEntry;
use crate::types::EntryKind;
use crate::types::normalize_entry_path;

const S_IFMT: u32 = 0o170_000;
const S_IFLNK: u32 = 0o120_000;

pub(crate) type ZipReader = ZipArchive<BufReader<File>>;

/// Handler for [`ArchiveFormat::Zip`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ZipHandler;

impl ArchiveHandler for ZipHandler {
    fn format(&self) -> ArchiveFormat {
        ArchiveFormat::Zip
    }

    fn create(
        &self,
        sources: &[PathBuf],
        output: &Path,
        options: &CreateOptions,
    ) -> Result<ArchiveInfo> {
        creation::check_create(ArchiveFormat::Zip, sources, output)?;

        let file = File::create(output)?;
        let guard = PartialOutput::new(output);
        let mut zip = ZipWriter::new(BufWriter::new(file));

        let base = if options.compression_level == 0 {
            SimpleFileOptions::default().compression_method(CompressionMethod::Stored)
        } else {
            SimpleFileOptions::default()
                .compression_method(CompressionMethod::Deflated)
                .compression_level(Some(i64::from(options.compression_level)))
        };

        let mut entry_count = 0;
        let mut total_size = 0u64;
        for entry in creation::source_entries(sources, &options.exclude_patterns, output) {
            let entry = entry?;
            let file_options = entry_options(base, &entry, options.preserve_permissions);

            match entry.kind {
                SourceKind::Directory => {
                    zip.add_directory(format!("{}/", entry.name), file_options)
                        .map_err(zip_error)?;
                }
                SourceKind::File => {
                    let mut source = File::open(&entry.path)?;
                    zip.start_file(entry.name.as_str(), file_options)
                        .map_err(zip_error)?;
                    total_size += io::copy(&mut source, &mut zip)?;
                }
            }

            entry_count += 1;
            tracing::debug!(name = %entry.name, "added entry");
        }

        let writer = zip.finish().map_err(zip_error)?;
        let file = writer.into_inner().map_err(io::IntoInnerError::into_error)?;
        let compressed_size = file.metadata()?.len();

        guard.commit();
        let info = ArchiveInfo::new(ArchiveFormat::Zip, entry_count, total_size, compressed_size);
        tracing::info!(
            output = %output.display(),
            entries = info.entry_count,
            total_size = info.total_size,
            compressed_size = info.compressed_size,
            "created archive"
        );
        Ok(info)
    }

    fn extract(
        &self,
        archive: &Path,
        dest: &Path,
        options: &ExtractOptions,
    ) -> Result<ExtractResult> {
        let mut reader = open(archive)?;
        let mut session = ExtractSession::new(dest, options)?;

        for index in 0..reader.len() {
            let stored_name = reader.name_for_index(index).map(normalize_entry_path);
            let mut file = match reader.by_index(index) {
                Ok(file) => file,
                Err(e) => {
                    match &stored_name {
                        Some(name) => session.record_entry_error(name, zip_error(e))?,
                        None => session.record_stream_error(archive, zip_error(e))?,
                    }
                    continue;
                }
            };
            let name = stored_name.unwrap_or_else(|| normalize_entry_path(file.name()));
            let kind = entry_kind(file.is_dir(), file.unix_mode());
            let pending = PendingEntry::new(&name, kind).with_mode(file.unix_mode());
            if session.process(pending, &mut file)? == Flow::Stop {
                break;
            }
        }

        let result = session.finish();
        tracing::info!(
            archive = %archive.display(),
            extracted = result.extracted_count,
            skipped = result.skipped_count,
            errors = result.error_count,
            "extracted archive"
        );
        Ok(result)
    }

    fn verify(&self, archive: &Path, options: &VerifyOptions) -> Result<ValidationResult> {
        let file = open_archive(archive)?;
        let mut verification = Verification::new(ArchiveFormat::Zip, archive, options);

        let mut reader = match ZipArchive::new(BufReader::new(file)) {
            Ok(reader) => reader,
            Err(e) => {
                verification.stream_error(format!("failed to open ZIP archive: {e}"));
                return Ok(verification.finish());
            }
        };

        for index in 0..reader.len() {
            let stored_name = reader.name_for_index(index).map(normalize_entry_path);
            let mut file = match reader.by_index(index) {
                Ok(file) => file,
                Err(e) => {
                    match &stored_name {
                        Some(name) => {
                            verification.entry(name);
                            verification.error(name, zip_error(e));
                        }
                        None => verification.stream_error(zip_error(e)),
                    }
                    continue;
                }
            };
            let name = stored_name.unwrap_or_else(|| normalize_entry_path(file.name()));
            verification.entry(&name);
            if file.is_dir() {
                continue;
            }

            let size = file.size();
            match io::copy(&mut file, &mut io::sink()) {
                Ok(read) if read == size => {
                    if verification.verify_checksums() {
                        verification.checksum_verified();
                    }
                }
                Ok(read) => verification.error(
                    &name,
                    format!("truncated entry data: expected {size} bytes, read {read}"),
                ),
                Err(e) => verification.error(
                    &name,
                    format!(
                        "content does not match crc32:{:08x}: {e}",
                        file.crc32()
                    ),
                ),
            }
        }

        Ok(verification.finish())
    }
}

/// Opens a ZIP archive and reads its central directory.
pub(crate) fn open(path: &Path) -> Result<ZipReader> {
    let file = open_archive(path)?;
    ZipArchive::new(BufReader::new(file))
        .map_err(|e| FulpackError::InvalidArchive(format!("failed to open ZIP archive: {e}")))
}

/// Reads entry metadata from the central directory without decompressing.
pub(crate) fn read_entry(reader: &mut ZipReader, index: usize) -> Result<ArchiveEntry> {
    let file = reader.by_index_raw(index).map_err(zip_error)?;
    let kind = entry_kind(file.is_dir(), file.unix_mode());
    Ok(ArchiveEntry {
        path: normalize_entry_path(file.name()),
        kind,
        size: file.size(),
        compressed_size: Some(file.compressed_size()),
        mode: file.unix_mode(),
        modified: file.last_modified().and_then(from_zip_datetime),
        checksum: (kind == EntryKind::File).then(|| Digest::from_crc32(file.crc32())),
    })
}

fn entry_kind(is_dir: bool, mode: Option<u32>) -> EntryKind {
    if is_dir {
        EntryKind::Directory
    } else if mode.is_some_and(|mode| mode & S_IFMT == S_IFLNK) {
        EntryKind::Symlink
    } else {
        EntryKind::File
    }
}

fn entry_options(
    base: SimpleFileOptions,
    entry: &creation::SourceEntry,
    preserve_permissions: bool,
) -> SimpleFileOptions {
    let default_mode = match entry.kind {
        SourceKind::File => 0o644,
        SourceKind::Directory => 0o755,
    };
    if !preserve_permissions {
        return base.unix_permissions(default_mode);
    }

    let options = base.unix_permissions(sanitize_mode(entry.mode.unwrap_or(default_mode)));
    match entry.modified.and_then(to_zip_datetime) {
        Some(modified) => options.last_modified_time(modified),
        None => options,
    }
}

fn zip_error(e: ZipError) -> FulpackError {
    match e {
        ZipError::Io(e) => FulpackError::Io(e),
        other => FulpackError::InvalidArchive(format!("ZIP error: {other}")),
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
fn to_zip_datetime(time: SystemTime) -> Option<zip::DateTime> {
    let secs = to_unix_secs(time);
    let (year, month, day) = civil_from_days((secs / 86_400) as i64);
    let rem = secs % 86_400;
    zip::DateTime::from_date_and_time(
        u16::try_from(year).ok()?,
        month,
        day,
        (rem / 3600) as u8,
        (rem % 3600 / 60) as u8,
        (rem % 60) as u8,
    )
    .ok()
}

fn from_zip_datetime(dt: zip::DateTime) -> Option<SystemTime> {
    let days = days_from_civil(i64::from(dt.year()), u32::from(dt.month()), u32::from(dt.day()));
    let secs = days * 86_400
        + i64::from(dt.hour()) * 3600
        + i64::from(dt.minute()) * 60
        + i64::from(dt.second());
    u64::try_from(secs).ok().and_then(from_unix_secs)
}

/// Days since 1970-01-01 for a proleptic Gregorian date.
fn days_from_civil(year: i64, month: u32, day: u32) -> i64 {
    let year = if month <= 2 { year - 1 } else { year };
    let era = year.div_euclid(400);
    let yoe = year - era * 400;
    let month = i64::from(month);
    let shifted = if month > 2 { month - 3 } else { month + 9 };
    let doy = (153 * shifted + 2) / 5 + i64::from(day) - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe - 719_468
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn civil_from_days(days: i64) -> (i64, u8, u8) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month as u8, day as u8)
}
