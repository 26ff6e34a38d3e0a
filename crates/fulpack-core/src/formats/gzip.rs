//! Single-file GZIP handler.
//!
//! A GZIP archive holds exactly one file, possibly split over several
//! concatenated members as RFC 1952 allows. The entry is named after the
//! archive with its `.gz` suffix removed; when the archive name has no such
//! suffix, the FNAME recorded in the first member's header is used instead.

use std::fs;
use std::fs::File;
use std::io;
use std::io::BufReader;
use std::io::BufWriter;
use std::path::Path;
use std::path::PathBuf;

use flate2::Compression;
use flate2::GzBuilder;
use flate2::bufread::MultiGzDecoder;

use crate::FulpackError;
use crate::Result;
use crate::checksum::Algorithm;
use crate::config::CreateOptions;
use crate::config::ExtractOptions;
use crate::config::VerifyOptions;
use crate::creation;
use crate::extraction::ExtractSession;
use crate::extraction::PendingEntry;
use crate::formats::ArchiveFormat;
use crate::formats::ArchiveHandler;
use crate::formats::common::from_unix_secs;
use crate::formats::common::to_unix_secs;
use crate::formats::open_archive;
use crate::inspection::verify::Verification;
use crate::io::CountingWriter;
use crate::io::HashingReader;
use crate::io::PartialOutput;
use crate::report::ArchiveInfo;
use crate::report::ExtractResult;
use crate::report::ValidationResult;
use crate::types::ArchiveEntry;
use crate::types::EntryKind;

type Decoder = MultiGzDecoder<BufReader<File>>;

/// Handler for [`ArchiveFormat::Gzip`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GzipHandler;

impl ArchiveHandler for GzipHandler {
    fn format(&self) -> ArchiveFormat {
        ArchiveFormat::Gzip
    }

    fn create(
        &self,
        sources: &[PathBuf],
        output: &Path,
        options: &CreateOptions,
    ) -> Result<ArchiveInfo> {
        creation::check_create(self.format(), sources, output)?;
        let source = sources.first().ok_or(FulpackError::NoSources)?;
        let metadata = fs::metadata(source)?;
        if metadata.is_dir() {
            return Err(FulpackError::InvalidSource {
                reason: format!("gzip cannot compress directories: {}", source.display()),
            });
        }
        if !metadata.is_file() {
            return Err(FulpackError::InvalidSource {
                reason: format!(
                    "gzip requires a single regular file: {}",
                    source.display()
                ),
            });
        }

        let mut input = File::open(source)?;
        let file = File::create(output)?;
        let guard = PartialOutput::new(output);

        let mut builder = GzBuilder::new();
        if let Some(name) = source.file_name() {
            builder = builder.filename(name.to_string_lossy().as_bytes());
        }
        if options.preserve_permissions
            && let Ok(modified) = metadata.modified()
        {
            builder = builder.mtime(u32::try_from(to_unix_secs(modified)).unwrap_or(0));
        }

        let level = Compression::new(u32::from(options.compression_level));
        let mut encoder = builder.write(CountingWriter::new(BufWriter::new(file)), level);
        let total_size = io::copy(&mut input, &mut encoder)?;
        let compressed_size = encoder.finish()?.close()?;

        guard.commit();
        let info = ArchiveInfo::new(ArchiveFormat::Gzip, 1, total_size, compressed_size);
        tracing::info!(
            output = %output.display(),
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
        let (mut decoder, name) = open(archive)?;

        let mut session = ExtractSession::new(dest, options)?;
        session.process(PendingEntry::new(&name, EntryKind::File), &mut decoder)?;

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

    /// Decompresses every member. The decoder checks each member's CRC-32
    /// and ISIZE against its trailer, so a clean pass verifies the entry.
    fn verify(&self, archive: &Path, options: &VerifyOptions) -> Result<ValidationResult> {
        let file = open_archive(archive)?;
        let mut verification = Verification::new(ArchiveFormat::Gzip, archive, options);

        let mut decoder = MultiGzDecoder::new(BufReader::new(file));
        let Some(name) = decoder.header().map(|h| output_name(archive, h.filename())) else {
            verification.stream_error(not_gzip(archive));
            return Ok(verification.finish());
        };
        verification.entry(&name);

        match io::copy(&mut decoder, &mut io::sink()) {
            Ok(read) => {
                tracing::debug!(path = %name, bytes = read, "gzip members verified");
                if verification.verify_checksums() {
                    verification.checksum_verified();
                }
            }
            Err(e) => verification.error(&name, format!("corrupted stream: {e}")),
        }

        Ok(verification.finish())
    }
}

/// Opens an archive and resolves the entry name from the first header.
fn open(archive: &Path) -> Result<(Decoder, String)> {
    let file = open_archive(archive)?;
    let decoder = MultiGzDecoder::new(BufReader::new(file));
    let name = decoder
        .header()
        .map(|header| output_name(archive, header.filename()))
        .ok_or_else(|| not_gzip(archive))?;
    Ok((decoder, name))
}

/// Builds the single scan entry.
///
/// Trailers only describe their own member, so the size and CRC-32 of the
/// whole entry come from decompressing every member.
pub(crate) fn read_entry(archive: &Path) -> Result<ArchiveEntry> {
    let compressed_size = fs::metadata(archive)?.len();
    let (mut decoder, name) = open(archive)?;
    let mtime = decoder.header().map_or(0, flate2::GzHeader::mtime);

    let mut hashing = HashingReader::new(&mut decoder, Algorithm::Crc32);
    io::copy(&mut hashing, &mut io::sink()).map_err(|e| {
        FulpackError::InvalidArchive(format!("corrupted gzip stream {}: {e}", archive.display()))
    })?;
    let (crc, size) = hashing.finish();

    Ok(ArchiveEntry {
        path: name,
        kind: EntryKind::File,
        size,
        compressed_size: Some(compressed_size),
        mode: None,
        modified: from_unix_secs(u64::from(mtime)),
        checksum: Some(crc),
    })
}

fn output_name(archive: &Path, header_name: Option<&[u8]>) -> String {
    let name = archive
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let has_suffix = name.len() > 3 && name.to_ascii_lowercase().ends_with(".gz");
    if has_suffix {
        return name[..name.len() - 3].to_string();
    }
    match header_name {
        Some(stored) if !stored.is_empty() => String::from_utf8_lossy(stored).into_owned(),
        _ => format!("{name}.out"),
    }
}

fn not_gzip(archive: &Path) -> FulpackError {
    FulpackError::InvalidArchive(format!("not a gzip stream: {}", archive.display()))
}
