//! TAR and TAR+gzip handler.
//!
//! Archives are written in ustar layout. Unless disabled, every regular file
//! is preceded by a pax extended header holding
//! `FULPACK.checksum=<algorithm:hex>`, which other tools ignore and which
//! `verify()` and `extract()` use to check content.

use std::fs::File;
use std::io;
use std::io::BufReader;
use std::io::BufWriter;
use std::io::Read;
use std::io::Seek;
use std::io::SeekFrom;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use tar::Archive;
use tar::Builder;
use tar::EntryType;
use tar::Header;

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
use crate::io::CountingWriter;
use crate::io::HashingReader;
use crate::io::PartialOutput;
use crate::report::ArchiveInfo;
use crate::report::ExtractResult;
use crate::report::ValidationResult;
use crate::security::sanitize_mode;
use crate::types::ArchiveEntry;
use crate::types::EntryKind;
use crate::types::normalize_entry_path;

/// Pax record key for embedded per-file checksums.
pub const PAX_CHECKSUM_KEY: &str = "FULPACK.checksum";

const DEFAULT_FILE_MODE: u32 = 0o644;
const DEFAULT_DIR_MODE: u32 = 0o755;

pub(crate) type TarReader = Archive<Box<dyn Read>>;

/// Handler for [`ArchiveFormat::Tar`] and [`ArchiveFormat::TarGz`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TarHandler {
    compressed: bool,
}

impl TarHandler {
    /// Uncompressed TAR.
    pub const PLAIN: Self = Self { compressed: false };
    /// Gzip-compressed TAR.
    pub const GZIP: Self = Self { compressed: true };
}

#[derive(Debug, Default)]
struct CreateStats {
    entries: usize,
    bytes: u64,
}

impl ArchiveHandler for TarHandler {
    fn format(&self) -> ArchiveFormat {
        if self.compressed {
            ArchiveFormat::TarGz
        } else {
            ArchiveFormat::Tar
        }
    }

    fn create(
        &self,
        sources: &[PathBuf],
        output: &Path,
        options: &CreateOptions,
    ) -> Result<ArchiveInfo> {
        creation::check_create(self.format(), sources, output)?;

        let file = File::create(output)?;
        let guard = PartialOutput::new(output);
        let writer = CountingWriter::new(BufWriter::new(file));

        let (stats, compressed_size) = if self.compressed {
            let level = Compression::new(u32::from(options.compression_level));
            let mut builder = Builder::new(GzEncoder::new(writer, level));
            let stats = append_sources(&mut builder, sources, output, options)?;
            (stats, builder.into_inner()?.finish()?.close()?)
        } else {
            let mut builder = Builder::new(writer);
            let stats = append_sources(&mut builder, sources, output, options)?;
            (stats, builder.into_inner()?.close()?)
        };

        guard.commit();
        let info = ArchiveInfo::new(self.format(), stats.entries, stats.bytes, compressed_size);
        tracing::info!(
            output = %output.display(),
            format = %self.format(),
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
        let mut reader = open(archive, self.compressed)?;
        let mut session = ExtractSession::new(dest, options)?;

        match reader.entries() {
            Ok(entries) => {
                for entry in entries {
                    let mut entry = match entry {
                        Ok(entry) => entry,
                        Err(e) => {
                            session.record_stream_error(archive, entry_read_error(&e))?;
                            break;
                        }
                    };
                    let meta = match read_entry(&mut entry) {
                        Ok(meta) => meta,
                        Err(e) => {
                            session.record_stream_error(archive, e)?;
                            break;
                        }
                    };

                    let pending = PendingEntry::new(&meta.path, meta.kind)
                        .with_mode(meta.mode)
                        .with_checksum(meta.checksum.clone());
                    if session.process(pending, &mut entry)? == Flow::Stop {
                        break;
                    }
                }
            }
            Err(e) => session.record_stream_error(archive, entry_read_error(&e))?,
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
        let mut reader = open(archive, self.compressed)?;
        let mut verification = Verification::new(self.format(), archive, options);

        match reader.entries() {
            Ok(entries) => {
                for entry in entries {
                    let mut entry = match entry {
                        Ok(entry) => entry,
                        Err(e) => {
                            verification.stream_error(entry_read_error(&e));
                            break;
                        }
                    };
                    if !verify_entry(&mut entry, &mut verification) {
                        break;
                    }
                }
            }
            Err(e) => verification.stream_error(entry_read_error(&e)),
        }

        // Reading to the end makes the gzip decoder check its trailer.
        if let Err(e) = io::copy(&mut reader.into_inner(), &mut io::sink()) {
            verification.stream_error(format!("corrupted stream: {e}"));
        }

        Ok(verification.finish())
    }
}

/// Opens a TAR or TAR+gzip archive for sequential reading.
pub(crate) fn open(path: &Path, compressed: bool) -> Result<TarReader> {
    let file = open_archive(path)?;
    let reader: Box<dyn Read> = if compressed {
        Box::new(GzDecoder::new(BufReader::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };
    Ok(Archive::new(reader))
}

/// Reads an entry's metadata without consuming its data.
///
/// A malformed embedded checksum is ignored here and reported by
/// `verify()`.
pub(crate) fn read_entry<R: Read>(entry: &mut tar::Entry<'_, R>) -> Result<ArchiveEntry> {
    let (mut meta, embedded) = read_header(entry)?;
    meta.checksum = embedded.and_then(|raw| match Digest::parse(&raw) {
        Ok(digest) => Some(digest),
        Err(e) => {
            tracing::warn!(path = %meta.path, error = %e, "ignoring malformed embedded checksum");
            None
        }
    });
    Ok(meta)
}

fn read_header<R: Read>(entry: &mut tar::Entry<'_, R>) -> Result<(ArchiveEntry, Option<String>)> {
    let embedded = embedded_checksum(entry)?;

    let path = normalize_entry_path(&String::from_utf8_lossy(&entry.path_bytes()));
    let header = entry.header();
    let entry_type = header.entry_type();
    let kind = if matches!(entry_type, EntryType::Regular | EntryType::Continuous) {
        EntryKind::File
    } else if entry_type.is_dir() {
        EntryKind::Directory
    } else if entry_type.is_symlink() {
        EntryKind::Symlink
    } else {
        EntryKind::Other
    };

    let meta = ArchiveEntry {
        path,
        kind,
        size: entry.size(),
        compressed_size: None,
        mode: header.mode().ok(),
        modified: header.mtime().ok().and_then(from_unix_secs),
        checksum: None,
    };
    Ok((meta, embedded))
}

fn embedded_checksum<R: Read>(entry: &mut tar::Entry<'_, R>) -> Result<Option<String>> {
    let Some(extensions) = entry.pax_extensions()? else {
        return Ok(None);
    };
    for extension in extensions {
        let extension = extension?;
        if extension.key().is_ok_and(|key| key == PAX_CHECKSUM_KEY) {
            return Ok(Some(
                String::from_utf8_lossy(extension.value_bytes()).into_owned(),
            ));
        }
    }
    Ok(None)
}

fn entry_read_error(e: &io::Error) -> FulpackError {
    FulpackError::InvalidArchive(format!("failed to read TAR entry: {e}"))
}

/// Verifies one entry. Returns `false` once the stream is unusable.
fn verify_entry<R: Read>(entry: &mut tar::Entry<'_, R>, verification: &mut Verification<'_>) -> bool {
    let (meta, embedded) = match read_header(entry) {
        Ok(header) => header,
        Err(e) => {
            verification.stream_error(e);
            return false;
        }
    };
    verification.entry(&meta.path);
    if meta.kind != EntryKind::File {
        return true;
    }

    let expected = if verification.verify_checksums() {
        match embedded.as_deref().map(Digest::parse).transpose() {
            Ok(expected) => expected,
            Err(e) => {
                verification.error(&meta.path, e);
                None
            }
        }
    } else {
        None
    };

    let (read, actual) = match &expected {
        Some(expected) => {
            let mut hashing = HashingReader::new(&mut *entry, expected.algorithm());
            if let Err(e) = io::copy(&mut hashing, &mut io::sink()) {
                verification.error(&meta.path, format!("unreadable entry data: {e}"));
                return false;
            }
            let (actual, read) = hashing.finish();
            (read, Some(actual))
        }
        None => match io::copy(entry, &mut io::sink()) {
            Ok(read) => (read, None),
            Err(e) => {
                verification.error(&meta.path, format!("unreadable entry data: {e}"));
                return false;
            }
        },
    };

    if read != meta.size {
        verification.error(
            &meta.path,
            format!("truncated entry data: expected {} bytes, read {read}", meta.size),
        );
        return false;
    }
    if let (Some(expected), Some(actual)) = (&expected, &actual) {
        verification.checksum(&meta.path, expected, actual);
    }
    true
}

fn append_sources<W: Write>(
    builder: &mut Builder<W>,
    sources: &[PathBuf],
    output: &Path,
    options: &CreateOptions,
) -> Result<CreateStats> {
    let mut stats = CreateStats::default();

    for entry in creation::source_entries(sources, &options.exclude_patterns, output) {
        let entry = entry?;
        let mut header = Header::new_ustar();
        let (mode, mtime) = if options.preserve_permissions {
            let default = match entry.kind {
                SourceKind::File => DEFAULT_FILE_MODE,
                SourceKind::Directory => DEFAULT_DIR_MODE,
            };
            (
                sanitize_mode(entry.mode.unwrap_or(default)),
                entry.modified.map_or(0, to_unix_secs),
            )
        } else {
            match entry.kind {
                SourceKind::File => (DEFAULT_FILE_MODE, 0),
                SourceKind::Directory => (DEFAULT_DIR_MODE, 0),
            }
        };
        header.set_mode(mode);
        header.set_mtime(mtime);

        match entry.kind {
            SourceKind::Directory => {
                header.set_entry_type(EntryType::Directory);
                header.set_size(0);
                builder.append_data(&mut header, format!("{}/", entry.name), io::empty())?;
            }
            SourceKind::File => {
                let mut file = File::open(&entry.path)?;
                let size = if options.embed_checksums {
                    // Hash and store through the same handle.
                    let mut hashing = HashingReader::new(&mut file, options.checksum_algorithm);
                    io::copy(&mut hashing, &mut io::sink())?;
                    let (digest, size) = hashing.finish();
                    file.seek(SeekFrom::Start(0))?;
                    builder.append_pax_extensions([(
                        PAX_CHECKSUM_KEY,
                        digest.formatted().as_bytes(),
                    )])?;
                    size
                } else {
                    file.metadata()?.len()
                };
                header.set_entry_type(EntryType::Regular);
                header.set_size(size);
                builder.append_data(&mut header, &entry.name, file.take(size))?;
                stats.bytes += size;
            }
        }

        stats.entries += 1;
        tracing::debug!(name = %entry.name, "added entry");
    }

    Ok(stats)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::checksum;
    use crate::checksum::Algorithm;
    use crate::config::ScanOptions;
    use crate::test_utils::TarTestBuilder;
    use std::fs;
    use tempfile::TempDir;

    fn source_tree(temp: &TempDir) -> PathBuf {
        let dir = temp.path().join("dirA");
        fs::create_dir_all(dir.join("nested")).unwrap();
        fs::write(dir.join("file1.txt"), "Hello").unwrap();
        fs::write(dir.join("file2.txt"), "World").unwrap();
        fs::write(dir.join("nested/deep.txt"), "deep content").unwrap();
        dir
    }

    fn scan_all(handler: &TarHandler, archive: &Path) -> Vec<ArchiveEntry> {
        let mut scanner = handler.scan(archive, &ScanOptions::default()).unwrap();
        scanner.entries().unwrap().map(|e| e.unwrap()).collect()
    }

    #[test]
    fn test_create_and_extract_round_trip() {
        for handler in [TarHandler::PLAIN, TarHandler::GZIP] {
            let temp = TempDir::new().unwrap();
            let dir = source_tree(&temp);
            let archive = temp.path().join("out.tar");
            let info = handler
                .create(&[dir], &archive, &CreateOptions::default())
                .unwrap();
            assert_eq!(info.entry_count, 5);
            assert_eq!(info.total_size, 22);
            assert_eq!(info.compressed_size, fs::metadata(&archive).unwrap().len());

            let dest = temp.path().join("dest");
            let result = handler
                .extract(&archive, &dest, &ExtractOptions::default())
                .unwrap();
            assert!(result.is_success(), "{:?}", result.errors);
            assert_eq!(result.extracted_count, 5);
            assert_eq!(fs::read_to_string(dest.join("dirA/file1.txt")).unwrap(), "Hello");
            assert_eq!(
                fs::read_to_string(dest.join("dirA/nested/deep.txt")).unwrap(),
                "deep content"
            );
        }
    }

    #[test]
    fn test_embedded_checksums_visible_in_scan() {
        let temp = TempDir::new().unwrap();
        let dir = source_tree(&temp);
        let archive = temp.path().join("out.tar");
        let options = CreateOptions::default().with_checksum_algorithm(Algorithm::Sha256);
        TarHandler::PLAIN.create(&[dir], &archive, &options).unwrap();

        let entries = scan_all(&TarHandler::PLAIN, &archive);
        let file1 = entries.iter().find(|e| e.path == "dirA/file1.txt").unwrap();
        assert_eq!(
            file1.checksum.as_ref().unwrap(),
            &checksum::hash(b"Hello", Algorithm::Sha256)
        );
        let dir_entry = entries.iter().find(|e| e.path == "dirA").unwrap();
        assert_eq!(dir_entry.kind, EntryKind::Directory);
        assert!(dir_entry.checksum.is_none());
    }

    #[test]
    fn test_checksums_can_be_disabled() {
        let temp = TempDir::new().unwrap();
        let dir = source_tree(&temp);
        let archive = temp.path().join("out.tar");
        let options = CreateOptions::default().with_embed_checksums(false);
        TarHandler::PLAIN.create(&[dir], &archive, &options).unwrap();

        assert!(scan_all(&TarHandler::PLAIN, &archive).iter().all(|e| e.checksum.is_none()));
        let result = TarHandler::PLAIN
            .verify(&archive, &VerifyOptions::default())
            .unwrap();
        assert!(result.valid);
        assert_eq!(result.checksums_verified, 0);
    }

    #[test]
    fn test_verify_detects_corruption() {
        let temp = TempDir::new().unwrap();
        let dir = source_tree(&temp);
        let archive = temp.path().join("out.tar");
        TarHandler::PLAIN
            .create(&[dir], &archive, &CreateOptions::default())
            .unwrap();

        let clean = TarHandler::PLAIN
            .verify(&archive, &VerifyOptions::default())
            .unwrap();
        assert!(clean.valid, "{:?}", clean.errors);
        assert_eq!(clean.checksums_verified, 3);

        let mut bytes = fs::read(&archive).unwrap();
        let at = bytes.windows(5).position(|w| w == b"Hello").unwrap();
        bytes[at] = b'J';
        fs::write(&archive, &bytes).unwrap();

        let result = TarHandler::PLAIN
            .verify(&archive, &VerifyOptions::default())
            .unwrap();
        assert!(!result.valid);
        assert_eq!(result.checksums_verified, 2);
        assert!(result.checksums_verified < result.entry_count);
        assert!(result.errors[0].reason.contains("checksum mismatch"));
    }

    #[test]
    fn test_extract_rejects_corrupted_entry() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("bad.tar");
        let data = TarTestBuilder::new()
            .add_file_with_checksum("a.txt", b"tampered", "crc32:00000000")
            .add_file("b.txt", b"fine")
            .build();
        fs::write(&archive, data).unwrap();

        let dest = temp.path().join("dest");
        let result = TarHandler::PLAIN
            .extract(&archive, &dest, &ExtractOptions::default())
            .unwrap();
        assert_eq!(result.error_count, 1);
        assert_eq!(result.extracted_count, 1);
        assert!(!dest.join("a.txt").exists());
        assert!(dest.join("b.txt").exists());
    }

    #[test]
    fn test_extract_rejects_traversal_and_links() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("evil.tar");
        let data = TarTestBuilder::new()
            .add_file("../../evil", b"pwned")
            .add_file("/abs.txt", b"pwned")
            .add_symlink("link", "/etc/passwd")
            .add_hardlink("hard", "/etc/passwd")
            .add_file("safe.txt", b"ok")
            .build();
        fs::write(&archive, data).unwrap();

        let dest = temp.path().join("a/b/dest");
        let result = TarHandler::PLAIN
            .extract(&archive, &dest, &ExtractOptions::default())
            .unwrap();
        assert_eq!(result.error_count, 4);
        assert_eq!(result.extracted_count, 1);
        assert_eq!(result.errors[0].path, "../../evil");
        assert!(!temp.path().join("a/evil").exists());
        assert!(!dest.join("link").exists());
        assert!(dest.join("safe.txt").exists());
    }

    #[test]
    fn test_verify_flags_unsafe_paths() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("evil.tar");
        fs::write(&archive, TarTestBuilder::new().add_file("../x", b"x").build()).unwrap();

        let result = TarHandler::PLAIN
            .verify(&archive, &VerifyOptions::default())
            .unwrap();
        assert!(!result.valid);
        assert_eq!(result.entry_count, 1);
    }

    #[test]
    fn test_verify_truncated_gzip() {
        let temp = TempDir::new().unwrap();
        let dir = source_tree(&temp);
        let archive = temp.path().join("out.tar.gz");
        TarHandler::GZIP
            .create(&[dir], &archive, &CreateOptions::default())
            .unwrap();

        let bytes = fs::read(&archive).unwrap();
        fs::write(&archive, &bytes[..bytes.len() - 6]).unwrap();

        let result = TarHandler::GZIP
            .verify(&archive, &VerifyOptions::default())
            .unwrap();
        assert!(!result.valid);
    }

    #[test]
    fn test_failed_create_removes_output() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("out.tar");
        let err = TarHandler::PLAIN
            .create(&[temp.path().join("missing")], &archive, &CreateOptions::default())
            .unwrap_err();
        assert!(matches!(err, FulpackError::SourceNotFound { .. }));
        assert!(!archive.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_preserves_masked_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let script = temp.path().join("run.sh");
        fs::write(&script, "#!/bin/sh").unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o750)).unwrap();

        let archive = temp.path().join("out.tar");
        TarHandler::PLAIN
            .create(&[script], &archive, &CreateOptions::default())
            .unwrap();
        let dest = temp.path().join("dest");
        TarHandler::PLAIN
            .extract(&archive, &dest, &ExtractOptions::default())
            .unwrap();

        let mode = fs::metadata(dest.join("run.sh")).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o750);
    }

    #[test]
    fn test_rejects_source_as_output() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("x.tar");
        fs::write(&archive, "not yet an archive").unwrap();

        for handler in [TarHandler::PLAIN, TarHandler::GZIP] {
            let err = handler
                .create(&[archive.clone()], &archive, &CreateOptions::default())
                .unwrap_err();
            assert!(matches!(err, FulpackError::InvalidSource { .. }));
            assert_eq!(fs::read_to_string(&archive).unwrap(), "not yet an archive");
        }
    }

    #[test]
    fn test_embedded_checksum_matches_stored_bytes() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("big");
        fs::create_dir(&dir).unwrap();
        let content: Vec<u8> = (0..300_000u32).map(|i| (i % 251) as u8).collect();
        fs::write(dir.join("data.bin"), &content).unwrap();

        let archive = temp.path().join("big.tar");
        TarHandler::PLAIN
            .create(&[dir], &archive, &CreateOptions::default())
            .unwrap();

        let entries = scan_all(&TarHandler::PLAIN, &archive);
        let file = entries.iter().find(|e| e.path == "big/data.bin").unwrap();
        assert_eq!(file.size, 300_000);
        assert_eq!(
            file.checksum.as_ref().unwrap(),
            &checksum::hash(&content, Algorithm::Xxh3_128)
        );
        let result = TarHandler::PLAIN
            .verify(&archive, &VerifyOptions::default())
            .unwrap();
        assert!(result.valid, "{:?}", result.errors);
        assert_eq!(result.checksums_verified, 1);
    }
}
