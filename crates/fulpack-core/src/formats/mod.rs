//! Archive format handlers.
//!
//! [`ArchiveFormat`] is the tag; [`handler_for`] maps it to one of the
//! stateless handlers. TAR and TAR+gzip share an implementation and differ
//! only in the compression filter.

mod common;
pub mod detect;
pub mod gzip;
pub mod tar;
pub mod traits;
pub mod zip;

pub use detect::ArchiveFormat;
pub use detect::detect_format;
pub use traits::ArchiveHandler;

pub(crate) use common::open_archive;

/// Returns the handler for a format.
///
/// # Examples
///
/// ```
/// use fulpack_core::formats::ArchiveFormat;
/// use fulpack_core::formats::handler_for;
///
/// let handler = handler_for(ArchiveFormat::TarGz);
/// assert_eq!(handler.format(), ArchiveFormat::TarGz);
/// ```
#[must_use]
pub fn handler_for(format: ArchiveFormat) -> &'static dyn ArchiveHandler {
    match format {
        ArchiveFormat::Tar => &tar::TarHandler::PLAIN,
        ArchiveFormat::TarGz => &tar::TarHandler::GZIP,
        ArchiveFormat::Zip => &zip::ZipHandler,
        ArchiveFormat::Gzip => &gzip::GzipHandler,
    }
}
