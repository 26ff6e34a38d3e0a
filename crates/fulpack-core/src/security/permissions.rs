//! File permission sanitization.

/// Owner, group and other read-write-execute bits.
pub const PERMISSION_MASK: u32 = 0o777;

/// Strips setuid, setgid, sticky and file-type bits from a mode.
///
/// # Examples
///
/// ```
/// use fulpack_core::security::sanitize_mode;
///
/// assert_eq!(sanitize_mode(0o104_755), 0o755);
/// assert_eq!(sanitize_mode(0o6777), 0o777);
/// ```
#[must_use]
pub const fn sanitize_mode(mode: u32) -> u32 {
    mode & PERMISSION_MASK
}

/// Applies sanitized permission bits to an extracted file.
#[cfg(unix)]
pub(crate) fn apply_mode(path: &std::path::Path, mode: u32) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(sanitize_mode(mode)))
}

#[cfg(not(unix))]
pub(crate) fn apply_mode(_path: &std::path::Path, _mode: u32) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_strips_special_bits() {
        assert_eq!(sanitize_mode(0o4755), 0o755);
        assert_eq!(sanitize_mode(0o2755), 0o755);
        assert_eq!(sanitize_mode(0o1777), 0o777);
        assert_eq!(sanitize_mode(0o100_644), 0o644);
    }

    #[cfg(unix)]
    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_apply_mode() {
        use std::os::unix::fs::PermissionsExt;
        let temp = tempfile::NamedTempFile::new().unwrap();
        apply_mode(temp.path(), 0o4640).unwrap();
        let mode = std::fs::metadata(temp.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o7777, 0o640);
    }
}
