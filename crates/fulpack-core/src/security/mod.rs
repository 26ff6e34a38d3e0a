//! Security validation modules.

pub mod path;
pub mod permissions;

pub use path::is_safe_path;
pub use path::resolve_entry_path;
pub use path::validate_path;
pub use permissions::sanitize_mode;
