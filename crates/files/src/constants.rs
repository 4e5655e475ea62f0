//! Constants for the storage layout and record formats.

/// File extensions accepted for upload, compared case-insensitively.
pub const ALLOWED_EXTENSIONS: &[&str] = &[
    "txt", "pdf", "png", "jpg", "jpeg", "gif", "doc", "docx", "xls", "xlsx", "zip",
];

/// `chrono` format of a date partition, relative to the storage root.
pub const PARTITION_FORMAT: &str = "%Y/%m/%d";

/// `chrono` format of the suffix inserted into a colliding filename.
pub const COLLISION_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// `chrono` format of `upload_date`.
///
/// Fixed width, so string order matches chronological order.
pub const UPLOAD_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Counter suffixes tried after the timestamped name also collides.
pub const MAX_COLLISION_ATTEMPTS: u32 = 1_000;
