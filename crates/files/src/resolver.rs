//! Turning a client-supplied filename into the name a file is stored under.
//!
//! Three steps, in order:
//!
//! 1. [`is_allowed`]: the extension must be in [`ALLOWED_EXTENSIONS`].
//! 2. [`sanitize`]: produce a [`StoredName`], rejecting anything that looks like a path.
//! 3. [`resolve_collision`]: if the name is taken, insert a timestamp (and, if needed, a
//!    counter) before the extension.

use crate::constants::{ALLOWED_EXTENSIONS, COLLISION_TIMESTAMP_FORMAT, MAX_COLLISION_ATTEMPTS};
use crate::{FilesError, FilesResult};
use chrono::{DateTime, Local};
use filedrop_types::{is_stored_name_char, StoredName, MAX_STORED_NAME_LEN};
use std::path::Path;

const WINDOWS_DEVICE_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Whether `filename` ends in an allowed extension (case-insensitive).
///
/// A name without any `.` is never allowed.
pub fn is_allowed(filename: &str) -> bool {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| {
            ALLOWED_EXTENSIONS
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

/// Stem used when nothing of the client's stem survives sanitizing.
pub const FALLBACK_STEM: &str = "file";

/// Reduces an untrusted filename to a [`StoredName`].
///
/// Separators (`/`, `\`), a bare `.` or `..` and control characters cause rejection rather
/// than being stripped. Otherwise whitespace becomes `_`, characters outside `[A-Za-z0-9._-]`
/// are dropped, runs of `.` collapse to one and leading or trailing `.`/`_` are trimmed.
/// Stem and extension are cleaned separately: a stem with nothing left (`отчёт.pdf`) becomes
/// [`FALLBACK_STEM`], while the extension must still be allowed after cleaning.
///
/// # Errors
///
/// - [`FilesError::UnsafeFilename`] if the name is path-like
/// - [`FilesError::DisallowedExtension`] if the extension is lost or was never allowed
pub fn sanitize(filename: &str) -> FilesResult<StoredName> {
    let unsafe_name = |reason: &str| FilesError::UnsafeFilename {
        name: filename.to_owned(),
        reason: reason.to_owned(),
    };

    if filename.contains(['/', '\\']) {
        return Err(unsafe_name("contains a path separator"));
    }
    if matches!(filename.trim(), "." | "..") {
        return Err(unsafe_name("is a directory reference"));
    }
    if filename.chars().any(char::is_control) {
        return Err(unsafe_name("contains a control character"));
    }

    let Some((raw_stem, raw_ext)) = filename.rsplit_once('.') else {
        return Err(FilesError::DisallowedExtension(filename.to_owned()));
    };
    let ext = clean_component(raw_ext);
    if !ALLOWED_EXTENSIONS
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(&ext))
    {
        return Err(FilesError::DisallowedExtension(filename.to_owned()));
    }

    let mut stem = clean_component(raw_stem);
    if stem.is_empty() {
        stem = FALLBACK_STEM.to_owned();
    }
    let device = stem.split('.').next().unwrap_or_default();
    if WINDOWS_DEVICE_NAMES
        .iter()
        .any(|name| name.eq_ignore_ascii_case(device))
    {
        stem.insert(0, '_');
    }
    // Stored names are ASCII, so byte truncation stays on character boundaries.
    stem.truncate(MAX_STORED_NAME_LEN - ext.len() - 1);
    let stem = stem.trim_end_matches(['.', '_']);

    StoredName::parse(format!("{stem}.{ext}")).map_err(|e| unsafe_name(&e.to_string()))
}

/// Keeps `[A-Za-z0-9._-]`, turns whitespace into `_`, collapses runs of `.` and trims
/// `.`/`_` at both ends.
fn clean_component(raw: &str) -> String {
    let mut cleaned = String::with_capacity(raw.len());
    for c in raw.chars() {
        let c = if c.is_whitespace() { '_' } else { c };
        if !is_stored_name_char(c) || (c == '.' && cleaned.ends_with('.')) {
            continue;
        }
        cleaned.push(c);
    }
    cleaned.trim_matches(['.', '_']).to_owned()
}

/// Picks a name for `name` that is free in `dir` and not reported as taken by `is_taken`.
///
/// The first candidate is `name` itself. Then `stem_YYYYMMDD_HHMMSS.ext` using `now`, then
/// `stem_YYYYMMDD_HHMMSS_1.ext` and so on up to [`MAX_COLLISION_ATTEMPTS`]. Nothing is ever
/// overwritten.
///
/// # Errors
///
/// Returns [`FilesError::CollisionExhausted`] when every candidate is taken.
pub fn resolve_collision(
    dir: &Path,
    name: StoredName,
    now: DateTime<Local>,
    is_taken: impl Fn(&StoredName) -> bool,
) -> FilesResult<StoredName> {
    let occupied = |candidate: &StoredName| dir.join(candidate).exists() || is_taken(candidate);

    if !occupied(&name) {
        return Ok(name);
    }

    let timestamp = now.format(COLLISION_TIMESTAMP_FORMAT).to_string();
    let (stem, ext) = name.split_extension();

    for attempt in 0..=MAX_COLLISION_ATTEMPTS {
        let suffix = match attempt {
            0 => format!("_{timestamp}"),
            n => format!("_{timestamp}_{n}"),
        };
        let candidate = suffixed(stem, &suffix, ext)?;
        if !occupied(&candidate) {
            tracing::debug!(original = %name, resolved = %candidate, "resolved filename collision");
            return Ok(candidate);
        }
    }

    Err(FilesError::CollisionExhausted(name.into_string()))
}

/// Builds `stem + suffix + .ext`, shortening the stem if the result would be too long.
fn suffixed(stem: &str, suffix: &str, ext: Option<&str>) -> FilesResult<StoredName> {
    let ext_len = ext.map(|e| e.len() + 1).unwrap_or(0);
    let room = MAX_STORED_NAME_LEN.saturating_sub(suffix.len() + ext_len);
    // Stored names are ASCII, so byte slicing stays on character boundaries.
    let stem = &stem[..stem.len().min(room)];

    let candidate = match ext {
        Some(ext) => format!("{stem}{suffix}.{ext}"),
        None => format!("{stem}{suffix}"),
    };
    StoredName::parse(&candidate).map_err(|e| FilesError::UnsafeFilename {
        name: candidate.clone(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::fs;
    use tempfile::TempDir;

    fn at() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 5, 14, 30, 9).unwrap()
    }

    fn name(s: &str) -> StoredName {
        StoredName::parse(s).unwrap()
    }

    #[test]
    fn test_allowed_extensions_case_insensitive() {
        for ok in ["report.txt", "scan.PDF", "photo.JpEg", "a.b.zip", "sheet.xlsx"] {
            assert!(is_allowed(ok), "{ok} should be allowed");
        }
        for bad in ["malware.exe", "README", "archive.tar.gz", "txt", "image.png.sh", "x."] {
            assert!(!is_allowed(bad), "{bad} should be rejected");
        }
    }

    #[test]
    fn test_sanitize_keeps_simple_names() {
        assert_eq!(sanitize("report.txt").unwrap().as_str(), "report.txt");
        assert_eq!(sanitize("Scan-01.PDF").unwrap().as_str(), "Scan-01.PDF");
    }

    #[test]
    fn test_sanitize_normalises_whitespace_and_symbols() {
        assert_eq!(
            sanitize("my report (final).txt").unwrap().as_str(),
            "my_report_final.txt"
        );
        assert_eq!(sanitize("  notes.txt  ").unwrap().as_str(), "notes.txt");
        assert_eq!(sanitize("résumé.pdf").unwrap().as_str(), "rsum.pdf");
        assert_eq!(sanitize("_.hidden.txt").unwrap().as_str(), "hidden.txt");
    }

    #[test]
    fn test_sanitize_rejects_traversal_outright() {
        for bad in [
            "../secret.txt",
            "../../etc/passwd.txt",
            "dir/report.txt",
            "..\\boot.txt",
            "C:\\Windows\\win.txt",
        ] {
            assert!(
                matches!(sanitize(bad), Err(FilesError::UnsafeFilename { .. })),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_sanitize_rejects_control_characters() {
        assert!(matches!(
            sanitize("evil\0.txt"),
            Err(FilesError::UnsafeFilename { .. })
        ));
        assert!(matches!(
            sanitize("line\nbreak.txt"),
            Err(FilesError::UnsafeFilename { .. })
        ));
    }

    #[test]
    fn test_sanitize_falls_back_when_stem_is_lost() {
        assert_eq!(sanitize("отчёт.pdf").unwrap().as_str(), "file.pdf");
        assert_eq!(sanitize("日本.png").unwrap().as_str(), "file.png");
        assert_eq!(sanitize("  .txt").unwrap().as_str(), "file.txt");
        assert_eq!(sanitize("Отчёт 2024.docx").unwrap().as_str(), "2024.docx");
    }

    #[test]
    fn test_sanitize_rejects_names_without_extension() {
        assert!(matches!(
            sanitize("???"),
            Err(FilesError::DisallowedExtension(_))
        ));
        assert!(matches!(
            sanitize(".."),
            Err(FilesError::UnsafeFilename { .. })
        ));
    }

    #[test]
    fn test_sanitize_collapses_dot_runs() {
        assert_eq!(
            sanitize("report..final.txt").unwrap().as_str(),
            "report.final.txt"
        );
        assert_eq!(sanitize("wait...txt").unwrap().as_str(), "wait.txt");
        assert_eq!(sanitize("a..txt").unwrap().as_str(), "a.txt");
    }

    #[test]
    fn test_sanitize_truncates_long_stems() {
        let long = format!("{}.txt", "a".repeat(MAX_STORED_NAME_LEN + 10));
        let name = sanitize(&long).unwrap();
        assert_eq!(name.as_str().len(), MAX_STORED_NAME_LEN);
        assert!(name.as_str().ends_with(".txt"));
    }

    #[test]
    fn test_sanitize_rejects_lost_extension() {
        assert!(matches!(
            sanitize("report.tx t"),
            Err(FilesError::DisallowedExtension(_))
        ));
        assert!(matches!(
            sanitize("malware.exe"),
            Err(FilesError::DisallowedExtension(_))
        ));
    }

    #[test]
    fn test_sanitize_prefixes_device_names() {
        assert_eq!(sanitize("CON.txt").unwrap().as_str(), "_CON.txt");
        assert_eq!(sanitize("nul.png").unwrap().as_str(), "_nul.png");
        assert_eq!(sanitize("console.txt").unwrap().as_str(), "console.txt");
    }

    #[test]
    fn test_resolve_collision_free_name_is_kept() {
        let temp = TempDir::new().unwrap();
        let resolved = resolve_collision(temp.path(), name("report.txt"), at(), |_| false).unwrap();
        assert_eq!(resolved.as_str(), "report.txt");
    }

    #[test]
    fn test_resolve_collision_on_disk_inserts_timestamp() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("report.txt"), b"first").unwrap();

        let resolved = resolve_collision(temp.path(), name("report.txt"), at(), |_| false).unwrap();

        assert_eq!(resolved.as_str(), "report_20240305_143009.txt");
        assert!(temp.path().join(&resolved).starts_with(temp.path()));
    }

    #[test]
    fn test_resolve_collision_with_existing_key() {
        let temp = TempDir::new().unwrap();
        let resolved =
            resolve_collision(temp.path(), name("report.txt"), at(), |n| n.as_str() == "report.txt")
                .unwrap();
        assert_eq!(resolved.as_str(), "report_20240305_143009.txt");
    }

    #[test]
    fn test_resolve_collision_same_second_uses_counter() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("report.txt"), b"1").unwrap();
        fs::write(temp.path().join("report_20240305_143009.txt"), b"2").unwrap();
        fs::write(temp.path().join("report_20240305_143009_1.txt"), b"3").unwrap();

        let resolved = resolve_collision(temp.path(), name("report.txt"), at(), |_| false).unwrap();

        assert_eq!(resolved.as_str(), "report_20240305_143009_2.txt");
    }

    #[test]
    fn test_resolve_collision_exhausted() {
        let temp = TempDir::new().unwrap();
        let result = resolve_collision(temp.path(), name("report.txt"), at(), |_| true);
        assert!(matches!(result, Err(FilesError::CollisionExhausted(_))));
    }

    #[test]
    fn test_resolve_collision_keeps_long_names_within_limit() {
        let temp = TempDir::new().unwrap();
        let long = format!("{}.txt", "a".repeat(MAX_STORED_NAME_LEN - 4));
        fs::write(temp.path().join(&long), b"x").unwrap();

        let resolved = resolve_collision(temp.path(), name(&long), at(), |_| false).unwrap();

        assert!(resolved.as_str().len() <= MAX_STORED_NAME_LEN);
        assert!(resolved.as_str().ends_with("_20240305_143009.txt"));
    }
}
