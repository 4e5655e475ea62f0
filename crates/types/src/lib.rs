//! Validated text types shared across the filedrop crates.
//!
//! [`StoredName`] is the name a file is stored under. It is always safe to use as a single
//! path component: it can never contain a separator, a parent reference or a control
//! character.

/// Maximum length, in bytes, of a stored filename.
///
/// Matches the common `NAME_MAX` of Linux and macOS filesystems.
pub const MAX_STORED_NAME_LEN: usize = 255;

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TextError {
    /// The input was empty
    #[error("Text cannot be empty")]
    Empty,

    /// The input is longer than a filesystem path component allows
    #[error("Name exceeds {MAX_STORED_NAME_LEN} bytes")]
    TooLong,

    /// The input contains a character that is not allowed in a stored name
    #[error("Name contains an invalid character: {0:?}")]
    InvalidCharacter(char),

    /// The input would be interpreted as a hidden file or a parent-directory reference
    #[error("Name must not start with '.' or contain '..'")]
    DotSequence,
}

/// A filename that is safe to join onto a directory as a single component.
///
/// Only ASCII letters, digits, `.`, `_` and `-` are accepted. The name may not start with `.`
/// and may not contain `..`, so it can never name a hidden file or climb out of its
/// directory. Parsing never rewrites the input: anything outside the accepted set is an error.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StoredName(String);

impl StoredName {
    /// Validates `input` as a stored name without altering it.
    ///
    /// # Errors
    ///
    /// Returns a [`TextError`] describing the first rule the input breaks.
    pub fn parse(input: impl AsRef<str>) -> Result<Self, TextError> {
        let input = input.as_ref();
        if input.is_empty() {
            return Err(TextError::Empty);
        }
        if input.len() > MAX_STORED_NAME_LEN {
            return Err(TextError::TooLong);
        }
        if let Some(c) = input.chars().find(|c| !is_stored_name_char(*c)) {
            return Err(TextError::InvalidCharacter(c));
        }
        if input.starts_with('.') || input.contains("..") {
            return Err(TextError::DotSequence);
        }
        Ok(Self(input.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Splits the name at its last `.` into stem and extension (without the dot).
    pub fn split_extension(&self) -> (&str, Option<&str>) {
        match self.0.rsplit_once('.') {
            Some((stem, ext)) => (stem, Some(ext)),
            None => (&self.0, None),
        }
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// Returns true for characters allowed inside a [`StoredName`].
pub fn is_stored_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')
}

impl std::fmt::Display for StoredName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for StoredName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl AsRef<std::path::Path> for StoredName {
    fn as_ref(&self) -> &std::path::Path {
        std::path::Path::new(&self.0)
    }
}

impl std::str::FromStr for StoredName {
    type Err = TextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl serde::Serialize for StoredName {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for StoredName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        StoredName::parse(&s).map_err(serde::de::Error::custom)
    }
}
