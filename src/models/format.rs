use std::borrow::Borrow;
use std::fmt;

/// PNG image data
pub const IMAGE_PNG: &str = "image/png";
/// Newline-separated list of URIs (copied files)
pub const TEXT_URI_LIST: &str = "text/uri-list";
/// UTF-8 plain text
pub const TEXT_PLAIN: &str = "text/plain";

/// Canonical formats in the order they are encoded into a snapshot
pub const PRIORITY_LIST: [&str; 3] = [IMAGE_PNG, TEXT_URI_LIST, TEXT_PLAIN];

/// Non-canonical names some clipboard owners advertise, with their canonical format
pub const ALIASES: [(&str, &str); 2] = [
    ("UTF8_STRING", TEXT_PLAIN),
    ("text/plain;charset=utf-8", TEXT_PLAIN),
];

/// Mime-type-like identifier for one clipboard representation
///
/// The wire protocol does not restrict the set of identifiers, so this is an
/// open string rather than an enum.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FormatId(String);

impl FormatId {
    pub fn new(id: impl Into<String>) -> Self {
        FormatId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check if this identifier denotes plain text (directly or via an alias)
    pub fn is_plain_text(&self) -> bool {
        canonical_name(&self.0) == TEXT_PLAIN
    }
}

/// Resolve an advertised format name through the alias table
pub fn canonical_name(name: &str) -> &str {
    ALIASES
        .iter()
        .find(|(alias, _)| *alias == name)
        .map(|(_, canonical)| *canonical)
        .unwrap_or(name)
}

impl fmt::Display for FormatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FormatId {
    fn from(id: &str) -> Self {
        FormatId::new(id)
    }
}

impl From<String> for FormatId {
    fn from(id: String) -> Self {
        FormatId(id)
    }
}

impl AsRef<str> for FormatId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for FormatId {
    fn borrow(&self) -> &str {
        &self.0
    }
}
