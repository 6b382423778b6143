//! Page source identifiers and how they resolve to bytes

use std::borrow::Cow;
use std::fmt;
use std::path::{Path, PathBuf};

use super::LoadError;

const DISPLAY_NAME_MAX: usize = 48;

/// Opaque identifier of one page image: a path, a `file://` URI or a `data:` URI
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PageSource(String);

/// Where the bytes of a source live
#[derive(Debug, PartialEq, Eq)]
pub enum SourceKind<'a> {
    File(PathBuf),
    Data {
        media_type: &'a str,
        payload: Vec<u8>,
    },
}

impl PageSource {
    pub fn new(source: impl Into<String>) -> Self {
        Self(source.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short form for logs; data URIs can be megabytes long
    #[must_use]
    pub fn display_name(&self) -> Cow<'_, str> {
        if self.0.starts_with("data:") && self.0.len() > DISPLAY_NAME_MAX {
            let cut = (0..=DISPLAY_NAME_MAX)
                .rev()
                .find(|&i| self.0.is_char_boundary(i))
                .unwrap_or(0);
            Cow::Owned(format!("{}...", &self.0[..cut]))
        } else {
            Cow::Borrowed(&self.0)
        }
    }

    /// Resolve the identifier, decoding inline data URIs
    pub fn kind(&self) -> Result<SourceKind<'_>, LoadError> {
        if let Some(rest) = self.0.strip_prefix("data:") {
            return parse_data_uri(rest);
        }
        if let Some(path) = self.0.strip_prefix("file://") {
            return Ok(SourceKind::File(PathBuf::from(path)));
        }
        if let Some((scheme, _)) = self.0.split_once("://") {
            return Err(LoadError::UnsupportedScheme(scheme.to_string()));
        }
        Ok(SourceKind::File(PathBuf::from(&self.0)))
    }
}

impl fmt::Display for PageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name())
    }
}

impl From<&str> for PageSource {
    fn from(source: &str) -> Self {
        Self::new(source)
    }
}

impl From<String> for PageSource {
    fn from(source: String) -> Self {
        Self(source)
    }
}

impl From<&Path> for PageSource {
    fn from(path: &Path) -> Self {
        Self(path.to_string_lossy().into_owned())
    }
}

impl From<PathBuf> for PageSource {
    fn from(path: PathBuf) -> Self {
        Self::from(path.as_path())
    }
}

fn parse_data_uri(rest: &str) -> Result<SourceKind<'_>, LoadError> {
    let (meta, data) = rest
        .split_once(',')
        .ok_or_else(|| LoadError::InvalidDataUri("missing ',' separator".to_string()))?;

    let mut params = meta.split(';');
    let media_type = params.next().unwrap_or_default();
    let is_base64 = params.any(|p| p.trim().eq_ignore_ascii_case("base64"));

    let payload = if is_base64 {
        base64_simd::STANDARD
            .decode_to_vec(data.trim())
            .map_err(|e| LoadError::InvalidDataUri(e.to_string()))?
    } else {
        percent_decode(data)
    };

    if payload.is_empty() {
        return Err(LoadError::InvalidDataUri("empty payload".to_string()));
    }

    Ok(SourceKind::Data {
        media_type,
        payload,
    })
}

/// Decode `%XX` escapes; malformed escapes are kept verbatim
fn percent_decode(input: &str) -> Vec<u8> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok();
            if let Some(byte) = hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                out.push(byte);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }

    out
}
