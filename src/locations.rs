//! Resource location resolution
//!
//! Book data may live in a local directory or behind an HTTP server; a
//! [`Location`] names either, plus in-memory text for tests and embedding.

use crate::error::{Error, Result};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use url::Url;

/// Resource location - can be a URL, file path, or in-memory text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// File system path
    Path(PathBuf),
    /// URL (http or https)
    Url(Url),
    /// In-memory resource content
    String(String),
}

impl Location {
    /// Resolve a relative resource path against this location.
    ///
    /// Directories and URLs are treated as bases; in-memory locations
    /// cannot be joined.
    pub fn join(&self, relative: &str) -> Result<Location> {
        match self {
            Location::Path(base) => Ok(Location::Path(base.join(relative))),
            Location::Url(base) => {
                let mut base = base.clone();
                if !base.path().ends_with('/') {
                    let path = format!("{}/", base.path());
                    base.set_path(&path);
                }
                Ok(Location::Url(base.join(relative)?))
            }
            Location::String(_) => Err(Error::Resource(format!(
                "cannot resolve '{}' against an in-memory location",
                relative
            ))),
        }
    }

    /// Check if this is a remote location (URL)
    pub fn is_remote(&self) -> bool {
        matches!(self, Location::Url(_))
    }
}

impl FromStr for Location {
    type Err = Error;

    /// Auto-detect the location kind: http(s) URLs, `file:` URLs and
    /// anything else as a file path.
    fn from_str(s: &str) -> Result<Self> {
        if let Ok(url) = Url::parse(s) {
            match url.scheme() {
                "http" | "https" => return Ok(Location::Url(url)),
                "file" => {
                    let path = url
                        .to_file_path()
                        .map_err(|_| Error::Resource(format!("invalid file URL: {}", s)))?;
                    return Ok(Location::Path(path));
                }
                _ => {}
            }
        }
        Ok(Location::Path(PathBuf::from(s)))
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Path(p) => write!(f, "{}", p.display()),
            Location::Url(u) => write!(f, "{}", u),
            Location::String(_) => write!(f, "<in-memory>"),
        }
    }
}
