//! Limits for loading book and mechanics documents
//!
//! Book XML files are large but bounded; these limits keep a broken or
//! hostile download from exhausting memory.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Resource limits applied while loading and parsing documents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Maximum XML file size in bytes
    pub max_xml_size: usize,

    /// Maximum element nesting depth
    pub max_xml_depth: usize,

    /// Maximum number of attributes per element
    pub max_attributes: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_xml_size: 32 * 1024 * 1024, // 32 MB
            max_xml_depth: 256,
            max_attributes: 256,
        }
    }
}

impl Limits {
    /// Create a new Limits with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Create strict limits (more restrictive)
    pub fn strict() -> Self {
        Self {
            max_xml_size: 4 * 1024 * 1024, // 4 MB
            max_xml_depth: 64,
            max_attributes: 64,
        }
    }

    /// Create permissive limits (less restrictive, use with caution)
    pub fn permissive() -> Self {
        Self {
            max_xml_size: 512 * 1024 * 1024, // 512 MB
            max_xml_depth: 4096,
            max_attributes: 4096,
        }
    }

    /// Check if XML size is within limits
    pub fn check_xml_size(&self, size: usize) -> Result<()> {
        if size > self.max_xml_size {
            Err(Error::LimitExceeded(format!(
                "XML size {} bytes exceeds maximum {} bytes",
                size, self.max_xml_size
            )))
        } else {
            Ok(())
        }
    }

    /// Check if XML depth is within limits
    pub fn check_xml_depth(&self, depth: usize) -> Result<()> {
        if depth > self.max_xml_depth {
            Err(Error::LimitExceeded(format!(
                "XML depth {} exceeds maximum {}",
                depth, self.max_xml_depth
            )))
        } else {
            Ok(())
        }
    }

    /// Check if number of attributes is within limits
    pub fn check_attributes(&self, count: usize) -> Result<()> {
        if count > self.max_attributes {
            Err(Error::LimitExceeded(format!(
                "Attribute count {} exceeds maximum {}",
                count, self.max_attributes
            )))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_ordered() {
        let strict = Limits::strict();
        let default = Limits::default();
        let permissive = Limits::permissive();

        assert!(strict.max_xml_size < default.max_xml_size);
        assert!(default.max_xml_size < permissive.max_xml_size);
        assert!(strict.max_xml_depth < permissive.max_xml_depth);
    }

    #[test]
    fn test_checks() {
        let limits = Limits::strict();
        assert!(limits.check_xml_depth(64).is_ok());
        assert!(limits.check_xml_depth(65).is_err());
        assert!(limits.check_attributes(10).is_ok());
        assert!(matches!(
            limits.check_xml_size(5 * 1024 * 1024),
            Err(Error::LimitExceeded(_))
        ));
    }

    #[test]
    fn test_partial_deserialize_uses_defaults() {
        let limits: Limits = serde_json::from_str(r#"{"max_xml_depth": 10}"#).unwrap();
        assert_eq!(limits.max_xml_depth, 10);
        assert_eq!(limits.max_xml_size, Limits::default().max_xml_size);
    }
}
