//! Document type identifiers
//!
//! Every persisted JSON document and every explicit control declaration
//! carries a type tag under the key `sDTI`, for example
//! `/catharsys/gui/control/number/int:1.0`. The tag is a slash separated
//! type path plus a `major.minor` version.
//!
//! Patterns use `*` for "any": `/catharsys/gui/control/*:*` matches every
//! control type in every version.

use std::fmt;

use serde_json::Value;

/// Key holding the type tag in JSON documents
pub const DTI_KEY: &str = "sDTI";

/// A parsed document type identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dti {
    parts: Vec<String>,
    version: String,
}

impl Dti {
    /// Parse `"/a/b/c:1.0"`. Returns `None` for malformed tags.
    pub fn parse(text: &str) -> Option<Self> {
        let (path, version) = text.trim().split_once(':')?;
        let path = path.strip_prefix('/')?;
        let parts: Vec<String> = path.split('/').map(str::to_string).collect();
        if parts.iter().any(|p| p.is_empty()) || version.is_empty() {
            return None;
        }
        Some(Self {
            parts,
            version: version.to_string(),
        })
    }

    /// Read and parse the tag of a JSON object
    pub fn of(value: &Value) -> Option<Self> {
        value.get(DTI_KEY).and_then(Value::as_str).and_then(Self::parse)
    }

    pub fn parts(&self) -> &[String] {
        &self.parts
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Type path components after the first `skip` ones
    pub fn sub_type(&self, skip: usize) -> &[String] {
        self.parts.get(skip..).unwrap_or(&[])
    }

    /// Match against a pattern such as `/catharsys/gui/control/*:*`.
    ///
    /// A `*` inside the path matches exactly one component; a trailing `*`
    /// matches one or more. Versions match by component prefix, so `1`
    /// matches `1.0` and `1.2`.
    pub fn matches(&self, pattern: &str) -> bool {
        let Some(pattern) = Dti::parse(pattern) else {
            return false;
        };

        let last = pattern.parts.len() - 1;
        for (idx, pat) in pattern.parts.iter().enumerate() {
            if pat == "*" && idx == last {
                if self.parts.len() <= idx {
                    return false;
                }
                return version_matches(&self.version, &pattern.version);
            }
            match self.parts.get(idx) {
                Some(part) if pat == "*" || pat == part => {}
                _ => return false,
            }
        }

        self.parts.len() == pattern.parts.len()
            && version_matches(&self.version, &pattern.version)
    }
}

fn version_matches(version: &str, pattern: &str) -> bool {
    if pattern == "*" {
        return true;
    }
    let mut have = version.split('.');
    pattern
        .split('.')
        .all(|want| want == "*" || have.next() == Some(want))
}

impl fmt::Display for Dti {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}:{}", self.parts.join("/"), self.version)
    }
}

/// Check that a JSON object carries a tag matching `pattern`
pub fn check(value: &Value, pattern: &str) -> Option<Dti> {
    Dti::of(value).filter(|dti| dti.matches(pattern))
}
