//! Production definitions
//!
//! A production definition (`production.json` of a variant group) describes
//! where the artefacts of a variant group are written and which variables
//! the path components stand for:
//!
//! ```json
//! {
//!   "sDTI": "/catharsys/production:1.0",
//!   "mGroups": {
//!     "main": {
//!       "sName": "Main",
//!       "sPathStructure": "?trial/?cam",
//!       "mVars": { "trial": { "sName": "Trial" }, "cam": { "sName": "Camera" } },
//!       "mArtefacts": {
//!         "images": {
//!           "sName": "Images",
//!           "sPathStructure": "Frame_?frame.png",
//!           "mVars": { "frame": { "sName": "Frame" } }
//!         }
//!       }
//!     }
//!   },
//!   "mCategories": { "quality": { "sDTI": "/catharsys/production/category/boolean-group:1.0", ... } }
//! }
//! ```
//!
//! A `?name` token in a path structure matches one variable value. Tokens
//! may be embedded in literal text within one path component.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use artdeck_core::prelude::*;
use artdeck_core::{dti, BoolGroup, VarDecl};

pub const PRODUCTION_DTI: &str = "/catharsys/production:1";
pub const CATEGORY_BOOL_GROUP_DTI: &str = "/catharsys/production/category/boolean-group:1";

/// File name of a production definition inside a variant group
pub const PRODUCTION_FILE: &str = "production.json";

/// Default root of produced artefacts, relative to the variant group
pub const DEFAULT_OUTPUT_DIR: &str = "production";

#[derive(Debug, Clone, Default, Deserialize)]
struct RawVar {
    #[serde(rename = "sName", default)]
    name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawArtefact {
    #[serde(rename = "sName", default)]
    name: Option<String>,
    #[serde(rename = "sPathStructure")]
    path_structure: String,
    #[serde(rename = "mVars", default)]
    vars: BTreeMap<String, RawVar>,
    #[serde(rename = "mMeta", default)]
    meta: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawGroup {
    #[serde(rename = "sName", default)]
    name: Option<String>,
    #[serde(rename = "sPathStructure")]
    path_structure: String,
    #[serde(rename = "mVars", default)]
    vars: BTreeMap<String, RawVar>,
    #[serde(rename = "mArtefacts", default)]
    artefacts: serde_json::Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawProduction {
    #[serde(rename = "sOutputPath", default)]
    output_path: Option<String>,
    #[serde(rename = "mGroups")]
    groups: serde_json::Map<String, Value>,
    #[serde(rename = "mCategories", default)]
    categories: serde_json::Map<String, Value>,
}

// ─────────────────────────────────────────────────────────────────
// Path patterns
// ─────────────────────────────────────────────────────────────────

/// One path component of a structure, e.g. `Frame_?frame.png`
#[derive(Debug, Clone)]
pub struct SegmentPattern {
    text: String,
    vars: Vec<String>,
    regex: Regex,
}

impl SegmentPattern {
    pub fn parse(text: &str) -> Result<Self> {
        let token = Regex::new(r"\?([A-Za-z0-9_]+)")
            .map_err(|e| Error::production(format!("invalid token pattern: {}", e)))?;

        let mut vars = Vec::new();
        let mut pattern = String::from("^");
        let mut last = 0;
        for cap in token.captures_iter(text) {
            let (Some(whole), Some(name)) = (cap.get(0), cap.get(1)) else {
                continue;
            };
            pattern.push_str(&regex::escape(&text[last..whole.start()]));
            pattern.push_str("(.+?)");
            vars.push(name.as_str().to_string());
            last = whole.end();
        }
        pattern.push_str(&regex::escape(&text[last..]));
        pattern.push('$');

        let regex = Regex::new(&pattern).map_err(|e| {
            Error::production(format!("invalid path component '{}': {}", text, e))
        })?;
        Ok(Self {
            text: text.to_string(),
            vars,
            regex,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn vars(&self) -> &[String] {
        &self.vars
    }

    pub fn is_literal(&self) -> bool {
        self.vars.is_empty()
    }

    /// Values of the tokens if `name` matches
    pub fn match_name(&self, name: &str) -> Option<Vec<String>> {
        let caps = self.regex.captures(name)?;
        caps.iter()
            .skip(1)
            .map(|m| m.map(|m| m.as_str().to_string()))
            .collect()
    }
}

/// A `/` separated sequence of segment patterns
#[derive(Debug, Clone)]
pub struct PathPattern {
    segments: Vec<SegmentPattern>,
}

impl PathPattern {
    pub fn parse(text: &str) -> Result<Self> {
        let segments = text
            .split('/')
            .filter(|s| !s.is_empty())
            .map(SegmentPattern::parse)
            .collect::<Result<Vec<_>>>()?;
        if segments.is_empty() {
            return Err(Error::production(format!("empty path structure '{}'", text)));
        }
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[SegmentPattern] {
        &self.segments
    }

    /// Variable ids in path order
    pub fn vars(&self) -> Vec<String> {
        self.segments
            .iter()
            .flat_map(|s| s.vars().iter().cloned())
            .collect()
    }
}

// ─────────────────────────────────────────────────────────────────
// Definitions
// ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ArtefactDef {
    pub id: String,
    pub name: String,
    pub pattern: PathPattern,
    pub vars: Vec<VarDecl>,
    pub meta: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct GroupDef {
    pub id: String,
    pub name: String,
    pub pattern: PathPattern,
    pub vars: Vec<VarDecl>,
    pub artefacts: Vec<ArtefactDef>,
}

/// A parsed production definition
#[derive(Debug, Clone)]
pub struct ProductionDef {
    pub path: PathBuf,
    /// Root directory of the produced artefacts
    pub output_root: PathBuf,
    pub groups: Vec<GroupDef>,
    pub categories: BTreeMap<String, BoolGroup>,
}

impl ProductionDef {
    /// Load a production definition; relative output paths are resolved
    /// against the directory of the file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::production(format!("cannot read '{}': {}", path.display(), e))
        })?;
        let base = path.parent().unwrap_or(Path::new("."));
        Self::parse(&content, path, base)
    }

    pub fn parse(content: &str, path: &Path, base: &Path) -> Result<Self> {
        let value: Value = serde_json::from_str(content)
            .map_err(|e| Error::production(format!("invalid JSON in '{}': {}", path.display(), e)))?;
        if dti::check(&value, PRODUCTION_DTI).is_none() {
            return Err(Error::production(format!(
                "'{}' is not a production definition",
                path.display()
            )));
        }
        let raw: RawProduction = serde_json::from_value(value)
            .map_err(|e| Error::production(format!("{}: {}", path.display(), e)))?;

        let output_root = base.join(raw.output_path.as_deref().unwrap_or(DEFAULT_OUTPUT_DIR));

        let mut groups = Vec::with_capacity(raw.groups.len());
        for (id, group) in raw.groups {
            let group: RawGroup = serde_json::from_value(group)
                .map_err(|e| Error::production(format!("group '{}': {}", id, e)))?;
            groups.push(Self::group_def(id, group)?);
        }

        let mut categories = BTreeMap::new();
        for (id, category) in raw.categories {
            if dti::check(&category, CATEGORY_BOOL_GROUP_DTI).is_none() {
                warn!("Ignoring category '{}' of unsupported type", id);
                continue;
            }
            let group: BoolGroup = serde_json::from_value(category)
                .map_err(|e| Error::production(format!("category '{}': {}", id, e)))?;
            categories.insert(id, group);
        }

        Ok(Self {
            path: path.to_path_buf(),
            output_root,
            groups,
            categories,
        })
    }

    fn group_def(id: String, raw: RawGroup) -> Result<GroupDef> {
        let pattern = PathPattern::parse(&raw.path_structure)?;
        let vars = var_decls(&pattern, &raw.vars);

        let mut artefacts = Vec::with_capacity(raw.artefacts.len());
        for (art_id, art) in raw.artefacts {
            let art: RawArtefact = serde_json::from_value(art)
                .map_err(|e| Error::production(format!("artefact '{}': {}", art_id, e)))?;
            let art_pattern = PathPattern::parse(&art.path_structure)?;
            if let Some(dup) = art_pattern
                .vars()
                .iter()
                .find(|v| pattern.vars().contains(v))
            {
                return Err(Error::production(format!(
                    "artefact '{}' reuses group variable '{}'",
                    art_id, dup
                )));
            }
            artefacts.push(ArtefactDef {
                name: art.name.unwrap_or_else(|| art_id.clone()),
                vars: var_decls(&art_pattern, &art.vars),
                pattern: art_pattern,
                meta: art.meta,
                id: art_id,
            });
        }

        Ok(GroupDef {
            name: raw.name.unwrap_or_else(|| id.clone()),
            id,
            pattern,
            vars,
            artefacts,
        })
    }

    pub fn group(&self, id: &str) -> Option<&GroupDef> {
        self.groups.iter().find(|g| g.id == id)
    }

    pub fn group_ids(&self) -> Vec<&str> {
        self.groups.iter().map(|g| g.id.as_str()).collect()
    }
}

fn var_decls(pattern: &PathPattern, raw: &BTreeMap<String, RawVar>) -> Vec<VarDecl> {
    pattern
        .vars()
        .into_iter()
        .map(|id| {
            let name = raw
                .get(&id)
                .and_then(|v| v.name.clone())
                .unwrap_or_else(|| id.clone());
            VarDecl::new(id, name)
        })
        .collect()
}

/// Modification time and length of a file, used to detect stale caches
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, Deserialize)]
pub struct FileStamp {
    pub modified_ns: u128,
    pub len: u64,
}

impl FileStamp {
    pub fn of(path: &Path) -> Result<Self> {
        let meta = std::fs::metadata(path)?;
        let modified_ns = meta
            .modified()?
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        Ok(Self {
            modified_ns,
            len: meta.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "sDTI": "/catharsys/production:1.0",
        "mGroups": {
            "main": {
                "sName": "Main",
                "sPathStructure": "?trial/cam_?cam",
                "mVars": { "trial": { "sName": "Trial" } },
                "mArtefacts": {
                    "images": {
                        "sName": "Images",
                        "sPathStructure": "Frame_?frame.png",
                        "mVars": { "frame": { "sName": "Frame" } }
                    }
                }
            }
        },
        "mCategories": {
            "quality": {
                "sDTI": "/catharsys/production/category/boolean-group:1.0",
                "sName": "Quality",
                "lChoices": [
                    { "sIcon": "check", "sColor": "positive", "sDescription": "good" },
                    { "sIcon": "close", "sColor": "negative", "sDescription": "bad" }
                ],
                "iDefaultValue": 0
            },
            "other": { "sDTI": "/catharsys/production/category/other:1.0" }
        }
    }"#;

    #[test]
    fn test_segment_pattern_embedded_token() {
        let seg = SegmentPattern::parse("Frame_?frame.png").unwrap();
        assert_eq!(seg.vars(), &["frame".to_string()]);
        assert_eq!(seg.match_name("Frame_0012.png"), Some(vec!["0012".into()]));
        assert_eq!(seg.match_name("Frame_0012.jpg"), None);
        assert_eq!(seg.match_name("Frame_.png"), None);
    }

    #[test]
    fn test_segment_pattern_literal() {
        let seg = SegmentPattern::parse("render.v2").unwrap();
        assert!(seg.is_literal());
        assert_eq!(seg.match_name("render.v2"), Some(vec![]));
        assert_eq!(seg.match_name("renderxv2"), None);
    }

    #[test]
    fn test_path_pattern_vars_in_order() {
        let pattern = PathPattern::parse("?trial/out/cam_?cam").unwrap();
        assert_eq!(pattern.segments().len(), 3);
        assert_eq!(pattern.vars(), vec!["trial", "cam"]);
        assert!(PathPattern::parse("//").is_err());
    }

    #[test]
    fn test_parse_production() {
        let def = ProductionDef::parse(SAMPLE, Path::new("/vg/production.json"), Path::new("/vg"))
            .unwrap();
        assert_eq!(def.output_root, PathBuf::from("/vg/production"));
        assert_eq!(def.group_ids(), vec!["main"]);

        let group = def.group("main").unwrap();
        assert_eq!(group.name, "Main");
        assert_eq!(group.vars[0], VarDecl::new("trial", "Trial"));
        assert_eq!(group.vars[1], VarDecl::new("cam", "cam"));
        assert_eq!(group.artefacts[0].id, "images");
        assert_eq!(group.artefacts[0].vars[0].name, "Frame");

        assert_eq!(def.categories.len(), 1);
        assert_eq!(def.categories["quality"].choices.len(), 2);
    }

    #[test]
    fn test_parse_rejects_wrong_type() {
        let content = r#"{ "sDTI": "/catharsys/launch:3.0", "mGroups": {} }"#;
        let result = ProductionDef::parse(content, Path::new("p.json"), Path::new("."));
        assert!(matches!(result, Err(Error::Production { .. })));
    }

    #[test]
    fn test_parse_rejects_reused_group_var() {
        let content = r#"{
            "sDTI": "/catharsys/production:1.0",
            "mGroups": { "g": {
                "sPathStructure": "?trial",
                "mArtefacts": { "a": { "sPathStructure": "?trial.png" } }
            } }
        }"#;
        let result = ProductionDef::parse(content, Path::new("p.json"), Path::new("."));
        assert!(result.is_err());
    }
}
