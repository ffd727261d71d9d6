//! Filesystem scan of produced artefacts
//!
//! Walks the output root of a production definition along the group path
//! structure, then below every group directory along each artefact path
//! structure. Directory entries are visited in name order, so discovered
//! value lists are sorted.

use std::path::{Path, PathBuf};

use artdeck_core::prelude::*;
use artdeck_core::{ArtefactReference, ArtefactType, Catalog};

use crate::production::{GroupDef, PathPattern, ProductionDef};

/// One directory or file matched by a path pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathMatch {
    pub path: PathBuf,
    /// Token values in pattern order
    pub values: Vec<String>,
}

/// Scan one production group into a catalog
pub fn scan_group(def: &ProductionDef, group_id: &str) -> Result<Catalog> {
    let group = def
        .group(group_id)
        .ok_or_else(|| Error::scan(format!("production group '{}' not defined", group_id)))?;
    scan_group_def(&def.output_root, group)
}

pub fn scan_group_def(root: &Path, group: &GroupDef) -> Result<Catalog> {
    info!("Scanning artefacts of group '{}' below {:?}", group.id, root);
    let mut catalog = Catalog::new(&group.id, group.vars.clone());
    for art in &group.artefacts {
        let mut art_type = ArtefactType::new(&art.id, &art.name, art.vars.clone());
        art_type.meta = art.meta.clone();
        catalog.add_artefact_type(art_type)?;
    }

    if !root.is_dir() {
        warn!("Production output {:?} does not exist", root);
        return Ok(catalog);
    }

    let group_dirs = match_pattern(root, &group.pattern, true)?;
    for group_dir in &group_dirs {
        let group_pairs = group.vars.iter().map(|v| v.id.clone()).zip(group_dir.values.iter().cloned());
        let group_pairs: Vec<(String, String)> = group_pairs.collect();

        for art in &group.artefacts {
            for file in match_pattern(&group_dir.path, &art.pattern, false)? {
                let mut vars = group_pairs.clone();
                vars.extend(art.vars.iter().map(|v| v.id.clone()).zip(file.values));
                catalog.insert(ArtefactReference {
                    type_id: art.id.clone(),
                    path: file.path,
                    vars,
                })?;
            }
        }
    }

    debug!(
        "Scan of '{}' found {} artefacts",
        group.id,
        catalog.artefacts().len()
    );
    Ok(catalog)
}

/// Match `pattern` below `root`. The last component matches directories if
/// `dirs` is set, files otherwise.
pub fn match_pattern(root: &Path, pattern: &PathPattern, dirs: bool) -> Result<Vec<PathMatch>> {
    let mut matches = Vec::new();
    let start = PathMatch {
        path: root.to_path_buf(),
        values: Vec::new(),
    };
    walk(start, pattern, 0, dirs, &mut matches)?;
    Ok(matches)
}

fn walk(
    current: PathMatch,
    pattern: &PathPattern,
    depth: usize,
    dirs: bool,
    out: &mut Vec<PathMatch>,
) -> Result<()> {
    let segments = pattern.segments();
    let Some(segment) = segments.get(depth) else {
        out.push(current);
        return Ok(());
    };
    let last = depth + 1 == segments.len();
    let want_dir = !last || dirs;

    let mut entries: Vec<(String, PathBuf, bool)> = Vec::new();
    let read = match std::fs::read_dir(&current.path) {
        Ok(read) => read,
        Err(e) => {
            debug!("Skipping unreadable directory {:?}: {}", current.path, e);
            return Ok(());
        }
    };
    for entry in read {
        let entry = entry?;
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        let is_dir = entry.file_type()?.is_dir();
        entries.push((name, entry.path(), is_dir));
    }
    entries.sort_by(|a, b| a.0.cmp(&b.0));

    for (name, path, is_dir) in entries {
        if is_dir != want_dir {
            continue;
        }
        let Some(values) = segment.match_name(&name) else {
            continue;
        };
        let mut next = PathMatch {
            path,
            values: current.values.clone(),
        };
        next.values.extend(values);
        walk(next, pattern, depth + 1, dirs, out)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{sample_production, touch};
    use tempfile::TempDir;

    #[test]
    fn test_match_pattern_directories_and_files() {
        let temp = TempDir::new().unwrap();
        touch(&temp.path().join("t1/cam_A/Frame_001.png"));
        touch(&temp.path().join("t1/cam_B/Frame_001.png"));
        touch(&temp.path().join("t1/cam_B/notes.txt"));
        std::fs::create_dir_all(temp.path().join("t2/other")).unwrap();

        let pattern = PathPattern::parse("?trial/cam_?cam").unwrap();
        let dirs = match_pattern(temp.path(), &pattern, true).unwrap();
        let values: Vec<_> = dirs.iter().map(|m| m.values.clone()).collect();
        assert_eq!(values, vec![vec!["t1", "A"], vec!["t1", "B"]]);

        let files = match_pattern(
            &dirs[1].path,
            &PathPattern::parse("Frame_?frame.png").unwrap(),
            false,
        )
        .unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].values, vec!["001"]);
    }

    #[test]
    fn test_scan_group_builds_catalog() {
        let temp = TempDir::new().unwrap();
        let def = sample_production(temp.path());
        for trial in ["t1", "t2"] {
            for cam in ["A", "B"] {
                for frame in ["001", "002", "003"] {
                    touch(&def.output_root.join(format!("{trial}/cam_{cam}/Frame_{frame}.png")));
                }
            }
        }
        // Missing artefact: t2/B has no frame 003
        std::fs::remove_file(def.output_root.join("t2/cam_B/Frame_003.png")).unwrap();

        let catalog = scan_group(&def, "main").unwrap();
        assert_eq!(catalog.group_values[0].values(), &["t1", "t2"]);
        assert_eq!(catalog.group_values[1].values(), &["A", "B"]);
        let images = catalog.artefact_type("images").unwrap();
        assert_eq!(images.values[0].values(), &["001", "002", "003"]);
        assert_eq!(catalog.artefacts().len(), 11);

        let key = |t: &str, c: &str, f: &str| vec![t.to_string(), c.to_string(), f.to_string()];
        assert!(catalog.lookup("images", &key("t1", "B", "003")).is_some());
        assert!(catalog.lookup("images", &key("t2", "B", "003")).is_none());
    }

    #[test]
    fn test_scan_missing_output_root_is_empty() {
        let temp = TempDir::new().unwrap();
        let def = sample_production(temp.path());
        let catalog = scan_group(&def, "main").unwrap();
        assert!(!catalog.has_group_data());
        assert_eq!(catalog.artefact_types.len(), 1);
    }

    #[test]
    fn test_scan_unknown_group() {
        let temp = TempDir::new().unwrap();
        let def = sample_production(temp.path());
        assert!(matches!(scan_group(&def, "nope"), Err(Error::Scan { .. })));
    }
}
