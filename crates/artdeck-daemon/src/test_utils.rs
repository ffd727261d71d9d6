//! Test utilities for daemon types
//!
//! Fixture builders for workspaces, production definitions and jobs.

use std::path::Path;

use serde_json::json;

use crate::process::CommandSpec;
use crate::production::{ProductionDef, PRODUCTION_FILE};
use crate::workspace::{write_json_atomic, FsWorkspace, JobSpec};

/// Production definition with one group `main` (`?trial/cam_?cam`) and one
/// artefact type `images` (`Frame_?frame.png`).
pub fn production_json() -> serde_json::Value {
    json!({
        "sDTI": "/catharsys/production:1.0",
        "mGroups": {
            "main": {
                "sName": "Main",
                "sPathStructure": "?trial/cam_?cam",
                "mVars": {
                    "trial": { "sName": "Trial" },
                    "cam": { "sName": "Camera" }
                },
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
            }
        }
    })
}

/// Writes [`production_json()`] into `dir` and loads it.
///
/// # Arguments
/// * `dir` - Variant group directory; artefacts go to `dir/production`
pub fn sample_production(dir: &Path) -> ProductionDef {
    let path = dir.join(PRODUCTION_FILE);
    write_json_atomic(&path, &production_json()).expect("write production.json");
    ProductionDef::load(&path).expect("load production.json")
}

/// Creates an empty file, including parent directories.
pub fn touch(path: &Path) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create parent dirs");
    }
    std::fs::write(path, b"").expect("create file");
}

/// Creates a job running `sh -c <script>`.
///
/// # Arguments
/// * `idx` - Job index; name is `job-{idx}`, label `label {idx}`
/// * `script` - Shell script of the job
pub fn shell_job(idx: usize, script: &str) -> JobSpec {
    JobSpec {
        idx,
        name: format!("job-{}", idx),
        label: format!("label {}", idx),
        command: CommandSpec::new("sh").arg("-c").arg(script),
    }
}

/// Creates a workspace with project `demo/p1`, launch file `launch`
/// (action `render/std` with jobs `cam-a`, `cam-b`), variant group `vg1`
/// and trial `trial-a`.
pub fn sample_workspace(root: &Path) -> FsWorkspace {
    let project = root.join("config/demo/p1");
    write_json_atomic(
        &project.join("launch/launch.json"),
        &json!({
            "sDTI": "/catharsys/launch:3.0",
            "mGlobalArgs": { "iFps": 24, "sMode": "std" },
            "mActions": {
                "render/std": {
                    "sCommand": "sh",
                    "lArgs": ["-c"],
                    "lJobs": [
                        { "sName": "cam-a", "sLabel": "Camera A", "lArgs": ["echo ${trial} ${iFps} ${job}"] },
                        { "sName": "cam-b", "sLabel": "Camera B", "lArgs": ["echo ${trial} ${iFps} ${job}"] }
                    ]
                }
            }
        }),
    )
    .expect("write launch file");

    let group = project.join("variants/vg1");
    write_json_atomic(
        &group.join("trials/trial-a.json"),
        &json!({
            "sDTI": "/catharsys/trial:1.0",
            "iFrameCount": 10,
            "fExposure": 1.5,
            "bDenoise": true,
            "sCamera": "Cam01"
        }),
    )
    .expect("write trial");
    sample_production(&group);

    FsWorkspace::open(root).expect("open workspace")
}
