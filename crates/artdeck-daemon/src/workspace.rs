//! Workspace collaborator
//!
//! [`WorkspaceApi`] is everything the console needs from a workspace:
//! project discovery, value dictionaries, variant groups, production
//! definitions and launch preparation. [`FsWorkspace`] implements it on a
//! plain directory tree:
//!
//! ```text
//! <workspace>/config/<project>/launch/<launch-id>.json
//! <workspace>/config/<project>/variants/<group>/production.json
//! <workspace>/config/<project>/variants/<group>/trials/<trial>.json
//! <workspace>/config/<project>/variants/<group>/_instances/<id>/instance.json
//! <workspace>/config/<project>/variants/_info.json
//! ```
//!
//! Project ids are paths relative to `config/` (`anytruth/test-01`). Variant
//! groups, launch files and trials are the variants of a project; each can
//! be copied, removed and annotated with an info text.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use artdeck_core::dti;
use artdeck_core::prelude::*;

use crate::process::CommandSpec;
use crate::production::PRODUCTION_FILE;

pub const CONFIG_DIR: &str = "config";
pub const LAUNCH_DIR: &str = "launch";
pub const VARIANTS_DIR: &str = "variants";
pub const TRIALS_DIR: &str = "trials";
pub const INSTANCES_DIR: &str = "_instances";
pub const INSTANCE_FILE: &str = "instance.json";
pub const VARIANT_INFO_FILE: &str = "_info.json";
pub const LAUNCH_DTI: &str = "/catharsys/launch:3";
const INSTANCE_DTI: &str = "/catharsys/variant/instance:1.0";
const INSTANCE_DTI_PATTERN: &str = "/catharsys/variant/instance:1";

/// Project directories are searched up to this depth below `config/`
const MAX_PROJECT_DEPTH: usize = 3;

/// Metadata key of the action path of a prepared launch
pub const META_ACTION_PATH: &str = "sActionPath";
/// Metadata key of the launch file id of a prepared launch
pub const META_LAUNCH_FILE_ID: &str = "sLaunchFileId";
/// Metadata key of the trial of a prepared launch
pub const META_TRIAL: &str = "sTrial";

/// What to launch
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LaunchRequest {
    pub project: String,
    pub variant_group: String,
    pub trial: String,
    pub launch_id: String,
    pub action: String,
}

/// One job of a prepared launch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSpec {
    pub idx: usize,
    pub name: String,
    pub label: String,
    pub command: CommandSpec,
}

/// A variant instance ready to run
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedLaunch {
    pub instance_id: String,
    pub instance_dir: PathBuf,
    pub metadata: BTreeMap<String, String>,
    pub jobs: Vec<JobSpec>,
}

/// A variant of a project
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VariantKey {
    Group(String),
    LaunchFile(String),
    Trial { group: String, trial: String },
}

impl VariantKey {
    /// Name of the variant inside its list
    pub fn name(&self) -> &str {
        match self {
            Self::Group(name) | Self::LaunchFile(name) => name,
            Self::Trial { trial, .. } => trial,
        }
    }

    pub fn kind_label(&self) -> &'static str {
        match self {
            Self::Group(_) => "variant group",
            Self::LaunchFile(_) => "launch file",
            Self::Trial { .. } => "trial",
        }
    }
}

/// A variant instance left on disk, ready to be shown again
#[derive(Debug, Clone, PartialEq)]
pub struct FoundInstance {
    pub request: LaunchRequest,
    pub prepared: PreparedLaunch,
}

/// Access to projects, configurations and launches of a workspace
#[cfg_attr(any(test, feature = "test-helpers"), mockall::automock)]
pub trait WorkspaceApi: Send + Sync {
    fn root(&self) -> PathBuf;

    /// Ids of all projects, sorted
    fn project_ids(&self) -> Result<Vec<String>>;

    fn project_path(&self, project: &str) -> Result<PathBuf>;

    fn launch_ids(&self, project: &str) -> Result<Vec<String>>;

    /// Launch file selected first on the configuration page
    fn default_launch_id(&self, project: &str) -> Result<Option<String>>;

    /// Action paths of a launch file, sorted
    fn actions(&self, project: &str, launch_id: &str) -> Result<Vec<String>>;

    fn launch_args(&self, project: &str, launch_id: &str) -> Result<Map<String, Value>>;

    fn save_launch_args(
        &self,
        project: &str,
        launch_id: &str,
        args: &Map<String, Value>,
    ) -> Result<()>;

    fn variant_groups(&self, project: &str) -> Result<Vec<String>>;

    fn variant_group_path(&self, project: &str, group: &str) -> Result<PathBuf>;

    fn trials(&self, project: &str, group: &str) -> Result<Vec<String>>;

    fn trial_values(&self, project: &str, group: &str, trial: &str) -> Result<Map<String, Value>>;

    fn save_trial_values(
        &self,
        project: &str,
        group: &str,
        trial: &str,
        values: &Map<String, Value>,
    ) -> Result<()>;

    /// Production definition file of a variant group
    fn production_path(&self, project: &str, group: &str) -> Result<PathBuf>;

    /// Create a variant instance and resolve its jobs
    fn prepare_launch(&self, request: &LaunchRequest) -> Result<PreparedLaunch>;

    fn remove_instance(&self, instance_dir: &Path) -> Result<()>;

    /// Variant instances of all variant groups of a project
    fn find_instances(&self, project: &str) -> Result<Vec<FoundInstance>>;

    /// Copy variant `from` under a fresh name; returns the copy
    fn add_variant(&self, project: &str, from: &VariantKey) -> Result<VariantKey>;

    /// Remove a variant; the last one of its kind cannot be removed
    fn remove_variant(&self, project: &str, key: &VariantKey) -> Result<()>;

    /// Info text of a variant, empty if none was set
    fn variant_info(&self, project: &str, key: &VariantKey) -> Result<String>;

    fn set_variant_info(&self, project: &str, key: &VariantKey, info: &str) -> Result<()>;
}

// ─────────────────────────────────────────────────────────────────
// Launch files
// ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobDecl {
    #[serde(rename = "sName")]
    pub name: String,
    #[serde(rename = "sLabel", default)]
    pub label: String,
    #[serde(rename = "lArgs", default)]
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionDecl {
    #[serde(rename = "sCommand")]
    pub command: String,
    #[serde(rename = "lArgs", default)]
    pub args: Vec<String>,
    /// One job per entry; a single job named after the action if empty
    #[serde(rename = "lJobs", default)]
    pub jobs: Vec<JobDecl>,
}

/// Contents of `launch/<id>.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchFile {
    #[serde(rename = "sDTI")]
    pub dti: String,
    #[serde(rename = "mGlobalArgs", default)]
    pub args: Map<String, Value>,
    #[serde(rename = "mActions", default)]
    pub actions: BTreeMap<String, ActionDecl>,
}

impl LaunchFile {
    pub fn load(path: &Path) -> Result<Self> {
        let value = read_json(path)?;
        if dti::check(&value, LAUNCH_DTI).is_none() {
            return Err(Error::config_invalid(format!(
                "'{}' is not a launch file",
                path.display()
            )));
        }
        Ok(serde_json::from_value(value)?)
    }
}

/// Record of a prepared launch in `<instance>/instance.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
struct InstanceFile {
    #[serde(rename = "sDTI")]
    dti: String,
    #[serde(rename = "mMeta")]
    meta: BTreeMap<String, String>,
    #[serde(rename = "mTrial", default)]
    trial: Map<String, Value>,
}

/// Contents of `variants/_info.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct VariantInfoFile {
    #[serde(rename = "mGroups", default)]
    groups: BTreeMap<String, String>,
    #[serde(rename = "mLaunchFiles", default)]
    launch_files: BTreeMap<String, String>,
    /// Keyed by `<group>/<trial>`
    #[serde(rename = "mTrials", default)]
    trials: BTreeMap<String, String>,
}

impl VariantInfoFile {
    fn entries(&mut self, key: &VariantKey) -> (&mut BTreeMap<String, String>, String) {
        match key {
            VariantKey::Group(name) => (&mut self.groups, name.clone()),
            VariantKey::LaunchFile(name) => (&mut self.launch_files, name.clone()),
            VariantKey::Trial { group, trial } => (&mut self.trials, format!("{}/{}", group, trial)),
        }
    }

    fn forget(&mut self, key: &VariantKey) {
        let (entries, name) = self.entries(key);
        entries.remove(&name);
        if let VariantKey::Group(group) = key {
            let prefix = format!("{}/", group);
            self.trials.retain(|k, _| !k.starts_with(&prefix));
        }
    }
}

/// First `<stem>-<n>`, `n >= 2`, not in `taken`; a numeric suffix of
/// `base` is replaced
pub fn next_variant_name(base: &str, taken: &[String]) -> String {
    let numbered = |n: &str| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit());
    let stem = match base.rsplit_once('-') {
        Some((stem, n)) if !stem.is_empty() && numbered(n) => stem,
        _ => base,
    };
    (2..)
        .map(|n| format!("{}-{}", stem, n))
        .find(|name| !taken.iter().any(|t| t == name))
        .unwrap_or_else(|| format!("{}-new", stem))
}

/// Replace `${name}` placeholders from `vars`; unknown names are an error
pub fn expand_placeholders(text: &str, vars: &BTreeMap<String, String>) -> Result<String> {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after
            .find('}')
            .ok_or_else(|| Error::action(format!("unterminated placeholder in '{}'", text)))?;
        let name = &after[..end];
        let value = vars
            .get(name)
            .ok_or_else(|| Error::action(format!("unknown placeholder '{}'", name)))?;
        out.push_str(value);
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

// ─────────────────────────────────────────────────────────────────
// Filesystem workspace
// ─────────────────────────────────────────────────────────────────

/// Workspace on a plain directory tree
#[derive(Debug, Clone)]
pub struct FsWorkspace {
    root: PathBuf,
    launch_file: Option<String>,
}

impl FsWorkspace {
    /// Open a workspace; the path is canonicalised
    pub fn open(path: &Path) -> Result<Self> {
        if !path.is_dir() {
            return Err(Error::NoWorkspace {
                path: path.to_path_buf(),
            });
        }
        let root = dunce::canonicalize(path)?;
        Ok(Self {
            root,
            launch_file: None,
        })
    }

    /// Only projects with launch file `basename` are discovered, and it is
    /// the one selected first
    pub fn with_launch_file(mut self, basename: Option<String>) -> Self {
        self.launch_file = basename.filter(|b| !b.is_empty());
        self
    }

    fn config_dir(&self) -> PathBuf {
        self.root.join(CONFIG_DIR)
    }

    fn launch_path(&self, project: &str, launch_id: &str) -> Result<PathBuf> {
        let path = self
            .project_path(project)?
            .join(LAUNCH_DIR)
            .join(format!("{}.json", launch_id));
        if !path.is_file() {
            return Err(Error::config(format!(
                "launch file '{}' not found in project '{}'",
                launch_id, project
            )));
        }
        Ok(path)
    }

    fn trial_path(&self, project: &str, group: &str, trial: &str) -> Result<PathBuf> {
        let path = self
            .variant_group_path(project, group)?
            .join(TRIALS_DIR)
            .join(format!("{}.json", trial));
        if !path.is_file() {
            return Err(Error::config(format!(
                "trial '{}' not found in variant group '{}'",
                trial, group
            )));
        }
        Ok(path)
    }

    fn find_projects(&self, dir: &Path, prefix: &str, depth: usize, out: &mut Vec<String>) {
        let launch_dir = dir.join(LAUNCH_DIR);
        if launch_dir.is_dir() && !prefix.is_empty() {
            match &self.launch_file {
                Some(basename) if !launch_dir.join(format!("{}.json", basename)).is_file() => {
                    debug!("Project {} has no launch file '{}'", prefix, basename);
                }
                _ => out.push(prefix.to_string()),
            }
            return;
        }
        if depth >= MAX_PROJECT_DEPTH {
            return;
        }
        for name in list_names(dir, true) {
            if name.starts_with('.') || name.starts_with('_') {
                continue;
            }
            let id = if prefix.is_empty() {
                name.clone()
            } else {
                format!("{}/{}", prefix, name)
            };
            self.find_projects(&dir.join(&name), &id, depth + 1, out);
        }
    }
}

impl FsWorkspace {
    fn info_path(&self, project: &str) -> Result<PathBuf> {
        Ok(self.project_path(project)?.join(VARIANTS_DIR).join(VARIANT_INFO_FILE))
    }

    fn load_info(&self, project: &str) -> Result<VariantInfoFile> {
        let path = self.info_path(project)?;
        if !path.is_file() {
            return Ok(VariantInfoFile::default());
        }
        Ok(serde_json::from_value(read_json(&path)?)?)
    }

    fn save_info(&self, project: &str, info: &VariantInfoFile) -> Result<()> {
        write_json_atomic(&self.info_path(project)?, &serde_json::to_value(info)?)
    }

    /// Existing names of the variants of the kind of `key`
    fn variant_names(&self, project: &str, key: &VariantKey) -> Result<Vec<String>> {
        match key {
            VariantKey::Group(_) => self.variant_groups(project),
            VariantKey::LaunchFile(_) => self.launch_ids(project),
            VariantKey::Trial { group, .. } => self.trials(project, group),
        }
    }

    /// Job list of `launch`'s action for a trial in `instance_dir`
    fn resolve_jobs(
        &self,
        request: &LaunchRequest,
        launch: &LaunchFile,
        trial: &Map<String, Value>,
        instance_dir: &Path,
    ) -> Result<Vec<JobSpec>> {
        let action = launch.actions.get(&request.action).ok_or_else(|| {
            Error::action(format!(
                "action '{}' not defined in launch file '{}'",
                request.action, request.launch_id
            ))
        })?;

        let mut vars: BTreeMap<String, String> = BTreeMap::new();
        for (key, value) in launch.args.iter().chain(trial.iter()) {
            if let Some(text) = value_text(value) {
                vars.insert(key.clone(), text);
            }
        }
        vars.insert("project".into(), request.project.clone());
        vars.insert("variant_group".into(), request.variant_group.clone());
        vars.insert("trial".into(), request.trial.clone());
        vars.insert("instance_dir".into(), instance_dir.display().to_string());

        let decls = if action.jobs.is_empty() {
            vec![JobDecl {
                name: request.action.clone(),
                label: request.trial.clone(),
                args: Vec::new(),
            }]
        } else {
            action.jobs.clone()
        };

        let project_dir = self.project_path(&request.project)?;
        let mut jobs = Vec::with_capacity(decls.len());
        for (idx, decl) in decls.into_iter().enumerate() {
            let mut job_vars = vars.clone();
            job_vars.insert("job".into(), decl.name.clone());
            let args = action
                .args
                .iter()
                .chain(decl.args.iter())
                .map(|a| expand_placeholders(a, &job_vars))
                .collect::<Result<Vec<_>>>()?;
            jobs.push(JobSpec {
                idx,
                label: decl.label,
                name: decl.name,
                command: CommandSpec::new(expand_placeholders(&action.command, &job_vars)?)
                    .args(args)
                    .current_dir(&project_dir),
            });
        }
        Ok(jobs)
    }

    /// Rebuild a prepared launch from its instance record
    fn load_instance(&self, project: &str, group: &str, instance_dir: &Path) -> Result<FoundInstance> {
        let value = read_json(&instance_dir.join(INSTANCE_FILE))?;
        if dti::check(&value, INSTANCE_DTI_PATTERN).is_none() {
            return Err(Error::config_invalid(format!(
                "'{}' is not a variant instance",
                instance_dir.display()
            )));
        }
        let record: InstanceFile = serde_json::from_value(value)?;
        let meta = |key: &str| {
            record.meta.get(key).cloned().ok_or_else(|| {
                Error::config_invalid(format!("instance record misses '{}'", key))
            })
        };
        let request = LaunchRequest {
            project: project.to_string(),
            variant_group: group.to_string(),
            trial: meta(META_TRIAL)?,
            launch_id: meta(META_LAUNCH_FILE_ID)?,
            action: meta(META_ACTION_PATH)?,
        };
        let launch = LaunchFile::load(&self.launch_path(project, &request.launch_id)?)?;
        let jobs = self.resolve_jobs(&request, &launch, &record.trial, instance_dir)?;
        let instance_id = instance_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(FoundInstance {
            prepared: PreparedLaunch {
                instance_id,
                instance_dir: instance_dir.to_path_buf(),
                metadata: record.meta,
                jobs,
            },
            request,
        })
    }
}

/// Copy the JSON files of `src` into `dst`, one level deep
fn copy_json_files(src: &Path, dst: &Path) -> Result<()> {
    std::fs::create_dir_all(dst)?;
    for name in list_names(src, false) {
        if name.ends_with(".json") {
            std::fs::copy(src.join(&name), dst.join(&name))?;
        }
    }
    Ok(())
}

impl WorkspaceApi for FsWorkspace {
    fn root(&self) -> PathBuf {
        self.root.clone()
    }

    fn project_ids(&self) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        self.find_projects(&self.config_dir(), "", 0, &mut ids);
        ids.sort();
        Ok(ids)
    }

    fn project_path(&self, project: &str) -> Result<PathBuf> {
        let path = self.config_dir().join(project);
        if project.split('/').any(|p| p.is_empty() || p == "..") || !path.join(LAUNCH_DIR).is_dir()
        {
            return Err(Error::project_not_found(project));
        }
        Ok(path)
    }

    fn launch_ids(&self, project: &str) -> Result<Vec<String>> {
        let dir = self.project_path(project)?.join(LAUNCH_DIR);
        Ok(list_names(&dir, false)
            .into_iter()
            .filter_map(|name| name.strip_suffix(".json").map(str::to_string))
            .collect())
    }

    fn default_launch_id(&self, project: &str) -> Result<Option<String>> {
        let ids = self.launch_ids(project)?;
        let preferred = self
            .launch_file
            .as_ref()
            .filter(|basename| ids.contains(basename))
            .cloned();
        Ok(preferred.or_else(|| ids.into_iter().next()))
    }

    fn actions(&self, project: &str, launch_id: &str) -> Result<Vec<String>> {
        let launch = LaunchFile::load(&self.launch_path(project, launch_id)?)?;
        Ok(launch.actions.keys().cloned().collect())
    }

    fn launch_args(&self, project: &str, launch_id: &str) -> Result<Map<String, Value>> {
        Ok(LaunchFile::load(&self.launch_path(project, launch_id)?)?.args)
    }

    fn save_launch_args(
        &self,
        project: &str,
        launch_id: &str,
        args: &Map<String, Value>,
    ) -> Result<()> {
        let path = self.launch_path(project, launch_id)?;
        let mut launch = LaunchFile::load(&path)?;
        launch.args = args.clone();
        write_json_atomic(&path, &serde_json::to_value(&launch)?)
    }

    fn variant_groups(&self, project: &str) -> Result<Vec<String>> {
        let dir = self.project_path(project)?.join(VARIANTS_DIR);
        Ok(list_names(&dir, true)
            .into_iter()
            .filter(|n| !n.starts_with('.') && !n.starts_with('_'))
            .collect())
    }

    fn variant_group_path(&self, project: &str, group: &str) -> Result<PathBuf> {
        let path = self.project_path(project)?.join(VARIANTS_DIR).join(group);
        if group.is_empty() || group.contains(['/', '\\']) || group == ".." || !path.is_dir() {
            return Err(Error::variant_group_not_found(group));
        }
        Ok(path)
    }

    fn trials(&self, project: &str, group: &str) -> Result<Vec<String>> {
        let dir = self.variant_group_path(project, group)?.join(TRIALS_DIR);
        Ok(list_names(&dir, false)
            .into_iter()
            .filter_map(|name| name.strip_suffix(".json").map(str::to_string))
            .collect())
    }

    fn trial_values(&self, project: &str, group: &str, trial: &str) -> Result<Map<String, Value>> {
        match read_json(&self.trial_path(project, group, trial)?)? {
            Value::Object(map) => Ok(map),
            _ => Err(Error::config_invalid(format!("trial '{}' is not an object", trial))),
        }
    }

    fn save_trial_values(
        &self,
        project: &str,
        group: &str,
        trial: &str,
        values: &Map<String, Value>,
    ) -> Result<()> {
        let path = self.trial_path(project, group, trial)?;
        write_json_atomic(&path, &Value::Object(values.clone()))
    }

    fn production_path(&self, project: &str, group: &str) -> Result<PathBuf> {
        let path = self.variant_group_path(project, group)?.join(PRODUCTION_FILE);
        if !path.is_file() {
            return Err(Error::production(format!(
                "no production definition in variant group '{}'",
                group
            )));
        }
        Ok(path)
    }

    fn prepare_launch(&self, request: &LaunchRequest) -> Result<PreparedLaunch> {
        let launch = LaunchFile::load(&self.launch_path(&request.project, &request.launch_id)?)?;
        if !launch.actions.contains_key(&request.action) {
            return Err(Error::action(format!(
                "action '{}' not defined in launch file '{}'",
                request.action, request.launch_id
            )));
        }
        let trial = self.trial_values(&request.project, &request.variant_group, &request.trial)?;

        let instance_id = uuid::Uuid::new_v4().simple().to_string();
        let instance_dir = self
            .variant_group_path(&request.project, &request.variant_group)?
            .join(INSTANCES_DIR)
            .join(&instance_id);
        std::fs::create_dir_all(&instance_dir)?;

        let jobs = match self.resolve_jobs(request, &launch, &trial, &instance_dir) {
            Ok(jobs) => jobs,
            Err(e) => {
                let _ = std::fs::remove_dir_all(&instance_dir);
                return Err(e);
            }
        };

        let metadata: BTreeMap<String, String> = [
            ("sProject", request.project.as_str()),
            ("sVariantGroup", request.variant_group.as_str()),
            (META_TRIAL, request.trial.as_str()),
            (META_LAUNCH_FILE_ID, request.launch_id.as_str()),
            (META_ACTION_PATH, request.action.as_str()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let record = InstanceFile {
            dti: INSTANCE_DTI.to_string(),
            meta: metadata.clone(),
            trial,
        };
        write_json_atomic(&instance_dir.join(INSTANCE_FILE), &serde_json::to_value(&record)?)?;

        info!(
            "Prepared launch {} with {} jobs in {:?}",
            instance_id,
            jobs.len(),
            instance_dir
        );
        Ok(PreparedLaunch {
            instance_id,
            instance_dir,
            metadata,
            jobs,
        })
    }

    fn remove_instance(&self, instance_dir: &Path) -> Result<()> {
        let inside = instance_dir
            .parent()
            .and_then(Path::file_name)
            .is_some_and(|n| n == INSTANCES_DIR);
        if !inside || !instance_dir.starts_with(&self.root) {
            return Err(Error::action(format!(
                "'{}' is not a variant instance",
                instance_dir.display()
            )));
        }
        match std::fs::remove_dir_all(instance_dir) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn find_instances(&self, project: &str) -> Result<Vec<FoundInstance>> {
        let mut found = Vec::new();
        for group in self.variant_groups(project)? {
            let dir = self.variant_group_path(project, &group)?.join(INSTANCES_DIR);
            for name in list_names(&dir, true) {
                let instance_dir = dir.join(&name);
                match self.load_instance(project, &group, &instance_dir) {
                    Ok(instance) => found.push(instance),
                    Err(e) => warn!("Skipping variant instance {:?}: {}", instance_dir, e),
                }
            }
        }
        debug!("Found {} variant instances in {}", found.len(), project);
        Ok(found)
    }

    fn add_variant(&self, project: &str, from: &VariantKey) -> Result<VariantKey> {
        let taken = self.variant_names(project, from)?;
        let name = next_variant_name(from.name(), &taken);
        let added = match from {
            VariantKey::Group(group) => {
                let src = self.variant_group_path(project, group)?;
                let dst = src.with_file_name(&name);
                copy_json_files(&src, &dst)?;
                copy_json_files(&src.join(TRIALS_DIR), &dst.join(TRIALS_DIR))?;
                VariantKey::Group(name)
            }
            VariantKey::LaunchFile(launch_id) => {
                let src = self.launch_path(project, launch_id)?;
                std::fs::copy(&src, src.with_file_name(format!("{}.json", name)))?;
                VariantKey::LaunchFile(name)
            }
            VariantKey::Trial { group, trial } => {
                let src = self.trial_path(project, group, trial)?;
                std::fs::copy(&src, src.with_file_name(format!("{}.json", name)))?;
                VariantKey::Trial {
                    group: group.clone(),
                    trial: name,
                }
            }
        };
        info!("Added {} '{}' to {}", added.kind_label(), added.name(), project);
        Ok(added)
    }

    fn remove_variant(&self, project: &str, key: &VariantKey) -> Result<()> {
        let names = self.variant_names(project, key)?;
        if !names.iter().any(|n| n == key.name()) {
            return Err(Error::config(format!(
                "{} '{}' not found in project '{}'",
                key.kind_label(),
                key.name(),
                project
            )));
        }
        if names.len() <= 1 {
            return Err(Error::config(format!(
                "Cannot remove the last {}",
                key.kind_label()
            )));
        }
        match key {
            VariantKey::Group(group) => {
                std::fs::remove_dir_all(self.variant_group_path(project, group)?)?
            }
            VariantKey::LaunchFile(launch_id) => {
                std::fs::remove_file(self.launch_path(project, launch_id)?)?
            }
            VariantKey::Trial { group, trial } => {
                std::fs::remove_file(self.trial_path(project, group, trial)?)?
            }
        }
        let mut info = self.load_info(project)?;
        info.forget(key);
        self.save_info(project, &info)?;
        info!("Removed {} '{}' from {}", key.kind_label(), key.name(), project);
        Ok(())
    }

    fn variant_info(&self, project: &str, key: &VariantKey) -> Result<String> {
        let mut info = self.load_info(project)?;
        let (entries, name) = info.entries(key);
        Ok(entries.get(&name).cloned().unwrap_or_default())
    }

    fn set_variant_info(&self, project: &str, key: &VariantKey, text: &str) -> Result<()> {
        if !self.variant_names(project, key)?.iter().any(|n| n == key.name()) {
            return Err(Error::config(format!(
                "{} '{}' not found in project '{}'",
                key.kind_label(),
                key.name(),
                project
            )));
        }
        let mut info = self.load_info(project)?;
        let (entries, name) = info.entries(key);
        if text.is_empty() {
            entries.remove(&name);
        } else {
            entries.insert(name, text.to_string());
        }
        self.save_info(project, &info)
    }
}

// ─────────────────────────────────────────────────────────────────
// File helpers
// ─────────────────────────────────────────────────────────────────

/// Sorted entry names of a directory; empty if it cannot be read
pub fn list_names(dir: &Path, dirs: bool) -> Vec<String> {
    let Ok(read) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = read
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|t| t.is_dir() == dirs).unwrap_or(false))
        .filter_map(|e| e.file_name().into_string().ok())
        .collect();
    names.sort();
    names
}

pub fn read_json(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Write pretty JSON through a temp file and rename
pub fn write_json_atomic(path: &Path, value: &Value) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(value)?;
    let temp = path.with_extension("json.tmp");
    std::fs::write(&temp, content)?;
    std::fs::rename(&temp, path)?;
    Ok(())
}
