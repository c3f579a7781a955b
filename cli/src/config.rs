use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    pub default: Option<Profile>,
    pub profiles: Option<HashMap<String, Profile>>,
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct Profile {
    pub token: Option<String>,
    pub api_base: Option<String>,
    /// `owner/name`
    pub repo: Option<String>,
    pub branch: Option<String>,
    pub gemini_api_key: Option<String>,
    pub gemini_model: Option<String>,
}

impl Profile {
    /// Merge another profile into this one (other takes priority for set fields).
    pub fn merge(&mut self, other: &Profile) {
        fn take(slot: &mut Option<String>, other: &Option<String>) {
            if other.is_some() {
                slot.clone_from(other);
            }
        }
        take(&mut self.token, &other.token);
        take(&mut self.api_base, &other.api_base);
        take(&mut self.repo, &other.repo);
        take(&mut self.branch, &other.branch);
        take(&mut self.gemini_api_key, &other.gemini_api_key);
        take(&mut self.gemini_model, &other.gemini_model);
    }

    /// Fill credentials from the environment. Environment values win over
    /// config files.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(token) = non_empty("REPODECK_TOKEN").or_else(|| non_empty("GITHUB_TOKEN")) {
            self.token = Some(token);
        }
        if let Some(key) = non_empty("GEMINI_API_KEY") {
            self.gemini_api_key = Some(key);
        }
    }
}

/// Walk up from `start` looking for `.repodeck/config.toml`.
pub fn find_project_config(start: &Path) -> Option<PathBuf> {
    let mut dir = start.to_path_buf();
    loop {
        let candidate = dir.join(".repodeck").join("config.toml");
        if candidate.is_file() {
            return Some(candidate);
        }
        if !dir.pop() {
            return None;
        }
    }
}

/// Global config path: `~/.config/repodeck/config.toml`.
pub fn global_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("repodeck").join("config.toml"))
}

fn load_file(path: &Path) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable config file");
            None
        }
    }
}

fn merge_file(result: &mut Profile, cfg: &ConfigFile, profile_name: &str) {
    if let Some(default) = &cfg.default {
        result.merge(default);
    }
    if profile_name != "default" {
        if let Some(named) = cfg.profiles.as_ref().and_then(|p| p.get(profile_name)) {
            result.merge(named);
        }
    }
}

/// Merge the given config files in order; later files win.
pub fn load_from(files: &[PathBuf], profile_name: &str) -> Profile {
    let mut result = Profile::default();
    for path in files {
        if let Some(cfg) = load_file(path) {
            merge_file(&mut result, &cfg, profile_name);
        }
    }
    result
}

/// Resolve a profile by name, merging:
/// Global default → Global named → Project default → Project named → environment
pub fn load_config(profile_name: &str) -> Profile {
    let mut files = Vec::new();
    files.extend(global_config_path());
    if let Some(project) = std::env::current_dir()
        .ok()
        .and_then(|cwd| find_project_config(&cwd))
    {
        files.push(project);
    }

    let mut profile = load_from(&files, profile_name);
    profile.apply_env(|key| std::env::var(key).ok());
    profile
}
