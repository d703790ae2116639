use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

/// Project-level settings, read from `.refgraph/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub policy: PolicyConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
}

/// Cycle allow-list rules layered on top of the built-in export defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Include the built-in export rules (routing queue/email route,
    /// edge site/trunk base settings).
    #[serde(default = "default_true")]
    pub builtin_defaults: bool,
    /// Ordered cycle patterns to ignore. Open (`[a, b]`) or closed (`[a, b, a]`).
    #[serde(default)]
    pub ignored: Vec<Vec<String>>,
    #[serde(default)]
    pub excused: Vec<ExcusedConfig>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            builtin_defaults: default_true(),
            ignored: Vec::new(),
            excused: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExcusedConfig {
    pub members: Vec<String>,
    #[serde(default)]
    pub mode: ExcusedMatch,
}

/// How an excused member set is compared against a cycle's members.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExcusedMatch {
    /// The cycle contains every excused member; other types may also appear.
    #[default]
    Contains,
    /// Every cycle member belongs to the excused set.
    Within,
    /// The cycle's member set equals the excused set.
    Exact,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Manifest used when the command line does not name one. Relative
    /// paths resolve against the project root.
    #[serde(default)]
    pub manifest: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserConfig {
    #[serde(default)]
    pub output: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectiveConfig {
    pub project: ProjectConfig,
    pub user: UserConfig,
    pub resolved_output: String,
}

/// Load `.refgraph/config.toml` under `project_root`, or defaults if absent.
pub fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
    let path = project_root.join(".refgraph/config.toml");
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }
    load_config_file(&path)
}

/// Load an explicit project config file. Unlike [`load_project_config`], a
/// missing file is an error.
pub fn load_config_file(path: &Path) -> Result<ProjectConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<ProjectConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

pub fn load_user_config() -> Result<UserConfig> {
    let Some(config_dir) = dirs::config_dir() else {
        return Ok(UserConfig::default());
    };

    let path = config_dir.join("refgraph/config.toml");
    if !path.exists() {
        return Ok(UserConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<UserConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Combine project, user and environment settings.
///
/// `config_override` replaces the `.refgraph/config.toml` lookup.
pub fn resolve_config(
    project_root: &Path,
    config_override: Option<&Path>,
    cli_json: bool,
) -> Result<EffectiveConfig> {
    let project = match config_override {
        Some(path) => load_config_file(path)?,
        None => load_project_config(project_root)?,
    };
    let user = load_user_config()?;

    let env_format = env::var("FORMAT").ok();
    let resolved_output = resolve_output(cli_json, user.output.clone(), env_format)?;

    Ok(EffectiveConfig {
        project,
        user,
        resolved_output,
    })
}

fn resolve_output(
    cli_json: bool,
    user_output: Option<String>,
    env_format: Option<String>,
) -> Result<String> {
    fn normalize_output_mode(raw: &str) -> Option<&'static str> {
        match raw.trim().to_ascii_lowercase().as_str() {
            // canonical values
            "pretty" => Some("pretty"),
            "text" => Some("text"),
            "json" => Some("json"),
            // legacy compatibility
            "human" => Some("pretty"),
            "table" => Some("text"),
            _ => None,
        }
    }

    if cli_json {
        return Ok("json".to_string());
    }

    if let Some(mode) = env_format.as_deref().and_then(normalize_output_mode) {
        return Ok(mode.to_string());
    }

    if let Some(mode) = user_output.as_deref().and_then(normalize_output_mode) {
        return Ok(mode.to_string());
    }

    if std::io::stdout().is_terminal() {
        Ok("pretty".to_string())
    } else {
        Ok("text".to_string())
    }
}

const fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_project_config_uses_defaults() {
        let root = tempfile::tempdir().expect("tempdir");
        let cfg = load_project_config(root.path()).expect("load should succeed");
        assert!(cfg.policy.builtin_defaults);
        assert!(cfg.policy.ignored.is_empty());
        assert!(cfg.policy.excused.is_empty());
        assert!(cfg.registry.manifest.is_none());
    }

    #[test]
    fn project_config_parses_policy_rules() {
        let root = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir_all(root.path().join(".refgraph")).expect("mkdir");
        std::fs::write(
            root.path().join(".refgraph/config.toml"),
            r#"
[registry]
manifest = "exporters.toml"

[policy]
builtin_defaults = false
ignored = [["queue", "email_route", "queue"]]

[[policy.excused]]
members = ["site", "trunkbasesettings"]

[[policy.excused]]
members = ["a", "b"]
mode = "exact"
"#,
        )
        .expect("write config");

        let cfg = load_project_config(root.path()).expect("load");
        assert!(!cfg.policy.builtin_defaults);
        assert_eq!(cfg.policy.ignored, vec![vec!["queue", "email_route", "queue"]]);
        assert_eq!(cfg.policy.excused.len(), 2);
        assert_eq!(cfg.policy.excused[0].mode, ExcusedMatch::Contains);
        assert_eq!(cfg.policy.excused[1].mode, ExcusedMatch::Exact);
        assert_eq!(
            cfg.registry.manifest,
            Some(PathBuf::from("exporters.toml"))
        );
    }

    #[test]
    fn invalid_project_config_names_the_file() {
        let root = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir_all(root.path().join(".refgraph")).expect("mkdir");
        std::fs::write(
            root.path().join(".refgraph/config.toml"),
            "[[policy.excused]]\nmembers = [\"a\"]\nmode = \"sometimes\"\n",
        )
        .expect("write config");

        let err = load_project_config(root.path()).expect_err("bad mode must fail");
        assert!(format!("{err:#}").contains("config.toml"));
    }

    #[test]
    fn explicit_config_file_must_exist() {
        let root = tempfile::tempdir().expect("tempdir");
        assert!(load_config_file(&root.path().join("nope.toml")).is_err());
    }

    #[test]
    fn cli_json_overrides_env_and_config() {
        let output = resolve_output(true, Some("pretty".to_string()), Some("text".to_string()))
            .expect("resolve should succeed");
        assert_eq!(output, "json");
    }

    #[test]
    fn env_overrides_user_config() {
        let output = resolve_output(false, Some("json".to_string()), Some("text".to_string()))
            .expect("resolve should succeed");
        assert_eq!(output, "text");
    }

    #[test]
    fn legacy_aliases_are_normalized() {
        let pretty = resolve_output(false, Some("table".to_string()), Some("human".to_string()))
            .expect("resolve should succeed");
        assert_eq!(pretty, "pretty");

        let text = resolve_output(false, Some("human".to_string()), Some("table".to_string()))
            .expect("resolve should succeed");
        assert_eq!(text, "text");
    }

    #[test]
    fn user_config_parses_output() {
        let cfg: UserConfig = toml::from_str("output = \"json\"\n").expect("parse");
        assert_eq!(cfg.output, Some("json".to_string()));
    }
}
