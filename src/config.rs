//! Tool manifest types, loading, and selection

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};

/// Top-level tool manifest.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Tools to build, keyed by module or repository path.
    pub tools: BTreeMap<String, ToolSpec>,
}

/// Build description for a single tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSpec {
    /// Output executable name. Defaults to the last path segment of the
    /// module, with a trailing major-version segment stripped.
    pub cmd: Option<String>,

    /// Clone the repository instead of fetching it as a module.
    pub clone: bool,

    /// Build steps run inside the checkout. Empty means plain `go build`.
    pub build: Vec<String>,
}

impl Config {
    /// Load the manifest, searching the fallback chain when no explicit path
    /// is given. No manifest anywhere is an error: an empty manifest would
    /// build nothing.
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        let local_config = PathBuf::from("config.yaml");
        if local_config.exists() {
            return Self::load_from_file(&local_config)
                .context(format!("Failed to load config from {}", local_config.display()));
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("toolforge").join("config.yaml");
            if user_config.exists() {
                return Self::load_from_file(&user_config)
                    .context(format!("Failed to load config from {}", user_config.display()));
            }
        }

        Err(eyre::eyre!(
            "No configuration file found (looked for ./config.yaml and the user config directory)"
        ))
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Restrict `tools` to the requested names. An empty request keeps the whole
/// set; names with no manifest entry are ignored.
pub fn select(tools: BTreeMap<String, ToolSpec>, requested: &[String]) -> BTreeMap<String, ToolSpec> {
    if requested.is_empty() {
        return tools;
    }

    tools
        .into_iter()
        .filter(|(name, _)| requested.iter().any(|want| want == name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_empty() {
        let config = Config::default();
        assert!(config.tools.is_empty());
    }

    #[test]
    fn test_deserialize_config() {
        let yaml = r#"
tools:
  golang.org/x/tools/gopls: {}
  github.com/junegunn/fzf:
    clone: true
    build:
      - go build -o ${OUTDIR}/fzf .
  example.org/cmd/v2:
    cmd: example
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.tools.len(), 3);

        let gopls = &config.tools["golang.org/x/tools/gopls"];
        assert!(gopls.cmd.is_none());
        assert!(!gopls.clone);
        assert!(gopls.build.is_empty());

        let fzf = &config.tools["github.com/junegunn/fzf"];
        assert!(fzf.clone);
        assert_eq!(fzf.build, vec!["go build -o ${OUTDIR}/fzf .".to_string()]);

        let cmd = &config.tools["example.org/cmd/v2"];
        assert_eq!(cmd.cmd.as_deref(), Some("example"));
    }

    #[test]
    fn test_partial_spec_uses_defaults() {
        let yaml = r#"
tools:
  example.org/tool:
    clone: true
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();
        let spec = &config.tools["example.org/tool"];

        assert!(spec.clone);
        assert!(spec.cmd.is_none());
        assert!(spec.build.is_empty());
    }

    fn sample_tools() -> BTreeMap<String, ToolSpec> {
        ["example.org/a", "example.org/b", "example.org/c"]
            .into_iter()
            .map(|name| (name.to_string(), ToolSpec::default()))
            .collect()
    }

    #[test]
    fn test_select_empty_request_keeps_everything() {
        let tools = select(sample_tools(), &[]);
        assert_eq!(tools.len(), 3);
    }

    #[test]
    fn test_select_filters_to_requested() {
        let tools = select(sample_tools(), &["example.org/b".to_string()]);
        assert_eq!(tools.len(), 1);
        assert!(tools.contains_key("example.org/b"));
    }

    #[test]
    fn test_select_ignores_unknown_names() {
        let tools = select(sample_tools(), &["example.org/b".to_string(), "example.org/missing".to_string()]);
        assert_eq!(tools.len(), 1);
        assert!(tools.contains_key("example.org/b"));
    }
}
