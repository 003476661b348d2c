//! Build configuration loaded from `a3s-build.yml`.
//!
//! The file is plain YAML with four sections (`image`, `build`, `registry`,
//! `buildkit`). Before parsing, `${VAR}` and `${VAR:-default}` references are
//! expanded from the process environment.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{BuildError, Result};

/// Default config filename looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "a3s-build.yml";

/// Placeholder shown instead of registry credentials.
const MASKED: &str = "*********";

/// Top-level build configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Image attributes and build context location
    pub image: ImageConfig,

    /// Build behaviour
    pub build: BuildOptions,

    /// Registry to push to
    pub registry: RegistryConfig,

    /// BuildKit driver settings
    pub buildkit: BuildkitConfig,
}

/// Image attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// Image name (required, must not contain `:`)
    pub name: String,

    /// Image tag
    pub tag: String,

    /// Build context directory
    pub path: PathBuf,

    /// Dockerfile name, relative to the context directory
    pub dockerfile: String,

    /// Build arguments; a missing value means "take it from the builder's environment"
    pub build_args: BTreeMap<String, Option<String>>,

    /// Image labels
    #[serde(rename = "label")]
    pub labels: BTreeMap<String, String>,

    /// Docker daemon address (e.g. `unix:///var/run/docker.sock`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docker_host: Option<String>,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            tag: "latest".to_string(),
            path: PathBuf::from("."),
            dockerfile: "Dockerfile".to_string(),
            build_args: BTreeMap::new(),
            labels: BTreeMap::new(),
            docker_host: None,
        }
    }
}

/// Options controlling the build itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildOptions {
    /// Build stage to stop at in a multi-stage Dockerfile (empty = last stage)
    pub target: String,

    /// Disable the build cache
    pub no_cache: bool,

    /// Show the configuration before building
    pub verbose: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            target: String::new(),
            no_cache: false,
            verbose: true,
        }
    }
}

/// Registry settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Push to the registry after a successful build
    pub enabled: bool,

    /// Registry host, optionally with port (e.g. `myregistry.com:5000`)
    pub host: String,

    /// Project (namespace) inside the registry
    pub project: String,

    /// Basic-auth credentials (`username`, `password`)
    pub auth: BTreeMap<String, String>,
}

/// BuildKit driver settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildkitConfig {
    /// Build with BuildKit instead of the classic builder
    pub enabled: bool,

    /// Target platforms (e.g. `linux/amd64`)
    pub platform: Vec<String>,

    /// Remove the builder container after the build
    pub remove: bool,
}

impl Default for BuildkitConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            platform: Vec::new(),
            remove: true,
        }
    }
}

impl Config {
    /// Load and validate a config file.
    ///
    /// A relative `image.path` is resolved against the directory holding the
    /// config file, so the result never depends on the process working directory.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| BuildError::read(path, e))?;
        let mut config = Self::from_yaml_str(&raw)?;

        if let Some(base) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if config.image.path.is_relative() {
                config.image.path = base.join(&config.image.path);
            }
        }

        tracing::debug!(
            config = %path.display(),
            context = %config.image.path.display(),
            "Loaded build configuration"
        );
        Ok(config)
    }

    /// Parse and validate config text, expanding environment references first.
    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        let expanded = expand_env(raw, |name| std::env::var(name).ok())?;
        let config: Config = serde_yaml::from_str(&expanded)?;
        config.validate()?;
        Ok(config)
    }

    /// Check required fields.
    pub fn validate(&self) -> Result<()> {
        if self.image.name.is_empty() {
            return Err(BuildError::ConfigError("image.name is required".to_string()));
        }
        if self.image.name.contains(':') {
            return Err(BuildError::ConfigError(format!(
                "image.name must not contain ':' (got '{}')",
                self.image.name
            )));
        }
        if self.image.tag.contains(':') {
            return Err(BuildError::ConfigError(format!(
                "image.tag must not contain ':' (got '{}')",
                self.image.tag
            )));
        }
        Ok(())
    }

    /// Build context directory.
    pub fn context_dir(&self) -> &Path {
        &self.image.path
    }

    /// Dockerfile path on the host.
    pub fn dockerfile_path(&self) -> PathBuf {
        self.image.path.join(&self.image.dockerfile)
    }

    /// Ordered `(field, value)` rows for display. Credentials are masked.
    pub fn display_rows(&self) -> Vec<(&'static str, String)> {
        let build_args = self
            .image
            .build_args
            .iter()
            .map(|(k, v)| match v {
                Some(v) => format!("{k}={v}"),
                None => k.clone(),
            })
            .collect::<Vec<_>>()
            .join(", ");
        let labels = self
            .image
            .labels
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(", ");
        let auth = if self.registry.auth.is_empty() {
            String::new()
        } else {
            MASKED.to_string()
        };

        vec![
            ("image.name", self.image.name.clone()),
            ("image.tag", self.image.tag.clone()),
            ("image.path", self.image.path.display().to_string()),
            ("image.dockerfile", self.image.dockerfile.clone()),
            ("image.build_args", build_args),
            ("image.label", labels),
            (
                "image.docker_host",
                self.image.docker_host.clone().unwrap_or_default(),
            ),
            ("build.target", self.build.target.clone()),
            ("build.no_cache", self.build.no_cache.to_string()),
            ("build.verbose", self.build.verbose.to_string()),
            ("registry.enabled", self.registry.enabled.to_string()),
            ("registry.host", self.registry.host.clone()),
            ("registry.project", self.registry.project.clone()),
            ("registry.auth", auth),
            ("buildkit.enabled", self.buildkit.enabled.to_string()),
            ("buildkit.platform", self.buildkit.platform.join(", ")),
            ("buildkit.remove", self.buildkit.remove.to_string()),
        ]
    }
}

/// Expand `${VAR}` and `${VAR:-default}` references.
///
/// A variable that is unset or empty takes its default; with no default it is
/// an error. An unterminated `${` is left as-is.
pub fn expand_env<F>(raw: &str, lookup: F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            return Ok(out);
        };

        let inner = &after[..end];
        let (name, default) = match inner.split_once(":-") {
            Some((name, default)) => (name, Some(default)),
            None => (inner, None),
        };
        if name.is_empty() {
            return Err(BuildError::ConfigError(format!(
                "empty variable name in '${{{inner}}}'"
            )));
        }

        match (lookup(name).filter(|v| !v.is_empty()), default) {
            (Some(value), _) => out.push_str(&value),
            (None, Some(default)) if !default.is_empty() => out.push_str(default),
            _ => {
                return Err(BuildError::ConfigError(format!(
                    "environment variable {name} is not defined"
                )))
            }
        }
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    Ok(out)
}
