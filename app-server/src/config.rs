use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;
use toml::Value as TomlValue;
use toml::value::Table;

use crate::workspace_context::WorkspaceContext;

pub const CONFIG_TOML_FILE: &str = "config.toml";

const REWIND_HOME_ENV_VAR: &str = "REWIND_HOME";
const DEFAULT_BRIDGE_PROGRAM: &str = "node";
const DEFAULT_BRIDGE_SCRIPT: &str = "sdk-bridge.js";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not find home directory")]
    HomeNotFound,

    #[error("failed to read {path}: {source}", path = .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}", path = .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(#[source] toml::de::Error),

    #[error("failed to resolve current directory: {0}")]
    CurrentDir(#[source] std::io::Error),
}

/// On-disk shape of `config.toml`. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ConfigToml {
    pub project_root: Option<PathBuf>,
    pub session_cwd: Option<PathBuf>,
    #[serde(default)]
    pub bridge: BridgeConfigToml,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BridgeConfigToml {
    pub program: Option<String>,
    pub args: Option<Vec<String>>,
    #[serde(default)]
    pub env: HashMap<String, String>,
}

/// How to launch the external SDK bridge process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    pub program: String,
    pub args: Vec<String>,
    pub env: HashMap<String, String>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            program: DEFAULT_BRIDGE_PROGRAM.to_string(),
            args: vec![DEFAULT_BRIDGE_SCRIPT.to_string()],
            env: HashMap::new(),
        }
    }
}

impl From<BridgeConfigToml> for BridgeConfig {
    fn from(toml: BridgeConfigToml) -> Self {
        let defaults = Self::default();
        Self {
            program: toml.program.unwrap_or(defaults.program),
            args: toml.args.unwrap_or(defaults.args),
            env: toml.env,
        }
    }
}

/// Overrides that come from dedicated CLI flags rather than `-c key=value`.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub project_root: Option<PathBuf>,
    pub rewind_home: Option<PathBuf>,
}

/// Resolved runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub rewind_home: PathBuf,
    pub project_root: PathBuf,
    pub session_cwd: Option<PathBuf>,
    pub bridge: BridgeConfig,
}

impl Config {
    pub fn load_with_cli_overrides(
        cli_overrides: Vec<(String, TomlValue)>,
        overrides: ConfigOverrides,
    ) -> Result<Self, ConfigError> {
        let rewind_home = match overrides.rewind_home {
            Some(home) => home,
            None => find_rewind_home()?,
        };

        let mut root = load_config_as_toml(&rewind_home)?;
        for (path, value) in cli_overrides {
            apply_toml_override(&mut root, &path, value);
        }

        let config_toml: ConfigToml = root.try_into().map_err(ConfigError::Invalid)?;
        let cwd = std::env::current_dir().map_err(ConfigError::CurrentDir)?;
        Ok(Self::from_toml(config_toml, overrides.project_root, rewind_home, &cwd))
    }

    /// Relative `project_root` resolves against `cwd`; relative `session_cwd`
    /// resolves against the project root.
    pub fn from_toml(
        config_toml: ConfigToml,
        project_root_override: Option<PathBuf>,
        rewind_home: PathBuf,
        cwd: &Path,
    ) -> Self {
        let project_root = project_root_override
            .or(config_toml.project_root)
            .map(|root| cwd.join(root))
            .unwrap_or_else(|| cwd.to_path_buf());
        let session_cwd = config_toml
            .session_cwd
            .filter(|path| !path.as_os_str().is_empty())
            .map(|path| project_root.join(path));

        Self {
            rewind_home,
            project_root,
            session_cwd,
            bridge: config_toml.bridge.into(),
        }
    }

    pub fn workspace_context(&self) -> WorkspaceContext {
        let context = WorkspaceContext::default().with_project_base_path(&self.project_root);
        match &self.session_cwd {
            Some(session_cwd) => context.with_session_cwd(session_cwd),
            None => context,
        }
    }
}

/// `$REWIND_HOME` when set and non-empty, else `~/.rewind`.
pub fn find_rewind_home() -> Result<PathBuf, ConfigError> {
    match std::env::var(REWIND_HOME_ENV_VAR) {
        Ok(val) if !val.trim().is_empty() => Ok(PathBuf::from(val)),
        _ => {
            let mut path = dirs::home_dir().ok_or(ConfigError::HomeNotFound)?;
            path.push(".rewind");
            Ok(path)
        }
    }
}

/// Read `config.toml` from `rewind_home`. A missing file is an empty table.
pub fn load_config_as_toml(rewind_home: &Path) -> Result<TomlValue, ConfigError> {
    let path = rewind_home.join(CONFIG_TOML_FILE);
    match std::fs::read_to_string(&path) {
        Ok(contents) => {
            toml::from_str::<TomlValue>(&contents).map_err(|source| ConfigError::Parse { path, source })
        }
        Err(err) if err.kind() == ErrorKind::NotFound => {
            tracing::debug!("{} not found, using defaults", path.display());
            Ok(TomlValue::Table(Table::new()))
        }
        Err(source) => Err(ConfigError::Read { path, source }),
    }
}

/// Set `value` at a dotted `path`, creating (or replacing non-table)
/// intermediate entries as needed.
fn apply_toml_override(root: &mut TomlValue, path: &str, value: TomlValue) {
    let segments: Vec<&str> = path.split('.').collect();
    let Some((last, parents)) = segments.split_last() else {
        return;
    };

    let mut current = root;
    for segment in parents {
        if !current.is_table() {
            *current = TomlValue::Table(Table::new());
        }
        let TomlValue::Table(table) = current else {
            return;
        };
        current = table
            .entry((*segment).to_string())
            .or_insert_with(|| TomlValue::Table(Table::new()));
    }

    match current {
        TomlValue::Table(table) => {
            table.insert((*last).to_string(), value);
        }
        _ => {
            let mut table = Table::new();
            table.insert((*last).to_string(), value);
            *current = TomlValue::Table(table);
        }
    }
}
