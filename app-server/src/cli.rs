use std::path::PathBuf;

use clap::ArgAction;
use clap::Args;
use clap::Parser;
use toml::Value as TomlValue;

#[derive(Parser, Debug, Default)]
#[command(version, about = "Dispatches UI rewind requests to the agent SDK bridge")]
pub struct Cli {
    /// Use the specified directory as the project root.
    #[clap(long = "cd", short = 'C', value_name = "DIR")]
    pub cwd: Option<PathBuf>,

    #[clap(flatten)]
    pub config_overrides: CliConfigOverrides,
}

/// `-c key=value` overrides applied on top of `config.toml`.
#[derive(Args, Debug, Default, Clone)]
pub struct CliConfigOverrides {
    /// Override a configuration value. `value` is parsed as TOML and falls
    /// back to a literal string, e.g. `-c bridge.program=bun` or
    /// `-c 'bridge.args=["bridge.mjs"]'`.
    #[arg(
        short = 'c',
        long = "config",
        value_name = "key=value",
        action = ArgAction::Append
    )]
    pub raw_overrides: Vec<String>,
}

impl CliConfigOverrides {
    pub fn parse_overrides(&self) -> Result<Vec<(String, TomlValue)>, String> {
        self.raw_overrides
            .iter()
            .map(|raw| {
                let (key, value) = raw
                    .split_once('=')
                    .ok_or_else(|| format!("invalid override (missing '='): {raw}"))?;
                let key = key.trim();
                if key.is_empty() {
                    return Err(format!("empty key in override: {raw}"));
                }

                let value = value.trim();
                let value = parse_toml_value(value)
                    .unwrap_or_else(|| TomlValue::String(trim_quotes(value).to_string()));
                Ok((key.to_string(), value))
            })
            .collect()
    }
}

fn parse_toml_value(raw: &str) -> Option<TomlValue> {
    let wrapped = format!("_x_ = {raw}");
    let table: toml::Table = toml::from_str(&wrapped).ok()?;
    table.get("_x_").cloned()
}

fn trim_quotes(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(value)
}
