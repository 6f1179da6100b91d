//! Configuration file detection and parsing.
//!
//! Finds `unique-names.json`, or a `package.json` with a `"uniqueNames"`
//! key, and reads engine settings from it.

use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

use crate::reserved::parse_list;
use crate::Config;

pub const CONFIG_FILE_NAME: &str = "unique-names.json";
const PACKAGE_JSON_KEY: &str = "uniqueNames";

/// A configuration file that was found on disk
#[derive(Debug, Clone)]
pub struct ConfigFile {
	/// Path to the file that was found
	pub config_path: PathBuf,
	/// The settings object (the `"uniqueNames"` value for package.json)
	pub settings: Value,
}

/// Find a configuration file by searching upward from a starting directory.
///
/// Searches for:
/// 1. `unique-names.json` in the directory or any parent
/// 2. `package.json` with a `"uniqueNames"` key in the directory or any parent
///
/// Returns `None` if no config is found.
pub fn find_config(start_dir: &Path) -> Option<ConfigFile> {
	for dir in start_dir.ancestors() {
		let config_path = dir.join(CONFIG_FILE_NAME);
		if config_path.exists() {
			if let Ok(content) = fs::read_to_string(&config_path) {
				if let Ok(settings) = serde_json::from_str::<Value>(&content) {
					return Some(ConfigFile {
						config_path,
						settings,
					});
				}
			}
		}

		let package_json_path = dir.join("package.json");
		if package_json_path.exists() {
			if let Ok(content) = fs::read_to_string(&package_json_path) {
				if let Ok(json) = serde_json::from_str::<Value>(&content) {
					if let Some(settings) = json.get(PACKAGE_JSON_KEY) {
						return Some(ConfigFile {
							config_path: package_json_path,
							settings: settings.clone(),
						});
					}
				}
			}
		}
	}

	None
}

/// Read a configuration file from an explicit path.
pub fn read_config_file(config_path: &Path) -> Result<ConfigFile> {
	let content = fs::read_to_string(config_path)
		.with_context(|| format!("Failed to read {}", config_path.display()))?;

	let json: Value = serde_json::from_str(&content)
		.with_context(|| format!("Failed to parse {}", config_path.display()))?;

	// If this is package.json, look under the "uniqueNames" key
	let settings = if config_path
		.file_name()
		.map(|n| n == "package.json")
		.unwrap_or(false)
	{
		json.get(PACKAGE_JSON_KEY)
			.cloned()
			.ok_or_else(|| anyhow::anyhow!("No '{}' key found in package.json", PACKAGE_JSON_KEY))?
	} else {
		json
	};

	Ok(ConfigFile {
		config_path: config_path.to_path_buf(),
		settings,
	})
}

fn get_usize(settings: &Value, key: &str) -> Result<Option<usize>> {
	match settings.get(key) {
		None | Some(Value::Null) => Ok(None),
		Some(value) => value
			.as_u64()
			.map(|n| Some(n as usize))
			.ok_or_else(|| anyhow::anyhow!("'{}' must be a non-negative integer", key)),
	}
}

fn get_string(settings: &Value, key: &str) -> Result<Option<String>> {
	match settings.get(key) {
		None | Some(Value::Null) => Ok(None),
		Some(Value::String(s)) => Ok(Some(s.clone())),
		Some(_) => bail!("'{}' must be a string", key),
	}
}

/// Reserved names may be an array or a single `|`-separated string.
fn get_reserved(settings: &Value, key: &str) -> Result<Option<Vec<String>>> {
	match settings.get(key) {
		None | Some(Value::Null) => Ok(None),
		Some(Value::String(s)) => Ok(Some(parse_list(s))),
		Some(Value::Array(items)) => items
			.iter()
			.map(|item| {
				item.as_str()
					.map(|s| s.trim().to_string())
					.ok_or_else(|| anyhow::anyhow!("'{}' entries must be strings", key))
			})
			.filter(|item| !matches!(item, Ok(s) if s.is_empty()))
			.collect::<Result<Vec<_>>>()
			.map(Some),
		Some(_) => bail!("'{}' must be an array or a string", key),
	}
}

impl ConfigFile {
	/// Apply the file's settings on top of `base`. Unknown keys are ignored.
	pub fn apply(&self, base: Config) -> Result<Config> {
		self.apply_settings(base)
			.with_context(|| format!("Invalid configuration in {}", self.config_path.display()))
	}

	fn apply_settings(&self, mut config: Config) -> Result<Config> {
		let settings = &self.settings;
		if !settings.is_object() {
			bail!("configuration must be a JSON object");
		}

		if let Some(n) = get_usize(settings, "maxLength")? {
			config.max_length = n;
		}
		if let Some(n) = get_usize(settings, "maxAttempts")? {
			config.max_attempts = n;
		}
		if let Some(s) = get_string(settings, "fallbackUsername")? {
			config.fallback_username = s;
		}
		if let Some(s) = get_string(settings, "fallbackGroupName")? {
			config.fallback_group_name = s;
		}
		if let Some(s) = get_string(settings, "hereMention")? {
			config.here_mention = s;
		}
		if let Some(names) = get_reserved(settings, "reservedNames")? {
			config.reserved_names = names;
		}
		if let Some(n) = get_usize(settings, "suffixCacheSize")? {
			config.suffix_cache_size = n;
		}
		if let Some(n) = get_usize(settings, "truncationCacheSize")? {
			config.truncation_cache_size = n;
		}

		Ok(config)
	}
}
