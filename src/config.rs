//! Configuration with layered resolution using figment.
//!
//! Resolution order (highest priority last):
//! 1. User config: `~/.config/wiring/config.toml` (XDG) or platform config dir
//! 2. Project config: `.wiring.toml`
//! 3. Environment variables: `WIRING_*`, nested with `__`
//!    (`WIRING_LOGGER__LIMIT_MB=256`)
//!
//! # Example
//!
//! ```toml
//! [logger]
//! limit_mb = 256
//!
//! [injection.db]
//! type = "property"
//!
//! [injection.logger]
//! type = "method"
//! member = "attach_logger"
//!
//! [properties.database]
//! url = "${DATABASE_URL:-postgres://localhost/app}"
//! ```
//!
//! String values under `properties` may reference environment variables as
//! `${NAME}` or `${NAME:-fallback}`; `$${` produces a literal `${`. They are
//! substituted once, at load time. The loaded [`Config`] is never mutated
//! afterwards and is shared by reference (`Arc<Config>`).

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::injection::InjectionHint;

/// Errors raised while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Boxed to keep `Result` small on the stack.
    #[error(transparent)]
    Figment(Box<figment::Error>),

    #[error("Environment variable '{variable}' referenced by property '{path}' is not set")]
    MissingVariable { variable: String, path: String },

    #[error("Unterminated placeholder in property '{path}': '{value}'")]
    UnterminatedPlaceholder { path: String, value: String },
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logger: LoggerConfig,
    /// Injection hints keyed by dependency name.
    #[serde(default)]
    pub injection: HashMap<String, InjectionHint>,
    /// Free-form application properties, read with [`Config::get_prop`].
    #[serde(default)]
    pub properties: Value,
}

/// Memory logger configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggerConfig {
    /// Memory usage (MB) above which messages are logged as warnings.
    #[serde(default = "default_limit_mb")]
    pub limit_mb: u64,
}

/// Default memory warning threshold in MB.
pub const DEFAULT_LIMIT_MB: u64 = 512;

fn default_limit_mb() -> u64 {
    DEFAULT_LIMIT_MB
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            limit_mb: DEFAULT_LIMIT_MB,
        }
    }
}

impl Config {
    /// Load config with layered resolution (user → project → env).
    pub fn load() -> Result<Self, ConfigError> {
        let user_config = Self::user_config_path();

        Self::from_figment(
            Figment::new()
                // Layer 1: User config (lowest priority)
                .merge(Toml::file(user_config))
                // Layer 2: Project config
                .merge(Toml::file(".wiring.toml"))
                // Layer 3: Environment variables (highest priority)
                .merge(Self::env()),
        )
    }

    /// Load config from an explicit file, still overridable by environment.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_figment(
            Figment::new()
                .merge(Toml::file(path.as_ref()))
                .merge(Self::env()),
        )
    }

    /// Extracts a config from `figment` and substitutes placeholders.
    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let mut config: Config = figment.extract()?;
        substitute(&mut config.properties, "properties", &|name: &str| {
            std::env::var(name).ok()
        })?;
        Ok(config)
    }

    /// Wraps the config for sharing with every consumer.
    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Looks up a property by dotted path (`"database.pool.size"`).
    ///
    /// Array elements are addressed by index (`"hosts.0"`).
    pub fn get_prop(&self, key: &str) -> Option<&Value> {
        key.split('.').try_fold(&self.properties, |node, segment| match node {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
    }

    /// Whether a non-null property exists at `key`.
    pub fn has(&self, key: &str) -> bool {
        self.get_prop(key).is_some_and(|value| !value.is_null())
    }

    fn env() -> Env {
        Env::prefixed("WIRING_").split("__")
    }

    /// User config path: ~/.config/wiring/config.toml (XDG) or platform config dir.
    fn user_config_path() -> std::path::PathBuf {
        // Prefer XDG config location (~/.config) on all platforms
        if let Some(home) = dirs::home_dir() {
            let xdg_path = home.join(".config").join("wiring").join("config.toml");
            if xdg_path.exists() {
                return xdg_path;
            }
        }
        // Fall back to platform-specific config dir
        dirs::config_dir()
            .map(|p| p.join("wiring").join("config.toml"))
            .unwrap_or_default()
    }
}

/// Replaces placeholders in every string leaf of `value`.
fn substitute(
    value: &mut Value,
    path: &str,
    lookup: &dyn Fn(&str) -> Option<String>,
) -> Result<(), ConfigError> {
    match value {
        Value::String(text) => {
            *text = expand(text, path, lookup)?;
        }
        Value::Array(items) => {
            for (index, item) in items.iter_mut().enumerate() {
                substitute(item, &format!("{}.{}", path, index), lookup)?;
            }
        }
        Value::Object(map) => {
            for (key, item) in map.iter_mut() {
                substitute(item, &format!("{}.{}", path, key), lookup)?;
            }
        }
        _ => {}
    }
    Ok(())
}

fn expand(
    input: &str,
    path: &str,
    lookup: &dyn Fn(&str) -> Option<String>,
) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find('$') {
        output.push_str(&rest[..start]);
        let tail = &rest[start..];

        if let Some(after) = tail.strip_prefix("$${") {
            output.push_str("${");
            rest = after;
        } else if let Some(after) = tail.strip_prefix("${") {
            let end = after
                .find('}')
                .ok_or_else(|| ConfigError::UnterminatedPlaceholder {
                    path: path.to_string(),
                    value: input.to_string(),
                })?;
            let (variable, fallback) = match after[..end].split_once(":-") {
                Some((variable, fallback)) => (variable, Some(fallback)),
                None => (&after[..end], None),
            };

            match (lookup(variable), fallback) {
                (Some(resolved), _) => output.push_str(&resolved),
                (None, Some(fallback)) => output.push_str(fallback),
                (None, None) => {
                    return Err(ConfigError::MissingVariable {
                        variable: variable.to_string(),
                        path: path.to_string(),
                    })
                }
            }
            rest = &after[end + 1..];
        } else {
            output.push('$');
            rest = &tail[1..];
        }
    }

    output.push_str(rest);
    Ok(output)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use serde_json::json;
    use serial_test::serial;

    use super::*;
    use crate::injection::InjectionType;

    fn lookup(name: &str) -> Option<String> {
        match name {
            "HOST" => Some("db.internal".to_string()),
            "PORT" => Some("5432".to_string()),
            _ => None,
        }
    }

    #[test]
    fn test_expand_placeholders() {
        assert_eq!(
            expand("postgres://${HOST}:${PORT}/app", "p", &lookup).unwrap(),
            "postgres://db.internal:5432/app"
        );
        assert_eq!(expand("${USER_NAME:-guest}", "p", &lookup).unwrap(), "guest");
        assert_eq!(expand("${HOST:-ignored}", "p", &lookup).unwrap(), "db.internal");
        assert_eq!(expand("cost: $5 $${HOST}", "p", &lookup).unwrap(), "cost: $5 ${HOST}");
    }

    #[test]
    fn test_expand_errors() {
        let err = expand("${NOPE}", "properties.a", &lookup).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingVariable { ref variable, ref path }
                if variable == "NOPE" && path == "properties.a"
        ));

        let err = expand("${HOST", "properties.a", &lookup).unwrap_err();
        assert!(matches!(err, ConfigError::UnterminatedPlaceholder { .. }));
    }

    #[test]
    fn test_substitute_walks_tree() {
        let mut value = json!({
            "db": { "url": "${HOST}", "replicas": ["${HOST}", 2] },
            "port": 8080
        });
        substitute(&mut value, "properties", &lookup).unwrap();
        assert_eq!(
            value,
            json!({
                "db": { "url": "db.internal", "replicas": ["db.internal", 2] },
                "port": 8080
            })
        );
    }

    #[test]
    fn test_defaults_when_empty() {
        let config = Config::from_figment(Figment::new()).unwrap();
        assert_eq!(config.logger.limit_mb, DEFAULT_LIMIT_MB);
        assert!(config.injection.is_empty());
        assert!(!config.has("anything"));
    }

    #[test]
    fn test_get_prop_and_has() {
        let config = Config {
            properties: json!({
                "database": { "pool": { "size": 8 }, "hosts": ["a", "b"] },
                "feature": null
            }),
            ..Config::default()
        };

        assert_eq!(config.get_prop("database.pool.size"), Some(&json!(8)));
        assert_eq!(config.get_prop("database.hosts.1"), Some(&json!("b")));
        assert_eq!(config.get_prop("database.missing"), None);
        assert!(config.has("database.pool"));
        assert!(!config.has("feature"));
        assert!(!config.has("database.hosts.9"));
    }

    #[test]
    #[serial]
    fn test_load_from_file_with_env() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[logger]
limit_mb = 128

[injection.db]
type = "property"

[injection.logger]
type = "method"
member = "attach_logger"

[properties.database]
url = "postgres://${{WIRING_TEST_DB_HOST}}/app"
"#
        )
        .unwrap();

        std::env::set_var("WIRING_TEST_DB_HOST", "10.0.0.5");
        std::env::set_var("WIRING_LOGGER__LIMIT_MB", "64");
        let config = Config::load_from(file.path());
        std::env::remove_var("WIRING_TEST_DB_HOST");
        std::env::remove_var("WIRING_LOGGER__LIMIT_MB");
        let config = config.unwrap();

        assert_eq!(config.logger.limit_mb, 64);
        assert_eq!(config.injection["db"].kind, InjectionType::Property);
        assert_eq!(
            config.injection["logger"].member.as_deref(),
            Some("attach_logger")
        );
        assert_eq!(
            config.get_prop("database.url"),
            Some(&json!("postgres://10.0.0.5/app"))
        );
    }

    #[test]
    #[serial]
    fn test_load_from_missing_variable() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[properties]\nsecret = \"${{WIRING_TEST_UNSET_SECRET}}\"").unwrap();

        std::env::remove_var("WIRING_TEST_UNSET_SECRET");
        let err = Config::load_from(file.path()).unwrap_err();
        assert!(err.to_string().contains("WIRING_TEST_UNSET_SECRET"));
    }
}
