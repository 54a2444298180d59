//! # NextPeek Configuration Module
//!
//! This module provides configuration management for NextPeek, including:
//! - Loading configuration from YAML files
//! - Merging with embedded default configuration
//! - Environment variable overrides
//! - Type-safe getters and setters for configuration values
//! - Thread-safe singleton access pattern
//!
//! ## Usage
//!
//! ```no_run
//! use npkconfig::get_config;
//!
//! // Get the global configuration
//! let config = get_config();
//!
//! // Access configuration values
//! let port = config.get_http_port();
//! let debounce = config.get_push_debounce_ms();
//! ```

use anyhow::{anyhow, Result};
use dirs::home_dir;
use lazy_static::lazy_static;
use serde_yaml::{Mapping, Number, Value};
use std::{
    env, fs,
    path::Path,
    sync::{Arc, Mutex},
};
use tracing::info;

// Configuration par défaut intégrée
const DEFAULT_CONFIG: &str = include_str!("nextpeek.yaml");

lazy_static! {
    static ref CONFIG: Arc<Config> =
        Arc::new(Config::load_config("").expect("Failed to load NextPeek configuration"));
}

const ENV_CONFIG_DIR: &str = "NEXTPEEK_CONFIG";
const ENV_PREFIX: &str = "NEXTPEEK_CONFIG__";

// Default values for configuration
const DEFAULT_HTTP_PORT: u16 = 7192;
const DEFAULT_BASE_URL: &str = "http://127.0.0.1";
const DEFAULT_LOG_BUFFER_CAPACITY: usize = 1000;
const DEFAULT_LOG_MIN_LEVEL: &str = "INFO";
const DEFAULT_LOG_ENABLE_CONSOLE: bool = true;

/// Macro to generate getter/setter for u64 values with default
macro_rules! impl_u64_config {
    ($getter:ident, $setter:ident, $path:expr, $default:expr) => {
        pub fn $getter(&self) -> u64 {
            match self.get_value($path) {
                Ok(Value::Number(n)) if n.is_u64() => n.as_u64().unwrap(),
                Ok(Value::Number(n)) if n.is_i64() => n.as_i64().unwrap().max(0) as u64,
                _ => $default,
            }
        }

        pub fn $setter(&self, value: u64) -> Result<()> {
            let n = Number::from(value);
            self.set_value($path, Value::Number(n))
        }
    };
}

/// Macro to generate getter/setter for usize values with default
macro_rules! impl_usize_config {
    ($getter:ident, $setter:ident, $path:expr, $default:expr) => {
        pub fn $getter(&self) -> usize {
            match self.get_value($path) {
                Ok(Value::Number(n)) if n.is_u64() => n.as_u64().unwrap() as usize,
                Ok(Value::Number(n)) if n.is_i64() => n.as_i64().unwrap().max(0) as usize,
                _ => $default,
            }
        }

        pub fn $setter(&self, value: usize) -> Result<()> {
            let n = Number::from(value);
            self.set_value($path, Value::Number(n))
        }
    };
}

/// Macro to generate getter/setter for bool values with default
macro_rules! impl_bool_config {
    ($getter:ident, $setter:ident, $path:expr, $default:expr) => {
        pub fn $getter(&self) -> bool {
            match self.get_value($path) {
                Ok(Value::Bool(b)) => b,
                _ => $default,
            }
        }

        pub fn $setter(&self, value: bool) -> Result<()> {
            self.set_value($path, Value::Bool(value))
        }
    };
}

/// Configuration manager for NextPeek
///
/// This structure manages the application configuration, including:
/// - Loading configuration from YAML files
/// - Merging with default configuration
/// - Handling environment variable overrides
/// - Providing typed getters/setters for configuration values
#[derive(Debug)]
pub struct Config {
    config_dir: String,
    path: String,
    data: Mutex<Value>,
}

// Implémentation manuelle de Clone
impl Clone for Config {
    fn clone(&self) -> Self {
        let data = self.data.lock().unwrap().clone();
        Self {
            config_dir: self.config_dir.clone(),
            path: self.path.clone(),
            data: Mutex::new(data),
        }
    }
}

impl Config {
    /// Finds a config directory by trying different locations in order
    fn find_config_dir(directory: &str) -> String {
        // 1. Try provided directory
        if !directory.is_empty() {
            return directory.to_string();
        }

        // 2. Try environment variable
        if let Ok(env_path) = env::var(ENV_CONFIG_DIR) {
            info!(env_var = ENV_CONFIG_DIR, path = %env_path, "Trying to load config from env");
            return env_path;
        }

        // 3. Try current directory
        if Path::new(".nextpeek").exists() {
            return ".nextpeek".to_string();
        }

        // 4. Try home directory
        if let Some(home) = home_dir() {
            let home_config = home.join(".nextpeek");
            if home_config.exists() {
                return home_config.to_string_lossy().to_string();
            }
        }

        // Default fallback
        ".nextpeek".to_string()
    }

    /// Validates and prepares a config directory
    fn validate_config_dir(path: &Path) -> Result<()> {
        // Create if doesn't exist
        if !path.exists() {
            fs::create_dir_all(path)?;
        }

        // Verify it's a directory
        if !path.is_dir() {
            return Err(anyhow!("Le chemin spécifié n'est pas un répertoire"));
        }

        // Test write permission
        let test_file = path.join(".write_test");
        fs::write(&test_file, b"test")?;
        fs::remove_file(&test_file)?;

        // Test read permission
        fs::read_dir(path)?;

        Ok(())
    }

    /// Determines and validates the configuration directory
    ///
    /// The directory is searched in the following order:
    /// 1. The provided `directory` parameter if not empty
    /// 2. The `NEXTPEEK_CONFIG` environment variable
    /// 3. `.nextpeek` in the current directory
    /// 4. `.nextpeek` in the user's home directory
    ///
    /// The directory is created if it doesn't exist, and validated for
    /// read/write permissions.
    ///
    /// # Panics
    ///
    /// Panics if the directory cannot be created or validated
    pub fn config_dir(directory: &str) -> String {
        let dir_path = Self::find_config_dir(directory);
        let path = Path::new(&dir_path);

        Self::validate_config_dir(path)
            .expect("Impossible de valider le répertoire de configuration");

        dir_path
    }

    /// Loads the configuration from the specified directory
    ///
    /// This method:
    /// 1. Determines the configuration directory
    /// 2. Loads the default embedded configuration
    /// 3. Merges it with the external config.yaml file if present
    /// 4. Applies environment variable overrides
    /// 5. Saves the merged configuration
    pub fn load_config(directory: &str) -> Result<Self> {
        // Obtenir le répertoire de configuration
        let config_dir = Self::config_dir(directory);
        info!(config_dir = %config_dir, "Using config directory");

        // Construire le chemin du fichier config.yaml
        let config_file_path = Path::new(&config_dir).join("config.yaml");
        let path = config_file_path.to_string_lossy().to_string();

        // Charger la configuration par défaut
        let mut default_value: Value = serde_yaml::from_str(DEFAULT_CONFIG)?;

        // Essayer de charger le fichier de configuration
        let yaml_data = if let Ok(data) = fs::read(&path) {
            info!(config_file = %path, "Loaded config file");
            data
        } else {
            info!(config_file = %path, "Config file not found, using default embedded config");
            DEFAULT_CONFIG.as_bytes().to_vec()
        };

        // Merger avec la config par défaut
        let external_value: Value = serde_yaml::from_slice(&yaml_data)?;
        merge_yaml(&mut default_value, &external_value);
        let mut config_value = Self::lower_keys_value(default_value);

        // Appliquer les overrides depuis les variables d'environnement
        Self::apply_env_overrides(&mut config_value);

        // Créer la configuration
        let config = Config {
            config_dir,
            path,
            data: Mutex::new(config_value),
        };

        // Sauvegarder la configuration
        config.save()?;
        Ok(config)
    }

    /// Saves the current configuration to the config.yaml file
    pub fn save(&self) -> Result<()> {
        let data = self.data.lock().unwrap();
        let yaml = serde_yaml::to_string(&*data)?;
        fs::write(&self.path, yaml)?;
        Ok(())
    }

    /// Sets a configuration value at the specified path and saves it
    ///
    /// # Arguments
    ///
    /// * `path` - Array of keys representing the path (e.g., `&["server", "http_port"]`)
    /// * `value` - The YAML value to set
    pub fn set_value(&self, path: &[&str], value: Value) -> Result<()> {
        let mut data = self.data.lock().unwrap();
        Self::set_value_internal(&mut data, path, value.clone())?;
        drop(data);
        self.save()?;
        Ok(())
    }

    fn set_value_internal(data: &mut Value, path: &[&str], value: Value) -> Result<()> {
        if path.is_empty() {
            *data = value;
            return Ok(());
        }
        if let Value::Mapping(map) = data {
            let key = path[0].to_lowercase();
            let key_value = Value::String(key.clone());
            if path.len() == 1 {
                map.insert(key_value, value);
            } else {
                let entry = map
                    .entry(key_value)
                    .or_insert(Value::Mapping(Mapping::new()));
                Self::set_value_internal(entry, &path[1..], value)?;
            }
            Ok(())
        } else {
            Err(anyhow!("Current node is not a map"))
        }
    }

    /// Gets a configuration value at the specified path
    pub fn get_value(&self, path: &[&str]) -> Result<Value> {
        let data = self.data.lock().unwrap();
        Self::get_value_internal(&data, path)
    }

    fn get_value_internal(data: &Value, path: &[&str]) -> Result<Value> {
        let mut current = data;
        for (i, key) in path.iter().enumerate() {
            if let Value::Mapping(map) = current {
                let key = key.to_lowercase();

                if let Some(next) = map.get(&Value::String(key)) {
                    current = next;
                } else {
                    return Err(anyhow!("Path {} does not exist", path[..=i].join(".")));
                }
            } else {
                return Err(anyhow!("Path {} is not a Config", path[..i].join(".")));
            }
        }
        Ok(current.clone())
    }

    fn apply_env_overrides(config: &mut Value) {
        for (key, value) in env::vars() {
            if key.starts_with(ENV_PREFIX) {
                let key_path = key
                    .trim_start_matches(ENV_PREFIX)
                    .split("__")
                    .collect::<Vec<_>>();
                let yaml_value = Self::convert_env_value(&value);
                let _ = Self::set_value_internal(config, &key_path, yaml_value);
            }
        }
    }

    fn convert_env_value(value: &str) -> Value {
        if let Ok(parsed) = serde_yaml::from_str::<Value>(value) {
            return parsed;
        }
        Value::String(value.to_string())
    }

    fn lower_keys_value(value: Value) -> Value {
        match value {
            Value::Mapping(map) => {
                let mut new_map = Mapping::new();
                for (k, v) in map {
                    if let Value::String(s) = k {
                        let new_key = Value::String(s.to_lowercase());
                        let new_val = Self::lower_keys_value(v);
                        new_map.insert(new_key, new_val);
                    } else {
                        new_map.insert(k, Self::lower_keys_value(v));
                    }
                }
                Value::Mapping(new_map)
            }
            Value::Sequence(seq) => {
                Value::Sequence(seq.into_iter().map(Self::lower_keys_value).collect())
            }
            _ => value,
        }
    }

    /// Base URL the bridge script reaches the sync server at.
    pub fn get_base_url(&self) -> String {
        match self.get_value(&["server", "base_url"]) {
            Ok(Value::String(s)) if !s.is_empty() => s,
            _ => DEFAULT_BASE_URL.to_string(),
        }
    }

    /// HTTP port of the local sync server.
    pub fn get_http_port(&self) -> u16 {
        match self.get_value(&["server", "http_port"]) {
            Ok(Value::Number(n)) if n.is_i64() => n.as_i64().unwrap() as u16,
            Ok(Value::String(s)) => match s.parse::<u16>() {
                Ok(port) => port,
                Err(_) => {
                    tracing::warn!(
                        "Invalid HTTP port '{}', using default {}",
                        s,
                        DEFAULT_HTTP_PORT
                    );
                    DEFAULT_HTTP_PORT
                }
            },
            _ => DEFAULT_HTTP_PORT,
        }
    }

    // Bridge client tuning
    impl_u64_config!(
        get_command_poll_ms,
        set_command_poll_ms,
        &["bridge", "command_poll_ms"],
        500
    );
    impl_u64_config!(
        get_push_debounce_ms,
        set_push_debounce_ms,
        &["bridge", "push_debounce_ms"],
        300
    );
    impl_u64_config!(
        get_safety_push_ms,
        set_safety_push_ms,
        &["bridge", "safety_push_ms"],
        5000
    );
    impl_u64_config!(
        get_readiness_poll_ms,
        set_readiness_poll_ms,
        &["bridge", "readiness_poll_ms"],
        500
    );

    // Sync server tuning
    impl_u64_config!(
        get_playlist_wait_ms,
        set_playlist_wait_ms,
        &["sync", "playlist_wait_ms"],
        2000
    );

    // Playback facade tuning
    impl_u64_config!(
        get_grace_window_ms,
        set_grace_window_ms,
        &["playback", "grace_window_ms"],
        1500
    );
    impl_u64_config!(
        get_seek_override_ms,
        set_seek_override_ms,
        &["playback", "seek_override_ms"],
        3000
    );

    // Docking state machine tuning
    impl_u64_config!(get_dock_tick_ms, set_dock_tick_ms, &["dock", "tick_ms"], 50);
    impl_u64_config!(
        get_dock_show_delay_ms,
        set_dock_show_delay_ms,
        &["dock", "show_delay_ms"],
        200
    );
    impl_u64_config!(
        get_dock_hide_delay_ms,
        set_dock_hide_delay_ms,
        &["dock", "hide_delay_ms"],
        400
    );
    impl_u64_config!(
        get_dock_show_cooldown_ms,
        set_dock_show_cooldown_ms,
        &["dock", "show_cooldown_ms"],
        500
    );
    impl_u64_config!(
        get_dock_animation_ms,
        set_dock_animation_ms,
        &["dock", "animation_ms"],
        250
    );
    impl_usize_config!(
        get_dock_trigger_band_px,
        set_dock_trigger_band_px,
        &["dock", "trigger_band_px"],
        3
    );
    impl_usize_config!(
        get_dock_width_fraction,
        set_dock_width_fraction,
        &["dock", "width_fraction"],
        5
    );
    impl_usize_config!(
        get_dock_hide_reveal_px,
        set_dock_hide_reveal_px,
        &["dock", "hide_reveal_px"],
        2
    );
    impl_usize_config!(
        get_dock_snap_tolerance_px,
        set_dock_snap_tolerance_px,
        &["dock", "snap_tolerance_px"],
        8
    );

    // Logging
    impl_usize_config!(
        get_log_cache_size,
        set_log_cache_size,
        &["log", "cache_size"],
        DEFAULT_LOG_BUFFER_CAPACITY
    );
    impl_bool_config!(
        get_log_enable_console,
        set_log_enable_console,
        &["log", "enable_console"],
        DEFAULT_LOG_ENABLE_CONSOLE
    );

    pub fn get_log_min_level(&self) -> String {
        match self.get_value(&["log", "min_level"]) {
            Ok(Value::String(s)) if !s.is_empty() => s,
            _ => DEFAULT_LOG_MIN_LEVEL.to_string(),
        }
    }
}

/// Returns the global configuration singleton
pub fn get_config() -> Arc<Config> {
    CONFIG.clone()
}

/// Merges external YAML configuration into default configuration
///
/// This function recursively merges two YAML value trees:
/// - For mappings (objects), it merges keys from external into default
/// - For scalars and sequences, external values replace default values
fn merge_yaml(default: &mut Value, external: &Value) {
    match (default, external) {
        (Value::Mapping(dmap), Value::Mapping(emap)) => {
            for (k, v) in emap {
                match dmap.get_mut(k) {
                    Some(dv) => merge_yaml(dv, v),
                    None => {
                        dmap.insert(k.clone(), v.clone());
                    }
                }
            }
        }
        (d, e) => *d = e.clone(), // pour les scalaires ou séquences, on remplace
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_from(yaml: &str) -> Config {
        let mut default_value: Value = serde_yaml::from_str(DEFAULT_CONFIG).unwrap();
        let external: Value = serde_yaml::from_str(yaml).unwrap();
        merge_yaml(&mut default_value, &external);
        Config {
            config_dir: String::new(),
            path: String::new(),
            data: Mutex::new(Config::lower_keys_value(default_value)),
        }
    }

    #[test]
    fn test_defaults() {
        let config = config_from("{}");
        assert_eq!(config.get_http_port(), 7192);
        assert_eq!(config.get_command_poll_ms(), 500);
        assert_eq!(config.get_push_debounce_ms(), 300);
        assert_eq!(config.get_dock_width_fraction(), 5);
        assert_eq!(config.get_log_min_level(), "INFO");
    }

    #[test]
    fn test_merge_overrides_scalar() {
        let config = config_from("server:\n  http_port: 9999\ndock:\n  tick_ms: 16\n");
        assert_eq!(config.get_http_port(), 9999);
        assert_eq!(config.get_dock_tick_ms(), 16);
        // Untouched keys keep their defaults
        assert_eq!(config.get_dock_show_delay_ms(), 200);
    }

    #[test]
    fn test_invalid_port_falls_back() {
        let config = config_from("server:\n  http_port: \"not-a-port\"\n");
        assert_eq!(config.get_http_port(), 7192);
    }

    #[test]
    fn test_env_value_conversion() {
        assert_eq!(
            Config::convert_env_value("1234"),
            Value::Number(Number::from(1234))
        );
        assert_eq!(Config::convert_env_value("true"), Value::Bool(true));
    }
}
