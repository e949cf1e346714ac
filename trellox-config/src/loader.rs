//! Layered configuration loading

use crate::error::ConfigResult;
use crate::settings::TrelloxConfig;
use figment::{
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
    Figment,
};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Directory name holding TrelloX configuration files
const CONFIG_DIR: &str = ".trellox";

/// Environment variable prefix
const ENV_PREFIX: &str = "TRELLOX_";

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Yaml,
    Json,
}

impl ConfigFormat {
    fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Some(Self::Toml),
            Some("yaml") | Some("yml") => Some(Self::Yaml),
            Some("json") => Some(Self::Json),
            _ => None,
        }
    }
}

/// A discovered configuration file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    pub path: PathBuf,
    pub format: ConfigFormat,
}

/// Builds a [`TrelloxConfig`] from defaults, files and environment
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    home_dir: Option<PathBuf>,
    project_dir: Option<PathBuf>,
    use_env: bool,
}

impl ConfigLoader {
    /// Loader using the user's home directory and the current directory
    pub fn new() -> Self {
        Self {
            home_dir: dirs::home_dir(),
            project_dir: std::env::current_dir().ok(),
            use_env: true,
        }
    }

    /// Override the directory searched for the global config
    pub fn with_home_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.home_dir = dir;
        self
    }

    /// Override the directory searched for the project config
    pub fn with_project_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.project_dir = dir;
        self
    }

    /// Skip `TRELLOX_` environment variables
    pub fn without_env(mut self) -> Self {
        self.use_env = false;
        self
    }

    /// Extract and validate the configuration
    pub fn load(&self) -> ConfigResult<TrelloxConfig> {
        let config: TrelloxConfig = self.build_figment().extract()?;
        config.validate()?;
        debug!(
            storage = %config.storage.root.display(),
            email_configured = config.notifications.email_if_configured().is_some(),
            "loaded configuration"
        );
        Ok(config)
    }

    /// Configuration files in precedence order (global first, project last)
    pub fn discover_files(&self) -> Vec<ConfigFile> {
        let mut files = Vec::new();
        for base in [&self.home_dir, &self.project_dir].into_iter().flatten() {
            let dir = base.join(CONFIG_DIR);
            for name in ["config.toml", "config.yaml", "config.yml", "config.json"] {
                let path = dir.join(name);
                if !path.is_file() {
                    continue;
                }
                if let Some(format) = ConfigFormat::from_path(&path) {
                    trace!("discovered config file {}", path.display());
                    files.push(ConfigFile { path, format });
                }
            }
        }
        files
    }

    fn build_figment(&self) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(TrelloxConfig::default()));

        for file in self.discover_files() {
            figment = match file.format {
                ConfigFormat::Toml => figment.merge(Toml::file(&file.path)),
                ConfigFormat::Yaml => figment.merge(Yaml::file(&file.path)),
                ConfigFormat::Json => figment.merge(Json::file(&file.path)),
            };
        }

        if self.use_env {
            figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));
        }

        figment
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
