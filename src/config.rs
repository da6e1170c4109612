pub use crate::error::ConfigError;
use crate::error::ValidationError;
use crate::network::{Network, Variant};
use crate::sources::ArtifactSource;
use crate::templates::Template;
use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};
use std::{env, fs};

pub const DEFAULT_ERL_FLAGS: &str = "+A 64 +K true";
pub const DEFAULT_LOG_FILE_PATH: &str = "/home/aeternity/node/log/aeternity.log";

/// Raw, not yet validated installer inputs.
///
/// The same shape is filled from CLI flags, the environment and the settings
/// file, then layered by precedence before resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RawInputs {
    pub network: Option<String>,
    pub variant: Option<String>,
    pub install_dir: Option<PathBuf>,
    #[serde(deserialize_with = "string_or_bool")]
    pub download_node: Option<String>,
    #[serde(deserialize_with = "string_or_bool")]
    pub download_mdw: Option<String>,
    pub node_url: Option<String>,
    pub mdw_url: Option<String>,
    pub compose_url: Option<String>,
    pub config_url: Option<String>,
    pub template_dir: Option<PathBuf>,
    pub erl_flags: Option<String>,
    pub log_file_path: Option<String>,
}

impl RawInputs {
    /// Read the installer variables from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read the installer variables through an arbitrary lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        Self {
            network: get("NETWORK"),
            variant: get("VARIANT"),
            install_dir: get("INSTALL_DIR").map(PathBuf::from),
            download_node: get("DOWNLOAD_NODE"),
            download_mdw: get("DOWNLOAD_MDW"),
            node_url: get("NODE_URL"),
            mdw_url: get("MDW_URL"),
            compose_url: get("COMPOSE_URL"),
            config_url: get("CONFIG_URL"),
            template_dir: get("TEMPLATE_DIR").map(PathBuf::from),
            erl_flags: get("ERL_FLAGS"),
            log_file_path: get("LOG_FILE_PATH"),
        }
    }

    /// Parse a settings file body
    pub fn try_parse_settings(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str::<RawInputs>(content)
    }

    /// Load the settings file: an explicit path must exist, the default one is optional
    pub fn load_settings(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(path) if !path.exists() => {
                return Err(ConfigError::SettingsNotFound(path.to_path_buf()));
            }
            Some(path) => path.to_path_buf(),
            None => {
                let path = default_settings_path();
                if !path.exists() {
                    log::debug!("No settings file at {}", path.display());
                    return Ok(Self::default());
                }
                path
            }
        };

        log::info!("Loading settings from {}", path.display());
        let content = fs::read_to_string(&path)?;
        Ok(Self::try_parse_settings(&content)?)
    }

    /// Fill every unset value of `self` from `lower`
    pub fn layered_over(self, lower: RawInputs) -> Self {
        Self {
            network: self.network.or(lower.network),
            variant: self.variant.or(lower.variant),
            install_dir: self.install_dir.or(lower.install_dir),
            download_node: self.download_node.or(lower.download_node),
            download_mdw: self.download_mdw.or(lower.download_mdw),
            node_url: self.node_url.or(lower.node_url),
            mdw_url: self.mdw_url.or(lower.mdw_url),
            compose_url: self.compose_url.or(lower.compose_url),
            config_url: self.config_url.or(lower.config_url),
            template_dir: self.template_dir.or(lower.template_dir),
            erl_flags: self.erl_flags.or(lower.erl_flags),
            log_file_path: self.log_file_path.or(lower.log_file_path),
        }
    }
}

/// Accept `download_node = false` as well as `download_node = "no"`
fn string_or_bool<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    Ok(Option::<Flag>::deserialize(deserializer)?.map(|flag| match flag {
        Flag::Bool(value) => value.to_string(),
        Flag::Text(value) => value,
    }))
}

/// Parse an optional boolean input
pub fn parse_flag(key: &str, raw: Option<&str>) -> Result<Option<bool>, ValidationError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    match raw.trim().to_lowercase().as_str() {
        "true" | "yes" | "y" | "1" | "on" => Ok(Some(true)),
        "false" | "no" | "n" | "0" | "off" => Ok(Some(false)),
        _ => Err(ValidationError::InvalidBool {
            key: key.to_string(),
            value: raw.to_string(),
        }),
    }
}

pub fn default_settings_path() -> PathBuf {
    let home_dir = home::home_dir().unwrap_or_else(|| PathBuf::from("/tmp"));
    home_dir
        .join(".config")
        .join("ae-mdw-installer")
        .join("config.toml")
}

pub fn default_install_dir() -> PathBuf {
    let home_dir = home::home_dir().unwrap_or_else(|| PathBuf::from("/tmp"));
    home_dir.join("aeternity")
}

/// Values handed through to the container environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeTuning {
    pub erl_flags: String,
    pub log_file_path: String,
}

impl Default for RuntimeTuning {
    fn default() -> Self {
        Self {
            erl_flags: DEFAULT_ERL_FLAGS.to_string(),
            log_file_path: DEFAULT_LOG_FILE_PATH.to_string(),
        }
    }
}

/// Fully resolved installation parameters. Built once, never mutated afterwards.
#[derive(Debug, Clone)]
pub struct InstallConfig {
    pub network: Network,
    pub variant: Variant,
    pub install_dir: PathBuf,
    pub download_node: bool,
    pub download_mdw: bool,
    pub node_archive: ArtifactSource,
    pub mdw_archive: ArtifactSource,
    pub manifest_source: Option<ArtifactSource>,
    pub config_source: Option<ArtifactSource>,
    /// Replaces the packaged templates when set
    pub template_dir: Option<PathBuf>,
    pub runtime: RuntimeTuning,
    pub start_after: bool,
    pub non_interactive: bool,
}

impl InstallConfig {
    pub fn layout(&self) -> HostLayout {
        HostLayout::new(&self.install_dir, self.network)
    }

    pub fn manifest_template(&self) -> Template {
        Template::compose(self.template_dir.as_deref())
    }

    pub fn config_template(&self) -> Template {
        Template::node_config(self.template_dir.as_deref())
    }
}

/// Host directories and files, namespaced by the network label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostLayout {
    pub install_dir: PathBuf,
    pub network_label: &'static str,
    pub data_root: PathBuf,
    pub app_root: PathBuf,
}

impl HostLayout {
    pub fn new(install_dir: &Path, network: Network) -> Self {
        let label = network.label();
        Self {
            install_dir: install_dir.to_path_buf(),
            network_label: label,
            data_root: install_dir.join("data").join(label),
            app_root: install_dir.join("app").join(label),
        }
    }

    pub fn downloads_dir(&self) -> PathBuf {
        self.install_dir.join("downloads")
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.install_dir.join("docker-compose.yml")
    }

    pub fn env_file_path(&self) -> PathBuf {
        self.install_dir.join(".env")
    }

    pub fn service_config_path(&self) -> PathBuf {
        self.app_root.join("aeternity.yaml")
    }

    pub fn log_dir(&self) -> PathBuf {
        self.app_root.join("log")
    }

    /// Create every directory of the layout that does not exist yet
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        for dir in [
            self.install_dir.clone(),
            self.downloads_dir(),
            self.data_root.clone(),
            self.app_root.clone(),
            self.log_dir(),
        ] {
            if !dir.exists() {
                fs::create_dir_all(&dir)?;
                log::info!("Directory created: {}", dir.display());
            }
        }
        Ok(())
    }
}
