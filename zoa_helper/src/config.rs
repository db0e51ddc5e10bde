use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use config::{Config, ConfigError, FileFormat};
use directories::ProjectDirs;
use indexmap::IndexMap;
use runway_advisor::{PolicyConfig, RunwayPolicy};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use tracing::{debug, info};

use crate::error::ApplicationResult;

const DEFAULT_CONFIG: &str = include_str!("../config.toml");

pub(crate) fn zoa_helper_project_dir() -> Option<ProjectDirs> {
    ProjectDirs::from("", "zoa", "zoa_helper")
}

#[derive(Debug)]
pub(crate) struct ZoaConfig {
    config_file_path: Option<PathBuf>,
    config: Configurable,
}

#[skip_serializing_none]
#[derive(Debug, Serialize, Deserialize)]
struct Configurable {
    data_dir: PathBuf,
    default_departure: String,
    default_arrival: Option<String>,
    http_timeout_secs: u64,
    http_retries: u32,
    #[serde(default)]
    runway_policies: IndexMap<String, PolicyConfig>,
}

impl ZoaConfig {
    pub fn load(clean_config: bool, data_dir: Option<PathBuf>) -> ApplicationResult<Self> {
        let (mut config, config_file_path) = setup_configuration(clean_config)?;
        if let Some(data_dir) = data_dir {
            config.data_dir = data_dir;
        }
        debug!(?config_file_path, data_dir = ?config.data_dir, "Configuration loaded");
        Ok(Self {
            config_file_path,
            config,
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    pub fn default_departure(&self) -> &str {
        &self.config.default_departure
    }

    pub fn default_arrival(&self) -> Option<&str> {
        self.config.default_arrival.as_deref()
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.config.http_timeout_secs)
    }

    pub fn http_retries(&self) -> u32 {
        self.config.http_retries
    }

    pub fn config_file_path(&self) -> Option<&Path> {
        self.config_file_path.as_deref()
    }

    /// `None` when the airport has no policy. A policy that refers to a
    /// runway it does not list is an error.
    pub fn runway_policy(&self, icao: &str) -> ApplicationResult<Option<RunwayPolicy>> {
        self.config
            .runway_policies
            .iter()
            .find(|(airport, _)| airport.eq_ignore_ascii_case(icao))
            .map(|(_, policy)| RunwayPolicy::try_from(policy.clone()))
            .transpose()
            .map_err(Into::into)
    }

    pub fn has_runway_policy(&self, icao: &str) -> bool {
        self.config
            .runway_policies
            .keys()
            .any(|airport| airport.eq_ignore_ascii_case(icao))
    }

    pub fn to_toml(&self) -> ApplicationResult<String> {
        Ok(toml::to_string_pretty(&self.config)?)
    }
}

fn read_configuration(
    builder: config::ConfigBuilder<config::builder::DefaultState>,
) -> Result<Configurable, ConfigError> {
    builder
        .add_source(config::Environment::with_prefix("ZOA_HELPER"))
        .build()?
        .try_deserialize::<Configurable>()
}

fn setup_configuration(clean_config: bool) -> ApplicationResult<(Configurable, Option<PathBuf>)> {
    let Some(project_dir) = zoa_helper_project_dir() else {
        info!("No home directory found, using the built in configuration");
        let builder = Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, FileFormat::Toml));
        return Ok((read_configuration(builder)?, None));
    };

    let config_dir = project_dir.config_dir();
    let config_file = config_dir.join("config.toml");
    if clean_config || !config_file.exists() {
        fs::create_dir_all(config_dir)?;
        fs::write(&config_file, DEFAULT_CONFIG)?;
        info!(path = ?config_file, "Wrote default configuration");
    }

    let builder =
        Config::builder().add_source(config::File::from(config_file.clone()).required(true));
    Ok((read_configuration(builder)?, Some(config_file)))
}
