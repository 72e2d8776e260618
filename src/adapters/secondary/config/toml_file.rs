/*
Copyright 2024 San Francisco Compute Company

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

    http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
*/

//! TOML configuration file adapter

use crate::domain::{ConfigError, DomainError, ProbeConfig};
use crate::ports::ConfigurationProvider;
use async_trait::async_trait;
use log::debug;
use std::path::PathBuf;

/// Environment variable naming the configuration file
pub const CONFIG_ENV_VAR: &str = "HARDWARE_DETECT_CONFIG";

/// Loads [`ProbeConfig`] from an optional TOML file
///
/// Without a file every setting takes its default.
pub struct TomlConfigurationProvider {
    path: Option<PathBuf>,
}

impl TomlConfigurationProvider {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    /// Provider for the file named by `HARDWARE_DETECT_CONFIG`, if set
    pub fn from_env() -> Self {
        Self::new(std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from))
    }

    /// Read and parse the configuration file
    pub async fn load(&self) -> Result<ProbeConfig, ConfigError> {
        let Some(path) = &self.path else {
            return Ok(ProbeConfig::default());
        };
        let display = path.display().to_string();
        debug!("Loading configuration from {display}");

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: display.clone(),
                source,
            })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: display,
            source,
        })
    }
}

#[async_trait]
impl ConfigurationProvider for TomlConfigurationProvider {
    async fn get_probe_config(&self) -> Result<ProbeConfig, DomainError> {
        Ok(self.load().await?)
    }
}
