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

//! Dependency injection container for the hardware detection service

use crate::adapters::{
    IoctlInterfaceQuery, LocalSystemFiles, SysinfoHostResources, TomlConfigurationProvider,
    UnixCommandExecutor,
};
use crate::domain::{HardwareDetectionServiceImpl, ProbeConfig};
use crate::ports::{
    CommandExecutor, ConfigurationProvider, HardwareDetectionService, HostResources,
    InterfaceQuery, SystemFiles,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Tools without which detection cannot produce a system inventory
const REQUIRED_TOOLS: &[&str] = &["lshw", "lscpu"];

/// Configuration for the dependency injection container
#[derive(Debug, Clone)]
pub struct ContainerConfig {
    /// Command execution timeout, none by default
    pub command_timeout: Option<Duration>,
    /// Command retry count
    pub retry_count: u32,
    /// Prefix for `/sys`, `/proc` and `/dev`
    pub root: PathBuf,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            command_timeout: None,
            retry_count: 0,
            root: PathBuf::from("/"),
        }
    }
}

/// Dependency injection container
pub struct ServiceContainer {
    config: ContainerConfig,
}

impl ServiceContainer {
    /// Create a new service container with configuration
    pub fn new(config: ContainerConfig) -> Self {
        Self { config }
    }

    /// Container matching a loaded probe configuration
    pub fn from_probe_config(probe: &ProbeConfig) -> Self {
        let mut builder = ContainerConfigBuilder::new().root(probe.root.clone());
        if let Some(secs) = probe.command_timeout_secs {
            builder = builder.command_timeout(Duration::from_secs(secs));
        }
        Self::new(builder.build())
    }

    pub fn config(&self) -> &ContainerConfig {
        &self.config
    }

    /// Create the command executor
    pub fn create_command_executor(&self) -> Arc<dyn CommandExecutor> {
        Arc::new(UnixCommandExecutor::new(
            self.config.command_timeout,
            self.config.retry_count,
        ))
    }

    pub fn create_system_files(&self) -> Arc<dyn SystemFiles> {
        Arc::new(LocalSystemFiles::new(self.config.root.clone()))
    }

    pub fn create_interface_query(&self) -> Arc<dyn InterfaceQuery> {
        Arc::new(IoctlInterfaceQuery::new())
    }

    pub fn create_host_resources(&self) -> Arc<dyn HostResources> {
        Arc::new(SysinfoHostResources::new())
    }

    /// Create the configuration provider
    ///
    /// Without an explicit path the provider falls back to the
    /// `HARDWARE_DETECT_CONFIG` environment variable, then to defaults.
    pub fn create_configuration_provider(
        path: Option<PathBuf>,
    ) -> Arc<dyn ConfigurationProvider> {
        match path {
            Some(path) => Arc::new(TomlConfigurationProvider::new(Some(path))),
            None => Arc::new(TomlConfigurationProvider::from_env()),
        }
    }

    /// Create the complete hardware detection service
    pub fn create_hardware_detection_service(&self) -> Arc<dyn HardwareDetectionService> {
        Arc::new(HardwareDetectionServiceImpl::new(
            self.create_command_executor(),
            self.create_system_files(),
            self.create_interface_query(),
            self.create_host_resources(),
        ))
    }

    /// Required tools that are not installed
    pub async fn missing_required_tools(&self) -> Vec<String> {
        missing_tools(self.create_command_executor().as_ref(), REQUIRED_TOOLS).await
    }
}

/// Tools the executor cannot find; a failed lookup counts as missing
async fn missing_tools(executor: &dyn CommandExecutor, tools: &[&str]) -> Vec<String> {
    let mut missing = Vec::new();
    for tool in tools {
        if !executor.is_command_available(tool).await.unwrap_or(false) {
            missing.push(tool.to_string());
        }
    }
    missing
}

impl Default for ServiceContainer {
    fn default() -> Self {
        Self::new(ContainerConfig::default())
    }
}

/// Builder pattern for container configuration
pub struct ContainerConfigBuilder {
    config: ContainerConfig,
}

impl ContainerConfigBuilder {
    /// Create a new configuration builder
    pub fn new() -> Self {
        Self {
            config: ContainerConfig::default(),
        }
    }

    /// Set command timeout
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.config.command_timeout = Some(timeout);
        self
    }

    /// Set retry count
    pub fn retry_count(mut self, count: u32) -> Self {
        self.config.retry_count = count;
        self
    }

    /// Set the filesystem root
    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.root = root.into();
        self
    }

    /// Build the configuration
    pub fn build(self) -> ContainerConfig {
        self.config
    }
}

impl Default for ContainerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
