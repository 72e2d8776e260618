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

use crate::domain::{DomainError, ProbeConfig};
use async_trait::async_trait;

/// Secondary port - Configuration provider abstraction
///
/// This interface abstracts how the probe configuration is loaded,
/// allowing for different sources (TOML file, fixed value, etc.)
#[async_trait]
pub trait ConfigurationProvider: Send + Sync {
    /// Get the probe configuration
    ///
    /// # Returns
    /// * `Ok(ProbeConfig)` - Probe configuration, defaults for missing keys
    /// * `Err(DomainError)` - Error loading configuration
    async fn get_probe_config(&self) -> Result<ProbeConfig, DomainError>;
}
