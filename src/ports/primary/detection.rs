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

use crate::domain::{DetectError, ProbeConfig, RecordSet};
use async_trait::async_trait;

/// Primary port - Hardware detection interface
///
/// This is what external systems (CLI, library consumers) use to inventory
/// the local machine.
#[async_trait]
pub trait HardwareDetectionService: Send + Sync {
    /// Run every detector, then the requested benchmarks
    ///
    /// # Arguments
    /// * `config` - Probe configuration, including the requested benchmarks
    ///
    /// # Returns
    /// * `Ok(RecordSet)` - Cleaned records in emission order
    /// * `Err(DetectError)` - System detection failed
    async fn detect(&self, config: &ProbeConfig) -> Result<RecordSet, DetectError>;
}
