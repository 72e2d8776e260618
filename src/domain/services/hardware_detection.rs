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

use super::{benchmark, bios, cpu, ipmi, platform, raid, storage, system, ProbeContext};
use crate::domain::{DetectError, ProbeConfig, RecordSet};
use crate::ports::{
    CommandExecutor, HardwareDetectionService, HostResources, InterfaceQuery, SystemFiles,
};
use async_trait::async_trait;
use log::debug;
use std::sync::Arc;

/// Domain service that runs every detector in a fixed order
///
/// Detectors are sequential and append to one record list. All of them are
/// best-effort except system detection, whose failure aborts the run.
pub struct HardwareDetectionServiceImpl {
    ctx: ProbeContext,
}

impl HardwareDetectionServiceImpl {
    /// Create a new hardware detection service
    ///
    /// # Arguments
    /// * `commands` - Runs the external diagnostic tools
    /// * `files` - Reads `/sys`, `/proc` and `/dev`
    /// * `interfaces` - Kernel interface queries (netmasks)
    /// * `resources` - Live host figures used to size benchmarks
    pub fn new(
        commands: Arc<dyn CommandExecutor>,
        files: Arc<dyn SystemFiles>,
        interfaces: Arc<dyn InterfaceQuery>,
        resources: Arc<dyn HostResources>,
    ) -> Self {
        Self {
            ctx: ProbeContext::new(commands, files, interfaces, resources),
        }
    }
}

#[async_trait]
impl HardwareDetectionService for HardwareDetectionServiceImpl {
    async fn detect(&self, config: &ProbeConfig) -> Result<RecordSet, DetectError> {
        let ctx = &self.ctx;
        let mut records = RecordSet::new();

        debug!("Detecting storage controllers");
        raid::detect_areca(ctx, &mut records).await;
        raid::detect_smart_array(ctx, &mut records).await;
        raid::detect_megaraid(ctx, &mut records).await;
        storage::detect_disks(ctx, &mut records).await;

        debug!("Detecting system");
        system::detect_system(ctx, &mut records).await?;

        debug!("Detecting platform devices");
        ipmi::detect_ipmi(ctx, &mut records).await;
        platform::detect_infiniband(ctx, &mut records).await;
        cpu::detect_temperatures(ctx, &mut records).await;
        platform::detect_ddr_timings(ctx, &mut records).await;
        ipmi::detect_ipmi_sdr(ctx, &mut records).await;
        platform::detect_rtc(ctx, &mut records).await;
        platform::detect_auxv(ctx, &mut records).await;
        platform::detect_dmesg(ctx, &mut records).await;
        bios::detect_hp_bios(ctx, &mut records).await;

        benchmark::BenchmarkService::new(ctx, &config.benchmark)
            .run(config, &mut records)
            .await;

        debug!("Collected {} records", records.len());
        Ok(records.clean())
    }
}
