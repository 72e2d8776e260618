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

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Benchmark families that can be requested on top of detection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BenchmarkKind {
    Cpu,
    Mem,
    Disk,
}

/// Benchmark tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchmarkConfig {
    /// Runtime of each sysbench cpu run
    pub cpu_runtime_secs: u64,
    /// Runtime of each sysbench memory run
    pub mem_runtime_secs: u64,
    /// Runtime of each fio job
    pub disk_runtime_secs: u64,
    /// fio ramp up time, excluded from the measurement
    pub disk_rampup_secs: u64,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            cpu_runtime_secs: 10,
            mem_runtime_secs: 5,
            disk_runtime_secs: 10,
            disk_rampup_secs: 5,
        }
    }
}

/// Configuration of a detection run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Timeout applied to every external command, in seconds; commands
    /// run to completion when unset
    pub command_timeout_secs: Option<u64>,
    /// Prefix applied to `/sys`, `/proc` and `/dev` lookups
    pub root: PathBuf,
    /// Benchmarks to run after detection
    pub benchmarks: Vec<BenchmarkKind>,
    /// Allow write benchmarks on disks
    pub destructive_disk_benchmark: bool,
    /// Benchmark tuning
    pub benchmark: BenchmarkConfig,
    /// Enable debug logging
    pub verbose: bool,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            command_timeout_secs: None,
            root: PathBuf::from("/"),
            benchmarks: Vec::new(),
            destructive_disk_benchmark: false,
            benchmark: BenchmarkConfig::default(),
            verbose: false,
        }
    }
}

impl ProbeConfig {
    /// Whether a benchmark family was requested
    pub fn wants(&self, kind: BenchmarkKind) -> bool {
        self.benchmarks.contains(&kind)
    }
}
