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

//! Optional CPU, memory and disk benchmarks
//!
//! Benchmarks run after detection and read what it found: the logical CPU
//! count and the disks with their sizes.

use super::ProbeContext;
use crate::domain::parsers::benchmark::{
    fio_args, memory_block_fits, parse_fio_report, parse_sysbench_cpu, parse_sysbench_memory,
    DISK_BLOCK_SIZES, MEMORY_BLOCK_SIZES, READ_MODES, WRITE_MODES,
};
use crate::domain::parsers::cpu::cpuinfo_field;
use crate::domain::parsers::storage::is_disk_name;
use crate::domain::{BenchmarkConfig, BenchmarkKind, ProbeConfig, RecordSet};
use crate::ports::SystemCommand;
use log::{info, warn};

/// Benchmark runner
pub struct BenchmarkService<'a> {
    ctx: &'a ProbeContext,
    tuning: &'a BenchmarkConfig,
}

impl<'a> BenchmarkService<'a> {
    pub fn new(ctx: &'a ProbeContext, tuning: &'a BenchmarkConfig) -> Self {
        Self { ctx, tuning }
    }

    /// Run the requested benchmarks in cpu, mem, disk order
    pub async fn run(&self, config: &ProbeConfig, records: &mut RecordSet) {
        if config.wants(BenchmarkKind::Cpu) {
            self.cpu(records).await;
        }
        if config.wants(BenchmarkKind::Mem) {
            self.memory(records).await;
        }
        if config.wants(BenchmarkKind::Disk) {
            self.disk(records, config.destructive_disk_benchmark).await;
        }
    }

    fn logical_cpus(records: &RecordSet) -> u32 {
        records
            .get_value("cpu", "logical", "number")
            .parse()
            .unwrap_or(1)
    }

    /// First logical CPU of every socket, by `topology/physical_package_id`
    async fn one_cpu_per_socket(&self, logical_cpus: u32) -> Vec<u32> {
        let mut packages = Vec::new();
        let mut cpus = Vec::new();

        for cpu in 0..logical_cpus {
            let path = format!("/sys/devices/system/cpu/cpu{cpu}/topology/physical_package_id");
            let Some(package) = self.ctx.read_line(&path).await else {
                continue;
            };
            if !packages.contains(&package) {
                packages.push(package);
                cpus.push(cpu);
            }
        }

        cpus
    }

    fn sysbench(
        &self,
        pin: Option<u32>,
        threads: u32,
        runtime: u64,
        test: &[String],
    ) -> SystemCommand {
        let mut args = Vec::new();
        if let Some(cpu) = pin {
            args.extend(["-c".to_string(), cpu.to_string(), "sysbench".to_string()]);
        }
        args.extend(test.iter().cloned());
        args.push(format!("--time={runtime}"));
        args.push(format!("--threads={threads}"));
        args.push("run".to_string());

        let program = if pin.is_some() { "taskset" } else { "sysbench" };
        SystemCommand::new(program).arg_list(args)
    }

    async fn sysbench_cpu(&self, pin: Option<u32>, threads: u32) -> Option<u64> {
        let runtime = self.tuning.cpu_runtime_secs;
        let command = self.sysbench(pin, threads, runtime, &["cpu".to_string()]);
        let output = self.ctx.run(&command).await?;
        parse_sysbench_cpu(&output, runtime)
    }

    async fn cpu(&self, records: &mut RecordSet) {
        info!("Benchmarking CPU");
        let logical_cpus = Self::logical_cpus(records);
        let cpuinfo = self.ctx.read("/proc/cpuinfo").await.unwrap_or_default();

        for cpu in self.one_cpu_per_socket(logical_cpus).await {
            let ltag = format!("logical_{cpu}");
            if let Some(bogomips) = cpuinfo_field(&cpuinfo, cpu, "bogomips") {
                records.push("cpu", &ltag, "bogomips", bogomips);
            }
            if let Some(cache_size) = cpuinfo_field(&cpuinfo, cpu, "cache size") {
                records.push("cpu", &ltag, "cache_size", cache_size);
            }
            if let Some(loops) = self.sysbench_cpu(Some(cpu), 1).await {
                records.push("cpu", &ltag, "loops_per_sec", loops.to_string());
            }
        }

        if let Some(loops) = self.sysbench_cpu(None, logical_cpus).await {
            records.push("cpu", "logical", "loops_per_sec", loops.to_string());
        }
    }

    async fn sysbench_memory(
        &self,
        pin: Option<u32>,
        threads: u32,
        block_size: &str,
    ) -> Option<u64> {
        let runtime = self.tuning.mem_runtime_secs;
        let test = [
            "memory".to_string(),
            format!("--memory-block-size={block_size}"),
            "--memory-total-size=100G".to_string(),
        ];
        let command = self.sysbench(pin, threads, runtime, &test);
        let output = self.ctx.run(&command).await?;
        parse_sysbench_memory(&output)
    }

    async fn memory(&self, records: &mut RecordSet) {
        info!("Benchmarking memory");
        let logical_cpus = Self::logical_cpus(records);

        for cpu in self.one_cpu_per_socket(logical_cpus).await {
            let ltag = format!("logical_{cpu}");
            for block_size in MEMORY_BLOCK_SIZES {
                if !memory_block_fits(block_size, 1, self.ctx.resources().available_memory()) {
                    info!("Skipping {block_size} memory blocks: not enough free memory");
                    continue;
                }
                if let Some(bandwidth) = self.sysbench_memory(Some(cpu), 1, block_size).await {
                    let key = format!("bandwidth_{block_size}");
                    records.push("cpu", &ltag, key, bandwidth.to_string());
                }
            }
        }

        for block_size in MEMORY_BLOCK_SIZES {
            let available = self.ctx.resources().available_memory();
            if !memory_block_fits(block_size, u64::from(logical_cpus), available) {
                info!("Skipping threaded {block_size} memory blocks: not enough free memory");
                continue;
            }
            if let Some(bandwidth) = self.sysbench_memory(None, logical_cpus, block_size).await {
                records.push(
                    "cpu",
                    "logical",
                    format!("threaded_bandwidth_{block_size}"),
                    bandwidth.to_string(),
                );
            }
        }
    }

    async fn fio(
        &self,
        disks: &[String],
        prefix: &str,
        mode: &str,
        block_size: &str,
        records: &mut RecordSet,
    ) {
        let runtime = self.tuning.disk_runtime_secs;
        let rampup = self.tuning.disk_rampup_secs;
        let command =
            SystemCommand::new("fio").arg_list(fio_args(disks, mode, block_size, runtime, rampup));

        let Some(output) = self.ctx.run(&command).await else {
            return;
        };
        match parse_fio_report(&output, prefix, mode, block_size) {
            Ok(results) => records.extend(results),
            Err(e) => warn!("fio {mode} {block_size} on {}: {e}", disks.join(",")),
        }
    }

    async fn disk(&self, records: &mut RecordSet, destructive: bool) {
        info!("Benchmarking disks");
        let disks: Vec<String> = records
            .by_class("disk")
            .filter(|r| r.key == "size" && is_disk_name(&r.id))
            .map(|r| r.id.clone())
            .collect();
        if disks.is_empty() {
            return;
        }

        let mut modes: Vec<&str> = READ_MODES.to_vec();
        if destructive {
            modes.extend_from_slice(WRITE_MODES);
        }

        for disk in &disks {
            for mode in &modes {
                for block_size in DISK_BLOCK_SIZES {
                    let single = std::slice::from_ref(disk);
                    self.fio(single, "standalone", mode, block_size, records).await;
                }
            }
        }

        if disks.len() > 1 {
            for mode in &modes {
                for block_size in DISK_BLOCK_SIZES {
                    self.fio(&disks, "simultaneous", mode, block_size, records).await;
                }
            }
        }
    }
}
