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

use clap::{Parser, ValueEnum};
use hardware_detect::{
    render, BenchmarkKind, OutputFormat, ProbeConfig, ServiceContainer, CONFIG_ENV_VAR,
};
use log::{error, warn};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Benchmark {
    Cpu,
    Mem,
    Disk,
}

impl From<Benchmark> for BenchmarkKind {
    fn from(benchmark: Benchmark) -> Self {
        match benchmark {
            Benchmark::Cpu => BenchmarkKind::Cpu,
            Benchmark::Mem => BenchmarkKind::Mem,
            Benchmark::Disk => BenchmarkKind::Disk,
        }
    }
}

/// Inventory the local machine's hardware
#[derive(Debug, Parser)]
#[command(name = "hardware-detect", version)]
struct Opt {
    /// Print a human readable list instead of JSON
    #[arg(short = 'H', long)]
    human: bool,

    /// Benchmarks to run after detection
    #[arg(short, long = "benchmark", value_enum, num_args = 1..)]
    benchmarks: Vec<Benchmark>,

    /// Also run write benchmarks on disks (destroys their data)
    #[arg(long)]
    benchmark_disk_destructive: bool,

    /// TOML configuration file
    #[arg(short, long, env = CONFIG_ENV_VAR)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Opt {
    /// Command line flags take precedence over the configuration file
    fn apply(&self, config: &mut ProbeConfig) {
        for benchmark in &self.benchmarks {
            let kind = BenchmarkKind::from(*benchmark);
            if !config.wants(kind) {
                config.benchmarks.push(kind);
            }
        }
        config.destructive_disk_benchmark |= self.benchmark_disk_destructive;
        config.verbose |= self.verbose;
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .target(env_logger::Target::Stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let opt = Opt::parse();

    let provider = ServiceContainer::create_configuration_provider(opt.config.clone());
    let loaded = provider.get_probe_config().await;
    let file_verbose = loaded.as_ref().map(|c| c.verbose).unwrap_or(false);
    init_logging(opt.verbose || file_verbose);

    let mut config = match loaded {
        Ok(config) => config,
        Err(e) => {
            error!("{e}");
            return ExitCode::from(1);
        }
    };
    opt.apply(&mut config);

    let container = ServiceContainer::from_probe_config(&config);
    for tool in container.missing_required_tools().await {
        warn!("{tool} is not installed");
    }

    let service = container.create_hardware_detection_service();
    let records = match service.detect(&config).await {
        Ok(records) => records,
        Err(e) => {
            error!("{e}");
            return ExitCode::from(1);
        }
    };

    let format = if opt.human {
        OutputFormat::Human
    } else {
        OutputFormat::Json
    };
    match render(&records, format) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            ExitCode::from(1)
        }
    }
}
