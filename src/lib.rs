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

//! Hardware Detect Library
//!
//! This library inventories the local machine's hardware as a flat list of
//! `(class, id, key, value)` records, using a Ports and Adapters (Hexagonal)
//! architecture so every detector can be driven by scripted tool output in
//! tests.
//!
//! # Architecture
//!
//! - **Domain**: The record model, pure parsers for each tool's output and
//!   the detection services that sequence them
//! - **Ports**: Interfaces for running commands, reading `/sys` and `/proc`,
//!   querying interfaces and loading configuration
//! - **Adapters**: Local implementations of the ports
//!
//! # Usage
//!
//! ```rust,no_run
//! use hardware_detect::{render_json, ProbeConfig, ServiceContainer};
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ProbeConfig::default();
//!     let service = ServiceContainer::from_probe_config(&config)
//!         .create_hardware_detection_service();
//!
//!     let records = service.detect(&config).await?;
//!     println!("{}", render_json(&records)?);
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod container;
pub mod domain;
pub mod ports;

pub use adapters::{
    IoctlInterfaceQuery, LocalSystemFiles, SysinfoHostResources, TomlConfigurationProvider,
    UnixCommandExecutor, CONFIG_ENV_VAR,
};
pub use container::{ContainerConfig, ContainerConfigBuilder, ServiceContainer};
pub use domain::{
    render, render_human, render_json, BenchmarkConfig, BenchmarkKind, DetectError,
    DomainError, OutputFormat, ProbeConfig, Record, RecordSet, Value,
};
pub use ports::{
    CommandExecutor, CommandOutput, ConfigurationProvider, HardwareDetectionService,
    HostResources, InterfaceQuery, SystemCommand, SystemFiles,
};
