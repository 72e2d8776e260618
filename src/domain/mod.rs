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

//! Domain layer: the record model, pure parsers and the detection services

pub mod config;
pub mod errors;
pub mod output;
pub mod parsers;
pub mod record;
pub mod services;

pub use config::{BenchmarkConfig, BenchmarkKind, ProbeConfig};
pub use errors::{CommandError, ConfigError, DetectError, DomainError, SystemError};
pub use output::{render, render_human, render_json, OutputFormat};
pub use record::{quote, Record, RecordSet, Value};
pub use services::{BenchmarkService, HardwareDetectionServiceImpl, ProbeContext};
