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

//! Detection services: each detector drives the ports and feeds a parser

pub mod benchmark;
pub mod bios;
pub mod context;
pub mod cpu;
pub mod hardware_detection;
pub mod ipmi;
pub mod platform;
pub mod raid;
pub mod storage;
pub mod system;

pub use benchmark::BenchmarkService;
pub use context::ProbeContext;
pub use hardware_detection::HardwareDetectionServiceImpl;
