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

//! Pure parsing functions for converting raw command output to records
//!
//! These functions are pure (no side effects) and can be easily tested in isolation.
//! They take the text a tool printed and return records or parsing errors. Several
//! vendor modules share function names, so callers go through the module path.

pub mod areca;
pub mod benchmark;
pub mod bios;
pub mod common;
pub mod cpu;
pub mod hpacucli;
pub mod infiniband;
pub mod ipmi;
pub mod kernel;
pub mod lshw;
pub mod megacli;
pub mod memory;
pub mod network;
pub mod storage;
pub mod system;

pub use common::*;
pub use lshw::{parse_lshw_xml, LshwNetwork, LshwSystem};
