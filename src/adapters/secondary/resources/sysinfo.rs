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

use crate::ports::HostResources;
use sysinfo::System;

/// Host resources read through `sysinfo`, refreshed on every query
#[derive(Debug, Default)]
pub struct SysinfoHostResources;

impl SysinfoHostResources {
    pub fn new() -> Self {
        Self
    }
}

impl HostResources for SysinfoHostResources {
    fn available_memory(&self) -> u64 {
        let mut sys = System::new();
        sys.refresh_memory();
        sys.available_memory()
    }
}
