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

use super::ProbeContext;
use crate::domain::parsers::bios::{is_hp_vendor, parse_conrep};
use crate::domain::RecordSet;
use crate::ports::SystemCommand;
use log::{debug, warn};

/// Dump HP BIOS settings with `conrep` on HP and HPE systems
pub async fn detect_hp_bios(ctx: &ProbeContext, records: &mut RecordSet) {
    let vendor = records.get_value("system", "product", "vendor");
    if !is_hp_vendor(&vendor) {
        return;
    }

    let dump = match tempfile::Builder::new().prefix("conrep").suffix(".dat").tempfile() {
        Ok(file) => file,
        Err(e) => {
            warn!("Cannot create the conrep dump file: {e}");
            return;
        }
    };
    let path = dump.path().to_string_lossy().into_owned();

    let command = SystemCommand::new("conrep").args(&["-s", "-f", &path]);
    if ctx.run(&command).await.is_none() {
        debug!("conrep did not produce a BIOS dump");
        return;
    }

    let xml = match tokio::fs::read_to_string(dump.path()).await {
        Ok(xml) => xml,
        Err(e) => {
            warn!("Cannot read the conrep dump {path}: {e}");
            return;
        }
    };
    match parse_conrep(&xml) {
        Ok(settings) => records.extend(settings),
        Err(e) => warn!("{e}"),
    }
}
