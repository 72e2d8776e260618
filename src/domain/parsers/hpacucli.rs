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

//! HP Smart Array (`ssacli`, `hpssacli`, `hpacucli`) output parsing

use super::common::{parse_key_value, size_in_gb};
use crate::domain::Record;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref CONTROLLER_RE: Regex = Regex::new(r"^(.*?) in Slot (\d+)").unwrap();
    static ref PHYSICAL_DRIVE_RE: Regex = Regex::new(
        r"physicaldrive (\S+) \(port (\S+):box (\d+):bay (\d+), ([^,]+), ([^,]+), ([^)]+)\)"
    )
    .unwrap();
    static ref LOGICAL_DRIVE_RE: Regex =
        Regex::new(r"logicaldrive (\d+) \(([^,]+), RAID ([^,]+), ([^)]+)\)").unwrap();
}

/// Controller listed by `ctrl all show`
#[derive(Debug, Clone, PartialEq)]
pub struct SmartArrayController {
    pub slot: u32,
    pub model: String,
}

impl SmartArrayController {
    /// Record id of the controller (`slot_<n>`)
    pub fn id(&self) -> String {
        format!("slot_{}", self.slot)
    }

    /// Selector passed to the CLI (`slot=<n>`)
    pub fn selector(&self) -> String {
        format!("slot={}", self.slot)
    }
}

/// Physical drive listed by `ctrl slot=N pd all show`
#[derive(Debug, Clone, PartialEq)]
pub struct SmartArrayDisk {
    /// `port:box:bay` identifier
    pub id: String,
    pub disk_type: String,
    pub size: String,
    pub status: String,
}

/// Parse `ctrl all show`
pub fn parse_controllers(output: &str) -> Vec<SmartArrayController> {
    output
        .lines()
        .filter_map(|line| {
            let captures = CONTROLLER_RE.captures(line.trim())?;
            Some(SmartArrayController {
                slot: captures[2].parse().ok()?,
                model: captures[1].trim().to_string(),
            })
        })
        .collect()
}

/// Controller details from `ctrl slot=N show detail`
///
/// Keys are lower-cased with spaces turned into underscores
/// (`Firmware Version` gives `firmware_version`).
pub fn controller_detail_records(controller: &SmartArrayController, output: &str) -> Vec<Record> {
    let id = controller.id();
    let mut records = vec![Record::new("hpa", &id, "model", controller.model.as_str())];

    for line in output.lines() {
        if !line.starts_with(char::is_whitespace) {
            continue;
        }
        let Ok((label, value)) = parse_key_value(line, ':') else {
            continue;
        };
        if label.is_empty() || value.is_empty() {
            continue;
        }
        let key = label.to_lowercase().replace(' ', "_");
        records.push(Record::new("hpa", &id, key, value));
    }

    records
}

/// Parse `ctrl slot=N pd all show`
pub fn parse_physical_drives(output: &str) -> Vec<SmartArrayDisk> {
    output
        .lines()
        .filter_map(|line| PHYSICAL_DRIVE_RE.captures(line))
        .map(|captures| SmartArrayDisk {
            id: captures[1].to_string(),
            disk_type: captures[5].trim().to_string(),
            size: size_in_gb(captures[6].trim()),
            status: captures[7].trim().to_string(),
        })
        .collect()
}

pub fn physical_drive_records(
    controller: &SmartArrayController,
    disk: &SmartArrayDisk,
) -> Vec<Record> {
    vec![
        Record::new("disk", &disk.id, "slot", controller.slot.to_string()),
        Record::new("disk", &disk.id, "type", disk.disk_type.as_str()),
        Record::new("disk", &disk.id, "size", disk.size.as_str()),
        Record::new("disk", &disk.id, "status", disk.status.as_str()),
    ]
}

/// Logical drive records from `ctrl slot=N ld all show`
pub fn logical_drive_records(controller: &SmartArrayController, output: &str) -> Vec<Record> {
    let mut records = Vec::new();

    for captures in output.lines().filter_map(|line| LOGICAL_DRIVE_RE.captures(line)) {
        let id = format!("{}_ld{}", controller.id(), &captures[1]);
        records.push(Record::new("hpa", &id, "size", size_in_gb(captures[2].trim())));
        records.push(Record::new("hpa", &id, "raid", captures[3].trim()));
        records.push(Record::new("hpa", &id, "status", captures[4].trim()));
    }

    records
}
