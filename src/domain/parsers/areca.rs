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

//! Areca RAID (`cli64`) output parsing

use super::common::{parse_key_value, size_in_gb};
use crate::domain::Record;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref NON_WORD_RE: Regex = Regex::new(r"[^a-z0-9]+").unwrap();
    static ref DISK_ROW_RE: Regex = Regex::new(
        r"^\s*(\d+)\s+(\d+)\s+(Slot#\d+)\s+(.+?)\s+(\d+(?:\.\d+)?[GT]B)\s+(.+?)\s*$"
    )
    .unwrap();
}

const EMPTY_SLOT: &str = "N.A.";

/// Normalize a cli64 label: `Fan#1 Speed (RPM)` gives `fan_1_speed_rpm`
pub fn areca_key(label: &str) -> String {
    NON_WORD_RE
        .replace_all(&label.to_lowercase(), "_")
        .trim_matches('_')
        .to_string()
}

/// Parse `cli64 sys info` or `cli64 hw info`
///
/// Only `key : value` lines between the `===` rulers are kept; the
/// trailing `GuiErrMsg` status line is skipped.
///
/// # Arguments
/// * `section` - Record id, `system` or `hardware`
/// * `output` - Raw cli64 output
pub fn parse_info(section: &str, output: &str) -> Vec<Record> {
    let mut records = Vec::new();

    for line in output.lines() {
        if line.contains("===") || line.contains("GuiErrMsg") {
            continue;
        }
        let Ok((label, value)) = parse_key_value(line, ':') else {
            continue;
        };
        let key = areca_key(&label);
        if key.is_empty() {
            continue;
        }
        records.push(Record::new("areca", section, key, value));
    }

    records
}

/// Whether cli64 answered successfully
pub fn is_success(output: &str) -> bool {
    output.contains("GuiErrMsg<0x00>")
}

/// Parse `cli64 disk info`
///
/// # Returns
/// * Records for populated slots and the number of populated slots
pub fn parse_disk_info(output: &str) -> (Vec<Record>, usize) {
    let mut records = Vec::new();
    let mut count = 0;

    for captures in output.lines().filter_map(|line| DISK_ROW_RE.captures(line)) {
        let model = captures[4].trim();
        if model == EMPTY_SLOT {
            continue;
        }
        count += 1;

        let id = format!("disk{}", &captures[1]);
        records.push(Record::new("areca", &id, "enclosure", &captures[2]));
        records.push(Record::new("areca", &id, "slot", &captures[3]));
        records.push(Record::new("areca", &id, "model", model));
        records.push(Record::new("areca", &id, "size", size_in_gb(&captures[5])));
        records.push(Record::new("areca", &id, "usage", captures[6].trim()));
    }

    (records, count)
}
