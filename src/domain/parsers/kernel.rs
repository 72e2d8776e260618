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

//! Kernel facing outputs: dmesg, the ELF auxiliary vector and the RTC mode

use super::common::parse_key_value;
use crate::domain::Record;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref DMESG_TIMESTAMP_RE: Regex = Regex::new(r"^\[[^\]]*\]\s*").unwrap();
    static ref ATA_LINK_RE: Regex =
        Regex::new(r"^(ata\d+): SATA link up (\S+ \S+)").unwrap();
}

/// Auxiliary vector entries worth reporting
pub const AUXV_FLAGS: &[&str] = &[
    "AT_HWCAP",
    "AT_HWCAP2",
    "AT_PAGESZ",
    "AT_FLAGS",
    "AT_PLATFORM",
    // Not present on every architecture
    "AT_BASE_PLATFORM",
];

/// Parse `dmesg` output
///
/// # Arguments
/// * `output` - Raw kernel ring buffer
///
/// # Returns
/// * `ahci/<addr>/flags` for AHCI controllers and `ide/ataN/link` for SATA links
pub fn parse_dmesg(output: &str) -> Vec<Record> {
    let mut records = Vec::new();

    for line in output.lines() {
        let line = DMESG_TIMESTAMP_RE.replace(line.trim(), "");
        let words: Vec<&str> = line.split_whitespace().collect();
        let Some(first) = words.first() else {
            continue;
        };

        if first.contains("ahci") {
            if let Some(record) = parse_ahci_flags(&words) {
                records.push(record);
            }
        } else if let Some(captures) = ATA_LINK_RE.captures(&line) {
            records.push(Record::new("ide", &captures[1], "link", &captures[2]));
        }
    }

    records
}

/// `ahci 0000:00:1f.2: flags: 64bit ncq ...` gives the sorted flag list
fn parse_ahci_flags(words: &[&str]) -> Option<Record> {
    if words.len() < 4 || !words[2].contains("flags") {
        return None;
    }
    let mut flags: Vec<&str> = words[3..].to_vec();
    flags.sort_unstable();
    Some(Record::new("ahci", words[1], "flags", flags.join(" ")))
}

/// Parse the output of a program run with `LD_SHOW_AUXV=1`
pub fn parse_auxv(output: &str) -> Vec<Record> {
    output
        .lines()
        .filter_map(|line| parse_key_value(line, ':').ok())
        .filter(|(key, _)| AUXV_FLAGS.contains(&key.as_str()))
        .map(|(key, value)| {
            let name = key.trim_start_matches("AT_").to_lowercase();
            Record::new("hw", "auxv", name, value)
        })
        .collect()
}

/// Whether the RTC keeps UTC, from `timedatectl`
///
/// `None` when timedatectl does not report the RTC mode.
pub fn parse_rtc_utc(output: &str) -> Option<bool> {
    output
        .lines()
        .filter_map(|line| parse_key_value(line, ':').ok())
        .find(|(key, _)| key == "RTC in local TZ")
        .map(|(_, value)| value == "no")
}
