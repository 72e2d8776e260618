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

//! LSI MegaRAID (`megacli`) output parsing

use super::common::{camel_key, size_in_gb, KEY_SEPARATOR_RE};
use crate::domain::Record;
use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;

lazy_static! {
    static ref ENCLOSURE_HEADER_RE: Regex = Regex::new(r" +Enclosure [0-9]+:").unwrap();
    static ref ENCLOSURE_KEY_RE: Regex = Regex::new(r"^Enclosure(\d+)$").unwrap();
}

/// Keys never reported for physical drives
const PDISK_IGNORED: &[&str] = &["PdType", "EnclosureDeviceId", "CoercedSize", "ExitCode"];
const ENCLOSURE_IGNORED: &[&str] = &["ExitCode", "Enclosure"];

/// Value of a megacli field, integral when the text parses as one
#[derive(Debug, Clone, PartialEq)]
pub enum MegaValue {
    Int(i64),
    Text(String),
}

impl MegaValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            MegaValue::Int(i) => Some(*i),
            MegaValue::Text(_) => None,
        }
    }
}

impl fmt::Display for MegaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MegaValue::Int(i) => write!(f, "{i}"),
            MegaValue::Text(s) => write!(f, "{s}"),
        }
    }
}

/// Ordered megacli fields; a repeated key overrides the earlier value in place
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MegaInfo {
    fields: Vec<(String, MegaValue)>,
}

impl MegaInfo {
    pub fn get(&self, key: &str) -> Option<&MegaValue> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(MegaValue::as_int)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MegaValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    fn insert(&mut self, key: String, value: MegaValue) {
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.fields.push((key, value)),
        }
    }

    fn remove(&mut self, key: &str) -> Option<MegaValue> {
        let pos = self.fields.iter().position(|(k, _)| k == key)?;
        Some(self.fields.remove(pos).1)
    }
}

/// Parse megacli `key : value` lines
///
/// Keys are camel-cased, a trailing `.` is dropped from values and values
/// that parse as integers are kept as integers.
pub fn parse_megacli_output(output: &str) -> MegaInfo {
    let mut info = MegaInfo::default();

    for line in output.lines() {
        let mut parts = KEY_SEPARATOR_RE.splitn(line.trim(), 2);
        let (Some(key), Some(value)) = (parts.next(), parts.next()) else {
            continue;
        };

        let value = match value.strip_suffix('.') {
            Some(stripped) if value.len() > 1 => stripped,
            _ => value,
        };
        let value = match value.parse::<i64>() {
            Ok(number) => MegaValue::Int(number),
            Err(_) => MegaValue::Text(value.to_string()),
        };
        info.insert(camel_key(key), value);
    }

    info
}

/// Split an output in sections starting at every line matching `separator`
///
/// Lines before the first match are dropped, as is the line right before
/// each following match.
pub fn split_sections(separator: &Regex, output: &str) -> Vec<String> {
    let lines: Vec<&str> = output.split('\n').collect();
    let starts: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, line)| separator.is_match(line))
        .map(|(idx, _)| idx)
        .collect();

    let mut sections = Vec::new();
    for (i, start) in starts.iter().enumerate() {
        let end = match starts.get(i + 1) {
            Some(next) => next.saturating_sub(1).max(*start),
            None => lines.len(),
        };
        sections.push(lines[*start..end].join("\n"));
    }
    sections
}

/// Controller count from `megacli -adpCount`
pub fn parse_adapter_count(output: &str) -> i64 {
    parse_megacli_output(output)
        .get_int("ControllerCount")
        .unwrap_or(0)
}

/// Logical drive count from `megacli -LDGetNum -aN`
pub fn parse_logical_drive_count(output: &str, ctrl: usize) -> i64 {
    parse_megacli_output(output)
        .get_int(&format!("NumberOfVirtualDrivesConfiguredOnAdapter{ctrl}"))
        .unwrap_or(0)
}

/// Enclosures from `megacli -EncInfo -aN`
///
/// The `Enclosure <n>:` header becomes an `Enclosure` field holding `n`.
pub fn parse_enclosures(output: &str) -> Vec<MegaInfo> {
    split_sections(&ENCLOSURE_HEADER_RE, output)
        .iter()
        .map(|section| {
            let mut info = parse_megacli_output(section);
            let header = info
                .iter()
                .find_map(|(key, _)| ENCLOSURE_KEY_RE.captures(key).map(|c| c[1].to_string()));
            if let Some(number) = header {
                info.remove(&format!("Enclosure{number}"));
                if let Ok(number) = number.parse::<i64>() {
                    info.insert("Enclosure".to_string(), MegaValue::Int(number));
                }
            }
            info
        })
        .collect()
}

pub fn controller_records(ctrl: usize, info: &MegaInfo) -> Vec<Record> {
    let id = format!("Controller_{ctrl}");
    info.iter()
        .map(|(key, value)| Record::new("megaraid", &id, key, value.to_string()))
        .collect()
}

pub fn enclosure_records(enclosure: &MegaInfo) -> Vec<Record> {
    let Some(number) = enclosure.get_int("Enclosure") else {
        return Vec::new();
    };
    let id = format!("enclosure_{number}");
    enclosure
        .iter()
        .filter(|(key, _)| !ENCLOSURE_IGNORED.contains(key))
        .map(|(key, value)| Record::new("megaraid", &id, key, value.to_string()))
        .collect()
}

/// Records of one physical drive from `megacli -pdInfo`
///
/// # Returns
/// * `None` when the slot holds no drive (no `PdType`)
/// * `Some((records, size_gb))` otherwise
pub fn physical_drive_records(
    ctrl: usize,
    slot: i64,
    info: &MegaInfo,
) -> Option<(Vec<Record>, f64)> {
    let pd_type = info.get("PdType")?;
    let disk = format!("disk{slot}");
    let mut records = vec![
        Record::new("pdisk", &disk, "ctrl", ctrl.to_string()),
        Record::new("pdisk", &disk, "type", pd_type.to_string()),
    ];

    let enclosure = info
        .get("EnclosureDeviceId")
        .map(ToString::to_string)
        .unwrap_or_default();
    records.push(Record::new("pdisk", &disk, "id", format!("{enclosure}:{slot}")));

    // "278.875 GB [0x22dc0000 Sectors]" keeps only the first two words
    let coerced = info
        .get("CoercedSize")
        .map(ToString::to_string)
        .unwrap_or_default();
    let size = size_in_gb(
        &coerced
            .split_whitespace()
            .take(2)
            .collect::<Vec<_>>()
            .join(" "),
    );
    let size_gb = size.parse::<f64>().unwrap_or(0.0);
    records.push(Record::new("pdisk", &disk, "size", size));

    for (key, value) in info.iter() {
        if PDISK_IGNORED.contains(&key) {
            continue;
        }
        let text = value.to_string();

        if key.contains("DriveTemperature") {
            let first = text.split_whitespace().next().unwrap_or_default();
            if first.contains('C') {
                let celsius = first.split('C').next().unwrap_or_default().trim();
                records.push(Record::new("pdisk", &disk, key, celsius));
                records.push(Record::new("pdisk", &disk, format!("{key}_units"), "Celsius"));
            } else {
                records.push(Record::new("pdisk", &disk, key, text.trim()));
            }
        } else if key.contains("InquiryData") {
            for (idx, word) in text.split_whitespace().enumerate() {
                records.push(Record::new("pdisk", &disk, format!("{key}[{idx}]"), word));
            }
        } else {
            records.push(Record::new("pdisk", &disk, key, text.trim()));
        }
    }

    Some((records, size_gb))
}

/// Records of one logical drive from `megacli -LDInfo`; `Size` goes last, in GB
pub fn logical_drive_records(ld: i64, info: &MegaInfo) -> Vec<Record> {
    let disk = format!("disk{ld}");
    let mut records: Vec<Record> = info
        .iter()
        .filter(|(key, _)| *key != "Size")
        .map(|(key, value)| Record::new("ldisk", &disk, key, value.to_string()))
        .collect();

    if let Some(size) = info.get("Size") {
        records.push(Record::new("ldisk", &disk, "Size", size_in_gb(&size.to_string())));
    }

    records
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENC_INFO: &str = "
    Number of enclosures on adapter 0 -- 1

    Enclosure 0:
    Device ID                     : 32
    Number of Slots               : 8
    Number of Power Supplies      : 0
    Vendor Identification         : DP
    Product Identification        : BP12G+
    Status                        : Normal

Exit Code: 0x00
";

    const PD_INFO: &str = "
Enclosure Device ID: 32
Slot Number: 0
Drive's position: DiskGroup: 0, Span: 0, Arm: 0
Device Id: 0
WWN: 5000C50056A2B5A4
Media Error Count: 0
PD Type: SAS
Raw Size: 279.396 GB [0x22ecb25c Sectors]
Coerced Size: 278.875 GB [0x22dc0000 Sectors]
Firmware state: Online, Spun Up
Inquiry Data: SEAGATE ST300MM0006     LS0AS0K2B6PA
Drive Temperature :29C (84.20 F)

Exit Code: 0x00
";

    #[test]
    fn test_parse_megacli_output() {
        let info = parse_megacli_output("Controller Count: 1.\nProduct Name    : PERC H710 Mini\n");
        assert_eq!(info.get_int("ControllerCount"), Some(1));
        assert_eq!(
            info.get("ProductName"),
            Some(&MegaValue::Text("PERC H710 Mini".to_string()))
        );
        assert_eq!(parse_adapter_count("Controller Count: 2.\n"), 2);
        assert_eq!(parse_adapter_count(""), 0);
    }

    #[test]
    fn test_parse_logical_drive_count() {
        let output = "Number of Virtual Drives Configured on Adapter 0: 2\n\nExit Code: 0x00\n";
        assert_eq!(parse_logical_drive_count(output, 0), 2);
        assert_eq!(parse_logical_drive_count(output, 1), 0);
    }

    #[test]
    fn test_parse_enclosures() {
        let enclosures = parse_enclosures(ENC_INFO);
        assert_eq!(enclosures.len(), 1);
        let enclosure = &enclosures[0];
        assert_eq!(enclosure.get_int("Enclosure"), Some(0));
        assert_eq!(enclosure.get_int("DeviceId"), Some(32));
        assert_eq!(enclosure.get_int("NumberOfSlots"), Some(8));

        let records = enclosure_records(enclosure);
        assert_eq!(records[0], Record::new("megaraid", "enclosure_0", "DeviceId", "32"));
        assert!(records.iter().all(|r| r.key != "ExitCode" && r.key != "Enclosure"));
    }

    #[test]
    fn test_physical_drive_records() {
        let info = parse_megacli_output(PD_INFO);
        let (records, size) = physical_drive_records(0, 0, &info).unwrap();

        assert_eq!(size, 278.875);
        assert_eq!(
            &records[..4],
            &[
                Record::new("pdisk", "disk0", "ctrl", "0"),
                Record::new("pdisk", "disk0", "type", "SAS"),
                Record::new("pdisk", "disk0", "id", "32:0"),
                Record::new("pdisk", "disk0", "size", "278.875"),
            ]
        );
        let get = |key: &str| {
            records
                .iter()
                .find(|r| r.key == key)
                .map(|r| r.value.clone())
        };
        assert_eq!(get("DriveTemperature"), Some("29".into()));
        assert_eq!(get("DriveTemperature_units"), Some("Celsius".into()));
        assert_eq!(get("InquiryData[0]"), Some("SEAGATE".into()));
        assert_eq!(get("InquiryData[2]"), Some("LS0AS0K2B6PA".into()));
        assert_eq!(get("Drive'SPosition"), Some("DiskGroup: 0, Span: 0, Arm: 0".into()));
        assert_eq!(get("CoercedSize"), None);
        assert_eq!(get("ExitCode"), None);
    }

    #[test]
    fn test_empty_slot_has_no_records() {
        let info = parse_megacli_output("Adapter 0: Device at EnclId-32 SlotId-5 -- not found\n");
        assert!(physical_drive_records(0, 5, &info).is_none());
    }

    #[test]
    fn test_logical_drive_records_size_last() {
        let info = parse_megacli_output(
            "Virtual Drive: 0 (Target Id: 0)\nRAID Level          : Primary-1, Secondary-0\nSize                : 1.818 TB\nState               : Optimal\n",
        );
        let records = logical_drive_records(0, &info);
        let last = records.last().unwrap();
        assert_eq!(last, &Record::new("ldisk", "disk0", "Size", "1818"));
        assert_eq!(records[0].key, "VirtualDrive");
        assert_eq!(records[0].value, "0 (Target Id: 0)".into());
    }
}
