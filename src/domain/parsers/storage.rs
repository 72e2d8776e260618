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

//! Block device (`/sys/block`) parsing functions

use crate::domain::Record;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref SCHEDULER_RE: Regex = Regex::new(r"\[(.*?)\]").unwrap();
}

/// Per-disk attributes: record key and the paths tried under `/sys/block/<disk>`
pub const DISK_ATTRIBUTES: &[(&str, &[&str])] = &[
    ("vendor", &["device/vendor"]),
    ("model", &["device/model"]),
    ("rev", &["device/rev", "device/revision", "device/firmware_rev"]),
    ("optimal_io_size", &["queue/optimal_io_size", "device/optimal_io_size"]),
    ("physical_block_size", &["queue/physical_block_size", "device/physical_block_size"]),
    ("rotational", &["queue/rotational", "device/rotational"]),
    ("nr_requests", &["queue/nr_requests", "device/nr_requests"]),
];

/// Whether a `/sys/block` entry is a disk worth reporting
///
/// `sd*`, `hd*`, `vd*` and `nvme*` entries qualify; loop, ram, md and dm
/// devices do not.
pub fn is_disk_name(name: &str) -> bool {
    let mut chars = name.chars();
    match (chars.next(), chars.next()) {
        (Some(first), Some('d')) if "shv".contains(first) => true,
        _ => name.starts_with("nvme"),
    }
}

/// Disk size in GB (10^9 bytes, truncated) from the sector count in `size`
pub fn disk_size_gb(sectors: &str) -> Option<u64> {
    let sectors = sectors.trim().parse::<u64>().ok()?;
    Some(sectors.saturating_mul(512) / 1_000_000_000)
}

/// Active I/O scheduler, the bracketed entry of `queue/scheduler`
pub fn parse_scheduler(line: &str) -> Option<String> {
    SCHEDULER_RE
        .captures(line)
        .map(|captures| captures[1].to_string())
}

/// Write/read cache flags from `scsi_disk/<addr>/cache_type`
///
/// | cache_type                   | WCE | RCD |
/// |------------------------------|-----|-----|
/// | `write through`              | 0   | 0   |
/// | `none`                       | 0   | 1   |
/// | `write back`                 | 1   | 0   |
/// | `write back, no read (daft)` | 1   | 1   |
pub fn cache_type_records(disk: &str, cache_type: &str) -> Vec<Record> {
    let cache_type = cache_type.trim();
    let (wce, rcd) = match cache_type {
        "write through" => ("0", "0"),
        "none" => ("0", "1"),
        other if other.contains("daft") => ("1", "1"),
        _ => ("1", "0"),
    };

    vec![
        Record::new("disk", disk, "Write Cache Enable", wce),
        Record::new("disk", disk, "Read Cache Disable", rcd),
    ]
}

/// Last path component of a symlink target (`../../sda` gives `sda`)
pub fn link_target_name(target: &str) -> &str {
    target.trim_end_matches('/').rsplit('/').next().unwrap_or(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_disk_name() {
        assert!(is_disk_name("sda"));
        assert!(is_disk_name("hdb"));
        assert!(is_disk_name("vdc"));
        assert!(is_disk_name("nvme0n1"));
        assert!(!is_disk_name("loop0"));
        assert!(!is_disk_name("md127"));
        assert!(!is_disk_name("dm-0"));
        assert!(!is_disk_name("s"));
    }

    #[test]
    fn test_disk_size_gb() {
        assert_eq!(disk_size_gb("937703088\n"), Some(480));
        assert_eq!(disk_size_gb("0"), Some(0));
        assert_eq!(disk_size_gb("n/a"), None);
    }

    #[test]
    fn test_parse_scheduler() {
        assert_eq!(
            parse_scheduler("noop deadline [cfq]").as_deref(),
            Some("cfq")
        );
        assert_eq!(parse_scheduler("[none] mq-deadline").as_deref(), Some("none"));
        assert_eq!(parse_scheduler("none"), None);
    }

    #[test]
    fn test_cache_type_records() {
        let wce = |cache_type: &str| {
            let records = cache_type_records("sda", cache_type);
            (
                records[0].value.to_text().unwrap_or_default(),
                records[1].value.to_text().unwrap_or_default(),
            )
        };
        assert_eq!(wce("write through"), ("0".into(), "0".into()));
        assert_eq!(wce("none"), ("0".into(), "1".into()));
        assert_eq!(wce("write back"), ("1".into(), "0".into()));
        assert_eq!(wce("write back, no read (daft)"), ("1".into(), "1".into()));
        assert_eq!(cache_type_records("sda", "none")[0].key, "Write Cache Enable");
    }

    #[test]
    fn test_link_target_name() {
        assert_eq!(link_target_name("../../sda"), "sda");
        assert_eq!(
            link_target_name("../../../devices/pci0000:00/0000:00:1f.2/ata1/host0/target0:0:0/0:0:0:0"),
            "0:0:0:0"
        );
    }
}
