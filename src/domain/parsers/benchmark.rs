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

//! sysbench and fio output parsing

use crate::domain::Record;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;

lazy_static! {
    static ref EVENTS_RE: Regex = Regex::new(r"total number of events:\s*(\d+)").unwrap();
    static ref BANDWIDTH_RE: Regex = Regex::new(r"\((\d+)(?:\.\d+)?\s*MiB/sec\)").unwrap();
    static ref BLOCK_SIZE_RE: Regex = Regex::new(r"^(\d+)([KMG]?)$").unwrap();
}

/// Block sizes exercised by the memory benchmark
pub const MEMORY_BLOCK_SIZES: &[&str] = &["1K", "4K", "1M", "16M", "128M", "1G", "2G"];

/// fio access patterns that never write to the disk
pub const READ_MODES: &[&str] = &["read", "randread"];
/// fio access patterns that overwrite the disk
pub const WRITE_MODES: &[&str] = &["write", "randwrite"];
/// fio block sizes
pub const DISK_BLOCK_SIZES: &[&str] = &["4k", "1M"];

/// Loops per second from a `sysbench cpu run` output
///
/// # Arguments
/// * `output` - sysbench output
/// * `runtime_secs` - Value given to `--time`
///
/// # Returns
/// * Total number of events divided by the runtime, truncated
pub fn parse_sysbench_cpu(output: &str, runtime_secs: u64) -> Option<u64> {
    let events = EVENTS_RE.captures(output)?[1].parse::<u64>().ok()?;
    Some(events / runtime_secs.max(1))
}

/// Integer part of the MiB/sec figure of a `sysbench memory run` output
pub fn parse_sysbench_memory(output: &str) -> Option<u64> {
    BANDWIDTH_RE.captures(output)?[1].parse().ok()
}

/// Bytes in a sysbench block size such as `16M`
pub fn block_size_bytes(block_size: &str) -> Option<u64> {
    let captures = BLOCK_SIZE_RE.captures(block_size.trim())?;
    let count = captures[1].parse::<u64>().ok()?;
    let unit: u64 = match &captures[2] {
        "K" => 1 << 10,
        "M" => 1 << 20,
        "G" => 1 << 30,
        _ => 1,
    };
    count.checked_mul(unit)
}

/// Whether `threads` concurrent buffers of `block_size` fit in the available memory
pub fn memory_block_fits(block_size: &str, threads: u64, available_bytes: u64) -> bool {
    block_size_bytes(block_size)
        .and_then(|bytes| bytes.checked_mul(threads.max(1)))
        .is_some_and(|needed| needed < available_bytes)
}

/// Arguments of one fio run, one job per disk
pub fn fio_args(
    disks: &[String],
    mode: &str,
    block_size: &str,
    runtime_secs: u64,
    rampup_secs: u64,
) -> Vec<String> {
    let mut args = vec![
        "--output-format=json".to_string(),
        "--ioengine=libaio".to_string(),
        "--invalidate=1".to_string(),
        "--direct=1".to_string(),
        "--iodepth=32".to_string(),
        "--time_based".to_string(),
        format!("--ramp_time={rampup_secs}"),
        format!("--runtime={runtime_secs}"),
        format!("--bs={block_size}"),
        format!("--rw={mode}"),
    ];

    for disk in disks {
        args.push(format!("--name={}", fio_job_name(disk)));
        args.push(format!("--filename=/dev/{disk}"));
    }

    args
}

pub fn fio_job_name(disk: &str) -> String {
    format!("MYJOB-{disk}")
}

#[derive(Debug, Deserialize)]
struct FioReport {
    #[serde(default)]
    jobs: Vec<FioJob>,
}

#[derive(Debug, Deserialize)]
struct FioJob {
    jobname: String,
    #[serde(default)]
    read: FioStats,
    #[serde(default)]
    write: FioStats,
}

#[derive(Debug, Default, Deserialize)]
struct FioStats {
    /// KiB/s
    #[serde(default)]
    bw: f64,
    #[serde(default)]
    iops: f64,
}

/// Records of a fio JSON report
///
/// # Arguments
/// * `json` - fio `--output-format=json` output
/// * `prefix` - `standalone` or `simultaneous`
/// * `mode` - fio `--rw` value; read modes report read stats, write modes write stats
/// * `block_size` - fio `--bs` value
///
/// # Returns
/// * `disk/<disk>/<prefix>_<mode>_<bs>_KBps` and `..._IOps` for every job
pub fn parse_fio_report(
    json: &str,
    prefix: &str,
    mode: &str,
    block_size: &str,
) -> Result<Vec<Record>, String> {
    // fio may print warnings before the JSON document
    let start = json
        .find('{')
        .ok_or_else(|| "No JSON document in fio output".to_string())?;
    let report: FioReport = serde_json::from_str(&json[start..])
        .map_err(|e| format!("Invalid fio report: {e}"))?;

    let mut records = Vec::new();
    for job in report.jobs {
        let Some(disk) = job.jobname.strip_prefix("MYJOB-") else {
            continue;
        };
        let stats = if mode.contains("write") {
            &job.write
        } else {
            &job.read
        };
        records.push(Record::new(
            "disk",
            disk,
            format!("{prefix}_{mode}_{block_size}_KBps"),
            (stats.bw as u64).to_string(),
        ));
        records.push(Record::new(
            "disk",
            disk,
            format!("{prefix}_{mode}_{block_size}_IOps"),
            (stats.iops as u64).to_string(),
        ));
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sysbench_cpu() {
        let output = "General statistics:
    total time:                          10.0002s
    total number of events:              12345
";
        assert_eq!(parse_sysbench_cpu(output, 10), Some(1234));
        assert_eq!(parse_sysbench_cpu("FATAL: no such test", 10), None);
    }

    #[test]
    fn test_parse_sysbench_memory() {
        let output = "Total operations: 104857600 (20970725.23 per second)

102400.00 MiB transferred (20479.22 MiB/sec)
";
        assert_eq!(parse_sysbench_memory(output), Some(20479));
    }

    #[test]
    fn test_block_size_bytes() {
        assert_eq!(block_size_bytes("1K"), Some(1024));
        assert_eq!(block_size_bytes("16M"), Some(16 << 20));
        assert_eq!(block_size_bytes("2G"), Some(2 << 30));
        assert_eq!(block_size_bytes("huge"), None);
    }

    #[test]
    fn test_memory_block_fits() {
        let four_gb = 4u64 << 30;
        assert!(memory_block_fits("1G", 2, four_gb));
        assert!(!memory_block_fits("2G", 2, four_gb));
        assert!(!memory_block_fits("2G", 48, four_gb));
    }

    #[test]
    fn test_fio_args() {
        let disks = vec!["sda".to_string(), "sdb".to_string()];
        let args = fio_args(&disks, "randread", "4k", 10, 5);
        assert!(args.contains(&"--rw=randread".to_string()));
        assert!(args.contains(&"--bs=4k".to_string()));
        assert!(args.contains(&"--ramp_time=5".to_string()));
        assert_eq!(
            &args[args.len() - 4..],
            &[
                "--name=MYJOB-sda".to_string(),
                "--filename=/dev/sda".to_string(),
                "--name=MYJOB-sdb".to_string(),
                "--filename=/dev/sdb".to_string(),
            ]
        );
    }

    #[test]
    fn test_parse_fio_report() {
        let json = r#"note: both iodepth >= 1 and synchronous I/O engine are selected
{
  "fio version" : "fio-3.28",
  "jobs" : [
    {
      "jobname" : "MYJOB-sda",
      "read" : { "bw" : 204800, "iops" : 51200.5 },
      "write" : { "bw" : 0, "iops" : 0.0 }
    },
    {
      "jobname" : "MYJOB-sdb",
      "read" : { "bw" : 102400, "iops" : 25600.0 },
      "write" : { "bw" : 0, "iops" : 0.0 }
    }
  ]
}"#;
        let records = parse_fio_report(json, "simultaneous", "randread", "4k").unwrap();
        assert_eq!(
            records,
            vec![
                Record::new("disk", "sda", "simultaneous_randread_4k_KBps", "204800"),
                Record::new("disk", "sda", "simultaneous_randread_4k_IOps", "51200"),
                Record::new("disk", "sdb", "simultaneous_randread_4k_KBps", "102400"),
                Record::new("disk", "sdb", "simultaneous_randread_4k_IOps", "25600"),
            ]
        );
        assert!(parse_fio_report("fio: failed", "standalone", "read", "1M").is_err());
    }
}
