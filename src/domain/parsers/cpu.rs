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

//! CPU information parsing functions

use super::common::{parse_int_auto, parse_key_value};
use crate::domain::{Record, Value};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref NUMA_NODE_RE: Regex = Regex::new(r"^NUMA node(\d+) CPU\(s\)$").unwrap();
}

/// Key/value view over `lscpu` output
///
/// Keys keep their first position; a repeated key overrides the value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LscpuInfo {
    entries: Vec<(String, String)>,
}

impl LscpuInfo {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    fn get_int(&self, key: &str) -> Result<i64, String> {
        let raw = self
            .get(key)
            .ok_or_else(|| format!("lscpu did not report '{key}'"))?;
        raw.parse::<i64>()
            .map_err(|e| format!("Invalid '{key}' value '{raw}': {e}"))
    }

    /// Number of sockets (`Socket(s)`)
    pub fn sockets(&self) -> Result<i64, String> {
        self.get_int("Socket(s)")
    }

    /// Number of logical CPUs (`CPU(s)`)
    pub fn logical_cpus(&self) -> Result<i64, String> {
        self.get_int("CPU(s)")
    }

    /// Number of NUMA nodes when reported
    pub fn numa_node_count(&self) -> Option<i64> {
        self.get("NUMA node(s)").and_then(|v| v.parse().ok())
    }
}

/// Parse `lscpu` or `lscpu -x` output
///
/// # Arguments
/// * `output` - Raw output of lscpu, run with `LANG=en_US.UTF-8`
///
/// # Returns
/// * Ordered key/value view of the output
pub fn parse_lscpu(output: &str) -> LscpuInfo {
    let mut info = LscpuInfo::default();

    for line in output.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let Ok((key, value)) = parse_key_value(line, ':') else {
            continue;
        };
        match info.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => info.entries.push((key, value)),
        }
    }

    info
}

/// Integer when the text parses (hex when it contains `x`), raw text otherwise
pub fn maybe_int(value: &str) -> Value {
    match parse_int_auto(value) {
        Some(number) => Value::Int(number),
        None => Value::from(value),
    }
}

enum Conversion {
    Text,
    Int,
    MaybeInt,
    Float,
}

const SOCKET_FIELDS: &[(&str, &str, Conversion)] = &[
    ("vendor", "Vendor ID", Conversion::Text),
    ("product", "Model name", Conversion::Text),
    ("cores", "Core(s) per socket", Conversion::Int),
    ("threads", "", Conversion::Int),
    ("family", "CPU family", Conversion::Int),
    ("model", "Model", Conversion::MaybeInt),
    ("stepping", "Stepping", Conversion::MaybeInt),
    ("architecture", "Architecture", Conversion::Text),
    ("l1d cache", "L1d cache", Conversion::Text),
    ("l1i cache", "L1i cache", Conversion::Text),
    ("l2 cache", "L2 cache", Conversion::Text),
    ("l3 cache", "L3 cache", Conversion::Text),
    ("min_Mhz", "CPU min MHz", Conversion::Float),
    ("max_Mhz", "CPU max MHz", Conversion::Float),
    ("current_Mhz", "CPU MHz", Conversion::Float),
    ("flags", "Flags", Conversion::Text),
    ("threads_per_core", "Thread(s) per core", Conversion::Int),
];

fn convert(raw: &str, conversion: &Conversion) -> Value {
    match conversion {
        Conversion::Text => Value::from(raw),
        Conversion::Int => raw
            .parse::<i64>()
            .map(Value::Int)
            .unwrap_or_else(|_| Value::from(raw)),
        Conversion::MaybeInt => maybe_int(raw),
        Conversion::Float => raw
            .parse::<f64>()
            .map(Value::Float)
            .unwrap_or_else(|_| Value::from(raw)),
    }
}

/// Per-socket records derived from lscpu, in emission order
///
/// `threads` is not reported by lscpu and is computed as cores per socket
/// times threads per core.
pub fn socket_records(lscpu: &LscpuInfo, ptag: &str) -> Vec<Record> {
    let mut records = Vec::new();

    for (key, lscpu_key, conversion) in SOCKET_FIELDS {
        let value = if *key == "threads" {
            let per_core = lscpu
                .get("Thread(s) per core")
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(1);
            let cores = lscpu
                .get("Core(s) per socket")
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(1);
            Some(Value::Int(per_core * cores))
        } else {
            lscpu.get(lscpu_key).map(|raw| convert(raw, conversion))
        };

        if let Some(value) = value {
            records.push(Record::new("cpu", ptag, *key, value));
        }
    }

    records
}

/// `NUMA node<N> CPU(s)` keys sorted by node number
pub fn numa_node_keys(lscpu: &LscpuInfo) -> Vec<(String, u32)> {
    let mut nodes: Vec<(String, u32)> = lscpu
        .keys()
        .filter_map(|key| {
            let captures = NUMA_NODE_RE.captures(key)?;
            let node = captures[1].parse::<u32>().ok()?;
            Some((key.to_string(), node))
        })
        .collect();
    nodes.sort_by_key(|(_, node)| *node);
    nodes
}

/// Count the CPUs of an lscpu list such as `0-5,48-53`
pub fn count_cpu_list(list: &str) -> i64 {
    list.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| match item.split_once('-') {
            Some((min, max)) => match (min.parse::<i64>(), max.parse::<i64>()) {
                (Ok(min), Ok(max)) => max - min + 1,
                _ => 0,
            },
            None => 1,
        })
        .sum()
}

/// Records for every NUMA node: CPU count from `lscpu`, mask from `lscpu -x`
pub fn numa_records(lscpu: &LscpuInfo, lscpu_x: &LscpuInfo) -> Vec<Record> {
    let mut records = Vec::new();

    for (key, node) in numa_node_keys(lscpu_x) {
        let ntag = format!("node_{node}");
        let cpus = lscpu.get(&key).unwrap_or_default();
        records.push(Record::new("numa", &ntag, "cpu_count", count_cpu_list(cpus)));
        records.push(Record::new(
            "numa",
            &ntag,
            "cpu_mask",
            lscpu_x.get(&key).unwrap_or_default(),
        ));
    }

    records
}

/// Field of one processor block in `/proc/cpuinfo`
///
/// # Arguments
/// * `cpuinfo` - Content of /proc/cpuinfo
/// * `processor` - Logical CPU number
/// * `field` - Field name, e.g. `bogomips` or `cache size`
pub fn cpuinfo_field(cpuinfo: &str, processor: u32, field: &str) -> Option<String> {
    let mut in_block = false;

    for line in cpuinfo.lines() {
        let Ok((key, value)) = parse_key_value(line, ':') else {
            continue;
        };
        if key == "processor" {
            in_block = value.parse::<u32>().ok() == Some(processor);
        } else if in_block && key == field {
            return Some(value);
        }
    }

    None
}

/// coretemp attribute suffixes and the record keys they are reported under
pub const HWMON_ATTRIBUTES: &[(&str, &str)] = &[
    ("input", "temperature"),
    ("max", "max"),
    ("crit", "critical"),
    ("crit_alarm", "critical_alarm"),
];

/// Some kernels truncate hwmon attribute names to this length
pub const HWMON_NAME_MAX: usize = 16;

/// Key prefix of a coretemp sensor from its `temp<K>_label` content
pub fn hwmon_label(raw: &str) -> String {
    raw.trim().replace(' ', "_")
}

/// Socket number of a `coretemp.<N>` platform device
pub fn coretemp_socket(entry: &str) -> Option<u32> {
    entry.strip_prefix("coretemp.")?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const LSCPU: &str = "Architecture:                    x86_64
CPU op-mode(s):                  32-bit, 64-bit
Byte Order:                      Little Endian
CPU(s):                          48
On-line CPU(s) list:             0-47
Thread(s) per core:              2
Core(s) per socket:              12
Socket(s):                       2
NUMA node(s):                    2
Vendor ID:                       GenuineIntel
CPU family:                      6
Model:                           85
Model name:                      Intel(R) Xeon(R) Gold 6126 CPU @ 2.60GHz
Stepping:                        4
CPU MHz:                         1000.073
CPU max MHz:                     3700.0000
CPU min MHz:                     1000.0000
BogoMIPS:                        5200.00
L1d cache:                       32K
L1i cache:                       32K
L2 cache:                        1024K
L3 cache:                        19712K
NUMA node0 CPU(s):               0-11,24-35
NUMA node1 CPU(s):               12-23,36-47
Flags:                           fpu vme de pse
";

    const LSCPU_X: &str = "CPU(s):                          48
NUMA node1 CPU(s):               00000000,00fff000
NUMA node0 CPU(s):               00000000,00000fff
";

    #[test]
    fn test_parse_lscpu() {
        let info = parse_lscpu(LSCPU);
        assert_eq!(info.sockets().unwrap(), 2);
        assert_eq!(info.logical_cpus().unwrap(), 48);
        assert_eq!(info.numa_node_count(), Some(2));
        assert_eq!(info.get("Model name"), Some("Intel(R) Xeon(R) Gold 6126 CPU @ 2.60GHz"));
        assert!(parse_lscpu("garbage").sockets().is_err());
    }

    #[test]
    fn test_socket_records() {
        let info = parse_lscpu(LSCPU);
        let records = socket_records(&info, "physical_0");

        let keys: Vec<&str> = records.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                "vendor",
                "product",
                "cores",
                "threads",
                "family",
                "model",
                "stepping",
                "architecture",
                "l1d cache",
                "l1i cache",
                "l2 cache",
                "l3 cache",
                "min_Mhz",
                "max_Mhz",
                "current_Mhz",
                "flags",
                "threads_per_core",
            ]
        );
        assert_eq!(records[2].value, Value::Int(12));
        assert_eq!(records[3].value, Value::Int(24));
        assert_eq!(records[5].value, Value::Int(85));
        assert_eq!(records[13].value, Value::Float(3700.0));
    }

    #[test]
    fn test_maybe_int() {
        assert_eq!(maybe_int("0xd0c"), Value::Int(0xd0c));
        assert_eq!(maybe_int("4"), Value::Int(4));
        assert_eq!(maybe_int("r0p1"), Value::from("r0p1"));
    }

    #[test]
    fn test_numa_records_sorted_by_node() {
        let records = numa_records(&parse_lscpu(LSCPU), &parse_lscpu(LSCPU_X));
        assert_eq!(
            records,
            vec![
                Record::new("numa", "node_0", "cpu_count", 24i64),
                Record::new("numa", "node_0", "cpu_mask", "00000000,00000fff"),
                Record::new("numa", "node_1", "cpu_count", 24i64),
                Record::new("numa", "node_1", "cpu_mask", "00000000,00fff000"),
            ]
        );
    }

    #[test]
    fn test_count_cpu_list() {
        assert_eq!(count_cpu_list("0-5,48-53"), 12);
        assert_eq!(count_cpu_list("0,1"), 2);
        assert_eq!(count_cpu_list(""), 0);
    }

    #[test]
    fn test_coretemp_helpers() {
        assert_eq!(hwmon_label("Package id 0\n"), "Package_id_0");
        assert_eq!(coretemp_socket("coretemp.1"), Some(1));
        assert_eq!(coretemp_socket("serial8250"), None);
    }

    #[test]
    fn test_cpuinfo_field() {
        let cpuinfo = "processor\t: 0\nbogomips\t: 5200.00\ncache size\t: 19712 KB\n\n\
                       processor\t: 1\nbogomips\t: 5201.00\n";
        assert_eq!(cpuinfo_field(cpuinfo, 1, "bogomips").as_deref(), Some("5201.00"));
        assert_eq!(cpuinfo_field(cpuinfo, 0, "cache size").as_deref(), Some("19712 KB"));
        assert_eq!(cpuinfo_field(cpuinfo, 2, "bogomips"), None);
    }
}
