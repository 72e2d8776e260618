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

//! Memory timing parsing functions

use crate::domain::Record;

const CHANNEL_MODES: &[(&str, &str)] = &[
    ("is a Triple", "3"),
    ("is a Dual", "2"),
    ("is a Single", "1"),
    ("is a Zero", "0"),
];

const TIMINGS: &[&str] = &[
    "tCL", "tRCD", "tRP", "tRAS", "tRRD", "tRFC", "tWR", "tWTPr", "tRTPr", "tFAW", "B2B",
];

/// Parse the output of `ddr-timings-<machine>`
///
/// The tool prints the channel mode, then a table whose header contains
/// `DDR` followed by one `#<channel> | <timings...>` row per channel:
///
/// ```text
/// DDR   tCL   tRCD  tRP   tRAS  tRRD  tRFC  tWR   tWTPr tRTPr tFAW  B2B
/// #0 |  11    15    15    31     7    511   11    31    15    63    31
/// ```
pub fn parse_ddr_timings(output: &str) -> Vec<Record> {
    let mut records = Vec::new();
    let mut in_table = false;

    for line in output.lines() {
        if let Some((_, mode)) = CHANNEL_MODES.iter().find(|(marker, _)| line.contains(marker)) {
            records.push(Record::new("memory", "DDR", "type", *mode));
            continue;
        }

        if line.contains("DDR") {
            in_table = true;
            continue;
        }

        if !in_table {
            continue;
        }

        let fields: Vec<String> = line
            .replace('|', " ")
            .split_whitespace()
            .map(str::to_string)
            .collect();
        if fields.len() != TIMINGS.len() + 1 {
            continue;
        }

        let channel = format!("DDR_{}", fields[0].replace('#', ""));
        for (timing, value) in TIMINGS.iter().zip(&fields[1..]) {
            records.push(Record::new("memory", &channel, *timing, value.as_str()));
        }
    }

    records
}
