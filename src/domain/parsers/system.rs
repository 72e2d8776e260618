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

//! System identity parsing functions

use super::common::output_lines;
use crate::domain::{RecordSet, Value};

/// Serial numbers some vendors (TYAN, Supermicro) burn in instead of a real one
pub const PLACEHOLDER_SERIALS: &[&str] = &["0123456789", "0000000000"];

/// Clean a system UUID read from sysfs or `dmidecode -s system-uuid`
///
/// Firmwares that do not set it report texts such as `Not Settable`.
pub fn parse_system_uuid(raw: &str) -> Option<String> {
    let uuid = raw.lines().next()?.trim();
    match uuid.split_whitespace().next() {
        None | Some("Not") => None,
        Some(_) => Some(uuid.to_string()),
    }
}

/// NIC based identifier: the MAC address without colons
pub fn nic_id(serial: &str) -> String {
    serial.replace(':', "")
}

/// Replace a placeholder system serial
///
/// Only the first `system/product/serial` record is examined. When it holds a
/// placeholder, the first non-empty of `uuid`, `motherboard_serial` and
/// `nic_id` replaces it: the bad record is removed and the replacement is
/// appended at the end.
///
/// # Returns
/// * `true` when the serial was replaced
pub fn fix_bad_serial(
    records: &mut RecordSet,
    uuid: &str,
    motherboard_serial: &str,
    nic_id: &str,
) -> bool {
    let is_placeholder = records
        .get("system", "product", "serial")
        .and_then(Value::as_str)
        .is_some_and(|serial| PLACEHOLDER_SERIALS.contains(&serial));
    if !is_placeholder {
        return false;
    }

    let Some(replacement) = [uuid, motherboard_serial, nic_id]
        .into_iter()
        .find(|candidate| !candidate.is_empty())
    else {
        return false;
    };

    records.remove_first("system", "product", "serial");
    records.push("system", "product", "serial", replacement);
    true
}

/// Lines of `lsb_release -ds` with double quotes removed
pub fn parse_os_description(output: &str) -> Vec<String> {
    output_lines(&output.replace('"', ""))
}
