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

//! Network interface parsing functions

use super::common::parse_key_value;
use crate::domain::Record;
use std::net::Ipv4Addr;

/// Convert a dotted netmask to a prefix length
///
/// Bits are counted up to the last set bit, so `255.255.255.0` gives 24.
pub fn netmask_to_cidr(netmask: &str) -> Option<u32> {
    let mask: Ipv4Addr = netmask.trim().parse().ok()?;
    let bits = u32::from(mask);
    Some(32 - bits.trailing_zeros().min(32))
}

/// Network address of `ip/cidr`
pub fn network_address(ip: &str, cidr: u32) -> Option<String> {
    let ip: Ipv4Addr = ip.trim().parse().ok()?;
    let mask = match cidr {
        0 => 0,
        n if n >= 32 => u32::MAX,
        n => u32::MAX << (32 - n),
    };
    Some(Ipv4Addr::from(u32::from(ip) & mask).to_string())
}

/// Records derived from a netmask: `ipv4-netmask`, `ipv4-cidr` and `ipv4-network`
pub fn netmask_records(interface: &str, ipv4: &str, netmask: &str) -> Vec<Record> {
    let mut records = vec![Record::new("network", interface, "ipv4-netmask", netmask)];

    if let Some(cidr) = netmask_to_cidr(netmask) {
        records.push(Record::new("network", interface, "ipv4-cidr", cidr.to_string()));
        if let Some(network) = network_address(ipv4, cidr) {
            records.push(Record::new("network", interface, "ipv4-network", network));
        }
    }

    records
}

/// Hardware address from `ip addr show <if>`
///
/// Takes the second word of the first line mentioning `link`, lower-cased.
pub fn parse_ip_link_address(output: &str) -> Option<String> {
    output
        .lines()
        .find(|line| line.contains("link"))
        .and_then(|line| line.split_whitespace().nth(1))
        .map(str::to_lowercase)
}

/// Offload features from `ethtool -k <if>`
///
/// Every `feature: on|off` line gives a record; features marked `[fixed]`
/// get an extra `<feature>/fixed = true` record.
pub fn parse_ethtool_features(interface: &str, output: &str) -> Vec<Record> {
    let mut records = Vec::new();

    // First line is the "Features for <if>:" header
    for line in output.lines().skip(1) {
        let Ok((feature, state)) = parse_key_value(line, ':') else {
            continue;
        };
        if feature.is_empty() {
            continue;
        }

        let fixed = state.contains("[fixed]");
        let state = state.replace("[fixed]", "").trim().to_string();
        records.push(Record::new("network", interface, &feature, state));
        if fixed {
            records.push(Record::new(
                "network",
                interface,
                format!("{feature}/fixed"),
                true,
            ));
        }
    }

    records
}

/// Neighbour TLVs from `lldptool -t -n -i <if>`
///
/// Unindented lines are TLV headers (`Chassis ID TLV`), indented lines are
/// their content. `key: value` content lines are stored under `<header>/<key>`,
/// plain content lines under the header itself. The `End of LLDPDU` marker
/// has no content and emits nothing.
pub fn parse_lldp_tlvs(interface: &str, output: &str) -> Vec<Record> {
    let mut records = Vec::new();
    let mut header = String::new();

    for line in output.lines() {
        if line.trim().is_empty() {
            continue;
        }
        if !line.starts_with(char::is_whitespace) {
            header = line.replace(" TLV", "").trim().to_string();
            continue;
        }
        if header.is_empty() {
            continue;
        }

        let content = line.trim();
        // MAC addresses contain bare colons, keys are followed by ": "
        match content.split_once(": ") {
            Some((key, value)) if !key.trim().is_empty() => records.push(Record::new(
                "lldp",
                interface,
                format!("{header}/{}", key.trim()),
                value.trim(),
            )),
            _ => records.push(Record::new("lldp", interface, &header, content)),
        }
    }

    records
}
