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

//! `lshw -xml` parsing
//!
//! The parser is pure: it turns the XML tree into ordered records plus the
//! per-interface data the detection service still has to enrich (netmask,
//! offload features, LLDP) before emitting.

use crate::domain::{Record, Value};
use roxmltree::{Document, Node, ParsingOptions};

/// Network interface found in the lshw tree
#[derive(Debug, Clone, PartialEq)]
pub struct LshwNetwork {
    /// Logical name (`eth0`, `ib0`, ...)
    pub name: String,
    /// businfo, vendor, product, firmware, size and ipv4 records
    pub identity: Vec<Record>,
    /// Configured IPv4 address, if any
    pub ipv4: Option<String>,
    /// link, driver, duplex, speed, latency and autonegotiation records
    pub link: Vec<Record>,
    /// Lower-cased hardware address reported by lshw
    pub serial: Option<Value>,
}

impl LshwNetwork {
    /// InfiniBand interfaces get a truncated hardware address from lshw
    pub fn is_infiniband(&self) -> bool {
        self.name.starts_with("ib")
    }
}

/// Everything the system detector needs out of `lshw -xml`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LshwSystem {
    /// `system/product/*` records
    pub product: Vec<Record>,
    /// Motherboard, firmware and memory records
    pub hardware: Vec<Record>,
    /// First motherboard serial number, empty when unknown
    pub motherboard_serial: String,
    /// Network interfaces in document order
    pub networks: Vec<LshwNetwork>,
}

const NETWORK_IDENTITY: &[(&str, &str)] = &[
    ("businfo", "businfo"),
    ("vendor", "vendor"),
    ("product", "product"),
];

const NETWORK_LINK: &[&str] = &[
    "link",
    "driver",
    "duplex",
    "speed",
    "latency",
    "autonegotiation",
];

const MEMORY_BANK_FIELDS: &[&str] = &[
    "size",
    "clock",
    "description",
    "vendor",
    "product",
    "serial",
    "slot",
];

fn element_child<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|child| child.is_element() && child.tag_name().name() == tag)
}

/// Text of a child element; present but empty elements give `Null`
fn child_value(node: Node, tag: &str) -> Option<Value> {
    element_child(node, tag).map(|child| match child.text() {
        Some(text) => Value::from(text),
        None => Value::Null,
    })
}

/// `configuration/setting[@id=<id>]/@value`
fn setting_value(node: Node, id: &str) -> Option<Value> {
    let configuration = element_child(node, "configuration")?;
    configuration
        .children()
        .find(|setting| {
            setting.is_element()
                && setting.tag_name().name() == "setting"
                && setting.attribute("id") == Some(id)
        })
        .and_then(|setting| setting.attribute("value"))
        .map(Value::from)
}

fn push_child(records: &mut Vec<Record>, node: Node, tag: &str, class: &str, id: &str, key: &str) {
    if let Some(value) = child_value(node, tag) {
        records.push(Record::new(class, id, key, value));
    }
}

/// Element descendants of `node`, excluding `node` itself
fn descendants_of<'a, 'input: 'a>(
    node: Node<'a, 'input>,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    node.descendants()
        .skip(1)
        .filter(|n| n.is_element() && n.tag_name().name() == "node")
}

/// Parse the output of `lshw -xml`
///
/// The root may either be a `<list>` wrapping the system node (current lshw)
/// or the system `<node>` itself (older releases).
pub fn parse_lshw_xml(xml: &str) -> Result<LshwSystem, String> {
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    let doc = Document::parse_with_options(xml, options)
        .map_err(|e| format!("Invalid lshw XML: {e}"))?;
    let root = doc.root_element();

    let system = if root.tag_name().name() == "node" {
        root
    } else {
        element_child(root, "node").ok_or_else(|| "No system node in lshw output".to_string())?
    };

    let mut result = LshwSystem::default();

    push_child(&mut result.product, system, "serial", "system", "product", "serial");
    push_child(&mut result.product, system, "product", "system", "product", "name");
    push_child(&mut result.product, system, "vendor", "system", "product", "vendor");
    push_child(&mut result.product, system, "version", "system", "product", "version");

    for core in descendants_of(root).filter(|n| n.attribute("id") == Some("core")) {
        if element_child(core, "physid").is_none() {
            continue;
        }
        let hw = &mut result.hardware;
        push_child(hw, core, "product", "system", "motherboard", "name");
        push_child(hw, core, "vendor", "system", "motherboard", "vendor");
        push_child(hw, core, "version", "system", "motherboard", "version");
        push_child(hw, core, "serial", "system", "motherboard", "serial");

        if result.motherboard_serial.is_empty() {
            if let Some(serial) = child_value(core, "serial").and_then(|v| v.to_text()) {
                result.motherboard_serial = serial;
            }
        }
    }

    for firmware in descendants_of(root).filter(|n| n.attribute("id") == Some("firmware")) {
        if element_child(firmware, "physid").is_none() {
            continue;
        }
        let hw = &mut result.hardware;
        push_child(hw, firmware, "version", "firmware", "bios", "version");
        push_child(hw, firmware, "date", "firmware", "bios", "date");
        push_child(hw, firmware, "vendor", "firmware", "bios", "vendor");
    }

    let bank_count = parse_memory(root, &mut result.hardware);
    if bank_count > 0 {
        result
            .hardware
            .push(Record::new("memory", "banks", "count", bank_count.to_string()));
    }

    for network in descendants_of(root).filter(|n| n.attribute("class") == Some("network")) {
        let Some(name) = element_child(network, "logicalname").and_then(|n| n.text()) else {
            continue;
        };
        result.networks.push(parse_network(network, name));
    }

    Ok(result)
}

fn parse_memory(root: Node, records: &mut Vec<Record>) -> usize {
    let mut bank_count = 0;

    for memory in descendants_of(root).filter(|n| n.attribute("class") == Some("memory")) {
        let id = memory.attribute("id").unwrap_or_default();
        let Some(suffix) = id.strip_prefix("memory") else {
            continue;
        };
        // "memory:1" gives ":1", plain "memory" gives ""
        let location = if suffix.starts_with(':') { suffix } else { "" };

        if element_child(memory, "physid").is_none() {
            continue;
        }
        push_child(records, memory, "size", "memory", "total", "size");

        for bank_node in descendants_of(memory) {
            let Some(bank_id) = bank_node.attribute("id") else {
                continue;
            };
            if !bank_id.contains("bank:") {
                continue;
            }
            bank_count += 1;

            let label = bank_id.replace("bank:", &format!("bank{location}:"));
            for bank in descendants_of(memory).filter(|n| n.attribute("id") == Some(bank_id)) {
                for field in MEMORY_BANK_FIELDS {
                    push_child(records, bank, field, "memory", &label, field);
                }
            }
        }
    }

    bank_count
}

fn parse_network(node: Node, name: &str) -> LshwNetwork {
    let mut identity = Vec::new();
    for (tag, key) in NETWORK_IDENTITY {
        push_child(&mut identity, node, tag, "network", name, key);
    }
    if let Some(firmware) = setting_value(node, "firmware") {
        identity.push(Record::new("network", name, "firmware", firmware));
    }
    push_child(&mut identity, node, "size", "network", name, "size");

    let ipv4 = setting_value(node, "ip");
    if let Some(ip) = &ipv4 {
        identity.push(Record::new("network", name, "ipv4", ip.clone()));
    }

    let link = NETWORK_LINK
        .iter()
        .filter_map(|setting| {
            setting_value(node, setting).map(|value| Record::new("network", name, *setting, value))
        })
        .collect();

    let serial = child_value(node, "serial").map(|value| match value {
        Value::Str(mac) => Value::Str(mac.to_lowercase()),
        other => other,
    });

    LshwNetwork {
        name: name.to_string(),
        identity,
        ipv4: ipv4.and_then(|v| v.to_text()),
        link,
        serial,
    }
}
