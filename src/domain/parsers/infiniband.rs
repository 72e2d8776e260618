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

//! InfiniBand (`lspci`, `ibstat`) parsing

use super::common::{lookup, parse_key_value_lines};
use crate::domain::{Record, Value};

/// PCI class of InfiniBand controllers (plain ethernet is 0200)
pub const INFINIBAND_PCI_CLASS: &str = "0280";

/// Whether `lspci -d 15b3: -n` lists an InfiniBand controller
pub fn has_infiniband_controller(lspci_output: &str) -> bool {
    lspci_output
        .lines()
        .filter_map(|line| line.split_whitespace().nth(1))
        .any(|class| class.contains(INFINIBAND_PCI_CLASS))
}

/// Card names from `ibstat -l`
pub fn parse_card_list(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Global card information from `ibstat <card> -s`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IbCardInfo {
    pub device_type: Option<String>,
    pub nb_ports: Option<String>,
    pub fw_version: Option<String>,
    pub hw_version: Option<String>,
    pub sys_guid: Option<String>,
    pub node_guid: Option<String>,
}

impl IbCardInfo {
    /// Number of ports, zero when unknown
    pub fn port_count(&self) -> u32 {
        self.nb_ports
            .as_deref()
            .and_then(|n| n.parse().ok())
            .unwrap_or(0)
    }

    pub fn records(&self, card_index: usize, card_type: &str) -> Vec<Record> {
        let id = format!("card{card_index}");
        vec![
            Record::new("infiniband", &id, "card_type", card_type),
            Record::new("infiniband", &id, "device_type", self.device_type.clone()),
            Record::new("infiniband", &id, "fw_version", self.fw_version.clone()),
            Record::new("infiniband", &id, "hw_version", self.hw_version.clone()),
            Record::new("infiniband", &id, "nb_ports", self.nb_ports.clone()),
            Record::new("infiniband", &id, "sys_guid", self.sys_guid.clone()),
            Record::new("infiniband", &id, "node_guid", self.node_guid.clone()),
        ]
    }
}

fn field(pairs: &[(String, String)], key: &str) -> Option<String> {
    lookup(pairs, key).map(str::to_string)
}

pub fn parse_card_info(output: &str) -> IbCardInfo {
    let pairs = parse_key_value_lines(output);
    IbCardInfo {
        device_type: field(&pairs, "CA type"),
        nb_ports: field(&pairs, "Number of ports"),
        fw_version: field(&pairs, "Firmware version"),
        hw_version: field(&pairs, "Hardware version"),
        sys_guid: field(&pairs, "System image GUID"),
        node_guid: field(&pairs, "Node GUID"),
    }
}

const PORT_KEYS: &[(&str, &str)] = &[
    ("State", "state"),
    ("Physical state", "physical_state"),
    ("Rate", "rate"),
    ("Base lid", "base_lid"),
    ("LMC", "lmc"),
    ("SM lid", "sm_lid"),
    ("Port GUID", "port_guid"),
];

/// Port records from `ibstat <card> <port>`
pub fn parse_port_info(output: &str, card_index: usize, port: u32) -> Vec<Record> {
    let pairs = parse_key_value_lines(output);
    let id = format!("card{card_index}_port{port}");

    PORT_KEYS
        .iter()
        .map(|(label, key)| {
            Record::new(
                "infiniband",
                &id,
                *key,
                Value::from(lookup(&pairs, label)),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_infiniband_controller() {
        assert!(has_infiniband_controller("81:00.0 0280: 15b3:1003\n"));
        assert!(!has_infiniband_controller("81:00.0 0200: 15b3:1015\n"));
        assert!(!has_infiniband_controller(""));
    }

    #[test]
    fn test_parse_card_info() {
        let output = "CA 'mlx4_0'
\tCA type: MT4099
\tNumber of ports: 2
\tFirmware version: 2.42.5000
\tHardware version: 1
\tNode GUID: 0xf452140300a1b2c0
\tSystem image GUID: 0xf452140300a1b2c3
";
        let info = parse_card_info(output);
        assert_eq!(info.port_count(), 2);

        let records = info.records(0, "mlx4_0");
        assert_eq!(records[0], Record::new("infiniband", "card0", "card_type", "mlx4_0"));
        assert_eq!(records[1], Record::new("infiniband", "card0", "device_type", "MT4099"));
        assert_eq!(
            records[5],
            Record::new("infiniband", "card0", "sys_guid", "0xf452140300a1b2c3")
        );
    }

    #[test]
    fn test_parse_port_info() {
        let output = "Port 1:
\tState: Active
\tPhysical state: LinkUp
\tRate: 56
\tBase lid: 12
\tLMC: 0
\tSM lid: 1
\tCapability mask: 0x02514868
\tPort GUID: 0xf452140300a1b2c1
\tLink layer: InfiniBand
";
        let records = parse_port_info(output, 0, 1);
        assert_eq!(records.len(), 7);
        assert_eq!(records[0], Record::new("infiniband", "card0_port1", "state", "Active"));
        assert_eq!(records[2], Record::new("infiniband", "card0_port1", "rate", "56"));
        assert_eq!(
            records[6],
            Record::new("infiniband", "card0_port1", "port_guid", "0xf452140300a1b2c1")
        );
    }
}
