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

//! ipmitool output parsing

use super::common::parse_key_value_lines;
use crate::domain::Record;

/// `ipmitool lan print` labels and the keys they are stored under
const LAN_KEYS: &[(&str, &str)] = &[
    ("IP Address Source", "ip-addr-source"),
    ("IP Address", "ip-addr"),
    ("Subnet Mask", "subnet-mask"),
    ("MAC Address", "mac-addr"),
    ("Default Gateway IP", "default-gateway-ip"),
    ("802.1q VLAN ID", "vlan"),
];

/// Whether `ipmitool channel info <n>` describes a usable channel
pub fn is_volatile_channel(output: &str) -> bool {
    output.contains("Volatile")
}

/// Parse `ipmitool lan print` into `ipmi/lan/*` records, in output order
pub fn parse_lan_print(output: &str) -> Vec<Record> {
    parse_key_value_lines(output)
        .into_iter()
        .filter_map(|(label, value)| {
            LAN_KEYS
                .iter()
                .find(|(known, _)| *known == label)
                .map(|(_, key)| Record::new("ipmi", "lan", *key, value))
        })
        .collect()
}

/// Parse `ipmitool -c sdr` into `ipmi/<sensor>/{value,unit}` records
pub fn parse_sdr_csv(output: &str) -> Vec<Record> {
    let mut records = Vec::new();

    for line in output.lines() {
        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() < 3 {
            continue;
        }
        let sensor = fields[0].trim();
        if sensor.is_empty() {
            continue;
        }
        records.push(Record::new("ipmi", sensor, "value", fields[1].trim()));
        records.push(Record::new("ipmi", sensor, "unit", fields[2].trim()));
    }

    records
}

#[cfg(test)]
mod tests {
    use super::*;

    const LAN_PRINT: &str = "Set in Progress         : Set Complete
Auth Type Support       : NONE MD2 MD5 PASSWORD
IP Address Source       : Static Address
IP Address              : 10.0.0.15
Subnet Mask             : 255.255.255.0
MAC Address             : 0c:c4:7a:aa:bb:cc
SNMP Community String   : public
Default Gateway IP      : 10.0.0.1
Default Gateway MAC     : 00:00:00:00:00:00
802.1q VLAN ID          : Disabled
";

    #[test]
    fn test_parse_lan_print() {
        assert_eq!(
            parse_lan_print(LAN_PRINT),
            vec![
                Record::new("ipmi", "lan", "ip-addr-source", "Static Address"),
                Record::new("ipmi", "lan", "ip-addr", "10.0.0.15"),
                Record::new("ipmi", "lan", "subnet-mask", "255.255.255.0"),
                Record::new("ipmi", "lan", "mac-addr", "0c:c4:7a:aa:bb:cc"),
                Record::new("ipmi", "lan", "default-gateway-ip", "10.0.0.1"),
                Record::new("ipmi", "lan", "vlan", "Disabled"),
            ]
        );
    }

    #[test]
    fn test_parse_sdr_csv() {
        let output = "CPU1 Temp,45,degrees C,ok\nFAN1,3600,RPM,ok\nbroken line\n";
        assert_eq!(
            parse_sdr_csv(output),
            vec![
                Record::new("ipmi", "CPU1 Temp", "value", "45"),
                Record::new("ipmi", "CPU1 Temp", "unit", "degrees C"),
                Record::new("ipmi", "FAN1", "value", "3600"),
                Record::new("ipmi", "FAN1", "unit", "RPM"),
            ]
        );
    }

    #[test]
    fn test_is_volatile_channel() {
        assert!(is_volatile_channel(
            "Channel 0x1 info:\n  Volatile(active) Settings\n    Alerting : enabled\n"
        ));
        assert!(!is_volatile_channel("Get Channel Info command failed\n"));
    }
}
