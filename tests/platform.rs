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

mod common;

use assert_fs::prelude::*;
use assert_fs::TempDir;
use common::{Harness, ScriptedExecutor};
use hardware_detect::domain::services::{cpu, platform};
use hardware_detect::{Record, RecordSet, Value};

const IBSTAT_CARD: &str = "CA 'mlx4_0'
\tCA type: MT4099
\tNumber of ports: 2
\tFirmware version: 2.42.5000
\tHardware version: 1
\tNode GUID: 0xf452140300a1b2c0
\tSystem image GUID: 0xf452140300a1b2c3
";

const IBSTAT_PORT_1: &str = "CA: 'mlx4_0'
Port 1:
\tState: Active
\tPhysical state: LinkUp
\tRate: 40
\tBase lid: 2
\tLMC: 0
\tSM lid: 1
\tCapability mask: 0x02510868
\tPort GUID: 0xf452140300a1b2c1
\tLink layer: InfiniBand
";

fn sequence(records: &RecordSet) -> Vec<Record> {
    records.iter().cloned().collect()
}

#[tokio::test]
async fn test_infiniband_cards_and_ports() {
    let root = TempDir::new().unwrap();
    let commands = ScriptedExecutor::new()
        .on("lspci -d 15b3: -n", "81:00.0 0280: 15b3:1003\n")
        .on("ibstat -l", "mlx4_0\n")
        .on("ibstat mlx4_0 -s", IBSTAT_CARD)
        .on("ibstat mlx4_0 1", IBSTAT_PORT_1);
    let harness = Harness::new(commands, root.path());

    let mut records = RecordSet::new();
    platform::detect_infiniband(&harness.context(), &mut records).await;

    let port_2 = [
        "state",
        "physical_state",
        "rate",
        "base_lid",
        "lmc",
        "sm_lid",
        "port_guid",
    ]
    .into_iter()
    .map(|key| Record::new("infiniband", "card0_port2", key, Value::Null));

    let mut expected = vec![
        Record::new("infiniband", "card0", "card_type", "mlx4_0"),
        Record::new("infiniband", "card0", "device_type", "MT4099"),
        Record::new("infiniband", "card0", "fw_version", "2.42.5000"),
        Record::new("infiniband", "card0", "hw_version", "1"),
        Record::new("infiniband", "card0", "nb_ports", "2"),
        Record::new("infiniband", "card0", "sys_guid", "0xf452140300a1b2c3"),
        Record::new("infiniband", "card0", "node_guid", "0xf452140300a1b2c0"),
        Record::new("infiniband", "card0_port1", "state", "Active"),
        Record::new("infiniband", "card0_port1", "physical_state", "LinkUp"),
        Record::new("infiniband", "card0_port1", "rate", "40"),
        Record::new("infiniband", "card0_port1", "base_lid", "2"),
        Record::new("infiniband", "card0_port1", "lmc", "0"),
        Record::new("infiniband", "card0_port1", "sm_lid", "1"),
        Record::new("infiniband", "card0_port1", "port_guid", "0xf452140300a1b2c1"),
    ];
    // port 2 did not answer
    expected.extend(port_2);

    assert_eq!(sequence(&records), expected);
    assert_eq!(
        harness.commands.calls(),
        vec![
            "lspci -d 15b3: -n",
            "ibstat -l",
            "ibstat mlx4_0 -s",
            "ibstat mlx4_0 1",
            "ibstat mlx4_0 2",
        ]
    );
}

#[tokio::test]
async fn test_no_infiniband_on_ethernet_only_mellanox() {
    let root = TempDir::new().unwrap();
    let commands = ScriptedExecutor::new().on("lspci -d 15b3: -n", "81:00.0 0200: 15b3:1015\n");
    let harness = Harness::new(commands, root.path());

    let mut records = RecordSet::new();
    platform::detect_infiniband(&harness.context(), &mut records).await;

    assert!(records.is_empty());
    assert_eq!(harness.commands.calls(), vec!["lspci -d 15b3: -n"]);
}

#[tokio::test]
async fn test_coretemp_truncated_attribute_names() {
    let root = TempDir::new().unwrap();
    root.child("sys/devices/platform/serial8250/driver_override")
        .write_str("\n")
        .unwrap();
    let coretemp = root.child("sys/devices/platform/coretemp.1");
    coretemp.child("temp10_label").write_str("Core 8\n").unwrap();
    coretemp.child("temp10_input").write_str("41000\n").unwrap();
    coretemp.child("temp10_max").write_str("84000\n").unwrap();
    coretemp.child("temp10_crit").write_str("94000\n").unwrap();
    // the kernel cut "temp10_crit_alarm" to 16 characters
    coretemp.child("temp10_crit_alar").write_str("0\n").unwrap();
    // 16 bytes falls inside a two byte character
    coretemp.child("tempxéééééé_label").write_str("Odd sensor\n").unwrap();
    let harness = Harness::new(ScriptedExecutor::new(), root.path());

    let mut records = RecordSet::new();
    cpu::detect_temperatures(&harness.context(), &mut records).await;

    assert_eq!(
        sequence(&records),
        vec![
            Record::new("cpu", "physical_1", "Core_8/temperature", "41000"),
            Record::new("cpu", "physical_1", "Core_8/max", "84000"),
            Record::new("cpu", "physical_1", "Core_8/critical", "94000"),
            Record::new("cpu", "physical_1", "Core_8/critical_alarm", "0"),
        ]
    );
}
