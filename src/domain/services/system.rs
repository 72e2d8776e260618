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

//! System detector: lshw inventory, identity, network interfaces and OS

use super::{cpu, ProbeContext};
use crate::domain::parsers::network::{
    netmask_records, parse_ethtool_features, parse_ip_link_address, parse_lldp_tlvs,
};
use crate::domain::parsers::system::{
    fix_bad_serial, nic_id, parse_os_description, parse_system_uuid,
};
use crate::domain::parsers::{output_lines, parse_lshw_xml, LshwNetwork};
use crate::domain::{DetectError, RecordSet, Value};
use crate::ports::SystemCommand;
use log::{info, warn};

const PRODUCT_UUID: &str = "/sys/class/dmi/id/product_uuid";

/// System UUID from sysfs, falling back to dmidecode
async fn system_uuid(ctx: &ProbeContext) -> Option<String> {
    if let Some(uuid) = ctx.read(PRODUCT_UUID).await.and_then(|raw| parse_system_uuid(&raw)) {
        return Some(uuid);
    }
    let output = ctx
        .run(&SystemCommand::new("dmidecode").args(&["-s", "system-uuid"]))
        .await?;
    parse_system_uuid(&output)
}

/// Records of one interface; returns the serial that was reported
async fn detect_interface(
    ctx: &ProbeContext,
    network: &LshwNetwork,
    records: &mut RecordSet,
) -> Option<String> {
    let name = network.name.as_str();
    records.extend(network.identity.iter().cloned());

    if let Some(ipv4) = &network.ipv4 {
        match ctx.interfaces().netmask(name).await {
            Ok(netmask) => records.extend(netmask_records(name, ipv4, &netmask)),
            Err(e) => warn!("Unable to get the netmask of {name}: {e}"),
        }
    }

    records.extend(network.link.iter().cloned());

    // lshw truncates InfiniBand hardware addresses
    let serial = if network.is_infiniband() {
        ctx.run(&SystemCommand::new("ip").args(&["addr", "show", name]))
            .await
            .and_then(|output| parse_ip_link_address(&output))
            .map(Value::from)
    } else {
        network.serial.clone()
    };
    let reported = serial.as_ref().and_then(Value::to_text);
    if let Some(serial) = serial {
        records.push("network", name, "serial", serial);
    }

    if let Some(output) = ctx
        .run(&SystemCommand::new("ethtool").args(&["-k", name]))
        .await
    {
        records.extend(parse_ethtool_features(name, &output));
    }
    if let Some(output) = ctx
        .run(&SystemCommand::new("lldptool").args(&["-t", "-n", "-i", name]))
        .await
    {
        records.extend(parse_lldp_tlvs(name, &output));
    }

    reported
}

async fn push_command_lines(
    ctx: &ProbeContext,
    records: &mut RecordSet,
    id: &str,
    key: &str,
    command: SystemCommand,
) {
    if let Some(output) = ctx.run(&command).await {
        for line in output_lines(&output) {
            records.push("system", id, key, line);
        }
    }
}

/// Operating system and kernel identity
async fn detect_os(ctx: &ProbeContext, records: &mut RecordSet) {
    push_command_lines(
        ctx,
        records,
        "os",
        "vendor",
        SystemCommand::new("lsb_release").args(&["-is"]),
    )
    .await;

    if let Some(output) = ctx
        .run(&SystemCommand::new("lsb_release").args(&["-ds"]))
        .await
    {
        for line in parse_os_description(&output) {
            records.push("system", "os", "version", line);
        }
    }

    push_command_lines(
        ctx,
        records,
        "kernel",
        "version",
        SystemCommand::new("uname").args(&["-r"]),
    )
    .await;
    push_command_lines(
        ctx,
        records,
        "kernel",
        "arch",
        SystemCommand::new("uname").args(&["-i"]),
    )
    .await;

    if let Some(cmdline) = ctx.read("/proc/cmdline").await {
        for line in output_lines(&cmdline) {
            records.push("system", "kernel", "cmdline", line);
        }
    }
}

/// Detect the system from `lshw -xml`, then CPUs and OS
///
/// This is the only mandatory detector: failing to run or parse lshw, or
/// lscpu missing its socket or CPU counts, aborts the whole run.
pub async fn detect_system(
    ctx: &ProbeContext,
    records: &mut RecordSet,
) -> Result<(), DetectError> {
    let output = ctx
        .output(&SystemCommand::new("lshw").args(&["-xml"]))
        .await
        .ok_or_else(|| DetectError::SystemDetectionFailed("Unable to run lshw".to_string()))?;
    if !output.success {
        return Err(DetectError::SystemDetectionFailed(format!(
            "Unable to run lshw: {}",
            output.stderr.trim()
        )));
    }
    let system = parse_lshw_xml(&output.stdout).map_err(DetectError::SystemDetectionFailed)?;

    records.extend(system.product.iter().cloned());

    let uuid = system_uuid(ctx).await.unwrap_or_default();
    if !uuid.is_empty() {
        records.push("system", "product", "uuid", uuid.as_str());
    }

    records.extend(system.hardware.iter().cloned());

    let mut first_nic = String::new();
    for network in &system.networks {
        let serial = detect_interface(ctx, network, records).await;
        if first_nic.is_empty() {
            first_nic = serial.map(|s| nic_id(&s)).unwrap_or_default();
        }
    }

    if fix_bad_serial(records, &uuid, &system.motherboard_serial, &first_nic) {
        info!("Replaced placeholder system serial");
    }

    cpu::detect_cpus(ctx, records).await?;
    detect_os(ctx, records).await;

    Ok(())
}
