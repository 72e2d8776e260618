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

//! CPU, NUMA and coretemp detectors

use super::ProbeContext;
use crate::domain::parsers::cpu::{
    coretemp_socket, hwmon_label, numa_records, parse_lscpu, socket_records, LscpuInfo,
    HWMON_ATTRIBUTES, HWMON_NAME_MAX,
};
use crate::domain::{DetectError, RecordSet};
use crate::ports::SystemCommand;
use log::warn;

const SYS_CPU: &str = "/sys/devices/system/cpu";
const PLATFORM: &str = "/sys/devices/platform";

async fn lscpu(ctx: &ProbeContext, args: &[&str]) -> LscpuInfo {
    let command = SystemCommand::new("lscpu")
        .args(args)
        .env("LANG", "en_US.UTF-8");
    let output = ctx.run(&command).await.unwrap_or_default();
    parse_lscpu(&output)
}

/// Scaling governor of a logical CPU, trying the policy interface first
async fn governor(ctx: &ProbeContext, cpu: i64) -> Option<String> {
    if let Some(governor) = ctx
        .read_line(&format!("{SYS_CPU}/cpufreq/policy{cpu}/scaling_governor"))
        .await
    {
        return Some(governor);
    }
    // kernels older than 4.3
    ctx.read_line(&format!("{SYS_CPU}/cpu{cpu}/cpufreq/scaling_governor"))
        .await
}

/// CPU sockets, logical CPUs and NUMA nodes from lscpu and sysfs
pub async fn detect_cpus(ctx: &ProbeContext, records: &mut RecordSet) -> Result<(), DetectError> {
    let info = lscpu(ctx, &[]).await;
    let info_x = lscpu(ctx, &["-x"]).await;

    let sockets = info.sockets().map_err(DetectError::SystemDetectionFailed)?;
    let logical = info.logical_cpus().map_err(DetectError::SystemDetectionFailed)?;

    records.push("cpu", "physical", "number", sockets);

    if let Some(smt) = ctx.read_line(&format!("{SYS_CPU}/smt/control")).await {
        records.push("cpu", "physical", "smt", smt);
    }

    let boost = ctx
        .read_line(&format!("{SYS_CPU}/cpufreq/boost"))
        .await
        .map(|value| if value == "1" { "enabled" } else { "disabled" });

    for socket in 0..sockets {
        let ptag = format!("physical_{socket}");
        if let Some(boost) = boost {
            records.push("cpu", &ptag, "boost", boost);
        }
        records.extend(socket_records(&info, &ptag));
    }

    records.push("cpu", "logical", "number", logical);
    for cpu in 0..logical {
        if let Some(governor) = governor(ctx, cpu).await {
            records.push("cpu", format!("logical_{cpu}"), "governor", governor);
        }
    }

    if let Some(count) = info.numa_node_count() {
        records.push("numa", "nodes", "count", count);
    }
    records.extend(numa_records(&info, &info_x));

    Ok(())
}

/// Path of a coretemp attribute, trying the truncated name some kernels use
async fn hwmon_path(ctx: &ProbeContext, device: &str, attribute: &str) -> Option<String> {
    let path = format!("{PLATFORM}/{device}/{attribute}");
    if ctx.files().is_file(&path).await {
        return Some(path);
    }
    let truncated = attribute
        .get(..HWMON_NAME_MAX)
        .filter(|truncated| truncated.len() < attribute.len())?;
    let path = format!("{PLATFORM}/{device}/{truncated}");
    if ctx.files().is_file(&path).await {
        return Some(path);
    }
    None
}

/// Temperatures of every `coretemp.<N>` device
pub async fn detect_temperatures(ctx: &ProbeContext, records: &mut RecordSet) {
    for device in ctx.list(PLATFORM).await {
        let Some(socket) = coretemp_socket(&device) else {
            continue;
        };
        let ptag = format!("physical_{socket}");

        for entry in ctx.list(&format!("{PLATFORM}/{device}")).await {
            let Some(sensor) = entry
                .strip_suffix("_label")
                .filter(|sensor| sensor.starts_with("temp"))
            else {
                continue;
            };
            let Some(label) = ctx.read_line(&format!("{PLATFORM}/{device}/{entry}")).await else {
                warn!("Cannot read the label of {device}/{sensor}");
                continue;
            };
            let label = hwmon_label(&label);

            for (suffix, key) in HWMON_ATTRIBUTES {
                let attribute = format!("{sensor}_{suffix}");
                let Some(path) = hwmon_path(ctx, &device, &attribute).await else {
                    warn!("No entry found for {label}/{key}");
                    continue;
                };
                if let Some(value) = ctx.read_line(&path).await {
                    records.push("cpu", &ptag, format!("{label}/{key}"), value);
                }
            }
        }
    }
}
