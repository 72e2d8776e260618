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

//! IPMI detectors

use super::ProbeContext;
use crate::domain::parsers::ipmi::{is_volatile_channel, parse_lan_print, parse_sdr_csv};
use crate::domain::RecordSet;
use crate::ports::SystemCommand;
use log::info;

const IPMI_MODULES: &[&str] = &["ipmi_smb", "ipmi_si", "ipmi_devintf"];
const IPMI_DEVICES: &[&str] = &["/dev/ipmi0", "/dev/ipmi/0", "/dev/ipmidev/0"];
const IPMI_CHANNELS: u32 = 16;

async fn modprobe(ctx: &ProbeContext, module: &str) {
    if ctx
        .run(&SystemCommand::new("modprobe").args(&[module]))
        .await
        .is_none()
    {
        info!("Probing {module} failed");
    }
}

async fn has_ipmi_device(ctx: &ProbeContext) -> bool {
    for device in IPMI_DEVICES {
        if ctx.files().exists(device).await {
            return true;
        }
    }
    false
}

/// IPMI channel and LAN configuration
///
/// Without a device node, a `FAKEIPMI` kernel argument yields a fake channel.
pub async fn detect_ipmi(ctx: &ProbeContext, records: &mut RecordSet) {
    for module in IPMI_MODULES {
        modprobe(ctx, module).await;
    }

    if has_ipmi_device(ctx).await {
        for channel in 0..IPMI_CHANNELS {
            let channel_arg = channel.to_string();
            let command = SystemCommand::new("ipmitool").args(&["channel", "info", &channel_arg]);
            let Some(output) = ctx.output(&command).await else {
                break;
            };
            if is_volatile_channel(&output.stdout) || is_volatile_channel(&output.stderr) {
                records.push("system", "ipmi", "channel", channel.to_string());
                break;
            }
        }

        if let Some(output) = ctx
            .run(&SystemCommand::new("ipmitool").args(&["lan", "print"]))
            .await
        {
            records.extend(parse_lan_print(&output));
        }
        return;
    }

    let fake = ctx
        .read("/proc/cmdline")
        .await
        .is_some_and(|cmdline| cmdline.to_lowercase().contains("fakeipmi"));
    if fake {
        records.push("system", "ipmi-fake", "channel", "0");
        info!("Added fake IPMI device");
    } else {
        info!("No IPMI device found");
    }
}

/// Sensor readings from `ipmitool -c sdr`
pub async fn detect_ipmi_sdr(ctx: &ProbeContext, records: &mut RecordSet) {
    if let Some(output) = ctx
        .run(&SystemCommand::new("ipmitool").args(&["-c", "sdr"]))
        .await
    {
        records.extend(parse_sdr_csv(&output));
    }
}
