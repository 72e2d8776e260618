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

//! Hardware RAID controller detectors (Areca, HP Smart Array, LSI MegaRAID)

use super::ProbeContext;
use crate::domain::parsers::{areca, hpacucli, megacli};
use crate::domain::RecordSet;
use crate::ports::SystemCommand;
use log::debug;

const ARECA_CLI: &str = "cli64";
const SMART_ARRAY_CLIS: &[&str] = &["ssacli", "hpssacli", "hpacucli"];
const MEGACLI_CLIS: &[&str] = &["megacli", "MegaCli", "MegaCli64"];

async fn areca_section(ctx: &ProbeContext, args: &[&str]) -> Option<String> {
    let output = ctx.run(&SystemCommand::new(ARECA_CLI).args(args)).await?;
    if areca::is_success(&output) {
        Some(output)
    } else {
        debug!("{ARECA_CLI} {} did not succeed", args.join(" "));
        None
    }
}

/// Areca controllers through `cli64`
pub async fn detect_areca(ctx: &ProbeContext, records: &mut RecordSet) {
    let Some(output) = areca_section(ctx, &["sys", "info"]).await else {
        debug!("No Areca controller found");
        return;
    };
    records.extend(areca::parse_info("system", &output));
    if let Some(output) = areca_section(ctx, &["hw", "info"]).await {
        records.extend(areca::parse_info("hardware", &output));
    }
    if let Some(output) = areca_section(ctx, &["disk", "info"]).await {
        let (disks, count) = areca::parse_disk_info(&output);
        records.extend(disks);
        if count > 0 {
            records.push("disk", "areca", "count", count.to_string());
        }
    }
}

/// HP Smart Array controllers through `ssacli` or its predecessors
pub async fn detect_smart_array(ctx: &ProbeContext, records: &mut RecordSet) {
    let Some((cli, output)) = ctx.run_first(SMART_ARRAY_CLIS, &["ctrl", "all", "show"]).await
    else {
        debug!("No HP Smart Array CLI found");
        return;
    };
    let controllers = hpacucli::parse_controllers(&output);
    if controllers.is_empty() {
        debug!("{cli} reports no controller");
        return;
    }

    let mut disk_count = 0;
    for controller in &controllers {
        let selector = controller.selector();

        if let Some(detail) = ctx
            .run(&SystemCommand::new(cli).args(&["ctrl", &selector, "show", "detail"]))
            .await
        {
            records.extend(hpacucli::controller_detail_records(controller, &detail));
        }

        if let Some(drives) = ctx
            .run(&SystemCommand::new(cli).args(&["ctrl", &selector, "pd", "all", "show"]))
            .await
        {
            for disk in hpacucli::parse_physical_drives(&drives) {
                disk_count += 1;
                records.extend(hpacucli::physical_drive_records(controller, &disk));
            }
        }

        if let Some(logical) = ctx
            .run(&SystemCommand::new(cli).args(&["ctrl", &selector, "ld", "all", "show"]))
            .await
        {
            records.extend(hpacucli::logical_drive_records(controller, &logical));
        }
    }

    records.push("disk", "hpa", "count", disk_count.to_string());
}

async fn run_megacli(ctx: &ProbeContext, cli: &str, args: &[&str]) -> Option<String> {
    ctx.run(&SystemCommand::new(cli).args(args)).await
}

/// LSI MegaRAID controllers through `megacli`
pub async fn detect_megaraid(ctx: &ProbeContext, records: &mut RecordSet) {
    let Some((cli, output)) = ctx.run_first(MEGACLI_CLIS, &["-adpCount"]).await else {
        debug!("No MegaRAID CLI found");
        return;
    };

    let controller_count = megacli::parse_adapter_count(&output);
    if controller_count <= 0 {
        debug!("{cli} reports no controller");
        return;
    }

    let mut disk_count = 0;
    let mut total_size = 0.0;

    for ctrl in 0..controller_count as usize {
        let adapter = format!("-a{ctrl}");

        if let Some(output) = run_megacli(ctx, cli, &["-AdpAllInfo", &adapter]).await {
            let info = megacli::parse_megacli_output(&output);
            records.extend(megacli::controller_records(ctrl, &info));
        }

        let enclosures = run_megacli(ctx, cli, &["-EncInfo", &adapter])
            .await
            .map(|output| megacli::parse_enclosures(&output))
            .unwrap_or_default();

        for enclosure in &enclosures {
            records.extend(megacli::enclosure_records(enclosure));

            let device_id = enclosure.get_int("DeviceId").unwrap_or_default();
            let slots = enclosure.get_int("NumberOfSlots").unwrap_or_default();
            for slot in 0..slots {
                let drive = format!("-PhysDrv[{device_id}:{slot}]");
                let Some(output) = run_megacli(ctx, cli, &["-pdInfo", &drive, &adapter]).await
                else {
                    continue;
                };
                let info = megacli::parse_megacli_output(&output);
                if let Some((drive_records, size)) =
                    megacli::physical_drive_records(ctrl, slot, &info)
                {
                    disk_count += 1;
                    total_size += size;
                    records.extend(drive_records);
                }
            }
        }

        if total_size > 0.0 {
            records.push("pdisk", "all", "size", format!("{total_size:.2}"));
        }

        let logical_count = run_megacli(ctx, cli, &["-LDGetNum", &adapter])
            .await
            .map(|output| megacli::parse_logical_drive_count(&output, ctrl))
            .unwrap_or(0);
        for ld in 0..logical_count {
            let drive = format!("-L{ld}");
            if let Some(output) = run_megacli(ctx, cli, &["-LDInfo", &drive, &adapter]).await {
                let info = megacli::parse_megacli_output(&output);
                records.extend(megacli::logical_drive_records(ld, &info));
            }
        }
    }

    if disk_count > 0 {
        records.push("disk", "megaraid", "count", disk_count.to_string());
    }
}
