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

//! Platform detectors: InfiniBand, DDR timings, RTC, auxiliary vector, dmesg

use super::ProbeContext;
use crate::domain::parsers::infiniband::{
    has_infiniband_controller, parse_card_info, parse_card_list, parse_port_info,
};
use crate::domain::parsers::kernel::{parse_auxv, parse_dmesg, parse_rtc_utc};
use crate::domain::parsers::memory::parse_ddr_timings;
use crate::domain::{RecordSet, Value};
use crate::ports::SystemCommand;
use log::info;

/// Mellanox PCI vendor id
const MELLANOX_VENDOR: &str = "15b3:";

/// InfiniBand cards and ports through `ibstat`
pub async fn detect_infiniband(ctx: &ProbeContext, records: &mut RecordSet) {
    let present = ctx
        .run(&SystemCommand::new("lspci").args(&["-d", MELLANOX_VENDOR, "-n"]))
        .await
        .is_some_and(|output| has_infiniband_controller(&output));
    if !present {
        info!("No Infiniband device found");
        return;
    }

    let cards = ctx
        .run(&SystemCommand::new("ibstat").args(&["-l"]))
        .await
        .map(|output| parse_card_list(&output))
        .unwrap_or_default();

    for (index, card) in cards.iter().enumerate() {
        let info = ctx
            .run(&SystemCommand::new("ibstat").args(&[card, "-s"]))
            .await
            .map(|output| parse_card_info(&output))
            .unwrap_or_default();
        records.extend(info.records(index, card));

        for port in 1..=info.port_count() {
            let port_arg = port.to_string();
            let output = ctx
                .run(&SystemCommand::new("ibstat").args(&[card, &port_arg]))
                .await
                .unwrap_or_default();
            records.extend(parse_port_info(&output, index, port));
        }
    }
}

/// Memory controller timings from the `ddr-timings-<arch>` helper
pub async fn detect_ddr_timings(ctx: &ProbeContext, records: &mut RecordSet) {
    let helper = format!("ddr-timings-{}", std::env::consts::ARCH);
    if let Some(output) = ctx.run(&SystemCommand::new(&helper)).await {
        records.extend(parse_ddr_timings(&output));
    }
}

/// Whether the hardware clock keeps UTC; `null` when timedatectl cannot tell
pub async fn detect_rtc(ctx: &ProbeContext, records: &mut RecordSet) {
    let utc = ctx
        .run(&SystemCommand::new("timedatectl"))
        .await
        .and_then(|output| parse_rtc_utc(&output));
    records.push("system", "rtc", "utc", Value::from(utc));
}

/// ELF auxiliary vector as shown by the dynamic loader
pub async fn detect_auxv(ctx: &ProbeContext, records: &mut RecordSet) {
    let command = SystemCommand::new("/bin/true").env("LD_SHOW_AUXV", "1");
    if let Some(output) = ctx.run(&command).await {
        records.extend(parse_auxv(&output));
    }
}

/// AHCI flags and SATA link speeds from the kernel ring buffer
pub async fn detect_dmesg(ctx: &ProbeContext, records: &mut RecordSet) {
    if let Some(output) = ctx.run(&SystemCommand::new("dmesg")).await {
        records.extend(parse_dmesg(&output));
    }
}
