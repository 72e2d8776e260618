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

//! Block device detector

use super::ProbeContext;
use crate::domain::parsers::storage::{
    cache_type_records, disk_size_gb, is_disk_name, link_target_name, parse_scheduler,
    DISK_ATTRIBUTES,
};
use crate::domain::RecordSet;

const SYS_BLOCK: &str = "/sys/block";
const DISK_BY_ID: &str = "/dev/disk/by-id";

/// Disks worth reporting with their size in GB, in `/sys/block` order
pub async fn list_disks(ctx: &ProbeContext) -> Vec<(String, u64)> {
    let mut disks = Vec::new();

    for name in ctx.list(SYS_BLOCK).await {
        if !is_disk_name(&name) {
            continue;
        }
        let size = ctx
            .read_line(&format!("{SYS_BLOCK}/{name}/size"))
            .await
            .and_then(|sectors| disk_size_gb(&sectors))
            .unwrap_or(0);
        if size > 0 {
            disks.push((name, size));
        }
    }

    disks
}

/// `/dev/disk/by-id` entries grouped by the disk they point to
async fn disk_ids(ctx: &ProbeContext) -> Vec<(String, String)> {
    let mut ids = Vec::new();
    for entry in ctx.list(DISK_BY_ID).await {
        if let Ok(target) = ctx.files().read_link(&format!("{DISK_BY_ID}/{entry}")).await {
            ids.push((link_target_name(&target).to_string(), entry));
        }
    }
    ids
}

/// Disks under `/sys/block`
pub async fn detect_disks(ctx: &ProbeContext, records: &mut RecordSet) {
    let disks = list_disks(ctx).await;
    records.push("disk", "logical", "count", disks.len().to_string());
    if disks.is_empty() {
        return;
    }

    let ids = disk_ids(ctx).await;

    for (disk, size) in &disks {
        let base = format!("{SYS_BLOCK}/{disk}");
        records.push("disk", disk, "size", *size);

        for (key, paths) in DISK_ATTRIBUTES {
            for path in *paths {
                if let Some(value) = ctx.read_line(&format!("{base}/{path}")).await {
                    records.push("disk", disk, *key, value);
                    break;
                }
            }
        }

        if let Some(scheduler) = ctx
            .read_line(&format!("{base}/queue/scheduler"))
            .await
            .and_then(|line| parse_scheduler(&line))
        {
            records.push("disk", disk, "scheduler", scheduler);
        }

        if !disk.starts_with("nvme") {
            let scsi_disk = format!("{base}/device/scsi_disk");
            if let Some(address) = ctx.list(&scsi_disk).await.into_iter().next() {
                if let Some(cache_type) =
                    ctx.read_line(&format!("{scsi_disk}/{address}/cache_type")).await
                {
                    records.extend(cache_type_records(disk, &cache_type));
                }
            }
        }

        for (target, id) in &ids {
            if target == disk {
                records.push("disk", disk, "id", id.as_str());
            }
        }
    }
}
