use sysinfo::Disks as SysDisks;

use super::types::{Disk, Disks};
use super::{ModuleName, ModuleUpdate};
use crate::error::Result;

pub struct DisksUpdate {
    disks: SysDisks,
}

impl DisksUpdate {
    pub fn new() -> Self {
        Self {
            disks: SysDisks::new_with_refreshed_list(),
        }
    }
}

impl Default for DisksUpdate {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleUpdate for DisksUpdate {
    const NAME: ModuleName = ModuleName::Disks;
    type Output = Disks;

    fn update_all_data(&mut self) -> Result<Disks> {
        // Picks up mounts that appeared since the last tick
        self.disks.refresh(true);

        let devices = self
            .disks
            .iter()
            .map(|disk| {
                let total = disk.total_space();
                let available = disk.available_space();

                Disk {
                    name: disk.name().to_string_lossy().to_string(),
                    mount_point: disk.mount_point().to_string_lossy().to_string(),
                    fs_type: disk.file_system().to_string_lossy().to_string(),
                    is_removable: disk.is_removable(),
                    total_bytes: total,
                    available_bytes: available,
                    usage_percent: usage_percent(total, available),
                }
            })
            .collect();

        Ok(Disks { devices })
    }
}

fn usage_percent(total: u64, available: u64) -> f32 {
    if total == 0 {
        return 0.0;
    }
    let used = total.saturating_sub(available);
    (used as f32 / total as f32) * 100.0
}
