use sysinfo::{MemoryRefreshKind, RefreshKind, System};

use super::types::Memory;
use super::{ModuleName, ModuleUpdate};
use crate::error::Result;

pub struct MemoryUpdate {
    system: System,
}

impl MemoryUpdate {
    pub fn new() -> Self {
        let refresh_kind = RefreshKind::nothing().with_memory(MemoryRefreshKind::everything());
        Self {
            system: System::new_with_specifics(refresh_kind),
        }
    }
}

impl Default for MemoryUpdate {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleUpdate for MemoryUpdate {
    const NAME: ModuleName = ModuleName::Memory;
    type Output = Memory;

    fn update_all_data(&mut self) -> Result<Memory> {
        self.system.refresh_memory();

        let total = self.system.total_memory();
        let used = self.system.used_memory();
        let swap_total = self.system.total_swap();
        let swap_used = self.system.used_swap();

        Ok(Memory {
            total_bytes: total,
            used_bytes: used,
            available_bytes: self.system.available_memory(),
            usage_percent: percent_of(used, total),
            swap_total_bytes: swap_total,
            swap_used_bytes: swap_used,
            swap_percent: percent_of(swap_used, swap_total),
        })
    }
}

fn percent_of(part: u64, total: u64) -> f32 {
    if total > 0 {
        (part as f32 / total as f32) * 100.0
    } else {
        0.0
    }
}
