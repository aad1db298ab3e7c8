use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, RefreshKind, System};

use super::types::Process;
use super::{ModuleName, ModuleUpdate};
use crate::error::Result;

/// Every running process, busiest first.
pub struct ProcessesUpdate {
    system: System,
}

impl ProcessesUpdate {
    pub fn new() -> Self {
        let refresh_kind = RefreshKind::nothing().with_processes(
            ProcessRefreshKind::nothing()
                .with_cpu()
                .with_memory()
                .with_exe(sysinfo::UpdateKind::OnlyIfNotSet),
        );
        Self {
            system: System::new_with_specifics(refresh_kind),
        }
    }
}

impl Default for ProcessesUpdate {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleUpdate for ProcessesUpdate {
    const NAME: ModuleName = ModuleName::Processes;
    type Output = Vec<Process>;

    fn update_all_data(&mut self) -> Result<Vec<Process>> {
        self.system.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::nothing()
                .with_cpu()
                .with_memory()
                .with_exe(sysinfo::UpdateKind::OnlyIfNotSet),
        );

        let mut processes: Vec<Process> = self
            .system
            .processes()
            .values()
            .map(|proc| Process {
                pid: proc.pid().as_u32(),
                parent_pid: proc.parent().map(|pid| pid.as_u32()),
                name: proc.name().to_string_lossy().to_string(),
                cpu_usage_percent: proc.cpu_usage(),
                memory_bytes: proc.memory(),
                status: format!("{:?}", proc.status()),
                path: proc.exe().map(|path| path.to_string_lossy().to_string()),
            })
            .collect();

        sort_by_cpu(&mut processes);
        Ok(processes)
    }
}

fn sort_by_cpu(processes: &mut [Process]) {
    processes.sort_by(|a, b| {
        b.cpu_usage_percent
            .partial_cmp(&a.cpu_usage_percent)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.pid.cmp(&b.pid))
    });
}
