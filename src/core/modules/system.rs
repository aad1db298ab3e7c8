use sysinfo::{Networks as SysNetworks, System as SysSystem, Users};

use super::types::System;
use super::{ModuleName, ModuleUpdate};
use crate::error::Result;
use crate::platform::{machine_id, primary_ipv4};

/// Host identity and uptime.
pub struct SystemUpdate {
    users: Users,
    networks: SysNetworks,
}

impl SystemUpdate {
    pub fn new() -> Self {
        Self {
            users: Users::new_with_refreshed_list(),
            networks: SysNetworks::new_with_refreshed_list(),
        }
    }

    /// MAC of the first interface carrying `ip`, else the first non-zero MAC.
    fn mac_address(&self, ip: Option<&str>) -> Option<String> {
        let by_ip = ip.and_then(|ip| {
            self.networks
                .iter()
                .find(|(_, data)| data.ip_networks().iter().any(|net| net.addr.to_string() == ip))
                .map(|(_, data)| data.mac_address())
        });

        by_ip
            .or_else(|| {
                self.networks
                    .iter()
                    .map(|(_, data)| data.mac_address())
                    .find(|mac| !mac.is_unspecified())
            })
            .filter(|mac| !mac.is_unspecified())
            .map(|mac| mac.to_string())
    }
}

impl Default for SystemUpdate {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleUpdate for SystemUpdate {
    const NAME: ModuleName = ModuleName::System;
    type Output = System;

    fn update_all_data(&mut self) -> Result<System> {
        self.users.refresh();
        self.networks.refresh(true);

        let ip_address_4 = primary_ipv4();
        let mut users: Vec<String> = self.users.iter().map(|u| u.name().to_string()).collect();
        users.sort();
        users.dedup();

        Ok(System {
            hostname: SysSystem::host_name().unwrap_or_default(),
            platform: SysSystem::name().unwrap_or_else(|| std::env::consts::OS.to_string()),
            platform_version: SysSystem::long_os_version()
                .or_else(SysSystem::os_version)
                .unwrap_or_default(),
            kernel_version: SysSystem::kernel_version().unwrap_or_default(),
            boot_time: SysSystem::boot_time(),
            uptime_secs: SysSystem::uptime(),
            users,
            mac_address: self.mac_address(ip_address_4.as_deref()),
            ip_address_4,
            uuid: machine_id(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        })
    }
}
