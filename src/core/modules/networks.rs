use std::collections::HashMap;
use std::time::Instant;

use sysinfo::Networks as SysNetworks;

use super::types::{NetworkInterface, Networks};
use super::{ModuleName, ModuleUpdate};
use crate::error::Result;

/// Per-interface counters. Rates are computed against the previous update.
pub struct NetworksUpdate {
    networks: SysNetworks,
    last_update: Option<Instant>,
    last_values: HashMap<String, (u64, u64)>, // (rx, tx) per interface
}

impl NetworksUpdate {
    pub fn new() -> Self {
        Self {
            networks: SysNetworks::new_with_refreshed_list(),
            last_update: None,
            last_values: HashMap::new(),
        }
    }
}

impl Default for NetworksUpdate {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleUpdate for NetworksUpdate {
    const NAME: ModuleName = ModuleName::Networks;
    type Output = Networks;

    fn update_all_data(&mut self) -> Result<Networks> {
        self.networks.refresh(true);

        let now = Instant::now();
        let elapsed_secs = self
            .last_update
            .map(|t| now.duration_since(t).as_secs_f64())
            .unwrap_or(1.0);

        let interfaces: Vec<NetworkInterface> = self
            .networks
            .iter()
            .map(|(name, data)| {
                let rx = data.total_received();
                let tx = data.total_transmitted();
                let (prev_rx, prev_tx) = self.last_values.get(name).copied().unwrap_or((rx, tx));

                NetworkInterface {
                    name: name.to_string(),
                    mac_address: data.mac_address().to_string(),
                    addresses: data
                        .ip_networks()
                        .iter()
                        .map(|net| format!("{}/{}", net.addr, net.prefix))
                        .collect(),
                    rx_bytes_total: rx,
                    tx_bytes_total: tx,
                    rx_bytes_per_sec: per_second(rx.saturating_sub(prev_rx), elapsed_secs),
                    tx_bytes_per_sec: per_second(tx.saturating_sub(prev_tx), elapsed_secs),
                    rx_packets: data.total_packets_received(),
                    tx_packets: data.total_packets_transmitted(),
                    rx_errors: data.total_errors_on_received(),
                    tx_errors: data.total_errors_on_transmitted(),
                }
            })
            .collect();

        self.last_update = Some(now);
        self.last_values = interfaces
            .iter()
            .map(|iface| (iface.name.clone(), (iface.rx_bytes_total, iface.tx_bytes_total)))
            .collect();

        Ok(Networks { interfaces })
    }
}

fn per_second(bytes: u64, elapsed_secs: f64) -> u64 {
    if elapsed_secs <= 0.0 {
        return 0;
    }
    (bytes as f64 / elapsed_secs) as u64
}
