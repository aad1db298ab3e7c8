//! Display enumeration through the kernel DRM subsystem.
//!
//! Each connector shows up as `/sys/class/drm/card<N>-<connector>` with a
//! `status` file ("connected"/"disconnected") and a `modes` file listing the
//! supported modes, preferred mode first.

use std::fs;
use std::path::Path;

use crate::error::Result;

const DRM_ROOT: &str = "/sys/class/drm";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayConnector {
    /// Connector name without the card prefix, e.g. `HDMI-A-1`
    pub name: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// Connected displays, sorted by connector name.
///
/// Returns an empty list on systems without a DRM sysfs tree.
pub fn connected_displays() -> Result<Vec<DisplayConnector>> {
    let root = Path::new(DRM_ROOT);
    if !root.exists() {
        return Ok(Vec::new());
    }
    connected_displays_in(root)
}

pub(crate) fn connected_displays_in(root: &Path) -> Result<Vec<DisplayConnector>> {
    let mut displays = Vec::new();

    for entry in fs::read_dir(root)? {
        let entry = entry?;
        let file_name = entry.file_name().to_string_lossy().to_string();

        // Skip bare cards ("card0") and render nodes
        let Some((card, connector)) = file_name.split_once('-') else {
            continue;
        };
        if !card.starts_with("card") {
            continue;
        }

        let status = fs::read_to_string(entry.path().join("status")).unwrap_or_default();
        if status.trim() != "connected" {
            continue;
        }

        let modes = fs::read_to_string(entry.path().join("modes")).unwrap_or_default();
        let (width, height) = modes
            .lines()
            .next()
            .and_then(parse_mode)
            .map(|(w, h)| (Some(w), Some(h)))
            .unwrap_or((None, None));

        displays.push(DisplayConnector {
            name: connector.to_string(),
            width,
            height,
        });
    }

    displays.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(displays)
}

/// Parse a DRM mode line such as `1920x1080` or `1920x1080i`.
fn parse_mode(mode: &str) -> Option<(u32, u32)> {
    let (width, height) = mode.trim().split_once('x')?;
    let height: String = height.chars().take_while(|c| c.is_ascii_digit()).collect();
    Some((width.parse().ok()?, height.parse().ok()?))
}
