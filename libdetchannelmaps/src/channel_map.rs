//! TPC channel map: translation between physical readout coordinates
//! (crate, slot, fiber, channel) and offline channel numbers.
//!
//! The map is loaded once from a versioned text file under a configuration
//! root directory handed to the constructor; nothing here touches process
//! environment state, so tests can point at any directory. Each record is six
//! whitespace-separated fields: crate slot fiber channel plane offline.
use std::fs::File;
use std::io::Read;
use std::path::Path;

use fxhash::FxHashMap;

use super::constants::*;
use super::error::ChannelMapError;

/// Physical readout coordinates of one TPC channel. Hashable, so the full
/// tuple keys the coordinate-direction index directly; any coordinate value
/// that is not in the map misses, there is no packed encoding to alias.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TpcCoords {
    pub crate_id: u32,
    pub slot: u32,
    pub fiber: u32,
    pub channel: u32,
}

/// Everything the map knows about one channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ChanInfo {
    coords: TpcCoords,
    plane: u32,
    offline_channel: u32,
}

/// TpcChannelMap holds the full channel mapping, indexed in both directions.
///
/// The loaded table is large and uniquely owned; it deliberately does not
/// implement Clone. Consumers take a `&TpcChannelMap`.
#[derive(Debug, Default)]
pub struct TpcChannelMap {
    coords_to_info: FxHashMap<TpcCoords, ChanInfo>,
    offline_to_info: FxHashMap<u32, ChanInfo>,
}

impl TpcChannelMap {
    /// Load the versioned map file found under the given configuration root
    pub fn from_config_root(config_root: &Path) -> Result<Self, ChannelMapError> {
        let map_path = config_root
            .join(CHANNEL_MAP_RELATIVE_DIR)
            .join(format!("PD2HDChannelMap_v{CHANNEL_MAP_VERSION}.txt"));
        if !map_path.exists() {
            return Err(ChannelMapError::BadFilePath(map_path));
        }
        let mut contents = String::new();
        File::open(&map_path)?.read_to_string(&mut contents)?;
        let map = Self::from_text(&contents)?;
        spdlog::debug!(
            "TpcChannelMap created from {} with {} channels",
            map_path.to_string_lossy(),
            map.offline_to_info.len()
        );
        Ok(map)
    }

    /// Parse map file contents. Same comment and validation rules as the
    /// hardware map parser.
    pub fn from_text(contents: &str) -> Result<Self, ChannelMapError> {
        let mut map = TpcChannelMap::default();
        for (idx, line) in contents.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let line_number = idx + 1;
            let entries: Vec<&str> = trimmed.split_whitespace().collect();
            if entries.len() != CHANNEL_MAP_ENTRIES_PER_LINE {
                return Err(ChannelMapError::BadFieldCount(line_number, entries.len()));
            }

            let mut fields = [0u32; CHANNEL_MAP_ENTRIES_PER_LINE];
            for (field, token) in fields.iter_mut().zip(entries.iter()) {
                *field = token
                    .parse()
                    .map_err(|e| ChannelMapError::BadNumericField(line_number, e))?;
            }
            let info = ChanInfo {
                coords: TpcCoords {
                    crate_id: fields[0],
                    slot: fields[1],
                    fiber: fields[2],
                    channel: fields[3],
                },
                plane: fields[4],
                offline_channel: fields[5],
            };

            map.coords_to_info.insert(info.coords, info);
            map.offline_to_info.insert(info.offline_channel, info);
        }
        Ok(map)
    }

    /// Offline channel for a coordinate tuple, or None when the tuple is not
    /// in the map
    pub fn get_offline_channel_from_crate_slot_fiber_chan(
        &self,
        crate_id: u32,
        slot: u32,
        fiber: u32,
        channel: u32,
    ) -> Option<u32> {
        self.coords_to_info
            .get(&TpcCoords {
                crate_id,
                slot,
                fiber,
                channel,
            })
            .map(|info| info.offline_channel)
    }

    /// Plane for an offline channel, or [`INVALID_PLANE`] when the channel is
    /// unrecognized
    pub fn get_plane_from_offline_channel(&self, offchannel: u32) -> u32 {
        match self.offline_to_info.get(&offchannel) {
            Some(info) => info.plane,
            None => INVALID_PLANE,
        }
    }

    /// Coordinate tuple for an offline channel, or None when the channel is
    /// unrecognized
    pub fn get_crate_slot_fiber_chan_from_offline_channel(
        &self,
        offchannel: u32,
    ) -> Option<TpcCoords> {
        self.offline_to_info
            .get(&offchannel)
            .map(|info| info.coords)
    }
}
