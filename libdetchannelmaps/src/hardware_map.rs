//! Hardware map loading and lookup. The map is a whitespace-delimited text
//! file with one record per physical readout link; the service parses it once
//! and builds three indices over the same canonical record set:
//! geo-id -> HWInfo, source-id -> HWInfos, (host, card) -> DROInfo.
//! Everything is immutable after construction.
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use fxhash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::constants::*;
use super::error::HardwareMapError;

/// One physical readout link, as described by a single hardware map record.
///
/// The `from_file` flag marks whether the record came from real input; the
/// default-valued record handed back for an unknown geo-id carries
/// `from_file = false` and is the documented "not found" sentinel. The flag is
/// local bookkeeping and is not part of the JSON schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HWInfo {
    pub dro_source_id: u32,
    pub det_link: u16,
    pub det_slot: u16,
    pub det_crate: u16,
    pub det_id: u16,
    pub dro_host: String,
    pub dro_card: u16,
    pub dro_slr: u16,
    pub dro_link: u16,
    #[serde(skip)]
    pub from_file: bool,
}

/// The unpacked form of a 64-bit geo-id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GeoInfo {
    pub det_link: u16,
    pub det_slot: u16,
    pub det_crate: u16,
    pub det_id: u16,
}

/// One data-readout unit. A DRO is defined by a host-card pair and owns every
/// link whose record carries that pair.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DROInfo {
    pub host: String,
    pub card: u16,
    pub links: Vec<HWInfo>,
}

/// The flat, canonical representation of a hardware map. This is the form
/// used for file I/O and JSON serialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HardwareMap {
    pub link_infos: Vec<HWInfo>,
}

impl HardwareMap {
    /// Parse map file contents. Blank lines and lines whose first
    /// non-whitespace byte is `#` are skipped; every other line must hold
    /// exactly nine whitespace-separated fields. A wrong field count or an
    /// unparseable numeric token is an error naming the offending line.
    pub fn from_text(contents: &str) -> Result<Self, HardwareMapError> {
        let mut map = HardwareMap::default();
        for (idx, line) in contents.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let line_number = idx + 1;
            let entries: Vec<&str> = trimmed.split_whitespace().collect();
            if entries.len() != HW_MAP_ENTRIES_PER_LINE {
                return Err(HardwareMapError::BadFieldCount(line_number, entries.len()));
            }

            map.link_infos.push(HWInfo {
                dro_source_id: parse_field(entries[0], line_number)?,
                det_link: parse_field(entries[1], line_number)?,
                det_slot: parse_field(entries[2], line_number)?,
                det_crate: parse_field(entries[3], line_number)?,
                det_id: parse_field(entries[4], line_number)?,
                dro_host: entries[5].to_string(),
                dro_card: parse_field(entries[6], line_number)?,
                dro_slr: parse_field(entries[7], line_number)?,
                dro_link: parse_field(entries[8], line_number)?,
                from_file: true,
            });
        }
        Ok(map)
    }
}

/// Parse one numeric token, tagging failures with the line they came from
fn parse_field<T>(token: &str, line_number: usize) -> Result<T, HardwareMapError>
where
    T: std::str::FromStr<Err = std::num::ParseIntError>,
{
    token
        .parse()
        .map_err(|e| HardwareMapError::BadNumericField(line_number, e))
}

/// Pack detector link, slot, crate and id into a 64-bit geo-id, four 16-bit
/// fields from the high bits down. Geo-ids are a stable external contract;
/// callers may persist them and unpack them in a different run.
pub fn get_geo_id(det_link: u16, det_slot: u16, det_crate: u16, det_id: u16) -> u64 {
    (det_link as u64) << GEO_ID_LINK_SHIFT
        | (det_slot as u64) << GEO_ID_SLOT_SHIFT
        | (det_crate as u64) << GEO_ID_CRATE_SHIFT
        | det_id as u64
}

/// Geo-id of a hardware map record
pub fn get_geo_id_for(hw_info: &HWInfo) -> u64 {
    get_geo_id(
        hw_info.det_link,
        hw_info.det_slot,
        hw_info.det_crate,
        hw_info.det_id,
    )
}

/// Unpack a geo-id. Exact inverse of [`get_geo_id`].
pub fn parse_geo_id(geo_id: u64) -> GeoInfo {
    GeoInfo {
        det_link: (GEO_ID_FIELD_MASK & (geo_id >> GEO_ID_LINK_SHIFT)) as u16,
        det_slot: (GEO_ID_FIELD_MASK & (geo_id >> GEO_ID_SLOT_SHIFT)) as u16,
        det_crate: (GEO_ID_FIELD_MASK & (geo_id >> GEO_ID_CRATE_SHIFT)) as u16,
        det_id: (GEO_ID_FIELD_MASK & geo_id) as u16,
    }
}

/// HardwareMapService loads a hardware map and answers lookup queries over it.
///
/// Unknown source ids and geo-ids are expected-absence cases and come back as
/// an empty vector or a sentinel record; an unknown (host, card) pair is a
/// misconfiguration and comes back as an error. Callers branch on that
/// distinction, so it must not shift.
#[derive(Debug, Clone, Default)]
pub struct HardwareMapService {
    geo_id_to_info: BTreeMap<u64, HWInfo>,
    source_id_to_infos: FxHashMap<u32, Vec<HWInfo>>,
    dro_infos: FxHashMap<(String, u16), DROInfo>,
}

impl HardwareMapService {
    /// Load a hardware map file and build the lookup indices
    pub fn new(path: &Path) -> Result<Self, HardwareMapError> {
        if !path.exists() {
            return Err(HardwareMapError::BadFilePath(path.to_path_buf()));
        }
        let mut contents = String::new();
        File::open(path)?.read_to_string(&mut contents)?;
        let map = HardwareMap::from_text(&contents)?;
        spdlog::info!(
            "Loaded {} hardware map records from {}",
            map.link_infos.len(),
            path.to_string_lossy()
        );
        Ok(Self::from_map(map))
    }

    /// Build the lookup indices from an already-populated map
    pub fn from_map(map: HardwareMap) -> Self {
        let mut service = Self::default();
        service.setup_maps(map);
        service
    }

    fn setup_maps(&mut self, map: HardwareMap) {
        for hw_info in map.link_infos {
            self.source_id_to_infos
                .entry(hw_info.dro_source_id)
                .or_default()
                .push(hw_info.clone());
            // Last write wins on a duplicate geo-id
            self.geo_id_to_info.insert(get_geo_id_for(&hw_info), hw_info);
        }

        // A DRO is defined by a host-card pair!
        for hw_info in self.geo_id_to_info.values() {
            self.dro_infos
                .entry((hw_info.dro_host.clone(), hw_info.dro_card))
                .or_insert_with(|| DROInfo {
                    host: hw_info.dro_host.clone(),
                    card: hw_info.dro_card,
                    links: Vec::new(),
                })
                .links
                .push(hw_info.clone());
        }
    }

    /// The full record set, in geo-id order (not original file order)
    pub fn get_hardware_map(&self) -> HardwareMap {
        HardwareMap {
            link_infos: self.geo_id_to_info.values().cloned().collect(),
        }
    }

    /// The full record set rendered as JSON
    pub fn get_hardware_map_json(&self) -> Result<String, HardwareMapError> {
        Ok(serde_json::to_string(&self.get_hardware_map())?)
    }

    /// All records for a source id; empty when the id is unknown
    pub fn get_hw_info_from_source_id(&self, dro_source_id: u32) -> Vec<HWInfo> {
        self.source_id_to_infos
            .get(&dro_source_id)
            .cloned()
            .unwrap_or_default()
    }

    /// The record for a geo-id; a default record with `from_file == false`
    /// when the id is unknown
    pub fn get_hw_info_from_geo_id(&self, geo_id: u64) -> HWInfo {
        self.geo_id_to_info.get(&geo_id).cloned().unwrap_or_default()
    }

    /// Every DRO unit, in no particular order
    pub fn get_all_dro_info(&self) -> Vec<DROInfo> {
        self.dro_infos.values().cloned().collect()
    }

    /// The DRO unit for a host-card pair; an unknown pair is an error
    pub fn get_dro_info(&self, host_name: &str, dro_card: u16) -> Result<DROInfo, HardwareMapError> {
        self.dro_infos
            .get(&(host_name.to_string(), dro_card))
            .cloned()
            .ok_or_else(|| HardwareMapError::InvalidDROKey(host_name.to_string(), dro_card))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_MAP: &str = "\
# dro_source_id det_link det_slot det_crate det_id dro_host dro_card dro_slr dro_link
1 2 3 4 5 hostA 10 0 0

1 6 3 4 5 hostA 10 0 1
2 7 3 4 5 hostB 11 1 0
";

    fn sample_service() -> HardwareMapService {
        let map = HardwareMap::from_text(SAMPLE_MAP).expect("sample map must parse");
        HardwareMapService::from_map(map)
    }

    #[test]
    fn test_geo_id_round_trip() {
        let geo_id = get_geo_id(2, 3, 4, 5);
        assert_eq!(geo_id, (2u64 << 48) | (3u64 << 32) | (4u64 << 16) | 5);
        let info = parse_geo_id(geo_id);
        assert_eq!(info.det_link, 2);
        assert_eq!(info.det_slot, 3);
        assert_eq!(info.det_crate, 4);
        assert_eq!(info.det_id, 5);

        // Any 48-bit value must survive unpack-then-pack
        for x in [0u64, 1, 0x0001_0002_0003, 0xffff_ffff_ffff, 0x1234_5678_9abc] {
            let g = parse_geo_id(x);
            assert_eq!(get_geo_id(g.det_link, g.det_slot, g.det_crate, g.det_id), x);
        }
    }

    #[test]
    fn test_parse_skips_comments_and_blanks() {
        let map = HardwareMap::from_text("1 2 3 4 5 hostA 10 0 0\n# comment\n\n")
            .expect("map must parse");
        assert_eq!(map.link_infos.len(), 1);
        let hw = &map.link_infos[0];
        assert!(hw.from_file);
        assert_eq!(hw.dro_source_id, 1);
        assert_eq!(hw.dro_host, "hostA");
        assert_eq!(
            get_geo_id_for(hw),
            (2u64 << 48) | (3u64 << 32) | (4u64 << 16) | 5
        );
    }

    #[test]
    fn test_parse_rejects_bad_field_count() {
        let text = "1 2 3 4 5 hostA 10 0 0\n1 2 3 4 5 hostA 10 0\n";
        match HardwareMap::from_text(text) {
            Err(HardwareMapError::BadFieldCount(line, count)) => {
                assert_eq!(line, 2);
                assert_eq!(count, 8);
            }
            other => panic!("expected BadFieldCount, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_rejects_bad_numeric_field() {
        let text = "# header\n1 2 3 4 five hostA 10 0 0\n";
        match HardwareMap::from_text(text) {
            Err(HardwareMapError::BadNumericField(line, _)) => assert_eq!(line, 2),
            other => panic!("expected BadNumericField, got {other:?}"),
        }
    }

    #[test]
    fn test_geo_id_lookup_returns_inserted_record() {
        let service = sample_service();
        let hw = service.get_hw_info_from_geo_id(get_geo_id(2, 3, 4, 5));
        assert!(hw.from_file);
        assert_eq!(hw.dro_source_id, 1);
        assert_eq!(hw.det_link, 2);
        assert_eq!(hw.dro_host, "hostA");
        assert_eq!(hw.dro_card, 10);
    }

    #[test]
    fn test_unknown_geo_id_returns_sentinel() {
        let service = sample_service();
        let hw = service.get_hw_info_from_geo_id(get_geo_id(9, 9, 9, 9));
        assert!(!hw.from_file);
        assert_eq!(hw.dro_source_id, 0);
        assert_eq!(hw.det_link, 0);
        assert_eq!(hw.det_slot, 0);
        assert_eq!(hw.det_crate, 0);
        assert_eq!(hw.det_id, 0);
        assert_eq!(hw.dro_host, "");
    }

    #[test]
    fn test_source_id_lookup() {
        let service = sample_service();
        let infos = service.get_hw_info_from_source_id(1);
        assert_eq!(infos.len(), 2);
        assert!(infos.iter().all(|hw| hw.dro_source_id == 1));
        assert!(service.get_hw_info_from_source_id(42).is_empty());
    }

    #[test]
    fn test_dro_grouping() {
        let service = sample_service();
        let dro = service.get_dro_info("hostA", 10).expect("hostA/10 exists");
        assert_eq!(dro.host, "hostA");
        assert_eq!(dro.card, 10);
        assert_eq!(dro.links.len(), 2);
        assert!(dro
            .links
            .iter()
            .all(|hw| hw.dro_host == "hostA" && hw.dro_card == 10));

        let dro_b = service.get_dro_info("hostB", 11).expect("hostB/11 exists");
        assert_eq!(dro_b.links.len(), 1);

        assert_eq!(service.get_all_dro_info().len(), 2);
    }

    #[test]
    fn test_unknown_dro_pair_is_an_error() {
        let service = sample_service();
        match service.get_dro_info("hostC", 3) {
            Err(HardwareMapError::InvalidDROKey(host, card)) => {
                assert_eq!(host, "hostC");
                assert_eq!(card, 3);
            }
            other => panic!("expected InvalidDROKey, got {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_geo_id_last_write_wins() {
        let text = "1 2 3 4 5 hostA 10 0 0\n2 2 3 4 5 hostB 11 0 0\n";
        let map = HardwareMap::from_text(text).expect("map must parse");
        let service = HardwareMapService::from_map(map);
        let hw = service.get_hw_info_from_geo_id(get_geo_id(2, 3, 4, 5));
        assert_eq!(hw.dro_source_id, 2);
        assert_eq!(hw.dro_host, "hostB");
        assert_eq!(service.get_hardware_map().link_infos.len(), 1);
    }

    #[test]
    fn test_json_round_trip() {
        let service = sample_service();
        let json = service.get_hardware_map_json().expect("must serialize");

        let reparsed: HardwareMap = serde_json::from_str(&json).expect("must deserialize");
        let rebuilt = HardwareMapService::from_map(reparsed);
        let json_again = rebuilt.get_hardware_map_json().expect("must serialize");

        let a: serde_json::Value = serde_json::from_str(&json).unwrap();
        let b: serde_json::Value = serde_json::from_str(&json_again).unwrap();
        assert_eq!(a, b);
    }
}
