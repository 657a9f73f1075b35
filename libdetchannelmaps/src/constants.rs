//! Fixed parameters of the map file formats and the geo-id encoding.

/// Number of whitespace-separated fields in a hardware map record
pub const HW_MAP_ENTRIES_PER_LINE: usize = 9;
/// Number of whitespace-separated fields in a TPC channel map record
pub const CHANNEL_MAP_ENTRIES_PER_LINE: usize = 6;

/// Version suffix of the TPC channel map file shipped under the config root
pub const CHANNEL_MAP_VERSION: u32 = 6;
/// Directory of the TPC channel map file, relative to the config root
pub const CHANNEL_MAP_RELATIVE_DIR: &str = "config/pd2hd";

/// Plane number returned for an unrecognized offline channel
pub const INVALID_PLANE: u32 = 9999;

/// Bit offsets of the four 16-bit fields packed into a geo-id
pub const GEO_ID_LINK_SHIFT: u64 = 48;
pub const GEO_ID_SLOT_SHIFT: u64 = 32;
pub const GEO_ID_CRATE_SHIFT: u64 = 16;
pub const GEO_ID_FIELD_MASK: u64 = 0xffff;
