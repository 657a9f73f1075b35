//! # detchannelmaps
//!
//! detchannelmaps is a small configuration-loading and lookup library for a
//! data-acquisition system. It answers two families of questions:
//!
//! - which physical readout link sits behind a geo-id, a source id, or a
//!   DRO host/card pair (the hardware map), and
//! - which offline channel number corresponds to a physical
//!   crate/slot/fiber/channel coordinate tuple, and back (the TPC channel
//!   map).
//!
//! Both maps are plain whitespace-delimited text files read once at
//! construction; every query afterwards is an in-memory lookup. There is no
//! network protocol, no concurrency and no persistence here. Services are
//! typically constructed once per process during configuration and shared by
//! reference.
//!
//! ## Hardware map format
//!
//! One record per line, nine whitespace-separated fields:
//!
//! ```text
//! dro_source_id det_link det_slot det_crate det_id dro_host dro_card dro_slr dro_link
//! ```
//!
//! Blank lines and lines whose first non-whitespace character is `#` are
//! ignored. A line with the wrong field count or an unparseable numeric token
//! fails the load with the offending line number.
//!
//! ## TPC channel map format
//!
//! One record per line, six whitespace-separated fields:
//!
//! ```text
//! crate slot fiber channel plane offline_channel
//! ```
//!
//! The channel map file is versioned; the loader builds the path
//! `<config_root>/config/pd2hd/PD2HDChannelMap_v6.txt` from the configuration
//! root it is given.
//!
//! ## Geo-ids
//!
//! A geo-id packs detector link, slot, crate and id as four 16-bit fields of
//! a 64-bit integer (link in the high bits). The encoding is a stable
//! external contract: a geo-id written out by one process decodes to the same
//! coordinates in another.
pub mod channel_map;
pub mod config;
pub mod constants;
pub mod error;
pub mod hardware_map;
