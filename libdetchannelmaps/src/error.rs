use std::path::PathBuf;
use thiserror::Error;

use super::constants::*;

#[derive(Debug, Error)]
pub enum HardwareMapError {
    #[error("Could not load hardware map because file {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("HardwareMap failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Hardware map line {0} has {1} fields; expected {exp}", exp=HW_MAP_ENTRIES_PER_LINE)]
    BadFieldCount(usize, usize),
    #[error("Hardware map line {0} has a bad numeric field: {1}")]
    BadNumericField(usize, std::num::ParseIntError),
    #[error("Invalid DRO host/card pair {0}/{1}")]
    InvalidDROKey(String, u16),
    #[error("HardwareMap failed to serialize to JSON: {0}")]
    SerializationError(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ChannelMapError {
    #[error("Could not load channel map because file {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("TpcChannelMap failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Channel map line {0} has {1} fields; expected {exp}", exp=CHANNEL_MAP_ENTRIES_PER_LINE)]
    BadFieldCount(usize, usize),
    #[error("Channel map line {0} has a bad numeric field: {1}")]
    BadNumericField(usize, std::num::ParseIntError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration as file {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("Config failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Config failed to parse YAML: {0}")]
    ParsingError(#[from] serde_yaml::Error),
}
