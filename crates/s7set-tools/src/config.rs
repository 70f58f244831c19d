//! PLC address and sensor offset tables.
//!
//! The built-in table mirrors the deployed controllers. A TOML file with the
//! same shape can replace it:
//!
//! ```toml
//! [[plc]]
//! id = 1
//! address = "192.168.102.211"
//! port = 102
//!
//! [[plc.sensor]]
//! name = "RHT-T1"
//! offsets = [6, 8]
//! ```

use crate::cli::Bound;
use s7set_core::pdu::MAX_BYTE_ADDRESS;
use s7set_datalink::ISO_TCP_PORT;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub type PlcId = u8;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("config defines no PLC")]
    Empty,
    #[error("PLC {0} is defined more than once")]
    DuplicatePlc(PlcId),
    #[error("sensor {name} is defined more than once for PLC {plc}")]
    DuplicateSensor { plc: PlcId, name: String },
    #[error("offset {offset} of sensor {name} on PLC {plc} is not addressable")]
    OffsetOutOfRange { plc: PlcId, name: String, offset: u32 },
}

/// A sensor and its two threshold offsets, `[min, max]`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SensorOffsets {
    pub name: String,
    pub offsets: [u32; 2],
}

impl SensorOffsets {
    pub fn new(name: impl Into<String>, min: u32, max: u32) -> Self {
        Self {
            name: name.into(),
            offsets: [min, max],
        }
    }

    pub fn min(&self) -> u32 {
        self.offsets[0]
    }

    pub fn max(&self) -> u32 {
        self.offsets[1]
    }

    pub fn offset(&self, bound: Bound) -> u32 {
        match bound {
            Bound::Min => self.min(),
            Bound::Max => self.max(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlcEntry {
    pub id: PlcId,
    pub address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default, rename = "sensor")]
    pub sensors: Vec<SensorOffsets>,
}

fn default_port() -> u16 {
    ISO_TCP_PORT
}

impl PlcEntry {
    pub fn sensor(&self, name: &str) -> Option<&SensorOffsets> {
        self.sensors.iter().find(|sensor| sensor.name == name)
    }

    /// Sensor names in table order.
    pub fn sensor_names(&self) -> impl Iterator<Item = &str> {
        self.sensors.iter().map(|sensor| sensor.name.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlcTable {
    #[serde(rename = "plc")]
    plcs: Vec<PlcEntry>,
}

impl PlcTable {
    pub fn new(plcs: Vec<PlcEntry>) -> Result<Self, ConfigError> {
        let table = Self { plcs };
        table.validate()?;
        Ok(table)
    }

    pub fn builtin() -> Self {
        let plc = |id, address: &str, sensors: &[(&str, u32, u32)]| PlcEntry {
            id,
            address: address.to_owned(),
            port: ISO_TCP_PORT,
            sensors: sensors
                .iter()
                .map(|&(name, min, max)| SensorOffsets::new(name, min, max))
                .collect(),
        };

        Self {
            plcs: vec![
                plc(
                    1,
                    "192.168.102.211",
                    &[
                        ("RHT-T1", 6, 8),
                        ("RHT-T2", 54, 56),
                        ("RHT-T3", 102, 104),
                        ("RHT-H1", 30, 32),
                        ("RHT-H2", 78, 80),
                        ("RHT-H3", 126, 128),
                    ],
                ),
                plc(
                    2,
                    "192.168.102.212",
                    &[
                        ("NTC-T1", 4, 6),
                        ("NTC-T2", 26, 28),
                        ("NTC-T3", 48, 50),
                        ("NTC-T4", 70, 72),
                        ("NTC-T5", 92, 94),
                        ("NTC-T6", 114, 116),
                        ("NTC-T7", 136, 138),
                    ],
                ),
            ],
        }
    }

    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let table: Self = toml::from_str(input)?;
        table.validate()?;
        Ok(table)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let input = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&input)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.plcs.is_empty() {
            return Err(ConfigError::Empty);
        }

        let mut ids = HashSet::new();
        for plc in &self.plcs {
            if !ids.insert(plc.id) {
                return Err(ConfigError::DuplicatePlc(plc.id));
            }

            let mut names = HashSet::new();
            for sensor in &plc.sensors {
                if !names.insert(sensor.name.as_str()) {
                    return Err(ConfigError::DuplicateSensor {
                        plc: plc.id,
                        name: sensor.name.clone(),
                    });
                }
                if let Some(&offset) = sensor.offsets.iter().find(|&&o| o > MAX_BYTE_ADDRESS) {
                    return Err(ConfigError::OffsetOutOfRange {
                        plc: plc.id,
                        name: sensor.name.clone(),
                        offset,
                    });
                }
            }
        }
        Ok(())
    }

    pub fn plc(&self, id: PlcId) -> Option<&PlcEntry> {
        self.plcs.iter().find(|plc| plc.id == id)
    }

    pub fn ids(&self) -> impl Iterator<Item = PlcId> + '_ {
        self.plcs.iter().map(|plc| plc.id)
    }

    pub fn plcs(&self) -> &[PlcEntry] {
        &self.plcs
    }
}

impl Default for PlcTable {
    fn default() -> Self {
        Self::builtin()
    }
}
