use crate::config::PlcId;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(
    name = "s7set",
    version,
    about = "Write a sensor min/max threshold into a Siemens S7 data block"
)]
pub struct Args {
    /// Load the PLC and sensor tables from a TOML file instead of the built-in ones
    #[arg(long, env = "S7SET_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,
    /// 1 for PLC RHT or 2 for PLC NTC
    #[arg(value_name = "PLC")]
    pub plc: PlcId,
    /// Data block number
    #[arg(value_name = "DB")]
    pub db: u16,
    /// Sensor name, e.g. RHT-T1
    #[arg(value_name = "Sensor")]
    pub sensor: String,
    /// Which threshold of the sensor to write
    #[arg(value_name = "MinMax", value_enum, ignore_case = true)]
    pub bound: Bound,
    /// Value to write, signed 16-bit
    #[arg(value_name = "Data", allow_negative_numbers = true)]
    pub data: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Bound {
    Min,
    Max,
}
