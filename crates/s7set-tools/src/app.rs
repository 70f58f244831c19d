use crate::cli::Args;
use crate::config::PlcTable;
use crate::error::SetError;
use crate::plc::PlcClient;
use crate::session::{self, WriteRequest};
use crate::value::encode_value;
use std::io::Write;
use tracing::debug;

/// The table named by `--config`, or the built-in one.
pub fn load_table(args: &Args) -> Result<PlcTable, SetError> {
    match &args.config {
        Some(path) => {
            debug!(path = %path.display(), "loading plc table");
            Ok(PlcTable::load(path)?)
        }
        None => Ok(PlcTable::builtin()),
    }
}

/// Turn parsed arguments into a write request without touching the network.
pub fn resolve(table: &PlcTable, args: &Args) -> Result<WriteRequest, SetError> {
    let Some(plc) = table.plc(args.plc) else {
        let valid = table
            .ids()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        return Err(SetError::Usage(format!(
            "invalid value '{}' for '<PLC>': choose from {valid}",
            args.plc
        )));
    };
    if plc.sensors.is_empty() {
        return Err(SetError::InvalidPlc(plc.id));
    }

    let sensor = plc
        .sensor(&args.sensor)
        .ok_or_else(|| SetError::InvalidSensor {
            sensor: args.sensor.clone(),
            valid: plc.sensor_names().collect::<Vec<_>>().join(", "),
        })?;
    let offset = sensor.offset(args.bound);
    let payload = encode_value(args.data)?;

    Ok(WriteRequest {
        plc: plc.id,
        address: plc.address.clone(),
        port: plc.port,
        db: args.db,
        offset,
        payload,
    })
}

pub fn run<C, W>(args: &Args, client: &mut C, out: &mut W) -> Result<(), SetError>
where
    C: PlcClient,
    W: Write,
{
    let table = load_table(args)?;
    let request = resolve(&table, args)?;
    debug!(
        plc = request.plc,
        sensor = %args.sensor,
        bound = ?args.bound,
        offset = request.offset,
        "resolved write request"
    );
    session::execute(client, &request, out)
}

#[cfg(test)]
mod tests {
    use super::resolve;
    use crate::cli::Args;
    use crate::config::{PlcEntry, PlcTable, SensorOffsets};
    use crate::{ErrorKind, SetError};
    use clap::Parser;

    fn args(argv: &[&str]) -> Args {
        let mut full = vec!["s7set"];
        full.extend_from_slice(argv);
        Args::try_parse_from(full).unwrap()
    }

    #[test]
    fn resolves_min_and_max_offsets() {
        let table = PlcTable::builtin();

        let request = resolve(&table, &args(&["1", "10", "RHT-T1", "min", "225"])).unwrap();
        assert_eq!(request.address, "192.168.102.211");
        assert_eq!(request.port, 102);
        assert_eq!(request.db, 10);
        assert_eq!(request.offset, 6);
        assert_eq!(request.payload, [0x00, 0xE1]);

        let request = resolve(&table, &args(&["2", "5", "NTC-T7", "Max", "-50"])).unwrap();
        assert_eq!(request.address, "192.168.102.212");
        assert_eq!(request.offset, 138);
        assert_eq!(request.payload, [0xFF, 0xCE]);
    }

    #[test]
    fn every_builtin_sensor_resolves() {
        let table = PlcTable::builtin();
        for plc in table.plcs() {
            for sensor in &plc.sensors {
                let id = plc.id.to_string();
                let min = resolve(&table, &args(&[&id, "1", &sensor.name, "MIN", "0"])).unwrap();
                let max = resolve(&table, &args(&[&id, "1", &sensor.name, "max", "0"])).unwrap();
                assert_eq!(min.offset, sensor.min());
                assert_eq!(max.offset, sensor.max());
            }
        }
    }

    #[test]
    fn unknown_plc_is_a_usage_error() {
        let err = resolve(&PlcTable::builtin(), &args(&["3", "10", "RHT-T1", "min", "1"]))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Usage);
        assert!(err.to_string().contains("choose from 1, 2"));
    }

    #[test]
    fn unknown_sensor_lists_that_plcs_sensors() {
        let err = resolve(&PlcTable::builtin(), &args(&["2", "10", "RHT-T1", "min", "1"]))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Resolution);
        assert_eq!(
            err.to_string(),
            "Invalid Sensor option. Valid options are: \
             NTC-T1, NTC-T2, NTC-T3, NTC-T4, NTC-T5, NTC-T6, NTC-T7"
        );
    }

    #[test]
    fn sensor_names_are_case_sensitive() {
        let err = resolve(&PlcTable::builtin(), &args(&["1", "10", "rht-t1", "min", "1"]))
            .unwrap_err();
        assert!(matches!(err, SetError::InvalidSensor { ref sensor, .. } if sensor == "rht-t1"));
    }

    #[test]
    fn plc_without_sensors_is_invalid() {
        let table = PlcTable::new(vec![
            PlcEntry {
                id: 1,
                address: "10.0.0.1".into(),
                port: 102,
                sensors: vec![SensorOffsets::new("A", 0, 2)],
            },
            PlcEntry {
                id: 9,
                address: "10.0.0.9".into(),
                port: 102,
                sensors: vec![],
            },
        ])
        .unwrap();
        let err = resolve(&table, &args(&["9", "1", "A", "min", "1"])).unwrap_err();
        assert!(matches!(err, SetError::InvalidPlc(9)));
        assert_eq!(err.to_string(), "Invalid PLC ID.");
    }

    #[test]
    fn out_of_range_value_fails_resolution_with_encoding_kind() {
        let err = resolve(&PlcTable::builtin(), &args(&["1", "10", "RHT-T1", "min", "40000"]))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Encoding);
    }
}
