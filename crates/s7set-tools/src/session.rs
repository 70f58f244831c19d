//! One connect, write, disconnect cycle against a PLC.

use crate::config::PlcId;
use crate::error::SetError;
use crate::plc::PlcClient;
use std::fmt;
use std::io::Write;
use tracing::{debug, info, warn};

/// Rack of the CPU on every deployed controller.
pub const RACK: u8 = 0;
/// Slot of the CPU on every deployed controller.
pub const SLOT: u8 = 1;

/// A fully resolved write, ready to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteRequest {
    pub plc: PlcId,
    pub address: String,
    pub port: u16,
    pub db: u16,
    pub offset: u32,
    pub payload: [u8; 2],
}

/// Disconnects when dropped, whatever happened before.
struct ConnectionGuard<'a, C: PlcClient> {
    client: &'a mut C,
    address: &'a str,
}

impl<C: PlcClient> Drop for ConnectionGuard<'_, C> {
    fn drop(&mut self) {
        match self.client.disconnect() {
            Ok(()) => debug!(address = self.address, "disconnected from plc"),
            Err(err) => warn!(address = self.address, error = %err, "disconnect failed"),
        }
    }
}

fn report(out: &mut impl Write, line: fmt::Arguments<'_>) {
    if let Err(err) = writeln!(out, "{line}") {
        warn!(error = %err, "cannot write progress line");
    }
}

/// Connect, write the payload and disconnect.
///
/// Progress lines go to `out`. The disconnect runs exactly once on every path and
/// its failure never changes the result.
pub fn execute<C, W>(client: &mut C, request: &WriteRequest, out: &mut W) -> Result<(), SetError>
where
    C: PlcClient,
    W: Write,
{
    let address = request.address.as_str();
    let mut guard = ConnectionGuard { client, address };

    info!(address, port = request.port, rack = RACK, slot = SLOT, "connecting to plc");
    guard
        .client
        .connect(address, request.port, RACK, SLOT)
        .map_err(|err| SetError::Connect {
            address: address.to_owned(),
            source: Box::new(err),
        })?;
    if !guard.client.is_connected() {
        return Err(SetError::NotConnected {
            address: address.to_owned(),
        });
    }
    report(out, format_args!("Connected to PLC at {address}"));

    guard
        .client
        .write_db(request.db, request.offset, &request.payload)
        .map_err(|err| SetError::Write {
            address: address.to_owned(),
            source: Box::new(err),
        })?;
    info!(
        address,
        db = request.db,
        offset = request.offset,
        payload = ?request.payload,
        "value written"
    );
    report(
        out,
        format_args!(
            "Data written successfully to PLC at {address}: DB{}, offset {}",
            request.db, request.offset
        ),
    );

    Ok(())
}
