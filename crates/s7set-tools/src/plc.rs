//! The PLC capability used by the session driver.

use s7set_client::{ClientConfig, SyncClientError, SyncS7TcpClient};
use thiserror::Error;
use tracing::debug;

pub trait PlcClient {
    type Error: std::error::Error + Send + Sync + 'static;

    fn connect(&mut self, address: &str, port: u16, rack: u8, slot: u8) -> Result<(), Self::Error>;

    fn is_connected(&self) -> bool;

    /// Write `data` into data block `db` at byte `offset` as one job.
    fn write_db(&mut self, db: u16, offset: u32, data: &[u8]) -> Result<(), Self::Error>;

    /// Close the session. Calling it without an open session is a no-op.
    fn disconnect(&mut self) -> Result<(), Self::Error>;
}

#[derive(Debug, Error)]
pub enum S7PlcError {
    #[error("not connected")]
    NotConnected,
    #[error(transparent)]
    Client(#[from] SyncClientError),
}

/// [`PlcClient`] backed by the blocking S7 client.
#[derive(Default)]
pub struct S7PlcClient {
    config: ClientConfig,
    session: Option<SyncS7TcpClient>,
}

impl S7PlcClient {
    pub fn with_config(config: ClientConfig) -> Self {
        Self {
            config,
            session: None,
        }
    }
}

impl PlcClient for S7PlcClient {
    type Error = S7PlcError;

    fn connect(&mut self, address: &str, port: u16, rack: u8, slot: u8) -> Result<(), S7PlcError> {
        let session = SyncS7TcpClient::connect_with_config(address, port, rack, slot, self.config)?;
        debug!(address, port, pdu_length = ?session.pdu_length(), "plc session ready");
        self.session = Some(session);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    fn write_db(&mut self, db: u16, offset: u32, data: &[u8]) -> Result<(), S7PlcError> {
        let session = self.session.as_ref().ok_or(S7PlcError::NotConnected)?;
        session.write_db(db, offset, data)?;
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), S7PlcError> {
        match self.session.take() {
            Some(session) => Ok(session.disconnect()?),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{PlcClient, S7PlcClient, S7PlcError};

    #[test]
    fn unconnected_client_refuses_writes_and_disconnects_quietly() {
        let mut client = S7PlcClient::default();
        assert!(!client.is_connected());
        assert!(matches!(
            client.write_db(1, 0, &[0, 0]),
            Err(S7PlcError::NotConnected)
        ));
        client.disconnect().unwrap();
        client.disconnect().unwrap();
    }
}
