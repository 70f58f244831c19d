use crate::{ClientConfig, ClientError, S7Client};
use s7set_core::EncodeError;
use s7set_datalink::{S7TcpTransport, Tsap};
use thiserror::Error;
use tokio::runtime::Runtime;
use tracing::debug;

#[derive(Debug, Error)]
pub enum SyncClientError {
    #[error("runtime init error: {0}")]
    RuntimeInit(std::io::Error),
    #[error("invalid rack/slot: {0}")]
    Encode(#[from] EncodeError),
    #[error("client error: {0}")]
    Client(#[from] ClientError),
}

/// Blocking S7 client that owns a single-threaded runtime.
pub struct SyncS7TcpClient {
    runtime: Runtime,
    client: S7Client<S7TcpTransport>,
}

impl SyncS7TcpClient {
    pub fn connect(host: &str, port: u16, rack: u8, slot: u8) -> Result<Self, SyncClientError> {
        Self::connect_with_config(host, port, rack, slot, ClientConfig::default())
    }

    pub fn connect_with_config(
        host: &str,
        port: u16,
        rack: u8,
        slot: u8,
        config: ClientConfig,
    ) -> Result<Self, SyncClientError> {
        let tsap = Tsap::rack_slot(rack, slot)?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(SyncClientError::RuntimeInit)?;
        let client = runtime.block_on(S7Client::connect((host, port), tsap, config))?;
        debug!(host, port, rack, slot, "s7 session open");
        Ok(Self { runtime, client })
    }

    pub fn config(&self) -> ClientConfig {
        self.client.config()
    }

    pub fn pdu_length(&self) -> Option<u16> {
        self.client.pdu_length()
    }

    pub fn write_db(&self, db_number: u16, start: u32, data: &[u8]) -> Result<(), SyncClientError> {
        self.runtime
            .block_on(self.client.write_db(db_number, start, data))
            .map_err(SyncClientError::Client)
    }

    pub fn disconnect(&self) -> Result<(), SyncClientError> {
        self.runtime
            .block_on(self.client.close())
            .map_err(SyncClientError::Client)
    }
}
