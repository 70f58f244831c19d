//! High-level S7 client crate.

#![forbid(unsafe_code)]

pub mod sync;

pub use sync::{SyncClientError, SyncS7TcpClient};

use s7set_core::encoding::{Reader, Writer};
use s7set_core::pdu::{
    AnyAddress, Area, Message, MessageType, ReturnCode, SetupCommunication, WriteVarRequest,
    WriteVarResponse, WRITE_VAR_OVERHEAD,
};
use s7set_core::{DecodeError, EncodeError};
use s7set_datalink::{DataLink, DataLinkError, S7TcpTransport, Tsap};
use std::sync::atomic::{AtomicU16, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio::net::ToSocketAddrs;
use tokio::time::timeout;
use tracing::debug;

const MAX_PDU_BUF: usize = 1024;

#[derive(Debug, Clone, Copy)]
pub struct ClientConfig {
    pub response_timeout: Duration,
    pub connect_timeout: Duration,
    pub requested_pdu_length: u16,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            response_timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(3),
            requested_pdu_length: 480,
        }
    }
}

impl ClientConfig {
    pub fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_requested_pdu_length(mut self, pdu_length: u16) -> Self {
        self.requested_pdu_length = pdu_length;
        self
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("datalink error: {0}")]
    DataLink(#[from] DataLinkError),
    #[error("encode error: {0}")]
    Encode(#[from] EncodeError),
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),
    #[error("request timed out")]
    Timeout,
    #[error("plc rejected the job (error class {class:#04x}, code {code:#04x})")]
    Protocol { class: u8, code: u8 },
    #[error("plc rejected the write: {0}")]
    WriteRejected(ReturnCode),
    #[error("pdu length has not been negotiated")]
    NotNegotiated,
    #[error("payload of {len} bytes exceeds the negotiated maximum of {max}")]
    PayloadTooLarge { len: usize, max: usize },
    #[error("invalid response: {0}")]
    InvalidResponse(&'static str),
}

pub struct S7Client<D: DataLink> {
    datalink: D,
    config: ClientConfig,
    pdu_ref: AtomicU16,
    pdu_length: AtomicU16,
}

impl S7Client<S7TcpTransport> {
    /// Connect to `addr`, open the ISO connection for `tsap` and negotiate the PDU length.
    pub async fn connect<A: ToSocketAddrs>(
        addr: A,
        tsap: Tsap,
        config: ClientConfig,
    ) -> Result<Self, ClientError> {
        let link = timeout(config.connect_timeout, S7TcpTransport::connect(addr, tsap))
            .await
            .map_err(|_| ClientError::Timeout)??;
        let client = Self::with_config(link, config);
        client.setup_communication().await?;
        Ok(client)
    }
}

impl<D: DataLink> S7Client<D> {
    pub fn new(datalink: D) -> Self {
        Self::with_config(datalink, ClientConfig::default())
    }

    pub fn with_config(datalink: D, config: ClientConfig) -> Self {
        Self {
            datalink,
            config,
            pdu_ref: AtomicU16::new(1),
            pdu_length: AtomicU16::new(0),
        }
    }

    pub fn config(&self) -> ClientConfig {
        self.config
    }

    /// PDU length agreed with the PLC, if setup communication has run.
    pub fn pdu_length(&self) -> Option<u16> {
        match self.pdu_length.load(Ordering::Relaxed) {
            0 => None,
            len => Some(len),
        }
    }

    /// Largest payload a single write var job may carry.
    pub fn max_write_len(&self) -> Option<usize> {
        self.pdu_length()
            .map(|len| usize::from(len).saturating_sub(WRITE_VAR_OVERHEAD))
    }

    fn next_pdu_ref(&self) -> u16 {
        self.pdu_ref.fetch_add(1, Ordering::Relaxed)
    }

    async fn send_job<'a>(
        &self,
        pdu_ref: u16,
        request_pdu: &[u8],
        response_storage: &'a mut [u8],
    ) -> Result<Message<'a>, ClientError> {
        let len = timeout(
            self.config.response_timeout,
            self.datalink.exchange(request_pdu, response_storage),
        )
        .await
        .map_err(|_| ClientError::Timeout)??;

        let mut reader = Reader::new(&response_storage[..len]);
        let message = Message::decode(&mut reader)?;
        if !reader.is_empty() {
            return Err(ClientError::InvalidResponse("trailing bytes in response"));
        }
        if message.header.pdu_ref != pdu_ref {
            return Err(ClientError::InvalidResponse("pdu reference mismatch"));
        }
        if message.header.is_error() {
            return Err(ClientError::Protocol {
                class: message.header.error_class,
                code: message.header.error_code,
            });
        }
        if message.header.message_type != MessageType::AckData {
            return Err(ClientError::InvalidResponse("expected ack data"));
        }

        Ok(message)
    }

    /// Negotiate the PDU length and return the value granted by the PLC.
    pub async fn setup_communication(&self) -> Result<u16, ClientError> {
        let pdu_ref = self.next_pdu_ref();
        let mut req_buf = [0u8; 32];
        let mut writer = Writer::new(&mut req_buf);
        SetupCommunication::new(self.config.requested_pdu_length)
            .encode_request(&mut writer, pdu_ref)?;

        debug!(
            pdu_ref,
            requested = self.config.requested_pdu_length,
            "negotiating s7 pdu length"
        );

        let mut response_buf = [0u8; 64];
        let message = self
            .send_job(pdu_ref, writer.as_written(), &mut response_buf)
            .await?;
        let granted = SetupCommunication::from_message(&message)?.pdu_length;
        if granted > self.config.requested_pdu_length {
            return Err(ClientError::InvalidResponse(
                "plc granted a larger pdu than requested",
            ));
        }

        self.pdu_length.store(granted, Ordering::Relaxed);
        debug!(pdu_ref, pdu_length = granted, "s7 pdu length negotiated");
        Ok(granted)
    }

    /// Write `data` into `area` starting at byte `start`, as one write var job.
    ///
    /// `db_number` is ignored by the PLC for areas other than data blocks.
    pub async fn write_area(
        &self,
        area: Area,
        db_number: u16,
        start: u32,
        data: &[u8],
    ) -> Result<(), ClientError> {
        let max = self.max_write_len().ok_or(ClientError::NotNegotiated)?;
        if data.is_empty() {
            return Err(ClientError::Encode(EncodeError::InvalidLength));
        }
        if data.len() > max {
            return Err(ClientError::PayloadTooLarge {
                len: data.len(),
                max,
            });
        }

        let count = u16::try_from(data.len()).map_err(|_| EncodeError::ValueOutOfRange)?;
        let request = WriteVarRequest {
            address: AnyAddress::bytes(area, db_number, start, count)?,
            data,
        };

        let pdu_ref = self.next_pdu_ref();
        let mut req_buf = [0u8; MAX_PDU_BUF];
        let mut writer = Writer::new(&mut req_buf);
        request.encode(&mut writer, pdu_ref)?;

        debug!(
            pdu_ref,
            area = ?area,
            db_number,
            start,
            len = data.len(),
            "dispatching s7 write var"
        );

        let mut response_buf = [0u8; 64];
        let message = self
            .send_job(pdu_ref, writer.as_written(), &mut response_buf)
            .await?;
        let response = WriteVarResponse::from_message(&message)?;
        if !response.return_code.is_success() {
            return Err(ClientError::WriteRejected(response.return_code));
        }
        Ok(())
    }

    /// Write `data` into data block `db_number` starting at byte `start`.
    pub async fn write_db(&self, db_number: u16, start: u32, data: &[u8]) -> Result<(), ClientError> {
        self.write_area(Area::DataBlocks, db_number, start, data).await
    }

    pub async fn close(&self) -> Result<(), ClientError> {
        self.datalink.close().await?;
        Ok(())
    }
}
