use crate::{encode_data_frame, read_tpkt_payload, DataLinkError};
use s7set_core::encoding::{Reader, Writer};
use s7set_core::frame::{self, cotp, tpkt};
use s7set_core::pdu::{Header, Message};
use std::sync::Arc;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tracing::{debug, warn};

const DEFAULT_MAX_PDU_LEN: usize = 960;
const SERVER_SRC_REF: u16 = 0x0100;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("job rejected with error class {class:#04x}, code {code:#04x}")]
    Rejected { class: u8, code: u8 },
    #[error("invalid request: {0}")]
    InvalidRequest(&'static str),
    #[error("internal error: {0}")]
    Internal(&'static str),
}

impl ServiceError {
    /// Error class and code reported to the peer in the acknowledgement header.
    pub const fn class_and_code(&self) -> (u8, u8) {
        match self {
            Self::Rejected { class, code } => (*class, *code),
            Self::InvalidRequest(_) => (0x84, 0x04),
            Self::Internal(_) => (0x83, 0x00),
        }
    }
}

pub trait S7Service: Send + Sync + 'static {
    /// Handle a decoded job and write the acknowledgement PDU into `response_pdu`.
    ///
    /// Return the number of bytes written. The response is a complete S7 PDU,
    /// header included, without TPKT/COTP framing.
    fn handle(&self, request: Message<'_>, response_pdu: &mut [u8]) -> Result<usize, ServiceError>;
}

impl<T> S7Service for Arc<T>
where
    T: S7Service + ?Sized,
{
    fn handle(&self, request: Message<'_>, response_pdu: &mut [u8]) -> Result<usize, ServiceError> {
        (**self).handle(request, response_pdu)
    }
}

pub struct S7TcpServer<S> {
    listener: TcpListener,
    service: Arc<S>,
    max_pdu_len: usize,
}

impl<S: S7Service> S7TcpServer<S> {
    pub async fn bind<A: ToSocketAddrs>(addr: A, service: S) -> Result<Self, DataLinkError> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self::from_listener(listener, service))
    }

    pub fn from_listener(listener: TcpListener, service: S) -> Self {
        Self {
            listener,
            service: Arc::new(service),
            max_pdu_len: DEFAULT_MAX_PDU_LEN,
        }
    }

    pub fn local_addr(&self) -> Result<std::net::SocketAddr, DataLinkError> {
        Ok(self.listener.local_addr()?)
    }

    pub fn with_max_pdu_len(mut self, max_pdu_len: usize) -> Self {
        self.max_pdu_len = max_pdu_len;
        self
    }

    pub async fn run(self) -> Result<(), DataLinkError> {
        loop {
            let (socket, peer) = self.listener.accept().await?;
            let service = Arc::clone(&self.service);
            let max_pdu_len = self.max_pdu_len;

            tokio::spawn(async move {
                if let Err(err) = handle_connection(socket, service, max_pdu_len).await {
                    warn!(%peer, error = %err, "s7 server connection ended with error");
                }
            });
        }
    }
}

async fn handle_connection<S: S7Service>(
    mut socket: TcpStream,
    service: Arc<S>,
    max_pdu_len: usize,
) -> Result<(), DataLinkError> {
    let payload = read_tpkt_payload(&mut socket).await?;
    let request = cotp::ConnectTpdu::decode(&mut Reader::new(&payload))?;
    if request.kind != cotp::ConnectKind::Request {
        return Err(DataLinkError::InvalidResponse("expected cotp connection request"));
    }

    let confirm = cotp::ConnectTpdu::confirm(&request, SERVER_SRC_REF);
    let mut cc = [0u8; 32];
    let mut cw = Writer::new(&mut cc);
    confirm.encode(&mut cw)?;
    let mut cc_frame = [0u8; 40];
    let mut w = Writer::new(&mut cc_frame);
    tpkt::encode_frame(&mut w, cw.as_written())?;
    socket.write_all(w.as_written()).await?;
    debug!(called_tsap = ?request.called_tsap, "accepted iso connection");

    let mut response_pdu = vec![0u8; max_pdu_len];
    loop {
        let payload = match read_tpkt_payload(&mut socket).await {
            Ok(payload) => payload,
            Err(DataLinkError::ConnectionClosed) => return Ok(()),
            Err(err) => return Err(err),
        };
        let pdu = frame::decode_data_payload(&payload)?;
        let message = Message::decode(&mut Reader::new(pdu))?;
        let pdu_ref = message.header.pdu_ref;

        let len = match service.handle(message, &mut response_pdu) {
            Ok(len) => len,
            Err(err) => {
                warn!(pdu_ref, error = %err, "s7 job failed");
                let (class, code) = err.class_and_code();
                let mut w = Writer::new(&mut response_pdu);
                Header::error(pdu_ref, class, code).encode(&mut w)?;
                w.position()
            }
        };

        let reply = encode_data_frame(&response_pdu[..len])?;
        socket.write_all(&reply).await?;
    }
}
