//! Async ISO-on-TCP (RFC 1006) transport for S7 PDUs.

#![forbid(unsafe_code)]

use async_trait::async_trait;
use s7set_core::encoding::{Reader, Writer};
use s7set_core::frame::{self, cotp, tpkt};
use s7set_core::{DecodeError, EncodeError};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::sync::Mutex;
use tracing::{debug, trace};

pub mod server;
pub mod sim;

pub use s7set_core::frame::cotp::Tsap;
pub use server::{S7Service, S7TcpServer, ServiceError};
pub use sim::InMemoryS7Service;

/// Well-known ISO-on-TCP port.
pub const ISO_TCP_PORT: u16 = 102;

const CLIENT_SRC_REF: u16 = 0x0001;

#[derive(Debug, Error)]
pub enum DataLinkError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("encode error: {0}")]
    Encode(#[from] EncodeError),
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),
    #[error("connection closed")]
    ConnectionClosed,
    #[error("iso connection rejected (tpdu {0:#04x})")]
    ConnectionRejected(u8),
    #[error("invalid response: {0}")]
    InvalidResponse(&'static str),
    #[error("response buffer too small (needed {needed}, available {available})")]
    ResponseBufferTooSmall { needed: usize, available: usize },
}

#[async_trait]
pub trait DataLink: Send + Sync {
    /// Send one S7 PDU and write the peer's reply PDU into `response_pdu`.
    ///
    /// Returns the number of response bytes written to `response_pdu`.
    async fn exchange(
        &self,
        request_pdu: &[u8],
        response_pdu: &mut [u8],
    ) -> Result<usize, DataLinkError>;

    /// Close the underlying connection.
    async fn close(&self) -> Result<(), DataLinkError>;
}

#[derive(Debug)]
pub struct S7TcpTransport {
    stream: Mutex<TcpStream>,
}

impl S7TcpTransport {
    /// Open a TCP connection and run the COTP connection handshake.
    pub async fn connect<A: ToSocketAddrs>(addr: A, tsap: Tsap) -> Result<Self, DataLinkError> {
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        Self::handshake(stream, tsap).await
    }

    pub async fn handshake(mut stream: TcpStream, tsap: Tsap) -> Result<Self, DataLinkError> {
        let request = cotp::ConnectTpdu::request(CLIENT_SRC_REF, tsap);
        let mut payload = [0u8; 32];
        let mut pw = Writer::new(&mut payload);
        request.encode(&mut pw)?;

        let mut frame_buf = [0u8; 40];
        let mut w = Writer::new(&mut frame_buf);
        tpkt::encode_frame(&mut w, pw.as_written())?;
        stream.write_all(w.as_written()).await?;

        let reply = read_tpkt_payload(&mut stream).await?;
        let code = cotp::peek_tpdu_code(&reply)?;
        if code != cotp::TPDU_CONNECTION_CONFIRM {
            return Err(DataLinkError::ConnectionRejected(code));
        }
        let confirm = cotp::ConnectTpdu::decode(&mut Reader::new(&reply))?;
        debug!(
            local_tsap = tsap.local,
            remote_tsap = tsap.remote,
            peer_ref = confirm.src_ref,
            "iso connection established"
        );

        Ok(Self::from_stream(stream))
    }

    /// Wrap a stream on which the COTP handshake already completed.
    pub fn from_stream(stream: TcpStream) -> Self {
        Self {
            stream: Mutex::new(stream),
        }
    }
}

/// Read one TPKT frame and return its payload.
pub(crate) async fn read_tpkt_payload<S>(stream: &mut S) -> Result<Vec<u8>, DataLinkError>
where
    S: AsyncRead + Unpin,
{
    let mut header = [0u8; tpkt::TPKT_HEADER_LEN];
    read_exact_or_connection_closed(stream, &mut header).await?;
    let header = tpkt::TpktHeader::decode(&mut Reader::new(&header))?;

    let mut payload = vec![0u8; header.payload_len()];
    read_exact_or_connection_closed(stream, &mut payload).await?;
    Ok(payload)
}

async fn read_exact_or_connection_closed<S>(
    stream: &mut S,
    buf: &mut [u8],
) -> Result<(), DataLinkError>
where
    S: AsyncRead + Unpin,
{
    if let Err(err) = stream.read_exact(buf).await {
        if err.kind() == std::io::ErrorKind::UnexpectedEof {
            return Err(DataLinkError::ConnectionClosed);
        }
        return Err(DataLinkError::Io(err));
    }
    Ok(())
}

pub(crate) fn encode_data_frame(pdu: &[u8]) -> Result<Vec<u8>, DataLinkError> {
    let mut frame_buf = vec![0u8; frame::DATA_FRAME_OVERHEAD + pdu.len()];
    let mut w = Writer::new(&mut frame_buf);
    frame::encode_data_frame(&mut w, pdu)?;
    Ok(frame_buf)
}

#[async_trait]
impl DataLink for S7TcpTransport {
    async fn exchange(
        &self,
        request_pdu: &[u8],
        response_pdu: &mut [u8],
    ) -> Result<usize, DataLinkError> {
        if request_pdu.is_empty() {
            return Err(DataLinkError::InvalidResponse("empty request pdu"));
        }

        let request = encode_data_frame(request_pdu)?;
        let mut stream = self.stream.lock().await;
        trace!(pdu_len = request_pdu.len(), "sending s7 pdu");
        stream.write_all(&request).await?;

        let payload = read_tpkt_payload(&mut *stream).await?;
        let pdu = frame::decode_data_payload(&payload)?;
        if pdu.is_empty() {
            return Err(DataLinkError::InvalidResponse("empty response pdu"));
        }
        if pdu.len() > response_pdu.len() {
            return Err(DataLinkError::ResponseBufferTooSmall {
                needed: pdu.len(),
                available: response_pdu.len(),
            });
        }

        response_pdu[..pdu.len()].copy_from_slice(pdu);
        trace!(pdu_len = pdu.len(), "received s7 pdu");
        Ok(pdu.len())
    }

    async fn close(&self) -> Result<(), DataLinkError> {
        let mut stream = self.stream.lock().await;
        stream.shutdown().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{DataLink, DataLinkError, S7TcpTransport, Tsap};
    use s7set_core::encoding::Writer;
    use s7set_core::frame::tpkt;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const CONFIRM: &[u8] = &[
        0x03, 0x00, 0x00, 0x16, 0x11, 0xD0, 0x00, 0x01, 0x44, 0x31, 0x00, 0xC0, 0x01, 0x0A, 0xC1,
        0x02, 0x01, 0x00, 0xC2, 0x02, 0x01, 0x01,
    ];

    #[tokio::test]
    async fn handshake_then_exchange() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();

            let mut cr = [0u8; 22];
            socket.read_exact(&mut cr).await.unwrap();
            assert_eq!(cr[5], 0xE0);
            assert_eq!(&cr[20..], &[0x01, 0x01]);
            socket.write_all(CONFIRM).await.unwrap();

            let mut req = [0u8; 9];
            socket.read_exact(&mut req).await.unwrap();
            assert_eq!(&req, &[0x03, 0x00, 0x00, 0x09, 0x02, 0xF0, 0x80, 0xAA, 0xBB]);
            socket
                .write_all(&[0x03, 0x00, 0x00, 0x0A, 0x02, 0xF0, 0x80, 0x01, 0x02, 0x03])
                .await
                .unwrap();
        });

        let transport = S7TcpTransport::connect(addr, Tsap::rack_slot(0, 1).unwrap())
            .await
            .unwrap();
        let mut response = [0u8; 16];
        let len = transport.exchange(&[0xAA, 0xBB], &mut response).await.unwrap();
        assert_eq!(&response[..len], &[0x01, 0x02, 0x03]);

        server.await.unwrap();
    }

    #[tokio::test]
    async fn handshake_rejects_disconnect_request() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut cr = [0u8; 22];
            socket.read_exact(&mut cr).await.unwrap();

            let mut frame = [0u8; 16];
            let mut w = Writer::new(&mut frame);
            tpkt::encode_frame(&mut w, &[0x06, 0x80, 0x00, 0x01, 0x00, 0x00, 0x00]).unwrap();
            socket.write_all(w.as_written()).await.unwrap();
        });

        let err = S7TcpTransport::connect(addr, Tsap::rack_slot(0, 1).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, DataLinkError::ConnectionRejected(0x80)));

        server.await.unwrap();
    }

    #[tokio::test]
    async fn exchange_rejects_fragmented_reply() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut cr = [0u8; 22];
            socket.read_exact(&mut cr).await.unwrap();
            socket.write_all(CONFIRM).await.unwrap();

            let mut req = [0u8; 8];
            socket.read_exact(&mut req).await.unwrap();
            socket
                .write_all(&[0x03, 0x00, 0x00, 0x08, 0x02, 0xF0, 0x00, 0x32])
                .await
                .unwrap();
        });

        let transport = S7TcpTransport::connect(addr, Tsap::rack_slot(0, 1).unwrap())
            .await
            .unwrap();
        let mut response = [0u8; 16];
        let err = transport.exchange(&[0x32], &mut response).await.unwrap_err();
        assert!(matches!(
            err,
            DataLinkError::Decode(s7set_core::DecodeError::Fragmented)
        ));

        server.await.unwrap();
    }

    #[tokio::test]
    async fn peer_close_is_reported() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut cr = [0u8; 22];
            socket.read_exact(&mut cr).await.unwrap();
        });

        let err = S7TcpTransport::connect(addr, Tsap::rack_slot(0, 1).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, DataLinkError::ConnectionClosed));

        server.await.unwrap();
    }
}
