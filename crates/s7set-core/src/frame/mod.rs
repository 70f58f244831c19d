//! ISO-on-TCP framing: RFC 1006 TPKT around ISO 8073 COTP units.

pub mod cotp;
pub mod tpkt;

use crate::encoding::{Reader, Writer};
use crate::{DecodeError, EncodeError};

/// Bytes in front of every S7 PDU on the wire (TPKT header + COTP DT header).
pub const DATA_FRAME_OVERHEAD: usize = tpkt::TPKT_HEADER_LEN + cotp::DT_HEADER_LEN;

/// Wrap one S7 PDU in a TPKT header and a single, final COTP DT unit.
pub fn encode_data_frame(w: &mut Writer<'_>, pdu: &[u8]) -> Result<(), EncodeError> {
    let header = tpkt::TpktHeader::for_payload(cotp::DT_HEADER_LEN + pdu.len())?;
    header.encode(w)?;
    cotp::encode_data_header(w)?;
    w.write_all(pdu)?;
    Ok(())
}

/// Extract the S7 PDU from a TPKT payload that carries a COTP DT unit.
///
/// Only unfragmented units are accepted; S7 peers never split a PDU that fits
/// the negotiated size.
pub fn decode_data_payload(payload: &[u8]) -> Result<&[u8], DecodeError> {
    let mut r = Reader::new(payload);
    let eot = cotp::decode_data_header(&mut r)?;
    if !eot {
        return Err(DecodeError::Fragmented);
    }
    Ok(r.read_rest())
}
