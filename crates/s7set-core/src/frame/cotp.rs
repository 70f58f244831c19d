use crate::encoding::{Reader, Writer};
use crate::{DecodeError, EncodeError};

pub const DT_HEADER_LEN: usize = 3;

pub const TPDU_CONNECTION_REQUEST: u8 = 0xE0;
pub const TPDU_CONNECTION_CONFIRM: u8 = 0xD0;
pub const TPDU_DATA: u8 = 0xF0;

const EOT_FLAG: u8 = 0x80;
const PARAM_TPDU_SIZE: u8 = 0xC0;
const PARAM_CALLING_TSAP: u8 = 0xC1;
const PARAM_CALLED_TSAP: u8 = 0xC2;

/// TPDU size code for 1024-byte units (2^10).
pub const TPDU_SIZE_1024: u8 = 0x0A;

/// Local TSAP used by PG-class clients.
pub const LOCAL_TSAP: u16 = 0x0100;

const CONNECTION_TYPE_PG: u16 = 0x01;
const MAX_RACK: u8 = 7;
const MAX_SLOT: u8 = 31;

/// Transport service access points identifying both ends of the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tsap {
    pub local: u16,
    pub remote: u16,
}

impl Tsap {
    /// Address the CPU sitting in `rack`/`slot` as a PG (programming device).
    pub fn rack_slot(rack: u8, slot: u8) -> Result<Self, EncodeError> {
        if rack > MAX_RACK || slot > MAX_SLOT {
            return Err(EncodeError::ValueOutOfRange);
        }
        Ok(Self {
            local: LOCAL_TSAP,
            remote: (CONNECTION_TYPE_PG << 8) | (u16::from(rack) * 0x20 + u16::from(slot)),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectKind {
    Request,
    Confirm,
}

impl ConnectKind {
    const fn code(self) -> u8 {
        match self {
            Self::Request => TPDU_CONNECTION_REQUEST,
            Self::Confirm => TPDU_CONNECTION_CONFIRM,
        }
    }
}

/// A COTP connection request (CR) or connection confirm (CC) unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectTpdu {
    pub kind: ConnectKind,
    pub dst_ref: u16,
    pub src_ref: u16,
    pub tpdu_size: Option<u8>,
    pub calling_tsap: Option<u16>,
    pub called_tsap: Option<u16>,
}

impl ConnectTpdu {
    pub fn request(src_ref: u16, tsap: Tsap) -> Self {
        Self {
            kind: ConnectKind::Request,
            dst_ref: 0,
            src_ref,
            tpdu_size: Some(TPDU_SIZE_1024),
            calling_tsap: Some(tsap.local),
            called_tsap: Some(tsap.remote),
        }
    }

    /// Build the confirm that accepts `request`, echoing its parameters.
    pub fn confirm(request: &Self, src_ref: u16) -> Self {
        Self {
            kind: ConnectKind::Confirm,
            dst_ref: request.src_ref,
            src_ref,
            ..*request
        }
    }

    fn params_len(&self) -> usize {
        self.tpdu_size.map_or(0, |_| 3)
            + self.calling_tsap.map_or(0, |_| 4)
            + self.called_tsap.map_or(0, |_| 4)
    }

    /// Encoded length, including the length indicator byte.
    pub fn encoded_len(&self) -> usize {
        7 + self.params_len()
    }

    pub fn encode(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        let li = u8::try_from(self.encoded_len() - 1).map_err(|_| EncodeError::InvalidLength)?;
        w.write_u8(li)?;
        w.write_u8(self.kind.code())?;
        w.write_be_u16(self.dst_ref)?;
        w.write_be_u16(self.src_ref)?;
        w.write_u8(0x00)?;
        if let Some(size) = self.tpdu_size {
            w.write_all(&[PARAM_TPDU_SIZE, 1, size])?;
        }
        if let Some(tsap) = self.calling_tsap {
            w.write_all(&[PARAM_CALLING_TSAP, 2])?;
            w.write_be_u16(tsap)?;
        }
        if let Some(tsap) = self.called_tsap {
            w.write_all(&[PARAM_CALLED_TSAP, 2])?;
            w.write_be_u16(tsap)?;
        }
        Ok(())
    }

    pub fn decode(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let li = usize::from(r.read_u8()?);
        let mut body = Reader::new(r.read_exact(li)?);

        let code = body.read_u8()?;
        let kind = match code {
            TPDU_CONNECTION_REQUEST => ConnectKind::Request,
            TPDU_CONNECTION_CONFIRM => ConnectKind::Confirm,
            other => return Err(DecodeError::UnexpectedTpdu(other)),
        };
        let dst_ref = body.read_be_u16()?;
        let src_ref = body.read_be_u16()?;
        let _class = body.read_u8()?;

        let mut tpdu = Self {
            kind,
            dst_ref,
            src_ref,
            tpdu_size: None,
            calling_tsap: None,
            called_tsap: None,
        };

        while !body.is_empty() {
            let param = body.read_u8()?;
            let len = usize::from(body.read_u8()?);
            let value = body.read_exact(len)?;
            match (param, value) {
                (PARAM_TPDU_SIZE, [size]) => tpdu.tpdu_size = Some(*size),
                (PARAM_CALLING_TSAP, [hi, lo]) => {
                    tpdu.calling_tsap = Some(u16::from_be_bytes([*hi, *lo]))
                }
                (PARAM_CALLED_TSAP, [hi, lo]) => {
                    tpdu.called_tsap = Some(u16::from_be_bytes([*hi, *lo]))
                }
                // Unknown or oddly sized parameters are skipped.
                _ => {}
            }
        }

        Ok(tpdu)
    }
}

/// TPDU code of a COTP unit without consuming it.
pub fn peek_tpdu_code(payload: &[u8]) -> Result<u8, DecodeError> {
    payload.get(1).copied().ok_or(DecodeError::UnexpectedEof)
}

pub fn encode_data_header(w: &mut Writer<'_>) -> Result<(), EncodeError> {
    w.write_all(&[0x02, TPDU_DATA, EOT_FLAG])
}

/// Decode a DT header and return whether it is the final unit.
pub fn decode_data_header(r: &mut Reader<'_>) -> Result<bool, DecodeError> {
    let li = r.read_u8()?;
    let code = r.read_u8()?;
    if code != TPDU_DATA {
        return Err(DecodeError::UnexpectedTpdu(code));
    }
    if li != 0x02 {
        return Err(DecodeError::InvalidLength);
    }
    let flags = r.read_u8()?;
    Ok(flags & EOT_FLAG != 0)
}

#[cfg(test)]
mod tests {
    use super::{decode_data_header, peek_tpdu_code, ConnectKind, ConnectTpdu, Tsap};
    use crate::encoding::{Reader, Writer};
    use crate::{DecodeError, EncodeError};

    #[test]
    fn rack_slot_tsap() {
        let tsap = Tsap::rack_slot(0, 1).unwrap();
        assert_eq!(tsap.local, 0x0100);
        assert_eq!(tsap.remote, 0x0101);
        assert_eq!(Tsap::rack_slot(1, 3).unwrap().remote, 0x0123);
        assert_eq!(
            Tsap::rack_slot(8, 0).unwrap_err(),
            EncodeError::ValueOutOfRange
        );
    }

    #[test]
    fn connection_request_layout() {
        let cr = ConnectTpdu::request(0x0001, Tsap::rack_slot(0, 1).unwrap());
        let mut buf = [0u8; 32];
        let mut w = Writer::new(&mut buf);
        cr.encode(&mut w).unwrap();
        assert_eq!(
            w.as_written(),
            &[
                0x11, 0xE0, 0x00, 0x00, 0x00, 0x01, 0x00, 0xC0, 0x01, 0x0A, 0xC1, 0x02, 0x01, 0x00,
                0xC2, 0x02, 0x01, 0x01,
            ]
        );
        assert_eq!(peek_tpdu_code(w.as_written()).unwrap(), 0xE0);
    }

    #[test]
    fn confirm_echoes_request() {
        let cr = ConnectTpdu::request(0x0001, Tsap::rack_slot(0, 2).unwrap());
        let cc = ConnectTpdu::confirm(&cr, 0x4431);

        let mut buf = [0u8; 32];
        let mut w = Writer::new(&mut buf);
        cc.encode(&mut w).unwrap();

        let mut r = Reader::new(w.as_written());
        let decoded = ConnectTpdu::decode(&mut r).unwrap();
        assert_eq!(decoded.kind, ConnectKind::Confirm);
        assert_eq!(decoded.dst_ref, 0x0001);
        assert_eq!(decoded.src_ref, 0x4431);
        assert_eq!(decoded.called_tsap, Some(0x0102));
        assert!(r.is_empty());
    }

    #[test]
    fn decode_skips_unknown_parameters() {
        let bytes = [
            0x0C, 0xD0, 0x00, 0x01, 0x00, 0x02, 0x00, 0xC0, 0x01, 0x09, 0xC5, 0x01, 0xFF,
        ];
        let mut r = Reader::new(&bytes);
        let cc = ConnectTpdu::decode(&mut r).unwrap();
        assert_eq!(cc.tpdu_size, Some(0x09));
        assert_eq!(cc.calling_tsap, None);
    }

    #[test]
    fn disconnect_request_is_not_a_connect_tpdu() {
        let bytes = [0x06, 0x80, 0x00, 0x01, 0x00, 0x02, 0x00];
        let mut r = Reader::new(&bytes);
        assert_eq!(
            ConnectTpdu::decode(&mut r).unwrap_err(),
            DecodeError::UnexpectedTpdu(0x80)
        );
    }

    #[test]
    fn data_header_requires_dt_code() {
        let mut r = Reader::new(&[0x02, 0xF0, 0x80]);
        assert!(decode_data_header(&mut r).unwrap());

        let mut r = Reader::new(&[0x02, 0xD0, 0x80]);
        assert_eq!(
            decode_data_header(&mut r).unwrap_err(),
            DecodeError::UnexpectedTpdu(0xD0)
        );
    }
}
