use crate::encoding::{Reader, Writer};
use crate::{DecodeError, EncodeError};

pub const TPKT_HEADER_LEN: usize = 4;
pub const TPKT_VERSION: u8 = 0x03;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TpktHeader {
    /// Total frame length, header included.
    pub length: u16,
}

impl TpktHeader {
    pub fn for_payload(payload_len: usize) -> Result<Self, EncodeError> {
        let length = payload_len
            .checked_add(TPKT_HEADER_LEN)
            .and_then(|len| u16::try_from(len).ok())
            .ok_or(EncodeError::ValueOutOfRange)?;
        Ok(Self { length })
    }

    pub fn payload_len(&self) -> usize {
        usize::from(self.length).saturating_sub(TPKT_HEADER_LEN)
    }

    pub fn encode(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        w.write_u8(TPKT_VERSION)?;
        w.write_u8(0x00)?;
        w.write_be_u16(self.length)?;
        Ok(())
    }

    pub fn decode(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let version = r.read_u8()?;
        let _reserved = r.read_u8()?;
        let length = r.read_be_u16()?;

        if version != TPKT_VERSION {
            return Err(DecodeError::InvalidProtocolId);
        }
        if usize::from(length) <= TPKT_HEADER_LEN {
            return Err(DecodeError::InvalidLength);
        }

        Ok(Self { length })
    }
}

pub fn encode_frame(w: &mut Writer<'_>, payload: &[u8]) -> Result<(), EncodeError> {
    TpktHeader::for_payload(payload.len())?.encode(w)?;
    w.write_all(payload)?;
    Ok(())
}

pub fn decode_frame<'a>(r: &mut Reader<'a>) -> Result<(TpktHeader, &'a [u8]), DecodeError> {
    let header = TpktHeader::decode(r)?;
    let payload = r.read_exact(header.payload_len())?;
    Ok((header, payload))
}

#[cfg(test)]
mod tests {
    use super::{decode_frame, encode_frame, TpktHeader};
    use crate::encoding::{Reader, Writer};
    use crate::{DecodeError, EncodeError};

    #[test]
    fn tpkt_roundtrip() {
        let mut buf = [0u8; 8];
        let mut w = Writer::new(&mut buf);
        encode_frame(&mut w, &[0x02, 0xF0, 0x80]).unwrap();
        assert_eq!(w.as_written(), &[0x03, 0x00, 0x00, 0x07, 0x02, 0xF0, 0x80]);

        let mut r = Reader::new(w.as_written());
        let (header, payload) = decode_frame(&mut r).unwrap();
        assert_eq!(header, TpktHeader { length: 7 });
        assert_eq!(payload, &[0x02, 0xF0, 0x80]);
    }

    #[test]
    fn rejects_wrong_version() {
        let mut r = Reader::new(&[0x02, 0x00, 0x00, 0x07]);
        assert_eq!(
            TpktHeader::decode(&mut r).unwrap_err(),
            DecodeError::InvalidProtocolId
        );
    }

    #[test]
    fn rejects_empty_payload_length() {
        let mut r = Reader::new(&[0x03, 0x00, 0x00, 0x04]);
        assert_eq!(TpktHeader::decode(&mut r).unwrap_err(), DecodeError::InvalidLength);
    }

    #[test]
    fn payload_must_fit_sixteen_bits() {
        assert_eq!(
            TpktHeader::for_payload(usize::from(u16::MAX)).unwrap_err(),
            EncodeError::ValueOutOfRange
        );
    }
}
