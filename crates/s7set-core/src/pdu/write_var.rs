use crate::encoding::{Reader, Writer};
use crate::pdu::header::JOB_HEADER_LEN;
use crate::pdu::item::ANY_ITEM_LEN;
use crate::pdu::{AnyAddress, Area, DataTransportSize, Function, Header, Message, ReturnCode};
use crate::{DecodeError, EncodeError};

const WRITE_VAR_PARAM_LEN: usize = 2 + ANY_ITEM_LEN;
const DATA_ITEM_HEADER_LEN: usize = 4;

/// Bytes of a single-item write var job that are not payload.
pub const WRITE_VAR_OVERHEAD: usize = JOB_HEADER_LEN + WRITE_VAR_PARAM_LEN + DATA_ITEM_HEADER_LEN;

/// Single-item "write var" job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteVarRequest<'a> {
    pub address: AnyAddress,
    pub data: &'a [u8],
}

impl<'a> WriteVarRequest<'a> {
    /// Write `data` into data block `db_number` starting at byte `start`.
    pub fn data_block(db_number: u16, start: u32, data: &'a [u8]) -> Result<Self, EncodeError> {
        let count = u16::try_from(data.len()).map_err(|_| EncodeError::ValueOutOfRange)?;
        Ok(Self {
            address: AnyAddress::bytes(Area::DataBlocks, db_number, start, count)?,
            data,
        })
    }

    pub fn encoded_len(&self) -> usize {
        WRITE_VAR_OVERHEAD + self.data.len()
    }

    pub fn encode(&self, w: &mut Writer<'_>, pdu_ref: u16) -> Result<(), EncodeError> {
        let bit_len = self
            .data
            .len()
            .checked_mul(8)
            .and_then(|bits| u16::try_from(bits).ok())
            .ok_or(EncodeError::ValueOutOfRange)?;
        let data_len = u16::try_from(DATA_ITEM_HEADER_LEN + self.data.len())
            .map_err(|_| EncodeError::ValueOutOfRange)?;

        Header::job(pdu_ref, WRITE_VAR_PARAM_LEN as u16, data_len).encode(w)?;
        w.write_u8(Function::WriteVar.as_u8())?;
        w.write_u8(1)?;
        self.address.encode(w)?;

        w.write_u8(0x00)?;
        w.write_u8(DataTransportSize::Byte.as_u8())?;
        w.write_be_u16(bit_len)?;
        w.write_all(self.data)?;
        Ok(())
    }

    /// Decode a job that writes exactly one item.
    pub fn from_message(msg: &Message<'a>) -> Result<Self, DecodeError> {
        let mut params = msg.expect_function(Function::WriteVar)?;
        if params.read_u8()? != 1 {
            return Err(DecodeError::Unsupported);
        }
        let address = AnyAddress::decode(&mut params)?;

        let mut data = Reader::new(msg.data);
        let _reserved = data.read_u8()?;
        let transport_size = DataTransportSize::from_u8(data.read_u8()?);
        let len = usize::from(data.read_be_u16()?);
        let byte_len = if transport_size.length_in_bits() {
            len.div_ceil(8)
        } else {
            len
        };

        Ok(Self {
            address,
            data: data.read_exact(byte_len)?,
        })
    }
}

/// Acknowledgement of a single-item write var job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteVarResponse {
    pub return_code: ReturnCode,
}

impl WriteVarResponse {
    pub const ENCODED_LEN: usize = 15;

    pub fn encode(&self, w: &mut Writer<'_>, pdu_ref: u16) -> Result<(), EncodeError> {
        Header::ack_data(pdu_ref, 2, 1).encode(w)?;
        w.write_u8(Function::WriteVar.as_u8())?;
        w.write_u8(1)?;
        w.write_u8(self.return_code.as_u8())?;
        Ok(())
    }

    pub fn from_message(msg: &Message<'_>) -> Result<Self, DecodeError> {
        let mut params = msg.expect_function(Function::WriteVar)?;
        if params.read_u8()? == 0 {
            return Err(DecodeError::InvalidLength);
        }
        let mut data = Reader::new(msg.data);
        Ok(Self {
            return_code: ReturnCode::from_u8(data.read_u8()?),
        })
    }
}
