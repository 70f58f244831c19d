use crate::encoding::writer::MAX_U24;
use crate::encoding::{Reader, Writer};
use crate::{DecodeError, EncodeError};

pub const ANY_ITEM_LEN: usize = 12;

/// Highest byte offset that still fits the 24-bit S7ANY bit address.
pub const MAX_BYTE_ADDRESS: u32 = MAX_U24 >> 3;

const VAR_SPEC: u8 = 0x12;
const ANY_ADDRESS_LEN: u8 = 0x0A;
const SYNTAX_ID_S7ANY: u8 = 0x10;

/// Memory area of an S7 CPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Area {
    Inputs,
    Outputs,
    Flags,
    DataBlocks,
    Other(u8),
}

impl Area {
    pub const fn as_u8(self) -> u8 {
        match self {
            Self::Inputs => 0x81,
            Self::Outputs => 0x82,
            Self::Flags => 0x83,
            Self::DataBlocks => 0x84,
            Self::Other(code) => code,
        }
    }

    pub const fn from_u8(value: u8) -> Self {
        match value {
            0x81 => Self::Inputs,
            0x82 => Self::Outputs,
            0x83 => Self::Flags,
            0x84 => Self::DataBlocks,
            other => Self::Other(other),
        }
    }
}

/// Element type of an S7ANY address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportSize {
    Bit,
    Byte,
    Word,
    Int,
    DWord,
    Other(u8),
}

impl TransportSize {
    pub const fn as_u8(self) -> u8 {
        match self {
            Self::Bit => 0x01,
            Self::Byte => 0x02,
            Self::Word => 0x04,
            Self::Int => 0x05,
            Self::DWord => 0x06,
            Self::Other(code) => code,
        }
    }

    pub const fn from_u8(value: u8) -> Self {
        match value {
            0x01 => Self::Bit,
            0x02 => Self::Byte,
            0x04 => Self::Word,
            0x05 => Self::Int,
            0x06 => Self::DWord,
            other => Self::Other(other),
        }
    }
}

/// Transport size used in the data section of read/write var items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataTransportSize {
    Null,
    Bit,
    Byte,
    Int,
    Real,
    OctetString,
    Other(u8),
}

impl DataTransportSize {
    pub const fn as_u8(self) -> u8 {
        match self {
            Self::Null => 0x00,
            Self::Bit => 0x03,
            Self::Byte => 0x04,
            Self::Int => 0x05,
            Self::Real => 0x07,
            Self::OctetString => 0x09,
            Self::Other(code) => code,
        }
    }

    pub const fn from_u8(value: u8) -> Self {
        match value {
            0x00 => Self::Null,
            0x03 => Self::Bit,
            0x04 => Self::Byte,
            0x05 => Self::Int,
            0x07 => Self::Real,
            0x09 => Self::OctetString,
            other => Self::Other(other),
        }
    }

    /// Whether the item length field counts bits rather than bytes.
    pub const fn length_in_bits(self) -> bool {
        matches!(self, Self::Bit | Self::Byte | Self::Int)
    }
}

/// S7ANY item address: `count` elements of `transport_size` at `bit_address`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnyAddress {
    pub transport_size: TransportSize,
    pub count: u16,
    pub db_number: u16,
    pub area: Area,
    pub bit_address: u32,
}

impl AnyAddress {
    /// `count` bytes starting at byte offset `start`.
    pub fn bytes(area: Area, db_number: u16, start: u32, count: u16) -> Result<Self, EncodeError> {
        if start > MAX_BYTE_ADDRESS {
            return Err(EncodeError::ValueOutOfRange);
        }
        Ok(Self {
            transport_size: TransportSize::Byte,
            count,
            db_number,
            area,
            bit_address: start << 3,
        })
    }

    pub const fn start_byte(&self) -> u32 {
        self.bit_address >> 3
    }

    pub fn encode(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        w.write_u8(VAR_SPEC)?;
        w.write_u8(ANY_ADDRESS_LEN)?;
        w.write_u8(SYNTAX_ID_S7ANY)?;
        w.write_u8(self.transport_size.as_u8())?;
        w.write_be_u16(self.count)?;
        w.write_be_u16(self.db_number)?;
        w.write_u8(self.area.as_u8())?;
        w.write_be_u24(self.bit_address)?;
        Ok(())
    }

    pub fn decode(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let var_spec = r.read_u8()?;
        let len = r.read_u8()?;
        let syntax_id = r.read_u8()?;
        if var_spec != VAR_SPEC || len != ANY_ADDRESS_LEN || syntax_id != SYNTAX_ID_S7ANY {
            return Err(DecodeError::Unsupported);
        }

        Ok(Self {
            transport_size: TransportSize::from_u8(r.read_u8()?),
            count: r.read_be_u16()?,
            db_number: r.read_be_u16()?,
            area: Area::from_u8(r.read_u8()?),
            bit_address: r.read_be_u24()?,
        })
    }
}
