use crate::encoding::{Reader, Writer};
use crate::{DecodeError, EncodeError};

pub const PROTOCOL_ID: u8 = 0x32;
pub const JOB_HEADER_LEN: usize = 10;
pub const ACK_HEADER_LEN: usize = 12;

/// S7 "ROSCTR" field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    Job,
    Ack,
    AckData,
    UserData,
}

impl MessageType {
    pub const fn as_u8(self) -> u8 {
        match self {
            Self::Job => 0x01,
            Self::Ack => 0x02,
            Self::AckData => 0x03,
            Self::UserData => 0x07,
        }
    }

    pub fn from_u8(value: u8) -> Result<Self, DecodeError> {
        match value {
            0x01 => Ok(Self::Job),
            0x02 => Ok(Self::Ack),
            0x03 => Ok(Self::AckData),
            0x07 => Ok(Self::UserData),
            _ => Err(DecodeError::InvalidValue),
        }
    }

    /// Acknowledgements carry two extra bytes: error class and error code.
    pub const fn carries_error(self) -> bool {
        matches!(self, Self::Ack | Self::AckData)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub message_type: MessageType,
    pub pdu_ref: u16,
    pub param_len: u16,
    pub data_len: u16,
    pub error_class: u8,
    pub error_code: u8,
}

impl Header {
    pub const fn job(pdu_ref: u16, param_len: u16, data_len: u16) -> Self {
        Self {
            message_type: MessageType::Job,
            pdu_ref,
            param_len,
            data_len,
            error_class: 0,
            error_code: 0,
        }
    }

    pub const fn ack_data(pdu_ref: u16, param_len: u16, data_len: u16) -> Self {
        Self {
            message_type: MessageType::AckData,
            pdu_ref,
            param_len,
            data_len,
            error_class: 0,
            error_code: 0,
        }
    }

    /// An acknowledgement without parameters that reports a failed job.
    pub const fn error(pdu_ref: u16, error_class: u8, error_code: u8) -> Self {
        Self {
            message_type: MessageType::AckData,
            pdu_ref,
            param_len: 0,
            data_len: 0,
            error_class,
            error_code,
        }
    }

    pub const fn encoded_len(&self) -> usize {
        if self.message_type.carries_error() {
            ACK_HEADER_LEN
        } else {
            JOB_HEADER_LEN
        }
    }

    pub const fn is_error(&self) -> bool {
        self.error_class != 0 || self.error_code != 0
    }

    pub fn encode(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        w.write_u8(PROTOCOL_ID)?;
        w.write_u8(self.message_type.as_u8())?;
        w.write_be_u16(0x0000)?;
        w.write_be_u16(self.pdu_ref)?;
        w.write_be_u16(self.param_len)?;
        w.write_be_u16(self.data_len)?;
        if self.message_type.carries_error() {
            w.write_u8(self.error_class)?;
            w.write_u8(self.error_code)?;
        }
        Ok(())
    }

    pub fn decode(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        if r.read_u8()? != PROTOCOL_ID {
            return Err(DecodeError::InvalidProtocolId);
        }
        let message_type = MessageType::from_u8(r.read_u8()?)?;
        let _redundancy = r.read_be_u16()?;
        let pdu_ref = r.read_be_u16()?;
        let param_len = r.read_be_u16()?;
        let data_len = r.read_be_u16()?;
        let (error_class, error_code) = if message_type.carries_error() {
            (r.read_u8()?, r.read_u8()?)
        } else {
            (0, 0)
        };

        Ok(Self {
            message_type,
            pdu_ref,
            param_len,
            data_len,
            error_class,
            error_code,
        })
    }
}
