use core::fmt;

/// Per-item result of a read/write var job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnCode {
    Reserved,
    HardwareFault,
    AccessDenied,
    InvalidAddress,
    DataTypeNotSupported,
    DataTypeInconsistent,
    ObjectDoesNotExist,
    Success,
    Other(u8),
}

impl ReturnCode {
    pub const fn as_u8(self) -> u8 {
        match self {
            Self::Reserved => 0x00,
            Self::HardwareFault => 0x01,
            Self::AccessDenied => 0x03,
            Self::InvalidAddress => 0x05,
            Self::DataTypeNotSupported => 0x06,
            Self::DataTypeInconsistent => 0x07,
            Self::ObjectDoesNotExist => 0x0A,
            Self::Success => 0xFF,
            Self::Other(code) => code,
        }
    }

    pub const fn from_u8(value: u8) -> Self {
        match value {
            0x00 => Self::Reserved,
            0x01 => Self::HardwareFault,
            0x03 => Self::AccessDenied,
            0x05 => Self::InvalidAddress,
            0x06 => Self::DataTypeNotSupported,
            0x07 => Self::DataTypeInconsistent,
            0x0A => Self::ObjectDoesNotExist,
            0xFF => Self::Success,
            other => Self::Other(other),
        }
    }

    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

impl fmt::Display for ReturnCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reserved => f.write_str("reserved"),
            Self::HardwareFault => f.write_str("hardware fault"),
            Self::AccessDenied => f.write_str("access to object not allowed"),
            Self::InvalidAddress => f.write_str("invalid address"),
            Self::DataTypeNotSupported => f.write_str("data type not supported"),
            Self::DataTypeInconsistent => f.write_str("data type inconsistent"),
            Self::ObjectDoesNotExist => f.write_str("object does not exist"),
            Self::Success => f.write_str("success"),
            Self::Other(code) => write!(f, "return code {code:#04x}"),
        }
    }
}
