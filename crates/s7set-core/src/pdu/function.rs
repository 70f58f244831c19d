#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    ReadVar,
    WriteVar,
    SetupCommunication,
    Other(u8),
}

impl Function {
    pub const fn as_u8(self) -> u8 {
        match self {
            Self::ReadVar => 0x04,
            Self::WriteVar => 0x05,
            Self::SetupCommunication => 0xF0,
            Self::Other(code) => code,
        }
    }

    pub const fn from_u8(value: u8) -> Self {
        match value {
            0x04 => Self::ReadVar,
            0x05 => Self::WriteVar,
            0xF0 => Self::SetupCommunication,
            other => Self::Other(other),
        }
    }
}
