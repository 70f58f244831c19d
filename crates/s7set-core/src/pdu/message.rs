use crate::encoding::Reader;
use crate::pdu::{Function, Header};
use crate::DecodeError;

/// A decoded S7 PDU with its parameter and data sections borrowed from the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Message<'a> {
    pub header: Header,
    pub params: &'a [u8],
    pub data: &'a [u8],
}

impl<'a> Message<'a> {
    pub fn decode(r: &mut Reader<'a>) -> Result<Self, DecodeError> {
        let header = Header::decode(r)?;
        let params = r.read_exact(usize::from(header.param_len))?;
        let data = r.read_exact(usize::from(header.data_len))?;
        Ok(Self {
            header,
            params,
            data,
        })
    }

    /// Function code, i.e. the first parameter byte.
    pub fn function(&self) -> Result<Function, DecodeError> {
        self.params
            .first()
            .copied()
            .map(Function::from_u8)
            .ok_or(DecodeError::UnexpectedEof)
    }

    pub(crate) fn expect_function(&self, expected: Function) -> Result<Reader<'a>, DecodeError> {
        let function = self.function()?;
        if function != expected {
            return Err(DecodeError::UnexpectedFunction(function.as_u8()));
        }
        let mut params = Reader::new(self.params);
        params.read_u8()?;
        Ok(params)
    }
}
