use crate::encoding::Writer;
use crate::pdu::{Function, Header, Message, MessageType};
use crate::{DecodeError, EncodeError};

pub const SETUP_PARAM_LEN: u16 = 8;

/// "Setup communication": negotiates the PDU size and the number of parallel jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetupCommunication {
    pub max_amq_calling: u16,
    pub max_amq_called: u16,
    pub pdu_length: u16,
}

impl SetupCommunication {
    /// One outstanding job in each direction.
    pub const fn new(pdu_length: u16) -> Self {
        Self {
            max_amq_calling: 1,
            max_amq_called: 1,
            pdu_length,
        }
    }

    pub const fn encoded_len(message_type: MessageType) -> usize {
        Header::job(0, 0, 0).encoded_len()
            + if message_type.carries_error() { 2 } else { 0 }
            + SETUP_PARAM_LEN as usize
    }

    pub fn encode_request(&self, w: &mut Writer<'_>, pdu_ref: u16) -> Result<(), EncodeError> {
        Header::job(pdu_ref, SETUP_PARAM_LEN, 0).encode(w)?;
        self.encode_params(w)
    }

    pub fn encode_response(&self, w: &mut Writer<'_>, pdu_ref: u16) -> Result<(), EncodeError> {
        Header::ack_data(pdu_ref, SETUP_PARAM_LEN, 0).encode(w)?;
        self.encode_params(w)
    }

    fn encode_params(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        w.write_u8(Function::SetupCommunication.as_u8())?;
        w.write_u8(0x00)?;
        w.write_be_u16(self.max_amq_calling)?;
        w.write_be_u16(self.max_amq_called)?;
        w.write_be_u16(self.pdu_length)?;
        Ok(())
    }

    pub fn from_message(msg: &Message<'_>) -> Result<Self, DecodeError> {
        let mut params = msg.expect_function(Function::SetupCommunication)?;
        let _reserved = params.read_u8()?;
        let setup = Self {
            max_amq_calling: params.read_be_u16()?,
            max_amq_called: params.read_be_u16()?,
            pdu_length: params.read_be_u16()?,
        };
        if setup.pdu_length == 0 {
            return Err(DecodeError::InvalidValue);
        }
        Ok(setup)
    }
}

#[cfg(test)]
mod tests {
    use super::SetupCommunication;
    use crate::encoding::{Reader, Writer};
    use crate::pdu::{Message, MessageType};
    use crate::DecodeError;

    #[test]
    fn request_length() {
        assert_eq!(SetupCommunication::encoded_len(MessageType::Job), 18);
        assert_eq!(SetupCommunication::encoded_len(MessageType::AckData), 20);
    }

    #[test]
    fn response_roundtrip() {
        let mut buf = [0u8; 20];
        let mut w = Writer::new(&mut buf);
        SetupCommunication::new(240).encode_response(&mut w, 9).unwrap();

        let mut r = Reader::new(w.as_written());
        let msg = Message::decode(&mut r).unwrap();
        assert_eq!(msg.header.pdu_ref, 9);
        assert_eq!(
            SetupCommunication::from_message(&msg).unwrap(),
            SetupCommunication::new(240)
        );
    }

    #[test]
    fn zero_pdu_length_is_rejected() {
        let mut buf = [0u8; 20];
        let mut w = Writer::new(&mut buf);
        SetupCommunication::new(0).encode_response(&mut w, 1).unwrap();

        let mut r = Reader::new(w.as_written());
        let msg = Message::decode(&mut r).unwrap();
        assert_eq!(
            SetupCommunication::from_message(&msg).unwrap_err(),
            DecodeError::InvalidValue
        );
    }
}
