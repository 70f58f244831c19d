use crate::error::SetError;

/// Encode `value` as a big-endian two's-complement `i16`.
pub fn encode_value(value: i64) -> Result<[u8; 2], SetError> {
    i16::try_from(value)
        .map(i16::to_be_bytes)
        .map_err(|_| SetError::ValueOutOfRange(value))
}

pub fn decode_value(bytes: [u8; 2]) -> i16 {
    i16::from_be_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::{decode_value, encode_value};
    use crate::{ErrorKind, SetError};

    #[test]
    fn known_encodings() {
        assert_eq!(encode_value(1).unwrap(), [0x00, 0x01]);
        assert_eq!(encode_value(-1).unwrap(), [0xFF, 0xFF]);
        assert_eq!(encode_value(32767).unwrap(), [0x7F, 0xFF]);
        assert_eq!(encode_value(-32768).unwrap(), [0x80, 0x00]);
        assert_eq!(encode_value(225).unwrap(), [0x00, 0xE1]);
        assert_eq!(encode_value(-50).unwrap(), [0xFF, 0xCE]);
        assert_eq!(decode_value([0xFF, 0xCE]), -50);
    }

    #[test]
    fn out_of_range_does_not_wrap() {
        for value in [32768, -32769, 40000, -40000, i64::MAX, i64::MIN] {
            let err = encode_value(value).unwrap_err();
            assert!(matches!(err, SetError::ValueOutOfRange(v) if v == value));
            assert_eq!(err.kind(), ErrorKind::Encoding);
        }
    }
}
