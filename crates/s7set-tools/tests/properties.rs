use proptest::prelude::*;
use s7set_tools::value::{decode_value, encode_value};
use s7set_tools::ErrorKind;

proptest! {
    #[test]
    fn i16_values_round_trip(value in any::<i16>()) {
        let bytes = encode_value(i64::from(value)).unwrap();
        prop_assert_eq!(bytes, value.to_be_bytes());
        prop_assert_eq!(decode_value(bytes), value);
    }

    #[test]
    fn values_outside_i16_are_rejected(value in prop_oneof![i64::MIN..-32768i64, 32768i64..=i64::MAX]) {
        let err = encode_value(value).unwrap_err();
        prop_assert_eq!(err.kind(), ErrorKind::Encoding);
    }
}
