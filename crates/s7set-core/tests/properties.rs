use proptest::prelude::*;
use s7set_core::encoding::{Reader, Writer};
use s7set_core::frame::{cotp, tpkt};
use s7set_core::pdu::{Message, WriteVarRequest, MAX_BYTE_ADDRESS};

proptest! {
    #[test]
    fn random_message_decode_does_not_panic(data in proptest::collection::vec(any::<u8>(), 0..64)) {
        let mut r = Reader::new(&data);
        if let Ok(msg) = Message::decode(&mut r) {
            let _ = WriteVarRequest::from_message(&msg);
        }
    }

    #[test]
    fn random_cotp_decode_does_not_panic(data in proptest::collection::vec(any::<u8>(), 0..40)) {
        let mut r = Reader::new(&data);
        let _ = cotp::ConnectTpdu::decode(&mut r);
        let mut r = Reader::new(&data);
        let _ = tpkt::decode_frame(&mut r);
    }

    #[test]
    fn write_var_preserves_address_and_payload(
        db in any::<u16>(),
        start in 0u32..=MAX_BYTE_ADDRESS,
        payload in proptest::collection::vec(any::<u8>(), 1..=64),
    ) {
        let req = WriteVarRequest::data_block(db, start, &payload).unwrap();
        let mut buf = vec![0u8; req.encoded_len()];
        let mut w = Writer::new(&mut buf);
        req.encode(&mut w, 7).unwrap();

        let mut r = Reader::new(w.as_written());
        let msg = Message::decode(&mut r).unwrap();
        let decoded = WriteVarRequest::from_message(&msg).unwrap();
        prop_assert_eq!(decoded.address.db_number, db);
        prop_assert_eq!(decoded.address.start_byte(), start);
        prop_assert_eq!(decoded.data, payload.as_slice());
    }
}
