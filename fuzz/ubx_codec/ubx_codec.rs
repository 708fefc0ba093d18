#![no_main]
use libfuzzer_sys::fuzz_target;

use bytes::BytesMut;

use ppk_logger::ubx::decode;
use ppk_logger::ubx::Codec;

use tokio_util::codec::Decoder;

fuzz_target!(|input: &[u8]| {
    let mut codec = Codec::new();
    let mut buf = BytesMut::from(input);

    while let Ok(Some(frame)) = codec.decode_eof(&mut buf) {
        assert!(frame.checksum_valid());

        let _ = decode(&frame);
    }
});
