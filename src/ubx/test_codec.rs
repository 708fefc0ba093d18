use crate::ubx::fixtures;
use crate::ubx::fixtures::Pvt;
use crate::ubx::Codec;
use crate::ubx::FrameReader;
use crate::ubx::MessageType;
use crate::ubx::RawFrame;

use bytes::BytesMut;

use tokio_util::codec::Decoder;
use tokio_util::codec::Encoder;

#[test]
fn test_checksum() {
    // UBX-CFG-RATE poll from the u-blox protocol description
    let frame = RawFrame::build(0x06, 0x08, &[]).unwrap();

    assert_eq!(&[0xb5, 0x62, 0x06, 0x08, 0x00, 0x00, 0x0e, 0x30], frame.as_bytes());
    assert!(frame.checksum_valid());
}

#[test]
fn test_decode_frames_same_read() {
    let mut codec = Codec::new();

    let a = Pvt::default().frame();
    let b = fixtures::rawx(2);

    let mut buf = BytesMut::from(&fixtures::concat(&[a.clone(), b.clone()])[..]);

    assert_eq!(Some(a), codec.decode(&mut buf).unwrap());
    assert_eq!(Some(b), codec.decode(&mut buf).unwrap());
    assert_eq!(None, codec.decode(&mut buf).unwrap());
    assert_eq!(0, codec.discarded_bytes());
}

#[test]
fn test_decode_partial() {
    let mut codec = Codec::new();

    let frame = fixtures::sfrbx();
    let bytes = frame.as_bytes();

    let mut buf = BytesMut::new();

    for byte in &bytes[..bytes.len() - 1] {
        buf.extend_from_slice(&[*byte]);
        assert_eq!(None, codec.decode(&mut buf).unwrap());
    }

    // nothing is consumed while waiting for the rest of the frame
    assert_eq!(bytes.len() - 1, buf.len());

    buf.extend_from_slice(&bytes[bytes.len() - 1..]);

    assert_eq!(Some(frame), codec.decode(&mut buf).unwrap());
}

#[test]
fn test_decode_skips_garbage() {
    let mut codec = Codec::new();

    let frame = Pvt::default().frame();

    let mut buf = BytesMut::from(&b"$GPGLL,garbage\r\n\xb5"[..]);
    buf.extend_from_slice(frame.as_bytes());

    assert_eq!(Some(frame), codec.decode(&mut buf).unwrap());
    assert_eq!(17, codec.discarded_bytes());
}

#[test]
fn test_decode_checksum_mismatch() {
    let mut codec = Codec::new();

    let good = fixtures::rawx(1);
    let mut bad = fixtures::sfrbx().as_bytes().to_vec();
    let last = bad.len() - 1;
    bad[last] ^= 0xff;

    let mut buf = BytesMut::from(&bad[..]);
    buf.extend_from_slice(good.as_bytes());

    assert_eq!(Some(good), codec.decode(&mut buf).unwrap());
    assert_eq!(1, codec.checksum_failures());
    assert_eq!(bad.len() as u64, codec.discarded_bytes());
}

#[test]
fn test_decode_length_too_long() {
    let mut codec = Codec::new();

    let good = fixtures::sfrbx();

    let mut buf = BytesMut::from(&[0xb5, 0x62, 0x02, 0x15, 0xff, 0xff][..]);
    buf.extend_from_slice(good.as_bytes());

    assert_eq!(Some(good), codec.decode(&mut buf).unwrap());
    assert_eq!(6, codec.discarded_bytes());
}

#[test]
fn test_decode_noise_never_emits_bad_checksum() {
    let mut codec = Codec::new();

    // pseudo-random bytes with sync chars sprinkled through
    let mut noise = Vec::new();
    let mut x: u32 = 0x1234_5678;

    for i in 0..20_000 {
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;

        if i % 97 == 0 {
            noise.extend_from_slice(&[0xb5, 0x62]);
        }

        noise.push(x as u8);
    }

    let mut buf = BytesMut::from(&noise[..]);

    while let Some(frame) = codec.decode_eof(&mut buf).unwrap() {
        assert!(frame.checksum_valid());
    }

    assert!(buf.is_empty());
}

#[test]
fn test_decode_eof_truncated_frame_hides_nothing() {
    let mut codec = Codec::new();

    let frame = fixtures::rawx(1);

    // a header claiming a long payload followed by a complete frame
    let mut buf = BytesMut::from(&[0xb5, 0x62, 0x02, 0x15, 0x00, 0x10][..]);
    buf.extend_from_slice(frame.as_bytes());

    assert_eq!(None, codec.decode(&mut buf).unwrap());
    assert_eq!(Some(frame), codec.decode_eof(&mut buf).unwrap());
    assert_eq!(None, codec.decode_eof(&mut buf).unwrap());
}

#[test]
fn test_encode() {
    let mut codec = Codec::new();
    let frame = fixtures::rawx(0);

    let mut buf = BytesMut::new();
    codec.encode(frame.clone(), &mut buf).unwrap();

    assert_eq!(frame.as_bytes(), &buf[..]);
}

#[test]
fn test_frame_reader() {
    let frames = vec![Pvt::default().frame(), fixtures::rawx(3), fixtures::sfrbx()];

    let mut bytes = fixtures::concat(&frames);
    bytes.extend_from_slice(&[0xb5, 0x62, 0x01]);

    let mut reader = FrameReader::new(&bytes[..]);

    let read: Vec<RawFrame> = reader.by_ref().map(|f| f.unwrap()).collect();

    assert_eq!(frames, read);
    assert_eq!(bytes.len() as u64, reader.bytes_read());
    assert_eq!(3, reader.unparsed_bytes());
}

#[test]
fn test_message_type_names() {
    assert_eq!("NAV-PVT", MessageType::NavPvt.to_string());
    assert_eq!("RXM-SFRBX", MessageType::from((0x02, 0x13)).to_string());
    assert_eq!("MON-HW", MessageType::from((0x0a, 0x09)).to_string());
    assert_eq!("NAV-0x99", MessageType::from((0x01, 0x99)).to_string());
    assert_eq!("0x77-0x01", MessageType::from((0x77, 0x01)).to_string());
}
