mod codec;
mod decode;
mod frame;
mod reader;

pub use codec::Codec;
pub use codec::CodecError;
pub use decode::decode;
pub use decode::CarrierSolution;
pub use decode::DecodeError;
pub use decode::DecodedFix;
pub use decode::FixType;
pub use decode::Message;
pub use decode::NavPvtFlags;
pub use decode::NavPvtValid;
pub use decode::NavSat;
pub use decode::NavStatus;
pub use decode::RxmRawx;
pub use decode::RxmSfrbx;
pub use decode::TimeError;
pub use decode::UtcTime;
pub use frame::checksum;
pub use frame::FrameError;
pub use frame::MessageType;
pub use frame::RawFrame;
pub use reader::FrameReader;

#[cfg(test)]
pub(crate) mod fixtures;

#[cfg(test)]
mod test_codec;

#[cfg(test)]
mod test_decode;
