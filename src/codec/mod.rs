//! Wire formats: byte framing and entry marshalling

pub mod envelope;
pub mod frame;
pub mod json;

pub use envelope::{ensure_separator_free, EntryCodec, Marshaller, Unmarshaller};
pub use frame::{
    Decoder, Encoder, FrameDecoder, FrameEncoder, LineDecoder, LineEncoder,
    DEFAULT_MAX_FRAME_LEN, FRAME_SEPARATOR,
};
pub use json::JsonMarshaller;
