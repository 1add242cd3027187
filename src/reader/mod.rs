//! Read path: decoding entries back out of a byte stream

pub mod blocking;
pub mod stream_decoder;

pub use blocking::{BlockingReader, Drained};
pub use stream_decoder::{
    CancelHandle, DecodeResult, DecoderState, StreamDecoder, StreamDecoderBuilder,
    DEFAULT_READ_BUFFER_CAPACITY, DEFAULT_SHUTDOWN_TIMEOUT,
};
