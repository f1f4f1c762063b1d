mod sealed_session_codec;

pub use sealed_session_codec::SealedSessionCodec;
