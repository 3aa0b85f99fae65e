#[derive(thiserror::Error, Debug)]
pub enum DecodeError {
    #[error("codec library initialization failed: {0}")]
    CodecInit(String),
    #[error("unsupported stream layout: {0}")]
    Unsupported(String),
    #[error("no decode module registered for codec id {0:?}")]
    UnknownCodec(char),
}
