/// Errors surfaced to clients as RESP error frames.
///
/// The `Display` output of each variant is the exact wire payload, including
/// the conventional `ERR ` prefix. Parse errors are produced before any key
/// is acquired, so an `Err` return never leaves a partial write behind.
#[derive(Debug, thiserror::Error)]
pub enum BitisError {
    #[error("ERR bit offset is not an integer or out of range")]
    BitOffset,

    #[error("ERR bit is not an integer or out of range")]
    BitValue,

    #[error("ERR The bit argument must be 1 or 0.")]
    BitArgument,

    #[error("ERR value is not an integer or out of range.")]
    NotInteger,

    #[error(
        "ERR Invalid bitfield type. Use something like i16 u8. Note that u64 is not supported but i64 is"
    )]
    BitfieldType,

    #[error("ERR Invalid OVERFLOW type specified")]
    OverflowType,

    #[error("ERR Bitop source key limit (64) exceeded")]
    BitopSourceLimit,

    #[error("ERR BITOP NOT must be called with a single source key")]
    BitopNotArity,

    #[error("ERR syntax error")]
    Syntax,

    #[error("ERR wrong number of arguments for '{0}' command")]
    WrongArgCount(String),

    #[error("ERR unknown command '{0}', with args beginning with: {1}")]
    UnknownCommand(String, String),

    #[error("ERR insufficient memory to grow value")]
    OutOfMemory,
}

pub type BitisResult<T> = Result<T, BitisError>;
