use thiserror::Error;

/// Everything that can go wrong inside the interpreter core. All of these
/// are reported synchronously from the operation that detects them; the
/// host decides whether they're terminal for the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Chip8Error {
    /// memory, stack-index or key-index access outside its valid bound.
    /// the offending instruction is considered not to have completed.
    #[error("access out of range at {addr:#05x}")]
    OutOfRange { addr: usize },

    /// the fetched word matches no instruction family. usually means the
    /// PC has wandered into data or the ROM is corrupt.
    #[error("unknown instruction word {word:#06x}")]
    UnknownInstruction { word: u16 },

    /// CALL with all 16 stack slots in use
    #[error("call stack overflow")]
    StackOverflow,

    /// RET with no return address on the stack
    #[error("call stack underflow")]
    StackUnderflow,
}
