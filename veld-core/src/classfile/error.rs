//! Class 文件编解码错误

use thiserror::Error;

/// 解码错误：输入不是合法的 class 文件（MalformedModule）
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("bad magic 0x{0:08X}, expected 0xCAFEBABE")]
    BadMagic(u32),

    #[error("unsupported class file version {major}.{minor}")]
    UnsupportedVersion { major: u16, minor: u16 },

    #[error("truncated at offset {offset}: needed {needed} more bytes")]
    Truncated { offset: usize, needed: usize },

    #[error("invalid constant pool tag {tag} at index {index}")]
    InvalidConstantTag { index: u16, tag: u8 },

    #[error("constant #{index} is not a valid {expected} reference")]
    BadConstantReference { index: u16, expected: &'static str },

    #[error("constant #{index} is not valid modified UTF-8")]
    InvalidUtf8 { index: u16 },

    #[error("invalid descriptor '{0}'")]
    InvalidDescriptor(String),

    #[error("malformed {name} attribute: {reason}")]
    InvalidAttribute { name: &'static str, reason: String },

    #[error("{0} trailing bytes after class structure")]
    TrailingBytes(usize),
}

/// 编码错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("duplicate method {name}{descriptor}")]
    DuplicateMethod { name: String, descriptor: String },

    #[error("constant pool exceeds 65535 entries")]
    ConstantPoolOverflow,

    #[error("{what} exceeds class file limit")]
    LimitExceeded { what: &'static str },

    #[error("invalid descriptor '{0}'")]
    InvalidDescriptor(String),

    #[error("method {method}: {source}")]
    Analysis {
        method: String,
        #[source]
        source: AnalysisError,
    },
}

/// 指令序列分析错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("stack underflow at instruction {index}")]
    StackUnderflow { index: usize },

    #[error("execution falls off the end of the code")]
    FallsOffEnd,

    #[error("invalid descriptor '{0}'")]
    InvalidDescriptor(String),

    #[error("{what} exceeds 65535 slots")]
    TooLarge { what: &'static str },
}
