//! Module codec abstraction
//!
//! Scanner and synthesizer only see `CompiledModule`; the binary format
//! lives behind this trait so another codec can be swapped in.

use crate::classfile::{read_class, write_class, CompiledModule, DecodeError, EncodeError};

/// Decodes binary modules into structural trees and back
pub trait ModuleCodec: Send + Sync {
    /// Parse a binary module
    fn decode(&self, bytes: &[u8]) -> Result<CompiledModule, DecodeError>;

    /// Re-emit a (possibly extended) module
    fn encode(&self, module: &CompiledModule) -> Result<Vec<u8>, EncodeError>;
}

/// Hand-written Java class file codec
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassFileCodec;

impl ModuleCodec for ClassFileCodec {
    fn decode(&self, bytes: &[u8]) -> Result<CompiledModule, DecodeError> {
        read_class(bytes)
    }

    fn encode(&self, module: &CompiledModule) -> Result<Vec<u8>, EncodeError> {
        write_class(module)
    }
}
