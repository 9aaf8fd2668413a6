//! Per-module weaving: decode, scan, synthesize, encode
//!
//! `Weaver::weave_one` is a pure `bytes -> WeavingResult` function; all file
//! system and concurrency concerns live in `veld-api`.

use crate::classfile::{AnalysisError, CompiledModule, DecodeError, EncodeError};
use crate::codec::{ClassFileCodec, ModuleCodec};
use crate::result::WeavingResult;
use crate::scanner;
use crate::synthesizer::{accessor_descriptor, accessor_name, synthesize};
use thiserror::Error;
use tracing::{debug, warn};

/// Identity used for modules whose name could not be decoded
pub const UNKNOWN_MODULE: &str = "<unknown>";

/// Failure while weaving a single module
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WeaveError {
    #[error("malformed module: {0}")]
    Malformed(#[from] DecodeError),

    #[error("name collision: {accessor} already exists as {accessor}{existing}, cannot add {accessor}{expected}")]
    NameCollision {
        accessor: String,
        existing: String,
        expected: String,
    },

    #[error("accessor synthesis failed: {0}")]
    Synthesis(#[from] AnalysisError),

    #[error("encode failed: {0}")]
    Encode(#[from] EncodeError),
}

/// Applies accessor weaving to binary modules through a codec
#[derive(Debug, Clone, Default)]
pub struct Weaver<C = ClassFileCodec> {
    codec: C,
}

impl Weaver {
    /// Weaver over the class file codec
    pub fn new() -> Self {
        Self::default()
    }
}

impl<C: ModuleCodec> Weaver<C> {
    pub fn with_codec(codec: C) -> Self {
        Self { codec }
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Weave one in-memory module.
    ///
    /// Never fails: every failure is reported as an `Error` result.
    pub fn weave_one(&self, bytes: &[u8]) -> WeavingResult {
        let mut module = match self.codec.decode(bytes) {
            Ok(module) => module,
            Err(e) => {
                debug!(target: "veld::decode", error = %e, "failed to decode module");
                return WeavingResult::error(UNKNOWN_MODULE, WeaveError::from(e).to_string());
            }
        };
        let name = module.name().to_string();

        let added = match self.weave_module(&mut module) {
            Ok(added) => added,
            Err(e) => {
                warn!(target: "veld::synth", class = %name, error = %e, "weaving failed");
                return WeavingResult::error(name, e.to_string());
            }
        };
        if added.is_empty() {
            return WeavingResult::unchanged(name);
        }

        match self.codec.encode(&module) {
            Ok(bytecode) => WeavingResult::modified(name, added, bytecode),
            Err(e) => {
                warn!(target: "veld::encode", class = %name, error = %e, "encoding failed");
                WeavingResult::error(name, WeaveError::from(e).to_string())
            }
        }
    }

    /// Add the missing accessors to `module`, returning their names in
    /// field declaration order. An empty list means nothing had to change.
    pub fn weave_module(&self, module: &mut CompiledModule) -> Result<Vec<String>, WeaveError> {
        let mut pending = Vec::new();

        for field in scanner::select(module) {
            let accessor = accessor_name(field.name());
            let expected = accessor_descriptor(field);

            let existing: Vec<_> = module.methods_named(&accessor).collect();
            if existing.iter().any(|m| m.descriptor() == expected) {
                debug!(
                    target: "veld::synth",
                    class = module.name(),
                    accessor = %accessor,
                    "accessor already present"
                );
                continue;
            }
            if let Some(other) = existing.first() {
                return Err(WeaveError::NameCollision {
                    existing: other.descriptor().to_string(),
                    accessor,
                    expected,
                });
            }

            pending.push(synthesize(module.name(), field)?);
        }

        let mut added = Vec::with_capacity(pending.len());
        for method in pending {
            added.push(method.name().to_string());
            module.add_method(method)?;
        }

        if !added.is_empty() {
            debug!(
                target: "veld::synth",
                class = module.name(),
                accessors = ?added,
                "added accessors"
            );
        }
        Ok(added)
    }
}
