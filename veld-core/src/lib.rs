//! Veld Core - Bytecode weaver (pure logic, no IO)
//!
//! Decodes Java class files, finds private fields marked for injection, and
//! adds a public synthetic setter (`__inject_set_<field>`) for each one so a
//! dependency-injection container can fill them without reflection.
//!
//! Only operates on in-memory buffers. Directory walking, persistence and
//! parallelism live in `veld-api`.
//!
//! ```rust,ignore
//! use veld_core::{Weaver, WeaveStatus};
//!
//! let result = Weaver::new().weave_one(&bytes);
//! if result.status() == WeaveStatus::Modified {
//!     std::fs::write(path, result.bytecode().unwrap())?;
//! }
//! ```

pub mod classfile;
pub mod codec;
pub mod result;
pub mod scanner;
pub mod synthesizer;
pub mod weaver;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

// Re-export common types
pub use classfile::{CompiledModule, DecodeError, EncodeError, FieldDescriptor, MethodDescriptor};
pub use codec::{ClassFileCodec, ModuleCodec};
pub use result::{WeaveStatus, WeavingResult};
pub use scanner::INJECTION_MARKERS;
pub use synthesizer::ACCESSOR_PREFIX;
pub use weaver::{WeaveError, Weaver, UNKNOWN_MODULE};
