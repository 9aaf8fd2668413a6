//! Java class 文件格式支持
//!
//! 将 `.class` 文件解码为可编辑的结构树，并重新编码为合法的 class 文件。
//!
//! # 文件格式
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  magic (0xCAFEBABE) │ minor_version │ major_version          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Constant Pool      │  Utf8/Class/NameAndType/Fieldref ...   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  access_flags │ this_class │ super_class │ interfaces       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Fields             │  标志、名字、描述符、属性（含注解）      │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Methods            │  标志、名字、描述符、属性（含 Code）     │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Class Attributes                                            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # 示例
//!
//! ```rust,ignore
//! use veld_core::classfile::{read_class, write_class};
//!
//! let module = read_class(&bytes)?;
//! println!("{} has {} fields", module.name(), module.fields().len());
//! let rewritten = write_class(&module)?;
//! assert_eq!(rewritten, bytes);
//! ```

mod analysis;
mod attribute;
mod constant_pool;
mod descriptor;
mod error;
mod header;
mod insn;
mod model;
mod reader;
mod writer;

// 公开导出
pub use analysis::{compute_maxs, MaxValues};
pub use attribute::{annotation_types, names, CodeInfo, RawAttribute};
pub use constant_pool::{decode_modified_utf8, encode_modified_utf8, tag, Constant, ConstantPool};
pub use descriptor::{FieldType, MethodType, ValueCategory};
pub use error::{AnalysisError, DecodeError, EncodeError};
pub use header::{ClassVersion, MAGIC, MAX_MAJOR_VERSION, MIN_MAJOR_VERSION};
pub use insn::{opcode, Insn};
pub use model::{
    AccessFlags, CompiledModule, FieldDescriptor, FieldId, MethodCode, MethodDescriptor, MethodId,
    Visibility,
};
pub use reader::{read_class, ByteReader};
pub use writer::{write_class, ByteWriter};

