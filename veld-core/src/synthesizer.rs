//! Accessor synthesizer
//!
//! Builds `public synthetic void __inject_set_<field>(<T> value)` whose body
//! is `this.<field> = value; return;`.

use crate::classfile::{
    AccessFlags, AnalysisError, FieldDescriptor, Insn, MethodDescriptor, MethodType,
    ValueCategory,
};
use tracing::trace;

/// Prefix shared by every generated accessor
pub const ACCESSOR_PREFIX: &str = "__inject_set_";

/// Accessor name for a field
pub fn accessor_name(field_name: &str) -> String {
    format!("{}{}", ACCESSOR_PREFIX, field_name)
}

/// Accessor descriptor for a field: `(<field descriptor>)V`
pub fn accessor_descriptor(field: &FieldDescriptor) -> String {
    MethodType::setter(field.field_type()).descriptor()
}

/// `ACC_PUBLIC | ACC_SYNTHETIC`
pub fn accessor_flags() -> AccessFlags {
    AccessFlags(AccessFlags::PUBLIC | AccessFlags::SYNTHETIC)
}

/// Build the accessor method for `field` of class `module_name`
pub fn synthesize(
    module_name: &str,
    field: &FieldDescriptor,
) -> Result<MethodDescriptor, AnalysisError> {
    let field_type = field.field_type();
    let body = vec![
        Insn::Load {
            category: ValueCategory::Reference,
            slot: 0,
        },
        Insn::Load {
            category: field_type.category(),
            slot: 1,
        },
        Insn::PutField {
            owner: module_name.to_string(),
            name: field.name().to_string(),
            descriptor: field.descriptor().to_string(),
        },
        Insn::Return,
    ];

    let method = MethodDescriptor::synthesized(
        accessor_flags(),
        accessor_name(field.name()),
        &MethodType::setter(field_type),
        body,
    )?;

    trace!(
        target: "veld::synth",
        class = module_name,
        accessor = method.name(),
        descriptor = method.descriptor(),
        max_stack = method.max_stack(),
        max_locals = method.max_locals(),
        "synthesized accessor"
    );
    Ok(method)
}
