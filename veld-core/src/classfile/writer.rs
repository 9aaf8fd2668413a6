//! Class 文件写入器
//!
//! 常量池只追加，已有成员的索引与属性原样写回；
//! 新合成的方法在此生成 `Code` 属性并重新计算 max_stack / max_locals。

use super::analysis::compute_maxs;
use super::attribute::{names, CodeInfo, RawAttribute};
use super::constant_pool::ConstantPool;
use super::descriptor::MethodType;
use super::error::EncodeError;
use super::header::MAGIC;
use super::model::{AccessFlags, CompiledModule, MethodDescriptor};
use std::collections::HashSet;
use tracing::{debug, trace};

/// 大端序字节写入器
#[derive(Debug, Default)]
pub struct ByteWriter {
    buffer: Vec<u8>,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    pub fn write_u1(&mut self, value: u8) {
        self.buffer.push(value);
    }

    pub fn write_u2(&mut self, value: u16) {
        self.buffer.extend_from_slice(&value.to_be_bytes());
    }

    pub fn write_u4(&mut self, value: u32) {
        self.buffer.extend_from_slice(&value.to_be_bytes());
    }

    pub fn write_u8(&mut self, value: u64) {
        self.buffer.extend_from_slice(&value.to_be_bytes());
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }
}

/// 将结构树编码为 class 文件字节
pub fn write_class(module: &CompiledModule) -> Result<Vec<u8>, EncodeError> {
    check_unique_methods(module)?;

    // 方法先于常量池编码：合成方法会向常量池追加条目
    let mut cp = module.constant_pool.clone();
    let mut methods = ByteWriter::new();
    methods.write_u2(module.methods().len() as u16);
    for method in module.methods() {
        write_method(method, module.name(), &mut cp, &mut methods)?;
    }

    let mut out = ByteWriter::with_capacity(cp.count() as usize * 8 + methods.len());
    out.write_u4(MAGIC);
    out.write_u2(module.version().minor);
    out.write_u2(module.version().major);
    cp.write(&mut out);

    out.write_u2(module.access().0);
    out.write_u2(module.this_class);
    out.write_u2(module.super_class);
    out.write_u2(module.interfaces.len() as u16);
    for &interface in &module.interfaces {
        out.write_u2(interface);
    }

    out.write_u2(module.fields().len() as u16);
    for field in module.fields() {
        out.write_u2(field.access().0);
        out.write_u2(field.member.name_index);
        out.write_u2(field.member.descriptor_index);
        RawAttribute::write_list(&field.member.attributes, &mut out);
    }

    out.write_bytes(&methods.into_bytes());
    RawAttribute::write_list(&module.attributes, &mut out);

    debug!(
        target: "veld::encode",
        class = module.name(),
        constants = cp.count(),
        bytes = out.len(),
        "encoded class"
    );
    Ok(out.into_bytes())
}

fn check_unique_methods(module: &CompiledModule) -> Result<(), EncodeError> {
    let mut seen = HashSet::new();
    for method in module.methods() {
        if !seen.insert((method.name(), method.descriptor())) {
            return Err(EncodeError::DuplicateMethod {
                name: method.name().to_string(),
                descriptor: method.descriptor().to_string(),
            });
        }
    }
    Ok(())
}

fn write_method(
    method: &MethodDescriptor,
    owner: &str,
    cp: &mut ConstantPool,
    out: &mut ByteWriter,
) -> Result<(), EncodeError> {
    if let Some(member) = &method.decoded {
        out.write_u2(method.access().0);
        out.write_u2(member.name_index);
        out.write_u2(member.descriptor_index);
        RawAttribute::write_list(&member.attributes, out);
        return Ok(());
    }

    let method_type = MethodType::parse(method.descriptor())
        .map_err(|_| EncodeError::InvalidDescriptor(method.descriptor().to_string()))?;
    let name_index = cp.ensure_utf8(method.name())?;
    let descriptor_index = cp.ensure_utf8(method.descriptor())?;

    let mut attributes = Vec::new();
    if let Some(insns) = method.instructions() {
        let maxs = compute_maxs(
            insns,
            &method_type,
            method.access().contains(AccessFlags::STATIC),
        )
        .map_err(|source| EncodeError::Analysis {
            method: format!("{}.{}{}", owner, method.name(), method.descriptor()),
            source,
        })?;

        let mut code = Vec::new();
        for insn in insns {
            insn.encode(&mut code, cp)?;
        }
        if code.len() > u16::MAX as usize {
            return Err(EncodeError::LimitExceeded { what: "code length" });
        }

        trace!(
            target: "veld::encode",
            method = method.name(),
            max_stack = maxs.max_stack,
            max_locals = maxs.max_locals,
            code_len = code.len(),
            "recomputed method capacities"
        );

        attributes.push(RawAttribute {
            name_index: cp.ensure_utf8(names::CODE)?,
            info: CodeInfo {
                max_stack: maxs.max_stack,
                max_locals: maxs.max_locals,
                code,
            }
            .to_bytes(),
        });
    }

    out.write_u2(method.access().0);
    out.write_u2(name_index);
    out.write_u2(descriptor_index);
    RawAttribute::write_list(&attributes, out);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_writer_big_endian() {
        let mut out = ByteWriter::new();
        out.write_u4(MAGIC);
        out.write_u2(0x0034);
        out.write_u1(0x07);
        out.write_u8(1);

        assert_eq!(out.len(), 15);
        assert_eq!(
            out.into_bytes(),
            vec![0xCA, 0xFE, 0xBA, 0xBE, 0x00, 0x34, 0x07, 0, 0, 0, 0, 0, 0, 0, 1]
        );
    }
}
