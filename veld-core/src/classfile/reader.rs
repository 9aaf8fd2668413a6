//! Class 文件读取器
//!
//! `ByteReader` 是大端序游标，所有读取都做越界检查，越界时返回
//! `DecodeError::Truncated`。`read_class` 在其上解析完整的 class 文件。

use super::attribute::{annotation_types, names, CodeInfo, RawAttribute};
use super::constant_pool::ConstantPool;
use super::descriptor::{FieldType, MethodType};
use super::error::DecodeError;
use super::header::{ClassVersion, MAGIC};
use super::model::{
    AccessFlags, CompiledModule, DecodedMember, FieldDescriptor, MethodDescriptor, ModuleParts,
};
use tracing::debug;

/// 大端序字节读取器
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    /// 原始数据
    data: &'a [u8],
    /// 当前读取位置
    pos: usize,
}

impl<'a> ByteReader<'a> {
    /// 从字节切片创建读取器
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// 当前读取位置
    pub fn position(&self) -> usize {
        self.pos
    }

    /// 剩余字节数
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// 是否已读完
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// 读取 `len` 个字节
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        if self.remaining() < len {
            return Err(DecodeError::Truncated {
                offset: self.pos,
                needed: len - self.remaining(),
            });
        }
        let slice = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    pub fn read_u1(&mut self) -> Result<u8, DecodeError> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_u2(&mut self) -> Result<u16, DecodeError> {
        let b = self.read_bytes(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    pub fn read_u4(&mut self) -> Result<u32, DecodeError> {
        let b = self.read_bytes(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_u8(&mut self) -> Result<u64, DecodeError> {
        let b = self.read_bytes(8)?;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(b);
        Ok(u64::from_be_bytes(buf))
    }
}

/// 解析完整的 class 文件
pub fn read_class(bytes: &[u8]) -> Result<CompiledModule, DecodeError> {
    let mut reader = ByteReader::new(bytes);
    let magic = reader.read_u4()?;
    if magic != MAGIC {
        return Err(DecodeError::BadMagic(magic));
    }
    let minor = reader.read_u2()?;
    let major = reader.read_u2()?;
    let version = ClassVersion::new(major, minor);
    version.validate()?;

    let cp = ConstantPool::read(&mut reader)?;

    let access = AccessFlags(reader.read_u2()?);
    let this_class = reader.read_u2()?;
    let name = cp.class_name(this_class)?;
    let super_class = reader.read_u2()?;
    let super_name = match super_class {
        0 => None,
        index => Some(cp.class_name(index)?),
    };

    let interface_count = reader.read_u2()?;
    let mut interfaces = Vec::with_capacity(interface_count as usize);
    for _ in 0..interface_count {
        let index = reader.read_u2()?;
        cp.class_name(index)?;
        interfaces.push(index);
    }

    let field_count = reader.read_u2()?;
    let mut fields = Vec::with_capacity(field_count as usize);
    for _ in 0..field_count {
        fields.push(read_field(&mut reader, &cp)?);
    }

    let method_count = reader.read_u2()?;
    let mut methods = Vec::with_capacity(method_count as usize);
    for _ in 0..method_count {
        methods.push(read_method(&mut reader, &cp)?);
    }

    let attributes = RawAttribute::read_list(&mut reader)?;
    for attr in &attributes {
        attr.name(&cp)?;
    }

    if !reader.is_empty() {
        return Err(DecodeError::TrailingBytes(reader.remaining()));
    }

    debug!(
        target: "veld::decode",
        class = %name,
        version = %version,
        constants = cp.count(),
        fields = fields.len(),
        methods = methods.len(),
        "decoded class"
    );

    Ok(CompiledModule::from_parts(ModuleParts {
        version,
        access,
        name,
        super_name,
        fields,
        methods,
        constant_pool: cp,
        this_class,
        super_class,
        interfaces,
        attributes,
    }))
}

fn read_member(
    reader: &mut ByteReader<'_>,
    cp: &ConstantPool,
) -> Result<(AccessFlags, String, String, DecodedMember), DecodeError> {
    let access = AccessFlags(reader.read_u2()?);
    let name_index = reader.read_u2()?;
    let descriptor_index = reader.read_u2()?;
    let name = cp.utf8(name_index)?;
    let descriptor = cp.utf8(descriptor_index)?;
    let attributes = RawAttribute::read_list(reader)?;
    for attr in &attributes {
        attr.name(cp)?;
    }

    Ok((
        access,
        name,
        descriptor,
        DecodedMember {
            name_index,
            descriptor_index,
            attributes,
        },
    ))
}

fn read_field(reader: &mut ByteReader<'_>, cp: &ConstantPool) -> Result<FieldDescriptor, DecodeError> {
    let (access, name, descriptor, member) = read_member(reader, cp)?;
    let field_type = FieldType::parse(&descriptor)?;
    let markers = annotation_types(&member.attributes, cp)?;

    Ok(FieldDescriptor::decoded(
        access, name, descriptor, field_type, markers, member,
    ))
}

fn read_method(
    reader: &mut ByteReader<'_>,
    cp: &ConstantPool,
) -> Result<MethodDescriptor, DecodeError> {
    let (access, name, descriptor, member) = read_member(reader, cp)?;
    MethodType::parse(&descriptor)?;

    let mut code = None;
    for attr in &member.attributes {
        if attr.name(cp)? == names::CODE {
            if code.is_some() {
                return Err(DecodeError::InvalidAttribute {
                    name: names::CODE,
                    reason: format!("method {} has more than one Code attribute", name),
                });
            }
            code = Some(CodeInfo::parse(&attr.info)?);
        }
    }

    Ok(MethodDescriptor::decoded(
        access, name, descriptor, code, member,
    ))
}
