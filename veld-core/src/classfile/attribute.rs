//! 属性
//!
//! 已有成员的属性以原始字节保留；只解析织入需要的部分：
//! 字段注解（标记）与方法的 `Code` 头部。

use super::constant_pool::{Constant, ConstantPool};
use super::error::DecodeError;
use super::reader::ByteReader;
use super::writer::ByteWriter;

/// 属性名
pub mod names {
    pub const CODE: &str = "Code";
    pub const RUNTIME_VISIBLE_ANNOTATIONS: &str = "RuntimeVisibleAnnotations";
    pub const RUNTIME_INVISIBLE_ANNOTATIONS: &str = "RuntimeInvisibleAnnotations";
}

/// 注解嵌套深度上限
const MAX_ELEMENT_DEPTH: usize = 64;

/// 未解析的属性
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAttribute {
    pub name_index: u16,
    pub info: Vec<u8>,
}

impl RawAttribute {
    pub fn read(reader: &mut ByteReader<'_>) -> Result<Self, DecodeError> {
        let name_index = reader.read_u2()?;
        let len = reader.read_u4()? as usize;
        let info = reader.read_bytes(len)?.to_vec();
        Ok(Self { name_index, info })
    }

    /// 读取 `attributes_count` 及其后的属性表
    pub fn read_list(reader: &mut ByteReader<'_>) -> Result<Vec<Self>, DecodeError> {
        let count = reader.read_u2()?;
        (0..count).map(|_| Self::read(reader)).collect()
    }

    pub fn write(&self, out: &mut ByteWriter) {
        out.write_u2(self.name_index);
        out.write_u4(self.info.len() as u32);
        out.write_bytes(&self.info);
    }

    pub fn write_list(attributes: &[Self], out: &mut ByteWriter) {
        out.write_u2(attributes.len() as u16);
        for attr in attributes {
            attr.write(out);
        }
    }

    /// 属性名（同时校验名字索引指向 Utf8）
    pub fn name(&self, cp: &ConstantPool) -> Result<String, DecodeError> {
        cp.utf8(self.name_index)
    }
}

/// 收集注解属性中所有注解的类型描述符
pub fn annotation_types(
    attributes: &[RawAttribute],
    cp: &ConstantPool,
) -> Result<Vec<String>, DecodeError> {
    let mut types = Vec::new();
    for attr in attributes {
        let name = attr.name(cp)?;
        let attr_name = match name.as_str() {
            names::RUNTIME_VISIBLE_ANNOTATIONS => names::RUNTIME_VISIBLE_ANNOTATIONS,
            names::RUNTIME_INVISIBLE_ANNOTATIONS => names::RUNTIME_INVISIBLE_ANNOTATIONS,
            _ => continue,
        };

        let mut reader = ByteReader::new(&attr.info);
        let count = reader.read_u2().map_err(|e| malformed(attr_name, e))?;
        for _ in 0..count {
            let type_name =
                read_annotation(&mut reader, cp, 0).map_err(|e| malformed(attr_name, e))?;
            types.push(type_name);
        }
        if !reader.is_empty() {
            return Err(DecodeError::InvalidAttribute {
                name: attr_name,
                reason: format!("{} unread bytes", reader.remaining()),
            });
        }
    }
    Ok(types)
}

/// 读取一个 annotation 结构，返回其类型描述符
fn read_annotation(
    reader: &mut ByteReader<'_>,
    cp: &ConstantPool,
    depth: usize,
) -> Result<String, DecodeError> {
    let type_name = cp.utf8(reader.read_u2()?)?;
    let pairs = reader.read_u2()?;
    for _ in 0..pairs {
        cp.utf8(reader.read_u2()?)?;
        skip_element_value(reader, cp, depth)?;
    }
    Ok(type_name)
}

fn skip_element_value(
    reader: &mut ByteReader<'_>,
    cp: &ConstantPool,
    depth: usize,
) -> Result<(), DecodeError> {
    if depth > MAX_ELEMENT_DEPTH {
        return Err(DecodeError::InvalidAttribute {
            name: "annotation",
            reason: "element values nested too deeply".to_string(),
        });
    }

    let tag = reader.read_u1()?;
    match tag {
        b'B' | b'C' | b'I' | b'S' | b'Z' => expect_constant(reader, cp, "Integer", |c| {
            matches!(c, Constant::Integer(_))
        }),
        b'D' => expect_constant(reader, cp, "Double", |c| matches!(c, Constant::Double(_))),
        b'F' => expect_constant(reader, cp, "Float", |c| matches!(c, Constant::Float(_))),
        b'J' => expect_constant(reader, cp, "Long", |c| matches!(c, Constant::Long(_))),
        b's' | b'c' => expect_constant(reader, cp, "Utf8", |c| matches!(c, Constant::Utf8(_))),
        b'e' => {
            expect_constant(reader, cp, "Utf8", |c| matches!(c, Constant::Utf8(_)))?;
            expect_constant(reader, cp, "Utf8", |c| matches!(c, Constant::Utf8(_)))
        }
        b'@' => read_annotation(reader, cp, depth + 1).map(|_| ()),
        b'[' => {
            let count = reader.read_u2()?;
            for _ in 0..count {
                skip_element_value(reader, cp, depth + 1)?;
            }
            Ok(())
        }
        other => Err(DecodeError::InvalidAttribute {
            name: "annotation",
            reason: format!("unknown element value tag '{}'", other as char),
        }),
    }
}

fn expect_constant(
    reader: &mut ByteReader<'_>,
    cp: &ConstantPool,
    expected: &'static str,
    check: impl Fn(&Constant) -> bool,
) -> Result<(), DecodeError> {
    let index = reader.read_u2()?;
    match cp.get(index) {
        Some(c) if check(c) => Ok(()),
        _ => Err(DecodeError::BadConstantReference { index, expected }),
    }
}

/// 截断错误在属性内部发生时，改报属性格式错误
fn malformed(name: &'static str, err: DecodeError) -> DecodeError {
    match err {
        DecodeError::Truncated { .. } => DecodeError::InvalidAttribute {
            name,
            reason: err.to_string(),
        },
        other => other,
    }
}

/// `Code` 属性的头部信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeInfo {
    pub max_stack: u16,
    pub max_locals: u16,
    pub code: Vec<u8>,
}

impl CodeInfo {
    /// 解析 `Code` 属性，并检查异常表与子属性的边界
    pub fn parse(info: &[u8]) -> Result<Self, DecodeError> {
        let mut reader = ByteReader::new(info);
        Self::parse_inner(&mut reader).map_err(|e| malformed(names::CODE, e))
    }

    fn parse_inner(reader: &mut ByteReader<'_>) -> Result<Self, DecodeError> {
        let max_stack = reader.read_u2()?;
        let max_locals = reader.read_u2()?;
        let code_len = reader.read_u4()? as usize;
        if code_len == 0 || code_len > u16::MAX as usize {
            return Err(DecodeError::InvalidAttribute {
                name: names::CODE,
                reason: format!("code length {} out of range", code_len),
            });
        }
        let code = reader.read_bytes(code_len)?.to_vec();

        let exception_table_len = reader.read_u2()? as usize;
        reader.read_bytes(exception_table_len * 8)?;
        RawAttribute::read_list(reader)?;

        if !reader.is_empty() {
            return Err(DecodeError::InvalidAttribute {
                name: names::CODE,
                reason: format!("{} unread bytes", reader.remaining()),
            });
        }

        Ok(Self {
            max_stack,
            max_locals,
            code,
        })
    }

    /// 编码为没有异常表与子属性的 `Code` 属性体
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = ByteWriter::new();
        out.write_u2(self.max_stack);
        out.write_u2(self.max_locals);
        out.write_u4(self.code.len() as u32);
        out.write_bytes(&self.code);
        out.write_u2(0);
        out.write_u2(0);
        out.into_bytes()
    }
}
