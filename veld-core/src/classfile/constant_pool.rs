//! 常量池
//!
//! 常量池按索引存储（索引 0 与 long/double 的第二个槽位为 `Unusable`）。
//! Utf8 常量保留原始 modified UTF-8 字节，重新编码时逐字节不变。
//! 新常量只会追加到末尾，已有索引永远不变。

use super::error::{DecodeError, EncodeError};
use super::reader::ByteReader;
use super::writer::ByteWriter;

/// 常量类型标记
pub mod tag {
    pub const UTF8: u8 = 1;
    pub const INTEGER: u8 = 3;
    pub const FLOAT: u8 = 4;
    pub const LONG: u8 = 5;
    pub const DOUBLE: u8 = 6;
    pub const CLASS: u8 = 7;
    pub const STRING: u8 = 8;
    pub const FIELDREF: u8 = 9;
    pub const METHODREF: u8 = 10;
    pub const INTERFACE_METHODREF: u8 = 11;
    pub const NAME_AND_TYPE: u8 = 12;
    pub const METHOD_HANDLE: u8 = 15;
    pub const METHOD_TYPE: u8 = 16;
    pub const DYNAMIC: u8 = 17;
    pub const INVOKE_DYNAMIC: u8 = 18;
    pub const MODULE: u8 = 19;
    pub const PACKAGE: u8 = 20;
}

/// 常量池条目
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constant {
    /// 索引 0，或 long/double 占用的第二个槽位
    Unusable,
    /// 原始 modified UTF-8 字节
    Utf8(Vec<u8>),
    Integer(u32),
    /// IEEE 754 位模式
    Float(u32),
    Long(u64),
    /// IEEE 754 位模式
    Double(u64),
    Class {
        name_index: u16,
    },
    String {
        string_index: u16,
    },
    Fieldref {
        class_index: u16,
        name_and_type_index: u16,
    },
    Methodref {
        class_index: u16,
        name_and_type_index: u16,
    },
    InterfaceMethodref {
        class_index: u16,
        name_and_type_index: u16,
    },
    NameAndType {
        name_index: u16,
        descriptor_index: u16,
    },
    MethodHandle {
        reference_kind: u8,
        reference_index: u16,
    },
    MethodType {
        descriptor_index: u16,
    },
    Dynamic {
        bootstrap_method_attr_index: u16,
        name_and_type_index: u16,
    },
    InvokeDynamic {
        bootstrap_method_attr_index: u16,
        name_and_type_index: u16,
    },
    Module {
        name_index: u16,
    },
    Package {
        name_index: u16,
    },
}

impl Constant {
    /// 是否占用两个槽位
    pub fn is_wide(&self) -> bool {
        matches!(self, Constant::Long(_) | Constant::Double(_))
    }

    fn read(reader: &mut ByteReader<'_>, index: u16) -> Result<Self, DecodeError> {
        let t = reader.read_u1()?;
        let constant = match t {
            tag::UTF8 => {
                let len = reader.read_u2()? as usize;
                Constant::Utf8(reader.read_bytes(len)?.to_vec())
            }
            tag::INTEGER => Constant::Integer(reader.read_u4()?),
            tag::FLOAT => Constant::Float(reader.read_u4()?),
            tag::LONG => Constant::Long(reader.read_u8()?),
            tag::DOUBLE => Constant::Double(reader.read_u8()?),
            tag::CLASS => Constant::Class {
                name_index: reader.read_u2()?,
            },
            tag::STRING => Constant::String {
                string_index: reader.read_u2()?,
            },
            tag::FIELDREF => Constant::Fieldref {
                class_index: reader.read_u2()?,
                name_and_type_index: reader.read_u2()?,
            },
            tag::METHODREF => Constant::Methodref {
                class_index: reader.read_u2()?,
                name_and_type_index: reader.read_u2()?,
            },
            tag::INTERFACE_METHODREF => Constant::InterfaceMethodref {
                class_index: reader.read_u2()?,
                name_and_type_index: reader.read_u2()?,
            },
            tag::NAME_AND_TYPE => Constant::NameAndType {
                name_index: reader.read_u2()?,
                descriptor_index: reader.read_u2()?,
            },
            tag::METHOD_HANDLE => Constant::MethodHandle {
                reference_kind: reader.read_u1()?,
                reference_index: reader.read_u2()?,
            },
            tag::METHOD_TYPE => Constant::MethodType {
                descriptor_index: reader.read_u2()?,
            },
            tag::DYNAMIC => Constant::Dynamic {
                bootstrap_method_attr_index: reader.read_u2()?,
                name_and_type_index: reader.read_u2()?,
            },
            tag::INVOKE_DYNAMIC => Constant::InvokeDynamic {
                bootstrap_method_attr_index: reader.read_u2()?,
                name_and_type_index: reader.read_u2()?,
            },
            tag::MODULE => Constant::Module {
                name_index: reader.read_u2()?,
            },
            tag::PACKAGE => Constant::Package {
                name_index: reader.read_u2()?,
            },
            other => return Err(DecodeError::InvalidConstantTag { index, tag: other }),
        };
        Ok(constant)
    }

    fn write(&self, out: &mut ByteWriter) {
        match self {
            Constant::Unusable => {}
            Constant::Utf8(bytes) => {
                out.write_u1(tag::UTF8);
                out.write_u2(bytes.len() as u16);
                out.write_bytes(bytes);
            }
            Constant::Integer(v) => {
                out.write_u1(tag::INTEGER);
                out.write_u4(*v);
            }
            Constant::Float(v) => {
                out.write_u1(tag::FLOAT);
                out.write_u4(*v);
            }
            Constant::Long(v) => {
                out.write_u1(tag::LONG);
                out.write_u8(*v);
            }
            Constant::Double(v) => {
                out.write_u1(tag::DOUBLE);
                out.write_u8(*v);
            }
            Constant::Class { name_index } => {
                out.write_u1(tag::CLASS);
                out.write_u2(*name_index);
            }
            Constant::String { string_index } => {
                out.write_u1(tag::STRING);
                out.write_u2(*string_index);
            }
            Constant::Fieldref {
                class_index,
                name_and_type_index,
            } => {
                out.write_u1(tag::FIELDREF);
                out.write_u2(*class_index);
                out.write_u2(*name_and_type_index);
            }
            Constant::Methodref {
                class_index,
                name_and_type_index,
            } => {
                out.write_u1(tag::METHODREF);
                out.write_u2(*class_index);
                out.write_u2(*name_and_type_index);
            }
            Constant::InterfaceMethodref {
                class_index,
                name_and_type_index,
            } => {
                out.write_u1(tag::INTERFACE_METHODREF);
                out.write_u2(*class_index);
                out.write_u2(*name_and_type_index);
            }
            Constant::NameAndType {
                name_index,
                descriptor_index,
            } => {
                out.write_u1(tag::NAME_AND_TYPE);
                out.write_u2(*name_index);
                out.write_u2(*descriptor_index);
            }
            Constant::MethodHandle {
                reference_kind,
                reference_index,
            } => {
                out.write_u1(tag::METHOD_HANDLE);
                out.write_u1(*reference_kind);
                out.write_u2(*reference_index);
            }
            Constant::MethodType { descriptor_index } => {
                out.write_u1(tag::METHOD_TYPE);
                out.write_u2(*descriptor_index);
            }
            Constant::Dynamic {
                bootstrap_method_attr_index,
                name_and_type_index,
            } => {
                out.write_u1(tag::DYNAMIC);
                out.write_u2(*bootstrap_method_attr_index);
                out.write_u2(*name_and_type_index);
            }
            Constant::InvokeDynamic {
                bootstrap_method_attr_index,
                name_and_type_index,
            } => {
                out.write_u1(tag::INVOKE_DYNAMIC);
                out.write_u2(*bootstrap_method_attr_index);
                out.write_u2(*name_and_type_index);
            }
            Constant::Module { name_index } => {
                out.write_u1(tag::MODULE);
                out.write_u2(*name_index);
            }
            Constant::Package { name_index } => {
                out.write_u1(tag::PACKAGE);
                out.write_u2(*name_index);
            }
        }
    }
}

/// 常量池
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstantPool {
    entries: Vec<Constant>,
}

impl ConstantPool {
    /// 创建只包含索引 0 的常量池
    pub fn new() -> Self {
        Self {
            entries: vec![Constant::Unusable],
        }
    }

    /// 写入文件的 constant_pool_count（最大索引 + 1）
    pub fn count(&self) -> u16 {
        self.entries.len() as u16
    }

    /// 获取常量
    pub fn get(&self, index: u16) -> Option<&Constant> {
        match self.entries.get(index as usize) {
            Some(Constant::Unusable) | None => None,
            Some(c) => Some(c),
        }
    }

    /// 解析 Utf8 常量
    pub fn utf8(&self, index: u16) -> Result<String, DecodeError> {
        match self.get(index) {
            Some(Constant::Utf8(bytes)) => {
                decode_modified_utf8(bytes).ok_or(DecodeError::InvalidUtf8 { index })
            }
            _ => Err(DecodeError::BadConstantReference {
                index,
                expected: "Utf8",
            }),
        }
    }

    /// 解析 Class 常量指向的内部类名
    pub fn class_name(&self, index: u16) -> Result<String, DecodeError> {
        match self.get(index) {
            Some(Constant::Class { name_index }) => self.utf8(*name_index),
            _ => Err(DecodeError::BadConstantReference {
                index,
                expected: "Class",
            }),
        }
    }

    /// 从读取器解析常量池
    pub fn read(reader: &mut ByteReader<'_>) -> Result<Self, DecodeError> {
        let count = reader.read_u2()?;
        if count == 0 {
            return Err(DecodeError::BadConstantReference {
                index: 0,
                expected: "non-empty constant pool",
            });
        }

        let mut entries = Vec::with_capacity(count as usize);
        entries.push(Constant::Unusable);

        let mut index: u16 = 1;
        while index < count {
            let constant = Constant::read(reader, index)?;
            let wide = constant.is_wide();
            entries.push(constant);
            if wide {
                // long/double 的第二个槽位必须仍在常量池范围内
                if index + 1 >= count {
                    return Err(DecodeError::BadConstantReference {
                        index,
                        expected: "two-slot",
                    });
                }
                entries.push(Constant::Unusable);
                index += 2;
            } else {
                index += 1;
            }
        }

        let pool = Self { entries };
        pool.validate()?;
        Ok(pool)
    }

    /// 验证常量之间的交叉引用
    pub fn validate(&self) -> Result<(), DecodeError> {
        for constant in &self.entries {
            match constant {
                Constant::Class { name_index }
                | Constant::Module { name_index }
                | Constant::Package { name_index } => self.expect_utf8(*name_index)?,
                Constant::String { string_index } => self.expect_utf8(*string_index)?,
                Constant::MethodType { descriptor_index } => self.expect_utf8(*descriptor_index)?,
                Constant::Fieldref {
                    class_index,
                    name_and_type_index,
                }
                | Constant::Methodref {
                    class_index,
                    name_and_type_index,
                }
                | Constant::InterfaceMethodref {
                    class_index,
                    name_and_type_index,
                } => {
                    self.expect(*class_index, "Class", |c| {
                        matches!(c, Constant::Class { .. })
                    })?;
                    self.expect_name_and_type(*name_and_type_index)?;
                }
                Constant::NameAndType {
                    name_index,
                    descriptor_index,
                } => {
                    self.expect_utf8(*name_index)?;
                    self.expect_utf8(*descriptor_index)?;
                }
                Constant::MethodHandle {
                    reference_kind,
                    reference_index,
                } => match reference_kind {
                    1..=4 => self.expect(*reference_index, "Fieldref", |c| {
                        matches!(c, Constant::Fieldref { .. })
                    })?,
                    5..=9 => self.expect(*reference_index, "Methodref", |c| {
                        matches!(
                            c,
                            Constant::Methodref { .. } | Constant::InterfaceMethodref { .. }
                        )
                    })?,
                    _ => {
                        return Err(DecodeError::BadConstantReference {
                            index: *reference_index,
                            expected: "MethodHandle kind 1..=9",
                        })
                    }
                },
                Constant::Dynamic {
                    name_and_type_index,
                    ..
                }
                | Constant::InvokeDynamic {
                    name_and_type_index,
                    ..
                } => self.expect_name_and_type(*name_and_type_index)?,
                Constant::Unusable
                | Constant::Utf8(_)
                | Constant::Integer(_)
                | Constant::Float(_)
                | Constant::Long(_)
                | Constant::Double(_) => {}
            }
        }
        Ok(())
    }

    fn expect(
        &self,
        index: u16,
        expected: &'static str,
        check: impl Fn(&Constant) -> bool,
    ) -> Result<(), DecodeError> {
        match self.get(index) {
            Some(c) if check(c) => Ok(()),
            _ => Err(DecodeError::BadConstantReference { index, expected }),
        }
    }

    fn expect_utf8(&self, index: u16) -> Result<(), DecodeError> {
        self.expect(index, "Utf8", |c| matches!(c, Constant::Utf8(_)))
    }

    fn expect_name_and_type(&self, index: u16) -> Result<(), DecodeError> {
        self.expect(index, "NameAndType", |c| {
            matches!(c, Constant::NameAndType { .. })
        })
    }

    /// 写入 constant_pool_count 与全部条目
    pub fn write(&self, out: &mut ByteWriter) {
        out.write_u2(self.count());
        for constant in &self.entries {
            constant.write(out);
        }
    }

    // ==================== 追加（去重） ====================

    /// 查找已有的 Utf8 常量
    pub fn find_utf8(&self, value: &str) -> Option<u16> {
        let encoded = encode_modified_utf8(value);
        self.position(|c| matches!(c, Constant::Utf8(bytes) if *bytes == encoded))
    }

    /// 查找或追加 Utf8 常量
    pub fn ensure_utf8(&mut self, value: &str) -> Result<u16, EncodeError> {
        if let Some(index) = self.find_utf8(value) {
            return Ok(index);
        }
        let encoded = encode_modified_utf8(value);
        if encoded.len() > u16::MAX as usize {
            return Err(EncodeError::LimitExceeded {
                what: "Utf8 constant length",
            });
        }
        self.push(Constant::Utf8(encoded))
    }

    /// 查找或追加 Class 常量
    pub fn ensure_class(&mut self, name: &str) -> Result<u16, EncodeError> {
        let name_index = self.ensure_utf8(name)?;
        self.ensure(Constant::Class { name_index })
    }

    /// 查找或追加 NameAndType 常量
    pub fn ensure_name_and_type(&mut self, name: &str, descriptor: &str) -> Result<u16, EncodeError> {
        let name_index = self.ensure_utf8(name)?;
        let descriptor_index = self.ensure_utf8(descriptor)?;
        self.ensure(Constant::NameAndType {
            name_index,
            descriptor_index,
        })
    }

    /// 查找或追加 Fieldref 常量
    pub fn ensure_fieldref(
        &mut self,
        owner: &str,
        name: &str,
        descriptor: &str,
    ) -> Result<u16, EncodeError> {
        let class_index = self.ensure_class(owner)?;
        let name_and_type_index = self.ensure_name_and_type(name, descriptor)?;
        self.ensure(Constant::Fieldref {
            class_index,
            name_and_type_index,
        })
    }

    fn ensure(&mut self, constant: Constant) -> Result<u16, EncodeError> {
        match self.position(|c| *c == constant) {
            Some(index) => Ok(index),
            None => self.push(constant),
        }
    }

    fn position(&self, pred: impl Fn(&Constant) -> bool) -> Option<u16> {
        self.entries.iter().position(pred).map(|i| i as u16)
    }

    fn push(&mut self, constant: Constant) -> Result<u16, EncodeError> {
        let slots = if constant.is_wide() { 2 } else { 1 };
        if self.entries.len() + slots > u16::MAX as usize {
            return Err(EncodeError::ConstantPoolOverflow);
        }
        let index = self.entries.len() as u16;
        self.entries.push(constant);
        if slots == 2 {
            self.entries.push(Constant::Unusable);
        }
        Ok(index)
    }
}

impl Default for ConstantPool {
    fn default() -> Self {
        Self::new()
    }
}

// ==================== Modified UTF-8 ====================

/// 解码 modified UTF-8（`C0 80` 表示 NUL，增补字符以代理对编码）
pub fn decode_modified_utf8(bytes: &[u8]) -> Option<String> {
    let mut units: Vec<u16> = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i] as u16;
        if b == 0 {
            return None;
        }
        if b < 0x80 {
            units.push(b);
            i += 1;
        } else if b & 0xE0 == 0xC0 {
            let b2 = continuation(bytes.get(i + 1))?;
            units.push(((b & 0x1F) << 6) | b2);
            i += 2;
        } else if b & 0xF0 == 0xE0 {
            let b2 = continuation(bytes.get(i + 1))?;
            let b3 = continuation(bytes.get(i + 2))?;
            units.push(((b & 0x0F) << 12) | (b2 << 6) | b3);
            i += 3;
        } else {
            return None;
        }
    }

    String::from_utf16(&units).ok()
}

fn continuation(byte: Option<&u8>) -> Option<u16> {
    match byte {
        Some(&b) if b & 0xC0 == 0x80 => Some((b & 0x3F) as u16),
        _ => None,
    }
}

/// 编码为 modified UTF-8
pub fn encode_modified_utf8(value: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(value.len());
    for unit in value.encode_utf16() {
        match unit {
            0x0001..=0x007F => out.push(unit as u8),
            0x0000 | 0x0080..=0x07FF => {
                out.push(0xC0 | (unit >> 6) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
            _ => {
                out.push(0xE0 | (unit >> 12) as u8);
                out.push(0x80 | ((unit >> 6) & 0x3F) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool_bytes(count: u16, body: &[u8]) -> Vec<u8> {
        let mut data = count.to_be_bytes().to_vec();
        data.extend_from_slice(body);
        data
    }

    #[test]
    fn test_modified_utf8_special_forms() {
        assert_eq!(encode_modified_utf8("\0"), vec![0xC0, 0x80]);
        assert_eq!(decode_modified_utf8(&[0xC0, 0x80]).as_deref(), Some("\0"));

        // U+1F600 以代理对编码为 6 字节
        let emoji = "\u{1F600}";
        let encoded = encode_modified_utf8(emoji);
        assert_eq!(encoded.len(), 6);
        assert_eq!(decode_modified_utf8(&encoded).as_deref(), Some(emoji));

        let text = "count_é_値";
        assert_eq!(encode_modified_utf8(text), text.as_bytes());
        assert_eq!(decode_modified_utf8(text.as_bytes()).as_deref(), Some(text));
    }

    #[test]
    fn test_modified_utf8_rejects_invalid() {
        // 原始 NUL、4 字节 UTF-8 序列、截断序列
        assert_eq!(decode_modified_utf8(&[0x41, 0x00]), None);
        assert_eq!(decode_modified_utf8("\u{1F600}".as_bytes()), None);
        assert_eq!(decode_modified_utf8(&[0xE3, 0x81]), None);
    }

    #[test]
    fn test_read_long_takes_two_slots() {
        // #1 Long, #2 unusable, #3 Utf8 "x"
        let mut body = vec![tag::LONG];
        body.extend_from_slice(&42u64.to_be_bytes());
        body.extend_from_slice(&[tag::UTF8, 0x00, 0x01, b'x']);
        let data = pool_bytes(4, &body);

        let pool = ConstantPool::read(&mut ByteReader::new(&data)).unwrap();
        assert_eq!(pool.count(), 4);
        assert_eq!(pool.get(1), Some(&Constant::Long(42)));
        assert_eq!(pool.get(2), None);
        assert_eq!(pool.utf8(3).unwrap(), "x");
    }

    #[test]
    fn test_read_rejects_bad_reference() {
        // #1 Class -> #2, but #2 is an Integer
        let body = [tag::CLASS, 0x00, 0x02, tag::INTEGER, 0, 0, 0, 1];
        let data = pool_bytes(3, &body);

        assert_eq!(
            ConstantPool::read(&mut ByteReader::new(&data)),
            Err(DecodeError::BadConstantReference {
                index: 2,
                expected: "Utf8"
            })
        );
    }

    #[test]
    fn test_read_rejects_unknown_tag() {
        let data = pool_bytes(2, &[2, 0, 0]);
        assert_eq!(
            ConstantPool::read(&mut ByteReader::new(&data)),
            Err(DecodeError::InvalidConstantTag { index: 1, tag: 2 })
        );
    }

    #[test]
    fn test_read_rejects_dangling_wide_slot() {
        let mut body = vec![tag::DOUBLE];
        body.extend_from_slice(&1.5f64.to_bits().to_be_bytes());
        let data = pool_bytes(2, &body);

        assert!(matches!(
            ConstantPool::read(&mut ByteReader::new(&data)),
            Err(DecodeError::BadConstantReference { index: 1, .. })
        ));
    }

    #[test]
    fn test_ensure_deduplicates_and_appends() {
        let mut pool = ConstantPool::new();
        let f1 = pool.ensure_fieldref("com/example/Widget", "count", "I").unwrap();
        let f2 = pool.ensure_fieldref("com/example/Widget", "count", "I").unwrap();
        assert_eq!(f1, f2);

        // Utf8 x3, Class, NameAndType, Fieldref
        assert_eq!(pool.count(), 7);
        assert_eq!(pool.find_utf8("count"), Some(pool.ensure_utf8("count").unwrap()));
        assert!(pool.validate().is_ok());
    }

    #[test]
    fn test_write_round_trips() {
        let mut pool = ConstantPool::new();
        pool.ensure_class("java/lang/Object").unwrap();
        pool.ensure_name_and_type("<init>", "()V").unwrap();

        let mut out = ByteWriter::new();
        pool.write(&mut out);
        let bytes = out.into_bytes();

        let decoded = ConstantPool::read(&mut ByteReader::new(&bytes)).unwrap();
        assert_eq!(decoded, pool);
    }
}
