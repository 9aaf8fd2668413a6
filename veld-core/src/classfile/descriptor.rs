//! 字段与方法描述符
//!
//! `I`、`J`、`Ljava/lang/String;`、`[I`、`(IJ)V` 等 JVM 描述符的解析与生成。

use super::error::DecodeError;
use std::fmt;

/// 数组最大维度
const MAX_ARRAY_DIMENSIONS: usize = 255;

/// 值类别，决定加载指令的形式与占用的局部变量槽位数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueCategory {
    /// boolean/byte/char/short/int 共用 `iload`
    IntLike,
    Long,
    Float,
    Double,
    /// 对象与数组
    Reference,
}

impl ValueCategory {
    /// long 与 double 占用两个槽位
    pub fn is_wide(&self) -> bool {
        matches!(self, ValueCategory::Long | ValueCategory::Double)
    }

    pub fn slot_size(&self) -> u16 {
        if self.is_wide() {
            2
        } else {
            1
        }
    }
}

/// 字段类型
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldType {
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
    /// 内部类名，例如 `java/lang/String`
    Object(String),
    Array(Box<FieldType>),
}

impl FieldType {
    /// 解析完整的字段描述符
    pub fn parse(descriptor: &str) -> Result<Self, DecodeError> {
        match Self::parse_prefix(descriptor) {
            Some((ty, "")) => Ok(ty),
            _ => Err(DecodeError::InvalidDescriptor(descriptor.to_string())),
        }
    }

    /// 解析描述符开头的一个类型，返回类型与剩余部分
    fn parse_prefix(s: &str) -> Option<(FieldType, &str)> {
        let dims = s.bytes().take_while(|&b| b == b'[').count();
        if dims > MAX_ARRAY_DIMENSIONS {
            return None;
        }
        let rest = &s[dims..];

        let (mut ty, rest) = match rest.as_bytes().first()? {
            b'Z' => (FieldType::Boolean, &rest[1..]),
            b'B' => (FieldType::Byte, &rest[1..]),
            b'C' => (FieldType::Char, &rest[1..]),
            b'S' => (FieldType::Short, &rest[1..]),
            b'I' => (FieldType::Int, &rest[1..]),
            b'J' => (FieldType::Long, &rest[1..]),
            b'F' => (FieldType::Float, &rest[1..]),
            b'D' => (FieldType::Double, &rest[1..]),
            b'L' => {
                let end = rest.find(';')?;
                let name = &rest[1..end];
                if name.is_empty() || name.contains(['.', '[']) {
                    return None;
                }
                (FieldType::Object(name.to_string()), &rest[end + 1..])
            }
            _ => return None,
        };

        for _ in 0..dims {
            ty = FieldType::Array(Box::new(ty));
        }
        Some((ty, rest))
    }

    /// 值类别
    pub fn category(&self) -> ValueCategory {
        match self {
            FieldType::Boolean
            | FieldType::Byte
            | FieldType::Char
            | FieldType::Short
            | FieldType::Int => ValueCategory::IntLike,
            FieldType::Long => ValueCategory::Long,
            FieldType::Float => ValueCategory::Float,
            FieldType::Double => ValueCategory::Double,
            FieldType::Object(_) | FieldType::Array(_) => ValueCategory::Reference,
        }
    }

    /// 局部变量槽位数
    pub fn slot_size(&self) -> u16 {
        self.category().slot_size()
    }

    /// 生成描述符字符串
    pub fn descriptor(&self) -> String {
        let mut out = String::new();
        self.write_descriptor(&mut out);
        out
    }

    fn write_descriptor(&self, out: &mut String) {
        match self {
            FieldType::Boolean => out.push('Z'),
            FieldType::Byte => out.push('B'),
            FieldType::Char => out.push('C'),
            FieldType::Short => out.push('S'),
            FieldType::Int => out.push('I'),
            FieldType::Long => out.push('J'),
            FieldType::Float => out.push('F'),
            FieldType::Double => out.push('D'),
            FieldType::Object(name) => {
                out.push('L');
                out.push_str(name);
                out.push(';');
            }
            FieldType::Array(inner) => {
                out.push('[');
                inner.write_descriptor(out);
            }
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.descriptor())
    }
}

/// 方法类型：参数列表与返回类型（`None` 表示 `V`）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodType {
    pub params: Vec<FieldType>,
    pub ret: Option<FieldType>,
}

impl MethodType {
    /// 解析方法描述符
    pub fn parse(descriptor: &str) -> Result<Self, DecodeError> {
        let invalid = || DecodeError::InvalidDescriptor(descriptor.to_string());

        let mut rest = descriptor.strip_prefix('(').ok_or_else(invalid)?;
        let mut params = Vec::new();
        while !rest.starts_with(')') {
            let (ty, tail) = FieldType::parse_prefix(rest).ok_or_else(invalid)?;
            params.push(ty);
            rest = tail;
        }
        let ret_desc = &rest[1..];

        let ret = if ret_desc == "V" {
            None
        } else {
            Some(FieldType::parse(ret_desc).map_err(|_| invalid())?)
        };
        Ok(Self { params, ret })
    }

    /// 单参数、无返回值的 setter 类型
    pub fn setter(field: &FieldType) -> Self {
        Self {
            params: vec![field.clone()],
            ret: None,
        }
    }

    /// 参数占用的局部变量槽位数（不含 `this`）
    pub fn param_slots(&self) -> u32 {
        self.params.iter().map(|p| p.slot_size() as u32).sum()
    }

    /// 生成描述符字符串
    pub fn descriptor(&self) -> String {
        let mut out = String::from("(");
        for param in &self.params {
            param.write_descriptor(&mut out);
        }
        out.push(')');
        match &self.ret {
            Some(ret) => ret.write_descriptor(&mut out),
            None => out.push('V'),
        }
        out
    }
}

impl fmt::Display for MethodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.descriptor())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_field_types() {
        assert_eq!(FieldType::parse("I").unwrap(), FieldType::Int);
        assert_eq!(
            FieldType::parse("Ljava/lang/String;").unwrap(),
            FieldType::Object("java/lang/String".to_string())
        );
        assert_eq!(
            FieldType::parse("[[J").unwrap(),
            FieldType::Array(Box::new(FieldType::Array(Box::new(FieldType::Long))))
        );
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in ["", "V", "Q", "II", "L;", "Ljava/lang/String", "[", "Ljava.lang.String;"] {
            assert!(FieldType::parse(bad).is_err(), "should reject {:?}", bad);
        }
    }

    #[test]
    fn test_categories() {
        for (desc, category) in [
            ("Z", ValueCategory::IntLike),
            ("B", ValueCategory::IntLike),
            ("C", ValueCategory::IntLike),
            ("S", ValueCategory::IntLike),
            ("I", ValueCategory::IntLike),
            ("J", ValueCategory::Long),
            ("F", ValueCategory::Float),
            ("D", ValueCategory::Double),
            ("Ljava/util/List;", ValueCategory::Reference),
            ("[D", ValueCategory::Reference),
        ] {
            assert_eq!(FieldType::parse(desc).unwrap().category(), category, "{}", desc);
        }
        assert_eq!(FieldType::Double.slot_size(), 2);
        assert_eq!(FieldType::Array(Box::new(FieldType::Double)).slot_size(), 1);
    }

    #[test]
    fn test_method_type() {
        let mt = MethodType::parse("(IJLjava/lang/String;[B)Ljava/lang/Object;").unwrap();
        assert_eq!(mt.params.len(), 4);
        assert_eq!(mt.param_slots(), 5);
        assert_eq!(mt.descriptor(), "(IJLjava/lang/String;[B)Ljava/lang/Object;");

        assert_eq!(MethodType::parse("()V").unwrap().ret, None);
        assert!(MethodType::parse("(I").is_err());
        assert!(MethodType::parse("I)V").is_err());
        assert!(MethodType::parse("()").is_err());
    }

    #[test]
    fn test_setter_descriptor() {
        assert_eq!(MethodType::setter(&FieldType::Long).descriptor(), "(J)V");
        let list = FieldType::Object("java/util/List".to_string());
        assert_eq!(MethodType::setter(&list).to_string(), "(Ljava/util/List;)V");
    }
}
