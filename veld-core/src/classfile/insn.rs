//! 指令
//!
//! 仅覆盖合成访问器所需的指令子集。

use super::constant_pool::ConstantPool;
use super::descriptor::{FieldType, ValueCategory};
use super::error::{AnalysisError, EncodeError};
use std::fmt;

/// 操作码
pub mod opcode {
    pub const ILOAD: u8 = 0x15;
    pub const LLOAD: u8 = 0x16;
    pub const FLOAD: u8 = 0x17;
    pub const DLOAD: u8 = 0x18;
    pub const ALOAD: u8 = 0x19;
    pub const ILOAD_0: u8 = 0x1a;
    pub const LLOAD_0: u8 = 0x1e;
    pub const FLOAD_0: u8 = 0x22;
    pub const DLOAD_0: u8 = 0x26;
    pub const ALOAD_0: u8 = 0x2a;
    pub const RETURN: u8 = 0xb1;
    pub const PUTFIELD: u8 = 0xb5;
    pub const WIDE: u8 = 0xc4;
}

/// 一条指令
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Insn {
    /// 按值类别加载局部变量
    Load { category: ValueCategory, slot: u16 },
    /// 将栈顶值写入对象字段
    PutField {
        owner: String,
        name: String,
        descriptor: String,
    },
    /// 无返回值返回
    Return,
}

impl Insn {
    /// 编码指令，必要时向常量池追加引用
    pub fn encode(&self, out: &mut Vec<u8>, cp: &mut ConstantPool) -> Result<(), EncodeError> {
        match self {
            Insn::Load { category, slot } => {
                let (short_base, general) = load_opcodes(*category);
                match *slot {
                    0..=3 => out.push(short_base + *slot as u8),
                    4..=255 => out.extend_from_slice(&[general, *slot as u8]),
                    _ => {
                        out.extend_from_slice(&[opcode::WIDE, general]);
                        out.extend_from_slice(&slot.to_be_bytes());
                    }
                }
            }
            Insn::PutField {
                owner,
                name,
                descriptor,
            } => {
                let index = cp.ensure_fieldref(owner, name, descriptor)?;
                out.push(opcode::PUTFIELD);
                out.extend_from_slice(&index.to_be_bytes());
            }
            Insn::Return => out.push(opcode::RETURN),
        }
        Ok(())
    }

    /// 操作数栈效应：(弹出槽位数, 压入槽位数)
    pub fn stack_effect(&self) -> Result<(u32, u32), AnalysisError> {
        match self {
            Insn::Load { category, .. } => Ok((0, category.slot_size() as u32)),
            Insn::PutField { descriptor, .. } => {
                let ty = FieldType::parse(descriptor)
                    .map_err(|_| AnalysisError::InvalidDescriptor(descriptor.clone()))?;
                Ok((1 + ty.slot_size() as u32, 0))
            }
            Insn::Return => Ok((0, 0)),
        }
    }

    /// 该指令访问到的局部变量上界（最高槽位 + 1）
    pub fn locals_needed(&self) -> u32 {
        match self {
            Insn::Load { category, slot } => *slot as u32 + category.slot_size() as u32,
            _ => 0,
        }
    }

    /// 执行后不会落到下一条指令
    pub fn is_terminal(&self) -> bool {
        matches!(self, Insn::Return)
    }
}

fn load_opcodes(category: ValueCategory) -> (u8, u8) {
    match category {
        ValueCategory::IntLike => (opcode::ILOAD_0, opcode::ILOAD),
        ValueCategory::Long => (opcode::LLOAD_0, opcode::LLOAD),
        ValueCategory::Float => (opcode::FLOAD_0, opcode::FLOAD),
        ValueCategory::Double => (opcode::DLOAD_0, opcode::DLOAD),
        ValueCategory::Reference => (opcode::ALOAD_0, opcode::ALOAD),
    }
}

impl fmt::Display for Insn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Insn::Load { category, slot } => {
                let prefix = match category {
                    ValueCategory::IntLike => 'i',
                    ValueCategory::Long => 'l',
                    ValueCategory::Float => 'f',
                    ValueCategory::Double => 'd',
                    ValueCategory::Reference => 'a',
                };
                if *slot <= 3 {
                    write!(f, "{}load_{}", prefix, slot)
                } else {
                    write!(f, "{}load {}", prefix, slot)
                }
            }
            Insn::PutField {
                owner,
                name,
                descriptor,
            } => write!(f, "putfield {}.{}:{}", owner, name, descriptor),
            Insn::Return => f.write_str("return"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(insn: &Insn) -> Vec<u8> {
        let mut out = Vec::new();
        insn.encode(&mut out, &mut ConstantPool::new()).unwrap();
        out
    }

    #[test]
    fn test_load_short_forms() {
        let load = |category, slot| encode(&Insn::Load { category, slot });
        assert_eq!(load(ValueCategory::Reference, 0), vec![0x2a]);
        assert_eq!(load(ValueCategory::IntLike, 1), vec![0x1b]);
        assert_eq!(load(ValueCategory::Long, 1), vec![0x1f]);
        assert_eq!(load(ValueCategory::Float, 1), vec![0x23]);
        assert_eq!(load(ValueCategory::Double, 1), vec![0x27]);
        assert_eq!(load(ValueCategory::Reference, 1), vec![0x2b]);
    }

    #[test]
    fn test_load_general_and_wide_forms() {
        let load = |category, slot| encode(&Insn::Load { category, slot });
        assert_eq!(load(ValueCategory::IntLike, 4), vec![opcode::ILOAD, 4]);
        assert_eq!(load(ValueCategory::Double, 255), vec![opcode::DLOAD, 255]);
        assert_eq!(
            load(ValueCategory::Reference, 300),
            vec![opcode::WIDE, opcode::ALOAD, 0x01, 0x2c]
        );
    }

    #[test]
    fn test_putfield_appends_fieldref() {
        let mut cp = ConstantPool::new();
        let mut out = Vec::new();
        let insn = Insn::PutField {
            owner: "Widget".to_string(),
            name: "count".to_string(),
            descriptor: "I".to_string(),
        };
        insn.encode(&mut out, &mut cp).unwrap();

        let index = cp.ensure_fieldref("Widget", "count", "I").unwrap();
        assert_eq!(out, vec![opcode::PUTFIELD, 0, index as u8]);
    }

    #[test]
    fn test_stack_effects() {
        let put_long = Insn::PutField {
            owner: "A".to_string(),
            name: "x".to_string(),
            descriptor: "J".to_string(),
        };
        assert_eq!(put_long.stack_effect().unwrap(), (3, 0));
        assert_eq!(
            Insn::Load {
                category: ValueCategory::Double,
                slot: 1
            }
            .stack_effect()
            .unwrap(),
            (0, 2)
        );

        let bad = Insn::PutField {
            owner: "A".to_string(),
            name: "x".to_string(),
            descriptor: "V".to_string(),
        };
        assert!(bad.stack_effect().is_err());
    }

    #[test]
    fn test_display() {
        let load = Insn::Load {
            category: ValueCategory::Long,
            slot: 1,
        };
        assert_eq!(load.to_string(), "lload_1");
        assert_eq!(Insn::Return.to_string(), "return");
    }
}
