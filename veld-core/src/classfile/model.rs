//! 结构树
//!
//! 一个 `CompiledModule` 对应一个 class 文件。字段与方法按声明顺序存放在
//! 向量中，以 `FieldId` / `MethodId` 下标引用。已有成员是只读的，
//! 只能通过 [`CompiledModule::add_method`] 追加新方法。

use super::analysis::{compute_maxs, MaxValues};
use super::attribute::{CodeInfo, RawAttribute};
use super::constant_pool::ConstantPool;
use super::descriptor::{FieldType, MethodType};
use super::error::{AnalysisError, EncodeError};
use super::header::ClassVersion;
use super::insn::Insn;

/// 访问标志位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AccessFlags(pub u16);

impl AccessFlags {
    pub const PUBLIC: u16 = 0x0001;
    pub const PRIVATE: u16 = 0x0002;
    pub const PROTECTED: u16 = 0x0004;
    pub const STATIC: u16 = 0x0008;
    pub const FINAL: u16 = 0x0010;
    pub const SUPER: u16 = 0x0020;
    pub const ABSTRACT: u16 = 0x0400;
    /// 由编译器或工具生成
    pub const SYNTHETIC: u16 = 0x1000;

    /// 创建空的访问标志
    pub fn empty() -> Self {
        Self(0)
    }

    /// 检查是否包含指定标志
    pub fn contains(&self, flag: u16) -> bool {
        (self.0 & flag) != 0
    }

    /// 添加标志
    pub fn insert(&mut self, flag: u16) {
        self.0 |= flag;
    }

    /// 可见性
    pub fn visibility(&self) -> Visibility {
        if self.contains(Self::PUBLIC) {
            Visibility::Public
        } else if self.contains(Self::PRIVATE) {
            Visibility::Private
        } else if self.contains(Self::PROTECTED) {
            Visibility::Protected
        } else {
            Visibility::Package
        }
    }
}

/// 成员可见性
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Protected,
    Package,
    Private,
}

/// 字段下标
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldId(pub usize);

/// 方法下标
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MethodId(pub usize);

/// 字段（解码后不可变）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    access: AccessFlags,
    name: String,
    descriptor: String,
    field_type: FieldType,
    markers: Vec<String>,
    pub(crate) member: DecodedMember,
}

impl FieldDescriptor {
    pub(crate) fn decoded(
        access: AccessFlags,
        name: String,
        descriptor: String,
        field_type: FieldType,
        markers: Vec<String>,
        member: DecodedMember,
    ) -> Self {
        Self {
            access,
            name,
            descriptor,
            field_type,
            markers,
            member,
        }
    }

    pub fn access(&self) -> AccessFlags {
        self.access
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 原始描述符字符串，例如 `I`
    pub fn descriptor(&self) -> &str {
        &self.descriptor
    }

    pub fn field_type(&self) -> &FieldType {
        &self.field_type
    }

    /// 附加在字段上的注解类型描述符，按属性中的出现顺序
    pub fn markers(&self) -> &[String] {
        &self.markers
    }

    pub fn visibility(&self) -> Visibility {
        self.access.visibility()
    }

    pub fn is_static(&self) -> bool {
        self.access.contains(AccessFlags::STATIC)
    }
}

/// 方法体
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodCode {
    /// abstract / native 方法
    Absent,
    /// 解码得到的原始字节码（随原始属性原样写回）
    Bytecode(Vec<u8>),
    /// 合成的指令序列（编码时生成 `Code` 属性）
    Instructions(Vec<Insn>),
}

/// 已解码成员在常量池中的位置与原始属性
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DecodedMember {
    pub(crate) name_index: u16,
    pub(crate) descriptor_index: u16,
    pub(crate) attributes: Vec<RawAttribute>,
}

/// 方法
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDescriptor {
    access: AccessFlags,
    name: String,
    descriptor: String,
    max_stack: u16,
    max_locals: u16,
    code: MethodCode,
    pub(crate) decoded: Option<DecodedMember>,
}

impl MethodDescriptor {
    pub(crate) fn decoded(
        access: AccessFlags,
        name: String,
        descriptor: String,
        code: Option<CodeInfo>,
        member: DecodedMember,
    ) -> Self {
        let (max_stack, max_locals, code) = match code {
            Some(info) => (
                info.max_stack,
                info.max_locals,
                MethodCode::Bytecode(info.code),
            ),
            None => (0, 0, MethodCode::Absent),
        };
        Self {
            access,
            name,
            descriptor,
            max_stack,
            max_locals,
            code,
            decoded: Some(member),
        }
    }

    /// 由指令序列创建新方法，容量由分析得出
    pub fn synthesized(
        access: AccessFlags,
        name: impl Into<String>,
        method_type: &MethodType,
        insns: Vec<Insn>,
    ) -> Result<Self, AnalysisError> {
        let MaxValues {
            max_stack,
            max_locals,
        } = compute_maxs(&insns, method_type, access.contains(AccessFlags::STATIC))?;

        Ok(Self {
            access,
            name: name.into(),
            descriptor: method_type.descriptor(),
            max_stack,
            max_locals,
            code: MethodCode::Instructions(insns),
            decoded: None,
        })
    }

    pub fn access(&self) -> AccessFlags {
        self.access
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn descriptor(&self) -> &str {
        &self.descriptor
    }

    pub fn max_stack(&self) -> u16 {
        self.max_stack
    }

    pub fn max_locals(&self) -> u16 {
        self.max_locals
    }

    pub fn code(&self) -> &MethodCode {
        &self.code
    }

    /// 合成方法的指令序列
    pub fn instructions(&self) -> Option<&[Insn]> {
        match &self.code {
            MethodCode::Instructions(insns) => Some(insns),
            _ => None,
        }
    }

    pub fn is_synthetic(&self) -> bool {
        self.access.contains(AccessFlags::SYNTHETIC)
    }

    /// 是否由本进程新建（而非从 class 文件解码）
    pub fn is_synthesized(&self) -> bool {
        self.decoded.is_none()
    }
}

/// 一个 class 文件的结构树
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledModule {
    version: ClassVersion,
    access: AccessFlags,
    name: String,
    super_name: Option<String>,
    fields: Vec<FieldDescriptor>,
    methods: Vec<MethodDescriptor>,
    pub(crate) constant_pool: ConstantPool,
    pub(crate) this_class: u16,
    pub(crate) super_class: u16,
    pub(crate) interfaces: Vec<u16>,
    pub(crate) attributes: Vec<RawAttribute>,
}

/// 解码器组装 `CompiledModule` 所需的全部部件
pub(crate) struct ModuleParts {
    pub(crate) version: ClassVersion,
    pub(crate) access: AccessFlags,
    pub(crate) name: String,
    pub(crate) super_name: Option<String>,
    pub(crate) fields: Vec<FieldDescriptor>,
    pub(crate) methods: Vec<MethodDescriptor>,
    pub(crate) constant_pool: ConstantPool,
    pub(crate) this_class: u16,
    pub(crate) super_class: u16,
    pub(crate) interfaces: Vec<u16>,
    pub(crate) attributes: Vec<RawAttribute>,
}

impl CompiledModule {
    pub(crate) fn from_parts(parts: ModuleParts) -> Self {
        Self {
            version: parts.version,
            access: parts.access,
            name: parts.name,
            super_name: parts.super_name,
            fields: parts.fields,
            methods: parts.methods,
            constant_pool: parts.constant_pool,
            this_class: parts.this_class,
            super_class: parts.super_class,
            interfaces: parts.interfaces,
            attributes: parts.attributes,
        }
    }

    /// 内部类名，例如 `com/example/Widget`
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn super_name(&self) -> Option<&str> {
        self.super_name.as_deref()
    }

    pub fn version(&self) -> ClassVersion {
        self.version
    }

    pub fn access(&self) -> AccessFlags {
        self.access
    }

    pub fn constant_pool(&self) -> &ConstantPool {
        &self.constant_pool
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn methods(&self) -> &[MethodDescriptor] {
        &self.methods
    }

    pub fn field(&self, id: FieldId) -> Option<&FieldDescriptor> {
        self.fields.get(id.0)
    }

    pub fn method(&self, id: MethodId) -> Option<&MethodDescriptor> {
        self.methods.get(id.0)
    }

    /// 同名的所有方法（重载）
    pub fn methods_named<'a>(
        &'a self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a MethodDescriptor> + 'a {
        self.methods.iter().filter(move |m| m.name == name)
    }

    /// 是否已存在 (name, descriptor) 完全相同的方法
    pub fn has_method(&self, name: &str, descriptor: &str) -> bool {
        self.methods_named(name).any(|m| m.descriptor == descriptor)
    }

    /// 追加方法；(name, descriptor) 已存在时拒绝
    pub fn add_method(&mut self, method: MethodDescriptor) -> Result<MethodId, EncodeError> {
        if self.has_method(&method.name, &method.descriptor) {
            return Err(EncodeError::DuplicateMethod {
                name: method.name,
                descriptor: method.descriptor,
            });
        }
        if self.methods.len() >= u16::MAX as usize {
            return Err(EncodeError::LimitExceeded {
                what: "methods_count",
            });
        }
        self.methods.push(method);
        Ok(MethodId(self.methods.len() - 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classfile::descriptor::ValueCategory;

    fn empty_module() -> CompiledModule {
        CompiledModule::from_parts(ModuleParts {
            version: ClassVersion::JAVA_8,
            access: AccessFlags(AccessFlags::PUBLIC | AccessFlags::SUPER),
            name: "Widget".to_string(),
            super_name: Some("java/lang/Object".to_string()),
            fields: Vec::new(),
            methods: Vec::new(),
            constant_pool: ConstantPool::new(),
            this_class: 0,
            super_class: 0,
            interfaces: Vec::new(),
            attributes: Vec::new(),
        })
    }

    fn noop(name: &str, descriptor: &str) -> MethodDescriptor {
        MethodDescriptor::synthesized(
            AccessFlags(AccessFlags::PUBLIC | AccessFlags::STATIC),
            name,
            &MethodType::parse(descriptor).unwrap(),
            vec![Insn::Return],
        )
        .unwrap()
    }

    #[test]
    fn test_access_flags_visibility() {
        assert_eq!(AccessFlags(0x0001).visibility(), Visibility::Public);
        assert_eq!(AccessFlags(0x0002 | 0x0010).visibility(), Visibility::Private);
        assert_eq!(AccessFlags(0x0004).visibility(), Visibility::Protected);
        assert_eq!(AccessFlags::empty().visibility(), Visibility::Package);

        let mut flags = AccessFlags::empty();
        flags.insert(AccessFlags::SYNTHETIC);
        assert!(flags.contains(AccessFlags::SYNTHETIC));
        assert!(!flags.contains(AccessFlags::STATIC));
    }

    #[test]
    fn test_add_method_rejects_duplicates() {
        let mut module = empty_module();
        assert_eq!(module.add_method(noop("run", "()V")).unwrap(), MethodId(0));
        assert_eq!(module.add_method(noop("run", "(I)V")).unwrap(), MethodId(1));

        assert_eq!(
            module.add_method(noop("run", "()V")),
            Err(EncodeError::DuplicateMethod {
                name: "run".to_string(),
                descriptor: "()V".to_string()
            })
        );
        assert_eq!(module.methods_named("run").count(), 2);
        assert!(module.has_method("run", "(I)V"));
        assert!(!module.has_method("run", "(J)V"));
    }

    #[test]
    fn test_synthesized_method_capacities() {
        let method = MethodDescriptor::synthesized(
            AccessFlags(AccessFlags::PUBLIC),
            "set",
            &MethodType::setter(&FieldType::Double),
            vec![
                Insn::Load {
                    category: ValueCategory::Reference,
                    slot: 0,
                },
                Insn::Load {
                    category: ValueCategory::Double,
                    slot: 1,
                },
                Insn::PutField {
                    owner: "Widget".to_string(),
                    name: "ratio".to_string(),
                    descriptor: "D".to_string(),
                },
                Insn::Return,
            ],
        )
        .unwrap();

        assert_eq!(method.descriptor(), "(D)V");
        assert_eq!((method.max_stack(), method.max_locals()), (3, 3));
        assert!(method.is_synthesized());
        assert_eq!(method.instructions().map(<[Insn]>::len), Some(4));
    }
}
