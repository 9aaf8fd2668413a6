//! Class file fixtures for tests
//!
//! `ClassFixture` assembles real class file bytes by hand, without going
//! through `write_class`, so codec tests do not validate the encoder against
//! itself.
//!
//! ```rust,ignore
//! use veld_core::testing::{ClassFixture, ACC_PRIVATE};
//!
//! let bytes = ClassFixture::new("com/example/Widget")
//!     .annotated_field(ACC_PRIVATE, "count", "I", &["Lcom/veld/annotation/Inject;"])
//!     .build();
//! assert_eq!(&bytes[..4], &[0xCA, 0xFE, 0xBA, 0xBE]);
//! ```

use std::collections::HashMap;

pub const ACC_PUBLIC: u16 = 0x0001;
pub const ACC_PRIVATE: u16 = 0x0002;
pub const ACC_PROTECTED: u16 = 0x0004;
pub const ACC_STATIC: u16 = 0x0008;
pub const ACC_FINAL: u16 = 0x0010;
pub const ACC_SUPER: u16 = 0x0020;
pub const ACC_SYNTHETIC: u16 = 0x1000;

const VALUE_ANNOTATION: &str = "Lcom/veld/annotation/Value;";

/// Constant pool under construction, deduplicated by encoded entry bytes
#[derive(Default)]
struct Pool {
    bytes: Vec<u8>,
    next: u16,
    seen: HashMap<Vec<u8>, u16>,
}

impl Pool {
    fn new() -> Self {
        Self {
            next: 1,
            ..Self::default()
        }
    }

    fn add(&mut self, entry: Vec<u8>, slots: u16) -> u16 {
        if let Some(&index) = self.seen.get(&entry) {
            return index;
        }
        let index = self.next;
        self.bytes.extend_from_slice(&entry);
        self.seen.insert(entry, index);
        self.next += slots;
        index
    }

    /// ASCII-only names are enough for fixtures
    fn utf8(&mut self, value: &str) -> u16 {
        let mut entry = vec![1];
        entry.extend_from_slice(&(value.len() as u16).to_be_bytes());
        entry.extend_from_slice(value.as_bytes());
        self.add(entry, 1)
    }

    fn class(&mut self, name: &str) -> u16 {
        let name = self.utf8(name);
        self.add(tagged(7, &[name]), 1)
    }

    fn name_and_type(&mut self, name: &str, descriptor: &str) -> u16 {
        let name = self.utf8(name);
        let descriptor = self.utf8(descriptor);
        self.add(tagged(12, &[name, descriptor]), 1)
    }

    fn methodref(&mut self, owner: &str, name: &str, descriptor: &str) -> u16 {
        let class = self.class(owner);
        let nat = self.name_and_type(name, descriptor);
        self.add(tagged(10, &[class, nat]), 1)
    }

    fn long(&mut self, value: i64) -> u16 {
        let mut entry = vec![5];
        entry.extend_from_slice(&value.to_be_bytes());
        self.add(entry, 2)
    }
}

fn tagged(tag: u8, indices: &[u16]) -> Vec<u8> {
    let mut entry = vec![tag];
    for index in indices {
        entry.extend_from_slice(&index.to_be_bytes());
    }
    entry
}

fn u2(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_be_bytes());
}

fn u4(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_be_bytes());
}

fn attribute(out: &mut Vec<u8>, name_index: u16, info: &[u8]) {
    u2(out, name_index);
    u4(out, info.len() as u32);
    out.extend_from_slice(info);
}

#[derive(Debug, Clone)]
struct FieldSpec {
    access: u16,
    name: String,
    descriptor: String,
    visible: Vec<String>,
    invisible: Vec<String>,
    value_expression: Option<String>,
    constant_long: Option<i64>,
}

#[derive(Debug, Clone)]
struct MethodSpec {
    access: u16,
    name: String,
    descriptor: String,
    max_locals: u16,
}

/// Builder for hand-assembled class files
#[derive(Debug, Clone)]
pub struct ClassFixture {
    name: String,
    super_name: String,
    major: u16,
    default_constructor: bool,
    source_file: Option<String>,
    fields: Vec<FieldSpec>,
    methods: Vec<MethodSpec>,
}

impl ClassFixture {
    /// Public class extending `java/lang/Object`, version 52, with a
    /// default constructor
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            super_name: "java/lang/Object".to_string(),
            major: 52,
            default_constructor: true,
            source_file: None,
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn major_version(mut self, major: u16) -> Self {
        self.major = major;
        self
    }

    pub fn without_constructor(mut self) -> Self {
        self.default_constructor = false;
        self
    }

    pub fn source_file(mut self, file: &str) -> Self {
        self.source_file = Some(file.to_string());
        self
    }

    fn push_field(
        mut self,
        access: u16,
        name: &str,
        descriptor: &str,
        edit: impl FnOnce(&mut FieldSpec),
    ) -> Self {
        let mut spec = FieldSpec {
            access,
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            visible: Vec::new(),
            invisible: Vec::new(),
            value_expression: None,
            constant_long: None,
        };
        edit(&mut spec);
        self.fields.push(spec);
        self
    }

    /// Field without annotations
    pub fn field(self, access: u16, name: &str, descriptor: &str) -> Self {
        self.push_field(access, name, descriptor, |_| {})
    }

    /// Field with `RuntimeVisibleAnnotations` of the given types
    pub fn annotated_field(
        self,
        access: u16,
        name: &str,
        descriptor: &str,
        annotations: &[&str],
    ) -> Self {
        self.push_field(access, name, descriptor, |f| {
            f.visible = annotations.iter().map(|a| a.to_string()).collect();
        })
    }

    /// Field with `RuntimeInvisibleAnnotations` of the given types
    pub fn invisible_annotated_field(
        self,
        access: u16,
        name: &str,
        descriptor: &str,
        annotations: &[&str],
    ) -> Self {
        self.push_field(access, name, descriptor, |f| {
            f.invisible = annotations.iter().map(|a| a.to_string()).collect();
        })
    }

    /// Field with `@Value(value = "<expression>")`
    pub fn value_field(self, access: u16, name: &str, descriptor: &str, expression: &str) -> Self {
        self.push_field(access, name, descriptor, |f| {
            f.value_expression = Some(expression.to_string());
        })
    }

    /// `static final long` field with a `ConstantValue` attribute
    pub fn constant_long(self, name: &str, value: i64) -> Self {
        self.push_field(ACC_PRIVATE | ACC_STATIC | ACC_FINAL, name, "J", |f| {
            f.constant_long = Some(value);
        })
    }

    /// Method whose body is a single `return`; the descriptor must return `V`
    pub fn method(mut self, access: u16, name: &str, descriptor: &str) -> Self {
        let params = descriptor
            .strip_prefix('(')
            .and_then(|d| d.split_once(')'))
            .map(|(params, _)| params)
            .unwrap_or("");
        let this_slot = if access & ACC_STATIC != 0 { 0 } else { 1 };
        self.methods.push(MethodSpec {
            access,
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            max_locals: this_slot + param_slots(params),
        });
        self
    }

    /// Assemble the class file bytes
    pub fn build(&self) -> Vec<u8> {
        let mut pool = Pool::new();
        let mut body = Vec::new();

        let this_class = pool.class(&self.name);
        let super_class = pool.class(&self.super_name);
        u2(&mut body, ACC_PUBLIC | ACC_SUPER);
        u2(&mut body, this_class);
        u2(&mut body, super_class);
        u2(&mut body, 0);

        u2(&mut body, self.fields.len() as u16);
        for field in &self.fields {
            self.write_field(&mut pool, &mut body, field);
        }

        let method_count = self.methods.len() + usize::from(self.default_constructor);
        u2(&mut body, method_count as u16);
        if self.default_constructor {
            let init = pool.methodref(&self.super_name, "<init>", "()V");
            // aload_0; invokespecial; return
            let code = [0x2a, 0xb7, (init >> 8) as u8, init as u8, 0xb1];
            write_method(&mut pool, &mut body, ACC_PUBLIC, "<init>", "()V", 1, 1, &code);
        }
        for method in &self.methods {
            write_method(
                &mut pool,
                &mut body,
                method.access,
                &method.name,
                &method.descriptor,
                0,
                method.max_locals,
                &[0xb1],
            );
        }

        match &self.source_file {
            Some(file) => {
                u2(&mut body, 1);
                let name = pool.utf8("SourceFile");
                let value = pool.utf8(file);
                attribute(&mut body, name, &value.to_be_bytes());
            }
            None => u2(&mut body, 0),
        }

        let mut out = vec![0xCA, 0xFE, 0xBA, 0xBE];
        u2(&mut out, 0);
        u2(&mut out, self.major);
        u2(&mut out, pool.next);
        out.extend_from_slice(&pool.bytes);
        out.extend_from_slice(&body);
        out
    }

    fn write_field(&self, pool: &mut Pool, out: &mut Vec<u8>, field: &FieldSpec) {
        u2(out, field.access);
        u2(out, pool.utf8(&field.name));
        u2(out, pool.utf8(&field.descriptor));

        let mut attributes: Vec<(u16, Vec<u8>)> = Vec::new();
        if let Some(value) = field.constant_long {
            let name = pool.utf8("ConstantValue");
            attributes.push((name, pool.long(value).to_be_bytes().to_vec()));
        }
        if !field.visible.is_empty() || field.value_expression.is_some() {
            let name = pool.utf8("RuntimeVisibleAnnotations");
            let mut info = Vec::new();
            let count = field.visible.len() + usize::from(field.value_expression.is_some());
            u2(&mut info, count as u16);
            for annotation in &field.visible {
                u2(&mut info, pool.utf8(annotation));
                u2(&mut info, 0);
            }
            if let Some(expression) = &field.value_expression {
                u2(&mut info, pool.utf8(VALUE_ANNOTATION));
                u2(&mut info, 1);
                u2(&mut info, pool.utf8("value"));
                info.push(b's');
                u2(&mut info, pool.utf8(expression));
            }
            attributes.push((name, info));
        }
        if !field.invisible.is_empty() {
            let name = pool.utf8("RuntimeInvisibleAnnotations");
            let mut info = Vec::new();
            u2(&mut info, field.invisible.len() as u16);
            for annotation in &field.invisible {
                u2(&mut info, pool.utf8(annotation));
                u2(&mut info, 0);
            }
            attributes.push((name, info));
        }

        u2(out, attributes.len() as u16);
        for (name, info) in &attributes {
            attribute(out, *name, info);
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn write_method(
    pool: &mut Pool,
    out: &mut Vec<u8>,
    access: u16,
    name: &str,
    descriptor: &str,
    max_stack: u16,
    max_locals: u16,
    code: &[u8],
) {
    u2(out, access);
    u2(out, pool.utf8(name));
    u2(out, pool.utf8(descriptor));
    u2(out, 1);

    let mut info = Vec::new();
    u2(&mut info, max_stack);
    u2(&mut info, max_locals);
    u4(&mut info, code.len() as u32);
    info.extend_from_slice(code);
    u2(&mut info, 0);
    u2(&mut info, 0);
    let code_name = pool.utf8("Code");
    attribute(out, code_name, &info);
}

/// Local slots taken by a parameter list such as `IJLjava/lang/String;`
fn param_slots(mut params: &str) -> u16 {
    let mut slots = 0;
    while let Some(c) = params.chars().next() {
        let array = c == '[';
        params = params.trim_start_matches('[');
        let width = match params.chars().next() {
            Some('J') | Some('D') if !array => 2,
            _ => 1,
        };
        params = match params.strip_prefix('L') {
            Some(rest) => rest.split_once(';').map(|(_, tail)| tail).unwrap_or(""),
            None => params.get(1..).unwrap_or(""),
        };
        slots += width;
    }
    slots
}
