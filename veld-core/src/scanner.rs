//! Injection-target scanner
//!
//! Read-only query over a decoded module: which fields need a generated
//! setter.

use crate::classfile::{CompiledModule, FieldDescriptor, Visibility};
use tracing::debug;

/// `@com.veld.annotation.Inject`
pub const VELD_INJECT: &str = "Lcom/veld/annotation/Inject;";
/// `@com.veld.annotation.Value`
pub const VELD_VALUE: &str = "Lcom/veld/annotation/Value;";
/// `@javax.inject.Inject` (JSR-330)
pub const JAVAX_INJECT: &str = "Ljavax/inject/Inject;";
/// `@jakarta.inject.Inject`
pub const JAKARTA_INJECT: &str = "Ljakarta/inject/Inject;";

/// Annotation type descriptors recognized as injection markers
pub const INJECTION_MARKERS: [&str; 4] = [VELD_INJECT, VELD_VALUE, JAVAX_INJECT, JAKARTA_INJECT];

/// Whether `marker` (an annotation type descriptor) requests injection
pub fn is_injection_marker(marker: &str) -> bool {
    INJECTION_MARKERS.contains(&marker)
}

/// Whether the field carries at least one injection marker
pub fn has_injection_marker(field: &FieldDescriptor) -> bool {
    field.markers().iter().any(|m| is_injection_marker(m))
}

/// Select the fields that need an accessor, in declaration order.
///
/// A field qualifies when it is private, non-static and marked. Marked
/// fields that are not private are already settable and are skipped.
pub fn select(module: &CompiledModule) -> Vec<&FieldDescriptor> {
    let mut selected = Vec::new();

    for field in module.fields() {
        if !has_injection_marker(field) {
            continue;
        }
        if field.visibility() != Visibility::Private {
            debug!(
                target: "veld::scan",
                class = module.name(),
                field = field.name(),
                visibility = ?field.visibility(),
                "skipping non-private injection target"
            );
            continue;
        }
        if field.is_static() {
            debug!(
                target: "veld::scan",
                class = module.name(),
                field = field.name(),
                "skipping static injection target"
            );
            continue;
        }
        selected.push(field);
    }

    debug!(
        target: "veld::scan",
        class = module.name(),
        fields = module.fields().len(),
        selected = selected.len(),
        "scanned fields"
    );
    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classfile::read_class;
    use crate::testing::{ClassFixture, ACC_PRIVATE, ACC_PROTECTED, ACC_PUBLIC, ACC_STATIC};

    fn names(module: &CompiledModule) -> Vec<&str> {
        select(module).into_iter().map(|f| f.name()).collect()
    }

    #[test]
    fn test_marker_set() {
        for marker in INJECTION_MARKERS {
            assert!(is_injection_marker(marker));
        }
        assert!(!is_injection_marker("Ljava/lang/Deprecated;"));
        assert!(!is_injection_marker("com/veld/annotation/Inject"));
    }

    #[test]
    fn test_selects_only_private_marked_fields() {
        let bytes = ClassFixture::new("com/example/Widget")
            .annotated_field(ACC_PRIVATE, "count", "I", &[VELD_INJECT])
            .annotated_field(ACC_PUBLIC, "label", "Ljava/lang/String;", &[VELD_INJECT])
            .annotated_field(ACC_PROTECTED, "parent", "Ljava/lang/Object;", &[JAVAX_INJECT])
            .annotated_field(0, "pkg", "I", &[JAKARTA_INJECT])
            .field(ACC_PRIVATE, "plain", "J")
            .build();
        let module = read_class(&bytes).unwrap();

        assert_eq!(names(&module), vec!["count"]);
    }

    #[test]
    fn test_selection_keeps_declaration_order() {
        let bytes = ClassFixture::new("Service")
            .annotated_field(ACC_PRIVATE, "zeta", "I", &[JAKARTA_INJECT])
            .value_field(ACC_PRIVATE, "alpha", "Ljava/lang/String;", "${app.name}")
            .invisible_annotated_field(ACC_PRIVATE, "mid", "D", &[JAVAX_INJECT])
            .build();
        let module = read_class(&bytes).unwrap();

        assert_eq!(names(&module), vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_static_and_unrelated_annotations_are_ignored() {
        let bytes = ClassFixture::new("Config")
            .annotated_field(ACC_PRIVATE | ACC_STATIC, "shared", "I", &[VELD_INJECT])
            .annotated_field(ACC_PRIVATE, "legacy", "I", &["Ljava/lang/Deprecated;"])
            .build();
        let module = read_class(&bytes).unwrap();

        assert!(select(&module).is_empty());
    }
}
