use proptest::prelude::*;
use qualified_binds::{
    normalize, AnnotationValue, BindError, Capability, Implementation,
    Qualifier, Registrar,
};
use std::collections::BTreeSet;

fn identifier_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z_][A-Za-z0-9_]{0,8}"
}

fn path_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(identifier_strategy(), 1..4)
        .prop_map(|segments| segments.join("."))
}

fn value_strategy() -> impl Strategy<Value = AnnotationValue> {
    prop_oneof![
        path_strategy().prop_map(AnnotationValue::Class),
        path_strategy()
            .prop_filter("constant paths cannot end in `.class`", |path| {
                path != "class" && !path.ends_with(".class")
            })
            .prop_map(AnnotationValue::Constant),
        "\\PC{0,12}".prop_map(AnnotationValue::Text),
    ]
}

fn qualifier_strategy() -> impl Strategy<Value = Qualifier> {
    prop_oneof![
        "\\PC{0,16}".prop_map(Qualifier::named),
        (path_strategy(), prop::option::of(value_strategy()))
            .prop_map(|(marker, value)| Qualifier::annotated(marker, value)),
    ]
}

/// Small key space so that generated declarations collide often.
fn declarations_strategy(
) -> impl Strategy<Value = Vec<(u8, Option<u8>, u8)>> {
    prop::collection::vec((0u8..3, prop::option::of(0u8..3), 0u8..8), 0..24)
}

fn register_all(
    declarations: &[(u8, Option<u8>, u8)],
) -> (BTreeSet<(Capability, Option<Qualifier>)>, usize) {
    let mut registrar = Registrar::new();
    let mut rejected = 0;
    for (capability, qualifier, implementation) in declarations {
        let result = registrar.register(
            Capability::new(format!("pkg.Capability{capability}")),
            qualifier.map(|key| Qualifier::named(format!("key{key}"))),
            Implementation::new(format!("pkg.Imp{implementation}")),
        );
        match result {
            Ok(()) => {}
            Err(BindError::DuplicateBinding { .. }) => rejected += 1,
            Err(error) => panic!("unexpected error: {error}"),
        }
    }

    let registry = registrar.build().unwrap();
    let keys = registry
        .bindings()
        .map(|binding| {
            (binding.capability().clone(), binding.qualifier().cloned())
        })
        .collect();
    (keys, rejected)
}

proptest! {
    /// Property: a qualifier's rendering normalizes back to the qualifier
    #[test]
    fn rendered_qualifiers_normalize_to_themselves(qualifier in qualifier_strategy()) {
        let rendered = qualifier.to_string();
        prop_assert_eq!(&qualifier, &normalize(rendered.as_str()).unwrap());
    }

    /// Property: normalizing twice gives the same qualifier as normalizing once
    #[test]
    fn normalization_is_idempotent(expression in "\\PC{0,24}") {
        if let Ok(once) = normalize(expression.as_str()) {
            let twice = normalize(once.to_string()).unwrap();
            prop_assert_eq!(once, twice);
        }
    }

    /// Property: a name key and a marker with the same text never collide
    #[test]
    fn named_and_annotated_are_distinct(path in path_strategy()) {
        prop_assert_ne!(
            Qualifier::named(&path),
            Qualifier::annotated(&path, None)
        );
    }

    /// Property: which keys end up bound does not depend on registration order
    #[test]
    fn duplicates_are_order_independent(declarations in declarations_strategy()) {
        let (forward_keys, forward_rejected) = register_all(&declarations);

        let mut reversed = declarations.clone();
        reversed.reverse();
        let (reverse_keys, reverse_rejected) = register_all(&reversed);

        prop_assert_eq!(&forward_keys, &reverse_keys);
        prop_assert_eq!(forward_rejected, reverse_rejected);
        prop_assert_eq!(declarations.len(), forward_keys.len() + forward_rejected);
    }

    /// Property: every registered key resolves to its own implementation
    #[test]
    fn resolve_returns_registered_implementation(
        declarations in prop::collection::btree_map(
            (0u8..4, prop::option::of(qualifier_strategy())),
            path_strategy(),
            0..16,
        )
    ) {
        let mut registrar = Registrar::new();
        for ((capability, qualifier), implementation) in &declarations {
            registrar
                .register(
                    Capability::new(format!("pkg.Capability{capability}")),
                    qualifier.clone(),
                    Implementation::new(implementation),
                )
                .unwrap();
        }

        let registry = registrar.build().unwrap();
        prop_assert_eq!(declarations.len(), registry.len());
        for ((capability, qualifier), implementation) in &declarations {
            let binding = registry
                .resolve(
                    &Capability::new(format!("pkg.Capability{capability}")),
                    qualifier.as_ref(),
                )
                .unwrap();
            prop_assert_eq!(implementation.as_str(), binding.implementation().name());
        }
    }
}
