use crate::Qualifier;
use serde::{Deserialize, Serialize};
use std::{
    any::Any,
    fmt::{Display, Formatter},
};

/// Canonical spelling of a type name. Surrounding whitespace is dropped and
/// a dotted path written with spaces around its segments is collapsed, so
/// `" pkg . Repository "` and `"pkg.Repository"` name the same type.
/// Anything that is not a dotted path (a Rust type name such as
/// `dyn crate::Repository`, or a free-form key) is only trimmed.
pub(crate) fn canonical_name(name: &str) -> String {
    let trimmed = name.trim();
    let segments: Vec<&str> = trimmed.split('.').map(str::trim).collect();
    if segments.len() > 1 && segments.iter().all(|segment| is_identifier(segment))
    {
        segments.join(".")
    } else {
        trimmed.to_owned()
    }
}

pub(crate) fn is_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) if is_identifier_start(first) => {
            chars.all(is_identifier_continue)
        }
        _ => false,
    }
}

pub(crate) fn is_identifier_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

pub(crate) fn is_identifier_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

macro_rules! type_name {
    ($(#[$attr:meta])* $name:ident) => {
        $(#[$attr])*
        #[derive(
            Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize,
        )]
        #[serde(from = "String", into = "String")]
        pub struct $name {
            name: String,
        }

        impl $name {
            #[doc = concat!("Creates a [`", stringify!($name), "`] from a fully-qualified name.")]
            #[must_use]
            pub fn new(name: impl AsRef<str>) -> Self {
                $name {
                    name: canonical_name(name.as_ref()),
                }
            }

            #[doc = concat!("Creates a [`", stringify!($name), "`] naming the Rust type `T`.")]
            #[inline]
            #[must_use]
            pub fn of<T: ?Sized + Any>() -> Self {
                $name::new(std::any::type_name::<T>())
            }

            /// Gets the canonical name.
            #[inline]
            #[must_use]
            pub fn name(&self) -> &str {
                &self.name
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.name)
            }
        }

        impl From<String> for $name {
            fn from(name: String) -> Self {
                $name::new(name)
            }
        }

        impl From<&str> for $name {
            fn from(name: &str) -> Self {
                $name::new(name)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.name
            }
        }
    };
}

type_name!(
    /// An interface that several implementations may satisfy. Identified by
    /// its fully-qualified name.
    Capability
);

type_name!(
    /// A concrete type registered as the implementation of a capability.
    Implementation
);

/// The registered association of a (capability, qualifier) pair to exactly
/// one implementation. Bindings are created once during registration and
/// never change afterwards.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize)]
pub struct Binding {
    capability: Capability,
    qualifier: Option<Qualifier>,
    implementation: Implementation,
}

impl Binding {
    pub(crate) fn new(
        capability: Capability,
        qualifier: Option<Qualifier>,
        implementation: Implementation,
    ) -> Self {
        Binding {
            capability,
            qualifier,
            implementation,
        }
    }

    /// The capability this binding satisfies.
    #[must_use]
    pub fn capability(&self) -> &Capability {
        &self.capability
    }

    /// The qualifier distinguishing this binding, or `None` for the
    /// unqualified binding of the capability.
    #[must_use]
    pub fn qualifier(&self) -> Option<&Qualifier> {
        self.qualifier.as_ref()
    }

    /// The implementation to construct when this binding is requested.
    #[must_use]
    pub fn implementation(&self) -> &Implementation {
        &self.implementation
    }
}

impl Display for Binding {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.capability)?;
        if let Some(qualifier) = &self.qualifier {
            write!(f, " {qualifier}")?;
        }
        write!(f, " -> {}", self.implementation)
    }
}

#[cfg(test)]
mod tests {
    use super::{canonical_name, Capability, Implementation};

    trait Repository {}

    #[test]
    fn dotted_paths_collapse_whitespace() {
        assert_eq!("pkg.Repository", canonical_name(" pkg . Repository "));
        assert_eq!("pkg.Repository", canonical_name("pkg.Repository"));
        assert_eq!(
            Capability::new("pkg .Repository"),
            Capability::new("\tpkg.Repository\n")
        );
    }

    #[test]
    fn other_names_are_only_trimmed() {
        assert_eq!("my key", canonical_name("  my key "));
        assert_eq!("a . b c", canonical_name("a . b c"));
    }

    #[test]
    fn names_rust_types() {
        let capability = Capability::of::<dyn Repository>();
        assert!(capability.name().starts_with("dyn "));
        assert!(capability.name().ends_with("Repository"));

        let implementation = Implementation::of::<String>();
        assert_eq!(std::any::type_name::<String>(), implementation.name());
    }
}
