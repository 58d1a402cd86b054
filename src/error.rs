#![allow(clippy::used_underscore_binding)]

use crate::{Binding, Capability, Implementation, Qualifier, QualifierError};
use derive_more::{Display, Error, From};

/// A result from registering, validating or resolving bindings.
pub type BindResult<T> = Result<T, BindError>;

/// An error that aborts a generation pass. Every variant describes a static
/// declaration mistake, so none of them is worth retrying.
#[derive(Clone, PartialEq, Eq, Debug, Display, Error, From)]
#[display(fmt = "binding generation failed: {}")]
pub enum BindError {
    /// Two providers were registered for the same capability and qualifier.
    #[from(ignore)]
    #[display(
        fmt = "{} {} is bound more than once (to {} and to {})",
        capability,
        "fmt_qualifier(qualifier.as_ref())",
        existing,
        duplicate
    )]
    DuplicateBinding {
        /// The capability that was bound twice.
        capability: Capability,
        /// The qualifier both providers were registered with.
        qualifier: Option<Qualifier>,
        /// The implementation that was registered first.
        existing: Implementation,
        /// The implementation that was rejected.
        duplicate: Implementation,
    },

    /// No provider is registered for the requested capability and
    /// qualifier.
    #[from(ignore)]
    #[display(
        fmt = "{} {} has no binding (known qualifiers: [{}])",
        capability,
        "fmt_qualifier(qualifier.as_ref())",
        "fmt_qualifiers(known)"
    )]
    UnresolvedBinding {
        /// The capability that was requested.
        capability: Capability,
        /// The qualifier that was requested.
        qualifier: Option<Qualifier>,
        /// Every qualifier registered for the capability.
        known: Vec<Option<Qualifier>>,
    },

    /// More than one binding matched a request. Registration never lets
    /// this happen, so seeing it means the registry was built wrongly.
    #[from(ignore)]
    #[display(
        fmt = "{} {} matches several bindings [{}] (the registry is inconsistent)",
        capability,
        "fmt_qualifier(qualifier.as_ref())",
        "fmt_implementations(candidates)"
    )]
    AmbiguousBinding {
        /// The capability that was requested.
        capability: Capability,
        /// The qualifier that was requested.
        qualifier: Option<Qualifier>,
        /// Every implementation that matched.
        candidates: Vec<Implementation>,
    },

    /// An implementation was bound to a capability it does not declare.
    #[from(ignore)]
    #[display(
        fmt = "{} doesn't implement the {} capability it is bound to",
        implementation,
        capability
    )]
    NotAnImplementer {
        /// The implementation that was bound.
        implementation: Implementation,
        /// The capability it was bound to.
        capability: Capability,
    },

    /// A declared qualifier marker was used as a capability.
    #[from(ignore)]
    #[display(
        fmt = "{} binds to {}, which is a qualifier and cannot be a capability",
        implementation,
        capability
    )]
    CapabilityIsQualifier {
        /// The implementation that was bound.
        implementation: Implementation,
        /// The capability that is also a qualifier marker.
        capability: Capability,
    },

    /// An annotated qualifier uses a marker that was never declared as a
    /// qualifier.
    #[from(ignore)]
    #[display(
        fmt = "{} is qualified by {}, which is not a declared qualifier",
        implementation,
        marker
    )]
    UnknownQualifierMarker {
        /// The implementation whose binding carries the marker.
        implementation: Implementation,
        /// The undeclared marker.
        marker: String,
    },

    /// A capability with several implementations has an unqualified
    /// binding.
    #[from(ignore)]
    #[display(
        fmt = "{} implemented by {} has several implementations, but its binding has no qualifier",
        capability,
        implementation
    )]
    MissingQualifier {
        /// The capability with several implementations.
        capability: Capability,
        /// The implementation bound without a qualifier.
        implementation: Implementation,
    },

    /// Two bindings map to the same method name in the binds module.
    #[from(ignore)]
    #[display(
        fmt = "binds method {} is generated for both {} and {}",
        method,
        existing,
        duplicate
    )]
    ConflictingBindsMethod {
        /// The method name both bindings produce.
        method: String,
        /// The binding that claimed the name first.
        existing: Binding,
        /// The binding whose method would redeclare it.
        duplicate: Binding,
    },

    /// A qualifier expression could not be normalized.
    #[display(fmt = "{}", _0)]
    InvalidQualifier(QualifierError),
}

pub(crate) fn fmt_qualifier(qualifier: Option<&Qualifier>) -> String {
    match qualifier {
        Some(qualifier) => qualifier.to_string(),
        None => "<unqualified>".to_owned(),
    }
}

fn fmt_qualifiers(qualifiers: &[Option<Qualifier>]) -> String {
    let mut joined = String::new();
    for qualifier in qualifiers {
        if !joined.is_empty() {
            joined.push_str(", ");
        }
        joined.push_str(&fmt_qualifier(qualifier.as_ref()));
    }
    joined
}

fn fmt_implementations(implementations: &[Implementation]) -> String {
    let mut joined = String::new();
    for implementation in implementations {
        if !joined.is_empty() {
            joined.push_str(", ");
        }
        joined.push_str(implementation.name());
    }
    joined
}
