use crate::{
    binding::canonical_name, normalize, qualifier::is_named_marker, BindError,
    BindResult, Capability, Implementation, Qualifier,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A declaration binding an implementation to a capability, optionally
/// under a qualifier.
///
/// The qualifier is kept as the raw expression it was declared with and is
/// normalized when the provision is registered. A built-in name marker
/// without a key (`@Named`) is keyed by the implementation's own name.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Provision {
    implementation: Implementation,
    capability: Capability,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    qualifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    supertypes: Option<Vec<Capability>>,
}

impl Provision {
    /// Declares `implementation` as an unqualified provider of
    /// `capability`.
    #[must_use]
    pub fn new(
        implementation: impl Into<Implementation>,
        capability: impl Into<Capability>,
    ) -> Self {
        Provision {
            implementation: implementation.into(),
            capability: capability.into(),
            qualifier: None,
            supertypes: None,
        }
    }

    /// Qualifies the provision with a qualifier expression.
    #[must_use]
    pub fn qualified(mut self, expression: impl Into<String>) -> Self {
        self.qualifier = Some(expression.into());
        self
    }

    /// Declares which capabilities the implementation implements. When
    /// declared, the bound capability must be one of them.
    #[must_use]
    pub fn implementing<I>(mut self, supertypes: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Capability>,
    {
        self.supertypes = Some(supertypes.into_iter().map(Into::into).collect());
        self
    }

    /// The implementation being provided.
    #[must_use]
    pub fn implementation(&self) -> &Implementation {
        &self.implementation
    }

    /// The capability the implementation is bound to.
    #[must_use]
    pub fn capability(&self) -> &Capability {
        &self.capability
    }

    /// The qualifier expression, exactly as it was declared.
    #[must_use]
    pub fn qualifier_expression(&self) -> Option<&str> {
        self.qualifier.as_deref()
    }

    /// Checks the declaration and normalizes its qualifier.
    pub(crate) fn validate(&self) -> BindResult<Option<Qualifier>> {
        if let Some(supertypes) = &self.supertypes {
            if !supertypes.contains(&self.capability) {
                return Err(BindError::NotAnImplementer {
                    implementation: self.implementation.clone(),
                    capability: self.capability.clone(),
                });
            }
        }

        let qualifier = match self.qualifier.as_deref() {
            Some(expression) => Some(normalize(expression)?),
            None => None,
        };
        Ok(qualifier.map(|qualifier| match qualifier {
            Qualifier::Annotated {
                ref marker,
                value: None,
            } if is_named_marker(marker) => {
                Qualifier::named(self.implementation.name())
            }
            qualifier => qualifier,
        }))
    }
}

/// A collection of provisions and qualifier declarations that can be added
/// all at once to a [`Registrar`](crate::Registrar). Modules group related
/// declarations so a generation pass can be assembled in pieces.
///
/// Modules do not check for duplicates themselves. Conflicts are reported
/// when the module is added to a registrar.
///
/// For creating a module easily via a domain specific language, see
/// [`define_module!`].
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Module {
    pub(crate) qualifiers: BTreeSet<String>,
    pub(crate) provisions: Vec<Provision>,
}

impl Module {
    /// Adds a provision to this module.
    pub fn provide(&mut self, provision: Provision) {
        self.provisions.push(provision);
    }

    /// Declares a marker type as a qualifier.
    pub fn declare_qualifier(&mut self, marker: impl AsRef<str>) {
        self.qualifiers.insert(canonical_name(marker.as_ref()));
    }

    /// The provisions in declaration order.
    #[must_use]
    pub fn provisions(&self) -> &[Provision] {
        &self.provisions
    }

    /// The declared qualifier markers.
    pub fn qualifiers(&self) -> impl Iterator<Item = &str> {
        self.qualifiers.iter().map(String::as_str)
    }
}

/// Defines a new module using a domain specific language.
///
/// # Example
///
/// ```
/// use qualified_binds::{define_module, Capability, Qualifier, Registrar};
///
/// let module = define_module! {
///     qualifiers = ["pkg.ServiceImpQ1", "pkg.ServiceImpQ2"],
///     capabilities = {
///         "pkg.Repository" = [
///             "pkg.RepositoryImp1" => "@Named",
///             "pkg.RepositoryImp2" => "@Named",
///         ],
///         "pkg.Service" = [
///             "pkg.ServiceImp1" => "@pkg.ServiceImpQ1",
///             "pkg.ServiceImp2" => "@pkg.ServiceImpQ2",
///         ],
///         "pkg.Connection" = ["pkg.ConnectionImp"],
///     },
/// };
///
/// let mut registrar = Registrar::new();
/// registrar.add_module(module).unwrap();
///
/// let registry = registrar.build().unwrap();
/// let binding = registry
///     .resolve(
///         &Capability::new("pkg.Repository"),
///         Some(&Qualifier::named("pkg.RepositoryImp2")),
///     )
///     .unwrap();
/// assert_eq!("pkg.RepositoryImp2", binding.implementation().name());
/// ```
#[macro_export]
macro_rules! define_module {
    {
        $(
            $(#[$($attr:meta),*])*
            $key:ident = $value:tt
        ),*
        $(,)?
    } => {
        {
            #[allow(unused_mut)]
            let mut module = <$crate::Module as ::std::default::Default>::default();
            $(
                $(#[$($attr),*])*
                $crate::define_module!(@provide &mut module, $key = $value);
            )*
            module
        }
    };
    (
        @provide $module:expr,
        qualifiers = [
            $($marker:expr),*
            $(,)?
        ]
    ) => {
        $($module.declare_qualifier($marker);)*
    };
    (
        @provide $module:expr,
        capabilities = {
            $($capability:tt = [
                $($implementation:expr $(=> $qualifier:expr)?),*
                $(,)?
            ]),*
            $(,)?
        }
    ) => {
        $(
            $(
                $module.provide(
                    $crate::Provision::new($implementation, $capability)
                        $(.qualified($qualifier))?
                );
            )*
        )*
    };
}
