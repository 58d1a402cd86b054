use crate::{
    error::fmt_qualifier, BindError, Binding, Capability, Qualifier, Registry,
};
use derive_more::{Display, Error};
use std::fmt::{Formatter, Write};

/// One accessor of a component: a request for the implementation bound to a
/// capability under a qualifier.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Accessor {
    name: String,
    capability: Capability,
    qualifier: Option<Qualifier>,
}

impl Accessor {
    /// Creates an accessor.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        capability: impl Into<Capability>,
        qualifier: Option<Qualifier>,
    ) -> Self {
        Accessor {
            name: name.into(),
            capability: capability.into(),
            qualifier,
        }
    }

    /// The accessor's method name on the component.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The capability the accessor returns.
    #[must_use]
    pub fn capability(&self) -> &Capability {
        &self.capability
    }

    /// The requested qualifier, or `None` for an unqualified request.
    #[must_use]
    pub fn qualifier(&self) -> Option<&Qualifier> {
        self.qualifier.as_ref()
    }
}

/// The accessor surface of a generated component.
///
/// ```
/// use qualified_binds::{Component, Provision, Qualifier, Registrar};
///
/// let mut registrar = Registrar::new();
/// registrar
///     .provide(Provision::new("pkg.PrivateNetwork", "pkg.Network").qualified("@Named"))
///     .unwrap();
/// let registry = registrar.build().unwrap();
///
/// let component = Component::new("pkg.NetworkComponent").with_accessor(
///     "network",
///     "pkg.Network",
///     Some(Qualifier::named("pkg.PrivateNetwork")),
/// );
/// let plan = registry.plan(&component).unwrap();
/// assert_eq!(
///     "pkg.PrivateNetwork",
///     plan.accessors()[0].binding().implementation().name(),
/// );
/// ```
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Component {
    name: String,
    accessors: Vec<Accessor>,
}

impl Component {
    /// Creates a component without accessors.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Component {
            name: name.into(),
            accessors: Vec::new(),
        }
    }

    /// Adds an accessor, returning the component.
    #[must_use]
    pub fn with_accessor(
        mut self,
        name: impl Into<String>,
        capability: impl Into<Capability>,
        qualifier: Option<Qualifier>,
    ) -> Self {
        self.add_accessor(Accessor::new(name, capability, qualifier));
        self
    }

    /// Adds an accessor.
    pub fn add_accessor(&mut self, accessor: Accessor) {
        self.accessors.push(accessor);
    }

    /// The component's type name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The accessors in declaration order.
    #[must_use]
    pub fn accessors(&self) -> &[Accessor] {
        &self.accessors
    }
}

/// An accessor together with the binding chosen for it.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct AccessorPlan {
    accessor: Accessor,
    binding: Binding,
}

impl AccessorPlan {
    /// The accessor that was resolved.
    #[must_use]
    pub fn accessor(&self) -> &Accessor {
        &self.accessor
    }

    /// The binding whose implementation the accessor constructs.
    #[must_use]
    pub fn binding(&self) -> &Binding {
        &self.binding
    }
}

/// The resolved accessor surface of a component, in declaration order.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ComponentPlan {
    component: String,
    accessors: Vec<AccessorPlan>,
}

impl ComponentPlan {
    /// The name of the planned component.
    #[must_use]
    pub fn component(&self) -> &str {
        &self.component
    }

    /// One plan per accessor, in declaration order.
    #[must_use]
    pub fn accessors(&self) -> &[AccessorPlan] {
        &self.accessors
    }
}

impl std::fmt::Display for ComponentPlan {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "component {} {{", self.component)?;
        for plan in &self.accessors {
            let accessor = plan.accessor();
            write!(f, "    {}(): {}", accessor.name(), accessor.capability())?;
            if let Some(qualifier) = accessor.qualifier() {
                write!(f, " {qualifier}")?;
            }
            writeln!(f, " = new {}", plan.binding().implementation())?;
        }
        f.write_char('}')
    }
}

/// Every accessor of a component that failed to resolve. The generation
/// pass fails as a whole if any accessor fails.
#[derive(Clone, PartialEq, Eq, Debug, Display, Error)]
#[display(
    fmt = "component {} has {} unresolvable accessor(s): {}",
    component,
    "errors.len()",
    "fmt_errors(errors)"
)]
pub struct PlanError {
    component: String,
    #[error(ignore)]
    errors: Vec<(String, BindError)>,
}

impl PlanError {
    /// The name of the component that failed to plan.
    #[must_use]
    pub fn component(&self) -> &str {
        &self.component
    }

    /// Each failing accessor's name with the reason it failed.
    #[must_use]
    pub fn errors(&self) -> &[(String, BindError)] {
        &self.errors
    }
}

fn fmt_errors(errors: &[(String, BindError)]) -> String {
    let mut joined = String::new();
    for (accessor, error) in errors {
        if !joined.is_empty() {
            joined.push_str("; ");
        }
        joined.push_str(accessor);
        joined.push_str("(): ");
        joined.push_str(&error.to_string());
    }
    joined
}

impl Registry {
    /// Resolves every accessor of `component`. Resolution failures are
    /// collected rather than stopping at the first one, so a single pass
    /// reports every broken accessor.
    pub fn plan(&self, component: &Component) -> Result<ComponentPlan, PlanError> {
        let mut accessors = Vec::with_capacity(component.accessors().len());
        let mut errors = Vec::new();
        for accessor in component.accessors() {
            match self.resolve(accessor.capability(), accessor.qualifier()) {
                Ok(binding) => accessors.push(AccessorPlan {
                    accessor: accessor.clone(),
                    binding: binding.clone(),
                }),
                Err(error) => {
                    tracing::warn!(
                        component = component.name(),
                        accessor = accessor.name(),
                        qualifier = %fmt_qualifier(accessor.qualifier()),
                        %error,
                        "accessor cannot be resolved"
                    );
                    errors.push((accessor.name().to_owned(), error));
                }
            }
        }

        if errors.is_empty() {
            Ok(ComponentPlan {
                component: component.name().to_owned(),
                accessors,
            })
        } else {
            Err(PlanError {
                component: component.name().to_owned(),
                errors,
            })
        }
    }
}
