use crate::{
    binding::canonical_name, error::fmt_qualifier, registry::BindingIndex,
    BindError, BindResult, Binding, Capability, Implementation, Module,
    Provision, Qualifier, RegistrarConfig, Registry,
};
use std::collections::BTreeSet;

mod shared;

pub use shared::*;

/// Collects the bindings of one generation pass and builds the read-only
/// [`Registry`] that resolves them.
///
/// Registration is append-only: every (capability, qualifier) pair can be
/// bound once, and there is no way to remove a binding. A registrar is
/// meant to live for a single pass and be consumed by [`build`].
///
/// ```
/// use qualified_binds::{BindError, Capability, Implementation, Qualifier, Registrar};
///
/// let network = Capability::new("pkg.Network");
/// let mut registrar = Registrar::new();
/// registrar
///     .register(network.clone(), None, Implementation::new("pkg.PublicNetwork"))
///     .unwrap();
/// registrar
///     .register(
///         network.clone(),
///         Some(Qualifier::named("pkg.PrivateNetwork")),
///         Implementation::new("pkg.PrivateNetwork"),
///     )
///     .unwrap();
///
/// let duplicate = registrar.register(
///     network,
///     None,
///     Implementation::new("pkg.OtherNetwork"),
/// );
/// assert!(matches!(duplicate, Err(BindError::DuplicateBinding { .. })));
/// ```
///
/// [`build`]: Registrar::build
#[derive(Debug, Default)]
pub struct Registrar {
    config: RegistrarConfig,
    bindings: BindingIndex,
    qualifiers: BTreeSet<String>,
}

impl Registrar {
    /// Creates an empty registrar with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Registrar::default()
    }

    /// Creates an empty registrar running the checks enabled in `config`.
    #[must_use]
    pub fn with_config(config: RegistrarConfig) -> Self {
        Registrar {
            config,
            ..Registrar::default()
        }
    }

    /// The configuration this registrar builds with.
    #[must_use]
    pub fn config(&self) -> &RegistrarConfig {
        &self.config
    }

    /// Binds `implementation` to `capability` under `qualifier`. Fails with
    /// [`BindError::DuplicateBinding`] if the pair is already bound, in
    /// which case the registrar is left unchanged.
    pub fn register(
        &mut self,
        capability: Capability,
        qualifier: Option<Qualifier>,
        implementation: Implementation,
    ) -> BindResult<()> {
        let slot = self
            .bindings
            .entry(capability.clone())
            .or_default()
            .entry(qualifier.clone())
            .or_default();

        if let Some(existing) = slot.first() {
            let error = BindError::DuplicateBinding {
                capability,
                qualifier,
                existing: existing.implementation().clone(),
                duplicate: implementation,
            };
            tracing::warn!(%error, "rejected binding");
            return Err(error);
        }

        tracing::debug!(
            capability = %capability,
            qualifier = %fmt_qualifier(qualifier.as_ref()),
            implementation = %implementation,
            "registered binding"
        );
        slot.push(Binding::new(capability, qualifier, implementation));
        Ok(())
    }

    /// Validates a declaration, normalizes its qualifier expression and
    /// registers it.
    pub fn provide(&mut self, provision: Provision) -> BindResult<()> {
        let qualifier = provision.validate().map_err(|error| {
            tracing::warn!(%error, "rejected provision");
            error
        })?;
        self.register(
            provision.capability().clone(),
            qualifier,
            provision.implementation().clone(),
        )
    }

    /// Declares a marker type as a qualifier.
    pub fn declare_qualifier(&mut self, marker: impl AsRef<str>) {
        self.qualifiers.insert(canonical_name(marker.as_ref()));
    }

    /// Adds every qualifier and provision declared in a module. Stops at the
    /// first provision that fails, keeping the ones registered before it.
    pub fn add_module(&mut self, module: Module) -> BindResult<()> {
        for marker in &module.qualifiers {
            self.declare_qualifier(marker);
        }
        for provision in module.provisions {
            self.provide(provision)?;
        }

        Ok(())
    }

    /// Runs the checks that need every declaration of the pass, then
    /// freezes the bindings into a [`Registry`].
    ///
    /// The checks run over the sorted bindings, so the error reported never
    /// depends on the order in which bindings were registered.
    pub fn build(self) -> BindResult<Registry> {
        if let Err(error) = self.check() {
            tracing::warn!(%error, "registry rejected");
            return Err(error);
        }

        let registry = Registry::new(self.bindings);
        tracing::debug!(
            capabilities = registry.capabilities().count(),
            bindings = registry.len(),
            "built registry"
        );
        Ok(registry)
    }

    fn check(&self) -> BindResult<()> {
        for (capability, slots) in &self.bindings {
            if self.qualifiers.contains(capability.name()) {
                if let Some(binding) = slots.values().flatten().next() {
                    return Err(BindError::CapabilityIsQualifier {
                        implementation: binding.implementation().clone(),
                        capability: capability.clone(),
                    });
                }
            }

            if self.config.check_qualifier_markers {
                for binding in slots.values().flatten() {
                    if let Some(Qualifier::Annotated { marker, .. }) =
                        binding.qualifier()
                    {
                        if !self.qualifiers.contains(marker) {
                            return Err(BindError::UnknownQualifierMarker {
                                implementation: binding
                                    .implementation()
                                    .clone(),
                                marker: marker.clone(),
                            });
                        }
                    }
                }
            }

            if self.config.require_qualifiers {
                let implementations: usize = slots.values().map(Vec::len).sum();
                let unqualified = slots.get(&None).and_then(|slot| slot.first());
                match unqualified {
                    Some(binding) if implementations > 1 => {
                        return Err(BindError::MissingQualifier {
                            capability: capability.clone(),
                            implementation: binding.implementation().clone(),
                        });
                    }
                    _ => {}
                }
            }
        }

        Ok(())
    }
}
