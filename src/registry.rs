use crate::{
    error::fmt_qualifier, BindError, BindResult, Binding, Capability,
    IntoQualifier, Qualifier,
};
use std::{
    collections::BTreeMap,
    fmt::{Debug, Formatter},
};

/// Bindings grouped by capability, then by qualifier. Unqualified bindings
/// live under the `None` slot, which sorts before every qualifier.
pub(crate) type BindingIndex =
    BTreeMap<Capability, BTreeMap<Option<Qualifier>, Vec<Binding>>>;

/// The read-only result of a [`Registrar`](crate::Registrar). Resolves
/// (capability, qualifier) requests to the single binding registered for
/// them.
///
/// A registry is never mutated once built. Generation logic receives it by
/// reference, and every listing it produces is sorted, so a generation
/// pass over the same declarations always emits the same output.
#[derive(Clone, Default)]
pub struct Registry {
    bindings: BindingIndex,
}

impl Registry {
    pub(crate) fn new(bindings: BindingIndex) -> Self {
        Registry { bindings }
    }

    /// Resolves the binding for `capability` under `qualifier`.
    ///
    /// An unqualified request (`None`) only matches the unqualified binding
    /// of the capability. It is not a wildcard, so a capability with only
    /// qualified bindings fails to resolve without a qualifier.
    ///
    /// ```
    /// use qualified_binds::{BindError, Capability, Provision, Qualifier, Registrar};
    ///
    /// let mut registrar = Registrar::new();
    /// registrar
    ///     .provide(Provision::new("pkg.PrivateNetwork", "pkg.Network").qualified("@Named"))
    ///     .unwrap();
    /// registrar.provide(Provision::new("pkg.PublicNetwork", "pkg.Network")).unwrap();
    /// let registry = registrar.build().unwrap();
    ///
    /// let network = Capability::new("pkg.Network");
    /// let public = registry.resolve(&network, None).unwrap();
    /// assert_eq!("pkg.PublicNetwork", public.implementation().name());
    ///
    /// let private = Qualifier::named("pkg.PrivateNetwork");
    /// let private = registry.resolve(&network, Some(&private)).unwrap();
    /// assert_eq!("pkg.PrivateNetwork", private.implementation().name());
    /// ```
    pub fn resolve(
        &self,
        capability: &Capability,
        qualifier: Option<&Qualifier>,
    ) -> BindResult<&Binding> {
        tracing::trace!(
            capability = %capability,
            qualifier = %fmt_qualifier(qualifier),
            "resolving binding"
        );

        let candidates = self
            .bindings
            .get(capability)
            .and_then(|slots| slots.get(&qualifier.cloned()))
            .map_or(&[][..], Vec::as_slice);

        match candidates {
            [binding] => Ok(binding),
            [] => Err(BindError::UnresolvedBinding {
                capability: capability.clone(),
                qualifier: qualifier.cloned(),
                known: self.qualifiers(capability),
            }),
            candidates => {
                tracing::error!(
                    capability = %capability,
                    qualifier = %fmt_qualifier(qualifier),
                    candidates = candidates.len(),
                    "registry holds several bindings for one key"
                );
                Err(BindError::AmbiguousBinding {
                    capability: capability.clone(),
                    qualifier: qualifier.cloned(),
                    candidates: candidates
                        .iter()
                        .map(|binding| binding.implementation().clone())
                        .collect(),
                })
            }
        }
    }

    /// Resolves a qualified request given as a raw qualifier expression.
    pub fn resolve_with(
        &self,
        capability: &Capability,
        qualifier: impl IntoQualifier,
    ) -> BindResult<&Binding> {
        let qualifier = qualifier.into_qualifier()?;
        self.resolve(capability, Some(&qualifier))
    }

    /// Every qualifier registered for `capability`, sorted, with the
    /// unqualified slot (if bound) first.
    #[must_use]
    pub fn qualifiers(&self, capability: &Capability) -> Vec<Option<Qualifier>> {
        self.bindings
            .get(capability)
            .map(|slots| {
                slots
                    .iter()
                    .filter(|(_, bindings)| !bindings.is_empty())
                    .map(|(qualifier, _)| qualifier.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Every capability with at least one binding, sorted by name.
    pub fn capabilities(&self) -> impl Iterator<Item = &Capability> {
        self.bindings
            .iter()
            .filter(|(_, slots)| slots.values().any(|slot| !slot.is_empty()))
            .map(|(capability, _)| capability)
    }

    /// Every binding, sorted by capability and then by qualifier.
    pub fn bindings(&self) -> impl Iterator<Item = &Binding> {
        self.bindings.values().flat_map(BTreeMap::values).flatten()
    }

    /// The number of bindings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings().count()
    }

    /// Whether no binding has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings().next().is_none()
    }
}

impl Debug for Registry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.bindings().map(|binding| {
                (
                    format!(
                        "{} {}",
                        binding.capability(),
                        fmt_qualifier(binding.qualifier())
                    ),
                    binding.implementation().name(),
                )
            }))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::{BindingIndex, Registry};
    use crate::{BindError, Binding, Capability, Implementation, Qualifier};

    #[test]
    fn resolve_rejects_inconsistent_registry() {
        let capability = Capability::new("pkg.Connection");
        let mut index = BindingIndex::new();
        index.entry(capability.clone()).or_default().insert(
            None,
            vec![
                Binding::new(
                    capability.clone(),
                    None,
                    Implementation::new("pkg.ConnectionImp"),
                ),
                Binding::new(
                    capability.clone(),
                    None,
                    Implementation::new("pkg.OtherConnectionImp"),
                ),
            ],
        );

        let registry = Registry::new(index);
        match registry.resolve(&capability, None) {
            Err(BindError::AmbiguousBinding { candidates, .. }) => {
                assert_eq!(
                    vec![
                        Implementation::new("pkg.ConnectionImp"),
                        Implementation::new("pkg.OtherConnectionImp"),
                    ],
                    candidates
                );
            }
            Err(error) => Err(error).unwrap(),
            Ok(binding) => panic!("resolved ambiguous request to {binding}"),
        }
    }

    #[test]
    fn empty_slots_are_not_listed() {
        let capability = Capability::new("pkg.Service");
        let mut index = BindingIndex::new();
        index
            .entry(capability.clone())
            .or_default()
            .insert(Some(Qualifier::named("pkg.ServiceImp1")), Vec::new());

        let registry = Registry::new(index);
        assert!(registry.qualifiers(&capability).is_empty());
        assert_eq!(0, registry.capabilities().count());
        assert!(registry.is_empty());
    }

    #[test]
    fn debug_lists_bindings() {
        let capability = Capability::new("pkg.Connection");
        let mut index = BindingIndex::new();
        index.entry(capability.clone()).or_default().insert(
            None,
            vec![Binding::new(
                capability,
                None,
                Implementation::new("pkg.ConnectionImp"),
            )],
        );

        let registry = Registry::new(index);
        assert_eq!(
            r#"{"pkg.Connection <unqualified>": "pkg.ConnectionImp"}"#,
            format!("{registry:?}")
        );
    }
}
