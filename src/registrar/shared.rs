use crate::{
    BindResult, Capability, Implementation, Module, Provision, Qualifier,
    Registrar, RegistrarConfig, Registry,
};

pub(crate) trait RegistrarContainerEx<T> {
    fn new(value: T) -> Self;
    fn with_inner_mut<R, F: FnOnce(&mut T) -> R>(&self, f: F) -> R;
}

#[cfg(feature = "rc")]
mod types {
    use super::RegistrarContainerEx;
    use std::{cell::RefCell, rc::Rc};

    pub type RegistrarContainer<T> = Rc<RefCell<T>>;

    impl<T> RegistrarContainerEx<T> for RegistrarContainer<T> {
        fn new(value: T) -> Self {
            Rc::new(RefCell::new(value))
        }

        fn with_inner_mut<R, F: FnOnce(&mut T) -> R>(&self, f: F) -> R {
            f(&mut *self.borrow_mut())
        }
    }
}

#[cfg(feature = "arc")]
mod types {
    use super::RegistrarContainerEx;
    use std::sync::{Arc, Mutex, PoisonError};

    pub type RegistrarContainer<T> = Arc<Mutex<T>>;

    impl<T> RegistrarContainerEx<T> for RegistrarContainer<T> {
        fn new(value: T) -> Self {
            Arc::new(Mutex::new(value))
        }

        fn with_inner_mut<R, F: FnOnce(&mut T) -> R>(&self, f: F) -> R {
            // Registration inserts last, so a poisoned registrar is consistent.
            f(&mut *self.lock().unwrap_or_else(PoisonError::into_inner))
        }
    }
}

#[allow(clippy::wildcard_imports)]
pub(crate) use types::*;

/// A cloneable handle to a [`Registrar`] that several producers can
/// register through. Every operation takes the registrar's lock for its
/// whole duration, so concurrent registrations are serialized. Because
/// duplicate detection does not depend on insertion order, the registry
/// built afterwards is the same whichever producer ran first.
///
/// With the "arc" feature the handle is `Send + Sync`; with the "rc"
/// feature it is single-threaded.
///
/// ```
/// use qualified_binds::{Capability, Provision, SharedRegistrar};
///
/// let registrar = SharedRegistrar::default();
/// let first = registrar.clone();
/// let second = registrar.clone();
/// second
///     .provide(Provision::new("pkg.RepositoryImp2", "pkg.Repository").qualified("@Named"))
///     .unwrap();
/// first
///     .provide(Provision::new("pkg.RepositoryImp1", "pkg.Repository").qualified("@Named"))
///     .unwrap();
///
/// let registry = registrar.build().unwrap();
/// assert_eq!(2, registry.qualifiers(&Capability::new("pkg.Repository")).len());
/// ```
#[derive(Clone, Default)]
pub struct SharedRegistrar {
    inner: RegistrarContainer<Registrar>,
}

impl SharedRegistrar {
    /// Wraps a registrar so it can be shared.
    #[must_use]
    pub fn new(registrar: Registrar) -> Self {
        SharedRegistrar {
            inner: RegistrarContainerEx::new(registrar),
        }
    }

    /// Creates an empty shared registrar running the checks enabled in
    /// `config`.
    #[must_use]
    pub fn with_config(config: RegistrarConfig) -> Self {
        SharedRegistrar::new(Registrar::with_config(config))
    }

    /// See [`Registrar::register`].
    pub fn register(
        &self,
        capability: Capability,
        qualifier: Option<Qualifier>,
        implementation: Implementation,
    ) -> BindResult<()> {
        self.inner.with_inner_mut(|registrar| {
            registrar.register(capability, qualifier, implementation)
        })
    }

    /// See [`Registrar::provide`].
    pub fn provide(&self, provision: Provision) -> BindResult<()> {
        self.inner
            .with_inner_mut(|registrar| registrar.provide(provision))
    }

    /// See [`Registrar::declare_qualifier`].
    pub fn declare_qualifier(&self, marker: impl AsRef<str>) {
        self.inner
            .with_inner_mut(|registrar| registrar.declare_qualifier(marker));
    }

    /// See [`Registrar::add_module`]. The whole module is added under one
    /// lock, so no other registration interleaves with it.
    pub fn add_module(&self, module: Module) -> BindResult<()> {
        self.inner
            .with_inner_mut(|registrar| registrar.add_module(module))
    }

    /// Builds the registry from everything registered so far. The shared
    /// registrar is left empty (keeping its configuration), ready for the
    /// next pass.
    pub fn build(&self) -> BindResult<Registry> {
        self.inner.with_inner_mut(|registrar| {
            let config = *registrar.config();
            std::mem::replace(registrar, Registrar::with_config(config)).build()
        })
    }
}
