//! Qualifier-keyed binding resolution for generated dependency injection.
//!
//! A code generator that emits binding modules has to decide, for every
//! accessor a component exposes, which concrete implementation to construct.
//! When one interface has several implementations, the choice is made by a
//! qualifier. This crate makes that choice at generation time, and turns
//! every ambiguity or gap in the declarations into an error before any code
//! is emitted.
//!
//! # Capabilities, qualifiers and bindings
//!
//! - A [`Capability`] is an interface that several implementations may
//!   satisfy.
//! - A [`Qualifier`] discriminates between those implementations. It is
//!   either *named* (a string key) or *annotated* (a marker type with an
//!   optional value). Qualifiers are written as expressions such as
//!   `@Named("pkg.RepositoryImp1")` or `@pkg.RoomQualifier(pkg.Kitchen.class)`
//!   and are brought to a canonical form by [`normalize`].
//! - A [`Binding`] ties a capability and an optional qualifier to exactly
//!   one [`Implementation`].
//!
//! For a given capability, every qualifier (including "no qualifier") can be
//! bound at most once. A second binding for the same pair is rejected when
//! it is registered, so a built [`Registry`] can never resolve a request to
//! more than one implementation.
//!
//! # Generation pass
//!
//! A pass creates a [`Registrar`], registers every declaration (directly,
//! through [`Provision`]s, or a whole [`Module`] at a time), and builds a
//! read-only [`Registry`]. The generator then asks the registry to
//! [`resolve`](Registry::resolve) each request, to
//! [`plan`](Registry::plan) a whole component, or to list the
//! [`binds_module`](Registry::binds_module). The registry is passed around
//! by reference; there is no global container.
//!
//! Registration can be spread across threads with a [`SharedRegistrar`].
//! Its pointer type is chosen by feature flags: "arc" (the default) makes it
//! thread-safe, "rc" makes it single-threaded:
//!
//! ```text
//! qualified_binds = {
//!     version = "*",
//!     default_features = false,
//!     features = ["rc"]
//! }
//! ```
//!
//! # Example
//!
//! ```
//! use qualified_binds::{
//!     define_module, BindError, Capability, Component, Qualifier, Registrar,
//! };
//!
//! // Two repositories told apart by name, a network with one named and one
//! // unqualified implementation.
//! let module = define_module! {
//!     capabilities = {
//!         "pkg.Repository" = [
//!             "pkg.RepositoryImp1" => r#"@Named("pkg.RepositoryImp1")"#,
//!             "pkg.RepositoryImp2" => r#"@Named("pkg.RepositoryImp2")"#,
//!         ],
//!         "pkg.Network" = [
//!             "pkg.PrivateNetwork" => "@Named",
//!             "pkg.PublicNetwork",
//!         ],
//!     },
//! };
//!
//! let mut registrar = Registrar::new();
//! registrar.add_module(module)?;
//! let registry = registrar.build()?;
//!
//! let repository = Capability::new("pkg.Repository");
//! let binding = registry.resolve_with(&repository, "pkg.RepositoryImp2")?;
//! assert_eq!("pkg.RepositoryImp2", binding.implementation().name());
//!
//! match registry.resolve_with(&repository, "pkg.RepositoryImp3") {
//!     Err(BindError::UnresolvedBinding { known, .. }) => assert_eq!(2, known.len()),
//!     other => panic!("unexpected result {:?}", other),
//! }
//!
//! let component = Component::new("pkg.RootComponent")
//!     .with_accessor("repo", "pkg.Repository", Some(Qualifier::named("pkg.RepositoryImp1")))
//!     .with_accessor("network", "pkg.Network", None);
//! let plan = registry.plan(&component).unwrap();
//! assert_eq!("pkg.PublicNetwork", plan.accessors()[1].binding().implementation().name());
//! # Ok::<(), BindError>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::needless_pass_by_value
)]

#[cfg(not(any(feature = "arc", feature = "rc")))]
compile_error!(
    "Either the 'arc' or 'rc' feature must be enabled (but not both)."
);

#[cfg(all(feature = "arc", feature = "rc"))]
compile_error!(
    "The 'arc' and 'rc' features are mutually exclusive and cannot be enabled together."
);

mod binding;
mod config;
mod error;
mod generate;
mod module;
mod qualifier;
mod registrar;
mod registry;

pub use binding::*;
pub use config::*;
pub use error::*;
pub use generate::*;
pub use module::*;
pub use qualifier::*;
pub use registrar::*;
pub use registry::*;
