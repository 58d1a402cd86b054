use crate::{BindError, BindResult, Binding, Implementation, Registry};
use std::{
    collections::BTreeMap,
    fmt::{Formatter, Write},
};

/// Name of the generated module holding every binds method.
pub const BINDS_MODULE_NAME: &str = "Generated_BindsModule";

/// Replaces every character that cannot appear in an identifier with `_`,
/// so `pkg.RepositoryImp1` becomes `pkg_RepositoryImp1`.
fn mangle(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

fn decapitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// A method of the binds module: takes the implementation and returns it as
/// the capability, under the binding's qualifier.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct BindsMethod {
    name: String,
    parameter: String,
    binding: Binding,
}

impl BindsMethod {
    fn new(binding: Binding) -> Self {
        let mangled = mangle(binding.implementation().name());
        BindsMethod {
            name: format!("binds_{mangled}"),
            parameter: decapitalize(&mangled),
            binding,
        }
    }

    /// The method name, `binds_` followed by the mangled implementation.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The name of the method's only parameter.
    #[must_use]
    pub fn parameter(&self) -> &str {
        &self.parameter
    }

    /// The type of the method's only parameter.
    #[must_use]
    pub fn implementation(&self) -> &Implementation {
        self.binding.implementation()
    }

    /// The binding this method declares.
    #[must_use]
    pub fn binding(&self) -> &Binding {
        &self.binding
    }
}

impl std::fmt::Display for BindsMethod {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}({}: {}) -> {}",
            self.name,
            self.parameter,
            self.binding.implementation(),
            self.binding.capability()
        )?;
        if let Some(qualifier) = self.binding.qualifier() {
            write!(f, " {qualifier}")?;
        }
        Ok(())
    }
}

/// The module of binds methods for every binding in a registry, sorted the
/// same way as [`Registry::bindings`].
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct BindsModule {
    methods: Vec<BindsMethod>,
}

impl BindsModule {
    /// The module name, always [`BINDS_MODULE_NAME`].
    #[must_use]
    pub fn name(&self) -> &str {
        BINDS_MODULE_NAME
    }

    /// The methods, one per binding.
    #[must_use]
    pub fn methods(&self) -> &[BindsMethod] {
        &self.methods
    }
}

impl std::fmt::Display for BindsModule {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "module {} {{", self.name())?;
        for method in &self.methods {
            writeln!(f, "    {method}")?;
        }
        f.write_char('}')
    }
}

impl Registry {
    /// Lists one binds method per binding.
    ///
    /// Method names come from the implementation alone, so an
    /// implementation bound more than once, or two implementations that
    /// mangle to the same identifier, fail with
    /// [`BindError::ConflictingBindsMethod`].
    ///
    /// ```
    /// use qualified_binds::{Provision, Registrar};
    ///
    /// let mut registrar = Registrar::new();
    /// registrar
    ///     .provide(Provision::new("pkg.PrivateNetwork", "pkg.Network").qualified("@Named"))
    ///     .unwrap();
    /// let module = registrar.build().unwrap().binds_module().unwrap();
    ///
    /// assert_eq!(
    ///     "module Generated_BindsModule {\n    \
    ///      binds_pkg_PrivateNetwork(pkg_PrivateNetwork: pkg.PrivateNetwork) -> pkg.Network \
    ///      @Named(\"pkg.PrivateNetwork\")\n}",
    ///     module.to_string(),
    /// );
    /// ```
    pub fn binds_module(&self) -> BindResult<BindsModule> {
        let mut methods = Vec::with_capacity(self.len());
        let mut names: BTreeMap<String, usize> = BTreeMap::new();
        for binding in self.bindings() {
            let method = BindsMethod::new(binding.clone());
            if let Some(&index) = names.get(method.name()) {
                let existing: &BindsMethod = &methods[index];
                let error = BindError::ConflictingBindsMethod {
                    method: method.name().to_owned(),
                    existing: existing.binding().clone(),
                    duplicate: method.binding,
                };
                tracing::warn!(%error, "binds module rejected");
                return Err(error);
            }

            tracing::debug!(
                implementation = %method.implementation(),
                method = method.name(),
                "added to the binds module"
            );
            names.insert(method.name().to_owned(), methods.len());
            methods.push(method);
        }

        Ok(BindsModule { methods })
    }
}
