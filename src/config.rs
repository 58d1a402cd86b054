use serde::{Deserialize, Serialize};

/// Checks a [`Registrar`](crate::Registrar) runs when it builds its
/// registry, on top of the duplicate check every registration goes
/// through.
///
/// ```
/// use qualified_binds::RegistrarConfig;
///
/// let config: RegistrarConfig =
///     serde_json::from_str(r#"{ "require_qualifiers": true }"#).unwrap();
/// assert!(config.require_qualifiers);
/// assert!(!config.check_qualifier_markers);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistrarConfig {
    /// Reject any capability that has several implementations when one of
    /// its bindings is unqualified.
    pub require_qualifiers: bool,

    /// Reject annotated qualifiers whose marker was never declared with
    /// [`Registrar::declare_qualifier`](crate::Registrar::declare_qualifier).
    pub check_qualifier_markers: bool,
}

impl RegistrarConfig {
    /// The configuration with every optional check turned on.
    #[must_use]
    pub fn strict() -> Self {
        RegistrarConfig {
            require_qualifiers: true,
            check_qualifier_markers: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::RegistrarConfig;

    #[test]
    fn missing_fields_use_defaults() {
        let config: RegistrarConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(RegistrarConfig::default(), config);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let config =
            serde_json::from_str::<RegistrarConfig>(r#"{ "strict": true }"#);
        assert!(config.is_err());
    }
}
