use crate::binding::canonical_name;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::{
    fmt::{Formatter, Write},
    str::FromStr,
};

mod parse;

/// Markers that stand for the framework's built-in name qualifier. An
/// annotation with one of these markers and a string argument is a
/// [`Qualifier::Named`], never an [`Qualifier::Annotated`].
pub const NAMED_MARKERS: &[&str] =
    &["Named", "javax.inject.Named", "jakarta.inject.Named"];

pub(crate) fn is_named_marker(marker: &str) -> bool {
    NAMED_MARKERS.contains(&marker)
}

/// A discriminator selecting among several implementations of one
/// capability.
///
/// Qualifiers compare structurally: by kind first, then by key. A named
/// qualifier and an annotated qualifier are never equal, even when the
/// name key and the marker are spelled the same way.
///
/// ```
/// use qualified_binds::{normalize, AnnotationValue, Qualifier};
///
/// let named = normalize(r#"@Named( " pkg.RepositoryImp1 " )"#).unwrap();
/// assert_eq!(Qualifier::named("pkg.RepositoryImp1"), named);
///
/// let room = normalize("@pkg.RoomQualifier(value = pkg.Kitchen.class)").unwrap();
/// assert_eq!(
///     Qualifier::annotated(
///         "pkg.RoomQualifier",
///         Some(AnnotationValue::Class("pkg.Kitchen".to_owned())),
///     ),
///     room,
/// );
///
/// assert_ne!(normalize("pkg.Marker").unwrap(), normalize("@pkg.Marker").unwrap());
/// ```
#[derive(
    Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub enum Qualifier {
    /// A qualifier keyed by a string.
    Named(String),

    /// A qualifier keyed by a marker type, optionally carrying a value.
    Annotated {
        /// Fully-qualified name of the marker type.
        marker: String,

        /// The argument the marker was applied with, if any.
        value: Option<AnnotationValue>,
    },
}

/// The argument carried by an annotated qualifier.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum AnnotationValue {
    /// A class literal, stored without its `.class` suffix.
    Class(String),

    /// A string literal.
    Text(String),

    /// A constant reference such as an enum entry.
    Constant(String),
}

impl Qualifier {
    /// Creates a named qualifier.
    #[must_use]
    pub fn named(key: impl AsRef<str>) -> Self {
        Qualifier::Named(canonical_name(key.as_ref()))
    }

    /// Creates an annotated qualifier. A built-in name marker carrying a
    /// string value becomes the equivalent named qualifier.
    #[must_use]
    pub fn annotated(
        marker: impl AsRef<str>,
        value: Option<AnnotationValue>,
    ) -> Self {
        let marker = canonical_name(marker.as_ref());
        match value.map(AnnotationValue::canonical) {
            Some(AnnotationValue::Text(key)) if is_named_marker(&marker) => {
                Qualifier::named(key)
            }
            value => Qualifier::Annotated { marker, value },
        }
    }

    /// Whether this is a named qualifier.
    #[must_use]
    pub fn is_named(&self) -> bool {
        matches!(self, Qualifier::Named(_))
    }

    /// The name key or the marker type, depending on the kind.
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Qualifier::Named(key) => key,
            Qualifier::Annotated { marker, .. } => marker,
        }
    }
}

impl AnnotationValue {
    /// Type names are canonicalized like any other name. A string literal
    /// keeps its inner whitespace and only loses the surrounding whitespace.
    fn canonical(self) -> Self {
        match self {
            AnnotationValue::Class(name) => {
                AnnotationValue::Class(canonical_name(&name))
            }
            AnnotationValue::Text(text) => {
                AnnotationValue::Text(text.trim().to_owned())
            }
            AnnotationValue::Constant(path) => {
                AnnotationValue::Constant(canonical_name(&path))
            }
        }
    }
}

fn write_string_literal(f: &mut Formatter<'_>, text: &str) -> std::fmt::Result {
    f.write_char('"')?;
    for c in text.chars() {
        if c == '"' || c == '\\' {
            f.write_char('\\')?;
        }
        f.write_char(c)?;
    }
    f.write_char('"')
}

impl std::fmt::Display for Qualifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Qualifier::Named(key) => {
                f.write_str("@Named(")?;
                write_string_literal(f, key)?;
                f.write_char(')')
            }
            Qualifier::Annotated {
                marker,
                value: None,
            } => write!(f, "@{marker}"),
            Qualifier::Annotated {
                marker,
                value: Some(value),
            } => write!(f, "@{marker}({value})"),
        }
    }
}

impl std::fmt::Display for AnnotationValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AnnotationValue::Class(name) => write!(f, "{name}.class"),
            AnnotationValue::Text(text) => write_string_literal(f, text),
            AnnotationValue::Constant(path) => f.write_str(path),
        }
    }
}

/// An error produced while normalizing a qualifier expression.
#[derive(Clone, PartialEq, Eq, Debug, Display, Error)]
pub enum QualifierError {
    /// The expression contained nothing but whitespace.
    #[display(fmt = "qualifier expression is empty")]
    Empty,

    /// The expression could not be parsed.
    #[display(
        fmt = "malformed qualifier expression `{}` at offset {}: {}",
        expression,
        position,
        reason
    )]
    Malformed {
        /// The expression as it was given.
        expression: String,

        /// Byte offset of the failure.
        position: usize,

        /// What was expected at that offset.
        reason: &'static str,
    },
}

/// Conversion into a canonical [`Qualifier`]. Implemented for qualifier
/// expressions (string types) and for qualifiers themselves, which convert
/// to themselves unchanged.
pub trait IntoQualifier {
    /// Converts `self` into its canonical qualifier.
    fn into_qualifier(self) -> Result<Qualifier, QualifierError>;
}

impl IntoQualifier for Qualifier {
    fn into_qualifier(self) -> Result<Qualifier, QualifierError> {
        Ok(self)
    }
}

impl IntoQualifier for &Qualifier {
    fn into_qualifier(self) -> Result<Qualifier, QualifierError> {
        Ok(self.clone())
    }
}

impl IntoQualifier for &str {
    fn into_qualifier(self) -> Result<Qualifier, QualifierError> {
        parse::parse(self)
    }
}

impl IntoQualifier for String {
    fn into_qualifier(self) -> Result<Qualifier, QualifierError> {
        parse::parse(&self)
    }
}

impl IntoQualifier for &String {
    fn into_qualifier(self) -> Result<Qualifier, QualifierError> {
        parse::parse(self)
    }
}

/// Normalizes a raw qualifier expression into its canonical [`Qualifier`].
///
/// Normalizing is idempotent: normalizing a qualifier, or the text it
/// displays as, gives back an equal qualifier.
pub fn normalize(raw: impl IntoQualifier) -> Result<Qualifier, QualifierError> {
    raw.into_qualifier()
}

impl FromStr for Qualifier {
    type Err = QualifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse::parse(s)
    }
}

impl TryFrom<String> for Qualifier {
    type Error = QualifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        parse::parse(&value)
    }
}

impl From<Qualifier> for String {
    fn from(qualifier: Qualifier) -> Self {
        qualifier.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::{normalize, AnnotationValue, Qualifier, QualifierError};

    #[test]
    fn bare_and_quoted_text_are_named() {
        let expected = Qualifier::named("pkg.RepositoryImp1");
        assert_eq!(expected, normalize("pkg.RepositoryImp1").unwrap());
        assert_eq!(expected, normalize("  pkg.RepositoryImp1\t").unwrap());
        assert_eq!(expected, normalize(r#""pkg.RepositoryImp1""#).unwrap());
        assert_eq!(expected, normalize(r#"" pkg.RepositoryImp1 ""#).unwrap());
    }

    #[test]
    fn named_markers_are_named() {
        let expected = Qualifier::named("pkg.PrivateNetwork");
        for expression in [
            r#"@Named("pkg.PrivateNetwork")"#,
            r#"@javax.inject.Named("pkg.PrivateNetwork")"#,
            r#"@ jakarta . inject . Named ( value = "pkg.PrivateNetwork" )"#,
        ] {
            assert_eq!(expected, normalize(expression).unwrap(), "{expression}");
        }
    }

    #[test]
    fn annotated_forms() {
        assert_eq!(
            Qualifier::Annotated {
                marker: "pkg.ServiceImpQ1".to_owned(),
                value: None,
            },
            normalize("@pkg.ServiceImpQ1").unwrap()
        );
        assert_eq!(
            normalize("@pkg.ServiceImpQ1").unwrap(),
            normalize("@pkg.ServiceImpQ1()").unwrap()
        );
        assert_eq!(
            Qualifier::annotated(
                "pkg.RoomQualifier",
                Some(AnnotationValue::Class("pkg.Kitchen".to_owned()))
            ),
            normalize("@pkg.RoomQualifier(pkg.Kitchen.class)").unwrap()
        );
        assert_eq!(
            Qualifier::annotated(
                "pkg.RoomQualifier",
                Some(AnnotationValue::Constant("pkg.Room.KITCHEN".to_owned()))
            ),
            normalize("@pkg.RoomQualifier(pkg.Room.KITCHEN)").unwrap()
        );
        assert_eq!(
            Qualifier::annotated(
                "pkg.Env",
                Some(AnnotationValue::Text("prod".to_owned()))
            ),
            normalize(r#"@pkg.Env("prod")"#).unwrap()
        );
    }

    #[test]
    fn text_values_keep_inner_whitespace() {
        assert_ne!(
            normalize(r#"@pkg.Env("a . b")"#).unwrap(),
            normalize(r#"@pkg.Env("a.b")"#).unwrap()
        );
        assert_eq!(
            normalize(r#"@pkg.Env("a . b")"#).unwrap(),
            normalize(r#"@pkg.Env(value = " a . b ")"#).unwrap()
        );

        // Name keys are type names, so their dotted paths still collapse.
        assert_eq!(
            Qualifier::named("a.b"),
            normalize(r#"@Named("a . b")"#).unwrap()
        );
    }

    #[test]
    fn class_values_differ_by_class() {
        assert_ne!(
            normalize("@pkg.RoomQualifier(pkg.Kitchen.class)").unwrap(),
            normalize("@pkg.RoomQualifier(pkg.Bedroom.class)").unwrap()
        );
    }

    #[test]
    fn kinds_never_collide() {
        let named = normalize("pkg.Marker").unwrap();
        let annotated = normalize("@pkg.Marker").unwrap();
        assert_eq!(named.key(), annotated.key());
        assert_ne!(named, annotated);
        assert!(named.is_named());
        assert!(!annotated.is_named());
    }

    #[test]
    fn named_marker_with_class_value_stays_annotated() {
        let qualifier = normalize("@Named(pkg.Kitchen.class)").unwrap();
        assert!(!qualifier.is_named());
    }

    #[test]
    fn display_round_trips() {
        for expression in [
            "pkg.RepositoryImp1",
            "@pkg.ServiceImpQ1",
            "@Named",
            "@pkg.RoomQualifier(pkg.Kitchen.class)",
            "@pkg.RoomQualifier(pkg.Room.KITCHEN)",
            r#"@pkg.Env("a \"quoted\" \\ value")"#,
            r#""free form key""#,
        ] {
            let qualifier = normalize(expression).unwrap();
            assert_eq!(qualifier, normalize(qualifier.to_string()).unwrap());
            assert_eq!(qualifier, normalize(&qualifier).unwrap());
        }
    }

    #[test]
    fn escapes_in_string_literals() {
        assert_eq!(
            Qualifier::named(r#"a "b" \c"#),
            normalize(r#"@Named("a \"b\" \\c")"#).unwrap()
        );
    }

    #[test]
    fn rejects_empty() {
        assert_eq!(Err(QualifierError::Empty), normalize(""));
        assert_eq!(Err(QualifierError::Empty), normalize(" \n\t "));
    }

    #[test]
    fn rejects_malformed() {
        for expression in [
            "@",
            "@pkg.",
            "@pkg.Marker(",
            "@pkg.Marker(pkg.Kitchen.class",
            "@pkg.Marker(1abc)",
            "@pkg.Marker) trailing",
            r#"@Named("unterminated)"#,
            r#""unterminated"#,
            r#""a" "b""#,
        ] {
            match normalize(expression) {
                Err(QualifierError::Malformed { .. }) => {}
                other => panic!("{expression:?} normalized to {other:?}"),
            }
        }
    }

    #[test]
    fn deserializes_from_expression() {
        let qualifier: Qualifier =
            serde_json::from_str(r#""@Named(\"pkg.PrivateNetwork\")""#)
                .unwrap();
        assert_eq!(Qualifier::named("pkg.PrivateNetwork"), qualifier);
        assert_eq!(
            r#""@Named(\"pkg.PrivateNetwork\")""#,
            serde_json::to_string(&qualifier).unwrap()
        );
        assert!(serde_json::from_str::<Qualifier>(r#""@""#).is_err());
    }
}
