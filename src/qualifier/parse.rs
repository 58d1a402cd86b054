//! Parser for qualifier expressions.
//!
//! ```text
//! expression := annotation | string | text
//! annotation := '@' path ( '(' argument? ')' )?
//! argument   := ( 'value' '=' )? ( string | path )
//! path       := identifier ( '.' identifier )*
//! ```
//!
//! Whitespace is allowed between any two tokens. A path argument ending in
//! `.class` is a class literal. Text that is neither an annotation nor a
//! string literal is taken whole as a name key.

use super::{AnnotationValue, Qualifier, QualifierError};
use crate::binding::{is_identifier_continue, is_identifier_start};

pub(crate) fn parse(expression: &str) -> Result<Qualifier, QualifierError> {
    if expression.trim().is_empty() {
        return Err(QualifierError::Empty);
    }

    let mut cursor = Cursor::new(expression);
    cursor.skip_whitespace();
    let qualifier = match cursor.peek() {
        Some('@') => {
            cursor.bump();
            cursor.annotation()?
        }
        Some('"') => Qualifier::named(cursor.string()?),
        _ => return Ok(Qualifier::named(expression)),
    };

    cursor.skip_whitespace();
    if cursor.peek().is_some() {
        return Err(cursor.error("unexpected trailing input"));
    }

    Ok(qualifier)
}

struct Cursor<'a> {
    source: &'a str,
    position: usize,
}

impl<'a> Cursor<'a> {
    fn new(source: &'a str) -> Self {
        Cursor {
            source,
            position: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.source[self.position..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let next = self.peek()?;
        self.position += next.len_utf8();
        Some(next)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.position += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().map_or(false, char::is_whitespace) {
            self.bump();
        }
    }

    fn error(&self, reason: &'static str) -> QualifierError {
        QualifierError::Malformed {
            expression: self.source.to_owned(),
            position: self.position,
            reason,
        }
    }

    fn annotation(&mut self) -> Result<Qualifier, QualifierError> {
        self.skip_whitespace();
        let marker = self.path()?;
        self.skip_whitespace();
        if !self.eat('(') {
            return Ok(Qualifier::annotated(marker, None));
        }

        self.skip_whitespace();
        if self.eat(')') {
            return Ok(Qualifier::annotated(marker, None));
        }

        self.skip_value_key();
        let value = if self.peek() == Some('"') {
            AnnotationValue::Text(self.string()?)
        } else {
            let path = self.path()?;
            match path.strip_suffix(".class") {
                Some(class) => AnnotationValue::Class(class.to_owned()),
                None => AnnotationValue::Constant(path),
            }
        };

        self.skip_whitespace();
        if !self.eat(')') {
            return Err(self.error("expected `)`"));
        }

        Ok(Qualifier::annotated(marker, Some(value)))
    }

    /// Skips an explicit `value =` in front of an annotation argument.
    fn skip_value_key(&mut self) {
        let start = self.position;
        if self.identifier().as_deref() == Some("value") {
            self.skip_whitespace();
            if self.eat('=') {
                self.skip_whitespace();
                return;
            }
        }
        self.position = start;
    }

    fn identifier(&mut self) -> Option<String> {
        let start = self.position;
        if !self.peek().map_or(false, is_identifier_start) {
            return None;
        }
        while self.peek().map_or(false, is_identifier_continue) {
            self.bump();
        }
        Some(self.source[start..self.position].to_owned())
    }

    fn path(&mut self) -> Result<String, QualifierError> {
        let mut path = self
            .identifier()
            .ok_or_else(|| self.error("expected an identifier"))?;
        loop {
            let before_dot = self.position;
            self.skip_whitespace();
            if !self.eat('.') {
                self.position = before_dot;
                return Ok(path);
            }
            self.skip_whitespace();
            let segment = self
                .identifier()
                .ok_or_else(|| self.error("expected an identifier after `.`"))?;
            path.push('.');
            path.push_str(&segment);
        }
    }

    fn string(&mut self) -> Result<String, QualifierError> {
        if !self.eat('"') {
            return Err(self.error("expected `\"`"));
        }

        let mut text = String::new();
        loop {
            match self.bump() {
                Some('"') => return Ok(text),
                Some('\\') => match self.bump() {
                    Some(escaped) => text.push(escaped),
                    None => return Err(self.error("unterminated escape")),
                },
                Some(c) => text.push(c),
                None => return Err(self.error("unterminated string literal")),
            }
        }
    }
}
