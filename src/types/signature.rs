//! Type signatures: the reflected-type facts the metamodel is built from.
//!
//! A `TypeSignature` is the explicit form of what a reflective runtime would
//! report for a declared type: a plain class, a parametrized class, an array,
//! a wildcard, or an unresolved type variable.
//!
//! ## Textual Form
//!
//! ```text
//! Customer
//! Map<String, Integer>
//! List<?>
//! Set<T>
//! int[]
//! List<Map<String, Customer>>[]
//! ```
//!
//! A single upper-case letter is read as a type variable.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex_lite::Regex;
use serde::{Deserialize, Serialize};

/// Names of the primitive (unboxed) types.
const PRIMITIVE_NAMES: &[&str] = &[
    "boolean", "byte", "char", "short", "int", "long", "float", "double",
];

/// Name of a concrete class.
///
/// Implements `Ord` so classes can key deterministic maps.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TypeName(String);

impl TypeName {
    /// Create a new type name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the name as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this names an unboxed primitive type (`int`, `boolean`, ...).
    pub fn is_primitive(&self) -> bool {
        PRIMITIVE_NAMES.contains(&self.0.as_str())
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TypeName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

/// A declared (possibly generic) type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeSignature {
    /// Non-generic class, or a raw use of a generic class.
    Class(TypeName),
    /// Generic class with its type arguments.
    Parametrized {
        /// The raw class.
        raw: TypeName,
        /// Type arguments in declaration order.
        args: Vec<TypeSignature>,
    },
    /// Array with the given component type.
    Array(Box<TypeSignature>),
    /// Wildcard argument (`?`).
    Wildcard,
    /// Unresolved type variable.
    Variable(String),
}

impl TypeSignature {
    /// Plain class signature.
    pub fn class(name: impl Into<String>) -> Self {
        Self::Class(TypeName::new(name))
    }

    /// Parametrized signature.
    pub fn parametrized(raw: impl Into<String>, args: Vec<TypeSignature>) -> Self {
        Self::Parametrized {
            raw: TypeName::new(raw),
            args,
        }
    }

    /// Array signature with the given component.
    pub fn array_of(component: TypeSignature) -> Self {
        Self::Array(Box::new(component))
    }

    /// Parse the textual form.
    pub fn parse(input: &str) -> Result<Self, SignatureParseError> {
        SignatureParser::new(input)?.parse_complete()
    }

    /// The raw class of a class or parametrized signature.
    pub fn raw_class(&self) -> Option<&TypeName> {
        match self {
            Self::Class(name) => Some(name),
            Self::Parametrized { raw, .. } => Some(raw),
            _ => None,
        }
    }

    /// Declared type arguments (empty unless parametrized).
    pub fn type_arguments(&self) -> &[TypeSignature] {
        match self {
            Self::Parametrized { args, .. } => args,
            _ => &[],
        }
    }

    /// Concrete class this signature denotes, if any.
    ///
    /// Arrays of concrete components resolve to `component[]`.
    /// Wildcards and type variables have no class.
    pub fn as_class(&self) -> Option<TypeName> {
        match self {
            Self::Class(name) => Some(name.clone()),
            Self::Parametrized { raw, .. } => Some(raw.clone()),
            Self::Array(component) => component
                .as_class()
                .map(|name| TypeName::new(format!("{}[]", name))),
            Self::Wildcard | Self::Variable(_) => None,
        }
    }

    /// Type arguments that resolve to concrete classes, in declaration order.
    pub fn actual_class_type_arguments(&self) -> Vec<TypeName> {
        self.type_arguments()
            .iter()
            .filter_map(TypeSignature::as_class)
            .collect()
    }

    /// Whether this is an array signature.
    pub fn is_array(&self) -> bool {
        matches!(self, Self::Array(_))
    }
}

impl fmt::Display for TypeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Class(name) => write!(f, "{}", name),
            Self::Parametrized { raw, args } => {
                write!(f, "{}<", raw)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ">")
            }
            Self::Array(component) => write!(f, "{}[]", component),
            Self::Wildcard => write!(f, "?"),
            Self::Variable(name) => write!(f, "{}", name),
        }
    }
}

impl FromStr for TypeSignature {
    type Err = SignatureParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<TypeName> for TypeSignature {
    fn from(name: TypeName) -> Self {
        Self::Class(name)
    }
}

/// Error type for signature parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureParseError {
    /// Input had no tokens.
    #[error("Empty type signature")]
    Empty,
    /// A token appeared where it is not allowed.
    #[error("Unexpected token '{token}' at offset {offset}")]
    UnexpectedToken {
        /// The offending token.
        token: String,
        /// Byte offset in the input.
        offset: usize,
    },
    /// Input ended in the middle of a signature.
    #[error("Unexpected end of type signature")]
    UnexpectedEnd,
}

fn token_regex() -> &'static Regex {
    static TOKEN: OnceLock<Regex> = OnceLock::new();
    TOKEN.get_or_init(|| {
        Regex::new(r"[A-Za-z_$][A-Za-z0-9_$.]*|\[\]|[?<>,]|\S")
            .expect("Signature token regex is valid")
    })
}

#[derive(Debug, Clone, Copy)]
struct Token<'a> {
    text: &'a str,
    offset: usize,
}

/// Recursive-descent parser over regex tokens.
///
/// ```text
/// signature := atom "[]"*
/// atom      := "?" | IDENT ( "<" signature ( "," signature )* ">" )?
/// ```
struct SignatureParser<'a> {
    tokens: Vec<Token<'a>>,
    pos: usize,
}

impl<'a> SignatureParser<'a> {
    fn new(input: &'a str) -> Result<Self, SignatureParseError> {
        let tokens: Vec<Token<'a>> = token_regex()
            .find_iter(input)
            .map(|m| Token {
                text: m.as_str(),
                offset: m.start(),
            })
            .collect();
        if tokens.is_empty() {
            return Err(SignatureParseError::Empty);
        }
        Ok(Self { tokens, pos: 0 })
    }

    fn parse_complete(mut self) -> Result<TypeSignature, SignatureParseError> {
        let signature = self.parse_signature()?;
        match self.tokens.get(self.pos) {
            None => Ok(signature),
            Some(token) => Err(unexpected(*token)),
        }
    }

    fn peek(&self) -> Option<Token<'a>> {
        self.tokens.get(self.pos).copied()
    }

    fn next(&mut self) -> Result<Token<'a>, SignatureParseError> {
        let token = self.peek().ok_or(SignatureParseError::UnexpectedEnd)?;
        self.pos += 1;
        Ok(token)
    }

    fn parse_signature(&mut self) -> Result<TypeSignature, SignatureParseError> {
        let mut signature = self.parse_atom()?;
        while self.peek().map(|t| t.text) == Some("[]") {
            self.pos += 1;
            signature = TypeSignature::array_of(signature);
        }
        Ok(signature)
    }

    fn parse_atom(&mut self) -> Result<TypeSignature, SignatureParseError> {
        let token = self.next()?;
        let text = token.text;
        if text == "?" {
            return Ok(TypeSignature::Wildcard);
        }
        if !is_identifier(text) {
            return Err(unexpected(token));
        }
        if is_type_variable(text) {
            return Ok(TypeSignature::Variable(text.to_string()));
        }

        if self.peek().map(|t| t.text) != Some("<") {
            return Ok(TypeSignature::class(text));
        }
        self.pos += 1;

        let mut args = vec![self.parse_signature()?];
        loop {
            let token = self.next()?;
            match token.text {
                "," => args.push(self.parse_signature()?),
                ">" => break,
                _ => return Err(unexpected(token)),
            }
        }
        Ok(TypeSignature::parametrized(text, args))
    }
}

fn unexpected(token: Token<'_>) -> SignatureParseError {
    SignatureParseError::UnexpectedToken {
        token: token.text.to_string(),
        offset: token.offset,
    }
}

fn is_identifier(text: &str) -> bool {
    text.chars()
        .next()
        .map(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        .unwrap_or(false)
}

fn is_type_variable(text: &str) -> bool {
    text.len() == 1 && text.chars().all(|c| c.is_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_parametrized_map() {
        let sig = TypeSignature::parse("Map<String, Integer>").unwrap();
        assert_eq!(
            sig,
            TypeSignature::parametrized(
                "Map",
                vec![TypeSignature::class("String"), TypeSignature::class("Integer")],
            )
        );
        assert_eq!(sig.to_string(), "Map<String, Integer>");
    }

    #[test]
    fn test_parse_nested_and_arrays() {
        let sig = TypeSignature::parse("List<Map<String,Customer>>[]").unwrap();
        assert!(sig.is_array());
        assert_eq!(sig.to_string(), "List<Map<String, Customer>>[]");

        let ints = TypeSignature::parse("int[]").unwrap();
        assert_eq!(ints, TypeSignature::array_of(TypeSignature::class("int")));
        assert_eq!(ints.as_class(), Some(TypeName::new("int[]")));
    }

    #[test]
    fn test_wildcards_and_variables_are_not_classes() {
        let sig = TypeSignature::parse("Map<?, V>").unwrap();
        assert_eq!(sig.type_arguments().len(), 2);
        assert!(sig.actual_class_type_arguments().is_empty());

        let half = TypeSignature::parse("Map<String, ?>").unwrap();
        assert_eq!(half.actual_class_type_arguments(), vec![TypeName::new("String")]);
    }

    #[test]
    fn test_parametrized_argument_resolves_to_raw_class() {
        let sig = TypeSignature::parse("List<Set<Customer>>").unwrap();
        assert_eq!(sig.actual_class_type_arguments(), vec![TypeName::new("Set")]);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(TypeSignature::parse("   "), Err(SignatureParseError::Empty));
        assert_eq!(TypeSignature::parse("Map<String"), Err(SignatureParseError::UnexpectedEnd));
        assert!(matches!(
            TypeSignature::parse("List<String>>"),
            Err(SignatureParseError::UnexpectedToken { offset: 12, .. })
        ));
        assert!(matches!(
            TypeSignature::parse("List<#>"),
            Err(SignatureParseError::UnexpectedToken { .. })
        ));
    }

    #[test]
    fn test_primitive_names() {
        assert!(TypeName::new("int").is_primitive());
        assert!(!TypeName::new("Integer").is_primitive());
    }
}
