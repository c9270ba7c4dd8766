//! Textual intrinsic declarations for the command line.
//!
//! One declaration per line: `Name/arity` for value-returning methods,
//! `Name/arity:void` for void ones. `#` starts a comment.

use crate::intrinsic::FunctionSignature;
use crate::module::MethodId;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeclError {
    #[error("line {line}: expected `Name/arity[:void]`, found `{text}`")]
    Malformed { line: usize, text: String },
    #[error("line {line}: invalid arity `{arity}`")]
    InvalidArity { line: usize, arity: String },
    #[error("line {line}: unknown return kind `{kind}` (expected `void` or `value`)")]
    UnknownReturn { line: usize, kind: String },
}

/// Parse a single declaration.
pub fn parse_declaration(text: &str, method: MethodId, line: usize) -> Result<FunctionSignature, DeclError> {
    let malformed = || DeclError::Malformed {
        line,
        text: text.to_string(),
    };

    let (name, rest) = text.split_once('/').ok_or_else(malformed)?;
    let name = name.trim();
    if name.is_empty() || name.contains(char::is_whitespace) {
        return Err(malformed());
    }

    let (arity, returns) = match rest.split_once(':') {
        Some((arity, returns)) => (arity.trim(), Some(returns.trim())),
        None => (rest.trim(), None),
    };
    let parameter_count: u16 = arity.parse().map_err(|_| DeclError::InvalidArity {
        line,
        arity: arity.to_string(),
    })?;
    let returns_void = match returns {
        None | Some("value") => false,
        Some("void") => true,
        Some(other) => {
            return Err(DeclError::UnknownReturn {
                line,
                kind: other.to_string(),
            });
        }
    };

    Ok(FunctionSignature::new(method, name, parameter_count, returns_void))
}

/// Parse a list of declarations, numbering methods from `first_method`.
pub fn parse_declarations(source: &str, first_method: u32) -> Result<Vec<FunctionSignature>, DeclError> {
    let mut out = Vec::new();
    for (i, raw) in source.lines().enumerate() {
        let text = raw.split('#').next().unwrap_or("").trim();
        if text.is_empty() {
            continue;
        }
        let method = MethodId::new(first_method + out.len() as u32);
        out.push(parse_declaration(text, method, i + 1)?);
    }
    Ok(out)
}
