use std::fmt::Display;

use inkwell::builder::BuilderError;
use thiserror::Error;

use crate::Position;

#[derive(Debug, Clone)]
pub struct Error {
    internal_error: ErrorImpl,
    position: Position,
}

impl Error {
    pub fn new(error_impl: ErrorImpl, position: Position) -> Self {
        Error {
            internal_error: error_impl,
            position,
        }
    }

    pub fn codegen(message: impl Into<String>) -> Self {
        Error::new(
            ErrorImpl::CodegenError {
                message: message.into(),
            },
            Position::null(),
        )
    }

    pub fn get_position(&self) -> &Position {
        &self.position
    }

    pub fn get_internal_error(&self) -> &ErrorImpl {
        &self.internal_error
    }

    pub fn get_error_name(&self) -> &str {
        match &self.internal_error {
            ErrorImpl::UnrecognisedToken { .. } => "UnrecognisedToken",
            ErrorImpl::UnexpectedToken { .. } => "UnexpectedToken",
            ErrorImpl::UnexpectedTokenDetailed { .. } => "UnexpectedTokenDetailed",
            ErrorImpl::NumberParseError { .. } => "NumberParseError",
            ErrorImpl::UnterminatedComment => "UnterminatedComment",
            ErrorImpl::UndefinedName { .. } => "UndefinedName",
            ErrorImpl::RedefinitionError { .. } => "RedefinitionError",
            ErrorImpl::TypeMismatch { .. } => "TypeMismatch",
            ErrorImpl::ArityMismatch { .. } => "ArityMismatch",
            ErrorImpl::CyclicTypeDefinition { .. } => "CyclicTypeDefinition",
            ErrorImpl::KindError { .. } => "KindError",
            ErrorImpl::CodegenError { .. } => "CodegenError",
        }
    }

    pub fn get_tip(&self) -> ErrorTip {
        match &self.internal_error {
            ErrorImpl::UnrecognisedToken { .. } => ErrorTip::None,
            ErrorImpl::UnexpectedToken { token } => {
                ErrorTip::Suggestion(format!("Unexpected token: `{}`", token))
            }
            ErrorImpl::UnexpectedTokenDetailed { token, message } => {
                ErrorTip::Suggestion(format!("Unexpected token: `{}`, {}", token, message))
            }
            ErrorImpl::NumberParseError { token } => ErrorTip::Suggestion(format!(
                "Invalid number: `{}`, is it above the integer limit?",
                token
            )),
            ErrorImpl::UnterminatedComment => {
                ErrorTip::Suggestion(String::from("Comment is missing its closing `*/`"))
            }
            ErrorImpl::UndefinedName { kind, name } => {
                ErrorTip::Suggestion(format!("`{}` is not a declared {}", name, kind))
            }
            ErrorImpl::RedefinitionError { kind, name } => ErrorTip::Suggestion(format!(
                "{} `{}` is already declared in this scope",
                kind, name
            )),
            ErrorImpl::TypeMismatch { expected, received } => ErrorTip::Suggestion(format!(
                "Expected type `{}`, received `{}`",
                expected, received
            )),
            ErrorImpl::ArityMismatch { expected, received } => ErrorTip::Suggestion(format!(
                "Expected {} values, received {}",
                expected, received
            )),
            ErrorImpl::CyclicTypeDefinition { name } => ErrorTip::Suggestion(format!(
                "Type `{}` is defined in terms of itself without a record in between",
                name
            )),
            ErrorImpl::KindError { message } => ErrorTip::Suggestion(message.clone()),
            ErrorImpl::CodegenError { .. } => ErrorTip::None,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.get_error_name(), self.internal_error)
    }
}

impl std::error::Error for Error {}

impl From<BuilderError> for Error {
    fn from(error: BuilderError) -> Self {
        Error::codegen(error.to_string())
    }
}

pub enum ErrorTip {
    None,
    Suggestion(String),
}

impl Display for ErrorTip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorTip::None => write!(f, ""),
            ErrorTip::Suggestion(suggestion) => write!(f, "{}", suggestion),
        }
    }
}

/// Which namespace a name was looked up or declared in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameKind {
    Variable,
    Function,
    Type,
    Field,
}

impl Display for NameKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NameKind::Variable => write!(f, "variable"),
            NameKind::Function => write!(f, "function"),
            NameKind::Type => write!(f, "type"),
            NameKind::Field => write!(f, "field"),
        }
    }
}

#[derive(Error, Debug, Clone)]
pub enum ErrorImpl {
    #[error("unrecognised token: {token:?}")]
    UnrecognisedToken { token: String },
    #[error("unexpected token: {token:?}")]
    UnexpectedToken { token: String },
    #[error("unexpected token ({message:?}): {token:?}")]
    UnexpectedTokenDetailed { token: String, message: String },
    #[error("error parsing number: {token:?}")]
    NumberParseError { token: String },
    #[error("unterminated comment")]
    UnterminatedComment,
    #[error("{name:?} is not a {kind}")]
    UndefinedName { kind: NameKind, name: String },
    #[error("{kind} {name:?} already declared")]
    RedefinitionError { kind: NameKind, name: String },
    #[error("types do not match: expected {expected:?}, received {received:?}")]
    TypeMismatch { expected: String, received: String },
    #[error("wrong number of values: expected {expected}, received {received}")]
    ArityMismatch { expected: usize, received: usize },
    #[error("cyclic type definition of {name:?}")]
    CyclicTypeDefinition { name: String },
    #[error("{message}")]
    KindError { message: String },
    #[error("code generation failed: {message}")]
    CodegenError { message: String },
}
