//! Unit tests for error handling.

use crate::errors::errors::{Error, ErrorImpl, ErrorTip, NameKind};
use crate::Position;
use std::rc::Rc;

fn position(offset: u32) -> Position {
    Position(offset, Rc::new("test.tig".to_string()))
}

#[test]
fn test_error_creation() {
    let error = Error::new(
        ErrorImpl::UnrecognisedToken {
            token: "@".to_string(),
        },
        position(10),
    );

    assert_eq!(error.get_error_name(), "UnrecognisedToken");
    assert!(matches!(error.get_tip(), ErrorTip::None));
}

#[test]
fn test_error_position() {
    let error = Error::new(
        ErrorImpl::UnexpectedToken {
            token: "then".to_string(),
        },
        position(42),
    );

    assert_eq!(error.get_position().0, 42);
    assert_eq!(error.get_position().1.as_str(), "test.tig");
}

#[test]
fn test_undefined_name_error() {
    let error = Error::new(
        ErrorImpl::UndefinedName {
            kind: NameKind::Type,
            name: "tree".to_string(),
        },
        position(0),
    );

    assert_eq!(error.get_error_name(), "UndefinedName");
    assert_eq!(error.get_tip().to_string(), "`tree` is not a declared type");
    assert_eq!(
        error.get_internal_error().to_string(),
        "\"tree\" is not a type"
    );
}

#[test]
fn test_redefinition_error() {
    let error = Error::new(
        ErrorImpl::RedefinitionError {
            kind: NameKind::Function,
            name: "f".to_string(),
        },
        position(0),
    );

    assert_eq!(error.get_error_name(), "RedefinitionError");
    assert_eq!(
        error.get_tip().to_string(),
        "function `f` is already declared in this scope"
    );
}

#[test]
fn test_type_mismatch_error() {
    let error = Error::new(
        ErrorImpl::TypeMismatch {
            expected: "int".to_string(),
            received: "string".to_string(),
        },
        position(0),
    );

    assert_eq!(error.get_error_name(), "TypeMismatch");
    assert_eq!(
        error.to_string(),
        "TypeMismatch: types do not match: expected \"int\", received \"string\""
    );
}

#[test]
fn test_arity_mismatch_error() {
    let error = Error::new(
        ErrorImpl::ArityMismatch {
            expected: 2,
            received: 1,
        },
        position(0),
    );

    assert_eq!(error.get_error_name(), "ArityMismatch");
    assert_eq!(error.get_tip().to_string(), "Expected 2 values, received 1");
}

#[test]
fn test_cyclic_and_kind_errors() {
    let cyclic = Error::new(
        ErrorImpl::CyclicTypeDefinition {
            name: "a".to_string(),
        },
        position(0),
    );
    let kind = Error::new(
        ErrorImpl::KindError {
            message: "break is only valid inside a loop".to_string(),
        },
        position(0),
    );

    assert_eq!(cyclic.get_error_name(), "CyclicTypeDefinition");
    assert_eq!(kind.get_error_name(), "KindError");
    assert_eq!(
        kind.get_tip().to_string(),
        "break is only valid inside a loop"
    );
}

#[test]
fn test_codegen_error_has_null_position() {
    let error = Error::codegen("module verification failed");

    assert_eq!(error.get_error_name(), "CodegenError");
    assert_eq!(error.get_position().0, 0);
    assert_eq!(error.get_position().1.as_str(), "<null>");
}
