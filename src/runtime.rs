//! Signatures of the runtime library linked into every program.
//!
//! Source programs see the names in [`RUNTIME_FUNCTIONS`]; several are
//! aliases of the same ABI symbol. The allocation and string comparison
//! primitives are only called by generated code.

use crate::type_checker::types::Ty;

#[derive(Debug, Clone, Copy)]
pub struct RuntimeFunction {
    /// Name visible to source programs.
    pub name: &'static str,
    /// Symbol the generated code calls.
    pub symbol: &'static str,
    pub params: &'static [Ty],
    pub result: Ty,
}

macro_rules! runtime_fn {
    ($name:literal => $symbol:literal ($($param:expr),*) -> $result:expr) => {
        RuntimeFunction {
            name: $name,
            symbol: $symbol,
            params: &[$($param),*],
            result: $result,
        }
    };
}

pub const RUNTIME_FUNCTIONS: &[RuntimeFunction] = &[
    runtime_fn!("print" => "print" (Ty::String) -> Ty::Void),
    runtime_fn!("printInt" => "printInt" (Ty::Int) -> Ty::Void),
    runtime_fn!("printi" => "printInt" (Ty::Int) -> Ty::Void),
    runtime_fn!("printd" => "printInt" (Ty::Int) -> Ty::Void),
    runtime_fn!("flush" => "flush" () -> Ty::Void),
    runtime_fn!("readChar" => "readChar" () -> Ty::String),
    runtime_fn!("getchar" => "readChar" () -> Ty::String),
    runtime_fn!("ord" => "ord" (Ty::String) -> Ty::Int),
    runtime_fn!("chr" => "chr" (Ty::Int) -> Ty::String),
    runtime_fn!("length" => "length" (Ty::String) -> Ty::Int),
    runtime_fn!("size" => "length" (Ty::String) -> Ty::Int),
    runtime_fn!("substring" => "substring" (Ty::String, Ty::Int, Ty::Int) -> Ty::String),
    runtime_fn!("concat" => "concat" (Ty::String, Ty::String) -> Ty::String),
    runtime_fn!("logicalNot" => "logicalNot" (Ty::Int) -> Ty::Int),
    runtime_fn!("not" => "logicalNot" (Ty::Int) -> Ty::Int),
    runtime_fn!("terminate" => "terminate" (Ty::Int) -> Ty::Void),
    runtime_fn!("exit" => "terminate" (Ty::Int) -> Ty::Void),
];

/// `allocRecord(size_bytes: i64) -> i8*`
pub const ALLOC_RECORD: &str = "allocRecord";
/// `allocArray(count: i64, element_size_bytes: i64) -> i8*`
pub const ALLOC_ARRAY: &str = "allocArray";
/// `stringCompare(a: i8*, b: i8*) -> i64`, negative, zero or positive.
pub const STRING_COMPARE: &str = "stringCompare";

/// The runtime function implementing `symbol`, ignoring aliases.
pub fn by_symbol(symbol: &str) -> Option<&'static RuntimeFunction> {
    RUNTIME_FUNCTIONS
        .iter()
        .find(|function| function.symbol == symbol)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(name: &str) -> Option<&'static RuntimeFunction> {
        RUNTIME_FUNCTIONS.iter().find(|function| function.name == name)
    }

    #[test]
    fn test_aliases_share_symbols() {
        assert_eq!(lookup("printi").unwrap().symbol, "printInt");
        assert_eq!(lookup("size").unwrap().symbol, "length");
        assert_eq!(lookup("exit").unwrap().symbol, "terminate");
        assert_eq!(by_symbol("readChar").unwrap().name, "readChar");
    }

    #[test]
    fn test_hidden_primitives_are_not_visible() {
        assert!(lookup(ALLOC_RECORD).is_none());
        assert!(lookup(ALLOC_ARRAY).is_none());
        assert!(lookup(STRING_COMPARE).is_none());
    }

    #[test]
    fn test_substring_signature() {
        let substring = lookup("substring").unwrap();
        assert_eq!(substring.params, &[Ty::String, Ty::Int, Ty::Int]);
        assert_eq!(substring.result, Ty::String);
    }
}
