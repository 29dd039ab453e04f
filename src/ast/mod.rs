/// AST (Abstract Syntax Tree) module
/// Contains all definitions related to the AST structure
///
/// Submodules:
/// - ast: Node families (`Var`, `Exp`, `Dec`, `TypeExp`) as closed enums
/// - display: Indented tree rendering used by tooling
pub mod ast;
pub mod display;
