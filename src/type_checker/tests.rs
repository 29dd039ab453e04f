use std::rc::Rc;

use indoc::indoc;
use pretty_assertions::assert_eq;

use crate::{
    ast::ast::Exp, errors::errors::Error, lexer::lexer::tokenize, parser::parser::parse,
    Position,
};

use super::{
    frame::{static_link_hops, FrameLayout},
    symbol_table::SymbolTable,
    type_checker::{type_check, TypeChecker},
    types::{Ty, TypeRegistry},
};

fn parse_source(source: &str) -> Exp {
    let tokens = tokenize(source.to_string(), Some("test.tig".to_string())).unwrap();
    let (_, result) = parse(tokens, Rc::new("test.tig".to_string()));
    result.unwrap()
}

fn check(source: &str) -> (TypeChecker, Vec<Error>, Exp) {
    let ast = parse_source(source);
    let (checker, errors) = type_check(&ast);
    (checker, errors, ast)
}

fn error_names(source: &str) -> Vec<String> {
    let (_, errors, _) = check(source);
    errors
        .iter()
        .map(|error| error.get_error_name().to_string())
        .collect()
}

#[test]
fn test_symbol_table_scopes() {
    let mut table: SymbolTable<i32> = SymbolTable::new();
    table.define("a", 1);
    table.enter();
    assert!(!table.defined_in_current_scope("a"));
    table.define("a", 2);
    assert_eq!(table.lookup("a"), Some(&2));
    assert!(table.defined_in_current_scope("a"));
    table.exit();
    assert_eq!(table.lookup("a"), Some(&1));
    assert_eq!(table.lookup("b"), None);
}

#[test]
fn test_symbol_table_define_overwrites_current_scope_only() {
    let mut table: SymbolTable<&str> = SymbolTable::new();
    table.define("x", "outer");
    table.enter();
    assert_eq!(table.define("x", "first"), None);
    assert_eq!(table.define("x", "second"), Some("first"));
    *table.lookup_mut("x").unwrap() = "third";
    table.exit();
    assert_eq!(table.lookup("x"), Some(&"outer"));
}

#[test]
fn test_symbol_table_reset() {
    let mut table: SymbolTable<i32> = SymbolTable::new();
    table.define("a", 1);
    table.enter();
    table.enter();
    assert_eq!(table.depth(), 3);

    table.reset();
    assert_eq!(table.depth(), 1);
    assert_eq!(table.lookup("a"), None);

    // The root scope survives an unbalanced exit.
    table.exit();
    assert_eq!(table.depth(), 1);
}

#[test]
fn test_type_compatibility() {
    let mut registry = TypeRegistry::new();
    let tree = registry.new_record("tree");
    let other = registry.new_record("tree");
    let ints = registry.new_array("ints", Ty::Int);

    assert!(registry.compatible(tree, Ty::Nil));
    assert!(registry.compatible(Ty::Nil, tree));
    assert!(!registry.compatible(Ty::Nil, Ty::Nil));
    assert!(!registry.compatible(tree, other));
    assert!(!registry.compatible(ints, Ty::Nil));
    assert!(!registry.compatible(Ty::Int, Ty::String));
    assert!(registry.compatible(Ty::Error, Ty::String));
    assert!(registry.compatible(ints, Ty::Error));

    // Identity differs, layout does not.
    assert!(registry.same_layout(tree, other));
    assert_eq!(registry.type_name(other), "tree");
    assert_eq!(registry.type_name(ints), "ints");
}

#[test]
fn test_frame_layout_levels() {
    let mut frames = FrameLayout::new();
    let a = frames.allocate(Ty::Int);
    assert_eq!((a.frame, a.level, a.offset, a.field_index()), (0, 0, 0, 1));

    let f = frames.declare("f.1");
    frames.enter(f);
    let b = frames.allocate(Ty::String);
    let c = frames.allocate(Ty::Int);
    assert_eq!(frames.current_level(), 1);
    assert_eq!((b.frame, b.level, b.offset), (f, 1, 0));
    assert_eq!(c.offset, 1);

    let g = frames.declare("g.2");
    assert_eq!(frames.frame(g).unwrap().level, 2);
    assert_eq!(frames.frame(g).unwrap().parent, Some(f));

    frames.exit();
    assert!(frames.frame(f).unwrap().finalized);
    assert_eq!(frames.current_level(), 0);
    assert_eq!(static_link_hops(3, 1), 2);
}

#[test]
fn test_well_typed_program_has_no_errors() {
    let (checker, errors, _) = check(indoc! {r#"
        let
          type point = { x: int, y: int }
          type points = array of point
          var p := point { x = 1, y = 2 }
          var ps := points [10] of nil
          function norm(p: point) : int = p.x * p.x + p.y * p.y
          function show(s: string) = (print(s); print("\n"))
        in
          ps[0] := p;
          for i := 0 to 9 do
            if ps[i] <> nil then printInt(norm(ps[i]));
          while 1 do break;
          show(concat("a", "b"));
          if "a" < "b" then 1 else 0
        end
    "#});

    assert_eq!(errors.len(), 0, "{:?}", errors);
    assert!(checker
        .annotations
        .exp_types
        .values()
        .all(|ty| !ty.is_error()));
}

#[test]
fn test_simple_let_is_int() {
    let (checker, errors, ast) = check("let var a := 5 in a + 1 end");
    assert!(errors.is_empty());
    assert_eq!(checker.annotations.exp_type(ast.id), Ty::Int);
    assert_eq!(checker.frames.frame(0).unwrap().slots, vec![Ty::Int]);
}

#[test]
fn test_alias_cycle_is_reported_once() {
    assert_eq!(
        error_names("let type a = b type b = a in 0 end"),
        vec!["CyclicTypeDefinition"]
    );
    assert_eq!(
        error_names("let type a = b type b = c type c = a var x : a := 0 in 0 end"),
        vec!["CyclicTypeDefinition"]
    );
    assert_eq!(
        error_names("let type a = a in 0 end"),
        vec!["CyclicTypeDefinition"]
    );
}

#[test]
fn test_recursive_records_resolve() {
    let (checker, errors, _) = check(indoc! {"
        let
          type tree = { left: tree, value: int, right: tree }
          type forest = { head: tree, tail: forest }
          type treelist = { t: node, next: treelist }
          type node = { children: treelist }
          type alias = tree
          var t : alias := tree { left = nil, value = 1, right = nil }
        in
          t.left := t
        end
    "});
    assert!(errors.is_empty(), "{:?}", errors);

    let tree = checker.registry.records().find(|(_, r)| r.name == "tree").unwrap();
    assert!(tree.1.complete);
    assert_eq!(tree.1.fields[0].1, Ty::Record(tree.0));
}

#[test]
fn test_alias_through_record_resolves() {
    let (_, errors, _) = check(indoc! {"
        let
          type list = intlist
          type intlist = { head: int, tail: list }
          type arr = array of rec
          type rec = { items: arr }
          var l : list := intlist { head = 1, tail = nil }
        in
          l.tail.head
        end
    "});
    assert!(errors.is_empty(), "{:?}", errors);
}

#[test]
fn test_resolution_is_stable() {
    let mut checker = TypeChecker::new();
    checker.scoped(|checker| {
        let dec = parse_source("let type t = { a: int } type u = array of t in 0 end");
        let crate::ast::ast::ExpKind::Let { decs, .. } = dec.kind else {
            panic!("expected let");
        };
        checker.check_decs(&decs);

        let first = checker.lookup_type("t", &Position::null());
        let second = checker.lookup_type("t", &Position::null());
        assert_eq!(first, second);
        assert_eq!(
            checker.lookup_type("u", &Position::null()),
            checker.lookup_type("u", &Position::null())
        );
        assert!(first.is_record());
    });
    assert!(!checker.had_error());
}

#[test]
fn test_nil_assignment() {
    let program = |ty: &str, init: &str| {
        format!(
            "let type rec = {{ a: int }} type arr = array of int var v : {} := {} in v := nil end",
            ty, init
        )
    };

    assert!(error_names(&program("rec", "rec { a = 1 }")).is_empty());
    assert_eq!(error_names(&program("int", "1")), vec!["TypeMismatch"]);
    assert_eq!(error_names(&program("string", "\"s\"")), vec!["TypeMismatch"]);
    assert_eq!(error_names(&program("arr", "arr [1] of 0")), vec!["TypeMismatch"]);
}

#[test]
fn test_nil_comparisons() {
    assert_eq!(error_names("nil = nil"), vec!["TypeMismatch"]);
    assert_eq!(error_names("nil <> nil"), vec!["TypeMismatch"]);
    assert!(error_names("let type r = { a: int } var x : r := nil in x = nil end").is_empty());
}

#[test]
fn test_unannotated_nil_and_void_vars() {
    assert_eq!(error_names("let var x := nil in 0 end"), vec!["TypeMismatch"]);
    assert_eq!(error_names("let var x := () in 0 end"), vec!["TypeMismatch"]);
}

#[test]
fn test_function_redefinition() {
    assert_eq!(
        error_names("let function f() = () function f() = () in f() end"),
        vec!["RedefinitionError"]
    );
    assert!(error_names(indoc! {"
        let function f() : int = 1
        in let function f() : string = \"shadow\" in f() end end
    "})
    .is_empty());
}

#[test]
fn test_variable_and_type_redefinition() {
    assert_eq!(
        error_names("let var a := 1 var a := 2 in a end"),
        vec!["RedefinitionError"]
    );
    assert_eq!(
        error_names("let type t = int type t = string in 0 end"),
        vec!["RedefinitionError"]
    );
    assert_eq!(
        error_names("let function f(a: int, a: int) = () in f(1, 2) end"),
        vec!["RedefinitionError"]
    );
    assert!(error_names("let var a := 1 in let var a := \"s\" in a end end").is_empty());
}

#[test]
fn test_namespaces_do_not_collide() {
    assert!(error_names(indoc! {"
        let
          type a = int
          var a : a := 1
          function a(a: a) : a = a
        in
          a(a)
        end
    "})
    .is_empty());
}

#[test]
fn test_static_link_hops() {
    let (checker, errors, _) = check(indoc! {"
        let
          function f1() : int =
            let
              var x := 1
              function f2() : int =
                let function f3() : int = x
                in f3() end
            in f2() end
        in
          f1()
        end
    "});
    assert!(errors.is_empty(), "{:?}", errors);

    let reference = checker
        .annotations
        .var_refs
        .values()
        .find(|reference| reference.slot.level == 1)
        .unwrap();
    assert_eq!(reference.use_level, 3);
    assert_eq!(reference.hops(), 2);
}

#[test]
fn test_function_levels() {
    let (checker, _, _) = check(indoc! {"
        let
          function outer() : int =
            let function inner(a: int, b: string) : int = a
            in inner(1, \"x\") end
        in
          outer()
        end
    "});

    let functions = &checker.annotations.functions;
    assert_eq!(functions.len(), 2);
    assert_eq!(functions[0].name, "outer");
    assert_eq!(functions[0].level, 1);
    assert_eq!(functions[1].level, 2);
    assert_eq!(functions[1].params, vec![Ty::Int, Ty::String]);
    assert!(functions[0].symbol.starts_with("outer."));

    let inner_frame = checker.frames.frame(functions[1].frame).unwrap();
    assert_eq!(inner_frame.slots, vec![Ty::Int, Ty::String]);
    assert_eq!(inner_frame.parent, Some(functions[0].frame));
    assert!(inner_frame.finalized);
}

#[test]
fn test_then_only_if_must_be_void() {
    assert_eq!(error_names("if 1 then 2"), vec!["TypeMismatch"]);
    assert!(error_names("if 1 then ()").is_empty());
    assert_eq!(error_names("if \"s\" then 1 else 2"), vec!["TypeMismatch"]);
    assert_eq!(error_names("if 1 then 1 else \"s\""), vec!["TypeMismatch"]);
}

#[test]
fn test_if_branch_with_nil() {
    let (checker, errors, ast) =
        check("let type r = { a: int } var x : r := nil in if 1 then nil else x end");
    assert!(errors.is_empty());
    assert!(checker.annotations.exp_type(ast.id).is_record());
}

#[test]
fn test_call_checks() {
    assert_eq!(
        error_names("let function f(a: int, b: int) : int = a in f(1) end"),
        vec!["ArityMismatch"]
    );
    assert_eq!(error_names("print(1)"), vec!["TypeMismatch"]);
    assert_eq!(error_names("undefined()"), vec!["UndefinedName"]);
    assert!(error_names("printi(size(\"abc\"))").is_empty());
}

#[test]
fn test_mutually_recursive_functions() {
    assert!(error_names(indoc! {"
        let
          function even(n: int) : int = if n = 0 then 1 else odd(n - 1)
          function odd(n: int) : int = if n = 0 then 0 else even(n - 1)
        in
          even(10)
        end
    "})
    .is_empty());
}

#[test]
fn test_operator_rules() {
    assert!(error_names("\"a\" <= \"b\"").is_empty());
    assert_eq!(error_names("1 < \"b\""), vec!["TypeMismatch"]);
    assert_eq!(
        error_names("let type r = { a: int } var x := r { a = 1 } in x < x end"),
        vec!["TypeMismatch"]
    );
    assert_eq!(error_names("1 + \"b\""), vec!["TypeMismatch"]);
    assert_eq!(error_names("1 = \"b\""), vec!["TypeMismatch"]);
}

#[test]
fn test_loops() {
    assert!(error_names("while 1 do ()").is_empty());
    assert_eq!(error_names("while 1 do 5"), vec!["TypeMismatch"]);
    assert_eq!(error_names("for i := 0 to \"x\" do ()"), vec!["TypeMismatch"]);
    assert_eq!(error_names("for i := 0 to 3 do i := 2"), vec!["KindError"]);
    assert_eq!(error_names("break"), vec!["KindError"]);
    assert_eq!(
        error_names("while 1 do let function f() = break in f() end"),
        vec!["KindError"]
    );
    // The loop variable is gone after the loop.
    assert_eq!(
        error_names("(for i := 0 to 3 do (); i)"),
        vec!["UndefinedName"]
    );
}

#[test]
fn test_records_and_arrays() {
    let header = "let type r = { a: int, b: string } type arr = array of int var x := 0 in";
    let errors = |body: &str| error_names(&format!("{} {} end", header, body));

    assert!(errors("r { a = 1, b = \"s\" }").is_empty());
    assert_eq!(errors("r { a = 1 }"), vec!["ArityMismatch"]);
    assert_eq!(errors("r { b = \"s\", a = 1 }"), vec!["KindError", "KindError"]);
    assert_eq!(errors("r { a = 1, c = 2 }"), vec!["UndefinedName"]);
    assert_eq!(errors("r { a = \"s\", b = \"s\" }"), vec!["TypeMismatch"]);
    assert_eq!(errors("arr [\"s\"] of 0"), vec!["TypeMismatch"]);
    assert_eq!(errors("arr [3] of \"s\""), vec!["TypeMismatch"]);
    assert_eq!(errors("r [3] of 0"), vec!["KindError"]);
    assert_eq!(errors("arr { }"), vec!["KindError"]);
    assert_eq!(errors("x[0]"), vec!["KindError"]);
    assert_eq!(errors("x.a"), vec!["KindError"]);
    assert_eq!(
        errors("let var y := r { a = 1, b = \"s\" } in y.c end"),
        vec!["UndefinedName"]
    );
    assert!(errors("let var y := arr [3] of 0 in y[1] + 1 end").is_empty());
}

#[test]
fn test_undefined_names() {
    assert_eq!(error_names("x"), vec!["UndefinedName"]);
    assert_eq!(
        error_names("let var x : missing := 1 in 0 end"),
        vec!["UndefinedName"]
    );
    assert_eq!(error_names("let type t = { a: missing } in 0 end"), vec!["UndefinedName"]);
}

#[test]
fn test_errors_do_not_cascade() {
    // One undefined variable, no follow-up mismatch from `+` or the annotation.
    assert_eq!(
        error_names("let var a : int := b + 1 in a end"),
        vec!["UndefinedName"]
    );
}

#[test]
fn test_scopes_are_balanced_after_checking() {
    let (checker, errors, _) = check(indoc! {"
        let
          function f(n: int) : int =
            let var m := n in for i := 0 to m do (); m end
        in
          let type t = int in f(1) end
        end
    "});

    assert!(errors.is_empty(), "{:?}", errors);
    assert_eq!(checker.types.depth(), 1);
    assert_eq!(checker.values.depth(), 1);
    assert_eq!(checker.functions.depth(), 1);
    assert!(checker.frames.frames().all(|(_, frame)| frame.finalized));
}
