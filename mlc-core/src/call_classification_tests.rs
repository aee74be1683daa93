#![cfg(test)]

use crate::call_classification::{CallStats, classify_calls};
use crate::error::{CompilerError, InvariantFault};
use crate::mir::{Block, CallKind, FunVal, Function, Insn, Program, Val};
use crate::span::Span;
use crate::ClosuresExtracted;

fn names(ns: &[&str]) -> Vec<String> {
    ns.iter().map(|s| s.to_string()).collect()
}

fn call(ident: &str, callee: &str) -> Insn {
    Insn::generated(ident, Val::app(callee, names(&["a"])))
}

fn external_call(ident: &str, callee: &str) -> Insn {
    Insn::generated(ident, Val::external_app(callee, names(&["a"])))
}

fn branch(ident: &str, then_insns: Vec<Insn>, else_insns: Vec<Insn>) -> Insn {
    Insn::generated(
        ident,
        Val::If {
            cond: "c".to_string(),
            then_block: Block::from_insns(then_insns),
            else_block: Block::from_insns(else_insns),
        },
    )
}

/// Closures = {"clo1"}, functions = {"f", "g"}, with the given bodies.
fn program(f_body: Vec<Insn>, g_body: Vec<Insn>, entry: Vec<Insn>) -> Program {
    let mut program = Program::new(Block::from_insns(entry));
    program.add_function(Function::new("f", names(&["a"]), Block::from_insns(f_body)));
    program.add_function(Function::new("g", names(&["a"]), Block::from_insns(g_body)));
    program.add_closure("clo1", names(&["x"]));
    program
}

/// Find the kind of the call bound to `ident`, searching nested blocks.
fn kind_of(block: &Block, ident: &str) -> Option<CallKind> {
    block.iter().find_map(|insn| match &insn.val {
        Val::App { kind, .. } if insn.ident == ident => Some(*kind),
        Val::If {
            then_block,
            else_block,
            ..
        } => kind_of(then_block, ident).or_else(|| kind_of(else_block, ident)),
        _ => None,
    })
}

fn kind_in(program: &Program, owner: Option<&str>, ident: &str) -> CallKind {
    let block = match owner {
        Some(name) => &program.function(name).unwrap().body,
        None => &program.entry,
    };
    kind_of(block, ident).unwrap_or_else(|| panic!("no call bound to {}", ident))
}

fn collect_kinds(block: &Block, out: &mut Vec<CallKind>) {
    for insn in block {
        match &insn.val {
            Val::App { kind, .. } => out.push(*kind),
            Val::If {
                then_block,
                else_block,
                ..
            } => {
                collect_kinds(then_block, out);
                collect_kinds(else_block, out);
            }
            _ => {}
        }
    }
}

fn all_kinds(program: &Program) -> Vec<CallKind> {
    let mut kinds = Vec::new();
    for fun in program.toplevel.values() {
        collect_kinds(&fun.body, &mut kinds);
    }
    collect_kinds(&program.entry, &mut kinds);
    kinds
}

fn is_recursive(program: &Program, name: &str) -> bool {
    program.function(name).unwrap().is_recursive
}

#[test]
fn test_call_to_closure_becomes_closure_call() {
    let mut prog = program(vec![], vec![call("$k1", "clo1")], vec![]);
    classify_calls(&mut prog).unwrap();
    assert_eq!(kind_in(&prog, Some("g"), "$k1"), CallKind::Closure);
}

#[test]
fn test_call_to_function_is_known() {
    let mut prog = program(vec![], vec![call("$k1", "f")], vec![]);
    classify_calls(&mut prog).unwrap();
    assert_eq!(kind_in(&prog, Some("g"), "$k1"), CallKind::Known);
    assert!(!is_recursive(&prog, "g"));
    assert!(!is_recursive(&prog, "f"));
}

#[test]
fn test_unknown_callee_defaults_to_closure_call() {
    let mut prog = program(vec![], vec![call("$k1", "h")], vec![]);
    classify_calls(&mut prog).unwrap();
    assert_eq!(kind_in(&prog, Some("g"), "$k1"), CallKind::Closure);
}

#[test]
fn test_self_call_marks_function_recursive() {
    let mut prog = program(vec![call("$k1", "f")], vec![], vec![]);
    classify_calls(&mut prog).unwrap();
    assert!(is_recursive(&prog, "f"));
    assert!(!is_recursive(&prog, "g"));
    assert_eq!(kind_in(&prog, Some("f"), "$k1"), CallKind::Known);
}

#[test]
fn test_external_call_is_never_rewritten() {
    let mut prog = program(
        vec![external_call("$k1", "clo1"), external_call("$k2", "g"), external_call("$k3", "print_int")],
        vec![],
        vec![external_call("$k4", "clo1")],
    );
    classify_calls(&mut prog).unwrap();
    assert_eq!(kind_in(&prog, Some("f"), "$k1"), CallKind::External);
    assert_eq!(kind_in(&prog, Some("f"), "$k2"), CallKind::External);
    assert_eq!(kind_in(&prog, Some("f"), "$k3"), CallKind::External);
    assert_eq!(kind_in(&prog, None, "$k4"), CallKind::External);
}

#[test]
fn test_external_self_call_still_marks_recursive() {
    let mut prog = program(vec![external_call("$k1", "f")], vec![], vec![]);
    classify_calls(&mut prog).unwrap();
    assert!(is_recursive(&prog, "f"));
    assert_eq!(kind_in(&prog, Some("f"), "$k1"), CallKind::External);
}

#[test]
fn test_entry_block_calls_are_classified_without_marking_recursion() {
    let mut prog = program(
        vec![],
        vec![],
        vec![call("$k1", "clo1"), call("$k2", "f"), call("$k3", "g"), call("$k4", "local_fn")],
    );
    classify_calls(&mut prog).unwrap();
    assert_eq!(kind_in(&prog, None, "$k1"), CallKind::Closure);
    assert_eq!(kind_in(&prog, None, "$k2"), CallKind::Known);
    assert_eq!(kind_in(&prog, None, "$k3"), CallKind::Known);
    assert_eq!(kind_in(&prog, None, "$k4"), CallKind::Closure);
    assert!(!is_recursive(&prog, "f"));
    assert!(!is_recursive(&prog, "g"));
}

#[test]
fn test_closure_table_takes_priority_over_function_table() {
    // A recursive closure is both in the function table and the closure table.
    let mut prog = program(vec![], vec![call("$k1", "clo1")], vec![]);
    prog.add_function(Function::new("clo1", names(&["a"]), Block::from_insns(vec![call("$k2", "clo1")])));
    classify_calls(&mut prog).unwrap();
    assert_eq!(kind_in(&prog, Some("g"), "$k1"), CallKind::Closure);
    assert_eq!(kind_in(&prog, Some("clo1"), "$k2"), CallKind::Closure);
    assert!(is_recursive(&prog, "clo1"));
}

#[test]
fn test_calls_in_nested_branches_are_classified() {
    let nested = branch(
        "$k5",
        vec![call("$k1", "clo1"), branch("$k6", vec![call("$k2", "h")], vec![call("$k3", "f")])],
        vec![external_call("$k4", "print_int")],
    );
    let mut prog = program(vec![], vec![nested], vec![]);
    classify_calls(&mut prog).unwrap();
    assert_eq!(kind_in(&prog, Some("g"), "$k1"), CallKind::Closure);
    assert_eq!(kind_in(&prog, Some("g"), "$k2"), CallKind::Closure);
    assert_eq!(kind_in(&prog, Some("g"), "$k3"), CallKind::Known);
    assert_eq!(kind_in(&prog, Some("g"), "$k4"), CallKind::External);
}

#[test]
fn test_recursion_detected_in_deeply_nested_branch() {
    let inner = branch("$k3", vec![Insn::generated("$k1", Val::Int(0))], vec![call("$k2", "g")]);
    let outer = branch("$k4", vec![Insn::generated("$k0", Val::Unit)], vec![inner]);
    let mut prog = program(vec![], vec![outer], vec![]);
    classify_calls(&mut prog).unwrap();
    assert!(is_recursive(&prog, "g"));
    assert!(!is_recursive(&prog, "f"));
}

#[test]
fn test_call_to_other_function_does_not_mark_recursion() {
    let mut prog = program(vec![call("$k1", "g")], vec![call("$k2", "f")], vec![]);
    classify_calls(&mut prog).unwrap();
    // Mutual recursion is not self-recursion.
    assert!(!is_recursive(&prog, "f"));
    assert!(!is_recursive(&prog, "g"));
}

#[test]
fn test_no_call_left_unclassified() {
    let mut prog = program(
        vec![call("$k1", "f"), branch("$k2", vec![call("$k3", "x")], vec![call("$k4", "clo1")])],
        vec![external_call("$k5", "print_int"), call("$k6", "f")],
        vec![call("$k7", "g"), call("$k8", "y")],
    );
    assert!(all_kinds(&prog).contains(&CallKind::Unclassified));
    classify_calls(&mut prog).unwrap();
    let kinds = all_kinds(&prog);
    assert_eq!(kinds.len(), 7);
    assert!(!kinds.contains(&CallKind::Unclassified));
}

#[test]
fn test_inert_instructions_pass_through() {
    let body = vec![
        Insn::generated("$k1", Val::Int(1)),
        Insn::generated(
            "$k2",
            Val::MakeCls {
                vars: names(&["$k1"]),
                fun: "clo1".to_string(),
            },
        ),
        Insn::generated("$k3", Val::Tuple(names(&["$k1", "$k2"]))),
        Insn::generated("$k4", Val::Ref("f".to_string())),
        Insn::generated("$k5", Val::ArrLen("arr".to_string())),
    ];
    let mut prog = program(vec![], body, vec![]);
    let before = prog.to_string();
    let stats = classify_calls(&mut prog).unwrap();
    assert_eq!(prog.to_string(), before);
    assert_eq!(stats, CallStats::default());
}

#[test]
fn test_function_literal_in_body_is_internal_fault() {
    let literal = Insn::new(
        "$k2",
        Val::Fun(FunVal {
            params: names(&["y"]),
            body: Block::new(),
        }),
        Span::new(3, 5, 3, 20),
    );
    let mut prog = program(vec![], vec![call("$k1", "f"), literal], vec![]);
    let err = classify_calls(&mut prog).unwrap_err();
    assert!(err.is_internal());
    match err {
        CompilerError::Internal(InvariantFault::FunctionInBlock { ident, owner, span }) => {
            assert_eq!(ident, "$k2");
            assert_eq!(owner.as_deref(), Some("g"));
            assert_eq!(span, Span::new(3, 5, 3, 20));
        }
        other => panic!("Expected FunctionInBlock, got {:?}", other),
    }
    // The body is still attached to its function after the fault.
    assert_eq!(prog.function("g").unwrap().body.len(), 2);
}

#[test]
fn test_function_literal_in_nested_entry_branch_is_internal_fault() {
    let literal = Insn::generated(
        "$k3",
        Val::Fun(FunVal {
            params: vec![],
            body: Block::new(),
        }),
    );
    let mut prog = program(vec![], vec![], vec![branch("$k1", vec![], vec![literal])]);
    let err = classify_calls(&mut prog).unwrap_err();
    assert!(err.is_internal());
    assert!(err.to_string().starts_with("internal compiler error:"));
    assert!(err.to_string().contains("the entry block"));
}

#[test]
fn test_classification_is_idempotent() {
    let mut prog = program(
        vec![call("$k1", "f"), call("$k2", "clo1")],
        vec![call("$k3", "h"), external_call("$k4", "g")],
        vec![call("$k5", "g")],
    );
    let first = classify_calls(&mut prog).unwrap();
    let once = prog.to_string();
    let second = classify_calls(&mut prog).unwrap();
    assert_eq!(prog.to_string(), once);
    assert_eq!(first, second);
}

#[test]
fn test_stats() {
    let mut prog = program(
        vec![call("$k1", "f"), call("$k2", "clo1")],
        vec![call("$k3", "h"), external_call("$k4", "print_int")],
        vec![call("$k5", "g")],
    );
    let stats = classify_calls(&mut prog).unwrap();
    assert_eq!(
        stats,
        CallStats {
            known: 2,
            closure: 2,
            external: 1,
            recursive_functions: 1,
        }
    );
}

#[test]
fn test_typestate_stage() {
    let prog = program(vec![call("$k1", "f")], vec![], vec![call("$k2", "clo1")]);
    let classified = ClosuresExtracted::new(prog).classify_calls().unwrap();
    assert!(is_recursive(&classified.mir, "f"));
    assert_eq!(kind_in(&classified.mir, None, "$k2"), CallKind::Closure);
    assert!(classified.mir.to_string().contains("fun f(a) rec {"));
}
