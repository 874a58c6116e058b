//! End-to-end tests: compile syntax trees and run the code on the reference machine.

mod common;

use common::*;
use fool::ast::ProgramKind;
use fool::prelude::*;

fn top(execution: &Execution) -> i64 {
    *execution.stack.last().expect("empty stack at halt")
}

// ============================================================================
// Basic programs
// ============================================================================

#[test]
fn global_variable_plus_one() {
    // let var x:int = 5 in x + 1
    let mut program = Program::let_in(
        vec![],
        vec![var("x", TypeNode::Int, int(5))],
        bin(BinaryOp::Add, id("x"), int(1)),
    );
    let compiled = fool::compile(&mut program).unwrap();
    assert_eq!(compiled.program_type, Some(TypeNode::Int));
    assert_eq!(
        compiled.to_assembly(),
        "push 0\npush 5\nlfp\npush -2\nadd\nlw\npush 1\nadd\nhalt\n"
    );

    let execution = Machine::default().run(compiled.code.instructions()).unwrap();
    assert_eq!(execution.stack, vec![0, 5, 6]);
}

#[test]
fn print_leaves_its_value() {
    let execution = run(Program::body(print(bin(BinaryOp::Add, print(int(7)), int(1)))));
    assert_eq!(execution.output, vec![7, 8]);
    assert_eq!(execution.stack, vec![8]);
}

#[test]
fn arithmetic_operand_order() {
    let execution = run(Program::body(print(bin(
        BinaryOp::Sub,
        bin(BinaryOp::Div, int(20), int(4)),
        bin(BinaryOp::Mul, int(2), int(3)),
    ))));
    assert_eq!(execution.output, vec![-1]);
}

#[test]
fn comparison_and_logic_yield_zero_or_one() {
    let cases = [
        (bin(BinaryOp::Eq, int(3), int(3)), 1),
        (bin(BinaryOp::Eq, int(3), int(4)), 0),
        (bin(BinaryOp::Le, int(2), int(3)), 1),
        (bin(BinaryOp::Le, int(3), int(3)), 1),
        (bin(BinaryOp::Ge, int(2), int(3)), 0),
        (bin(BinaryOp::Ge, int(3), int(2)), 1),
        (bin(BinaryOp::And, boolean(true), boolean(false)), 0),
        (bin(BinaryOp::And, boolean(true), boolean(true)), 1),
        (bin(BinaryOp::Or, boolean(false), boolean(true)), 1),
        (bin(BinaryOp::Or, boolean(false), boolean(false)), 0),
        (Expr::not(boolean(false), 1), 1),
        (Expr::not(boolean(true), 1), 0),
    ];
    for (expr, expected) in cases {
        let rendered = format!("{expr:?}");
        let execution = run(Program::body(expr));
        assert_eq!(execution.stack, vec![expected], "{rendered}");
    }
}

#[test]
fn conditional_of_int_and_bool_is_int() {
    let mut program = Program::body(if_(boolean(true), int(1), boolean(false)));
    let compiled = fool::compile(&mut program).unwrap();
    assert_eq!(compiled.program_type, Some(TypeNode::Int));

    let execution = Machine::default().run(compiled.code.instructions()).unwrap();
    assert_eq!(execution.stack, vec![1]);

    let execution = run(Program::body(if_(boolean(false), int(1), int(2))));
    assert_eq!(execution.stack, vec![2]);
}

#[test]
fn bool_initializer_for_int_variable() {
    let mut program = Program::let_in(vec![], vec![var("y", TypeNode::Int, boolean(true))], id("y"));
    let compiled = fool::compile(&mut program).unwrap();
    assert!(compiled.diagnostics.is_empty());
    assert_eq!(compiled.program_type, Some(TypeNode::Int));
}

// ============================================================================
// Functions
// ============================================================================

#[test]
fn recursive_factorial() {
    // fun fact:int(n:int) = if n <= 1 then 1 else n * fact(n - 1)
    let body = if_(
        bin(BinaryOp::Le, id("n"), int(1)),
        int(1),
        bin(
            BinaryOp::Mul,
            id("n"),
            call("fact", vec![bin(BinaryOp::Sub, id("n"), int(1))]),
        ),
    );
    let program = Program::let_in(
        vec![],
        vec![fun("fact", TypeNode::Int, vec![param("n", TypeNode::Int)], vec![], body)],
        print(call("fact", vec![int(5)])),
    );
    assert_eq!(run(program).output, vec![120]);
}

#[test]
fn nested_functions_follow_the_static_chain() {
    // var g = 100; fun outer(a) let fun inner(b) = a + b + g in inner(10)
    let inner = fun(
        "inner",
        TypeNode::Int,
        vec![param("b", TypeNode::Int)],
        vec![],
        bin(BinaryOp::Add, bin(BinaryOp::Add, id("a"), id("b")), id("g")),
    );
    let outer = fun(
        "outer",
        TypeNode::Int,
        vec![param("a", TypeNode::Int)],
        vec![inner],
        call("inner", vec![int(10)]),
    );
    let program = Program::let_in(
        vec![],
        vec![var("g", TypeNode::Int, int(100)), outer],
        call("outer", vec![int(1)]),
    );
    assert_eq!(top(&run(program)), 111);
}

#[test]
fn call_leaves_exactly_one_value() {
    // fun f(a, b) let var c = a in c - b
    let f = fun(
        "f",
        TypeNode::Int,
        vec![param("a", TypeNode::Int), param("b", TypeNode::Int)],
        vec![var("c", TypeNode::Int, id("a"))],
        bin(BinaryOp::Sub, id("c"), id("b")),
    );
    let execution = run(Program::let_in(vec![], vec![f], call("f", vec![int(9), int(2)])));
    // global slot, function address, result
    assert_eq!(execution.stack.len(), 3);
    assert_eq!(top(&execution), 7);
}

#[test]
fn function_identifier_cannot_be_passed() {
    // fun twice(h: (int) -> int, v:int) = h(h(v)); fun inc(n) = n + 1; twice(inc, 3)
    let twice = fun(
        "twice",
        TypeNode::Int,
        vec![
            param("h", TypeNode::arrow(vec![TypeNode::Int], TypeNode::Int)),
            param("v", TypeNode::Int),
        ],
        vec![],
        call("h", vec![call("h", vec![id("v")])]),
    );
    let inc = fun(
        "inc",
        TypeNode::Int,
        vec![param("n", TypeNode::Int)],
        vec![],
        bin(BinaryOp::Add, id("n"), int(1)),
    );
    let program = Program::let_in(
        vec![],
        vec![twice, inc],
        call("twice", vec![id("inc"), int(3)]),
    );
    assert_eq!(
        failure_messages(program),
        vec!["Wrong usage of function identifier inc at line 1"]
    );
}

// ============================================================================
// Objects
// ============================================================================

fn class_a() -> ClassDecl {
    class(
        "A",
        None,
        vec![field("x", TypeNode::Int)],
        vec![
            method("m", TypeNode::Int, vec![], id("x")),
            method("n", TypeNode::Int, vec![], int(10)),
        ],
    )
}

#[test]
fn method_reads_its_field() {
    // class A(x:int) method m:int = x;  var a:A = new A(3) in a.m()
    let mut program = Program::let_in(
        vec![class_a()],
        vec![var("a", class_ref("A"), Expr::new_object("A", vec![int(3)], 1))],
        Expr::method_call("a", "m", vec![], 1),
    );
    let compiled = fool::compile(&mut program).unwrap();
    assert_eq!(compiled.program_type, Some(TypeNode::Int));

    let execution = Machine::default().run(compiled.code.instructions()).unwrap();
    assert_eq!(top(&execution), 3);
}

#[test]
fn overriding_method_is_dispatched_dynamically() {
    // class B extends A method m:int = x + 1;  var b:A = new B(5) in b.n() + b.m()
    let b = class(
        "B",
        Some("A"),
        vec![],
        vec![method("m", TypeNode::Int, vec![], bin(BinaryOp::Add, id("x"), int(1)))],
    );
    let mut program = Program::let_in(
        vec![class_a(), b],
        vec![var("b", class_ref("A"), Expr::new_object("B", vec![int(5)], 1))],
        bin(
            BinaryOp::Add,
            Expr::method_call("b", "n", vec![], 1),
            Expr::method_call("b", "m", vec![], 1),
        ),
    );
    let compiled = fool::compile(&mut program).unwrap();

    // B's table: overridden slot 0, inherited slot 1
    let ProgramKind::LetIn { classes, .. } = &program.kind else {
        unreachable!()
    };
    assert_eq!(classes[1].methods[0].offset, Some(0));
    let text = compiled.to_assembly();
    let b_table = "lhp\npush function2\nlhp\nsw\nlhp\npush 1\nadd\nshp\npush function1\n";
    assert!(text.contains(b_table), "{text}");

    let execution = Machine::default().run(compiled.code.instructions()).unwrap();
    assert_eq!(top(&execution), 16);
}

#[test]
fn methods_with_parameters_and_sibling_calls() {
    let counter = class(
        "Counter",
        None,
        vec![field("base", TypeNode::Int)],
        vec![
            method("get", TypeNode::Int, vec![], id("base")),
            method(
                "plus",
                TypeNode::Int,
                vec![param("k", TypeNode::Int)],
                bin(BinaryOp::Add, call("get", vec![]), id("k")),
            ),
            method(
                "twice",
                TypeNode::Int,
                vec![],
                bin(BinaryOp::Add, call("get", vec![]), call("plus", vec![int(1)])),
            ),
        ],
    );
    let program = Program::let_in(
        vec![counter],
        vec![var("c", class_ref("Counter"), Expr::new_object("Counter", vec![int(4)], 1))],
        print(bin(
            BinaryOp::Mul,
            Expr::method_call("c", "plus", vec![int(6)], 1),
            Expr::method_call("c", "twice", vec![], 1),
        )),
    );
    // (4 + 6) * (4 + (4 + 1))
    assert_eq!(run(program).output, vec![90]);
}

#[test]
fn method_creates_objects_of_its_own_class() {
    // class P(v:int) method next:P = new P(v + 1); method get:int = v
    let p = class(
        "P",
        None,
        vec![field("v", TypeNode::Int)],
        vec![
            method(
                "next",
                class_ref("P"),
                vec![],
                Expr::new_object("P", vec![bin(BinaryOp::Add, id("v"), int(1))], 1),
            ),
            method("get", TypeNode::Int, vec![], id("v")),
        ],
    );
    let program = || {
        Program::let_in(
            vec![p.clone()],
            vec![
                var("a", class_ref("P"), Expr::new_object("P", vec![int(1)], 1)),
                var("b", class_ref("P"), Expr::method_call("a", "next", vec![], 1)),
                var("c", class_ref("P"), Expr::method_call("b", "next", vec![], 1)),
            ],
            Expr::method_call("c", "get", vec![], 1),
        )
    };
    assert_eq!(top(&run(program())), 3);

    // the global frame address follows the configured memory size
    let mut small = program();
    let compiled = Compiler::new(CompilerOptions::default().with_memory_size(512))
        .compile(&mut small)
        .unwrap();
    assert!(compiled.to_assembly().contains("push 512\n"));
    let execution = Machine::new(512).run(compiled.code.instructions()).unwrap();
    assert_eq!(top(&execution), 3);
}

#[test]
fn method_calls_into_a_class_declared_later() {
    // class A(b:B) method m:int = b.get(); class B() method get:int = 7
    let a = class(
        "A",
        None,
        vec![field("b", class_ref("B"))],
        vec![method("m", TypeNode::Int, vec![], Expr::method_call("b", "get", vec![], 1))],
    );
    let b = class("B", None, vec![], vec![method("get", TypeNode::Int, vec![], int(7))]);
    let program = Program::let_in(
        vec![a, b],
        vec![var(
            "a",
            class_ref("A"),
            Expr::new_object("A", vec![Expr::new_object("B", vec![], 1)], 1),
        )],
        Expr::method_call("a", "m", vec![], 1),
    );
    assert_eq!(top(&run(program)), 7);
}

#[test]
fn objects_with_several_fields() {
    let pair = class(
        "Pair",
        None,
        vec![field("l", TypeNode::Int), field("r", TypeNode::Int)],
        vec![method("diff", TypeNode::Int, vec![], bin(BinaryOp::Sub, id("l"), id("r")))],
    );
    let program = Program::let_in(
        vec![pair],
        vec![var("p", class_ref("Pair"), Expr::new_object("Pair", vec![int(10), int(3)], 1))],
        Expr::method_call("p", "diff", vec![], 1),
    );
    assert_eq!(top(&run(program)), 7);
}

#[test]
fn null_references_compare_equal() {
    let program = Program::let_in(
        vec![class_a()],
        vec![var("a", class_ref("A"), Expr::null(1))],
        bin(BinaryOp::Eq, id("a"), Expr::null(1)),
    );
    assert_eq!(top(&run(program)), 1);
}

#[test]
fn object_passed_to_function() {
    let f = fun(
        "f",
        TypeNode::Int,
        vec![param("o", class_ref("A"))],
        vec![],
        Expr::method_call("o", "m", vec![], 1),
    );
    let program = Program::let_in(
        vec![class_a()],
        vec![f, var("a", class_ref("A"), Expr::new_object("A", vec![int(42)], 1))],
        call("f", vec![id("a")]),
    );
    assert_eq!(top(&run(program)), 42);
}
