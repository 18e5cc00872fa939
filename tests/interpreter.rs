mod common;

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use lox_interpreter as lox;

use lox::error::RuntimeError;
use lox::RunError;
use pretty_assertions::assert_eq;

/// Run `source` in a fresh session, returning what it printed.
fn output_of(source: &str) -> String {
    let (mut session, buffer) = common::session();

    if let Err(e) = session.run(source) {
        panic!("program failed: {:?}\noutput so far:\n{}", e, buffer.contents());
    }

    buffer.contents()
}

/// Run `source` expecting a runtime error; returns its rendering and the
/// output printed before it.
fn runtime_error_of(source: &str) -> (String, String) {
    let (mut session, buffer) = common::session();

    match session.run(source) {
        Err(RunError::Runtime(e)) => (e.to_string(), buffer.contents()),
        other => panic!("expected a runtime error, got {:?}", other),
    }
}

#[test]
fn arithmetic_and_number_display() {
    assert_eq!(
        output_of("print 1 + 2 * 3; print 10 / 4; print -0; print (1 + 2) * 3;"),
        "7\n2.5\n-0\n9\n"
    );
}

#[test]
fn string_concatenation() {
    assert_eq!(output_of("var a = \"lo\"; print \"hel\" + a;"), "hello\n");
}

#[test]
fn mixed_plus_is_a_type_error() {
    let (error, _) = runtime_error_of("print \"1\" + 1;");
    assert_eq!(error, "Operands must be two numbers or two strings.\n[line 1]");
}

#[test]
fn numeric_operators_reject_non_numbers() {
    let (error, _) = runtime_error_of("print 1 < \"2\";");
    assert_eq!(error, "Operands must be numbers.\n[line 1]");

    let (error, _) = runtime_error_of("\n\nprint -true;");
    assert_eq!(error, "Operand must be a number.\n[line 3]");
}

#[test]
fn division_by_zero() {
    let (error, output) = runtime_error_of("print 1;\nprint 1 / 0;\nprint 2;");

    assert_eq!(error, "Divide by zero is not valid.\n[line 2]");
    assert_eq!(output, "1\n");
}

#[test]
fn negative_zero_divisor_is_also_rejected() {
    let (error, _) = runtime_error_of("print 1 / -0;");
    assert_eq!(error, "Divide by zero is not valid.\n[line 1]");
}

#[test]
fn only_nil_and_false_are_falsey() {
    let source = r#"
        if (0) print "zero";
        if ("") print "empty";
        if (nil) print "nil"; else print "nil is falsey";
        if (false) print "false"; else print "false is falsey";
        print !nil;
    "#;

    assert_eq!(
        output_of(source),
        "zero\nempty\nnil is falsey\nfalse is falsey\ntrue\n"
    );
}

#[test]
fn equality_does_not_coerce() {
    assert_eq!(
        output_of("print 1 == \"1\"; print nil == nil; print nil == false; print \"a\" != \"a\";"),
        "false\ntrue\nfalse\nfalse\n"
    );
}

#[test]
fn logical_operators_return_operands_and_short_circuit() {
    assert_eq!(
        output_of("print nil or \"x\"; print 1 and 2; print false and undefined(); print 1 or undefined();"),
        "x\n2\nfalse\n1\n"
    );
}

#[test]
fn while_and_for_loops() {
    let source = r#"
        var i = 0;
        while (i < 3) { print i; i = i + 1; }
        for (var j = 0; j < 2; j = j + 1) print j * 10;
    "#;

    assert_eq!(output_of(source), "0\n1\n2\n0\n10\n");
}

#[test]
fn recursion() {
    let source = r#"
        fun fib(n) {
          if (n < 2) return n;
          return fib(n - 1) + fib(n - 2);
        }
        print fib(10);
    "#;

    assert_eq!(output_of(source), "55\n");
}

#[test]
fn closures_keep_their_own_counter() {
    let source = r#"
        fun makeCounter() {
          var i = 0;
          fun count() { i = i + 1; return i; }
          return count;
        }
        var a = makeCounter();
        var b = makeCounter();
        print a(); print a(); print b();
    "#;

    assert_eq!(output_of(source), "1\n2\n1\n");
}

#[test]
fn closures_bind_statically() {
    let source = r#"
        var a = "global";
        {
          fun show() { print a; }
          show();
          var a = "block";
          show();
        }
    "#;

    assert_eq!(output_of(source), "global\nglobal\n");
}

#[test]
fn shadowing_initializer_reads_outer_value() {
    assert_eq!(
        output_of("var a = 1; { var a = a + 1; print a; } print a;"),
        "2\n1\n"
    );
}

#[test]
fn classes_fields_and_methods() {
    let source = r#"
        class Bagel {
          eat() { return "Crunch crunch " + this.kind; }
        }
        var b = Bagel();
        b.kind = "sesame";
        print b.eat();
        var eat = b.eat;
        print eat();
        print b;
        print Bagel;
    "#;

    assert_eq!(
        output_of(source),
        "Crunch crunch sesame\nCrunch crunch sesame\nBagel instance\nBagel\n"
    );
}

#[test]
fn fields_shadow_methods() {
    let source = r#"
        class A { m() { return "method"; } }
        var a = A();
        a.m = "field";
        print a.m;
    "#;

    assert_eq!(output_of(source), "field\n");
}

#[test]
fn initializer_always_returns_the_instance() {
    let source = r#"
        class P {
          init(x) { this.x = x; return; }
        }
        var p = P(3);
        print p.x;
        print p.init(4) == p;
        print p.x;

        class Q { init() { return 1; } }
        print Q();
    "#;

    assert_eq!(output_of(source), "3\ntrue\n4\nQ instance\n");
}

#[test]
fn super_calls_reach_the_superclass_method() {
    let source = r#"
        class A { method() { return "A"; } }
        class B < A { method() { return super.method() + "B"; } }
        class C < B {}
        print B().method();
        print C().method();
    "#;

    assert_eq!(output_of(source), "AB\nAB\n");
}

#[test]
fn inherited_initializer_sets_arity() {
    let source = r#"
        class A { init(n) { this.n = n; } }
        class B < A {}
        print B(7).n;
    "#;

    assert_eq!(output_of(source), "7\n");

    let (error, _) = runtime_error_of("class A { init(n) {} }\nclass B < A {}\nB();");
    assert_eq!(error, "Expected 1 arguments but got 0.\n[line 3]");
}

#[test]
fn arity_mismatch() {
    let (error, _) = runtime_error_of("fun f() {}\nf(1);");
    assert_eq!(error, "Expected 0 arguments but got 1.\n[line 2]");
}

#[test]
fn calling_a_non_callable() {
    let (error, _) = runtime_error_of("\"not a function\"();");
    assert_eq!(error, "Can only call functions and classes.\n[line 1]");
}

#[test]
fn undefined_variable_and_property() {
    let (error, _) = runtime_error_of("print missing;");
    assert_eq!(error, "Undefined variable 'missing'.\n[line 1]");

    let (error, _) = runtime_error_of("class A {}\nprint A().nope;");
    assert_eq!(error, "Undefined property 'nope'.\n[line 2]");

    let (error, _) = runtime_error_of("missing = 1;");
    assert_eq!(error, "Undefined variable 'missing'.\n[line 1]");
}

#[test]
fn properties_need_instances() {
    let (error, _) = runtime_error_of("print 1.x;");
    assert_eq!(error, "Only instances have properties.\n[line 1]");

    let (error, _) = runtime_error_of("var s = \"str\";\ns.x = 1;");
    assert_eq!(error, "Only instances have fields.\n[line 2]");
}

#[test]
fn superclass_must_be_a_class() {
    let (error, _) = runtime_error_of("var NotAClass = 1;\nclass B < NotAClass {}");
    assert_eq!(error, "Superclass must be a class.\n[line 2]");
}

#[test]
fn callables_display_and_compare_by_identity() {
    let source = r#"
        fun f() {}
        print f;
        print clock;
        print f == f;
        class A {}
        print A() == A();
        var a = A();
        print a == a;
    "#;

    assert_eq!(
        output_of(source),
        "<fn f>\n<native fn>\ntrue\nfalse\ntrue\n"
    );
}

#[test]
fn clock_returns_seconds() {
    assert_eq!(output_of("print clock() > 1000000000;"), "true\n");
}

#[test]
fn static_errors_prevent_execution() {
    let (mut session, buffer) = common::session();

    match session.run("print 1;\nprint ;\nreturn 2;") {
        Err(e @ RunError::Static(_)) => {
            assert_eq!(e.exit_code(), 65);

            let RunError::Static(errors) = e else {
                unreachable!()
            };
            assert_eq!(errors.len(), 1);
            assert_eq!(
                errors[0].to_string(),
                "[line 2] Error at ';': Expect expression."
            );
        }
        other => panic!("expected static errors, got {:?}", other),
    }

    assert_eq!(buffer.contents(), "");
}

#[test]
fn resolve_errors_prevent_execution() {
    let (mut session, buffer) = common::session();

    let result = session.run("print 1;\n{ var a = a; }");
    assert!(matches!(result, Err(RunError::Static(ref errors)) if errors.len() == 1));
    assert_eq!(buffer.contents(), "");
}

#[test]
fn runtime_error_exit_code() {
    let (mut session, _) = common::session();

    let result = session.run("nil();");
    assert!(matches!(
        result,
        Err(RunError::Runtime(RuntimeError::NotCallable { line: 1 }))
    ));
    assert_eq!(result.map_err(|e| e.exit_code()), Err(70));
    assert_eq!(lox::session::EXIT_RUNTIME, 70);
    assert_eq!(lox::session::EXIT_STATIC, 65);
}

#[test]
fn session_state_persists_across_inputs() {
    let (mut session, buffer) = common::session();

    let inputs = [
        "var a = 1;",
        "fun get() { return a; }",
        "fun makeAdder(n) { fun add(x) { return x + n; } return add; }",
        "var add2 = makeAdder(2);",
        "a = 40;",
        "print add2(get());",
        "var a = a + 1;",
        "print a;",
    ];

    for input in inputs {
        if let Err(e) = session.run(input) {
            panic!("input {:?} failed: {:?}", input, e);
        }
    }

    assert_eq!(buffer.contents(), "42\n41\n");
}

#[test]
fn session_survives_runtime_errors() {
    let (mut session, buffer) = common::session();

    let setup = session.run("var x = \"outer\"; fun boom() { var x = 1; return x + nil; }");
    assert!(setup.is_ok());

    assert!(session.run("{ var y = 2; boom(); }").is_err());

    // The global frame is current again.
    assert!(session.run("print x;").is_ok());
    assert_eq!(buffer.contents(), "outer\n");
}

#[test]
fn compile_then_execute() {
    let (mut session, buffer) = common::session();

    let compiled = match session.compile("var n = 3; print n * n;") {
        Ok(compiled) => compiled,
        Err(errors) => panic!("compile failed: {:?}", errors),
    };

    assert_eq!(compiled.program.len(), 2);
    assert!(session.execute(&compiled).is_ok());
    assert_eq!(buffer.contents(), "9\n");
}

#[test]
fn evaluate_a_single_expression() {
    use lox::parser::Parser;
    use lox::scanner::scan_tokens;
    use lox::value::Value;

    let (tokens, _) = scan_tokens("(1 + 2) * 4 == 12");
    let expr = match Parser::new(tokens).parse_expression() {
        Ok(expr) => expr,
        Err(errors) => panic!("parse failed: {:?}", errors),
    };

    let (mut session, _) = common::session();
    let value = session.interpreter().evaluate(&expr);

    assert!(matches!(value, Ok(Value::Bool(true))));
}

#[test]
fn deep_recursion_completes() {
    let source = r#"
        fun depth(n) {
          if (n == 0) return 0;
          return depth(n - 1) + 1;
        }
        print depth(10000);
    "#;

    assert_eq!(output_of(source), "10000\n");
}

#[test]
fn runaway_recursion_is_a_runtime_error() {
    let (mut session, buffer) = common::session();
    session.interpreter().set_max_call_depth(200);

    let result = session.run("fun forever(n) {\n  return forever(n + 1);\n}\nforever(0);");
    match result {
        Err(RunError::Runtime(e)) => assert_eq!(e.to_string(), "Stack overflow.\n[line 2]"),
        other => panic!("expected a stack overflow, got {:?}", other),
    }

    // Depth bookkeeping unwinds with the error.
    assert!(session.run("fun one() { return 1; } print one();").is_ok());
    assert_eq!(buffer.contents(), "1\n");
}

/// Holds writes until `flush`, like `BufWriter`.
#[derive(Clone, Default)]
struct FlushOnly {
    pending: Rc<RefCell<Vec<u8>>>,
    flushed: common::SharedBuffer,
}

impl Write for FlushOnly {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.pending.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let bytes: Vec<u8> = std::mem::take(&mut *self.pending.borrow_mut());
        self.flushed.write_all(&bytes)
    }
}

#[test]
fn output_is_flushed_before_a_runtime_error_surfaces() {
    let writer = FlushOnly::default();
    let mut session = lox::Session::with_output(writer.clone());

    assert!(session.run("print \"kept\";\nprint nil + 1;").is_err());
    assert_eq!(writer.flushed.contents(), "kept\n");
}
