#[cfg(test)]
mod interpreter_tests {
    use ezflowscript_interpreter as ezflow;

    use ezflow::interpreter::Interpreter;
    use ezflow::parser::Parser;
    use ezflow::resolver::Resolver;
    use ezflow::scanner::Scanner;
    use ezflow::token::Token;

    /// Run the full pipeline over `source`, capturing `print` output.
    /// Returns the captured output and the runtime error, if any.
    fn run(source: &str) -> (String, Option<String>) {
        let tokens: Vec<Token> = Scanner::new(source.as_bytes())
            .collect::<Result<Vec<_>, _>>()
            .expect("scan error");

        let mut parser = Parser::new(&tokens);
        let (statements, errors) = parser.parse();
        assert!(errors.is_empty(), "unexpected parse errors: {:?}", errors);

        let mut interpreter = Interpreter::new();

        let mut resolver = Resolver::new(&mut interpreter);
        resolver.resolve(&statements);
        let diagnostics = resolver.into_diagnostics();
        assert!(
            diagnostics.is_empty(),
            "unexpected resolve diagnostics: {:?}",
            diagnostics
        );

        let mut output: Vec<u8> = Vec::new();
        let result = interpreter.interpret(&statements, &mut output);

        (
            String::from_utf8(output).expect("valid utf-8 output"),
            result.err().map(|e| e.to_string()),
        )
    }

    fn run_ok(source: &str) -> String {
        let (output, error) = run(source);

        assert!(error.is_none(), "unexpected runtime error: {:?}", error);

        output
    }

    // ── stringification ─────────────────────────────────────────────────

    #[test]
    fn test_print_stringification() {
        assert_eq!(
            run_ok("print nil; print 7; print 7.5; print true; print \"hi\";"),
            "nil\n7\n7.5\ntrue\nhi\n"
        );
    }

    #[test]
    fn test_string_concatenation() {
        assert_eq!(run_ok("print \"foo\" + \"bar\";"), "foobar\n");
    }

    #[test]
    fn test_division_follows_ieee754() {
        assert_eq!(run_ok("print 10 / 0;"), "inf\n");
    }

    // ── scoping and closures ────────────────────────────────────────────

    #[test]
    fn test_inner_initializer_reads_outer_binding() {
        assert_eq!(run_ok("var a = 1; { var a = a + 1; print a; }"), "2\n");
    }

    #[test]
    fn test_counter_closure_shares_state_across_calls() {
        let source = "\
fun makeCounter() {
  var i = 0;
  fun inc() {
    i = i + 1;
    return i;
  }
  return inc;
}
var c = makeCounter();
print c();
print c();";

        assert_eq!(run_ok(source), "1\n2\n");
    }

    #[test]
    fn test_closures_capture_the_environment_not_a_snapshot() {
        assert_eq!(
            run_ok("var g = 0; fun bump() { g = g + 1; } bump(); bump(); print g;"),
            "2\n"
        );
    }

    #[test]
    fn test_resolved_reference_ignores_later_shadowing() {
        // `show` resolved `a` before the block-local `a` existed, so both
        // calls read the global.
        let source = "\
var a = \"global\";
{
  fun show() {
    return a;
  }
  print show();
  var a = \"block\";
  print show();
}";

        assert_eq!(run_ok(source), "global\nglobal\n");
    }

    #[test]
    fn test_top_level_forward_reference_resolves_at_call_time() {
        let source = "\
fun callLater() {
  return later();
}
fun later() {
  return 7;
}
print callLater();";

        assert_eq!(run_ok(source), "7\n");
    }

    // ── control flow ────────────────────────────────────────────────────

    #[test]
    fn test_truthiness_rules() {
        let source = "\
if (0) print \"zero\";
if (\"\") print \"empty\";
if (nil) print \"nil\"; else print \"nil falsy\";
if (false) print \"false\"; else print \"false falsy\";";

        assert_eq!(run_ok(source), "zero\nempty\nnil falsy\nfalse falsy\n");
    }

    #[test]
    fn test_logical_operators_return_operand_values() {
        assert_eq!(
            run_ok("print \"hi\" or 2; print nil or \"yes\"; print nil and 2; print 1 and 2;"),
            "hi\nyes\nnil\n2\n"
        );
    }

    #[test]
    fn test_for_loop() {
        assert_eq!(
            run_ok("for (var i = 0; i < 3; i = i + 1) print i;"),
            "0\n1\n2\n"
        );
    }

    #[test]
    fn test_return_unwinds_out_of_a_loop() {
        let source = "\
fun f() {
  var i = 0;
  while (true) {
    i = i + 1;
    if (i == 3) return i;
  }
}
print f();";

        assert_eq!(run_ok(source), "3\n");
    }

    #[test]
    fn test_function_without_return_yields_nil() {
        assert_eq!(run_ok("fun f() {} print f();"), "nil\n");
    }

    // ── classes and inheritance ─────────────────────────────────────────

    #[test]
    fn test_fields_and_methods() {
        let source = "\
class Person {
  init(name) {
    this.name = name;
  }
  greet() {
    return \"Hello \" + this.name;
  }
}
print Person(\"World\").greet();";

        assert_eq!(run_ok(source), "Hello World\n");
    }

    #[test]
    fn test_super_call_reaches_overridden_method() {
        let source = "\
class A {
  greet() {
    return \"A\";
  }
}
class B < A {
  greet() {
    return super.greet() + \"B\";
  }
}
print B().greet();";

        assert_eq!(run_ok(source), "AB\n");
    }

    #[test]
    fn test_super_resolves_nearest_superclass_method() {
        // C's super starts the lookup at B, so B's override wins over A's.
        let source = "\
class A {
  m() {
    return \"A\";
  }
}
class B < A {
  m() {
    return \"B\";
  }
}
class C < B {
  m() {
    return super.m();
  }
}
print C().m();";

        assert_eq!(run_ok(source), "B\n");
    }

    #[test]
    fn test_inherited_method_without_override() {
        let source = "\
class A {
  m() {
    return \"from A\";
  }
}
class B < A {}
print B().m();";

        assert_eq!(run_ok(source), "from A\n");
    }

    #[test]
    fn test_calling_init_directly_returns_the_instance() {
        let source = "\
class C {
  init() {
    this.x = 1;
  }
}
var c = C();
print c.init() == c;";

        assert_eq!(run_ok(source), "true\n");
    }

    #[test]
    fn test_bound_method_keeps_its_receiver() {
        let source = "\
class A {
  m() {
    return this.x;
  }
}
var a = A();
a.x = 5;
var f = a.m;
print f();";

        assert_eq!(run_ok(source), "5\n");
    }

    #[test]
    fn test_instance_equality_is_identity() {
        let source = "\
class C {}
var a = C();
var b = a;
print a == b;
print a == C();";

        assert_eq!(run_ok(source), "true\nfalse\n");
    }

    #[test]
    fn test_class_and_instance_stringification() {
        assert_eq!(
            run_ok("class C {} print C; print C();"),
            "C\nC instance\n"
        );
    }

    #[test]
    fn test_nil_equality() {
        assert_eq!(run_ok("print nil == nil; print nil == false;"), "true\nfalse\n");
    }

    // ── native functions ────────────────────────────────────────────────

    #[test]
    fn test_clock_returns_seconds() {
        assert_eq!(run_ok("print clock() > 0;"), "true\n");
    }

    // ── runtime errors ──────────────────────────────────────────────────

    #[test]
    fn test_adding_number_and_string_is_an_error() {
        let (output, error) = run("print 1 + \"x\";");

        assert_eq!(output, "");
        let error = error.expect("runtime error");
        assert!(error.contains("Operands must be two numbers or two strings"));
        assert!(error.contains("[line 1]"));
    }

    #[test]
    fn test_runtime_error_aborts_remaining_statements() {
        let (output, error) = run("print 1; print 2 * nil; print 3;");

        assert_eq!(output, "1\n");
        assert!(error.expect("runtime error").contains("Operands must be numbers"));
    }

    #[test]
    fn test_arity_mismatch() {
        let (output, error) = run("fun f(a, b) { return a; } print f(1);");

        assert_eq!(output, "");
        assert!(error
            .expect("runtime error")
            .contains("Expected 2 arguments but got 1."));
    }

    #[test]
    fn test_calling_a_non_callable() {
        let (_, error) = run("var x = 1; x();");

        assert!(error
            .expect("runtime error")
            .contains("Can only call functions and classes."));
    }

    #[test]
    fn test_undefined_variable() {
        let (_, error) = run("print missing;");

        assert!(error
            .expect("runtime error")
            .contains("Undefined variable 'missing'."));
    }

    #[test]
    fn test_undefined_property() {
        let (_, error) = run("class C {} print C().nope;");

        assert!(error
            .expect("runtime error")
            .contains("Undefined property 'nope'."));
    }

    #[test]
    fn test_property_access_on_non_instance() {
        let (_, error) = run("var a = 1; print a.x;");

        assert!(error
            .expect("runtime error")
            .contains("Only instances have properties."));
    }

    #[test]
    fn test_field_write_on_non_instance() {
        let (_, error) = run("var a = 1; a.x = 2;");

        assert!(error
            .expect("runtime error")
            .contains("Only instances have fields."));
    }

    #[test]
    fn test_superclass_must_be_a_class() {
        let (_, error) = run("var NotAClass = 1; class B < NotAClass {}");

        assert!(error
            .expect("runtime error")
            .contains("Superclass must be a class."));
    }

    #[test]
    fn test_unary_minus_requires_a_number() {
        let (_, error) = run("print -\"one\";");

        assert!(error
            .expect("runtime error")
            .contains("Operand must be a number."));
    }
}
