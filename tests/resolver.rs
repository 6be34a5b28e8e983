#[cfg(test)]
mod resolver_tests {
    use ezflowscript_interpreter as ezflow;

    use ezflow::interpreter::Interpreter;
    use ezflow::parser::Parser;
    use ezflow::resolver::Resolver;
    use ezflow::scanner::Scanner;
    use ezflow::token::Token;

    /// Run the front half of the pipeline and return the resolver's
    /// diagnostics as display strings.
    fn diagnostics(source: &str) -> Vec<String> {
        let tokens: Vec<Token> = Scanner::new(source.as_bytes())
            .collect::<Result<Vec<_>, _>>()
            .expect("scan error");

        let mut parser = Parser::new(&tokens);
        let (statements, errors) = parser.parse();
        assert!(errors.is_empty(), "unexpected parse errors: {:?}", errors);

        let mut interpreter = Interpreter::new();
        let mut resolver = Resolver::new(&mut interpreter);
        resolver.resolve(&statements);

        resolver
            .into_diagnostics()
            .iter()
            .map(|e| e.to_string())
            .collect()
    }

    fn assert_single(source: &str, needle: &str) {
        let diags = diagnostics(source);

        assert_eq!(diags.len(), 1, "diagnostics: {:?}", diags);
        assert!(
            diags[0].contains(needle),
            "expected '{}' in '{}'",
            needle,
            diags[0]
        );
    }

    #[test]
    fn test_clean_program_has_no_diagnostics() {
        let diags = diagnostics(
            "fun outer() { var x = 1; fun inner() { return x; } return inner; } print outer()();",
        );

        assert!(diags.is_empty(), "diagnostics: {:?}", diags);
    }

    #[test]
    fn test_duplicate_declaration_in_local_scope() {
        assert_single(
            "{ var a = 1; var a = 2; }",
            "Variable already declared in this scope",
        );
    }

    #[test]
    fn test_duplicate_declaration_at_global_scope_is_allowed() {
        let diags = diagnostics("var a = 1; var a = 2;");

        assert!(diags.is_empty(), "diagnostics: {:?}", diags);
    }

    #[test]
    fn test_initializer_reads_the_enclosing_binding() {
        // The declaration being initialized is not in scope yet, so the
        // reference resolves outward (here: to the global `a`), not to the
        // in-flight local.
        let diags = diagnostics("var a = 1; { var a = a + 1; }");

        assert!(diags.is_empty(), "diagnostics: {:?}", diags);
    }

    #[test]
    fn test_global_initializer_may_reference_itself_dynamically() {
        // At global scope there is no not-ready state; the reference falls
        // back to dynamic lookup (a runtime concern, not a static one).
        let diags = diagnostics("var a = 1; var a = a;");

        assert!(diags.is_empty(), "diagnostics: {:?}", diags);
    }

    #[test]
    fn test_return_outside_function() {
        assert_single("return 1;", "'return' used outside of function");
    }

    #[test]
    fn test_this_outside_class() {
        assert_single("print this;", "Cannot use 'this' outside of a class");
    }

    #[test]
    fn test_super_outside_class() {
        assert_single(
            "fun f() { return super.m(); }",
            "Cannot use 'super' outside of a class",
        );
    }

    #[test]
    fn test_super_without_superclass() {
        assert_single(
            "class A { m() { return super.m(); } }",
            "Cannot use 'super' in a class with no superclass",
        );
    }

    #[test]
    fn test_class_cannot_inherit_from_itself() {
        assert_single("class C < C {}", "A class can't inherit from itself");
    }

    #[test]
    fn test_return_value_from_initializer() {
        assert_single(
            "class C { init() { return 1; } }",
            "Cannot return a value from an initializer",
        );
    }

    #[test]
    fn test_bare_return_in_initializer_is_allowed() {
        let diags = diagnostics("class C { init() { return; } }");

        assert!(diags.is_empty(), "diagnostics: {:?}", diags);
    }

    #[test]
    fn test_methods_may_use_this() {
        let diags = diagnostics("class C { m() { return this; } }");

        assert!(diags.is_empty(), "diagnostics: {:?}", diags);
    }

    #[test]
    fn test_all_diagnostics_collected_in_one_pass() {
        let diags = diagnostics("return 1;\n{ var a = 1; var a = 2; }\nprint this;");

        assert_eq!(diags.len(), 3, "diagnostics: {:?}", diags);
        assert!(diags[0].contains("'return' used outside of function"));
        assert!(diags[1].contains("Variable already declared in this scope"));
        assert!(diags[2].contains("Cannot use 'this' outside of a class"));
    }
}
