#[cfg(test)]
mod scanner_tests {
    use ezflowscript_interpreter as ezflow;

    use ezflow::error::EzFlowError;
    use ezflow::scanner::*;
    use ezflow::token::*;

    fn assert_token_sequence(source: &str, expected: &[(TokenType, &str)]) {
        let scanner = Scanner::new(source.as_bytes());
        let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

        assert_eq!(tokens.len(), expected.len());

        for (actual, (expected_type, expected_lexeme)) in tokens.iter().zip(expected.iter()) {
            assert_eq!(actual.token_type, *expected_type);
            assert_eq!(actual.lexeme, *expected_lexeme);
        }
    }

    fn scan_errors(source: &str) -> Vec<EzFlowError> {
        Scanner::new(source.as_bytes())
            .filter_map(Result::err)
            .collect()
    }

    #[test]
    fn test_scanner_01_symbols() {
        assert_token_sequence(
            "({*.,+*})",
            &[
                (TokenType::LEFT_PAREN, "("),
                (TokenType::LEFT_BRACE, "{"),
                (TokenType::STAR, "*"),
                (TokenType::DOT, "."),
                (TokenType::COMMA, ","),
                (TokenType::PLUS, "+"),
                (TokenType::STAR, "*"),
                (TokenType::RIGHT_BRACE, "}"),
                (TokenType::RIGHT_PAREN, ")"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_02_two_char_operators() {
        // Maximal munch: the two-character forms win over the one-character
        // fallbacks.
        assert_token_sequence(
            "! != = == < <= > >=",
            &[
                (TokenType::BANG, "!"),
                (TokenType::BANG_EQUAL, "!="),
                (TokenType::EQUAL, "="),
                (TokenType::EQUAL_EQUAL, "=="),
                (TokenType::LESS, "<"),
                (TokenType::LESS_EQUAL, "<="),
                (TokenType::GREATER, ">"),
                (TokenType::GREATER_EQUAL, ">="),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_03_keywords_and_identifiers() {
        assert_token_sequence(
            "class klass var varx _under score9",
            &[
                (TokenType::CLASS, "class"),
                (TokenType::IDENTIFIER, "klass"),
                (TokenType::VAR, "var"),
                (TokenType::IDENTIFIER, "varx"),
                (TokenType::IDENTIFIER, "_under"),
                (TokenType::IDENTIFIER, "score9"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_04_numbers() {
        let scanner = Scanner::new(b"123 3.14 7.");
        let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

        assert_eq!(tokens[0].token_type, TokenType::NUMBER(0.0));
        assert_eq!(tokens[0].lexeme, "123");

        assert_eq!(tokens[1].lexeme, "3.14");

        // No trailing-dot numbers: "7." scans as NUMBER then DOT.
        assert_eq!(tokens[2].lexeme, "7");
        assert_eq!(tokens[3].token_type, TokenType::DOT);

        if let TokenType::NUMBER(n) = &tokens[1].token_type {
            assert_eq!(*n, 3.14);
        } else {
            panic!("expected NUMBER, got {:?}", tokens[1].token_type);
        }
    }

    #[test]
    fn test_scanner_05_string_literal_spans_lines() {
        let scanner = Scanner::new(b"\"a\nb\" x");
        let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

        if let TokenType::STRING(ref s) = tokens[0].token_type {
            assert_eq!(s, "a\nb");
        } else {
            panic!("expected STRING, got {:?}", tokens[0].token_type);
        }

        // The newline inside the literal advanced the line counter.
        assert_eq!(tokens[1].lexeme, "x");
        assert_eq!(tokens[1].line, 2);
    }

    #[test]
    fn test_scanner_06_unterminated_string() {
        let errors = scan_errors("\"never closed");

        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("Unterminated string"));
    }

    #[test]
    fn test_scanner_07_line_comments_skipped() {
        assert_token_sequence(
            "var x; // the rest is noise + - *\nprint x;",
            &[
                (TokenType::VAR, "var"),
                (TokenType::IDENTIFIER, "x"),
                (TokenType::SEMICOLON, ";"),
                (TokenType::PRINT, "print"),
                (TokenType::IDENTIFIER, "x"),
                (TokenType::SEMICOLON, ";"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_08_block_comment_skipped() {
        let scanner = Scanner::new(b"1 /* spanning\ntwo lines */ 2");
        let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

        assert_eq!(tokens[0].lexeme, "1");
        assert_eq!(tokens[0].line, 1);

        // Newlines inside the comment still advance the line counter.
        assert_eq!(tokens[1].lexeme, "2");
        assert_eq!(tokens[1].line, 2);

        assert_eq!(tokens[2].token_type, TokenType::EOF);
    }

    #[test]
    fn test_scanner_09_block_comments_do_not_nest() {
        // The first */ closes the comment, so "c */" is scanned as code.
        assert_token_sequence(
            "/* a /* b */ c */",
            &[
                (TokenType::IDENTIFIER, "c"),
                (TokenType::STAR, "*"),
                (TokenType::SLASH, "/"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_10_dangling_block_comment() {
        let errors = scan_errors("var x; /* never closed");

        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("Dangling comment"));
    }

    #[test]
    fn test_scanner_11_unexpected_chars_do_not_abort() {
        let source = ",.$(#";
        let scanner = Scanner::new(source.as_bytes());

        let results: Vec<_> = scanner.collect();

        // We expect this sequence:
        // 0: COMMA ','
        // 1: DOT '.'
        // 2: Error for '$'
        // 3: LEFT_PAREN '('
        // 4: Error for '#'
        // 5: EOF
        assert_eq!(results.len(), 6, "Expected 6 items in result");

        assert_token_matches(&results[0], TokenType::COMMA, ",");
        assert_token_matches(&results[1], TokenType::DOT, ".");
        assert_token_matches(&results[3], TokenType::LEFT_PAREN, "(");
        assert_token_matches(&results[5], TokenType::EOF, "");

        let error_count = results.iter().filter(|r| r.is_err()).count();
        assert_eq!(error_count, 2, "Expected 2 error messages");

        for err in results.iter().filter_map(|r| r.as_ref().err()) {
            assert!(
                err.to_string().contains("Unexpected character"),
                "Error message should contain 'Unexpected character', got: {}",
                err
            );
        }

        fn assert_token_matches(
            result: &Result<Token, EzFlowError>,
            expected_type: TokenType,
            expected_lexeme: &str,
        ) {
            match result {
                Ok(token) => {
                    assert_eq!(
                        token.token_type, expected_type,
                        "Expected token type {:?}, got {:?}",
                        expected_type, token.token_type
                    );
                    assert_eq!(
                        token.lexeme, expected_lexeme,
                        "Expected lexeme '{}', got '{}'",
                        expected_lexeme, token.lexeme
                    );
                }
                Err(e) => panic!("Expected token but got error: {}", e),
            }
        }
    }

    #[test]
    fn test_scanner_12_single_eof_token() {
        let mut scanner = Scanner::new(b"");

        let first = scanner.next().expect("one item");
        assert_eq!(first.expect("EOF token").token_type, TokenType::EOF);

        assert!(scanner.next().is_none());
        assert!(scanner.next().is_none()); // fused
    }
}
