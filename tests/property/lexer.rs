//! Lexer invariants checked across generated inputs.

use proptest::prelude::*;

use flowc::lexer::{TokenKind, lex};

/// Build a syntactically valid nested program: `depth` nested blocks, each
/// one level deeper, with a statement at the bottom.
fn nested_source(depth: usize, width: usize) -> String {
    let mut src = String::from("to f:\n");
    for level in 0..depth {
        let pad = " ".repeat(width * (level + 1));
        if level + 1 == depth {
            src.push_str(&format!("{pad}say \"leaf\"\n"));
        } else {
            src.push_str(&format!("{pad}if yes:\n"));
        }
    }
    src
}

#[test]
fn prop_lexer_never_panics() {
    proptest!(|(source in "\\PC{0,600}")| {
        let _ = lex(&source);
    });
}

#[test]
fn prop_lexing_is_deterministic() {
    proptest!(|(source in "\\PC{0,400}")| {
        let first = lex(&source);
        let second = lex(&source);
        match (first, second) {
            (Ok(a), Ok(b)) => prop_assert_eq!(a, b),
            (Err(a), Err(b)) => prop_assert_eq!(a.to_string(), b.to_string()),
            _ => prop_assert!(false, "ok/err disagreement between runs"),
        }
    });
}

#[test]
fn prop_indent_dedent_always_balanced() {
    proptest!(|(depth in 1usize..8, width in 1usize..6)| {
        let src = nested_source(depth, width);
        let tokens = lex(&src).unwrap();
        let indents = tokens.iter().filter(|t| t.kind == TokenKind::Indent).count();
        let dedents = tokens.iter().filter(|t| t.kind == TokenKind::Dedent).count();
        prop_assert_eq!(indents, dedents);
        prop_assert_eq!(indents, depth);
    });
}

#[test]
fn prop_balance_holds_for_any_successful_lex() {
    proptest!(|(source in "\\PC{0,400}")| {
        if let Ok(tokens) = lex(&source) {
            let indents = tokens.iter().filter(|t| t.kind == TokenKind::Indent).count();
            let dedents = tokens.iter().filter(|t| t.kind == TokenKind::Dedent).count();
            prop_assert_eq!(indents, dedents);
        }
    });
}

#[test]
fn prop_successful_lex_ends_with_eof() {
    proptest!(|(source in "\\PC{0,400}")| {
        if let Ok(tokens) = lex(&source) {
            prop_assert_eq!(tokens.last().unwrap().kind, TokenKind::Eof);
            // and exactly one EOF
            let eofs = tokens.iter().filter(|t| t.kind == TokenKind::Eof).count();
            prop_assert_eq!(eofs, 1);
        }
    });
}

#[test]
fn prop_kind_value_stream_ignores_position() {
    // Re-lexing with a line of leading comments shifts every position but
    // must leave the kind/value stream unchanged.
    proptest!(|(n in 1usize..20)| {
        let body = "to f:\n    say \"x\"\n";
        let shifted = format!("{}{}", "// padding\n".repeat(n), body);

        // Comment-only lines still terminate in newline tokens, so compare
        // the streams with newlines stripped.
        let strip = |src: &str| -> Vec<(TokenKind, String)> {
            lex(src)
                .unwrap()
                .into_iter()
                .filter(|t| t.kind != TokenKind::Newline)
                .map(|t| (t.kind, t.value))
                .collect()
        };
        prop_assert_eq!(strip(body), strip(&shifted));
    });
}

#[test]
fn prop_identifier_words_round_trip() {
    proptest!(|(word in "[a-z][a-z0-9_]{0,12}")| {
        prop_assume!(flowc::lexer::keyword(&word).is_none());
        let tokens = lex(&word).unwrap();
        prop_assert_eq!(tokens[0].kind, TokenKind::Ident);
        prop_assert_eq!(&tokens[0].value, &word);
    });
}

#[test]
fn prop_string_literals_round_trip() {
    proptest!(|(content in "[a-zA-Z0-9 .,!?_-]{0,40}")| {
        let src = format!("say \"{content}\"");
        let tokens = lex(&src).unwrap();
        prop_assert_eq!(tokens[1].kind, TokenKind::Str);
        prop_assert_eq!(&tokens[1].value, &content);
    });
}

#[test]
fn prop_int_literals_round_trip() {
    proptest!(|(n in 0u64..1_000_000_000)| {
        let src = format!("say {n}");
        let tokens = lex(&src).unwrap();
        prop_assert_eq!(tokens[1].kind, TokenKind::Int);
        prop_assert_eq!(&tokens[1].value, &n.to_string());
    });
}
