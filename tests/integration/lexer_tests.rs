use flowc::lexer::{TokenKind, lex};

fn kinds(source: &str) -> Vec<TokenKind> {
    lex(source).unwrap().into_iter().map(|t| t.kind).collect()
}

fn balance(source: &str) -> (usize, usize) {
    let ks = kinds(source);
    (
        ks.iter().filter(|k| **k == TokenKind::Indent).count(),
        ks.iter().filter(|k| **k == TokenKind::Dedent).count(),
    )
}

#[test]
fn indent_dedent_balanced_simple() {
    let (i, d) = balance("to f:\n    say \"a\"\n");
    assert_eq!(i, d);
    assert_eq!(i, 1);
}

#[test]
fn indent_dedent_balanced_nested() {
    let src = "to f:\n    if yes:\n        while no:\n            say \"deep\"\n    say \"back\"\n";
    let (i, d) = balance(src);
    assert_eq!(i, d);
    assert_eq!(i, 3);
}

#[test]
fn indent_dedent_balanced_multiple_functions() {
    let src = "to a:\n    say 1\n\nto b:\n    say 2\n\nto c:\n    say 3\n";
    let (i, d) = balance(src);
    assert_eq!(i, d);
    assert_eq!(i, 3);
}

#[test]
fn missing_trailing_newline_still_balances() {
    let (i, d) = balance("to f:\n    if yes:\n        say \"x\"");
    assert_eq!(i, d);
}

#[test]
fn tokenizing_is_deterministic() {
    let src = "to f x and y:\n    if x >= y:\n        return x\n    return y\n";
    let first = lex(src).unwrap();
    let second = lex(src).unwrap();
    assert_eq!(first, second);
}

#[test]
fn token_stream_ends_with_eof() {
    for src in ["", "say 1", "to f:\n    say 1\n"] {
        let tokens = lex(src).unwrap();
        assert_eq!(tokens.last().unwrap().kind, TokenKind::Eof);
    }
}

#[test]
fn keyword_table_covers_the_surface() {
    let src = "to is becomes return if otherwise a has can as my for each in repeat times \
               while skip stop and or not yes no say print ask pause now today clock read \
               write append env run open where then using from yield change fetch connect \
               send parse stringify match find replace hash wait do together log info warn \
               error test assert try catch throw at";
    let tokens = lex(src).unwrap();
    // Every word above is a keyword, so no Ident tokens may appear.
    assert!(tokens.iter().all(|t| t.kind != TokenKind::Ident));
}

#[test]
fn identifiers_are_not_keywords() {
    let tokens = lex("total counter2 _tmp").unwrap();
    assert!(tokens[..3].iter().all(|t| t.kind == TokenKind::Ident));
}

#[test]
fn mixed_width_dedent_is_rejected() {
    // 0 → 4 → 8 are open; a line at width 6 matches nothing.
    let src = "to f:\n    if yes:\n        say \"a\"\n      say \"b\"\n";
    let err = lex(src).unwrap_err();
    assert!(err.to_string().contains("inconsistent indentation"));
}

#[test]
fn dedent_error_reports_position() {
    let src = "to f:\n    say \"a\"\n  say \"b\"\n";
    let err = lex(src).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("3:"), "expected line 3 in: {msg}");
}

#[test]
fn lex_error_on_stray_operator_char() {
    for src in ["x = 1", "x ! y", "price $ 3"] {
        assert!(lex(src).is_err(), "expected error for {src:?}");
    }
}

#[test]
fn comment_only_file_lexes_to_eof() {
    let tokens = lex("// nothing here\n// still nothing\n").unwrap();
    assert!(tokens.iter().all(|t| matches!(t.kind, TokenKind::Newline | TokenKind::Eof)));
}

#[test]
fn possessive_versus_string_quote() {
    let tokens = lex("say dog's name").unwrap();
    assert_eq!(tokens[2].kind, TokenKind::Possessive);
}

#[test]
fn position_columns_count_from_one() {
    let tokens = lex("say x").unwrap();
    assert_eq!(tokens[0].column, 1);
    assert_eq!(tokens[1].column, 5);
}
