//! String-literal lowering: interpolation spans, literal braces, and escape
//! handling as observed through full generation.

use flowc::generate;

fn say(literal: &str) -> String {
    let src = format!("to start:\n    say \"{literal}\"\n");
    let out = generate(&src).unwrap();
    let line = out
        .lines()
        .find(|l| l.trim_start().starts_with("std::cout"))
        .expect("no say line")
        .trim_start()
        .to_string();
    line
}

#[test]
fn plain_string_stays_quoted() {
    assert_eq!(say("hello"), "std::cout << \"hello\" << std::endl;");
}

#[test]
fn single_reference_with_text() {
    assert_eq!(
        say("hi {name}!"),
        "std::cout << [&]() { std::ostringstream _ss; _ss << \"hi \" << name << \"!\"; return _ss.str(); }() << std::endl;"
    );
}

#[test]
fn reference_only_string_is_bare_expression() {
    assert_eq!(say("{name}"), "std::cout << name << std::endl;");
}

#[test]
fn multiple_references() {
    assert_eq!(
        say("{a} and {b}"),
        "std::cout << [&]() { std::ostringstream _ss; _ss << a << \" and \" << b; return _ss.str(); }() << std::endl;"
    );
}

#[test]
fn digit_spans_stay_literal() {
    // {2,4} is a regex quantifier, not an interpolation
    assert_eq!(
        say("a{2,4}"),
        "std::cout << [&]() { std::ostringstream _ss; _ss << \"a\" << \"{2,4}\"; return _ss.str(); }() << std::endl;"
    );
}

#[test]
fn digit_only_span() {
    assert_eq!(
        say("x{3}"),
        "std::cout << [&]() { std::ostringstream _ss; _ss << \"x\" << \"{3}\"; return _ss.str(); }() << std::endl;"
    );
}

#[test]
fn empty_braces_stay_literal() {
    assert_eq!(
        say("a{}b"),
        "std::cout << [&]() { std::ostringstream _ss; _ss << \"a\" << \"{}\" << \"b\"; return _ss.str(); }() << std::endl;"
    );
}

#[test]
fn underscore_starts_interpolation() {
    assert_eq!(
        say("v={_tmp}"),
        "std::cout << [&]() { std::ostringstream _ss; _ss << \"v=\" << _tmp; return _ss.str(); }() << std::endl;"
    );
}

#[test]
fn unmatched_open_brace_kept() {
    assert_eq!(
        say("a{b"),
        "std::cout << [&]() { std::ostringstream _ss; _ss << \"a\" << \"{\" << \"b\"; return _ss.str(); }() << std::endl;"
    );
}

#[test]
fn closing_brace_without_open_is_plain_text() {
    assert_eq!(say("a}b"), "std::cout << \"a}b\" << std::endl;");
}

#[test]
fn escapes_survive_into_cpp_literals() {
    assert_eq!(say("tab\\there"), "std::cout << \"tab\\there\" << std::endl;");
    assert_eq!(say("line\\nbreak"), "std::cout << \"line\\nbreak\" << std::endl;");
}

#[test]
fn interpolation_mixed_with_escapes() {
    assert_eq!(
        say("{n}\\n"),
        "std::cout << [&]() { std::ostringstream _ss; _ss << n << \"\\n\"; return _ss.str(); }() << std::endl;"
    );
}
