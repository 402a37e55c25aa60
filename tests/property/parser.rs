//! Parser and generator totality: every token stream the lexer accepts from
//! well-formed source parses, and every parsed program generates.

use proptest::prelude::*;

use flowc::parser::parse;

/// A pool of body statements that are valid in any function body.
fn stmt_pool() -> Vec<&'static str> {
    vec![
        "say \"hello\"",
        "print \"partial\"",
        "x is 1",
        "y is 2, can change",
        "total is 1 + 2 * 3",
        "flag is yes",
        "pause 10",
        "log info \"note\"",
        "assert 1 == 1",
        "items is [1, 2, 3]",
        "doubled is [v * 2 for each v in 1 to 4]",
        "word is upper \"abc\"",
    ]
}

fn program_from(picks: &[usize]) -> String {
    let pool = stmt_pool();
    let mut src = String::from("to f:\n");
    for &p in picks {
        src.push_str("    ");
        src.push_str(pool[p % pool.len()]);
        src.push('\n');
    }
    if picks.is_empty() {
        src.push_str("    return\n");
    }
    src
}

#[test]
fn prop_parser_never_panics() {
    proptest!(|(source in "\\PC{0,500}")| {
        let _ = parse(&source);
    });
}

#[test]
fn prop_generated_programs_parse() {
    proptest!(|(picks in proptest::collection::vec(0usize..100, 0..20))| {
        let src = program_from(&picks);
        prop_assert!(parse(&src).is_ok(), "failed to parse:\n{}", src);
    });
}

#[test]
fn prop_parsed_programs_generate() {
    proptest!(|(picks in proptest::collection::vec(0usize..100, 0..20))| {
        let src = program_from(&picks);
        let out = flowc::generate(&src).unwrap();
        prop_assert!(out.contains("auto f()"));
    });
}

#[test]
fn prop_fresh_identifiers_assign() {
    proptest!(|(name in "[a-z][a-z0-9_]{0,10}", value in 0i64..1_000_000)| {
        prop_assume!(flowc::lexer::keyword(&name).is_none());
        prop_assume!(name != "with");
        let src = format!("to f:\n    {name} is {value}\n");
        let program = parse(&src).unwrap();
        prop_assert_eq!(program.statements.len(), 1);

        let out = flowc::generate(&src).unwrap();
        let expected = format!("const auto {} = {};", name, value);
        prop_assert!(out.contains(&expected));
    });
}

#[test]
fn prop_nesting_depth_parses() {
    proptest!(|(depth in 1usize..10)| {
        let mut src = String::from("to f:\n");
        for level in 0..depth {
            let pad = "    ".repeat(level + 1);
            src.push_str(&format!("{pad}if yes:\n"));
        }
        src.push_str(&format!("{}say \"deep\"\n", "    ".repeat(depth + 1)));
        prop_assert!(parse(&src).is_ok());
    });
}

#[test]
fn prop_parsing_is_deterministic() {
    proptest!(|(picks in proptest::collection::vec(0usize..100, 0..12))| {
        let src = program_from(&picks);
        let a = flowc::generate(&src).unwrap();
        let b = flowc::generate(&src).unwrap();
        prop_assert_eq!(a, b);
    });
}
