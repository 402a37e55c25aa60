//! End-to-end behavior checks: generate C++, hand it to the real native
//! toolchain, run the binary, and observe its output. Skips cleanly when the
//! machine has no usable C++ toolchain (compiler or OpenSSL missing).

use std::process::Command;
use std::sync::OnceLock;

use flowc::config::Config;
use flowc::toolchain::Toolchain;

static TOOLCHAIN_OK: OnceLock<bool> = OnceLock::new();

fn toolchain_available() -> bool {
    *TOOLCHAIN_OK.get_or_init(|| {
        let cfg = Config::from_env();
        if Command::new(&cfg.compiler).arg("--version").output().is_err() {
            return false;
        }
        let dir = tempfile::tempdir().unwrap();
        let cpp = flowc::generate("to start:\n    say \"probe\"\n").unwrap();
        Toolchain::new(cfg)
            .compile(&cpp, &dir.path().join("probe.flow"), false)
            .is_ok()
    })
}

/// Compile and run a Flow program, returning (stdout, exit code).
fn run_flow(src: &str) -> (String, i32) {
    let cfg = Config::from_env();
    let cpp = flowc::generate(src).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let bin = Toolchain::new(cfg)
        .compile(&cpp, &dir.path().join("prog.flow"), false)
        .expect("native compilation failed");
    let out = Command::new(&bin).output().expect("binary failed to start");
    (
        String::from_utf8_lossy(&out.stdout).into_owned(),
        out.status.code().unwrap_or(-1),
    )
}

macro_rules! require_toolchain {
    () => {
        if !toolchain_available() {
            eprintln!("skipping: no usable native toolchain on this machine");
            return;
        }
    };
}

#[test]
fn interpolation_prints_hello() {
    require_toolchain!();
    let (out, code) = run_flow("to start:\n    name is \"world\"\n    say \"hi {name}\"\n");
    assert_eq!(out, "hi world\n");
    assert_eq!(code, 0);
}

#[test]
fn repeat_prints_three_lines() {
    require_toolchain!();
    let (out, _) = run_flow("to start:\n    repeat 3 times:\n        say \"x\"\n");
    assert_eq!(out, "x\nx\nx\n");
}

#[test]
fn generator_collects_yielded_values() {
    require_toolchain!();
    let src = "\
to nums n:
    for each i in 1 to n:
        yield i

to start:
    for each v in nums 3:
        say v
";
    let (out, _) = run_flow(src);
    assert_eq!(out, "1\n2\n3\n");
}

#[test]
fn comprehension_doubles_range() {
    require_toolchain!();
    let src = "\
to start:
    vals is [x * 2 for each x in 1 to 3]
    for each v in vals:
        say v
";
    let (out, _) = run_flow(src);
    assert_eq!(out, "2\n4\n6\n");
}

#[test]
fn decorator_doubles_result() {
    require_toolchain!();
    let src = "\
to twice x:
    return x * 2

@twice
to addone n:
    return n + 1

to start:
    say addone 4
";
    let (out, _) = run_flow(src);
    assert_eq!(out, "10\n");
}

#[test]
fn builtins_behave() {
    require_toolchain!();
    let src = "\
to start:
    say upper \"abc\"
    say min 3 and 7
    say sum [1, 2, 3]
";
    let (out, _) = run_flow(src);
    assert_eq!(out, "ABC\n3\n6\n");
}

#[test]
fn slices_use_iterator_arithmetic() {
    require_toolchain!();
    let src = "\
to start:
    items is [10, 20, 30, 40]
    front is items to 2
    for each v in front:
        say v
";
    let (out, _) = run_flow(src);
    assert_eq!(out, "10\n20\n");
}

#[test]
fn do_together_runs_every_worker() {
    require_toolchain!();
    let src = "\
to start:
    do together:
        say \"a\"
        say \"b\"
";
    let (out, _) = run_flow(src);
    // Workers may interleave characters on the shared stream, so compare the
    // multiset of emitted characters rather than whole lines.
    let mut chars: Vec<char> = out.chars().collect();
    chars.sort_unstable();
    assert_eq!(chars, vec!['\n', '\n', 'a', 'b']);
}

#[test]
fn pipe_applies_function() {
    require_toolchain!();
    // The pipe target is resolved as an ordinary function, never against the
    // builtin table, so it must name something user-defined.
    let src = "\
to total items:
    return sum items

to start:
    say [1, 2, 3] | total
";
    let (out, _) = run_flow(src);
    assert_eq!(out, "6\n");
}

#[test]
fn conditionals_pick_branch() {
    require_toolchain!();
    let src = "\
to start:
    x is 5
    if x > 3:
        say \"big\"
    otherwise:
        say \"small\"
";
    let (out, _) = run_flow(src);
    assert_eq!(out, "big\n");
}

#[test]
fn try_catch_recovers() {
    require_toolchain!();
    let src = "\
to start:
    try:
        throw \"boom\"
    catch e:
        say \"caught\"
";
    let (out, code) = run_flow(src);
    assert_eq!(out, "caught\n");
    assert_eq!(code, 0);
}

#[test]
fn build_error_surfaces_tool_output() {
    require_toolchain!();
    // 'undefined_name' only fails at native-compile time; the tool's
    // diagnostic text must come back verbatim inside the error.
    let cfg = Config::from_env();
    let cpp = flowc::generate("to start:\n    say undefined_name\n").unwrap();
    let dir = tempfile::tempdir().unwrap();
    let err = Toolchain::new(cfg)
        .compile(&cpp, &dir.path().join("bad.flow"), false)
        .unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("undefined_name"), "tool output missing: {msg}");
}

#[test]
fn keep_flag_preserves_intermediate_source() {
    require_toolchain!();
    let cfg = Config::from_env();
    let cpp = flowc::generate("to start:\n    say \"hi\"\n").unwrap();
    let dir = tempfile::tempdir().unwrap();

    let flow = dir.path().join("kept.flow");
    Toolchain::new(cfg.clone()).compile(&cpp, &flow, true).unwrap();
    assert!(dir.path().join("kept.cpp").exists());

    let flow = dir.path().join("dropped.flow");
    Toolchain::new(cfg).compile(&cpp, &flow, false).unwrap();
    assert!(!dir.path().join("dropped.cpp").exists());
}

#[test]
fn slice_from_runs() {
    require_toolchain!();
    let src = "\
to start:
    items is [10, 20, 30, 40]
    back is items from 2
    for each v in back:
        say v
";
    let (out, _) = run_flow(src);
    assert_eq!(out, "30\n40\n");
}
