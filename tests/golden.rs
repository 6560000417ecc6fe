//! Golden tests over the sample programs in `tests/programs`
//!
//! Each program states its expected outcome in leading comments:
//! `# expect: <value>` or `# expect-error: <code>`, optionally with
//! `# instruction-set: mima-x`.

use std::fs;
use std::path::Path;

use mima::interpreter::{
    Environment, InstructionSet, Interpreter, InterpreterConfig, Memory, RecordingSink,
};
use mima::parser::{parse_with_includes, FsResolver};

#[derive(Debug, Default)]
struct Expectation {
    value: Option<String>,
    error: Option<String>,
    instruction_set: InstructionSet,
}

fn read_header(source: &str) -> Expectation {
    let mut expectation = Expectation::default();
    for line in source.lines().take_while(|line| line.starts_with('#')) {
        let Some((key, value)) = line.trim_start_matches('#').split_once(':') else {
            continue;
        };
        let value = value.trim().to_string();
        match key.trim() {
            "expect" => expectation.value = Some(value),
            "expect-error" => expectation.error = Some(value),
            "instruction-set" if value == "mima-x" => {
                expectation.instruction_set = InstructionSet::MimaX
            }
            _ => {}
        }
    }
    expectation
}

/// Outcome as `Ok(rendered value)` or `Err(error code)`
fn run_program(path: &Path, source: &str, set: InstructionSet) -> Result<String, String> {
    let mut resolver = FsResolver::default();
    let program =
        parse_with_includes(source, path, &mut resolver).map_err(|err| err.code.to_string())?;

    let mut interpreter =
        Interpreter::new(InterpreterConfig::for_set(set)).with_sink(RecordingSink::new());
    let mut env = Environment::new();
    let mut memory = Memory::new();
    interpreter
        .run(&program, &mut env, &mut memory)
        .map(|value| value.to_string())
        .map_err(|err| err.code().to_string())
}

fn run_single_golden_test(path: &Path) {
    let source = fs::read_to_string(path).unwrap();
    let expectation = read_header(&source);
    let outcome = run_program(path, &source, expectation.instruction_set);

    match (&expectation.value, &expectation.error) {
        (Some(value), None) => assert_eq!(outcome, Ok(value.clone()), "{}", path.display()),
        (None, Some(code)) => assert_eq!(outcome, Err(code.clone()), "{}", path.display()),
        _ => panic!("{}: needs exactly one expectation", path.display()),
    }
}

#[test]
fn golden_program_tests() {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("programs");

    let mut count = 0;
    for entry in fs::read_dir(&dir).unwrap() {
        let path = entry.unwrap().path();
        if path.extension().is_some_and(|ext| ext == "mima") {
            run_single_golden_test(&path);
            count += 1;
        }
    }
    assert!(count >= 8, "expected sample programs in {}", dir.display());
}

#[test]
fn header_is_read_from_leading_comments() {
    let expectation = read_header("# instruction-set: mima-x\n# expect: 7\nLDC(7);\n# expect: 9");
    assert_eq!(expectation.value.as_deref(), Some("7"));
    assert_eq!(expectation.instruction_set, InstructionSet::MimaX);
    assert!(expectation.error.is_none());
}
