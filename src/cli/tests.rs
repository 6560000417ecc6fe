use super::*;
use crate::diagnostics::{DiagnosticBag, Severity};
use crate::parser::MapResolver;
use clap::CommandFactory;

#[test]
fn test_cli_definition_is_consistent() {
    Cli::command().debug_assert();
}

#[test]
fn test_parse_run_arguments() {
    let cli = Cli::try_parse_from([
        "mima",
        "run",
        "prog.mima",
        "--budget",
        "50",
        "--dump-memory",
        "--json",
    ])
    .unwrap();

    assert!(cli.json);
    match cli.command {
        Command::Run {
            file,
            budget,
            dump_memory,
            config,
        } => {
            assert_eq!(file, PathBuf::from("prog.mima"));
            assert_eq!(budget, Some(50));
            assert!(dump_memory);
            assert_eq!(config, None);
        }
        other => panic!("expected run, got {other:?}"),
    }
}

#[test]
fn test_verbose_and_quiet_conflict() {
    assert!(Cli::try_parse_from(["mima", "-v", "-q", "tokens", "a.mima"]).is_err());
}

#[test]
fn test_check_defaults_to_current_directory() {
    let cli = Cli::try_parse_from(["mima", "check"]).unwrap();
    match cli.command {
        Command::Check { paths } => assert_eq!(paths, vec![PathBuf::from(".")]),
        other => panic!("expected check, got {other:?}"),
    }
}

#[test]
fn test_collect_sources_filters_extensions() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("lib")).unwrap();
    std::fs::write(dir.path().join("main.mima"), "HALT();").unwrap();
    std::fs::write(dir.path().join("lib").join("util.mimax"), "RET();").unwrap();
    std::fs::write(dir.path().join("notes.txt"), "").unwrap();

    let sources = collect_sources(&[dir.path().to_path_buf()]).unwrap();
    let names: Vec<_> = sources
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names.len(), 2);
    assert!(names.contains(&"main.mima".to_string()));
    assert!(names.contains(&"util.mimax".to_string()));
}

#[test]
fn test_collect_sources_missing_path() {
    let err = collect_sources(&[PathBuf::from("/no/such/dir/here")]).unwrap_err();
    assert!(err.to_string().contains("no such file"));
}

#[test]
fn test_check_source_warns_without_halt() {
    let bag = check_cmd::check_source("LDC(1);", Path::new("a.mima"), &mut MapResolver::new());
    assert_eq!(bag.len(), 1);
    assert_eq!(bag.diagnostics()[0].severity, Severity::Warning);
    assert_eq!(bag.diagnostics()[0].code, "W0001");
    assert!(!bag.has_errors());
}

#[test]
fn test_check_source_finds_nested_halt() {
    let bag = check_cmd::check_source(
        "if (true) { { HALT(); } }",
        Path::new("a.mima"),
        &mut MapResolver::new(),
    );
    assert!(bag.is_empty());
}

#[test]
fn test_check_source_reports_syntax_error() {
    let bag = check_cmd::check_source("{ define x;", Path::new("a.mima"), &mut MapResolver::new());
    assert!(bag.has_errors());
    assert_eq!(bag.error_count(), 1);
}

#[test]
fn test_check_source_uses_includes() {
    let mut resolver = MapResolver::new().with_file("end", "HALT();");
    let bag = check_cmd::check_source("LDC(1); include 'end';", Path::new("a.mima"), &mut resolver);
    assert!(bag.is_empty());
}

fn codes(bag: &DiagnosticBag) -> Vec<&str> {
    bag.diagnostics().iter().map(|d| d.code.as_str()).collect()
}

#[test]
fn test_check_source_warns_on_duplicates_across_blocks() {
    let bag = check_cmd::check_source(
        "define x; top: LDC(1);\n{ const x = 2; top: LDC(x); }\nif (true) { define y; } else { define y; }\nHALT();",
        Path::new("a.mima"),
        &mut MapResolver::new(),
    );
    assert!(!bag.has_errors());
    assert_eq!(codes(&bag), vec!["W0002", "W0002", "W0002"]);

    let messages: Vec<&str> = bag.diagnostics().iter().map(|d| d.message.as_str()).collect();
    assert_eq!(
        messages,
        vec![
            "multiple definitions: \"x\"",
            "multiple jump definitions: \"top\"",
            "multiple definitions: \"y\"",
        ]
    );
    let first = &bag.diagnostics()[0];
    assert_eq!(first.span.start_line, 2);
    assert_eq!(first.notes[0].span.as_ref().map(|s| s.start_line), Some(1));
}

#[test]
fn test_check_source_label_and_definition_may_share_a_name() {
    let bag = check_cmd::check_source(
        "define done; done: HALT();",
        Path::new("a.mima"),
        &mut MapResolver::new(),
    );
    assert!(bag.is_empty());
}

#[test]
fn test_check_source_warns_on_bare_expressions() {
    let bag = check_cmd::check_source(
        "LDC(1);\n1 + 2;\n{ x; }\nHALT();",
        Path::new("a.mima"),
        &mut MapResolver::new(),
    );
    assert_eq!(codes(&bag), vec!["W0003", "W0003"]);
    assert_eq!(bag.diagnostics()[0].message, "not an instruction call");
    let lines: Vec<usize> = bag.diagnostics().iter().map(|d| d.span.start_line).collect();
    assert_eq!(lines, vec![2, 3]);
}

#[test]
fn test_token_rows_report_char_offsets() {
    let tokens = crate::parser::tokenize("# größe\nLDC(1);", "a.mima").unwrap();
    let row = tokens_cmd::TokenRow::from(&tokens[0]);

    assert_eq!((row.line, row.column), (2, 1));
    assert_eq!(row.offset, 10);
    assert_eq!(row.char_offset, 8);
}

#[test]
fn test_load_config_prefers_explicit_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("custom.toml");
    std::fs::write(&path, "[interpreter]\nstack-budget = 7\n").unwrap();

    let config = load_config(Some(&path), Path::new("prog.mima")).unwrap();
    assert_eq!(config.interpreter.stack_budget, 7);
}
