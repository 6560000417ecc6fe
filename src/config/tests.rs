use super::*;
use pretty_assertions::assert_eq;

#[test]
fn test_parse_empty_config_uses_defaults() {
    let config = Config::parse("").unwrap();
    assert_eq!(config.machine.instruction_set, InstructionSet::Mima);
    assert_eq!(config.word_length(), 24);
    assert_eq!(config.constant_word_length(), 20);
    assert_eq!(config.interpreter.stack_budget, 200);
    assert_eq!(config.include.extensions, vec!["mima", "mimax"]);
}

#[test]
fn test_parse_full_config() {
    let content = r#"
[machine]
instruction-set = "mima-x"
memory-capacity = 16

[interpreter]
stack-budget = 50
trace = true

[include]
search-paths = ["lib", "/usr/share/mima"]
extensions = ["mima"]

[constants]
ONE = 1
LIMIT = 1000
"#;

    let config = Config::parse(content).unwrap();
    assert_eq!(config.machine.instruction_set, InstructionSet::MimaX);
    assert_eq!(config.constant_word_length(), 24);
    assert_eq!(config.constants.get("LIMIT"), Some(&1000));

    let interpreter = config.interpreter_config();
    assert_eq!(interpreter.stack_budget, 50);
    assert!(interpreter.trace);
    assert_eq!(config.memory().mapping().len(), 16);
}

#[test]
fn test_explicit_word_lengths_override_set() {
    let config = Config::parse(
        r#"
[machine]
word-length = 16
constant-word-length = 12
"#,
    )
    .unwrap();
    assert_eq!(config.word_length(), 16);
    assert_eq!(config.constant_word_length(), 12);
}

#[test]
fn test_validation_rejects_bad_values() {
    let err = Config::parse("[machine]\nword-length = 64\n").unwrap_err();
    assert!(matches!(err, ConfigError::Validation(_)));

    let err = Config::parse("[machine]\nword-length = 8\n").unwrap_err();
    assert!(err.to_string().contains("constant-word-length"));

    let err = Config::parse("[interpreter]\nstack-budget = 0\n").unwrap_err();
    assert!(matches!(err, ConfigError::Validation(_)));

    let err = Config::parse("[constants]\ndefine = 3\n").unwrap_err();
    assert_eq!(
        err,
        ConfigError::Validation("`define` is not a valid constant name".to_string())
    );
}

#[test]
fn test_unknown_instruction_set_is_parse_error() {
    let err = Config::parse("[machine]\ninstruction-set = \"z80\"\n").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn test_to_toml_roundtrip() {
    let mut config = Config::default();
    config.constants.insert("ZERO".to_string(), 0);
    config.machine.instruction_set = InstructionSet::MimaX;

    let text = config.to_toml().unwrap();
    assert!(text.contains("instruction-set = \"mima-x\""));
    assert_eq!(Config::parse(&text).unwrap(), config);
}

#[test]
fn test_environment_holds_constants() {
    let config = Config::parse("[constants]\nTEN = 10\n").unwrap();
    let env = config.environment().unwrap();
    assert_eq!(env.lookup(env.entry(), "TEN").get(), Ok(Value::Number(10)));
}

#[test]
fn test_discover_walks_up() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("a").join("b");
    std::fs::create_dir_all(&nested).unwrap();
    std::fs::write(
        dir.path().join(CONFIG_FILE),
        "[include]\nsearch-paths = [\"lib\"]\n",
    )
    .unwrap();

    let config = Config::discover(&nested).unwrap().unwrap();
    assert_eq!(config.base_dir.as_deref(), Some(dir.path()));
    assert_eq!(config.include.search_paths, vec![PathBuf::from("lib")]);
}

#[test]
fn test_discover_without_file() {
    let dir = tempfile::tempdir().unwrap();
    // a config in an ancestor of the temp dir would be found too
    if dir.path().ancestors().skip(1).any(|d| d.join(CONFIG_FILE).is_file()) {
        return;
    }
    assert_eq!(Config::discover(dir.path()).unwrap(), None);
}

#[test]
fn test_load_missing_file_is_io_error() {
    let err = Config::load(Path::new("/definitely/not/here/mima.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}
