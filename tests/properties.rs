//! Property tests for memory, scoping and the trampoline

use proptest::prelude::*;

use mima::interpreter::{
    Environment, Interpreter, InterpreterConfig, Memory, RecordingSink, RuntimeErrorKind,
    StackGuard, Value,
};
use mima::parser::parse_source;

fn run(source: &str, config: InterpreterConfig) -> (Result<Value, mima::interpreter::RuntimeError>, Interpreter) {
    let program = parse_source(source, "prop.mima").unwrap();
    let mut interpreter = Interpreter::new(config).with_sink(RecordingSink::new());
    let mut env = Environment::new();
    let mut memory = Memory::new();
    let result = interpreter.run(&program, &mut env, &mut memory);
    (result, interpreter)
}

fn nested(depth: usize, body: &str) -> String {
    format!("{}{}{}", "{ ".repeat(depth), body, " }".repeat(depth))
}

proptest! {
    #[test]
    fn memory_reset_restores_initial_mapping(
        capacity in 0usize..16,
        writes in prop::collection::vec((-20i64..40, any::<i32>()), 0..30),
        reads in prop::collection::vec(-50i64..50, 0..10),
    ) {
        let mut memory = Memory::with_capacity(capacity);
        let initial = memory.snapshot();

        for (address, value) in writes {
            memory.store_value(address, Value::Number(value.into()));
        }
        for address in reads {
            memory.load_value(address);
        }

        memory.reset();
        prop_assert_eq!(memory.mapping(), &initial);
        memory.reset();
        prop_assert_eq!(memory.mapping(), &initial);
    }

    #[test]
    fn constant_reassignment_fails_at_any_depth(depth in 0usize..12, value in 0i64..1000) {
        let source = format!("const limit = 5;\n{}", nested(depth, &format!("limit = {value};")));
        let (result, _) = run(&source, InterpreterConfig::default());
        prop_assert_eq!(
            result.unwrap_err().kind,
            RuntimeErrorKind::ConstantReassignment("limit".to_string())
        );
    }

    #[test]
    fn lookups_fall_back_through_scopes(depth in 0usize..12, value in 0i64..1000) {
        let source = format!("const x = {value};\n{}\nHALT();", nested(depth, "LDC(x);"));
        let (result, _) = run(&source, InterpreterConfig::default());
        prop_assert_eq!(result, Ok(Value::Number(value)));
    }

    #[test]
    fn guard_allows_exactly_budget_steps(budget in 0usize..500) {
        let mut guard = StackGuard::new(budget);
        for _ in 0..budget {
            prop_assert!(guard.guard());
        }
        prop_assert!(!guard.guard());
        guard.reset();
        prop_assert_eq!(guard.remaining(), budget as i64);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn long_programs_stay_within_budget(budget in 1usize..40, factor in prop::sample::select(vec![10usize, 100])) {
        let statements = budget * factor;
        let mut source = "LDC(1);\n".repeat(statements);
        source.push_str("HALT();");

        let config = InterpreterConfig { stack_budget: budget, ..InterpreterConfig::default() };
        let (result, interpreter) = run(&source, config);

        prop_assert_eq!(result, Ok(Value::Number(1)));
        let stats = interpreter.stats();
        prop_assert!(stats.bounces > 0);
        prop_assert!(stats.peak_guard_usage <= budget + 1);
    }

    #[test]
    fn nested_blocks_stay_within_budget(budget in 1usize..20, depth in 1usize..60) {
        let source = format!("{}\nHALT();", nested(depth, "LDC(2);"));
        let config = InterpreterConfig { stack_budget: budget, ..InterpreterConfig::default() };
        let (result, interpreter) = run(&source, config);

        prop_assert_eq!(result, Ok(Value::Number(2)));
        prop_assert!(interpreter.stats().peak_guard_usage <= budget + 1);
    }
}

#[test]
fn default_budget_program_of_hundred_budgets() {
    let budget = StackGuard::DEFAULT_BUDGET;
    let mut source = "LDC(3);\n".repeat(100 * budget);
    source.push_str("HALT();");

    let (result, interpreter) = run(&source, InterpreterConfig::default());
    assert_eq!(result, Ok(Value::Number(3)));
    assert!(interpreter.stats().bounces >= 90);
    assert!(interpreter.stats().peak_guard_usage <= budget + 1);
}
