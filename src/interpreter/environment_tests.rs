use super::*;
use crate::interpreter::query::IllegalRequest;

#[test]
fn test_lookup_falls_back_to_parent() {
    let mut env = Environment::new();
    let outer = env.entry();
    env.define(outer, "a", Value::Memory(3)).unwrap();
    let inner = env.create_child(outer).unwrap();

    assert_eq!(env.lookup(inner, "a").get(), Ok(Value::Memory(3)));
}

#[test]
fn test_lookup_without_definition_is_illegal_request() {
    let mut env = Environment::new();
    let inner = env.create_child(env.entry()).unwrap();

    let item = env.lookup(inner, "missing");
    assert!(!item.is_present());
    assert_eq!(item.get(), Err(IllegalRequest("`missing`".to_string())));
}

#[test]
fn test_inner_binding_shadows_outer() {
    let mut env = Environment::new();
    let outer = env.entry();
    env.define_constant(outer, "x", Value::Number(1)).unwrap();
    let inner = env.create_child(outer).unwrap();
    env.define_constant(inner, "x", Value::Number(2)).unwrap();

    assert_eq!(env.lookup(inner, "x").get(), Ok(Value::Number(2)));
    assert_eq!(env.lookup(outer, "x").get(), Ok(Value::Number(1)));
}

#[test]
fn test_update_constant_fails_at_any_depth() {
    let mut env = Environment::new();
    let mut scope = env.entry();
    env.define_constant(scope, "limit", Value::Number(10)).unwrap();

    for _ in 0..5 {
        scope = env.create_child(scope).unwrap();
        let err = env.update(scope, "limit", Value::Number(0)).unwrap_err();
        assert_eq!(
            err.kind,
            RuntimeErrorKind::ConstantReassignment("limit".to_string())
        );
    }
    assert_eq!(env.lookup(scope, "limit").get(), Ok(Value::Number(10)));
}

#[test]
fn test_update_writes_defining_scope() {
    let mut env = Environment::new();
    let outer = env.entry();
    env.define(outer, "y", Value::Memory(-1)).unwrap();
    let inner = env.create_child(outer).unwrap();

    env.update(inner, "y", Value::Memory(6)).unwrap();
    assert_eq!(env.lookup(outer, "y").get(), Ok(Value::Memory(6)));
}

#[test]
fn test_update_undefined_is_unresolved() {
    let mut env = Environment::new();
    let err = env
        .update(env.entry(), "ghost", Value::Number(1))
        .unwrap_err();
    assert_eq!(err.code(), "E4001");
}

#[test]
fn test_define_twice_in_same_scope() {
    let mut env = Environment::new();
    let scope = env.entry();
    env.define(scope, "x", Value::Memory(0)).unwrap();
    let err = env.define(scope, "x", Value::Memory(1)).unwrap_err();
    assert_eq!(err.kind, RuntimeErrorKind::AlreadyDefined("x".to_string()));
}

#[test]
fn test_root_is_a_constant_scope() {
    let mut env = Environment::with_globals([("ONE".to_string(), Value::Number(1))]).unwrap();
    let root = env.root();

    assert!(env.is_constant_scope(root).unwrap());
    assert!(!env.is_constant_scope(env.entry()).unwrap());
    assert_eq!(env.lookup(env.entry(), "ONE").get(), Ok(Value::Number(1)));

    let err = env.define(root, "v", Value::Memory(0)).unwrap_err();
    assert_eq!(err.kind, RuntimeErrorKind::ConstantScope("v".to_string()));
}

#[test]
fn test_labels_resolve_to_their_scope() {
    let mut env = Environment::new();
    let outer = env.entry();
    env.declare_jump(outer, "loop", 2).unwrap();
    let inner = env.create_child(outer).unwrap();

    let Value::Jump(target) = env.lookup(inner, "loop").get().unwrap() else {
        panic!("expected a jump reference");
    };
    assert_eq!(target.scope, outer);
    assert_eq!(target.index, 2);
    assert!(env.declare_jump(outer, "loop", 5).is_err());
}

#[test]
fn test_reserved_addresses_count_down_and_are_inherited() {
    let mut env = Environment::new();
    let outer = env.entry();
    assert_eq!(env.reserve_address(outer).unwrap(), -1);
    assert_eq!(env.reserve_address(outer).unwrap(), -2);

    let inner = env.create_child(outer).unwrap();
    assert_eq!(env.reserve_address(inner).unwrap(), -3);
    assert_eq!(env.reserve_address(outer).unwrap(), -3);
}

#[test]
fn test_release_frees_and_cascades() {
    let mut env = Environment::new();
    let entry = env.entry();
    let child = env.create_child(entry).unwrap();
    let grandchild = env.create_child(child).unwrap();
    // the activation moved to the grandchild
    env.release(child).unwrap();
    assert_eq!(env.live_scopes(), 4);

    env.release(grandchild).unwrap();
    assert!(!env.is_alive(grandchild));
    assert!(!env.is_alive(child));
    assert!(env.is_alive(entry));
    assert_eq!(env.live_scopes(), 2);

    let err = env.lookup_binding(grandchild, "x").get().unwrap_err();
    assert_eq!(err, IllegalRequest("binding `x`".to_string()));
    assert_eq!(
        env.define(grandchild, "x", Value::Void).unwrap_err().kind,
        RuntimeErrorKind::StaleScope
    );
}

#[test]
fn test_freed_slots_are_reused_with_new_generation() {
    let mut env = Environment::new();
    let entry = env.entry();
    let first = env.create_child(entry).unwrap();
    env.release(first).unwrap();
    let second = env.create_child(entry).unwrap();

    assert_ne!(first, second);
    assert!(env.is_alive(second));
    assert!(!env.is_alive(first));
    assert_eq!(env.live_scopes(), 3);
}

#[test]
fn test_transfer_moves_reference() {
    let mut env = Environment::new();
    let entry = env.entry();
    let child = env.create_child(entry).unwrap();
    env.transfer(child, entry).unwrap();
    assert!(!env.is_alive(child));
    env.transfer(entry, entry).unwrap();
    assert!(env.is_alive(entry));
}

#[test]
fn test_resolve_jump_skips_bindings() {
    let mut env = Environment::new();
    let outer = env.entry();
    env.declare_jump(outer, "start", 0).unwrap();
    let inner = env.create_child(outer).unwrap();
    env.define_constant(inner, "start", Value::Number(3)).unwrap();

    assert_eq!(env.lookup(inner, "start").get(), Ok(Value::Number(3)));
    let target = env.resolve_jump(inner, "start").get().unwrap();
    assert_eq!(target.scope, outer);
    assert!(!env.resolve_jump(inner, "finish").is_present());
}
