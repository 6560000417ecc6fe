//! Lexical scopes for the Mima interpreter.
//!
//! Scopes live in an arena and refer to their parent by handle. Every scope
//! counts the references that keep it alive: child scopes, the running
//! activation, the host and return points captured by `CALL`. When the count
//! drops to zero the slot is freed and the parent loses one reference in turn.
//! Freed slots bump their generation so stale handles are detected.

use std::collections::HashMap;
use std::rc::Rc;

use serde::Serialize;

use super::error::{RuntimeError, RuntimeErrorKind};
use super::query::QueryItem;
use super::value::{JumpRef, Value};
use crate::parser::ast::Block;

/// Handle to a scope record in an [`Environment`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ScopeId {
    index: u32,
    generation: u32,
}

/// A named value; constants are write-once
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub value: Value,
    pub constant: bool,
}

#[derive(Debug)]
struct Scope {
    parent: Option<ScopeId>,
    bindings: HashMap<String, Binding>,
    jumps: HashMap<String, usize>,
    constant_scope: bool,
    block: Option<Rc<Block>>,
    resume_at: usize,
    next_reserved: i64,
    refs: usize,
}

impl Scope {
    fn new(parent: Option<ScopeId>, next_reserved: i64, constant_scope: bool) -> Self {
        Self {
            parent,
            bindings: HashMap::new(),
            jumps: HashMap::new(),
            constant_scope,
            block: None,
            resume_at: 0,
            next_reserved,
            refs: 1,
        }
    }
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    scope: Option<Scope>,
}

/// Arena of nested scopes.
///
/// A fresh environment holds a constant root scope for host-defined globals and
/// an `entry` scope below it where programs run, so top-level bindings stay
/// inspectable after a run.
#[derive(Debug)]
pub struct Environment {
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: ScopeId,
    entry: ScopeId,
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment {
    pub fn new() -> Self {
        let root = ScopeId {
            index: 0,
            generation: 0,
        };
        let mut env = Self {
            slots: vec![Slot {
                generation: 0,
                scope: Some(Scope::new(None, -1, true)),
            }],
            free: Vec::new(),
            root,
            entry: root,
        };
        env.entry = env.allocate(Scope::new(Some(root), -1, false));
        if let Some(root_scope) = env.slots[0].scope.as_mut() {
            root_scope.refs += 1;
        }
        env
    }

    /// Environment whose root scope holds the given constants
    pub fn with_globals(
        globals: impl IntoIterator<Item = (String, Value)>,
    ) -> Result<Self, RuntimeError> {
        let mut env = Self::new();
        let root = env.root;
        for (name, value) in globals {
            env.define_constant(root, &name, value)?;
        }
        Ok(env)
    }

    pub fn root(&self) -> ScopeId {
        self.root
    }

    /// Scope in which programs execute
    pub fn entry(&self) -> ScopeId {
        self.entry
    }

    pub fn is_alive(&self, id: ScopeId) -> bool {
        self.scope(id).is_ok()
    }

    /// Number of scopes currently allocated
    pub fn live_scopes(&self) -> usize {
        self.slots.iter().filter(|slot| slot.scope.is_some()).count()
    }

    pub fn parent(&self, id: ScopeId) -> Result<Option<ScopeId>, RuntimeError> {
        Ok(self.scope(id)?.parent)
    }

    pub fn is_constant_scope(&self, id: ScopeId) -> Result<bool, RuntimeError> {
        Ok(self.scope(id)?.constant_scope)
    }

    /// Create a child of `parent`; the new scope starts with one reference
    pub fn create_child(&mut self, parent: ScopeId) -> Result<ScopeId, RuntimeError> {
        let parent_scope = self.scope_mut(parent)?;
        parent_scope.refs += 1;
        let next_reserved = parent_scope.next_reserved;
        Ok(self.allocate(Scope::new(Some(parent), next_reserved, false)))
    }

    /// Bind the block a scope executes and declare its jump labels, replacing
    /// labels of a previously attached block
    pub fn attach_block(
        &mut self,
        id: ScopeId,
        block: Rc<Block>,
        resume_at: usize,
    ) -> Result<(), RuntimeError> {
        self.scope_mut(id)?.jumps.clear();
        for (label, index) in &block.labels {
            self.declare_jump(id, label, *index)?;
        }
        let scope = self.scope_mut(id)?;
        scope.block = Some(block);
        scope.resume_at = resume_at;
        Ok(())
    }

    pub fn block(&self, id: ScopeId) -> Result<Option<Rc<Block>>, RuntimeError> {
        Ok(self.scope(id)?.block.clone())
    }

    /// Parent scope and the statement index to continue at once `id` finishes
    pub fn exit_point(&self, id: ScopeId) -> Result<Option<(ScopeId, usize)>, RuntimeError> {
        let scope = self.scope(id)?;
        Ok(scope.parent.map(|parent| (parent, scope.resume_at)))
    }

    /// Define a mutable variable in `id`
    pub fn define(&mut self, id: ScopeId, name: &str, value: Value) -> Result<(), RuntimeError> {
        let scope = self.scope_mut(id)?;
        if scope.constant_scope {
            return Err(RuntimeErrorKind::ConstantScope(name.to_string()).into());
        }
        Self::insert_binding(scope, name, value, false)
    }

    pub fn define_constant(
        &mut self,
        id: ScopeId,
        name: &str,
        value: Value,
    ) -> Result<(), RuntimeError> {
        let scope = self.scope_mut(id)?;
        Self::insert_binding(scope, name, value, true)
    }

    fn insert_binding(
        scope: &mut Scope,
        name: &str,
        value: Value,
        constant: bool,
    ) -> Result<(), RuntimeError> {
        if scope.bindings.contains_key(name) {
            return Err(RuntimeError::already_defined(name));
        }
        scope
            .bindings
            .insert(name.to_string(), Binding { value, constant });
        Ok(())
    }

    pub fn declare_jump(
        &mut self,
        id: ScopeId,
        name: &str,
        index: usize,
    ) -> Result<(), RuntimeError> {
        let scope = self.scope_mut(id)?;
        if scope.jumps.contains_key(name) {
            return Err(RuntimeError::already_defined(name));
        }
        scope.jumps.insert(name.to_string(), index);
        Ok(())
    }

    /// Hand out the next reserved (negative) memory address of `id`
    pub fn reserve_address(&mut self, id: ScopeId) -> Result<i64, RuntimeError> {
        let scope = self.scope_mut(id)?;
        let address = scope.next_reserved;
        scope.next_reserved -= 1;
        Ok(address)
    }

    /// Resolve `name` innermost-first: bindings, then jump labels
    pub fn lookup(&self, id: ScopeId, name: &str) -> QueryItem<'static, Value> {
        let found = self.ancestors(id).find_map(|(scope_id, scope)| {
            if let Some(binding) = scope.bindings.get(name) {
                return Some(binding.value.clone());
            }
            scope.jumps.get(name).map(|&index| {
                Value::Jump(JumpRef {
                    label: name.to_string(),
                    scope: scope_id,
                    index,
                })
            })
        });
        QueryItem::from_option(format!("`{name}`"), found)
    }

    /// The jump label `name` visible from `id`, ignoring variable bindings
    pub fn resolve_jump(&self, id: ScopeId, name: &str) -> QueryItem<'static, JumpRef> {
        let found = self.ancestors(id).find_map(|(scope_id, scope)| {
            scope.jumps.get(name).map(|&index| JumpRef {
                label: name.to_string(),
                scope: scope_id,
                index,
            })
        });
        QueryItem::from_option(format!("label `{name}`"), found)
    }

    /// The binding for `name` visible from `id`, with its defining scope
    pub fn lookup_binding(
        &self,
        id: ScopeId,
        name: &str,
    ) -> QueryItem<'static, (ScopeId, Binding)> {
        let found = self
            .ancestors(id)
            .find_map(|(scope_id, scope)| {
                scope
                    .bindings
                    .get(name)
                    .map(|binding| (scope_id, binding.clone()))
            });
        QueryItem::from_option(format!("binding `{name}`"), found)
    }

    /// Overwrite the nearest binding of `name`; constants are rejected
    pub fn update(&mut self, id: ScopeId, name: &str, value: Value) -> Result<(), RuntimeError> {
        let (owner, binding) = self
            .lookup_binding(id, name)
            .or_else_throw(|| RuntimeError::unresolved_reference(name))?;
        if binding.constant {
            return Err(RuntimeError::constant_reassignment(name));
        }
        let scope = self.scope_mut(owner)?;
        if let Some(slot) = scope.bindings.get_mut(name) {
            slot.value = value;
        }
        Ok(())
    }

    /// Bindings declared directly in `id`, sorted by name
    pub fn bindings(&self, id: ScopeId) -> Result<Vec<(String, Binding)>, RuntimeError> {
        let mut bindings: Vec<(String, Binding)> = self
            .scope(id)?
            .bindings
            .iter()
            .map(|(name, binding)| (name.clone(), binding.clone()))
            .collect();
        bindings.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(bindings)
    }

    pub fn retain(&mut self, id: ScopeId) -> Result<(), RuntimeError> {
        self.scope_mut(id)?.refs += 1;
        Ok(())
    }

    /// Drop one reference; frees the scope and walks up while counts reach zero
    pub fn release(&mut self, id: ScopeId) -> Result<(), RuntimeError> {
        let mut next = Some(id);
        while let Some(id) = next.take() {
            let scope = self.scope_mut(id)?;
            scope.refs = scope.refs.saturating_sub(1);
            if scope.refs > 0 {
                break;
            }
            next = scope.parent;
            self.free_slot(id);
        }
        Ok(())
    }

    /// Move one reference from `from` to `to`
    pub fn transfer(&mut self, from: ScopeId, to: ScopeId) -> Result<(), RuntimeError> {
        if from == to {
            return Ok(());
        }
        self.retain(to)?;
        self.release(from)
    }

    fn ancestors(&self, id: ScopeId) -> impl Iterator<Item = (ScopeId, &Scope)> {
        let mut current = Some(id);
        std::iter::from_fn(move || {
            let scope_id = current?;
            let scope = self.scope(scope_id).ok()?;
            current = scope.parent;
            Some((scope_id, scope))
        })
    }

    fn allocate(&mut self, scope: Scope) -> ScopeId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.scope = Some(scope);
            return ScopeId {
                index,
                generation: slot.generation,
            };
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            scope: Some(scope),
        });
        ScopeId {
            index,
            generation: 0,
        }
    }

    fn free_slot(&mut self, id: ScopeId) {
        if let Some(slot) = self.slots.get_mut(id.index as usize) {
            slot.scope = None;
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(id.index);
        }
    }

    fn scope(&self, id: ScopeId) -> Result<&Scope, RuntimeError> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.scope.as_ref())
            .ok_or_else(RuntimeError::stale_scope)
    }

    fn scope_mut(&mut self, id: ScopeId) -> Result<&mut Scope, RuntimeError> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.scope.as_mut())
            .ok_or_else(RuntimeError::stale_scope)
    }
}

#[cfg(test)]
#[path = "environment_tests.rs"]
mod tests;
