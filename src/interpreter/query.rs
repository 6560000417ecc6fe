//! Lookup results that may be absent

use std::fmt;

use thiserror::Error;

/// Raised when an absent [`QueryItem`] is unwrapped with [`QueryItem::get`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("illegal request: no value for {0}")]
pub struct IllegalRequest(pub String);

type Insert<'s, T> = Box<dyn FnOnce(&T) + 's>;

/// The outcome of a lookup, with a description of what was asked for
///
/// An item may be backed by the store it was read from. [`QueryItem::or_else_add`]
/// then writes the fallback value into that store before returning it.
pub struct QueryItem<'s, T> {
    description: String,
    value: Option<T>,
    insert: Option<Insert<'s, T>>,
}

impl<'s, T> QueryItem<'s, T> {
    pub fn present(description: impl Into<String>, value: T) -> Self {
        Self::from_option(description, Some(value))
    }

    pub fn absent(description: impl Into<String>) -> Self {
        Self::from_option(description, None)
    }

    /// Detached item; `or_else_add` has nowhere to store its fallback
    pub fn from_option(description: impl Into<String>, value: Option<T>) -> Self {
        Self {
            description: description.into(),
            value,
            insert: None,
        }
    }

    /// Item whose fallback is handed to `insert` when absent
    pub fn backed(
        description: impl Into<String>,
        value: Option<T>,
        insert: impl FnOnce(&T) + 's,
    ) -> Self {
        Self {
            description: description.into(),
            value,
            insert: Some(Box::new(insert)),
        }
    }

    pub fn is_present(&self) -> bool {
        self.value.is_some()
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn get(self) -> Result<T, IllegalRequest> {
        self.value.ok_or(IllegalRequest(self.description))
    }

    /// The value, or `fallback()` stored into the backing source when absent
    pub fn or_else_add(self, fallback: impl FnOnce() -> T) -> T {
        if let Some(value) = self.value {
            return value;
        }
        let value = fallback();
        if let Some(insert) = self.insert {
            insert(&value);
        }
        value
    }

    pub fn or_else_throw<E>(self, error: impl FnOnce() -> E) -> Result<T, E> {
        self.value.ok_or_else(error)
    }

    pub fn into_option(self) -> Option<T> {
        self.value
    }

    /// Transform the value; the result is detached from the source
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> QueryItem<'s, U> {
        QueryItem::from_option(self.description, self.value.map(f))
    }
}

impl<T: fmt::Debug> fmt::Debug for QueryItem<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryItem")
            .field("description", &self.description)
            .field("value", &self.value)
            .field("backed", &self.insert.is_some())
            .finish()
    }
}
