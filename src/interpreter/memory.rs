//! Flat addressable memory of the machine

use std::collections::BTreeMap;

use super::query::QueryItem;
use super::value::Value;

/// Address to value mapping with the snapshot taken at construction
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Memory {
    cells: BTreeMap<i64, Value>,
    initial: BTreeMap<i64, Value>,
}

impl Memory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Memory with addresses `0..capacity` set to zero
    pub fn with_capacity(capacity: usize) -> Self {
        let cells: BTreeMap<i64, Value> = (0..capacity as i64)
            .map(|address| (address, Value::Number(0)))
            .collect();
        Self::from_mapping(cells)
    }

    /// Memory that starts from (and resets to) `cells`
    pub fn from_mapping(cells: BTreeMap<i64, Value>) -> Self {
        Self {
            initial: cells.clone(),
            cells,
        }
    }

    /// Value at `address`; an unset address reads as zero and is recorded
    pub fn load_value(&mut self, address: i64) -> Value {
        self.query(address).or_else_add(|| Value::Number(0))
    }

    pub fn store_value(&mut self, address: i64, value: Value) {
        self.cells.insert(address, value);
    }

    /// Value at `address`; `or_else_add` writes its fallback into the cell
    pub fn query(&mut self, address: i64) -> QueryItem<'_, Value> {
        let value = self.cells.get(&address).cloned();
        let cells = &mut self.cells;
        QueryItem::backed(format!("memory address {address}"), value, move |value| {
            cells.insert(address, value.clone());
        })
    }

    pub fn mapping(&self) -> &BTreeMap<i64, Value> {
        &self.cells
    }

    pub fn snapshot(&self) -> BTreeMap<i64, Value> {
        self.cells.clone()
    }

    /// Restore the mapping captured at construction
    pub fn reset(&mut self) {
        self.cells = self.initial.clone();
    }

    /// One `address = value` line per non-zero cell
    pub fn render(&self) -> String {
        self.cells
            .iter()
            .filter(|(_, value)| **value != Value::Number(0))
            .map(|(address, value)| format!("{address} = {value}"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
