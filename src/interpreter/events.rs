//! Host-facing events emitted while a program runs

use std::cell::RefCell;
use std::rc::Rc;

use serde::Serialize;

use crate::diagnostics::Severity;

/// A message for whoever embeds the interpreter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Event {
    pub severity: Severity,
    pub message: String,
}

impl Event {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Severity::Info, message)
    }

    pub fn log(message: impl Into<String>) -> Self {
        Self::new(Severity::Log, message)
    }
}

/// Receiver of interpreter events
pub trait EventSink {
    fn emit(&mut self, event: Event);
}

/// Forwards events to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&mut self, event: Event) {
        match event.severity {
            Severity::Error => tracing::error!("{}", event.message),
            Severity::Warning => tracing::warn!("{}", event.message),
            Severity::Info => tracing::info!("{}", event.message),
            Severity::Log => tracing::trace!("{}", event.message),
        }
    }
}

/// Keeps every event in order
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    pub events: Vec<Event>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_severity(&self, severity: Severity) -> impl Iterator<Item = &Event> {
        self.events
            .iter()
            .filter(move |event| event.severity == severity)
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: Event) {
        self.events.push(event);
    }
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn emit(&mut self, event: Event) {
        (**self).emit(event);
    }
}

/// Shared sink the host can still read after handing a clone to the interpreter
impl<S: EventSink> EventSink for Rc<RefCell<S>> {
    fn emit(&mut self, event: Event) {
        self.borrow_mut().emit(event);
    }
}
