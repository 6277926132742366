//! Bind pass events.
//!
//! The binder reports what it does through a [`BindObserver`]. The default,
//! [`LogObserver`], forwards events to the `log` facade; tests and tools can
//! install their own to record or display them.

use log::{debug, info, trace};
use toml::Value;

use crate::error::CastError;

/// Outcome of a bind pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BindSummary {
    /// Records visited, root included.
    pub records: usize,
    /// Fields that were assigned, with the value that was resolved for them.
    pub assigned: Vec<(String, Value)>,
}

impl BindSummary {
    pub fn was_assigned(&self, key: &str) -> bool {
        self.assigned.iter().any(|(k, _)| k == key)
    }
}

#[derive(Debug)]
pub enum BindEvent<'a> {
    FieldVisited { name: &'a str, key: Option<&'a str> },
    EnvBound { key: &'a str, env: &'a str },
    FlagBound { key: &'a str, flag: &'a str },
    /// Default-path coercion failed; the field received its zero value.
    CoercionFallback { key: &'a str, error: &'a CastError },
    ReadOnlySkipped { key: &'a str },
    ValueSet { key: &'a str, value: &'a Value },
    PassComplete { summary: &'a BindSummary },
}

pub trait BindObserver {
    fn on_event(&self, event: &BindEvent<'_>);
}

/// Writes bind events to the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl BindObserver for LogObserver {
    fn on_event(&self, event: &BindEvent<'_>) {
        match event {
            BindEvent::FieldVisited { name, key } => {
                debug!("Binding field {name} (key: {})", key.unwrap_or("-"))
            }
            BindEvent::EnvBound { key, env } => trace!("Binding env {env} to {key}"),
            BindEvent::FlagBound { key, flag } => trace!("Binding flag --{flag} to {key}"),
            BindEvent::CoercionFallback { key, error } => {
                debug!("Could not convert value for {key} ({error}), using zero value")
            }
            BindEvent::ReadOnlySkipped { key } => trace!("Field {key} is not settable, skipping"),
            BindEvent::ValueSet { key, value } => debug!("Setting {key} = {value}"),
            BindEvent::PassComplete { summary } => {
                info!(
                    "Bound configuration: {} record(s), {} field(s) set",
                    summary.records,
                    summary.assigned.len()
                );
                for (key, value) in &summary.assigned {
                    debug!("  {key} = {value}");
                }
            }
        }
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl BindObserver for NoopObserver {
    fn on_event(&self, _event: &BindEvent<'_>) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_tracks_assigned_keys() {
        let summary = BindSummary {
            records: 1,
            assigned: vec![("port".into(), Value::Integer(80))],
        };
        assert!(summary.was_assigned("port"));
        assert!(!summary.was_assigned("host"));
    }

    #[test]
    fn builtin_observers_accept_every_event() {
        let error = CastError::new("bad");
        let value = Value::Boolean(true);
        let summary = BindSummary {
            records: 1,
            assigned: vec![("port".into(), Value::Integer(80))],
        };
        let events = [
            BindEvent::FieldVisited { name: "port", key: None },
            BindEvent::EnvBound { key: "port", env: "PORT" },
            BindEvent::FlagBound { key: "port", flag: "port" },
            BindEvent::CoercionFallback { key: "port", error: &error },
            BindEvent::ReadOnlySkipped { key: "port" },
            BindEvent::ValueSet { key: "port", value: &value },
            BindEvent::PassComplete { summary: &summary },
        ];
        for event in &events {
            LogObserver.on_event(event);
            NoopObserver.on_event(event);
        }
    }
}
