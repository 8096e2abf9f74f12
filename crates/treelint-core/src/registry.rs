//! Listener registration and dispatch.
//!
//! Each rule returns a [`Listeners`] set from `Rule::create`. The linter
//! folds them into one [`ListenerRegistry`]; listeners registered under the
//! same event name run in registration order.

use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::trace;

use crate::context::{ActiveRule, RuleContext};
use crate::error::LintError;
use crate::report::Report;
use crate::source::SourceCode;
use crate::traverse::EventSink;
use crate::tree::Node;

/// Payload of an event.
#[derive(Debug, Clone, Copy)]
pub enum EventArgs<'t> {
    /// A node matched by a selector.
    Node(Node<'t>),
    /// Arguments of a call event such as [`crate::END_OF_FILE`].
    Call(&'t [Value]),
}

/// A boxed listener callback.
pub type Listener<'a> =
    Box<dyn FnMut(&mut RuleContext<'_>, &EventArgs<'_>) -> Result<(), LintError> + 'a>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EventKind {
    Selector,
    Call,
}

/// Listeners returned by one rule, keyed by selector or call event name.
#[derive(Default)]
pub struct Listeners<'a> {
    entries: Vec<(EventKind, String, Listener<'a>)>,
}

impl<'a> Listeners<'a> {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Listens for nodes matching `selector`. Append `:exit` to fire when
    /// the node is left.
    #[must_use]
    pub fn on<F>(mut self, selector: impl Into<String>, mut handler: F) -> Self
    where
        F: FnMut(&mut RuleContext<'_>, Node<'_>) -> Result<(), LintError> + 'a,
    {
        self.entries.push((
            EventKind::Selector,
            selector.into(),
            Box::new(move |ctx: &mut RuleContext<'_>, args: &EventArgs<'_>| match args {
                EventArgs::Node(node) => handler(ctx, *node),
                EventArgs::Call(_) => Ok(()),
            }),
        ));
        self
    }

    /// Listens for a call event emitted by name, such as
    /// [`crate::END_OF_FILE`].
    #[must_use]
    pub fn on_call<F>(mut self, event: impl Into<String>, mut handler: F) -> Self
    where
        F: FnMut(&mut RuleContext<'_>, &[Value]) -> Result<(), LintError> + 'a,
    {
        self.entries.push((
            EventKind::Call,
            event.into(),
            Box::new(move |ctx: &mut RuleContext<'_>, args: &EventArgs<'_>| match args {
                EventArgs::Call(values) => handler(ctx, values),
                EventArgs::Node(_) => Ok(()),
            }),
        ));
        self
    }

    /// Registers a raw selector listener.
    #[must_use]
    pub fn on_event(mut self, selector: impl Into<String>, listener: Listener<'a>) -> Self {
        self.entries
            .push((EventKind::Selector, selector.into(), listener));
        self
    }

    /// Number of listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no listener was added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for Listeners<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|(_, name, _)| name))
            .finish()
    }
}

/// All listeners of one lint call.
#[derive(Default)]
pub struct ListenerRegistry<'a> {
    selectors: Vec<String>,
    by_selector: HashMap<String, Vec<(usize, Listener<'a>)>>,
    by_call: HashMap<String, Vec<(usize, Listener<'a>)>>,
}

impl<'a> ListenerRegistry<'a> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the listeners of the rule at `slot` in the active rule list.
    pub fn register(&mut self, slot: usize, listeners: Listeners<'a>) {
        for (kind, name, listener) in listeners.entries {
            trace!(slot, event = %name, "registering listener");
            let map = match kind {
                EventKind::Selector => &mut self.by_selector,
                EventKind::Call => &mut self.by_call,
            };
            let list = map.entry(name.clone()).or_default();
            if list.is_empty() && kind == EventKind::Selector {
                self.selectors.push(name);
            }
            list.push((slot, listener));
        }
    }

    /// Selector texts in first-registration order.
    #[must_use]
    pub fn selectors(&self) -> &[String] {
        &self.selectors
    }

    /// Listener count for a selector or call event.
    #[must_use]
    pub fn listener_count(&self, event: &str) -> usize {
        self.by_selector.get(event).map_or(0, Vec::len)
            + self.by_call.get(event).map_or(0, Vec::len)
    }
}

impl fmt::Debug for ListenerRegistry<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("selectors", &self.selectors)
            .field("calls", &self.by_call.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Routes traversal events to registered listeners.
pub(crate) struct Dispatcher<'r, 'a> {
    pub(crate) registry: &'r mut ListenerRegistry<'a>,
    pub(crate) rules: &'r [ActiveRule],
    pub(crate) source: &'r SourceCode,
    pub(crate) settings: &'r toml::Table,
    pub(crate) report: &'r mut Report,
    /// Listener time per rule slot, when stats are on.
    pub(crate) timings: Option<&'r mut [Duration]>,
}

impl<'t> EventSink<'t> for Dispatcher<'_, '_> {
    fn emit(
        &mut self,
        event: &str,
        args: &EventArgs<'t>,
        ancestors: &[Node<'t>],
    ) -> Result<(), LintError> {
        let map = match args {
            EventArgs::Node(_) => &mut self.registry.by_selector,
            EventArgs::Call(_) => &mut self.registry.by_call,
        };
        let Some(listeners) = map.get_mut(event) else {
            return Ok(());
        };
        for (slot, listener) in listeners.iter_mut() {
            let rule = &self.rules[*slot];
            let started = self.timings.is_some().then(Instant::now);
            let mut ctx = RuleContext::new(rule, self.source, self.settings, ancestors, self.report);
            listener(&mut ctx, args).map_err(|e| e.in_rule(rule.id()))?;
            if let (Some(timings), Some(started)) = (self.timings.as_deref_mut(), started) {
                timings[*slot] += started.elapsed();
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_keeps_first_registration_order() {
        let mut registry = ListenerRegistry::new();
        registry.register(
            0,
            Listeners::new()
                .on("Identifier", |_ctx: &mut RuleContext<'_>, _node: Node<'_>| Ok(()))
                .on("Program:exit", |_ctx: &mut RuleContext<'_>, _node: Node<'_>| Ok(()))
                .on_call("end-of-file", |_ctx: &mut RuleContext<'_>, _args: &[Value]| Ok(())),
        );
        registry.register(
            1,
            Listeners::new().on("Identifier", |_ctx: &mut RuleContext<'_>, _node: Node<'_>| Ok(())),
        );
        assert_eq!(registry.selectors(), ["Identifier", "Program:exit"]);
        assert_eq!(registry.listener_count("Identifier"), 2);
        assert_eq!(registry.listener_count("end-of-file"), 1);
        assert_eq!(registry.listener_count("Statement"), 0);
    }

    #[test]
    fn listeners_debug_lists_names() {
        let listeners =
            Listeners::new().on("Identifier", |_ctx: &mut RuleContext<'_>, _node: Node<'_>| Ok(()));
        assert_eq!(listeners.len(), 1);
        assert_eq!(format!("{listeners:?}"), "[\"Identifier\"]");
    }
}
