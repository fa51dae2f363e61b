//! Transition-table state machine
//!
//! States are plain keys; anything a state needs to remember lives with the
//! caller. Transitions out of a state are checked highest priority first and
//! at most one fires per [`StateMachine::update`].

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

/// A state key
pub trait State: Copy + Eq + Hash + fmt::Debug {}

impl<T> State for T where T: Copy + Eq + Hash + fmt::Debug {}

/// Transition condition
pub type TransitionCondition<C> = Box<dyn Fn(&C) -> bool + Send + Sync>;

/// A state transition
pub struct Transition<S, C> {
    /// Target state
    pub to: S,
    /// Condition function
    pub condition: TransitionCondition<C>,
    /// Priority (higher = checked first)
    pub priority: i32,
    /// Human readable reason, reported when the transition fires
    pub label: &'static str,
}

impl<S, C> Transition<S, C> {
    pub fn new<F>(to: S, condition: F) -> Self
    where
        F: Fn(&C) -> bool + Send + Sync + 'static,
    {
        Self {
            to,
            condition: Box::new(condition),
            priority: 0,
            label: "",
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_label(mut self, label: &'static str) -> Self {
        self.label = label;
        self
    }

    /// Check if transition should occur
    pub fn should_transition(&self, context: &C) -> bool {
        (self.condition)(context)
    }
}

impl<S: fmt::Debug, C> fmt::Debug for Transition<S, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transition")
            .field("to", &self.to)
            .field("priority", &self.priority)
            .field("label", &self.label)
            .finish()
    }
}

/// A transition that fired
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fired<S> {
    pub from: S,
    pub to: S,
    pub label: &'static str,
}

/// Finite state machine over a transition table
pub struct StateMachine<S, C>
where
    S: State,
{
    current: S,
    previous: Option<S>,
    /// Outgoing transitions per state, kept sorted by descending priority
    transitions: HashMap<S, Vec<Transition<S, C>>>,
}

impl<S, C> StateMachine<S, C>
where
    S: State,
{
    pub fn new(initial: S) -> Self {
        Self {
            current: initial,
            previous: None,
            transitions: HashMap::new(),
        }
    }

    /// Add a transition
    pub fn add(&mut self, from: S, transition: Transition<S, C>) {
        let list = self.transitions.entry(from).or_default();
        // Stable: equal priorities keep insertion order
        let at = list
            .iter()
            .position(|t| t.priority < transition.priority)
            .unwrap_or(list.len());
        list.insert(at, transition);
    }

    /// Add a labelled transition with priority
    pub fn add_transition<F>(
        &mut self,
        from: S,
        to: S,
        priority: i32,
        label: &'static str,
        condition: F,
    ) where
        F: Fn(&C) -> bool + Send + Sync + 'static,
    {
        self.add(
            from,
            Transition::new(to, condition)
                .with_priority(priority)
                .with_label(label),
        );
    }

    pub fn current(&self) -> S {
        self.current
    }

    pub fn previous(&self) -> Option<S> {
        self.previous
    }

    /// Outgoing transitions of `state`, highest priority first
    pub fn transitions_from(&self, state: S) -> &[Transition<S, C>] {
        self.transitions
            .get(&state)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Force transition to a state
    pub fn force_transition(&mut self, to: S) {
        self.previous = Some(self.current);
        self.current = to;
    }

    /// Fire the first satisfied transition out of the current state, if any
    pub fn update(&mut self, context: &C) -> Option<Fired<S>> {
        let from = self.current;
        let transition = self
            .transitions_from(from)
            .iter()
            .find(|t| t.should_transition(context))?;
        let fired = Fired {
            from,
            to: transition.to,
            label: transition.label,
        };
        self.force_transition(fired.to);
        Some(fired)
    }

    pub fn is_in(&self, state: S) -> bool {
        self.current == state
    }
}

impl<S, C> fmt::Debug for StateMachine<S, C>
where
    S: State,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateMachine")
            .field("current", &self.current)
            .field("previous", &self.previous)
            .field("transitions", &self.transitions)
            .finish()
    }
}
