//! Revisioned publish/subscribe cell.
//!
//! Writers call [`SharedState::set`]; readers hold a [`Subscription`] and
//! poll it once per tick. Everything runs on the tick thread, so no locking.

use crate::transport::ViewportId;

#[derive(Debug, Clone)]
pub struct SharedState<T> {
    value: T,
    revision: u64,
    last_writer: Option<ViewportId>,
}

impl<T: Default> Default for SharedState<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> SharedState<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            revision: 0,
            last_writer: None,
        }
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    /// `None` as writer means the session itself (resets, UI actions).
    pub fn set(&mut self, writer: Option<ViewportId>, value: T) {
        self.value = value;
        self.bump(writer);
    }

    pub fn update(&mut self, writer: Option<ViewportId>, edit: impl FnOnce(&mut T)) {
        edit(&mut self.value);
        self.bump(writer);
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn last_writer(&self) -> Option<ViewportId> {
        self.last_writer
    }

    /// A subscription that has already seen the current value.
    pub fn subscribe(&self) -> Subscription {
        Subscription {
            seen: Some(self.revision),
        }
    }

    /// A subscription that will yield the current value on its first poll.
    pub fn subscribe_fresh(&self) -> Subscription {
        Subscription::default()
    }

    fn bump(&mut self, writer: Option<ViewportId>) {
        self.revision += 1;
        self.last_writer = writer;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Subscription {
    seen: Option<u64>,
}

impl Subscription {
    pub fn poll<'a, T>(&mut self, state: &'a SharedState<T>) -> Option<&'a T> {
        if self.seen == Some(state.revision) {
            return None;
        }
        self.seen = Some(state.revision);
        Some(&state.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribers_see_each_revision_once() {
        let mut state = SharedState::new(1);
        let mut sub = state.subscribe();
        assert_eq!(sub.poll(&state), None);

        state.set(Some(ViewportId(0)), 2);
        assert_eq!(sub.poll(&state), Some(&2));
        assert_eq!(sub.poll(&state), None);
        assert_eq!(state.last_writer(), Some(ViewportId(0)));
    }

    #[test]
    fn intermediate_writes_collapse_into_the_latest() {
        let mut state = SharedState::new(0);
        let mut sub = state.subscribe();
        for value in 1..=5 {
            state.update(None, |v| *v = value);
        }
        assert_eq!(sub.poll(&state), Some(&5));
        assert_eq!(state.revision(), 5);
    }

    #[test]
    fn fresh_subscriptions_yield_the_current_value() {
        let state = SharedState::new("dark");
        let mut sub = state.subscribe_fresh();
        assert_eq!(sub.poll(&state), Some(&"dark"));
        assert_eq!(sub.poll(&state), None);
    }
}
