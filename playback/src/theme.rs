//! Process-wide theme flag backed by persistent storage.

use std::fmt::Debug;

use crate::store::{SharedState, Subscription};

/// Where the flag lives between runs.
pub trait ThemeStorage: Debug {
    type Error: std::error::Error;

    fn load(&self) -> Option<bool>;

    fn store(&mut self, dark_mode: bool) -> Result<(), Self::Error>;
}

#[derive(Debug)]
pub struct ThemeConfig<S> {
    storage: S,
    state: SharedState<bool>,
}

impl<S: ThemeStorage> ThemeConfig<S> {
    /// Reads the stored flag, light mode when nothing was stored.
    pub fn load(storage: S) -> Self {
        let dark_mode = storage.load().unwrap_or(false);
        Self {
            storage,
            state: SharedState::new(dark_mode),
        }
    }

    pub fn get(&self) -> bool {
        *self.state.get()
    }

    /// Writes through to storage. The in-memory value changes even when the
    /// write fails.
    pub fn set(&mut self, dark_mode: bool) -> Result<(), S::Error> {
        if self.get() == dark_mode {
            return Ok(());
        }
        self.state.set(None, dark_mode);
        self.storage.store(dark_mode)
    }

    pub fn toggle(&mut self) -> Result<bool, S::Error> {
        let dark_mode = !self.get();
        self.set(dark_mode)?;
        Ok(dark_mode)
    }

    pub fn subscribe(&self) -> Subscription {
        self.state.subscribe_fresh()
    }

    pub fn poll(&self, subscription: &mut Subscription) -> Option<bool> {
        subscription.poll(&self.state).copied()
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use super::*;

    #[derive(Debug, Default)]
    struct MemoryStorage {
        value: Option<bool>,
        writes: usize,
    }

    impl ThemeStorage for MemoryStorage {
        type Error = Infallible;

        fn load(&self) -> Option<bool> {
            self.value
        }

        fn store(&mut self, dark_mode: bool) -> Result<(), Infallible> {
            self.value = Some(dark_mode);
            self.writes += 1;
            Ok(())
        }
    }

    #[test]
    fn starts_from_storage_and_writes_back() {
        let mut theme = ThemeConfig::load(MemoryStorage {
            value: Some(true),
            writes: 0,
        });
        assert!(theme.get());

        assert_eq!(theme.toggle(), Ok(false));
        assert_eq!(theme.storage().value, Some(false));
        theme.set(false).unwrap();
        assert_eq!(theme.storage().writes, 1);
    }

    #[test]
    fn subscribers_hear_each_change() {
        let mut theme = ThemeConfig::load(MemoryStorage::default());
        let mut subscription = theme.subscribe();
        assert_eq!(theme.poll(&mut subscription), Some(false));
        assert_eq!(theme.poll(&mut subscription), None);

        theme.toggle().unwrap();
        assert_eq!(theme.poll(&mut subscription), Some(true));
    }
}
