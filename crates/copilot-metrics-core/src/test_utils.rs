//! Environment helpers for configuration tests

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::env;
use std::sync::{Mutex, MutexGuard};

static ENV_MUTEX: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

/// Exclusive access to the process environment for one test
///
/// Holds the environment lock for its lifetime and puts every touched
/// variable back on drop.
pub struct EnvVarGuard {
    saved: HashMap<String, Option<String>>,
    _lock: MutexGuard<'static, ()>,
}

impl EnvVarGuard {
    /// Lock the environment and clear `keys`
    pub fn cleared(keys: &[&str]) -> Self {
        let mut guard = Self {
            saved: HashMap::new(),
            _lock: ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner()),
        };
        for key in keys {
            guard.remove(key);
        }
        guard
    }

    pub fn set(&mut self, key: &str, value: &str) {
        self.remember(key);
        // set_var and remove_var are unsafe since the 2024 edition
        unsafe { env::set_var(key, value) }
    }

    pub fn remove(&mut self, key: &str) {
        self.remember(key);
        unsafe { env::remove_var(key) }
    }

    fn remember(&mut self, key: &str) {
        self.saved
            .entry(key.to_string())
            .or_insert_with(|| env::var(key).ok());
    }
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        for (key, value) in self.saved.drain() {
            unsafe {
                match value {
                    Some(v) => env::set_var(&key, v),
                    None => env::remove_var(&key),
                }
            }
        }
    }
}
