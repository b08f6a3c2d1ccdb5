//! Helpers shared by the CLI's unit tests.

use std::sync::{Mutex, MutexGuard};

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Serialize tests that read or write process environment variables.
pub fn lock_env() -> MutexGuard<'static, ()> {
    ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Environment variables the config resolver reads.
pub const CONFIG_VARS: &[&str] = &[
    "GEMINI_API_KEY",
    "UPCYCLE_GEMINI_MODEL",
    "UPCYCLE_MAX_ATTEMPTS",
    "UPCYCLE_BASE_DELAY_MS",
];

/// Point `XDG_CONFIG_HOME` at `dir` and clear every config variable,
/// restoring the previous values on drop. Hold [`lock_env`] while it lives.
pub struct ScopedEnv {
    saved: Vec<(&'static str, Option<String>)>,
}

impl ScopedEnv {
    pub fn isolated(dir: &std::path::Path) -> Self {
        let mut saved = Vec::new();
        for &name in CONFIG_VARS.iter().chain(&["XDG_CONFIG_HOME"]) {
            saved.push((name, std::env::var(name).ok()));
            unsafe { std::env::remove_var(name) };
        }
        unsafe { std::env::set_var("XDG_CONFIG_HOME", dir) };
        Self { saved }
    }

    pub fn set(&self, name: &str, value: &str) {
        unsafe { std::env::set_var(name, value) };
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (name, value) in &self.saved {
            match value {
                Some(v) => unsafe { std::env::set_var(name, v) },
                None => unsafe { std::env::remove_var(name) },
            }
        }
    }
}
