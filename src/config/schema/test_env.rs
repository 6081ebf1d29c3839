use std::sync::{LazyLock, Mutex, MutexGuard};

static ENV_LOCK: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

/// Every `COUPONWATCH_*`/`TWILIO_*` variable the config layer reads.
const MANAGED_VARS: &[&str] = &[
    "COUPONWATCH_CONFIG",
    "COUPONWATCH_BASE_URL",
    "COUPONWATCH_USER_AGENT",
    "COUPONWATCH_SCRAPE_INTERVAL_SECS",
    "COUPONWATCH_STORE_PATH",
    "COUPONWATCH_ACCOUNT_SID",
    "COUPONWATCH_AUTH_TOKEN",
    "COUPONWATCH_FROM_NUMBER",
    "COUPONWATCH_TO_NUMBER",
    "TWILIO_ACCOUNT_SID",
    "TWILIO_AUTH_TOKEN",
];

/// Serializes env-var tests and restores every managed variable on drop.
///
/// All managed variables start out unset inside the scope.
pub(crate) struct EnvScope {
    saved: Vec<(&'static str, Option<String>)>,
    _lock: MutexGuard<'static, ()>,
}

impl EnvScope {
    pub(crate) fn clean() -> Self {
        let lock = ENV_LOCK
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let saved = MANAGED_VARS
            .iter()
            .map(|key| (*key, std::env::var(key).ok()))
            .collect();
        for key in MANAGED_VARS {
            // SAFETY: Test-only. ENV_LOCK is held for the scope's lifetime,
            // serializing env mutation across tests in this crate.
            unsafe {
                std::env::remove_var(key);
            }
        }
        Self { saved, _lock: lock }
    }

    pub(crate) fn set(&self, key: &'static str, value: &str) {
        debug_assert!(MANAGED_VARS.contains(&key), "{key} is not restored on drop");
        // SAFETY: Test-only. ENV_LOCK is held by this scope.
        unsafe {
            std::env::set_var(key, value);
        }
    }
}

impl Drop for EnvScope {
    fn drop(&mut self) {
        for (key, previous) in &self.saved {
            // SAFETY: Test-only restoration while ENV_LOCK is still held.
            unsafe {
                match previous {
                    Some(value) => std::env::set_var(key, value),
                    None => std::env::remove_var(key),
                }
            }
        }
    }
}
