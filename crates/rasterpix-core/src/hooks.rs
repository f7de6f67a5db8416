//! Cache-invalidation hooks
//!
//! External caches (pixmap stores, texture uploaders) can register a
//! callback here; it runs with an image's 64-bit cache key whenever a
//! cached image is about to be modified or is destroyed. The key is an
//! opaque token: upper 32 bits are the creation serial, lower 32 bits
//! the mutation generation, so it changes after every detach.

use std::sync::Mutex;

/// Hook signature: receives the cache key of the affected image.
pub type CleanupHook = fn(u64);

static HOOKS: Mutex<Vec<CleanupHook>> = Mutex::new(Vec::new());

/// Register a cleanup hook. Duplicate registrations run once per entry.
pub fn add_cleanup_hook(hook: CleanupHook) {
    HOOKS.lock().unwrap().push(hook);
}

/// Remove a previously registered hook (first matching entry).
pub fn remove_cleanup_hook(hook: CleanupHook) {
    let mut hooks = HOOKS.lock().unwrap();
    if let Some(pos) = hooks.iter().position(|&h| h == hook) {
        hooks.remove(pos);
    }
}

/// Run every registered hook with `key`.
pub(crate) fn execute_cleanup_hooks(key: u64) {
    let hooks = HOOKS.lock().unwrap().clone();
    for hook in hooks {
        hook(key);
    }
}
