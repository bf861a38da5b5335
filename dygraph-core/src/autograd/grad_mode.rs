//! Thread-local switch controlling whether operations are appended to the tape.

use std::cell::Cell;

thread_local! {
    static GRAD_ENABLED: Cell<bool> = const { Cell::new(true) };
}

/// Check if operations are currently recorded on the tape.
pub fn is_grad_enabled() -> bool {
    GRAD_ENABLED.with(|enabled| enabled.get())
}

/// RAII guard setting the recording state for its lifetime.
///
/// Guards nest: dropping one restores the state that was active when it was
/// created.
#[must_use = "the previous grad mode is restored as soon as the guard is dropped"]
pub struct GradModeGuard {
    previous_state: bool,
}

impl GradModeGuard {
    pub fn new(enabled: bool) -> Self {
        let previous_state = GRAD_ENABLED.with(|state| state.replace(enabled));
        GradModeGuard { previous_state }
    }
}

impl Drop for GradModeGuard {
    fn drop(&mut self) {
        GRAD_ENABLED.with(|state| state.set(self.previous_state));
    }
}

/// Disables recording until the returned guard is dropped.
pub fn no_grad() -> GradModeGuard {
    GradModeGuard::new(false)
}

/// Enables recording until the returned guard is dropped.
pub fn enable_grad() -> GradModeGuard {
    GradModeGuard::new(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guards_nest_and_restore() {
        assert!(is_grad_enabled());
        {
            let _outer = no_grad();
            assert!(!is_grad_enabled());
            {
                let _inner = enable_grad();
                assert!(is_grad_enabled());
            }
            assert!(!is_grad_enabled());
        }
        assert!(is_grad_enabled());
    }

    #[test]
    fn test_state_is_per_thread() {
        let _guard = no_grad();
        let other = std::thread::spawn(is_grad_enabled).join().unwrap();
        assert!(other);
        assert!(!is_grad_enabled());
    }
}
