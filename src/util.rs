use std::time::{SystemTime, UNIX_EPOCH};

/// Runs the wrapped closure when dropped. Used to pin teardown (e.g.
/// removing a location subscription) to every exit path of a scope.
pub struct CleanupGuard<F: FnOnce()> {
    action: Option<F>,
}

impl<F: FnOnce()> CleanupGuard<F> {
    #[allow(unused)]
    pub fn disarm(mut self) {
        let _ = self.action.take();
    }
}

impl<F: FnOnce()> Drop for CleanupGuard<F> {
    fn drop(&mut self) {
        if let Some(action) = self.action.take() {
            action();
        }
    }
}

pub fn on_drop<F: FnOnce()>(action: F) -> CleanupGuard<F> {
    CleanupGuard {
        action: Some(action),
    }
}

/// Wall-clock milliseconds since the Unix epoch, for timestamped
/// bridge payloads.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn guard_runs_on_drop_once() {
        let fired = Cell::new(0);
        {
            let _guard = on_drop(|| fired.set(fired.get() + 1));
        }
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn disarmed_guard_does_nothing() {
        let fired = Cell::new(0);
        {
            let guard = on_drop(|| fired.set(fired.get() + 1));
            guard.disarm();
        }
        assert_eq!(fired.get(), 0);
    }
}
