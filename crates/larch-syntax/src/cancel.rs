use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Returned by long-running operations that observed a cancellation request.
#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
#[error("operation was cancelled")]
pub struct Cancelled;

/// A cooperative cancellation flag shared between a caller and the parse it
/// started. The default token can never be cancelled.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    flag: Option<Arc<AtomicBool>>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self { flag: Some(Arc::new(AtomicBool::new(false))) }
    }

    /// A token that is never cancelled.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        if let Some(flag) = &self.flag {
            flag.store(true, Ordering::Relaxed);
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.as_ref().is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    pub fn check(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() { Err(Cancelled) } else { Ok(()) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_flag() {
        let token = CancellationToken::new();
        let observer = token.clone();
        assert_eq!(observer.check(), Ok(()));

        token.cancel();
        assert_eq!(observer.check(), Err(Cancelled));

        let never = CancellationToken::none();
        never.cancel();
        assert!(!never.is_cancelled());
    }
}
