//! Conversion between a host's native identity type and the sender type
//! the engine is instantiated with.

use std::fmt;
use std::sync::Arc;

/// The two conversion functions a host injects at its boundary.
pub struct SenderMapping<N, S> {
    to_sender: Arc<dyn Fn(&N) -> S + Send + Sync>,
    to_native: Arc<dyn Fn(&S) -> N + Send + Sync>,
}

impl<N, S> SenderMapping<N, S> {
    pub fn new(
        to_sender: impl Fn(&N) -> S + Send + Sync + 'static,
        to_native: impl Fn(&S) -> N + Send + Sync + 'static,
    ) -> Self {
        Self {
            to_sender: Arc::new(to_sender),
            to_native: Arc::new(to_native),
        }
    }

    /// Native identity to engine sender.
    pub fn to_sender(&self, native: &N) -> S {
        (self.to_sender)(native)
    }

    /// Engine sender back to the native identity.
    pub fn to_native(&self, sender: &S) -> N {
        (self.to_native)(sender)
    }
}

impl<N, S> Clone for SenderMapping<N, S> {
    fn clone(&self) -> Self {
        Self {
            to_sender: Arc::clone(&self.to_sender),
            to_native: Arc::clone(&self.to_native),
        }
    }
}

impl<N, S> fmt::Debug for SenderMapping<N, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SenderMapping").finish_non_exhaustive()
    }
}
