use std::sync::Arc;

use super::gate::AccessGate;

/// Shared state for auth route handlers.
pub(super) struct AuthState<R, V> {
    pub(super) gate: Arc<AccessGate<R>>,
    pub(super) verifier: Arc<V>,
}

// Manual Clone: avoid derive adding `R: Clone, V: Clone` bounds.
impl<R, V> Clone for AuthState<R, V> {
    fn clone(&self) -> Self {
        Self {
            gate: self.gate.clone(),
            verifier: self.verifier.clone(),
        }
    }
}
