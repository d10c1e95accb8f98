use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::domain::{SessionContext, SessionToken};

/// Explicit load/save/clear lifecycle for session state.
pub trait SessionStore: Send + Sync {
    fn load(&self, token: &SessionToken) -> Result<Option<SessionContext>, StoreError>;
    fn save(&self, context: SessionContext) -> Result<(), StoreError>;
    fn clear(&self, token: &SessionToken) -> Result<bool, StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("session store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Default, Clone)]
pub struct InMemorySessionStore {
    sessions: Arc<Mutex<HashMap<SessionToken, SessionContext>>>,
}

impl SessionStore for InMemorySessionStore {
    fn load(&self, token: &SessionToken) -> Result<Option<SessionContext>, StoreError> {
        let guard = self
            .sessions
            .lock()
            .map_err(|_| StoreError::Unavailable("session mutex poisoned".to_string()))?;
        Ok(guard.get(token).cloned())
    }

    fn save(&self, context: SessionContext) -> Result<(), StoreError> {
        let mut guard = self
            .sessions
            .lock()
            .map_err(|_| StoreError::Unavailable("session mutex poisoned".to_string()))?;
        guard.insert(context.token.clone(), context);
        Ok(())
    }

    fn clear(&self, token: &SessionToken) -> Result<bool, StoreError> {
        let mut guard = self
            .sessions
            .lock()
            .map_err(|_| StoreError::Unavailable("session mutex poisoned".to_string()))?;
        Ok(guard.remove(token).is_some())
    }
}
