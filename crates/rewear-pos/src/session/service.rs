use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use super::domain::{Cart, Role, SessionContext, SessionToken, StaffAccount, StaffUser};
use super::store::{SessionStore, StoreError};

static TOKEN_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn issue_token() -> SessionToken {
    let counter = TOKEN_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    let mut halves = [0u64; 2];
    for (salt, half) in halves.iter_mut().enumerate() {
        let mut hasher = RandomState::new().build_hasher();
        hasher.write_u64(counter);
        hasher.write_i64(nanos);
        hasher.write_usize(salt);
        *half = hasher.finish();
    }
    SessionToken(format!("{:016x}{:016x}", halves[0], halves[1]))
}

/// Configured staff accounts.
#[derive(Debug, Clone, Default)]
pub struct StaffDirectory {
    accounts: Vec<StaffAccount>,
}

impl StaffDirectory {
    pub fn new(accounts: Vec<StaffAccount>) -> Self {
        Self { accounts }
    }

    /// Parses `user:password:role` entries separated by commas.
    pub fn parse(raw: &str) -> Result<Vec<StaffAccount>, String> {
        raw.split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(|entry| {
                let mut parts = entry.splitn(3, ':');
                let username = parts.next().unwrap_or_default().trim().to_lowercase();
                let password = parts.next().unwrap_or_default().to_string();
                let role = parts
                    .next()
                    .and_then(Role::parse)
                    .ok_or_else(|| format!("entry '{username}' needs a role of admin or staff"))?;
                if username.is_empty() || password.is_empty() {
                    return Err(format!("entry '{entry}' must look like user:password:role"));
                }
                Ok(StaffAccount {
                    username,
                    password,
                    role,
                })
            })
            .collect()
    }

    pub fn authenticate(&self, username: &str, password: &str) -> Option<StaffUser> {
        let username = username.trim().to_lowercase();
        self.accounts
            .iter()
            .find(|account| account.username == username && account.password == password)
            .map(|account| StaffUser {
                username: account.username.clone(),
                role: account.role,
            })
    }
}

/// Login, logout, and cart persistence on top of a [`SessionStore`].
pub struct SessionService<S> {
    directory: StaffDirectory,
    store: Arc<S>,
}

impl<S> SessionService<S>
where
    S: SessionStore + 'static,
{
    pub fn new(directory: StaffDirectory, store: Arc<S>) -> Self {
        Self { directory, store }
    }

    pub fn login(&self, username: &str, password: &str) -> Result<SessionContext, SessionError> {
        let Some(user) = self.directory.authenticate(username, password) else {
            warn!(username = %username.trim().to_lowercase(), "rejected login");
            return Err(SessionError::InvalidCredentials);
        };

        let context = SessionContext {
            token: issue_token(),
            user,
            cart: Cart::default(),
            started_at: Utc::now(),
        };
        self.store.save(context.clone())?;
        info!(username = %context.user.username, role = ?context.user.role, "staff signed in");
        Ok(context)
    }

    pub fn logout(&self, token: &SessionToken) -> Result<(), SessionError> {
        if self.store.clear(token)? {
            Ok(())
        } else {
            Err(SessionError::UnknownSession)
        }
    }

    pub fn resolve(&self, token: &SessionToken) -> Result<SessionContext, SessionError> {
        self.store.load(token)?.ok_or(SessionError::UnknownSession)
    }

    /// Loads the session, lets `change` edit its cart, and saves it back.
    pub fn update_cart<F, T>(&self, token: &SessionToken, change: F) -> Result<T, SessionError>
    where
        F: FnOnce(&mut Cart) -> T,
    {
        let mut context = self.resolve(token)?;
        let outcome = change(&mut context.cart);
        self.store.save(context)?;
        Ok(outcome)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("wrong username or password")]
    InvalidCredentials,
    #[error("session expired or unknown")]
    UnknownSession,
    #[error("this action requires an admin login")]
    Forbidden,
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::store::InMemorySessionStore;

    fn service() -> SessionService<InMemorySessionStore> {
        let accounts = StaffDirectory::parse("admin:1234:admin, Kasse:geheim:staff")
            .expect("accounts parse");
        SessionService::new(
            StaffDirectory::new(accounts),
            Arc::new(InMemorySessionStore::default()),
        )
    }

    #[test]
    fn parse_rejects_entries_without_role() {
        assert!(StaffDirectory::parse("admin:1234").is_err());
        assert!(StaffDirectory::parse(":1234:admin").is_err());
        assert!(StaffDirectory::parse("").expect("empty ok").is_empty());
    }

    #[test]
    fn login_is_case_insensitive_on_username() {
        let service = service();
        let context = service.login("KASSE", "geheim").expect("login succeeds");
        assert_eq!(context.user.username, "kasse");
        assert_eq!(context.user.role, Role::Staff);
        assert_eq!(context.token.0.len(), 32);

        let err = service.login("kasse", "GEHEIM").expect_err("password is case sensitive");
        assert!(matches!(err, SessionError::InvalidCredentials));
    }

    #[test]
    fn session_lifecycle_load_save_clear() {
        let service = service();
        let context = service.login("admin", "1234").expect("login");

        service
            .update_cart(&context.token, |cart| {
                cart.add(crate::purchases::PurchaseItemInput {
                    category: "Jeans".to_string(),
                    price_level: "Teuer".to_string(),
                    condition: "Neu".to_string(),
                    relevance: "Stark relevant".to_string(),
                    price: 2000,
                })
            })
            .expect("cart updated");

        let reloaded = service.resolve(&context.token).expect("session exists");
        assert_eq!(reloaded.cart.total(), 2000);

        service.logout(&context.token).expect("logout");
        assert!(matches!(
            service.resolve(&context.token),
            Err(SessionError::UnknownSession)
        ));
        assert!(matches!(
            service.logout(&context.token),
            Err(SessionError::UnknownSession)
        ));
    }

    #[test]
    fn tokens_are_unique() {
        let service = service();
        let first = service.login("admin", "1234").expect("login");
        let second = service.login("admin", "1234").expect("login");
        assert_ne!(first.token, second.token);
    }
}
