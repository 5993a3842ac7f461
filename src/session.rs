use crate::error::{Error, Result};
use crate::models::User;
use crate::storage::KeyValueStore;
use log::{info, warn};

const USER_KEY: &str = "user";

/// Every login resolves to this account; there is no credential check.
pub const DEMO_USER_ID: &str = "123";
const DEMO_USER_NAME: &str = "Demo User";

#[derive(Debug, Clone, Default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Default)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: String,
    pub email: String,
}

fn required<'a>(value: &'a str, field: &str) -> Result<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::missing(field));
    }
    Ok(value)
}

pub struct Session<S: KeyValueStore> {
    store: S,
    user: Option<User>,
}

impl<S: KeyValueStore> Session<S> {
    pub fn restore(store: S) -> Self {
        let user = match store.get(USER_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<User>(&raw) {
                Ok(user) => {
                    info!("Restored session for {}", user.email);
                    Some(user)
                }
                Err(e) => {
                    warn!("Failed to parse stored user: {}", e);
                    if let Err(e) = store.remove(USER_KEY) {
                        warn!("Failed to discard stored user: {}", e);
                    }
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!("Failed to read stored user: {}", e);
                None
            }
        };
        Session { store, user }
    }

    pub fn login(&mut self, request: LoginRequest) -> Result<&User> {
        let email = required(&request.email, "email")?;
        required(&request.password, "password")?;
        let user = User {
            id: DEMO_USER_ID.to_string(),
            name: DEMO_USER_NAME.to_string(),
            email: email.to_string(),
            phone: String::new(),
        };
        self.sign_in(user)
    }

    pub fn register(&mut self, request: RegisterRequest) -> Result<&User> {
        let name = required(&request.name, "name")?;
        let email = required(&request.email, "email")?;
        required(&request.password, "password")?;
        let user = User {
            id: DEMO_USER_ID.to_string(),
            name: name.to_string(),
            email: email.to_string(),
            phone: request.phone.map(|p| p.trim().to_string()).unwrap_or_default(),
        };
        self.sign_in(user)
    }

    pub fn update_profile(&mut self, update: ProfileUpdate) -> Result<&User> {
        let mut user = self.require_user()?.clone();
        user.name = required(&update.name, "name")?.to_string();
        user.email = required(&update.email, "email")?.to_string();
        self.sign_in(user)
    }

    pub fn logout(&mut self) -> Result<()> {
        if let Some(user) = self.user.take() {
            info!("Logged out {}", user.email);
        }
        self.store.remove(USER_KEY)
    }

    pub fn current_user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn require_user(&self) -> Result<&User> {
        self.user.as_ref().ok_or(Error::NotAuthenticated)
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    fn sign_in(&mut self, user: User) -> Result<&User> {
        self.store.set(USER_KEY, &serde_json::to_string(&user)?)?;
        info!("Signed in as {}", user.email);
        Ok(&*self.user.insert(user))
    }
}
