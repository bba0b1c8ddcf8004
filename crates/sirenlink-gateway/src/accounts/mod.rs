//! Account collaborator: create and look up participant records.
//!
//! The store is a trait so a database-backed implementation can replace the
//! in-memory one without touching the HTTP handlers.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use sirenlink_core::error::{Result, SirenError};
use sirenlink_core::protocol::{GeoPoint, Role};

/// Fields accepted by `POST /register`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub name: String,
    pub role: Role,
    #[serde(default)]
    pub license_plate: Option<String>,
    pub phone: String,
    #[serde(default)]
    pub location: Option<GeoPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: String,
    pub name: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_plate: Option<String>,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoPoint>,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create_user(&self, user: NewUser) -> Result<UserRecord>;
    async fn find_user(&self, name: &str, phone: &str) -> Result<Option<UserRecord>>;
}

/// Process-lifetime store.
#[derive(Default)]
pub struct InMemoryUserStore {
    users: RwLock<Vec<UserRecord>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn create_user(&self, user: NewUser) -> Result<UserRecord> {
        let name = user.name.trim();
        let phone = user.phone.trim();
        if name.is_empty() || phone.is_empty() {
            return Err(SirenError::BadRequest("name and phone are required".into()));
        }

        let record = UserRecord {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            role: user.role,
            license_plate: user
                .license_plate
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty()),
            phone: phone.to_string(),
            location: user.location,
        };
        self.users.write().await.push(record.clone());
        tracing::info!(id = %record.id, role = %record.role, "user created");
        Ok(record)
    }

    async fn find_user(&self, name: &str, phone: &str) -> Result<Option<UserRecord>> {
        let users = self.users.read().await;
        Ok(users
            .iter()
            .find(|u| u.name == name.trim() && u.phone == phone.trim())
            .cloned())
    }
}
