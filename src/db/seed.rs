use tracing::info;

use crate::db::models::role::Role;
use crate::db::models::user::NewUser;
use crate::db::store::{RecordStore, StoreError};
use crate::utils::credentials::{CredentialError, Credentials};

pub const DEMO_PASSWORD: &str = "password";

/// One account per role, all sharing [`DEMO_PASSWORD`].
pub const DEMO_USERS: [(&str, &str, Role); 6] = [
    ("Admin Server", "admin@demo.com", Role::ServerAdmin),
    ("Demo Staff", "staff@demo.com", Role::Staff),
    ("Demo Pemohon", "pemohon@demo.com", Role::Requester),
    ("Demo Kepala Lab", "kepalalab@demo.com", Role::LabHead),
    ("Demo Wakil Dekan", "wadek@demo.com", Role::ViceDean),
    ("Dekan", "dekan@demo.com", Role::Dean),
];

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Credentials(#[from] CredentialError),
}

/// Creates the demo accounts that do not exist yet. Returns how many were created.
pub async fn seed_demo_users(store: &dyn RecordStore, credentials: &Credentials) -> Result<usize, SeedError> {
    let password_hash = credentials.hash_password(DEMO_PASSWORD)?;
    let mut created = 0;

    for (name, email, role) in DEMO_USERS {
        if store.find_user_by_email(email).await?.is_some() {
            continue;
        }
        match store
            .create_user(NewUser {
                name: name.to_string(),
                email: email.to_string(),
                password_hash: password_hash.clone(),
                phone: None,
                role,
            })
            .await
        {
            Ok(_) => created += 1,
            // Raced with another instance seeding the same account.
            Err(StoreError::Conflict(_)) => {}
            Err(e) => return Err(e.into()),
        }
    }

    info!("🌱 Seeded {} demo users", created);
    Ok(created)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::db::memory::InMemoryStore;

    #[tokio::test]
    async fn seeding_is_idempotent() {
        let store = InMemoryStore::new();
        let credentials = Credentials::new(b"seed-secret", Duration::from_secs(60), 4);

        assert_eq!(seed_demo_users(&store, &credentials).await.unwrap(), 6);
        assert_eq!(seed_demo_users(&store, &credentials).await.unwrap(), 0);

        let dean = store.find_user_by_email("dekan@demo.com").await.unwrap().unwrap();
        assert_eq!(dean.role, Role::Dean);
        assert!(credentials.verify_password(DEMO_PASSWORD, &dean.password_hash).unwrap());
    }
}
