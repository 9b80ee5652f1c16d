use std::collections::BTreeMap;

use parking_lot::Mutex;

use crate::{
    secret::PasswordHash,
    store::{CredentialStore, Criteria, StoreError, UserID, UserRecord, UserUpdate},
};

/// An in-memory `CredentialStore`. Records are kept in id order, so `find`
/// returns the lowest-id match. Each operation holds the table lock for its
/// whole read-modify-write, which makes it a serializable unit.
#[derive(Default)]
pub struct MemoryStore {
    table: Mutex<Table>,
}

#[derive(Default)]
struct Table {
    last_id: i64,
    users: BTreeMap<UserID, UserRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored user records.
    pub fn len(&self) -> usize {
        self.table.lock().users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CredentialStore for MemoryStore {
    async fn add(
        &self,
        email: &str,
        hashed_password: PasswordHash,
    ) -> Result<UserRecord, StoreError> {
        let mut table = self.table.lock();

        if table.users.values().any(|user| user.email == email) {
            return Err(StoreError::DuplicateEmail);
        }

        table.last_id += 1;
        let user = UserRecord {
            id: UserID(table.last_id),
            email: email.to_string(),
            hashed_password,
            session_id_hash: None,
            reset_token_hash: None,
        };
        table.users.insert(user.id, user.clone());

        log::debug!("Inserted user #{}", user.id);
        Ok(user)
    }

    async fn find(&self, criteria: Criteria<'_>) -> Result<UserRecord, StoreError> {
        let table = self.table.lock();

        if let Criteria::Id(id) = criteria {
            return table.users.get(&id)
                .cloned()
                .ok_or(StoreError::NotFound);
        }

        table.users.values()
            .find(|user| criteria.matches(user))
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn update(&self, user_id: UserID, fields: UserUpdate) -> Result<(), StoreError> {
        let mut table = self.table.lock();

        let user = table.users.get_mut(&user_id)
            .ok_or(StoreError::NotFound)?;
        if !fields.precondition_holds(user) {
            log::debug!("Update precondition failed for user #{user_id}");
            return Err(StoreError::NotFound);
        }
        fields.apply_to(user);

        log::debug!("Updated user #{user_id}");
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::MemoryStore;
    use crate::{
        secret::{PasswordHash, Secret},
        store::{CredentialStore, Criteria, StoreError, UserID, UserUpdate},
    };

    fn hash(s: &str) -> PasswordHash {
        PasswordHash::from(s.to_string())
    }

    #[actix_web::test]
    async fn test_add_assigns_ids() {
        let store = MemoryStore::new();
        let a = store.add("a@x.com", hash("h1")).await.unwrap();
        let b = store.add("b@x.com", hash("h2")).await.unwrap();

        assert_ne!(a.id, b.id);
        assert_eq!("a@x.com", a.email);
        assert!(!a.has_session());
        assert!(!a.has_pending_reset());
        assert_eq!(2, store.len());
    }

    #[actix_web::test]
    async fn test_add_duplicate_email() {
        let store = MemoryStore::new();
        store.add("a@x.com", hash("h1")).await.unwrap();

        let result = store.add("a@x.com", hash("h2")).await;
        assert_eq!(Some(StoreError::DuplicateEmail), result.err());

        // The original record is unchanged.
        let user = store.find(Criteria::Email("a@x.com")).await.unwrap();
        assert_eq!("h1", user.hashed_password.expose());
        assert_eq!(1, store.len());
    }

    #[actix_web::test]
    async fn test_find() {
        let store = MemoryStore::new();
        let user = store.add("a@x.com", hash("h1")).await.unwrap();

        let by_id = store.find(Criteria::Id(user.id)).await.unwrap();
        assert_eq!("a@x.com", by_id.email);

        let by_email = store.find(Criteria::Email("a@x.com")).await.unwrap();
        assert_eq!(user.id, by_email.id);

        assert_eq!(
            Some(StoreError::NotFound),
            store.find(Criteria::Email("b@x.com")).await.err(),
        );
        assert_eq!(
            Some(StoreError::NotFound),
            store.find(Criteria::Id(UserID(99))).await.err(),
        );
        assert_eq!(
            Some(StoreError::NotFound),
            store.find(Criteria::SessionIdHash(&Secret::from("nope"))).await.err(),
        );
    }

    #[actix_web::test]
    async fn test_update_then_find_by_token() {
        let store = MemoryStore::new();
        let user = store.add("a@x.com", hash("h1")).await.unwrap();

        let update = UserUpdate::default()
            .session(Some(Secret::from("session-hash")))
            .reset_token(Some(Secret::from("reset-hash")));
        store.update(user.id, update).await.unwrap();

        let found = store.find(Criteria::SessionIdHash(&Secret::from("session-hash")))
            .await
            .unwrap();
        assert_eq!(user.id, found.id);

        let found = store.find(Criteria::ResetTokenHash(&Secret::from("reset-hash")))
            .await
            .unwrap();
        assert_eq!(user.id, found.id);

        store.update(user.id, UserUpdate::default().session(None)).await.unwrap();
        assert!(store.find(Criteria::SessionIdHash(&Secret::from("session-hash"))).await.is_err());
    }

    #[actix_web::test]
    async fn test_update_unknown_id() {
        let store = MemoryStore::new();
        let result = store.update(UserID(1), UserUpdate::default().session(None)).await;

        assert_eq!(Some(StoreError::NotFound), result.err());
    }

    #[actix_web::test]
    async fn test_update_with_stale_reset_token() {
        let store = MemoryStore::new();
        let user = store.add("a@x.com", hash("h1")).await.unwrap();
        store.update(user.id, UserUpdate::default().reset_token(Some(Secret::from("first"))))
            .await
            .unwrap();

        let consume = UserUpdate::default()
            .password(hash("h2"))
            .reset_token(None)
            .if_reset_token(Secret::from("stale"));
        assert_eq!(Some(StoreError::NotFound), store.update(user.id, consume).await.err());

        // Nothing was changed by the rejected update.
        let stored = store.find(Criteria::Id(user.id)).await.unwrap();
        assert_eq!("h1", stored.hashed_password.expose());
        assert!(stored.has_pending_reset());

        let consume = UserUpdate::default()
            .password(hash("h2"))
            .reset_token(None)
            .if_reset_token(Secret::from("first"));
        store.update(user.id, consume).await.unwrap();
        let stored = store.find(Criteria::Id(user.id)).await.unwrap();
        assert_eq!("h2", stored.hashed_password.expose());
        assert!(!stored.has_pending_reset());
    }
}
