use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::users::repo::UserStore;
use crate::users::repo_types::{NewUser, User};

/// `UserStore` backed by a map, with the same uniqueness rule as the table.
#[derive(Default)]
pub struct MemoryUserStore {
    rows: Mutex<HashMap<Uuid, User>>,
    fail_resume_writes: AtomicBool,
}

impl MemoryUserStore {
    /// Make `set_resume_key` fail until switched off.
    pub fn fail_resume_writes(&self, fail: bool) {
        self.fail_resume_writes.store(fail, Ordering::SeqCst);
    }

    fn modify<F>(&self, id: Uuid, f: F) -> Option<User>
    where
        F: FnOnce(&mut User),
    {
        let mut rows = self.rows.lock().unwrap();
        let user = rows.get_mut(&id)?;
        f(user);
        user.updated_at = OffsetDateTime::now_utc();
        Some(user.clone())
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.rows.lock().unwrap().get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.values().find(|u| u.email == email).cloned())
    }

    async fn create(&self, new: NewUser<'_>) -> AppResult<User> {
        let mut rows = self.rows.lock().unwrap();
        if rows.values().any(|u| u.email == new.email) {
            return Err(AppError::DuplicateUser);
        }
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: Uuid::new_v4(),
            email: new.email.to_string(),
            password_hash: new.password_hash.to_string(),
            first_name: new.first_name.map(String::from),
            last_name: new.last_name.map(String::from),
            resume_key: None,
            created_at: now,
            updated_at: now,
        };
        rows.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_names(
        &self,
        id: Uuid,
        first_name: Option<&str>,
        last_name: Option<&str>,
    ) -> AppResult<Option<User>> {
        Ok(self.modify(id, |u| {
            if let Some(f) = first_name {
                u.first_name = Some(f.to_string()).filter(|s| !s.is_empty());
            }
            if let Some(l) = last_name {
                u.last_name = Some(l.to_string()).filter(|s| !s.is_empty());
            }
        }))
    }

    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> AppResult<bool> {
        Ok(self
            .modify(id, |u| u.password_hash = password_hash.to_string())
            .is_some())
    }

    async fn set_resume_key(&self, id: Uuid, resume_key: Option<&str>) -> AppResult<Option<User>> {
        if self.fail_resume_writes.load(Ordering::SeqCst) {
            return Err(anyhow::anyhow!("simulated resume_key write failure for {id}").into());
        }
        Ok(self.modify(id, |u| u.resume_key = resume_key.map(String::from)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> NewUser<'_> {
        NewUser {
            email,
            password_hash: "hash",
            first_name: None,
            last_name: None,
        }
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let store = MemoryUserStore::default();
        store.create(new_user("a@b.com")).await.unwrap();
        let err = store.create(new_user("a@b.com")).await.unwrap_err();
        assert!(matches!(err, AppError::DuplicateUser));
    }

    #[tokio::test]
    async fn email_match_is_case_sensitive() {
        let store = MemoryUserStore::default();
        store.create(new_user("a@b.com")).await.unwrap();
        assert!(store.find_by_email("A@B.com").await.unwrap().is_none());
        assert!(store.create(new_user("A@B.com")).await.is_ok());
    }

    #[tokio::test]
    async fn update_names_keeps_missing_fields() {
        let store = MemoryUserStore::default();
        let user = store.create(new_user("a@b.com")).await.unwrap();
        store.update_names(user.id, Some("Ada"), Some("Lovelace")).await.unwrap();
        let updated = store.update_names(user.id, None, Some("Byron")).await.unwrap().unwrap();
        assert_eq!(updated.first_name.as_deref(), Some("Ada"));
        assert_eq!(updated.last_name.as_deref(), Some("Byron"));
    }
}
