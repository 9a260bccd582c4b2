use chrono::{NaiveDate, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use signup_wizard::accounts::{
    photo_key, PhotoStore, PhotoStoreError, RepositoryError, UserRecord, UserRepository,
};
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Accounts in insertion order; usernames are unique.
#[derive(Default, Clone)]
pub(crate) struct InMemoryUserRepository {
    records: Arc<Mutex<Vec<UserRecord>>>,
}

impl UserRepository for InMemoryUserRepository {
    fn insert(&self, record: UserRecord) -> Result<UserRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.iter().any(|stored| stored.username == record.username) {
            return Err(RepositoryError::Conflict);
        }
        guard.push(record.clone());
        Ok(record)
    }

    fn username_exists(&self, username: &str) -> Result<bool, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.iter().any(|stored| stored.username == username))
    }

    fn all(&self) -> Result<Vec<UserRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.clone())
    }
}

impl InMemoryUserRepository {
    pub(crate) fn records(&self) -> Vec<UserRecord> {
        self.records.lock().expect("repository mutex poisoned").clone()
    }
}

#[derive(Debug, Clone)]
pub(crate) struct StoredPhoto {
    pub(crate) content_type: String,
    pub(crate) bytes: Vec<u8>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryPhotoStore {
    photos: Arc<Mutex<HashMap<String, StoredPhoto>>>,
}

impl PhotoStore for InMemoryPhotoStore {
    fn put(
        &self,
        file_name: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<String, PhotoStoreError> {
        let key = photo_key(Utc::now().timestamp_millis(), file_name);
        let mut guard = self.photos.lock().expect("photo mutex poisoned");
        guard.insert(
            key.clone(),
            StoredPhoto {
                content_type: content_type.to_string(),
                bytes: bytes.to_vec(),
            },
        );
        Ok(key)
    }

    fn remove(&self, key: &str) -> Result<(), PhotoStoreError> {
        let mut guard = self.photos.lock().expect("photo mutex poisoned");
        guard
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| PhotoStoreError::NotFound(key.to_string()))
    }
}

impl InMemoryPhotoStore {
    pub(crate) fn get(&self, key: &str) -> Option<StoredPhoto> {
        self.photos
            .lock()
            .expect("photo mutex poisoned")
            .get(key)
            .cloned()
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn photo_store_round_trips_and_forgets() {
        let store = InMemoryPhotoStore::default();
        let key = store
            .put("avatar.png", "image/png", &[1, 2, 3])
            .expect("stored");
        assert!(key.ends_with("-avatar.png"));

        let stored = store.get(&key).expect("present");
        assert_eq!(stored.content_type, "image/png");
        assert_eq!(stored.bytes, vec![1, 2, 3]);

        store.remove(&key).expect("removed");
        assert!(store.get(&key).is_none());
        assert!(matches!(
            store.remove(&key),
            Err(PhotoStoreError::NotFound(_))
        ));
    }

    #[test]
    fn parse_date_reports_the_bad_input() {
        assert_eq!(
            parse_date(" 2025-06-01 "),
            Ok(NaiveDate::from_ymd_opt(2025, 6, 1).expect("valid date"))
        );
        assert!(parse_date("06/01/2025")
            .expect_err("wrong format")
            .contains("06/01/2025"));
    }
}
