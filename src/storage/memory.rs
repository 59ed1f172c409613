use super::{KeyValueStore, StorageError};
use std::collections::BTreeMap;

/// In-process store. An optional quota, counted over keys & values in bytes,
/// mimics the browser storage limit
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
    quota: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota: usize) -> Self {
        Self {
            entries: BTreeMap::new(),
            quota: Some(quota),
        }
    }

    pub fn set_quota(&mut self, quota: Option<usize>) {
        self.quota = quota;
    }

    pub fn used_bytes(&self) -> usize {
        used_bytes(&self.entries)
    }
}

fn used_bytes(entries: &BTreeMap<String, String>) -> usize {
    entries.iter().map(|(k, v)| k.len() + v.len()).sum()
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set_many(&mut self, entries: Vec<(&str, String)>) -> Result<(), StorageError> {
        // Stage on a copy so a quota failure leaves nothing applied
        let mut staged = self.entries.clone();
        let mut last_key = String::new();
        for (key, value) in entries {
            last_key = key.to_string();
            staged.insert(last_key.clone(), value);
        }
        if let Some(quota) = self.quota {
            let needed = used_bytes(&staged);
            if needed > quota {
                return Err(StorageError::QuotaExceeded {
                    key: last_key,
                    needed,
                    quota,
                });
            }
        }
        self.entries = staged;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.entries.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.entries.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::MemoryStore;
    use crate::storage::{KeyValueStore, StorageError};

    #[test]
    fn tst_set_many_quota() {
        let mut store = MemoryStore::with_quota(10);
        let res = store.set_many(vec![("a", "1".to_string()), ("b", "2".to_string())]);
        assert!(res.is_ok(), "Should fit in quota");
        assert_eq!(store.used_bytes(), 4);

        let res = store.set_many(vec![("c", "3".to_string()), ("d", "too long".to_string())]);
        match res {
            Ok(_) => panic!("Should err since batch exceeds quota"),
            Err(e) => assert!(matches!(e, StorageError::QuotaExceeded { .. })),
        }
        assert_eq!(
            store.get("c").unwrap(),
            None,
            "Failed batch should apply no entries"
        );
        assert_eq!(store.keys().unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn tst_remove() {
        let mut store = MemoryStore::new();
        store.set("a", "1".to_string()).unwrap();
        store.remove("a").unwrap();
        assert_eq!(store.get("a").unwrap(), None);
        assert!(store.remove("missing").is_ok(), "Removing unset key is a no-op");
    }
}
