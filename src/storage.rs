use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io;
mod json_file;
mod memory;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage quota exceeded writing {key}: {needed} bytes needed, quota is {quota}")]
    QuotaExceeded {
        key: String,
        needed: usize,
        quota: usize,
    },
    #[error("stored value under {key} is corrupt: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("could not encode value for {key}: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("store file io failed: {0}")]
    Io(#[from] io::Error),
}

/// String key-value storage the ledger & workflow persist through.
/// Writers that need several keys to change together must use `set_many`,
/// which either applies every entry or none of them.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set_many(&mut self, entries: Vec<(&str, String)>) -> Result<(), StorageError>;

    fn remove(&mut self, key: &str) -> Result<(), StorageError>;

    /// Keys currently holding a value, sorted
    fn keys(&self) -> Result<Vec<String>, StorageError>;

    fn set(&mut self, key: &str, value: String) -> Result<(), StorageError> {
        self.set_many(vec![(key, value)])
    }
}

/// Reads & decodes a JSON record, None if the key is unset
pub fn read_json<T, S>(store: &S, key: &str) -> Result<Option<T>, StorageError>
where
    T: DeserializeOwned,
    S: KeyValueStore + ?Sized,
{
    match store.get(key)? {
        Some(raw) => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| StorageError::Corrupt {
                key: key.to_string(),
                source,
            }),
        None => Ok(None),
    }
}

pub fn encode_json<T: Serialize + ?Sized>(key: &str, value: &T) -> Result<String, StorageError> {
    serde_json::to_string(value).map_err(|source| StorageError::Encode {
        key: key.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::{encode_json, read_json, KeyValueStore, MemoryStore, StorageError};

    #[test]
    fn tst_read_json() {
        let mut store = MemoryStore::new();
        let res: Option<Vec<i64>> = read_json(&store, "nums").unwrap();
        assert!(res.is_none(), "Unset key should read as None");

        store.set("nums", encode_json("nums", &vec![1, 2]).unwrap()).unwrap();
        let res: Option<Vec<i64>> = read_json(&store, "nums").unwrap();
        assert_eq!(res, Some(vec![1, 2]));

        store.set("nums", "[1,".to_string()).unwrap();
        let res: Result<Option<Vec<i64>>, _> = read_json(&store, "nums");
        match res {
            Ok(_) => panic!("Should err on truncated json"),
            Err(e) => assert!(matches!(e, StorageError::Corrupt { ref key, .. } if key == "nums")),
        }
    }
}
