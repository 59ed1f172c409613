use crate::access::is_valid_pin;
use crate::catalog::{Prize, Profile, Task};
use crate::constants::{
    ALL_KEYS, BACKUP_FILE_PREFIX, KEY_APP_PASSWORD, KEY_HISTORY, KEY_PIN, KEY_PRIZES,
    KEY_PROFILE, KEY_REQUESTS, KEY_STARS, KEY_TASKS,
};
use crate::request::RedemptionRequest;
use crate::storage::{read_json, KeyValueStore, StorageError};
use crate::transaction::StarTransaction;
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::HashSet;
use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("backup is not valid JSON: {0}")]
    Malformed(#[source] serde_json::Error),
    #[error("backup must be a JSON object of key to value")]
    NotAnObject,
    #[error("backup contains unknown key {0}")]
    UnknownKey(String),
    #[error("value for {0} must be a string")]
    NotAString(String),
    #[error("value for {key} has the wrong shape: {reason}")]
    InvalidShape { key: String, reason: String },
    #[error("backup balance {balance} does not match history total {history_total}")]
    LedgerMismatch { balance: i64, history_total: i64 },
    #[error("persistence failure: {0}")]
    Persistence(#[from] StorageError),
}

/// Every known key mapped to its raw stored string, null when unset
pub fn export<S: KeyValueStore + ?Sized>(store: &S) -> Result<String, StorageError> {
    let mut data = Map::new();
    for key in ALL_KEYS.iter() {
        let value = store.get(key)?.map(Value::String).unwrap_or(Value::Null);
        data.insert(key.to_string(), value);
    }
    serde_json::to_string(&Value::Object(data)).map_err(|source| StorageError::Encode {
        key: "backup".to_string(),
        source,
    })
}

pub fn backup_file_name(date: NaiveDate) -> String {
    format!("{}{}.json", BACKUP_FILE_PREFIX, date.format("%Y-%m-%d"))
}

fn shape_err(key: &str, reason: impl ToString) -> ImportError {
    ImportError::InvalidShape {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn decode<T: DeserializeOwned>(key: &str, raw: &str) -> Result<T, ImportError> {
    serde_json::from_str(raw).map_err(|e| shape_err(key, e))
}

fn require_unique<'a>(key: &str, ids: impl Iterator<Item = &'a str>) -> Result<(), ImportError> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(shape_err(key, format!("duplicate id {}", id)));
        }
    }
    Ok(())
}

/// What a validated value decoded to, for the cross-key checks
#[derive(Debug, Default)]
struct Decoded {
    stars: Option<i64>,
    history: Option<Vec<StarTransaction>>,
}

fn validate_entry(key: &str, raw: &str, decoded: &mut Decoded) -> Result<(), ImportError> {
    match key {
        KEY_TASKS => {
            let tasks: Vec<Task> = decode(key, raw)?;
            require_unique(key, tasks.iter().map(|t| t.id.as_str()))?;
            if tasks.iter().any(|t| t.reward_stars <= 0) {
                return Err(shape_err(key, "task reward must be positive"));
            }
            if tasks.iter().any(|t| t.duration_minutes == 0) {
                return Err(shape_err(key, "task duration must be positive"));
            }
        }
        KEY_PRIZES => {
            let prizes: Vec<Prize> = decode(key, raw)?;
            require_unique(key, prizes.iter().map(|p| p.id.as_str()))?;
            if prizes.iter().any(|p| p.cost <= 0) {
                return Err(shape_err(key, "prize cost must be positive"));
            }
        }
        KEY_STARS => {
            decoded.stars = Some(decode(key, raw)?);
        }
        KEY_HISTORY => {
            let history: Vec<StarTransaction> = decode(key, raw)?;
            require_unique(key, history.iter().map(|t| t.id.as_str()))?;
            if let Some(txn) = history.iter().find(|t| !t.is_consistent()) {
                return Err(shape_err(
                    key,
                    format!("transaction {} type does not match its amount", txn.id),
                ));
            }
            decoded.history = Some(history);
        }
        KEY_REQUESTS => {
            let requests: Vec<RedemptionRequest> = decode(key, raw)?;
            require_unique(key, requests.iter().map(|r| r.id.as_str()))?;
            if requests.iter().any(|r| r.prize_cost <= 0) {
                return Err(shape_err(key, "prize cost must be positive"));
            }
        }
        KEY_PROFILE => {
            let _: Profile = decode(key, raw)?;
        }
        KEY_PIN => {
            if !is_valid_pin(raw) {
                return Err(shape_err(key, "PIN must be exactly 4 digits"));
            }
        }
        KEY_APP_PASSWORD => {
            if raw.is_empty() {
                return Err(shape_err(key, "password must not be empty"));
            }
        }
        _ => return Err(ImportError::UnknownKey(key.to_string())),
    }
    Ok(())
}

/// The balance & history left after the import must still agree; a half
/// missing from the backup is taken from the store
fn check_ledger_pair<S: KeyValueStore + ?Sized>(
    store: &S,
    decoded: &Decoded,
) -> Result<(), ImportError> {
    let balance = match decoded.stars {
        Some(balance) => balance,
        None => read_json::<i64, S>(store, KEY_STARS)?.unwrap_or(0),
    };
    let stored;
    let history = match decoded.history.as_ref() {
        Some(history) => history,
        None => {
            stored = read_json::<Vec<StarTransaction>, S>(store, KEY_HISTORY)?
                .unwrap_or_default();
            &stored
        }
    };
    let history_total = history
        .iter()
        .try_fold(0i64, |total, txn| total.checked_add(txn.amount))
        .ok_or_else(|| shape_err(KEY_HISTORY, "history total overflows"))?;
    if balance != history_total {
        warn!(balance, history_total, "refusing backup with drifted balance");
        return Err(ImportError::LedgerMismatch {
            balance,
            history_total,
        });
    }
    Ok(())
}

/// Restores a backup produced by `export`.
/// Every entry is validated against its key's record shape first; only a
/// fully valid backup is written, as one batch. Null entries are skipped
/// and leave the current value in place
pub fn import<S: KeyValueStore + ?Sized>(store: &mut S, text: &str) -> Result<usize, ImportError> {
    let data: Value = serde_json::from_str(text).map_err(ImportError::Malformed)?;
    let data = match data {
        Value::Object(map) => map,
        _ => return Err(ImportError::NotAnObject),
    };

    let mut decoded = Decoded::default();
    let mut entries: Vec<(&str, String)> = vec![];
    for key in ALL_KEYS.iter() {
        match data.get(*key) {
            None | Some(Value::Null) => {}
            Some(Value::String(raw)) => {
                validate_entry(key, raw, &mut decoded)?;
                entries.push((*key, raw.clone()));
            }
            Some(_) => return Err(ImportError::NotAString(key.to_string())),
        }
    }
    let unknown = data
        .keys()
        .find(|k| !ALL_KEYS.iter().any(|known| *known == k.as_str()));
    if let Some(unknown) = unknown {
        warn!(key = %unknown, "refusing backup with unknown key");
        return Err(ImportError::UnknownKey(unknown.clone()));
    }

    if decoded.stars.is_some() || decoded.history.is_some() {
        check_ledger_pair(&*store, &decoded)?;
    }

    let restored = entries.len();
    store.set_many(entries)?;
    info!(restored, "backup imported");
    Ok(restored)
}
