use crate::constants::{KEY_HISTORY, KEY_STARS, STARS_PER_LEVEL};
use crate::request::RequestStatus;
use crate::storage::{encode_json, read_json, KeyValueStore, StorageError};
use crate::transaction::StarTransaction;
use tracing::info;
mod adjustments;

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("transaction reason must not be empty")]
    EmptyReason,
    #[error("invalid star amount {0}")]
    InvalidAmount(i64),
    #[error("not enough stars: balance is {balance}, {cost} needed")]
    InsufficientBalance { balance: i64, cost: i64 },
    #[error("redemption request {0} does not exist")]
    NotFound(String),
    #[error("redemption request {id} was already {status}")]
    AlreadyDecided { id: String, status: RequestStatus },
    #[error("persistence failure: {0}")]
    Persistence(#[from] StorageError),
}

/// Current wall clock time as epoch milliseconds
pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Owner of the star balance & its transaction history.
/// The balance is stored redundantly next to the history; both are only
/// ever written together, by `apply_transaction`
#[derive(Debug)]
pub struct Ledger<'s, S: KeyValueStore + ?Sized> {
    store: &'s mut S,
}

/// Result of recomputing the balance from history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Audit {
    pub balance: i64,
    pub history_total: i64,
    pub transactions: usize,
}

impl Audit {
    pub fn is_consistent(&self) -> bool {
        self.balance == self.history_total
    }
}

impl<'s, S: KeyValueStore + ?Sized> Ledger<'s, S> {
    pub fn new(store: &'s mut S) -> Self {
        Self { store }
    }

    pub(crate) fn store(&self) -> &S {
        &*self.store
    }

    pub(crate) fn store_mut(&mut self) -> &mut S {
        &mut *self.store
    }

    /// Balance as stored, unset reads as 0
    pub fn balance(&self) -> Result<i64, LedgerError> {
        Ok(read_json::<i64, S>(&*self.store, KEY_STARS)?.unwrap_or(0))
    }

    /// Level shown next to the balance, starting at 1 and rising every
    /// `STARS_PER_LEVEL` stars
    pub fn level(&self) -> Result<i64, LedgerError> {
        Ok(self.balance()?.div_euclid(STARS_PER_LEVEL) + 1)
    }

    /// History in canonical insertion order
    fn stored_history(&self) -> Result<Vec<StarTransaction>, LedgerError> {
        Ok(read_json::<Vec<StarTransaction>, S>(&*self.store, KEY_HISTORY)?.unwrap_or_default())
    }

    /// Transactions newer than `since` (all if None), newest first.
    /// Equal timestamps list the later recorded transaction first
    pub fn history(&self, since: Option<i64>) -> Result<Vec<StarTransaction>, LedgerError> {
        let mut txns: Vec<StarTransaction> = self
            .stored_history()?
            .into_iter()
            .rev()
            .filter(|txn| since.map_or(true, |cutoff| txn.timestamp > cutoff))
            .collect();
        txns.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(txns)
    }

    /// Sum of amounts for transactions newer than `since`
    pub fn net_change(&self, since: Option<i64>) -> Result<i64, LedgerError> {
        Ok(self.history(since)?.iter().map(|txn| txn.amount).sum())
    }

    pub fn audit(&self) -> Result<Audit, LedgerError> {
        let history = self.stored_history()?;
        Ok(Audit {
            balance: self.balance()?,
            history_total: history.iter().map(|txn| txn.amount).sum(),
            transactions: history.len(),
        })
    }

    /// Records a signed star adjustment & moves the balance by it.
    /// No floor is enforced, the balance may go negative
    pub fn apply_transaction(
        &mut self,
        amount: i64,
        reason: &str,
    ) -> Result<StarTransaction, LedgerError> {
        self.apply_transaction_at(amount, reason, now_millis(), vec![])
    }

    /// Appends the transaction & writes balance, history and any `staged`
    /// entries as one batch. Nothing is visible unless the whole batch lands
    pub(crate) fn apply_transaction_at(
        &mut self,
        amount: i64,
        reason: &str,
        timestamp: i64,
        staged: Vec<(&str, String)>,
    ) -> Result<StarTransaction, LedgerError> {
        if reason.trim().is_empty() {
            return Err(LedgerError::EmptyReason);
        }
        let balance = self
            .balance()?
            .checked_add(amount)
            .ok_or(LedgerError::InvalidAmount(amount))?;
        let mut history = self.stored_history()?;
        let txn = StarTransaction::new(amount, reason, timestamp);
        history.push(txn.clone());

        let mut entries = vec![
            (KEY_HISTORY, encode_json(KEY_HISTORY, &history)?),
            (KEY_STARS, encode_json(KEY_STARS, &balance)?),
        ];
        entries.extend(staged);
        self.store.set_many(entries)?;

        info!(
            txn_id = %txn.id,
            amount,
            reason = %txn.reason,
            balance,
            "applied star transaction"
        );
        Ok(txn)
    }
}

#[cfg(test)]
pub mod tests {
    use super::{Ledger, LedgerError};
    use crate::constants::{KEY_HISTORY, KEY_STARS};
    use crate::storage::{KeyValueStore, MemoryStore, StorageError};
    use crate::transaction::TxnKind;

    #[test]
    fn tst_balance_defaults_to_zero() {
        let mut store = MemoryStore::new();
        let ledger = Ledger::new(&mut store);
        assert_eq!(ledger.balance().unwrap(), 0);
        assert!(ledger.history(None).unwrap().is_empty());
    }

    #[test]
    fn tst_apply_transaction() {
        let mut store = MemoryStore::new();
        let mut ledger = Ledger::new(&mut store);

        let txn = ledger.apply_transaction(5, "Conquered Read Book").unwrap();
        assert_eq!(txn.kind, TxnKind::Earned);
        assert_eq!(ledger.balance().unwrap(), 5);

        let txn = ledger.apply_transaction(-8, "Parent Penalty: shouting").unwrap();
        assert_eq!(txn.kind, TxnKind::Spent);
        assert_eq!(
            ledger.balance().unwrap(),
            -3,
            "Ledger itself enforces no floor"
        );
        assert_eq!(ledger.history(None).unwrap().len(), 2);
        assert_eq!(store.get(KEY_STARS).unwrap(), Some("-3".to_string()));
    }

    #[test]
    fn tst_balance_tracks_sum_of_amounts() {
        let mut store = MemoryStore::new();
        let mut ledger = Ledger::new(&mut store);
        let amounts = [3, -1, 10, -7, 2, 0, -20, 15];
        for amount in amounts.iter() {
            ledger.apply_transaction(*amount, "adjustment").unwrap();
        }
        assert_eq!(ledger.balance().unwrap(), amounts.iter().sum::<i64>());
        let audit = ledger.audit().unwrap();
        assert!(audit.is_consistent(), "Balance should equal history sum");
        assert_eq!(audit.transactions, amounts.len());
    }

    #[test]
    fn tst_level() {
        let mut store = MemoryStore::new();
        let mut ledger = Ledger::new(&mut store);
        assert_eq!(ledger.level().unwrap(), 1);
        ledger.apply_transaction(19, "adjustment").unwrap();
        assert_eq!(ledger.level().unwrap(), 1);
        ledger.apply_transaction(1, "adjustment").unwrap();
        assert_eq!(ledger.level().unwrap(), 2);
        ledger.apply_transaction(-25, "adjustment").unwrap();
        assert_eq!(ledger.level().unwrap(), 0, "Negative balance rounds down");
    }

    #[test]
    fn tst_empty_reason() {
        let mut store = MemoryStore::new();
        let mut ledger = Ledger::new(&mut store);
        match ledger.apply_transaction(5, "   ") {
            Ok(_) => panic!("Should err since reason is blank"),
            Err(e) => assert!(matches!(e, LedgerError::EmptyReason)),
        }
        assert_eq!(ledger.balance().unwrap(), 0);
        assert!(ledger.history(None).unwrap().is_empty());
    }

    #[test]
    fn tst_persistence_failure_writes_nothing() {
        let mut store = MemoryStore::new();
        {
            let mut ledger = Ledger::new(&mut store);
            ledger.apply_transaction(4, "Conquered Clean Room").unwrap();
        }
        store.set_quota(Some(store.used_bytes()));

        let mut ledger = Ledger::new(&mut store);
        match ledger.apply_transaction(2, "Conquered Brush Teeth") {
            Ok(_) => panic!("Should err since quota is full"),
            Err(e) => assert!(matches!(
                e,
                LedgerError::Persistence(StorageError::QuotaExceeded { .. })
            )),
        }
        assert_eq!(ledger.balance().unwrap(), 4, "Balance should be untouched");
        assert_eq!(
            ledger.history(None).unwrap().len(),
            1,
            "History should be untouched"
        );
    }

    #[test]
    fn tst_history_since_newest_first() {
        let mut store = MemoryStore::new();
        let mut ledger = Ledger::new(&mut store);
        ledger.apply_transaction_at(1, "a", 100, vec![]).unwrap();
        ledger.apply_transaction_at(2, "b", 300, vec![]).unwrap();
        ledger.apply_transaction_at(3, "c", 200, vec![]).unwrap();
        ledger.apply_transaction_at(4, "d", 300, vec![]).unwrap();

        let reasons: Vec<String> = ledger
            .history(None)
            .unwrap()
            .into_iter()
            .map(|t| t.reason)
            .collect();
        assert_eq!(reasons, vec!["d", "b", "c", "a"]);

        let reasons: Vec<String> = ledger
            .history(Some(200))
            .unwrap()
            .into_iter()
            .map(|t| t.reason)
            .collect();
        assert_eq!(reasons, vec!["d", "b"], "Cutoff is exclusive");
        assert_eq!(ledger.net_change(Some(100)).unwrap(), 9);
    }

    #[test]
    fn tst_corrupt_balance() {
        let mut store = MemoryStore::new();
        store.set(KEY_STARS, "lots".to_string()).unwrap();
        store.set(KEY_HISTORY, "[]".to_string()).unwrap();
        let ledger = Ledger::new(&mut store);
        match ledger.balance() {
            Ok(_) => panic!("Should err on unreadable balance"),
            Err(e) => assert!(matches!(
                e,
                LedgerError::Persistence(StorageError::Corrupt { .. })
            )),
        }
    }
}
