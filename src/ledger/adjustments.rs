use super::{Ledger, LedgerError};
use crate::catalog::Task;
use crate::constants::{BONUS_PREFIX, CONQUERED_PREFIX, PENALTY_PREFIX};
use crate::storage::KeyValueStore;
use crate::transaction::StarTransaction;

fn validate_adjustment(amount: i64, reason: &str) -> Result<(), LedgerError> {
    if amount <= 0 {
        return Err(LedgerError::InvalidAmount(amount));
    }
    if reason.trim().is_empty() {
        return Err(LedgerError::EmptyReason);
    }
    Ok(())
}

impl<'s, S: KeyValueStore + ?Sized> Ledger<'s, S> {
    /// Awards the task's stars, one fewer if the timer ran out first.
    /// Returns None when the award comes to zero stars
    pub fn complete_task(
        &mut self,
        task: &Task,
        finished_in_time: bool,
    ) -> Result<Option<StarTransaction>, LedgerError> {
        if task.reward_stars <= 0 {
            return Err(LedgerError::InvalidAmount(task.reward_stars));
        }
        let stars = if finished_in_time {
            task.reward_stars
        } else {
            task.reward_stars.saturating_sub(1)
        };
        if stars == 0 {
            return Ok(None);
        }
        let reason = format!("{}{}", CONQUERED_PREFIX, task.name);
        self.apply_transaction(stars, &reason).map(Some)
    }

    /// Parent granted extra stars
    pub fn grant_bonus(
        &mut self,
        amount: i64,
        reason: &str,
    ) -> Result<StarTransaction, LedgerError> {
        validate_adjustment(amount, reason)?;
        let reason = format!("{}{}", BONUS_PREFIX, reason.trim());
        self.apply_transaction(amount, &reason)
    }

    /// Parent took stars away. `amount` is the positive number to deduct
    pub fn deduct_penalty(
        &mut self,
        amount: i64,
        reason: &str,
    ) -> Result<StarTransaction, LedgerError> {
        validate_adjustment(amount, reason)?;
        let reason = format!("{}{}", PENALTY_PREFIX, reason.trim());
        self.apply_transaction(-amount, &reason)
    }
}

#[cfg(test)]
mod tests {
    use crate::catalog::Task;
    use crate::ledger::{Ledger, LedgerError};
    use crate::storage::MemoryStore;

    fn read_book() -> Task {
        Task {
            id: "2".to_string(),
            name: "Read Book".to_string(),
            icon: "📖".to_string(),
            duration_minutes: 15,
            reward_stars: 5,
        }
    }

    #[test]
    fn tst_complete_task() {
        let mut store = MemoryStore::new();
        let mut ledger = Ledger::new(&mut store);

        let txn = ledger.complete_task(&read_book(), true).unwrap().unwrap();
        assert_eq!(txn.amount, 5);
        assert_eq!(txn.reason, "Conquered Read Book");

        let txn = ledger.complete_task(&read_book(), false).unwrap().unwrap();
        assert_eq!(txn.amount, 4, "Late finish should award one star fewer");
        assert_eq!(ledger.balance().unwrap(), 9);

        let mut tiny = read_book();
        tiny.reward_stars = 1;
        let res = ledger.complete_task(&tiny, false).unwrap();
        assert!(res.is_none(), "Zero award should record nothing");
        assert_eq!(ledger.history(None).unwrap().len(), 2);
    }

    #[test]
    fn tst_complete_task_non_positive_reward() {
        let mut store = MemoryStore::new();
        let mut ledger = Ledger::new(&mut store);

        for reward in [0, -7, i64::MIN] {
            let mut broken = read_book();
            broken.reward_stars = reward;
            for finished_in_time in [true, false] {
                match ledger.complete_task(&broken, finished_in_time) {
                    Ok(_) => panic!("Should err since reward is {}", reward),
                    Err(e) => assert!(matches!(e, LedgerError::InvalidAmount(r) if r == reward)),
                }
            }
        }
        assert_eq!(ledger.balance().unwrap(), 0);
        assert!(ledger.history(None).unwrap().is_empty());
    }

    #[test]
    fn tst_complete_task_late_at_max_reward() {
        let mut store = MemoryStore::new();
        let mut ledger = Ledger::new(&mut store);
        let mut huge = read_book();
        huge.reward_stars = i64::MAX;
        let txn = ledger.complete_task(&huge, false).unwrap().unwrap();
        assert_eq!(txn.amount, i64::MAX - 1);
    }

    #[test]
    fn tst_bonus_and_penalty() {
        let mut store = MemoryStore::new();
        let mut ledger = Ledger::new(&mut store);

        let txn = ledger.grant_bonus(3, " helped cook ").unwrap();
        assert_eq!(txn.reason, "Parent Reward: helped cook");

        let txn = ledger.deduct_penalty(5, "late to bed").unwrap();
        assert_eq!(txn.amount, -5);
        assert_eq!(txn.reason, "Parent Penalty: late to bed");
        assert_eq!(ledger.balance().unwrap(), -2);

        match ledger.grant_bonus(0, "nothing") {
            Ok(_) => panic!("Should err since amount is zero"),
            Err(e) => assert!(matches!(e, LedgerError::InvalidAmount(0))),
        }
        match ledger.deduct_penalty(-4, "sneaky") {
            Ok(_) => panic!("Should err since amount is negative"),
            Err(e) => assert!(matches!(e, LedgerError::InvalidAmount(-4))),
        }
        match ledger.grant_bonus(2, "") {
            Ok(_) => panic!("Should err since reason is empty"),
            Err(e) => assert!(matches!(e, LedgerError::EmptyReason)),
        }
        assert_eq!(ledger.balance().unwrap(), -2, "Refused adjustments change nothing");
    }
}
