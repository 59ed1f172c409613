use crate::catalog::Prize;
use crate::constants::{KEY_REQUESTS, REDEEMED_PREFIX, REFUND_PREFIX};
use crate::ledger::{now_millis, Ledger, LedgerError};
use crate::request::{RedemptionRequest, RequestStatus};
use crate::storage::{encode_json, read_json, KeyValueStore};
use tracing::{info, warn};

/// Prize redemption workflow. Owns the request list, every star movement
/// goes through the wrapped `Ledger`
#[derive(Debug)]
pub struct Redemptions<'s, S: KeyValueStore + ?Sized> {
    ledger: Ledger<'s, S>,
}

impl<'s, S: KeyValueStore + ?Sized> Redemptions<'s, S> {
    pub fn new(store: &'s mut S) -> Self {
        Self {
            ledger: Ledger::new(store),
        }
    }

    pub fn ledger(&self) -> &Ledger<'s, S> {
        &self.ledger
    }

    /// All requests in creation order
    pub fn requests(&self) -> Result<Vec<RedemptionRequest>, LedgerError> {
        Ok(read_json::<Vec<RedemptionRequest>, S>(self.ledger.store(), KEY_REQUESTS)?
            .unwrap_or_default())
    }

    pub fn list_pending(&self) -> Result<Vec<RedemptionRequest>, LedgerError> {
        Ok(self
            .requests()?
            .into_iter()
            .filter(|req| req.is_pending())
            .collect())
    }

    pub fn list_decided(&self) -> Result<Vec<RedemptionRequest>, LedgerError> {
        Ok(self
            .requests()?
            .into_iter()
            .filter(|req| req.status.is_decided())
            .collect())
    }

    /// Debits the prize cost & files a pending request for it.
    /// The balance is read fresh here rather than trusting whatever the
    /// caller last displayed. Debit, new balance and the appended request
    /// are persisted as one batch
    pub fn create_request(&mut self, prize: &Prize) -> Result<RedemptionRequest, LedgerError> {
        if prize.cost <= 0 {
            return Err(LedgerError::InvalidAmount(prize.cost));
        }
        let balance = self.ledger.balance()?;
        if balance < prize.cost {
            warn!(prize = %prize.name, cost = prize.cost, balance, "not enough stars to redeem");
            return Err(LedgerError::InsufficientBalance {
                balance,
                cost: prize.cost,
            });
        }

        let now = now_millis();
        let reason = format!("{}{}", REDEEMED_PREFIX, prize.name);
        let request = RedemptionRequest::pending_for(prize, now);
        let mut requests = self.requests()?;
        requests.push(request.clone());
        let staged = vec![(KEY_REQUESTS, encode_json(KEY_REQUESTS, &requests)?)];
        self.ledger
            .apply_transaction_at(-prize.cost, &reason, now, staged)?;

        info!(
            request_id = %request.id,
            prize = %request.prize_name,
            cost = request.prize_cost,
            "redemption requested"
        );
        Ok(request)
    }

    /// Parent decision on a pending request. Rejection refunds the snapshot
    /// cost in the same batch as the status change; approval moves no stars.
    /// Deciding twice is an error so a repeated click cannot refund twice
    pub fn decide_request(
        &mut self,
        request_id: &str,
        approved: bool,
    ) -> Result<RedemptionRequest, LedgerError> {
        let mut requests = self.requests()?;
        let request = requests
            .iter_mut()
            .find(|req| req.id == request_id)
            .ok_or_else(|| LedgerError::NotFound(request_id.to_string()))?;
        if request.status.is_decided() {
            warn!(request_id, status = %request.status, "request already decided");
            return Err(LedgerError::AlreadyDecided {
                id: request_id.to_string(),
                status: request.status,
            });
        }
        request.status = if approved {
            RequestStatus::Approved
        } else {
            RequestStatus::Rejected
        };
        let decided = request.clone();
        let encoded = encode_json(KEY_REQUESTS, &requests)?;

        if approved {
            self.ledger.store_mut().set(KEY_REQUESTS, encoded)?;
        } else {
            let reason = format!("{}{}", REFUND_PREFIX, decided.prize_name);
            self.ledger.apply_transaction_at(
                decided.prize_cost,
                &reason,
                now_millis(),
                vec![(KEY_REQUESTS, encoded)],
            )?;
        }

        info!(request_id, status = %decided.status, "redemption decided");
        Ok(decided)
    }
}
