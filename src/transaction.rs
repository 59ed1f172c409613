use serde::{Deserialize, Serialize};

/// Direction of a star transaction, derived from the amount's sign
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxnKind {
    Earned,
    Spent,
}

impl TxnKind {
    /// Zero counts as spent
    pub fn from_amount(amount: i64) -> Self {
        if amount > 0 {
            TxnKind::Earned
        } else {
            TxnKind::Spent
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TxnKind::Earned => "earned",
            TxnKind::Spent => "spent",
        }
    }
}

/// One signed adjustment of the star balance. Never mutated once recorded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StarTransaction {
    pub id: String,
    pub amount: i64,
    pub reason: String,
    /// Epoch milliseconds
    pub timestamp: i64,
    #[serde(rename = "type")]
    pub kind: TxnKind,
}

impl StarTransaction {
    pub fn new(amount: i64, reason: &str, timestamp: i64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            amount,
            reason: reason.to_string(),
            timestamp,
            kind: TxnKind::from_amount(amount),
        }
    }

    /// Whether the stored kind agrees with the amount
    pub fn is_consistent(&self) -> bool {
        self.kind == TxnKind::from_amount(self.amount)
    }
}
