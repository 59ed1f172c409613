use crate::catalog::Prize;
use crate::constants::DEFAULT_PRIZE_ICON;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of a redemption request, pending moves to one of the two
/// terminal states exactly once
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
        }
    }

    pub fn is_decided(&self) -> bool {
        *self != RequestStatus::Pending
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A child's attempt to spend stars on a prize.
/// The prize fields are copies taken at creation, `prize_id` is only a weak
/// reference and may point at a prize that no longer exists
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedemptionRequest {
    pub id: String,
    pub prize_id: String,
    pub prize_name: String,
    pub prize_cost: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prize_icon: Option<String>,
    pub status: RequestStatus,
    /// Creation time, epoch milliseconds
    pub timestamp: i64,
}

impl RedemptionRequest {
    /// Snapshots the prize as it is right now into a pending request
    pub fn pending_for(prize: &Prize, timestamp: i64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            prize_id: prize.id.clone(),
            prize_name: prize.name.clone(),
            prize_cost: prize.cost,
            prize_icon: Some(
                prize
                    .icon
                    .clone()
                    .unwrap_or_else(|| DEFAULT_PRIZE_ICON.to_string()),
            ),
            status: RequestStatus::Pending,
            timestamp,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == RequestStatus::Pending
    }
}
