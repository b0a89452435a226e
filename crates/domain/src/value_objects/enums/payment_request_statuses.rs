use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Default, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentRequestStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl PaymentRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentRequestStatus::Pending => "pending",
            PaymentRequestStatus::Approved => "approved",
            PaymentRequestStatus::Rejected => "rejected",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(PaymentRequestStatus::Pending),
            "approved" => Some(PaymentRequestStatus::Approved),
            "rejected" => Some(PaymentRequestStatus::Rejected),
            _ => None,
        }
    }

    /// Approved and rejected requests never transition again.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PaymentRequestStatus::Pending)
    }
}

impl Display for PaymentRequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
