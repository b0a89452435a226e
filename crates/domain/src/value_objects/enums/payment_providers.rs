use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PaymentProvider {
    /// Proof of payment uploaded by the user and reviewed by an admin.
    Manual,
    PerfectPay,
}

impl PaymentProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentProvider::Manual => "manual",
            PaymentProvider::PerfectPay => "perfect_pay",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "manual" => Some(PaymentProvider::Manual),
            "perfect_pay" => Some(PaymentProvider::PerfectPay),
            _ => None,
        }
    }
}

impl Display for PaymentProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
