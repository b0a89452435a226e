use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    PaymentRequested,
    PaymentApproved,
    PaymentRejected,
    AdsActivated,
    ReviewedEvidenceAttached,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::PaymentRequested => "payment_requested",
            AuditAction::PaymentApproved => "payment_approved",
            AuditAction::PaymentRejected => "payment_rejected",
            AuditAction::AdsActivated => "ads_activated",
            AuditAction::ReviewedEvidenceAttached => "reviewed_evidence_attached",
        }
    }
}

impl Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
