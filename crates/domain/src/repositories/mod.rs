pub mod audit_logs;
pub mod entitlements;
pub mod payment_ledger;
pub mod payment_reviews;
pub mod settings;
pub mod users;
