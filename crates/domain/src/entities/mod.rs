pub mod audit_logs;
pub mod entitlements;
pub mod financial_transactions;
pub mod payment_requests;
pub mod plans;
pub mod profiles;
