pub mod audit_logs;
pub mod entitlements;
pub mod enums;
pub mod payment_requests;
pub mod payment_webhooks;
pub mod plans;
