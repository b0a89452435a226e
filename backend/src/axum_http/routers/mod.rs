pub mod admin_payments;
pub mod entitlements;
pub mod payment_requests;
pub mod payment_webhooks;
