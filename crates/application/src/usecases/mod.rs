pub mod audit_trail;
pub mod entitlements;
pub mod idempotency_guard;
pub mod payment_review;
pub mod payment_webhook;
pub mod plan_resolver;
