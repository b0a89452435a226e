pub mod audit_actions;
pub mod ledger_categories;
pub mod payment_providers;
pub mod payment_request_statuses;
pub mod plan_tiers;
