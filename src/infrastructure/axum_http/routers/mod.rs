pub mod clients;
pub mod entitlements;
pub mod jobs;
pub mod plan_configurations;
pub mod subscriptions;
