pub mod clients;
pub mod entitlements;
pub mod enums;
pub mod jobs;
pub mod plan_configurations;
pub mod plans;
pub mod subscriptions;
