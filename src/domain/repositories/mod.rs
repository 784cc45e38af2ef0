pub mod clients;
pub mod jobs;
pub mod plan_configurations;
pub mod plans;
pub mod subscriptions;
