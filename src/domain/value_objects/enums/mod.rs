pub mod billing_frequencies;
pub mod job_statuses;
pub mod subscription_statuses;
