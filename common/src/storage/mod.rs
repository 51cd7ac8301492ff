pub mod job_store;
pub mod types;
