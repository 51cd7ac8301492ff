pub mod training_job;
