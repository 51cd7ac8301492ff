pub mod index;
pub mod liveness;
pub mod readiness;
pub mod results;
pub mod training;
