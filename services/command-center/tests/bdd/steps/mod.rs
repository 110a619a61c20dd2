//! BDD step definitions for the command center service

pub mod dispatch_steps;
pub mod lifecycle_steps;
pub mod log_steps;
pub mod login_steps;
pub mod normalizer_steps;
pub mod sweep_steps;
