pub mod account_service;
pub mod evaluation_service;
pub mod internship_service;
pub mod lifecycle;
pub mod notifier;
pub mod profile_service;
pub mod role_gate;
pub mod workflow_service;
