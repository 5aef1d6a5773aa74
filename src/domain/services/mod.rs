pub mod occurrences;
pub mod session_service;
