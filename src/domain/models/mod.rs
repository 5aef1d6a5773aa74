pub mod occurrence;
pub mod session;
pub mod session_exception;
