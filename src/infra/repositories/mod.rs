pub mod sqlite_session_repo;
pub mod sqlite_session_exception_repo;

pub mod postgres_session_repo;
pub mod postgres_session_exception_repo;
