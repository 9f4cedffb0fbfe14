//! Plain SQL, one function per statement. Each takes any Postgres executor so the same
//! statement runs on the pool or inside a transaction.

pub mod approval;
pub mod audit;
pub mod lifecycle;
pub mod request;
pub mod user;
