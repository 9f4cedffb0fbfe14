pub mod approval;
pub mod audit;
pub mod lifecycle;
pub mod request;
pub mod role;
pub mod user;
