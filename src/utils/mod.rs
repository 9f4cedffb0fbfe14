pub mod api_response;
pub mod audit;
pub mod credentials;
pub mod validation;
