pub mod auth;
pub mod message;
pub mod request;
pub mod stats;
