pub mod auth;
pub mod health;
pub mod publish;

pub use auth::PublishAuth;
