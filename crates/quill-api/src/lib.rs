pub mod auth;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod posts;
pub mod router;
pub mod token;

pub use router::router;
