pub mod auth;
pub mod chat;
pub mod chats;
pub mod config;
pub mod error;
pub mod middleware;
pub mod quiz;
pub mod quizzes;
pub mod routes;
pub mod state;

pub use config::Config;
pub use error::ApiError;
pub use routes::router;
pub use state::{AppState, AppStateInner};
