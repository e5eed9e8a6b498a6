use crate::state::AppState;
use axum::Router;

pub mod client;
pub mod dto;
pub mod handlers;

pub fn router() -> Router<AppState> {
    handlers::match_routes()
}
