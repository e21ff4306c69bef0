//! # Repocast API
//!
//! Administration HTTP surface: job schedules and activity, execution
//! history, and the loaded endpoint table. Schedule and status changes go
//! through [`repocast_scheduler::JobAdmin`], which reconfigures the live
//! timers.

mod auth;
pub mod error;
mod handlers;
mod routes;
mod server;
mod state;

pub use error::ApiError;
pub use handlers::CronView;
pub use routes::create_router;
pub use server::{ApiServer, ApiServerConfig};
pub use state::ApiState;
