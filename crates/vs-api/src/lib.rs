//! vs-api: job-runner HTTP surface for voxseal
//!
//! Accepts jobs the way a serverless runner delivers them and answers with
//! the handler's [`JobResult`](vs_handler::JobResult). Built with axum.
//!
//! | Route | Method | |
//! |---|---|---|
//! | `/runsync` | POST | run a job, reply with its output |
//! | `/run` | POST | same; jobs run inline, there is no queue |
//! | `/health` | GET | liveness |

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;

pub use error::{ApiError, Result};
pub use server::{AppState, router, start_server};
