//! vs-handler: job handling for voxseal
//!
//! Validates untrusted job input, routes it by mode and runs the TTS or VC
//! pipeline over sealed payloads:
//!
//! ```text
//! job ─▶ Dispatcher ─▶ tts::handle ─▶ decrypt text ─▶ [reference audio] ─▶ generate ─▶ seal
//!                   └▶ vc::handle  ─▶ open source + target ─▶ convert ─▶ seal
//! ```
//!
//! Every failure is returned as a [`JobResult`] error; nothing here panics
//! on bad input or returns `Err` to the runner.

pub mod context;
pub mod dispatcher;
pub mod error;
pub mod job;
pub mod request;
pub mod result;
pub mod tts;
pub mod vc;

mod transport;

#[cfg(test)]
mod testing;

pub use context::WorkerContext;
pub use dispatcher::Dispatcher;
pub use error::{HandlerError, Result, Stage};
pub use job::{Job, JobInput};
pub use request::{Mode, TtsRequest, ValidationError, VcRequest};
pub use result::JobResult;
