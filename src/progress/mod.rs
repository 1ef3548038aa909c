//! Progress reporting for research runs

pub mod cards;
mod emitter;
mod event;
mod handler;
mod logging;

pub use emitter::{ConsumerGone, ProgressEmitter, ProgressStream};
pub use event::{
    EventKind, EventPayload, EventStatus, ProgressEvent, ResearchUpdate, ENVELOPE_TYPE,
};
pub use handler::{NoOpHandler, ProgressHandler};
pub use logging::LoggingHandler;
