//! Service layer: event stream processing and output formatting.

mod adapter;
mod event_service;

pub use event_service::EventService;
