pub mod domain;
pub mod export;
pub mod recommendations;
pub mod report;
pub mod source;

pub use report::{ReportParams, ReportSettings};
pub use source::{EventSource, InMemoryEventSource, PgEventSource};
