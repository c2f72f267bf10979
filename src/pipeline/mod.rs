//! Execution engine: source thread, page workers, sink, first-error and cancel handling.
//!
//! Source → supply channel → workers (stages) → results channel → Vec<Page>.

pub mod context;
pub mod error_handler;
pub mod orchestrator;
pub mod source;
pub mod workers;

pub use context::{
    CancelToken, PipelineChannels, PipelineHandles, PipelineTuning, RunSignals,
    create_pipeline_channels,
};
pub use error_handler::{check_run_outcome, failed_pages};
pub use orchestrator::{collect_pages, run_pipeline, shutdown_pipeline_handles};
pub use source::{run_source_loop, spawn_source_thread};
pub use workers::{process_page, spawn_page_workers};
