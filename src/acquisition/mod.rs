mod pipeline;
mod reader;
mod relay;
mod stats;
mod status;

pub use pipeline::Pipeline;
pub use pipeline::PipelineError;
pub use pipeline::PipelineSettings;
pub use pipeline::PipelineState;
pub use reader::ReadWorker;
pub use reader::ReaderOutcome;
pub use relay::RelayOutcome;
pub use relay::RelayWorker;
pub use stats::AcquisitionStats;
pub use stats::ReaderStats;
pub use stats::RelayStats;
pub use status::StatusReceiver;
pub use status::StatusReporter;
pub use status::StatusSender;
pub use status::StatusUpdate;
