//! Outbound webhook calls for the quote intake wizard and the async runtime
//! that drives the reducer against them.

pub mod error;
pub mod extraction;
pub mod retry;
pub mod runtime;
pub mod submission;

pub use error::WebhookError;
pub use extraction::{DocumentUpload, ExtractionClient, ExtractionService};
pub use retry::{Delivery, DeliveryFailure, RetryPolicy};
pub use runtime::{CallReport, DispatchOutcome, IntakeRuntime};
pub use submission::{RecordingSink, SubmissionClient, SubmissionSink};
