pub mod client;
pub mod deadline;
pub mod product;
pub mod submission;
pub mod workflow;
