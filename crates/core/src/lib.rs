pub mod config;
pub mod domain;
pub mod flows;
pub mod intake;

pub use domain::client::{ClientInfo, ClientInfoDraft};
pub use domain::product::{Product, ProductId, ProductSpecs};
pub use domain::submission::QuoteSubmission;
pub use domain::workflow::{WizardStep, WorkflowState};
pub use flows::{
    FlowEngine, FlowTransitionError, Notification, NotificationTone, QuoteIntakeFlow,
    TransitionOutcome, WizardAction, WizardContext, WizardEffect, WizardSession,
};
pub use intake::{extract_products, locate_products, normalize};
