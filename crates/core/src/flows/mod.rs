pub mod edit;
pub mod engine;
pub mod session;
pub mod states;

pub use edit::{save_edit, EditDraft, EditSlot};
pub use engine::{FlowDefinition, FlowEngine, FlowTransitionError, QuoteIntakeFlow};
pub use session::{WizardDrafts, WizardSession};
pub use states::{
    Notification, NotificationTone, TransitionOutcome, WizardAction, WizardContext, WizardEffect,
};
