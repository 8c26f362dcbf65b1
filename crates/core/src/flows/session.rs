use serde::{Deserialize, Serialize};

use crate::domain::client::ClientInfoDraft;
use crate::domain::workflow::{WizardStep, WorkflowState};
use crate::flows::edit::EditSlot;

/// Per-step input not yet committed to the workflow state.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardDrafts {
    pub client: ClientInfoDraft,
    pub deadline: String,
    pub attached_file: Option<String>,
    pub edit: EditSlot,
}

/// The whole wizard: committed state plus drafts. Transitions replace it wholesale.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardSession {
    pub state: WorkflowState,
    pub drafts: WizardDrafts,
}

impl WizardSession {
    pub fn step(&self) -> WizardStep {
        self.state.step
    }

    /// Whether the forward button of the current step is enabled.
    pub fn can_advance(&self) -> bool {
        match self.state.step {
            WizardStep::DocumentIntake => {
                self.state.has_document || self.state.has_typed_content()
            }
            WizardStep::ClientInformation => {
                self.drafts.client.missing_required_fields().is_empty()
            }
            WizardStep::ProductVerification => self.state.all_products_verified(),
            WizardStep::Deadline => !self.drafts.deadline.trim().is_empty(),
            WizardStep::FinalReview => true,
            WizardStep::Submitted => false,
        }
    }
}
