use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::client::ClientInfoDraft;
use crate::domain::product::{Product, ProductId};
use crate::domain::submission::QuoteSubmission;
use crate::domain::workflow::WizardStep;
use crate::flows::session::WizardSession;

/// Everything the wizard reacts to: user input and webhook results.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum WizardAction {
    /// Step-1 choice buttons: upload path (`true`) or typed text (`false`).
    /// Records the choice and tries to advance.
    ChooseDocument { has_document: bool },
    AttachDocument { file_name: String },
    SetDocumentContent { content: String },
    ExtractionCompleted { response: Value },
    ExtractionFailed { reason: String },
    AddManualProduct,
    SelectClientType { is_existing: bool },
    EditClientDraft { draft: ClientInfoDraft },
    ClearClientDraft,
    SetQuantity { product_id: ProductId, input: String },
    SetVerified { product_id: ProductId, verified: bool },
    BeginEdit {
        product_id: ProductId,
        #[serde(default)]
        discard_unsaved: bool,
    },
    UpdateEditDraft { product: Product },
    SaveEdit { product_id: ProductId, product: Product },
    CancelEdit,
    SetDeadlineDraft { deadline: String },
    Advance,
    Retreat,
    SubmissionFinished { delivered: bool },
    Reset,
}

impl WizardAction {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ChooseDocument { .. } => "choose_document",
            Self::AttachDocument { .. } => "attach_document",
            Self::SetDocumentContent { .. } => "set_document_content",
            Self::ExtractionCompleted { .. } => "extraction_completed",
            Self::ExtractionFailed { .. } => "extraction_failed",
            Self::AddManualProduct => "add_manual_product",
            Self::SelectClientType { .. } => "select_client_type",
            Self::EditClientDraft { .. } => "edit_client_draft",
            Self::ClearClientDraft => "clear_client_draft",
            Self::SetQuantity { .. } => "set_quantity",
            Self::SetVerified { .. } => "set_verified",
            Self::BeginEdit { .. } => "begin_edit",
            Self::UpdateEditDraft { .. } => "update_edit_draft",
            Self::SaveEdit { .. } => "save_edit",
            Self::CancelEdit => "cancel_edit",
            Self::SetDeadlineDraft { .. } => "set_deadline_draft",
            Self::Advance => "advance",
            Self::Retreat => "retreat",
            Self::SubmissionFinished { .. } => "submission_finished",
            Self::Reset => "reset",
        }
    }
}

/// Clock readings the reducer needs; injected so transitions stay deterministic.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WizardContext {
    pub today: NaiveDate,
    pub now: DateTime<Utc>,
}

impl WizardContext {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self { today: now.date_naive(), now }
    }

    pub fn current() -> Self {
        Self::at(Utc::now())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationTone {
    Info,
    Destructive,
}

/// A transient message for the person filling in the wizard.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub tone: NotificationTone,
}

impl Notification {
    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self { title: title.into(), description: description.into(), tone: NotificationTone::Info }
    }

    pub fn destructive(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            tone: NotificationTone::Destructive,
        }
    }
}

/// Side effects requested by a transition, executed by the caller.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum WizardEffect {
    Notify(Notification),
    SubmitQuote(QuoteSubmission),
}

#[derive(Clone, Debug, PartialEq)]
pub struct TransitionOutcome {
    pub from: WizardStep,
    pub to: WizardStep,
    pub action: &'static str,
    pub session: WizardSession,
    pub effects: Vec<WizardEffect>,
}

impl TransitionOutcome {
    pub fn notifications(&self) -> impl Iterator<Item = &Notification> {
        self.effects.iter().filter_map(|effect| match effect {
            WizardEffect::Notify(notification) => Some(notification),
            WizardEffect::SubmitQuote(_) => None,
        })
    }

    pub fn submission(&self) -> Option<&QuoteSubmission> {
        self.effects.iter().find_map(|effect| match effect {
            WizardEffect::SubmitQuote(submission) => Some(submission),
            WizardEffect::Notify(_) => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::WizardAction;
    use crate::domain::product::ProductId;

    #[test]
    fn actions_deserialize_from_tagged_json() {
        let actions: Vec<WizardAction> = serde_json::from_value(json!([
            {"action": "choose_document", "has_document": false},
            {"action": "set_quantity", "product_id": "product-0", "input": "3"},
            {"action": "begin_edit", "product_id": "product-1"},
            {"action": "advance"}
        ]))
        .expect("actions should parse");

        assert_eq!(actions[0], WizardAction::ChooseDocument { has_document: false });
        assert_eq!(
            actions[1],
            WizardAction::SetQuantity {
                product_id: ProductId("product-0".to_owned()),
                input: "3".to_owned()
            }
        );
        assert_eq!(
            actions[2],
            WizardAction::BeginEdit {
                product_id: ProductId("product-1".to_owned()),
                discard_unsaved: false
            }
        );
        assert_eq!(actions[3].name(), "advance");
    }
}
