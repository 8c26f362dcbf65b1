use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::client::ClientInfoDraft;
use crate::domain::deadline::{parse_deadline, DeadlineError};
use crate::domain::product::{Product, ProductId};
use crate::domain::submission::QuoteSubmission;
use crate::domain::workflow::WizardStep;
use crate::flows::edit::{save_edit, EditSlot};
use crate::flows::session::WizardSession;
use crate::flows::states::{
    Notification, TransitionOutcome, WizardAction, WizardContext, WizardEffect,
};
use crate::intake::extract_products;

pub trait FlowDefinition {
    fn initial_session(&self) -> WizardSession;
    fn transition(
        &self,
        session: &WizardSession,
        action: &WizardAction,
        context: &WizardContext,
    ) -> Result<TransitionOutcome, FlowTransitionError>;
}

/// The six-step quote intake wizard.
#[derive(Clone, Debug, Default)]
pub struct QuoteIntakeFlow;

impl FlowDefinition for QuoteIntakeFlow {
    fn initial_session(&self) -> WizardSession {
        WizardSession::default()
    }

    fn transition(
        &self,
        session: &WizardSession,
        action: &WizardAction,
        context: &WizardContext,
    ) -> Result<TransitionOutcome, FlowTransitionError> {
        transition_quote_intake(session, action, context)
    }
}

pub struct FlowEngine<F> {
    flow: F,
}

impl<F> FlowEngine<F>
where
    F: FlowDefinition,
{
    pub fn new(flow: F) -> Self {
        Self { flow }
    }

    pub fn initial_session(&self) -> WizardSession {
        self.flow.initial_session()
    }

    /// Applies `action` to `session`. On error the caller keeps `session` as is.
    pub fn apply(
        &self,
        session: &WizardSession,
        action: &WizardAction,
        context: &WizardContext,
    ) -> Result<TransitionOutcome, FlowTransitionError> {
        let result = self.flow.transition(session, action, context);
        match &result {
            Ok(outcome) if outcome.from != outcome.to => {
                info!(
                    event_name = "wizard.step_changed",
                    action = outcome.action,
                    from = outcome.from.number(),
                    to = outcome.to.number(),
                    effects = outcome.effects.len(),
                    "wizard moved to {}",
                    outcome.to.title()
                );
            }
            Ok(outcome) => {
                debug!(
                    event_name = "wizard.transition_applied",
                    action = outcome.action,
                    step = outcome.to.number(),
                    effects = outcome.effects.len(),
                    "wizard action applied"
                );
            }
            Err(error) => {
                warn!(
                    event_name = "wizard.transition_rejected",
                    action = action.name(),
                    step = session.step().number(),
                    error = %error,
                    "wizard action rejected"
                );
            }
        }
        result
    }
}

impl Default for FlowEngine<QuoteIntakeFlow> {
    fn default() -> Self {
        Self::new(QuoteIntakeFlow)
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FlowTransitionError {
    #[error("no document attached and no product text entered")]
    MissingDocument,
    #[error("missing required fields before leaving {step:?}: {missing_fields:?}")]
    MissingRequiredFields { step: WizardStep, missing_fields: Vec<String> },
    #[error("products still awaiting verification: {product_ids:?}")]
    UnverifiedProducts { product_ids: Vec<ProductId> },
    #[error(transparent)]
    Deadline(#[from] DeadlineError),
    #[error("no product text entered to build a manual product from")]
    EmptyDocumentContent,
    #[error("product `{product_id}` does not exist")]
    ProductNotFound { product_id: ProductId },
    #[error("product `{product_id}` has unsaved edits")]
    UnsavedEdit { product_id: ProductId },
    #[error("no product is being edited")]
    NoActiveEdit,
    #[error("`{action}` is not available on step {step:?}")]
    ActionUnavailable { step: WizardStep, action: &'static str },
}

impl FlowTransitionError {
    /// The message shown to the person filling in the wizard.
    pub fn notification(&self) -> Notification {
        match self {
            Self::MissingDocument => Notification::destructive(
                "No content found",
                "Upload a document or enter your product information before continuing.",
            ),
            Self::MissingRequiredFields { missing_fields, .. } => Notification::destructive(
                "Missing Information",
                format!("Please fill in all required fields: {}.", missing_fields.join(", ")),
            ),
            Self::UnverifiedProducts { product_ids } => Notification::destructive(
                "Products awaiting verification",
                format!("Verify the remaining {} product(s) before continuing.", product_ids.len()),
            ),
            Self::Deadline(DeadlineError::Missing) => {
                Notification::destructive("Missing Information", "Please specify your deadline.")
            }
            Self::Deadline(DeadlineError::Invalid { .. }) => Notification::destructive(
                "Invalid deadline",
                "Enter the deadline as a date (YYYY-MM-DD).",
            ),
            Self::Deadline(DeadlineError::InPast { .. }) => Notification::destructive(
                "Invalid deadline",
                "The deadline cannot be earlier than today.",
            ),
            Self::EmptyDocumentContent => Notification::destructive(
                "No content found",
                "Please enter product information in the text area.",
            ),
            Self::ProductNotFound { product_id } => Notification::destructive(
                "Product not found",
                format!("Product {product_id} is not part of this request."),
            ),
            Self::UnsavedEdit { .. } => Notification::destructive(
                "Unsaved changes",
                "Save or cancel the product you are editing first.",
            ),
            Self::NoActiveEdit => {
                Notification::destructive("Nothing to update", "Open a product for editing first.")
            }
            Self::ActionUnavailable { step, .. } => Notification::destructive(
                "Action unavailable",
                format!("This action is not available on the {} step.", step.title()),
            ),
        }
    }
}

fn transition_quote_intake(
    session: &WizardSession,
    action: &WizardAction,
    context: &WizardContext,
) -> Result<TransitionOutcome, FlowTransitionError> {
    let from = session.step();
    if !offered_on(action, from) {
        return Err(FlowTransitionError::ActionUnavailable { step: from, action: action.name() });
    }

    let mut next = session.clone();
    let mut effects = Vec::new();

    match action {
        WizardAction::ChooseDocument { has_document } => {
            if *has_document && next.drafts.attached_file.is_none() {
                return Err(FlowTransitionError::MissingDocument);
            }
            next.state.has_document = *has_document;
            advance(&mut next, context, &mut effects)?;
        }
        WizardAction::AttachDocument { file_name } => {
            next.state.has_document = true;
            next.drafts.attached_file = Some(file_name.clone());
        }
        WizardAction::SetDocumentContent { content } => {
            next.state.document_content = content.clone();
        }
        WizardAction::ExtractionCompleted { response } => {
            let products = extract_products(response);
            let file = attached_file_label(&next);
            next.state.original_extraction_response = Some(response.clone());
            if products.is_empty() {
                effects.push(WizardEffect::Notify(Notification::destructive(
                    "Document uploaded",
                    format!("{file} was processed but no products were found. Please add them manually."),
                )));
            } else {
                effects.push(WizardEffect::Notify(Notification::info(
                    "Document processed successfully",
                    format!(
                        "Found {} products from {file}. You can now proceed to verification.",
                        products.len()
                    ),
                )));
                next.state.products = products;
                next.drafts.edit = EditSlot::default();
            }
        }
        WizardAction::ExtractionFailed { reason } => {
            warn!(event_name = "wizard.extraction_failed", reason = %reason, "document extraction failed");
            effects.push(WizardEffect::Notify(Notification::destructive(
                "Upload error",
                format!("Failed to process {}. Please try again.", attached_file_label(&next)),
            )));
        }
        WizardAction::AddManualProduct => {
            if !next.state.has_typed_content() {
                return Err(FlowTransitionError::EmptyDocumentContent);
            }
            next.state.products = vec![Product::manual_entry()];
            next.drafts.edit = EditSlot::default();
            effects.push(WizardEffect::Notify(Notification::info(
                "Product created from text",
                "Please verify and update the product details.",
            )));
        }
        WizardAction::SelectClientType { is_existing } => {
            next.drafts.client = ClientInfoDraft::for_client_type(*is_existing);
        }
        WizardAction::EditClientDraft { draft } => {
            next.drafts.client = draft.clone();
        }
        WizardAction::ClearClientDraft => {
            next.drafts.client = ClientInfoDraft::default();
        }
        WizardAction::SetQuantity { product_id, input } => {
            product_mut(&mut next, product_id)?.set_quantity_from_input(input);
        }
        WizardAction::SetVerified { product_id, verified } => {
            product_mut(&mut next, product_id)?.verified = *verified;
        }
        WizardAction::BeginEdit { product_id, discard_unsaved } => {
            let product = next.state.product(product_id).cloned().ok_or_else(|| {
                FlowTransitionError::ProductNotFound { product_id: product_id.clone() }
            })?;
            let displaced = next.drafts.edit.begin(&product, *discard_unsaved)?;
            if let Some(displaced) = displaced.filter(|draft| draft.is_dirty()) {
                effects.push(WizardEffect::Notify(Notification::info(
                    "Changes discarded",
                    format!("Unsaved changes to {} were discarded.", displaced.product_id),
                )));
            }
        }
        WizardAction::UpdateEditDraft { product } => {
            next.drafts.edit.update(product.clone())?;
        }
        WizardAction::SaveEdit { product_id, product } => {
            save_edit(&mut next.state.products, product_id, product.clone())?;
            next.drafts.edit.release(product_id);
            effects.push(WizardEffect::Notify(Notification::info(
                "Product updated",
                format!("Changes to {product_id} have been saved."),
            )));
        }
        WizardAction::CancelEdit => {
            next.drafts.edit.cancel();
        }
        WizardAction::SetDeadlineDraft { deadline } => {
            next.drafts.deadline = deadline.clone();
        }
        WizardAction::Advance => advance(&mut next, context, &mut effects)?,
        WizardAction::Retreat => {
            next.state.step = from.previous();
        }
        WizardAction::SubmissionFinished { delivered } => {
            let notification = if *delivered {
                Notification::info(
                    "Quote Request Submitted",
                    "Your quote request has been successfully submitted and will be processed shortly.",
                )
            } else {
                Notification::destructive(
                    "Submission not confirmed",
                    "Your quote request was completed but could not be delivered to our team. Please contact us to confirm it was received.",
                )
            };
            effects.push(WizardEffect::Notify(notification));
        }
        WizardAction::Reset => {
            next = WizardSession::default();
        }
    }

    Ok(TransitionOutcome { from, to: next.step(), action: action.name(), session: next, effects })
}

/// Whether `action` can be taken on `step`. The product list only changes
/// before the verification gate has been passed, and the submitted step only
/// accepts a reset.
fn offered_on(action: &WizardAction, step: WizardStep) -> bool {
    match action {
        WizardAction::Advance | WizardAction::SubmissionFinished { .. } | WizardAction::Reset => true,
        _ if step == WizardStep::Submitted => false,
        WizardAction::ChooseDocument { .. }
        | WizardAction::AttachDocument { .. }
        | WizardAction::SetDocumentContent { .. } => step == WizardStep::DocumentIntake,
        WizardAction::ExtractionCompleted { .. }
        | WizardAction::ExtractionFailed { .. }
        | WizardAction::AddManualProduct => step <= WizardStep::ProductVerification,
        WizardAction::SetQuantity { .. }
        | WizardAction::SetVerified { .. }
        | WizardAction::BeginEdit { .. }
        | WizardAction::UpdateEditDraft { .. }
        | WizardAction::SaveEdit { .. }
        | WizardAction::CancelEdit => step == WizardStep::ProductVerification,
        WizardAction::SelectClientType { .. }
        | WizardAction::EditClientDraft { .. }
        | WizardAction::ClearClientDraft
        | WizardAction::SetDeadlineDraft { .. }
        | WizardAction::Retreat => true,
    }
}

/// Moves one step forward if the current step's gate holds, committing the
/// step's draft on the way.
fn advance(
    next: &mut WizardSession,
    context: &WizardContext,
    effects: &mut Vec<WizardEffect>,
) -> Result<(), FlowTransitionError> {
    let step = next.step();
    match step {
        WizardStep::DocumentIntake => {
            if !next.state.has_document && !next.state.has_typed_content() {
                return Err(FlowTransitionError::MissingDocument);
            }
        }
        WizardStep::ClientInformation => {
            let client_info = next.drafts.client.commit().map_err(|missing| {
                FlowTransitionError::MissingRequiredFields { step, missing_fields: missing.0 }
            })?;
            let description = if client_info.is_existing {
                format!(
                    "Welcome back, {}!",
                    client_info.full_name.as_deref().unwrap_or("valued client")
                )
            } else {
                "New account information has been recorded.".to_owned()
            };
            effects.push(WizardEffect::Notify(Notification::info(
                "Client information saved",
                description,
            )));
            next.state.client_info = Some(client_info);
        }
        WizardStep::ProductVerification => {
            let product_ids = next.state.unverified_product_ids();
            if !product_ids.is_empty() {
                return Err(FlowTransitionError::UnverifiedProducts { product_ids });
            }
        }
        WizardStep::Deadline => {
            next.state.deadline = Some(parse_deadline(&next.drafts.deadline, context.today)?);
        }
        WizardStep::FinalReview => {
            next.state.is_completed = true;
            effects.push(WizardEffect::SubmitQuote(QuoteSubmission::from_state(
                &next.state,
                context.now,
            )));
        }
        WizardStep::Submitted => {}
    }

    next.state.step = step.next();
    Ok(())
}

fn product_mut<'a>(
    session: &'a mut WizardSession,
    product_id: &ProductId,
) -> Result<&'a mut Product, FlowTransitionError> {
    session
        .state
        .product_mut(product_id)
        .ok_or_else(|| FlowTransitionError::ProductNotFound { product_id: product_id.clone() })
}

fn attached_file_label(session: &WizardSession) -> String {
    session.drafts.attached_file.clone().unwrap_or_else(|| "The document".to_owned())
}
