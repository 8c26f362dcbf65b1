use lightquote_core::{
    FlowEngine, FlowTransitionError, Notification, QuoteIntakeFlow, WizardAction, WizardContext,
    WizardEffect, WizardSession, WizardStep,
};
use serde::Serialize;
use tracing::{info, warn};

use crate::extraction::{DocumentUpload, ExtractionService};
use crate::retry::DeliveryFailure;
use crate::submission::SubmissionSink;

/// Result of one webhook call made while dispatching an action.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CallReport {
    pub webhook: &'static str,
    pub delivered: bool,
    pub attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CallReport {
    fn delivered(webhook: &'static str, attempts: u32) -> Self {
        Self { webhook, delivered: true, attempts, error: None }
    }

    fn failed(webhook: &'static str, failure: &DeliveryFailure) -> Self {
        Self {
            webhook,
            delivered: false,
            attempts: failure.attempts,
            error: Some(failure.error.to_string()),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DispatchOutcome {
    pub notifications: Vec<Notification>,
    pub calls: Vec<CallReport>,
}

impl DispatchOutcome {
    fn absorb(&mut self, other: DispatchOutcome) {
        self.notifications.extend(other.notifications);
        self.calls.extend(other.calls);
    }
}

/// Owns one wizard session and carries out the effects its transitions request.
pub struct IntakeRuntime<E, S> {
    engine: FlowEngine<QuoteIntakeFlow>,
    session: WizardSession,
    extraction: E,
    submission: S,
}

impl<E, S> IntakeRuntime<E, S>
where
    E: ExtractionService,
    S: SubmissionSink,
{
    pub fn new(extraction: E, submission: S) -> Self {
        let engine = FlowEngine::default();
        let session = engine.initial_session();
        Self { engine, session, extraction, submission }
    }

    pub fn session(&self) -> &WizardSession {
        &self.session
    }

    pub fn step(&self) -> WizardStep {
        self.session.step()
    }

    pub fn submission_sink(&self) -> &S {
        &self.submission
    }

    pub fn into_session(self) -> WizardSession {
        self.session
    }

    /// Applies `action`; the session is only replaced when the transition succeeds.
    pub async fn dispatch(
        &mut self,
        action: WizardAction,
        context: &WizardContext,
    ) -> Result<DispatchOutcome, FlowTransitionError> {
        let outcome = self.engine.apply(&self.session, &action, context)?;
        self.session = outcome.session;

        let mut report = DispatchOutcome::default();
        let mut submissions = Vec::new();
        for effect in outcome.effects {
            match effect {
                WizardEffect::Notify(notification) => report.notifications.push(notification),
                WizardEffect::SubmitQuote(submission) => submissions.push(submission),
            }
        }

        for submission in submissions {
            let delivered = match self.submission.submit(&submission).await {
                Ok(delivery) => {
                    info!(
                        event_name = "runtime.submission_delivered",
                        attempts = delivery.attempts,
                        products = submission.products.len(),
                        "quote request delivered"
                    );
                    report.calls.push(CallReport::delivered("submission", delivery.attempts));
                    true
                }
                Err(failure) => {
                    warn!(
                        event_name = "runtime.submission_failed",
                        attempts = failure.attempts,
                        error = %failure,
                        "quote request could not be delivered"
                    );
                    report.calls.push(CallReport::failed("submission", &failure));
                    false
                }
            };

            let finished = self.engine.apply(
                &self.session,
                &WizardAction::SubmissionFinished { delivered },
                context,
            )?;
            report.notifications.extend(finished.notifications().cloned());
            self.session = finished.session;
        }

        Ok(report)
    }

    /// Attaches `upload`, sends it to the extraction webhook, and feeds the
    /// response (or the failure) back into the session.
    pub async fn upload_document(
        &mut self,
        upload: &DocumentUpload,
        context: &WizardContext,
    ) -> Result<DispatchOutcome, FlowTransitionError> {
        let mut report = self
            .dispatch(WizardAction::AttachDocument { file_name: upload.file_name.clone() }, context)
            .await?;

        let (action, call) = match self.extraction.extract(upload).await {
            Ok(delivery) => (
                WizardAction::ExtractionCompleted { response: delivery.value },
                CallReport::delivered("extraction", delivery.attempts),
            ),
            Err(failure) => (
                WizardAction::ExtractionFailed { reason: failure.to_string() },
                CallReport::failed("extraction", &failure),
            ),
        };
        report.calls.push(call);

        let extracted = self.dispatch(action, context).await?;
        report.absorb(extracted);
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use lightquote_core::{
        ClientInfoDraft, NotificationTone, ProductId, WizardAction, WizardContext, WizardStep,
    };
    use serde_json::{json, Value};

    use super::IntakeRuntime;
    use crate::error::WebhookError;
    use crate::extraction::{DocumentUpload, ExtractionService};
    use crate::retry::{Delivery, DeliveryFailure};
    use crate::submission::{RecordingSink, SubmissionSink};

    struct CannedExtraction(Value);

    #[async_trait]
    impl ExtractionService for CannedExtraction {
        async fn extract(
            &self,
            _upload: &DocumentUpload,
        ) -> Result<Delivery<Value>, DeliveryFailure> {
            Ok(Delivery { value: self.0.clone(), attempts: 1 })
        }
    }

    struct FailingExtraction;

    #[async_trait]
    impl ExtractionService for FailingExtraction {
        async fn extract(
            &self,
            _upload: &DocumentUpload,
        ) -> Result<Delivery<Value>, DeliveryFailure> {
            Err(DeliveryFailure {
                attempts: 2,
                error: WebhookError::Status { webhook: "extraction", status: 503 },
            })
        }
    }

    struct RejectingSink;

    #[async_trait]
    impl SubmissionSink for RejectingSink {
        async fn submit(
            &self,
            _submission: &lightquote_core::QuoteSubmission,
        ) -> Result<Delivery<()>, DeliveryFailure> {
            Err(DeliveryFailure::before_sending(WebhookError::NotConfigured {
                webhook: "submission",
            }))
        }
    }

    fn context() -> WizardContext {
        WizardContext::at(Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap())
    }

    fn extraction_response() -> Value {
        json!([{"message": {"content": {"Products": [
            {"Brand_Name": "Lumenpulse", "Light_Type": "Linear", "SKU": "LP-100", "Quantity": 4},
            {"brand_name": "Iguzzini", "light_type": "Downlight", "sku": "IG-7"}
        ]}}}])
    }

    fn existing_client() -> ClientInfoDraft {
        ClientInfoDraft {
            email: Some("buyer@example.com".to_string()),
            project_phase: Some("design".to_string()),
            position: Some("architect".to_string()),
            ..ClientInfoDraft::for_client_type(true)
        }
    }

    async fn walk_to_final_review<E: ExtractionService, S: SubmissionSink>(
        runtime: &mut IntakeRuntime<E, S>,
    ) {
        let ctx = context();
        let upload = DocumentUpload::new("schedule.pdf", b"%PDF".to_vec());
        runtime.upload_document(&upload, &ctx).await.expect("upload");
        runtime.dispatch(WizardAction::Advance, &ctx).await.expect("leave intake");
        runtime
            .dispatch(WizardAction::EditClientDraft { draft: existing_client() }, &ctx)
            .await
            .expect("client draft");
        runtime.dispatch(WizardAction::Advance, &ctx).await.expect("leave client step");
        for id in ["product-0", "product-1"] {
            runtime
                .dispatch(
                    WizardAction::SetVerified { product_id: ProductId::from(id), verified: true },
                    &ctx,
                )
                .await
                .expect("verify");
        }
        runtime.dispatch(WizardAction::Advance, &ctx).await.expect("leave verification");
        runtime
            .dispatch(WizardAction::SetDeadlineDraft { deadline: "2026-11-02".to_string() }, &ctx)
            .await
            .expect("deadline draft");
        runtime.dispatch(WizardAction::Advance, &ctx).await.expect("leave deadline");
        assert_eq!(runtime.step(), WizardStep::FinalReview);
    }

    #[tokio::test]
    async fn upload_feeds_extracted_products_into_session() {
        let mut runtime =
            IntakeRuntime::new(CannedExtraction(extraction_response()), RecordingSink::default());

        let outcome = runtime
            .upload_document(&DocumentUpload::new("schedule.pdf", Vec::new()), &context())
            .await
            .expect("upload");

        let state = &runtime.session().state;
        assert!(state.has_document);
        assert_eq!(state.products.len(), 2);
        assert_eq!(state.products[0].brand, "Lumenpulse");
        assert_eq!(state.products[0].quantity, 4);
        assert_eq!(state.original_extraction_response, Some(extraction_response()));
        assert_eq!(outcome.calls.len(), 1);
        assert!(outcome.calls[0].delivered);
        assert_eq!(outcome.notifications[0].title, "Document processed successfully");
    }

    #[tokio::test]
    async fn failed_extraction_leaves_products_untouched_and_notifies() {
        let mut runtime = IntakeRuntime::new(FailingExtraction, RecordingSink::default());

        let outcome = runtime
            .upload_document(&DocumentUpload::new("schedule.pdf", Vec::new()), &context())
            .await
            .expect("failure is reported, not raised");

        assert!(runtime.session().state.products.is_empty());
        assert!(runtime.session().state.has_document);
        assert_eq!(outcome.calls[0].attempts, 2);
        assert!(!outcome.calls[0].delivered);
        assert_eq!(outcome.notifications[0].title, "Upload error");
        assert_eq!(outcome.notifications[0].tone, NotificationTone::Destructive);
    }

    #[tokio::test]
    async fn finishing_review_delivers_submission_once() {
        let mut runtime =
            IntakeRuntime::new(CannedExtraction(extraction_response()), RecordingSink::default());
        walk_to_final_review(&mut runtime).await;

        let outcome = runtime.dispatch(WizardAction::Advance, &context()).await.expect("submit");

        assert_eq!(runtime.step(), WizardStep::Submitted);
        assert!(runtime.session().state.is_completed);
        let recorded = runtime.submission_sink().recorded().await;
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].deadline, "2026-11-02");
        assert_eq!(recorded[0].products.len(), 2);
        assert_eq!(recorded[0].extraction_response, Some(extraction_response()));
        assert!(outcome
            .notifications
            .iter()
            .any(|notification| notification.title == "Quote Request Submitted"));
    }

    #[tokio::test]
    async fn submitted_quote_cannot_be_sent_again() {
        let mut runtime =
            IntakeRuntime::new(CannedExtraction(extraction_response()), RecordingSink::default());
        walk_to_final_review(&mut runtime).await;
        runtime.dispatch(WizardAction::Advance, &context()).await.expect("submit");

        assert!(runtime.dispatch(WizardAction::Retreat, &context()).await.is_err());
        let again = runtime.dispatch(WizardAction::Advance, &context()).await.expect("no-op");

        assert_eq!(runtime.step(), WizardStep::Submitted);
        assert!(again.calls.is_empty());
        assert_eq!(runtime.submission_sink().recorded().await.len(), 1);
    }

    #[tokio::test]
    async fn undelivered_submission_still_completes_the_wizard() {
        let mut runtime = IntakeRuntime::new(CannedExtraction(extraction_response()), RejectingSink);
        walk_to_final_review(&mut runtime).await;

        let outcome = runtime.dispatch(WizardAction::Advance, &context()).await.expect("submit");

        assert_eq!(runtime.step(), WizardStep::Submitted);
        assert_eq!(outcome.calls[0].attempts, 0);
        assert!(outcome
            .notifications
            .iter()
            .any(|notification| notification.tone == NotificationTone::Destructive));
    }

    #[tokio::test]
    async fn rejected_action_keeps_previous_session() {
        let mut runtime =
            IntakeRuntime::new(CannedExtraction(extraction_response()), RecordingSink::default());
        let before = runtime.session().clone();

        let error = runtime.dispatch(WizardAction::Advance, &context()).await;

        assert!(error.is_err());
        assert_eq!(runtime.session(), &before);
    }
}
