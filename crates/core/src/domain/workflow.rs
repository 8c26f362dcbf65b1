use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::domain::client::ClientInfo;
use crate::domain::deadline;
use crate::domain::product::{Product, ProductId};

/// Wizard steps, numbered 1..=6 on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum WizardStep {
    DocumentIntake = 1,
    ClientInformation = 2,
    ProductVerification = 3,
    Deadline = 4,
    FinalReview = 5,
    Submitted = 6,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("wizard step must be in 1..=6, got {0}")]
pub struct InvalidStep(pub u8);

impl WizardStep {
    pub const FIRST: Self = Self::DocumentIntake;
    pub const LAST: Self = Self::Submitted;

    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::DocumentIntake => "Document Upload",
            Self::ClientInformation => "Client Information",
            Self::ProductVerification => "Product Verification",
            Self::Deadline => "Deadline",
            Self::FinalReview => "Final Review",
            Self::Submitted => "Submitted",
        }
    }

    /// The following step, clamped at the terminal step.
    pub fn next(self) -> Self {
        Self::try_from(self.number() + 1).unwrap_or(Self::LAST)
    }

    /// The preceding step, clamped at the first step.
    pub fn previous(self) -> Self {
        Self::try_from(self.number().saturating_sub(1)).unwrap_or(Self::FIRST)
    }

    /// Completion percentage shown by the progress bar.
    pub fn progress_pct(self) -> u8 {
        (u16::from(self.number() - 1) * 100 / u16::from(Self::LAST.number() - 1)) as u8
    }
}

impl From<WizardStep> for u8 {
    fn from(step: WizardStep) -> Self {
        step.number()
    }
}

impl TryFrom<u8> for WizardStep {
    type Error = InvalidStep;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::DocumentIntake),
            2 => Ok(Self::ClientInformation),
            3 => Ok(Self::ProductVerification),
            4 => Ok(Self::Deadline),
            5 => Ok(Self::FinalReview),
            6 => Ok(Self::Submitted),
            other => Err(InvalidStep(other)),
        }
    }
}

/// Committed state of one quote intake session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowState {
    pub step: WizardStep,
    pub has_document: bool,
    pub client_info: Option<ClientInfo>,
    pub products: Vec<Product>,
    #[serde(with = "deadline::iso_or_empty", default)]
    pub deadline: Option<NaiveDate>,
    pub document_content: String,
    #[serde(rename = "originalN8nResponse", default)]
    pub original_extraction_response: Option<Value>,
    /// Legacy completion marker, set once the submitted step is reached.
    pub is_completed: bool,
}

impl Default for WorkflowState {
    fn default() -> Self {
        Self {
            step: WizardStep::FIRST,
            has_document: false,
            client_info: None,
            products: Vec::new(),
            deadline: None,
            document_content: String::new(),
            original_extraction_response: None,
            is_completed: false,
        }
    }
}

impl WorkflowState {
    pub fn has_typed_content(&self) -> bool {
        !self.document_content.trim().is_empty()
    }

    pub fn product(&self, product_id: &ProductId) -> Option<&Product> {
        self.products.iter().find(|product| &product.id == product_id)
    }

    pub fn product_mut(&mut self, product_id: &ProductId) -> Option<&mut Product> {
        self.products.iter_mut().find(|product| &product.id == product_id)
    }

    pub fn unverified_product_ids(&self) -> Vec<ProductId> {
        self.products
            .iter()
            .filter(|product| !product.verified)
            .map(|product| product.id.clone())
            .collect()
    }

    pub fn all_products_verified(&self) -> bool {
        self.products.iter().all(|product| product.verified)
    }

    pub fn total_quantity(&self) -> u64 {
        self.products.iter().map(|product| u64::from(product.quantity)).sum()
    }
}
