use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::client::ClientInfo;
use crate::domain::deadline::DEADLINE_FORMAT;
use crate::domain::product::Product;
use crate::domain::workflow::WorkflowState;

/// Body posted to the submission webhook once the client confirms the request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteSubmission {
    #[serde(rename = "n8nResponse")]
    pub extraction_response: Option<Value>,
    pub client_info: Option<ClientInfo>,
    pub deadline: String,
    pub products: Vec<Product>,
    pub submitted_at: DateTime<Utc>,
}

impl QuoteSubmission {
    pub fn from_state(state: &WorkflowState, submitted_at: DateTime<Utc>) -> Self {
        Self {
            extraction_response: state.original_extraction_response.clone(),
            client_info: state.client_info.clone(),
            deadline: state
                .deadline
                .map(|deadline| deadline.format(DEADLINE_FORMAT).to_string())
                .unwrap_or_default(),
            products: state.products.clone(),
            submitted_at,
        }
    }
}
