use serde::{Deserialize, Serialize};
use thiserror::Error;

/// `position` value that makes `otherPosition` mandatory.
pub const OTHER_POSITION: &str = "other";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientInfo {
    pub is_existing: bool,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    pub project_phase: String,
    pub position: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other_position: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other_brands_comfortable: Option<bool>,
}

/// Client details as typed so far on the client information step.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientInfoDraft {
    pub is_existing: Option<bool>,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub company_name: Option<String>,
    pub project_name: Option<String>,
    pub project_phase: Option<String>,
    pub position: Option<String>,
    pub other_position: Option<String>,
    pub other_brands_comfortable: Option<bool>,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("client information is missing required fields: {}", .0.join(", "))]
pub struct MissingClientFields(pub Vec<String>);

impl ClientInfoDraft {
    pub fn for_client_type(is_existing: bool) -> Self {
        Self { is_existing: Some(is_existing), ..Self::default() }
    }

    /// Required fields still blank, in form order, using their wire names.
    pub fn missing_required_fields(&self) -> Vec<String> {
        let mut missing = Vec::new();
        let Some(is_existing) = self.is_existing else {
            missing.push("isExisting".to_owned());
            return missing;
        };

        if !is_existing {
            push_if_blank(&mut missing, "fullName", &self.full_name);
            push_if_blank(&mut missing, "companyName", &self.company_name);
        }
        push_if_blank(&mut missing, "email", &self.email);
        if !is_existing {
            push_if_blank(&mut missing, "projectName", &self.project_name);
        }
        push_if_blank(&mut missing, "projectPhase", &self.project_phase);
        push_if_blank(&mut missing, "position", &self.position);
        if self.position.as_deref().map(str::trim) == Some(OTHER_POSITION) {
            push_if_blank(&mut missing, "otherPosition", &self.other_position);
        }

        missing
    }

    pub fn commit(&self) -> Result<ClientInfo, MissingClientFields> {
        let missing = self.missing_required_fields();
        if !missing.is_empty() {
            return Err(MissingClientFields(missing));
        }

        Ok(ClientInfo {
            is_existing: self.is_existing.unwrap_or_default(),
            email: filled(&self.email).unwrap_or_default(),
            full_name: filled(&self.full_name),
            company_name: filled(&self.company_name),
            project_name: filled(&self.project_name),
            project_phase: filled(&self.project_phase).unwrap_or_default(),
            position: filled(&self.position).unwrap_or_default(),
            other_position: filled(&self.other_position),
            other_brands_comfortable: self.other_brands_comfortable,
        })
    }
}

fn filled(value: &Option<String>) -> Option<String> {
    value.as_deref().map(str::trim).filter(|value| !value.is_empty()).map(str::to_owned)
}

fn push_if_blank(missing: &mut Vec<String>, name: &str, value: &Option<String>) {
    if filled(value).is_none() {
        missing.push(name.to_owned());
    }
}
