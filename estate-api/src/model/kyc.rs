//! Identity verification flow models.

use crate::model::session::KycStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentType {
    Passport,
    #[serde(rename = "National ID")]
    NationalId,
    #[serde(rename = "Driver License")]
    DriverLicense,
}

impl DocumentType {
    /// Wire name, matching the serde rename.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Passport => "Passport",
            Self::NationalId => "National ID",
            Self::DriverLicense => "Driver License",
        }
    }
}

/// What an investor submits for verification. The document itself is
/// uploaded alongside this metadata; adjudication is entirely server-side.
#[derive(Debug, Clone)]
pub struct KycSubmission {
    pub full_name: String,
    pub date_of_birth: String,
    pub document_type: DocumentType,
    pub document_number: String,
    pub document_file_name: String,
    pub document_bytes: Vec<u8>,
}

/// One entry in the admin review queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KycCase {
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub document_type: DocumentType,
    pub submitted_at: DateTime<Utc>,
}

/// An administrator's ruling on a pending case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KycDecision {
    pub status: KycStatus,
    pub reason: Option<String>,
}

impl KycDecision {
    pub fn approve() -> Self {
        Self {
            status: KycStatus::Verified,
            reason: None,
        }
    }

    pub fn reject(reason: impl Into<String>) -> Self {
        Self {
            status: KycStatus::Rejected,
            reason: Some(reason.into()),
        }
    }
}
