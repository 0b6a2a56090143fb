//! Project — the upstream submission entity this gateway reads.
//!
//! Projects are owned by the submission service. Only the fields the
//! assistant consumes are typed; everything else is carried through in
//! `extra` so list/detail responses round-trip unchanged.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::error::ExtractError;

/// A student project as returned by `GET /api/projects`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Upstream identifier (numeric ids are accepted and kept as text)
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guide_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub co_guide_name: Option<String>,

    /// Student names, in upstream order
    #[serde(default)]
    pub students: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_repo: Option<String>,

    /// Embedded thesis/summary PDF
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_summary_pdf: Option<PdfPayload>,

    /// Upstream fields this gateway does not interpret
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Project {
    /// Student names joined for prompt text.
    pub fn student_list(&self) -> String {
        self.students.join(", ")
    }

    /// The embedded PDF, if one is attached and carries data.
    pub fn pdf(&self) -> Option<&PdfPayload> {
        self.project_summary_pdf
            .as_ref()
            .filter(|pdf| pdf.data.as_deref().is_some_and(|d| !d.trim().is_empty()))
    }
}

fn id_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "project id must be a string or number, got {other}"
        ))),
    }
}

/// A base64-encoded PDF attached to a project.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PdfPayload {
    /// Base64 document bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl PdfPayload {
    /// Decode the base64 body into raw document bytes.
    pub fn decode(&self) -> Result<Vec<u8>, ExtractError> {
        let data = self
            .data
            .as_deref()
            .ok_or_else(|| ExtractError::Decode("payload has no data".into()))?;
        // Some clients send data URLs ("data:application/pdf;base64,....")
        let body = match data.split_once(";base64,") {
            Some((_, rest)) => rest,
            None => data,
        };
        let compact: String = body.chars().filter(|c| !c.is_whitespace()).collect();
        STANDARD
            .decode(compact)
            .map_err(|e| ExtractError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_upstream_shape() {
        let json = serde_json::json!({
            "id": "p-42",
            "title": "Crop Yield Prediction",
            "description": "ML on satellite imagery",
            "guideName": "Dr. Rao",
            "coGuideName": "Prof. Iyer",
            "students": ["Asha", "Vikram"],
            "githubRepo": "https://github.com/example/crops",
            "projectSummaryPdf": { "data": "SGVsbG8=", "fileName": "summary.pdf" },
            "status": "APPROVED"
        });
        let project: Project = serde_json::from_value(json).unwrap();
        assert_eq!(project.id, "p-42");
        assert_eq!(project.guide_name.as_deref(), Some("Dr. Rao"));
        assert_eq!(project.student_list(), "Asha, Vikram");
        assert_eq!(project.extra["status"], "APPROVED");
        assert!(project.pdf().is_some());
    }

    #[test]
    fn passthrough_fields_survive_serialization() {
        let json = serde_json::json!({ "id": "p-1", "semester": 7 });
        let project: Project = serde_json::from_value(json).unwrap();
        let back = serde_json::to_value(&project).unwrap();
        assert_eq!(back["semester"], 7);
        assert_eq!(back["id"], "p-1");
    }

    #[test]
    fn numeric_id_is_accepted() {
        let project: Project = serde_json::from_value(serde_json::json!({ "id": 17 })).unwrap();
        assert_eq!(project.id, "17");
    }

    #[test]
    fn empty_pdf_data_is_treated_as_absent() {
        let project = Project {
            id: "p".into(),
            project_summary_pdf: Some(PdfPayload {
                data: Some("  ".into()),
                ..PdfPayload::default()
            }),
            ..Project::default()
        };
        assert!(project.pdf().is_none());
    }

    #[test]
    fn decode_plain_and_data_url() {
        let plain = PdfPayload {
            data: Some("SGVsbG8=".into()),
            ..PdfPayload::default()
        };
        assert_eq!(plain.decode().unwrap(), b"Hello");

        let data_url = PdfPayload {
            data: Some("data:application/pdf;base64,SGVs\nbG8=".into()),
            ..PdfPayload::default()
        };
        assert_eq!(data_url.decode().unwrap(), b"Hello");
    }

    #[test]
    fn decode_rejects_garbage() {
        let bad = PdfPayload {
            data: Some("not base64 at all!!".into()),
            ..PdfPayload::default()
        };
        assert!(matches!(bad.decode(), Err(ExtractError::Decode(_))));
    }
}
