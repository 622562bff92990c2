//! The structured job data returned to callers.
//!
//! `ExtractedJob` doubles as the model's output contract: its
//! `schemars`-derived JSON schema is sent with every extraction call,
//! and `deny_unknown_fields` rejects any shape the model invents.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Employment type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum JobType {
    /// Full-time.
    FT,
    /// Part-time.
    PT,
    /// Contract, contractor, or temporary.
    C,
}

/// Work arrangement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkArrangement {
    Remote,
    Hybrid,
    InOffice,
}

/// Structured job data extracted from a posting.
///
/// Optional fields are omitted, never null-filled, when the source text
/// does not support them; the schema enforces this field by field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ExtractedJob {
    /// The core job title only, without department or team suffixes.
    pub title: String,

    /// The hiring company's name.
    pub company: String,

    /// Actual work locations, e.g. `["San Francisco, CA", "Remote"]`.
    pub locations: Vec<String>,

    /// Concise third-person summary of the role as clean HTML, without
    /// responsibilities or qualifications.
    pub description: String,

    /// Employment type; omitted if not stated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_type: Option<JobType>,

    /// Work arrangement; omitted if not stated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_arrangement: Option<WorkArrangement>,

    /// Minimum annual salary, rounded down to the nearest 10 000.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary_min: Option<u32>,

    /// Maximum annual salary, rounded up to the nearest 10 000.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary_max: Option<u32>,

    /// Key responsibilities as short bullet strings.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schemars(length(max = 7))]
    pub responsibilities: Option<Vec<String>>,

    /// Bare-minimum qualifications for a candidate to be considered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_qualifications: Option<Vec<String>>,

    /// Qualities or experience that would make a strong candidate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_qualifications: Option<Vec<String>>,
}

impl ExtractedJob {
    /// JSON schema for model output validation.
    pub fn output_schema() -> serde_json::Value {
        let schema = schemars::schema_for!(ExtractedJob);
        serde_json::to_value(schema).unwrap_or(serde_json::Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_fields_are_omitted_not_null() {
        let job = ExtractedJob {
            title: "Engineer".into(),
            company: "Acme".into(),
            locations: vec!["Remote".into()],
            description: "<p>Builds things.</p>".into(),
            job_type: None,
            work_arrangement: None,
            salary_min: None,
            salary_max: None,
            responsibilities: None,
            minimum_qualifications: None,
            preferred_qualifications: None,
        };

        let json = serde_json::to_string(&job).unwrap();
        assert!(!json.contains("salaryMin"));
        assert!(!json.contains("null"));
        assert!(json.contains("\"title\":\"Engineer\""));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let raw = r#"{
            "title": "Engineer",
            "company": "Acme",
            "locations": [],
            "description": "d",
            "confidence": 0.9
        }"#;
        assert!(serde_json::from_str::<ExtractedJob>(raw).is_err());
    }

    #[test]
    fn enums_use_wire_casing() {
        let job: ExtractedJob = serde_json::from_str(
            r#"{
                "title": "Engineer",
                "company": "Acme",
                "locations": ["Boston, MA"],
                "description": "d",
                "jobType": "FT",
                "workArrangement": "IN_OFFICE"
            }"#,
        )
        .unwrap();
        assert_eq!(job.job_type, Some(JobType::FT));
        assert_eq!(job.work_arrangement, Some(WorkArrangement::InOffice));
    }

    #[test]
    fn output_schema_lists_required_core_fields() {
        let schema = ExtractedJob::output_schema();
        let required = schema["required"].as_array().unwrap();
        let names: Vec<_> = required.iter().filter_map(|v| v.as_str()).collect();
        assert!(names.contains(&"title"));
        assert!(names.contains(&"company"));
        assert!(names.contains(&"locations"));
        assert!(names.contains(&"description"));
        assert!(!names.contains(&"salaryMin"));
    }
}
