use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, error};

use crate::models::{PerformanceAnalysis, Student};

pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

const REQUIRED_FIELDS: [&str; 4] = [
    "summary",
    "strengths",
    "areasForImprovement",
    "recommendations",
];

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("response contained no text")]
    EmptyResponse,

    #[error("response is not JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("response does not match the analysis schema: {0}")]
    Schema(String),
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;

#[async_trait]
pub trait Analyzer: Send + Sync {
    async fn analyze(&self, student: &Student) -> AnalysisResult<PerformanceAnalysis>;
}

pub fn build_prompt(student: &Student) -> String {
    format!(
        "Analyze the following student performance data and provide a professional assessment for educators:\n\
         Name: {}\n\
         GPA: {}\n\
         Attendance: {}%\n\
         Grade Level: {}\n\
         Current Notes: {}",
        student.name, student.gpa, student.attendance, student.grade_level, student.notes
    )
}

pub fn response_schema() -> Value {
    let string_list = json!({ "type": "ARRAY", "items": { "type": "STRING" } });
    json!({
        "type": "OBJECT",
        "properties": {
            "summary": { "type": "STRING" },
            "strengths": string_list.clone(),
            "areasForImprovement": string_list.clone(),
            "recommendations": string_list,
        },
        "required": REQUIRED_FIELDS,
    })
}

/// Checks the model output against the four-field schema before it becomes a
/// typed result. Extra fields are tolerated, missing or mistyped ones are not.
pub fn parse_analysis(text: &str) -> AnalysisResult<PerformanceAnalysis> {
    let value: Value = serde_json::from_str(text)?;
    let object = value
        .as_object()
        .ok_or_else(|| AnalysisError::Schema("expected a JSON object".into()))?;

    for field in REQUIRED_FIELDS {
        let entry = object
            .get(field)
            .ok_or_else(|| AnalysisError::Schema(format!("missing field `{field}`")))?;
        let well_typed = match field {
            "summary" => entry.is_string(),
            _ => entry
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_string)),
        };
        if !well_typed {
            return Err(AnalysisError::Schema(format!("field `{field}` has the wrong type")));
        }
    }

    serde_json::from_value(value).map_err(AnalysisError::from)
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GenerateContentResponse {
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

pub struct GeminiAnalyzer {
    client: Client,
    base_url: String,
    model: String,
    api_key: SecretString,
}

impl GeminiAnalyzer {
    pub fn new(base_url: &str, model: &str, api_key: SecretString) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    #[tracing::instrument(skip(self, student), fields(student_id = %student.id))]
    async fn generate(&self, student: &Student) -> AnalysisResult<PerformanceAnalysis> {
        let prompt = build_prompt(student);
        debug!("prompt: {}", prompt);

        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": response_schema(),
            },
        });

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AnalysisError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let payload: GenerateContentResponse = response.json().await?;
        let text = payload.text().ok_or(AnalysisError::EmptyResponse)?;
        parse_analysis(&text)
    }
}

#[async_trait]
impl Analyzer for GeminiAnalyzer {
    async fn analyze(&self, student: &Student) -> AnalysisResult<PerformanceAnalysis> {
        self.generate(student).await
    }
}

/// One attempt, no retry. Failures are logged and collapse to `None`.
pub async fn analyze_student(
    analyzer: &dyn Analyzer,
    student: &Student,
) -> Option<PerformanceAnalysis> {
    match analyzer.analyze(student).await {
        Ok(analysis) => Some(analysis),
        Err(e) => {
            error!(student_id = %student.id, "analysis failed: {e}");
            None
        }
    }
}
