//! Request/response types of the questionnaire REST API
//!
//! The backend owns the wire schema. These structs mirror the JSON bodies
//! the client sends and receives: camelCase field names, enumerations as
//! SCREAMING_SNAKE_CASE strings.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

// ========================================
// Enumerations
// ========================================

/// Persisted lifecycle state of a questionnaire item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemState {
    Unanswered,
    Suggested,
    Drafted,
    NeedsReview,
    Approved,
}

impl ItemState {
    /// All states in lifecycle order
    pub const ALL: [ItemState; 5] = [
        ItemState::Unanswered,
        ItemState::Suggested,
        ItemState::Drafted,
        ItemState::NeedsReview,
        ItemState::Approved,
    ];
}

/// Status sent with a saved response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResponseStatus {
    Draft,
    NeedsReview,
    Approved,
}

/// Questionnaire-level status (list filter)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestionnaireStatus {
    InProgress,
    Approved,
    Completed,
}

impl QuestionnaireStatus {
    /// Wire name, as used in the `status` query parameter
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionnaireStatus::InProgress => "IN_PROGRESS",
            QuestionnaireStatus::Approved => "APPROVED",
            QuestionnaireStatus::Completed => "COMPLETED",
        }
    }
}

/// Source format of a questionnaire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestionnaireType {
    Spreadsheet,
    Document,
    Website,
}

/// Expected answer shape of an item
///
/// Unrecognized values are kept verbatim in `Other` so a newer backend
/// does not break item listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ResponseType {
    FreeText,
    YesNo,
    YesNoNa,
    Other(String),
}

impl From<String> for ResponseType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "FREE_TEXT" => ResponseType::FreeText,
            "YES_NO" => ResponseType::YesNo,
            "YES_NO_NA" => ResponseType::YesNoNa,
            _ => ResponseType::Other(value),
        }
    }
}

impl From<ResponseType> for String {
    fn from(value: ResponseType) -> Self {
        match value {
            ResponseType::FreeText => "FREE_TEXT".to_string(),
            ResponseType::YesNo => "YES_NO".to_string(),
            ResponseType::YesNoNa => "YES_NO_NA".to_string(),
            ResponseType::Other(raw) => raw,
        }
    }
}

/// Whether retrieved evidence was judged sufficient for a suggestion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoverageStatus {
    #[serde(rename = "OK", alias = "SUFFICIENT")]
    Sufficient,
    #[serde(rename = "INSUFFICIENT_EVIDENCE")]
    InsufficientEvidence,
}

/// Role assigned to a spreadsheet column during import
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ColumnRole {
    #[default]
    Skip,
    Question,
    Answer,
    AnswerAndExplanation,
    Explanation,
}

/// Thumbs feedback on a suggestion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeedbackThumb {
    Up,
    Down,
}

// ========================================
// Authentication
// ========================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    pub tenant_slug: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub tenant_slug: String,
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Token issued by login/register
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    pub token: String,
    #[serde(default)]
    pub tenant_id: Option<Uuid>,
    #[serde(default)]
    pub user_id: Option<i64>,
}

/// Identity returned by `GET /auth/me`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    pub email: String,
    #[serde(default)]
    pub tenant_id: Option<Uuid>,
}

// ========================================
// Questionnaires
// ========================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionnaireSummary {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub questionnaire_type: QuestionnaireType,
    pub status: QuestionnaireStatus,
    #[serde(default)]
    pub progress_percent: f64,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub owner_user_id: Option<i64>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Body of `POST /questionnaires`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewQuestionnaire {
    pub name: String,
    #[serde(rename = "type")]
    pub questionnaire_type: QuestionnaireType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_user_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedQuestionnaire {
    pub questionnaire_id: Uuid,
}

/// One question of a questionnaire
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionnaireItem {
    pub id: Uuid,
    pub item_index: u32,
    pub question_text: String,
    pub response_type: ResponseType,
    pub current_state: ItemState,
    /// Raw JSON-encoded source location (sheet/category/row)
    #[serde(default)]
    pub source_location: Option<String>,
}

/// Body of `GET /questionnaires/{id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionnaireDetail {
    pub questionnaire: QuestionnaireSummary,
    #[serde(default)]
    pub items: Vec<QuestionnaireItem>,
}

// ========================================
// Suggestions and responses
// ========================================

/// Suggestion record returned by the retrieval service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionRecord {
    pub suggestion_id: Uuid,
    pub answer_text: String,
    /// Raw citation string (JSON array or comma-separated list)
    #[serde(default)]
    pub citations: String,
    pub confidence: f64,
    pub coverage_status: CoverageStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionRequest {
    pub question: String,
}

/// Suggestion for a free-standing question (`POST /rag/suggest`)
///
/// Not tied to an item, so it carries no suggestion id and cannot receive
/// feedback. Citations arrive as a list rather than a raw string.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionSuggestion {
    pub answer_text: String,
    #[serde(default)]
    pub citations: Vec<String>,
    pub confidence: f64,
    pub coverage_status: CoverageStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveResponseRequest {
    pub answer_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    pub status: ResponseStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteRequest {
    pub import_answers_to_library: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRequest {
    pub suggestion_id: Uuid,
    pub thumb: FeedbackThumb,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

// ========================================
// Spreadsheet import
// ========================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSpreadsheetRequest {
    pub object_key: String,
}

/// Rectangular preview of an uploaded spreadsheet
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpreadsheetPreview {
    pub columns: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportPreview {
    #[serde(default)]
    pub import_session_id: Option<String>,
    pub preview: SpreadsheetPreview,
    #[serde(default)]
    pub object_key: Option<String>,
}

/// Body of the column-mapping submission; keys are column indices
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnMappingRequest {
    pub object_key: String,
    pub mappings: BTreeMap<String, ColumnRole>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnImportResult {
    pub created_items: u32,
}

// ========================================
// Pending answer import
// ========================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingCount {
    #[serde(default)]
    pub count: u64,
}

/// Approved response not yet merged into the answer library
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingAnswer {
    pub response_id: Uuid,
    pub questionnaire_item_id: Uuid,
    pub question_text: String,
    #[serde(default)]
    pub answer_text: String,
    #[serde(default)]
    pub explanation: Option<String>,
    pub questionnaire_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportAnswersRequest {
    pub response_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportAnswersResult {
    pub imported: u32,
}

// ========================================
// Knowledge base and documents
// ========================================

/// Knowledge-base chunk backing a `kb_chunk:` citation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KbChunk {
    pub id: Uuid,
    #[serde(default)]
    pub text: Option<String>,
    /// Either a JSON object or a JSON-encoded string
    #[serde(default)]
    pub metadata: Option<Value>,
    #[serde(default)]
    pub chunk_index: Option<i64>,
    #[serde(default)]
    pub document_title: Option<String>,
    #[serde(default)]
    pub document_type: Option<String>,
    #[serde(default)]
    pub version_num: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSummary {
    pub id: Uuid,
    pub title: String,
    #[serde(rename = "type")]
    pub document_type: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub latest_version_id: Option<Uuid>,
    #[serde(default)]
    pub latest_version_status: Option<String>,
    #[serde(default)]
    pub original_filename: Option<String>,
}

/// Body of `POST /documents`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDocument {
    pub title: String,
    /// POLICY, QUESTIONNAIRE or OTHER
    #[serde(rename = "type")]
    pub document_type: String,
    pub source: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedDocument {
    pub document_id: Uuid,
}

/// Body of `POST /documents/{id}/versions`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDocumentVersion {
    pub original_filename: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub sha256: String,
}

/// Registered version plus the presigned URL the file must be PUT to
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedDocumentVersion {
    pub document_version_id: Uuid,
    pub upload_url: String,
    #[serde(default)]
    pub object_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadStatus {
    pub status: String,
}

/// Stored artifact of a processed document version
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentArtifact {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub kind: String,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Body of `GET /document-versions/{id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentVersionDetail {
    pub id: Uuid,
    pub document_id: Uuid,
    pub version_num: i64,
    #[serde(default)]
    pub original_filename: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub size_bytes: Option<u64>,
    #[serde(default)]
    pub sha256: Option<String>,
    pub status: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub artifacts: Vec<DocumentArtifact>,
}

/// Presigned download link (preview or artifact)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadLink {
    pub download_url: String,
}

/// One sheet of a parsed document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedTable {
    pub title: String,
    #[serde(default)]
    pub rows: Vec<Vec<String>>,
}

/// `PARSED_JSON` artifact of a document version
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedDocument {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub tables: Vec<ParsedTable>,
    #[serde(default)]
    pub metadata: Option<Value>,
}

/// Error body returned by the backend (`{"error": "..."}`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

// ========================================
// Tests
// ========================================
