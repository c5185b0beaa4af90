//! Questionnaire API port
//!
//! The workflow core talks to the backend only through [`QuestionnaireApi`].
//! [`HttpApiClient`] is the production adapter; tests substitute an
//! in-memory backend.

mod http;

pub use http::HttpApiClient;

use crate::error::UiResult;
use async_trait::async_trait;
use qwb_common::api::types::{
    AuthSession, ColumnImportResult, ColumnMappingRequest, CreatedDocumentVersion,
    DocumentSummary, DocumentVersionDetail, FeedbackRequest, ImportPreview, KbChunk,
    NewDocument, NewDocumentVersion, NewQuestionnaire, ParsedDocument, PendingAnswer,
    QuestionSuggestion, QuestionnaireDetail, QuestionnaireStatus, QuestionnaireSummary,
    RegisterRequest, SaveResponseRequest, SuggestionRecord, UserInfo,
};
use uuid::Uuid;

/// Artifact kind holding the parsed text and tables of a document version
pub const PARSED_JSON_ARTIFACT: &str = "PARSED_JSON";

/// Remote questionnaire API consumed by the client
///
/// Every method is a single request; none retries on its own.
#[async_trait]
pub trait QuestionnaireApi: Send + Sync {
    // Authentication
    async fn login(&self, email: &str, password: &str, tenant_slug: &str) -> UiResult<AuthSession>;
    async fn register(&self, request: &RegisterRequest) -> UiResult<AuthSession>;
    async fn me(&self) -> UiResult<UserInfo>;

    // Questionnaires
    async fn list_questionnaires(
        &self,
        status: Option<QuestionnaireStatus>,
    ) -> UiResult<Vec<QuestionnaireSummary>>;
    async fn create_questionnaire(&self, request: &NewQuestionnaire) -> UiResult<Uuid>;
    async fn get_questionnaire(&self, questionnaire_id: Uuid) -> UiResult<QuestionnaireDetail>;

    // Spreadsheet import
    async fn import_spreadsheet(
        &self,
        questionnaire_id: Uuid,
        object_key: &str,
    ) -> UiResult<ImportPreview>;
    async fn submit_column_mappings(
        &self,
        questionnaire_id: Uuid,
        request: &ColumnMappingRequest,
    ) -> UiResult<ColumnImportResult>;

    // Items
    async fn suggest_answer(
        &self,
        questionnaire_id: Uuid,
        item_id: Uuid,
    ) -> UiResult<SuggestionRecord>;
    async fn save_response(
        &self,
        questionnaire_id: Uuid,
        item_id: Uuid,
        request: &SaveResponseRequest,
    ) -> UiResult<()>;
    async fn complete_questionnaire(
        &self,
        questionnaire_id: Uuid,
        import_to_library: bool,
    ) -> UiResult<()>;

    // Pending answer import
    async fn pending_answer_count(&self) -> UiResult<u64>;
    async fn list_pending_answers(&self) -> UiResult<Vec<PendingAnswer>>;
    async fn import_pending_answers(&self, response_ids: &[Uuid]) -> UiResult<u32>;

    // Retrieval
    async fn suggest_for_question(&self, question: &str) -> UiResult<QuestionSuggestion>;
    async fn send_feedback(&self, request: &FeedbackRequest) -> UiResult<()>;
    async fn get_kb_chunk(&self, chunk_id: &str) -> UiResult<KbChunk>;

    // Documents
    async fn list_documents(&self) -> UiResult<Vec<DocumentSummary>>;
    async fn create_document(&self, request: &NewDocument) -> UiResult<Uuid>;
    /// Register a version; the file itself is uploaded to the returned URL
    async fn create_document_version(
        &self,
        document_id: Uuid,
        request: &NewDocumentVersion,
    ) -> UiResult<CreatedDocumentVersion>;
    /// Mark the upload finished and queue processing; returns the version status
    async fn complete_upload(&self, version_id: Uuid) -> UiResult<String>;
    async fn get_document_version(&self, version_id: Uuid) -> UiResult<DocumentVersionDetail>;
    async fn get_preview_url(&self, version_id: Uuid) -> UiResult<String>;
    async fn get_artifact_url(&self, version_id: Uuid, kind: &str) -> UiResult<String>;
    async fn get_artifact_content(&self, version_id: Uuid, kind: &str)
        -> UiResult<ParsedDocument>;
}
