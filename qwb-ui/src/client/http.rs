//! reqwest-backed implementation of the questionnaire API

use super::QuestionnaireApi;
use crate::error::{UiError, UiResult};
use async_trait::async_trait;
use qwb_common::api::types::{
    AuthSession, ColumnImportResult, ColumnMappingRequest, CompleteRequest, CreatedDocument,
    CreatedDocumentVersion, CreatedQuestionnaire, DocumentSummary, DocumentVersionDetail,
    DownloadLink, ErrorBody, FeedbackRequest, ImportAnswersRequest, ImportAnswersResult,
    ImportPreview, ImportSpreadsheetRequest, KbChunk, LoginRequest, NewDocument,
    NewDocumentVersion, NewQuestionnaire, ParsedDocument, PendingAnswer, PendingCount,
    QuestionRequest, QuestionSuggestion, QuestionnaireDetail, QuestionnaireStatus,
    QuestionnaireSummary, RegisterRequest, SaveResponseRequest, SuggestionRecord,
    UploadStatus, UserInfo,
};
use qwb_common::config::ApiSettings;
use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

const USER_AGENT: &str = concat!("qwb-ui/", env!("CARGO_PKG_VERSION"));

/// HTTP client for the questionnaire REST API
pub struct HttpApiClient {
    http_client: reqwest::Client,
    base_url: Url,
    /// Bearer token; replaced by a successful login/register
    token: RwLock<Option<String>>,
}

impl HttpApiClient {
    pub fn new(settings: &ApiSettings) -> UiResult<Self> {
        let base_url = Url::parse(&settings.base_url).map_err(|e| {
            qwb_common::Error::Config(format!("Invalid API base URL '{}': {}", settings.base_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(qwb_common::Error::Config(format!(
                "API base URL '{}' cannot be used as a base",
                settings.base_url
            ))
            .into());
        }

        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(settings.timeout)
            .build()
            .map_err(|e| qwb_common::Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url,
            token: RwLock::new(settings.token.clone()),
        })
    }

    /// Replace the bearer token sent with subsequent requests
    pub async fn set_token(&self, token: Option<String>) {
        *self.token.write().await = token;
    }

    pub async fn token(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    /// Build an endpoint URL from path segments (each segment is escaped)
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn request(&self, method: Method, segments: &[&str]) -> RequestBuilder {
        let url = self.endpoint(segments);
        tracing::debug!(%method, %url, "API request");

        let builder = self.http_client.request(method, url);
        match self.token.read().await.as_deref() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> UiResult<T> {
        let builder = self.request(Method::GET, segments).await;
        decode(send(builder).await?).await
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> UiResult<T> {
        let builder = self.request(Method::POST, segments).await.json(body);
        decode(send(builder).await?).await
    }

    /// POST whose response body is irrelevant to the client
    async fn post_discard<B: Serialize + ?Sized>(&self, segments: &[&str], body: &B) -> UiResult<()> {
        let builder = self.request(Method::POST, segments).await.json(body);
        send(builder).await?;
        Ok(())
    }
}

/// Send a request and map transport/status failures
async fn send(builder: RequestBuilder) -> UiResult<Response> {
    let response = builder.send().await?;

    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = error_message(&text, status);
    tracing::debug!(status = status.as_u16(), %message, "API request failed");

    if status == StatusCode::UNAUTHORIZED {
        Err(UiError::Unauthorized(message))
    } else {
        Err(UiError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

/// Prefer the backend's `{"error": ...}` text, then the raw body, then the reason phrase
fn error_message(body: &str, status: StatusCode) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        return parsed.error;
    }
    let trimmed = body.trim();
    if !trimmed.is_empty() {
        return trimmed.to_string();
    }
    status
        .canonical_reason()
        .unwrap_or("Request failed")
        .to_string()
}

async fn decode<T: DeserializeOwned>(response: Response) -> UiResult<T> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| UiError::Malformed(e.to_string()))
}

#[async_trait]
impl QuestionnaireApi for HttpApiClient {
    async fn login(&self, email: &str, password: &str, tenant_slug: &str) -> UiResult<AuthSession> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
            tenant_slug: tenant_slug.to_string(),
        };
        let session: AuthSession = self.post_json(&["auth", "login"], &body).await?;
        self.set_token(Some(session.token.clone())).await;
        tracing::info!(email = %email, tenant = %tenant_slug, "Logged in");
        Ok(session)
    }

    async fn register(&self, request: &RegisterRequest) -> UiResult<AuthSession> {
        let session: AuthSession = self.post_json(&["auth", "register"], request).await?;
        self.set_token(Some(session.token.clone())).await;
        Ok(session)
    }

    async fn me(&self) -> UiResult<UserInfo> {
        self.get_json(&["auth", "me"]).await
    }

    async fn list_questionnaires(
        &self,
        status: Option<QuestionnaireStatus>,
    ) -> UiResult<Vec<QuestionnaireSummary>> {
        let mut builder = self.request(Method::GET, &["questionnaires"]).await;
        if let Some(status) = status {
            builder = builder.query(&[("status", status.as_str())]);
        }
        decode(send(builder).await?).await
    }

    async fn create_questionnaire(&self, request: &NewQuestionnaire) -> UiResult<Uuid> {
        let created: CreatedQuestionnaire = self.post_json(&["questionnaires"], request).await?;
        Ok(created.questionnaire_id)
    }

    async fn get_questionnaire(&self, questionnaire_id: Uuid) -> UiResult<QuestionnaireDetail> {
        let id = questionnaire_id.to_string();
        self.get_json(&["questionnaires", &id]).await
    }

    async fn import_spreadsheet(
        &self,
        questionnaire_id: Uuid,
        object_key: &str,
    ) -> UiResult<ImportPreview> {
        let id = questionnaire_id.to_string();
        let body = ImportSpreadsheetRequest {
            object_key: object_key.to_string(),
        };
        self.post_json(&["questionnaires", &id, "import", "spreadsheet"], &body)
            .await
    }

    async fn submit_column_mappings(
        &self,
        questionnaire_id: Uuid,
        request: &ColumnMappingRequest,
    ) -> UiResult<ColumnImportResult> {
        let id = questionnaire_id.to_string();
        self.post_json(
            &["questionnaires", &id, "import", "spreadsheet", "columns"],
            request,
        )
        .await
    }

    async fn suggest_answer(
        &self,
        questionnaire_id: Uuid,
        item_id: Uuid,
    ) -> UiResult<SuggestionRecord> {
        let id = questionnaire_id.to_string();
        let item = item_id.to_string();
        let builder = self
            .request(Method::POST, &["questionnaires", &id, "items", &item, "suggest"])
            .await;
        decode(send(builder).await?).await
    }

    async fn save_response(
        &self,
        questionnaire_id: Uuid,
        item_id: Uuid,
        request: &SaveResponseRequest,
    ) -> UiResult<()> {
        let id = questionnaire_id.to_string();
        let item = item_id.to_string();
        self.post_discard(&["questionnaires", &id, "items", &item, "response"], request)
            .await
    }

    async fn complete_questionnaire(
        &self,
        questionnaire_id: Uuid,
        import_to_library: bool,
    ) -> UiResult<()> {
        let id = questionnaire_id.to_string();
        let body = CompleteRequest {
            import_answers_to_library: import_to_library,
        };
        self.post_discard(&["questionnaires", &id, "complete"], &body)
            .await
    }

    async fn pending_answer_count(&self) -> UiResult<u64> {
        let count: PendingCount = self.get_json(&["imports", "pending-answers"]).await?;
        Ok(count.count)
    }

    async fn list_pending_answers(&self) -> UiResult<Vec<PendingAnswer>> {
        self.get_json(&["imports", "pending-answers", "list"]).await
    }

    async fn import_pending_answers(&self, response_ids: &[Uuid]) -> UiResult<u32> {
        let body = ImportAnswersRequest {
            response_ids: response_ids.to_vec(),
        };
        let result: ImportAnswersResult = self
            .post_json(&["imports", "pending-answers", "import"], &body)
            .await?;
        Ok(result.imported)
    }

    async fn suggest_for_question(&self, question: &str) -> UiResult<QuestionSuggestion> {
        let body = QuestionRequest {
            question: question.to_string(),
        };
        self.post_json(&["rag", "suggest"], &body).await
    }

    async fn send_feedback(&self, request: &FeedbackRequest) -> UiResult<()> {
        self.post_discard(&["rag", "feedback"], request).await
    }

    async fn get_kb_chunk(&self, chunk_id: &str) -> UiResult<KbChunk> {
        self.get_json(&["kb", "chunks", chunk_id]).await
    }

    async fn list_documents(&self) -> UiResult<Vec<DocumentSummary>> {
        self.get_json(&["documents"]).await
    }

    async fn create_document(&self, request: &NewDocument) -> UiResult<Uuid> {
        let created: CreatedDocument = self.post_json(&["documents"], request).await?;
        tracing::info!(document_id = %created.document_id, title = %request.title, "Document created");
        Ok(created.document_id)
    }

    async fn create_document_version(
        &self,
        document_id: Uuid,
        request: &NewDocumentVersion,
    ) -> UiResult<CreatedDocumentVersion> {
        let id = document_id.to_string();
        self.post_json(&["documents", &id, "versions"], request).await
    }

    async fn complete_upload(&self, version_id: Uuid) -> UiResult<String> {
        let version = version_id.to_string();
        let builder = self
            .request(Method::POST, &["document-versions", &version, "complete"])
            .await;
        let status: UploadStatus = decode(send(builder).await?).await?;
        Ok(status.status)
    }

    async fn get_document_version(&self, version_id: Uuid) -> UiResult<DocumentVersionDetail> {
        let version = version_id.to_string();
        self.get_json(&["document-versions", &version]).await
    }

    async fn get_preview_url(&self, version_id: Uuid) -> UiResult<String> {
        let version = version_id.to_string();
        let link: DownloadLink = self
            .get_json(&["document-versions", &version, "preview"])
            .await?;
        Ok(link.download_url)
    }

    async fn get_artifact_url(&self, version_id: Uuid, kind: &str) -> UiResult<String> {
        let version = version_id.to_string();
        let link: DownloadLink = self
            .get_json(&["document-versions", &version, "artifacts", kind])
            .await?;
        Ok(link.download_url)
    }

    async fn get_artifact_content(
        &self,
        version_id: Uuid,
        kind: &str,
    ) -> UiResult<ParsedDocument> {
        let version = version_id.to_string();
        let raw: Value = self
            .get_json(&["document-versions", &version, "artifacts", kind, "content"])
            .await?;

        // Some storage backends hand the artifact back as a JSON string
        let value = match raw {
            Value::String(text) => serde_json::from_str::<Value>(&text)
                .map_err(|e| UiError::Malformed(e.to_string()))?,
            other => other,
        };
        serde_json::from_value(value).map_err(|e| UiError::Malformed(e.to_string()))
    }
}
