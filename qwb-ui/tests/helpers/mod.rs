//! Test Helper Utilities
//!
//! In-memory questionnaire backend implementing `QuestionnaireApi`, plus a
//! recording confirmation port.

#![allow(dead_code)]

use async_trait::async_trait;
use qwb_common::api::types::*;
use qwb_ui::confirm::Confirm;
use qwb_ui::{QuestionnaireApi, UiError, UiResult};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use uuid::Uuid;

/// Holds one suggestion request until released
#[derive(Default)]
pub struct Gate {
    /// Signalled when the request reaches the backend
    pub entered: Notify,
    /// Signal to let the request complete
    pub release: Notify,
}

struct StoredQuestionnaire {
    summary: QuestionnaireSummary,
    items: Vec<QuestionnaireItem>,
}

struct StoredResponse {
    response_id: Uuid,
    questionnaire_id: Uuid,
    item_id: Uuid,
    request: SaveResponseRequest,
}

#[derive(Default)]
struct State {
    questionnaires: HashMap<Uuid, StoredQuestionnaire>,
    responses: Vec<StoredResponse>,
    imported: HashSet<Uuid>,
    completed: HashMap<Uuid, bool>,
    preview: Option<SpreadsheetPreview>,
    gates: HashMap<Uuid, VecDeque<Arc<Gate>>>,
    failures: HashSet<String>,
    calls: Vec<String>,
    feedback: Vec<FeedbackRequest>,
    chunks: HashMap<String, KbChunk>,
    citations: String,
    questions: Vec<String>,
    documents: HashMap<Uuid, NewDocument>,
    versions: HashMap<Uuid, StoredVersion>,
}

struct StoredVersion {
    document_id: Uuid,
    request: NewDocumentVersion,
    status: String,
}

/// In-memory backend with failure injection and request gating
#[derive(Default)]
pub struct FakeBackend {
    state: Mutex<State>,
}

fn summary(id: Uuid, name: &str) -> QuestionnaireSummary {
    QuestionnaireSummary {
        id,
        name: name.to_string(),
        questionnaire_type: QuestionnaireType::Spreadsheet,
        status: QuestionnaireStatus::InProgress,
        progress_percent: 0.0,
        due_date: None,
        owner_user_id: None,
        created_at: None,
        updated_at: None,
    }
}

fn item(index: usize, question: &str) -> QuestionnaireItem {
    QuestionnaireItem {
        id: Uuid::new_v4(),
        item_index: index as u32,
        question_text: question.to_string(),
        response_type: ResponseType::FreeText,
        current_state: ItemState::Unanswered,
        source_location: None,
    }
}

fn not_found(what: &str) -> UiError {
    UiError::Api {
        status: 404,
        message: format!("{what} not found"),
    }
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Add a questionnaire with one unanswered item per question
    pub fn add_questionnaire(&self, name: &str, questions: &[&str]) -> (Uuid, Vec<Uuid>) {
        let id = Uuid::new_v4();
        let items: Vec<QuestionnaireItem> = questions
            .iter()
            .enumerate()
            .map(|(i, q)| item(i, q))
            .collect();
        let item_ids = items.iter().map(|i| i.id).collect();
        self.state.lock().unwrap().questionnaires.insert(
            id,
            StoredQuestionnaire {
                summary: summary(id, name),
                items,
            },
        );
        (id, item_ids)
    }

    pub fn set_preview(&self, columns: &[&str], rows: &[&[&str]]) {
        let preview = SpreadsheetPreview {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        };
        self.state.lock().unwrap().preview = Some(preview);
    }

    /// Raw citation string attached to every suggestion
    pub fn set_citations(&self, raw: &str) {
        self.state.lock().unwrap().citations = raw.to_string();
    }

    pub fn add_chunk(&self, chunk: KbChunk) {
        self.state
            .lock()
            .unwrap()
            .chunks
            .insert(chunk.id.to_string(), chunk);
    }

    /// Hold the next suggestion request for `item_id` until the gate is released
    pub fn gate_next_suggestion(&self, item_id: Uuid) -> Arc<Gate> {
        let gate = Arc::new(Gate::default());
        self.state
            .lock()
            .unwrap()
            .gates
            .entry(item_id)
            .or_default()
            .push_back(gate.clone());
        gate
    }

    /// Fail the next call of `operation` with a transport error
    pub fn fail_next(&self, operation: &str) {
        self.state
            .lock()
            .unwrap()
            .failures
            .insert(operation.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn call_count(&self, operation: &str) -> usize {
        self.calls().iter().filter(|c| c.as_str() == operation).count()
    }

    pub fn feedback(&self) -> Vec<FeedbackRequest> {
        self.state.lock().unwrap().feedback.clone()
    }

    pub fn saved_response(&self, item_id: Uuid) -> Option<SaveResponseRequest> {
        self.state
            .lock()
            .unwrap()
            .responses
            .iter()
            .find(|r| r.item_id == item_id)
            .map(|r| r.request.clone())
    }

    pub fn response_id(&self, item_id: Uuid) -> Option<Uuid> {
        self.state
            .lock()
            .unwrap()
            .responses
            .iter()
            .find(|r| r.item_id == item_id)
            .map(|r| r.response_id)
    }

    /// Questions sent to the retrieval service
    pub fn questions(&self) -> Vec<String> {
        self.state.lock().unwrap().questions.clone()
    }

    pub fn document(&self, document_id: Uuid) -> Option<NewDocument> {
        self.state.lock().unwrap().documents.get(&document_id).cloned()
    }

    pub fn version_status(&self, version_id: Uuid) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .versions
            .get(&version_id)
            .map(|v| v.status.clone())
    }

    pub fn completion(&self, questionnaire_id: Uuid) -> Option<bool> {
        self.state
            .lock()
            .unwrap()
            .completed
            .get(&questionnaire_id)
            .copied()
    }

    /// Record the call and apply any injected failure
    fn enter(&self, operation: &str) -> UiResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(operation.to_string());
        if state.failures.remove(operation) {
            return Err(UiError::Transport("connection reset by peer".to_string()));
        }
        Ok(())
    }

    fn pending(state: &State) -> Vec<PendingAnswer> {
        state
            .responses
            .iter()
            .filter(|r| r.request.status == ResponseStatus::Approved)
            .filter(|r| !state.imported.contains(&r.response_id))
            .filter_map(|r| {
                let questionnaire = state.questionnaires.get(&r.questionnaire_id)?;
                let item = questionnaire.items.iter().find(|i| i.id == r.item_id)?;
                Some(PendingAnswer {
                    response_id: r.response_id,
                    questionnaire_item_id: r.item_id,
                    question_text: item.question_text.clone(),
                    answer_text: r.request.answer_text.clone(),
                    explanation: r.request.explanation.clone(),
                    questionnaire_name: questionnaire.summary.name.clone(),
                })
            })
            .collect()
    }
}

#[async_trait]
impl QuestionnaireApi for FakeBackend {
    async fn login(&self, email: &str, _password: &str, _tenant_slug: &str) -> UiResult<AuthSession> {
        self.enter("login")?;
        Ok(AuthSession {
            token: format!("token-for-{email}"),
            tenant_id: None,
            user_id: Some(1),
        })
    }

    async fn register(&self, request: &RegisterRequest) -> UiResult<AuthSession> {
        self.enter("register")?;
        Ok(AuthSession {
            token: format!("token-for-{}", request.email),
            tenant_id: None,
            user_id: Some(1),
        })
    }

    async fn me(&self) -> UiResult<UserInfo> {
        self.enter("me")?;
        Ok(UserInfo {
            id: 1,
            name: Some("Reviewer".to_string()),
            email: "reviewer@example.com".to_string(),
            tenant_id: None,
        })
    }

    async fn list_questionnaires(
        &self,
        status: Option<QuestionnaireStatus>,
    ) -> UiResult<Vec<QuestionnaireSummary>> {
        self.enter("list_questionnaires")?;
        let state = self.state.lock().unwrap();
        Ok(state
            .questionnaires
            .values()
            .map(|q| q.summary.clone())
            .filter(|s| status.map_or(true, |st| s.status == st))
            .collect())
    }

    async fn create_questionnaire(&self, request: &NewQuestionnaire) -> UiResult<Uuid> {
        self.enter("create_questionnaire")?;
        Ok(self.add_questionnaire(&request.name, &[]).0)
    }

    async fn get_questionnaire(&self, questionnaire_id: Uuid) -> UiResult<QuestionnaireDetail> {
        self.enter("get_questionnaire")?;
        let state = self.state.lock().unwrap();
        let stored = state
            .questionnaires
            .get(&questionnaire_id)
            .ok_or_else(|| not_found("Questionnaire"))?;

        let mut questionnaire = stored.summary.clone();
        if !stored.items.is_empty() {
            let approved = stored
                .items
                .iter()
                .filter(|i| i.current_state == ItemState::Approved)
                .count();
            questionnaire.progress_percent = approved as f64 * 100.0 / stored.items.len() as f64;
        }
        Ok(QuestionnaireDetail {
            questionnaire,
            items: stored.items.clone(),
        })
    }

    async fn import_spreadsheet(
        &self,
        questionnaire_id: Uuid,
        object_key: &str,
    ) -> UiResult<ImportPreview> {
        self.enter("import_spreadsheet")?;
        let state = self.state.lock().unwrap();
        if !state.questionnaires.contains_key(&questionnaire_id) {
            return Err(not_found("Questionnaire"));
        }
        let preview = state.preview.clone().ok_or_else(|| not_found("Spreadsheet"))?;
        Ok(ImportPreview {
            import_session_id: Some(Uuid::new_v4().to_string()),
            preview,
            object_key: Some(object_key.to_string()),
        })
    }

    async fn submit_column_mappings(
        &self,
        questionnaire_id: Uuid,
        request: &ColumnMappingRequest,
    ) -> UiResult<ColumnImportResult> {
        self.enter("submit_column_mappings")?;
        let mut state = self.state.lock().unwrap();
        let preview = state.preview.clone().ok_or_else(|| not_found("Spreadsheet"))?;
        let question_col = request
            .mappings
            .iter()
            .find(|(_, role)| **role == ColumnRole::Question)
            .and_then(|(index, _)| index.parse::<usize>().ok())
            .ok_or_else(|| UiError::Api {
                status: 400,
                message: "No question column".to_string(),
            })?;

        let stored = state
            .questionnaires
            .get_mut(&questionnaire_id)
            .ok_or_else(|| not_found("Questionnaire"))?;
        let mut created = 0;
        for row in &preview.rows {
            if let Some(question) = row.get(question_col).filter(|q| !q.trim().is_empty()) {
                let index = stored.items.len();
                stored.items.push(item(index, question));
                created += 1;
            }
        }
        Ok(ColumnImportResult {
            created_items: created,
        })
    }

    async fn suggest_answer(
        &self,
        questionnaire_id: Uuid,
        item_id: Uuid,
    ) -> UiResult<SuggestionRecord> {
        self.enter("suggest_answer")?;
        let gate = self
            .state
            .lock()
            .unwrap()
            .gates
            .get_mut(&item_id)
            .and_then(|queue| queue.pop_front());
        if let Some(gate) = gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }

        let state = self.state.lock().unwrap();
        let question = state
            .questionnaires
            .get(&questionnaire_id)
            .and_then(|q| q.items.iter().find(|i| i.id == item_id))
            .map(|i| i.question_text.clone())
            .ok_or_else(|| not_found("Item"))?;
        Ok(SuggestionRecord {
            suggestion_id: Uuid::new_v4(),
            answer_text: format!("Suggested answer to: {question}"),
            citations: state.citations.clone(),
            confidence: 0.82,
            coverage_status: CoverageStatus::Sufficient,
        })
    }

    async fn save_response(
        &self,
        questionnaire_id: Uuid,
        item_id: Uuid,
        request: &SaveResponseRequest,
    ) -> UiResult<()> {
        self.enter("save_response")?;
        let mut state = self.state.lock().unwrap();
        let stored = state
            .questionnaires
            .get_mut(&questionnaire_id)
            .ok_or_else(|| not_found("Questionnaire"))?;
        let item = stored
            .items
            .iter_mut()
            .find(|i| i.id == item_id)
            .ok_or_else(|| not_found("Item"))?;
        item.current_state = match request.status {
            ResponseStatus::Draft => ItemState::Drafted,
            ResponseStatus::NeedsReview => ItemState::NeedsReview,
            ResponseStatus::Approved => ItemState::Approved,
        };

        match state.responses.iter_mut().find(|r| r.item_id == item_id) {
            Some(existing) => existing.request = request.clone(),
            None => state.responses.push(StoredResponse {
                response_id: Uuid::new_v4(),
                questionnaire_id,
                item_id,
                request: request.clone(),
            }),
        }
        Ok(())
    }

    async fn complete_questionnaire(
        &self,
        questionnaire_id: Uuid,
        import_to_library: bool,
    ) -> UiResult<()> {
        self.enter("complete_questionnaire")?;
        let mut state = self.state.lock().unwrap();
        let stored = state
            .questionnaires
            .get_mut(&questionnaire_id)
            .ok_or_else(|| not_found("Questionnaire"))?;
        stored.summary.status = QuestionnaireStatus::Completed;
        state.completed.insert(questionnaire_id, import_to_library);
        Ok(())
    }

    async fn pending_answer_count(&self) -> UiResult<u64> {
        self.enter("pending_answer_count")?;
        let state = self.state.lock().unwrap();
        Ok(Self::pending(&state).len() as u64)
    }

    async fn list_pending_answers(&self) -> UiResult<Vec<PendingAnswer>> {
        self.enter("list_pending_answers")?;
        let state = self.state.lock().unwrap();
        Ok(Self::pending(&state))
    }

    async fn import_pending_answers(&self, response_ids: &[Uuid]) -> UiResult<u32> {
        self.enter("import_pending_answers")?;
        let mut state = self.state.lock().unwrap();
        let pending: HashSet<Uuid> = Self::pending(&state)
            .iter()
            .map(|p| p.response_id)
            .collect();
        let mut imported = 0;
        for id in response_ids {
            if pending.contains(id) && state.imported.insert(*id) {
                imported += 1;
            }
        }
        Ok(imported)
    }

    async fn suggest_for_question(&self, question: &str) -> UiResult<QuestionSuggestion> {
        self.enter("suggest_for_question")?;
        let mut state = self.state.lock().unwrap();
        state.questions.push(question.to_string());
        Ok(QuestionSuggestion {
            answer_text: format!("Suggested answer to: {question}"),
            citations: vec!["kb_chunk:policy-1".to_string()],
            confidence: 0.64,
            coverage_status: CoverageStatus::Sufficient,
        })
    }

    async fn send_feedback(&self, request: &FeedbackRequest) -> UiResult<()> {
        self.enter("send_feedback")?;
        self.state.lock().unwrap().feedback.push(request.clone());
        Ok(())
    }

    async fn get_kb_chunk(&self, chunk_id: &str) -> UiResult<KbChunk> {
        self.enter("get_kb_chunk")?;
        self.state
            .lock()
            .unwrap()
            .chunks
            .get(chunk_id)
            .cloned()
            .ok_or_else(|| not_found("Chunk"))
    }

    async fn list_documents(&self) -> UiResult<Vec<DocumentSummary>> {
        self.enter("list_documents")?;
        Ok(Vec::new())
    }

    async fn create_document(&self, request: &NewDocument) -> UiResult<Uuid> {
        self.enter("create_document")?;
        let id = Uuid::new_v4();
        self.state
            .lock()
            .unwrap()
            .documents
            .insert(id, request.clone());
        Ok(id)
    }

    async fn create_document_version(
        &self,
        document_id: Uuid,
        request: &NewDocumentVersion,
    ) -> UiResult<CreatedDocumentVersion> {
        self.enter("create_document_version")?;
        let mut state = self.state.lock().unwrap();
        if !state.documents.contains_key(&document_id) {
            return Err(not_found("Document"));
        }
        let id = Uuid::new_v4();
        state.versions.insert(
            id,
            StoredVersion {
                document_id,
                request: request.clone(),
                status: "UPLOADING".to_string(),
            },
        );
        Ok(CreatedDocumentVersion {
            document_version_id: id,
            upload_url: format!("https://storage.example.com/upload/{id}"),
            object_key: Some(format!("documents/{document_id}/{id}")),
        })
    }

    async fn complete_upload(&self, version_id: Uuid) -> UiResult<String> {
        self.enter("complete_upload")?;
        let mut state = self.state.lock().unwrap();
        let version = state
            .versions
            .get_mut(&version_id)
            .ok_or_else(|| not_found("Version"))?;
        version.status = "PROCESSING".to_string();
        Ok(version.status.clone())
    }

    async fn get_document_version(&self, version_id: Uuid) -> UiResult<DocumentVersionDetail> {
        self.enter("get_document_version")?;
        let state = self.state.lock().unwrap();
        let version = state
            .versions
            .get(&version_id)
            .ok_or_else(|| not_found("Version"))?;
        Ok(DocumentVersionDetail {
            id: version_id,
            document_id: version.document_id,
            version_num: 1,
            original_filename: Some(version.request.original_filename.clone()),
            mime_type: Some(version.request.mime_type.clone()),
            size_bytes: Some(version.request.size_bytes),
            sha256: Some(version.request.sha256.clone()),
            status: version.status.clone(),
            created_at: None,
            artifacts: Vec::new(),
        })
    }

    async fn get_preview_url(&self, version_id: Uuid) -> UiResult<String> {
        self.enter("get_preview_url")?;
        Ok(format!("https://storage.example.com/preview/{version_id}"))
    }

    async fn get_artifact_url(&self, version_id: Uuid, kind: &str) -> UiResult<String> {
        self.enter("get_artifact_url")?;
        Ok(format!("https://storage.example.com/{kind}/{version_id}"))
    }

    async fn get_artifact_content(&self, _version_id: Uuid, _kind: &str) -> UiResult<ParsedDocument> {
        self.enter("get_artifact_content")?;
        Err(not_found("Artifact"))
    }
}

/// Confirmation port that records every prompt
pub struct RecordingConfirm {
    answer: bool,
    prompts: Mutex<Vec<String>>,
}

impl RecordingConfirm {
    pub fn new(answer: bool) -> Arc<Self> {
        Arc::new(Self {
            answer,
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Confirm for RecordingConfirm {
    async fn confirm(&self, prompt: &str) -> bool {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.answer
    }
}
