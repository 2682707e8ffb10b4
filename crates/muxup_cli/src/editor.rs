//! Single-record editor state machine.
//!
//! The editor keeps a draft of the editable fields and the set of fields the
//! user touched. Saving sends only those fields. Deleting needs an explicit
//! confirmation step. Both successful paths close the editor and raise a
//! refresh signal for the owning list, read with [`RecordEditor::take_refresh`].

use crate::{ApiClient, ClientError};
use async_trait::async_trait;
use muxup_core::models::{
    asset::{AssetPatch, MuxAsset},
    upload::DeleteOutcome,
};
use std::collections::BTreeSet;

/// Operations the editor needs from the server.
#[async_trait]
pub trait AssetGateway: Send + Sync {
    async fn update_asset(&self, patch: &AssetPatch) -> Result<MuxAsset, ClientError>;
    async fn delete_asset(&self, asset: &MuxAsset) -> Result<DeleteOutcome, ClientError>;
}

#[async_trait]
impl AssetGateway for ApiClient {
    async fn update_asset(&self, patch: &AssetPatch) -> Result<MuxAsset, ClientError> {
        self.set_mux_asset(patch).await
    }

    async fn delete_asset(&self, asset: &MuxAsset) -> Result<DeleteOutcome, ClientError> {
        self.delete_mux_asset(asset).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorState {
    Closed,
    /// Viewing or editing; edits show up in the dirty set.
    Open,
    ConfirmingDelete,
    ProcessingDelete,
}

/// Editable fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EditorField {
    Title,
    IsReady,
}

/// A submission started by [`RecordEditor::begin_submit`].
#[derive(Debug, Clone)]
pub struct SubmitTicket {
    /// The patch to send, or `None` when nothing was edited.
    pub patch: Option<AssetPatch>,
    session: u64,
}

/// A deletion started by [`RecordEditor::confirm_delete`].
#[derive(Debug, Clone)]
pub struct DeleteTicket {
    pub record: MuxAsset,
    session: u64,
}

#[derive(Debug)]
pub struct RecordEditor {
    state: EditorState,
    /// Bumped on every open and close; settles from an older session are ignored.
    session: u64,
    record: Option<MuxAsset>,
    title: String,
    is_ready: bool,
    dirty: BTreeSet<EditorField>,
    submitting: bool,
    title_error: Option<String>,
    refresh: bool,
}

impl Default for RecordEditor {
    fn default() -> Self {
        Self::new()
    }
}

fn not_in_state(action: &str, state: EditorState) -> ClientError {
    ClientError::Validation(format!("Cannot {} while editor is {:?}", action, state))
}

impl RecordEditor {
    pub fn new() -> Self {
        Self {
            state: EditorState::Closed,
            session: 0,
            record: None,
            title: String::new(),
            is_ready: false,
            dirty: BTreeSet::new(),
            submitting: false,
            title_error: None,
            refresh: false,
        }
    }

    /// Open the editor on `record`, discarding any previous draft.
    pub fn open(&mut self, record: MuxAsset) {
        self.session = self.session.wrapping_add(1);
        self.title = record.title.clone();
        self.is_ready = record.is_ready;
        self.record = Some(record);
        self.dirty.clear();
        self.submitting = false;
        self.title_error = None;
        self.state = EditorState::Open;
    }

    pub fn state(&self) -> EditorState {
        self.state
    }

    pub fn record(&self) -> Option<&MuxAsset> {
        self.record.as_ref()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn is_ready(&self) -> bool {
        self.is_ready
    }

    pub fn dirty_fields(&self) -> &BTreeSet<EditorField> {
        &self.dirty
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// Validation message for the title field, if the last submit failed it.
    pub fn title_error(&self) -> Option<&str> {
        self.title_error.as_deref()
    }

    /// Consume the refresh signal raised by a completed save or delete.
    pub fn take_refresh(&mut self) -> bool {
        std::mem::take(&mut self.refresh)
    }

    /// Edit the title draft. Ignored unless the editor is open.
    pub fn set_title(&mut self, title: impl Into<String>) {
        if self.state != EditorState::Open {
            return;
        }
        self.title = title.into();
        self.title_error = None;
        self.dirty.insert(EditorField::Title);
    }

    /// Edit the readiness draft. Ignored unless the editor is open.
    pub fn set_is_ready(&mut self, is_ready: bool) {
        if self.state != EditorState::Open {
            return;
        }
        self.is_ready = is_ready;
        self.dirty.insert(EditorField::IsReady);
    }

    /// Validate the draft and mark a submission as in flight.
    ///
    /// # Returns
    /// A ticket carrying the patch to send; its patch is `None` when nothing
    /// was edited.
    ///
    /// # Errors
    /// Fails when the editor is not open, a submission is already in flight,
    /// or the title is blank.
    pub fn begin_submit(&mut self) -> Result<SubmitTicket, ClientError> {
        if self.state != EditorState::Open {
            return Err(not_in_state("submit", self.state));
        }
        if self.submitting {
            return Err(ClientError::Validation(
                "A submission is already in progress".to_string(),
            ));
        }
        let Some(record) = self.record.as_ref() else {
            return Err(not_in_state("submit", self.state));
        };
        if self.title.trim().is_empty() {
            let message = "Title is required".to_string();
            self.title_error = Some(message.clone());
            return Err(ClientError::Validation(message));
        }

        self.submitting = true;
        let patch = (!self.dirty.is_empty()).then(|| {
            let mut patch = AssetPatch::new(record.id);
            for field in &self.dirty {
                match field {
                    EditorField::Title => patch.title = Some(self.title.clone()),
                    EditorField::IsReady => patch.is_ready = Some(self.is_ready),
                }
            }
            patch
        });
        Ok(SubmitTicket {
            patch,
            session: self.session,
        })
    }

    /// Settle an in-flight submission.
    ///
    /// Success closes the editor with a refresh signal; failure keeps the
    /// draft open so the user can retry. A ticket from before the last
    /// open or close leaves the editor untouched.
    pub fn finish_submit<T>(
        &mut self,
        ticket: &SubmitTicket,
        result: Result<T, ClientError>,
    ) -> Result<T, ClientError> {
        if ticket.session != self.session {
            return result;
        }
        self.submitting = false;
        if result.is_ok() {
            self.close(true);
        }
        result
    }

    /// Send the dirty fields and close.
    ///
    /// # Returns
    /// The updated record, or `None` when nothing was edited.
    pub async fn submit(
        &mut self,
        gateway: &dyn AssetGateway,
    ) -> Result<Option<MuxAsset>, ClientError> {
        let ticket = self.begin_submit()?;
        let result = match &ticket.patch {
            Some(patch) => gateway.update_asset(patch).await.map(Some),
            None => Ok(None),
        };
        self.finish_submit(&ticket, result)
    }

    /// Ask for delete confirmation.
    pub fn request_delete(&mut self) -> Result<(), ClientError> {
        if self.state != EditorState::Open {
            return Err(not_in_state("request delete", self.state));
        }
        self.state = EditorState::ConfirmingDelete;
        Ok(())
    }

    /// Back out of the confirmation step.
    pub fn cancel_delete(&mut self) {
        if self.state == EditorState::ConfirmingDelete {
            self.state = EditorState::Open;
        }
    }

    /// Confirm deletion and move to processing.
    ///
    /// # Returns
    /// A ticket carrying the record to delete.
    pub fn confirm_delete(&mut self) -> Result<DeleteTicket, ClientError> {
        if self.state != EditorState::ConfirmingDelete {
            return Err(not_in_state("confirm delete", self.state));
        }
        let record = self
            .record
            .clone()
            .ok_or_else(|| not_in_state("confirm delete", self.state))?;
        self.state = EditorState::ProcessingDelete;
        Ok(DeleteTicket {
            record,
            session: self.session,
        })
    }

    /// Settle an in-flight delete. Failure returns to the open editor.
    pub fn complete_delete<T>(
        &mut self,
        ticket: &DeleteTicket,
        result: Result<T, ClientError>,
    ) -> Result<T, ClientError> {
        if ticket.session == self.session && self.state == EditorState::ProcessingDelete {
            match &result {
                Ok(_) => self.close(true),
                Err(_) => self.state = EditorState::Open,
            }
        }
        result
    }

    /// Confirm and run the delete in one step.
    pub async fn delete(&mut self, gateway: &dyn AssetGateway) -> Result<DeleteOutcome, ClientError> {
        let ticket = self.confirm_delete()?;
        let result = gateway.delete_asset(&ticket.record).await;
        self.complete_delete(&ticket, result)
    }

    /// Close without side effects.
    pub fn cancel(&mut self) {
        self.close(false);
    }

    fn close(&mut self, refresh: bool) {
        self.session = self.session.wrapping_add(1);
        self.state = EditorState::Closed;
        self.record = None;
        self.title.clear();
        self.is_ready = false;
        self.dirty.clear();
        self.submitting = false;
        self.title_error = None;
        self.refresh = refresh;
    }
}

#[cfg(test)]
mod tests {
    use super::{AssetGateway, EditorField, EditorState, RecordEditor};
    use crate::ClientError;
    use async_trait::async_trait;
    use muxup_core::models::{
        asset::{AssetPatch, MuxAsset, NewMuxAsset},
        upload::DeleteOutcome,
    };
    use reqwest::StatusCode;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeGateway {
        updates: Mutex<Vec<AssetPatch>>,
        deletes: Mutex<Vec<u64>>,
        fail: bool,
    }

    fn failure() -> ClientError {
        ClientError::Http {
            status: StatusCode::BAD_GATEWAY,
            message: "Mux API error".to_string(),
        }
    }

    #[async_trait]
    impl AssetGateway for FakeGateway {
        async fn update_asset(&self, patch: &AssetPatch) -> Result<MuxAsset, ClientError> {
            self.updates.lock().expect("updates").push(patch.clone());
            if self.fail {
                return Err(failure());
            }
            let mut asset = record();
            if let Some(title) = &patch.title {
                asset.title = title.clone();
            }
            if let Some(is_ready) = patch.is_ready {
                asset.is_ready = is_ready;
            }
            Ok(asset)
        }

        async fn delete_asset(&self, asset: &MuxAsset) -> Result<DeleteOutcome, ClientError> {
            self.deletes.lock().expect("deletes").push(asset.id);
            if self.fail {
                return Err(failure());
            }
            Ok(DeleteOutcome {
                success: true,
                deleted_on_mux: true,
            })
        }
    }

    fn record() -> MuxAsset {
        MuxAsset::from_new(
            5,
            NewMuxAsset {
                title: "Original".to_string(),
                asset_id: Some("asset-5".to_string()),
                ..NewMuxAsset::default()
            },
        )
    }

    fn open_editor() -> RecordEditor {
        let mut editor = RecordEditor::new();
        editor.open(record());
        editor
    }

    #[tokio::test]
    async fn submit_sends_only_dirty_readiness() {
        let gateway = FakeGateway::default();
        let mut editor = open_editor();
        editor.set_is_ready(true);
        assert_eq!(
            editor.dirty_fields().iter().copied().collect::<Vec<_>>(),
            vec![EditorField::IsReady]
        );

        let updated = editor.submit(&gateway).await.expect("submit");
        assert_eq!(updated.map(|asset| asset.is_ready), Some(true));

        let sent = gateway.updates.lock().expect("updates").clone();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].title, None);
        assert_eq!(sent[0].is_ready, Some(true));
        assert_eq!(editor.state(), EditorState::Closed);
        assert!(editor.take_refresh());
        assert!(!editor.take_refresh());
    }

    #[tokio::test]
    async fn submit_without_edits_sends_nothing_but_closes_with_refresh() {
        let gateway = FakeGateway::default();
        let mut editor = open_editor();
        assert_eq!(editor.submit(&gateway).await.expect("submit"), None);
        assert!(gateway.updates.lock().expect("updates").is_empty());
        assert_eq!(editor.state(), EditorState::Closed);
        assert!(editor.take_refresh());
    }

    #[tokio::test]
    async fn blank_title_blocks_submission() {
        let gateway = FakeGateway::default();
        let mut editor = open_editor();
        editor.set_title("   ");
        assert!(matches!(
            editor.submit(&gateway).await,
            Err(ClientError::Validation(_))
        ));
        assert_eq!(editor.title_error(), Some("Title is required"));
        assert!(gateway.updates.lock().expect("updates").is_empty());
        assert_eq!(editor.state(), EditorState::Open);
        assert!(!editor.is_submitting());

        editor.set_title("Fixed");
        assert_eq!(editor.title_error(), None);
    }

    #[test]
    fn second_submit_is_refused_while_in_flight() {
        let mut editor = open_editor();
        editor.set_title("Renamed");
        let ticket = editor.begin_submit().expect("first submit");
        let patch = ticket.patch.as_ref().expect("patch");
        assert_eq!(patch.title.as_deref(), Some("Renamed"));
        assert!(editor.is_submitting());
        assert!(editor.begin_submit().is_err());

        let result: Result<(), ClientError> = Err(failure());
        assert!(editor.finish_submit(&ticket, result).is_err());
        assert!(!editor.is_submitting());
        assert_eq!(editor.state(), EditorState::Open);
        assert!(editor.begin_submit().is_ok());
    }

    #[tokio::test]
    async fn delete_requires_confirmation() {
        let gateway = FakeGateway::default();
        let mut editor = open_editor();

        assert!(editor.delete(&gateway).await.is_err());
        assert!(gateway.deletes.lock().expect("deletes").is_empty());

        editor.request_delete().expect("request");
        assert_eq!(editor.state(), EditorState::ConfirmingDelete);
        editor.cancel_delete();
        assert_eq!(editor.state(), EditorState::Open);

        editor.request_delete().expect("request");
        let outcome = editor.delete(&gateway).await.expect("delete");
        assert!(outcome.deleted_on_mux);
        assert_eq!(*gateway.deletes.lock().expect("deletes"), vec![5]);
        assert_eq!(editor.state(), EditorState::Closed);
        assert!(editor.take_refresh());
    }

    #[tokio::test]
    async fn failed_delete_returns_to_open_editor() {
        let gateway = FakeGateway {
            fail: true,
            ..FakeGateway::default()
        };
        let mut editor = open_editor();
        editor.request_delete().expect("request");
        assert!(editor.delete(&gateway).await.is_err());
        assert_eq!(editor.state(), EditorState::Open);
        assert!(!editor.take_refresh());
    }

    #[test]
    fn cancel_closes_without_refresh_or_edits() {
        let mut editor = open_editor();
        editor.set_title("Draft");
        editor.request_delete().expect("request");
        editor.cancel();
        assert_eq!(editor.state(), EditorState::Closed);
        assert!(editor.record().is_none());
        assert!(!editor.take_refresh());

        editor.set_title("ignored");
        assert!(editor.dirty_fields().is_empty());
    }

    #[test]
    fn late_submit_settle_does_not_close_a_reopened_record() {
        let mut editor = open_editor();
        editor.set_title("Renamed");
        let ticket = editor.begin_submit().expect("submit");
        editor.cancel();

        let mut other = record();
        other.id = 6;
        other.title = "Other".to_string();
        editor.open(other);
        editor.set_is_ready(true);

        editor.finish_submit(&ticket, Ok(())).expect("settled");
        assert_eq!(editor.state(), EditorState::Open);
        assert_eq!(editor.record().map(|asset| asset.id), Some(6));
        assert_eq!(
            editor.dirty_fields().iter().copied().collect::<Vec<_>>(),
            vec![EditorField::IsReady]
        );
        assert!(!editor.take_refresh());
    }

    #[test]
    fn late_delete_settle_is_ignored_after_reopen() {
        let mut editor = open_editor();
        editor.request_delete().expect("request");
        let ticket = editor.confirm_delete().expect("confirm");
        assert_eq!(ticket.record.id, 5);
        editor.cancel();

        editor.open(record());
        editor.request_delete().expect("request");
        let result: Result<(), ClientError> = Ok(());
        editor.complete_delete(&ticket, result).expect("settled");
        assert_eq!(editor.state(), EditorState::ConfirmingDelete);
        assert!(!editor.take_refresh());
    }
}
