//! Board use-case service.
//!
//! # Responsibility
//! - Own one window's [`NoteStore`] and its key-value storage.
//! - Run every mutation as: mutate store → persist → render.
//! - Apply companion messages through the same path.
//!
//! # Invariants
//! - Persistence happens through [`BoardService::persist`] after each
//!   successful mutation; no-op operations neither persist nor render.
//! - Save and delivery failures are logged and never abort the mutation.
//! - Log events carry ids and counts only, never note text.

use crate::config::BoardConfig;
use crate::model::filter::FilterMode;
use crate::model::note::{Note, NoteValidationError, PriorityInput};
use crate::persistence::gateway::{load_state, save_state, SaveError};
use crate::persistence::transfer::{
    parse_import, read_import, write_export, ExportDocument, ExportError, ImportFormatError,
};
use crate::query::visible::today_local;
use crate::repo::kv_repo::KeyValueStorage;
use crate::store::note_store::NoteStore;
use crate::store::snapshot::DecodedSnapshot;
use crate::sync::channel::MessagePort;
use crate::sync::companion::{CompanionOpener, CompanionRole, CompanionSession};
use crate::sync::message::{CompanionMessage, Envelope};
use chrono::{DateTime, NaiveDate, Utc};
use log::{debug, error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Receives the visible notes after every change.
pub type RenderHook = Box<dyn FnMut(&[Note])>;

/// Service error for board use-cases.
#[derive(Debug)]
pub enum BoardError {
    /// Note input rejected by the factory.
    Validation(NoteValidationError),
    /// Import file rejected; store unchanged.
    ImportFormat(ImportFormatError),
    Export(ExportError),
    /// Host refused to open the companion surface.
    PopupBlocked,
}

impl Display for BoardError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::ImportFormat(err) => write!(f, "{err}"),
            Self::Export(err) => write!(f, "{err}"),
            Self::PopupBlocked => write!(f, "companion window blocked; allow pop-ups"),
        }
    }
}

impl Error for BoardError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::ImportFormat(err) => Some(err),
            Self::Export(err) => Some(err),
            Self::PopupBlocked => None,
        }
    }
}

impl From<NoteValidationError> for BoardError {
    fn from(value: NoteValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<ImportFormatError> for BoardError {
    fn from(value: ImportFormatError) -> Self {
        Self::ImportFormat(value)
    }
}

impl From<ExportError> for BoardError {
    fn from(value: ExportError) -> Self {
        Self::Export(value)
    }
}

/// Explicitly owned board state for one window.
pub struct BoardService<S: KeyValueStorage> {
    storage: S,
    store: NoteStore,
    storage_key: String,
    export_file_name: String,
    origin: String,
    companion_delay: Duration,
    fixed_today: Option<NaiveDate>,
    render_hook: Option<RenderHook>,
}

impl<S: KeyValueStorage> BoardService<S> {
    /// Loads persisted state from `storage` (or starts empty).
    ///
    /// Corrupt stored state is discarded by the gateway; storage read failures
    /// are logged and also start an empty board.
    pub fn open(mut storage: S, config: &BoardConfig) -> Self {
        let store = match load_state(&mut storage, &config.storage_key) {
            Ok(Some(decoded)) => NoteStore::from_decoded(decoded, config.initial_filter),
            Ok(None) => NoteStore::with_filter(config.initial_filter),
            Err(err) => {
                error!(
                    "event=board_open module=service status=error error_code=storage_read_failed error={}",
                    err
                );
                NoteStore::with_filter(config.initial_filter)
            }
        };
        info!(
            "event=board_open module=service status=ok notes={} filter={}",
            store.len(),
            store.filter()
        );

        Self {
            storage,
            store,
            storage_key: config.storage_key.clone(),
            export_file_name: config.export_file_name.clone(),
            origin: config.origin.clone(),
            companion_delay: config.companion_delay,
            fixed_today: None,
            render_hook: None,
        }
    }

    /// Pins "today" for filtering instead of reading the local clock.
    pub fn with_fixed_today(mut self, today: NaiveDate) -> Self {
        self.fixed_today = Some(today);
        self
    }

    /// Installs the render collaborator and renders once.
    pub fn set_render_hook(&mut self, hook: impl FnMut(&[Note]) + 'static) {
        self.render_hook = Some(Box::new(hook));
        self.render();
    }

    pub fn store(&self) -> &NoteStore {
        &self.store
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn today(&self) -> NaiveDate {
        self.fixed_today.unwrap_or_else(today_local)
    }

    /// Filtered and sorted notes for display.
    pub fn visible_notes(&self) -> Vec<Note> {
        self.store.visible(self.today())
    }

    /// Writes the current snapshot to storage.
    pub fn persist(&mut self) -> Result<(), SaveError> {
        save_state(&mut self.storage, &self.storage_key, &self.store.to_snapshot())
    }

    /// Pushes the visible notes to the render hook, if any.
    pub fn render(&mut self) {
        let visible = self.visible_notes();
        if let Some(hook) = self.render_hook.as_mut() {
            hook(&visible);
        }
    }

    fn commit(&mut self, event: &'static str) {
        if let Err(err) = self.persist() {
            error!(
                "event={event} module=service status=error error_code=state_save_failed error={}",
                err
            );
        }
        self.render();
    }

    /// Creates a note, appends it, persists and renders.
    ///
    /// # Errors
    /// - [`BoardError::Validation`] for blank text or an invalid date; the
    ///   store is left unchanged.
    pub fn create_note(
        &mut self,
        text: &str,
        date: &str,
        priority: impl Into<PriorityInput>,
    ) -> Result<Note, BoardError> {
        let note = self.store.create(text, date, priority).map_err(|err| {
            warn!("event=note_create module=service status=rejected error={err}");
            err
        })?;
        self.commit("note_create");
        info!(
            "event=note_create module=service status=ok note_id={} priority={}",
            note.id, note.priority
        );
        Ok(note)
    }

    /// Marks a note completed. Unknown ids are a no-op.
    pub fn complete_note(&mut self, id: &str) -> bool {
        if !self.store.complete(id) {
            debug!("event=note_complete module=service status=skip reason=not_found");
            return false;
        }
        self.commit("note_complete");
        info!("event=note_complete module=service status=ok note_id={id}");
        true
    }

    /// Removes a note without asking. Unknown ids are a no-op.
    pub fn delete_note(&mut self, id: &str) -> bool {
        if !self.store.remove(id) {
            debug!("event=note_delete module=service status=skip reason=not_found");
            return false;
        }
        self.commit("note_delete");
        info!("event=note_delete module=service status=ok note_id={id}");
        true
    }

    /// Removes a note after `confirm` approves it.
    ///
    /// `confirm` is only asked when the note exists.
    pub fn delete_note_confirmed(&mut self, id: &str, confirm: impl FnOnce(&Note) -> bool) -> bool {
        let Some(note) = self.store.get(id) else {
            debug!("event=note_delete module=service status=skip reason=not_found");
            return false;
        };
        if !confirm(note) {
            debug!("event=note_delete module=service status=skip reason=not_confirmed");
            return false;
        }
        self.delete_note(id)
    }

    pub fn set_filter(&mut self, filter: FilterMode) {
        self.store.set_filter(filter);
        self.commit("filter_change");
    }

    /// Applies a URL fragment (`#hoy`, `#semana`, `#todas`).
    pub fn apply_fragment(&mut self, fragment: &str) -> FilterMode {
        let filter = FilterMode::from_fragment(fragment);
        self.set_filter(filter);
        filter
    }

    /// Wholesale replacement of the collection.
    pub fn replace_all(&mut self, notes: Vec<Note>, filter: Option<FilterMode>) {
        let count = notes.len();
        self.store.replace_all(notes, filter);
        self.commit("notes_replace");
        info!("event=notes_replace module=service status=ok notes={count}");
    }

    /// Imports snapshot-shaped JSON text. Returns the number of notes adopted.
    ///
    /// # Errors
    /// - [`BoardError::ImportFormat`] when `notes` is not a sequence; the store
    ///   is left unchanged.
    pub fn import_text(&mut self, text: &str) -> Result<usize, BoardError> {
        let decoded = parse_import(text)?;
        Ok(self.adopt_import(decoded))
    }

    /// Reads and imports a JSON file.
    pub fn import_file(&mut self, path: &Path) -> Result<usize, BoardError> {
        let decoded = read_import(path)?;
        Ok(self.adopt_import(decoded))
    }

    fn adopt_import(&mut self, decoded: DecodedSnapshot) -> usize {
        let count = decoded.notes.len();
        self.replace_all(decoded.notes, decoded.filter);
        count
    }

    /// Export document stamped with `at`.
    pub fn export_document(&self, at: DateTime<Utc>) -> ExportDocument {
        ExportDocument::from_snapshot(self.store.to_snapshot(), at)
    }

    /// Writes the export file into `dir` and returns its path.
    pub fn export_to_dir(&self, dir: &Path) -> Result<PathBuf, BoardError> {
        let document = self.export_document(Utc::now());
        Ok(write_export(dir, &self.export_file_name, &document)?)
    }

    /// Opens the companion surface and schedules the initial snapshot of the
    /// currently filtered notes after the grace delay.
    ///
    /// # Errors
    /// - [`BoardError::PopupBlocked`] when the opener refuses.
    pub fn open_companion<O: CompanionOpener>(
        &self,
        opener: &mut O,
        now: Instant,
    ) -> Result<CompanionSession<O::Port>, BoardError> {
        let Some(port) = opener.open() else {
            warn!("event=companion_open module=service status=error error_code=popup_blocked");
            return Err(BoardError::PopupBlocked);
        };
        let mut session = CompanionSession::primary(port, self.origin.clone(), self.origin.clone());
        let notes = self.store.filtered(self.today());
        let count = notes.len();
        session.schedule(CompanionMessage::Snapshot { notes }, now + self.companion_delay);
        info!(
            "event=companion_open module=service status=ok snapshot_notes={} delay_ms={}",
            count,
            self.companion_delay.as_millis()
        );
        Ok(session)
    }

    /// Timer tick for a session. Returns `true` when a message was delivered.
    pub fn poll_companion<P: MessagePort>(
        &self,
        session: &mut CompanionSession<P>,
        now: Instant,
    ) -> bool {
        match session.poll(now) {
            None => false,
            Some(Ok(())) => {
                info!("event=companion_send module=service status=ok tipo=SNAPSHOT");
                true
            }
            Some(Err(err)) => {
                error!(
                    "event=companion_send module=service status=error error_code=delivery_failure error={}",
                    err
                );
                false
            }
        }
    }

    /// Validates and applies one inbound envelope. Returns the applied message.
    pub fn handle_companion_envelope<P: MessagePort>(
        &mut self,
        session: &CompanionSession<P>,
        envelope: &Envelope,
    ) -> Option<CompanionMessage> {
        let message = session.receive(envelope)?;
        self.apply_companion_message(session.role(), &message);
        Some(message)
    }

    /// Applies a validated message according to this window's role.
    ///
    /// - `SNAPSHOT`: the secondary adopts the notes wholesale; the primary only
    ///   re-renders.
    /// - `BORRADO`: removes the note, persists and renders; unknown ids change
    ///   nothing.
    pub fn apply_companion_message(&mut self, role: CompanionRole, message: &CompanionMessage) {
        match (message, role) {
            (CompanionMessage::Snapshot { notes }, CompanionRole::Secondary) => {
                self.replace_all(notes.clone(), None);
            }
            (CompanionMessage::Snapshot { .. }, CompanionRole::Primary) => {
                self.render();
            }
            (CompanionMessage::Deleted { id }, _) => {
                self.delete_note(id);
            }
        }
    }

    /// Deletes locally and tells the peer. Delivery failures are only logged.
    pub fn delete_and_notify<P: MessagePort>(
        &mut self,
        session: &CompanionSession<P>,
        id: &str,
    ) -> bool {
        if !self.delete_note(id) {
            return false;
        }
        let message = CompanionMessage::Deleted { id: id.to_string() };
        if let Err(err) = session.send(&message) {
            error!(
                "event=companion_send module=service status=error tipo=BORRADO error_code=delivery_failure error={}",
                err
            );
        }
        true
    }
}
