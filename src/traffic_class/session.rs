//! Editing session for one traffic class
//!
//! A session holds the class being edited and switches between structured
//! editing of the tree and raw editing of its text form. Saves go through a
//! [`TrafficClassStore`]; the record it returns replaces the local one.

use crate::condition::{ClassId, Combinator, Condition, LeafEdit, NodeKind, TreeEditor};
use crate::config::{ConsoleConfig, RawFormat};
use crate::error::{ClassError, Result, ValidationError};
use crate::traffic_class::raw::{parser_for, RawTextParser};
use crate::traffic_class::record::{SiteId, TrafficClass};
use crate::traffic_class::store::TrafficClassStore;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditMode {
    Structured,
    Raw,
}

pub struct TrafficClassSession<S: TrafficClassStore> {
    store: Arc<S>,
    site: SiteId,
    class: TrafficClass,
    mode: EditMode,
    needs_save: bool,
    raw_format: RawFormat,
    raw: Box<dyn RawTextParser + Send + Sync>,
}

impl<S: TrafficClassStore> TrafficClassSession<S> {
    /// Session for a class that has not been saved yet
    pub fn new(store: Arc<S>, site: SiteId, config: &ConsoleConfig) -> Self {
        Self::with_class(store, site, TrafficClass::default(), config)
    }

    /// Session for an existing class
    pub async fn load(
        store: Arc<S>,
        site: SiteId,
        id: ClassId,
        config: &ConsoleConfig,
    ) -> Result<Self> {
        let class = store.get(id).await?;
        Ok(Self::with_class(store, site, class, config))
    }

    fn with_class(store: Arc<S>, site: SiteId, class: TrafficClass, config: &ConsoleConfig) -> Self {
        Self {
            store,
            site,
            class,
            mode: EditMode::Structured,
            needs_save: false,
            raw_format: config.raw_format,
            raw: parser_for(config.raw_format),
        }
    }

    pub fn class(&self) -> &TrafficClass {
        &self.class
    }

    pub fn root(&self) -> Option<&Condition> {
        self.class.cond.as_ref()
    }

    pub fn mode(&self) -> EditMode {
        self.mode
    }

    pub fn is_raw(&self) -> bool {
        self.mode == EditMode::Raw
    }

    /// Whether there are edits not yet saved
    pub fn needs_save(&self) -> bool {
        self.needs_save
    }

    pub fn raw_text(&self) -> &str {
        &self.class.cond_str
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.class.name = name.into();
        self.needs_save = true;
    }

    /// Snapshot the tree as raw text and switch to raw editing
    pub fn enable_raw_edit(&mut self) -> Result<()> {
        if self.is_raw() {
            return Ok(());
        }
        self.class.cond_str = self.raw.snapshot(self.class.cond.as_ref())?;
        self.mode = EditMode::Raw;
        tracing::info!(class = ?self.class.id, format = ?self.raw_format, "raw editing enabled");
        Ok(())
    }

    /// Replace the raw text. Only read back while raw editing.
    pub fn set_raw_text(&mut self, text: impl Into<String>) {
        self.class.cond_str = text.into();
        self.needs_save = true;
    }

    /// Parse the raw text into the tree and return to structured editing.
    ///
    /// On a parse error the tree is untouched and the session stays raw.
    pub fn exit_raw_edit(&mut self) -> Result<()> {
        if !self.is_raw() {
            return Ok(());
        }
        let cond = self.parse_raw()?;
        self.class.cond = cond;
        self.class.cond_str.clear();
        self.mode = EditMode::Structured;
        tracing::info!(class = ?self.class.id, "raw editing finished");
        Ok(())
    }

    fn parse_raw(&self) -> Result<Option<Condition>> {
        if self.class.cond_str.trim().is_empty() {
            return Ok(None);
        }
        self.raw.parse_condition(&self.class.cond_str).map(Some)
    }

    fn editor(&mut self) -> Result<TreeEditor<'_>> {
        if self.is_raw() {
            return Err(ClassError::RawMode);
        }
        Ok(TreeEditor::new(&mut self.class.cond))
    }

    fn edited<T>(&mut self, result: Result<T>) -> Result<T> {
        if result.is_ok() {
            self.needs_save = true;
        }
        result
    }

    pub fn wrap(&mut self, path: &[usize], with: Combinator) -> Result<()> {
        let result = self.editor()?.wrap(path, with);
        self.edited(result)
    }

    pub fn replace(&mut self, path: &[usize], node: Condition) -> Result<Option<Condition>> {
        let result = self.editor()?.replace(path, node);
        self.edited(result)
    }

    pub fn insert_leaf(&mut self, container: &[usize], kind: NodeKind) -> Result<()> {
        let result = self.editor()?.insert_leaf(container, kind);
        self.edited(result)
    }

    pub fn delete(&mut self, container: &[usize], index: usize) -> Result<Condition> {
        let result = self.editor()?.delete(container, index);
        self.edited(result)
    }

    pub fn delete_root(&mut self) -> Result<Option<Condition>> {
        let removed = self.editor()?.delete_root();
        self.needs_save = true;
        Ok(removed)
    }

    /// Set a leaf value. A class may not reference itself.
    pub fn edit_leaf(&mut self, path: &[usize], edit: LeafEdit) -> Result<()> {
        if let (LeafEdit::Class(Some(target)), Some(own)) = (&edit, self.class.id) {
            if *target == own {
                return Err(ValidationError::SelfReference(own).into());
            }
        }
        let result = self.editor()?.edit_leaf(path, edit);
        self.edited(result)
    }

    /// Save the class, staying in the current mode unless it was just created
    pub async fn save(&mut self) -> Result<&TrafficClass> {
        self.save_inner(false).await
    }

    /// Save the class and return to structured editing
    pub async fn save_and_exit_raw(&mut self) -> Result<&TrafficClass> {
        self.save_inner(true).await
    }

    /// Record as sent to the store for the current mode.
    ///
    /// Raw text is the only source of the condition while raw editing, so
    /// blank text saves no condition in either format.
    fn outgoing(&self) -> Result<TrafficClass> {
        let mut outgoing = self.class.clone();
        let sent = match (self.mode, self.raw_format) {
            (EditMode::Structured, _) => {
                outgoing.cond_str.clear();
                outgoing.cond.clone()
            }
            // The store parses the expression itself
            (EditMode::Raw, RawFormat::Expression) => {
                outgoing.cond = None;
                self.parse_raw()?
            }
            (EditMode::Raw, RawFormat::Yaml) => {
                outgoing.cond = self.parse_raw()?;
                outgoing.cond_str.clear();
                outgoing.cond.clone()
            }
        };

        if let (Some(own), Some(cond)) = (self.class.id, &sent) {
            if cond.references_class(own) {
                return Err(ValidationError::SelfReference(own).into());
            }
        }
        Ok(outgoing)
    }

    async fn save_inner(&mut self, exit_raw: bool) -> Result<&TrafficClass> {
        let outgoing = self.outgoing()?;
        let creating = outgoing.id.is_none();

        let result = if creating {
            self.store.create(self.site, &outgoing).await
        } else {
            self.store.update(&outgoing).await
        };

        let saved = match result {
            Ok(saved) => saved,
            Err(e) => {
                tracing::warn!(class = ?outgoing.id, site = self.site, error = %e, "traffic class save failed");
                return Err(e);
            }
        };

        let stay_raw = self.is_raw() && !creating && !exit_raw;
        let snapshot = if stay_raw {
            Some(self.raw.snapshot(saved.cond.as_ref())?)
        } else {
            None
        };

        tracing::info!(class = ?saved.id, site = self.site, created = creating, "traffic class saved");
        self.class = saved;
        self.needs_save = false;
        match snapshot {
            Some(text) => self.class.cond_str = text,
            None => {
                self.class.cond_str.clear();
                self.mode = EditMode::Structured;
            }
        }
        Ok(&self.class)
    }
}
