//! The editor session: one explicit context for every editing command.
//!
//! [`EditorSession`] bundles the document, selection, clipboard, history,
//! widget reference store and canvas settings. Every structural command
//! records exactly one history snapshot; a command that fails restores the
//! document to the last recorded state so nothing is partially applied.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clipboard::{current_timestamp_ms, ClipboardEntry};
use crate::document::{Document, NodePatch};
use crate::error::{BuilderError, BuilderResult};
use crate::history::{History, HistoryConfig};
use crate::node::{ComponentNode, NodeId};
use crate::normalize::{normalize_report, NormalizeReport};
use crate::schema::ComponentKind;
use crate::surface::{parse_raw, CanvasSettings, SurfaceExport};
use crate::value::PropValue;
use crate::widget::{WidgetCacheConfig, WidgetDefinition, WidgetRef, WidgetRefStore, WidgetSnapshot};

// ============================================================================
// Configuration
// ============================================================================

/// Session configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BuilderConfig {
    /// Drop unregistered props when normalizing external content.
    pub strict_normalization: bool,
    /// Undo stack settings.
    pub history: HistoryConfig,
    /// Widget cache settings.
    pub widget_cache: WidgetCacheConfig,
}

impl BuilderConfig {
    /// Load a configuration from JSON. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed.
    pub fn from_json(json: &str) -> BuilderResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

// ============================================================================
// Selection
// ============================================================================

/// Ordered set of selected node ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: Vec<NodeId>,
    surface_id: Option<String>,
}

impl Selection {
    /// Create an empty selection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Selected ids in selection order.
    #[must_use]
    pub fn ids(&self) -> &[NodeId] {
        &self.ids
    }

    /// First selected id.
    #[must_use]
    pub fn first(&self) -> Option<&NodeId> {
        self.ids.first()
    }

    /// Surface the selection is scoped to.
    #[must_use]
    pub fn surface_id(&self) -> Option<&str> {
        self.surface_id.as_deref()
    }

    /// Scope the selection to a surface.
    pub fn set_surface(&mut self, surface_id: Option<String>) {
        self.surface_id = surface_id;
    }

    /// Replace the selection.
    pub fn select<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<NodeId>,
    {
        self.ids.clear();
        for id in ids {
            self.add(id);
        }
    }

    /// Add an id if it is not selected yet.
    pub fn add(&mut self, id: impl Into<NodeId>) {
        let id = id.into();
        if !self.ids.contains(&id) {
            self.ids.push(id);
        }
    }

    /// Remove an id. Returns whether it was selected.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.ids.len();
        self.ids.retain(|selected| selected.as_str() != id);
        self.ids.len() != before
    }

    /// Clear the selection.
    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Whether `id` is selected.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|selected| selected.as_str() == id)
    }

    /// Number of selected ids.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Follow a node rename.
    pub fn rename(&mut self, old: &str, new: &NodeId) {
        for selected in &mut self.ids {
            if selected.as_str() == old {
                *selected = new.clone();
            }
        }
    }

    /// Drop ids the document no longer contains.
    pub fn retain_existing(&mut self, document: &Document) {
        self.ids.retain(|id| document.contains(id.as_str()));
    }
}

// ============================================================================
// Session
// ============================================================================

/// Editing context for one surface.
#[derive(Debug, Clone)]
pub struct EditorSession {
    document: Document,
    selection: Selection,
    clipboard: Option<ClipboardEntry>,
    history: History,
    widget_refs: WidgetRefStore,
    canvas_settings: CanvasSettings,
    config: BuilderConfig,
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new(BuilderConfig::default())
    }
}

impl EditorSession {
    /// Create a session holding only the default root column.
    #[must_use]
    pub fn new(config: BuilderConfig) -> Self {
        Self::with_document(Document::with_default_root(), config)
    }

    /// Create a session around an existing document.
    #[must_use]
    pub fn with_document(document: Document, config: BuilderConfig) -> Self {
        let history = History::new(document.snapshot(), config.history);
        Self {
            document,
            selection: Selection::new(),
            clipboard: None,
            history,
            widget_refs: WidgetRefStore::new(),
            canvas_settings: CanvasSettings::default(),
            config,
        }
    }

    /// Create a session from a previously exported surface.
    ///
    /// # Errors
    ///
    /// Returns [`BuilderError::Import`] if the export is structurally invalid.
    pub fn from_export(export: SurfaceExport, config: BuilderConfig) -> BuilderResult<Self> {
        let document = export.to_document()?;
        let mut session = Self::with_document(document, config);
        session.widget_refs = export.widget_refs;
        session.canvas_settings = export.canvas_settings;
        Ok(session)
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    /// The live document.
    #[must_use]
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// The current selection.
    #[must_use]
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Mutable selection. Selection changes never record history.
    pub fn selection_mut(&mut self) -> &mut Selection {
        &mut self.selection
    }

    /// Replace the selection.
    pub fn select<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<NodeId>,
    {
        self.selection.select(ids);
    }

    /// The clipboard, if anything was copied or cut.
    #[must_use]
    pub fn clipboard(&self) -> Option<&ClipboardEntry> {
        self.clipboard.as_ref()
    }

    /// The undo history.
    #[must_use]
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Whether an undo step is available.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    /// Whether a redo step is available.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Materialized widgets by instance id.
    #[must_use]
    pub fn widget_refs(&self) -> &WidgetRefStore {
        &self.widget_refs
    }

    /// Snapshot stored for a widget instance.
    #[must_use]
    pub fn widget_snapshot(&self, instance_id: &str) -> Option<&WidgetSnapshot> {
        self.widget_refs.get(instance_id)
    }

    /// Page settings.
    #[must_use]
    pub fn canvas_settings(&self) -> &CanvasSettings {
        &self.canvas_settings
    }

    /// Replace page settings. Not recorded in history.
    pub fn set_canvas_settings(&mut self, settings: CanvasSettings) {
        self.canvas_settings = settings;
    }

    /// Session configuration.
    #[must_use]
    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    // ------------------------------------------------------------------------
    // History plumbing
    // ------------------------------------------------------------------------

    fn commit(&mut self) {
        self.history.commit(self.document.snapshot());
    }

    /// Run `op`, then record a snapshot on success or roll back on failure.
    fn record<T>(&mut self, op: impl FnOnce(&mut Self) -> BuilderResult<T>) -> BuilderResult<T> {
        match op(self) {
            Ok(value) => {
                self.commit();
                Ok(value)
            }
            Err(e) => {
                tracing::debug!(error = %e, "command rolled back");
                self.document.restore(self.history.present());
                Err(e)
            }
        }
    }

    /// Step back one snapshot. Returns `false` when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(snapshot) = self.history.undo() else {
            return false;
        };
        self.document.restore(snapshot);
        self.selection.retain_existing(&self.document);
        true
    }

    /// Step forward one snapshot. Returns `false` when there is nothing to redo.
    pub fn redo(&mut self) -> bool {
        let Some(snapshot) = self.history.redo() else {
            return false;
        };
        self.document.restore(snapshot);
        self.selection.retain_existing(&self.document);
        true
    }

    // ------------------------------------------------------------------------
    // Structural commands
    // ------------------------------------------------------------------------

    /// Insert a node without attaching it to a parent.
    ///
    /// # Errors
    ///
    /// - [`BuilderError::DuplicateId`] if the id is already taken.
    /// - [`BuilderError::InvalidTarget`] if the node references the root.
    /// - [`BuilderError::CycleDetected`] if the node closes a loop through a
    ///   dangling reference to its id.
    pub fn add_component(&mut self, node: ComponentNode) -> BuilderResult<NodeId> {
        self.record(|session| session.insert_unattached(node))
    }

    /// Insert several unattached nodes as one undo step.
    ///
    /// # Errors
    ///
    /// Returns the first [`EditorSession::add_component`] error; none of the
    /// nodes are inserted.
    pub fn add_components(&mut self, nodes: Vec<ComponentNode>) -> BuilderResult<Vec<NodeId>> {
        self.record(|session| {
            nodes
                .into_iter()
                .map(|node| session.insert_unattached(node))
                .collect()
        })
    }

    fn insert_unattached(&mut self, node: ComponentNode) -> BuilderResult<NodeId> {
        let id = node.id.clone();
        if self.document.contains(id.as_str()) {
            return Err(BuilderError::DuplicateId(id.to_string()));
        }
        let root = self.document.root_id();
        if node.references(root.as_str()) {
            return Err(BuilderError::InvalidTarget(format!(
                "root {root} cannot be a child of {id}"
            )));
        }
        self.document.insert(node);
        if !self.document.is_acyclic() {
            return Err(BuilderError::CycleDetected {
                node: id.to_string(),
                target: id.to_string(),
            });
        }
        Ok(id)
    }

    /// Shallow-merge `patch` into node `id`.
    ///
    /// A missing id is a recorded no-op.
    ///
    /// # Errors
    ///
    /// Returns [`BuilderError::DuplicateId`] or [`BuilderError::CycleDetected`]
    /// and leaves the session unchanged.
    pub fn update_component(&mut self, id: &str, patch: NodePatch) -> BuilderResult<()> {
        let renamed = patch.id.clone();
        self.record(|session| {
            if session.document.update(id, patch)? {
                if let Some(new_id) = &renamed {
                    session.selection.rename(id, new_id);
                }
            }
            Ok(())
        })
    }

    /// Delete nodes with their subtrees without detaching parent references.
    ///
    /// Returns the deleted ids.
    pub fn delete_components<I, S>(&mut self, ids: I) -> Vec<NodeId>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let deleted = self.document.delete(ids);
        for id in &deleted {
            self.selection.remove(id.as_str());
        }
        self.commit();
        deleted
    }

    /// Detach and delete the selected nodes. The root is skipped.
    pub fn delete_selected(&mut self) -> Vec<NodeId> {
        let selected: Vec<NodeId> = self
            .selection
            .ids()
            .iter()
            .filter(|id| *id != self.document.root_id())
            .cloned()
            .collect();
        for id in &selected {
            self.document.detach(id.as_str());
        }
        let deleted = self.document.delete(selected.iter().map(NodeId::as_str));
        self.selection.clear();
        self.commit();
        deleted
    }

    /// Move `id` under `to_parent` at `index`.
    ///
    /// A missing `id` is a recorded no-op.
    ///
    /// # Errors
    ///
    /// Returns the [`Document::move_node`] error and leaves the session
    /// unchanged.
    pub fn move_component(
        &mut self,
        id: &str,
        from_parent: Option<&str>,
        to_parent: &str,
        index: Option<usize>,
    ) -> BuilderResult<()> {
        self.record(|session| {
            session
                .document
                .move_node(id, from_parent, to_parent, index)
                .map(|_| ())
        })
    }

    /// Remove references to nodes that no longer exist.
    ///
    /// Records a snapshot only when something was removed.
    pub fn prune_dangling(&mut self) -> usize {
        let removed = self.document.prune_dangling();
        if removed > 0 {
            tracing::info!(removed, "pruned dangling references");
            self.commit();
        }
        removed
    }

    // ------------------------------------------------------------------------
    // Clipboard
    // ------------------------------------------------------------------------

    /// Copy the selected subtrees. Returns how many nodes were captured.
    pub fn copy(&mut self) -> usize {
        self.capture(false)
    }

    /// Cut the selected subtrees. The root is never cut.
    ///
    /// Nothing is removed until the next paste.
    pub fn cut(&mut self) -> usize {
        self.capture(true)
    }

    fn capture(&mut self, cut: bool) -> usize {
        let root = self.document.root_id();
        let selected: Vec<NodeId> = self
            .selection
            .ids()
            .iter()
            .filter(|id| {
                let is_root = *id == root;
                if cut && is_root {
                    tracing::warn!(id = %id, "the root node cannot be cut");
                }
                !(cut && is_root)
            })
            .cloned()
            .collect();
        match ClipboardEntry::capture(&self.document, &selected, cut) {
            Some(entry) => {
                let count = entry.nodes.len();
                self.clipboard = Some(entry);
                count
            }
            None => {
                tracing::debug!("nothing selected to capture");
                0
            }
        }
    }

    /// Paste the clipboard into `target`. Returns the new top-level ids.
    ///
    /// A cut clipboard is consumed: the originals are detached and deleted and
    /// the clipboard is cleared.
    ///
    /// # Errors
    ///
    /// - [`BuilderError::NodeNotFound`] if `target` does not exist.
    /// - [`BuilderError::InvalidTarget`] if `target` cannot hold the pasted
    ///   roots or is itself being cut.
    pub fn paste(&mut self, target: &str) -> BuilderResult<Vec<NodeId>> {
        let Some(entry) = self.clipboard.clone() else {
            tracing::debug!("paste with empty clipboard ignored");
            return Ok(Vec::new());
        };
        let snapshot = self.widget_refs.clone();
        let result = self.record(|session| session.paste_entry(&entry, target));
        match &result {
            Ok(_) if entry.cut => self.clipboard = None,
            Ok(_) => {}
            Err(_) => self.widget_refs = snapshot,
        }
        result
    }

    fn paste_entry(&mut self, entry: &ClipboardEntry, target: &str) -> BuilderResult<Vec<NodeId>> {
        let parent = self
            .document
            .get(target)
            .ok_or_else(|| BuilderError::NodeNotFound(target.to_string()))?;
        if !parent.supports_children() {
            return Err(BuilderError::InvalidTarget(format!(
                "{target} ({}) cannot have children",
                parent.kind
            )));
        }
        if entry.cut && entry.ids().any(|id| id.as_str() == target) {
            return Err(BuilderError::InvalidTarget(format!(
                "{target} is part of the cut selection"
            )));
        }

        let map = entry.fresh_ids(current_timestamp_ms(), |id| self.document.contains(id));
        let mut copies = Vec::with_capacity(entry.nodes.len());
        for node in &entry.nodes {
            let Some(new_id) = map.get(node.id.as_str()) else {
                continue;
            };
            let mut copy = node.clone();
            copy.id = NodeId::from(new_id.as_str());
            copy.remap_references(&map);
            if let Some(instance_id) = node.widget_instance_id() {
                if let Some(snapshot) = self.widget_refs.get(instance_id).cloned() {
                    let fresh = new_instance_id();
                    copy.props
                        .insert("instanceId".to_string(), PropValue::string(fresh.clone()));
                    self.widget_refs.insert(fresh, snapshot);
                }
            }
            copies.push(copy);
        }
        for copy in copies {
            self.document.insert(copy);
        }

        let roots: Vec<NodeId> = entry
            .roots
            .iter()
            .filter_map(|root| map.get(root.as_str()))
            .map(|id| NodeId::from(id.as_str()))
            .collect();
        for root in &roots {
            self.document.attach(root.as_str(), target, None)?;
        }

        if entry.cut {
            for root in &entry.roots {
                self.document.detach(root.as_str());
            }
            let originals: Vec<&str> = entry.ids().map(NodeId::as_str).collect();
            for id in self.document.delete(originals) {
                self.selection.remove(id.as_str());
            }
        }
        tracing::debug!(parent = target, pasted = roots.len(), cut = entry.cut, "pasted");
        Ok(roots)
    }

    /// Copy the selection and paste it into the parent of the first
    /// selected node.
    ///
    /// Returns an empty list when nothing is selected.
    ///
    /// # Errors
    ///
    /// Returns [`BuilderError::InvalidTarget`] if the first selected node has
    /// no parent, or any [`EditorSession::paste`] error.
    pub fn duplicate(&mut self) -> BuilderResult<Vec<NodeId>> {
        let Some(first) = self.selection.first().cloned() else {
            return Ok(Vec::new());
        };
        let parent = self.document.find_parent_id(first.as_str()).ok_or_else(|| {
            BuilderError::InvalidTarget(format!("{first} has no parent to duplicate into"))
        })?;
        if self.copy() == 0 {
            return Ok(Vec::new());
        }
        self.paste(parent.as_str())
    }

    // ------------------------------------------------------------------------
    // Insertion from outside the tree
    // ------------------------------------------------------------------------

    /// Create a node of `kind` with default props and attach it.
    ///
    /// # Errors
    ///
    /// Returns the [`Document::attach`] error and leaves the session unchanged.
    pub fn insert_component(
        &mut self,
        kind: ComponentKind,
        parent: &str,
        index: Option<usize>,
    ) -> BuilderResult<NodeId> {
        self.record(|session| {
            let id = session.fresh_node_id(kind.as_str());
            session
                .document
                .insert(ComponentNode::with_defaults(id.clone(), kind));
            session.document.attach(id.as_str(), parent, index)?;
            Ok(id)
        })
    }

    /// Add a widget instance leaf under `target` and store its snapshot.
    ///
    /// # Errors
    ///
    /// Returns the [`Document::attach`] error and leaves the session unchanged.
    pub fn instantiate_widget(
        &mut self,
        target: &str,
        index: Option<usize>,
        widget_ref: WidgetRef,
        definition: WidgetDefinition,
    ) -> BuilderResult<NodeId> {
        let instance_id = new_instance_id();
        let id = self.record(|session| {
            let id = session.fresh_node_id("widget");
            let node = ComponentNode::with_defaults(id.clone(), ComponentKind::WidgetInstance)
                .with_prop("instanceId", PropValue::string(instance_id.clone()));
            session.document.insert(node);
            session.document.attach(id.as_str(), target, index)?;
            Ok(id)
        })?;
        tracing::info!(widget = %widget_ref, instance_id = %instance_id, node = %id, "widget instantiated");
        self.widget_refs.insert(
            instance_id,
            WidgetSnapshot {
                widget_ref,
                definition,
            },
        );
        Ok(id)
    }

    /// Normalize externally generated nodes and attach them under `parent`.
    ///
    /// Ids that collide with existing nodes get fresh ids; repeated ids within
    /// the batch keep their first occurrence. Nodes no other batch node
    /// references become children of `parent`. Returns those top-level ids.
    ///
    /// # Errors
    ///
    /// - [`BuilderError::NodeNotFound`] if `parent` does not exist.
    /// - [`BuilderError::InvalidTarget`] if `parent` cannot hold the batch.
    /// - [`BuilderError::CycleDetected`] if the batch references itself.
    pub fn insert_generated(
        &mut self,
        parent: &str,
        nodes: Vec<ComponentNode>,
        strict: bool,
    ) -> BuilderResult<Vec<NodeId>> {
        let NormalizeReport {
            nodes, warnings, ..
        } = normalize_report(nodes, strict);
        if !warnings.is_empty() {
            tracing::info!(warnings = warnings.len(), "generated nodes normalized");
        }

        self.record(|session| {
            let target = session
                .document
                .get(parent)
                .ok_or_else(|| BuilderError::NodeNotFound(parent.to_string()))?;
            if !target.supports_children() {
                return Err(BuilderError::InvalidTarget(format!(
                    "{parent} ({}) cannot have children",
                    target.kind
                )));
            }

            let mut seen = HashSet::new();
            let mut batch = Vec::with_capacity(nodes.len());
            for node in nodes {
                if seen.insert(node.id.clone()) {
                    batch.push(node);
                } else {
                    tracing::warn!(id = %node.id, "duplicate generated id dropped");
                }
            }

            let mut map = HashMap::new();
            for node in &batch {
                if session.document.contains(node.id.as_str()) {
                    let fresh = loop {
                        let candidate = NodeId::generate(node.kind.as_str());
                        if !session.document.contains(candidate.as_str())
                            && !seen.contains(&candidate)
                        {
                            break candidate;
                        }
                    };
                    seen.insert(fresh.clone());
                    map.insert(node.id.to_string(), fresh.to_string());
                }
            }
            if !map.is_empty() {
                for node in &mut batch {
                    if let Some(fresh) = map.get(node.id.as_str()) {
                        node.id = NodeId::from(fresh.as_str());
                    }
                    node.remap_references(&map);
                }
            }

            let referenced: HashSet<&str> = batch.iter().flat_map(ComponentNode::child_ids).collect();
            let roots: Vec<NodeId> = batch
                .iter()
                .filter(|node| !referenced.contains(node.id.as_str()))
                .map(|node| node.id.clone())
                .collect();

            for node in batch {
                session.document.insert(node);
            }
            if !session.document.is_acyclic() {
                return Err(BuilderError::CycleDetected {
                    node: parent.to_string(),
                    target: parent.to_string(),
                });
            }
            for root in &roots {
                session.document.attach(root.as_str(), parent, None)?;
            }
            Ok(roots)
        })
    }

    fn fresh_node_id(&self, prefix: &str) -> NodeId {
        loop {
            let id = NodeId::generate(prefix);
            if !self.document.contains(id.as_str()) {
                return id;
            }
        }
    }

    // ------------------------------------------------------------------------
    // Import / export
    // ------------------------------------------------------------------------

    /// Replace the whole session content with a parsed raw surface.
    ///
    /// Records one snapshot. On failure nothing changes. Imported widget
    /// snapshots are merged into the store so that undoing the import can
    /// still resolve the instances it brings back.
    ///
    /// # Errors
    ///
    /// Returns [`BuilderError::Import`] describing the first problem found.
    pub fn import_raw(&mut self, text: &str) -> BuilderResult<()> {
        let export = parse_raw(text)?;
        let document = export.to_document()?;
        tracing::info!(
            components = document.len(),
            widgets = export.widget_refs.len(),
            "surface imported"
        );
        self.document = document;
        self.widget_refs.merge(export.widget_refs);
        self.canvas_settings = export.canvas_settings;
        self.selection.clear();
        self.commit();
        Ok(())
    }

    /// Serialize the session to the export shape.
    #[must_use]
    pub fn export(&self) -> SurfaceExport {
        SurfaceExport::from_parts(&self.document, &self.widget_refs, &self.canvas_settings)
    }
}

fn new_instance_id() -> String {
    Uuid::new_v4().to_string()
}
