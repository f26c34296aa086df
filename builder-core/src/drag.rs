//! Drag-and-drop transactions.
//!
//! A drag starts with a [`DragSource`], tracks the last valid [`DropPoint`]
//! while the pointer moves, and issues exactly one session command when it
//! finishes. Hovering never mutates the session.
//!
//! ```text
//! start ──► over* ──► finish ──► Moved / Inserted / Instantiated
//!                        └─────► Cancelled (no valid point seen)
//! ```

use crate::error::BuilderResult;
use crate::node::NodeId;
use crate::schema::ComponentKind;
use crate::session::EditorSession;
use crate::widget::{WidgetRef, WidgetResolver};

/// What is being dragged.
#[derive(Debug, Clone, PartialEq)]
pub enum DragSource {
    /// A node already in the document.
    Existing {
        /// Node being moved.
        id: NodeId,
        /// Its parent when the drag started.
        from_parent: Option<NodeId>,
    },
    /// A new component from the palette.
    Palette(ComponentKind),
    /// A widget from the library; its definition is fetched on drop.
    Widget(WidgetRef),
}

/// Candidate drop location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropPoint {
    /// Container receiving the drop.
    pub parent_id: NodeId,
    /// Position among its children; `None` appends.
    pub index: Option<usize>,
}

/// Result of finishing a drag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    /// A palette component was created.
    Inserted(NodeId),
    /// An existing node was moved.
    Moved(NodeId),
    /// A widget instance was created.
    Instantiated(NodeId),
    /// No valid drop point was seen; nothing changed.
    Cancelled,
}

/// One drag gesture.
#[derive(Debug, Clone)]
pub struct DragTransaction {
    source: DragSource,
    candidate: Option<DropPoint>,
}

impl DragTransaction {
    /// Begin a drag. The parent of an existing node is looked up now.
    #[must_use]
    pub fn start(session: &EditorSession, source: DragSource) -> Self {
        let source = match source {
            DragSource::Existing { id, from_parent } => {
                let from_parent =
                    from_parent.or_else(|| session.document().find_parent_id(id.as_str()));
                DragSource::Existing { id, from_parent }
            }
            other => other,
        };
        tracing::debug!(source = ?source, "drag started");
        Self {
            source,
            candidate: None,
        }
    }

    /// The dragged item.
    #[must_use]
    pub fn source(&self) -> &DragSource {
        &self.source
    }

    /// The last valid drop point.
    #[must_use]
    pub fn candidate(&self) -> Option<&DropPoint> {
        self.candidate.as_ref()
    }

    /// Pointer moved over `target`. Returns whether the point is valid.
    ///
    /// Invalid points leave the previous candidate in place.
    pub fn over(&mut self, session: &EditorSession, target: &str, index: Option<usize>) -> bool {
        if !accepts(&self.source, session, target) {
            return false;
        }
        self.candidate = Some(DropPoint {
            parent_id: NodeId::from(target),
            index,
        });
        true
    }

    /// Drop at the last valid point.
    ///
    /// Widget sources need [`DragTransaction::finish_with`]; here they cancel.
    ///
    /// # Errors
    ///
    /// Returns the error of the issued session command; the session is then
    /// unchanged.
    pub fn finish(self, session: &mut EditorSession) -> BuilderResult<DropOutcome> {
        let Some(point) = self.candidate else {
            tracing::debug!("drag cancelled without a drop point");
            return Ok(DropOutcome::Cancelled);
        };
        match self.source {
            DragSource::Existing { id, from_parent } => {
                session.move_component(
                    id.as_str(),
                    from_parent.as_ref().map(NodeId::as_str),
                    point.parent_id.as_str(),
                    point.index,
                )?;
                Ok(DropOutcome::Moved(id))
            }
            DragSource::Palette(kind) => {
                let id = session.insert_component(kind, point.parent_id.as_str(), point.index)?;
                Ok(DropOutcome::Inserted(id))
            }
            DragSource::Widget(widget) => {
                tracing::warn!(widget = %widget, "widget drop needs a resolver");
                Ok(DropOutcome::Cancelled)
            }
        }
    }

    /// Drop at the last valid point, fetching widget definitions first.
    ///
    /// A failed fetch leaves the session untouched. The drop point is checked
    /// again once the definition has arrived.
    ///
    /// # Errors
    ///
    /// Returns [`crate::BuilderError::Service`] if the fetch fails, or the
    /// error of the issued session command.
    pub async fn finish_with(
        self,
        session: &mut EditorSession,
        resolver: &WidgetResolver,
    ) -> BuilderResult<DropOutcome> {
        let (widget, point) = match (self.source, self.candidate) {
            (DragSource::Widget(widget), Some(point)) => (widget, point),
            (DragSource::Widget(_), None) => {
                tracing::debug!("drag cancelled without a drop point");
                return Ok(DropOutcome::Cancelled);
            }
            (source, candidate) => return Self { source, candidate }.finish(session),
        };

        let definition = resolver.resolve_widget(&widget).await?;

        let source = DragSource::Widget(widget.clone());
        if !accepts(&source, session, point.parent_id.as_str()) {
            tracing::warn!(parent = %point.parent_id, "drop target changed during fetch");
            return Ok(DropOutcome::Cancelled);
        }
        let id = session.instantiate_widget(
            point.parent_id.as_str(),
            point.index,
            widget,
            definition,
        )?;
        Ok(DropOutcome::Instantiated(id))
    }
}

fn accepts(source: &DragSource, session: &EditorSession, target: &str) -> bool {
    let document = session.document();
    let Some(parent) = document.get(target) else {
        return false;
    };
    if !parent.supports_children() {
        return false;
    }
    match source {
        DragSource::Existing { id, .. } => {
            let id = id.as_str();
            document.contains(id)
                && id != document.root_id().as_str()
                && id != target
                && !document.is_descendant(target, id)
                && (parent.references(id) || parent.can_accept_child())
        }
        DragSource::Palette(_) | DragSource::Widget(_) => parent.can_accept_child(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::error::{BuilderError, ServiceError};
    use crate::node::ComponentNode;
    use crate::session::BuilderConfig;
    use crate::widget::{WidgetCacheConfig, WidgetDefinition, WidgetService};
    use async_trait::async_trait;
    use std::sync::Arc;

    struct StaticService;

    #[async_trait]
    impl WidgetService for StaticService {
        async fn get_widget(&self, widget: &WidgetRef) -> Result<WidgetDefinition, ServiceError> {
            if widget.widget_id == "missing" {
                return Err(ServiceError::NotFound(widget.cache_key()));
            }
            Ok(WidgetDefinition::new(&widget.widget_id, "Widget", "w-root"))
        }
    }

    fn session() -> EditorSession {
        let document = Document::from_nodes(
            vec![
                ComponentNode::with_defaults("root", ComponentKind::Column)
                    .with_children(["row", "t3"]),
                ComponentNode::with_defaults("row", ComponentKind::Row).with_children(["t1", "t2"]),
                ComponentNode::with_defaults("t1", ComponentKind::Text),
                ComponentNode::with_defaults("t2", ComponentKind::Text),
                ComponentNode::with_defaults("t3", ComponentKind::Text),
            ],
            NodeId::from("root"),
        );
        EditorSession::with_document(document, BuilderConfig::default())
    }

    fn resolver() -> WidgetResolver {
        WidgetResolver::new(Arc::new(StaticService), WidgetCacheConfig::default())
    }

    fn children(session: &EditorSession, id: &str) -> Vec<String> {
        session
            .document()
            .get(id)
            .map(|node| node.child_ids().into_iter().map(str::to_string).collect())
            .unwrap_or_default()
    }

    fn existing(id: &str) -> DragSource {
        DragSource::Existing {
            id: NodeId::from(id),
            from_parent: None,
        }
    }

    #[test]
    fn test_start_looks_up_parent() {
        let session = session();
        let drag = DragTransaction::start(&session, existing("t2"));
        assert_eq!(
            drag.source(),
            &DragSource::Existing {
                id: NodeId::from("t2"),
                from_parent: Some(NodeId::from("row")),
            }
        );
    }

    #[test]
    fn test_over_does_not_mutate() {
        let session = session();
        let before = session.document().clone();
        let mut drag = DragTransaction::start(&session, existing("row"));
        assert!(drag.over(&session, "root", Some(0)));
        assert!(!drag.over(&session, "row", None));
        assert!(!drag.over(&session, "t1", None));
        assert!(!drag.over(&session, "ghost", None));
        assert_eq!(
            drag.candidate(),
            Some(&DropPoint {
                parent_id: NodeId::from("root"),
                index: Some(0),
            })
        );
        assert_eq!(session.document(), &before);
    }

    #[test]
    fn test_finish_moves_once() {
        let mut session = session();
        let mut drag = DragTransaction::start(&session, existing("t3"));
        drag.over(&session, "row", Some(1));
        let outcome = drag.finish(&mut session).expect("should drop");
        assert_eq!(outcome, DropOutcome::Moved(NodeId::from("t3")));
        assert_eq!(children(&session, "row"), vec!["t1", "t3", "t2"]);
        assert_eq!(children(&session, "root"), vec!["row"]);
        assert_eq!(session.history().undo_depth(), 1);
    }

    #[test]
    fn test_finish_palette_inserts() {
        let mut session = session();
        let mut drag = DragTransaction::start(&session, DragSource::Palette(ComponentKind::Image));
        assert!(drag.over(&session, "row", None));
        let DropOutcome::Inserted(id) = drag.finish(&mut session).expect("should drop") else {
            panic!("expected an insert");
        };
        assert_eq!(children(&session, "row").last(), Some(&id.to_string()));
    }

    #[test]
    fn test_finish_without_point_cancels() {
        let mut session = session();
        let drag = DragTransaction::start(&session, existing("t1"));
        assert_eq!(
            drag.finish(&mut session).expect("should cancel"),
            DropOutcome::Cancelled
        );
        assert!(!session.can_undo());
    }

    #[tokio::test]
    async fn test_widget_drop_instantiates() {
        let mut session = session();
        let widget = WidgetRef::new("app", "hero");
        let mut drag = DragTransaction::start(&session, DragSource::Widget(widget.clone()));
        assert!(drag.over(&session, "root", Some(0)));
        let outcome = drag
            .finish_with(&mut session, &resolver())
            .await
            .expect("should drop");
        let DropOutcome::Instantiated(id) = outcome else {
            panic!("expected an instance");
        };
        assert_eq!(children(&session, "root")[0], id.to_string());
        let node = session.document().get(id.as_str()).expect("should exist");
        let instance = node.widget_instance_id().expect("instance id");
        assert_eq!(
            session.widget_snapshot(instance).map(|s| &s.widget_ref),
            Some(&widget)
        );
    }

    #[tokio::test]
    async fn test_widget_fetch_failure_leaves_session() {
        let mut session = session();
        let before = session.document().clone();
        let mut drag =
            DragTransaction::start(&session, DragSource::Widget(WidgetRef::new("app", "missing")));
        drag.over(&session, "root", None);
        let err = drag
            .finish_with(&mut session, &resolver())
            .await
            .expect_err("fetch should fail");
        assert!(matches!(err, BuilderError::Service(ServiceError::NotFound(_))));
        assert_eq!(session.document(), &before);
        assert!(session.widget_refs().is_empty());
        assert!(!session.can_undo());
    }
}
