//! Layer panel: a topmost-first list view over the scene that routes row
//! actions back into the editor.

use serde::{Deserialize, Serialize};

use crate::editor::SceneEditor;
use crate::event::EditorEvent;
use crate::{ObjectId, Scene, StudioResult};

/// One row of the layer list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerRow {
    /// Object shown by this row.
    pub id: ObjectId,
    /// Display name (falls back to the kind label).
    pub name: String,
    /// Kind label, e.g. `text` or `icon-vector`.
    pub kind_label: String,
    /// Whether the object is rendered.
    pub visible: bool,
    /// Whether the object is locked.
    pub locked: bool,
    /// Whether the object is part of the active selection.
    pub selected: bool,
}

/// User intent on a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "id", rename_all = "snake_case")]
pub enum LayerAction {
    /// Make the object the sole selection.
    Select(ObjectId),
    /// Lock or unlock.
    ToggleLock(ObjectId),
    /// Show or hide.
    ToggleVisibility(ObjectId),
    /// Delete the object.
    Delete(ObjectId),
    /// One step up in the stack (up in the list).
    MoveUp(ObjectId),
    /// One step down in the stack, never below the background.
    MoveDown(ObjectId),
}

/// Derive layer rows: background excluded, topmost object first.
#[must_use]
pub fn project(scene: &Scene) -> Vec<LayerRow> {
    let selection = scene.selection();
    scene
        .layers()
        .map(|object| LayerRow {
            id: object.id,
            name: object.display_name().to_string(),
            kind_label: object.kind.label().to_string(),
            visible: object.visible,
            locked: object.is_locked(),
            selected: selection.contains(&object.id),
        })
        .rev()
        .collect()
}

/// Cached projection, refreshed from editor events.
#[derive(Debug, Clone, Default)]
pub struct LayerPanel {
    rows: Vec<LayerRow>,
    stale: bool,
}

impl LayerPanel {
    /// Build a panel for the current scene.
    #[must_use]
    pub fn new(scene: &Scene) -> Self {
        Self {
            rows: project(scene),
            stale: false,
        }
    }

    /// Current rows, topmost first.
    #[must_use]
    pub fn rows(&self) -> &[LayerRow] {
        &self.rows
    }

    /// Whether an event since the last refresh invalidated the rows.
    #[must_use]
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// Record an editor event.
    pub fn observe(&mut self, event: &EditorEvent) {
        self.stale |= event.affects_layers();
    }

    /// Re-derive rows from the scene.
    pub fn refresh(&mut self, scene: &Scene) {
        self.rows = project(scene);
        self.stale = false;
    }

    /// Route a row action to the editor, then refresh.
    ///
    /// # Errors
    ///
    /// Returns an error if the row's object no longer exists.
    pub fn dispatch(&mut self, editor: &mut SceneEditor, action: LayerAction) -> StudioResult<()> {
        match action {
            LayerAction::Select(id) => {
                editor.select(id);
            }
            LayerAction::ToggleLock(id) => {
                editor.toggle_lock(id)?;
            }
            LayerAction::ToggleVisibility(id) => {
                editor.toggle_visibility(id)?;
            }
            LayerAction::Delete(id) => {
                editor.delete_object(id)?;
            }
            LayerAction::MoveUp(id) => {
                editor.move_forward(id)?;
            }
            LayerAction::MoveDown(id) => {
                editor.move_backward(id)?;
            }
        }
        self.refresh(editor.scene());
        Ok(())
    }
}
