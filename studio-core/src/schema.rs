//! Persisted layout format shared by project storage and the CLI.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::element::{Geometry, ObjectKind, ObjectMetadata};
use crate::{ObjectId, Scene, SceneObject, StudioError, StudioResult};

/// Current layout format version.
pub const LAYOUT_VERSION: u32 = 1;

/// Document-friendly object description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectDocument {
    /// Object identifier.
    pub id: String,
    /// Object content.
    pub kind: ObjectKind,
    /// Position, scale and rotation.
    #[serde(default)]
    pub geometry: Geometry,
    /// Lock flag (inverted).
    #[serde(default = "ObjectDocument::default_flag")]
    pub selectable: bool,
    /// Visibility flag.
    #[serde(default = "ObjectDocument::default_flag")]
    pub visible: bool,
    /// Name, background marker and gradient parameters.
    #[serde(default)]
    pub metadata: ObjectMetadata,
}

impl From<&SceneObject> for ObjectDocument {
    fn from(object: &SceneObject) -> Self {
        Self {
            id: object.id.to_string(),
            kind: object.kind.clone(),
            geometry: object.geometry,
            selectable: object.selectable,
            visible: object.visible,
            metadata: object.metadata.clone(),
        }
    }
}

impl ObjectDocument {
    const fn default_flag() -> bool {
        true
    }

    fn is_background(&self) -> bool {
        self.metadata.is_background || self.kind.is_background_kind()
    }

    /// Convert document to a runtime object, keeping its ID.
    ///
    /// # Errors
    ///
    /// Returns [`StudioError::CorruptLayout`] if the ID is not a valid UUID.
    pub fn into_object(self) -> StudioResult<SceneObject> {
        let id = ObjectId::parse(&self.id)
            .map_err(|e| StudioError::CorruptLayout(format!("invalid id {:?}: {e}", self.id)))?;
        let mut object = SceneObject::new(self.kind)
            .with_geometry(self.geometry)
            .with_metadata(self.metadata);
        object.id = id;
        object.selectable = self.selectable;
        object.visible = self.visible;
        Ok(object)
    }
}

/// Canvas metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasDocument {
    /// Width in scene units.
    pub width: f32,
    /// Height in scene units.
    pub height: f32,
    /// Color painted under every object.
    #[serde(default = "CanvasDocument::default_background_color")]
    pub background_color: String,
}

impl CanvasDocument {
    fn default_background_color() -> String {
        "#000000".to_string()
    }
}

impl From<&Scene> for CanvasDocument {
    fn from(scene: &Scene) -> Self {
        Self {
            width: scene.width,
            height: scene.height,
            background_color: scene.background_color.clone(),
        }
    }
}

/// Canonical layout document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDocument {
    /// Format version.
    pub version: u32,
    /// Canvas metadata.
    pub canvas: CanvasDocument,
    /// Objects in stacking order, bottom first, background included.
    pub objects: Vec<ObjectDocument>,
}

impl SceneDocument {
    /// Build a document from a runtime scene.
    #[must_use]
    pub fn from_scene(scene: &Scene) -> Self {
        Self {
            version: LAYOUT_VERSION,
            canvas: CanvasDocument::from(scene),
            objects: scene.objects().map(ObjectDocument::from).collect(),
        }
    }

    /// Materialize a scene from this document.
    ///
    /// The scene is built from scratch, so a failure leaves no partial
    /// state behind. A background stored above index 0 is moved down.
    ///
    /// # Errors
    ///
    /// Returns [`StudioError::CorruptLayout`] if the version is unsupported,
    /// the canvas size is not positive, IDs repeat, or more than one
    /// background is present.
    pub fn into_scene(self) -> StudioResult<Scene> {
        if self.version != LAYOUT_VERSION {
            return Err(StudioError::CorruptLayout(format!(
                "unsupported layout version {}",
                self.version
            )));
        }
        let (width, height) = (self.canvas.width, self.canvas.height);
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(StudioError::CorruptLayout(format!(
                "invalid canvas size {width}x{height}"
            )));
        }

        let mut objects = Vec::with_capacity(self.objects.len());
        let mut background = None;
        for doc in self.objects {
            let is_background = doc.is_background();
            let object = doc.into_object()?;
            if is_background {
                if background.is_some() {
                    return Err(StudioError::CorruptLayout(
                        "more than one background object".to_string(),
                    ));
                }
                background = Some(object);
            } else {
                objects.push(object);
            }
        }

        let mut seen = HashSet::new();
        let mut duplicate = None;
        for object in background.iter().chain(objects.iter()) {
            object.for_each_id(&mut |id| {
                if !seen.insert(id) {
                    duplicate.get_or_insert(id);
                }
            });
            if let ObjectKind::Group { members } = &object.kind {
                if members.iter().any(SceneObject::is_background) {
                    return Err(StudioError::CorruptLayout(
                        "background object inside a group".to_string(),
                    ));
                }
            }
        }
        if let Some(id) = duplicate {
            return Err(StudioError::CorruptLayout(format!("duplicate object id {id}")));
        }

        let mut scene = Scene::new(width, height);
        scene.background_color = self.canvas.background_color;
        if let Some(bg) = background {
            scene.set_background(bg);
        }
        for object in objects {
            scene
                .insert(object)
                .map_err(|e| StudioError::CorruptLayout(e.to_string()))?;
        }
        Ok(scene)
    }

    /// Serialize to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> StudioResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Serialize to indented JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> StudioResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON does not describe a layout.
    pub fn from_json(json: &str) -> StudioResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
