//! Scene editor: the command layer that creates, mutates, reorders and
//! queries a [`Scene`].
//!
//! Operations that target the active selection silently do nothing when
//! nothing is selected. Every selection change and every modification is
//! reported synchronously to listeners registered with
//! [`SceneEditor::on_event`].

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::element::{Bounds, Geometry, ObjectKind, ObjectMetadata, RasterImage, VectorGraphic};
use crate::event::{EditorEvent, Listeners};
use crate::schema::SceneDocument;
use crate::style::{
    gradient_coords, Fill, GradientParams, LinearGradient, PaintFirst, Shadow, ShadowPatch,
    TextAlign, TextStyle, TextStylePatch, HORIZONTAL_GRADIENT_ANGLE,
};
use crate::{ObjectId, Scene, SceneObject, StudioError, StudioResult};

/// Content of a freshly added text object ("new text").
pub const DEFAULT_TEXT: &str = "טקסט חדש";

/// Offset applied to both axes of a cloned object.
pub const CLONE_OFFSET: f32 = 20.0;

/// Longest side of an inserted image after scaling.
pub const IMAGE_FIT_SIZE: f32 = 300.0;

/// Longest side of an inserted icon after scaling.
pub const ICON_FIT_SIZE: f32 = 200.0;

/// Foreground color given to inserted icons.
pub const ICON_COLOR: &str = "#ffffff";

const TEXT_POSITION: (f32, f32) = (100.0, 100.0);
const IMAGE_POSITION: (f32, f32) = (100.0, 100.0);
const ICON_POSITION: (f32, f32) = (150.0, 150.0);

const AUTO_DESIGN_FILL: &str = "#FFFFFF";
const AUTO_DESIGN_STROKE: &str = "#000000";

/// Canvas edge or centerline to align against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    /// Flush with the left edge.
    Left,
    /// Horizontally centered.
    Center,
    /// Flush with the right edge.
    Right,
    /// Flush with the top edge.
    Top,
    /// Vertically centered.
    Middle,
    /// Flush with the bottom edge.
    Bottom,
}

/// Case transform applied to text content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextTransform {
    /// ALL CAPS.
    Uppercase,
    /// all lower case.
    Lowercase,
    /// First Letter Of Each Word.
    Capitalize,
}

impl TextTransform {
    /// Apply the transform to `text`.
    #[must_use]
    pub fn apply(self, text: &str) -> String {
        match self {
            Self::Uppercase => text.to_uppercase(),
            Self::Lowercase => text.to_lowercase(),
            Self::Capitalize => {
                let mut out = String::with_capacity(text.len());
                let mut at_word_start = true;
                for c in text.chars() {
                    if at_word_start {
                        out.extend(c.to_uppercase());
                    } else {
                        out.push(c);
                    }
                    at_word_start = c.is_whitespace();
                }
                out
            }
        }
    }
}

/// A single-field mutation for [`SceneEditor::update_property`].
///
/// Text-only fields are ignored on other kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", content = "value", rename_all = "camelCase")]
pub enum Property {
    /// Solid fill color. Clears any gradient.
    Fill(String),
    /// Stroke color, `None` to remove the stroke.
    Stroke(Option<String>),
    /// Stroke width.
    StrokeWidth(f32),
    /// Paint order of fill and stroke.
    PaintFirst(PaintFirst),
    /// Font family.
    FontFamily(String),
    /// Font size.
    FontSize(f32),
    /// Font weight.
    FontWeight(u16),
    /// Text alignment.
    TextAlign(TextAlign),
    /// Literal text content.
    Text(String),
    /// Left edge.
    Left(f32),
    /// Top edge.
    Top(f32),
    /// Horizontal scale.
    ScaleX(f32),
    /// Vertical scale.
    ScaleY(f32),
    /// Rotation in degrees.
    Angle(f32),
    /// Visibility.
    Visible(bool),
    /// Display name.
    Name(String),
}

/// Position of an auto-design element, in percent of the canvas.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelativePosition {
    /// Horizontal center, percent of canvas width.
    #[serde(default)]
    pub x_percent: Option<f32>,
    /// Vertical center, percent of canvas height.
    #[serde(default)]
    pub y_percent: Option<f32>,
}

/// Style of an auto-design element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelativeTextStyle {
    /// Font size in percent of canvas height.
    #[serde(rename = "fontSize_percent_of_height", default)]
    pub font_size_percent_of_height: Option<f32>,
    /// Fill color.
    #[serde(default)]
    pub fill: Option<String>,
}

/// A text placement proposed by the auto-design service.
///
/// Every field is optional on the wire; incomplete elements are skipped by
/// [`SceneEditor::apply_auto_design`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AutoDesignElement {
    /// Element type; only `"text"` is placed.
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    /// Text content.
    #[serde(default)]
    pub content: Option<String>,
    /// Relative position.
    #[serde(default)]
    pub position: Option<RelativePosition>,
    /// Relative style.
    #[serde(default)]
    pub style: Option<RelativeTextStyle>,
}

struct Placement<'a> {
    content: &'a str,
    x_percent: f32,
    y_percent: f32,
    font_percent: f32,
    fill: Option<&'a str>,
}

impl AutoDesignElement {
    /// A complete text element.
    #[must_use]
    pub fn text(
        content: impl Into<String>,
        x_percent: f32,
        y_percent: f32,
        font_size_percent: f32,
        fill: Option<&str>,
    ) -> Self {
        Self {
            kind: Some("text".to_string()),
            content: Some(content.into()),
            position: Some(RelativePosition {
                x_percent: Some(x_percent),
                y_percent: Some(y_percent),
            }),
            style: Some(RelativeTextStyle {
                font_size_percent_of_height: Some(font_size_percent),
                fill: fill.map(str::to_string),
            }),
        }
    }

    /// Whether this element carries everything needed to place it.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        self.placement().is_some()
    }

    fn placement(&self) -> Option<Placement<'_>> {
        if self.kind.as_deref() != Some("text") {
            return None;
        }
        let content = self.content.as_deref().filter(|c| !c.trim().is_empty())?;
        let position = self.position.as_ref()?;
        let style = self.style.as_ref()?;
        Some(Placement {
            content,
            x_percent: position.x_percent.filter(|v| v.is_finite())?,
            y_percent: position.y_percent.filter(|v| v.is_finite())?,
            font_percent: style
                .font_size_percent_of_height
                .filter(|v| v.is_finite() && *v > 0.0)?,
            fill: style.fill.as_deref(),
        })
    }
}

/// The command layer over a scene.
#[derive(Debug, Default)]
pub struct SceneEditor {
    scene: Scene,
    listeners: Listeners<EditorEvent>,
}

impl SceneEditor {
    /// Create an editor over an empty canvas.
    #[must_use]
    pub fn new(width: f32, height: f32) -> Self {
        Self::with_scene(Scene::new(width, height))
    }

    /// Create an editor over an existing scene.
    #[must_use]
    pub fn with_scene(scene: Scene) -> Self {
        Self {
            scene,
            listeners: Listeners::new(),
        }
    }

    /// The scene being edited.
    #[must_use]
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Register a listener for editor events.
    pub fn on_event(&mut self, listener: impl Fn(&EditorEvent) + Send + Sync + 'static) {
        self.listeners.subscribe(listener);
    }

    fn emit(&self, event: EditorEvent) {
        self.listeners.emit(&event);
    }

    fn emit_selection(&self) {
        self.emit(EditorEvent::SelectionChanged(self.scene.selection().to_vec()));
    }

    /// Selected IDs sorted bottom to top.
    fn ordered_selection(&self) -> Vec<ObjectId> {
        let mut ids = self.scene.selection().to_vec();
        ids.sort_by_key(|&id| self.scene.index_of(id).unwrap_or(usize::MAX));
        ids
    }

    fn selected_text_ids(&self) -> Vec<ObjectId> {
        self.scene
            .active_objects()
            .filter(|o| o.kind.is_text())
            .map(|o| o.id)
            .collect()
    }

    /// A non-background object, for per-object commands.
    fn layer_mut(&mut self, id: ObjectId) -> StudioResult<&mut SceneObject> {
        let object = self
            .scene
            .get_mut(id)
            .ok_or_else(|| StudioError::ObjectNotFound(id.to_string()))?;
        if object.is_background() {
            return Err(StudioError::InvalidOperation(
                "the background cannot be edited".to_string(),
            ));
        }
        Ok(object)
    }

    fn add_and_select(&mut self, object: SceneObject) -> StudioResult<ObjectId> {
        let id = self.scene.insert(object)?;
        self.scene.set_selection(&[id]);
        debug!(%id, "object added");
        self.emit(EditorEvent::StackChanged);
        self.emit_selection();
        Ok(id)
    }

    // --- Creation ---

    /// Add a text object with the default style merged with `overrides`,
    /// and select it.
    ///
    /// A gradient-shaped fill override is sized to the new object.
    ///
    /// # Errors
    ///
    /// Returns an error only if the scene rejects the insert.
    pub fn add_text(&mut self, overrides: Option<&TextStylePatch>) -> StudioResult<ObjectId> {
        let mut style = TextStyle::default();
        if let Some(patch) = overrides {
            style.apply_patch(patch);
        }
        let mut object = SceneObject::text(DEFAULT_TEXT, style)
            .with_geometry(Geometry::at(TEXT_POSITION.0, TEXT_POSITION.1));
        if let Some(spec) = overrides.and_then(|p| p.fill.as_ref()) {
            let (width, height) = object.intrinsic_size();
            if let Some((fill, params)) = spec.materialize(width, height) {
                set_text_fill(&mut object, fill, params);
            }
        }
        self.add_and_select(object)
    }

    /// Decode an image, fit it into [`IMAGE_FIT_SIZE`] and select it.
    ///
    /// # Errors
    ///
    /// Returns [`StudioError::Decode`] if the bytes are not a supported image.
    pub fn add_image(&mut self, bytes: &[u8]) -> StudioResult<ObjectId> {
        let image = RasterImage::decode(bytes)?;
        self.add_raster(image)
    }

    /// Like [`SceneEditor::add_image`], from a `data:` URI.
    ///
    /// # Errors
    ///
    /// Returns [`StudioError::Decode`] if the URI or payload is invalid.
    pub fn add_image_data_uri(&mut self, uri: &str) -> StudioResult<ObjectId> {
        let image = RasterImage::from_data_uri(uri)?;
        self.add_raster(image)
    }

    fn add_raster(&mut self, image: RasterImage) -> StudioResult<ObjectId> {
        #[allow(clippy::cast_precision_loss)]
        let longest = image.width.max(image.height) as f32;
        if longest <= 0.0 {
            return Err(StudioError::Decode("image has no pixels".to_string()));
        }
        let object = SceneObject::new(ObjectKind::Image { image })
            .with_geometry(
                Geometry::at(IMAGE_POSITION.0, IMAGE_POSITION.1).with_scale(IMAGE_FIT_SIZE / longest),
            )
            .with_metadata(ObjectMetadata::named("Uploaded image"));
        self.add_and_select(object)
    }

    /// Parse an SVG icon, recolor its filled paths, fit it into
    /// [`ICON_FIT_SIZE`] and select it.
    ///
    /// # Errors
    ///
    /// Returns [`StudioError::Decode`] if the SVG cannot be parsed.
    pub fn add_icon(&mut self, svg: &str) -> StudioResult<ObjectId> {
        let mut graphic = VectorGraphic::parse_svg(svg)?;
        let longest = graphic.width.max(graphic.height);
        if longest <= 0.0 {
            return Err(StudioError::Decode("icon has no size".to_string()));
        }
        graphic.recolor(ICON_COLOR);
        let object = SceneObject::new(ObjectKind::IconVector { graphic })
            .with_geometry(
                Geometry::at(ICON_POSITION.0, ICON_POSITION.1).with_scale(ICON_FIT_SIZE / longest),
            )
            .with_metadata(ObjectMetadata::named("Icon"));
        self.add_and_select(object)
    }

    /// Replace the background with a raster image, cover-fitted and centered.
    ///
    /// # Errors
    ///
    /// Returns [`StudioError::Decode`] if the bytes are not a supported image.
    pub fn set_background_image(&mut self, bytes: &[u8]) -> StudioResult<ObjectId> {
        let image = RasterImage::decode(bytes)?;
        Ok(self.install_background(ObjectKind::BackgroundImage { image }))
    }

    /// Like [`SceneEditor::set_background_image`], from a `data:` URI.
    ///
    /// # Errors
    ///
    /// Returns [`StudioError::Decode`] if the URI or payload is invalid.
    pub fn set_background_data_uri(&mut self, uri: &str) -> StudioResult<ObjectId> {
        let image = RasterImage::from_data_uri(uri)?;
        Ok(self.set_background_raster(image))
    }

    /// Replace the background with an already decoded image.
    pub fn set_background_raster(&mut self, image: RasterImage) -> ObjectId {
        self.install_background(ObjectKind::BackgroundImage { image })
    }

    /// Replace the background with a vector graphic.
    ///
    /// # Errors
    ///
    /// Returns [`StudioError::Decode`] if the SVG cannot be parsed.
    pub fn set_background_vector(&mut self, svg: &str) -> StudioResult<ObjectId> {
        let graphic = VectorGraphic::parse_svg(svg)?;
        Ok(self.install_background(ObjectKind::BackgroundVector { graphic }))
    }

    fn install_background(&mut self, kind: ObjectKind) -> ObjectId {
        let mut metadata = ObjectMetadata::named("Background");
        metadata.is_background = true;
        let mut object = SceneObject::new(kind).with_metadata(metadata);
        fit_cover(&mut object, self.scene.width, self.scene.height);
        let id = object.id;
        self.scene.set_background(object);
        debug!(%id, "background replaced");
        self.emit(EditorEvent::StackChanged);
        id
    }

    /// Place externally proposed text elements. Additive: existing objects
    /// and the selection are untouched. Incomplete elements are skipped.
    pub fn apply_auto_design(&mut self, elements: &[AutoDesignElement]) -> Vec<ObjectId> {
        let (canvas_w, canvas_h) = (self.scene.width, self.scene.height);
        let mut added = Vec::new();

        for (index, element) in elements.iter().enumerate() {
            let Some(placement) = element.placement() else {
                warn!(index, "skipping incomplete auto-design element");
                continue;
            };
            let font_size = placement.font_percent / 100.0 * canvas_h;
            let style = TextStyle {
                fill: Fill::solid(placement.fill.unwrap_or(AUTO_DESIGN_FILL)),
                stroke: Some(AUTO_DESIGN_STROKE.to_string()),
                stroke_width: font_size / 20.0,
                shadow: Some(Shadow {
                    blur: 15.0,
                    ..Shadow::text_default()
                }),
                font_size,
                text_align: TextAlign::Center,
                ..TextStyle::default()
            };
            let mut object = SceneObject::text(placement.content, style);
            let (width, height) = object.intrinsic_size();
            let center_x = placement.x_percent / 100.0 * canvas_w;
            let center_y = placement.y_percent / 100.0 * canvas_h;
            object.geometry = Geometry::at(center_x - width / 2.0, center_y - height / 2.0);

            match self.scene.insert(object) {
                Ok(id) => added.push(id),
                Err(e) => warn!(index, error = %e, "auto-design element rejected"),
            }
        }

        if !added.is_empty() {
            debug!(count = added.len(), "auto-design applied");
            self.emit(EditorEvent::StackChanged);
        }
        added
    }

    // --- Removal and flags ---

    /// Delete every selected object and clear the selection.
    pub fn delete_selected(&mut self) -> Vec<SceneObject> {
        let ids = self.scene.selection().to_vec();
        if ids.is_empty() {
            return Vec::new();
        }
        let removed: Vec<_> = ids
            .into_iter()
            .filter_map(|id| self.scene.remove(id).ok())
            .collect();
        self.scene.clear_selection();
        debug!(count = removed.len(), "selection deleted");
        self.emit(EditorEvent::StackChanged);
        self.emit_selection();
        removed
    }

    /// Delete one object. Clears the selection if the object was selected.
    ///
    /// # Errors
    ///
    /// Returns an error if the object is unknown or is the background.
    pub fn delete_object(&mut self, id: ObjectId) -> StudioResult<SceneObject> {
        self.layer_mut(id)?;
        let was_selected = self.scene.selection().contains(&id);
        let removed = self.scene.remove(id)?;
        debug!(%id, "object deleted");
        self.emit(EditorEvent::StackChanged);
        if was_selected {
            self.scene.clear_selection();
            self.emit_selection();
        }
        Ok(removed)
    }

    /// Flip visibility. Returns the new visibility.
    ///
    /// # Errors
    ///
    /// Returns an error if the object is unknown or is the background.
    pub fn toggle_visibility(&mut self, id: ObjectId) -> StudioResult<bool> {
        let object = self.layer_mut(id)?;
        object.visible = !object.visible;
        let visible = object.visible;
        self.emit(EditorEvent::ObjectModified(id));
        Ok(visible)
    }

    /// Flip the lock. A locked object leaves the selection. Returns whether
    /// the object is now locked.
    ///
    /// # Errors
    ///
    /// Returns an error if the object is unknown or is the background.
    pub fn toggle_lock(&mut self, id: ObjectId) -> StudioResult<bool> {
        let object = self.layer_mut(id)?;
        object.selectable = !object.selectable;
        let locked = object.is_locked();
        self.emit(EditorEvent::ObjectModified(id));

        if locked && self.scene.selection().contains(&id) {
            let remaining: Vec<_> = self
                .scene
                .selection()
                .iter()
                .copied()
                .filter(|&sid| sid != id)
                .collect();
            self.scene.set_selection(&remaining);
            self.emit_selection();
        }
        Ok(locked)
    }

    // --- Stacking ---

    /// Move an object one step up. Returns whether it moved.
    ///
    /// # Errors
    ///
    /// Returns an error if the object is not found.
    pub fn move_forward(&mut self, id: ObjectId) -> StudioResult<bool> {
        let moved = self.scene.swap_forward(id)?;
        if moved {
            self.emit(EditorEvent::StackChanged);
        }
        Ok(moved)
    }

    /// Move an object one step down, never below the background. Returns
    /// whether it moved.
    ///
    /// # Errors
    ///
    /// Returns an error if the object is not found.
    pub fn move_backward(&mut self, id: ObjectId) -> StudioResult<bool> {
        let moved = self.scene.swap_backward(id)?;
        if moved {
            self.emit(EditorEvent::StackChanged);
        }
        Ok(moved)
    }

    /// Duplicate every selected object, offset by [`CLONE_OFFSET`], directly
    /// above its original. The copies become the selection.
    pub fn clone_selected(&mut self) -> Vec<ObjectId> {
        let mut clones = Vec::new();
        for id in self.ordered_selection() {
            let Some(original) = self.scene.get(id) else {
                continue;
            };
            let mut copy = original.duplicate();
            copy.geometry.left += CLONE_OFFSET;
            copy.geometry.top += CLONE_OFFSET;
            match self.scene.insert_above(copy, id) {
                Ok(clone_id) => clones.push(clone_id),
                Err(e) => warn!(%id, error = %e, "clone rejected"),
            }
        }
        if clones.is_empty() {
            return clones;
        }
        self.scene.set_selection(&clones);
        debug!(count = clones.len(), "selection cloned");
        self.emit(EditorEvent::StackChanged);
        self.emit_selection();
        clones
    }

    // --- Styling ---

    /// Set one field on every selected object it applies to. Returns the
    /// number of objects changed.
    pub fn update_property(&mut self, property: &Property) -> usize {
        let mut changed = Vec::new();
        for id in self.scene.selection().to_vec() {
            if let Some(object) = self.scene.get_mut(id) {
                if apply_property(object, property) {
                    changed.push(id);
                }
            }
        }
        self.notify_modified(&changed)
    }

    /// Merge shadow fields onto each selected text object, starting from a
    /// zero shadow when none is set.
    pub fn update_shadow(&mut self, patch: &ShadowPatch) -> usize {
        self.modify_selected_text(|object| {
            if let ObjectKind::Text { style, .. } = &mut object.kind {
                let base = style.shadow.take().unwrap_or_else(Shadow::zero);
                style.shadow = Some(base.merged(patch));
            }
        })
    }

    /// Change the case of each selected text object's content.
    pub fn transform_text(&mut self, transform: TextTransform) -> usize {
        self.modify_selected_text(|object| {
            if let ObjectKind::Text { text, .. } = &mut object.kind {
                *text = transform.apply(text);
            }
        })
    }

    /// Horizontal two-color gradient on the selected text.
    pub fn apply_gradient(&mut self, color1: &str, color2: &str) -> usize {
        self.apply_text_gradient(color1, color2, HORIZONTAL_GRADIENT_ANGLE)
    }

    /// Two-color gradient at `angle` degrees (0 pointing up) on the selected
    /// text. The colors and angle are recorded in the object's metadata.
    pub fn apply_text_gradient(&mut self, color1: &str, color2: &str, angle: f32) -> usize {
        self.modify_selected_text(|object| {
            let (width, height) = object.intrinsic_size();
            let gradient =
                LinearGradient::two_stop(gradient_coords(width, height, angle), color1, color2);
            let params = GradientParams {
                color1: color1.to_string(),
                color2: color2.to_string(),
                angle,
            };
            set_text_fill(object, Fill::Linear(gradient), Some(params));
        })
    }

    /// Gradient parameters recorded for an object, if its fill is a
    /// gradient built by this editor.
    #[must_use]
    pub fn gradient_params(&self, id: ObjectId) -> Option<&GradientParams> {
        self.scene.get(id)?.metadata.gradient.as_ref()
    }

    /// Apply a bundle of style fields to the selected text objects.
    /// Non-text selections are ignored.
    pub fn apply_preset_style(&mut self, preset: &TextStylePatch) -> usize {
        self.modify_selected_text(|object| {
            if let ObjectKind::Text { style, .. } = &mut object.kind {
                style.apply_preset(preset);
            }
            if let Some(spec) = &preset.fill {
                let (width, height) = object.intrinsic_size();
                if let Some((fill, params)) = spec.materialize(width, height) {
                    set_text_fill(object, fill, params);
                }
            }
        })
    }

    fn modify_selected_text(&mut self, mut apply: impl FnMut(&mut SceneObject)) -> usize {
        let ids = self.selected_text_ids();
        for &id in &ids {
            if let Some(object) = self.scene.get_mut(id) {
                apply(object);
            }
        }
        self.notify_modified(&ids)
    }

    fn notify_modified(&self, ids: &[ObjectId]) -> usize {
        for &id in ids {
            self.emit(EditorEvent::ObjectModified(id));
        }
        ids.len()
    }

    // --- Geometry ---

    /// Move the selection flush to a canvas edge or centerline. A
    /// multi-selection moves as one block. Returns whether anything moved.
    pub fn align_selected(&mut self, alignment: Alignment) -> bool {
        let members: Vec<(ObjectId, Bounds)> = self
            .scene
            .active_objects()
            .map(|o| (o.id, o.bounds()))
            .collect();
        let Some(block) = members
            .iter()
            .map(|(_, b)| *b)
            .reduce(|acc, b| acc.union(&b))
        else {
            return false;
        };

        let (canvas_w, canvas_h) = (self.scene.width, self.scene.height);
        let target_left = match alignment {
            Alignment::Left => Some(0.0),
            Alignment::Center => Some((canvas_w - block.width) / 2.0),
            Alignment::Right => Some(canvas_w - block.width),
            _ => None,
        };
        let target_top = match alignment {
            Alignment::Top => Some(0.0),
            Alignment::Middle => Some((canvas_h - block.height) / 2.0),
            Alignment::Bottom => Some(canvas_h - block.height),
            _ => None,
        };

        for (id, bounds) in &members {
            if let Some(object) = self.scene.get_mut(*id) {
                if let Some(left) = target_left {
                    object.geometry.left = left + (bounds.left - block.left);
                }
                if let Some(top) = target_top {
                    object.geometry.top = top + (bounds.top - block.top);
                }
            }
        }
        let ids: Vec<_> = members.into_iter().map(|(id, _)| id).collect();
        self.notify_modified(&ids) > 0
    }

    /// Translate the selection (drag).
    pub fn move_selected(&mut self, dx: f32, dy: f32) -> usize {
        let ids = self.scene.selection().to_vec();
        for &id in &ids {
            if let Some(object) = self.scene.get_mut(id) {
                object.geometry.left += dx;
                object.geometry.top += dy;
            }
        }
        self.notify_modified(&ids)
    }

    /// Resize the canvas and refit the background.
    ///
    /// # Errors
    ///
    /// Returns an error if either dimension is not positive.
    pub fn set_canvas_size(&mut self, width: f32, height: f32) -> StudioResult<()> {
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(StudioError::InvalidOperation(format!(
                "invalid canvas size {width}x{height}"
            )));
        }
        self.scene.width = width;
        self.scene.height = height;
        if let Some(id) = self.scene.background().map(|bg| bg.id) {
            if let Some(background) = self.scene.get_mut(id) {
                fit_cover(background, width, height);
            }
            self.emit(EditorEvent::ObjectModified(id));
        }
        Ok(())
    }

    // --- Selection ---

    /// Make `id` the sole selection. Returns whether it is now selected.
    pub fn select(&mut self, id: ObjectId) -> bool {
        if self.scene.set_selection(&[id]) {
            self.emit_selection();
        }
        self.scene.selection() == [id]
    }

    /// Select several objects. Returns whether the selection changed.
    pub fn select_many(&mut self, ids: &[ObjectId]) -> bool {
        let changed = self.scene.set_selection(ids);
        if changed {
            self.emit_selection();
        }
        changed
    }

    /// Select the topmost object under a point, or clear the selection
    /// when there is none.
    pub fn select_at(&mut self, x: f32, y: f32) -> Option<ObjectId> {
        match self.scene.object_at(x, y) {
            Some(id) => {
                self.select(id);
                Some(id)
            }
            None => {
                self.deselect();
                None
            }
        }
    }

    /// Clear the selection. Returns whether anything was selected.
    pub fn deselect(&mut self) -> bool {
        let changed = self.scene.clear_selection();
        if changed {
            self.emit_selection();
        }
        changed
    }

    // --- Grouping ---

    /// Group the selected objects (two or more) into one object placed at
    /// the lowest member's stacking position.
    pub fn group_selected(&mut self) -> Option<ObjectId> {
        let ids = self.ordered_selection();
        if ids.len() < 2 {
            return None;
        }
        let base = ids.iter().filter_map(|&id| self.scene.index_of(id)).min()?;
        let block = self
            .scene
            .active_objects()
            .map(SceneObject::bounds)
            .reduce(|acc, b| acc.union(&b))?;

        let mut members = Vec::with_capacity(ids.len());
        for id in ids {
            if let Ok(mut member) = self.scene.remove(id) {
                member.geometry.left -= block.left;
                member.geometry.top -= block.top;
                members.push(member);
            }
        }
        let group = SceneObject::new(ObjectKind::Group { members })
            .with_geometry(Geometry::at(block.left, block.top))
            .with_metadata(ObjectMetadata::named("Group"));
        let group_id = match self.scene.insert_at(base, group) {
            Ok(id) => id,
            Err(e) => {
                warn!(error = %e, "group rejected");
                return None;
            }
        };
        self.scene.set_selection(&[group_id]);
        debug!(%group_id, "selection grouped");
        self.emit(EditorEvent::StackChanged);
        self.emit_selection();
        Some(group_id)
    }

    /// Dissolve every selected group, keeping the members' on-canvas
    /// placement. The released members become the selection.
    pub fn ungroup_selected(&mut self) -> Vec<ObjectId> {
        let mut released = Vec::new();
        for id in self.ordered_selection() {
            let is_group = self
                .scene
                .get(id)
                .is_some_and(|o| matches!(o.kind, ObjectKind::Group { .. }));
            let Some(index) = self.scene.index_of(id).filter(|_| is_group) else {
                continue;
            };
            let Ok(group) = self.scene.remove(id) else {
                continue;
            };
            let outer = group.geometry;
            let ObjectKind::Group { members } = group.kind else {
                continue;
            };
            for (offset, mut member) in members.into_iter().enumerate() {
                let inner = member.geometry;
                member.geometry = Geometry {
                    left: outer.left + inner.left * outer.scale_x,
                    top: outer.top + inner.top * outer.scale_y,
                    scale_x: inner.scale_x * outer.scale_x,
                    scale_y: inner.scale_y * outer.scale_y,
                    angle: inner.angle + outer.angle,
                };
                match self.scene.insert_at(index + offset, member) {
                    Ok(member_id) => released.push(member_id),
                    Err(e) => warn!(error = %e, "group member rejected"),
                }
            }
        }
        if !released.is_empty() {
            self.scene.set_selection(&released);
            self.emit(EditorEvent::StackChanged);
            self.emit_selection();
        }
        released
    }

    // --- Persistence ---

    /// Snapshot the scene as a layout document.
    #[must_use]
    pub fn to_document(&self) -> SceneDocument {
        SceneDocument::from_scene(&self.scene)
    }

    /// Serialize the scene as layout JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_layout_json(&self) -> StudioResult<String> {
        self.to_document().to_json()
    }

    /// Replace the scene with a persisted layout. On failure the current
    /// scene is left untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the layout is corrupt.
    pub fn load_layout(&mut self, json: &str) -> StudioResult<()> {
        let document = SceneDocument::from_json(json)?;
        self.load_document(document)
    }

    /// Replace the scene with a layout document.
    ///
    /// # Errors
    ///
    /// Returns [`StudioError::CorruptLayout`] if the document is invalid.
    pub fn load_document(&mut self, document: SceneDocument) -> StudioResult<()> {
        let scene = document.into_scene()?;
        self.scene = scene;
        debug!(objects = self.scene.len(), "layout loaded");
        self.emit(EditorEvent::StackChanged);
        self.emit_selection();
        Ok(())
    }
}

/// Set a text object's fill and keep the gradient metadata in step.
fn set_text_fill(object: &mut SceneObject, fill: Fill, params: Option<GradientParams>) {
    if let ObjectKind::Text { style, .. } = &mut object.kind {
        style.fill = fill;
        object.metadata.gradient = params;
    }
}

/// Scale so the object covers `width` x `height`, centered.
fn fit_cover(object: &mut SceneObject, width: f32, height: f32) {
    let (own_w, own_h) = object.intrinsic_size();
    if own_w <= 0.0 || own_h <= 0.0 {
        return;
    }
    let scale = (width / own_w).max(height / own_h);
    object.geometry = Geometry {
        left: (width - own_w * scale) / 2.0,
        top: (height - own_h * scale) / 2.0,
        ..Geometry::default().with_scale(scale)
    };
}

/// Returns `false` when the property does not apply to the object's kind.
fn apply_property(object: &mut SceneObject, property: &Property) -> bool {
    let geometry = &mut object.geometry;
    match property {
        Property::Left(v) => geometry.left = *v,
        Property::Top(v) => geometry.top = *v,
        Property::ScaleX(v) => geometry.scale_x = *v,
        Property::ScaleY(v) => geometry.scale_y = *v,
        Property::Angle(v) => geometry.angle = *v,
        Property::Visible(v) => object.visible = *v,
        Property::Name(name) => object.metadata.name = Some(name.clone()),
        _ => return apply_text_property(object, property),
    }
    true
}

fn apply_text_property(object: &mut SceneObject, property: &Property) -> bool {
    let ObjectKind::Text { text, style } = &mut object.kind else {
        return false;
    };
    match property {
        Property::Fill(color) => {
            style.fill = Fill::solid(color.clone());
            object.metadata.gradient = None;
        }
        Property::Stroke(color) => style.stroke.clone_from(color),
        Property::StrokeWidth(width) => style.stroke_width = width.max(0.0),
        Property::PaintFirst(order) => style.paint_first = *order,
        Property::FontFamily(family) => style.font_family.clone_from(family),
        Property::FontSize(size) => style.font_size = *size,
        Property::FontWeight(weight) => style.font_weight = *weight,
        Property::TextAlign(align) => style.text_align = *align,
        Property::Text(content) => text.clone_from(content),
        _ => return false,
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::{ColorStop, FillSpec, GradientSpec};
    use std::io::Cursor;
    use std::sync::{Arc, Mutex};

    const ICON_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="40" height="20">
        <path d="M0 0 L10 0 L10 10 Z" fill="#123456"/>
        <path d="M0 0 L20 20" fill="none" stroke="#000000"/>
    </svg>"##;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let image = image::RgbaImage::from_pixel(width, height, image::Rgba([200, 10, 10, 255]));
        let mut out = Cursor::new(Vec::new());
        image
            .write_to(&mut out, image::ImageFormat::Png)
            .expect("encode png");
        out.into_inner()
    }

    fn editor_with_background() -> SceneEditor {
        let mut editor = SceneEditor::new(1280.0, 720.0);
        editor
            .set_background_image(&png_bytes(64, 36))
            .expect("background");
        editor
    }

    fn recorder(editor: &mut SceneEditor) -> Arc<Mutex<Vec<EditorEvent>>> {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        editor.on_event(move |event| sink.lock().expect("lock").push(event.clone()));
        events
    }

    fn text_style(editor: &SceneEditor, id: ObjectId) -> &TextStyle {
        match &editor.scene().get(id).expect("object").kind {
            ObjectKind::Text { style, .. } => style,
            other => panic!("expected text, got {}", other.label()),
        }
    }

    fn text_content(editor: &SceneEditor, id: ObjectId) -> &str {
        match &editor.scene().get(id).expect("object").kind {
            ObjectKind::Text { text, .. } => text,
            other => panic!("expected text, got {}", other.label()),
        }
    }

    #[test]
    fn test_add_text_defaults_and_selection() {
        let mut editor = SceneEditor::new(1280.0, 720.0);
        let events = recorder(&mut editor);
        let id = editor.add_text(None).expect("add");

        let object = editor.scene().get(id).expect("object");
        assert!((object.geometry.left - 100.0).abs() < f32::EPSILON);
        assert!((object.geometry.top - 100.0).abs() < f32::EPSILON);
        let style = text_style(&editor, id);
        assert_eq!(style.fill, Fill::solid("#ffffff"));
        assert_eq!(style.font_weight, 900);
        assert_eq!(style.text_align, TextAlign::Right);
        assert!(style.shadow.is_some());
        assert_eq!(editor.scene().selection(), &[id]);

        let events = events.lock().expect("lock");
        assert_eq!(
            *events,
            vec![
                EditorEvent::StackChanged,
                EditorEvent::SelectionChanged(vec![id])
            ]
        );
    }

    #[test]
    fn test_add_text_materializes_gradient_override() {
        let mut editor = SceneEditor::new(1280.0, 720.0);
        let patch = TextStylePatch {
            fill: Some(FillSpec::Gradient(GradientSpec {
                color_stops: vec![ColorStop::new(1.0, "#0000ff"), ColorStop::new(0.0, "#ff0000")],
                angle: None,
            })),
            font_size: Some(40.0),
            ..TextStylePatch::default()
        };
        let id = editor.add_text(Some(&patch)).expect("add");

        assert!(text_style(&editor, id).fill.is_gradient());
        assert!((text_style(&editor, id).font_size - 40.0).abs() < f32::EPSILON);
        let params = editor.gradient_params(id).expect("params");
        assert_eq!(params.color1, "#ff0000");
        assert_eq!(params.color2, "#0000ff");
    }

    #[test]
    fn test_add_image_fits_longest_side() {
        let mut editor = SceneEditor::new(1280.0, 720.0);
        let id = editor.add_image(&png_bytes(600, 150)).expect("image");
        let object = editor.scene().get(id).expect("object");
        let (w, h) = object.scaled_size();
        assert!((w - 300.0).abs() < 1e-3);
        assert!((h - 75.0).abs() < 1e-3);
        assert_eq!(editor.scene().selection(), &[id]);
    }

    #[test]
    fn test_add_icon_recolors_filled_paths() {
        let mut editor = SceneEditor::new(1280.0, 720.0);
        let id = editor.add_icon(ICON_SVG).expect("icon");
        let object = editor.scene().get(id).expect("object");
        let ObjectKind::IconVector { graphic } = &object.kind else {
            panic!("expected icon");
        };
        assert_eq!(graphic.paths[0].fill.as_deref(), Some(ICON_COLOR));
        assert!(graphic.paths[1].fill.is_none());
        assert!((object.geometry.scale_x - 5.0).abs() < 1e-4);
        assert!((object.geometry.left - 150.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_bad_payloads_leave_scene_untouched() {
        let mut editor = SceneEditor::new(1280.0, 720.0);
        assert!(editor.add_image(b"nope").is_err());
        assert!(editor.add_icon("<svg").is_err());
        assert!(editor.scene().is_empty());
    }

    #[test]
    fn test_background_cover_fit() {
        let editor = editor_with_background();
        let bg = editor.scene().background().expect("background");
        assert!(!bg.selectable);
        let bounds = bg.bounds();
        assert!((bounds.width - 1280.0).abs() < 1e-3);
        assert!((bounds.height - 720.0).abs() < 1e-3);
        assert!(bounds.left.abs() < 1e-3);
    }

    #[test]
    fn test_set_canvas_size_refits_background() {
        let mut editor = editor_with_background();
        editor.set_canvas_size(720.0, 720.0).expect("resize");
        let bounds = editor.scene().background().expect("background").bounds();
        assert!((bounds.height - 720.0).abs() < 1e-3);
        assert!((bounds.left + (bounds.width - 720.0) / 2.0).abs() < 1e-3);
        assert!(editor.set_canvas_size(0.0, 10.0).is_err());
    }

    #[test]
    fn test_auto_design_places_centered_text() {
        let mut editor = SceneEditor::new(1000.0, 500.0);
        let before = editor.scene().selection().to_vec();
        let added = editor.apply_auto_design(&[
            AutoDesignElement::text("WOW", 50.0, 20.0, 10.0, None),
            AutoDesignElement {
                kind: Some("text".to_string()),
                content: Some("no position".to_string()),
                ..AutoDesignElement::default()
            },
            AutoDesignElement {
                kind: Some("shape".to_string()),
                ..AutoDesignElement::text("x", 1.0, 1.0, 1.0, None)
            },
        ]);
        assert_eq!(added.len(), 1);
        assert_eq!(editor.scene().selection(), before.as_slice());

        let object = editor.scene().get(added[0]).expect("object");
        let style = text_style(&editor, added[0]);
        assert!((style.font_size - 50.0).abs() < 1e-4);
        assert!((style.stroke_width - 2.5).abs() < 1e-4);
        assert_eq!(style.stroke.as_deref(), Some("#000000"));
        assert_eq!(style.fill, Fill::solid("#FFFFFF"));
        let bounds = object.bounds();
        assert!((bounds.left + bounds.width / 2.0 - 500.0).abs() < 1e-3);
        assert!((bounds.top + bounds.height / 2.0 - 100.0).abs() < 1e-3);
    }

    #[test]
    fn test_delete_selected_and_noop() {
        let mut editor = editor_with_background();
        assert!(editor.delete_selected().is_empty());

        let a = editor.add_text(None).expect("add");
        let removed = editor.delete_selected();
        assert_eq!(removed.len(), 1);
        assert!(editor.scene().get(a).is_none());
        assert!(editor.scene().selection().is_empty());
        assert!(editor.scene().background().is_some());
    }

    #[test]
    fn test_delete_object_rejects_background() {
        let mut editor = editor_with_background();
        let bg = editor.scene().background().expect("bg").id;
        assert!(matches!(
            editor.delete_object(bg),
            Err(StudioError::InvalidOperation(_))
        ));
        assert!(matches!(
            editor.delete_object(ObjectId::new()),
            Err(StudioError::ObjectNotFound(_))
        ));
    }

    #[test]
    fn test_lock_removes_from_selection() {
        let mut editor = editor_with_background();
        let id = editor.add_text(None).expect("add");
        assert!(editor.toggle_lock(id).expect("lock"));
        assert!(editor.scene().selection().is_empty());
        assert!(!editor.select(id));
        assert!(editor.scene().get(id).expect("object").visible);

        assert!(!editor.toggle_lock(id).expect("unlock"));
        assert!(editor.select(id));
    }

    #[test]
    fn test_hidden_object_stays_selectable() {
        let mut editor = editor_with_background();
        let id = editor.add_text(None).expect("add");
        editor.deselect();
        assert!(!editor.toggle_visibility(id).expect("hide"));
        assert!(editor.select(id));
    }

    #[test]
    fn test_move_backward_stops_above_background() {
        let mut editor = editor_with_background();
        let a = editor.add_text(None).expect("add");
        let b = editor.add_text(None).expect("add");

        assert!(!editor.move_backward(a).expect("move"));
        assert_eq!(editor.scene().index_of(a), Some(1));

        assert!(editor.move_backward(b).expect("move"));
        assert_eq!(editor.scene().index_of(b), Some(1));
        assert!(editor.move_forward(b).expect("move"));
        assert_eq!(editor.scene().index_of(b), Some(2));
    }

    #[test]
    fn test_clone_single_text() {
        let mut editor = editor_with_background();
        let a = editor.add_text(None).expect("add");
        let _top = editor.add_text(None).expect("add");
        editor.select(a);

        let clones = editor.clone_selected();
        assert_eq!(clones.len(), 1);
        let copy = editor.scene().get(clones[0]).expect("copy");
        let original = editor.scene().get(a).expect("original");
        assert_ne!(copy.id, original.id);
        assert_eq!(copy.kind, original.kind);
        assert!((copy.geometry.left - original.geometry.left - CLONE_OFFSET).abs() < f32::EPSILON);
        assert!((copy.geometry.top - original.geometry.top - CLONE_OFFSET).abs() < f32::EPSILON);
        assert_eq!(editor.scene().index_of(clones[0]), Some(2));
        assert_eq!(editor.scene().selection(), clones.as_slice());
    }

    #[test]
    fn test_clone_multi_selection() {
        let mut editor = editor_with_background();
        let a = editor.add_text(None).expect("add");
        let b = editor.add_text(None).expect("add");
        editor.select_many(&[b, a]);

        let clones = editor.clone_selected();
        assert_eq!(clones.len(), 2);
        assert_eq!(editor.scene().index_of(a), Some(1));
        assert_eq!(editor.scene().index_of(clones[0]), Some(2));
        assert_eq!(editor.scene().index_of(b), Some(3));
        assert_eq!(editor.scene().index_of(clones[1]), Some(4));
        assert_eq!(editor.scene().selection().len(), 2);
    }

    #[test]
    fn test_update_property_respects_kind() {
        let mut editor = SceneEditor::new(1280.0, 720.0);
        assert_eq!(editor.update_property(&Property::FontSize(10.0)), 0);

        let image = editor.add_image(&png_bytes(10, 10)).expect("image");
        assert_eq!(editor.update_property(&Property::FontSize(10.0)), 0);
        assert_eq!(editor.update_property(&Property::Left(5.0)), 1);
        assert!((editor.scene().get(image).expect("image").geometry.left - 5.0).abs() < f32::EPSILON);

        let text = editor.add_text(None).expect("text");
        editor.apply_gradient("#000", "#fff");
        assert!(editor.gradient_params(text).is_some());
        assert_eq!(editor.update_property(&Property::Fill("#00ff00".to_string())), 1);
        assert_eq!(text_style(&editor, text).fill, Fill::solid("#00ff00"));
        assert!(editor.gradient_params(text).is_none());
    }

    #[test]
    fn test_property_wire_format() {
        let property: Property =
            serde_json::from_str(r#"{"name":"strokeWidth","value":4}"#).expect("parse");
        assert_eq!(property, Property::StrokeWidth(4.0));
    }

    #[test]
    fn test_update_shadow_starts_from_zero() {
        let mut editor = SceneEditor::new(1280.0, 720.0);
        let id = editor.add_text(None).expect("add");
        editor.update_property(&Property::Text("x".to_string()));
        if let Some(object) = editor.scene.get_mut(id) {
            if let ObjectKind::Text { style, .. } = &mut object.kind {
                style.shadow = None;
            }
        }
        let patch = ShadowPatch {
            blur: Some(12.0),
            ..ShadowPatch::default()
        };
        assert_eq!(editor.update_shadow(&patch), 1);
        let shadow = text_style(&editor, id).shadow.clone().expect("shadow");
        assert_eq!(shadow.color, "#000000");
        assert!((shadow.blur - 12.0).abs() < f32::EPSILON);
        assert!(shadow.offset_x.abs() < f32::EPSILON);
    }

    #[test]
    fn test_transform_text_modes() {
        let mut editor = SceneEditor::new(1280.0, 720.0);
        let id = editor.add_text(None).expect("add");
        editor.update_property(&Property::Text("hello big world".to_string()));

        editor.transform_text(TextTransform::Capitalize);
        assert_eq!(text_content(&editor, id), "Hello Big World");
        editor.transform_text(TextTransform::Uppercase);
        assert_eq!(text_content(&editor, id), "HELLO BIG WORLD");
        editor.transform_text(TextTransform::Lowercase);
        assert_eq!(text_content(&editor, id), "hello big world");

        editor.add_icon(ICON_SVG).expect("icon");
        assert_eq!(editor.transform_text(TextTransform::Uppercase), 0);
    }

    #[test]
    fn test_text_gradient_metadata_survives_reselect() {
        let mut editor = editor_with_background();
        let id = editor.add_text(None).expect("add");
        editor.apply_text_gradient("#ff0000", "#00ff00", 45.0);
        editor.deselect();
        editor.select(id);

        let params = editor.gradient_params(id).expect("params");
        assert_eq!(params.color1, "#ff0000");
        assert_eq!(params.color2, "#00ff00");
        assert!((params.angle - 45.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_preset_ignored_on_images() {
        let mut editor = SceneEditor::new(1280.0, 720.0);
        editor.add_image(&png_bytes(10, 10)).expect("image");
        let preset = TextStylePatch {
            stroke: Some("#ff00ff".to_string()),
            ..TextStylePatch::default()
        };
        assert_eq!(editor.apply_preset_style(&preset), 0);

        let text = editor.add_text(None).expect("text");
        assert_eq!(editor.apply_preset_style(&preset), 1);
        assert_eq!(text_style(&editor, text).stroke.as_deref(), Some("#ff00ff"));
    }

    #[test]
    #[allow(clippy::float_cmp)]
    fn test_align_right_is_exact() {
        let mut editor = SceneEditor::new(1280.0, 720.0);
        let id = editor.add_image(&png_bytes(90, 30)).expect("image");
        editor.update_property(&Property::ScaleX(1.7));
        assert!(editor.align_selected(Alignment::Right));

        let object = editor.scene().get(id).expect("object");
        let (width, _) = object.scaled_size();
        assert_eq!(object.geometry.left, 1280.0 - width);
    }

    #[test]
    fn test_align_block_keeps_relative_offsets() {
        let mut editor = SceneEditor::new(1000.0, 500.0);
        let a = editor.add_image(&png_bytes(100, 100)).expect("a");
        let b = editor.add_image(&png_bytes(100, 100)).expect("b");
        editor.select(b);
        editor.update_property(&Property::Left(400.0));
        editor.select_many(&[a, b]);

        assert!(editor.align_selected(Alignment::Left));
        let left_a = editor.scene().get(a).expect("a").geometry.left;
        let left_b = editor.scene().get(b).expect("b").geometry.left;
        assert!(left_a.abs() < f32::EPSILON);
        assert!((left_b - 300.0).abs() < 1e-4);

        editor.deselect();
        assert!(!editor.align_selected(Alignment::Top));
    }

    #[test]
    fn test_select_at_and_deselect_events() {
        let mut editor = editor_with_background();
        let id = editor.add_text(None).expect("add");
        editor.deselect();
        let events = recorder(&mut editor);

        assert_eq!(editor.select_at(110.0, 110.0), Some(id));
        assert_eq!(editor.select_at(5.0, 700.0), None);
        assert!(editor.scene().selection().is_empty());

        let events = events.lock().expect("lock");
        assert_eq!(
            *events,
            vec![
                EditorEvent::SelectionChanged(vec![id]),
                EditorEvent::SelectionChanged(vec![])
            ]
        );
    }

    #[test]
    fn test_group_and_ungroup_preserve_placement() {
        let mut editor = editor_with_background();
        let a = editor.add_image(&png_bytes(100, 100)).expect("a");
        let b = editor.add_image(&png_bytes(100, 100)).expect("b");
        editor.select(b);
        editor.move_selected(200.0, 50.0);
        editor.select_many(&[a, b]);

        let group = editor.group_selected().expect("group");
        assert_eq!(editor.scene().layers().count(), 1);
        assert_eq!(editor.scene().index_of(group), Some(1));
        let bounds = editor.scene().get(group).expect("group").bounds();
        assert!((bounds.left - 100.0).abs() < 1e-4);
        assert!((bounds.width - 500.0).abs() < 1e-4);

        let released = editor.ungroup_selected();
        assert_eq!(released, vec![a, b]);
        let b_geometry = editor.scene().get(b).expect("b").geometry;
        assert!((b_geometry.left - 300.0).abs() < 1e-4);
        assert!((b_geometry.top - 150.0).abs() < 1e-4);
    }

    #[test]
    fn test_load_layout_failure_keeps_scene() {
        let mut editor = editor_with_background();
        let id = editor.add_text(None).expect("add");
        let json = editor.to_layout_json().expect("json");

        assert!(editor.load_layout("{ not json").is_err());
        assert!(editor.scene().get(id).is_some());

        let mut other = SceneEditor::new(10.0, 10.0);
        other.load_layout(&json).expect("load");
        assert!(other.scene().get(id).is_some());
        assert!((other.scene().width - 1280.0).abs() < f32::EPSILON);
        assert!(other.scene().selection().is_empty());
    }
}
