//! Scene graph: an arena of objects plus the stacking order.
//!
//! Index 0 of the stacking order is the bottommost object. When a
//! background exists it always sits at index 0.

use std::collections::HashMap;

use crate::{ObjectId, SceneObject, StudioError, StudioResult};

/// Default canvas width.
pub const DEFAULT_CANVAS_WIDTH: f32 = 1280.0;

/// Default canvas height.
pub const DEFAULT_CANVAS_HEIGHT: f32 = 720.0;

/// A design: all objects, their order and the active selection.
#[derive(Debug, Clone)]
pub struct Scene {
    /// All objects, indexed by ID.
    objects: HashMap<ObjectId, SceneObject>,
    /// Stacking order, bottom to top.
    order: Vec<ObjectId>,
    /// Active selection.
    selected: Vec<ObjectId>,
    /// Canvas width in scene units.
    pub width: f32,
    /// Canvas height in scene units.
    pub height: f32,
    /// Color painted under every object.
    pub background_color: String,
}

impl Scene {
    /// Create an empty scene of the given size.
    #[must_use]
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            objects: HashMap::new(),
            order: Vec::new(),
            selected: Vec::new(),
            width,
            height,
            background_color: "#000000".to_string(),
        }
    }

    /// All objects, bottom to top, background included.
    pub fn objects(&self) -> impl DoubleEndedIterator<Item = &SceneObject> {
        self.order.iter().filter_map(|id| self.objects.get(id))
    }

    /// All objects except the background, bottom to top.
    pub fn layers(&self) -> impl DoubleEndedIterator<Item = &SceneObject> {
        self.objects().filter(|o| !o.is_background())
    }

    /// Get an object by ID.
    #[must_use]
    pub fn get(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects.get(&id)
    }

    /// Get a mutable reference to an object by ID.
    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut SceneObject> {
        self.objects.get_mut(&id)
    }

    /// Position of an object in the stacking order.
    #[must_use]
    pub fn index_of(&self, id: ObjectId) -> Option<usize> {
        self.order.iter().position(|&oid| oid == id)
    }

    /// The background object, if any.
    #[must_use]
    pub fn background(&self) -> Option<&SceneObject> {
        self.order
            .first()
            .and_then(|id| self.objects.get(id))
            .filter(|o| o.is_background())
    }

    /// The active selection, in selection order.
    #[must_use]
    pub fn selection(&self) -> &[ObjectId] {
        &self.selected
    }

    /// The selected objects.
    pub fn active_objects(&self) -> impl Iterator<Item = &SceneObject> {
        self.selected.iter().filter_map(|id| self.objects.get(id))
    }

    /// Number of objects, background included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Check if the scene has no objects.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Lowest index a non-background object may occupy.
    fn floor(&self) -> usize {
        usize::from(self.background().is_some())
    }

    /// Install `object` as the background, replacing the current one.
    ///
    /// The object is forced non-selectable and is placed at index 0. A
    /// layer with the same ID is taken out of the stack first. Returns the
    /// replaced background.
    pub fn set_background(&mut self, mut object: SceneObject) -> Option<SceneObject> {
        let previous = self
            .background()
            .map(|bg| bg.id)
            .and_then(|id| self.remove(id).ok());
        if self.objects.contains_key(&object.id) {
            let _ = self.remove(object.id);
        }

        object.metadata.is_background = true;
        object.selectable = false;
        let id = object.id;
        self.objects.insert(id, object);
        self.order.insert(0, id);
        previous
    }

    /// Add an object on top of the stack.
    ///
    /// Background objects are routed to [`Scene::set_background`].
    ///
    /// # Errors
    ///
    /// Returns an error if an object with the same ID is already present.
    pub fn insert(&mut self, object: SceneObject) -> StudioResult<ObjectId> {
        let index = self.order.len();
        self.insert_at(index, object)
    }

    /// Add an object directly above `anchor`.
    ///
    /// # Errors
    ///
    /// Returns an error if `anchor` is not in the scene or the ID is taken.
    pub fn insert_above(&mut self, object: SceneObject, anchor: ObjectId) -> StudioResult<ObjectId> {
        let index = self
            .index_of(anchor)
            .ok_or_else(|| StudioError::ObjectNotFound(anchor.to_string()))?;
        self.insert_at(index + 1, object)
    }

    /// Add an object at a stacking index, clamped to stay above the
    /// background.
    ///
    /// # Errors
    ///
    /// Returns an error if an object with the same ID is already present.
    pub fn insert_at(&mut self, index: usize, object: SceneObject) -> StudioResult<ObjectId> {
        let id = object.id;
        if self.objects.contains_key(&id) {
            return Err(StudioError::InvalidOperation(format!(
                "duplicate object id {id}"
            )));
        }
        if object.is_background() {
            self.set_background(object);
            return Ok(id);
        }
        let index = index.clamp(self.floor(), self.order.len());
        self.objects.insert(id, object);
        self.order.insert(index, id);
        Ok(id)
    }

    /// Remove an object, dropping it from the selection.
    ///
    /// # Errors
    ///
    /// Returns an error if the object is not found.
    pub fn remove(&mut self, id: ObjectId) -> StudioResult<SceneObject> {
        let object = self
            .objects
            .remove(&id)
            .ok_or_else(|| StudioError::ObjectNotFound(id.to_string()))?;
        self.order.retain(|&oid| oid != id);
        self.selected.retain(|&oid| oid != id);
        Ok(object)
    }

    /// Swap an object with the one above it.
    ///
    /// Returns `false` when the object is already on top or is the
    /// background.
    ///
    /// # Errors
    ///
    /// Returns an error if the object is not found.
    pub fn swap_forward(&mut self, id: ObjectId) -> StudioResult<bool> {
        let index = self
            .index_of(id)
            .ok_or_else(|| StudioError::ObjectNotFound(id.to_string()))?;
        if index + 1 >= self.order.len() || index < self.floor() {
            return Ok(false);
        }
        self.order.swap(index, index + 1);
        Ok(true)
    }

    /// Swap an object with the one below it.
    ///
    /// Returns `false` when nothing but the background lies behind the
    /// object.
    ///
    /// # Errors
    ///
    /// Returns an error if the object is not found.
    pub fn swap_backward(&mut self, id: ObjectId) -> StudioResult<bool> {
        let index = self
            .index_of(id)
            .ok_or_else(|| StudioError::ObjectNotFound(id.to_string()))?;
        let has_layer_behind = self.order[..index]
            .iter()
            .filter_map(|oid| self.objects.get(oid))
            .any(|o| !o.is_background());
        if !has_layer_behind {
            return Ok(false);
        }
        self.order.swap(index - 1, index);
        Ok(true)
    }

    /// Replace the selection.
    ///
    /// Unknown, background and locked IDs are dropped. Returns whether the
    /// selection changed.
    pub fn set_selection(&mut self, ids: &[ObjectId]) -> bool {
        let mut next: Vec<ObjectId> = Vec::with_capacity(ids.len());
        for &id in ids {
            let eligible = self
                .objects
                .get(&id)
                .is_some_and(|o| o.selectable && !o.is_background());
            if eligible && !next.contains(&id) {
                next.push(id);
            }
        }
        if next == self.selected {
            return false;
        }
        self.selected = next;
        true
    }

    /// Clear the selection. Returns whether anything was selected.
    pub fn clear_selection(&mut self) -> bool {
        let changed = !self.selected.is_empty();
        self.selected.clear();
        changed
    }

    /// Find the topmost visible, selectable object at canvas coordinates.
    #[must_use]
    pub fn object_at(&self, x: f32, y: f32) -> Option<ObjectId> {
        self.order
            .iter()
            .rev()
            .filter_map(|id| self.objects.get(id))
            .find(|o| o.visible && o.selectable && !o.is_background() && o.contains_point(x, y))
            .map(|o| o.id)
    }

    /// Remove every object and clear the selection.
    pub fn clear(&mut self) {
        self.objects.clear();
        self.order.clear();
        self.selected.clear();
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(DEFAULT_CANVAS_WIDTH, DEFAULT_CANVAS_HEIGHT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{Geometry, ObjectKind, RasterImage};
    use crate::style::TextStyle;

    fn background() -> SceneObject {
        SceneObject::new(ObjectKind::BackgroundImage {
            image: RasterImage {
                data_uri: "data:image/png;base64,".to_string(),
                width: 1280,
                height: 720,
            },
        })
    }

    fn text(label: &str) -> SceneObject {
        SceneObject::text(label, TextStyle::default())
    }

    #[test]
    fn test_scene_insert_remove() {
        let mut scene = Scene::default();
        assert!(scene.is_empty());

        let id = scene.insert(text("a")).expect("insert");
        assert_eq!(scene.len(), 1);
        assert!(scene.get(id).is_some());

        scene.remove(id).expect("remove");
        assert!(scene.is_empty());
        assert!(scene.remove(id).is_err());
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut scene = Scene::default();
        let object = text("a");
        scene.insert(object.clone()).expect("insert");
        assert!(matches!(
            scene.insert(object),
            Err(StudioError::InvalidOperation(_))
        ));
    }

    #[test]
    fn test_background_stays_at_bottom() {
        let mut scene = Scene::default();
        let a = scene.insert(text("a")).expect("insert");
        let bg = scene.insert(background()).expect("insert bg");
        assert_eq!(scene.index_of(bg), Some(0));
        assert_eq!(scene.index_of(a), Some(1));

        let replacement = background();
        let replacement_id = replacement.id;
        let old = scene.set_background(replacement).expect("replaced");
        assert_eq!(old.id, bg);
        assert_eq!(scene.index_of(replacement_id), Some(0));
        assert_eq!(scene.len(), 2);
        assert!(!scene.get(replacement_id).expect("bg").selectable);
    }

    #[test]
    fn test_background_reusing_layer_id_keeps_order_unique() {
        let mut scene = Scene::default();
        let object = text("backdrop");
        let id = scene.insert(object.clone()).expect("insert");
        let other = scene.insert(text("a")).expect("insert");
        scene.set_selection(&[id, other]);

        assert!(scene.set_background(object).is_none());
        assert_eq!(scene.len(), 2);
        assert_eq!(scene.index_of(id), Some(0));
        assert_eq!(scene.index_of(other), Some(1));
        assert!(scene.get(id).expect("bg").is_background());
        assert_eq!(scene.selection(), &[other]);
        assert_eq!(scene.layers().count(), 1);
    }

    #[test]
    fn test_colliding_ids_rejected_by_every_insert() {
        let mut scene = Scene::default();
        let bg = background();
        let bg_id = bg.id;
        scene.set_background(bg.clone());
        let a = text("a");
        let a_id = scene.insert(a.clone()).expect("insert");

        assert!(scene.insert_at(0, a.clone()).is_err());
        assert!(scene.insert_above(a, a_id).is_err());
        assert!(scene.insert(bg.clone()).is_err());

        // Reinstalling the current background replaces it in place.
        assert_eq!(scene.set_background(bg).map(|o| o.id), Some(bg_id));
        assert_eq!(scene.len(), 2);
        assert_eq!(scene.index_of(a_id), Some(1));
    }

    #[test]
    fn test_layers_reverse_from_top() {
        let mut scene = Scene::default();
        scene.set_background(background());
        let a = scene.insert(text("a")).expect("insert");
        let b = scene.insert(text("b")).expect("insert");
        let ids: Vec<_> = scene.layers().rev().map(|o| o.id).collect();
        assert_eq!(ids, vec![b, a]);
    }

    #[test]
    fn test_layers_exclude_background() {
        let mut scene = Scene::default();
        scene.set_background(background());
        let a = scene.insert(text("a")).expect("insert");
        let ids: Vec<_> = scene.layers().map(|o| o.id).collect();
        assert_eq!(ids, vec![a]);
    }

    #[test]
    fn test_swap_backward_guard() {
        let mut scene = Scene::default();
        scene.set_background(background());
        let a = scene.insert(text("a")).expect("insert");
        let b = scene.insert(text("b")).expect("insert");

        assert!(!scene.swap_backward(a).expect("swap"));
        assert_eq!(scene.index_of(a), Some(1));

        assert!(scene.swap_backward(b).expect("swap"));
        assert_eq!(scene.index_of(b), Some(1));
        assert_eq!(scene.index_of(a), Some(2));
    }

    #[test]
    fn test_swap_forward_at_top_is_noop() {
        let mut scene = Scene::default();
        let bg = scene.insert(background()).expect("bg");
        let a = scene.insert(text("a")).expect("insert");
        assert!(!scene.swap_forward(a).expect("swap"));
        assert!(!scene.swap_forward(bg).expect("swap"));
        assert_eq!(scene.index_of(bg), Some(0));
    }

    #[test]
    fn test_selection_filters_ineligible() {
        let mut scene = Scene::default();
        let bg = scene.insert(background()).expect("bg");
        let a = scene.insert(text("a")).expect("insert");
        let mut locked = text("locked");
        locked.selectable = false;
        let locked = scene.insert(locked).expect("insert");

        assert!(scene.set_selection(&[bg, a, locked, a, ObjectId::new()]));
        assert_eq!(scene.selection(), &[a]);
        assert!(!scene.set_selection(&[a]));

        scene.remove(a).expect("remove");
        assert!(scene.selection().is_empty());
    }

    #[test]
    fn test_object_at_returns_topmost() {
        let mut scene = Scene::default();
        scene.set_background(background());
        let lower = scene
            .insert(text("lower").with_geometry(Geometry::at(0.0, 0.0)))
            .expect("insert");
        let upper = scene
            .insert(text("upper").with_geometry(Geometry::at(10.0, 10.0)))
            .expect("insert");

        assert_eq!(scene.object_at(20.0, 20.0), Some(upper));
        assert_eq!(scene.object_at(5.0, 5.0), Some(lower));
        assert_eq!(scene.object_at(1200.0, 700.0), None);

        scene.get_mut(upper).expect("upper").visible = false;
        assert_eq!(scene.object_at(20.0, 20.0), Some(lower));
    }
}
