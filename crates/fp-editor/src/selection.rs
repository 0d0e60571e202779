//! Selection model.
//!
//! A toggling set of whole elements, or exactly one sub-element (a room
//! vertex or segment). The two never mix.

use fp_core::id::EntityId;
use fp_core::model::Floor;

/// One selectable target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectedElement {
    Room(EntityId),
    Wall(EntityId),
    Door(EntityId),
    Artwork(EntityId),
    VerticalLink(EntityId),
    Vertex { room_id: EntityId, index: usize },
    Segment { room_id: EntityId, index: usize },
}

impl SelectedElement {
    /// The entity this element is, or belongs to.
    pub fn entity_id(&self) -> EntityId {
        match *self {
            Self::Room(id)
            | Self::Wall(id)
            | Self::Door(id)
            | Self::Artwork(id)
            | Self::VerticalLink(id) => id,
            Self::Vertex { room_id, .. } | Self::Segment { room_id, .. } => room_id,
        }
    }

    pub fn is_sub_element(&self) -> bool {
        matches!(self, Self::Vertex { .. } | Self::Segment { .. })
    }

    /// Whether the target still exists on `floor`.
    pub fn exists_on(&self, floor: &Floor) -> bool {
        match *self {
            Self::Room(id) => floor.room(id).is_some(),
            Self::Wall(id) => floor.wall(id).is_some(),
            Self::Door(id) => floor.door(id).is_some(),
            Self::Artwork(id) => floor.artwork(id).is_some(),
            Self::VerticalLink(id) => floor.vertical_link(id).is_some(),
            Self::Vertex { room_id, index } | Self::Segment { room_id, index } => floor
                .room(room_id)
                .is_some_and(|r| index < r.polygon.len()),
        }
    }

    /// Whole-element selection for any entity on `floor`.
    pub fn for_entity(floor: &Floor, id: EntityId) -> Option<Self> {
        if floor.room(id).is_some() {
            Some(Self::Room(id))
        } else if floor.wall(id).is_some() {
            Some(Self::Wall(id))
        } else if floor.door(id).is_some() {
            Some(Self::Door(id))
        } else if floor.artwork(id).is_some() {
            Some(Self::Artwork(id))
        } else if floor.vertical_link(id).is_some() {
            Some(Self::VerticalLink(id))
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Selection {
    items: Vec<SelectedElement>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_slice(&self) -> &[SelectedElement] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn contains(&self, element: &SelectedElement) -> bool {
        self.items.contains(element)
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Replace the selection with a single element.
    pub fn select_only(&mut self, element: SelectedElement) {
        self.items.clear();
        self.items.push(element);
    }

    /// Add or remove an element. Sub-elements are exclusive: toggling one in
    /// replaces everything, toggling a whole element drops any sub-element.
    pub fn toggle(&mut self, element: SelectedElement) {
        if let Some(pos) = self.items.iter().position(|e| *e == element) {
            self.items.remove(pos);
            return;
        }
        if element.is_sub_element() {
            self.select_only(element);
            return;
        }
        self.items.retain(|e| !e.is_sub_element());
        self.items.push(element);
    }

    /// Add whole elements (box selection), skipping duplicates.
    pub fn extend(&mut self, elements: impl IntoIterator<Item = SelectedElement>) {
        self.items.retain(|e| !e.is_sub_element());
        for e in elements {
            if !e.is_sub_element() && !self.items.contains(&e) {
                self.items.push(e);
            }
        }
    }

    /// IDs of selected whole elements, in selection order.
    pub fn entity_ids(&self) -> Vec<EntityId> {
        self.items
            .iter()
            .filter(|e| !e.is_sub_element())
            .map(SelectedElement::entity_id)
            .collect()
    }

    /// Whether `room_id` is selected as a whole or through one of its parts.
    pub fn touches_room(&self, room_id: EntityId) -> bool {
        self.items.iter().any(|e| match *e {
            SelectedElement::Room(id) => id == room_id,
            SelectedElement::Vertex { room_id: r, .. } | SelectedElement::Segment { room_id: r, .. } => {
                r == room_id
            }
            _ => false,
        })
    }

    /// The single selected vertical link, if that is the whole selection.
    pub fn single_link(&self) -> Option<EntityId> {
        match self.items.as_slice() {
            [SelectedElement::VerticalLink(id)] => Some(*id),
            _ => None,
        }
    }

    /// Drop targets that no longer exist on `floor`.
    pub fn retain_existing(&mut self, floor: &Floor) {
        self.items.retain(|e| e.exists_on(floor));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> EntityId {
        EntityId::intern(s)
    }

    #[test]
    fn toggle_adds_and_removes() {
        let mut sel = Selection::new();
        sel.toggle(SelectedElement::Room(id("sel_a")));
        sel.toggle(SelectedElement::Wall(id("sel_w")));
        assert_eq!(sel.len(), 2);
        sel.toggle(SelectedElement::Room(id("sel_a")));
        assert_eq!(sel.as_slice(), &[SelectedElement::Wall(id("sel_w"))]);
    }

    #[test]
    fn sub_element_selection_is_exclusive() {
        let mut sel = Selection::new();
        sel.toggle(SelectedElement::Room(id("sel_a")));
        sel.toggle(SelectedElement::Vertex {
            room_id: id("sel_a"),
            index: 2,
        });
        assert_eq!(sel.len(), 1);
        assert!(sel.entity_ids().is_empty());
        assert!(sel.touches_room(id("sel_a")));

        sel.toggle(SelectedElement::Door(id("sel_d")));
        assert_eq!(sel.as_slice(), &[SelectedElement::Door(id("sel_d"))]);
    }

    #[test]
    fn extend_skips_duplicates() {
        let mut sel = Selection::new();
        sel.select_only(SelectedElement::Room(id("sel_a")));
        sel.extend([
            SelectedElement::Room(id("sel_a")),
            SelectedElement::Artwork(id("sel_art")),
        ]);
        assert_eq!(sel.entity_ids(), vec![id("sel_a"), id("sel_art")]);
    }
}
