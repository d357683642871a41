//! Drag intent classification.
//!
//! Every drag-over tick turns the current hover target and geometry into a
//! discrete [`DragState`]. Nothing is mutated until the gesture ends; the
//! same state that drives the drop indicator is what [`crate::ops::drop`]
//! commits, so indicator and outcome can never disagree.

use serde::{Deserialize, Serialize};

use crate::model::column::{ColumnId, Columns};
use crate::ops::drop::DropRequest;
use crate::ops::tree;

/// An axis-aligned rectangle in screen coordinates (y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Rect {
            x,
            y,
            width,
            height,
        }
    }

    pub fn center_y(&self) -> f64 {
        self.y + self.height / 2.0
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Horizontal band of this rectangle between two height fractions
    fn band(&self, from: f64, to: f64) -> Rect {
        Rect {
            x: self.x,
            y: self.y + self.height * from,
            width: self.width,
            height: self.height * (to - from),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsertPosition {
    Top,
    Bottom,
}

/// What a drop is relative to: a whole column or a single task
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum DropTarget {
    Column(ColumnId),
    Task(String),
}

/// The committed-on-release intent of a drag gesture
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DragState {
    /// Nothing actionable (self, own descendant, or empty space)
    #[default]
    None,
    /// Become the first/last item of a column, or the previous/next sibling of a task
    Insert {
        position: InsertPosition,
        target: DropTarget,
    },
    /// Become the last child of the target
    Nest { target: DropTarget },
}

impl DragState {
    pub fn target(&self) -> Option<&DropTarget> {
        match self {
            DragState::None => None,
            DragState::Insert { target, .. } | DragState::Nest { target } => Some(target),
        }
    }
}

/// One of the three hit regions a task card registers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Zone {
    Top,
    Middle,
    Bottom,
}

impl Zone {
    /// Split a card into its top 20% / middle 60% / bottom 20% hit regions.
    pub fn hit_regions(card: &Rect) -> [(Zone, Rect); 3] {
        [
            (Zone::Top, card.band(0.0, 0.2)),
            (Zone::Middle, card.band(0.2, 0.8)),
            (Zone::Bottom, card.band(0.8, 1.0)),
        ]
    }

    /// The hit region under a pointer at `y`. Points above or below the card
    /// land in the nearest edge region.
    pub fn at(card: &Rect, y: f64) -> Zone {
        let regions = Zone::hit_regions(card);
        regions
            .iter()
            .find(|(_, band)| y < band.bottom())
            .map(|(zone, _)| *zone)
            .unwrap_or(Zone::Bottom)
    }
}

/// What the pointer is over on this tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum HoverTarget {
    /// A column's background or empty area
    Column { column: ColumnId, rect: Rect },
    /// One of a task card's hit regions
    TaskZone { task_id: String, zone: Zone },
    /// Any other droppable element, by id
    Other { id: String },
    Nothing,
}

/// Raw input for one drag-over tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DragOver {
    pub hover: HoverTarget,
    /// Current rectangle of the dragged card
    pub dragged_rect: Option<Rect>,
}

/// Classify one drag-over tick. Pure and allocation-light; safe to call on
/// every pointer move.
pub fn classify(
    columns: &Columns,
    dragged_id: &str,
    over: &DragOver,
    column_drop_offset: f64,
) -> DragState {
    match &over.hover {
        HoverTarget::Nothing => DragState::None,
        HoverTarget::Column { column, rect } => {
            let above = over
                .dragged_rect
                .is_some_and(|r| r.center_y() < rect.y + column_drop_offset);
            if above {
                return DragState::Insert {
                    position: InsertPosition::Top,
                    target: DropTarget::Column(*column),
                };
            }
            let target = match columns.get(*column).last() {
                Some(last) if last.id != dragged_id => DropTarget::Task(last.id.clone()),
                _ => DropTarget::Column(*column),
            };
            DragState::Insert {
                position: InsertPosition::Bottom,
                target,
            }
        }
        HoverTarget::TaskZone { task_id, zone } => {
            if forms_cycle(columns, dragged_id, task_id) {
                return DragState::None;
            }
            let target = DropTarget::Task(task_id.clone());
            match zone {
                Zone::Top => DragState::Insert {
                    position: InsertPosition::Top,
                    target,
                },
                Zone::Middle => DragState::Nest { target },
                Zone::Bottom => DragState::Insert {
                    position: InsertPosition::Bottom,
                    target,
                },
            }
        }
        HoverTarget::Other { id } => {
            if let Some(column) = ColumnId::parse(id) {
                return DragState::Nest {
                    target: DropTarget::Column(column),
                };
            }
            if forms_cycle(columns, dragged_id, id) {
                return DragState::None;
            }
            DragState::Nest {
                target: DropTarget::Task(id.clone()),
            }
        }
    }
}

/// Dropping onto yourself or your own subtree would create a cycle.
pub fn forms_cycle(columns: &Columns, dragged_id: &str, target_id: &str) -> bool {
    target_id == dragged_id || tree::is_descendant_in_columns(columns, dragged_id, target_id)
}

/// View-state of an in-progress drag, recomputed every tick and consumed on
/// release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DragSession {
    pub dragged_id: String,
    /// Whether the duplicate/group modifier is currently held
    pub duplicate: bool,
    pub state: DragState,
}

impl DragSession {
    pub fn start(dragged_id: impl Into<String>) -> Self {
        DragSession {
            dragged_id: dragged_id.into(),
            duplicate: false,
            state: DragState::None,
        }
    }

    pub fn set_modifier(&mut self, held: bool) {
        self.duplicate = held;
    }

    /// Reclassify for the latest pointer input.
    pub fn over(
        &mut self,
        columns: &Columns,
        over: &DragOver,
        column_drop_offset: f64,
    ) -> &DragState {
        self.state = classify(columns, &self.dragged_id, over, column_drop_offset);
        &self.state
    }

    /// End the gesture, producing the request for the mutation engine.
    pub fn finish(self) -> DropRequest {
        DropRequest {
            task_id: self.dragged_id,
            state: self.state,
            duplicate: self.duplicate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::Task;

    const OFFSET: f64 = 50.0;

    fn board() -> Columns {
        let mut a = Task::new("a", "A");
        let mut b = Task::new("b", "B");
        b.children.push(Task::new("c", "C"));
        a.children.push(b);
        Columns {
            backlog: vec![a, Task::new("d", "D")],
            ..Default::default()
        }
    }

    fn over_task(id: &str, zone: Zone) -> DragOver {
        DragOver {
            hover: HoverTarget::TaskZone {
                task_id: id.into(),
                zone,
            },
            dragged_rect: None,
        }
    }

    fn over_column(column: ColumnId, dragged_center: f64) -> DragOver {
        DragOver {
            hover: HoverTarget::Column {
                column,
                rect: Rect::new(0.0, 100.0, 300.0, 600.0),
            },
            dragged_rect: Some(Rect::new(0.0, dragged_center - 20.0, 280.0, 40.0)),
        }
    }

    #[test]
    fn zones_map_to_insert_and_nest() {
        let columns = board();
        assert_eq!(
            classify(&columns, "d", &over_task("a", Zone::Top), OFFSET),
            DragState::Insert {
                position: InsertPosition::Top,
                target: DropTarget::Task("a".into())
            }
        );
        assert_eq!(
            classify(&columns, "d", &over_task("a", Zone::Middle), OFFSET),
            DragState::Nest {
                target: DropTarget::Task("a".into())
            }
        );
        assert_eq!(
            classify(&columns, "d", &over_task("a", Zone::Bottom), OFFSET),
            DragState::Insert {
                position: InsertPosition::Bottom,
                target: DropTarget::Task("a".into())
            }
        );
    }

    #[test]
    fn self_and_descendants_are_not_targets() {
        let columns = board();
        for zone in [Zone::Top, Zone::Middle, Zone::Bottom] {
            assert_eq!(classify(&columns, "a", &over_task("a", zone), OFFSET), DragState::None);
            assert_eq!(classify(&columns, "a", &over_task("c", zone), OFFSET), DragState::None);
        }
        let other = DragOver {
            hover: HoverTarget::Other { id: "b".into() },
            dragged_rect: None,
        };
        assert_eq!(classify(&columns, "a", &other, OFFSET), DragState::None);
        // the child may still target its ancestor
        assert_ne!(classify(&columns, "c", &over_task("a", Zone::Middle), OFFSET), DragState::None);
    }

    #[test]
    fn column_background_splits_at_offset() {
        let columns = board();
        // column top is y=100, so the boundary sits at 150
        assert_eq!(
            classify(&columns, "a", &over_column(ColumnId::Todo, 120.0), OFFSET),
            DragState::Insert {
                position: InsertPosition::Top,
                target: DropTarget::Column(ColumnId::Todo)
            }
        );
        assert_eq!(
            classify(&columns, "a", &over_column(ColumnId::Todo, 150.0), OFFSET),
            DragState::Insert {
                position: InsertPosition::Bottom,
                target: DropTarget::Column(ColumnId::Todo)
            }
        );
    }

    #[test]
    fn column_bottom_anchors_to_last_task() {
        let columns = board();
        assert_eq!(
            classify(&columns, "a", &over_column(ColumnId::Backlog, 400.0), OFFSET),
            DragState::Insert {
                position: InsertPosition::Bottom,
                target: DropTarget::Task("d".into())
            }
        );
        // unless the last task is the one being dragged
        assert_eq!(
            classify(&columns, "d", &over_column(ColumnId::Backlog, 400.0), OFFSET),
            DragState::Insert {
                position: InsertPosition::Bottom,
                target: DropTarget::Column(ColumnId::Backlog)
            }
        );
    }

    #[test]
    fn other_targets_fall_back_to_nest() {
        let columns = board();
        let over = DragOver {
            hover: HoverTarget::Other { id: "d".into() },
            dragged_rect: None,
        };
        assert_eq!(
            classify(&columns, "a", &over, OFFSET),
            DragState::Nest {
                target: DropTarget::Task("d".into())
            }
        );
        let over_col = DragOver {
            hover: HoverTarget::Other { id: "done".into() },
            dragged_rect: None,
        };
        assert_eq!(
            classify(&columns, "a", &over_col, OFFSET),
            DragState::Nest {
                target: DropTarget::Column(ColumnId::Done)
            }
        );
        let nothing = DragOver {
            hover: HoverTarget::Nothing,
            dragged_rect: None,
        };
        assert_eq!(classify(&columns, "a", &nothing, OFFSET), DragState::None);
    }

    #[test]
    fn hit_regions_split_twenty_sixty_twenty() {
        let close = |a: f64, b: f64| (a - b).abs() < 1e-9;
        let regions = Zone::hit_regions(&Rect::new(0.0, 100.0, 200.0, 50.0));
        assert_eq!(regions.map(|(z, _)| z), [Zone::Top, Zone::Middle, Zone::Bottom]);
        assert!(close(regions[0].1.y, 100.0));
        assert!(close(regions[0].1.height, 10.0));
        assert!(close(regions[1].1.y, 110.0));
        assert!(close(regions[1].1.height, 30.0));
        assert!(close(regions[2].1.y, 140.0));
        assert!(close(regions[2].1.bottom(), 150.0));
    }

    #[test]
    fn pointer_position_picks_zone() {
        let card = Rect::new(0.0, 100.0, 200.0, 50.0);
        assert_eq!(Zone::at(&card, 100.0), Zone::Top);
        assert_eq!(Zone::at(&card, 109.0), Zone::Top);
        assert_eq!(Zone::at(&card, 111.0), Zone::Middle);
        assert_eq!(Zone::at(&card, 139.0), Zone::Middle);
        assert_eq!(Zone::at(&card, 141.0), Zone::Bottom);
        assert_eq!(Zone::at(&card, 90.0), Zone::Top);
        assert_eq!(Zone::at(&card, 400.0), Zone::Bottom);
    }

    #[test]
    fn drag_state_serializes_as_tagged_value() {
        let state = DragState::Insert {
            position: InsertPosition::Bottom,
            target: DropTarget::Column(ColumnId::InProgress),
        };
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["type"], "insert");
        assert_eq!(json["position"], "bottom");
        assert_eq!(json["target"]["kind"], "column");
        assert_eq!(json["target"]["id"], "in-progress");
        let back: DragState = serde_json::from_value(json).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn session_tracks_latest_state_and_modifier() {
        let columns = board();
        let mut session = DragSession::start("d");
        session.over(&columns, &over_task("a", Zone::Middle), OFFSET);
        session.set_modifier(true);
        session.over(&columns, &over_task("a", Zone::Top), OFFSET);
        let request = session.finish();
        assert_eq!(request.task_id, "d");
        assert!(request.duplicate);
        assert_eq!(
            request.state,
            DragState::Insert {
                position: InsertPosition::Top,
                target: DropTarget::Task("a".into())
            }
        );
    }
}
