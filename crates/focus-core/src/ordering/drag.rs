//! Drag-interaction state machine.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Dragging(item) -> (DraggingOverItem | DraggingOverList) -> Dropped
//!                        \-> Cancelled
//! ```
//!
//! While dragging, the session keeps an optimistic copy of the board layout
//! that reflects where the item currently hovers. `drop()` turns the
//! difference from the persisted layout into a [`MoveIntent`]; `cancel()`
//! (or dropping with no target) restores the persisted layout and produces
//! nothing to write.
//!
//! The persisted layout only changes once the caller reports the write:
//! `confirm()` after the move is stored, `rollback()` if storing it failed.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// A column with its task ids in display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lane {
    pub id: String,
    pub task_ids: Vec<String>,
}

/// Display order of a board: columns left to right, tasks top to bottom.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardLayout {
    pub lanes: Vec<Lane>,
}

impl BoardLayout {
    fn lane_index(&self, column_id: &str) -> Option<usize> {
        self.lanes.iter().position(|lane| lane.id == column_id)
    }

    /// `(lane index, task index)` of a task.
    fn locate_task(&self, task_id: &str) -> Option<(usize, usize)> {
        self.lanes.iter().enumerate().find_map(|(lane_index, lane)| {
            lane.task_ids
                .iter()
                .position(|id| id == task_id)
                .map(|task_index| (lane_index, task_index))
        })
    }

    /// Column that currently holds `task_id`.
    pub fn column_of(&self, task_id: &str) -> Option<&str> {
        self.locate_task(task_id)
            .map(|(lane_index, _)| self.lanes[lane_index].id.as_str())
    }

    fn contains(&self, item: &DragItem) -> bool {
        match item {
            DragItem::Task(id) => self.locate_task(id).is_some(),
            DragItem::Column(id) => self.lane_index(id).is_some(),
        }
    }

    fn move_task(&mut self, task_id: &str, to_lane: usize, to_index: usize) {
        let Some((from_lane, from_index)) = self.locate_task(task_id) else {
            return;
        };
        let task = self.lanes[from_lane].task_ids.remove(from_index);
        let dest = &mut self.lanes[to_lane].task_ids;
        let index = to_index.min(dest.len());
        dest.insert(index, task);
    }

    fn move_lane(&mut self, column_id: &str, to_index: usize) {
        let Some(from) = self.lane_index(column_id) else {
            return;
        };
        let lane = self.lanes.remove(from);
        let index = to_index.min(self.lanes.len());
        self.lanes.insert(index, lane);
    }
}

/// What is being dragged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum DragItem {
    Task(String),
    Column(String),
}

/// A completed drag, ready to be persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MoveIntent {
    Task {
        task_id: String,
        to_column: String,
        to_index: usize,
    },
    Column {
        column_id: String,
        to_index: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DragState {
    Idle,
    Dragging { item: DragItem },
    DraggingOverItem { item: DragItem, target: String },
    DraggingOverList { item: DragItem, list: String },
    Dropped { intent: Option<MoveIntent> },
    Cancelled,
}

impl DragState {
    fn name(&self) -> &'static str {
        match self {
            DragState::Idle => "idle",
            DragState::Dragging { .. } => "dragging",
            DragState::DraggingOverItem { .. } => "dragging over item",
            DragState::DraggingOverList { .. } => "dragging over list",
            DragState::Dropped { .. } => "dropped",
            DragState::Cancelled => "cancelled",
        }
    }

    fn active_item(&self) -> Option<&DragItem> {
        match self {
            DragState::Dragging { item }
            | DragState::DraggingOverItem { item, .. }
            | DragState::DraggingOverList { item, .. } => Some(item),
            _ => None,
        }
    }
}

/// One board's drag interaction, owning persisted and optimistic layouts.
#[derive(Debug, Clone)]
pub struct DragSession {
    state: DragState,
    persisted: BoardLayout,
    optimistic: BoardLayout,
}

impl DragSession {
    pub fn new(layout: BoardLayout) -> Self {
        Self {
            state: DragState::Idle,
            optimistic: layout.clone(),
            persisted: layout,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> &DragState {
        &self.state
    }

    /// Layout to render: optimistic while dragging, persisted otherwise.
    pub fn layout(&self) -> &BoardLayout {
        &self.optimistic
    }

    pub fn persisted(&self) -> &BoardLayout {
        &self.persisted
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Replace the persisted layout with fresh server state.
    ///
    /// # Errors
    /// Rejected while a drag is in progress.
    pub fn sync(&mut self, layout: BoardLayout) -> Result<()> {
        if self.state.active_item().is_some() {
            return Err(self.invalid("sync"));
        }
        self.optimistic = layout.clone();
        self.persisted = layout;
        self.state = DragState::Idle;
        Ok(())
    }

    pub fn start(&mut self, item: DragItem) -> Result<()> {
        if self.state.active_item().is_some() {
            return Err(self.invalid("start a drag"));
        }
        if !self.persisted.contains(&item) {
            let (entity, id) = match &item {
                DragItem::Task(id) => ("task", id),
                DragItem::Column(id) => ("column", id),
            };
            return Err(CoreError::not_found(entity, id.clone()));
        }
        self.optimistic = self.persisted.clone();
        self.state = DragState::Dragging { item };
        Ok(())
    }

    /// Hover over another item: a task (when dragging a task) or a column
    /// (when dragging a column).
    pub fn hover_item(&mut self, target: &str) -> Result<()> {
        let item = self
            .state
            .active_item()
            .cloned()
            .ok_or_else(|| self.invalid("hover"))?;

        match &item {
            DragItem::Task(task_id) => {
                if task_id != target {
                    let (lane, index) = self
                        .optimistic
                        .locate_task(target)
                        .ok_or_else(|| CoreError::not_found("task", target))?;
                    self.optimistic.move_task(task_id, lane, index);
                }
            }
            DragItem::Column(column_id) => {
                let index = self
                    .optimistic
                    .lane_index(target)
                    .ok_or_else(|| CoreError::not_found("column", target))?;
                if column_id != target {
                    self.optimistic.move_lane(column_id, index);
                }
            }
        }

        self.state = DragState::DraggingOverItem {
            item,
            target: target.to_string(),
        };
        Ok(())
    }

    /// Hover over a column's empty area. A task entering a different column
    /// is appended to it; hovering its own column changes nothing.
    pub fn hover_list(&mut self, column_id: &str) -> Result<()> {
        let item = self
            .state
            .active_item()
            .cloned()
            .ok_or_else(|| self.invalid("hover"))?;

        let lane = self
            .optimistic
            .lane_index(column_id)
            .ok_or_else(|| CoreError::not_found("column", column_id))?;

        match &item {
            DragItem::Task(task_id) => {
                if self.optimistic.column_of(task_id) != Some(column_id) {
                    let end = self.optimistic.lanes[lane].task_ids.len();
                    self.optimistic.move_task(task_id, lane, end);
                }
            }
            DragItem::Column(_) => return Err(self.invalid("hover a list with a column")),
        }

        self.state = DragState::DraggingOverList {
            item,
            list: column_id.to_string(),
        };
        Ok(())
    }

    /// Pointer left every target. The optimistic layout keeps its last shape
    /// so a later drop outside any target reverts it.
    pub fn leave(&mut self) -> Result<()> {
        let item = self
            .state
            .active_item()
            .cloned()
            .ok_or_else(|| self.invalid("leave"))?;
        self.state = DragState::Dragging { item };
        Ok(())
    }

    /// Finish the drag.
    ///
    /// Over a target, the move to write is returned (`None` if nothing
    /// moved) and the optimistic layout stays pending until
    /// [`confirm`](Self::confirm) or [`rollback`](Self::rollback). With no
    /// target the drag is cancelled.
    pub fn drop(&mut self) -> Result<Option<MoveIntent>> {
        let item = match &self.state {
            DragState::Dragging { .. } => {
                self.cancel()?;
                return Ok(None);
            }
            DragState::DraggingOverItem { item, .. } | DragState::DraggingOverList { item, .. } => {
                item.clone()
            }
            _ => return Err(self.invalid("drop")),
        };

        let intent = self.intent_for(&item);
        self.state = DragState::Dropped {
            intent: intent.clone(),
        };
        Ok(intent)
    }

    /// The dropped move was stored: the optimistic layout becomes persisted.
    pub fn confirm(&mut self) -> Result<()> {
        if !matches!(self.state, DragState::Dropped { .. }) {
            return Err(self.invalid("confirm"));
        }
        self.persisted = self.optimistic.clone();
        Ok(())
    }

    /// Storing the dropped move failed: show the persisted layout again.
    pub fn rollback(&mut self) -> Result<()> {
        if !matches!(self.state, DragState::Dropped { .. }) {
            return Err(self.invalid("roll back"));
        }
        self.optimistic = self.persisted.clone();
        self.state = DragState::Cancelled;
        Ok(())
    }

    pub fn cancel(&mut self) -> Result<()> {
        if self.state.active_item().is_none() {
            return Err(self.invalid("cancel"));
        }
        self.optimistic = self.persisted.clone();
        self.state = DragState::Cancelled;
        Ok(())
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn intent_for(&self, item: &DragItem) -> Option<MoveIntent> {
        match item {
            DragItem::Task(task_id) => {
                let before = self.persisted.locate_task(task_id)?;
                let (lane, index) = self.optimistic.locate_task(task_id)?;
                let before_column = &self.persisted.lanes[before.0].id;
                let after_column = &self.optimistic.lanes[lane].id;
                if before_column == after_column && before.1 == index {
                    return None;
                }
                Some(MoveIntent::Task {
                    task_id: task_id.clone(),
                    to_column: after_column.clone(),
                    to_index: index,
                })
            }
            DragItem::Column(column_id) => {
                let before = self.persisted.lane_index(column_id)?;
                let after = self.optimistic.lane_index(column_id)?;
                (before != after).then(|| MoveIntent::Column {
                    column_id: column_id.clone(),
                    to_index: after,
                })
            }
        }
    }

    fn invalid(&self, event: &str) -> CoreError {
        CoreError::InvalidTransition {
            state: self.state.name().to_string(),
            event: event.to_string(),
        }
    }
}
