//! Dense ordering for sibling lists (columns in a board, tasks in a column).
//!
//! The reconciler functions are pure: they take owned lists and return new
//! lists whose `order` fields form `0..n-1`. Storage persists the resulting
//! [`ListOrder`] for each affected list inside one transaction.

pub mod drag;
mod reconciler;

pub use drag::{BoardLayout, DragItem, DragSession, DragState, Lane, MoveIntent};
pub use reconciler::{
    append_new_item, densify, is_dense, move_across_lists, normalize, reorder_within_list,
    ListOrder, OrderEntry, Ordered, Reparent,
};
