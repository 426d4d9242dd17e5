//! Ordered-list reconciliation.
//!
//! ## Operations
//!
//! - [`reorder_within_list`]: single-element move inside one list
//! - [`move_across_lists`]: remove from a source list, insert into a destination
//! - [`append_new_item`]: push with `order = len`
//!
//! Indices are clamped rather than rejected.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// An item that occupies a position in an ordered list.
pub trait Ordered {
    fn id(&self) -> &str;
    fn order(&self) -> i32;
    fn set_order(&mut self, order: i32);
}

/// An ordered item that can change its owning list.
pub trait Reparent: Ordered {
    fn set_parent(&mut self, parent_id: &str);
}

/// One row of a list's order assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderEntry {
    pub id: String,
    pub order: i32,
}

/// The complete order assignment of one list.
///
/// Storage writes every entry of a `ListOrder` in a single transaction, so a
/// list is never observed half-renumbered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListOrder {
    pub list_id: String,
    pub entries: Vec<OrderEntry>,
}

impl ListOrder {
    pub fn of<T: Ordered>(list_id: impl Into<String>, items: &[T]) -> Self {
        Self {
            list_id: list_id.into(),
            entries: items
                .iter()
                .map(|item| OrderEntry {
                    id: item.id().to_string(),
                    order: item.order(),
                })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Rewrite every `order` to match its position.
pub fn densify<T: Ordered>(items: &mut [T]) {
    for (index, item) in items.iter_mut().enumerate() {
        item.set_order(index as i32);
    }
}

/// Whether `order` values are exactly `0..n-1` in list order.
pub fn is_dense<T: Ordered>(items: &[T]) -> bool {
    items
        .iter()
        .enumerate()
        .all(|(index, item)| item.order() == index as i32)
}

/// Sort by stored order (stable, so ties keep their current position) and
/// densify. Used to repair lists left with gaps or duplicates.
pub fn normalize<T: Ordered>(mut items: Vec<T>) -> Vec<T> {
    items.sort_by_key(|item| item.order());
    densify(&mut items);
    items
}

/// Move the item at `from` to `to` within one list.
///
/// Both indices are clamped to `[0, len-1]`. When they are equal the input is
/// returned untouched.
pub fn reorder_within_list<T: Ordered>(mut list: Vec<T>, from: usize, to: usize) -> Vec<T> {
    if list.is_empty() {
        return list;
    }
    let last = list.len() - 1;
    let from = from.min(last);
    let to = to.min(last);
    if from == to {
        return list;
    }

    let item = list.remove(from);
    list.insert(to, item);
    densify(&mut list);
    list
}

/// Move `item_id` from `source` into `dest` at `dest_index`.
///
/// `dest_index` is clamped to `[0, dest.len()]`. The moved item is reparented
/// to `dest_list_id` and both lists come back densely ordered.
///
/// # Errors
/// Returns `NotFound` if `item_id` is not in `source`.
pub fn move_across_lists<T: Reparent>(
    mut source: Vec<T>,
    mut dest: Vec<T>,
    item_id: &str,
    dest_list_id: &str,
    dest_index: usize,
) -> Result<(Vec<T>, Vec<T>)> {
    let position = source
        .iter()
        .position(|item| item.id() == item_id)
        .ok_or_else(|| CoreError::not_found("item", item_id))?;

    let mut item = source.remove(position);
    item.set_parent(dest_list_id);
    let index = dest_index.min(dest.len());
    dest.insert(index, item);

    densify(&mut source);
    densify(&mut dest);
    Ok((source, dest))
}

/// Append `item` with `order = list.len()`.
pub fn append_new_item<T: Ordered>(mut list: Vec<T>, mut item: T) -> Vec<T> {
    item.set_order(list.len() as i32);
    list.push(item);
    list
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Card {
        id: String,
        list: String,
        order: i32,
    }

    impl Ordered for Card {
        fn id(&self) -> &str {
            &self.id
        }
        fn order(&self) -> i32 {
            self.order
        }
        fn set_order(&mut self, order: i32) {
            self.order = order;
        }
    }

    impl Reparent for Card {
        fn set_parent(&mut self, parent_id: &str) {
            self.list = parent_id.to_string();
        }
    }

    fn lane(list: &str, ids: &[&str]) -> Vec<Card> {
        ids.iter()
            .enumerate()
            .map(|(i, id)| Card {
                id: id.to_string(),
                list: list.to_string(),
                order: i as i32,
            })
            .collect()
    }

    fn ids(cards: &[Card]) -> Vec<&str> {
        cards.iter().map(|c| c.id.as_str()).collect()
    }

    fn orders(cards: &[Card]) -> Vec<i32> {
        cards.iter().map(|c| c.order).collect()
    }

    #[test]
    fn reorder_last_to_first() {
        let column = reorder_within_list(lane("A", &["T1", "T2", "T3"]), 2, 0);
        assert_eq!(ids(&column), vec!["T3", "T1", "T2"]);
        assert_eq!(orders(&column), vec![0, 1, 2]);
    }

    #[test]
    fn reorder_first_to_last() {
        let column = reorder_within_list(lane("A", &["T1", "T2", "T3"]), 0, 2);
        assert_eq!(ids(&column), vec!["T2", "T3", "T1"]);
        assert!(is_dense(&column));
    }

    #[test]
    fn reorder_same_index_is_identity() {
        let mut input = lane("A", &["T1", "T2"]);
        input[1].order = 7;
        let output = reorder_within_list(input.clone(), 1, 1);
        assert_eq!(output, input);
    }

    #[test]
    fn reorder_clamps_indices() {
        let column = reorder_within_list(lane("A", &["T1", "T2", "T3"]), 0, 99);
        assert_eq!(ids(&column), vec!["T2", "T3", "T1"]);

        let unchanged = reorder_within_list(lane("A", &["T1", "T2", "T3"]), 50, 99);
        assert_eq!(ids(&unchanged), vec!["T1", "T2", "T3"]);
    }

    #[test]
    fn reorder_empty_list() {
        let column: Vec<Card> = reorder_within_list(Vec::new(), 0, 3);
        assert!(column.is_empty());
    }

    #[test]
    fn move_between_columns() {
        let (a, b) = move_across_lists(
            lane("A", &["T1", "T2", "T3"]),
            lane("B", &["T4"]),
            "T2",
            "B",
            0,
        )
        .unwrap();
        assert_eq!(ids(&a), vec!["T1", "T3"]);
        assert_eq!(orders(&a), vec![0, 1]);
        assert_eq!(ids(&b), vec!["T2", "T4"]);
        assert_eq!(orders(&b), vec![0, 1]);
        assert_eq!(b[0].list, "B");
    }

    #[test]
    fn move_clamps_destination_index() {
        let (a, b) =
            move_across_lists(lane("A", &["T1"]), lane("B", &["T4", "T5"]), "T1", "B", 40)
                .unwrap();
        assert!(a.is_empty());
        assert_eq!(ids(&b), vec!["T4", "T5", "T1"]);
        assert!(is_dense(&b));
    }

    #[test]
    fn move_into_empty_list() {
        let (a, b) = move_across_lists(lane("A", &["T1", "T2"]), Vec::new(), "T1", "B", 0).unwrap();
        assert_eq!(ids(&a), vec!["T2"]);
        assert_eq!(a[0].order, 0);
        assert_eq!(ids(&b), vec!["T1"]);
    }

    #[test]
    fn move_missing_item_is_not_found() {
        let err = move_across_lists(lane("A", &["T1"]), lane("B", &[]), "T9", "B", 0).unwrap_err();
        assert!(matches!(err, CoreError::NotFound { .. }));
    }

    #[test]
    fn append_uses_length_as_order() {
        let list = append_new_item(
            lane("A", &["T1", "T2"]),
            Card {
                id: "T3".into(),
                list: "A".into(),
                order: -4,
            },
        );
        assert_eq!(orders(&list), vec![0, 1, 2]);

        let first = append_new_item(
            Vec::new(),
            Card {
                id: "T1".into(),
                list: "A".into(),
                order: 9,
            },
        );
        assert_eq!(first[0].order, 0);
    }

    #[test]
    fn normalize_repairs_gaps_and_duplicates() {
        let mut broken = lane("A", &["T1", "T2", "T3", "T4"]);
        broken[0].order = 5;
        broken[1].order = 2;
        broken[2].order = 2;
        broken[3].order = 9;
        let fixed = normalize(broken);
        assert_eq!(ids(&fixed), vec!["T2", "T3", "T1", "T4"]);
        assert!(is_dense(&fixed));
    }

    #[test]
    fn list_order_captures_assignment() {
        let order = ListOrder::of("A", &lane("A", &["T1", "T2"]));
        assert_eq!(order.list_id, "A");
        assert_eq!(order.len(), 2);
        assert_eq!(
            order.entries[1],
            OrderEntry {
                id: "T2".into(),
                order: 1
            }
        );
    }
}
