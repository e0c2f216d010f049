use crate::error::LegendError;
use crate::item::{ItemId, MapItem};
use std::collections::HashMap;

/// The ordered set of items being plotted.
///
/// Insertion order is draw order: later items are drawn on top and legend
/// rows appear in this order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Legend {
    items: Vec<MapItem>,
}

impl Legend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[MapItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn total_points(&self) -> usize {
        self.items.iter().map(MapItem::count).sum()
    }

    /// Append an item under the lowest legend group nobody is using.
    /// Returns the assigned group.
    pub fn add(&mut self, mut item: MapItem) -> u32 {
        let group = self.lowest_available_group();
        item.legend_group = group;
        self.items.push(item);
        group
    }

    /// Append an item keeping whatever group it already carries.
    pub fn push(&mut self, item: MapItem) {
        self.items.push(item);
    }

    pub fn remove(&mut self, id: ItemId) -> Result<MapItem, LegendError> {
        let index = self
            .items
            .iter()
            .position(|item| item.id == id)
            .ok_or(LegendError::UnknownItem(id.0))?;
        Ok(self.items.remove(index))
    }

    /// Drop every item. Overrides die with the items.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn set_group(&mut self, id: ItemId, group: i64) -> Result<(), LegendError> {
        let group = u32::try_from(group).map_err(|_| LegendError::NegativeGroup(group))?;
        self.item_mut(id)?.legend_group = group;
        Ok(())
    }

    pub fn set_override_text(&mut self, id: ItemId, text: Option<String>) -> Result<(), LegendError> {
        self.item_mut(id)?.overriding_legend_text = text;
        Ok(())
    }

    fn item_mut(&mut self, id: ItemId) -> Result<&mut MapItem, LegendError> {
        self.items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or(LegendError::UnknownItem(id.0))
    }

    /// The smallest non-negative group not held by any item.
    pub fn lowest_available_group(&self) -> u32 {
        let n = self.items.len();
        let mut taken = vec![false; n];
        for item in &self.items {
            if let Some(slot) = taken.get_mut(item.legend_group as usize) {
                *slot = true;
            }
        }
        taken
            .iter()
            .position(|taken| !taken)
            .unwrap_or(n) as u32
    }

    /// Groups whose rows are merged under an override text. The first item of
    /// a group carrying a non-blank override wins.
    pub fn overridden_texts(&self) -> HashMap<u32, String> {
        let mut texts = HashMap::new();
        for item in &self.items {
            if let Some(text) = item.override_text() {
                texts
                    .entry(item.legend_group)
                    .or_insert_with(|| text.to_string());
            }
        }
        texts
    }
}

impl FromIterator<MapItem> for Legend {
    fn from_iter<T: IntoIterator<Item = MapItem>>(iter: T) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SpaceId;
    use proptest::prelude::*;

    fn item(id: u32) -> MapItem {
        MapItem::new(ItemId(id), format!("Ed{id}"), format!("Item {id}"), SpaceId(1), vec![])
    }

    #[test]
    fn test_add_assigns_lowest_free_group() {
        let mut legend = Legend::new();
        assert_eq!(legend.add(item(1)), 0);
        assert_eq!(legend.add(item(2)), 1);
        assert_eq!(legend.add(item(3)), 2);

        legend.remove(ItemId(2)).unwrap();
        assert_eq!(legend.add(item(4)), 1);
        assert_eq!(legend.add(item(5)), 3);
    }

    #[test]
    fn test_shared_groups_leave_gaps_assignable() {
        let mut legend = Legend::new();
        legend.add(item(1));
        legend.add(item(2));
        legend.set_group(ItemId(2), 0).unwrap();
        assert_eq!(legend.lowest_available_group(), 1);
    }

    #[test]
    fn test_negative_group_rejected() {
        let mut legend = Legend::new();
        legend.add(item(1));
        assert_eq!(
            legend.set_group(ItemId(1), -3),
            Err(LegendError::NegativeGroup(-3))
        );
    }

    #[test]
    fn test_first_override_wins() {
        let mut legend = Legend::new();
        legend.add(item(1));
        legend.add(item(2));
        legend.add(item(3));
        legend.set_group(ItemId(2), 0).unwrap();
        legend.set_group(ItemId(3), 0).unwrap();
        legend.set_override_text(ItemId(2), Some("Junk".into())).unwrap();
        legend.set_override_text(ItemId(3), Some("Scrap".into())).unwrap();

        let texts = legend.overridden_texts();
        assert_eq!(texts.len(), 1);
        assert_eq!(texts[&0], "Junk");
    }

    #[test]
    fn test_remove_unknown_item() {
        let mut legend = Legend::new();
        assert_eq!(legend.remove(ItemId(9)), Err(LegendError::UnknownItem(9)));
    }

    proptest! {
        #[test]
        fn lowest_available_group_is_free_and_minimal(groups in prop::collection::vec(0u32..12, 0..20)) {
            let legend: Legend = groups
                .iter()
                .enumerate()
                .map(|(i, group)| {
                    let mut item = item(i as u32);
                    item.legend_group = *group;
                    item
                })
                .collect();

            let lowest = legend.lowest_available_group();
            prop_assert!(!groups.contains(&lowest));
            for taken in 0..lowest {
                prop_assert!(groups.contains(&taken));
            }
        }
    }
}
