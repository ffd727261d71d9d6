//! Assignment of dimension keys to grid slots

use super::{DimOption, ViewDim, ViewDimKey};
use crate::error::{Error, Result};
use crate::range::{PosRange, PosRangeConfig, PosRangeStyle};

/// Dimensions with at most this many values get no range window
pub const RANGE_MIN_VALUES: usize = 3;

/// Initial upper end of a range window (1-based)
pub const RANGE_INITIAL_MAX: usize = 6;

/// Label of a shared slot, alternating between rows and columns
pub fn shared_slot_label(idx: usize) -> String {
    let name = if idx % 2 == 0 { "Row" } else { "Column" };
    format!("Along {} {}", name, idx / 2 + 1)
}

/// Label of a type-specific slot
pub fn type_slot_label(idx: usize) -> String {
    format!("Dim {}", idx + 1)
}

/// Keys assigned to the slots of one dimension list
#[derive(Debug, Clone, PartialEq)]
pub struct SlotAssignment {
    options: Vec<DimOption>,
    slots: Vec<ViewDimKey>,
}

impl SlotAssignment {
    /// One slot per option. Slots take the stored keys first, skipping keys
    /// that are no longer offered or already used, then the unused options
    /// in order.
    pub fn assign(options: Vec<DimOption>, stored: &[String]) -> Self {
        let mut slots: Vec<ViewDimKey> = Vec::with_capacity(options.len());
        let mut stored_iter = stored
            .iter()
            .filter_map(|text| text.parse::<ViewDimKey>().ok());

        for _ in 0..options.len() {
            let from_stored = stored_iter
                .by_ref()
                .find(|key| !slots.contains(key) && options.iter().any(|o| &o.key == key));
            let key = match from_stored {
                Some(key) => key,
                None => match options.iter().find(|o| !slots.contains(&o.key)) {
                    Some(option) => option.key.clone(),
                    None => break,
                },
            };
            slots.push(key);
        }

        Self { options, slots }
    }

    pub fn options(&self) -> &[DimOption] {
        &self.options
    }

    pub fn slots(&self) -> &[ViewDimKey] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn option(&self, key: &ViewDimKey) -> Option<&DimOption> {
        self.options.iter().find(|o| &o.key == key)
    }

    /// Put `key` into `slot`. A slot that already held `key` receives the
    /// key freed by `slot`; its index is returned.
    pub fn select(&mut self, slot: usize, key: ViewDimKey) -> Result<Option<usize>> {
        if self.option(&key).is_none() {
            return Err(Error::view_dim(format!("dimension '{}' not available", key)));
        }
        let Some(current) = self.slots.get(slot).cloned() else {
            return Err(Error::view_dim(format!("no dimension slot {}", slot)));
        };
        if current == key {
            return Ok(None);
        }

        let other = self
            .slots
            .iter()
            .enumerate()
            .position(|(idx, k)| idx != slot && k == &key);
        self.slots[slot] = key;
        if let Some(other) = other {
            self.slots[other] = current;
        }
        Ok(other)
    }

    /// Keys as persisted strings
    pub fn to_stored(&self) -> Vec<String> {
        self.slots.iter().map(ToString::to_string).collect()
    }

    /// Dimensions in slot order, with the given ranges
    pub fn view_dims<F>(&self, mut range_of: F) -> Vec<ViewDim>
    where
        F: FnMut(&ViewDimKey) -> Option<(usize, usize)>,
    {
        self.slots
            .iter()
            .map(|key| ViewDim {
                key: key.clone(),
                range: range_of(key),
            })
            .collect()
    }
}

/// Range window of a dimension, if it has enough values.
///
/// Windows are 1-based; the maximal width depends on the dimension kind.
pub fn range_for_option(option: &DimOption) -> Option<PosRange> {
    let count = option.value_count;
    if count <= RANGE_MIN_VALUES {
        return None;
    }
    let width_limit = match option.key {
        ViewDimKey::Group(_) => 100,
        ViewDimKey::ArtefactCommon(_) => 20,
        ViewDimKey::Artefact { .. } => 10,
        ViewDimKey::ArtefactType => return None,
    };

    Some(PosRange::new(PosRangeConfig {
        total_min: 1.0,
        total_max: count as f64,
        value_min: 1.0,
        value_max: RANGE_INITIAL_MAX.min(count) as f64,
        range_min: 1.0,
        range_max: width_limit.min(count) as f64,
        step: 1.0,
        label: option.label.clone(),
        style: PosRangeStyle::Stacked,
        use_range_step: false,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn option(key: ViewDimKey, count: usize) -> DimOption {
        DimOption {
            label: key.var_id().to_string(),
            key,
            value_count: count,
        }
    }

    fn grp(var: &str) -> ViewDimKey {
        ViewDimKey::Group(var.to_string())
    }

    #[test]
    fn test_slot_labels() {
        assert_eq!(shared_slot_label(0), "Along Row 1");
        assert_eq!(shared_slot_label(1), "Along Column 1");
        assert_eq!(shared_slot_label(2), "Along Row 2");
        assert_eq!(type_slot_label(0), "Dim 1");
    }

    #[test]
    fn test_assign_uses_stored_order_then_fills() {
        let options = vec![
            option(grp("a"), 2),
            option(grp("b"), 2),
            option(ViewDimKey::ArtefactType, 2),
        ];
        let stored = vec![
            "arttype".to_string(),
            "grp:gone".to_string(),
            "arttype".to_string(),
            "grp:b".to_string(),
        ];
        let slots = SlotAssignment::assign(options, &stored);
        assert_eq!(
            slots.slots(),
            &[ViewDimKey::ArtefactType, grp("b"), grp("a")]
        );
        assert_eq!(slots.to_stored(), vec!["arttype", "grp:b", "grp:a"]);
    }

    #[test]
    fn test_select_swaps_duplicate() {
        let options = vec![option(grp("a"), 2), option(grp("b"), 2), option(grp("c"), 2)];
        let mut slots = SlotAssignment::assign(options, &[]);
        assert_eq!(slots.select(0, grp("c")).unwrap(), Some(2));
        assert_eq!(slots.slots(), &[grp("c"), grp("b"), grp("a")]);

        assert_eq!(slots.select(1, grp("b")).unwrap(), None);
        assert!(slots.select(1, grp("zz")).is_err());
        assert!(slots.select(7, grp("a")).is_err());
    }

    #[test]
    fn test_range_only_for_more_than_three_values() {
        assert!(range_for_option(&option(grp("a"), 3)).is_none());

        let range = range_for_option(&option(grp("a"), 4)).unwrap();
        assert_eq!(range.value_min(), 1.0);
        assert_eq!(range.value_max(), 4.0);
        assert_eq!(range.index_window(), (0, 3));
    }

    #[test]
    fn test_range_width_limit_per_kind() {
        let grp_range = range_for_option(&option(grp("a"), 500)).unwrap();
        assert_eq!(grp_range.range_max(), 100.0);
        assert_eq!(grp_range.value_max(), 6.0);

        let common = range_for_option(&option(ViewDimKey::ArtefactCommon("f".into()), 50)).unwrap();
        assert_eq!(common.range_max(), 20.0);

        let art = range_for_option(&option(
            ViewDimKey::Artefact {
                type_id: "rgb".into(),
                var: "f".into(),
            },
            8,
        ))
        .unwrap();
        assert_eq!(art.range_max(), 8.0);

        assert!(range_for_option(&option(ViewDimKey::ArtefactType, 9)).is_none());
    }
}
