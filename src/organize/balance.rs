//! Greedy size balancing of document groups across output lots.

use crate::domain::{DocumentGroup, OutputLot};

/// Distributes groups over `ceil(groups / max_docs_per_lot)` lots, placing
/// each group (largest first) into the lot with the smallest byte total.
///
/// `max_docs_per_lot` counts document groups and only sizes the lot count;
/// zero means unbounded, which collapses everything into a single lot. Ties
/// for the lightest lot go to the earliest lot.
pub fn balance(groups: Vec<DocumentGroup>, max_docs_per_lot: usize) -> Vec<OutputLot> {
    if groups.is_empty() {
        return Vec::new();
    }

    let lot_count = if max_docs_per_lot == 0 {
        1
    } else {
        groups.len().div_ceil(max_docs_per_lot)
    };

    let mut sorted = groups;
    // stable: equal-sized groups keep their incoming order
    sorted.sort_by(|a, b| b.total_size_bytes().cmp(&a.total_size_bytes()));

    let mut lots: Vec<OutputLot> = (0..lot_count).map(|_| OutputLot::default()).collect();
    for group in sorted {
        if let Some(lightest) = lots.iter_mut().min_by_key(|lot| lot.total_size_bytes()) {
            lightest.groups.push(group);
        }
    }

    lots
}
