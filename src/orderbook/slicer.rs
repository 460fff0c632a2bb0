//! Fixed-height row slicing

use serde::{Deserialize, Serialize};

use super::{GroupedLevel, Side};

/// Arrangement of the two sides around the spread row
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// Asks stacked above the spread row, bids below, scrolling vertically
    #[default]
    Vertical,
    /// Asks and bids side by side under a header spread row
    Horizontal,
}

/// Pad or truncate one side to exactly `max_rows` display rows
///
/// Rows nearest the spread survive truncation and placeholders (`None`) are
/// added on the far side. In vertical layout the ask side is reversed so the
/// best ask sits directly above the spread row.
pub fn slice_rows(
    grouped: &[GroupedLevel],
    side: Side,
    max_rows: usize,
    layout: Layout,
) -> Vec<Option<GroupedLevel>> {
    let mut rows: Vec<Option<GroupedLevel>> = grouped
        .iter()
        .take(max_rows)
        .cloned()
        .map(Some)
        .collect();
    rows.resize(max_rows, None);

    if side == Side::Ask && layout == Layout::Vertical {
        rows.reverse();
    }

    rows
}
