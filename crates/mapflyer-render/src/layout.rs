//! A4 page geometry
//!
//! Fixed coordinates for the flyer header, map and QR blocks, plus the
//! columnar address-list layout with page overflow.

/// A4 in PDF points.
pub const A4_WIDTH: f32 = 595.27;
pub const A4_HEIGHT: f32 = 841.89;

/// Columnar layout of the numbered address list.
#[derive(Debug, Clone, PartialEq)]
pub struct AddressLayout {
    pub start_x: f32,
    pub start_y: f32,
    pub column_width: f32,
    pub line_height: f32,
    pub max_lines_per_column: usize,
    pub columns_per_page: usize,
}

impl Default for AddressLayout {
    fn default() -> Self {
        Self {
            start_x: 70.0,
            start_y: 390.0,
            column_width: 165.0,
            line_height: 14.0,
            max_lines_per_column: 23,
            columns_per_page: 3,
        }
    }
}

/// Where one address line lands: page index plus baseline position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Slot {
    pub page: usize,
    pub x: f32,
    pub y: f32,
}

/// Compute the slot for every address index, filling columns top to
/// bottom, then left to right, then overflowing onto further pages.
pub fn address_slots(layout: &AddressLayout, count: usize) -> Vec<Slot> {
    let per_page = layout.max_lines_per_column * layout.columns_per_page;
    (0..count)
        .map(|i| {
            let page = i / per_page;
            let within = i % per_page;
            let column = within / layout.max_lines_per_column;
            let line = within % layout.max_lines_per_column;
            Slot {
                page,
                x: layout.start_x + column as f32 * layout.column_width,
                y: layout.start_y - line as f32 * layout.line_height,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_slot_is_top_of_first_column() {
        let slots = address_slots(&AddressLayout::default(), 1);
        assert_eq!(slots[0], Slot { page: 0, x: 70.0, y: 390.0 });
    }

    #[test]
    fn test_column_break_after_max_lines() {
        let layout = AddressLayout::default();
        let slots = address_slots(&layout, 24);
        assert_eq!(slots[22].x, 70.0);
        assert_eq!(slots[23], Slot { page: 0, x: 235.0, y: 390.0 });
    }

    #[test]
    fn test_page_break_after_last_column() {
        let layout = AddressLayout::default();
        let slots = address_slots(&layout, 70);
        // 3 columns x 23 lines fit on the first page
        assert_eq!(slots[68].page, 0);
        assert_eq!(slots[68].x, 70.0 + 2.0 * 165.0);
        assert_eq!(slots[69], Slot { page: 1, x: 70.0, y: 390.0 });
    }

    #[test]
    fn test_lines_step_down_by_line_height() {
        let slots = address_slots(&AddressLayout::default(), 3);
        assert_eq!(slots[1].y, 376.0);
        assert_eq!(slots[2].y, 362.0);
    }
}
