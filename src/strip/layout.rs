use serde::{Deserialize, Serialize};

use crate::foundation::core::{Canvas, Rect};
use crate::foundation::error::{StripError, StripResult};

/// Maximum number of photos on one strip.
pub const MAX_SLOTS: usize = 4;

/// Strip arrangement chosen by the user.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum LayoutKind {
    /// Photos stacked top to bottom.
    #[default]
    Vertical,
    /// Two-column grid; three photos use a two-plus-one arrangement.
    Grid,
    /// One square photo above a caption area.
    Polaroid,
}

impl LayoutKind {
    pub const ALL: [LayoutKind; 3] = [Self::Vertical, Self::Grid, Self::Polaroid];

    pub fn id(self) -> &'static str {
        match self {
            Self::Vertical => "vertical",
            Self::Grid => "grid",
            Self::Polaroid => "polaroid",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Vertical => "Classic Strip",
            Self::Grid => "2x2 Grid",
            Self::Polaroid => "Polaroid",
        }
    }

    /// Slot counts this arrangement can hold.
    pub fn supports(self, count: usize) -> bool {
        match self {
            Self::Vertical | Self::Grid => (2..=MAX_SLOTS).contains(&count),
            Self::Polaroid => count == 1,
        }
    }
}

impl std::fmt::Display for LayoutKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

mod vertical {
    pub const WIDTH: f64 = 600.0;
    pub const PHOTO_W: f64 = 520.0;
    pub const PHOTO_H: f64 = 390.0;
    pub const SIDE: f64 = 40.0;
    pub const TOP: f64 = 60.0;
    pub const GAP: f64 = 30.0;
    pub const BOTTOM: f64 = 120.0;
}

mod grid {
    pub const WIDTH: f64 = 900.0;
    pub const CELL_W: f64 = 400.0;
    pub const CELL_H: f64 = 300.0;
    pub const SIDE: f64 = 40.0;
    pub const TOP: f64 = 60.0;
    pub const GAP: f64 = 20.0;
    pub const BOTTOM: f64 = 120.0;
}

mod polaroid {
    pub const WIDTH: f64 = 580.0;
    pub const HEIGHT: f64 = 700.0;
    pub const PHOTO: f64 = 500.0;
    pub const SIDE: f64 = 40.0;
    pub const TOP: f64 = 40.0;
    pub const BOTTOM: f64 = 160.0;
}

/// A validated arrangement: kind plus slot count.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Layout {
    kind: LayoutKind,
    slots: usize,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            kind: LayoutKind::Vertical,
            slots: MAX_SLOTS,
        }
    }
}

impl Layout {
    pub fn new(kind: LayoutKind, slots: usize) -> StripResult<Self> {
        if !kind.supports(slots) {
            return Err(StripError::validation(format!(
                "layout '{kind}' cannot hold {slots} photo(s)"
            )));
        }
        Ok(Self { kind, slots })
    }

    /// Layout for `count` photos, keeping `preferred` when it can hold them.
    ///
    /// One photo always becomes a polaroid; a polaroid asked for more becomes a vertical strip.
    pub fn for_photo_count(preferred: LayoutKind, count: usize) -> StripResult<Self> {
        if !(1..=MAX_SLOTS).contains(&count) {
            return Err(StripError::validation(format!(
                "photo count must be 1..={MAX_SLOTS}, got {count}"
            )));
        }
        let kind = match (preferred, count) {
            (_, 1) => LayoutKind::Polaroid,
            (LayoutKind::Polaroid, _) => LayoutKind::Vertical,
            (k, _) => k,
        };
        Self::new(kind, count)
    }

    pub fn kind(self) -> LayoutKind {
        self.kind
    }

    pub fn slot_count(self) -> usize {
        self.slots
    }

    pub fn canvas(self) -> Canvas {
        let (w, h) = match self.kind {
            LayoutKind::Vertical => {
                let k = self.slots as f64;
                (
                    vertical::WIDTH,
                    vertical::TOP
                        + vertical::PHOTO_H * k
                        + vertical::GAP * (k - 1.0)
                        + vertical::BOTTOM,
                )
            }
            LayoutKind::Grid => {
                let rows = self.grid_rows() as f64;
                (
                    grid::WIDTH,
                    grid::TOP + grid::CELL_H * rows + grid::GAP * (rows - 1.0) + grid::BOTTOM,
                )
            }
            LayoutKind::Polaroid => (polaroid::WIDTH, polaroid::HEIGHT),
        };
        Canvas::new(w as u32, h as u32)
    }

    fn grid_rows(self) -> usize {
        if self.slots <= 2 { 1 } else { 2 }
    }

    /// Photo rectangles in slot order.
    pub fn slot_rects(self) -> Vec<Rect> {
        match self.kind {
            LayoutKind::Vertical => (0..self.slots)
                .map(|i| {
                    let y = vertical::TOP + i as f64 * (vertical::PHOTO_H + vertical::GAP);
                    Rect::new(
                        vertical::SIDE,
                        y,
                        vertical::SIDE + vertical::PHOTO_W,
                        y + vertical::PHOTO_H,
                    )
                })
                .collect(),
            LayoutKind::Grid => {
                let cell = |col: f64, y: f64| {
                    let x = grid::SIDE + col * (grid::CELL_W + grid::GAP);
                    Rect::new(x, y, x + grid::CELL_W, y + grid::CELL_H)
                };
                let row_y = |row: f64| grid::TOP + row * (grid::CELL_H + grid::GAP);
                if self.slots == 3 {
                    let centered = grid::TOP + (grid::CELL_H * 2.0 + grid::GAP - grid::CELL_H) / 2.0;
                    vec![cell(0.0, row_y(0.0)), cell(0.0, row_y(1.0)), cell(1.0, centered)]
                } else {
                    (0..self.slots)
                        .map(|i| cell((i % 2) as f64, row_y((i / 2) as f64)))
                        .collect()
                }
            }
            LayoutKind::Polaroid => vec![Rect::new(
                polaroid::SIDE,
                polaroid::TOP,
                polaroid::SIDE + polaroid::PHOTO,
                polaroid::TOP + polaroid::PHOTO,
            )],
        }
    }

    /// Area reserved under the photos for branding or the polaroid caption.
    pub fn branding_rect(self) -> Rect {
        let canvas = self.canvas();
        let reserve = match self.kind {
            LayoutKind::Vertical => vertical::BOTTOM,
            LayoutKind::Grid => grid::BOTTOM,
            LayoutKind::Polaroid => polaroid::BOTTOM,
        };
        let h = f64::from(canvas.height);
        Rect::new(0.0, h - reserve, f64::from(canvas.width), h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertical_heights_sum_to_canvas() {
        for k in 2..=4 {
            let layout = Layout::new(LayoutKind::Vertical, k).unwrap();
            let rects = layout.slot_rects();
            assert_eq!(rects.len(), k);
            let photos: f64 = rects.iter().map(|r| r.height()).sum();
            let total = vertical::TOP + photos + vertical::GAP * (k as f64 - 1.0) + vertical::BOTTOM;
            assert_eq!(f64::from(layout.canvas().height), total);
            assert_eq!(layout.canvas().width, 600);
        }
        assert_eq!(Layout::new(LayoutKind::Vertical, 2).unwrap().canvas().height, 990);
    }

    #[test]
    fn vertical_slots_end_at_branding() {
        let layout = Layout::new(LayoutKind::Vertical, 3).unwrap();
        let last = layout.slot_rects()[2];
        assert_eq!(last.y1, layout.branding_rect().y0);
    }

    #[test]
    fn grid_rows_follow_slot_count() {
        assert_eq!(Layout::new(LayoutKind::Grid, 2).unwrap().canvas(), Canvas::new(900, 480));
        assert_eq!(Layout::new(LayoutKind::Grid, 4).unwrap().canvas(), Canvas::new(900, 800));
        let four = Layout::new(LayoutKind::Grid, 4).unwrap().slot_rects();
        assert_eq!(four[3], Rect::new(460.0, 380.0, 860.0, 680.0));
    }

    #[test]
    fn grid_of_three_centers_the_right_cell() {
        let rects = Layout::new(LayoutKind::Grid, 3).unwrap().slot_rects();
        assert_eq!(rects[0].x0, rects[1].x0);
        assert_eq!(rects[2].x0, 460.0);
        let left_mid = (rects[0].y0 + rects[1].y1) / 2.0;
        assert_eq!(rects[2].center().y, left_mid);
    }

    #[test]
    fn polaroid_geometry() {
        let layout = Layout::new(LayoutKind::Polaroid, 1).unwrap();
        assert_eq!(layout.canvas(), Canvas::new(580, 700));
        assert_eq!(layout.slot_rects(), vec![Rect::new(40.0, 40.0, 540.0, 540.0)]);
        assert_eq!(layout.branding_rect().height(), 160.0);
    }

    #[test]
    fn photo_count_switches_layout() {
        let v = |k, n| Layout::for_photo_count(k, n).unwrap().kind();
        assert_eq!(v(LayoutKind::Vertical, 1), LayoutKind::Polaroid);
        assert_eq!(v(LayoutKind::Grid, 3), LayoutKind::Grid);
        assert_eq!(v(LayoutKind::Polaroid, 2), LayoutKind::Vertical);
        assert!(Layout::for_photo_count(LayoutKind::Vertical, 0).is_err());
        assert!(Layout::for_photo_count(LayoutKind::Vertical, 5).is_err());
        assert!(Layout::new(LayoutKind::Polaroid, 2).is_err());
    }
}
