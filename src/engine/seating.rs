use crate::domain::{SeatNumber, TOP_SEAT};

/// Viewports narrower than this get the compact circle.
pub const COMPACT_VIEWPORT_WIDTH: u32 = 768;
pub const COMPACT_RADIUS: f64 = 110.0;
pub const WIDE_RADIUS: f64 = 120.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SeatPosition {
    pub seat: SeatNumber,
    pub angle_degrees: f64,
    pub x: f64,
    pub y: f64,
}

/// Order seats for display: the top seat first, the rest ascending.
pub fn seat_order(available: &[SeatNumber]) -> Vec<SeatNumber> {
    let mut ordered = available.to_vec();
    ordered.sort_by_key(|&seat| (seat != TOP_SEAT, seat));
    ordered
}

/// Place the available seats evenly on a circle of `radius`.
///
/// Index 0 sits at -90 degrees (straight up, screen coordinates grow downwards).
pub fn seat_layout(available: &[SeatNumber], radius: f64) -> Vec<SeatPosition> {
    let ordered = seat_order(available);
    if ordered.is_empty() {
        return Vec::new();
    }

    let step = 360.0 / ordered.len() as f64;
    ordered
        .into_iter()
        .enumerate()
        .map(|(index, seat)| {
            let angle_degrees = index as f64 * step - 90.0;
            let radians = angle_degrees.to_radians();
            SeatPosition {
                seat,
                angle_degrees,
                x: radius * radians.cos(),
                y: radius * radians.sin(),
            }
        })
        .collect()
}

pub fn radius_for_viewport(width: u32) -> f64 {
    if width < COMPACT_VIEWPORT_WIDTH {
        COMPACT_RADIUS
    } else {
        WIDE_RADIUS
    }
}
