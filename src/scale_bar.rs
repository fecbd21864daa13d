use log::debug;

use crate::canvas::{Anchor, Canvas, Shape, BLACK};
use crate::layout::Geometry;
use crate::scale::Scale;

const TICK_HALF: f64 = 1.5;
const TICK_LABEL_DROP: f64 = 5.0;
const TICK_LABEL_SIZE: f64 = 3.0;

/// Genomic positions of the ticks: every `interval` bp from 0, below `longest_span`.
pub fn tick_positions(longest_span: i64, interval: i64) -> Vec<i64> {
    if interval <= 0 {
        return Vec::new();
    }
    (0..longest_span).step_by(interval as usize).collect()
}

/// Draw the ruler in the space below the tracks. Its length matches the
/// longest track because both go through the same `scale`.
pub fn draw_scale_bar(canvas: &mut Canvas, scale: &Scale, longest_span: i64, geometry: &Geometry) {
    let row_y = canvas.height - geometry.scale_bar_space / 2.0;
    let end = geometry.offset + scale.to_drawing(longest_span as f64);

    canvas.push(Shape::Line {
        x1: geometry.offset,
        y1: row_y,
        x2: end,
        y2: row_y,
        stroke: BLACK,
        width: 1.0,
    });

    let ticks = tick_positions(longest_span, geometry.tick_interval);
    debug!("Scale bar at y={} to x={:.2}, {} ticks", row_y, end, ticks.len());

    for num in ticks {
        let x = geometry.offset + scale.to_drawing(num as f64);
        canvas.push(Shape::Line {
            x1: x,
            y1: row_y - TICK_HALF,
            x2: x,
            y2: row_y + TICK_HALF,
            stroke: BLACK,
            width: 0.5,
        });
        canvas.push(Shape::Text {
            x,
            y: row_y + TICK_LABEL_DROP,
            size: TICK_LABEL_SIZE,
            anchor: Anchor::Middle,
            content: num.to_string(),
        });
    }
}
