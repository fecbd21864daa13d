use std::fmt::Write;

use crate::colors::{to_hex, Rgb};

pub const BLACK: Rgb = (0, 0, 0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Start,
    Middle,
}

/// A drawing primitive in logical canvas units, y growing downward.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        stroke: Rgb,
        width: f64,
    },
    Polyline {
        points: Vec<(f64, f64)>,
        stroke: Rgb,
        width: f64,
    },
    Text {
        x: f64,
        y: f64,
        size: f64,
        anchor: Anchor,
        content: String,
    },
}

/// Drawing surface for one render. Shapes are serialized in insertion order.
#[derive(Debug, Clone)]
pub struct Canvas {
    pub width: f64,
    pub height: f64,
    pixel_scale: f64,
    shapes: Vec<Shape>,
}

impl Canvas {
    pub fn new(width: f64, height: f64, pixel_scale: f64) -> Self {
        Canvas {
            width,
            height,
            pixel_scale,
            shapes: Vec::new(),
        }
    }

    pub fn push(&mut self, shape: Shape) {
        self.shapes.push(shape);
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    /// Serialize to an SVG document. The viewBox keeps logical units while
    /// `width`/`height` carry the pixel scale.
    pub fn to_svg(&self) -> String {
        let mut svg = String::new();

        let _ = write!(
            svg,
            r#"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}">
<style>
  text {{ font-family: 'DejaVu Sans', Arial, sans-serif; }}
</style>
<rect width="100%" height="100%" fill="white"/>
"#,
            num(self.width * self.pixel_scale),
            num(self.height * self.pixel_scale),
            num(self.width),
            num(self.height)
        );

        for shape in &self.shapes {
            match shape {
                Shape::Line { x1, y1, x2, y2, stroke, width } => {
                    let _ = writeln!(
                        svg,
                        r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{}" stroke-width="{}" fill="none"/>"#,
                        num(*x1),
                        num(*y1),
                        num(*x2),
                        num(*y2),
                        to_hex(*stroke),
                        num(*width)
                    );
                }
                Shape::Polyline { points, stroke, width } => {
                    let coords: Vec<String> = points
                        .iter()
                        .map(|(x, y)| format!("{},{}", num(*x), num(*y)))
                        .collect();
                    let _ = writeln!(
                        svg,
                        r#"<polyline points="{}" stroke="{}" stroke-width="{}" fill="none"/>"#,
                        coords.join(" "),
                        to_hex(*stroke),
                        num(*width)
                    );
                }
                Shape::Text { x, y, size, anchor, content } => {
                    let anchor = match anchor {
                        Anchor::Start => "start",
                        Anchor::Middle => "middle",
                    };
                    let _ = writeln!(
                        svg,
                        r#"<text x="{}" y="{}" font-size="{}" text-anchor="{}" fill="black">{}</text>"#,
                        num(*x),
                        num(*y),
                        num(*size),
                        anchor,
                        escape_xml(content)
                    );
                }
            }
        }

        svg.push_str("</svg>\n");
        svg
    }
}

/// Coordinates with at most three decimals and no trailing zeros.
fn num(v: f64) -> String {
    let s = format!("{:.3}", v);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

/// Escape special XML characters
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
