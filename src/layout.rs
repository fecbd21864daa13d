use log::debug;

use crate::canvas::{Anchor, Canvas, Shape, BLACK};
use crate::colors::ColorTable;
use crate::gff::{AnnotationSet, ContigAnnotation, GeneRecord, Strand};
use crate::scale::Scale;

/// Fixed dimensions of the diagram, in logical canvas units unless noted.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    pub width: f64,
    /// x of every track start and of the scale bar origin.
    pub offset: f64,
    /// Room left for the longest track once side margins are taken.
    pub drawing_width: f64,
    pub track_pitch: f64,
    /// Extra height below the tracks, holding the scale bar.
    pub scale_bar_space: f64,
    pub pixel_scale: f64,
    pub label_chars: usize,
    pub label_x: f64,
    pub track_label_size: f64,
    pub gene_label_size: f64,
    pub gene_label_drop: f64,
    pub baseline_width: f64,
    pub gene_width: f64,
    /// Chevron spacing in bp.
    pub chevron_spacing: f64,
    pub chevron_inset: f64,
    pub chevron_half: f64,
    pub chevron_width: f64,
    /// Scale bar tick spacing in bp.
    pub tick_interval: i64,
}

impl Default for Geometry {
    fn default() -> Self {
        Geometry {
            width: 500.0,
            offset: 30.0,
            drawing_width: 450.0,
            track_pitch: 25.0,
            scale_bar_space: 50.0,
            pixel_scale: 2.0,
            label_chars: 10,
            label_x: 2.0,
            track_label_size: 6.0,
            gene_label_size: 5.0,
            gene_label_drop: 10.0,
            baseline_width: 2.0,
            gene_width: 6.0,
            chevron_spacing: 700.0,
            chevron_inset: 3.0,
            chevron_half: 2.0,
            chevron_width: 0.2,
            tick_interval: 1000,
        }
    }
}

impl Geometry {
    pub fn canvas_height(&self, tracks: usize) -> f64 {
        self.track_pitch * tracks as f64 + self.scale_bar_space
    }

    pub fn canvas(&self, tracks: usize) -> Canvas {
        Canvas::new(self.width, self.canvas_height(tracks), self.pixel_scale)
    }
}

/// Per-track values the gene placement depends on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackContext {
    pub row_y: f64,
    pub offset: f64,
    pub min_coord: i64,
}

impl TrackContext {
    pub fn new(index: usize, contig: &ContigAnnotation, geometry: &Geometry) -> Self {
        TrackContext {
            row_y: geometry.track_pitch * (index + 1) as f64,
            offset: geometry.offset,
            min_coord: contig.min_coord,
        }
    }

    fn x(&self, coord: i64, scale: &Scale) -> f64 {
        scale.to_drawing((coord - self.min_coord) as f64) + self.offset
    }
}

/// Where a gene lands on its track. The tail is the 5' end, the head the 3'
/// end, so on the reverse strand the head is left of the tail.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenePlacement {
    pub tail_x: f64,
    pub head_x: f64,
    pub strand: Strand,
}

impl GenePlacement {
    pub fn left(&self) -> f64 {
        self.tail_x.min(self.head_x)
    }

    pub fn right(&self) -> f64 {
        self.tail_x.max(self.head_x)
    }

    pub fn midpoint(&self) -> f64 {
        self.tail_x + (self.head_x - self.tail_x) / 2.0
    }

    /// +1 when chevrons point right, -1 when they point left.
    pub fn direction(&self) -> f64 {
        match self.strand {
            Strand::Forward => 1.0,
            Strand::Reverse => -1.0,
        }
    }
}

pub fn place_gene(gene: &GeneRecord, ctx: &TrackContext, scale: &Scale) -> GenePlacement {
    let (tail, head) = match gene.strand {
        Strand::Forward => (gene.start, gene.end),
        Strand::Reverse => (gene.end, gene.start),
    };
    GenePlacement {
        tail_x: ctx.x(tail, scale),
        head_x: ctx.x(head, scale),
        strand: gene.strand,
    }
}

/// x positions of the chevron apexes along a gene, left to right. Empty when
/// the gene is too short to fit one inside the insets. Parts of the gene off
/// the canvas get no chevrons.
pub fn chevron_positions(placement: &GenePlacement, scale: &Scale, geometry: &Geometry) -> Vec<f64> {
    let first = placement.left() + geometry.chevron_inset;
    let last = (placement.right() - geometry.chevron_inset).min(geometry.width);
    let step = scale.to_drawing(geometry.chevron_spacing).max(1.0);

    // keep the stepping phase of `first` when skipping to the canvas edge
    let mut x = if first < 0.0 {
        first + ((0.0 - first) / step).ceil() * step
    } else {
        first
    };
    let mut positions = Vec::new();
    while x < last {
        positions.push(x);
        x += step;
    }
    positions
}

/// Angle bracket with its apex at `(x, y)`, opening away from `direction`.
fn chevron(x: f64, y: f64, direction: f64, geometry: &Geometry) -> Shape {
    let back = x - geometry.chevron_half * direction;
    Shape::Polyline {
        points: vec![
            (back, y - geometry.chevron_half),
            (x, y),
            (back, y + geometry.chevron_half),
        ],
        stroke: BLACK,
        width: geometry.chevron_width,
    }
}

fn draw_gene(
    canvas: &mut Canvas,
    gene: &GeneRecord,
    ctx: &TrackContext,
    scale: &Scale,
    colors: &ColorTable,
    geometry: &Geometry,
) {
    let placement = place_gene(gene, ctx, scale);

    canvas.push(Shape::Line {
        x1: placement.tail_x,
        y1: ctx.row_y,
        x2: placement.head_x,
        y2: ctx.row_y,
        stroke: colors.get(&gene.category),
        width: geometry.gene_width,
    });

    let positions = chevron_positions(&placement, scale, geometry);
    debug!(
        "{} {}-{} {:?} -> {:.2}..{:.2}, {} chevrons",
        gene.contig_id,
        gene.start,
        gene.end,
        gene.strand,
        placement.left(),
        placement.right(),
        positions.len()
    );
    for x in positions {
        canvas.push(chevron(x, ctx.row_y, placement.direction(), geometry));
    }

    // No collision handling: neighbouring labels may overlap.
    if gene.is_annotated() {
        canvas.push(Shape::Text {
            x: placement.midpoint(),
            y: ctx.row_y + geometry.gene_label_drop,
            size: geometry.gene_label_size,
            anchor: Anchor::Middle,
            content: gene.category.clone(),
        });
    }
}

/// Draw one track per contig, top to bottom in insertion order.
pub fn draw_tracks(
    canvas: &mut Canvas,
    annotations: &AnnotationSet,
    scale: &Scale,
    colors: &ColorTable,
    geometry: &Geometry,
) {
    for (idx, (label, contig)) in annotations.iter().enumerate() {
        let ctx = TrackContext::new(idx, contig, geometry);
        let length = scale.to_drawing(contig.span() as f64);
        debug!("Track {:?} at y={}, length {:.2}", label, ctx.row_y, length);

        canvas.push(Shape::Line {
            x1: ctx.offset,
            y1: ctx.row_y,
            x2: ctx.offset + length,
            y2: ctx.row_y,
            stroke: BLACK,
            width: geometry.baseline_width,
        });
        canvas.push(Shape::Text {
            x: geometry.label_x,
            y: ctx.row_y + 1.0,
            size: geometry.track_label_size,
            anchor: Anchor::Start,
            content: label.chars().take(geometry.label_chars).collect(),
        });

        for gene in &contig.genes {
            draw_gene(canvas, gene, &ctx, scale, colors, geometry);
        }
    }
}
