use log::{debug, info};
use rustc_hash::FxHashMap;

use crate::error::{Result, SyntenyError};
use crate::gff::{AnnotationSet, FALLBACK_CATEGORY};

pub type Rgb = (u8, u8, u8);

/// Neutral grey reserved for genes without a category.
pub const FALLBACK_COLOR: Rgb = (194, 194, 194);

/// Qualitative palettes, same values as the matplotlib colormaps of the same name.
const PASTEL1: [(u8, u8, u8); 9] = [
    (251, 180, 174), (179, 205, 227), (204, 235, 197), (222, 203, 228),
    (254, 217, 166), (255, 255, 204), (229, 216, 189), (253, 218, 236),
    (242, 242, 242),
];

const PASTEL2: [(u8, u8, u8); 8] = [
    (179, 226, 205), (253, 205, 172), (203, 213, 232), (244, 202, 228),
    (230, 245, 201), (255, 242, 174), (241, 226, 204), (204, 204, 204),
];

const SET1: [(u8, u8, u8); 9] = [
    (228, 26, 28), (55, 126, 184), (77, 175, 74), (152, 78, 163),
    (255, 127, 0), (255, 255, 51), (166, 86, 40), (247, 129, 191),
    (153, 153, 153),
];

const SET2: [(u8, u8, u8); 8] = [
    (102, 194, 165), (252, 141, 98), (141, 160, 203), (231, 138, 195),
    (166, 216, 84), (255, 217, 47), (229, 196, 148), (179, 179, 179),
];

const SET3: [(u8, u8, u8); 12] = [
    (141, 211, 199), (255, 255, 179), (190, 186, 218), (251, 128, 114),
    (128, 177, 211), (253, 180, 98), (179, 222, 105), (252, 205, 229),
    (217, 217, 217), (188, 128, 189), (204, 235, 197), (255, 237, 111),
];

const ACCENT: [(u8, u8, u8); 8] = [
    (127, 201, 127), (190, 174, 212), (253, 192, 134), (255, 255, 153),
    (56, 108, 176), (240, 2, 127), (191, 91, 23), (102, 102, 102),
];

const DARK2: [(u8, u8, u8); 8] = [
    (27, 158, 119), (217, 95, 2), (117, 112, 179), (231, 41, 138),
    (102, 166, 30), (230, 171, 2), (166, 118, 29), (102, 102, 102),
];

const PAIRED: [(u8, u8, u8); 12] = [
    (166, 206, 227), (31, 120, 180), (178, 223, 138), (51, 160, 44),
    (251, 154, 153), (227, 26, 28), (253, 191, 111), (255, 127, 0),
    (202, 178, 214), (106, 61, 154), (255, 255, 153), (177, 89, 40),
];

const TAB10: [(u8, u8, u8); 10] = [
    (31, 119, 180), (255, 127, 14), (44, 160, 44), (214, 39, 40),
    (148, 103, 189), (140, 86, 75), (227, 119, 194), (127, 127, 127),
    (188, 189, 34), (23, 190, 207),
];

/// A named, ordered list of category colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub name: &'static str,
    pub colors: &'static [Rgb],
}

pub const PALETTES: [Palette; 9] = [
    Palette { name: "Pastel1", colors: &PASTEL1 },
    Palette { name: "Pastel2", colors: &PASTEL2 },
    Palette { name: "Set1", colors: &SET1 },
    Palette { name: "Set2", colors: &SET2 },
    Palette { name: "Set3", colors: &SET3 },
    Palette { name: "Accent", colors: &ACCENT },
    Palette { name: "Dark2", colors: &DARK2 },
    Palette { name: "Paired", colors: &PAIRED },
    Palette { name: "tab10", colors: &TAB10 },
];

impl Palette {
    /// Look a palette up by name, ignoring case.
    pub fn by_name(name: &str) -> Result<Palette> {
        PALETTES
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name.trim()))
            .copied()
            .ok_or_else(|| SyntenyError::UnknownPalette {
                name: name.to_string(),
                known: PALETTES.iter().map(|p| p.name).collect::<Vec<_>>().join(", "),
            })
    }
}

/// Format a color as `#rrggbb`.
pub fn to_hex((r, g, b): Rgb) -> String {
    format!("#{:02x}{:02x}{:02x}", r, g, b)
}

/// Category to color assignments, in the order categories were first seen.
#[derive(Debug, Clone, Default)]
pub struct ColorTable {
    entries: Vec<(String, Rgb)>,
    index: FxHashMap<String, usize>,
}

impl ColorTable {
    fn insert(&mut self, category: &str, color: Rgb) {
        match self.index.get(category) {
            Some(&i) => self.entries[i].1 = color,
            None => {
                self.index.insert(category.to_string(), self.entries.len());
                self.entries.push((category.to_string(), color));
            }
        }
    }

    pub fn contains(&self, category: &str) -> bool {
        self.index.contains_key(category)
    }

    /// Color of a category. Unknown categories are drawn like unannotated genes.
    pub fn get(&self, category: &str) -> Rgb {
        self.index
            .get(category)
            .map(|&i| self.entries[i].1)
            .unwrap_or(FALLBACK_COLOR)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Rgb)> {
        self.entries.iter().map(|(c, rgb)| (c.as_str(), *rgb))
    }
}

/// Assign a palette color to every gene category, walking tracks in drawing
/// order and genes in file order. The fallback category never takes a
/// palette slot and is always grey.
pub fn color_genes(annotations: &AnnotationSet, palette: Palette) -> Result<ColorTable> {
    let mut table = ColorTable::default();
    let mut next = 0usize;

    for (_, contig) in annotations.iter() {
        for gene in &contig.genes {
            if gene.category == FALLBACK_CATEGORY || table.contains(&gene.category) {
                continue;
            }
            let Some(&color) = palette.colors.get(next) else {
                let required = annotations
                    .iter()
                    .flat_map(|(_, c)| c.genes.iter())
                    .filter(|g| g.is_annotated())
                    .map(|g| g.category.as_str())
                    .collect::<rustc_hash::FxHashSet<_>>()
                    .len();
                return Err(SyntenyError::PaletteExhausted {
                    palette: palette.name.to_string(),
                    available: palette.colors.len(),
                    required,
                });
            };
            debug!("Category {:?} -> {}", gene.category, to_hex(color));
            table.insert(&gene.category, color);
            next += 1;
        }
    }

    table.insert(FALLBACK_CATEGORY, FALLBACK_COLOR);

    info!("Assigned {} category colors from {}", next, palette.name);
    Ok(table)
}
