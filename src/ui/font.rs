//! Monospace 8x8 bitmap text and font-size fitting.

use font8x8::legacy::{BASIC_LEGACY, LATIN_LEGACY};

pub const DEFAULT_FONT_SIZE: f32 = 40.0;
pub const MIN_FONT_SIZE: f32 = 20.0;
/// Search stops once the bracket is this narrow, in px.
const FONT_SIZE_TOLERANCE: f32 = 3.0;

/// Representative score label; totals render with one decimal.
pub const SCORE_SAMPLE: &str = "000.0";

/// Row bitmaps for `ch`; bit 0 is the leftmost pixel. Unknown characters render as '?'.
pub fn glyph(ch: char) -> [u8; 8] {
    let code = ch as usize;
    if code < BASIC_LEGACY.len() {
        BASIC_LEGACY[code]
    } else if (0xA0..0xA0 + LATIN_LEGACY.len()).contains(&code) {
        LATIN_LEGACY[code - 0xA0]
    } else {
        BASIC_LEGACY[b'?' as usize]
    }
}

/// Every glyph advances by one em.
#[inline(always)]
pub fn text_width(text: &str, font_px: f32) -> f32 {
    text.chars().count() as f32 * font_px
}

/// Largest size in `[MIN_FONT_SIZE, start]` at which `sample` fits in `max_width`,
/// to within the search tolerance.
pub fn find_optimal_font_size(
    start: f32,
    max_width: f32,
    sample: &str,
    measure: impl Fn(&str, f32) -> f32,
) -> f32 {
    if measure(sample, start) < max_width {
        return start;
    }

    let (mut min, mut max) = (MIN_FONT_SIZE.min(start), start);
    while max - min > FONT_SIZE_TOLERANCE {
        let mid = ((max + min) / 2.0).round();
        if measure(sample, mid) > max_width {
            max = mid;
        } else {
            min = mid;
        }
    }
    min
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontRole {
    TeamNames,
    Scores,
    GridLabels,
    Categories,
}

impl FontRole {
    const COUNT: usize = 4;

    const fn index(self) -> usize {
        match self {
            Self::TeamNames => 0,
            Self::Scores => 1,
            Self::GridLabels => 2,
            Self::Categories => 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct CachedSize {
    sample: String,
    max_width: f32,
    size: f32,
}

/// Font sizes memoized per role; a new sample or column width triggers one new search.
#[derive(Debug, Clone, Default)]
pub struct FontSizeCache {
    entries: [Option<CachedSize>; FontRole::COUNT],
    searches: usize,
}

impl FontSizeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn size_for(
        &mut self,
        role: FontRole,
        sample: &str,
        max_width: f32,
        measure: impl Fn(&str, f32) -> f32,
    ) -> f32 {
        let slot = &mut self.entries[role.index()];
        if let Some(hit) = slot
            && hit.sample == sample
            && hit.max_width == max_width
        {
            return hit.size;
        }

        let size = find_optimal_font_size(DEFAULT_FONT_SIZE, max_width, sample, measure);
        log::debug!("Font size for {role:?} ('{sample}' in {max_width:.1}px): {size}px");
        *slot = Some(CachedSize {
            sample: sample.to_owned(),
            max_width,
            size,
        });
        self.searches += 1;
        size
    }

    /// Number of searches run so far.
    pub const fn searches(&self) -> usize {
        self.searches
    }
}
