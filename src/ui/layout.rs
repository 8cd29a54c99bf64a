//! Region rectangles for the results chart, derived purely from surface size and counts.
//!
//! ```text
//!  padding
//!  +----------+--------------------------------------+------+
//!  |          |            score labels              |      |
//!  | category |--------------------------------------| grid |
//!  |  legend  |   [bar]      [bar]      [bar]        | vals |
//!  |          |--------------------------------------|      |
//!  |          |   team       team       team         |      |
//!  +----------+--------------------------------------+------+
//! ```

const OUTER_PADDING_PCT: f32 = 0.01;
const MAIN_SECTION_WHITESPACE_PCT: f32 = 0.1;
const TEAM_NAMES_SECTION_HEIGHT_PCT: f32 = 0.1;
const CATEGORIES_SECTION_WIDTH_PCT: f32 = 0.15;
const SCORE_LABEL_HEIGHT_PCT: f32 = 0.1;
const LEGEND_SECTION_WIDTH_PCT: f32 = 0.05;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    #[inline(always)]
    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    #[inline(always)]
    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    #[inline(always)]
    pub fn center_x(&self) -> f32 {
        self.w.mul_add(0.5, self.x)
    }

    #[inline(always)]
    pub fn center_y(&self) -> f32 {
        self.h.mul_add(0.5, self.y)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutRects {
    /// Surface minus outer padding.
    pub drawable: Rect,
    /// Category legend column, full drawable height.
    pub categories: Rect,
    /// Team columns area, full drawable height.
    pub main: Rect,
    /// Grid value column, full drawable height.
    pub legend: Rect,
    /// Main width, from the drawable top down to the chart bottom.
    pub chart_background: Rect,
    /// Bar band: zero points sit on its bottom edge, `max_score` on its top.
    pub chart: Rect,
    pub score_label_height: f32,
    /// Vertical centre of the team-name band.
    pub team_name_baseline: f32,
    /// One per team, spanning the chart band.
    pub team_columns: Vec<Rect>,
    /// Centre third of each team column.
    pub bars: Vec<Rect>,
    pub column_gap: f32,
    /// One legend row per category, evenly splitting the chart band.
    pub category_rows: Vec<Rect>,
}

impl LayoutRects {
    /// Zero counts or an empty surface produce an all-zero layout.
    pub fn is_renderable(&self) -> bool {
        self.chart.w > 0.0
            && self.chart.h > 0.0
            && !self.team_columns.is_empty()
            && !self.category_rows.is_empty()
    }
}

pub fn compute_layout(
    surface_width: f32,
    surface_height: f32,
    team_count: usize,
    category_count: usize,
) -> LayoutRects {
    if team_count == 0
        || category_count == 0
        || !(surface_width > 0.0 && surface_height > 0.0)
        || !surface_width.is_finite()
        || !surface_height.is_finite()
    {
        return LayoutRects::default();
    }

    let left = OUTER_PADDING_PCT * surface_width;
    let right = (1.0 - OUTER_PADDING_PCT) * surface_width;
    let top = OUTER_PADDING_PCT * surface_height;
    let bottom = (1.0 - OUTER_PADDING_PCT) * surface_height;
    let drawable = Rect::new(left, top, right - left, bottom - top);

    let categories_w = CATEGORIES_SECTION_WIDTH_PCT * drawable.w;
    let legend_w = LEGEND_SECTION_WIDTH_PCT * drawable.w;
    let main_left = drawable.x + categories_w;
    let main_right = drawable.right() - legend_w;
    let main_w = main_right - main_left;

    let categories = Rect::new(drawable.x, drawable.y, categories_w, drawable.h);
    let main = Rect::new(main_left, drawable.y, main_w, drawable.h);
    let legend = Rect::new(main_right, drawable.y, legend_w, drawable.h);

    let chart_top = SCORE_LABEL_HEIGHT_PCT.mul_add(drawable.h, drawable.y);
    let chart_bottom = drawable.bottom() - TEAM_NAMES_SECTION_HEIGHT_PCT * drawable.h;
    let chart = Rect::new(main_left, chart_top, main_w, chart_bottom - chart_top);
    let chart_background = Rect::new(main_left, drawable.y, main_w, chart_bottom - drawable.y);

    let (column_w, column_gap) = if team_count == 1 {
        (main_w, 0.0)
    } else {
        (
            main_w * (1.0 - MAIN_SECTION_WHITESPACE_PCT) / team_count as f32,
            main_w * MAIN_SECTION_WHITESPACE_PCT / (team_count - 1) as f32,
        )
    };
    let stride = column_w + column_gap;

    let team_columns: Vec<Rect> = (0..team_count)
        .map(|t| Rect::new((t as f32).mul_add(stride, main_left), chart.y, column_w, chart.h))
        .collect();
    let bar_w = column_w / 3.0;
    let bars = team_columns
        .iter()
        .map(|c| Rect::new(c.x + bar_w, c.y, bar_w, c.h))
        .collect();

    let row_h = chart.h / category_count as f32;
    let category_rows = (0..category_count)
        .map(|c| Rect::new(categories.x, (c as f32).mul_add(row_h, chart.y), categories.w, row_h))
        .collect();

    LayoutRects {
        drawable,
        categories,
        main,
        legend,
        chart_background,
        chart,
        score_label_height: chart_top - drawable.y,
        team_name_baseline: (drawable.bottom() + chart_bottom) / 2.0,
        team_columns,
        bars,
        column_gap,
        category_rows,
    }
}

#[cfg(test)]
mod tests {
    use super::{LayoutRects, Rect, compute_layout};

    const EPS: f32 = 1e-2;

    fn widths(l: &LayoutRects) -> Vec<f32> {
        let mut out = vec![
            l.drawable.w,
            l.categories.w,
            l.main.w,
            l.legend.w,
            l.chart.w,
            l.column_gap,
        ];
        out.extend(l.team_columns.iter().map(|r| r.w));
        out.extend(l.bars.iter().map(|r| r.w));
        out.extend(l.category_rows.iter().map(|r| r.w));
        out
    }

    #[test]
    fn regions_follow_the_percentage_split() {
        let l = compute_layout(1000.0, 500.0, 4, 3);
        let d = Rect::new(10.0, 5.0, 980.0, 490.0);
        for (a, b) in [(l.drawable.x, d.x), (l.drawable.y, d.y), (l.drawable.w, d.w), (l.drawable.h, d.h)] {
            assert!((a - b).abs() < EPS);
        }
        assert!((l.categories.w - 147.0).abs() < EPS);
        assert!((l.legend.w - 49.0).abs() < EPS);
        assert!((l.main.x - 157.0).abs() < EPS);
        assert!((l.chart.y - 54.0).abs() < EPS);
        assert!((l.chart.bottom() - 446.0).abs() < EPS);
        assert!((l.score_label_height - 49.0).abs() < EPS);
        assert!((l.team_name_baseline - 470.5).abs() < EPS);
        assert_eq!(l.chart_background.y, l.drawable.y);
        assert!((l.chart_background.bottom() - l.chart.bottom()).abs() < EPS);
    }

    #[test]
    fn columns_and_gaps_fill_the_main_section() {
        for teams in 1..12 {
            let l = compute_layout(1280.0, 720.0, teams, 2);
            let sum: f32 = l.team_columns.iter().map(|c| c.w).sum::<f32>()
                + l.column_gap * (teams - 1) as f32;
            assert!((sum - l.main.w).abs() < EPS, "{teams} teams: {sum} vs {}", l.main.w);
            let last = l.team_columns.last().unwrap();
            assert!((last.right() - l.main.right()).abs() < EPS);
            for (col, bar) in l.team_columns.iter().zip(&l.bars) {
                assert!((bar.w * 3.0 - col.w).abs() < EPS);
                assert!((bar.center_x() - col.center_x()).abs() < EPS);
            }
        }
    }

    #[test]
    fn single_team_takes_the_whole_main_width() {
        let l = compute_layout(800.0, 600.0, 1, 1);
        assert_eq!(l.column_gap, 0.0);
        assert_eq!(l.team_columns[0].w, l.main.w);
    }

    #[test]
    fn wider_surface_never_shrinks_a_region() {
        for teams in [1, 2, 5] {
            let mut prev = widths(&compute_layout(200.0, 400.0, teams, 3));
            for w in (220..3000).step_by(20) {
                let next = widths(&compute_layout(w as f32, 400.0, teams, 3));
                for (a, b) in prev.iter().zip(&next) {
                    assert!(b + EPS >= *a);
                }
                prev = next;
            }
        }
    }

    #[test]
    fn category_rows_split_the_chart_band() {
        let l = compute_layout(1000.0, 500.0, 2, 4);
        assert_eq!(l.category_rows.len(), 4);
        assert!((l.category_rows[0].y - l.chart.y).abs() < EPS);
        assert!((l.category_rows[3].bottom() - l.chart.bottom()).abs() < EPS);
    }

    #[test]
    fn empty_inputs_are_not_renderable() {
        assert!(!compute_layout(1000.0, 500.0, 0, 3).is_renderable());
        assert!(!compute_layout(1000.0, 500.0, 3, 0).is_renderable());
        assert!(!compute_layout(0.0, 500.0, 3, 3).is_renderable());
        assert!(!compute_layout(f32::NAN, 500.0, 3, 3).is_renderable());
        assert!(compute_layout(1000.0, 500.0, 3, 3).is_renderable());
    }
}
