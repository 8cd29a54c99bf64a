/// Accepts "#rgb", "#rgba", "#rrggbb", "#rrggbbaa" (or without '#').
/// Panics on invalid input; use only with trusted literals.
/// Evaluated at COMPILE TIME if assigned to a const/static.
pub const fn rgba_hex(s: &str) -> [f32; 4] {
    let bytes = s.as_bytes();

    let (bytes, len) = if !bytes.is_empty() && bytes[0] == b'#' {
        let (_, rem) = bytes.split_at(1);
        (rem, s.len() - 1)
    } else {
        (bytes, s.len())
    };

    const fn val(b: u8) -> u8 {
        match b {
            b'0'..=b'9' => b - b'0',
            b'a'..=b'f' => 10 + (b - b'a'),
            b'A'..=b'F' => 10 + (b - b'A'),
            _ => panic!("invalid hex digit in color string"),
        }
    }

    const fn byte2(h: u8, l: u8) -> u8 {
        (val(h) << 4) | val(l)
    }

    // F -> FF
    const fn rep(n: u8) -> u8 {
        (val(n) << 4) | val(n)
    }

    let (r, g, b, a) = match len {
        3 => (rep(bytes[0]), rep(bytes[1]), rep(bytes[2]), 0xFF),
        4 => (rep(bytes[0]), rep(bytes[1]), rep(bytes[2]), rep(bytes[3])),
        6 => (
            byte2(bytes[0], bytes[1]),
            byte2(bytes[2], bytes[3]),
            byte2(bytes[4], bytes[5]),
            0xFF,
        ),
        8 => (
            byte2(bytes[0], bytes[1]),
            byte2(bytes[2], bytes[3]),
            byte2(bytes[4], bytes[5]),
            byte2(bytes[6], bytes[7]),
        ),
        _ => panic!("color hex string must be 3, 4, 6, or 8 digits"),
    };

    [
        r as f32 / 255.0,
        g as f32 / 255.0,
        b as f32 / 255.0,
        a as f32 / 255.0,
    ]
}

/* =========================== RESULTS PALETTE =========================== */

/// Fill behind the bar chart and score labels.
pub const CHART_BACKGROUND_RGBA: [f32; 4] = rgba_hex("#201C28");
/// Everything outside the chart.
pub const CLEAR_RGBA: [f32; 4] = rgba_hex("#000000");
/// Team names and running totals.
pub const LABEL_RGBA: [f32; 4] = rgba_hex("#FF0000");
/// Grid lines and their legend; alpha is set per line.
pub const GRID_RGB: [f32; 3] = [128.0 / 255.0, 128.0 / 255.0, 128.0 / 255.0];

#[inline(always)]
pub const fn with_alpha(c: [f32; 4], alpha: f32) -> [f32; 4] {
    [c[0], c[1], c[2], alpha]
}

#[inline(always)]
pub fn grid_rgba(alpha: f32) -> [f32; 4] {
    [GRID_RGB[0], GRID_RGB[1], GRID_RGB[2], alpha.clamp(0.0, 1.0)]
}

/// Orange-to-yellow ramp: `rgb(255, 128 + c * 128 / n, 0)`.
#[inline(always)]
pub fn category_rgba(category: usize, category_count: usize) -> [f32; 4] {
    let n = category_count.max(1) as f32;
    let g = (category as f32).mul_add(128.0 / n, 128.0);
    [1.0, g.min(255.0) / 255.0, 0.0, 1.0]
}

/// `hue` in degrees; `saturation` and `lightness` in `[0, 1]`.
pub fn hsl_to_rgba(hue: f32, saturation: f32, lightness: f32, alpha: f32) -> [f32; 4] {
    let h = hue.rem_euclid(360.0) / 60.0;
    let s = saturation.clamp(0.0, 1.0);
    let l = lightness.clamp(0.0, 1.0);
    let chroma = (1.0 - 2.0f32.mul_add(l, -1.0).abs()) * s;
    let x = chroma * (1.0 - (h % 2.0 - 1.0).abs());
    let (r, g, b) = match h as u32 {
        0 => (chroma, x, 0.0),
        1 => (x, chroma, 0.0),
        2 => (0.0, chroma, x),
        3 => (0.0, x, chroma),
        4 => (x, 0.0, chroma),
        _ => (chroma, 0.0, x),
    };
    let m = l - chroma / 2.0;
    [r + m, g + m, b + m, alpha.clamp(0.0, 1.0)]
}

#[cfg(test)]
mod tests {
    use super::{category_rgba, hsl_to_rgba, rgba_hex};

    fn close(a: [f32; 4], b: [f32; 4]) -> bool {
        a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-3)
    }

    #[test]
    fn hex_forms_agree() {
        assert_eq!(rgba_hex("#f00"), rgba_hex("FF0000"));
        assert_eq!(rgba_hex("#FF000080")[3], 128.0 / 255.0);
    }

    #[test]
    fn categories_ramp_from_orange_toward_yellow() {
        assert!(close(category_rgba(0, 2), [1.0, 128.0 / 255.0, 0.0, 1.0]));
        assert!(close(category_rgba(1, 2), [1.0, 192.0 / 255.0, 0.0, 1.0]));
        let last = category_rgba(9, 10);
        assert!(last[1] < 1.0 && last[1] > category_rgba(8, 10)[1]);
    }

    #[test]
    fn hsl_primaries() {
        assert!(close(hsl_to_rgba(0.0, 1.0, 0.5, 1.0), [1.0, 0.0, 0.0, 1.0]));
        assert!(close(hsl_to_rgba(120.0, 1.0, 0.5, 1.0), [0.0, 1.0, 0.0, 1.0]));
        assert!(close(hsl_to_rgba(240.0, 1.0, 0.5, 0.5), [0.0, 0.0, 1.0, 0.5]));
        assert!(close(hsl_to_rgba(360.0, 1.0, 0.5, 1.0), [1.0, 0.0, 0.0, 1.0]));
        assert!(close(hsl_to_rgba(0.0, 0.0, 1.0, 1.0), [1.0, 1.0, 1.0, 1.0]));
    }
}
