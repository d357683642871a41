use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

const ELLIPSIS: &str = "\u{2026}";

/// Terminal cells taken by one line of text.
pub fn cell_width(s: &str) -> usize {
    s.graphemes(true).map(UnicodeWidthStr::width).sum()
}

/// Fold task content onto one line and clip it to `max_cells`.
///
/// Runs of whitespace (newlines and tabs included) collapse to a single
/// space. Clipping happens on grapheme boundaries and ends with `…`.
pub fn fit_to_width(s: &str, max_cells: usize) -> String {
    let line = s.split_whitespace().collect::<Vec<_>>().join(" ");
    if cell_width(&line) <= max_cells {
        return line;
    }
    if max_cells == 0 {
        return String::new();
    }

    let mut out = String::new();
    let mut used = 0;
    for g in line.graphemes(true) {
        let w = UnicodeWidthStr::width(g);
        if used + w + 1 > max_cells {
            break;
        }
        used += w;
        out.push_str(g);
    }
    out.push_str(ELLIPSIS);
    out
}

/// Fit to exactly `cells` cells, padding with spaces on the right.
pub fn pad_to_width(s: &str, cells: usize) -> String {
    let mut out = fit_to_width(s, cells);
    let w = cell_width(&out);
    out.extend(std::iter::repeat_n(' ', cells.saturating_sub(w)));
    out
}
