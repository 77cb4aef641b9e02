use std::fmt::Write;

use crate::models::{ChartSlice, ScoreResult};

pub const CHART_TITLE: &str = "AI generation degree";

const AI_COLOR: &str = "#ff4b4b";
const HUMAN_COLOR: &str = "#1f77b4";

// r = 100 / (2 * pi), so the circumference is 100 and dash lengths read as percentages
const RADIUS: f64 = 15.915_494_309_189_533;

/// The two proportions shown in the donut, AI first.
pub fn donut_slices(score: &ScoreResult) -> Vec<ChartSlice> {
    vec![
        ChartSlice {
            label: "AI".to_string(),
            value: score.ai_probability,
            color: AI_COLOR.to_string(),
        },
        ChartSlice {
            label: "Human".to_string(),
            value: score.human_probability,
            color: HUMAN_COLOR.to_string(),
        },
    ]
}

/// Renders slices as an SVG donut, clockwise from twelve o'clock, with a
/// legend giving each share to one decimal place.
pub fn render_donut_svg(slices: &[ChartSlice], title: &str) -> String {
    let total: f64 = slices.iter().map(|s| s.value.max(0.0)).sum();
    let mut svg = String::new();

    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 60 52" role="img" aria-label="{}">"#,
        escape(title)
    );
    let _ = write!(svg, r#"<title>{}</title>"#, escape(title));

    // offset 25 moves the dash origin from three o'clock to twelve
    let mut offset = 25.0;
    for slice in slices {
        let share = if total > 0.0 { slice.value.max(0.0) / total * 100.0 } else { 0.0 };
        let _ = write!(
            svg,
            r#"<circle cx="21" cy="21" r="{r:.4}" fill="none" stroke="{color}" stroke-width="6" stroke-dasharray="{share:.3} {rest:.3}" stroke-dashoffset="{offset:.3}"/>"#,
            r = RADIUS,
            color = escape(&slice.color),
            share = share,
            rest = 100.0 - share,
            offset = offset,
        );
        offset -= share;
    }

    for (idx, slice) in slices.iter().enumerate() {
        let share = if total > 0.0 { slice.value.max(0.0) / total * 100.0 } else { 0.0 };
        let y = 14 + idx * 8;
        let _ = write!(
            svg,
            r#"<rect x="42" y="{y}" width="3" height="3" fill="{color}"/><text x="46.5" y="{ty}" font-size="3.2">{label} {share:.1}%</text>"#,
            y = y,
            ty = y + 3,
            color = escape(&slice.color),
            label = escape(&slice.label),
            share = share,
        );
    }

    let _ = write!(
        svg,
        r#"<text x="21" y="50" font-size="3.4" text-anchor="middle">{}</text></svg>"#,
        escape(title)
    );
    svg
}

fn escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
