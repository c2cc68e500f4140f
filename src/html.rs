// 🌐 HTML renderer - the dashboard as one standalone page with inline SVG charts
// Pure presentation: reads the Dashboard view model, never recomputes anything

use crate::collapse::OTHER_LABEL;
use crate::dashboard::{BarDatum, Dashboard, DonutChart, GroupedBars, ProportionSlice};
use crate::format::format_rand;
use crate::records::QualificationKeyTable;

/// Cycle used by the pie and grouped bar charts
const PALETTE: [&str; 10] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf",
];

const BAR_COLOR: &str = "#87ceeb";
const PIE_START_ANGLE: f64 = 140.0;
const DONUT_START_ANGLE: f64 = 90.0;
const DONUT_HOLE_RATIO: f64 = 0.4;

const STYLE: &str = "
body { font-family: sans-serif; margin: 24px 48px; color: #262730; }
h1 { font-size: 2em; }
h3 { margin-top: 2em; }
.row { display: flex; gap: 32px; flex-wrap: wrap; }
.chart { flex: 1; min-width: 320px; }
.caption { color: #6b6b6b; font-size: 0.85em; text-align: center; }
.placeholder { color: #9a9a9a; font-style: italic; padding: 24px; }
svg text { font-family: sans-serif; }
table { border-collapse: collapse; width: 100%; font-size: 0.9em; }
th, td { border: 1px solid #e0e0e0; padding: 4px 8px; text-align: left; }
th { background: #f5f5f5; }
footer { margin-top: 3em; color: #9a9a9a; font-size: 0.8em; }
";

// ============================================================================
// PAGE
// ============================================================================

/// Render the full dashboard page
pub fn render_page(dashboard: &Dashboard) -> String {
    let mut out = String::with_capacity(64 * 1024);

    out.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    out.push_str(&format!("<title>{}</title>\n", escape(&dashboard.title)));
    out.push_str(&format!("<style>{}</style>\n</head>\n<body>\n", STYLE));
    out.push_str(&format!("<h1>{}</h1>\n", escape(&dashboard.title)));

    // Row 1: proportions
    out.push_str("<h3>Distribution by Institution and Ethnic Group</h3>\n<div class=\"row\">\n");
    out.push_str(&proportion_section(&dashboard.institution_shares, "Total Funds by Institution"));
    out.push_str(&proportion_section(&dashboard.ethnic_shares, "Total Funds by Ethnic Group"));
    out.push_str("</div>\n");

    // Row 2: qualification totals
    out.push_str("<h3>Total Funds by Qualification</h3>\n");
    out.push_str(&horizontal_bar_svg(&dashboard.qualification_totals));

    // Row 3: qualification × gender
    out.push_str("<h3>Total Funds by Qualification and Gender</h3>\n");
    out.push_str(&grouped_bar_svg(&dashboard.qualification_by_gender));

    // Row 4: donuts
    out.push_str("<h3>Ethnic Group Breakdown by Gender (Cleaned View)</h3>\n<div class=\"row\">\n");
    for donut in &dashboard.donuts {
        out.push_str(&format!("<div class=\"chart\">{}</div>\n", donut_svg(donut)));
    }
    out.push_str("</div>\n");

    if !dashboard.notes.is_empty() {
        out.push_str("<h5>Note on 'Other' Category</h5>\n");
        for note in &dashboard.notes {
            out.push_str(&format!(
                "<p><strong>{}</strong> {}</p>\n",
                escape(&note.heading()),
                escape(&note.breakdown)
            ));
        }
    }

    // Row 5: lookup table
    out.push_str("<h3>Qualification Key Table</h3>\n");
    out.push_str(&key_table(&dashboard.qualification_key));

    out.push_str(&format!(
        "<footer>Generated {}</footer>\n</body>\n</html>\n",
        dashboard.generated_at.format("%Y-%m-%d %H:%M UTC")
    ));

    out
}

/// Minimal page shown when the source tables cannot be loaded
pub fn render_error_page(title: &str, error: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head><meta charset=\"utf-8\"><title>{title}</title>\
         <style>{STYLE}</style></head>\n<body>\n<h1>{title}</h1>\n\
         <p class=\"placeholder\">The dashboard cannot be rendered: {error}</p>\n</body>\n</html>\n",
        title = escape(title),
        error = escape(error),
    )
}

pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

fn placeholder(what: &str) -> String {
    format!("<div class=\"placeholder\">No data for {}</div>\n", escape(what))
}

// ============================================================================
// PIE / DONUT
// ============================================================================

struct Wedge<'a> {
    value: f64,
    color: &'a str,
    label: String,
}

/// Point on a circle; angles in degrees, counter-clockwise from 3 o'clock
fn polar(cx: f64, cy: f64, r: f64, angle: f64) -> (f64, f64) {
    let rad = angle.to_radians();
    (cx + r * rad.cos(), cy - r * rad.sin())
}

/// SVG path for one wedge (inner > 0 makes it a ring segment)
fn wedge_path(cx: f64, cy: f64, outer: f64, inner: f64, start: f64, end: f64) -> String {
    let span = end - start;
    // A single arc cannot close on itself
    if span >= 359.999 {
        let mid = start + 180.0;
        return format!(
            "{} {}",
            wedge_path(cx, cy, outer, inner, start, mid),
            wedge_path(cx, cy, outer, inner, mid, end)
        );
    }

    let large = if span > 180.0 { 1 } else { 0 };
    let (ox1, oy1) = polar(cx, cy, outer, start);
    let (ox2, oy2) = polar(cx, cy, outer, end);

    if inner > 0.0 {
        let (ix1, iy1) = polar(cx, cy, inner, start);
        let (ix2, iy2) = polar(cx, cy, inner, end);
        format!(
            "M {ox1:.2} {oy1:.2} A {outer:.2} {outer:.2} 0 {large} 0 {ox2:.2} {oy2:.2} \
             L {ix2:.2} {iy2:.2} A {inner:.2} {inner:.2} 0 {large} 1 {ix1:.2} {iy1:.2} Z"
        )
    } else {
        format!(
            "M {cx:.2} {cy:.2} L {ox1:.2} {oy1:.2} A {outer:.2} {outer:.2} 0 {large} 0 {ox2:.2} {oy2:.2} Z"
        )
    }
}

fn text_anchor(angle: f64) -> &'static str {
    let x = angle.to_radians().cos();
    if x > 0.2 {
        "start"
    } else if x < -0.2 {
        "end"
    } else {
        "middle"
    }
}

fn circle_svg(wedges: &[Wedge], start_angle: f64, hole_ratio: f64, size: f64, label_outside: bool) -> String {
    let total: f64 = wedges.iter().map(|w| w.value).sum();
    let c = size / 2.0;
    let outer = size * 0.32;
    let inner = outer * hole_ratio;

    let mut out = String::new();
    let mut angle = start_angle;
    for wedge in wedges {
        if !(wedge.value > 0.0) {
            continue;
        }
        let span = wedge.value / total * 360.0;
        out.push_str(&format!(
            "<path d=\"{}\" fill=\"{}\" stroke=\"white\" stroke-width=\"1\"><title>{}</title></path>\n",
            wedge_path(c, c, outer, inner, angle, angle + span),
            wedge.color,
            escape(&wedge.label)
        ));

        if label_outside {
            let mid = angle + span / 2.0;
            let (lx, ly) = polar(c, c, outer * 1.12, mid);
            out.push_str(&format!(
                "<text x=\"{lx:.2}\" y=\"{ly:.2}\" font-size=\"11\" text-anchor=\"{}\" dominant-baseline=\"middle\">{}</text>\n",
                text_anchor(mid),
                escape(&wedge.label)
            ));
        }
        angle += span;
    }
    out
}

fn proportion_section(slices: &[ProportionSlice], caption: &str) -> String {
    let body = proportion_svg(slices).unwrap_or_else(|| placeholder(caption));
    format!(
        "<div class=\"chart\">{}<div class=\"caption\">{}</div></div>\n",
        body,
        escape(caption)
    )
}

fn proportion_svg(slices: &[ProportionSlice]) -> Option<String> {
    if slices.iter().all(|s| !(s.value > 0.0)) {
        return None;
    }

    let size = 420.0;
    let wedges: Vec<Wedge> = slices
        .iter()
        .enumerate()
        .map(|(i, s)| Wedge {
            value: s.value,
            color: PALETTE[i % PALETTE.len()],
            label: format!("{} {}", s.label, s.percent_label),
        })
        .collect();

    Some(format!(
        "<svg viewBox=\"0 0 {size} {size}\" width=\"100%\" role=\"img\">\n{}</svg>\n",
        circle_svg(&wedges, PIE_START_ANGLE, 0.0, size, true)
    ))
}

fn donut_svg(donut: &DonutChart) -> String {
    let size = 400.0;
    let c = size / 2.0;

    let mut out = format!(
        "<svg viewBox=\"0 0 {} {}\" width=\"100%\" role=\"img\">\n\
         <text x=\"{c}\" y=\"24\" font-size=\"18\" text-anchor=\"middle\">{}</text>\n",
        if donut.show_legend { size + 200.0 } else { size },
        size,
        escape(&donut.group)
    );

    if donut.is_empty() {
        out.push_str(&format!(
            "<text x=\"{c}\" y=\"{c}\" font-size=\"13\" text-anchor=\"middle\" fill=\"#9a9a9a\">No funds recorded</text>\n</svg>\n"
        ));
        return out;
    }

    let wedges: Vec<Wedge> = donut
        .slices
        .iter()
        .map(|s| Wedge {
            value: s.value,
            color: &s.color,
            label: s.display_label.clone(),
        })
        .collect();
    out.push_str(&circle_svg(
        &wedges,
        DONUT_START_ANGLE,
        DONUT_HOLE_RATIO,
        size,
        !donut.show_legend,
    ));

    out.push_str(&format!(
        "<text x=\"{c}\" y=\"{}\" font-size=\"13\" text-anchor=\"middle\">Total</text>\n\
         <text x=\"{c}\" y=\"{}\" font-size=\"13\" text-anchor=\"middle\">{}</text>\n",
        c - 4.0,
        c + 14.0,
        escape(&donut.total_label)
    ));

    if donut.show_legend {
        out.push_str(&format!(
            "<text x=\"{}\" y=\"110\" font-size=\"12\" font-weight=\"bold\">Ethnic Groups</text>\n",
            size + 10.0
        ));
        for (i, (slice, line)) in donut.slices.iter().zip(donut.legend_lines()).enumerate() {
            let y = 130.0 + i as f64 * 34.0;
            let mut parts = line.split('\n');
            let first = parts.next().unwrap_or_default();
            let second = parts.next().unwrap_or_default();
            out.push_str(&format!(
                "<rect x=\"{}\" y=\"{}\" width=\"12\" height=\"12\" fill=\"{}\"/>\n\
                 <text x=\"{}\" y=\"{}\" font-size=\"11\">{}</text>\n\
                 <text x=\"{}\" y=\"{}\" font-size=\"11\">{}</text>\n",
                size + 10.0,
                y - 10.0,
                slice.color,
                size + 28.0,
                y,
                escape(first),
                size + 28.0,
                y + 14.0,
                escape(second)
            ));
        }
    }

    out.push_str("</svg>\n");
    out
}

// ============================================================================
// BARS
// ============================================================================

fn horizontal_bar_svg(bars: &[BarDatum]) -> String {
    if bars.is_empty() {
        return placeholder("qualification totals");
    }

    let label_width = 260.0;
    let plot_width = 560.0;
    let row_height = 22.0;
    let top = 10.0;
    let height = top + bars.len() as f64 * row_height + 50.0;
    let max = bars.iter().map(|b| b.value).fold(0.0_f64, f64::max);
    let scale = if max > 0.0 { plot_width / max } else { 0.0 };

    let mut out = format!(
        "<svg viewBox=\"0 0 {} {height}\" width=\"75%\" role=\"img\">\n",
        label_width + plot_width + 120.0
    );

    for (i, bar) in bars.iter().enumerate() {
        let y = top + i as f64 * row_height;
        let width = bar.value.max(0.0) * scale;
        out.push_str(&format!(
            "<text x=\"{}\" y=\"{}\" font-size=\"11\" text-anchor=\"end\" dominant-baseline=\"middle\">{}</text>\n\
             <rect x=\"{label_width}\" y=\"{}\" width=\"{width:.2}\" height=\"{}\" fill=\"{BAR_COLOR}\"/>\n\
             <text x=\"{}\" y=\"{}\" font-size=\"10\" dominant-baseline=\"middle\">{}</text>\n",
            label_width - 6.0,
            y + row_height / 2.0,
            escape(&bar.label),
            y + row_height * 0.025,
            row_height * 0.95,
            label_width + width + 4.0,
            y + row_height / 2.0,
            format_rand(bar.value)
        ));
    }

    let axis_y = top + bars.len() as f64 * row_height;
    out.push_str(&format!(
        "<line x1=\"{label_width}\" y1=\"{axis_y}\" x2=\"{}\" y2=\"{axis_y}\" stroke=\"#333\"/>\n\
         <text x=\"{}\" y=\"{}\" font-size=\"12\" text-anchor=\"middle\">Total Funds per Category</text>\n</svg>\n",
        label_width + plot_width,
        label_width + plot_width / 2.0,
        axis_y + 30.0
    ));
    out
}

fn grouped_bar_svg(grouped: &GroupedBars) -> String {
    if grouped.is_empty() {
        return placeholder("qualification and gender totals");
    }

    let left = 90.0;
    let top = 20.0;
    let plot_height = 260.0;
    let group_width = 60.0_f64.max(28.0 * grouped.series.len() as f64);
    let plot_width = group_width * grouped.categories.len() as f64;
    let width = left + plot_width + 140.0;
    let height = top + plot_height + 150.0;
    let axis_max = if grouped.axis_max > 0.0 { grouped.axis_max } else { 1.0 };
    let bar_width = group_width * 0.85 / grouped.series.len() as f64;

    let y_of = |value: f64| top + plot_height - value.clamp(0.0, axis_max) / axis_max * plot_height;

    let mut out = format!("<svg viewBox=\"0 0 {width} {height}\" width=\"75%\" role=\"img\">\n");

    // Value axis with five intervals
    for step in 0..=5 {
        let value = axis_max * step as f64 / 5.0;
        let y = y_of(value);
        out.push_str(&format!(
            "<line x1=\"{left}\" y1=\"{y:.2}\" x2=\"{}\" y2=\"{y:.2}\" stroke=\"#e0e0e0\"/>\n\
             <text x=\"{}\" y=\"{y:.2}\" font-size=\"10\" text-anchor=\"end\" dominant-baseline=\"middle\">{}</text>\n",
            left + plot_width,
            left - 6.0,
            format_rand(value)
        ));
    }

    for (c, category) in grouped.categories.iter().enumerate() {
        let group_x = left + c as f64 * group_width + group_width * 0.075;
        for (s, value) in grouped.values[c].iter().enumerate() {
            let y = y_of(*value);
            out.push_str(&format!(
                "<rect x=\"{:.2}\" y=\"{y:.2}\" width=\"{bar_width:.2}\" height=\"{:.2}\" fill=\"{}\">\
                 <title>{} / {}: {}</title></rect>\n",
                group_x + s as f64 * bar_width,
                top + plot_height - y,
                PALETTE[s % PALETTE.len()],
                escape(category),
                escape(&grouped.series[s]),
                format_rand(*value)
            ));
        }

        let label_x = left + (c as f64 + 0.5) * group_width;
        let label_y = top + plot_height + 10.0;
        out.push_str(&format!(
            "<text x=\"{label_x:.2}\" y=\"{label_y:.2}\" font-size=\"10\" text-anchor=\"end\" \
             transform=\"rotate(-90 {label_x:.2} {label_y:.2})\">{}</text>\n",
            escape(category)
        ));
    }

    let axis_bottom = top + plot_height;
    out.push_str(&format!(
        "<line x1=\"{left}\" y1=\"{axis_bottom}\" x2=\"{}\" y2=\"{axis_bottom}\" stroke=\"#333\"/>\n\
         <line x1=\"{left}\" y1=\"{top}\" x2=\"{left}\" y2=\"{axis_bottom}\" stroke=\"#333\"/>\n\
         <text x=\"16\" y=\"{}\" font-size=\"12\" text-anchor=\"middle\" transform=\"rotate(-90 16 {})\">Sum of Total Funds</text>\n\
         <text x=\"{}\" y=\"{}\" font-size=\"12\" text-anchor=\"middle\">Qualification</text>\n",
        left + plot_width,
        top + plot_height / 2.0,
        top + plot_height / 2.0,
        left + plot_width / 2.0,
        height - 8.0
    ));

    // Legend
    for (s, series) in grouped.series.iter().enumerate() {
        let y = top + 10.0 + s as f64 * 18.0;
        out.push_str(&format!(
            "<rect x=\"{}\" y=\"{}\" width=\"12\" height=\"12\" fill=\"{}\"/>\n\
             <text x=\"{}\" y=\"{}\" font-size=\"11\">{}</text>\n",
            left + plot_width + 16.0,
            y - 10.0,
            PALETTE[s % PALETTE.len()],
            left + plot_width + 34.0,
            y,
            escape(series)
        ));
    }

    out.push_str("</svg>\n");
    out
}

// ============================================================================
// LOOKUP TABLE
// ============================================================================

fn key_table(table: &QualificationKeyTable) -> String {
    let mut out = String::from("<details>\n<summary>View Qualification Key Table</summary>\n");

    if table.is_empty() {
        out.push_str(&placeholder("the qualification key"));
        out.push_str("</details>\n");
        return out;
    }

    out.push_str("<table>\n<thead><tr>");
    for column in table.columns() {
        out.push_str(&format!("<th>{}</th>", escape(&column)));
    }
    out.push_str("</tr></thead>\n<tbody>\n");

    for entry in &table.entries {
        out.push_str("<tr>");
        out.push_str(&format!("<td>{}</td><td>{}</td>", escape(&entry.institution), escape(&entry.qualification)));
        for detail in &entry.details {
            out.push_str(&format!("<td>{}</td>", escape(detail)));
        }
        out.push_str("</tr>\n");
    }

    out.push_str("</tbody>\n</table>\n</details>\n");
    out
}

/// True when the page shows a merged "Other" slice for any donut
pub fn shows_other(dashboard: &Dashboard) -> bool {
    dashboard
        .donuts
        .iter()
        .any(|d| d.slices.iter().any(|s| s.label == OTHER_LABEL))
}
