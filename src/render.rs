//! ==============================================================================
//! render.rs - page model -> html document
//! ==============================================================================
//!
//! purpose:
//!     turns a `Page` into one self-contained html document. charts are
//!     inline svg drawn here, so the browser needs no script or cdn.
//!
//! relationships:
//!     - used by: server.rs (dashboard handler)
//!     - reads: layout.rs (Page, Block, Widget)
//!
//! the sidebar is a plain get form. every widget change submits it, which
//! re-runs the whole render pass on the server.
//!
//! ==============================================================================

use crate::layout::{Block, ChartFrame, Control, Page, Slice, Widget};
use crate::series::TimeSeries;

use std::f64::consts::PI;

const CHART_W: f64 = 420.0;
const CHART_H: f64 = 240.0;
const PAD: f64 = 40.0;

const STYLE: &str = r#"
* { box-sizing: border-box; }
body { margin: 0; font-family: system-ui, -apple-system, sans-serif; background: #0e1117; color: #fafafa; }
.app { display: flex; min-height: 100vh; }
aside { width: 260px; flex-shrink: 0; background: #262730; padding: 1.5rem 1rem 4rem; }
aside label { display: block; margin: 1rem 0 0.25rem; }
aside button { margin-top: 1rem; padding: 0.4rem 0.8rem; background: #0e1117; color: #fafafa; border: 1px solid #555; border-radius: 0.4rem; cursor: pointer; }
main { flex: 1; padding: 1.5rem 2rem 5rem; }
main.wide { max-width: none; }
.row { display: grid; grid-template-columns: repeat(var(--cols), minmax(0, 1fr)); gap: 1.5rem; margin-bottom: 1.5rem; }
.metric { margin-bottom: 1rem; }
.metric .label { font-size: 0.875rem; color: #a3a8b8; }
.metric .value { font-size: 2rem; }
.delta { font-size: 0.875rem; }
.delta.normal { color: #21c354; }
.delta.inverse { color: #ff4b4b; }
table { border-collapse: collapse; font-size: 0.8rem; margin-bottom: 1.5rem; }
th, td { border: 1px solid #333; padding: 0.25rem 0.5rem; text-align: right; }
svg text { font-size: 11px; }
.footer { position: fixed; left: 0; bottom: 0; width: 100%; background-color: #333; color: white; text-align: center; padding: 10px 0; }
.footer p { margin: 0; }
"#;

pub fn render_page(page: &Page) -> String {
    let mut body = String::new();
    for block in &page.blocks {
        body.push_str(&render_block(block));
    }

    format!(
        r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<link rel="icon" href="data:image/svg+xml,<svg xmlns=%22http://www.w3.org/2000/svg%22 viewBox=%220 0 100 100%22><text y=%22.9em%22 font-size=%2290%22>{icon}</text></svg>">
<style>{style}</style>
</head>
<body>
<div class="app">
{sidebar}
<main class="{main_class}">
{body}</main>
</div>
<div class="footer">
    <p>{footer}</p>
</div>
</body>
</html>
"#,
        title = html_escape(&page.title),
        icon = html_escape(&page.icon),
        style = STYLE,
        sidebar = render_sidebar(page),
        main_class = if page.wide { "wide" } else { "centered" },
        body = body,
        footer = html_escape(&page.footer),
    )
}

fn render_sidebar(page: &Page) -> String {
    let mut out = format!(
        "<aside>\n<h2>{}</h2>\n<form method=\"get\" action=\"/\">\n",
        html_escape(&page.sidebar.title)
    );
    for control in &page.sidebar.controls {
        let html = match control {
            Control::Checkbox { name, label, checked } => format!(
                "<label><input type=\"checkbox\" name=\"{}\" value=\"on\"{} onchange=\"this.form.submit()\"> {}</label>\n",
                html_escape(name),
                if *checked { " checked" } else { "" },
                html_escape(label)
            ),
            Control::Slider { name, label, min, max, value } => format!(
                "<label for=\"{n}\">{l}: <output>{v}</output></label>\n<input type=\"range\" id=\"{n}\" name=\"{n}\" min=\"{min}\" max=\"{max}\" value=\"{v}\" onchange=\"this.form.submit()\">\n",
                n = html_escape(name),
                l = html_escape(label),
                v = value,
                min = min,
                max = max
            ),
            // momentary: only the submission made by this button carries its name
            Control::Button { name, label, .. } => format!(
                "<button type=\"submit\" name=\"{}\" value=\"1\">{}</button>\n",
                html_escape(name),
                html_escape(label)
            ),
        };
        out.push_str(&html);
    }
    out.push_str("</form>\n</aside>");
    out
}

fn render_block(block: &Block) -> String {
    match block {
        Block::Title { text } => format!("<h1>{}</h1>\n", html_escape(text)),
        Block::Subheader { text } => format!("<h3>{}</h3>\n", html_escape(text)),
        Block::Heading { text } => format!("<h3>{}</h3>\n", html_escape(text)),
        Block::Table { headers, rows } => {
            let mut out = String::from("<table>\n<tr><th></th>");
            for h in headers {
                out.push_str(&format!("<th>{}</th>", html_escape(h)));
            }
            out.push_str("</tr>\n");
            for (i, row) in rows.iter().enumerate() {
                out.push_str(&format!("<tr><th>{}</th>", i));
                for cell in row {
                    out.push_str(&format!("<td>{}</td>", html_escape(cell)));
                }
                out.push_str("</tr>\n");
            }
            out.push_str("</table>\n");
            out
        }
        Block::Columns { columns } => {
            let mut out = format!("<div class=\"row\" style=\"--cols: {}\">\n", columns.len());
            for column in columns {
                out.push_str("<div class=\"col\">\n");
                for widget in column {
                    out.push_str(&render_widget(widget));
                }
                out.push_str("</div>\n");
            }
            out.push_str("</div>\n");
            out
        }
    }
}

fn render_widget(widget: &Widget) -> String {
    match widget {
        Widget::Metric { label, value, delta } => {
            let delta_html = delta
                .as_ref()
                .map(|d| {
                    let class = if d.inverse { "inverse" } else { "normal" };
                    format!("<div class=\"delta {}\">{}</div>", class, html_escape(&d.text))
                })
                .unwrap_or_default();
            format!(
                "<div class=\"metric\"><div class=\"label\">{}</div><div class=\"value\">{}</div>{}</div>\n",
                html_escape(label),
                html_escape(value),
                delta_html
            )
        }
        Widget::Gauge { title, value, min, max, bar_color } => gauge_svg(title, *value, *min, *max, bar_color),
        Widget::Line { frame, series, color, width, .. } => {
            let (lo, hi) = value_bounds(series, false);
            let points = series_points(series, lo, hi);
            let body = format!(
                "<polyline fill=\"none\" stroke=\"{}\" stroke-width=\"{}\" points=\"{}\"/>",
                html_escape(color),
                width,
                points
            );
            chart_svg(frame, lo, hi, &body)
        }
        Widget::Area { frame, series, fill_color, .. } => {
            let (lo, hi) = value_bounds(series, true);
            let base = y_pos(0.0, lo, hi);
            let body = format!(
                "<polygon fill=\"{}\" stroke=\"none\" points=\"{:.1},{:.1} {} {:.1},{:.1}\"/>",
                html_escape(fill_color),
                PAD,
                base,
                series_points(series, lo, hi),
                CHART_W - PAD,
                base
            );
            chart_svg(frame, lo, hi, &body)
        }
        Widget::Bar { frame, categories, values, color } => bar_svg(frame, categories, values, color),
        Widget::Pie { title, slices } => pie_svg(title, slices),
    }
}

/// share of the gauge arc to fill; the value itself is shown unclamped
pub fn gauge_fraction(value: f64, min: f64, max: f64) -> f64 {
    if max <= min || !value.is_finite() {
        return 0.0;
    }
    ((value - min) / (max - min)).clamp(0.0, 1.0)
}

fn gauge_svg(title: &str, value: f64, min: f64, max: f64, bar_color: &str) -> String {
    let (cx, cy, r) = (150.0, 150.0, 110.0);
    let arc_to = |fraction: f64| {
        let theta = PI * (1.0 - fraction);
        (cx + r * theta.cos(), cy - r * theta.sin())
    };
    let (ex, ey) = arc_to(gauge_fraction(value, min, max));
    let (fx, fy) = arc_to(1.0);

    format!(
        r##"<svg class="gauge" viewBox="0 0 300 200" width="100%">
<text x="150" y="20" text-anchor="middle" fill="#fafafa" style="font-size:16px">{title}</text>
<path d="M {sx:.1} {cy:.1} A {r} {r} 0 0 1 {fx:.1} {fy:.1}" fill="none" stroke="#333" stroke-width="24"/>
<path d="M {sx:.1} {cy:.1} A {r} {r} 0 0 1 {ex:.1} {ey:.1}" fill="none" stroke="{bar}" stroke-width="24"/>
<text x="{sx:.1}" y="{ly:.1}" text-anchor="middle" fill="#a3a8b8">{min}</text>
<text x="{fx:.1}" y="{ly:.1}" text-anchor="middle" fill="#a3a8b8">{max}</text>
<text x="150" y="145" text-anchor="middle" fill="#fafafa" style="font-size:36px">{value}</text>
</svg>
"##,
        title = html_escape(title),
        sx = cx - r,
        cy = cy,
        r = r,
        fx = fx,
        fy = fy,
        ex = ex,
        ey = ey,
        bar = html_escape(bar_color),
        ly = cy + 20.0,
        min = min,
        max = max,
        value = value,
    )
}

/// y range of a series; flat series get a unit margin so they sit mid-chart
fn value_bounds(series: &TimeSeries, include_zero: bool) -> (f64, f64) {
    let mut lo = series.values().fold(f64::INFINITY, f64::min);
    let mut hi = series.values().fold(f64::NEG_INFINITY, f64::max);
    if !lo.is_finite() || !hi.is_finite() {
        return (0.0, 1.0);
    }
    if include_zero {
        lo = lo.min(0.0);
        hi = hi.max(0.0);
    }
    if hi - lo < f64::EPSILON {
        lo -= 1.0;
        hi += 1.0;
    }
    (lo, hi)
}

fn y_pos(value: f64, lo: f64, hi: f64) -> f64 {
    let inner = CHART_H - 2.0 * PAD;
    CHART_H - PAD - (value - lo) / (hi - lo) * inner
}

fn series_points(series: &TimeSeries, lo: f64, hi: f64) -> String {
    let n = series.len().max(2) - 1;
    let step = (CHART_W - 2.0 * PAD) / n as f64;
    series
        .values()
        .enumerate()
        .map(|(i, v)| format!("{:.1},{:.1}", PAD + i as f64 * step, y_pos(v, lo, hi)))
        .collect::<Vec<_>>()
        .join(" ")
}

fn chart_svg(frame: &ChartFrame, lo: f64, hi: f64, body: &str) -> String {
    let (bg, fg) = if frame.dark { ("#111111", "#f2f5fa") } else { ("#ffffff", "#2a3f5f") };
    format!(
        r#"<svg class="chart" viewBox="0 0 {w} {h}" width="100%">
<rect width="{w}" height="{h}" fill="{bg}"/>
<text x="{pad}" y="20" fill="{fg}" style="font-size:14px">{title}</text>
<line x1="{pad}" y1="{bottom}" x2="{right}" y2="{bottom}" stroke="{fg}" stroke-opacity="0.3"/>
<text x="{pad}" y="{bottom_label}" fill="{fg}">{lo:.1}</text>
<text x="{pad}" y="{top_label}" fill="{fg}">{hi:.1}</text>
<text x="{mid}" y="{x_label_y}" text-anchor="middle" fill="{fg}">{x_label}</text>
<text x="12" y="{mid_y}" text-anchor="middle" fill="{fg}" transform="rotate(-90 12 {mid_y})">{y_label}</text>
{body}
</svg>
"#,
        w = CHART_W,
        h = CHART_H,
        bg = bg,
        fg = fg,
        pad = PAD,
        title = html_escape(&frame.title),
        bottom = CHART_H - PAD,
        right = CHART_W - PAD,
        bottom_label = CHART_H - PAD + 14.0,
        top_label = PAD - 4.0,
        lo = lo,
        hi = hi,
        mid = CHART_W / 2.0,
        x_label_y = CHART_H - 8.0,
        x_label = html_escape(&frame.x_label),
        mid_y = CHART_H / 2.0,
        y_label = html_escape(&frame.y_label),
        body = body,
    )
}

fn bar_svg(frame: &ChartFrame, categories: &[String], values: &[f64], color: &str) -> String {
    let hi = values.iter().copied().fold(0.0_f64, f64::max);
    let hi = if hi > 0.0 { hi } else { 1.0 };
    let slot = (CHART_W - 2.0 * PAD) / categories.len().max(1) as f64;
    let base = y_pos(0.0, 0.0, hi);

    let mut body = String::new();
    for (i, (category, value)) in categories.iter().zip(values).enumerate() {
        let x = PAD + i as f64 * slot + slot * 0.1;
        let top = y_pos(value.max(0.0), 0.0, hi);
        body.push_str(&format!(
            "<rect x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\" fill=\"{}\"><title>{}: {}</title></rect>\n",
            x,
            top,
            slot * 0.8,
            base - top,
            html_escape(color),
            html_escape(category),
            value
        ));
        body.push_str(&format!(
            "<text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"middle\">{}</text>\n",
            x + slot * 0.4,
            base + 14.0,
            html_escape(category)
        ));
    }
    chart_svg(frame, 0.0, hi, &body)
}

fn pie_svg(title: &str, slices: &[Slice]) -> String {
    let (cx, cy, r) = (150.0, 130.0, 90.0);
    let total: f64 = slices.iter().map(|s| s.value.max(0.0)).sum();

    let mut body = String::new();
    if slices.len() == 1 || total <= 0.0 {
        if let Some(slice) = slices.first() {
            body.push_str(&format!(
                "<circle cx=\"{}\" cy=\"{}\" r=\"{}\" fill=\"{}\"><title>{}</title></circle>\n",
                cx,
                cy,
                r,
                html_escape(&slice.color),
                html_escape(&slice.label)
            ));
        }
    } else {
        let mut angle = -PI / 2.0;
        for slice in slices {
            let sweep = slice.value.max(0.0) / total * 2.0 * PI;
            let (x0, y0) = (cx + r * angle.cos(), cy + r * angle.sin());
            angle += sweep;
            let (x1, y1) = (cx + r * angle.cos(), cy + r * angle.sin());
            body.push_str(&format!(
                "<path d=\"M {cx} {cy} L {x0:.1} {y0:.1} A {r} {r} 0 {large} 1 {x1:.1} {y1:.1} Z\" fill=\"{fill}\"><title>{label}</title></path>\n",
                large = if sweep > PI { 1 } else { 0 },
                fill = html_escape(&slice.color),
                label = html_escape(&slice.label),
            ));
        }
    }

    let mut legend = String::new();
    for (i, slice) in slices.iter().enumerate() {
        let y = 40.0 + i as f64 * 18.0;
        legend.push_str(&format!(
            "<rect x=\"260\" y=\"{:.1}\" width=\"12\" height=\"12\" fill=\"{}\"/><text x=\"278\" y=\"{:.1}\" fill=\"#2a3f5f\">{}</text>\n",
            y - 10.0,
            html_escape(&slice.color),
            y,
            html_escape(&slice.label)
        ));
    }

    format!(
        r##"<svg class="pie" viewBox="0 0 360 240" width="100%">
<rect width="360" height="240" fill="#ffffff"/>
<text x="10" y="20" fill="#2a3f5f" style="font-size:14px">{}</text>
{}{}</svg>
"##,
        html_escape(title),
        body,
        legend
    )
}

/// escape html special characters to prevent xss
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
     .replace('<', "&lt;")
     .replace('>', "&gt;")
     .replace('"', "&quot;")
}

// ==============================================================================
// tests
// ==============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ControlState;
    use crate::layout::build_page;
    use crate::source::{tests::SAMPLE, Table};

    fn sample_html(controls: &ControlState) -> String {
        let table = Table::from_reader(SAMPLE.as_bytes()).unwrap();
        let reading = table.first_reading().unwrap();
        render_page(&build_page(&table, &reading, controls))
    }

    #[test]
    fn test_gauge_fraction() {
        assert_eq!(gauge_fraction(0.0, 0.0, 1023.0), 0.0);
        assert_eq!(gauge_fraction(1023.0, 0.0, 1023.0), 1.0);
        assert!((gauge_fraction(512.0, 0.0, 1023.0) - 0.5005).abs() < 1e-3);
        // out-of-range values draw at the ends
        assert_eq!(gauge_fraction(5000.0, 0.0, 1023.0), 1.0);
        assert_eq!(gauge_fraction(-3.0, 0.0, 1023.0), 0.0);
        assert_eq!(gauge_fraction(f64::NAN, 0.0, 1023.0), 0.0);
    }

    #[test]
    fn test_document_frame() {
        let html = sample_html(&ControlState::default());
        assert!(html.starts_with("<!doctype html>"));
        assert!(html.contains("<title>Dashboard</title>"));
        assert!(html.contains("<h1>Dashboard</h1>"));
        assert!(html.contains("<main class=\"wide\">"));
        assert!(html.contains("Dashboard by Your Name"));
        assert!(html.contains("<h3>Device Status</h3>"));
    }

    #[test]
    fn test_sidebar_reflects_controls() {
        let html = sample_html(&ControlState { pump_on: true, pump_seconds: 17, ..Default::default() });
        assert!(html.contains("name=\"pump\" value=\"on\" checked"));
        assert!(html.contains("name=\"generator\" value=\"on\" onchange"));
        assert!(html.contains("max=\"60\" value=\"17\""));
        assert!(html.contains("<button type=\"submit\" name=\"reset\" value=\"1\">Reset Slave</button>"));
    }

    #[test]
    fn test_gauge_value_and_range_rendered() {
        let html = sample_html(&ControlState::default());
        assert!(html.contains(">512</text>"));
        assert!(html.contains(">1023</text>"));
    }

    #[test]
    fn test_charts_present() {
        let html = sample_html(&ControlState::default());
        for title in ["Temperature Over Time", "Humidity Over Time", "Voltage Levels", "Site Status", "Fuel Level Over Time"] {
            assert!(html.contains(title), "missing chart {title}");
        }
        assert_eq!(html.matches("<polyline").count(), 2);
        assert_eq!(html.matches("<polygon").count(), 1);
        assert!(html.contains("<title>Active</title></circle>"));
        assert!(html.contains("<title>Voltage 4: 11.8</title>"));
    }

    #[test]
    fn test_user_text_is_escaped() {
        let csv = SAMPLE.replacen("Active", "<b>up</b>", 1);
        let table = Table::from_reader(csv.as_bytes()).unwrap();
        let reading = table.first_reading().unwrap();
        let html = render_page(&build_page(&table, &reading, &ControlState::default()));
        assert!(!html.contains("<b>up</b>"));
        assert!(html.contains("&lt;b&gt;up&lt;/b&gt;"));
    }

    #[test]
    fn test_flat_series_bounds() {
        let (lo, hi) = value_bounds(&TimeSeries::repeated(22.5), false);
        assert_eq!((lo, hi), (21.5, 23.5));
        let (lo, hi) = value_bounds(&TimeSeries::repeated(75.5), true);
        assert_eq!((lo, hi), (0.0, 75.5));
    }

    #[test]
    fn test_html_escape() {
        assert_eq!(html_escape("a<b>&\"c\""), "a&lt;b&gt;&amp;&quot;c&quot;");
    }
}
