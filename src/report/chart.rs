//! Minimal SVG line and bar charts.

const WIDTH: f64 = 960.0;
const HEIGHT: f64 = 480.0;
const MARGIN_LEFT: f64 = 100.0;
const MARGIN_RIGHT: f64 = 40.0;
const MARGIN_TOP: f64 = 60.0;
const MARGIN_BOTTOM: f64 = 90.0;
const TICKS: usize = 5;

/// A named sequence of values drawn as one line.
pub struct Series<'a> {
    pub label: &'a str,
    pub color: &'a str,
    pub values: Vec<f64>,
}

/// Maps data values onto the vertical pixel range of the plot area.
struct Scale {
    min: f64,
    max: f64,
}

impl Scale {
    /// Covers every value and zero, with a little headroom.
    fn covering<'a>(values: impl Iterator<Item = &'a f64>) -> Self {
        let (min, max) = values.fold((0.0_f64, 0.0_f64), |(lo, hi), v| (lo.min(*v), hi.max(*v)));
        let span = if max - min > 0.0 { max - min } else { 1.0 };
        Scale {
            min: if min < 0.0 { min - span * 0.05 } else { min },
            max: max + span * 0.05,
        }
    }

    fn y(&self, value: f64) -> f64 {
        let plot_h = HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
        MARGIN_TOP + plot_h * (1.0 - (value - self.min) / (self.max - self.min))
    }

    fn ticks(&self) -> impl Iterator<Item = f64> + '_ {
        (0..=TICKS).map(move |i| self.min + (self.max - self.min) * i as f64 / TICKS as f64)
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn header(title: &str, y_label: &str) -> String {
    let mut svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH}" height="{HEIGHT}" viewBox="0 0 {WIDTH} {HEIGHT}" font-family="sans-serif">"#
    );
    svg.push('\n');
    svg.push_str(&format!(
        r#"<rect width="{WIDTH}" height="{HEIGHT}" fill="white"/>"#
    ));
    svg.push('\n');
    svg.push_str(&format!(
        r#"<text x="{}" y="32" font-size="20" text-anchor="middle">{}</text>"#,
        WIDTH / 2.0,
        escape(title)
    ));
    svg.push('\n');
    let mid_y = MARGIN_TOP + (HEIGHT - MARGIN_TOP - MARGIN_BOTTOM) / 2.0;
    svg.push_str(&format!(
        r#"<text x="24" y="{mid_y}" font-size="14" text-anchor="middle" transform="rotate(-90 24 {mid_y})">{}</text>"#,
        escape(y_label)
    ));
    svg.push('\n');
    svg
}

fn axes(scale: &Scale) -> String {
    let mut svg = String::new();
    for tick in scale.ticks() {
        let y = scale.y(tick);
        svg.push_str(&format!(
            r##"<line x1="{MARGIN_LEFT}" y1="{y:.1}" x2="{}" y2="{y:.1}" stroke="#e0e0e0"/>"##,
            WIDTH - MARGIN_RIGHT
        ));
        svg.push('\n');
        svg.push_str(&format!(
            r#"<text x="{}" y="{:.1}" font-size="12" text-anchor="end">{tick:.0}</text>"#,
            MARGIN_LEFT - 8.0,
            y + 4.0
        ));
        svg.push('\n');
    }
    let zero = scale.y(0.0);
    svg.push_str(&format!(
        r##"<line x1="{MARGIN_LEFT}" y1="{zero:.1}" x2="{}" y2="{zero:.1}" stroke="#333333"/>"##,
        WIDTH - MARGIN_RIGHT
    ));
    svg.push('\n');
    svg.push_str(&format!(
        r##"<line x1="{MARGIN_LEFT}" y1="{MARGIN_TOP}" x2="{MARGIN_LEFT}" y2="{}" stroke="#333333"/>"##,
        HEIGHT - MARGIN_BOTTOM
    ));
    svg.push('\n');
    svg
}

fn x_label(x: f64, text: &str) -> String {
    let y = HEIGHT - MARGIN_BOTTOM + 18.0;
    format!(
        r#"<text x="{x:.1}" y="{y}" font-size="12" text-anchor="end" transform="rotate(-45 {x:.1} {y})">{}</text>"#,
        escape(text)
    ) + "\n"
}

/// Line chart with one polyline per series over shared x labels.
pub fn line_chart(title: &str, y_label: &str, x_labels: &[String], series: &[Series]) -> String {
    let scale = Scale::covering(series.iter().flat_map(|s| s.values.iter()));
    let plot_w = WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    let x = |i: usize| {
        if x_labels.len() <= 1 {
            MARGIN_LEFT + plot_w / 2.0
        } else {
            MARGIN_LEFT + plot_w * i as f64 / (x_labels.len() - 1) as f64
        }
    };

    let mut svg = header(title, y_label);
    svg.push_str(&axes(&scale));
    for (i, label) in x_labels.iter().enumerate() {
        svg.push_str(&x_label(x(i), label));
    }

    for (n, s) in series.iter().enumerate() {
        let points: Vec<String> = s
            .values
            .iter()
            .enumerate()
            .map(|(i, v)| format!("{:.1},{:.1}", x(i), scale.y(*v)))
            .collect();
        svg.push_str(&format!(
            r#"<polyline fill="none" stroke="{}" stroke-width="2" points="{}"/>"#,
            s.color,
            points.join(" ")
        ));
        svg.push('\n');
        for (i, v) in s.values.iter().enumerate() {
            svg.push_str(&format!(
                r#"<circle cx="{:.1}" cy="{:.1}" r="3" fill="{}"/>"#,
                x(i),
                scale.y(*v),
                s.color
            ));
            svg.push('\n');
        }

        // Legend, top right.
        let ly = MARGIN_TOP + 10.0 + 20.0 * n as f64;
        let lx = WIDTH - MARGIN_RIGHT - 140.0;
        svg.push_str(&format!(
            r#"<rect x="{lx}" y="{}" width="14" height="4" fill="{}"/><text x="{}" y="{}" font-size="13">{}</text>"#,
            ly - 4.0,
            s.color,
            lx + 20.0,
            ly + 1.0,
            escape(s.label)
        ));
        svg.push('\n');
    }

    svg.push_str("</svg>\n");
    svg
}

/// Vertical bar chart, one bar per label. Negative values extend below zero.
pub fn bar_chart(title: &str, y_label: &str, labels: &[String], values: &[f64], color: &str) -> String {
    let scale = Scale::covering(values.iter());
    let plot_w = WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    let band = plot_w / labels.len().max(1) as f64;
    let zero = scale.y(0.0);

    let mut svg = header(title, y_label);
    svg.push_str(&axes(&scale));
    for (i, (label, value)) in labels.iter().zip(values).enumerate() {
        let center = MARGIN_LEFT + band * (i as f64 + 0.5);
        let top = scale.y(*value).min(zero);
        let height = (scale.y(*value) - zero).abs();
        svg.push_str(&format!(
            r#"<rect x="{:.1}" y="{top:.1}" width="{:.1}" height="{height:.1}" fill="{color}"/>"#,
            center - band * 0.3,
            band * 0.6
        ));
        svg.push('\n');
        svg.push_str(&x_label(center, label));
    }
    svg.push_str("</svg>\n");
    svg
}
