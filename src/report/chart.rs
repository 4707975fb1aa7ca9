//! Bar chart rendering with plotters.
//!
//! Text is drawn with a TrueType font registered at first use: the file named
//! by `REPORT_FONT`, or the first common system font found.

use anyhow::{Result, anyhow, bail};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::{FontStyle, register_font};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::info;

use super::format::format_price;

pub const FONT_ENV: &str = "REPORT_FONT";

const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial Unicode.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

static FONT: OnceLock<Result<PathBuf, String>> = OnceLock::new();

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub label: String,
    pub value: f64,
}

impl Bar {
    pub fn new(label: impl Into<String>, value: f64) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

/// Horizontal line across a panel, e.g. an average.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceLine {
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    pub title: String,
    pub x_desc: String,
    pub y_desc: String,
    pub bars: Vec<Bar>,
    pub reference: Option<ReferenceLine>,
}

impl Panel {
    /// A price panel: the y axis is labelled and formatted as a price.
    pub fn prices(title: impl Into<String>, x_desc: impl Into<String>, bars: Vec<Bar>) -> Self {
        Self {
            title: title.into(),
            x_desc: x_desc.into(),
            y_desc: "Price".to_string(),
            bars,
            reference: None,
        }
    }

    pub fn with_y_desc(mut self, y_desc: impl Into<String>) -> Self {
        self.y_desc = y_desc.into();
        self
    }

    pub fn with_reference(mut self, label: impl Into<String>, value: f64) -> Self {
        self.reference = Some(ReferenceLine {
            label: label.into(),
            value,
        });
        self
    }
}

/// Panels stacked vertically in one image.
#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    pub panels: Vec<Panel>,
    pub size: (u32, u32),
}

impl Chart {
    pub fn single(panel: Panel) -> Self {
        Self {
            panels: vec![panel],
            size: (1400, 800),
        }
    }

    pub fn stacked(panels: Vec<Panel>) -> Self {
        let height = 600 * panels.len().max(1) as u32;
        Self {
            panels,
            size: (1400, height),
        }
    }
}

/// Renders `chart` as a PNG at `path`.
pub fn render(chart: &Chart, path: &Path) -> Result<()> {
    ensure_font()?;

    let root = BitMapBackend::new(path, chart.size).into_drawing_area();
    root.fill(&WHITE)?;

    let areas = root.split_evenly((chart.panels.len().max(1), 1));
    for (panel, area) in chart.panels.iter().zip(&areas) {
        draw_panel(panel, area)?;
    }

    root.present()?;
    Ok(())
}

fn draw_panel(panel: &Panel, area: &DrawingArea<BitMapBackend<'_>, Shift>) -> Result<()> {
    let n = panel.bars.len();
    if n == 0 {
        bail!("panel '{}' has no data", panel.title);
    }

    let max = panel
        .bars
        .iter()
        .map(|b| b.value)
        .chain(panel.reference.iter().map(|r| r.value))
        .fold(0.0, f64::max);
    let top = if max > 0.0 { max * 1.15 } else { 1.0 };

    let mut chart = ChartBuilder::on(area)
        .caption(&panel.title, ("sans-serif", 24))
        .margin(15)
        .x_label_area_size(70)
        .y_label_area_size(90)
        .build_cartesian_2d((0..n).into_segmented(), 0f64..top)?;

    let x_fmt = |v: &SegmentValue<usize>| match v {
        SegmentValue::CenterOf(i) | SegmentValue::Exact(i) => {
            panel.bars.get(*i).map(|b| b.label.clone()).unwrap_or_default()
        }
        SegmentValue::Last => String::new(),
    };
    let y_fmt = |v: &f64| format_price(*v);

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(n)
        .x_label_formatter(&x_fmt)
        .y_label_formatter(&y_fmt)
        .x_desc(panel.x_desc.as_str())
        .y_desc(panel.y_desc.as_str())
        .draw()?;

    chart.draw_series(
        Histogram::vertical(&chart)
            .style(BLUE.mix(0.7).filled())
            .margin(10)
            .data(panel.bars.iter().enumerate().map(|(i, b)| (i, b.value))),
    )?;

    chart.draw_series(panel.bars.iter().enumerate().map(|(i, b)| {
        Text::new(
            format_price(b.value),
            (SegmentValue::CenterOf(i), b.value),
            ("sans-serif", 14).into_font(),
        )
    }))?;

    if let Some(reference) = &panel.reference {
        chart
            .draw_series(LineSeries::new(
                vec![
                    (SegmentValue::Exact(0), reference.value),
                    (SegmentValue::Last, reference.value),
                ],
                RED.stroke_width(2),
            ))?
            .label(reference.label.clone())
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED));

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
    }

    Ok(())
}

fn ensure_font() -> Result<()> {
    match FONT.get_or_init(|| register_system_font().map_err(|e| format!("{e:#}"))) {
        Ok(_) => Ok(()),
        Err(e) => Err(anyhow!("{e}")),
    }
}

fn register_system_font() -> Result<PathBuf> {
    let candidates = std::env::var(FONT_ENV)
        .ok()
        .map(PathBuf::from)
        .into_iter()
        .chain(FONT_CANDIDATES.iter().map(PathBuf::from));

    for path in candidates {
        let Ok(bytes) = std::fs::read(&path) else {
            continue;
        };
        // Registered fonts live for the rest of the process.
        let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
        register_font("sans-serif", FontStyle::Normal, bytes)
            .map_err(|_| anyhow!("{} is not a usable font", path.display()))?;
        info!(font = %path.display(), "Chart font registered");
        return Ok(path);
    }

    bail!("no chart font found; set {FONT_ENV} to a .ttf file")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stacked_chart_grows_with_panels() {
        let panel = Panel::prices("t", "x", vec![Bar::new("a", 1.0)]);
        let chart = Chart::stacked(vec![panel.clone(), panel]);
        assert_eq!(chart.size, (1400, 1200));
    }

    #[test]
    fn test_panel_builders() {
        let panel = Panel::prices("Mean price", "District", vec![])
            .with_y_desc("Price per m²")
            .with_reference("City mean", 5.0);
        assert_eq!(panel.y_desc, "Price per m²");
        assert_eq!(panel.reference.unwrap().value, 5.0);
    }

    #[test]
    fn test_render_rejects_empty_panel() {
        let chart = Chart::single(Panel::prices("empty", "x", vec![]));
        let path = std::env::temp_dir().join("listing_tools_empty_chart.png");
        assert!(render(&chart, &path).is_err());
    }
}
