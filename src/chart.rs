use chrono::NaiveDateTime;
use plotters::coord::types::RangedDateTime;
use plotters::prelude::*;

/// Direction of one step in a price series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Up,
    Down,
}

/// Chart rendering style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartMode {
    /// Single blue trace through every point.
    Line,
    /// Rising segments green, falling segments red, flat segments omitted.
    UpDown,
}

impl ChartMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "line" => Some(Self::Line),
            "updown" => Some(Self::UpDown),
            _ => None,
        }
    }
}

/// Classify each point by the sign of its first difference.
///
/// Point `i` is `Up` iff `prices[i] > prices[i-1]`, `Down` iff strictly
/// less, and `None` when equal.  Point 0 has no predecessor and is always
/// `None`.  A `None` step leaves a visible gap in the up/down chart.
pub fn partition_trends(prices: &[f64]) -> Vec<Option<Trend>> {
    let mut out = vec![None; prices.len()];
    for i in 1..prices.len() {
        out[i] = if prices[i] > prices[i - 1] {
            Some(Trend::Up)
        } else if prices[i] < prices[i - 1] {
            Some(Trend::Down)
        } else {
            None
        };
    }
    out
}

/// Render a price series to an SVG document.
///
/// Timestamps are expected to be pre-converted to the viewer's zone; the
/// renderer plots them as-is.
pub fn render_svg(
    points: &[(NaiveDateTime, f64)],
    caption: &str,
    mode: ChartMode,
    width: u32,
    height: u32,
) -> Result<String, String> {
    if points.len() < 2 {
        return Err("not enough price data to draw a chart (minimum 2 points required)".to_string());
    }

    // The x-range and trend segments assume chronological order.
    let mut points = points.to_vec();
    points.sort_by_key(|p| p.0);

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (width, height)).into_drawing_area();
        root.fill(&WHITE)
            .map_err(|e| format!("Failed to fill canvas: {}", e))?;

        let min_price = points.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);
        let max_price = points.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max);

        // Add some padding to the price range
        let price_range = (max_price - min_price).max(1e-8); // Avoid division by zero
        let padding = price_range * 0.1;
        let y_min = (min_price - padding).max(0.0);
        let y_max = max_price + padding;

        let x_min = points[0].0;
        let x_max = points[points.len() - 1].0;

        // `Range<NaiveDateTime>` has no ranged-coord impl of its own; it has
        // to go through the RangedDateTime conversion.
        let mut chart = ChartBuilder::on(&root)
            .caption(caption, ("sans-serif", 22.0).into_font())
            .margin(12)
            .x_label_area_size(36)
            .y_label_area_size(70)
            .build_cartesian_2d(RangedDateTime::from(x_min..x_max), y_min..y_max)
            .map_err(|e| format!("Failed to build chart: {}", e))?;

        chart
            .configure_mesh()
            .y_desc("USD")
            .x_desc("Time")
            .x_label_formatter(&|dt| dt.format("%H:%M").to_string())
            .draw()
            .map_err(|e| format!("Failed to draw mesh: {}", e))?;

        match mode {
            ChartMode::Line => {
                chart
                    .draw_series(LineSeries::new(points.iter().copied(), &BLUE))
                    .map_err(|e| format!("Failed to draw line: {}", e))?;
            }
            ChartMode::UpDown => {
                let trends = partition_trends(&points.iter().map(|p| p.1).collect::<Vec<_>>());
                for i in 1..points.len() {
                    // Flat steps draw nothing, leaving a gap.
                    let color = match trends[i] {
                        Some(Trend::Up) => &GREEN,
                        Some(Trend::Down) => &RED,
                        None => continue,
                    };
                    chart
                        .draw_series(std::iter::once(PathElement::new(
                            vec![points[i - 1], points[i]],
                            color,
                        )))
                        .map_err(|e| format!("Failed to draw segment: {}", e))?;
                }
            }
        }

        root.present()
            .map_err(|e| format!("Failed to render chart: {}", e))?;
    }

    Ok(svg)
}
