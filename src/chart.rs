use plotters::prelude::*;
use thiserror::Error;
use time::Date;

// Palette carried over from the published dashboard.
pub const DOSE_GREEN: RGBColor = RGBColor(0x1f, 0x82, 0x2c);
pub const AMBER: RGBColor = RGBColor(0xff, 0x9d, 0x3c);
pub const INDIGO: RGBColor = RGBColor(0x29, 0x25, 0x5f);
pub const BRIGHT_GREEN: RGBColor = RGBColor(0x3c, 0xb6, 0x4c);

const PANEL_SIZE: (u32, u32) = (720, 480);
const PIE_SIZE: (u32, u32) = (480, 480);

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("could not render `{title}`: {message}")]
    Render { title: String, message: String },
}

impl ChartError {
    fn render(title: &str, message: impl std::fmt::Display) -> Self {
        Self::Render {
            title: title.to_string(),
            message: message.to_string(),
        }
    }
}

/// One plotted line: a name for the legend, a color, and (date, value)
/// points.
pub struct Series<'a> {
    pub name: &'a str,
    pub color: RGBColor,
    pub points: &'a [(Date, f64)],
}

// plotters speaks chrono on its date axes.
fn naive(date: Date) -> chrono::NaiveDate {
    chrono::NaiveDate::from_ymd_opt(date.year(), date.month() as u32, date.day() as u32)
        .expect("calendar date out of range")
}

pub fn line_chart(title: &str, y_desc: &str, series: &[Series]) -> Result<String, ChartError> {
    let first = series
        .iter()
        .filter_map(|s| s.points.first())
        .map(|(date, _)| *date)
        .min();
    let last = series
        .iter()
        .filter_map(|s| s.points.last())
        .map(|(date, _)| *date)
        .max();
    let (first, last) = match (first, last) {
        (Some(first), Some(last)) if first < last => (first, last),
        _ => return Err(ChartError::render(title, "not enough points")),
    };

    let max_y = series
        .iter()
        .flat_map(|s| s.points.iter().map(|(_, value)| *value))
        .fold(0.0f64, f64::max)
        .max(1.0);

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, PANEL_SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(|e| ChartError::render(title, e))?;

        let mut chart = ChartBuilder::on(&root)
            .caption(title, ("sans-serif", 22))
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(70)
            .build_cartesian_2d(naive(first)..naive(last), 0.0..max_y * 1.05)
            .map_err(|e| ChartError::render(title, e))?;

        chart
            .configure_mesh()
            .x_labels(6)
            .x_label_formatter(&|date| date.format("%Y-%m-%d").to_string())
            .y_desc(y_desc)
            .draw()
            .map_err(|e| ChartError::render(title, e))?;

        for s in series {
            let color = s.color;
            chart
                .draw_series(LineSeries::new(
                    s.points.iter().map(|(date, value)| (naive(*date), *value)),
                    color,
                ))
                .map_err(|e| ChartError::render(title, e))?
                .label(s.name)
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
        }

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(|e| ChartError::render(title, e))?;

        root.present().map_err(|e| ChartError::render(title, e))?;
    }
    Ok(svg)
}

/// Vertical bars over fixed categories (the weekday chart).
pub fn bar_chart(
    title: &str,
    y_desc: &str,
    categories: &[String],
    values: &[f64],
    color: RGBColor,
) -> Result<String, ChartError> {
    if categories.is_empty() || categories.len() != values.len() {
        return Err(ChartError::render(title, "bad category table"));
    }
    let max_y = values.iter().copied().fold(0.0f64, f64::max).max(1.0);

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, PANEL_SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(|e| ChartError::render(title, e))?;

        let mut chart = ChartBuilder::on(&root)
            .caption(title, ("sans-serif", 18))
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(70)
            .build_cartesian_2d(
                (0..categories.len() as i32).into_segmented(),
                0.0..max_y * 1.05,
            )
            .map_err(|e| ChartError::render(title, e))?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_label_formatter(&|position| match position {
                SegmentValue::CenterOf(i) => categories
                    .get(*i as usize)
                    .cloned()
                    .unwrap_or_default(),
                _ => String::new(),
            })
            .x_labels(categories.len())
            .y_desc(y_desc)
            .draw()
            .map_err(|e| ChartError::render(title, e))?;

        chart
            .draw_series(values.iter().enumerate().map(|(i, &value)| {
                let i = i as i32;
                let mut bar = Rectangle::new(
                    [
                        (SegmentValue::Exact(i), 0.0),
                        (SegmentValue::Exact(i + 1), value),
                    ],
                    color.filled(),
                );
                bar.set_margin(0, 0, 4, 4);
                bar
            }))
            .map_err(|e| ChartError::render(title, e))?;

        root.present().map_err(|e| ChartError::render(title, e))?;
    }
    Ok(svg)
}

/// Horizontal bars, one per labeled row, drawn bottom-up in `rows` order.
pub fn barh_chart(
    title: &str,
    x_desc: &str,
    rows: &[(String, f64)],
    color: RGBColor,
) -> Result<String, ChartError> {
    if rows.is_empty() {
        return Err(ChartError::render(title, "no rows"));
    }
    let max_x = rows
        .iter()
        .map(|(_, value)| *value)
        .fold(0.0f64, f64::max)
        .max(1.0);

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, PANEL_SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(|e| ChartError::render(title, e))?;

        let mut chart = ChartBuilder::on(&root)
            .caption(title, ("sans-serif", 22))
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(140)
            .build_cartesian_2d(0.0..max_x * 1.05, (0..rows.len() as i32).into_segmented())
            .map_err(|e| ChartError::render(title, e))?;

        chart
            .configure_mesh()
            .disable_y_mesh()
            .y_label_formatter(&|position| match position {
                SegmentValue::CenterOf(i) => rows
                    .get(*i as usize)
                    .map(|(name, _)| name.clone())
                    .unwrap_or_default(),
                _ => String::new(),
            })
            .y_labels(rows.len())
            .x_desc(x_desc)
            .draw()
            .map_err(|e| ChartError::render(title, e))?;

        chart
            .draw_series(rows.iter().enumerate().map(|(i, (_, value))| {
                let i = i as i32;
                let mut bar = Rectangle::new(
                    [
                        (0.0, SegmentValue::Exact(i)),
                        (*value, SegmentValue::Exact(i + 1)),
                    ],
                    color.filled(),
                );
                bar.set_margin(2, 2, 0, 0);
                bar
            }))
            .map_err(|e| ChartError::render(title, e))?;

        root.present().map_err(|e| ChartError::render(title, e))?;
    }
    Ok(svg)
}

/// Two-segment stacked horizontal bars; each row is (label, first segment,
/// second segment). Used for vaccinated/unvaccinated percentage splits.
pub fn stacked_barh_chart(
    title: &str,
    x_desc: &str,
    rows: &[(String, f64, f64)],
    names: (&str, &str),
    colors: (RGBColor, RGBColor),
) -> Result<String, ChartError> {
    if rows.is_empty() {
        return Err(ChartError::render(title, "no rows"));
    }
    let max_x = rows
        .iter()
        .map(|(_, first, second)| first + second)
        .fold(100.0f64, f64::max);

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, PANEL_SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(|e| ChartError::render(title, e))?;

        let mut chart = ChartBuilder::on(&root)
            .caption(title, ("sans-serif", 18))
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(140)
            .build_cartesian_2d(0.0..max_x * 1.02, (0..rows.len() as i32).into_segmented())
            .map_err(|e| ChartError::render(title, e))?;

        chart
            .configure_mesh()
            .disable_y_mesh()
            .y_label_formatter(&|position| match position {
                SegmentValue::CenterOf(i) => rows
                    .get(*i as usize)
                    .map(|(name, _, _)| name.clone())
                    .unwrap_or_default(),
                _ => String::new(),
            })
            .y_labels(rows.len())
            .x_desc(x_desc)
            .draw()
            .map_err(|e| ChartError::render(title, e))?;

        let (first_color, second_color) = colors;
        chart
            .draw_series(rows.iter().enumerate().map(|(i, (_, first, _))| {
                let i = i as i32;
                let mut bar = Rectangle::new(
                    [
                        (0.0, SegmentValue::Exact(i)),
                        (*first, SegmentValue::Exact(i + 1)),
                    ],
                    first_color.filled(),
                );
                bar.set_margin(2, 2, 0, 0);
                bar
            }))
            .map_err(|e| ChartError::render(title, e))?
            .label(names.0)
            .legend(move |(x, y)| {
                Rectangle::new([(x, y - 5), (x + 10, y + 5)], first_color.filled())
            });

        chart
            .draw_series(rows.iter().enumerate().map(|(i, (_, first, second))| {
                let i = i as i32;
                let mut bar = Rectangle::new(
                    [
                        (*first, SegmentValue::Exact(i)),
                        (first + second, SegmentValue::Exact(i + 1)),
                    ],
                    second_color.filled(),
                );
                bar.set_margin(2, 2, 0, 0);
                bar
            }))
            .map_err(|e| ChartError::render(title, e))?
            .label(names.1)
            .legend(move |(x, y)| {
                Rectangle::new([(x, y - 5), (x + 10, y + 5)], second_color.filled())
            });

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(|e| ChartError::render(title, e))?;

        root.present().map_err(|e| ChartError::render(title, e))?;
    }
    Ok(svg)
}

pub struct PieSlice {
    pub name: String,
    pub value: f64,
    pub color: RGBColor,
}

pub fn pie_chart(title: &str, slices: &[PieSlice]) -> Result<String, ChartError> {
    if slices.is_empty() || slices.iter().all(|s| s.value <= 0.0) {
        return Err(ChartError::render(title, "nothing to plot"));
    }

    let sizes: Vec<f64> = slices.iter().map(|s| s.value).collect();
    let colors: Vec<RGBColor> = slices.iter().map(|s| s.color).collect();
    let labels: Vec<String> = slices.iter().map(|s| s.name.clone()).collect();

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, PIE_SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(|e| ChartError::render(title, e))?;
        let root = root
            .titled(title, ("sans-serif", 18))
            .map_err(|e| ChartError::render(title, e))?;

        let center = (240, 240);
        let radius = 150.0;
        let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
        pie.start_angle(270.0);
        pie.label_style(("sans-serif", 16).into_font().color(&BLACK));
        pie.percentages(("sans-serif", 14).into_font().color(&WHITE));
        root.draw(&pie).map_err(|e| ChartError::render(title, e))?;

        root.present().map_err(|e| ChartError::render(title, e))?;
    }
    Ok(svg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn line_chart_emits_svg() {
        let points = vec![
            (date!(2021 - 08 - 01), 1.0),
            (date!(2021 - 08 - 02), 2.0),
            (date!(2021 - 08 - 03), 3.0),
        ];
        let svg = line_chart(
            "Daily",
            "Doses",
            &[Series {
                name: "Daily doses",
                color: DOSE_GREEN,
                points: &points,
            }],
        )
        .unwrap();
        assert!(svg.contains("<svg"));
    }

    #[test]
    fn line_chart_needs_a_date_range() {
        let points = vec![(date!(2021 - 08 - 01), 1.0)];
        let err = line_chart(
            "Daily",
            "Doses",
            &[Series {
                name: "Daily doses",
                color: DOSE_GREEN,
                points: &points,
            }],
        )
        .unwrap_err();
        assert!(matches!(err, ChartError::Render { .. }));
    }

    #[test]
    fn bar_charts_emit_svg() {
        let rows = vec![("Johor".to_string(), 10.0), ("Kedah".to_string(), 20.0)];
        let svg = barh_chart("By state", "Doses", &rows, DOSE_GREEN).unwrap();
        assert!(svg.contains("<svg"));

        let categories: Vec<String> = ["Monday", "Tuesday"].iter().map(|s| s.to_string()).collect();
        let svg = bar_chart("By day", "Doses", &categories, &[1.0, 2.0], DOSE_GREEN).unwrap();
        assert!(svg.contains("<svg"));
    }

    #[test]
    fn stacked_bars_emit_svg() {
        let rows = vec![
            ("Johor".to_string(), 40.0, 60.0),
            ("Kedah".to_string(), 110.0, 0.0),
        ];
        let svg = stacked_barh_chart(
            "Coverage",
            "Percentage",
            &rows,
            ("Vaccinated", "Unvaccinated"),
            (BRIGHT_GREEN, INDIGO),
        )
        .unwrap();
        assert!(svg.contains("<svg"));
    }

    #[test]
    fn pie_chart_emits_svg() {
        let svg = pie_chart(
            "Progress",
            &[
                PieSlice {
                    name: "Vaccinated".to_string(),
                    value: 30.0,
                    color: BRIGHT_GREEN,
                },
                PieSlice {
                    name: "Unvaccinated".to_string(),
                    value: 70.0,
                    color: INDIGO,
                },
            ],
        )
        .unwrap();
        assert!(svg.contains("<svg"));
    }
}
