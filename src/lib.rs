//! Fetches the public CITF Malaysia vaccination datasets, derives the
//! aggregates shown on the dashboard (rolling averages, cumulative totals,
//! per-state coverage) and writes one static HTML report.
//!
//! The whole program is a single pass: fetch, parse, compute, render, write.
//! Any failure along the way aborts the run without touching the output
//! file.

pub mod aggregate;
pub mod chart;
pub mod config;
pub mod data;
pub mod fetch;
pub mod report;

use thiserror::Error;
use time::{format_description::FormatItem, macros::format_description, Date, OffsetDateTime};

pub use aggregate::Headline;
pub use config::ReportConfig;
pub use report::{Panel, ReportMeta};

use data::DailyRecord;

const TIMESTAMP_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    Fetch(#[from] fetch::FetchError),
    #[error(transparent)]
    Parse(#[from] data::ParseError),
    #[error(transparent)]
    Aggregate(#[from] aggregate::AggregateError),
    #[error(transparent)]
    Chart(#[from] chart::ChartError),
    #[error("could not format the generation timestamp")]
    Timestamp(#[from] time::error::Format),
    #[error("could not write report to `{path}`")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Fetches the three datasets, builds the report and writes it to
/// `config.output_path`.
pub fn run(config: &ReportConfig) -> Result<(), ReportError> {
    println!("fetching {}", config.national_url);
    let national = fetch::fetch_text(&config.national_url)?;
    println!("fetching {}", config.state_url);
    let states = fetch::fetch_text(&config.state_url)?;
    println!("fetching {}", config.population_url);
    let population = fetch::fetch_text(&config.population_url)?;

    let html = build_report(config, &national, &states, &population)?;

    std::fs::write(&config.output_path, html).map_err(|source| ReportError::Write {
        path: config.output_path.display().to_string(),
        source,
    })?;
    Ok(())
}

fn series_f64(days: &[DailyRecord], retrieve: fn(&DailyRecord) -> u64) -> Vec<f64> {
    days.iter().map(|day| retrieve(day) as f64).collect()
}

fn series_points(days: &[DailyRecord], retrieve: fn(&DailyRecord) -> u64) -> Vec<(Date, f64)> {
    days.iter()
        .map(|day| (day.date, retrieve(day) as f64))
        .collect()
}

/// Turns the three raw CSV bodies into the finished HTML document. Split
/// from [`run`] so the whole pipeline can be driven from fixtures.
pub fn build_report(
    config: &ReportConfig,
    national_csv: &str,
    state_csv: &str,
    population_csv: &str,
) -> Result<String, ReportError> {
    let days = data::parse_national(national_csv)?;
    let mut doses = data::parse_state_doses(state_csv)?;
    let mut populations = data::parse_population(population_csv)?;

    let latest = days.last().ok_or(data::ParseError::Empty {
        dataset: data::Dataset::National,
    })?;

    // Panel 1: daily rate with its 7-day rolling average.
    let daily_totals: Vec<u64> = days.iter().map(|day| day.total_daily).collect();
    let rolling = aggregate::rolling_mean(&daily_totals, aggregate::ROLLING_WINDOW);
    let rolling_values: Vec<f64> = rolling.iter().flatten().copied().collect();
    let rolling_points: Vec<(Date, f64)> = days
        .iter()
        .zip(&rolling)
        .filter_map(|(day, avg)| avg.map(|avg| (day.date, avg)))
        .collect();
    let daily_points = series_points(&days, |day| day.total_daily);

    let rate_headlines = vec![
        aggregate::headline("7-day average", &rolling_values)?,
        aggregate::headline("Today 1st dose", &series_f64(&days, |day| day.dose1_daily))?,
        aggregate::headline("Today 2nd dose", &series_f64(&days, |day| day.dose2_daily))?,
    ];
    let rate_svg = chart::line_chart(
        "Daily Vaccination Rate (Doses)",
        "Doses",
        &[
            chart::Series {
                name: "Daily doses",
                color: chart::DOSE_GREEN,
                points: &daily_points,
            },
            chart::Series {
                name: "Week roll avg",
                color: chart::AMBER,
                points: &rolling_points,
            },
        ],
    )?;

    // Panel 2: cumulative doses.
    let total_cumul_points = series_points(&days, |day| day.total_cumul);
    let dose1_cumul_points = series_points(&days, |day| day.dose1_cumul);
    let dose2_cumul_points = series_points(&days, |day| day.dose2_cumul);

    let cumul_headlines = vec![
        aggregate::headline("Total doses", &series_f64(&days, |day| day.total_cumul))?,
        aggregate::headline("1st dose", &series_f64(&days, |day| day.dose1_cumul))?,
        aggregate::headline("2nd dose", &series_f64(&days, |day| day.dose2_cumul))?,
    ];
    let cumul_svg = chart::line_chart(
        "Total Vaccination Dose Administered",
        "Doses to date",
        &[
            chart::Series {
                name: "Total dose",
                color: chart::DOSE_GREEN,
                points: &total_cumul_points,
            },
            chart::Series {
                name: "1st dose",
                color: chart::AMBER,
                points: &dose1_cumul_points,
            },
            chart::Series {
                name: "2nd dose",
                color: chart::INDIGO,
                points: &dose2_cumul_points,
            },
        ],
    )?;

    // Panel 3: distribution by weekday over the trailing full weeks.
    let distribution = aggregate::weekday_distribution(&days)?;
    let weekday_title = format!(
        "Doses administered by day distribution from {} to {}",
        data::format_date(distribution.first),
        data::format_date(distribution.last)
    );
    let weekday_labels: Vec<String> = aggregate::WEEKDAYS
        .iter()
        .map(|day| day.to_string())
        .collect();
    let weekday_values: Vec<f64> = distribution
        .totals
        .iter()
        .map(|&total| total as f64)
        .collect();
    let weekday_svg = chart::bar_chart(
        &weekday_title,
        "Doses administered",
        &weekday_labels,
        &weekday_values,
        chart::DOSE_GREEN,
    )?;

    // Panel 4: doses by state, ascending so the largest bar sits on top.
    // Raw states only; the synthetic region joins the tables afterwards for
    // the percentage panels.
    let mut state_rows: Vec<(String, f64)> = doses
        .iter()
        .map(|dose| (dose.state.clone(), dose.total_cumul as f64))
        .collect();
    state_rows.sort_by(|a, b| a.1.total_cmp(&b.1));
    let state_svg = chart::barh_chart(
        "Doses administered by state",
        "Doses",
        &state_rows,
        chart::DOSE_GREEN,
    )?;

    // Panels 5 and 6: per-state coverage, synthetic region included.
    aggregate::append_region(
        &config.synthetic_region.name,
        &config.synthetic_region.members,
        &mut doses,
        &mut populations,
    )?;
    let coverage = aggregate::state_coverage(&doses, &populations)?;

    let mut by_dose1 = coverage.clone();
    by_dose1.sort_by(|a, b| a.dose1_pct.total_cmp(&b.dose1_pct));
    let rows1: Vec<(String, f64, f64)> = by_dose1
        .iter()
        .map(|c| (c.state.clone(), c.dose1_pct, c.unvax1_pct))
        .collect();
    let pct1_svg = chart::stacked_barh_chart(
        "Percentage vaccinated by state (at least 1 dose)",
        "Percentage",
        &rows1,
        ("Vaccinated", "Unvaccinated"),
        (chart::BRIGHT_GREEN, chart::INDIGO),
    )?;

    let mut by_dose2 = coverage;
    by_dose2.sort_by(|a, b| a.dose2_pct.total_cmp(&b.dose2_pct));
    let rows2: Vec<(String, f64, f64)> = by_dose2
        .iter()
        .map(|c| (c.state.clone(), c.dose2_pct, c.unvax2_pct))
        .collect();
    let pct2_svg = chart::stacked_barh_chart(
        "Percentage vaccinated by state (2 doses)",
        "Percentage",
        &rows2,
        ("Vaccinated", "Unvaccinated"),
        (chart::BRIGHT_GREEN, chart::INDIGO),
    )?;

    // Panels 7 and 8: national progress pies against the configured
    // population figure.
    let pie1_svg = chart::pie_chart(
        "Vaccination Progress (at least 1 dose)",
        &[
            chart::PieSlice {
                name: "Vaccinated".to_string(),
                value: latest.dose1_cumul as f64,
                color: chart::BRIGHT_GREEN,
            },
            chart::PieSlice {
                name: "Unvaccinated".to_string(),
                value: aggregate::unvaccinated(config.population_total, latest.dose1_cumul) as f64,
                color: chart::INDIGO,
            },
        ],
    )?;
    let pie2_svg = chart::pie_chart(
        "Vaccination Progress (2 doses)",
        &[
            chart::PieSlice {
                name: "Vaccinated".to_string(),
                value: latest.dose2_cumul as f64,
                color: chart::BRIGHT_GREEN,
            },
            chart::PieSlice {
                name: "Unvaccinated".to_string(),
                value: aggregate::unvaccinated(config.population_total, latest.dose2_cumul) as f64,
                color: chart::INDIGO,
            },
        ],
    )?;

    let generated_at = OffsetDateTime::now_utc()
        .to_offset(config.timezone_offset)
        .format(&TIMESTAMP_FORMAT)?;
    let meta = ReportMeta {
        generated_at,
        timezone_label: config.timezone_label.clone(),
        latest_date: latest.date,
    };

    let panels = vec![
        Panel {
            headlines: rate_headlines,
            svg: rate_svg,
        },
        Panel {
            headlines: cumul_headlines,
            svg: cumul_svg,
        },
        Panel {
            headlines: vec![],
            svg: weekday_svg,
        },
        Panel {
            headlines: vec![],
            svg: state_svg,
        },
        Panel {
            headlines: vec![],
            svg: pct1_svg,
        },
        Panel {
            headlines: vec![],
            svg: pct2_svg,
        },
        Panel {
            headlines: vec![],
            svg: pie1_svg,
        },
        Panel {
            headlines: vec![],
            svg: pie2_svg,
        },
    ];

    let footnotes = vec![
        format!(
            "*{} in this calculation consists of {}",
            config.synthetic_region.name,
            config.synthetic_region.members.join(", ")
        ),
        format!(
            "National population figure used for the progress charts: {}",
            report::format_count(config.population_total as f64)
        ),
    ];

    Ok(report::render_document(&meta, &panels, &footnotes))
}
