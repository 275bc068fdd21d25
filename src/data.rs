use serde::Deserialize;
use thiserror::Error;
use time::{format_description::FormatItem, macros::format_description, Date};

pub const DATE_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

pub fn format_date(date: Date) -> String {
    date.format(&DATE_FORMAT)
        .unwrap_or_else(|_| date.to_string())
}

/// Which of the three upstream CSV resources a row came from, for error
/// messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dataset {
    National,
    StateDoses,
    Population,
}

impl std::fmt::Display for Dataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Dataset::National => "national daily series",
            Dataset::StateDoses => "per-state series",
            Dataset::Population => "state population table",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("{dataset}: {source}")]
    Csv {
        dataset: Dataset,
        #[source]
        source: csv::Error,
    },
    #[error("{dataset}: bad date `{value}`")]
    Date {
        dataset: Dataset,
        value: String,
        #[source]
        source: time::error::Parse,
    },
    #[error("{dataset} contains no rows")]
    Empty { dataset: Dataset },
}

fn parse_date(dataset: Dataset, value: &str) -> Result<Date, ParseError> {
    Date::parse(value, &DATE_FORMAT).map_err(|source| ParseError::Date {
        dataset,
        value: value.to_string(),
        source,
    })
}

#[derive(Debug, Deserialize)]
struct NationalRow {
    date: String,
    dose1_daily: u64,
    dose2_daily: u64,
    total_daily: u64,
    dose1_cumul: u64,
    dose2_cumul: u64,
    total_cumul: u64,
}

/// One day of the national series, in file order (oldest first).
#[derive(Debug, Clone)]
pub struct DailyRecord {
    pub date: Date,
    pub dose1_daily: u64,
    pub dose2_daily: u64,
    pub total_daily: u64,
    pub dose1_cumul: u64,
    pub dose2_cumul: u64,
    pub total_cumul: u64,
}

pub fn parse_national(text: &str) -> Result<Vec<DailyRecord>, ParseError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(text.as_bytes());

    let mut days: Vec<DailyRecord> = Vec::new();
    for row in reader.deserialize::<NationalRow>() {
        let row = row.map_err(|source| ParseError::Csv {
            dataset: Dataset::National,
            source,
        })?;
        let date = parse_date(Dataset::National, &row.date)?;

        if let Some(previous) = days.last() {
            if previous.date >= date {
                eprintln!("days are not ordered");
            }
        }

        days.push(DailyRecord {
            date,
            dose1_daily: row.dose1_daily,
            dose2_daily: row.dose2_daily,
            total_daily: row.total_daily,
            dose1_cumul: row.dose1_cumul,
            dose2_cumul: row.dose2_cumul,
            total_cumul: row.total_cumul,
        });
    }

    if days.is_empty() {
        return Err(ParseError::Empty {
            dataset: Dataset::National,
        });
    }
    Ok(days)
}

#[derive(Debug, Deserialize)]
struct StateRow {
    date: String,
    state: String,
    dose1_cumul: u64,
    dose2_cumul: u64,
    total_cumul: u64,
}

/// Cumulative doses for one state as of the latest date in the per-state
/// series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateDoses {
    pub state: String,
    pub dose1_cumul: u64,
    pub dose2_cumul: u64,
    pub total_cumul: u64,
}

/// The per-state CSV carries one row per (date, state). Only rows belonging
/// to the latest date present are returned, in file order.
pub fn parse_state_doses(text: &str) -> Result<Vec<StateDoses>, ParseError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(text.as_bytes());

    let mut rows: Vec<(Date, StateDoses)> = Vec::new();
    for row in reader.deserialize::<StateRow>() {
        let row = row.map_err(|source| ParseError::Csv {
            dataset: Dataset::StateDoses,
            source,
        })?;
        let date = parse_date(Dataset::StateDoses, &row.date)?;
        rows.push((
            date,
            StateDoses {
                state: row.state,
                dose1_cumul: row.dose1_cumul,
                dose2_cumul: row.dose2_cumul,
                total_cumul: row.total_cumul,
            },
        ));
    }

    let latest = rows
        .iter()
        .map(|(date, _)| *date)
        .max()
        .ok_or(ParseError::Empty {
            dataset: Dataset::StateDoses,
        })?;

    Ok(rows
        .into_iter()
        .filter(|(date, _)| *date == latest)
        .map(|(_, doses)| doses)
        .collect())
}

#[derive(Debug, Deserialize)]
struct PopulationRow {
    state: String,
    pop: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatePopulation {
    pub state: String,
    pub population: u64,
}

/// Static reference data. The file opens with a national aggregate row
/// (`Malaysia`) which is skipped; per-state rows follow.
pub fn parse_population(text: &str) -> Result<Vec<StatePopulation>, ParseError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(text.as_bytes());

    let mut states: Vec<StatePopulation> = Vec::new();
    for row in reader.deserialize::<PopulationRow>() {
        let row = row.map_err(|source| ParseError::Csv {
            dataset: Dataset::Population,
            source,
        })?;
        if row.state == "Malaysia" {
            continue;
        }
        states.push(StatePopulation {
            state: row.state,
            population: row.pop,
        });
    }

    if states.is_empty() {
        return Err(ParseError::Empty {
            dataset: Dataset::Population,
        });
    }
    Ok(states)
}
