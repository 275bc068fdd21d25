use std::path::PathBuf;

use time::{macros::offset, UtcOffset};

/// National population estimate used for the progress pie charts.
/// The upstream datasets carry no population for the country as a whole,
/// so this is pinned here and updated alongside the data source.
pub const DEFAULT_POPULATION: u64 = 32_764_602;

/// A derived geographic aggregate built by summing a fixed list of states.
#[derive(Debug, Clone)]
pub struct SyntheticRegion {
    pub name: String,
    pub members: Vec<String>,
}

/// Everything one run of the report generator needs. Built once in `main`
/// and threaded through the pipeline; nothing here is reassigned mid-run.
#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub national_url: String,
    pub state_url: String,
    pub population_url: String,
    pub output_path: PathBuf,
    pub population_total: u64,
    pub synthetic_region: SyntheticRegion,
    pub timezone_offset: UtcOffset,
    pub timezone_label: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        let base = "https://raw.githubusercontent.com/CITF-Malaysia/citf-public/main";
        Self {
            national_url: format!("{base}/vaccination/vax_malaysia.csv"),
            state_url: format!("{base}/vaccination/vax_state.csv"),
            population_url: format!("{base}/static/population.csv"),
            output_path: PathBuf::from("index.html"),
            population_total: DEFAULT_POPULATION,
            synthetic_region: SyntheticRegion {
                name: String::from("Klang Valley"),
                members: vec![
                    String::from("Selangor"),
                    String::from("W.P. Kuala Lumpur"),
                    String::from("W.P. Putrajaya"),
                ],
            },
            timezone_offset: offset!(+8),
            timezone_label: String::from("MYT"),
        }
    }
}
