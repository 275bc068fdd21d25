use thiserror::Error;
use time::{Date, Weekday};

use crate::data::{DailyRecord, StateDoses, StatePopulation};

pub const ROLLING_WINDOW: usize = 7;

/// Output ordering for the weekday distribution chart.
pub const WEEKDAYS: [Weekday; 7] = [
    Weekday::Monday,
    Weekday::Tuesday,
    Weekday::Wednesday,
    Weekday::Thursday,
    Weekday::Friday,
    Weekday::Saturday,
    Weekday::Sunday,
];

#[derive(Debug, Error)]
pub enum AggregateError {
    #[error("not enough rows for {what}: need at least {required}")]
    TooShort {
        what: &'static str,
        required: usize,
    },
    #[error("region `{region}`: member `{member}` not found in the {table} table")]
    MissingMember {
        region: String,
        member: String,
        table: &'static str,
    },
    #[error("no population entry for state `{state}`")]
    MissingPopulation { state: String },
    #[error("state `{state}` has zero population")]
    ZeroPopulation { state: String },
}

/// Unweighted trailing mean. The first `window - 1` positions have no full
/// window and stay `None`.
pub fn rolling_mean(values: &[u64], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }

    let mut out = Vec::with_capacity(values.len());
    let mut sum: u64 = 0;
    for (i, &value) in values.iter().enumerate() {
        sum += value;
        if i >= window {
            sum -= values[i - window];
        }
        if i + 1 >= window {
            out.push(Some(sum as f64 / window as f64));
        } else {
            out.push(None);
        }
    }
    out
}

/// A headline number shown next to a chart: the latest value and its change
/// against the immediately preceding value.
#[derive(Debug, Clone, PartialEq)]
pub struct Headline {
    pub label: String,
    pub latest: f64,
    pub delta: f64,
}

pub fn headline(label: &str, values: &[f64]) -> Result<Headline, AggregateError> {
    match values {
        [.., previous, latest] => Ok(Headline {
            label: label.to_string(),
            latest: *latest,
            delta: latest - previous,
        }),
        _ => Err(AggregateError::TooShort {
            what: "a headline delta",
            required: 2,
        }),
    }
}

/// Cumulative dose counts can overtake a stale population figure; the
/// remaining unvaccinated count never goes below zero.
pub fn unvaccinated(population: u64, dose_cumul: u64) -> u64 {
    population.saturating_sub(dose_cumul)
}

#[derive(Debug, Clone)]
pub struct WeekdayDistribution {
    pub first: Date,
    pub last: Date,
    /// Dose totals in `WEEKDAYS` order.
    pub totals: [u64; 7],
}

/// Sums `total_daily` per weekday over the trailing `7 * floor(len / 7)`
/// rows. The oldest remainder rows are discarded so every weekday is
/// represented the same number of times.
pub fn weekday_distribution(days: &[DailyRecord]) -> Result<WeekdayDistribution, AggregateError> {
    let keep = days.len() / 7 * 7;
    if keep == 0 {
        return Err(AggregateError::TooShort {
            what: "the weekday distribution",
            required: 7,
        });
    }

    let window = &days[days.len() - keep..];
    let mut totals = [0u64; 7];
    for day in window {
        totals[day.date.weekday().number_days_from_monday() as usize] += day.total_daily;
    }

    Ok(WeekdayDistribution {
        first: window[0].date,
        last: window[keep - 1].date,
        totals,
    })
}

/// Appends one synthetic row to both per-state tables, summing population
/// and dose counts over `members`. Must run before percentage computation so
/// the region's percentage is derived like every other row.
pub fn append_region(
    name: &str,
    members: &[String],
    doses: &mut Vec<StateDoses>,
    populations: &mut Vec<StatePopulation>,
) -> Result<(), AggregateError> {
    let mut dose1_cumul: u64 = 0;
    let mut dose2_cumul: u64 = 0;
    let mut total_cumul: u64 = 0;
    let mut population: u64 = 0;

    for member in members {
        let dose = doses
            .iter()
            .find(|d| &d.state == member)
            .ok_or_else(|| AggregateError::MissingMember {
                region: name.to_string(),
                member: member.clone(),
                table: "dose",
            })?;
        dose1_cumul += dose.dose1_cumul;
        dose2_cumul += dose.dose2_cumul;
        total_cumul += dose.total_cumul;

        let pop = populations
            .iter()
            .find(|p| &p.state == member)
            .ok_or_else(|| AggregateError::MissingMember {
                region: name.to_string(),
                member: member.clone(),
                table: "population",
            })?;
        population += pop.population;
    }

    doses.push(StateDoses {
        state: name.to_string(),
        dose1_cumul,
        dose2_cumul,
        total_cumul,
    });
    populations.push(StatePopulation {
        state: name.to_string(),
        population,
    });
    Ok(())
}

/// A per-state dose row joined with its population, plus the derived
/// percentages used by the stacked bar charts.
#[derive(Debug, Clone)]
pub struct StateCoverage {
    pub state: String,
    pub population: u64,
    pub dose1_cumul: u64,
    pub dose2_cumul: u64,
    pub total_cumul: u64,
    pub dose1_pct: f64,
    pub dose2_pct: f64,
    pub unvax1_pct: f64,
    pub unvax2_pct: f64,
}

pub fn state_coverage(
    doses: &[StateDoses],
    populations: &[StatePopulation],
) -> Result<Vec<StateCoverage>, AggregateError> {
    doses
        .iter()
        .map(|dose| {
            let population = populations
                .iter()
                .find(|p| p.state == dose.state)
                .ok_or_else(|| AggregateError::MissingPopulation {
                    state: dose.state.clone(),
                })?;
            if population.population == 0 {
                return Err(AggregateError::ZeroPopulation {
                    state: dose.state.clone(),
                });
            }

            let pop = population.population as f64;
            let dose1_pct = dose.dose1_cumul as f64 / pop * 100.0;
            let dose2_pct = dose.dose2_cumul as f64 / pop * 100.0;
            // The unvaccinated share clamps at zero when doses exceed the
            // population figure.
            let unvax1_pct = ((pop - dose.dose1_cumul as f64) / pop * 100.0).max(0.0);
            let unvax2_pct = ((pop - dose.dose2_cumul as f64) / pop * 100.0).max(0.0);

            Ok(StateCoverage {
                state: dose.state.clone(),
                population: population.population,
                dose1_cumul: dose.dose1_cumul,
                dose2_cumul: dose.dose2_cumul,
                total_cumul: dose.total_cumul,
                dose1_pct,
                dose2_pct,
                unvax1_pct,
                unvax2_pct,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn day(date: Date, total_daily: u64) -> DailyRecord {
        DailyRecord {
            date,
            dose1_daily: 0,
            dose2_daily: 0,
            total_daily,
            dose1_cumul: 0,
            dose2_cumul: 0,
            total_cumul: 0,
        }
    }

    #[test]
    fn rolling_mean_has_no_leading_partial_window() {
        let values = [10, 10, 10, 10, 10, 10, 10, 20, 20, 20];
        let rolling = rolling_mean(&values, 7);
        assert_eq!(rolling.len(), 10);
        for avg in &rolling[..6] {
            assert!(avg.is_none());
        }
        assert_eq!(rolling[6], Some(10.0));
        let last = rolling[9].unwrap();
        assert!((last - 110.0 / 7.0).abs() < 1e-9);
    }

    #[test]
    fn rolling_mean_short_series_is_all_undefined() {
        let rolling = rolling_mean(&[1, 2, 3], 7);
        assert!(rolling.iter().all(Option::is_none));
    }

    #[test]
    fn headline_delta_is_latest_minus_previous() {
        let h = headline("Total", &[5.0, 7.0, 10.0]).unwrap();
        assert_eq!(h.latest, 10.0);
        assert_eq!(h.delta, 3.0);
    }

    #[test]
    fn headline_needs_two_values() {
        assert!(matches!(
            headline("Total", &[1.0]),
            Err(AggregateError::TooShort { required: 2, .. })
        ));
    }

    #[test]
    fn unvaccinated_clamps_at_zero() {
        assert_eq!(unvaccinated(100, 40), 60);
        assert_eq!(unvaccinated(100, 120), 0);
    }

    #[test]
    fn weekday_distribution_keeps_the_trailing_full_weeks() {
        // 2021-08-01 is a Sunday; ten rows means the oldest three are
        // dropped and the window runs Wed 04 .. Tue 10.
        let days: Vec<DailyRecord> = (1..=10)
            .map(|i| {
                day(
                    date!(2021 - 08 - 01).saturating_add(time::Duration::days(i - 1)),
                    i as u64,
                )
            })
            .collect();

        let dist = weekday_distribution(&days).unwrap();
        assert_eq!(dist.first, date!(2021 - 08 - 04));
        assert_eq!(dist.last, date!(2021 - 08 - 10));
        assert_eq!(dist.totals.iter().sum::<u64>(), 4 + 5 + 6 + 7 + 8 + 9 + 10);
        // Monday 09, Tuesday 10, Wednesday 04, Sunday 08.
        assert_eq!(dist.totals[0], 9);
        assert_eq!(dist.totals[1], 10);
        assert_eq!(dist.totals[2], 4);
        assert_eq!(dist.totals[6], 8);
    }

    #[test]
    fn weekday_distribution_needs_a_full_week() {
        let days: Vec<DailyRecord> = (0..6)
            .map(|i| {
                day(
                    date!(2021 - 08 - 01).saturating_add(time::Duration::days(i)),
                    1,
                )
            })
            .collect();
        assert!(matches!(
            weekday_distribution(&days),
            Err(AggregateError::TooShort { required: 7, .. })
        ));
    }

    fn doses(state: &str, dose1: u64, dose2: u64, total: u64) -> StateDoses {
        StateDoses {
            state: state.to_string(),
            dose1_cumul: dose1,
            dose2_cumul: dose2,
            total_cumul: total,
        }
    }

    fn pop(state: &str, population: u64) -> StatePopulation {
        StatePopulation {
            state: state.to_string(),
            population,
        }
    }

    #[test]
    fn synthetic_region_sums_its_members() {
        let mut dose_table = vec![
            doses("A", 40, 0, 40),
            doses("B", 10, 0, 10),
            doses("C", 5, 0, 5),
            doses("D", 99, 0, 99),
        ];
        let mut pop_table = vec![pop("A", 100), pop("B", 50), pop("C", 20), pop("D", 999)];

        let members = vec!["A".to_string(), "B".to_string(), "C".to_string()];
        append_region("Region", &members, &mut dose_table, &mut pop_table).unwrap();

        let region_dose = dose_table.last().unwrap();
        assert_eq!(region_dose.state, "Region");
        assert_eq!(region_dose.dose1_cumul, 55);
        assert_eq!(region_dose.total_cumul, 55);
        let region_pop = pop_table.last().unwrap();
        assert_eq!(region_pop.population, 170);
    }

    #[test]
    fn synthetic_region_with_missing_member_is_fatal() {
        let mut dose_table = vec![doses("A", 1, 1, 2)];
        let mut pop_table = vec![pop("A", 10)];
        let members = vec!["A".to_string(), "Nowhere".to_string()];
        let err = append_region("Region", &members, &mut dose_table, &mut pop_table).unwrap_err();
        assert!(matches!(err, AggregateError::MissingMember { .. }));
    }

    #[test]
    fn coverage_percentages_are_exact_and_clamped() {
        let dose_table = vec![doses("A", 50, 25, 75), doses("B", 250, 10, 260)];
        let pop_table = vec![pop("A", 200), pop("B", 200)];

        let coverage = state_coverage(&dose_table, &pop_table).unwrap();
        assert_eq!(coverage[0].dose1_pct, 25.0);
        assert_eq!(coverage[0].dose2_pct, 12.5);
        assert_eq!(coverage[0].unvax1_pct, 75.0);

        // Doses beyond the population figure: percentage passes 100, the
        // unvaccinated share clamps to zero.
        assert_eq!(coverage[1].dose1_pct, 125.0);
        assert_eq!(coverage[1].unvax1_pct, 0.0);
    }

    #[test]
    fn coverage_rejects_zero_population() {
        let dose_table = vec![doses("A", 1, 1, 2)];
        let pop_table = vec![pop("A", 0)];
        assert!(matches!(
            state_coverage(&dose_table, &pop_table),
            Err(AggregateError::ZeroPopulation { .. })
        ));
    }

    #[test]
    fn coverage_rejects_missing_population_row() {
        let dose_table = vec![doses("A", 1, 1, 2)];
        let pop_table = vec![pop("B", 10)];
        assert!(matches!(
            state_coverage(&dose_table, &pop_table),
            Err(AggregateError::MissingPopulation { .. })
        ));
    }
}
