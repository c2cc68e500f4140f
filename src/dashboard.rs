// 📊 Dashboard view model
// Every chart's data computed up front; renderers only read from here

use crate::aggregate::{dense_reindex, distinct_values, sum_by, AggregatedSeries, Dimension};
use crate::collapse::{DisclosureNote, MinorSliceCollapser};
use crate::config::DashboardConfig;
use crate::error::AggregateError;
use crate::format::{format_rand, format_share_precise};
use crate::records::{Dataset, QualificationKeyTable};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cmp::Ordering;
use tracing::{debug, warn};

/// Donuts with more slices than this get a legend instead of inline labels
pub const MAX_INLINE_LABELS: usize = 4;

// ============================================================================
// CHART DATA
// ============================================================================

/// One wedge of a proportion (pie) chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProportionSlice {
    pub label: String,
    pub value: f64,
    pub share: f64,

    /// Two-decimal percentage, e.g. "42.17%"
    pub percent_label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarDatum {
    pub label: String,
    pub value: f64,
}

/// Categories × series totals, dense
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupedBars {
    pub categories: Vec<String>,
    pub series: Vec<String>,

    /// `values[category][series]`
    pub values: Vec<Vec<f64>>,

    /// Fixed value-axis ceiling
    pub axis_max: f64,
}

impl GroupedBars {
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty() || self.series.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DonutSlice {
    pub label: String,

    /// "Black (72.4%)"
    pub display_label: String,
    pub value: f64,
    pub color: String,
}

/// Ethnic-group breakdown for one gender
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DonutChart {
    pub group: String,
    pub slices: Vec<DonutSlice>,
    pub total: f64,

    /// Center annotation, e.g. "R1,234,567"
    pub total_label: String,

    /// Legend instead of inline labels when there are many slices
    pub show_legend: bool,
}

impl DonutChart {
    /// "Black (72.4%)\nR894,000" style lines for the legend
    pub fn legend_lines(&self) -> Vec<String> {
        self.slices
            .iter()
            .map(|s| format!("{}\n{}", s.display_label, format_rand(s.value.trunc())))
            .collect()
    }

    /// True when nothing was funded for this group
    pub fn is_empty(&self) -> bool {
        !(self.total > 0.0)
    }
}

// ============================================================================
// DASHBOARD
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub title: String,
    pub generated_at: DateTime<Utc>,
    pub institution_shares: Vec<ProportionSlice>,
    pub ethnic_shares: Vec<ProportionSlice>,

    /// Descending by total
    pub qualification_totals: Vec<BarDatum>,
    pub qualification_by_gender: GroupedBars,
    pub donuts: Vec<DonutChart>,
    pub notes: Vec<DisclosureNote>,
    pub qualification_key: QualificationKeyTable,
}

impl Dashboard {
    pub fn build(dataset: &Dataset, config: &DashboardConfig) -> Result<Self, AggregateError> {
        Self::build_at(dataset, config, Utc::now())
    }

    pub fn build_at(
        dataset: &Dataset,
        config: &DashboardConfig,
        generated_at: DateTime<Utc>,
    ) -> Result<Self, AggregateError> {
        let records = &dataset.records;

        let institution_shares = proportions(&sum_by(records, &[Dimension::Institution])?);
        let ethnic_shares = proportions(&sum_by(records, &[Dimension::EthnicGroup])?);

        let qualification_totals = AggregatedSeries::labeled(
            sum_by(records, &[Dimension::Qualification])?.sorted_descending(),
        )
        .into_iter()
        .map(|(label, value)| BarDatum { label, value })
        .collect();

        let qualification_by_gender = grouped_by_gender(dataset, config)?;
        let (donuts, notes) = donuts_by_gender(dataset, config)?;

        debug!(
            institutions = institution_shares.len(),
            ethnic_groups = ethnic_shares.len(),
            donuts = donuts.len(),
            notes = notes.len(),
            "dashboard built"
        );

        Ok(Dashboard {
            title: config.title.clone(),
            generated_at,
            institution_shares,
            ethnic_shares,
            qualification_totals,
            qualification_by_gender,
            donuts,
            notes,
            qualification_key: dataset.qualification_key.clone(),
        })
    }

    /// Sum of every record's Total Funds
    pub fn grand_total(&self) -> f64 {
        self.institution_shares.iter().map(|s| s.value).sum()
    }
}

/// Pie slices in ascending label order
fn proportions(series: &AggregatedSeries) -> Vec<ProportionSlice> {
    let total = series.total();

    AggregatedSeries::labeled(series.sorted_by_key())
        .into_iter()
        .map(|(label, value)| {
            let share = if total > 0.0 { value / total } else { 0.0 };
            ProportionSlice {
                label,
                value,
                share,
                percent_label: format_share_precise(share),
            }
        })
        .collect()
}

fn grouped_by_gender(
    dataset: &Dataset,
    config: &DashboardConfig,
) -> Result<GroupedBars, AggregateError> {
    let records = &dataset.records;
    let series = sum_by(records, &[Dimension::Qualification, Dimension::Gender])?;
    let dense = dense_reindex(
        &series,
        &distinct_values(records, Dimension::Qualification),
        &distinct_values(records, Dimension::Gender),
    )?;

    Ok(GroupedBars {
        categories: dense.rows,
        series: dense.columns,
        values: dense.values,
        axis_max: config.qualification_gender_axis_max,
    })
}

fn donuts_by_gender(
    dataset: &Dataset,
    config: &DashboardConfig,
) -> Result<(Vec<DonutChart>, Vec<DisclosureNote>), AggregateError> {
    let records = &dataset.records;

    let outside: Vec<_> = records
        .iter()
        .filter(|r| !config.genders.contains(&r.gender) || !config.ethnic_groups.contains(&r.ethnic_group))
        .collect();
    if !outside.is_empty() {
        warn!(
            records = outside.len(),
            funds = outside.iter().map(|r| r.total_funds).sum::<f64>(),
            "records outside the configured gender/ethnic group domain are left out of the donut charts"
        );
    }

    let series = sum_by(records, &[Dimension::Gender, Dimension::EthnicGroup])?;
    let dense = dense_reindex(&series, &config.genders, &config.ethnic_groups)?;
    let collapser = MinorSliceCollapser::new(config.minor_share_threshold);

    let mut donuts = Vec::new();
    let mut notes = Vec::new();

    for gender in &config.genders {
        let mut distribution = dense.row(gender).unwrap_or_default();
        distribution.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

        let mut collapsed = collapser.collapse(&distribution);
        // Notes list merged groups in configured order, not by size
        collapsed
            .minor
            .sort_by_key(|(label, _)| config.ethnic_groups.iter().position(|g| g == label));

        let slices = collapsed
            .slices
            .iter()
            .zip(collapsed.display_labels())
            .map(|((label, value), display_label)| DonutSlice {
                label: label.clone(),
                display_label,
                value: *value,
                color: config.color_for(label).to_string(),
            })
            .collect::<Vec<_>>();

        if let Some(note) = collapsed.disclosure_note(gender) {
            notes.push(note);
        }

        donuts.push(DonutChart {
            group: gender.clone(),
            show_legend: slices.len() > MAX_INLINE_LABELS,
            slices,
            total: collapsed.total,
            total_label: format_rand(collapsed.total),
        });
    }

    Ok((donuts, notes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{BursaryRecord, QualificationKeyEntry};
    use chrono::TimeZone;

    fn sample_dataset() -> Dataset {
        let records = vec![
            BursaryRecord::new("UCT", "Diploma", "Female", "Black", 1000.0),
            BursaryRecord::new("UCT", "Diploma", "Female", "Indian", 10.0),
            BursaryRecord::new("Wits", "BSc", "Female", "White", 5.0),
            BursaryRecord::new("Wits", "BSc", "Male", "Black", 600.0),
            BursaryRecord::new("UJ", "BCom", "Male", "Coloured", 400.0),
        ];
        let key = QualificationKeyTable {
            detail_columns: vec!["Description".to_string()],
            entries: vec![
                QualificationKeyEntry {
                    institution: "UCT".to_string(),
                    qualification: "Diploma".to_string(),
                    details: vec!["Diploma in Nursing".to_string()],
                },
                QualificationKeyEntry {
                    institution: "UCT".to_string(),
                    qualification: "Diploma".to_string(),
                    details: vec!["duplicate".to_string()],
                },
            ],
        };
        Dataset::new(records, key)
    }

    fn build(dataset: &Dataset) -> Dashboard {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap();
        Dashboard::build_at(dataset, &DashboardConfig::default(), at).unwrap()
    }

    #[test]
    fn test_proportion_charts() {
        let dashboard = build(&sample_dataset());

        let labels: Vec<&str> = dashboard.institution_shares.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["UCT", "UJ", "Wits"]);
        assert_eq!(dashboard.institution_shares[0].value, 1010.0);
        assert_eq!(dashboard.grand_total(), 2015.0);

        let share_sum: f64 = dashboard.ethnic_shares.iter().map(|s| s.share).sum();
        assert!((share_sum - 1.0).abs() < 1e-9);
        assert_eq!(dashboard.ethnic_shares[0].label, "Black");
        assert_eq!(dashboard.ethnic_shares[0].percent_label, "79.40%");
    }

    #[test]
    fn test_qualification_totals_descending() {
        let dashboard = build(&sample_dataset());
        let totals: Vec<(&str, f64)> = dashboard
            .qualification_totals
            .iter()
            .map(|b| (b.label.as_str(), b.value))
            .collect();

        assert_eq!(totals, vec![("Diploma", 1010.0), ("BSc", 605.0), ("BCom", 400.0)]);
    }

    #[test]
    fn test_grouped_bars_dense() {
        let dashboard = build(&sample_dataset());
        let grouped = &dashboard.qualification_by_gender;

        assert_eq!(grouped.categories, vec!["BCom", "BSc", "Diploma"]);
        assert_eq!(grouped.series, vec!["Female", "Male"]);
        assert_eq!(grouped.values[0], vec![0.0, 400.0]);
        assert_eq!(grouped.values[2], vec![1010.0, 0.0]);
        assert_eq!(grouped.axis_max, 5_000_000.0);
    }

    #[test]
    fn test_donuts_collapse_minor_groups() {
        let dashboard = build(&sample_dataset());
        assert_eq!(dashboard.donuts.len(), 2);

        let female = &dashboard.donuts[0];
        assert_eq!(female.group, "Female");
        assert_eq!(female.total, 1015.0);
        assert_eq!(female.total_label, "R1,015");
        let labels: Vec<&str> = female.slices.iter().map(|s| s.display_label.as_str()).collect();
        assert_eq!(labels, vec!["Black (98.5%)", "Other (1.5%)"]);
        assert_eq!(female.slices[0].color, "#1f77b4");
        assert_eq!(female.slices[1].color, "#9467bd");
        assert!(!female.show_legend);

        let male = &dashboard.donuts[1];
        let labels: Vec<&str> = male.slices.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["Black", "Coloured"]);

        assert_eq!(dashboard.notes.len(), 1);
        assert_eq!(
            dashboard.notes[0].to_string(),
            "Female – 'Other' includes: Indian (R10), White (R5)"
        );
    }

    #[test]
    fn test_note_lists_groups_in_configured_order() {
        let records = vec![
            BursaryRecord::new("UCT", "Diploma", "Female", "Black", 1000.0),
            BursaryRecord::new("UCT", "Diploma", "Female", "Coloured", 5.0),
            BursaryRecord::new("UCT", "Diploma", "Female", "Indian", 10.0),
        ];
        let dashboard = build(&Dataset::new(records, QualificationKeyTable::default()));

        assert_eq!(dashboard.notes.len(), 1);
        assert_eq!(
            dashboard.notes[0].to_string(),
            "Female – 'Other' includes: Coloured (R5), Indian (R10)"
        );
        let labels: Vec<&str> = dashboard.donuts[0].slices.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["Black", "Other"]);
    }

    #[test]
    fn test_key_table_is_deduplicated() {
        let dashboard = build(&sample_dataset());
        assert_eq!(dashboard.qualification_key.len(), 1);
        assert_eq!(dashboard.qualification_key.entries[0].details, vec!["Diploma in Nursing"]);
    }

    #[test]
    fn test_empty_dataset_builds() {
        let dashboard = build(&Dataset::default());

        assert!(dashboard.institution_shares.is_empty());
        assert!(dashboard.qualification_totals.is_empty());
        assert!(dashboard.qualification_by_gender.is_empty());
        assert_eq!(dashboard.donuts.len(), 2);
        assert!(dashboard.donuts.iter().all(|d| d.is_empty()));
        assert!(dashboard.notes.is_empty());
    }

    #[test]
    fn test_legend_for_many_slices() {
        let mut config = DashboardConfig::default();
        config.ethnic_groups.push("Asian".to_string());
        let records = vec![
            BursaryRecord::new("UCT", "BSc", "Female", "Black", 100.0),
            BursaryRecord::new("UCT", "BSc", "Female", "Coloured", 100.0),
            BursaryRecord::new("UCT", "BSc", "Female", "Indian", 100.0),
            BursaryRecord::new("UCT", "BSc", "Female", "White", 100.0),
            BursaryRecord::new("UCT", "BSc", "Female", "Asian", 100.0),
        ];
        let dataset = Dataset::new(records, QualificationKeyTable::default());
        let dashboard = Dashboard::build(&dataset, &config).unwrap();

        let female = &dashboard.donuts[0];
        assert_eq!(female.slices.len(), 5);
        assert!(female.show_legend);
        assert_eq!(female.legend_lines()[0], "Black (20.0%)\nR100");
        assert_eq!(female.slices[4].label, "Asian");
        assert_eq!(female.slices[4].color, "#cccccc");
    }
}
