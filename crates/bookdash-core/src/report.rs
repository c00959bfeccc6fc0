//! Filtering and aggregation over the clean dataset
//!
//! A [`FilteredView`] is a non-owning subset of a [`CleanDataset`] matching
//! a [`FilterSpec`]. All derived statistics return defined zero-equivalents
//! on an empty view rather than erroring, and grouped rollups keep
//! first-seen key order so equal inputs produce byte-identical output.

use serde::Serialize;

use crate::models::{CleanDataset, FilterSpec, KpiSummary, SalesRecord, UNKNOWN_PERIOD};

/// Number of publishers reported in the revenue ranking
pub const TOP_PUBLISHERS: usize = 5;

/// A derived, non-owning view of the clean dataset
#[derive(Debug, Clone)]
pub struct FilteredView<'a> {
    records: Vec<&'a SalesRecord>,
}

/// Apply filter predicates to a dataset
pub fn apply<'a>(dataset: &'a CleanDataset, spec: &FilterSpec) -> FilteredView<'a> {
    FilteredView {
        records: dataset
            .records()
            .iter()
            .filter(|r| matches(r, spec))
            .collect(),
    }
}

/// Predicate for one record; a `None` dimension short-circuits, the rating
/// floor is inclusive.
fn matches(record: &SalesRecord, spec: &FilterSpec) -> bool {
    if let Some(ref genre) = spec.genre {
        if record.genre != *genre {
            return false;
        }
    }
    if let Some(ref period) = spec.period {
        if record.period() != *period {
            return false;
        }
    }
    record.average_rating >= spec.min_rating
}

impl<'a> FilteredView<'a> {
    pub fn records(&self) -> &[&'a SalesRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Re-apply a filter to this view. Filtering is idempotent: applying
    /// the same spec twice yields the same view.
    pub fn refilter(&self, spec: &FilterSpec) -> FilteredView<'a> {
        FilteredView {
            records: self
                .records
                .iter()
                .copied()
                .filter(|r| matches(r, spec))
                .collect(),
        }
    }

    /// Summary statistics; zero-safe on an empty view
    pub fn kpis(&self) -> KpiSummary {
        let total_revenue: f64 = self.records.iter().map(|r| r.gross_revenue).sum();
        let total_units: u64 = self.records.iter().map(|r| r.units_sold).sum();
        let mean_rating = if self.records.is_empty() {
            0.0
        } else {
            self.records.iter().map(|r| r.average_rating).sum::<f64>() / self.records.len() as f64
        };

        KpiSummary {
            total_revenue,
            total_units,
            mean_rating,
            record_count: self.records.len(),
        }
    }

    /// Units sold per genre, keys in first-seen order
    pub fn units_by_genre(&self) -> Vec<(String, u64)> {
        let mut groups: Vec<(String, u64)> = Vec::new();
        for record in &self.records {
            match groups.iter_mut().find(|(g, _)| *g == record.genre) {
                Some((_, units)) => *units += record.units_sold,
                None => groups.push((record.genre.clone(), record.units_sold)),
            }
        }
        groups
    }

    /// Top publishers by gross revenue, ties broken by first-seen order.
    /// Records without a publisher are excluded from the rollup.
    pub fn top_publishers(&self) -> Vec<(String, f64)> {
        let mut groups: Vec<(String, f64)> = Vec::new();
        for record in &self.records {
            let Some(ref publisher) = record.publisher else {
                continue;
            };
            match groups.iter_mut().find(|(p, _)| p == publisher) {
                Some((_, revenue)) => *revenue += record.gross_revenue,
                None => groups.push((publisher.clone(), record.gross_revenue)),
            }
        }
        // Stable sort keeps first-seen order for revenue ties
        groups.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        groups.truncate(TOP_PUBLISHERS);
        groups
    }

    /// Gross revenue per monthly period, ascending, with the "unknown"
    /// bucket last
    pub fn revenue_by_period(&self) -> Vec<(String, f64)> {
        let mut groups: Vec<(String, f64)> = Vec::new();
        for record in &self.records {
            let period = record.period();
            match groups.iter_mut().find(|(p, _)| *p == period) {
                Some((_, revenue)) => *revenue += record.gross_revenue,
                None => groups.push((period, record.gross_revenue)),
            }
        }
        groups.sort_by(|a, b| match (a.0 == UNKNOWN_PERIOD, b.0 == UNKNOWN_PERIOD) {
            (true, true) => std::cmp::Ordering::Equal,
            (true, false) => std::cmp::Ordering::Greater,
            (false, true) => std::cmp::Ordering::Less,
            (false, false) => a.0.cmp(&b.0),
        });
        groups
    }
}

/// Everything the dashboard surface renders for one filter
#[derive(Debug, Clone, Serialize)]
pub struct DashboardData {
    pub kpis: KpiSummary,
    pub units_by_genre: Vec<(String, u64)>,
    pub top_publishers: Vec<(String, f64)>,
    pub revenue_by_period: Vec<(String, f64)>,
}

impl DashboardData {
    pub fn from_view(view: &FilteredView<'_>) -> Self {
        Self {
            kpis: view.kpis(),
            units_by_genre: view.units_by_genre(),
            top_publishers: view.top_publishers(),
            revenue_by_period: view.revenue_by_period(),
        }
    }
}
