//! Geospatial duplicate detection.
//!
//! A new submission is matched against existing reports of the same
//! category within a category-specific radius. Waste and electricity
//! reports cluster loosely, so their search fans out to the 8 neighboring
//! geohash cells; the other categories search the candidate's own cell
//! only.

use std::sync::Arc;

use civicpulse_common::{
    distance_meters, neighbor_cells, validate_coordinate, Category, CivicPulseError, GeoPoint,
    Report, ReportKey, ReportStatus,
};
use civicpulse_store::DocumentStore;

#[derive(Debug, Clone)]
pub struct DuplicateMatch {
    pub key: ReportKey,
    pub report: Report,
    pub distance_meters: f64,
}

pub struct DuplicateDetector {
    store: Arc<dyn DocumentStore>,
}

impl DuplicateDetector {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Find the nearest same-category report within the category threshold,
    /// or None. Ties at equal distance go to the first report encountered
    /// in store enumeration order.
    pub async fn find_duplicate(
        &self,
        category: Category,
        location: GeoPoint,
        geohash: &str,
    ) -> Result<Option<DuplicateMatch>, CivicPulseError> {
        validate_coordinate(location.lat, location.lng)?;

        let mut cells = vec![geohash.to_string()];
        if category.searches_neighbor_cells() {
            cells.extend(neighbor_cells(geohash)?);
        }

        let threshold = category.dedup_threshold_meters();
        let mut best: Option<DuplicateMatch> = None;

        for cell in &cells {
            let reports = self
                .store
                .list_reports_in_cell(category, cell)
                .await
                .map_err(|e| CivicPulseError::DuplicateCheckFailed(e.to_string()))?;

            for (key, report) in reports {
                if category.excludes_resolved() && report.status == ReportStatus::Resolved {
                    continue;
                }
                let d = distance_meters(
                    location.lat,
                    location.lng,
                    report.location.lat,
                    report.location.lng,
                );
                if d <= threshold && best.as_ref().is_none_or(|b| d < b.distance_meters) {
                    best = Some(DuplicateMatch {
                        key,
                        report,
                        distance_meters: d,
                    });
                }
            }
        }

        Ok(best)
    }
}
