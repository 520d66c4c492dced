//! Report intake: the submission path every new report goes through.
//!
//! A candidate first passes the duplicate detector. A match registers the
//! submitter's interest on the existing report instead of creating a new
//! one; dedup failure degrades to "no duplicate found" so report creation
//! never blocks on it.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use civicpulse_common::{
    encode_geohash, Category, CivicPulseError, GeoPoint, Report, ReportKey, ReportStatus, Severity,
};
use civicpulse_store::DocumentStore;

use crate::dedup::{DuplicateDetector, DuplicateMatch};

#[derive(Debug, Clone)]
pub struct NewReport {
    pub category: Category,
    pub location: GeoPoint,
    pub severity: Severity,
    pub description: String,
    pub image_url: Option<String>,
    pub reporter_id: String,
    pub reporter_email: String,
    /// Set when the upstream content oracle already confirmed the image;
    /// the report then starts at VERIFIED instead of OPEN.
    pub content_verified: bool,
}

#[derive(Debug, Clone)]
pub enum SubmissionOutcome {
    Created {
        key: ReportKey,
        status: ReportStatus,
    },
    Duplicate {
        key: ReportKey,
        distance_meters: f64,
        upvotes: u32,
    },
}

pub struct ReportIntake {
    store: Arc<dyn DocumentStore>,
    detector: DuplicateDetector,
}

impl ReportIntake {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        let detector = DuplicateDetector::new(store.clone());
        Self { store, detector }
    }

    pub async fn submit(&self, new: NewReport) -> Result<SubmissionOutcome, CivicPulseError> {
        if new.reporter_id.is_empty() || new.reporter_email.is_empty() {
            return Err(CivicPulseError::Validation(
                "reporter id and email are required".to_string(),
            ));
        }

        let geohash = encode_geohash(
            new.location.lat,
            new.location.lng,
            new.category.geohash_precision(),
        )?;

        // Dedup failure must not block creation: degrade to "no duplicate".
        let duplicate = match self
            .detector
            .find_duplicate(new.category, new.location, &geohash)
            .await
        {
            Ok(d) => d,
            Err(CivicPulseError::DuplicateCheckFailed(e)) => {
                warn!(error = %e, category = %new.category, "duplicate check failed; proceeding without dedup");
                None
            }
            Err(e) => return Err(e),
        };

        if let Some(m) = duplicate {
            let updated = self.register_interest(&m.key, &new.reporter_email).await?;
            info!(
                category = %new.category,
                report_id = %m.key.report_id,
                distance_m = m.distance_meters,
                "duplicate found; registered interest"
            );
            return Ok(SubmissionOutcome::Duplicate {
                key: m.key,
                distance_meters: m.distance_meters,
                upvotes: updated.upvotes,
            });
        }

        let now = Utc::now();
        let status = if new.content_verified {
            ReportStatus::Verified
        } else {
            ReportStatus::Open
        };
        let report = Report {
            id: Uuid::new_v4().to_string(),
            category: new.category,
            location: new.location,
            geohash,
            status,
            severity: new.severity,
            description: new.description,
            image_url: new.image_url,
            reporter_id: new.reporter_id,
            reporter_email: new.reporter_email.clone(),
            interested_users: [new.reporter_email].into(),
            upvotes: 1,
            assigned_task_id: None,
            proof_image_url: None,
            resolved_by: None,
            ai_verification: None,
            rejection_reason: None,
            created_at: now,
            updated_at: now,
        };
        let key = report.key();
        self.store.put_report(&key, &report).await?;
        info!(category = %report.category, report_id = %report.id, %status, "report created");

        Ok(SubmissionOutcome::Created { key, status })
    }

    /// Add a user to a report's interested set. Idempotent per user: a
    /// repeat registration changes nothing and does not bump upvotes.
    pub async fn register_interest(
        &self,
        key: &ReportKey,
        user_email: &str,
    ) -> Result<Report, CivicPulseError> {
        let mut report = self
            .store
            .get_report(key)
            .await?
            .ok_or_else(|| CivicPulseError::NotFound(format!("report {key}")))?;

        if report.interested_users.insert(user_email.to_string()) {
            report.upvotes += 1;
            report.updated_at = Utc::now();
            self.store.put_report(key, &report).await?;
        }
        Ok(report)
    }

    /// Dedup probe for the locality-check endpoint. Unlike `submit`, store
    /// errors propagate to the caller here.
    pub async fn check_duplicate(
        &self,
        category: Category,
        location: GeoPoint,
    ) -> Result<Option<DuplicateMatch>, CivicPulseError> {
        let geohash = encode_geohash(
            location.lat,
            location.lng,
            category.geohash_precision(),
        )?;
        self.detector
            .find_duplicate(category, location, &geohash)
            .await
    }

    /// Report lookup by id alone (the tracker path).
    pub async fn track(
        &self,
        report_id: &str,
    ) -> Result<(ReportKey, Report), CivicPulseError> {
        self.store
            .find_report_by_id(report_id)
            .await?
            .ok_or_else(|| CivicPulseError::NotFound(format!("report {report_id}")))
    }
}
