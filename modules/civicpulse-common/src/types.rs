use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// --- Geo Types ---

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

// --- Category ---

/// Municipal issue category. Per-category dedup behavior (cell fan-out,
/// distance threshold, resolved-report exclusion) hangs off this enum so
/// there is exactly one code path for all five departments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Category {
    Waste,
    Water,
    Infrastructure,
    Electricity,
    Fire,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Waste => write!(f, "waste"),
            Category::Water => write!(f, "water"),
            Category::Infrastructure => write!(f, "infrastructure"),
            Category::Electricity => write!(f, "electricity"),
            Category::Fire => write!(f, "fire"),
        }
    }
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Waste,
        Category::Water,
        Category::Infrastructure,
        Category::Electricity,
        Category::Fire,
    ];

    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "waste" => Some(Self::Waste),
            "water" => Some(Self::Water),
            "infrastructure" | "infra" => Some(Self::Infrastructure),
            "electricity" | "electric" => Some(Self::Electricity),
            "fire" => Some(Self::Fire),
            _ => None,
        }
    }

    /// Root collection name in the document store, e.g. `wasteReports`.
    pub fn collection(&self) -> String {
        format!("{self}Reports")
    }

    /// Geohash precision at which reports of this category are registered.
    pub fn geohash_precision(&self) -> usize {
        7
    }

    /// Maximum distance in meters at which a nearby report of the same
    /// category counts as a duplicate. Fire incidents spread, so related
    /// reports are caught with a looser radius.
    pub fn dedup_threshold_meters(&self) -> f64 {
        match self {
            Category::Fire => 15.0,
            _ => 6.0,
        }
    }

    /// Whether the duplicate search fans out to the 8 neighboring cells.
    /// Waste and electricity reports cluster loosely; the other categories
    /// are registered at matching precision and search their own cell only.
    pub fn searches_neighbor_cells(&self) -> bool {
        matches!(self, Category::Waste | Category::Electricity)
    }

    /// Whether RESOLVED reports are excluded from duplicate candidacy.
    /// A cleared waste pile must not block re-reporting at the same spot.
    pub fn excludes_resolved(&self) -> bool {
        matches!(self, Category::Waste)
    }
}

// --- Report ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportStatus {
    #[serde(rename = "OPEN")]
    Open,
    #[serde(rename = "VERIFIED")]
    Verified,
    #[serde(rename = "ASSIGNED")]
    Assigned,
    // WAITING_APPROVAL is the citizen-facing name for the same condition:
    // staff proof pending the reporter's confirmation. One machine state.
    #[serde(rename = "USERVERIFICATION", alias = "WAITING_APPROVAL")]
    UserVerification,
    #[serde(rename = "RESOLVED")]
    Resolved,
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportStatus::Open => write!(f, "OPEN"),
            ReportStatus::Verified => write!(f, "VERIFIED"),
            ReportStatus::Assigned => write!(f, "ASSIGNED"),
            ReportStatus::UserVerification => write!(f, "USERVERIFICATION"),
            ReportStatus::Resolved => write!(f, "RESOLVED"),
        }
    }
}

impl ReportStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ReportStatus::Resolved)
    }

    /// Citizen-facing status label. USERVERIFICATION surfaces as
    /// WAITING_APPROVAL: the reporter is being asked to approve the proof.
    pub fn display_status(&self) -> &'static str {
        match self {
            ReportStatus::Open => "OPEN",
            ReportStatus::Verified => "VERIFIED",
            ReportStatus::Assigned => "ASSIGNED",
            ReportStatus::UserVerification => "WAITING_APPROVAL",
            ReportStatus::Resolved => "RESOLVED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// Outcome of the external image-verification oracle, stamped on a report
/// when an AI-gated resolution goes through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiVerification {
    pub verified: bool,
    pub confidence: f64,
    pub reasoning: String,
}

/// Full store address of a report:
/// `{category}Reports/{geohash}/reports/{reporterId}/userReports/{reportId}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportKey {
    pub category: Category,
    pub geohash: String,
    pub reporter_id: String,
    pub report_id: String,
}

impl std::fmt::Display for ReportKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/reports/{}/userReports/{}",
            self.category.collection(),
            self.geohash,
            self.reporter_id,
            self.report_id
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: String,
    pub category: Category,
    pub location: GeoPoint,
    pub geohash: String,
    pub status: ReportStatus,
    pub severity: Severity,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub reporter_id: String,
    pub reporter_email: String,
    /// Users following this report. Grows via dedup matches; set semantics
    /// keep interest registration idempotent per user.
    #[serde(default)]
    pub interested_users: BTreeSet<String>,
    #[serde(default)]
    pub upvotes: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_task_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof_image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_verification: Option<AiVerification>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Report {
    pub fn key(&self) -> ReportKey {
        ReportKey {
            category: self.category,
            geohash: self.geohash.clone(),
            reporter_id: self.reporter_id.clone(),
            report_id: self.id.clone(),
        }
    }
}

// --- Task ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    #[serde(rename = "PENDING")]
    Pending,
    #[serde(rename = "IN_PROGRESS")]
    InProgress,
    #[serde(rename = "USERVERIFICATION")]
    UserVerification,
    #[serde(rename = "COMPLETED")]
    Completed,
    #[serde(rename = "VERIFIED")]
    Verified,
    #[serde(rename = "RESOLVED")]
    Resolved,
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "PENDING"),
            TaskStatus::InProgress => write!(f, "IN_PROGRESS"),
            TaskStatus::UserVerification => write!(f, "USERVERIFICATION"),
            TaskStatus::Completed => write!(f, "COMPLETED"),
            TaskStatus::Verified => write!(f, "VERIFIED"),
            TaskStatus::Resolved => write!(f, "RESOLVED"),
        }
    }
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Verified | TaskStatus::Resolved
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub report_id: String,
    /// Full store address of the backing report, so coordinator writes
    /// never need a collection-group scan.
    pub report_key: ReportKey,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub assigned_to: String,
    pub assigned_by: String,
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: TaskPriority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof_image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

// --- Notification ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Info,
    Success,
    Error,
}

/// Durable, append-only notification log entry. Mutated only by the
/// read-acknowledgement action, never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}
