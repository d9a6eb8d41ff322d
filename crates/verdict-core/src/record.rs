//! Observation records: structured, concept-free snapshots of upstream
//! measurements.
//!
//! A record is produced once by the upstream observation collaborator
//! (an image-processing routine we treat as opaque) and is immutable from
//! that point on. Both pipeline stages read it; neither mutates it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from loading or validating an observation record.
#[derive(Error, Debug)]
pub enum RecordError {
    #[error("Record parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Record has an empty identifier")]
    MissingId,
}

/// A structural observation snapshot.
///
/// # Key Guarantee
/// The record carries only numeric/structural primitives and opaque
/// identifiers. No field name or value is a semantic concept label -
/// the upstream observation layer is designed to keep those out, and
/// the narration stage is audited for reintroducing them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservationRecord {
    /// Unique identifier assigned by the upstream producer
    pub record_id: String,

    /// When the observation was captured
    pub captured_at: DateTime<Utc>,

    /// Primary countable quantity (estimated protrusions)
    pub protrusions: u32,

    /// Significant convexity defects
    pub convexity_defects: u32,

    /// Contour area in pixels
    pub contour_area: f64,

    /// Convex hull point count
    pub hull_points: u32,

    /// Bounding box width in pixels
    pub bbox_width: u32,

    /// Bounding box height in pixels
    pub bbox_height: u32,

    /// Bounding box aspect ratio (width / height)
    pub aspect_ratio: f64,

    /// Provenance tag: path of the source input
    pub source_path: String,

    /// Processing-method tag from the upstream producer
    pub processing_method: String,
}

impl ObservationRecord {
    /// Load a record from the JSON form the upstream producer emits.
    pub fn from_json_str(json: &str) -> Result<Self, RecordError> {
        let record: Self = serde_json::from_str(json)?;
        record.validate()?;
        Ok(record)
    }

    /// Check structural validity. Records come from outside the pipeline,
    /// so the id is the only field we can meaningfully reject on.
    pub fn validate(&self) -> Result<(), RecordError> {
        if self.record_id.trim().is_empty() {
            return Err(RecordError::MissingId);
        }
        Ok(())
    }
}
