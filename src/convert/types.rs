use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ─── Errors ───────────────────────────────────────────────────────────────────

/// Structural failures of the skeleton/mesh editing layer.
///
/// Expected conditions (unmapped names, rename collisions, unresolved pose
/// joints) are never errors; they surface as [`ValidationIssue`] entries in
/// the operation reports.
#[derive(Error, Debug)]
pub enum RigError {
    #[error("no joint named '{0}' in skeleton")]
    UnknownJoint(String),

    #[error("a joint named '{0}' already exists")]
    DuplicateJoint(String),

    #[error("no vertex group named '{0}'")]
    UnknownGroup(String),

    #[error("a vertex group named '{0}' already exists")]
    DuplicateGroup(String),

    #[error("invalid option: {0}")]
    InvalidOption(String),
}

// ─── Configuration ────────────────────────────────────────────────────────────

/// Built-in naming table presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Preset {
    BentoFull,
    Basic,
    FaceOnly,
    Custom,
}

/// How the source-rig namespace prefix is determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrefixMode {
    Auto,
    Manual,
    Custom,
}

/// A single weight-split instruction: distribute `source`'s influence across
/// two target groups at the configured split ratio.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightSplit {
    pub source: String,
    pub target_a: String,
    pub target_b: String,
}

/// Conversion options shared by the CLI and library entry points.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertOptions {
    pub preset: Preset,
    pub prefix_mode: PrefixMode,
    /// Prefix used when `prefix_mode` is `MANUAL`; one of the known Mixamo
    /// exporter prefixes.
    pub manual_prefix: String,
    /// Free-form prefix used when `prefix_mode` is `CUSTOM`.
    pub custom_prefix: String,
    /// Path to a user-supplied naming table, used when `preset` is `CUSTOM`.
    pub custom_mapping_path: Option<PathBuf>,
    /// Per-vertex weights strictly below this value are removed. Range [0, 0.5].
    pub weight_threshold: f32,
    /// Share of the source weight that goes to the first split target. Range [0, 1].
    pub split_ratio: f32,
    pub weight_splits: Vec<WeightSplit>,
    pub apply_position: bool,
    pub apply_rotation: bool,
    pub apply_scale: bool,
    pub apply_left_hand: bool,
    pub apply_right_hand: bool,
    pub apply_bento_pose: bool,
    /// Delete joints that have no counterpart in the canonical parent table.
    pub remove_unmapped: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            preset: Preset::BentoFull,
            prefix_mode: PrefixMode::Auto,
            manual_prefix: "mixamorig:".to_string(),
            custom_prefix: String::new(),
            custom_mapping_path: None,
            weight_threshold: 0.01,
            split_ratio: 0.5,
            weight_splits: Vec::new(),
            apply_position: true,
            apply_rotation: true,
            apply_scale: false,
            apply_left_hand: false,
            apply_right_hand: false,
            apply_bento_pose: false,
            remove_unmapped: false,
        }
    }
}

impl ConvertOptions {
    /// Validate numeric ranges before any mutation happens.
    pub fn validate(&self) -> Result<(), RigError> {
        if !(0.0..=0.5).contains(&self.weight_threshold) {
            return Err(RigError::InvalidOption(format!(
                "weight_threshold must be within [0, 0.5], got {}",
                self.weight_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.split_ratio) {
            return Err(RigError::InvalidOption(format!(
                "split_ratio must be within [0, 1], got {}",
                self.split_ratio
            )));
        }
        Ok(())
    }
}

// ─── Issues ───────────────────────────────────────────────────────────────────

/// Severity level used by validation issues.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// A single issue produced during analysis or conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub code: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn warning(code: &str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code: code.to_string(),
            message: message.into(),
        }
    }

    pub fn error(code: &str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code: code.to_string(),
            message: message.into(),
        }
    }
}

// ─── Operation reports ────────────────────────────────────────────────────────

/// Outcome of one bone-rename pass over a skeleton.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RenameReport {
    pub renamed: usize,
    pub skipped: usize,
    /// (old name, new name) pairs actually applied, in processing order.
    /// Vertex-group renaming follows this list one-to-one.
    pub applied: Vec<(String, String)>,
    pub issues: Vec<ValidationIssue>,
}

/// Structural defects found by the non-destructive hierarchy analysis.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StructureReport {
    /// Canonical joints absent from the live skeleton.
    pub missing: Vec<String>,
    /// Parentless joints other than the designated root.
    pub extra_roots: Vec<String>,
    pub wrong_parents: Vec<ParentMismatch>,
    /// Joints flagged connected whose head does not coincide with the
    /// parent's tail.
    pub disconnected: Vec<String>,
}

impl StructureReport {
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty()
            && self.extra_roots.is_empty()
            && self.wrong_parents.is_empty()
            && self.disconnected.is_empty()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ParentMismatch {
    pub joint: String,
    pub expected: String,
    pub actual: String,
}

/// Outcome of one destructive hierarchy repair pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RepairReport {
    pub added: usize,
    pub reparented: usize,
    pub connected: usize,
}

impl RepairReport {
    pub fn is_noop(&self) -> bool {
        self.added == 0 && self.reparented == 0 && self.connected == 0
    }
}

/// Outcome of one pose-offset application pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PoseReport {
    pub applied: usize,
    pub unresolved: usize,
    pub issues: Vec<ValidationIssue>,
}

/// Influence statistics for a single vertex-weight group.
#[derive(Debug, Clone, Serialize)]
pub struct WeightStats {
    pub vertex_count: usize,
    pub avg_weight: f32,
    pub max_weight: f32,
}

/// Analysis-only report generated without mutating the document.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub skeleton_count: usize,
    pub mesh_count: usize,
    pub joint_count: usize,
    /// (source, target) pairs of the active table found in the document.
    pub mapped_joints: Vec<(String, String)>,
    /// Structure report per skeleton, keyed by skeleton name.
    pub structure: Vec<(String, StructureReport)>,
    /// (mesh, group, stats) for every non-empty vertex group.
    pub weights: Vec<(String, String, WeightStats)>,
    pub issues: Vec<ValidationIssue>,
}

/// Full conversion report returned after a document-wide conversion.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConversionReport {
    pub skeleton_count: usize,
    pub mesh_count: usize,
    pub renamed: usize,
    pub skipped: usize,
    pub added: usize,
    pub reparented: usize,
    pub connected: usize,
    pub removed_joints: usize,
    pub cleaned_entries: usize,
    pub pose_applied: usize,
    pub issues: Vec<ValidationIssue>,
}
