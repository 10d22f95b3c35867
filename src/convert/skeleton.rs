use nalgebra::Vector3;

use super::naming::{NamingTable, ParentTable};
use super::rig::{CONNECT_EPSILON, SkeletonEditor, WeightEditor};
use super::types::{RenameReport, RepairReport, RigError, ValidationIssue};

// ─── Bone renaming ────────────────────────────────────────────────────────────

/// Rename every prefixed, table-mapped joint to its canonical name.
///
/// Per joint, in skeleton order: the prefix is stripped, the remainder is
/// looked up in the table, and the joint is renamed unless the target name
/// is held by another joint. Joints without the prefix or without a table
/// entry count as skipped; collisions keep the existing joint (first
/// wins) and are reported as warnings. Running the pass again renames
/// nothing because canonical names no longer carry the prefix.
pub fn rename_bones(
    skeleton: &mut impl SkeletonEditor,
    prefix: &str,
    table: &NamingTable,
) -> Result<RenameReport, RigError> {
    let mut report = RenameReport::default();
    for name in skeleton.joint_names() {
        let Some(stripped) = name.strip_prefix(prefix) else {
            report.skipped += 1;
            continue;
        };
        let Some(target) = table.get(stripped) else {
            report.skipped += 1;
            continue;
        };
        if target != &name {
            if skeleton.has_joint(target) {
                report.skipped += 1;
                report.issues.push(ValidationIssue::warning(
                    "RENAME_COLLISION",
                    format!("'{name}' not renamed, a joint named '{target}' already exists"),
                ));
                continue;
            }
            skeleton.rename_joint(&name, target)?;
            report.applied.push((name, target.clone()));
        }
        report.renamed += 1;
    }
    Ok(report)
}

/// Carry the applied joint renames over to a mesh's vertex groups,
/// one-to-one. Groups whose target name is already taken are skipped with
/// a warning; groups unrelated to the rename pass are untouched.
pub fn rename_weight_groups(
    mesh: &mut impl WeightEditor,
    applied: &[(String, String)],
) -> Result<Vec<ValidationIssue>, RigError> {
    let mut issues = Vec::new();
    for (old, new) in applied {
        if !mesh.has_group(old) {
            continue;
        }
        if mesh.has_group(new) {
            issues.push(ValidationIssue::warning(
                "GROUP_COLLISION",
                format!("vertex group '{old}' not renamed, '{new}' already exists"),
            ));
            continue;
        }
        mesh.rename_group(old, new)?;
    }
    Ok(issues)
}

// ─── Hierarchy repair ─────────────────────────────────────────────────────────

/// Destructively bring a skeleton in line with the canonical parent table.
///
/// Missing canonical joints are inserted as placeholder bones at the
/// origin. Joints whose live parent disagrees with the table are
/// reparented and disconnected; joints whose head already sits on the new
/// parent's tail are re-connected. The root and joints outside the table
/// are never touched. A second run reports all zeros.
pub fn apply_fixes(
    skeleton: &mut impl SkeletonEditor,
    parents: &ParentTable,
) -> Result<RepairReport, RigError> {
    let mut report = RepairReport::default();

    for joint in parents.keys() {
        if !skeleton.has_joint(joint) {
            skeleton.add_joint(joint, Vector3::zeros(), Vector3::new(0.0, 0.1, 0.0))?;
            report.added += 1;
        }
    }

    for (joint, expected) in parents {
        let Some(expected) = expected.as_deref() else {
            continue;
        };
        if skeleton.parent_of(joint).as_deref() != Some(expected) {
            skeleton.set_parent(joint, Some(expected))?;
            skeleton.set_connected(joint, false)?;
            report.reparented += 1;
        }
    }

    for (joint, expected) in parents {
        let Some(expected) = expected.as_deref() else {
            continue;
        };
        if skeleton.is_connected(joint) {
            continue;
        }
        if let (Some(head), Some(parent_tail)) = (skeleton.head(joint), skeleton.tail(expected))
            && (head - parent_tail).norm() <= CONNECT_EPSILON
        {
            skeleton.set_connected(joint, true)?;
            report.connected += 1;
        }
    }

    Ok(report)
}

/// Delete joints the canonical parent table knows nothing about. Children
/// of a removed joint are reparented to its parent so chains stay
/// walkable.
pub fn remove_unmapped_joints(
    skeleton: &mut impl SkeletonEditor,
    parents: &ParentTable,
) -> Result<usize, RigError> {
    let known = super::validation::table_universe(parents);
    let unwanted: Vec<String> = skeleton
        .joint_names()
        .into_iter()
        .filter(|name| !known.contains(name.as_str()))
        .collect();
    for name in &unwanted {
        skeleton.remove_joint(name)?;
    }
    Ok(unwanted.len())
}
