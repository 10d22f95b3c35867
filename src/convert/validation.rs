use std::collections::BTreeSet;

use super::naming::ParentTable;
use super::rig::{CONNECT_EPSILON, Skeleton, SkeletonEditor};
use super::types::{ParentMismatch, StructureReport, ValidationIssue};

/// Every joint name the parent table speaks about: its keys plus every
/// non-null parent value.
pub fn table_universe(parents: &ParentTable) -> BTreeSet<&str> {
    let mut universe: BTreeSet<&str> = parents.keys().map(String::as_str).collect();
    universe.extend(parents.values().filter_map(|p| p.as_deref()));
    universe
}

/// Non-destructive structure check of a skeleton against the canonical
/// parent table. Reports what a repair pass would change without touching
/// the skeleton.
pub fn check_structure(
    skeleton: &impl SkeletonEditor,
    parents: &ParentTable,
    root: &str,
) -> StructureReport {
    let mut report = StructureReport::default();

    for joint in table_universe(parents) {
        if !skeleton.has_joint(joint) {
            report.missing.push(joint.to_string());
        }
    }

    for name in skeleton.joint_names() {
        if skeleton.parent_of(&name).is_none() && name != root {
            report.extra_roots.push(name.clone());
        }
        if skeleton.is_connected(&name) {
            let on_parent_tail = skeleton
                .parent_of(&name)
                .and_then(|p| skeleton.tail(&p))
                .zip(skeleton.head(&name))
                .is_some_and(|(parent_tail, head)| {
                    (head - parent_tail).norm() <= CONNECT_EPSILON
                });
            if !on_parent_tail {
                report.disconnected.push(name.clone());
            }
        }
    }

    for (joint, expected) in parents {
        let Some(expected) = expected.as_deref() else {
            continue;
        };
        if !skeleton.has_joint(joint) {
            continue;
        }
        let actual = skeleton.parent_of(joint);
        if actual.as_deref() != Some(expected) {
            report.wrong_parents.push(ParentMismatch {
                joint: joint.clone(),
                expected: expected.to_string(),
                actual: actual.unwrap_or_else(|| "(none)".to_string()),
            });
        }
    }

    report
}

/// Rig sanity issues that are not structural defects: degenerate bone
/// lengths, non-uniform scales, more than one parentless joint.
pub fn validate_rig(skeleton: &Skeleton) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    let roots: Vec<&str> = skeleton
        .joints
        .iter()
        .filter(|j| j.parent.is_none())
        .map(|j| j.name.as_str())
        .collect();
    if roots.len() > 1 {
        issues.push(ValidationIssue::warning(
            "MULTIPLE_ROOTS",
            format!("skeleton '{}' has {} parentless joints: {}", skeleton.name, roots.len(), roots.join(", ")),
        ));
    }

    for joint in &skeleton.joints {
        if (joint.tail - joint.head).norm() < CONNECT_EPSILON {
            issues.push(ValidationIssue::warning(
                "DEGENERATE_JOINT",
                format!("joint '{}' has near-zero length", joint.name),
            ));
        }
        let s = joint.scale;
        if (s.x - s.y).abs() > CONNECT_EPSILON || (s.y - s.z).abs() > CONNECT_EPSILON {
            issues.push(ValidationIssue::warning(
                "NON_UNIFORM_SCALE",
                format!("joint '{}' carries a non-uniform scale", joint.name),
            ));
        }
    }

    issues
}
