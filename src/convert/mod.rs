//! Mixamo → OpenSim/Bento rig reconciliation.
//!
//! The engine renames source joints to the canonical Second Life Bento
//! names, rebuilds the parent hierarchy against the reference table,
//! redistributes vertex weights, and optionally writes rest-pose offsets.
//! Everything operates through the [`SkeletonEditor`] and [`WeightEditor`]
//! traits so hosts with their own rig representation can drive the same
//! passes.

mod naming;
mod pose;
mod prefix;
mod rig;
mod skeleton;
mod skinning;
mod types;
mod validation;

pub use naming::{
    NamingTable, ParentTable, bone_parents, builtin_table, load_custom_mapping, parent_of,
    pose_aliases, resolve_table, root_joint, save_mapping,
};
pub use pose::{
    HandSide, PoseNode, apply_offsets, builtin_bento_pose, builtin_hand_pose, load_pose_xml,
};
pub use prefix::{MIXAMO_PREFIXES, detect_prefix, resolve_prefix};
pub use rig::{
    CONNECT_EPSILON, Joint, Mesh, RigDocument, Skeleton, SkeletonEditor, WeightEditor,
};
pub use skeleton::{apply_fixes, remove_unmapped_joints, rename_bones, rename_weight_groups};
pub use skinning::{
    cleanup_weights, load_weights, save_weights, split_weights, weight_stats,
};
pub use types::{
    AnalysisReport, ConversionReport, ConvertOptions, ParentMismatch, PoseReport, Preset,
    PrefixMode, RenameReport, RepairReport, RigError, Severity, StructureReport, ValidationIssue,
    WeightSplit, WeightStats,
};
pub use validation::{check_structure, validate_rig};

use anyhow::Result;

// ─── Analysis ─────────────────────────────────────────────────────────────────

/// Inspect a rig document without touching it: prefix detection, naming
/// coverage against the active table, structural defects versus the
/// canonical hierarchy, rig sanity issues, and weight statistics.
pub fn analyze_rig(doc: &RigDocument, options: &ConvertOptions) -> Result<AnalysisReport> {
    options.validate()?;
    let table = naming::resolve_table(options.preset, options.custom_mapping_path.as_deref());
    let parents = naming::bone_parents();
    let root = naming::root_joint();

    let mut report = AnalysisReport {
        skeleton_count: doc.skeletons.len(),
        mesh_count: doc.meshes.len(),
        joint_count: 0,
        mapped_joints: Vec::new(),
        structure: Vec::new(),
        weights: Vec::new(),
        issues: Vec::new(),
    };

    for skeleton in &doc.skeletons {
        report.joint_count += skeleton.joints.len();
        match prefix::resolve_prefix(skeleton, options) {
            Some(prefix) => {
                for name in skeleton.joint_names() {
                    if let Some(stripped) = name.strip_prefix(&prefix)
                        && let Some(target) = table.get(stripped)
                    {
                        report.mapped_joints.push((name.clone(), target.clone()));
                    }
                }
            }
            None => report.issues.push(ValidationIssue::warning(
                "NO_PREFIX",
                format!("skeleton '{}' carries no recognizable prefix", skeleton.name),
            )),
        }
        report
            .structure
            .push((skeleton.name.clone(), validation::check_structure(skeleton, parents, root)));
        report.issues.extend(validation::validate_rig(skeleton));
    }

    for mesh in &doc.meshes {
        for group in mesh.group_names() {
            if let Some(stats) = skinning::weight_stats(mesh, &group) {
                report.weights.push((mesh.name.clone(), group, stats));
            }
        }
    }

    Ok(report)
}

// ─── Conversion ───────────────────────────────────────────────────────────────

/// Convert every skeleton of the document in place.
///
/// Per skeleton: resolve the namespace prefix (no prefix ⇒ warn and skip),
/// rename bones and the attached meshes' vertex groups, optionally drop
/// unmapped joints, repair the hierarchy, clean up and split weights, then
/// apply the configured built-in poses. Skeletons are isolated from each
/// other: a failure is recorded as an issue and the remaining skeletons
/// are still processed. Invalid options abort before any mutation.
pub fn convert_rig(doc: &mut RigDocument, options: &ConvertOptions) -> Result<ConversionReport> {
    options.validate()?;
    let table = naming::resolve_table(options.preset, options.custom_mapping_path.as_deref());
    let parents = naming::bone_parents();

    let mut report = ConversionReport {
        skeleton_count: doc.skeletons.len(),
        mesh_count: doc.meshes.len(),
        ..Default::default()
    };

    for idx in 0..doc.skeletons.len() {
        let name = doc.skeletons[idx].name.clone();
        let Some(prefix) = prefix::resolve_prefix(&doc.skeletons[idx], options) else {
            log::warn!("skeleton '{name}' carries no recognizable prefix, skipping");
            report.issues.push(ValidationIssue::warning(
                "NO_PREFIX",
                format!("skeleton '{name}' carries no recognizable prefix, skipped"),
            ));
            continue;
        };
        if let Err(err) = convert_skeleton(
            &mut doc.skeletons[idx],
            &mut doc.meshes,
            &prefix,
            &table,
            parents,
            options,
            &mut report,
        ) {
            log::warn!("skeleton '{name}' failed: {err}");
            report.issues.push(ValidationIssue::error(
                "SKELETON_FAILED",
                format!("skeleton '{name}': {err}"),
            ));
        }
    }

    log::info!(
        "converted {} skeletons: {} renamed, {} added, {} reparented",
        report.skeleton_count,
        report.renamed,
        report.added,
        report.reparented
    );
    Ok(report)
}

fn convert_skeleton(
    skeleton: &mut Skeleton,
    meshes: &mut [Mesh],
    prefix: &str,
    table: &NamingTable,
    parents: &ParentTable,
    options: &ConvertOptions,
    report: &mut ConversionReport,
) -> Result<(), RigError> {
    let rename = skeleton::rename_bones(skeleton, prefix, table)?;
    report.renamed += rename.renamed;
    report.skipped += rename.skipped;
    report.issues.extend(rename.issues);

    let attached: Vec<usize> = meshes
        .iter()
        .enumerate()
        .filter(|(_, m)| m.armature.as_deref() == Some(skeleton.name.as_str()))
        .map(|(i, _)| i)
        .collect();

    for &i in &attached {
        let issues = skeleton::rename_weight_groups(&mut meshes[i], &rename.applied)?;
        report.issues.extend(issues);
    }

    if options.remove_unmapped {
        report.removed_joints += skeleton::remove_unmapped_joints(skeleton, parents)?;
    }

    let repair = skeleton::apply_fixes(skeleton, parents)?;
    report.added += repair.added;
    report.reparented += repair.reparented;
    report.connected += repair.connected;

    for &i in &attached {
        let mesh = &mut meshes[i];
        report.cleaned_entries += skinning::cleanup_weights(mesh, options.weight_threshold);
        for split in &options.weight_splits {
            if !mesh.has_group(&split.source) {
                report.issues.push(ValidationIssue::warning(
                    "SPLIT_SOURCE_MISSING",
                    format!("mesh '{}' has no group '{}' to split", mesh.name, split.source),
                ));
                continue;
            }
            skinning::split_weights(
                mesh,
                &split.source,
                &split.target_a,
                &split.target_b,
                options.split_ratio,
            )?;
        }
    }

    let mut pose_trees: Vec<&[PoseNode]> = Vec::new();
    if options.apply_left_hand {
        pose_trees.push(pose::builtin_hand_pose(HandSide::Left));
    }
    if options.apply_right_hand {
        pose_trees.push(pose::builtin_hand_pose(HandSide::Right));
    }
    if options.apply_bento_pose {
        pose_trees.push(pose::builtin_bento_pose());
    }
    for nodes in pose_trees {
        let pose_report = pose::apply_offsets(skeleton, nodes, Some(prefix), options)?;
        report.pose_applied += pose_report.applied;
        report.issues.extend(pose_report.issues);
    }

    Ok(())
}

// ─── Tests ────────────────────────────────────────────────────────────────────
