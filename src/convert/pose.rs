use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::OnceLock;

use anyhow::{Context, Result, bail};
use nalgebra::Vector3;
use serde::Deserialize;
use xml::attribute::OwnedAttribute;
use xml::reader::{EventReader, XmlEvent};

use super::naming::pose_aliases;
use super::rig::SkeletonEditor;
use super::types::{ConvertOptions, PoseReport, RigError, ValidationIssue};

/// One node of a declarative pose tree. Position and rotation are offsets
/// in armature space; `scale` is only present when the source declares
/// one.
#[derive(Debug, Clone)]
pub struct PoseNode {
    pub name: String,
    pub position: Vector3<f32>,
    pub rotation: Vector3<f32>,
    pub scale: Option<Vector3<f32>>,
    pub children: Vec<PoseNode>,
}

#[derive(Debug, Clone, Copy)]
pub enum HandSide {
    Left,
    Right,
}

// ─── Built-in pose trees ──────────────────────────────────────────────────────

static HAND_POSE_JSON: &str = include_str!("../../data/hand_pose.json");
static BENTO_POSE_JSON: &str = include_str!("../../data/bento_pose.json");

#[derive(Deserialize)]
struct RawPoseEntry {
    pos: [f32; 3],
    rot: [f32; 3],
    #[serde(default)]
    children: BTreeMap<String, RawPoseEntry>,
}

fn raw_to_nodes(entries: BTreeMap<String, RawPoseEntry>) -> Vec<PoseNode> {
    entries
        .into_iter()
        .map(|(name, entry)| PoseNode {
            name,
            position: Vector3::from(entry.pos),
            rotation: Vector3::from(entry.rot),
            scale: None,
            children: raw_to_nodes(entry.children),
        })
        .collect()
}

/// Relaxed finger pose for one hand.
pub fn builtin_hand_pose(side: HandSide) -> &'static [PoseNode] {
    static CACHE: OnceLock<(Vec<PoseNode>, Vec<PoseNode>)> = OnceLock::new();
    let (left, right) = CACHE.get_or_init(|| {
        let mut raw: BTreeMap<String, BTreeMap<String, RawPoseEntry>> =
            serde_json::from_str(HAND_POSE_JSON).expect("embedded hand pose is valid JSON");
        let left = raw.remove("left").unwrap_or_default();
        let right = raw.remove("right").unwrap_or_default();
        (raw_to_nodes(left), raw_to_nodes(right))
    });
    match side {
        HandSide::Left => left,
        HandSide::Right => right,
    }
}

/// Full Bento rest pose rooted at the pelvis.
pub fn builtin_bento_pose() -> &'static [PoseNode] {
    static CACHE: OnceLock<Vec<PoseNode>> = OnceLock::new();
    CACHE.get_or_init(|| {
        let raw: BTreeMap<String, RawPoseEntry> =
            serde_json::from_str(BENTO_POSE_JSON).expect("embedded bento pose is valid JSON");
        raw_to_nodes(raw)
    })
}

// ─── XML pose files ───────────────────────────────────────────────────────────

fn parse_triplet(text: &str) -> Result<Vector3<f32>> {
    let parts: Vec<f32> = text
        .split_whitespace()
        .map(|p| p.parse::<f32>().with_context(|| format!("bad component '{p}'")))
        .collect::<Result<_>>()?;
    if parts.len() != 3 {
        bail!("expected 3 components, got {}", parts.len());
    }
    Ok(Vector3::new(parts[0], parts[1], parts[2]))
}

fn node_from_attributes(attributes: &[OwnedAttribute]) -> Result<PoseNode> {
    let mut name = None;
    let mut position = Vector3::zeros();
    let mut rotation = Vector3::zeros();
    let mut scale = None;
    for attr in attributes {
        match attr.name.local_name.as_str() {
            "name" => name = Some(attr.value.clone()),
            "pos" => position = parse_triplet(&attr.value).context("bad pos attribute")?,
            "rot" => rotation = parse_triplet(&attr.value).context("bad rot attribute")?,
            "scale" => scale = Some(parse_triplet(&attr.value).context("bad scale attribute")?),
            _ => {}
        }
    }
    let Some(name) = name else {
        bail!("bone element without a name attribute");
    };
    Ok(PoseNode {
        name,
        position,
        rotation,
        scale,
        children: Vec::new(),
    })
}

/// Parse an `avatar_skeleton.xml`-style pose file. `<bone>` elements nest
/// freely under any wrapper element; exactly one top-level bone is
/// required and becomes the returned tree.
pub fn load_pose_xml(path: &Path) -> Result<PoseNode> {
    let file = File::open(path)
        .with_context(|| format!("failed to open pose file {}", path.display()))?;
    let reader = EventReader::new(BufReader::new(file));

    let mut stack: Vec<PoseNode> = Vec::new();
    let mut roots: Vec<PoseNode> = Vec::new();
    for event in reader {
        match event.with_context(|| format!("malformed XML in {}", path.display()))? {
            XmlEvent::StartElement { name, attributes, .. } if name.local_name == "bone" => {
                stack.push(node_from_attributes(&attributes)?);
            }
            XmlEvent::EndElement { name } if name.local_name == "bone" => {
                // matching start element pushed above
                if let Some(node) = stack.pop() {
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(node),
                        None => roots.push(node),
                    }
                }
            }
            _ => {}
        }
    }

    if roots.len() != 1 {
        bail!(
            "pose file {} must contain exactly one top-level bone, found {}",
            path.display(),
            roots.len()
        );
    }
    Ok(roots.remove(0))
}

// ─── Application ──────────────────────────────────────────────────────────────

fn resolve_joint(
    skeleton: &impl SkeletonEditor,
    name: &str,
    prefix: Option<&str>,
) -> Option<String> {
    if skeleton.has_joint(name) {
        return Some(name.to_string());
    }
    let prefix = prefix?;
    let prefixed = format!("{prefix}{name}");
    if skeleton.has_joint(&prefixed) {
        return Some(prefixed);
    }
    let alias = pose_aliases().get(name)?;
    let prefixed_alias = format!("{prefix}{alias}");
    skeleton.has_joint(&prefixed_alias).then_some(prefixed_alias)
}

/// Walk a pose tree and write its offsets into the skeleton.
///
/// Joint resolution tries the canonical name, then the prefixed name, then
/// the prefixed legacy alias, so the same pose data works on renamed and
/// still-prefixed rigs alike. Unresolved nodes are reported and their
/// subtree is still visited; a missing ancestor never hides its
/// descendants. Writing the same pose twice leaves the skeleton unchanged.
pub fn apply_offsets(
    skeleton: &mut impl SkeletonEditor,
    nodes: &[PoseNode],
    prefix: Option<&str>,
    options: &ConvertOptions,
) -> Result<PoseReport, RigError> {
    let mut report = PoseReport::default();
    for node in nodes {
        match resolve_joint(skeleton, &node.name, prefix) {
            Some(joint) => {
                if options.apply_position {
                    skeleton.set_position(&joint, node.position)?;
                }
                if options.apply_rotation {
                    skeleton.set_rotation(&joint, node.rotation)?;
                }
                if options.apply_scale
                    && let Some(scale) = node.scale
                {
                    skeleton.set_scale(&joint, scale)?;
                }
                report.applied += 1;
            }
            None => {
                report.unresolved += 1;
                report.issues.push(ValidationIssue::warning(
                    "POSE_JOINT_NOT_FOUND",
                    format!("pose joint '{}' not found in skeleton", node.name),
                ));
            }
        }
        let child_report = apply_offsets(skeleton, &node.children, prefix, options)?;
        report.applied += child_report.applied;
        report.unresolved += child_report.unresolved;
        report.issues.extend(child_report.issues);
    }
    Ok(report)
}
