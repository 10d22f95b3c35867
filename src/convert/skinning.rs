use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};

use super::rig::{Mesh, RigDocument, WeightEditor};
use super::types::{RigError, WeightStats};

/// Drop per-vertex weights strictly below `threshold`. Emptied groups are
/// kept so later group renames still find them. Surviving weights are left
/// as they are; no renormalization happens here.
pub fn cleanup_weights(mesh: &mut impl WeightEditor, threshold: f32) -> usize {
    let mut removed = 0;
    for group in mesh.group_names() {
        for (vertex, weight) in mesh.entries(&group) {
            if weight < threshold {
                // entry and group both exist, remove_entry cannot fail
                let _ = mesh.remove_entry(&group, vertex);
                removed += 1;
            }
        }
    }
    removed
}

/// Distribute a copy of `source`'s influence across two target groups,
/// `ratio` to the first and the remainder to the second. Targets are
/// created when absent and the addition stacks on top of whatever weight
/// they already hold. The source group is not modified.
pub fn split_weights(
    mesh: &mut impl WeightEditor,
    source: &str,
    target_a: &str,
    target_b: &str,
    ratio: f32,
) -> Result<usize, RigError> {
    if !mesh.has_group(source) {
        return Err(RigError::UnknownGroup(source.to_string()));
    }
    mesh.ensure_group(target_a);
    mesh.ensure_group(target_b);
    let mut affected = 0;
    for (vertex, weight) in mesh.entries(source) {
        if weight <= 0.0 {
            continue;
        }
        mesh.add_weight(target_a, vertex, weight * ratio)?;
        mesh.add_weight(target_b, vertex, weight * (1.0 - ratio))?;
        affected += 1;
    }
    Ok(affected)
}

/// Influence statistics for one group, or `None` if the group is absent
/// or holds no entries.
pub fn weight_stats(mesh: &impl WeightEditor, group: &str) -> Option<WeightStats> {
    let entries = mesh.entries(group);
    if !mesh.has_group(group) || entries.is_empty() {
        return None;
    }
    let sum: f32 = entries.iter().map(|(_, w)| w).sum();
    let max = entries.iter().map(|(_, w)| *w).fold(0.0f32, f32::max);
    Some(WeightStats {
        vertex_count: entries.len(),
        avg_weight: sum / entries.len() as f32,
        max_weight: max,
    })
}

// ─── Weight persistence ───────────────────────────────────────────────────────

type WeightFile = BTreeMap<String, BTreeMap<String, BTreeMap<u32, f32>>>;

/// Export every mesh's nonzero weights as
/// `{mesh: {group: {"<vertex>": weight}}}` JSON.
pub fn save_weights(doc: &RigDocument, path: &Path) -> Result<()> {
    let mut file = WeightFile::new();
    for mesh in &doc.meshes {
        let mut groups = BTreeMap::new();
        for (group, entries) in &mesh.groups {
            let sparse: BTreeMap<u32, f32> = entries
                .iter()
                .filter(|&(_, &w)| w != 0.0)
                .map(|(&v, &w)| (v, w))
                .collect();
            groups.insert(group.clone(), sparse);
        }
        file.insert(mesh.name.clone(), groups);
    }
    let text = serde_json::to_string_pretty(&file).context("failed to serialize weights")?;
    fs::write(path, text)
        .with_context(|| format!("failed to write weight file {}", path.display()))?;
    Ok(())
}

/// Import weights for one mesh from a file in the export shape. The entry
/// matching the mesh's name is selected and the mesh's groups are replaced
/// wholesale.
pub fn load_weights(mesh: &mut Mesh, path: &Path) -> Result<()> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read weight file {}", path.display()))?;
    let file: WeightFile = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse weight file {}", path.display()))?;
    let Some(groups) = file.get(&mesh.name) else {
        bail!("weight file {} has no entry for mesh '{}'", path.display(), mesh.name);
    };
    mesh.groups = groups.clone();
    Ok(())
}
