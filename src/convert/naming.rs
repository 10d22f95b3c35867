use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use anyhow::{Context, Result, bail};
use serde_json::Value;

use super::types::Preset;

/// Source name → canonical target name.
pub type NamingTable = BTreeMap<String, String>;

/// Canonical joint → canonical parent. The root maps to `None`.
pub type ParentTable = BTreeMap<String, Option<String>>;

static PRESETS_JSON: &str = include_str!("../../data/presets.json");
static BONE_PARENTS_JSON: &str = include_str!("../../data/bone_parents.json");
static POSE_ALIASES_JSON: &str = include_str!("../../data/pose_aliases.json");

fn presets() -> &'static BTreeMap<String, NamingTable> {
    static CACHE: OnceLock<BTreeMap<String, NamingTable>> = OnceLock::new();
    CACHE.get_or_init(|| {
        serde_json::from_str(PRESETS_JSON).expect("embedded preset table is valid JSON")
    })
}

/// Built-in naming table for a preset. `CUSTOM` has no built-in table and
/// falls back to the full Bento set.
pub fn builtin_table(preset: Preset) -> &'static NamingTable {
    let key = match preset {
        Preset::BentoFull | Preset::Custom => "BENTO_FULL",
        Preset::Basic => "BASIC",
        Preset::FaceOnly => "FACE_ONLY",
    };
    &presets()[key]
}

/// Resolve the active naming table. A `CUSTOM` preset loads the user table
/// from `custom_path`; on failure the full built-in set is used so a bad
/// file never aborts a conversion.
pub fn resolve_table(preset: Preset, custom_path: Option<&Path>) -> NamingTable {
    if preset == Preset::Custom {
        if let Some(path) = custom_path {
            match load_custom_mapping(path) {
                Ok(table) => return table,
                Err(err) => {
                    log::warn!(
                        "custom mapping {} unusable ({err:#}), falling back to BENTO_FULL",
                        path.display()
                    );
                }
            }
        } else {
            log::warn!("CUSTOM preset without a mapping path, falling back to BENTO_FULL");
        }
    }
    builtin_table(preset).clone()
}

/// Load a user naming table. The file must be a flat JSON object with
/// string values; anything else is rejected.
pub fn load_custom_mapping(path: &Path) -> Result<NamingTable> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read mapping file {}", path.display()))?;
    let value: Value = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse mapping file {}", path.display()))?;
    let Value::Object(entries) = value else {
        bail!("mapping file {} is not a JSON object", path.display());
    };
    let mut table = NamingTable::new();
    for (source, target) in entries {
        let Value::String(target) = target else {
            bail!("mapping entry '{source}' has a non-string target");
        };
        table.insert(source, target);
    }
    Ok(table)
}

/// Write a naming table to disk in the same flat-object format
/// `load_custom_mapping` reads.
pub fn save_mapping(table: &NamingTable, path: &Path) -> Result<()> {
    let text = serde_json::to_string_pretty(table).context("failed to serialize mapping")?;
    fs::write(path, text)
        .with_context(|| format!("failed to write mapping file {}", path.display()))?;
    Ok(())
}

/// The canonical Bento parent table.
pub fn bone_parents() -> &'static ParentTable {
    static CACHE: OnceLock<ParentTable> = OnceLock::new();
    CACHE.get_or_init(|| {
        serde_json::from_str(BONE_PARENTS_JSON).expect("embedded parent table is valid JSON")
    })
}

/// Canonical parent of `joint`, or `None` for the root or unknown joints.
pub fn parent_of(joint: &str) -> Option<&'static str> {
    bone_parents().get(joint).and_then(|p| p.as_deref())
}

/// Canonical → legacy alias names used when resolving pose-file joints
/// against rigs that still carry source naming.
pub fn pose_aliases() -> &'static BTreeMap<String, String> {
    static CACHE: OnceLock<BTreeMap<String, String>> = OnceLock::new();
    CACHE.get_or_init(|| {
        serde_json::from_str(POSE_ALIASES_JSON).expect("embedded alias table is valid JSON")
    })
}

/// The single canonical root joint.
pub fn root_joint() -> &'static str {
    static CACHE: OnceLock<String> = OnceLock::new();
    CACHE.get_or_init(|| {
        bone_parents()
            .iter()
            .find(|(_, parent)| parent.is_none())
            .map(|(joint, _)| joint.clone())
            .expect("embedded parent table has a root")
    })
}
