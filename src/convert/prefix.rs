use super::rig::SkeletonEditor;
use super::types::{ConvertOptions, PrefixMode};

/// Namespace prefixes emitted by the known Mixamo exporter variants, in
/// detection priority order.
pub const MIXAMO_PREFIXES: [&str; 3] = ["mixamorig:", "mixamorig1:", "mixamorig2:"];

/// Scan the skeleton for the first known prefix carried by at least one
/// joint. Returns `None` for already-stripped or foreign rigs.
pub fn detect_prefix(skeleton: &impl SkeletonEditor) -> Option<&'static str> {
    let names = skeleton.joint_names();
    MIXAMO_PREFIXES
        .iter()
        .find(|prefix| names.iter().any(|n| n.starts_with(*prefix)))
        .copied()
}

/// Resolve the prefix the rename pass should strip, per the configured
/// mode. `None` means no joint carries a recognizable prefix.
pub fn resolve_prefix(skeleton: &impl SkeletonEditor, options: &ConvertOptions) -> Option<String> {
    match options.prefix_mode {
        PrefixMode::Auto => detect_prefix(skeleton).map(str::to_string),
        PrefixMode::Manual => Some(options.manual_prefix.clone()),
        PrefixMode::Custom => {
            if options.custom_prefix.is_empty() {
                None
            } else {
                Some(options.custom_prefix.clone())
            }
        }
    }
}
