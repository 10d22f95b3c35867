use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use super::types::RigError;

/// Tolerance used when deciding whether a joint head sits on its parent's
/// tail. Matches the resolution of typical export precision.
pub const CONNECT_EPSILON: f32 = 1e-3;

fn zero3() -> Vector3<f32> {
    Vector3::zeros()
}

fn unit3() -> Vector3<f32> {
    Vector3::new(1.0, 1.0, 1.0)
}

// ─── Document model ───────────────────────────────────────────────────────────

/// One joint of a skeleton. `head`/`tail` are rest positions in armature
/// space; `rotation` is an Euler offset and `scale` a per-axis factor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Joint {
    pub name: String,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default = "zero3")]
    pub head: Vector3<f32>,
    #[serde(default = "zero3")]
    pub tail: Vector3<f32>,
    #[serde(default = "zero3")]
    pub rotation: Vector3<f32>,
    #[serde(default = "unit3")]
    pub scale: Vector3<f32>,
    #[serde(default)]
    pub connected: bool,
}

impl Joint {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            head: zero3(),
            tail: zero3(),
            rotation: zero3(),
            scale: unit3(),
            connected: false,
        }
    }
}

/// An ordered joint list. Order is insertion order; duplicate names are
/// rejected by the editing operations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Skeleton {
    pub name: String,
    #[serde(default)]
    pub joints: Vec<Joint>,
}

/// A skinned mesh. `groups` maps vertex-group names to sparse
/// vertex-index → weight tables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Mesh {
    pub name: String,
    /// Name of the skeleton this mesh is bound to, if any.
    #[serde(default)]
    pub armature: Option<String>,
    #[serde(default)]
    pub groups: BTreeMap<String, BTreeMap<u32, f32>>,
}

/// Root of the serialized rig document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RigDocument {
    #[serde(default)]
    pub skeletons: Vec<Skeleton>,
    #[serde(default)]
    pub meshes: Vec<Mesh>,
}

impl RigDocument {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read rig document {}", path.display()))?;
        let doc: Self = serde_json::from_str(&text)
            .with_context(|| format!("failed to parse rig document {}", path.display()))?;
        Ok(doc)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let text = serde_json::to_string_pretty(self).context("failed to serialize rig document")?;
        fs::write(path, text)
            .with_context(|| format!("failed to write rig document {}", path.display()))?;
        Ok(())
    }
}

// ─── Editor traits ────────────────────────────────────────────────────────────

/// Editing surface the hierarchy engines run against. Keeps the engines
/// independent of the concrete rig representation.
pub trait SkeletonEditor {
    fn joint_names(&self) -> Vec<String>;
    fn has_joint(&self, name: &str) -> bool;
    fn parent_of(&self, name: &str) -> Option<String>;
    fn set_parent(&mut self, name: &str, parent: Option<&str>) -> Result<(), RigError>;
    fn add_joint(&mut self, name: &str, head: Vector3<f32>, tail: Vector3<f32>)
    -> Result<(), RigError>;
    /// Removes a joint; its children are reparented to the joint's parent
    /// and marked disconnected.
    fn remove_joint(&mut self, name: &str) -> Result<(), RigError>;
    /// Renames a joint and updates every child's parent reference.
    fn rename_joint(&mut self, old: &str, new: &str) -> Result<(), RigError>;
    fn head(&self, name: &str) -> Option<Vector3<f32>>;
    fn tail(&self, name: &str) -> Option<Vector3<f32>>;
    fn is_connected(&self, name: &str) -> bool;
    fn set_connected(&mut self, name: &str, connected: bool) -> Result<(), RigError>;
    fn set_position(&mut self, name: &str, position: Vector3<f32>) -> Result<(), RigError>;
    fn set_rotation(&mut self, name: &str, rotation: Vector3<f32>) -> Result<(), RigError>;
    fn set_scale(&mut self, name: &str, scale: Vector3<f32>) -> Result<(), RigError>;
}

/// Editing surface for vertex-weight groups.
pub trait WeightEditor {
    fn group_names(&self) -> Vec<String>;
    fn has_group(&self, name: &str) -> bool;
    /// Creates the group if absent; existing groups are left untouched.
    fn ensure_group(&mut self, name: &str);
    fn rename_group(&mut self, old: &str, new: &str) -> Result<(), RigError>;
    fn remove_group(&mut self, name: &str) -> Result<(), RigError>;
    fn weight(&self, group: &str, vertex: u32) -> Option<f32>;
    fn set_weight(&mut self, group: &str, vertex: u32, weight: f32) -> Result<(), RigError>;
    /// Adds to whatever weight is already there, creating the entry at zero
    /// if absent.
    fn add_weight(&mut self, group: &str, vertex: u32, weight: f32) -> Result<(), RigError>;
    fn remove_entry(&mut self, group: &str, vertex: u32) -> Result<(), RigError>;
    fn entries(&self, group: &str) -> Vec<(u32, f32)>;
}

// ─── Skeleton impl ────────────────────────────────────────────────────────────

impl Skeleton {
    fn index_of(&self, name: &str) -> Option<usize> {
        self.joints.iter().position(|j| j.name == name)
    }

    fn joint(&self, name: &str) -> Option<&Joint> {
        self.joints.iter().find(|j| j.name == name)
    }

    fn joint_mut(&mut self, name: &str) -> Result<&mut Joint, RigError> {
        self.joints
            .iter_mut()
            .find(|j| j.name == name)
            .ok_or_else(|| RigError::UnknownJoint(name.to_string()))
    }
}

impl SkeletonEditor for Skeleton {
    fn joint_names(&self) -> Vec<String> {
        self.joints.iter().map(|j| j.name.clone()).collect()
    }

    fn has_joint(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    fn parent_of(&self, name: &str) -> Option<String> {
        self.joint(name).and_then(|j| j.parent.clone())
    }

    fn set_parent(&mut self, name: &str, parent: Option<&str>) -> Result<(), RigError> {
        if let Some(p) = parent
            && !self.has_joint(p)
        {
            return Err(RigError::UnknownJoint(p.to_string()));
        }
        let joint = self.joint_mut(name)?;
        joint.parent = parent.map(str::to_string);
        Ok(())
    }

    fn add_joint(
        &mut self,
        name: &str,
        head: Vector3<f32>,
        tail: Vector3<f32>,
    ) -> Result<(), RigError> {
        if self.has_joint(name) {
            return Err(RigError::DuplicateJoint(name.to_string()));
        }
        let mut joint = Joint::new(name);
        joint.head = head;
        joint.tail = tail;
        self.joints.push(joint);
        Ok(())
    }

    fn remove_joint(&mut self, name: &str) -> Result<(), RigError> {
        let idx = self
            .index_of(name)
            .ok_or_else(|| RigError::UnknownJoint(name.to_string()))?;
        let grandparent = self.joints[idx].parent.clone();
        self.joints.remove(idx);
        for joint in &mut self.joints {
            if joint.parent.as_deref() == Some(name) {
                joint.parent = grandparent.clone();
                joint.connected = false;
            }
        }
        Ok(())
    }

    fn rename_joint(&mut self, old: &str, new: &str) -> Result<(), RigError> {
        if self.has_joint(new) {
            return Err(RigError::DuplicateJoint(new.to_string()));
        }
        self.joint_mut(old)?.name = new.to_string();
        for joint in &mut self.joints {
            if joint.parent.as_deref() == Some(old) {
                joint.parent = Some(new.to_string());
            }
        }
        Ok(())
    }

    fn head(&self, name: &str) -> Option<Vector3<f32>> {
        self.joint(name).map(|j| j.head)
    }

    fn tail(&self, name: &str) -> Option<Vector3<f32>> {
        self.joint(name).map(|j| j.tail)
    }

    fn is_connected(&self, name: &str) -> bool {
        self.joint(name).is_some_and(|j| j.connected)
    }

    fn set_connected(&mut self, name: &str, connected: bool) -> Result<(), RigError> {
        self.joint_mut(name)?.connected = connected;
        Ok(())
    }

    fn set_position(&mut self, name: &str, position: Vector3<f32>) -> Result<(), RigError> {
        let joint = self.joint_mut(name)?;
        let length = joint.tail - joint.head;
        joint.head = position;
        joint.tail = position + length;
        Ok(())
    }

    fn set_rotation(&mut self, name: &str, rotation: Vector3<f32>) -> Result<(), RigError> {
        self.joint_mut(name)?.rotation = rotation;
        Ok(())
    }

    fn set_scale(&mut self, name: &str, scale: Vector3<f32>) -> Result<(), RigError> {
        self.joint_mut(name)?.scale = scale;
        Ok(())
    }
}

// ─── Mesh impl ────────────────────────────────────────────────────────────────

impl WeightEditor for Mesh {
    fn group_names(&self) -> Vec<String> {
        self.groups.keys().cloned().collect()
    }

    fn has_group(&self, name: &str) -> bool {
        self.groups.contains_key(name)
    }

    fn ensure_group(&mut self, name: &str) {
        self.groups.entry(name.to_string()).or_default();
    }

    fn rename_group(&mut self, old: &str, new: &str) -> Result<(), RigError> {
        if self.groups.contains_key(new) {
            return Err(RigError::DuplicateGroup(new.to_string()));
        }
        let entries = self
            .groups
            .remove(old)
            .ok_or_else(|| RigError::UnknownGroup(old.to_string()))?;
        self.groups.insert(new.to_string(), entries);
        Ok(())
    }

    fn remove_group(&mut self, name: &str) -> Result<(), RigError> {
        self.groups
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| RigError::UnknownGroup(name.to_string()))
    }

    fn weight(&self, group: &str, vertex: u32) -> Option<f32> {
        self.groups.get(group).and_then(|g| g.get(&vertex)).copied()
    }

    fn set_weight(&mut self, group: &str, vertex: u32, weight: f32) -> Result<(), RigError> {
        let entries = self
            .groups
            .get_mut(group)
            .ok_or_else(|| RigError::UnknownGroup(group.to_string()))?;
        entries.insert(vertex, weight);
        Ok(())
    }

    fn add_weight(&mut self, group: &str, vertex: u32, weight: f32) -> Result<(), RigError> {
        let entries = self
            .groups
            .get_mut(group)
            .ok_or_else(|| RigError::UnknownGroup(group.to_string()))?;
        *entries.entry(vertex).or_insert(0.0) += weight;
        Ok(())
    }

    fn remove_entry(&mut self, group: &str, vertex: u32) -> Result<(), RigError> {
        let entries = self
            .groups
            .get_mut(group)
            .ok_or_else(|| RigError::UnknownGroup(group.to_string()))?;
        entries.remove(&vertex);
        Ok(())
    }

    fn entries(&self, group: &str) -> Vec<(u32, f32)> {
        self.groups
            .get(group)
            .map(|g| g.iter().map(|(&v, &w)| (v, w)).collect())
            .unwrap_or_default()
    }
}
