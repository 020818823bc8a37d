//! Skeletons.
//!
//! A rig is a forest of bones. Each bone has a local-to-parent rest
//! transform (a translation and a rotation; scale is ignored). Composing a
//! bone's transform with its parent's, and so on up to the root, gives the
//! bone's world rest transform.
//!
//! ```text
//!      A       A's local-to-parent = a, B's = b, etc.
//!     / \      D's world rotation = a c d
//!    B   C
//!       /
//!      D
//! ```
//!
//! Bones are stored in a flat arena and referenced by `BoneId`. Parent links
//! only ever point from a child to its parent, and the order in which world
//! transforms are computed is fixed once, when the rig is built, by a
//! topological sort. Nothing holds references back into the tree while
//! transforms are evaluated.

pub mod humanoid;

use cgmath::{InnerSpace, One, Quaternion, Rotation, Vector3, vec3};
use crate::errors::Result;
use petgraph::Graph;
use petgraph::algo::toposort;
use std::collections::HashMap;

pub use self::humanoid::HumanoidBone;

pub type BoneId = u16;

/// A bone as it appears in an asset file, before parents are resolved.
#[derive(Clone, Debug)]
pub struct BoneRecord {
    pub name: String,
    pub parent: Option<String>,
    pub translation: Vector3<f32>,
    /// Need not be normalized; `Rig::build` normalizes it.
    pub rotation: Quaternion<f32>,
}

impl BoneRecord {
    pub fn new(name: &str, parent: Option<&str>) -> BoneRecord {
        BoneRecord {
            name: name.to_string(),
            parent: parent.map(|p| p.to_string()),
            translation: vec3(0.0, 0.0, 0.0),
            rotation: Quaternion::one(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Bone {
    pub name: String,
    pub parent: Option<BoneId>,
    pub rest_translation: Vector3<f32>,
    pub rest_rotation: Quaternion<f32>,
}

#[derive(Clone, Debug)]
pub struct Rig {
    bones: Vec<Bone>,
    by_name: HashMap<String, BoneId>,
    /// Every bone appears after its parent.
    order: Vec<BoneId>,
}

/// World-space rest transforms for every bone of a rig, indexed by `BoneId`.
#[derive(Clone, Debug)]
pub struct RestPose {
    pub world_rotations: Vec<Quaternion<f32>>,
    pub world_positions: Vec<Vector3<f32>>,
}

impl Rig {
    pub fn build(records: Vec<BoneRecord>) -> Result<Rig> {
        check!(records.len() < BoneId::max_value() as usize,
            "too many bones ({})", records.len())?;

        let mut by_name = HashMap::with_capacity(records.len());
        for (id, rec) in records.iter().enumerate() {
            check!(!rec.name.is_empty(), "bone {} has no name", id)?;
            let prev = by_name.insert(rec.name.clone(), id as BoneId);
            check!(prev.is_none(), "two bones are named {}", rec.name)?;
        }

        let mut bones = Vec::with_capacity(records.len());
        for rec in records {
            let parent = match rec.parent {
                None => None,
                Some(ref parent_name) => {
                    let parent = by_name.get(parent_name).cloned();
                    check!(parent.is_some(),
                        "bone {} has unknown parent {}", rec.name, parent_name)?;
                    check!(parent_name != &rec.name,
                        "bone {} is its own parent", rec.name)?;
                    parent
                }
            };

            let mag2 = rec.rotation.magnitude2();
            check!(mag2.is_finite() && mag2 > 0.0,
                "bone {} has a degenerate rest rotation", rec.name)?;

            bones.push(Bone {
                name: rec.name,
                parent,
                rest_translation: rec.translation,
                rest_rotation: rec.rotation.normalize(),
            });
        }

        let order = parents_first_order(&bones)?;

        Ok(Rig { bones, by_name, order })
    }

    pub fn num_bones(&self) -> usize {
        self.bones.len()
    }

    pub fn bone(&self, id: BoneId) -> &Bone {
        &self.bones[id as usize]
    }

    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    pub fn bone_ids(&self) -> std::ops::Range<BoneId> {
        0..self.bones.len() as BoneId
    }

    pub fn find(&self, name: &str) -> Option<BoneId> {
        self.by_name.get(name).cloned()
    }

    pub fn roots(&self) -> impl Iterator<Item=BoneId> + '_ {
        self.bone_ids().filter(move |&id| self.bones[id as usize].parent.is_none())
    }

    /// Walks the bones parents-first, composing local rest transforms into
    /// world ones.
    pub fn rest_pose(&self) -> RestPose {
        let n = self.bones.len();
        let mut world_rotations = vec![Quaternion::one(); n];
        let mut world_positions = vec![vec3(0.0, 0.0, 0.0); n];

        for &id in &self.order {
            let bone = &self.bones[id as usize];
            let (rot, pos) = match bone.parent {
                None => (bone.rest_rotation, bone.rest_translation),
                Some(p) => {
                    let parent_rot = world_rotations[p as usize];
                    let parent_pos = world_positions[p as usize];
                    (
                        parent_rot * bone.rest_rotation,
                        parent_pos + parent_rot.rotate_vector(bone.rest_translation),
                    )
                }
            };
            world_rotations[id as usize] = rot;
            world_positions[id as usize] = pos;
        }

        RestPose { world_rotations, world_positions }
    }
}

/// Orders the bones so every bone comes after its parent. Fails if the
/// parent links contain a cycle.
fn parents_first_order(bones: &[Bone]) -> Result<Vec<BoneId>> {
    let mut g: Graph<BoneId, ()> = Graph::with_capacity(bones.len(), bones.len());
    let nodes = (0..bones.len())
        .map(|id| g.add_node(id as BoneId))
        .collect::<Vec<_>>();
    for (id, bone) in bones.iter().enumerate() {
        if let Some(p) = bone.parent {
            g.add_edge(nodes[p as usize], nodes[id], ());
        }
    }

    match toposort(&g, None) {
        Ok(sorted) => Ok(sorted.into_iter().map(|nx| g[nx]).collect()),
        Err(cycle) => {
            let id = g[cycle.node_id()];
            bail!(crate::errors::ErrorKind::MalformedAsset(format!(
                "bone {} is part of a parent cycle", bones[id as usize].name,
            )))
        }
    }
}

#[cfg(test)]
fn approx_vec(a: Vector3<f32>, b: Vector3<f32>) -> bool {
    (a - b).magnitude() < 1e-5
}

#[test]
fn test_rest_pose_composes_down_the_chain() {
    use cgmath::{Deg, Rotation3};

    // Root turned 90° about Y, child offset one unit along local X.
    let mut root = BoneRecord::new("root", None);
    root.translation = vec3(0.0, 1.0, 0.0);
    root.rotation = Quaternion::from_angle_y(Deg(90.0));
    let mut child = BoneRecord::new("child", Some("root"));
    child.translation = vec3(1.0, 0.0, 0.0);

    let rig = Rig::build(vec![child, root]).unwrap();
    let pose = rig.rest_pose();

    let root_id = rig.find("root").unwrap();
    let child_id = rig.find("child").unwrap();
    assert_eq!(rig.bone(child_id).parent, Some(root_id));
    // +X rotated 90° about Y is -Z.
    assert!(approx_vec(pose.world_positions[child_id as usize], vec3(0.0, 1.0, -1.0)));
    assert_eq!(pose.world_rotations[child_id as usize], pose.world_rotations[root_id as usize]);
}

#[test]
fn test_build_rejects_bad_hierarchies() {
    let dup = vec![BoneRecord::new("a", None), BoneRecord::new("a", None)];
    assert!(Rig::build(dup).is_err());

    let unknown = vec![BoneRecord::new("a", Some("nope"))];
    assert!(Rig::build(unknown).is_err());

    let own = vec![BoneRecord::new("a", Some("a"))];
    assert!(Rig::build(own).is_err());

    let cycle = vec![
        BoneRecord::new("a", Some("b")),
        BoneRecord::new("b", Some("a")),
    ];
    assert!(Rig::build(cycle).is_err());

    let mut degenerate = BoneRecord::new("a", None);
    degenerate.rotation = Quaternion::new(0.0, 0.0, 0.0, 0.0);
    assert!(Rig::build(vec![degenerate]).is_err());
}

#[test]
fn test_roots() {
    let rig = Rig::build(vec![
        BoneRecord::new("a", None),
        BoneRecord::new("b", Some("a")),
        BoneRecord::new("c", None),
    ]).unwrap();
    assert_eq!(rig.roots().collect::<Vec<_>>(), vec![0, 2]);
}
