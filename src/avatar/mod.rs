//! The target avatar: its rig, its humanoid bone map, and the runtime state
//! motion and speech write into.

pub mod classify;
pub mod runtime;

use cgmath::{Vector3, vec3};
use crate::retarget::RetargetedClip;
use crate::rig::{BoneId, HumanoidBone, Rig};
use std::collections::{BTreeMap, HashMap};

pub use self::classify::{Classification, Classifier};
pub use self::runtime::AvatarRuntime;

/// Forward-axis convention of the avatar's normalized rig.
///
/// The first generation of the format faces the other way along Z, which
/// shows up as a sign flip of the X and Z components of every retargeted
/// rotation and translation.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RigConvention {
    LegacyAxis,
    NormalizedAxis,
}

impl RigConvention {
    /// Infers the convention from a `metaVersion` tag. Only version "0" is
    /// the legacy layout.
    pub fn from_meta_version(version: &str) -> RigConvention {
        match version.trim() {
            "0" => RigConvention::LegacyAxis,
            _ => RigConvention::NormalizedAxis,
        }
    }

    pub fn from_name(name: &str) -> Option<RigConvention> {
        match name {
            "legacy" => Some(RigConvention::LegacyAxis),
            "normalized" => Some(RigConvention::NormalizedAxis),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            RigConvention::LegacyAxis => "legacy",
            RigConvention::NormalizedAxis => "normalized",
        }
    }
}

/// A loaded avatar, in its unanimated pose.
pub struct Avatar {
    pub name: String,
    pub rig: Rig,
    pub convention: RigConvention,
    /// World position of the avatar's scene root.
    pub origin: Vector3<f32>,
    humanoid: HashMap<HumanoidBone, BoneId>,
}

impl Avatar {
    pub fn new(name: &str, rig: Rig, convention: RigConvention) -> Avatar {
        Avatar {
            name: name.to_string(),
            rig,
            convention,
            origin: vec3(0.0, 0.0, 0.0),
            humanoid: HashMap::new(),
        }
    }

    pub fn set_humanoid_bone(&mut self, bone: HumanoidBone, id: BoneId) {
        self.humanoid.insert(bone, id);
    }

    pub fn clear_humanoid_bones(&mut self) {
        self.humanoid.clear();
    }

    pub fn humanoid_bone(&self, bone: HumanoidBone) -> Option<BoneId> {
        self.humanoid.get(&bone).cloned()
    }

    /// The name of the node that plays the given humanoid role.
    pub fn node_name(&self, bone: HumanoidBone) -> Option<&str> {
        self.humanoid_bone(bone).map(|id| &self.rig.bone(id).name[..])
    }

    pub fn num_humanoid_bones(&self) -> usize {
        self.humanoid.len()
    }

    /// Height of the hips above the avatar's origin in the current pose.
    pub fn hips_height(&self) -> Option<f32> {
        let hips = self.humanoid_bone(HumanoidBone::Hips)?;
        let pose = self.rig.rest_pose();
        Some((pose.world_positions[hips as usize].y - self.origin.y).abs())
    }
}

/// Retargeted clips available to an avatar, by name.
#[derive(Default)]
pub struct MotionLibrary {
    clips: BTreeMap<String, RetargetedClip>,
}

impl MotionLibrary {
    pub fn new() -> MotionLibrary {
        Default::default()
    }

    /// Adds a clip. A clip with the same name is replaced and returned.
    pub fn insert(&mut self, name: &str, clip: RetargetedClip) -> Option<RetargetedClip> {
        self.clips.insert(name.to_string(), clip)
    }

    pub fn get(&self, name: &str) -> Option<&RetargetedClip> {
        self.clips.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.clips.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item=&str> {
        self.clips.keys().map(|s| &s[..])
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }
}

#[test]
fn test_convention_from_meta_version() {
    assert_eq!(RigConvention::from_meta_version("0"), RigConvention::LegacyAxis);
    assert_eq!(RigConvention::from_meta_version("1"), RigConvention::NormalizedAxis);
    assert_eq!(RigConvention::from_meta_version(""), RigConvention::NormalizedAxis);
    assert_eq!(RigConvention::from_name("legacy"), Some(RigConvention::LegacyAxis));
    assert_eq!(RigConvention::from_name("sideways"), None);
}

#[test]
fn test_hips_height_is_relative_to_origin() {
    use crate::rig::BoneRecord;

    let mut root = BoneRecord::new("Root", None);
    root.translation = vec3(0.0, 0.25, 0.0);
    let mut hips = BoneRecord::new("J_Hips", Some("Root"));
    hips.translation = vec3(0.0, 0.75, 0.0);
    let rig = Rig::build(vec![root, hips]).unwrap();

    let mut avatar = Avatar::new("test", rig, RigConvention::NormalizedAxis);
    assert_eq!(avatar.hips_height(), None);

    let hips_id = avatar.rig.find("J_Hips").unwrap();
    avatar.set_humanoid_bone(HumanoidBone::Hips, hips_id);
    avatar.origin = vec3(0.0, 0.5, 0.0);
    assert_eq!(avatar.hips_height(), Some(0.5));
    assert_eq!(avatar.node_name(HumanoidBone::Hips), Some("J_Hips"));
}
