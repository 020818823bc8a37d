//! Per-bone rest bases for a retarget.
//!
//! A source clip stores each bone's rotation relative to that bone's own
//! bind pose on the source skeleton. To re-express it for the target rig we
//! need, for every mapped bone,
//!
//! ```text
//!     parent_rest_world   world rest rotation of the bone's parent
//!     rest_inverse        inverse of the bone's own world rest rotation
//! ```
//!
//! so that a keyframe q becomes `parent_rest_world * q * rest_inverse`.
//! Both are taken from the source asset's default pose, once, before any
//! keyframe is touched.

use cgmath::{InnerSpace, Quaternion};
use crate::avatar::Avatar;
use crate::rig::{BoneId, HumanoidBone, Rig};
use super::table::BoneCorrespondenceTable;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BoneBasis {
    pub rest_rotation_inverse: Quaternion<f32>,
    pub parent_rest_world_rotation: Quaternion<f32>,
}

/// Flat table of `BoneBasis`, indexed by source `BoneId`, plus the hips
/// scale.
#[derive(Clone, Debug)]
pub struct RestBases {
    bases: Vec<Option<BoneBasis>>,
    /// Target hips height / source hips height. `None` if either side has
    /// no usable hips.
    pub hips_scale: Option<f32>,
}

impl RestBases {
    pub fn compute(
        source: &Rig,
        avatar: &Avatar,
        table: &BoneCorrespondenceTable,
    ) -> RestBases {
        let pose = source.rest_pose();

        let bases = source.bone_ids().map(|id| {
            let bone = source.bone(id);
            table.lookup(&bone.name)?;
            let parent = match bone.parent {
                Some(p) => p,
                None => {
                    debug!("source bone {} has no parent; it won't be retargeted", bone.name);
                    return None;
                }
            };
            Some(BoneBasis {
                rest_rotation_inverse: inverse(pose.world_rotations[id as usize]),
                parent_rest_world_rotation: pose.world_rotations[parent as usize],
            })
        }).collect();

        let hips_scale = hips_scale(source, avatar, table);

        RestBases { bases, hips_scale }
    }

    pub fn basis(&self, bone: BoneId) -> Option<&BoneBasis> {
        self.bases.get(bone as usize).and_then(|b| b.as_ref())
    }

    pub fn num_bases(&self) -> usize {
        self.bases.iter().filter(|b| b.is_some()).count()
    }
}

fn inverse(q: Quaternion<f32>) -> Quaternion<f32> {
    q.conjugate() / q.magnitude2()
}

/// The source hips height is the hips' local rest translation, which is in
/// the same units as the clip's position keys. The target height is
/// measured in world space from the avatar's origin.
fn hips_scale(source: &Rig, avatar: &Avatar, table: &BoneCorrespondenceTable) -> Option<f32> {
    let source_hips = source.bone_ids()
        .find(|&id| table.lookup(&source.bone(id).name) == Some(HumanoidBone::Hips));
    let source_hips = match source_hips {
        Some(id) => id,
        None => {
            warn!("source rig has no hips bone; position tracks will be dropped");
            return None;
        }
    };
    let target_height = match avatar.hips_height() {
        Some(h) => h,
        None => {
            warn!("avatar {} has no hips bone; position tracks will be dropped", avatar.name);
            return None;
        }
    };

    let source_height = source.bone(source_hips).rest_translation.y;
    if source_height == 0.0 || !source_height.is_finite() {
        warn!("source hips rest height is {}; position tracks will be dropped", source_height);
        return None;
    }

    Some(target_height / source_height)
}

#[cfg(test)]
mod test_rigs {
    use cgmath::{Deg, Quaternion, Rotation3, vec3};
    use crate::avatar::{Avatar, RigConvention};
    use crate::rig::{BoneRecord, HumanoidBone, Rig};

    pub fn source() -> Rig {
        let mut armature = BoneRecord::new("Armature", None);
        armature.rotation = Quaternion::from_angle_x(Deg(90.0));
        let mut hips = BoneRecord::new("mixamorigHips", Some("Armature"));
        hips.translation = vec3(0.0, 100.0, 0.0);
        hips.rotation = Quaternion::from_angle_y(Deg(30.0));
        let mut spine = BoneRecord::new("mixamorigSpine", Some("mixamorigHips"));
        spine.translation = vec3(0.0, 10.0, 0.0);
        spine.rotation = Quaternion::from_angle_z(Deg(-15.0));
        let top = BoneRecord::new("mixamorigHeadTop_End", Some("mixamorigSpine"));
        Rig::build(vec![armature, hips, spine, top]).unwrap()
    }

    pub fn avatar(hips_y: f32) -> Avatar {
        let root = BoneRecord::new("Root", None);
        let mut hips = BoneRecord::new("J_Bip_C_Hips", Some("Root"));
        hips.translation = vec3(0.0, hips_y, 0.0);
        let spine = BoneRecord::new("J_Bip_C_Spine", Some("J_Bip_C_Hips"));
        let rig = Rig::build(vec![root, hips, spine]).unwrap();

        let mut avatar = Avatar::new("test", rig, RigConvention::NormalizedAxis);
        let hips = avatar.rig.find("J_Bip_C_Hips").unwrap();
        let spine = avatar.rig.find("J_Bip_C_Spine").unwrap();
        avatar.set_humanoid_bone(HumanoidBone::Hips, hips);
        avatar.set_humanoid_bone(HumanoidBone::Spine, spine);
        avatar
    }
}

#[cfg(test)]
pub use self::test_rigs::{avatar as test_avatar, source as test_source};

#[test]
fn test_bases_only_for_mapped_bones_with_parents() {
    let source = test_source();
    let bases = RestBases::compute(&source, &test_avatar(0.9), &BoneCorrespondenceTable::mixamo());

    assert!(bases.basis(source.find("Armature").unwrap()).is_none());
    assert!(bases.basis(source.find("mixamorigHeadTop_End").unwrap()).is_none());
    assert!(bases.basis(source.find("mixamorigHips").unwrap()).is_some());
    assert!(bases.basis(source.find("mixamorigSpine").unwrap()).is_some());
    assert_eq!(bases.num_bases(), 2);
}

#[test]
fn test_bases_come_from_world_rest_rotations() {
    let source = test_source();
    let pose = source.rest_pose();
    let bases = RestBases::compute(&source, &test_avatar(0.9), &BoneCorrespondenceTable::mixamo());

    let hips = source.find("mixamorigHips").unwrap();
    let spine = source.find("mixamorigSpine").unwrap();
    let basis = bases.basis(spine).unwrap();
    assert_eq!(basis.parent_rest_world_rotation, pose.world_rotations[hips as usize]);

    let should_be_one = pose.world_rotations[spine as usize] * basis.rest_rotation_inverse;
    assert!((should_be_one.s - 1.0).abs() < 1e-6);
    assert!(should_be_one.v.magnitude() < 1e-6);
}

#[test]
fn test_hips_scale() {
    let source = test_source();
    let table = BoneCorrespondenceTable::mixamo();

    let bases = RestBases::compute(&source, &test_avatar(0.9), &table);
    let scale = bases.hips_scale.unwrap();
    assert!((scale - 0.009).abs() < 1e-7);

    // An avatar with no hips mapping gives no scale, but bases still work.
    let mut no_hips = test_avatar(0.9);
    no_hips.clear_humanoid_bones();
    let bases = RestBases::compute(&source, &no_hips, &table);
    assert!(bases.hips_scale.is_none());
    assert_eq!(bases.num_bases(), 2);
}
