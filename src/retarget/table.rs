//! Which source-rig bone drives which humanoid bone.

use crate::rig::HumanoidBone;
use crate::rig::HumanoidBone::*;

/// A fixed, partial mapping from source bone names to humanoid bones.
///
/// Plenty of source bones have no humanoid counterpart (end sites, twist
/// helpers, the armature root); `lookup` returns `None` for them and they
/// are simply not retargeted.
#[derive(Copy, Clone)]
pub struct BoneCorrespondenceTable {
    entries: &'static [(&'static str, HumanoidBone)],
}

impl BoneCorrespondenceTable {
    /// The table for Mixamo rigs.
    pub fn mixamo() -> BoneCorrespondenceTable {
        BoneCorrespondenceTable { entries: MIXAMO }
    }

    pub fn lookup(&self, source_bone: &str) -> Option<HumanoidBone> {
        // FBX exports write the namespace as "mixamorig:Hips"; most loaders
        // strip the colon.
        let found = self.entries.iter().find(|&&(name, _)| name == source_bone);
        let found = match found {
            Some(_) => found,
            None if source_bone.contains(':') => {
                let stripped = source_bone.replacen(':', "", 1);
                self.entries.iter().find(|&&(name, _)| name == stripped)
            }
            None => None,
        };
        found.map(|&(_, bone)| bone)
    }

    /// The humanoid bones this table can produce.
    pub fn humanoid_bones(&self) -> impl Iterator<Item=HumanoidBone> {
        self.entries.iter().map(|&(_, bone)| bone)
    }

    /// The source bone that maps to `bone`, if any.
    pub fn source_for(&self, bone: HumanoidBone) -> Option<&'static str> {
        self.entries.iter().find(|&&(_, b)| b == bone).map(|&(name, _)| name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

static MIXAMO: &[(&str, HumanoidBone)] = &[
    ("mixamorigHips", Hips),
    ("mixamorigSpine", Spine),
    ("mixamorigSpine1", Chest),
    ("mixamorigSpine2", UpperChest),
    ("mixamorigNeck", Neck),
    ("mixamorigHead", Head),

    ("mixamorigLeftShoulder", LeftShoulder),
    ("mixamorigLeftArm", LeftUpperArm),
    ("mixamorigLeftForeArm", LeftLowerArm),
    ("mixamorigLeftHand", LeftHand),
    ("mixamorigLeftHandThumb1", LeftThumbMetacarpal),
    ("mixamorigLeftHandThumb2", LeftThumbProximal),
    ("mixamorigLeftHandThumb3", LeftThumbDistal),
    ("mixamorigLeftHandIndex1", LeftIndexProximal),
    ("mixamorigLeftHandIndex2", LeftIndexIntermediate),
    ("mixamorigLeftHandIndex3", LeftIndexDistal),
    ("mixamorigLeftHandMiddle1", LeftMiddleProximal),
    ("mixamorigLeftHandMiddle2", LeftMiddleIntermediate),
    ("mixamorigLeftHandMiddle3", LeftMiddleDistal),
    ("mixamorigLeftHandRing1", LeftRingProximal),
    ("mixamorigLeftHandRing2", LeftRingIntermediate),
    ("mixamorigLeftHandRing3", LeftRingDistal),
    ("mixamorigLeftHandPinky1", LeftLittleProximal),
    ("mixamorigLeftHandPinky2", LeftLittleIntermediate),
    ("mixamorigLeftHandPinky3", LeftLittleDistal),

    ("mixamorigRightShoulder", RightShoulder),
    ("mixamorigRightArm", RightUpperArm),
    ("mixamorigRightForeArm", RightLowerArm),
    ("mixamorigRightHand", RightHand),
    ("mixamorigRightHandThumb1", RightThumbMetacarpal),
    ("mixamorigRightHandThumb2", RightThumbProximal),
    ("mixamorigRightHandThumb3", RightThumbDistal),
    ("mixamorigRightHandIndex1", RightIndexProximal),
    ("mixamorigRightHandIndex2", RightIndexIntermediate),
    ("mixamorigRightHandIndex3", RightIndexDistal),
    ("mixamorigRightHandMiddle1", RightMiddleProximal),
    ("mixamorigRightHandMiddle2", RightMiddleIntermediate),
    ("mixamorigRightHandMiddle3", RightMiddleDistal),
    ("mixamorigRightHandRing1", RightRingProximal),
    ("mixamorigRightHandRing2", RightRingIntermediate),
    ("mixamorigRightHandRing3", RightRingDistal),
    ("mixamorigRightHandPinky1", RightLittleProximal),
    ("mixamorigRightHandPinky2", RightLittleIntermediate),
    ("mixamorigRightHandPinky3", RightLittleDistal),

    ("mixamorigLeftUpLeg", LeftUpperLeg),
    ("mixamorigLeftLeg", LeftLowerLeg),
    ("mixamorigLeftFoot", LeftFoot),
    ("mixamorigLeftToeBase", LeftToes),
    ("mixamorigRightUpLeg", RightUpperLeg),
    ("mixamorigRightLeg", RightLowerLeg),
    ("mixamorigRightFoot", RightFoot),
    ("mixamorigRightToeBase", RightToes),
];

#[test]
fn test_lookup() {
    let table = BoneCorrespondenceTable::mixamo();
    assert_eq!(table.len(), 52);
    assert_eq!(table.lookup("mixamorigHips"), Some(Hips));
    assert_eq!(table.lookup("mixamorig:LeftForeArm"), Some(LeftLowerArm));
    assert_eq!(table.lookup("mixamorigHeadTop_End"), None);
    assert_eq!(table.lookup("mixamorigLeftHandThumb4"), None);
    assert_eq!(table.lookup(""), None);
    assert_eq!(table.source_for(Hips), Some("mixamorigHips"));
    assert_eq!(table.source_for(Jaw), None);
}

#[test]
fn test_each_humanoid_bone_mapped_once() {
    use std::collections::HashSet;
    let table = BoneCorrespondenceTable::mixamo();
    let image = table.humanoid_bones().collect::<HashSet<_>>();
    assert_eq!(image.len(), table.len());
}
