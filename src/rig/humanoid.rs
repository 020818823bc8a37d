//! The normalized humanoid bone vocabulary.
//!
//! Avatars expose their skeleton through these roles rather than through
//! their own node names, which differ from exporter to exporter.

macro_rules! def_humanoid_bones {
    ($($variant:ident => $name:expr,)*) => {
        #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum HumanoidBone {
            $($variant,)*
        }

        /// Every humanoid bone, in declaration order.
        pub static ALL_HUMANOID_BONES: &[HumanoidBone] = &[
            $(HumanoidBone::$variant,)*
        ];

        impl HumanoidBone {
            /// The canonical (camelCase) name of the role.
            pub fn name(self) -> &'static str {
                match self {
                    $(HumanoidBone::$variant => $name,)*
                }
            }
        }
    }
}

def_humanoid_bones! {
    Hips => "hips",
    Spine => "spine",
    Chest => "chest",
    UpperChest => "upperChest",
    Neck => "neck",
    Head => "head",
    LeftEye => "leftEye",
    RightEye => "rightEye",
    Jaw => "jaw",

    LeftUpperLeg => "leftUpperLeg",
    LeftLowerLeg => "leftLowerLeg",
    LeftFoot => "leftFoot",
    LeftToes => "leftToes",
    RightUpperLeg => "rightUpperLeg",
    RightLowerLeg => "rightLowerLeg",
    RightFoot => "rightFoot",
    RightToes => "rightToes",

    LeftShoulder => "leftShoulder",
    LeftUpperArm => "leftUpperArm",
    LeftLowerArm => "leftLowerArm",
    LeftHand => "leftHand",
    RightShoulder => "rightShoulder",
    RightUpperArm => "rightUpperArm",
    RightLowerArm => "rightLowerArm",
    RightHand => "rightHand",

    LeftThumbMetacarpal => "leftThumbMetacarpal",
    LeftThumbProximal => "leftThumbProximal",
    LeftThumbDistal => "leftThumbDistal",
    LeftIndexProximal => "leftIndexProximal",
    LeftIndexIntermediate => "leftIndexIntermediate",
    LeftIndexDistal => "leftIndexDistal",
    LeftMiddleProximal => "leftMiddleProximal",
    LeftMiddleIntermediate => "leftMiddleIntermediate",
    LeftMiddleDistal => "leftMiddleDistal",
    LeftRingProximal => "leftRingProximal",
    LeftRingIntermediate => "leftRingIntermediate",
    LeftRingDistal => "leftRingDistal",
    LeftLittleProximal => "leftLittleProximal",
    LeftLittleIntermediate => "leftLittleIntermediate",
    LeftLittleDistal => "leftLittleDistal",

    RightThumbMetacarpal => "rightThumbMetacarpal",
    RightThumbProximal => "rightThumbProximal",
    RightThumbDistal => "rightThumbDistal",
    RightIndexProximal => "rightIndexProximal",
    RightIndexIntermediate => "rightIndexIntermediate",
    RightIndexDistal => "rightIndexDistal",
    RightMiddleProximal => "rightMiddleProximal",
    RightMiddleIntermediate => "rightMiddleIntermediate",
    RightMiddleDistal => "rightMiddleDistal",
    RightRingProximal => "rightRingProximal",
    RightRingIntermediate => "rightRingIntermediate",
    RightRingDistal => "rightRingDistal",
    RightLittleProximal => "rightLittleProximal",
    RightLittleIntermediate => "rightLittleIntermediate",
    RightLittleDistal => "rightLittleDistal",
}

impl HumanoidBone {
    pub fn from_name(name: &str) -> Option<HumanoidBone> {
        ALL_HUMANOID_BONES.iter().cloned().find(|b| b.name() == name)
    }
}

impl std::fmt::Display for HumanoidBone {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[test]
fn test_names_round_trip_and_are_unique() {
    use std::collections::HashSet;

    let mut seen = HashSet::new();
    for &bone in ALL_HUMANOID_BONES {
        assert!(seen.insert(bone.name()), "duplicate name {}", bone.name());
        assert_eq!(HumanoidBone::from_name(bone.name()), Some(bone));
    }
    assert_eq!(HumanoidBone::from_name("Hips"), None);
    assert_eq!(HumanoidBone::from_name("tail"), None);
}
