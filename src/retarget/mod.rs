//! Retargeting source clips onto an avatar's humanoid rig.
//!
//! For every source track:
//!
//! 1. split the track name into bone and property,
//! 2. map the bone through the correspondence table to a humanoid bone,
//! 3. find the avatar node playing that humanoid role,
//! 4. find the bone's rest basis (see `rest_pose`),
//! 5. transform the values,
//! 6. emit the track under the avatar node's name.
//!
//! A track that fails any of 2-4 is dropped. That is the normal outcome for
//! auxiliary bones, so it is not an error.

pub mod rest_pose;
pub mod table;

use cgmath::Quaternion;
use crate::animation::{Clip, PropertyKind, TrackValues};
#[cfg(test)]
use crate::animation::KeyframeTrack;
use crate::avatar::{Avatar, RigConvention};
use crate::rig::{HumanoidBone, Rig};

pub use self::rest_pose::{BoneBasis, RestBases};
pub use self::table::BoneCorrespondenceTable;

/// A track of a retargeted clip.
#[derive(Clone, Debug, PartialEq)]
pub struct RetargetedTrack {
    /// The humanoid bone this track drives.
    pub target: HumanoidBone,
    /// The avatar node standing in for `target`.
    pub node: String,
    pub times: Vec<f32>,
    pub values: TrackValues,
}

impl RetargetedTrack {
    pub fn kind(&self) -> PropertyKind {
        self.values.kind()
    }

    /// The `<node>.<property>` name the host's animation system addresses.
    pub fn path(&self) -> String {
        format!("{}.{}", self.node, self.kind().property())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RetargetedClip {
    pub name: String,
    pub duration: f32,
    pub tracks: Vec<RetargetedTrack>,
}

/// Why tracks were left out of a retargeted clip.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct DropCounts {
    pub unmapped: usize,
    pub no_avatar_node: usize,
    pub no_rest_basis: usize,
    pub no_hips_scale: usize,
}

impl DropCounts {
    pub fn total(&self) -> usize {
        self.unmapped + self.no_avatar_node + self.no_rest_basis + self.no_hips_scale
    }
}

/// Retargets `clip`, recorded on `source`, using the Mixamo table.
pub fn retarget(clip: &Clip, source: &Rig, avatar: &Avatar) -> RetargetedClip {
    retarget_with(&BoneCorrespondenceTable::mixamo(), clip, source, avatar).0
}

pub fn retarget_with(
    table: &BoneCorrespondenceTable,
    clip: &Clip,
    source: &Rig,
    avatar: &Avatar,
) -> (RetargetedClip, DropCounts) {
    let bases = RestBases::compute(source, avatar, table);
    let legacy = avatar.convention == RigConvention::LegacyAxis;

    let mut dropped = DropCounts::default();
    let mut tracks = Vec::with_capacity(clip.tracks.len());

    for track in &clip.tracks {
        let target = match table.lookup(track.bone()) {
            Some(b) => b,
            None => {
                trace!("dropping {}: no humanoid bone", track.path());
                dropped.unmapped += 1;
                continue;
            }
        };
        let node = match avatar.node_name(target) {
            Some(n) => n,
            None => {
                debug!("dropping {}: avatar has no {} bone", track.path(), target);
                dropped.no_avatar_node += 1;
                continue;
            }
        };
        let basis = match source.find(track.bone()).and_then(|id| bases.basis(id)) {
            Some(b) => b,
            None => {
                debug!("dropping {}: no rest pose for the source bone", track.path());
                dropped.no_rest_basis += 1;
                continue;
            }
        };

        let values = match *track.values() {
            TrackValues::Rotation(ref v) =>
                TrackValues::Rotation(retarget_rotations(v, basis, legacy)),
            TrackValues::Position(ref v) => match bases.hips_scale {
                Some(scale) => TrackValues::Position(retarget_positions(v, scale, legacy)),
                None => {
                    dropped.no_hips_scale += 1;
                    continue;
                }
            },
        };

        tracks.push(RetargetedTrack {
            target,
            node: node.to_string(),
            times: track.times().to_vec(),
            values,
        });
    }

    debug!("retargeted {}: kept {} tracks, dropped {}",
        clip.name, tracks.len(), dropped.total());

    let clip = RetargetedClip {
        name: format!("{}.retargeted", clip.name),
        duration: clip.duration,
        tracks,
    };
    (clip, dropped)
}

/// `parent_rest_world * q * rest_inverse` for every quaternion. The legacy
/// convention additionally negates x and z.
fn retarget_rotations(values: &[f32], basis: &BoneBasis, legacy: bool) -> Vec<f32> {
    let mut out = Vec::with_capacity(values.len());
    for q in values.chunks(4) {
        let q = Quaternion::new(q[3], q[0], q[1], q[2]);
        let r = basis.parent_rest_world_rotation * q * basis.rest_rotation_inverse;
        let (x, y, z, w) = (r.v.x, r.v.y, r.v.z, r.s);
        if legacy {
            out.extend_from_slice(&[-x, y, -z, w]);
        } else {
            out.extend_from_slice(&[x, y, z, w]);
        }
    }
    out
}

fn retarget_positions(values: &[f32], hips_scale: f32, legacy: bool) -> Vec<f32> {
    let mut out = Vec::with_capacity(values.len());
    for p in values.chunks(3) {
        let (x, y, z) = if legacy { (-p[0], p[1], -p[2]) } else { (p[0], p[1], p[2]) };
        out.extend_from_slice(&[x * hips_scale, y * hips_scale, z * hips_scale]);
    }
    out
}

#[cfg(test)]
fn track(bone: &str, kind: PropertyKind, times: Vec<f32>, values: Vec<f32>)
    -> crate::errors::Result<KeyframeTrack>
{
    KeyframeTrack::new(bone, times, TrackValues::new(kind, values))
}

#[cfg(test)]
use self::rest_pose::{test_avatar, test_source};

#[cfg(test)]
fn test_clip() -> Clip {
    use std::f32::consts::FRAC_1_SQRT_2 as H;
    Clip {
        name: "Wave".to_string(),
        duration: 1.5,
        tracks: vec![
            track("mixamorigHips", PropertyKind::Position, vec![0.0, 1.0],
                vec![1.0, 100.0, 2.0, -3.0, 98.0, 4.0]).unwrap(),
            track("mixamorigHips", PropertyKind::Rotation, vec![0.0, 1.0],
                vec![0.0, 0.0, 0.0, 1.0, 0.0, H, 0.0, H]).unwrap(),
            track("mixamorigSpine", PropertyKind::Rotation, vec![0.0],
                vec![0.1, 0.2, 0.3, 0.9]).unwrap(),
            track("mixamorigHeadTop_End", PropertyKind::Rotation, vec![0.0],
                vec![0.0, 0.0, 0.0, 1.0]).unwrap(),
            track("Armature", PropertyKind::Rotation, vec![0.0],
                vec![0.0, 0.0, 0.0, 1.0]).unwrap(),
        ],
    }
}

#[cfg(test)]
fn quat_at(values: &[f32], i: usize) -> Quaternion<f32> {
    Quaternion::new(values[4*i + 3], values[4*i], values[4*i + 1], values[4*i + 2])
}

#[test]
fn test_only_mapped_bones_come_out() {
    let table = BoneCorrespondenceTable::mixamo();
    let (out, dropped) = retarget_with(&table, &test_clip(), &test_source(), &test_avatar(0.9));

    assert_eq!(out.tracks.len(), 3);
    assert_eq!(dropped.unmapped, 2);
    for t in &out.tracks {
        assert!(table.humanoid_bones().any(|b| b == t.target));
    }
    let paths = out.tracks.iter().map(|t| t.path()).collect::<Vec<_>>();
    assert_eq!(paths, vec![
        "J_Bip_C_Hips.position",
        "J_Bip_C_Hips.quaternion",
        "J_Bip_C_Spine.quaternion",
    ]);
    assert_eq!(out.name, "Wave.retargeted");
    assert_eq!(out.duration, 1.5);
}

#[test]
fn test_rest_rotation_maps_to_parent_rest_rotation() {
    let source = test_source();
    let pose = source.rest_pose();
    let spine = source.find("mixamorigSpine").unwrap();
    let hips = source.find("mixamorigHips").unwrap();

    // Key the spine at exactly its world rest rotation.
    let rest = pose.world_rotations[spine as usize];
    let clip = Clip {
        name: "Rest".to_string(),
        duration: 0.0,
        tracks: vec![track("mixamorigSpine", PropertyKind::Rotation, vec![0.0],
            vec![rest.v.x, rest.v.y, rest.v.z, rest.s]).unwrap()],
    };

    let out = retarget(&clip, &source, &test_avatar(0.9));
    let q = quat_at(out.tracks[0].values.as_slice(), 0);
    let parent = pose.world_rotations[hips as usize];
    assert!((q.s - parent.s).abs() < 1e-5);
    assert!((q.v.x - parent.v.x).abs() < 1e-5);
    assert!((q.v.y - parent.v.y).abs() < 1e-5);
    assert!((q.v.z - parent.v.z).abs() < 1e-5);
}

#[test]
fn test_rotation_norm_is_preserved() {
    use cgmath::InnerSpace;

    let clip = test_clip();
    let out = retarget(&clip, &test_source(), &test_avatar(0.9));
    let inputs = clip.tracks.iter()
        .filter(|t| t.bone() != "mixamorigHeadTop_End" && t.bone() != "Armature")
        .filter(|t| t.kind() == PropertyKind::Rotation);
    let outputs = out.tracks.iter().filter(|t| t.kind() == PropertyKind::Rotation);

    for (i, o) in inputs.zip(outputs) {
        for k in 0..i.num_keyframes() {
            let a = quat_at(i.values().as_slice(), k).magnitude();
            let b = quat_at(o.values.as_slice(), k).magnitude();
            assert!((a - b).abs() < 1e-5, "{} vs {}", a, b);
        }
    }
}

#[test]
fn test_positions_scale_with_hips_height() {
    let clip = test_clip();
    let source = test_source();

    let a = retarget(&clip, &source, &test_avatar(0.9));
    let b = retarget(&clip, &source, &test_avatar(1.8));
    let pa = a.tracks[0].values.as_slice();
    let pb = b.tracks[0].values.as_slice();
    assert_eq!(pa.len(), 6);
    for (x, y) in pa.iter().zip(pb) {
        assert!((2.0 * x - y).abs() < 1e-5);
    }
    assert!((pa[1] - 0.9).abs() < 1e-5);
}

/// `source` with the hips bone's rest height multiplied by `k`.
#[cfg(test)]
fn with_scaled_hips(source: &Rig, k: f32) -> Rig {
    use crate::rig::BoneRecord;

    let records = source.bones().iter().map(|bone| {
        let parent = bone.parent.map(|p| &source.bone(p).name[..]);
        let mut rec = BoneRecord::new(&bone.name, parent);
        rec.translation = bone.rest_translation;
        rec.rotation = bone.rest_rotation;
        if bone.name == "mixamorigHips" {
            rec.translation.y *= k;
        }
        rec
    }).collect();
    Rig::build(records).unwrap()
}

#[test]
fn test_positions_scale_inversely_with_source_hips_height() {
    let clip = test_clip();
    let source = test_source();
    let taller = with_scaled_hips(&source, 4.0);
    assert_eq!(taller.bone(taller.find("mixamorigHips").unwrap()).rest_translation.y, 400.0);

    let a = retarget(&clip, &source, &test_avatar(0.9));
    let b = retarget(&clip, &taller, &test_avatar(0.9));
    assert_eq!(a.tracks[0].kind(), PropertyKind::Position);
    let pa = a.tracks[0].values.as_slice();
    let pb = b.tracks[0].values.as_slice();
    assert_eq!(pa.len(), pb.len());
    for (x, y) in pa.iter().zip(pb) {
        assert!((x / 4.0 - y).abs() < 1e-6, "{} vs {}", x, y);
    }

    // Rotations don't depend on the hips height.
    let (ra, rb) = (a.tracks[1].values.as_slice(), b.tracks[1].values.as_slice());
    assert_eq!(a.tracks[1].kind(), PropertyKind::Rotation);
    for (x, y) in ra.iter().zip(rb) {
        assert!((x - y).abs() < 1e-6);
    }
}

#[test]
fn test_legacy_axis_flips_x_and_z() {
    let clip = test_clip();
    let source = test_source();
    let normal = retarget(&clip, &source, &test_avatar(0.9));
    let mut legacy_avatar = test_avatar(0.9);
    legacy_avatar.convention = RigConvention::LegacyAxis;
    let legacy = retarget(&clip, &source, &legacy_avatar);

    for (n, l) in normal.tracks.iter().zip(&legacy.tracks) {
        let stride = n.kind().stride();
        for (i, (a, b)) in n.values.as_slice().iter().zip(l.values.as_slice()).enumerate() {
            let flipped = i % stride == 0 || i % stride == 2;
            if flipped {
                assert_eq!(*a, -*b);
            } else {
                assert_eq!(*a, *b);
            }
        }
    }
}

#[test]
fn test_retarget_is_deterministic() {
    let clip = test_clip();
    let source = test_source();
    let avatar = test_avatar(0.9);
    let a = retarget(&clip, &source, &avatar);
    let b = retarget(&clip, &source, &avatar);
    assert_eq!(a, b);
    for (x, y) in a.tracks.iter().zip(&b.tracks) {
        let xs = x.values.as_slice().iter().map(|v| v.to_bits()).collect::<Vec<_>>();
        let ys = y.values.as_slice().iter().map(|v| v.to_bits()).collect::<Vec<_>>();
        assert_eq!(xs, ys);
    }
}

#[test]
fn test_missing_avatar_bone_drops_its_tracks() {
    let mut avatar = test_avatar(0.9);
    let spine = avatar.rig.find("J_Bip_C_Spine").unwrap();
    avatar.clear_humanoid_bones();
    avatar.set_humanoid_bone(HumanoidBone::Spine, spine);

    let table = BoneCorrespondenceTable::mixamo();
    let (out, dropped) = retarget_with(&table, &test_clip(), &test_source(), &avatar);
    // Hips tracks have no avatar node at all now.
    assert_eq!(dropped.no_avatar_node, 2);
    assert_eq!(out.tracks.len(), 1);
    assert_eq!(out.tracks[0].target, HumanoidBone::Spine);
}
