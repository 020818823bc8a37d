use cgmath::{Quaternion, Vector3, vec3};
use crate::animation::{split_track_name, Clip, KeyframeTrack, PropertyKind, TrackValues};
use crate::avatar::{Avatar, RigConvention};
use crate::errors::{ErrorKind, Result, ResultExt};
use crate::rig::{BoneRecord, HumanoidBone, Rig};
use json::JsonValue;
use super::SourceAsset;

pub fn parse_source_asset(text: &str) -> Result<SourceAsset> {
    let root = json::parse(text)?;
    check!(root.is_object(), "top level of a motion asset must be an object")?;

    let rig = Rig::build(read_bones(&root["bones"])?)?;
    let clip = read_clip(&root["clip"])?;
    debug!("motion asset: {} bones, clip {:?} with {} tracks",
        rig.num_bones(), clip.name, clip.tracks.len());

    Ok(SourceAsset { rig, clip })
}

pub fn parse_avatar(text: &str) -> Result<Avatar> {
    let root = json::parse(text)?;
    check!(root.is_object(), "top level of an avatar must be an object")?;

    let name = root["name"].as_str().unwrap_or("avatar");
    let convention = read_convention(&root)?;
    let rig = Rig::build(read_bones(&root["bones"])?)
        .chain_err(|| format!("bad skeleton in avatar {}", name))?;

    let mut avatar = Avatar::new(name, rig, convention);
    if !root["origin"].is_null() {
        avatar.origin = read_vec3(&root["origin"])
            .chain_err(|| "bad avatar origin")?;
    }

    check!(root["humanoid"].is_object(), "avatar {} has no humanoid map", name)?;
    for (role, node) in root["humanoid"].entries() {
        let bone = match HumanoidBone::from_name(role) {
            Some(bone) => bone,
            None => {
                warn!("avatar {}: unknown humanoid bone {:?}, skipping", name, role);
                continue;
            }
        };
        let node_name = match node.as_str() {
            Some(s) => s,
            None => bail!(ErrorKind::MalformedAsset(format!(
                "humanoid bone {} must name a node", role,
            ))),
        };
        let id = match avatar.rig.find(node_name) {
            Some(id) => id,
            None => bail!(ErrorKind::MalformedAsset(format!(
                "humanoid bone {} refers to missing node {:?}", role, node_name,
            ))),
        };
        avatar.set_humanoid_bone(bone, id);
    }

    debug!("avatar {}: {} bones, {} humanoid, {} convention",
        avatar.name, avatar.rig.num_bones(), avatar.num_humanoid_bones(),
        avatar.convention.name());

    Ok(avatar)
}

/// An explicit "convention" wins over "metaVersion". Neither means the
/// normalized layout.
fn read_convention(root: &JsonValue) -> Result<RigConvention> {
    if let Some(name) = root["convention"].as_str() {
        return match RigConvention::from_name(name) {
            Some(c) => Ok(c),
            None => bail!(ErrorKind::MalformedAsset(format!(
                "unknown rig convention {:?}", name,
            ))),
        };
    }
    let meta = &root["metaVersion"];
    if let Some(version) = meta.as_str() {
        return Ok(RigConvention::from_meta_version(version));
    }
    if meta.is_number() {
        return Ok(RigConvention::from_meta_version(&meta.dump()));
    }
    Ok(RigConvention::NormalizedAxis)
}

fn read_bones(bones: &JsonValue) -> Result<Vec<BoneRecord>> {
    check!(bones.is_array(), "expected an array of bones")?;

    let mut records = Vec::with_capacity(bones.len());
    for (i, bone) in bones.members().enumerate() {
        let name = match bone["name"].as_str() {
            Some(s) => s,
            None => bail!(ErrorKind::MalformedAsset(format!("bone {} has no name", i))),
        };
        let mut record = BoneRecord::new(name, bone["parent"].as_str());
        if !bone["translation"].is_null() {
            record.translation = read_vec3(&bone["translation"])
                .chain_err(|| format!("bad translation on bone {}", name))?;
        }
        if !bone["rotation"].is_null() {
            record.rotation = read_quat(&bone["rotation"])
                .chain_err(|| format!("bad rotation on bone {}", name))?;
        }
        records.push(record);
    }
    Ok(records)
}

fn read_clip(clip: &JsonValue) -> Result<Clip> {
    check!(clip.is_object(), "motion asset has no clip")?;

    let name = clip["name"].as_str().unwrap_or("clip").to_string();

    let mut tracks = vec![];
    let mut max_time = 0.0f32;
    for track in clip["tracks"].members() {
        let track_name = match track["name"].as_str() {
            Some(s) => s,
            None => bail!(ErrorKind::MalformedAsset("track without a name".to_string())),
        };
        let (bone, property) = match split_track_name(track_name) {
            Some(x) => x,
            None => bail!(ErrorKind::MalformedAsset(format!(
                "track name {:?} is not bone.property", track_name,
            ))),
        };
        let kind = match PropertyKind::from_property(property) {
            Some(kind) => kind,
            None => {
                debug!("dropping track {}: unsupported property", track_name);
                continue;
            }
        };

        let times = read_floats(&track["times"])
            .chain_err(|| format!("bad times on track {}", track_name))?;
        let values = read_floats(&track["values"])
            .chain_err(|| format!("bad values on track {}", track_name))?;
        let track = KeyframeTrack::new(bone, times, TrackValues::new(kind, values))
            .chain_err(|| format!("bad track {}", track_name))?;

        if let Some(&t) = track.times().last() {
            max_time = max_time.max(t);
        }
        tracks.push(track);
    }

    let duration = match clip["duration"].as_f32() {
        Some(d) => {
            check!(d.is_finite() && d >= 0.0, "clip duration {} is invalid", d)?;
            d
        }
        None => max_time,
    };

    Ok(Clip { name, duration, tracks })
}

fn read_floats(v: &JsonValue) -> Result<Vec<f32>> {
    check!(v.is_array(), "expected an array of numbers")?;
    let mut out = Vec::with_capacity(v.len());
    for x in v.members() {
        match x.as_f32() {
            Some(f) => out.push(f),
            None => bail!(ErrorKind::MalformedAsset(format!("{} is not a number", x.dump()))),
        }
    }
    Ok(out)
}

fn read_vec3(v: &JsonValue) -> Result<Vector3<f32>> {
    let xs = read_floats(v)?;
    check!(xs.len() == 3, "expected 3 numbers, got {}", xs.len())?;
    Ok(vec3(xs[0], xs[1], xs[2]))
}

/// Quaternions are stored x, y, z, w.
fn read_quat(v: &JsonValue) -> Result<Quaternion<f32>> {
    let xs = read_floats(v)?;
    check!(xs.len() == 4, "expected 4 numbers, got {}", xs.len())?;
    Ok(Quaternion::new(xs[3], xs[0], xs[1], xs[2]))
}

#[cfg(test)]
const MOTION: &str = r#"{
    "bones": [
        { "name": "mixamorigHips", "translation": [0, 100, 0], "rotation": [0, 0, 0, 1] },
        { "name": "mixamorigSpine", "parent": "mixamorigHips", "translation": [0, 10, 0] }
    ],
    "clip": {
        "name": "Wave",
        "tracks": [
            { "name": "mixamorigHips.position", "times": [0, 0.5], "values": [0, 100, 0, 0, 101, 0] },
            { "name": "mixamorigSpine.quaternion", "times": [0], "values": [0, 0, 0, 1] },
            { "name": "mixamorigSpine.scale", "times": [0], "values": [1, 1, 1] }
        ]
    }
}"#;

#[test]
fn test_parse_motion() {
    let asset = parse_source_asset(MOTION).unwrap();
    assert_eq!(asset.rig.num_bones(), 2);
    assert_eq!(asset.clip.name, "Wave");
    // The scale track is dropped.
    assert_eq!(asset.clip.tracks.len(), 2);
    // No explicit duration: the last keyframe.
    assert_eq!(asset.clip.duration, 0.5);
}

#[test]
fn test_parse_avatar() {
    let avatar = parse_avatar(r#"{
        "name": "Alicia",
        "metaVersion": "0",
        "origin": [0, 0.1, 0],
        "bones": [
            { "name": "Root" },
            { "name": "J_Bip_C_Hips", "parent": "Root", "translation": [0, 1, 0] }
        ],
        "humanoid": { "hips": "J_Bip_C_Hips", "tail": "Root" }
    }"#).unwrap();
    assert_eq!(avatar.name, "Alicia");
    assert_eq!(avatar.convention, RigConvention::LegacyAxis);
    assert_eq!(avatar.num_humanoid_bones(), 1);
    assert_eq!(avatar.node_name(HumanoidBone::Hips), Some("J_Bip_C_Hips"));
    assert!((avatar.hips_height().unwrap() - 0.9).abs() < 1e-6);
}

#[test]
fn test_avatar_with_missing_node_is_malformed() {
    let res = parse_avatar(r#"{
        "bones": [{ "name": "Root" }],
        "humanoid": { "hips": "Nope" }
    }"#);
    match res {
        Err(e) => match e.kind() {
            ErrorKind::MalformedAsset(_) => (),
            k => panic!("wrong error: {:?}", k),
        },
        Ok(_) => panic!("loaded an avatar with a dangling humanoid bone"),
    }
}

#[test]
fn test_cyclic_skeleton_is_rejected() {
    let res = parse_source_asset(r#"{
        "bones": [
            { "name": "a", "parent": "b" },
            { "name": "b", "parent": "a" }
        ],
        "clip": { "name": "x", "tracks": [] }
    }"#);
    assert!(res.is_err());
}

#[test]
fn test_bad_track_name_is_rejected() {
    let res = parse_source_asset(r#"{
        "bones": [{ "name": "a" }],
        "clip": { "tracks": [{ "name": "quaternion", "times": [0], "values": [0, 0, 0, 1] }] }
    }"#);
    assert!(res.is_err());
}
