//! Serializes retargeted clips.
//!
//! The output has the same shape as the `clip` object of a motion asset,
//! except that tracks are addressed by avatar node and each also records the
//! humanoid bone it drives:
//!
//! ```text
//!     { "name", "duration", "tracks": [{ "name", "type", "humanoid", "times", "values" }] }
//! ```

use crate::errors::{Result, ResultExt};
use crate::retarget::RetargetedClip;
use json::JsonValue;
use std::path::Path;

pub fn clip_to_json(clip: &RetargetedClip) -> JsonValue {
    let tracks = clip.tracks.iter().map(|track| {
        let mut o = JsonValue::new_object();
        o["name"] = track.path().into();
        o["type"] = track.kind().property().into();
        o["humanoid"] = track.target.name().into();
        o["times"] = track.times.clone().into();
        o["values"] = track.values.as_slice().to_vec().into();
        o
    }).collect::<Vec<JsonValue>>();

    let mut o = JsonValue::new_object();
    o["name"] = clip.name.as_str().into();
    o["duration"] = clip.duration.into();
    o["tracks"] = tracks.into();
    o
}

pub fn write_clip(clip: &RetargetedClip, path: &Path) -> Result<()> {
    let s = json::stringify_pretty(clip_to_json(clip), 2);
    std::fs::write(path, s)
        .chain_err(|| format!("couldn't write {}", path.display()))?;
    info!("wrote {} ({} tracks)", path.display(), clip.tracks.len());
    Ok(())
}

#[test]
fn test_clip_json_layout() {
    use crate::animation::TrackValues;
    use crate::retarget::RetargetedTrack;
    use crate::rig::HumanoidBone;

    let clip = RetargetedClip {
        name: "Wave.retargeted".to_string(),
        duration: 1.5,
        tracks: vec![RetargetedTrack {
            target: HumanoidBone::Spine,
            node: "J_Bip_C_Spine".to_string(),
            times: vec![0.0, 1.5],
            values: TrackValues::Rotation(vec![0.0, 0.0, 0.0, 1.0, 0.0, 1.0, 0.0, 0.0]),
        }],
    };
    let j = clip_to_json(&clip);
    assert_eq!(j["name"], "Wave.retargeted");
    assert_eq!(j["duration"].as_f32(), Some(1.5));
    let t = &j["tracks"][0];
    assert_eq!(t["name"], "J_Bip_C_Spine.quaternion");
    assert_eq!(t["type"], "quaternion");
    assert_eq!(t["humanoid"], "spine");
    assert_eq!(t["times"].len(), 2);
    assert_eq!(t["values"].len(), 8);
    assert_eq!(t["values"][5].as_f32(), Some(1.0));
}
