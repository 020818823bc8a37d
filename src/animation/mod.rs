//! Keyframe clips.
//!
//! A clip is a set of tracks, each driving one property of one bone. Track
//! values are kept flat, the way animation clip files store them: a
//! rotation track holds four floats (x, y, z, w) per keyframe, a position
//! track three (x, y, z).

pub mod crossfade;

use crate::errors::Result;

pub use self::crossfade::{ActionState, AnimationSlot, CrossfadeController, Transition, DEFAULT_FADE_DURATION};

pub const ROTATION_PROPERTY: &str = "quaternion";
pub const POSITION_PROPERTY: &str = "position";

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PropertyKind {
    Rotation,
    Position,
}

impl PropertyKind {
    pub fn from_property(property: &str) -> Option<PropertyKind> {
        match property {
            ROTATION_PROPERTY => Some(PropertyKind::Rotation),
            POSITION_PROPERTY => Some(PropertyKind::Position),
            _ => None,
        }
    }

    pub fn property(self) -> &'static str {
        match self {
            PropertyKind::Rotation => ROTATION_PROPERTY,
            PropertyKind::Position => POSITION_PROPERTY,
        }
    }

    /// Number of floats per keyframe.
    pub fn stride(self) -> usize {
        match self {
            PropertyKind::Rotation => 4,
            PropertyKind::Position => 3,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum TrackValues {
    Rotation(Vec<f32>),
    Position(Vec<f32>),
}

impl TrackValues {
    pub fn new(kind: PropertyKind, values: Vec<f32>) -> TrackValues {
        match kind {
            PropertyKind::Rotation => TrackValues::Rotation(values),
            PropertyKind::Position => TrackValues::Position(values),
        }
    }

    pub fn kind(&self) -> PropertyKind {
        match *self {
            TrackValues::Rotation(_) => PropertyKind::Rotation,
            TrackValues::Position(_) => PropertyKind::Position,
        }
    }

    pub fn as_slice(&self) -> &[f32] {
        match *self {
            TrackValues::Rotation(ref v) | TrackValues::Position(ref v) => v,
        }
    }
}

/// One bone property over time.
///
/// The value count always matches the keyframe count (see `new`).
#[derive(Clone, Debug, PartialEq)]
pub struct KeyframeTrack {
    bone: String,
    times: Vec<f32>,
    values: TrackValues,
}

impl KeyframeTrack {
    pub fn new(bone: &str, times: Vec<f32>, values: TrackValues) -> Result<KeyframeTrack> {
        let stride = values.kind().stride();
        check!(values.as_slice().len() == stride * times.len(),
            "track {}.{} has {} values for {} keyframes (expected {} per key)",
            bone, values.kind().property(), values.as_slice().len(), times.len(), stride)?;
        check!(times.iter().all(|t| t.is_finite()),
            "track {}.{} has a non-finite keyframe time", bone, values.kind().property())?;
        check!(times.windows(2).all(|w| w[0] <= w[1]),
            "track {}.{} has keyframe times out of order", bone, values.kind().property())?;

        Ok(KeyframeTrack { bone: bone.to_string(), times, values })
    }

    pub fn bone(&self) -> &str {
        &self.bone
    }

    pub fn times(&self) -> &[f32] {
        &self.times
    }

    pub fn values(&self) -> &TrackValues {
        &self.values
    }

    pub fn kind(&self) -> PropertyKind {
        self.values.kind()
    }

    pub fn num_keyframes(&self) -> usize {
        self.times.len()
    }

    /// The `<bone>.<property>` name of the track.
    pub fn path(&self) -> String {
        format!("{}.{}", self.bone, self.kind().property())
    }
}

/// Splits a `<bone>.<property>` track name. Bone names may themselves
/// contain dots, so the split is at the last one.
pub fn split_track_name(name: &str) -> Option<(&str, &str)> {
    let i = name.rfind('.')?;
    let (bone, property) = (&name[..i], &name[i+1..]);
    if bone.is_empty() || property.is_empty() {
        return None;
    }
    Some((bone, property))
}

/// A skeletal animation clip as read from a source asset.
#[derive(Clone, Debug)]
pub struct Clip {
    pub name: String,
    /// In seconds.
    pub duration: f32,
    pub tracks: Vec<KeyframeTrack>,
}

#[test]
fn test_track_value_counts_are_checked() {
    let ok = KeyframeTrack::new(
        "hips",
        vec![0.0, 1.0],
        TrackValues::Rotation(vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0]),
    );
    assert!(ok.is_ok());

    let short = KeyframeTrack::new(
        "hips",
        vec![0.0, 1.0],
        TrackValues::Position(vec![0.0, 0.0, 0.0, 1.0]),
    );
    assert!(short.is_err());

    let backwards = KeyframeTrack::new(
        "hips",
        vec![1.0, 0.0],
        TrackValues::Position(vec![0.0; 6]),
    );
    assert!(backwards.is_err());
}

#[test]
fn test_split_track_name() {
    assert_eq!(split_track_name("mixamorigHips.position"), Some(("mixamorigHips", "position")));
    assert_eq!(split_track_name("Armature.001.quaternion"), Some(("Armature.001", "quaternion")));
    assert_eq!(split_track_name("nodot"), None);
    assert_eq!(split_track_name(".position"), None);
    assert_eq!(split_track_name("hips."), None);
}
