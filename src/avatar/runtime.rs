//! Live state of one avatar: which body clip is playing and the expression
//! weights.
//!
//! Nothing outside this struct holds the avatar's "current action"; callers
//! go through `play` (or `apply`) and the crossfade controller does the
//! rest.

use crate::animation::{AnimationSlot, CrossfadeController, Transition};
use crate::speech::viseme::{MouthShape, MOUTH_EXPRESSIONS};
use std::collections::BTreeMap;
use super::{Avatar, Classification, MotionLibrary, RigConvention};

pub struct AvatarRuntime {
    convention: RigConvention,
    crossfade: CrossfadeController,
    animation: AnimationSlot<String>,
    expressions: BTreeMap<String, f32>,
}

impl AvatarRuntime {
    pub fn new(convention: RigConvention, crossfade: CrossfadeController) -> AvatarRuntime {
        let mut expressions = BTreeMap::new();
        for &name in MOUTH_EXPRESSIONS.iter() {
            expressions.insert(name.to_string(), 0.0);
        }
        AvatarRuntime {
            convention,
            crossfade,
            animation: AnimationSlot::new(),
            expressions,
        }
    }

    pub fn for_avatar(avatar: &Avatar, crossfade: CrossfadeController) -> AvatarRuntime {
        AvatarRuntime::new(avatar.convention, crossfade)
    }

    pub fn convention(&self) -> RigConvention {
        self.convention
    }

    pub fn animation(&self) -> &AnimationSlot<String> {
        &self.animation
    }

    /// Crossfades to the named clip.
    pub fn play(&mut self, name: &str) -> Transition {
        let transition = self.crossfade.request(&mut self.animation, name.to_string());
        match transition {
            Transition::Unchanged => trace!("{} is already playing", name),
            _ => debug!("play {}: {:?}", name, transition),
        }
        transition
    }

    /// Advances body animation by `dt` seconds.
    pub fn tick(&mut self, dt: f32) {
        self.crossfade.tick(&mut self.animation, dt);
    }

    pub fn set_expression(&mut self, name: &str, weight: f32) {
        let weight = if weight.is_finite() { weight.max(0.0).min(1.0) } else { 0.0 };
        self.expressions.insert(name.to_string(), weight);
    }

    pub fn expression(&self, name: &str) -> f32 {
        self.expressions.get(name).cloned().unwrap_or(0.0)
    }

    pub fn expressions(&self) -> impl Iterator<Item=(&str, f32)> {
        self.expressions.iter().map(|(k, &v)| (&k[..], v))
    }

    pub fn set_mouth(&mut self, shape: MouthShape) {
        for &(name, w) in shape.expressions().iter() {
            self.set_expression(name, w);
        }
    }

    pub fn mouth(&self) -> MouthShape {
        MouthShape {
            open: self.expression(MOUTH_EXPRESSIONS[0]),
            narrow: self.expression(MOUTH_EXPRESSIONS[1]),
            round: self.expression(MOUTH_EXPRESSIONS[2]),
            smile: self.expression(MOUTH_EXPRESSIONS[3]),
        }
    }

    /// Shows the classified expression, scaled by its intensity, and
    /// crossfades to the classified clip. Emotion expressions from an earlier
    /// classification are cleared; the mouth is left alone.
    ///
    /// An animation name the library doesn't know leaves the current clip
    /// playing.
    pub fn apply(&mut self, classification: &Classification, library: &MotionLibrary) {
        for (name, weight) in self.expressions.iter_mut() {
            if !MOUTH_EXPRESSIONS.contains(&&name[..]) {
                *weight = 0.0;
            }
        }

        if !classification.expression.is_empty() {
            if MOUTH_EXPRESSIONS.contains(&&classification.expression[..]) {
                warn!("ignoring expression {}: it is driven by lip-sync",
                    classification.expression);
            } else {
                self.set_expression(&classification.expression, classification.intensity);
            }
        }

        let anim = &classification.animation_name;
        if anim.is_empty() {
            return;
        }
        if library.contains(anim) {
            self.play(anim);
        } else {
            warn!("no motion named {}; keeping the current one", anim);
        }
    }
}

#[cfg(test)]
fn library(names: &[&str]) -> MotionLibrary {
    use crate::retarget::RetargetedClip;
    let mut lib = MotionLibrary::new();
    for &name in names {
        lib.insert(name, RetargetedClip { name: name.to_string(), duration: 1.0, tracks: vec![] });
    }
    lib
}

#[cfg(test)]
fn classification(expression: &str, animation: &str, intensity: f32) -> Classification {
    Classification {
        expression: expression.to_string(),
        animation_name: animation.to_string(),
        emotion_tag: expression.to_string(),
        intensity,
    }
}

#[test]
fn test_apply_sets_expression_and_plays() {
    let lib = library(&["Idle", "Cheer"]);
    let mut rt = AvatarRuntime::new(RigConvention::NormalizedAxis, Default::default());
    assert_eq!(rt.convention(), RigConvention::NormalizedAxis);

    rt.apply(&classification("happy", "Cheer", 0.7), &lib);
    assert_eq!(rt.expression("happy"), 0.7);
    assert_eq!(rt.animation().current().unwrap().action, "Cheer");

    rt.apply(&classification("sad", "Idle", 3.0), &lib);
    assert_eq!(rt.expression("happy"), 0.0);
    assert_eq!(rt.expression("sad"), 1.0);
    assert!(rt.animation().is_fading());
}

#[test]
fn test_unknown_animation_keeps_current() {
    let lib = library(&["Idle"]);
    let mut rt = AvatarRuntime::new(RigConvention::NormalizedAxis, Default::default());
    rt.play("Idle");
    rt.apply(&classification("happy", "Backflip", 1.0), &lib);
    assert_eq!(rt.animation().current().unwrap().action, "Idle");
    assert!(!rt.animation().is_fading());
}

#[test]
fn test_apply_leaves_mouth_alone() {
    let lib = library(&[]);
    let mut rt = AvatarRuntime::new(RigConvention::NormalizedAxis, Default::default());
    rt.set_mouth(MouthShape::new(0.5, 0.0, 0.25, 0.0));
    rt.apply(&classification("aa", "", 1.0), &lib);
    assert_eq!(rt.mouth(), MouthShape::new(0.5, 0.0, 0.25, 0.0));
}

#[test]
fn test_same_clip_twice_changes_nothing() {
    let mut rt = AvatarRuntime::new(RigConvention::NormalizedAxis, Default::default());
    assert_eq!(rt.play("Idle"), Transition::Started);
    rt.tick(0.2);
    assert_eq!(rt.play("Idle"), Transition::Unchanged);
    let playing = rt.animation().playing();
    assert_eq!(playing.len(), 1);
    assert_eq!(playing[0].weight, 1.0);
}
