//! Swapping the playing body-motion clip.
//!
//! An `AnimationSlot` holds the action currently playing and, while a
//! crossfade is in flight, the action fading out. Only a
//! `CrossfadeController` changes it.
//!
//! ```text
//!     weight
//!       1 |‾‾‾‾‾‾\      ,‾‾‾‾‾‾   new
//!         |       \    /
//!         |        \  /
//!         |         \/
//!         |         /\
//!       0 |________/  \_______   old
//!                 |<-->|
//!             fade_duration
//! ```

use smallvec::SmallVec;

pub const DEFAULT_FADE_DURATION: f32 = 0.5;

/// An action that is playing: which clip, how much it contributes, and how
/// far into it playback is.
#[derive(Clone, Debug, PartialEq)]
pub struct ActionState<A> {
    pub action: A,
    pub weight: f32,
    /// Seconds since the action started.
    pub time: f32,
}

impl<A> ActionState<A> {
    fn start(action: A, weight: f32) -> ActionState<A> {
        ActionState { action, weight, time: 0.0 }
    }
}

#[derive(Clone, Debug)]
struct Fade<A> {
    outgoing: ActionState<A>,
    /// Weight `outgoing` had when the fade began; it ramps from here to 0.
    from_weight: f32,
    elapsed: f32,
}

#[derive(Clone, Debug)]
pub struct AnimationSlot<A> {
    current: Option<ActionState<A>>,
    fade: Option<Fade<A>>,
}

impl<A> Default for AnimationSlot<A> {
    fn default() -> AnimationSlot<A> {
        AnimationSlot { current: None, fade: None }
    }
}

impl<A> AnimationSlot<A> {
    pub fn new() -> AnimationSlot<A> {
        Default::default()
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_none()
    }

    pub fn current(&self) -> Option<&ActionState<A>> {
        self.current.as_ref()
    }

    pub fn is_fading(&self) -> bool {
        self.fade.is_some()
    }

    /// Every playing action, current first. There are never more than two.
    pub fn playing(&self) -> SmallVec<[&ActionState<A>; 2]> {
        let mut v = SmallVec::new();
        if let Some(ref current) = self.current {
            v.push(current);
        }
        if let Some(ref fade) = self.fade {
            v.push(&fade.outgoing);
        }
        v
    }

    /// `(action, weight, time)` for every playing action.
    pub fn weights(&self) -> SmallVec<[(&A, f32, f32); 2]> {
        self.playing().into_iter()
            .map(|a| (&a.action, a.weight, a.time))
            .collect()
    }
}

/// What `CrossfadeController::request` did.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Transition {
    /// Nothing was playing; the action started at full weight.
    Started,
    /// The action was already the current one.
    Unchanged,
    /// A crossfade from the previous action began.
    Crossfading,
    /// The fade duration is zero, so the previous action was replaced
    /// outright.
    Replaced,
}

#[derive(Copy, Clone, Debug)]
pub struct CrossfadeController {
    fade_duration: f32,
}

impl Default for CrossfadeController {
    fn default() -> CrossfadeController {
        CrossfadeController::new(DEFAULT_FADE_DURATION)
    }
}

impl CrossfadeController {
    pub fn new(fade_duration: f32) -> CrossfadeController {
        let fade_duration =
            if fade_duration.is_finite() && fade_duration > 0.0 { fade_duration } else { 0.0 };
        CrossfadeController { fade_duration }
    }

    pub fn fade_duration(&self) -> f32 {
        self.fade_duration
    }

    pub fn request<A>(&self, slot: &mut AnimationSlot<A>, action: A) -> Transition
    where A: PartialEq + std::fmt::Debug {
        let previous = match slot.current.take() {
            None => {
                slot.current = Some(ActionState::start(action, 1.0));
                return Transition::Started;
            }
            Some(current) => current,
        };

        if previous.action == action {
            slot.current = Some(previous);
            return Transition::Unchanged;
        }

        // A fade already in flight is abandoned: its incoming action (the
        // previous current) becomes the one fading out, and whatever was
        // fading out before stops now.
        if let Some(interrupted) = slot.fade.take() {
            debug!("crossfade to {:?} interrupted; stopping {:?}",
                previous.action, interrupted.outgoing.action);
        }

        if self.fade_duration == 0.0 {
            slot.current = Some(ActionState::start(action, 1.0));
            return Transition::Replaced;
        }

        slot.fade = Some(Fade {
            from_weight: previous.weight,
            outgoing: previous,
            elapsed: 0.0,
        });
        slot.current = Some(ActionState::start(action, 0.0));
        Transition::Crossfading
    }

    /// Advances playback by `dt` seconds.
    pub fn tick<A>(&self, slot: &mut AnimationSlot<A>, dt: f32) {
        let dt = if dt.is_finite() && dt > 0.0 { dt } else { 0.0 };

        let current = match slot.current.as_mut() {
            Some(current) => current,
            None => return,
        };
        current.time += dt;

        let finished = match slot.fade.as_mut() {
            None => return,
            Some(fade) => {
                fade.elapsed += dt;
                fade.outgoing.time += dt;

                let t = (fade.elapsed / self.fade_duration).min(1.0);
                current.weight = t;
                fade.outgoing.weight = fade.from_weight * (1.0 - t);
                t >= 1.0
            }
        };

        if finished {
            current.weight = 1.0;
            slot.fade = None;
        }
    }
}

#[cfg(test)]
fn weights(slot: &AnimationSlot<&'static str>) -> Vec<(&'static str, f32)> {
    slot.playing().iter().map(|a| (a.action, a.weight)).collect()
}

#[test]
fn test_first_request_starts_at_full_weight() {
    let ctl = CrossfadeController::default();
    let mut slot = AnimationSlot::new();
    assert!(slot.is_empty());
    assert_eq!(ctl.request(&mut slot, "idle"), Transition::Started);
    assert_eq!(weights(&slot), vec![("idle", 1.0)]);
}

#[test]
fn test_same_action_twice_is_a_no_op() {
    let ctl = CrossfadeController::default();
    let mut slot = AnimationSlot::new();
    ctl.request(&mut slot, "idle");
    ctl.tick(&mut slot, 0.3);

    assert_eq!(ctl.request(&mut slot, "idle"), Transition::Unchanged);
    assert!(!slot.is_fading());
    assert_eq!(weights(&slot), vec![("idle", 1.0)]);
    assert_eq!(slot.current().unwrap().time, 0.3);
}

#[test]
fn test_crossfade_ramps_linearly_then_stops_old() {
    let ctl = CrossfadeController::new(0.5);
    let mut slot = AnimationSlot::new();
    ctl.request(&mut slot, "idle");
    assert_eq!(ctl.request(&mut slot, "wave"), Transition::Crossfading);
    assert_eq!(weights(&slot), vec![("wave", 0.0), ("idle", 1.0)]);

    ctl.tick(&mut slot, 0.125);
    let w = weights(&slot);
    assert!((w[0].1 - 0.25).abs() < 1e-6);
    assert!((w[1].1 - 0.75).abs() < 1e-6);
    assert!((w[0].1 + w[1].1 - 1.0).abs() < 1e-6);

    ctl.tick(&mut slot, 0.5);
    assert!(!slot.is_fading());
    assert_eq!(weights(&slot), vec![("wave", 1.0)]);
}

#[test]
fn test_request_during_fade_supersedes_it() {
    let ctl = CrossfadeController::new(0.5);
    let mut slot = AnimationSlot::new();
    ctl.request(&mut slot, "idle");
    ctl.request(&mut slot, "wave");
    ctl.tick(&mut slot, 0.25);

    assert_eq!(ctl.request(&mut slot, "bow"), Transition::Crossfading);
    // "idle" was stopped; "wave" fades out from where it had got to.
    let w = weights(&slot);
    assert_eq!(w.len(), 2);
    assert_eq!(w[0], ("bow", 0.0));
    assert_eq!(w[1].0, "wave");
    assert!((w[1].1 - 0.5).abs() < 1e-6);

    ctl.tick(&mut slot, 0.25);
    let w = weights(&slot);
    assert!((w[0].1 - 0.5).abs() < 1e-6);
    assert!((w[1].1 - 0.25).abs() < 1e-6);
}

#[test]
fn test_zero_duration_replaces() {
    let ctl = CrossfadeController::new(0.0);
    let mut slot = AnimationSlot::new();
    ctl.request(&mut slot, "idle");
    assert_eq!(ctl.request(&mut slot, "wave"), Transition::Replaced);
    assert_eq!(weights(&slot), vec![("wave", 1.0)]);
}

#[test]
fn test_weights_report_time_too() {
    let c = CrossfadeController::new(1.0);
    let mut slot = AnimationSlot::new();
    c.request(&mut slot, "idle");
    c.tick(&mut slot, 2.0);
    c.request(&mut slot, "wave");
    c.tick(&mut slot, 0.25);
    let w = slot.weights();
    assert_eq!(w.len(), 2);
    assert_eq!(w[0], (&"wave", 0.25, 0.25));
    assert_eq!(w[1], (&"idle", 0.75, 2.25));
}
