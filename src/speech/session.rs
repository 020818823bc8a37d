//! One spoken utterance, from text to mouth weights.
//!
//! The audio for the utterance is produced elsewhere. All a session sees of
//! it is the signal set in `AudioEvent` and a clock. Until the audio reports
//! its real duration the timeline is built from an estimate based on the
//! text length; when `Ready` arrives the timeline is rebuilt and swapped in.
//! That may happen before or after `Started`: the scheduler accepts a new
//! timeline at any point without jumping backwards.

use crate::avatar::AvatarRuntime;
use super::clock::AudioClock;
use super::phoneme::{approximate, Phoneme};
use super::scheduler::LipSyncScheduler;
use super::viseme::VisemeTimeline;

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum AudioEvent {
    /// The audio has loaded and its length is known.
    Ready { duration: f64 },
    Started,
    Paused,
    Ended,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SpeechSettings {
    /// Estimated speaking time per character of text.
    pub seconds_per_char: f64,
    /// Lower bound on the estimate for non-empty text.
    pub min_duration: f64,
}

impl Default for SpeechSettings {
    fn default() -> SpeechSettings {
        SpeechSettings {
            seconds_per_char: 0.065,
            min_duration: 0.5,
        }
    }
}

impl SpeechSettings {
    pub fn estimate_duration(&self, text: &str) -> f64 {
        let chars = text.trim().chars().count();
        if chars == 0 {
            return 0.0;
        }
        (chars as f64 * self.seconds_per_char).max(self.min_duration)
    }
}

pub struct SpeechSession {
    text: String,
    phonemes: Vec<Phoneme>,
    scheduler: LipSyncScheduler,
    duration_known: bool,
}

impl SpeechSession {
    pub fn new(text: &str, settings: &SpeechSettings) -> SpeechSession {
        let phonemes = approximate(text);
        let estimate = settings.estimate_duration(text);
        let timeline = VisemeTimeline::build(&phonemes, estimate);
        if timeline.is_empty() {
            debug!("nothing to lip-sync in {:?}", text);
        }

        SpeechSession {
            text: text.to_string(),
            phonemes,
            scheduler: LipSyncScheduler::new(timeline),
            duration_known: false,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn phonemes(&self) -> &[Phoneme] {
        &self.phonemes
    }

    pub fn timeline(&self) -> &VisemeTimeline {
        self.scheduler.timeline()
    }

    /// Whether the timeline uses the audio's real duration rather than the
    /// estimate.
    pub fn is_duration_known(&self) -> bool {
        self.duration_known
    }

    pub fn is_active(&self) -> bool {
        self.scheduler.is_playing()
    }

    pub fn handle<C: AudioClock>(
        &mut self,
        event: AudioEvent,
        runtime: &mut AvatarRuntime,
        clock: &C,
    ) {
        match event {
            AudioEvent::Ready { duration } => {
                if !duration.is_finite() || duration < 0.0 {
                    warn!("audio reported a bogus duration ({}); keeping the estimate", duration);
                    return;
                }
                if self.scheduler.is_playing() {
                    debug!("audio duration arrived after playback started");
                }
                self.scheduler.install(VisemeTimeline::build(&self.phonemes, duration));
                self.duration_known = true;
            }
            AudioEvent::Started => {
                self.scheduler.start(clock.now());
            }
            AudioEvent::Paused | AudioEvent::Ended => {
                let shape = self.scheduler.stop();
                runtime.set_mouth(shape);
            }
        }
    }

    /// Writes this frame's mouth shape into `runtime`. Returns false (and
    /// touches nothing) when the session isn't playing.
    pub fn tick<C: AudioClock>(&mut self, runtime: &mut AvatarRuntime, clock: &C) -> bool {
        match self.scheduler.tick(clock) {
            Some(shape) => {
                runtime.set_mouth(shape);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
use super::clock::ManualClock;
#[cfg(test)]
use super::viseme::{mouth_shape, MouthShape};

#[cfg(test)]
fn runtime() -> AvatarRuntime {
    AvatarRuntime::new(crate::avatar::RigConvention::NormalizedAxis, Default::default())
}

#[test]
fn test_estimate() {
    let s = SpeechSettings { seconds_per_char: 0.1, min_duration: 0.5 };
    assert_eq!(s.estimate_duration("  "), 0.0);
    assert_eq!(s.estimate_duration("hi"), 0.5);
    assert!((s.estimate_duration("hello world") - 1.1).abs() < 1e-9);
}

#[test]
fn test_ready_before_start_uses_real_duration() {
    let mut rt = runtime();
    let clock = ManualClock::new(0.0);
    let mut session = SpeechSession::new("hi bob", &Default::default());
    assert!(!session.is_duration_known());
    assert_eq!(session.text(), "hi bob");
    assert_eq!(session.phonemes().len(), 7);

    session.handle(AudioEvent::Ready { duration: 2.0 }, &mut rt, &clock);
    assert!(session.is_duration_known());
    assert_eq!(session.timeline().duration(), 2.0);
    assert_eq!(session.timeline().len(), 7);

    session.handle(AudioEvent::Started, &mut rt, &clock);
    clock.advance(1.2);
    assert!(session.tick(&mut rt, &clock));
    // Frame 4 (the "o" of "bob") starts at 8/7s.
    assert_eq!(rt.mouth(), mouth_shape(Phoneme::O));
}

#[test]
fn test_ready_after_start_swaps_without_restarting() {
    let mut rt = runtime();
    let clock = ManualClock::new(5.0);
    let mut session = SpeechSession::new("hi bob", &Default::default());

    session.handle(AudioEvent::Started, &mut rt, &clock);
    clock.advance(0.1);
    session.tick(&mut rt, &clock);
    session.handle(AudioEvent::Ready { duration: 2.0 }, &mut rt, &clock);
    assert!(session.is_active());

    clock.advance(1.1);
    session.tick(&mut rt, &clock);
    assert_eq!(rt.mouth(), mouth_shape(Phoneme::O));
}

#[test]
fn test_end_closes_mouth_and_keeps_emotion() {
    let mut rt = runtime();
    rt.set_expression("happy", 0.8);
    let clock = ManualClock::new(0.0);
    let mut session = SpeechSession::new("hi bob", &Default::default());
    session.handle(AudioEvent::Ready { duration: 2.0 }, &mut rt, &clock);
    session.handle(AudioEvent::Started, &mut rt, &clock);
    clock.advance(0.3);
    session.tick(&mut rt, &clock);
    assert!(!rt.mouth().is_closed());

    session.handle(AudioEvent::Ended, &mut rt, &clock);
    assert_eq!(rt.mouth(), MouthShape::ZERO);
    assert_eq!(rt.expression("happy"), 0.8);

    // A tick that was already on its way does nothing.
    rt.set_mouth(mouth_shape(Phoneme::A));
    clock.advance(0.1);
    assert!(!session.tick(&mut rt, &clock));
    assert_eq!(rt.mouth(), mouth_shape(Phoneme::A));
}

#[test]
fn test_bogus_ready_keeps_estimate() {
    let mut rt = runtime();
    let clock = ManualClock::new(0.0);
    let mut session = SpeechSession::new("hello", &Default::default());
    let before = session.timeline().clone();
    session.handle(AudioEvent::Ready { duration: std::f64::NAN }, &mut rt, &clock);
    assert!(!session.is_duration_known());
    assert_eq!(session.timeline(), &before);
}
