//! Playing a viseme timeline against an audio clock.
//!
//! The host calls `tick` once per rendered frame while audio is playing.
//! The cursor only ever moves forward: on each tick it advances while the
//! next frame's time has been reached, and the frame it stops on is the
//! mouth shape for this tick.
//!
//! Stopping detaches the playback state. A tick that arrives after that
//! (e.g. one already queued by the host when audio ended) finds nothing to
//! do and returns `None`.

use super::clock::AudioClock;
use super::viseme::{MouthShape, VisemeTimeline};

#[derive(Copy, Clone, Debug)]
struct Playback {
    cursor: usize,
    /// Clock reading when playback started.
    start: f64,
    /// Largest elapsed time seen so far.
    elapsed: f64,
}

#[derive(Clone, Debug, Default)]
pub struct LipSyncScheduler {
    timeline: VisemeTimeline,
    playback: Option<Playback>,
}

impl LipSyncScheduler {
    pub fn new(timeline: VisemeTimeline) -> LipSyncScheduler {
        LipSyncScheduler { timeline, playback: None }
    }

    pub fn timeline(&self) -> &VisemeTimeline {
        &self.timeline
    }

    pub fn is_playing(&self) -> bool {
        self.playback.is_some()
    }

    /// Index of the active frame, while playing.
    pub fn cursor(&self) -> Option<usize> {
        self.playback.map(|p| p.cursor)
    }

    /// Replaces the timeline.
    ///
    /// Before playback this is a plain swap. During playback the cursor
    /// moves to the frame of the new timeline that is active at the time
    /// already played, but never to an earlier index than it had: when the
    /// new timeline is slower, the current frame holds until it catches up.
    pub fn install(&mut self, timeline: VisemeTimeline) {
        self.timeline = timeline;
        if let Some(ref mut playback) = self.playback {
            let last = self.timeline.len().saturating_sub(1);
            let seek = self.timeline.frame_at(playback.elapsed).unwrap_or(0);
            playback.cursor = seek.max(playback.cursor.min(last));
        }
    }

    pub fn start(&mut self, now: f64) {
        self.playback = Some(Playback { cursor: 0, start: now, elapsed: 0.0 });
    }

    /// Ends playback. Returns the shape the mouth should be left in.
    pub fn stop(&mut self) -> MouthShape {
        self.playback = None;
        MouthShape::ZERO
    }

    pub fn tick<C: AudioClock>(&mut self, clock: &C) -> Option<MouthShape> {
        let start = self.playback?.start;
        self.advance(clock.now() - start)
    }

    /// Moves the cursor to `elapsed` seconds into playback and returns the
    /// active shape, or `None` if not playing.
    pub fn advance(&mut self, elapsed: f64) -> Option<MouthShape> {
        let playback = self.playback.as_mut()?;
        let frames = self.timeline.frames();

        if elapsed.is_finite() && elapsed > playback.elapsed {
            playback.elapsed = elapsed;
        }

        if frames.is_empty() {
            return Some(MouthShape::ZERO);
        }

        while playback.cursor + 1 < frames.len()
            && frames[playback.cursor + 1].time <= playback.elapsed
        {
            playback.cursor += 1;
        }

        let frame = &frames[playback.cursor];
        if playback.cursor == 0 && frame.time > playback.elapsed {
            // Not reached the first frame yet.
            return Some(MouthShape::ZERO);
        }
        Some(frame.shape)
    }
}

#[cfg(test)]
use super::phoneme::{approximate, Phoneme};
#[cfg(test)]
use super::viseme::mouth_shape;

#[test]
fn test_cursor_follows_elapsed_time() {
    let tl = VisemeTimeline::build(&[Phoneme::A, Phoneme::B, Phoneme::O, Phoneme::Pause], 1.0);
    let mut s = LipSyncScheduler::new(tl);

    assert_eq!(s.advance(0.1), None);
    s.start(10.0);
    assert_eq!(s.advance(0.0), Some(mouth_shape(Phoneme::A)));
    assert_eq!(s.advance(0.26), Some(MouthShape::ZERO));
    assert_eq!(s.cursor(), Some(1));
    assert_eq!(s.advance(0.6), Some(mouth_shape(Phoneme::O)));
    assert_eq!(s.advance(5.0), Some(MouthShape::ZERO));
    assert_eq!(s.cursor(), Some(3));
}

#[test]
fn test_cursor_never_moves_backwards() {
    let tl = VisemeTimeline::build(&approximate("hello there world"), 2.0);
    let mut s = LipSyncScheduler::new(tl);
    s.start(0.0);

    let mut last = 0;
    for &t in &[0.0, 0.3, 0.9, 0.5, 1.2, 0.1, 1.9] {
        s.advance(t);
        let c = s.cursor().unwrap();
        assert!(c >= last);
        last = c;
    }
}

#[test]
fn test_tick_reads_the_clock() {
    use super::clock::ManualClock;

    let tl = VisemeTimeline::build(&[Phoneme::A, Phoneme::U], 1.0);
    let mut s = LipSyncScheduler::new(tl);
    let clock = ManualClock::new(100.0);

    assert_eq!(s.tick(&clock), None);
    s.start(clock.now());
    assert_eq!(s.tick(&clock), Some(mouth_shape(Phoneme::A)));
    clock.advance(0.5);
    assert_eq!(s.tick(&clock), Some(mouth_shape(Phoneme::U)));
}

#[test]
fn test_stale_tick_after_stop_is_a_no_op() {
    let tl = VisemeTimeline::build(&[Phoneme::A, Phoneme::U], 1.0);
    let mut s = LipSyncScheduler::new(tl);
    s.start(0.0);
    s.advance(0.7);
    assert_eq!(s.stop(), MouthShape::ZERO);
    assert_eq!(s.advance(0.8), None);
    assert_eq!(s.cursor(), None);
}

#[test]
fn test_restart_resets_cursor() {
    let tl = VisemeTimeline::build(&[Phoneme::A, Phoneme::U], 1.0);
    let mut s = LipSyncScheduler::new(tl);
    s.start(0.0);
    s.advance(0.9);
    assert_eq!(s.cursor(), Some(1));
    s.start(3.0);
    assert_eq!(s.cursor(), Some(0));
    assert_eq!(s.advance(0.0), Some(mouth_shape(Phoneme::A)));
}

#[test]
fn test_install_during_playback_keeps_time() {
    let phonemes = [Phoneme::A, Phoneme::E, Phoneme::I, Phoneme::O];
    let mut s = LipSyncScheduler::new(VisemeTimeline::build(&phonemes, 0.5));
    s.start(0.0);
    assert_eq!(s.advance(0.35), Some(mouth_shape(Phoneme::I)));

    // The real audio is shorter: 0.35s into a 0.4s line is the last frame.
    s.install(VisemeTimeline::build(&phonemes, 0.4));
    assert_eq!(s.cursor(), Some(3));
    assert_eq!(s.advance(0.35), Some(mouth_shape(Phoneme::O)));
}

#[test]
fn test_slower_timeline_holds_the_current_frame() {
    let phonemes = [Phoneme::A, Phoneme::E, Phoneme::I, Phoneme::O];
    let mut s = LipSyncScheduler::new(VisemeTimeline::build(&phonemes, 1.0));
    s.start(0.0);
    assert_eq!(s.advance(0.6), Some(mouth_shape(Phoneme::I)));

    // Twice as long: 0.6s now falls in the second slice, but the mouth
    // already showed the third.
    s.install(VisemeTimeline::build(&phonemes, 2.0));
    assert_eq!(s.cursor(), Some(2));
    assert_eq!(s.advance(0.7), Some(mouth_shape(Phoneme::I)));
    assert_eq!(s.cursor(), Some(2));
    assert_eq!(s.advance(1.6), Some(mouth_shape(Phoneme::O)));
    assert_eq!(s.cursor(), Some(3));
}

#[test]
fn test_install_shorter_timeline_clamps_cursor() {
    let mut s = LipSyncScheduler::new(VisemeTimeline::build(&approximate("hello there"), 1.0));
    s.start(0.0);
    s.advance(0.9);
    s.install(VisemeTimeline::build(&[Phoneme::A, Phoneme::U], 10.0));
    assert_eq!(s.cursor(), Some(1));
    assert_eq!(s.advance(0.95), Some(mouth_shape(Phoneme::U)));
}

#[test]
fn test_empty_timeline_gives_closed_mouth() {
    let mut s = LipSyncScheduler::new(VisemeTimeline::build(&approximate("..."), 1.0));
    s.start(0.0);
    assert_eq!(s.advance(0.5), Some(MouthShape::ZERO));
}
