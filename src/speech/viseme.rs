//! Phonemes to timed mouth shapes.

use super::phoneme::Phoneme;

/// Blend weights for the four mouth expressions.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct MouthShape {
    /// Jaw open, "aa".
    pub open: f32,
    /// Lips narrowed, "ih".
    pub narrow: f32,
    /// Lips rounded, "ou".
    pub round: f32,
    /// Lips spread, "ee".
    pub smile: f32,
}

pub const MOUTH_EXPRESSIONS: [&str; 4] = ["aa", "ih", "ou", "ee"];

impl MouthShape {
    pub const ZERO: MouthShape = MouthShape { open: 0.0, narrow: 0.0, round: 0.0, smile: 0.0 };

    pub const fn new(open: f32, narrow: f32, round: f32, smile: f32) -> MouthShape {
        MouthShape { open, narrow, round, smile }
    }

    pub fn weights(&self) -> [f32; 4] {
        [self.open, self.narrow, self.round, self.smile]
    }

    /// Pairs each weight with the expression it drives.
    pub fn expressions(&self) -> [(&'static str, f32); 4] {
        let w = self.weights();
        [
            (MOUTH_EXPRESSIONS[0], w[0]),
            (MOUTH_EXPRESSIONS[1], w[1]),
            (MOUTH_EXPRESSIONS[2], w[2]),
            (MOUTH_EXPRESSIONS[3], w[3]),
        ]
    }

    pub fn is_closed(&self) -> bool {
        *self == MouthShape::ZERO
    }
}

static DEFAULT_SHAPE: MouthShape = MouthShape::new(0.2, 0.1, 0.0, 0.1);

static SHAPES: &[(Phoneme, MouthShape)] = &[
    (Phoneme::A,  MouthShape::new(1.0, 0.0, 0.0, 0.0)),
    (Phoneme::E,  MouthShape::new(0.3, 0.0, 0.0, 0.7)),
    (Phoneme::I,  MouthShape::new(0.2, 0.8, 0.0, 0.0)),
    (Phoneme::O,  MouthShape::new(0.4, 0.0, 0.8, 0.0)),
    (Phoneme::U,  MouthShape::new(0.0, 0.0, 1.0, 0.0)),
    (Phoneme::Ee, MouthShape::new(0.0, 0.2, 0.0, 1.0)),
    (Phoneme::Oo, MouthShape::new(0.0, 0.0, 1.0, 0.0)),
    (Phoneme::Ay, MouthShape::new(0.6, 0.0, 0.0, 0.5)),
    (Phoneme::Ow, MouthShape::new(0.6, 0.0, 0.6, 0.0)),
    // Lips pressed together.
    (Phoneme::B,  MouthShape::ZERO),
    (Phoneme::P,  MouthShape::ZERO),
    (Phoneme::M,  MouthShape::ZERO),
    // Lower lip against the teeth.
    (Phoneme::F,  MouthShape::new(0.0, 0.3, 0.0, 0.1)),
    (Phoneme::V,  MouthShape::new(0.0, 0.3, 0.0, 0.1)),
    (Phoneme::W,  MouthShape::new(0.0, 0.0, 0.7, 0.0)),
    (Phoneme::R,  MouthShape::new(0.0, 0.2, 0.3, 0.0)),
    (Phoneme::Pause, MouthShape::ZERO),
    (Phoneme::Default, DEFAULT_SHAPE),
];

/// The mouth shape for a phoneme. Phonemes missing from the table get the
/// `Default` shape.
pub fn mouth_shape(phoneme: Phoneme) -> MouthShape {
    SHAPES.iter()
        .find(|&&(p, _)| p == phoneme)
        .map(|&(_, shape)| shape)
        .unwrap_or(DEFAULT_SHAPE)
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct VisemeFrame {
    /// Seconds from the start of the utterance.
    pub time: f64,
    pub shape: MouthShape,
}

/// Mouth shapes in ascending time order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VisemeTimeline {
    frames: Vec<VisemeFrame>,
    duration: f64,
}

impl VisemeTimeline {
    /// Gives every phoneme an equal slice of `duration`.
    pub fn build(phonemes: &[Phoneme], duration: f64) -> VisemeTimeline {
        let duration = if duration.is_finite() && duration > 0.0 { duration } else { 0.0 };
        if phonemes.is_empty() {
            return VisemeTimeline { frames: vec![], duration };
        }

        let slice = duration / phonemes.len() as f64;
        let frames = phonemes.iter().enumerate()
            .map(|(i, &ph)| VisemeFrame {
                time: i as f64 * slice,
                shape: mouth_shape(ph),
            })
            .collect();
        VisemeTimeline { frames, duration }
    }

    pub fn frames(&self) -> &[VisemeFrame] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Index of the last frame whose time is `<= t`, if any.
    pub fn frame_at(&self, t: f64) -> Option<usize> {
        let n = self.frames.iter().take_while(|f| f.time <= t).count();
        n.checked_sub(1)
    }
}

#[test]
fn test_hi_bob_timeline() {
    use super::phoneme::approximate;

    let tl = VisemeTimeline::build(&approximate("hi bob"), 2.0);
    assert_eq!(tl.len(), 7);

    let expected = [0.0, 0.2857, 0.5714, 0.8571, 1.1429, 1.4286, 1.7143];
    for (frame, t) in tl.frames().iter().zip(expected.iter()) {
        assert!((frame.time - t).abs() < 1e-3, "{} vs {}", frame.time, t);
    }

    let frames = tl.frames();
    // pause, b, b, pause
    for &i in &[2, 3, 5, 6] {
        assert!(frames[i].shape.is_closed(), "frame {} should be closed", i);
    }
    assert_eq!(frames[0].shape, mouth_shape(Phoneme::Default));
    assert_eq!(frames[4].shape, mouth_shape(Phoneme::O));
}

#[test]
fn test_timeline_is_ordered_and_starts_at_zero() {
    use super::phoneme::approximate;

    let tl = VisemeTimeline::build(&approximate("the quick brown fox"), 3.3);
    assert_eq!(tl.frames()[0].time, 0.0);
    assert!(tl.frames().windows(2).all(|w| w[0].time <= w[1].time));
    assert!(tl.frames().last().unwrap().time < 3.3);
}

#[test]
fn test_empty_and_degenerate_durations() {
    assert!(VisemeTimeline::build(&[], 2.0).is_empty());

    let tl = VisemeTimeline::build(&[Phoneme::A, Phoneme::Pause], -1.0);
    assert_eq!(tl.len(), 2);
    assert!(tl.frames().iter().all(|f| f.time == 0.0));

    let tl = VisemeTimeline::build(&[Phoneme::A], std::f64::NAN);
    assert_eq!(tl.frames()[0].time, 0.0);
}

#[test]
fn test_frame_at() {
    let tl = VisemeTimeline::build(&[Phoneme::A, Phoneme::E, Phoneme::I, Phoneme::O], 1.0);
    assert_eq!(tl.frame_at(-0.1), None);
    assert_eq!(tl.frame_at(0.0), Some(0));
    assert_eq!(tl.frame_at(0.3), Some(1));
    assert_eq!(tl.frame_at(0.5), Some(2));
    assert_eq!(tl.frame_at(9.0), Some(3));
}
