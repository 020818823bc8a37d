//! The boundary to whatever decides how the avatar should react to a piece
//! of text (a rule table, a language model, ...).

/// What a classifier decided about a piece of text.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Classification {
    /// Facial expression to show, e.g. "happy".
    pub expression: String,
    /// Body-motion clip to play, by library name.
    pub animation_name: String,
    /// Free-form label. Carried along but not interpreted here.
    pub emotion_tag: String,
    /// Scales the expression weight, nominally 0 to 1.
    pub intensity: f32,
}

pub trait Classifier {
    fn classify(&self, text: &str) -> Classification;
}

impl<F> Classifier for F where F: Fn(&str) -> Classification {
    fn classify(&self, text: &str) -> Classification {
        self(text)
    }
}

#[test]
fn test_closures_are_classifiers() {
    let c = |text: &str| Classification {
        expression: if text.contains('!') { "surprised" } else { "neutral" }.to_string(),
        animation_name: "Idle".to_string(),
        emotion_tag: String::new(),
        intensity: 1.0,
    };
    assert_eq!(c.classify("oh!").expression, "surprised");
    assert_eq!(c.classify("ok").expression, "neutral");
}
