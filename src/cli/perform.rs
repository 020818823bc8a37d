//! Runs an avatar through one reaction without a renderer: the clips are
//! retargeted, the classification is applied, and the utterance is
//! lip-synced against a simulated clock, or the system clock with `--realtime`.
//! Each frame's animation weights and expressions are printed.

use clap::ArgMatches;
use marionette::asset;
use marionette::avatar::{AvatarRuntime, Classification, Classifier, MotionLibrary};
use marionette::errors::Result;
use marionette::retarget::retarget;
use marionette::speech::{AudioClock, AudioEvent, ManualClock, SpeechSession, SystemClock};
use std::path::Path;
use std::time::Duration;
use super::{check_arg, opt_finite, Settings};

pub fn main(matches: &ArgMatches) -> Result<()> {
    let settings = Settings::from_arg_matches(matches)?;

    let avatar = asset::load_avatar(Path::new(matches.value_of_os("AVATAR").unwrap()))?;

    let mut library = MotionLibrary::new();
    for motion in matches.values_of_os("MOTION").into_iter().flatten() {
        let source = asset::load_source_asset(Path::new(motion))?;
        let clip = retarget(&source.clip, &source.rig, &avatar);
        info!("{}: {} tracks", source.clip.name, clip.tracks.len());
        if library.insert(&source.clip.name, clip).is_some() {
            warn!("two motions are named {}; keeping the last", source.clip.name);
        }
    }

    let crossfade = settings.crossfade();
    let mut runtime = AvatarRuntime::for_avatar(&avatar, crossfade);
    info!("performing as {} ({} rig, {}s crossfades)",
        avatar.name, runtime.convention().name(), crossfade.fade_duration());
    // Idle on the first clip so there is something to fade from.
    if let Some(first) = library.names().next().map(|s| s.to_string()) {
        runtime.play(&first);
    }

    let text = matches.value_of("say").unwrap_or("");
    let classifier = fixed_classifier(
        matches.value_of("expression").unwrap_or(""),
        matches.value_of("animation").unwrap_or(""),
        opt_finite(matches, "intensity")?.unwrap_or(1.0) as f32,
    );
    runtime.apply(&classifier.classify(text), &library);

    let audio_duration = opt_finite(matches, "audio_duration")?;
    if let Some(d) = audio_duration {
        check_arg(d >= 0.0, "--audio-duration must not be negative")?;
    }

    let mut session = SpeechSession::new(text, &settings.speech);
    if !session.text().is_empty() {
        debug!("saying {:?} as {} phonemes", session.text(), session.phonemes().len());
    }
    let dt = 1.0 / settings.fps;

    if matches.is_present("realtime") {
        let clock = SystemClock;
        run(&mut session, &mut runtime, &clock, dt, audio_duration, |dt| {
            std::thread::sleep(Duration::from_secs_f64(dt));
        });
    } else {
        let clock = ManualClock::new(0.0);
        run(&mut session, &mut runtime, &clock, dt, audio_duration, |dt| clock.advance(dt));
    }

    Ok(())
}

/// Plays the session to the end, one frame every `dt` seconds of `clock`.
/// `wait` lets `dt` seconds pass.
fn run<C: AudioClock, W: FnMut(f64)>(
    session: &mut SpeechSession,
    runtime: &mut AvatarRuntime,
    clock: &C,
    dt: f64,
    mut audio_duration: Option<f64>,
    mut wait: W,
) {
    let start = clock.now();
    session.handle(AudioEvent::Started, runtime, clock);

    let mut frame = 0u64;
    let mut t: f64;
    loop {
        t = clock.now() - start;

        // The real length arrives a frame after playback starts, the way a
        // streamed voice does.
        if frame == 1 {
            if let Some(d) = audio_duration.take() {
                session.handle(AudioEvent::Ready { duration: d }, runtime, clock);
            }
        }

        session.tick(runtime, clock);
        print_frame(t, runtime);

        let speech_done = t >= session.timeline().duration() && audio_duration.is_none();
        if speech_done && !runtime.animation().is_fading() {
            break;
        }

        wait(dt);
        runtime.tick(dt as f32);
        frame += 1;
    }

    session.handle(AudioEvent::Ended, runtime, clock);
    print_frame(t, runtime);
}

/// Answers every text with the reaction given on the command line.
fn fixed_classifier<'a>(
    expression: &'a str,
    animation: &'a str,
    intensity: f32,
) -> impl Fn(&str) -> Classification + 'a {
    move |_text: &str| Classification {
        expression: expression.to_string(),
        animation_name: animation.to_string(),
        emotion_tag: expression.to_string(),
        intensity,
    }
}

fn print_frame(t: f64, runtime: &AvatarRuntime) {
    let actions = runtime.animation().playing().iter()
        .map(|a| format!("{}@{:.2}", a.action, a.weight))
        .collect::<Vec<_>>();
    let expressions = runtime.expressions()
        .filter(|&(_, w)| w != 0.0)
        .map(|(name, w)| format!("{}={:.2}", name, w))
        .collect::<Vec<_>>();
    println!("{:>8.3}  [{}]  {}", t, actions.join(" "), expressions.join(" "));
}
