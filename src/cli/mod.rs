pub mod info;
pub mod perform;
pub mod retarget;
pub mod visemes;

use clap::ArgMatches;
use marionette::animation::{CrossfadeController, DEFAULT_FADE_DURATION};
use marionette::errors::Result;
use marionette::speech::SpeechSettings;
use std::str::FromStr;

/// Simulated frames are printed, so there is no use in more than this.
const MAX_FPS: f64 = 1000.0;

/// Tunables the subcommands share. Everything has a compiled-in default and
/// can be overridden from the command line.
pub struct Settings {
    pub fade_duration: f32,
    pub speech: SpeechSettings,
    pub fps: f64,
}

impl Default for Settings {
    fn default() -> Settings {
        Settings {
            fade_duration: DEFAULT_FADE_DURATION,
            speech: SpeechSettings::default(),
            fps: 30.0,
        }
    }
}

impl Settings {
    /// Reads whichever of `fade`, `fps`, and `seconds_per_char` the
    /// subcommand defines.
    pub fn from_arg_matches(matches: &ArgMatches) -> Result<Settings> {
        let mut settings = Settings::default();
        if let Some(fade) = opt_finite(matches, "fade")? {
            check_arg(fade >= 0.0, "--fade must not be negative")?;
            settings.fade_duration = fade as f32;
        }
        if let Some(fps) = opt_finite(matches, "fps")? {
            check_arg(fps > 0.0 && fps <= MAX_FPS, "--fps must be above 0 and at most 1000")?;
            settings.fps = fps;
        }
        if let Some(spc) = opt_finite(matches, "seconds_per_char")? {
            check_arg(spc > 0.0, "--seconds-per-char must be positive")?;
            settings.speech.seconds_per_char = spc;
        }
        Ok(settings)
    }

    pub fn crossfade(&self) -> CrossfadeController {
        CrossfadeController::new(self.fade_duration)
    }
}

/// Parses an optional numeric argument.
pub fn opt_number<T: FromStr>(matches: &ArgMatches, name: &str) -> Result<Option<T>> {
    match matches.value_of(name) {
        None => Ok(None),
        Some(s) => match s.trim().parse::<T>() {
            Ok(x) => Ok(Some(x)),
            Err(_) => bail!("expected a number for {}, got {:?}", name, s),
        },
    }
}

/// Like `opt_number`, but infinities and NaN are rejected.
pub fn opt_finite(matches: &ArgMatches, name: &str) -> Result<Option<f64>> {
    match opt_number::<f64>(matches, name)? {
        Some(x) if !x.is_finite() => bail!("{} must be a finite number, got {}", name, x),
        x => Ok(x),
    }
}

pub fn check_arg(cond: bool, msg: &str) -> Result<()> {
    if !cond {
        bail!("{}", msg);
    }
    Ok(())
}

#[cfg(test)]
fn settings_from(args: &[&str]) -> Result<Settings> {
    let app = clap_app!(test =>
        (@arg fps: --fps +takes_value)
        (@arg fade: --fade +takes_value)
        (@arg seconds_per_char: --("seconds-per-char") +takes_value)
    );
    let mut argv = vec!["test"];
    argv.extend_from_slice(args);
    Settings::from_arg_matches(&app.get_matches_from(argv))
}

#[test]
fn test_settings_defaults_and_overrides() {
    let s = settings_from(&[]).unwrap();
    assert_eq!(s.fps, 30.0);
    assert_eq!(s.fade_duration, DEFAULT_FADE_DURATION);

    let s = settings_from(&["--fps", "60", "--fade", "0", "--seconds-per-char", "0.1"]).unwrap();
    assert_eq!(s.fps, 60.0);
    assert_eq!(s.fade_duration, 0.0);
    assert_eq!(s.speech.seconds_per_char, 0.1);
}

#[test]
fn test_settings_reject_non_finite_numbers() {
    let cases: &[&[&str]] = &[
        &["--fps", "inf"],
        &["--fps", "NaN"],
        &["--fade", "inf"],
        &["--seconds-per-char", "inf"],
        &["--fps", "0"],
        &["--fps", "1e300"],
        &["--fade=-1"],
        &["--fps", "fast"],
    ];
    for &args in cases {
        assert!(settings_from(args).is_err(), "{:?} was accepted", args);
    }
}
