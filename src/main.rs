#[macro_use]
extern crate clap;
#[macro_use]
extern crate error_chain;
#[macro_use]
extern crate log;

mod cli;

use marionette::{logger, version};
use std::process::exit;

fn main() {
    let app = clap_app!(marionette =>
        (@setting ArgRequiredElseHelp)
        (@setting VersionlessSubcommands)
        (@setting DisableVersion)
        (about: "Retargets humanoid motion clips and lip-syncs avatars to text")
        (@arg version: -V --version "Print version info")
        (@arg verbose: -v --verbose ... "Log more (repeat for even more)")
        (@arg quiet: -q --quiet "Only log errors")
        (@subcommand retarget =>
            (about: "Retarget a motion clip onto an avatar")
            (@arg SOURCE: +required "Motion asset (JSON)")
            (@arg AVATAR: +required "Avatar (JSON)")
            (@arg OUTPUT: -o --output +takes_value "Write the clip here instead of stdout")
        )
        (@subcommand info =>
            (about: "Describe motion assets and avatars")
            (@arg INPUT: +required +multiple "Asset files")
        )
        (@subcommand visemes =>
            (about: "Print the viseme timeline for some text")
            (@arg TEXT: +required "Text to speak")
            (@arg duration: -d --duration +takes_value "Audio length in seconds (default: estimated)")
            (@arg seconds_per_char: --("seconds-per-char") +takes_value "Speaking rate for the estimate")
        )
        (@subcommand perform =>
            (about: "Simulate an avatar reacting to text, frame by frame")
            (@arg AVATAR: +required "Avatar (JSON)")
            (@arg MOTION: +multiple "Motion assets to make available (JSON)")
            (@arg say: -s --say +takes_value "Text to lip-sync")
            (@arg animation: -a --animation +takes_value "Clip to crossfade to")
            (@arg expression: -e --expression +takes_value "Expression to show")
            (@arg intensity: --intensity +takes_value "Expression intensity (default: 1)")
            (@arg audio_duration: --("audio-duration") +takes_value "Report this audio length once playback starts")
            (@arg fps: --fps +takes_value "Simulation frame rate (default: 30)")
            (@arg realtime: --realtime "Run on the system clock instead of as fast as possible")
            (@arg fade: --fade +takes_value "Crossfade duration in seconds (default: 0.5)")
            (@arg seconds_per_char: --("seconds-per-char") +takes_value "Speaking rate for the estimate")
        )
    );
    let matches = app.get_matches();

    if matches.is_present("version") {
        version::print_version_info();
        return;
    }

    let level = logger::level_for(
        matches.occurrences_of("verbose"),
        matches.is_present("quiet"),
    );
    logger::init(level);

    let res = match matches.subcommand() {
        ("retarget", Some(m)) => cli::retarget::main(m),
        ("info", Some(m)) => cli::info::main(m),
        ("visemes", Some(m)) => cli::visemes::main(m),
        ("perform", Some(m)) => cli::perform::main(m),
        _ => {
            error!("no command given; try --help");
            exit(1);
        }
    };

    if let Err(e) = res {
        error!("{}", e);
        for cause in e.iter().skip(1) {
            error!("caused by: {}", cause);
        }
        exit(1);
    }
}
