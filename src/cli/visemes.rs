use clap::ArgMatches;
use marionette::errors::Result;
use marionette::speech::{approximate, VisemeTimeline};
use super::{check_arg, opt_finite, Settings};

pub fn main(matches: &ArgMatches) -> Result<()> {
    let settings = Settings::from_arg_matches(matches)?;
    let text = matches.value_of("TEXT").unwrap();

    let duration = match opt_finite(matches, "duration")? {
        Some(d) => {
            check_arg(d >= 0.0, "--duration must not be negative")?;
            d
        }
        None => {
            let d = settings.speech.estimate_duration(text);
            info!("no duration given; estimating {:.3}s", d);
            d
        }
    };

    let phonemes = approximate(text);
    let timeline = VisemeTimeline::build(&phonemes, duration);
    if timeline.is_empty() {
        info!("nothing to say");
        return Ok(());
    }

    println!("{:>8}  {:<8} {:>5} {:>5} {:>5} {:>5}", "time", "phoneme", "aa", "ih", "ou", "ee");
    for (frame, phoneme) in timeline.frames().iter().zip(&phonemes) {
        let [aa, ih, ou, ee] = frame.shape.weights();
        println!("{:>8.3}  {:<8} {:>5.2} {:>5.2} {:>5.2} {:>5.2}",
            frame.time, phoneme.symbol(), aa, ih, ou, ee);
    }
    println!("{:>8.3}  end", timeline.duration());

    Ok(())
}
