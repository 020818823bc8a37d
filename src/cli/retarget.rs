use clap::ArgMatches;
use marionette::asset::{self, write};
use marionette::errors::Result;
use marionette::retarget::{retarget_with, BoneCorrespondenceTable};
use std::path::Path;

pub fn main(matches: &ArgMatches) -> Result<()> {
    let source_path = Path::new(matches.value_of_os("SOURCE").unwrap());
    let avatar_path = Path::new(matches.value_of_os("AVATAR").unwrap());

    let source = asset::load_source_asset(source_path)?;
    let avatar = asset::load_avatar(avatar_path)?;

    let table = BoneCorrespondenceTable::mixamo();
    let (clip, dropped) = retarget_with(&table, &source.clip, &source.rig, &avatar);

    if dropped.total() != 0 {
        info!("dropped {} of {} tracks ({} unmapped, {} missing on the avatar, \
            {} without a rest pose, {} positions without a hips scale)",
            dropped.total(), source.clip.tracks.len(),
            dropped.unmapped, dropped.no_avatar_node,
            dropped.no_rest_basis, dropped.no_hips_scale);
    }
    if clip.tracks.is_empty() {
        warn!("nothing in {} could be retargeted onto {}", source.clip.name, avatar.name);
    }

    match matches.value_of_os("OUTPUT") {
        Some(out) => write::write_clip(&clip, Path::new(out))?,
        None => println!("{}", json::stringify_pretty(write::clip_to_json(&clip), 2)),
    }

    Ok(())
}
