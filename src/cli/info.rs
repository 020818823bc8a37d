use clap::ArgMatches;
use marionette::asset::{self, SourceAsset};
use marionette::avatar::Avatar;
use marionette::errors::{Result, ResultExt};
use marionette::retarget::BoneCorrespondenceTable;
use marionette::rig::humanoid::ALL_HUMANOID_BONES;
use marionette::rig::Rig;
use std::path::Path;

pub fn main(matches: &ArgMatches) -> Result<()> {
    let inputs = matches.values_of_os("INPUT").unwrap();
    let mut failed = 0;

    for input in inputs {
        let path = Path::new(input);
        if let Err(e) = describe(path) {
            error!("{}: {}", path.display(), e);
            for cause in e.iter().skip(1) {
                error!("caused by: {}", cause);
            }
            failed += 1;
        }
        println!();
    }

    if failed != 0 {
        bail!("{} file(s) couldn't be read", failed);
    }
    Ok(())
}

fn describe(path: &Path) -> Result<()> {
    let text = asset::read_json_container(path)?;
    let is_avatar = !json::parse(&text)
        .chain_err(|| format!("{} is not valid JSON", path.display()))?
        ["humanoid"].is_null();

    println!("{}:", path.display());
    if is_avatar {
        avatar_info(&asset::parse_avatar(&text)?);
    } else {
        motion_info(&asset::parse_source_asset(&text)?);
    }
    Ok(())
}

fn rig_info(rig: &Rig) {
    let roots = rig.roots()
        .map(|id| rig.bone(id).name.as_str())
        .collect::<Vec<_>>();
    println!("  Bones: {} (roots: {})", rig.num_bones(), roots.join(", "));
}

fn motion_info(asset: &SourceAsset) {
    println!("  Kind: motion");
    rig_info(&asset.rig);

    let clip = &asset.clip;
    let table = BoneCorrespondenceTable::mixamo();
    println!("  Clip: {:?}", clip.name);
    println!("    Duration: {}s", clip.duration);
    println!("    Tracks ({} total):", clip.tracks.len());
    for track in &clip.tracks {
        print!("      {} ({} keys) ", track.path(), track.num_keyframes());
        match table.lookup(track.bone()) {
            Some(bone) => println!("-> {}", bone),
            None => println!("(unmapped)"),
        }
    }
}

fn avatar_info(avatar: &Avatar) {
    println!("  Kind: avatar");
    println!("  Name: {:?}", avatar.name);
    println!("  Convention: {}", avatar.convention.name());
    rig_info(&avatar.rig);
    match avatar.hips_height() {
        Some(h) => println!("  Hips Height: {}", h),
        None => println!("  Hips Height: (no hips bone)"),
    }
    println!("  Humanoid Bones ({} of {}):",
        avatar.num_humanoid_bones(), ALL_HUMANOID_BONES.len());
    for &bone in ALL_HUMANOID_BONES {
        if let Some(node) = avatar.node_name(bone) {
            println!("    {}: {}", bone, node);
        }
    }
}
