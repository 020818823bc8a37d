//! Loading source motion assets and avatars from disk.
//!
//! Both are read from JSON containers. Other containers we know of are
//! recognized by their magic and refused with `UnsupportedContainer`, so the
//! caller gets a clear load failure instead of a JSON syntax error. A failed
//! load returns before anything is handed to an `AvatarRuntime`.

mod read;
pub mod write;

use crate::animation::Clip;
use crate::avatar::Avatar;
use crate::errors::{ErrorKind, Result, ResultExt};
use crate::rig::Rig;
use std::path::Path;

pub use self::read::{parse_avatar, parse_source_asset};

/// A motion asset: the skeleton the clip was recorded on, in its bind pose,
/// and the clip.
pub struct SourceAsset {
    pub rig: Rig,
    pub clip: Clip,
}

/// Kinds of file `sniff` can tell apart.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Container {
    Json,
    BinaryFbx,
    AsciiFbx,
    Glb,
    Bvh,
    Unknown,
}

impl Container {
    pub fn describe(self) -> &'static str {
        match self {
            Container::Json => "JSON",
            Container::BinaryFbx => "binary FBX",
            Container::AsciiFbx => "ASCII FBX",
            Container::Glb => "binary glTF",
            Container::Bvh => "BVH",
            Container::Unknown => "unknown",
        }
    }
}

pub fn sniff(buf: &[u8]) -> Container {
    let start = buf.iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(buf.len());
    let head = &buf[start..];

    if buf.starts_with(b"Kaydara FBX Binary") {
        Container::BinaryFbx
    } else if buf.starts_with(b"glTF") {
        Container::Glb
    } else if head.starts_with(b"HIERARCHY") {
        Container::Bvh
    } else if head.starts_with(b"; FBX") {
        Container::AsciiFbx
    } else if head.starts_with(b"{") {
        Container::Json
    } else {
        Container::Unknown
    }
}

pub fn read_json_container(path: &Path) -> Result<String> {
    let buf = std::fs::read(path)
        .chain_err(|| format!("couldn't read {}", path.display()))?;

    match sniff(&buf) {
        Container::Json => (),
        other => bail!(ErrorKind::UnsupportedContainer(format!(
            "{} is {} data; only JSON assets are supported",
            path.display(), other.describe(),
        ))),
    }

    match String::from_utf8(buf) {
        Ok(s) => Ok(s),
        Err(_) => bail!(ErrorKind::MalformedAsset(format!(
            "{} is not valid UTF-8", path.display(),
        ))),
    }
}

pub fn load_source_asset(path: &Path) -> Result<SourceAsset> {
    debug!("loading motion from {}", path.display());
    let text = read_json_container(path)?;
    parse_source_asset(&text)
        .chain_err(|| format!("failed to load motion {}", path.display()))
}

pub fn load_avatar(path: &Path) -> Result<Avatar> {
    debug!("loading avatar from {}", path.display());
    let text = read_json_container(path)?;
    parse_avatar(&text)
        .chain_err(|| format!("failed to load avatar {}", path.display()))
}

#[test]
fn test_sniff() {
    assert_eq!(sniff(b"Kaydara FBX Binary  \0\x1a\0"), Container::BinaryFbx);
    assert_eq!(sniff(b"glTF\x02\0\0\0"), Container::Glb);
    assert_eq!(sniff(b"HIERARCHY\nROOT Hips"), Container::Bvh);
    assert_eq!(sniff(b"; FBX 7.4.0 project file"), Container::AsciiFbx);
    assert_eq!(sniff(b"\n  { \"bones\": [] }"), Container::Json);
    assert_eq!(sniff(b""), Container::Unknown);
    assert_eq!(sniff(b"\x89PNG"), Container::Unknown);
}
