//! Drives the library the way a host would: load assets from disk,
//! retarget, write the clip out, then react to a line of text.

use marionette::asset;
use marionette::avatar::{AvatarRuntime, Classification, MotionLibrary, RigConvention};
use marionette::errors::ErrorKind;
use marionette::rig::HumanoidBone;
use marionette::speech::{AudioEvent, ManualClock, MouthShape, SpeechSession};
use std::path::PathBuf;

const MOTION: &str = r#"{
    "bones": [
        { "name": "Armature" },
        { "name": "mixamorig:Hips", "parent": "Armature", "translation": [0, 100, 0] },
        { "name": "mixamorig:Spine", "parent": "mixamorig:Hips", "translation": [0, 10, 0] },
        { "name": "mixamorig:Tail", "parent": "mixamorig:Spine" }
    ],
    "clip": {
        "name": "Wave",
        "duration": 2,
        "tracks": [
            { "name": "mixamorig:Hips.position", "times": [0, 1], "values": [0, 100, 0, 10, 100, 20] },
            { "name": "mixamorig:Spine.quaternion", "times": [0, 1], "values": [0, 0, 0, 1, 0, 1, 0, 0] },
            { "name": "mixamorig:Tail.quaternion", "times": [0], "values": [0, 0, 0, 1] }
        ]
    }
}"#;

fn avatar_json(meta_version: &str) -> String {
    format!(r#"{{
        "name": "Test",
        "metaVersion": "{}",
        "bones": [
            {{ "name": "Root" }},
            {{ "name": "J_Hips", "parent": "Root", "translation": [0, 1, 0] }},
            {{ "name": "J_Spine", "parent": "J_Hips", "translation": [0, 0.1, 0] }}
        ],
        "humanoid": {{ "hips": "J_Hips", "spine": "J_Spine" }}
    }}"#, meta_version)
}

/// A scratch file that is removed when dropped.
struct TempFile(PathBuf);

impl TempFile {
    fn new(name: &str, contents: &[u8]) -> TempFile {
        let path = std::env::temp_dir()
            .join(format!("marionette-{}-{}", std::process::id(), name));
        std::fs::write(&path, contents).unwrap();
        TempFile(path)
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.0);
    }
}

fn assert_close(a: &[f32], b: &[f32]) {
    assert_eq!(a.len(), b.len());
    for (x, y) in a.iter().zip(b) {
        assert!((x - y).abs() < 1e-5, "{:?} != {:?}", a, b);
    }
}

#[test]
fn retarget_from_disk_and_write() {
    let motion = TempFile::new("wave.json", MOTION.as_bytes());
    let avatar = TempFile::new("avatar.json", avatar_json("1").as_bytes());
    let out = TempFile::new("out.json", b"");

    let source = asset::load_source_asset(&motion.0).unwrap();
    let avatar = asset::load_avatar(&avatar.0).unwrap();
    let clip = marionette::retarget::retarget(&source.clip, &source.rig, &avatar);

    assert_eq!(clip.name, "Wave.retargeted");
    assert_eq!(clip.duration, 2.0);
    // The tail bone isn't humanoid.
    assert_eq!(clip.tracks.len(), 2);

    let hips = &clip.tracks[0];
    assert_eq!(hips.target, HumanoidBone::Hips);
    assert_eq!(hips.path(), "J_Hips.position");
    assert_close(hips.values.as_slice(), &[0.0, 1.0, 0.0, 0.1, 1.0, 0.2]);

    // Identity rest poses leave rotations alone.
    let spine = &clip.tracks[1];
    assert_eq!(spine.path(), "J_Spine.quaternion");
    assert_close(spine.values.as_slice(), &[0.0, 0.0, 0.0, 1.0, 0.0, 1.0, 0.0, 0.0]);

    asset::write::write_clip(&clip, &out.0).unwrap();
    let written = json::parse(&std::fs::read_to_string(&out.0).unwrap()).unwrap();
    assert_eq!(written["name"], "Wave.retargeted");
    assert_eq!(written["tracks"].len(), 2);
    assert_eq!(written["tracks"][1]["humanoid"], "spine");
}

#[test]
fn legacy_avatar_flips_x_and_z() {
    let source = asset::parse_source_asset(MOTION).unwrap();
    let avatar = asset::parse_avatar(&avatar_json("0")).unwrap();
    assert_eq!(avatar.convention, RigConvention::LegacyAxis);

    let clip = marionette::retarget::retarget(&source.clip, &source.rig, &avatar);
    assert_close(clip.tracks[0].values.as_slice(), &[0.0, 1.0, 0.0, -0.1, 1.0, -0.2]);
    assert_close(clip.tracks[1].values.as_slice(), &[0.0, 0.0, 0.0, 1.0, 0.0, 1.0, 0.0, 0.0]);
}

#[test]
fn foreign_containers_are_refused() {
    let cases: &[(&str, &[u8])] = &[
        ("a.fbx", b"Kaydara FBX Binary  \x00\x1a\x00"),
        ("a.glb", b"glTF\x02\x00\x00\x00"),
        ("a.bvh", b"HIERARCHY\nROOT Hips\n{\n}\n"),
    ];
    for &(name, bytes) in cases {
        let file = TempFile::new(name, bytes);
        match asset::load_source_asset(&file.0) {
            Err(e) => match e.kind() {
                ErrorKind::UnsupportedContainer(_) => (),
                k => panic!("{}: wrong error {:?}", name, k),
            },
            Ok(_) => panic!("{} loaded", name),
        }
    }
}

#[test]
fn missing_file_is_an_error() {
    let path = std::env::temp_dir().join("marionette-does-not-exist.json");
    assert!(asset::load_avatar(&path).is_err());
}

#[test]
fn react_to_a_line_of_text() {
    let source = asset::parse_source_asset(MOTION).unwrap();
    let avatar = asset::parse_avatar(&avatar_json("1")).unwrap();

    let mut library = MotionLibrary::new();
    library.insert("Idle", marionette::retarget::retarget(&source.clip, &source.rig, &avatar));
    library.insert("Wave", marionette::retarget::retarget(&source.clip, &source.rig, &avatar));

    let mut runtime = AvatarRuntime::for_avatar(&avatar, Default::default());
    runtime.play("Idle");

    let reaction = Classification {
        expression: "happy".to_string(),
        animation_name: "Wave".to_string(),
        emotion_tag: "joy".to_string(),
        intensity: 0.5,
    };
    runtime.apply(&reaction, &library);

    let clock = ManualClock::new(10.0);
    let mut session = SpeechSession::new("hi bob", &Default::default());
    session.handle(AudioEvent::Started, &mut runtime, &clock);
    session.handle(AudioEvent::Ready { duration: 1.4 }, &mut runtime, &clock);

    let mut opened = false;
    for _ in 0..14 {
        clock.advance(0.1);
        runtime.tick(0.1);
        session.tick(&mut runtime, &clock);
        opened |= !runtime.mouth().is_closed();
    }
    assert!(opened);

    // The fade to Wave finished halfway through the line.
    {
        let playing = runtime.animation().playing();
        assert_eq!(playing.len(), 1);
        assert_eq!(playing[0].action, "Wave");
    }

    session.handle(AudioEvent::Ended, &mut runtime, &clock);
    assert_eq!(runtime.mouth(), MouthShape::ZERO);
    assert_eq!(runtime.expression("happy"), 0.5);
    assert!(!session.tick(&mut runtime, &clock));
}
