//! Drives a humanoid avatar from retargeted body-motion clips and from
//! text-derived lip-sync.
//!
//! The two pipelines are independent:
//!
//! * `asset` → `retarget` → `avatar::MotionLibrary` → crossfade in
//!   `avatar::AvatarRuntime`
//! * text → `speech::phoneme` → `speech::viseme` → `speech::scheduler`, driven
//!   by a `speech::SpeechSession`
//!
//! Both write into the same `AvatarRuntime`. Nothing here renders or plays
//! audio; a host calls `tick` once per frame.

#![recursion_limit = "1024"] // for error_chain

#[macro_use]
extern crate log;
#[macro_use]
extern crate error_chain;

#[macro_use]
pub mod errors;
pub mod logger;
pub mod version;

pub mod animation;
pub mod asset;
pub mod avatar;
pub mod retarget;
pub mod rig;
pub mod speech;
