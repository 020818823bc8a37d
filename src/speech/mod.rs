//! Lip-sync from text.
//!
//! ```text
//!     text --phoneme--> [Phoneme] --viseme--> VisemeTimeline
//!          --scheduler--> MouthShape per frame
//! ```
//!
//! `SpeechSession` ties the pieces to an audio session.

pub mod clock;
pub mod phoneme;
pub mod scheduler;
pub mod session;
pub mod viseme;

pub use self::clock::{AudioClock, ManualClock, SystemClock};
pub use self::phoneme::{approximate, Phoneme};
pub use self::scheduler::LipSyncScheduler;
pub use self::session::{AudioEvent, SpeechSession, SpeechSettings};
pub use self::viseme::{mouth_shape, MouthShape, VisemeFrame, VisemeTimeline};
