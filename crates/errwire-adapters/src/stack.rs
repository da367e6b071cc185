//! `StackTrace`: a call stack captured where an error was created.
//!
//! A captured stack is bound to the process that took it. It implements
//! neither `Serialize` nor `Clone`; codecs ship its rendered text instead.

use std::backtrace::Backtrace;
use std::fmt;

enum Frames {
    Captured(Backtrace),
    Rendered(Vec<String>),
}

pub struct StackTrace {
    frames: Frames,
}

impl StackTrace {
    /// Capture the current call stack, regardless of `RUST_BACKTRACE`.
    pub fn capture() -> Self {
        Self {
            frames: Frames::Captured(Backtrace::force_capture()),
        }
    }

    /// Build a stack from already-rendered frame lines.
    pub fn from_frames<I, S>(frames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            frames: Frames::Rendered(frames.into_iter().map(Into::into).collect()),
        }
    }
}

impl fmt::Display for StackTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.frames {
            Frames::Captured(bt) => write!(f, "{bt}"),
            Frames::Rendered(lines) => f.write_str(&lines.join("\n")),
        }
    }
}

impl fmt::Debug for StackTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.frames {
            Frames::Captured(_) => f.write_str("StackTrace(<captured>)"),
            Frames::Rendered(lines) => f.debug_tuple("StackTrace").field(lines).finish(),
        }
    }
}
