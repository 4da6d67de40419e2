//! Frame flag bits and the caller-facing [`Flag`].
//!
//! Only two bits are defined on the wire. Everything else is reserved and
//! rejected by the decoder.

/// Another frame of the same message follows.
pub const MORE: u8 = 0x01;

/// Connection-level traffic (greeting, subscriptions). Never surfaced to
/// socket callers.
pub const COMMAND: u8 = 0x04;

/// All bits a valid frame may carry.
pub const KNOWN_FLAGS: u8 = MORE | COMMAND;

/// Continuation flag passed to and returned from the frame primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum Flag {
    /// This is the last frame of its message.
    #[default]
    None,
    /// Another frame belonging to the same message follows.
    More,
}

impl Flag {
    pub fn from_more(more: bool) -> Self {
        if more {
            Flag::More
        } else {
            Flag::None
        }
    }

    pub fn is_more(self) -> bool {
        matches!(self, Flag::More)
    }

    pub(crate) fn bits(self) -> u8 {
        match self {
            Flag::None => 0,
            Flag::More => MORE,
        }
    }
}

/// Returns true if `flags` only uses defined bits and a command frame does
/// not claim continuation.
pub fn is_valid(flags: u8) -> bool {
    flags & !KNOWN_FLAGS == 0 && !(flags & COMMAND != 0 && flags & MORE != 0)
}

/// Short human-readable description of a flags byte, for diagnostics.
pub fn describe(flags: u8) -> &'static str {
    match (flags & COMMAND != 0, flags & MORE != 0) {
        (true, _) => "COMMAND",
        (false, true) => "MORE",
        (false, false) => "LAST",
    }
}
