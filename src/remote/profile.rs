//! Profile-related stuff.

use std::fmt;

/// Profile.
///
/// See <https://www.w3.org/TR/json-ld11/#iana-considerations>.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Profile {
    /// Compacted.
    Compacted,
    /// Context.
    Context,
    /// Expanded.
    Expanded,
    /// Flattened.
    Flattened,
    /// Frame.
    Frame,
    /// Framed.
    Framed,
}

impl Profile {
    /// Returns the URI.
    pub fn uri(self) -> &'static str {
        macro_rules! profile_uri {
            ($frag:expr) => {
                concat!("http://www.w3.org/ns/json-ld#", $frag)
            };
        }

        match self {
            Self::Compacted => profile_uri!("compacted"),
            Self::Context => profile_uri!("context"),
            Self::Expanded => profile_uri!("expanded"),
            Self::Flattened => profile_uri!("flattened"),
            Self::Frame => profile_uri!("frame"),
            Self::Framed => profile_uri!("framed"),
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.uri())
    }
}
