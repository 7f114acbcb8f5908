//! Wire-visible names: command tags, result tags, field keys, and the handoff sentinel.
//!
//! Tag strings are part of the protocol; renaming one breaks older peers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Sentinel carried by the page-global handoff broadcast.
pub const DEFAULT_SENTINEL: &str = "math-bridge:port";

/// Key holding the command or result tag.
pub const FIELD_CMD: &str = "cmd";
/// Key holding the correlation id.
pub const FIELD_ID: &str = "id";
/// Key holding the argument or payload object.
pub const FIELD_ARGS: &str = "args";

/// Commands the page-side bridge understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Command {
    /// Presence check for the math library.
    Active,
    /// Markup for every math node already known to the library.
    AllJax,
    /// Convert an AsciiMath expression.
    AsciiMathToMml,
    /// Convert a TeX expression.
    TexToMml,
    /// Inject the library configuration and loader into the page.
    InjectScripts,
    /// Standing subscription to a named library signal.
    RegSig,
}

impl Command {
    pub const ALL: [Command; 6] = [
        Command::Active,
        Command::AllJax,
        Command::AsciiMathToMml,
        Command::TexToMml,
        Command::InjectScripts,
        Command::RegSig,
    ];

    pub fn tag(self) -> &'static str {
        match self {
            Command::Active => "Active",
            Command::AllJax => "AllJax",
            Command::AsciiMathToMml => "AsciiMathToMml",
            Command::TexToMml => "TexToMml",
            Command::InjectScripts => "InjectScripts",
            Command::RegSig => "RegSig",
        }
    }

    /// Resolves a wire tag. Unknown tags yield `None`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Command::ALL.into_iter().find(|command| command.tag() == tag)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Tags carried by result envelopes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResultTag {
    Active,
    NodeMml,
}

impl ResultTag {
    pub fn tag(self) -> &'static str {
        match self {
            ResultTag::Active => "Active",
            ResultTag::NodeMml => "NodeMml",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "Active" => Some(ResultTag::Active),
            "NodeMml" => Some(ResultTag::NodeMml),
            _ => None,
        }
    }
}

impl fmt::Display for ResultTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Opaque caller-chosen token linking a request to its responses.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(String);

impl CorrelationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CorrelationId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for CorrelationId {
    fn from(value: String) -> Self {
        Self(value)
    }
}
