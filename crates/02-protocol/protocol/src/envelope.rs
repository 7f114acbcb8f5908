use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::schema::{Command, CorrelationId, ResultTag};

/// Raw `args` of a command envelope, exactly as received. Usually an object;
/// each handler decides what shape it accepts.
pub type Args = Value;

/// Inbound request: `{cmd, id, args}`.
#[derive(Clone, Debug, PartialEq)]
pub struct CommandEnvelope {
    pub command: Command,
    pub id: CorrelationId,
    pub args: Args,
}

impl CommandEnvelope {
    pub fn new(command: Command, id: impl Into<CorrelationId>, args: Args) -> Self {
        Self {
            command,
            id: id.into(),
            args,
        }
    }

    /// Envelope for commands that take no arguments.
    pub fn bare(command: Command, id: impl Into<CorrelationId>) -> Self {
        Self::new(command, id, Value::Object(Map::new()))
    }

    /// Builds an envelope whose args are the serialized form of `args`.
    pub fn with_args<T: Serialize>(
        command: Command,
        id: impl Into<CorrelationId>,
        args: &T,
    ) -> serde_json::Result<Self> {
        Ok(Self::new(command, id, serde_json::to_value(args)?))
    }
}

/// Arguments of `TexToMml` and `AsciiMathToMml`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertArgs {
    /// Expression source text.
    pub alt: String,
    /// Element id echoed back as `elementId`.
    pub id: String,
}

/// Arguments of `RegSig`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalArgs {
    pub sig: String,
}

/// Markup produced for one math node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeMml {
    pub mathml: String,
    pub element_id: String,
}

/// Result-specific payload; determines the envelope's [`ResultTag`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResultPayload {
    Active { status: bool },
    NodeMml(NodeMml),
}

/// Outbound result: `{cmd, id, args}` with `cmd` taken from the payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResultEnvelope {
    pub id: CorrelationId,
    pub payload: ResultPayload,
}

impl ResultEnvelope {
    pub fn active(id: CorrelationId, status: bool) -> Self {
        Self {
            id,
            payload: ResultPayload::Active { status },
        }
    }

    pub fn node_mml(id: CorrelationId, mathml: String, element_id: String) -> Self {
        Self {
            id,
            payload: ResultPayload::NodeMml(NodeMml {
                mathml,
                element_id,
            }),
        }
    }

    pub fn tag(&self) -> ResultTag {
        match self.payload {
            ResultPayload::Active { .. } => ResultTag::Active,
            ResultPayload::NodeMml(_) => ResultTag::NodeMml,
        }
    }

    pub fn status(&self) -> Option<bool> {
        match self.payload {
            ResultPayload::Active { status } => Some(status),
            ResultPayload::NodeMml(_) => None,
        }
    }

    pub fn node(&self) -> Option<&NodeMml> {
        match &self.payload {
            ResultPayload::NodeMml(node) => Some(node),
            ResultPayload::Active { .. } => None,
        }
    }

    pub fn into_node(self) -> Option<NodeMml> {
        match self.payload {
            ResultPayload::NodeMml(node) => Some(node),
            ResultPayload::Active { .. } => None,
        }
    }
}
