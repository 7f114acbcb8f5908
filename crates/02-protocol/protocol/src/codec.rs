use serde_json::{json, Map, Value};
use transport::Message;

use crate::envelope::{Args, CommandEnvelope, NodeMml, ResultEnvelope, ResultPayload};
use crate::error::{ProtocolError, ProtocolResult};
use crate::schema::{Command, CorrelationId, ResultTag, FIELD_ARGS, FIELD_CMD, FIELD_ID};

/// Converts typed envelopes to and from channel messages.
pub trait Codec: Clone + Send + Sync + 'static {
    type Cmd: Send + 'static;
    type Rep: Send + 'static;

    fn encode_cmd(&self, cmd: &Self::Cmd) -> ProtocolResult<Message>;
    /// `Ok(None)` means the message does not name a known command and must be ignored.
    fn decode_cmd(&self, raw: &Message) -> ProtocolResult<Option<Self::Cmd>>;
    fn encode_rep(&self, rep: &Self::Rep) -> ProtocolResult<Message>;
    fn decode_rep(&self, raw: &Message) -> ProtocolResult<Self::Rep>;
}

/// JSON object codec for the `{cmd, id, args}` wire shape.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    type Cmd = CommandEnvelope;
    type Rep = ResultEnvelope;

    fn encode_cmd(&self, cmd: &Self::Cmd) -> ProtocolResult<Message> {
        Ok(json!({
            FIELD_CMD: cmd.command.tag(),
            FIELD_ID: cmd.id,
            FIELD_ARGS: cmd.args,
        }))
    }

    fn decode_cmd(&self, raw: &Message) -> ProtocolResult<Option<Self::Cmd>> {
        let Some(object) = raw.as_object() else {
            return Ok(None);
        };
        let Some(command) = object
            .get(FIELD_CMD)
            .and_then(Value::as_str)
            .and_then(Command::from_tag)
        else {
            return Ok(None);
        };

        let id = correlation_id(object)?;
        let args = match object.get(FIELD_ARGS) {
            None | Some(Value::Null) => Value::Object(Map::new()),
            Some(args) => args.clone(),
        };

        Ok(Some(CommandEnvelope { command, id, args }))
    }

    fn encode_rep(&self, rep: &Self::Rep) -> ProtocolResult<Message> {
        let args = match &rep.payload {
            ResultPayload::Active { status } => json!({ "status": status }),
            ResultPayload::NodeMml(node) => serde_json::to_value(node)?,
        };
        Ok(json!({
            FIELD_CMD: rep.tag().tag(),
            FIELD_ID: rep.id,
            FIELD_ARGS: args,
        }))
    }

    fn decode_rep(&self, raw: &Message) -> ProtocolResult<Self::Rep> {
        let object = raw.as_object().ok_or(ProtocolError::NotAnObject)?;
        let tag = object
            .get(FIELD_CMD)
            .ok_or(ProtocolError::MissingField(FIELD_CMD))?
            .as_str()
            .ok_or(ProtocolError::InvalidField(FIELD_CMD))?;
        let tag =
            ResultTag::from_tag(tag).ok_or_else(|| ProtocolError::UnknownResultTag(tag.into()))?;
        let id = correlation_id(object)?;
        let args = object
            .get(FIELD_ARGS)
            .cloned()
            .ok_or(ProtocolError::MissingField(FIELD_ARGS))?;

        let payload = match tag {
            ResultTag::Active => {
                let status = args
                    .get("status")
                    .ok_or(ProtocolError::MissingField("status"))?
                    .as_bool()
                    .ok_or(ProtocolError::InvalidField("status"))?;
                ResultPayload::Active { status }
            }
            ResultTag::NodeMml => ResultPayload::NodeMml(serde_json::from_value::<NodeMml>(args)?),
        };

        Ok(ResultEnvelope { id, payload })
    }
}

fn correlation_id(object: &Map<String, Value>) -> ProtocolResult<CorrelationId> {
    object
        .get(FIELD_ID)
        .ok_or(ProtocolError::MissingField(FIELD_ID))?
        .as_str()
        .map(CorrelationId::from)
        .ok_or(ProtocolError::InvalidField(FIELD_ID))
}
