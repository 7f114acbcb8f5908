use bridge_protocol::{Command, CommandEnvelope};
use math_adapter::MathAdapter;

use crate::config::BridgeConfig;
use crate::error::BridgeResult;
use crate::handlers::{self, Completion, Handler};

/// Static command table. The match is exhaustive, so adding a command without a
/// handler does not compile.
pub(crate) fn handler_for<A: MathAdapter>(command: Command) -> Handler<A> {
    match command {
        Command::Active => handlers::active,
        Command::AllJax => handlers::all_jax,
        Command::AsciiMathToMml => handlers::ascii_math_to_mml,
        Command::TexToMml => handlers::tex_to_mml,
        Command::InjectScripts => handlers::inject_scripts,
        Command::RegSig => handlers::reg_sig,
    }
}

/// Invokes the one handler registered for `envelope.command`.
pub(crate) fn route<A: MathAdapter>(
    adapter: &A,
    config: &BridgeConfig,
    envelope: CommandEnvelope,
) -> BridgeResult<Completion> {
    let CommandEnvelope { command, id, args } = envelope;
    let handler = handler_for::<A>(command);
    handler(adapter, config, id, &args)
}
