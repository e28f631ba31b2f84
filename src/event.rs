use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A message instance addressed to an updater by its type name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub name: String,
    #[serde(default)]
    pub data: Value,
}

impl Message {
    pub fn new(name: impl Into<String>, data: Value) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }
}

/// A side-effecting instruction emitted alongside a state transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    pub name: String,
    #[serde(default)]
    pub data: Value,
}

impl Command {
    pub fn new(name: impl Into<String>, data: Value) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }
}

/// Commands as updaters emit them: possibly nested, possibly empty.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Cmd {
    #[default]
    None,
    Run(Command),
    Batch(Vec<Cmd>),
}

impl Cmd {
    pub fn run(name: impl Into<String>, data: Value) -> Self {
        Cmd::Run(Command::new(name, data))
    }

    pub fn batch(cmds: impl IntoIterator<Item = Cmd>) -> Self {
        Cmd::Batch(cmds.into_iter().collect())
    }

    /// Flattens nested batches depth-first, dropping empty entries.
    pub fn flatten(&self) -> Vec<Command> {
        let mut out = Vec::new();
        self.flatten_into(&mut out);
        out
    }

    fn flatten_into(&self, out: &mut Vec<Command>) {
        match self {
            Cmd::None => {}
            Cmd::Run(command) => out.push(command.clone()),
            Cmd::Batch(cmds) => cmds.iter().for_each(|cmd| cmd.flatten_into(out)),
        }
    }
}

impl From<Command> for Cmd {
    fn from(command: Command) -> Self {
        Cmd::Run(command)
    }
}

/// Flattens a list of command trees in order.
pub fn flatten_commands<'a>(cmds: impl IntoIterator<Item = &'a Cmd>) -> Vec<Command> {
    cmds.into_iter().flat_map(Cmd::flatten).collect()
}

/// Wire form of a command: `[name, data]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedCommand(pub String, pub Value);

impl From<Command> for SerializedCommand {
    fn from(command: Command) -> Self {
        SerializedCommand(command.name, command.data)
    }
}

impl From<SerializedCommand> for Command {
    fn from(SerializedCommand(name, data): SerializedCommand) -> Self {
        Command { name, data }
    }
}

/// One captured message dispatch, as delivered to backends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapturedEvent {
    /// Session token followed by a per-process counter
    pub id: String,
    /// Wall clock time of capture, in milliseconds
    pub ts: u64,
    /// Id of the execution context that dispatched the message
    pub context: String,
    /// Container name, or `Unknown`
    pub name: String,
    /// Message type name, or `Init (<container>)` for initialization
    pub message: String,
    #[serde(default)]
    pub data: Value,
    pub prev: Value,
    pub next: Value,
    #[serde(default)]
    pub path: Vec<String>,
    #[serde(default)]
    pub relay: Value,
    #[serde(default)]
    pub commands: Vec<SerializedCommand>,
}

impl CapturedEvent {
    pub fn has_commands(&self) -> bool {
        !self.commands.is_empty()
    }
}
