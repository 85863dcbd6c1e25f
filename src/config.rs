use argh::FromArgs;
use std::io::IsTerminal;

pub const DEFAULT_PROMPT: &str = "mini-shell>";
pub const DEFAULT_LOG_LEVEL: &str = "warn";

#[derive(FromArgs, Debug, Clone, PartialEq, Eq)]
/// A minimal interactive shell with builtins and two-command pipelines.
pub struct Config {
    #[argh(option, default = "String::from(DEFAULT_PROMPT)")]
    /// text printed before each input line.
    pub prompt: String,

    #[argh(option, default = "String::from(DEFAULT_LOG_LEVEL)")]
    /// log filter used when RUST_LOG is unset, e.g. "debug".
    pub log_level: String,

    #[argh(switch)]
    /// read plain lines from standard input even when it is a terminal.
    pub no_editor: bool,
}

impl Config {
    /// Line editing needs a terminal on standard input.
    pub fn use_editor(&self) -> bool {
        !self.no_editor && std::io::stdin().is_terminal()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prompt: DEFAULT_PROMPT.to_string(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            no_editor: false,
        }
    }
}
