use anyhow::Context;
use mini_shell::{Config, Interpreter, logging, signal};

fn main() -> anyhow::Result<()> {
    let config: Config = argh::from_env();
    logging::init(&config.log_level);
    signal::install().context("failed to install SIGINT handler")?;

    tracing::debug!(?config, "starting shell");
    Interpreter::default()
        .with_prompt(config.prompt.as_str())
        .repl(config.use_editor())
}
