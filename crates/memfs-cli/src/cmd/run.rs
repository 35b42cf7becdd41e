use clap::Args;
use memfs_core::config::MemFsConfig;
use memfs_core::{Command, FileSystem};

#[derive(Args)]
pub struct RunArgs {
    /// Command and its arguments, e.g. `write "some text" 0`
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    pub words: Vec<String>,
}

/// Execute one command, then save. The invoking shell has already split the
/// words, so quoted payloads arrive as single arguments.
pub fn run(args: RunArgs, config: &MemFsConfig) -> anyhow::Result<()> {
    let fs = FileSystem::load(config)?;
    let cmd = Command::from_tokens(&args.words)?;
    let out = fs.run(&cmd)?;
    if !out.is_empty() {
        println!("{out}");
    }
    if config.autosave {
        fs.save(config)?;
    }
    Ok(())
}
