use memfs_core::config::MemFsConfig;
use memfs_core::FileSystem;
use rustyline::error::ReadlineError;

/// Interactive loop. `exit` saves; Ctrl-C / Ctrl-D leave without saving.
pub fn run(config: &MemFsConfig) -> anyhow::Result<()> {
    let fs = FileSystem::load(config)?;
    let mut rl = rustyline::DefaultEditor::new()?;

    loop {
        let line = match rl.readline(&prompt_string(&fs)) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => {
                println!("Leaving without saving.");
                return Ok(());
            }
            Err(e) => {
                eprintln!("Input error: {e}");
                return Ok(());
            }
        };

        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        rl.add_history_entry(input)?;

        if input == "exit" {
            break;
        }

        match fs.execute(input) {
            Ok(out) if out.is_empty() => {}
            Ok(out) => println!("{out}"),
            Err(e) => println!("Error: {e}"),
        }
    }

    if config.autosave {
        fs.save(config)?;
        println!("File system saved to {}", config.snapshot_path.display());
    }
    Ok(())
}

/// `/a/b/ > `, or `/a/b/ [notes] > ` while a file is open.
fn prompt_string(fs: &FileSystem) -> String {
    let path = fs.current_path();
    match fs.open_file_info() {
        Some(open) => format!("{path} [{}] > ", open.name),
        None => format!("{path} > "),
    }
}
