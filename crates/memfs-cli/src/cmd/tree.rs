use comfy_table::{presets::UTF8_FULL_CONDENSED, Table};
use memfs_core::config::MemFsConfig;
use memfs_core::filesystem::node::EntryKind;
use memfs_core::FileSystem;

pub fn run(config: &MemFsConfig, json: bool) -> anyhow::Result<()> {
    let fs = FileSystem::load(config)?;
    let map = fs.memory_map();
    let stats = fs.stats();

    if json {
        let out = serde_json::json!({
            "current_path": fs.current_path(),
            "entries": map,
            "stats": stats,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec!["Path", "Type", "Size"]);
    for entry in &map {
        let (ftype, size) = match entry.kind {
            EntryKind::Dir => ("dir", String::new()),
            EntryKind::File => ("file", entry.size.unwrap_or(0).to_string()),
        };
        table.add_row(vec![entry.path.as_str(), ftype, size.as_str()]);
    }
    println!("{table}");
    println!(
        "{} directories, {} files, {} characters",
        stats.dir_count, stats.file_count, stats.total_chars
    );
    Ok(())
}
