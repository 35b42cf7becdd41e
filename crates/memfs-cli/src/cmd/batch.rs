use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Args;
use comfy_table::{presets::UTF8_FULL_CONDENSED, Table};
use memfs_core::config::MemFsConfig;
use memfs_core::FileSystem;
use tokio::task::JoinSet;
use tracing::{info, warn};

#[derive(Args)]
pub struct BatchArgs {
    /// Command files, one worker per file
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Directory for result logs (default: beside each input file)
    #[arg(long)]
    pub log_dir: Option<PathBuf>,
}

/// What one worker did.
#[derive(Debug)]
pub struct WorkerReport {
    pub index: usize,
    pub input: PathBuf,
    pub log: PathBuf,
    pub commands: usize,
    pub failures: usize,
}

pub async fn run(args: BatchArgs, config: &MemFsConfig, json: bool) -> anyhow::Result<()> {
    let fs = Arc::new(FileSystem::load(config)?);
    let reports = run_workers(Arc::clone(&fs), &args.files, config.log_dir.as_deref()).await?;

    // Saved once, after every worker has joined.
    if config.autosave {
        fs.save(config)?;
    }

    if json {
        let rows: Vec<_> = reports
            .iter()
            .map(|r| {
                serde_json::json!({
                    "worker": r.index,
                    "input": r.input.display().to_string(),
                    "log": r.log.display().to_string(),
                    "commands": r.commands,
                    "failures": r.failures,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);
        table.set_header(vec!["Worker", "Input", "Commands", "Failures", "Log"]);
        for r in &reports {
            table.add_row(vec![
                r.index.to_string(),
                r.input.display().to_string(),
                r.commands.to_string(),
                r.failures.to_string(),
                r.log.display().to_string(),
            ]);
        }
        println!("{table}");
    }
    Ok(())
}

/// Run every command file on its own blocking worker against the shared tree.
///
/// Reports come back in input order.
pub async fn run_workers(
    fs: Arc<FileSystem>,
    files: &[PathBuf],
    log_dir: Option<&Path>,
) -> anyhow::Result<Vec<WorkerReport>> {
    let mut set = JoinSet::new();
    let logs = assign_logs(files, log_dir);
    for (index, (input, log)) in files.iter().zip(logs).enumerate() {
        let fs = Arc::clone(&fs);
        let input = input.clone();
        set.spawn_blocking(move || run_worker(index, &fs, input, log));
    }

    let mut reports = Vec::with_capacity(files.len());
    while let Some(joined) = set.join_next().await {
        reports.push(joined??);
    }
    reports.sort_by_key(|r| r.index);
    Ok(reports)
}

/// `<stem>.log`, in `log_dir` if given, else next to the input.
fn log_path(input: &Path, log_dir: Option<&Path>) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "worker".to_string());
    let dir = log_dir
        .map(Path::to_path_buf)
        .or_else(|| input.parent().map(Path::to_path_buf))
        .unwrap_or_default();
    dir.join(format!("{stem}.log"))
}

/// Log path per input. Inputs whose logs would collide get the worker index
/// added: `<stem>.<index>.log`.
fn assign_logs(files: &[PathBuf], log_dir: Option<&Path>) -> Vec<PathBuf> {
    let logs: Vec<PathBuf> = files.iter().map(|f| log_path(f, log_dir)).collect();
    let mut seen: HashMap<&Path, usize> = HashMap::new();
    for log in &logs {
        *seen.entry(log.as_path()).or_default() += 1;
    }

    logs.iter()
        .enumerate()
        .map(|(index, log)| {
            if seen[log.as_path()] == 1 {
                return log.clone();
            }
            let stem = log
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let unique = log.with_file_name(format!("{stem}.{index}.log"));
            warn!(shared = %log.display(), log = %unique.display(), "log name collision, adding worker index");
            unique
        })
        .collect()
}

fn run_worker(
    index: usize,
    fs: &FileSystem,
    input: PathBuf,
    log: PathBuf,
) -> anyhow::Result<WorkerReport> {
    let script = std::fs::read_to_string(&input)
        .with_context(|| format!("reading {}", input.display()))?;

    let mut out = String::new();
    let mut commands = 0;
    let mut failures = 0;
    for line in script.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line == "exit" {
            break;
        }
        commands += 1;

        let result = match fs.execute(line) {
            Ok(result) => result,
            Err(e) => {
                failures += 1;
                warn!(worker = index, command = line, error = %e, "command failed");
                format!("Error: {e}")
            }
        };
        out.push_str("> ");
        out.push_str(line);
        out.push('\n');
        if !result.is_empty() {
            out.push_str(&result);
            out.push('\n');
        }
    }

    std::fs::write(&log, out).with_context(|| format!("writing {}", log.display()))?;
    info!(worker = index, input = %input.display(), commands, failures, "worker finished");

    Ok(WorkerReport {
        index,
        input,
        log,
        commands,
        failures,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn log_path_placement() {
        let input = Path::new("/jobs/alpha.txt");
        assert_eq!(log_path(input, None), PathBuf::from("/jobs/alpha.log"));
        assert_eq!(
            log_path(input, Some(Path::new("/logs"))),
            PathBuf::from("/logs/alpha.log")
        );
    }

    #[test]
    fn colliding_logs_get_worker_index() {
        let files = [
            PathBuf::from("/a/job.txt"),
            PathBuf::from("/b/job.cmd"),
            PathBuf::from("/b/other.txt"),
        ];
        let logs = assign_logs(&files, Some(Path::new("/logs")));
        assert_eq!(
            logs,
            [
                PathBuf::from("/logs/job.0.log"),
                PathBuf::from("/logs/job.1.log"),
                PathBuf::from("/logs/other.log"),
            ]
        );

        // Different parents, no log dir: no collision.
        let logs = assign_logs(&files[..2], None);
        assert_eq!(logs, [PathBuf::from("/a/job.log"), PathBuf::from("/b/job.log")]);
    }

    #[tokio::test]
    async fn same_stem_inputs_keep_separate_logs() {
        let dir = TempDir::new().unwrap();
        let first = dir.path().join("job.txt");
        let second = dir.path().join("job.cmd");
        std::fs::write(&first, "create one\n").unwrap();
        std::fs::write(&second, "create two\n").unwrap();

        let fs = Arc::new(FileSystem::new());
        let reports = run_workers(fs, &[first, second], None).await.unwrap();

        assert_ne!(reports[0].log, reports[1].log);
        let log0 = std::fs::read_to_string(&reports[0].log).unwrap();
        let log1 = std::fs::read_to_string(&reports[1].log).unwrap();
        assert!(log0.contains("File one created successfully"));
        assert!(log1.contains("File two created successfully"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn workers_share_one_tree() {
        let dir = TempDir::new().unwrap();
        let mut files = Vec::new();
        for w in 0..4 {
            let path = dir.path().join(format!("worker{w}.txt"));
            let mut script = String::new();
            for i in 0..10 {
                script.push_str(&format!("create w{w}_{i}\n"));
            }
            script.push_str("delete missing\n");
            std::fs::write(&path, script).unwrap();
            files.push(path);
        }

        let fs = Arc::new(FileSystem::new());
        let reports = run_workers(Arc::clone(&fs), &files, None).await.unwrap();

        assert_eq!(reports.len(), 4);
        for (w, r) in reports.iter().enumerate() {
            assert_eq!(r.index, w);
            assert_eq!(r.commands, 11);
            assert_eq!(r.failures, 1);
            let log = std::fs::read_to_string(&r.log).unwrap();
            assert!(log.contains(&format!("> create w{w}_0\nFile w{w}_0 created successfully\n")));
            assert!(log.contains("> delete missing\nError: not found: missing\n"));
        }
        assert_eq!(fs.list_directory().unwrap().len(), 40);
    }

    #[tokio::test]
    async fn missing_input_is_an_error() {
        let dir = TempDir::new().unwrap();
        let fs = Arc::new(FileSystem::new());
        let files = vec![dir.path().join("nope.txt")];
        assert!(run_workers(fs, &files, None).await.is_err());
    }

    #[tokio::test]
    async fn exit_stops_a_worker_and_logs_go_to_log_dir() {
        let dir = TempDir::new().unwrap();
        let logs = dir.path().join("logs");
        std::fs::create_dir(&logs).unwrap();
        let input = dir.path().join("job.txt");
        std::fs::write(&input, "# setup\nmkDir a\n\nchDir a\nexit\ncreate never\n").unwrap();

        let fs = Arc::new(FileSystem::new());
        let reports = run_workers(Arc::clone(&fs), &[input], Some(&logs)).await.unwrap();

        assert_eq!(reports[0].commands, 2);
        assert_eq!(reports[0].log, logs.join("job.log"));
        assert_eq!(fs.current_path(), "/a/");
        assert!(fs.list_directory().unwrap().is_empty());
    }
}
