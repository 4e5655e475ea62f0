use clap::{Parser, Subcommand};
use filedrop_core::{CoreConfig, FileService};
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "filedrop")]
#[command(about = "filedrop storage CLI")]
struct Cli {
    /// Storage root (defaults to FILEDROP_STORAGE_DIR, then "storage")
    #[arg(long, global = true)]
    storage_dir: Option<String>,
    /// Metadata document (defaults to FILEDROP_METADATA_FILE, then "metadata.json")
    #[arg(long, global = true)]
    metadata_file: Option<String>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List stored files, newest first
    List,
    /// Show the record of a stored file
    Info {
        /// Stored filename
        name: String,
    },
    /// Store a local file
    Upload {
        /// File to upload; its file name is used as the original name
        path: PathBuf,
    },
    /// Copy a stored file out of the store
    Get {
        /// Stored filename
        name: String,
        /// Destination (defaults to the original name in the current directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Delete a stored file and its record
    Delete {
        /// Stored filename
        name: String,
    },
    /// Report storage locations, record count and records without a file
    Check,
}

type CliResult = Result<(), Box<dyn std::error::Error>>;

fn main() -> CliResult {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("Use 'filedrop --help' for commands");
        return Ok(());
    };

    let cfg = CoreConfig::from_env_values(
        cli.storage_dir
            .or_else(|| std::env::var("FILEDROP_STORAGE_DIR").ok()),
        cli.metadata_file
            .or_else(|| std::env::var("FILEDROP_METADATA_FILE").ok()),
        std::env::var("FILEDROP_MAX_UPLOAD_BYTES").ok(),
    )?;
    let service = FileService::new(&cfg)?;

    let stdout = std::io::stdout();
    run(&service, command, &mut stdout.lock())
}

fn run(service: &FileService, command: Commands, out: &mut impl Write) -> CliResult {
    match command {
        Commands::List => {
            let files = service.list()?;
            if files.is_empty() {
                writeln!(out, "No files found.")?;
            }
            for f in files {
                writeln!(
                    out,
                    "{}  {:>10}  {}  ({})",
                    f.record.upload_date, f.record.size_formatted, f.filename, f.record.original_name
                )?;
            }
        }
        Commands::Info { name } => {
            let record = service.info(&name)?;
            writeln!(out, "Stored name:   {}", name)?;
            writeln!(out, "Original name: {}", record.original_name)?;
            writeln!(out, "Size:          {} ({} bytes)", record.size_formatted, record.size)?;
            writeln!(out, "Uploaded:      {}", record.upload_date)?;
            writeln!(out, "Path:          {}", record.path)?;
        }
        Commands::Upload { path } => {
            let original_name = path
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| format!("{} has no usable file name", path.display()))?;
            let bytes = std::fs::read(&path)?;
            let uploaded = service.upload(original_name, &bytes)?;
            writeln!(
                out,
                "Uploaded {} as {} ({})",
                original_name, uploaded.filename, uploaded.record.size_formatted
            )?;
        }
        Commands::Get { name, output } => {
            let file = service.retrieve(&name)?;
            let dest = output.unwrap_or_else(|| local_name(&file.original_name, &name));
            std::fs::write(&dest, &file.bytes)?;
            writeln!(out, "Wrote {} bytes to {}", file.bytes.len(), dest.display())?;
        }
        Commands::Delete { name } => {
            let deleted = service.delete(&name)?;
            if !deleted.removed_from_disk {
                writeln!(out, "Note: {} was already missing on disk", deleted.filename)?;
            }
            writeln!(out, "File {} deleted successfully", deleted.filename)?;
        }
        Commands::Check => check(service, out)?,
    }

    Ok(())
}

/// Writes the diagnostic report for the configured store.
fn check(service: &FileService, out: &mut impl Write) -> CliResult {
    let root = service.storage_root();
    let metadata = service.metadata_path();
    writeln!(out, "Storage root:  {} ({})", root.display(), presence(root))?;
    writeln!(out, "Metadata file: {} ({})", metadata.display(), presence(metadata))?;

    let files = service.list()?;
    writeln!(out, "Records:       {}", files.len())?;

    let orphans = service.orphans()?;
    if orphans.is_empty() {
        writeln!(out, "Every record has a file on disk.")?;
    } else {
        writeln!(out, "Records without a file on disk: {}", orphans.len())?;
        for f in orphans {
            writeln!(out, "  {} -> {}", f.filename, f.record.path)?;
        }
    }
    Ok(())
}

fn presence(path: &Path) -> &'static str {
    if path.exists() {
        "exists"
    } else {
        "missing"
    }
}

/// Local destination for `get`: the original name without any directory part.
fn local_name(original_name: &str, stored_name: &str) -> PathBuf {
    Path::new(original_name)
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(stored_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn service(temp: &TempDir) -> FileService {
        let cfg = CoreConfig::new(
            temp.path().join("storage"),
            temp.path().join("metadata.json"),
            1024 * 1024,
        )
        .unwrap();
        FileService::new(&cfg).unwrap()
    }

    fn output(service: &FileService, command: Commands) -> String {
        let mut out = Vec::new();
        run(service, command, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn upload_list_get_delete() {
        let temp = TempDir::new().unwrap();
        let service = service(&temp);
        let source = temp.path().join("report.txt");
        fs::write(&source, b"quarterly numbers").unwrap();

        let text = output(&service, Commands::Upload { path: source });
        assert!(text.contains("Uploaded report.txt as report.txt"));

        let text = output(&service, Commands::List);
        assert!(text.contains("report.txt"));
        assert!(text.contains("17.0 B"));

        let dest = temp.path().join("copy.txt");
        output(
            &service,
            Commands::Get {
                name: "report.txt".into(),
                output: Some(dest.clone()),
            },
        );
        assert_eq!(fs::read(&dest).unwrap(), b"quarterly numbers");

        let text = output(
            &service,
            Commands::Delete {
                name: "report.txt".into(),
            },
        );
        assert!(text.contains("File report.txt deleted successfully"));
        assert_eq!(output(&service, Commands::List), "No files found.\n");
    }

    #[test]
    fn info_of_unknown_file_fails() {
        let temp = TempDir::new().unwrap();
        let service = service(&temp);

        let mut out = Vec::new();
        let err = run(
            &service,
            Commands::Info {
                name: "nothing.txt".into(),
            },
            &mut out,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "File not found");
    }

    #[test]
    fn check_reports_orphans() {
        let temp = TempDir::new().unwrap();
        let service = service(&temp);
        service.upload("keep.txt", b"keep").unwrap();
        let gone = service.upload("gone.txt", b"gone").unwrap();
        fs::remove_file(service.storage_root().join(&gone.record.path)).unwrap();

        let text = output(&service, Commands::Check);

        assert!(text.contains("Records:       2"));
        assert!(text.contains("Records without a file on disk: 1"));
        assert!(text.contains(&format!("gone.txt -> {}", gone.record.path)));
        assert!(!text.contains("keep.txt ->"));
    }

    #[test]
    fn local_name_drops_directories() {
        assert_eq!(local_name("a/b/report.txt", "x.txt"), PathBuf::from("report.txt"));
        assert_eq!(local_name("", "x.txt"), PathBuf::from("x.txt"));
    }
}
