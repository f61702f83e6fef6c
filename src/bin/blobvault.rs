use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use blobvault::{BlobStore, Error};

#[derive(Parser)]
#[command(name = "blobvault", version, about = "A flat single-file blob store")]
struct Cli {
    /// Path to the backing file.
    #[arg(long, short = 's', global = true)]
    store: PathBuf,

    /// Capacity to create the backing file with, if it does not exist yet.
    #[arg(long, default_value_t = 16 * 1024 * 1024)]
    capacity: i32,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Create a record from inline bytes (read from an argument, for quick use).
    Create { name: String, content: String },
    /// Overwrite (or create) a record from inline bytes.
    Write { name: String, content: String },
    /// Print a record's content to stdout.
    Read { name: String },
    /// Tombstone a record.
    Rm { name: String },
    /// List live record names.
    Ls,
    /// Check whether a record is live.
    Exists { name: String },
    /// Print bytes free in the record area.
    Df,
    /// Ingest an ambient-OS file, named after its own basename.
    CopyFrom { path: PathBuf },
    /// Download a URI and store it, named from Content-Disposition or the URI.
    Fetch { uri: String },
    /// Compact the record area, reclaiming tombstoned space.
    Defragment,
    /// Reset the record area to empty.
    Format,
}

fn run() -> Result<(), Error> {
    let cli = Cli::parse();
    let store = BlobStore::open(&cli.store, cli.capacity)?;

    match cli.command {
        Cmd::Create { name, content } => store.create_file(&name, content.as_bytes())?,
        Cmd::Write { name, content } => store.overwrite_file(&name, content.as_bytes())?,
        Cmd::Read { name } => {
            let content = store.read_file(&name)?;
            std::io::Write::write_all(&mut std::io::stdout(), &content)
                .map_err(Error::IoFailure)?;
        }
        Cmd::Rm { name } => store.delete_file(&name)?,
        Cmd::Ls => {
            for name in store.list_files()? {
                println!("{name}");
            }
        }
        Cmd::Exists { name } => {
            println!("{}", store.file_exists(&name)?);
        }
        Cmd::Df => {
            println!("{}", store.available_space()?);
        }
        Cmd::CopyFrom { path } => store.copy_from_path(&path)?,
        Cmd::Fetch { uri } => store.download_and_save(&uri)?,
        Cmd::Defragment => store.defragment()?,
        Cmd::Format => store.format()?,
    }

    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("blobvault: {err}");
            ExitCode::FAILURE
        }
    }
}
