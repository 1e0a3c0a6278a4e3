use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::debug;
use pagemark_core::{
    import_json, AnnotationEditor, EditorConfig, ExportFormat, KeyCommand, LabelCatalog,
    LabelState, PageCoordinate,
};
use pagemark_storage::{load_initial, SnapshotStorage};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(name = "pagemark")]
#[command(about = "Label regions of document pages")]
pub struct Cli {
    /// Storage directory (overrides PAGEMARK_DATA_DIR and the platform default).
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the label catalog as JSON.
    Labels {
        #[arg(long, value_name = "NAME")]
        category: Option<String>,
    },
    /// Print the stored annotations as JSON.
    List {
        #[arg(long)]
        page: Option<u32>,
    },
    /// Replace the stored annotations with an exported JSON file.
    Import {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Write the stored annotations to a file and print its path.
    Export {
        #[arg(long, default_value = "json")]
        format: ExportFormat,
        #[arg(long, value_name = "DIR", default_value = ".")]
        output: PathBuf,
        #[arg(long, value_name = "BASE")]
        name: Option<String>,
    },
    /// Run a JSON script of pointer and key events against the stored annotations.
    Replay {
        #[arg(value_name = "SCRIPT")]
        script: PathBuf,
    },
    /// Delete the stored annotations.
    Clear,
    /// Print CLI version.
    Version,
}

/// One scripted editor input
#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum ReplayStep {
    SelectLabel { id: String },
    Page { page: u32 },
    Down { x: f64, y: f64 },
    Move { x: f64, y: f64 },
    Up,
    Leave,
    Key { key: String },
    Zoom { scale: f64 },
}

#[derive(Debug, Serialize)]
struct ReplaySummary {
    pages: usize,
    annotations: usize,
    can_undo: bool,
    can_redo: bool,
}

pub fn run<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);

    let mut config = EditorConfig::from_env().context("invalid PAGEMARK_* environment")?;
    if let Some(dir) = cli.data_dir {
        config = config.with_data_dir(dir);
    }

    match cli.command {
        Commands::Labels { category } => run_labels(category.as_deref()),
        Commands::List { page } => run_list(&open_storage(&config)?, page),
        Commands::Import { file } => run_import(&open_storage(&config)?, &file),
        Commands::Export { format, output, name } => {
            if let Some(name) = name {
                config = config.with_export_base_name(name);
            }
            run_export(&open_storage(&config)?, config, format, &output)
        }
        Commands::Replay { script } => run_replay(open_storage(&config)?, config, &script),
        Commands::Clear => {
            open_storage(&config)?.remove().context("failed to remove stored annotations")?;
            println!("cleared");
            Ok(())
        }
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn open_storage(config: &EditorConfig) -> Result<SnapshotStorage> {
    match &config.data_dir {
        Some(dir) => Ok(SnapshotStorage::with_root(dir)),
        None => SnapshotStorage::from_default_project().context("failed to locate data directory"),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}

fn run_labels(category: Option<&str>) -> Result<()> {
    let catalog = LabelCatalog::predefined();

    match category {
        Some(name) => {
            let category = catalog
                .category(name)
                .with_context(|| format!("unknown label category: {name}"))?;
            print_json(&category.labels)
        }
        None => print_json(&catalog.labels().collect::<Vec<_>>()),
    }
}

fn run_list(storage: &SnapshotStorage, page: Option<u32>) -> Result<()> {
    let state = storage.load().context("failed to read stored annotations")?.unwrap_or_default();

    match page {
        Some(0) => anyhow::bail!("--page is 1-based and must be >= 1"),
        Some(page) => print_json(state.page(page)),
        None => print_json(&state),
    }
}

fn run_import(storage: &SnapshotStorage, file: &Path) -> Result<()> {
    let raw = fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let state =
        import_json(&raw).with_context(|| format!("failed to import {}", file.display()))?;

    storage.save(&state).context("failed to store annotations")?;
    println!("imported {} annotations", state.len());
    Ok(())
}

fn run_export(
    storage: &SnapshotStorage,
    config: EditorConfig,
    format: ExportFormat,
    output: &Path,
) -> Result<()> {
    let mut editor = AnnotationEditor::new(config, LabelState::default());
    editor.restore(load_initial(storage));

    let artifact = editor.export(format).with_context(|| format!("failed to export {format}"))?;
    let path = artifact
        .write_to(output)
        .with_context(|| format!("failed to write export to {}", output.display()))?;

    println!("{}", path.display());
    Ok(())
}

fn run_replay(storage: SnapshotStorage, config: EditorConfig, script: &Path) -> Result<()> {
    let raw = fs::read_to_string(script)
        .with_context(|| format!("failed to read {}", script.display()))?;
    let steps: Vec<ReplayStep> = serde_json::from_str(&raw)
        .with_context(|| format!("invalid replay script {}", script.display()))?;

    let autosave = config.autosave;
    let mut editor = AnnotationEditor::new(config, LabelState::default());
    editor.restore(load_initial(&storage));
    if autosave {
        editor.set_sink(Box::new(storage.clone()));
    }

    debug!("replaying {} steps", steps.len());
    for (index, step) in steps.into_iter().enumerate() {
        apply_step(&mut editor, step).with_context(|| format!("replay step {index} failed"))?;
    }

    if !autosave {
        storage.save(editor.store().state()).context("failed to store annotations")?;
    }

    let state = editor.store().state();
    print_json(&ReplaySummary {
        pages: state.page_numbers().count(),
        annotations: state.len(),
        can_undo: editor.store().can_undo(),
        can_redo: editor.store().can_redo(),
    })
}

fn apply_step(editor: &mut AnnotationEditor, step: ReplayStep) -> Result<()> {
    match step {
        ReplayStep::SelectLabel { id } => {
            if !editor.labels_mut().select(&id) {
                anyhow::bail!("unknown label: {id}");
            }
        }
        ReplayStep::Page { page } => editor.set_page(page),
        ReplayStep::Down { x, y } => {
            editor.pointer_down_at(PageCoordinate::new(x, y));
        }
        ReplayStep::Move { x, y } => {
            editor.pointer_move(PageCoordinate::new(x, y));
        }
        ReplayStep::Up => {
            editor.pointer_up();
        }
        ReplayStep::Leave => {
            editor.pointer_leave();
        }
        ReplayStep::Key { key } => {
            editor.handle_key(parse_key(&key)?);
        }
        ReplayStep::Zoom { scale } => editor.scale_mut().set(scale),
    }
    Ok(())
}

fn parse_key(key: &str) -> Result<KeyCommand> {
    let command = match key {
        "delete" | "backspace" => KeyCommand::Delete,
        "undo" => KeyCommand::Undo,
        "redo" => KeyCommand::Redo,
        "next_label" => KeyCommand::NextLabel,
        "previous_label" => KeyCommand::PreviousLabel,
        other => {
            let mut chars = other.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => KeyCommand::Shortcut(c),
                _ => anyhow::bail!("unknown key: {other}"),
            }
        }
    };
    Ok(command)
}
