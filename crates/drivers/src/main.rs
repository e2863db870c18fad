mod config;
mod logging;
mod ui;

use std::path::PathBuf;
use std::process::ExitCode;

use config::AppConfig;
use photo_grid_adapters::{
    decode_data_uri, present_active, present_cell_row, present_saved_row, BackgroundImageReader,
    MemoryKeyValueStore, SessionFileStore, SqliteKeyValueStore,
};
use photo_grid_application::{
    ApplicationService, BootstrapCommand, GridCellsQuery, ImageStore, MeasureImageCommand,
    SaveActiveCommand, SelectSavedCommand, UploadImageCommand,
};
use photo_grid_domain::{compute_cells, GridSpec};
use tracing::error;

fn main() -> ExitCode {
    logging::init_logging();
    let args: Vec<String> = std::env::args().collect();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::from(2);
        }
    };

    let mut service = match build_application_service(&config) {
        Ok(service) => service,
        Err(msg) => {
            error!(%msg, "failed to open image store");
            eprintln!("failed to bootstrap photo-grid: {msg}");
            return ExitCode::from(1);
        }
    };
    service.bootstrap(BootstrapCommand);

    let command = parse_command(&args);
    match run_command(command, service) {
        Ok(()) => ExitCode::SUCCESS,
        Err(CommandError::Usage(msg)) => {
            eprintln!("{msg}");
            print_usage();
            ExitCode::from(2)
        }
        Err(CommandError::Runtime(msg)) => {
            eprintln!("{msg}");
            ExitCode::from(1)
        }
    }
}

fn build_application_service(config: &AppConfig) -> Result<ApplicationService, String> {
    let store = if config.ephemeral {
        ImageStore::new(
            Box::new(MemoryKeyValueStore::with_capacity_limit(config.session_capacity)),
            Box::new(MemoryKeyValueStore::with_capacity_limit(config.durable_capacity)),
        )
    } else {
        let durable = SqliteKeyValueStore::new(config.store_path.clone(), config.durable_capacity);
        durable.initialize().map_err(|error| error.to_string())?;
        ImageStore::new(
            Box::new(SessionFileStore::new(
                config.session_dir.clone(),
                config.session_capacity,
            )),
            Box::new(durable),
        )
    };

    Ok(ApplicationService::new(
        store,
        Box::new(BackgroundImageReader::new()),
    ))
}

#[derive(Debug, Clone, PartialEq)]
enum Command {
    Ui,
    Upload { path: PathBuf },
    Save,
    List,
    Select { index: usize },
    Grid { size: Option<(f32, f32)> },
    Active,
}

#[derive(Debug, Clone)]
enum CommandError {
    Usage(String),
    Runtime(String),
}

fn parse_command(args: &[String]) -> Result<Command, CommandError> {
    if args.len() <= 1 {
        return Ok(Command::Ui);
    }

    match args[1].as_str() {
        "ui" => Ok(Command::Ui),
        "upload" => {
            if args.len() < 3 {
                return Err(CommandError::Usage("missing image path".to_string()));
            }
            Ok(Command::Upload {
                path: PathBuf::from(&args[2]),
            })
        }
        "save" => Ok(Command::Save),
        "list" => Ok(Command::List),
        "select" => {
            if args.len() < 3 {
                return Err(CommandError::Usage("missing saved image index".to_string()));
            }
            let index = args[2]
                .parse::<usize>()
                .map_err(|_| CommandError::Usage(format!("invalid index: {}", args[2])))?;
            Ok(Command::Select { index })
        }
        "grid" => match args.len() {
            2 => Ok(Command::Grid { size: None }),
            4 => {
                let width = parse_dimension(&args[2])?;
                let height = parse_dimension(&args[3])?;
                Ok(Command::Grid {
                    size: Some((width, height)),
                })
            }
            _ => Err(CommandError::Usage(
                "grid takes no arguments or <width> <height>".to_string(),
            )),
        },
        "active" => Ok(Command::Active),
        other => Err(CommandError::Usage(format!("unknown command: {other}"))),
    }
}

fn parse_dimension(raw: &str) -> Result<f32, CommandError> {
    raw.parse::<f32>()
        .ok()
        .filter(|value| value.is_finite() && *value >= 0.0)
        .ok_or_else(|| CommandError::Usage(format!("invalid dimension: {raw}")))
}

fn run_command(
    command: Result<Command, CommandError>,
    mut service: ApplicationService,
) -> Result<(), CommandError> {
    match command? {
        Command::Ui => ui::launch_window(service).map_err(CommandError::Runtime),
        Command::Upload { path } => {
            service
                .upload_image_blocking(UploadImageCommand { path: Some(path) })
                .map_err(|error| CommandError::Runtime(format!("upload failed: {error}")))?;
            println!("{}", present_active(service.state().active_image.as_ref()));
            Ok(())
        }
        Command::Save => {
            if service.state().active_image.is_none() {
                println!("no active image to save");
                return Ok(());
            }
            let saved = service.save_active(SaveActiveCommand);
            println!("saved images: {}", saved.len());
            Ok(())
        }
        Command::List => {
            let saved = &service.state().saved_images;
            if saved.is_empty() {
                println!("No saved images yet.");
                return Ok(());
            }
            for (index, image) in saved.iter().enumerate() {
                println!("{}", present_saved_row(index, image));
            }
            Ok(())
        }
        Command::Select { index } => {
            service
                .select_saved(SelectSavedCommand { index })
                .map_err(|error| CommandError::Runtime(format!("select failed: {error}")))?;
            println!("{}", present_active(service.state().active_image.as_ref()));
            Ok(())
        }
        Command::Grid { size: Some((width, height)) } => {
            let spec = GridSpec::default();
            let cells = compute_cells(width, height, spec)
                .map_err(|error| CommandError::Usage(error.to_string()))?;
            for (index, cell) in cells.iter().enumerate() {
                println!("{}", present_cell_row(index, spec.cols(), cell));
            }
            Ok(())
        }
        Command::Grid { size: None } => {
            let Some(active) = service.state().active_image.clone() else {
                return Err(CommandError::Runtime("no active image".to_string()));
            };
            let decoded = decode_data_uri(&active)
                .map_err(|error| CommandError::Runtime(format!("grid failed: {error}")))?;
            service
                .measure_image(MeasureImageCommand {
                    width: decoded.width as f32,
                    height: decoded.height as f32,
                })
                .map_err(|error| CommandError::Runtime(format!("grid failed: {error}")))?;
            let cells = service
                .grid_cells(GridCellsQuery)
                .map_err(|error| CommandError::Runtime(format!("grid failed: {error}")))?;
            println!("image {}x{}", decoded.width, decoded.height);
            for (index, cell) in cells.iter().enumerate() {
                println!("{}", present_cell_row(index, GridSpec::default().cols(), cell));
            }
            Ok(())
        }
        Command::Active => {
            println!("{}", present_active(service.state().active_image.as_ref()));
            Ok(())
        }
    }
}

fn print_usage() {
    println!("usage:");
    println!("  photo-grid ui");
    println!("  photo-grid upload <image>");
    println!("  photo-grid save");
    println!("  photo-grid list");
    println!("  photo-grid select <index>");
    println!("  photo-grid grid [<width> <height>]");
    println!("  photo-grid active");
}
