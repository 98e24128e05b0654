mod commands;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use commands::layer::{PostGisArgs, RemovableArg};
use commands::query::ResourceArg;
use commands::ConnectionArgs;
use geopub_core::GeoServerManager;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "geopub",
    version,
    about = "Publish and remove GeoServer workspaces, stores, layers and styles"
)]
struct Cli {
    /// Configuration file (defaults to $GEOPUB_CONFIG or ~/.config/geopub/config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// GeoServer base URL, e.g. http://localhost:8080/geoserver.
    #[arg(long, global = true)]
    url: Option<String>,

    /// Admin user name.
    #[arg(long, global = true)]
    user: Option<String>,

    /// Admin password.
    #[arg(long, global = true)]
    password: Option<String>,

    /// Output results as structured JSON.
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Check whether a resource exists.
    Exists {
        kind: ResourceArg,
        name: String,
        /// Workspace the resource lives in (required for stores, layers and groups).
        #[arg(long)]
        workspace: Option<String>,
    },
    /// List resources of one kind.
    List {
        kind: ResourceArg,
        /// Workspace to list (layers and styles without it list server-wide).
        #[arg(long)]
        workspace: Option<String>,
    },
    /// Create a workspace.
    CreateWorkspace {
        name: String,
        /// Namespace URI of the workspace.
        #[arg(long)]
        uri: Option<String>,
    },
    /// Remove a workspace and everything in it.
    RemoveWorkspace {
        name: String,
        /// Do not ask for confirmation.
        #[arg(long, default_value_t = false)]
        yes: bool,
    },
    /// Create a workspace unless it already exists.
    EnsureWorkspace { name: String },
    /// Publish a zipped shapefile; store and layer take the archive's name.
    PublishShp {
        workspace: String,
        archive: PathBuf,
        /// EPSG code of the data.
        #[arg(long, default_value_t = 4326)]
        crs: u32,
        /// Default style, `name` or `workspace:name`.
        #[arg(long)]
        style: Option<String>,
    },
    /// Publish a PostGIS table; store and layer take the table's name.
    PublishPostgis {
        workspace: String,
        table: String,
        #[command(flatten)]
        db: PostGisArgs,
        /// EPSG code of the data.
        #[arg(long, default_value_t = 4326)]
        crs: u32,
        /// Default style, `name` or `workspace:name`.
        #[arg(long)]
        style: Option<String>,
    },
    /// Publish a GeoTIFF as coverage store and layer.
    PublishGeotiff {
        workspace: String,
        layer: String,
        raster: PathBuf,
    },
    /// Publish a GeoTIFF into the raster workspace unless the store exists.
    ReleaseTiff { store: String, raster: PathBuf },
    /// Create a layer group from `workspace:layer` refs, bottom layer first.
    CreateGroup {
        workspace: String,
        name: String,
        #[arg(required = true)]
        layers: Vec<String>,
    },
    /// Remove a store, layer or layer group.
    Remove {
        kind: RemovableArg,
        workspace: String,
        name: String,
    },
    /// Remove a store from the vector or raster workspace.
    RemoveStore { workspace: String, store: String },
    /// Upload an SLD document as a style.
    CreateStyle {
        sld: PathBuf,
        /// Style name (defaults to the file name up to `.sld`).
        #[arg(long)]
        name: Option<String>,
        /// Workspace to upload into (global when omitted).
        #[arg(long)]
        workspace: Option<String>,
    },
    /// Remove a style and purge its SLD document.
    RemoveStyle {
        name: String,
        #[arg(long)]
        workspace: Option<String>,
    },
    /// Upload `<style dir>/<type>.sld` into the vector workspace.
    PublishStyle { style_type: String },
    /// Generate shell completions for bash, zsh, fish, elvish, or powershell.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
    /// Generate man pages in the specified directory.
    ManPages {
        /// Output directory for man pages.
        #[arg(default_value = "man")]
        dir: PathBuf,
    },
}

fn main() -> ExitCode {
    // Piping into `head` must not panic.
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info.to_string();
        if msg.contains("Broken pipe")
            || msg.contains("broken pipe")
            || msg.contains("os error 32")
            || msg.contains("failed printing to stdout")
        {
            std::process::exit(0);
        }
        default_hook(info);
    }));

    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("GEOPUB_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            ExitCode::from(commands::exit_code_for(&msg))
        }
    }
}

fn run(cli: Cli) -> Result<u8, String> {
    let json = cli.json;
    match cli.command {
        Commands::Completions { shell } => return commands::completions::run::<Cli>(shell),
        Commands::ManPages { ref dir } => return commands::man_pages::run::<Cli>(dir),
        _ => {}
    }

    let config = commands::load_config(&ConnectionArgs {
        config: cli.config.as_deref(),
        url: cli.url.as_deref(),
        user: cli.user.as_deref(),
        password: cli.password.as_deref(),
    })?;
    tracing::debug!(url = %config.server.url, user = %config.server.username, "connecting");
    let manager = GeoServerManager::new(config);

    match cli.command {
        Commands::Exists {
            kind,
            name,
            workspace,
        } => commands::query::exists(manager.reader(), kind, &name, workspace.as_deref(), json),
        Commands::List { kind, workspace } => {
            commands::query::list(manager.reader(), kind, workspace.as_deref(), json)
        }
        Commands::CreateWorkspace { name, uri } => {
            commands::workspace::create(&manager, &name, uri.as_deref(), json)
        }
        Commands::RemoveWorkspace { name, yes } => {
            commands::workspace::remove(&manager, &name, yes, json)
        }
        Commands::EnsureWorkspace { name } => commands::workspace::ensure(&manager, &name, json),
        Commands::PublishShp {
            workspace,
            archive,
            crs,
            style,
        } => commands::layer::publish_shp(
            &manager,
            &workspace,
            &archive,
            crs,
            style.as_deref(),
            json,
        ),
        Commands::PublishPostgis {
            workspace,
            table,
            db,
            crs,
            style,
        } => commands::layer::publish_postgis(
            &manager,
            &workspace,
            &table,
            &db,
            crs,
            style.as_deref(),
            json,
        ),
        Commands::PublishGeotiff {
            workspace,
            layer,
            raster,
        } => commands::layer::publish_geotiff(&manager, &workspace, &layer, &raster, json),
        Commands::ReleaseTiff { store, raster } => {
            commands::layer::release_tiff(&manager, &store, &raster, json)
        }
        Commands::CreateGroup {
            workspace,
            name,
            layers,
        } => commands::group::create(&manager, &workspace, &name, &layers, json),
        Commands::Remove {
            kind,
            workspace,
            name,
        } => commands::layer::remove(&manager, kind, &workspace, &name, json),
        Commands::RemoveStore { workspace, store } => {
            commands::layer::remove_store(&manager, &workspace, &store, json)
        }
        Commands::CreateStyle {
            sld,
            name,
            workspace,
        } => commands::style::create(&manager, &sld, name.as_deref(), workspace.as_deref(), json),
        Commands::RemoveStyle { name, workspace } => {
            commands::style::remove(&manager, &name, workspace.as_deref(), json)
        }
        Commands::PublishStyle { style_type } => {
            commands::style::publish_from_dir(&manager, &style_type, json)
        }
        Commands::Completions { .. } | Commands::ManPages { .. } => Ok(commands::EXIT_SUCCESS),
    }
}
