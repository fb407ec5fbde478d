//! jelix-paths - inspect module and plugin resolution of an application

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use jelix_core::{AppConfig, AppInstance, AppPaths, BundledLocations, ModuleFilter};
use std::path::PathBuf;
use tracing::{debug, Level};

#[derive(Parser)]
#[command(name = "jelix-paths")]
#[command(about = "Show the modules and plugins an application resolves", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Framework library directory (holds core-modules/ and plugins/)
    #[arg(long, env = "JELIX_LIB_PATH")]
    lib: PathBuf,

    /// Application directory
    #[arg(long, default_value = ".")]
    app: PathBuf,

    /// Directory whose sub-directories are modules
    #[arg(long = "modules-dir")]
    modules_dirs: Vec<PathBuf>,

    /// Only admit these modules from the last --modules-dir
    #[arg(long = "only", requires = "modules_dirs", value_delimiter = ',')]
    only: Vec<String>,

    /// Directory of a single module
    #[arg(long = "module")]
    modules: Vec<PathBuf>,

    /// Directory containing plugins
    #[arg(long = "plugins-dir")]
    plugins_dirs: Vec<PathBuf>,

    /// Configuration file listing enabled modules and plugins
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print every known module and its directory
    Modules,

    /// Print every plugin directory in lookup order
    Plugins,

    /// Print the directory of an enabled module
    ModulePath {
        /// Module name
        name: String,

        /// Also look at modules enabled in other entry points
        #[arg(long)]
        external: bool,
    },

    /// Print the application version
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.debug { Level::DEBUG } else { Level::WARN })
        .with_writer(std::io::stderr)
        .init();

    let mut app = build_app(&cli)?;

    match cli.command {
        Commands::Modules => {
            println!("{}", serde_json::to_string_pretty(app.all_modules_path())?);
        }
        Commands::Plugins => {
            println!("{}", serde_json::to_string_pretty(app.all_plugins_path())?);
        }
        Commands::ModulePath { name, external } => {
            let path = app.get_module_path(&name, external)?;
            println!("{}", path.display());
        }
        Commands::Version => {
            println!("{}", app.version()?);
        }
    }

    Ok(())
}

fn build_app(cli: &Cli) -> Result<AppInstance> {
    let mut app = AppInstance::new(
        AppPaths::new(&cli.app),
        BundledLocations::from_lib_path(&cli.lib),
    );

    if let Some((last, others)) = cli.modules_dirs.split_last() {
        app.declare_modules_dirs(others)?;
        let filter = if cli.only.is_empty() {
            ModuleFilter::All
        } else {
            ModuleFilter::names(cli.only.iter().cloned())
        };
        app.declare_modules_dir(last, filter)?;
    }
    app.declare_modules(&cli.modules)?;
    app.declare_plugins_dirs(&cli.plugins_dirs)?;

    if let Some(path) = &cli.config {
        let config = AppConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration {}", path.display()))?;
        app.set_config(config);
    }

    debug!("Declared modules dirs: {:?}", app.declared_modules_dirs());
    Ok(app)
}
