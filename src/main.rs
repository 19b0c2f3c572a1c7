use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::PathBuf;

use clap::Parser;
use tracing::Level;

use view_dock::config::PlacementConfig;
use view_dock::constants::{
    DEFAULT_FLOAT_HEIGHT, DEFAULT_FLOAT_WIDTH, MIN_FLOATING_HEIGHT, MIN_FLOATING_WIDTH,
};
use view_dock::script::{self, Session};
use view_dock::tracing_sub;
use view_dock::view::ViewContainerLocation;
use view_dock::window::WindowSize;

/// Drive the view placement manager from a command script.
#[derive(Debug, Parser)]
#[command(version, after_help = script::HELP)]
struct Cli {
    /// Read commands from FILE instead of stdin.
    #[arg(long, value_name = "FILE")]
    script: Option<PathBuf>,

    /// Width of windows opened by `float`.
    #[arg(long, default_value_t = DEFAULT_FLOAT_WIDTH)]
    float_width: u32,

    /// Height of windows opened by `float`.
    #[arg(long, default_value_t = DEFAULT_FLOAT_HEIGHT)]
    float_height: u32,

    #[arg(long, default_value_t = MIN_FLOATING_WIDTH)]
    min_width: u32,

    #[arg(long, default_value_t = MIN_FLOATING_HEIGHT)]
    min_height: u32,

    /// Register a view as ID[:NAME][:fixed] in the sidebar. Repeatable;
    /// replaces the built-in views.
    #[arg(long = "view", value_name = "SPEC")]
    views: Vec<String>,

    /// Log state transitions at debug level.
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn config(&self) -> PlacementConfig {
        PlacementConfig {
            default_float_size: WindowSize::new(self.float_width, self.float_height),
            min_window_size: WindowSize::new(self.min_width, self.min_height),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> io::Result<()> {
    let cli = Cli::parse();
    tracing_sub::init(if cli.verbose { Level::DEBUG } else { Level::INFO });

    let session = Session::new(cli.config());
    if cli.views.is_empty() {
        for (descriptor, location) in script::default_views() {
            session.registry().register(descriptor, location);
        }
    } else {
        for spec in &cli.views {
            let descriptor = script::parse_view_spec(spec).map_err(io::Error::other)?;
            session
                .registry()
                .register(descriptor, ViewContainerLocation::Sidebar);
        }
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let summary = match &cli.script {
        Some(path) => {
            let file = File::open(path)?;
            session.run(BufReader::new(file), &mut out).await?
        }
        None => session.run(io::stdin().lock(), &mut out).await?,
    };
    session.shutdown(&mut out)?;
    out.flush()?;

    tracing::info!(
        executed = summary.executed,
        failed = summary.failed,
        "script finished"
    );
    if summary.failed > 0 {
        return Err(io::Error::other(format!(
            "{} of {} commands failed",
            summary.failed, summary.executed
        )));
    }
    Ok(())
}
