//! Logging setup built on `tracing-subscriber`.
//!
//! - Console output with color control (ANSI only on a TTY)
//! - Optional file output (Full, Compact, JSON) through a size-capped writer

pub mod config;
pub(crate) mod writer;

pub use config::*;

use std::io::IsTerminal;

use tracing_subscriber::{
    EnvFilter, Layer, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt,
};
use writer::SizeCappedFileWriter;

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Initialize the global subscriber with the given configuration
pub fn init_logger(config: LoggerConfig) -> anyhow::Result<()> {
    config.validate()?;

    let filter = EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info"));

    // File layer goes first so ANSI codes from the console layer don't leak
    // into span fields written to the file.
    let mut layers: Vec<BoxedLayer> = Vec::new();
    if config.file.enabled {
        layers.push(file_layer(&config.file)?);
    }
    if config.console.enabled {
        layers.push(console_layer(&config.console));
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()?;

    Ok(())
}

fn console_layer(config: &ConsoleConfig) -> BoxedLayer {
    let use_ansi = config.colored && std::io::stdout().is_terminal();

    fmt::layer()
        .with_ansi(use_ansi)
        .with_target(true)
        .with_level(true)
        .boxed()
}

fn file_layer(config: &FileConfig) -> anyhow::Result<BoxedLayer> {
    let writer = SizeCappedFileWriter::new(config)?;

    let layer = match config.format {
        LogFormat::Full => fmt::layer()
            .with_ansi(false)
            .with_target(true)
            .with_writer(writer)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .with_ansi(false)
            .with_target(true)
            .compact()
            .with_writer(writer)
            .boxed(),
        LogFormat::Json => fmt::layer().with_ansi(false).json().with_writer(writer).boxed(),
    };

    Ok(layer)
}
