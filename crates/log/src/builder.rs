//! Logger builder implementation

use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriter};
use tracing_subscriber::fmt::{self, TestWriter};
use tracing_subscriber::layer::{Layer, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

use crate::config::{Config, Format, Writer};
use crate::error::{LogError, LogResult};

/// Formatting layer with its filter, ready to stack on a [`Registry`].
pub type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// Logger builder
pub struct LoggerBuilder {
    config: Config,
    writer: Option<BoxMakeWriter>,
}

impl std::fmt::Debug for LoggerBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoggerBuilder")
            .field("config", &self.config)
            .field("custom_writer", &self.writer.is_some())
            .finish()
    }
}

/// Guard that keeps the logger alive
///
/// Holds the entered root span carrying the global fields. Drop it at the
/// end of `main`.
#[derive(Debug)]
pub struct LoggerGuard {
    #[allow(dead_code)]
    inner: Option<Box<Inner>>,
}

#[derive(Debug)]
struct Inner {
    _root_span_guard: Option<tracing::span::EnteredSpan>,
}

/// Applies the display flags shared by every format, then boxes the layer
/// behind its filter. `without_time` changes the layer type, hence a macro.
macro_rules! boxed_fmt_layer {
    ($layer:expr, $display:expr, $filter:expr) => {{
        let display = $display;
        let layer = $layer
            .with_ansi(display.colors)
            .with_target(display.target)
            .with_file(display.source)
            .with_line_number(display.source)
            .with_thread_ids(display.thread_ids);
        if display.time {
            layer.with_filter($filter).boxed()
        } else {
            layer.without_time().with_filter($filter).boxed()
        }
    }};
}

impl LoggerBuilder {
    /// Create builder from config
    #[must_use]
    pub fn from_config(config: Config) -> Self {
        Self {
            config,
            writer: None,
        }
    }

    /// Sends output to `writer` instead of the configured [`Writer`].
    #[must_use]
    pub fn with_writer<W>(mut self, writer: W) -> Self
    where
        W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
    {
        self.writer = Some(BoxMakeWriter::new(writer));
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Builds the filtered formatting layer without installing it.
    ///
    /// Use this with `tracing::subscriber::with_default` to scope a logger
    /// to a block.
    pub fn layer(self) -> LogResult<BoxedLayer> {
        let filter = EnvFilter::try_new(&self.config.level)
            .map_err(|e| LogError::Filter(format!("{}: {}", self.config.level, e)))?;
        let writer = self
            .writer
            .unwrap_or_else(|| make_writer(self.config.writer));
        let display = self.config.display;

        let layer = match self.config.format {
            Format::Pretty => {
                boxed_fmt_layer!(fmt::layer().pretty().with_writer(writer), display, filter)
            }
            Format::Compact => {
                boxed_fmt_layer!(fmt::layer().compact().with_writer(writer), display, filter)
            }
            Format::Json => boxed_fmt_layer!(
                fmt::layer()
                    .json()
                    .flatten_event(display.flatten)
                    .with_current_span(true)
                    .with_writer(writer),
                display,
                filter
            ),
        };
        Ok(layer)
    }

    /// Build and install the logger as the global default
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Filter string cannot be parsed
    /// - A global subscriber is already installed
    pub fn build(self) -> LogResult<LoggerGuard> {
        let fields = self.config.fields.clone();
        let layer = self.layer()?;

        Registry::default()
            .with(layer)
            .try_init()
            .map_err(|_| LogError::AlreadyInitialized)?;

        // Create root span with global fields
        let root_span_guard = (!fields.is_empty()).then(|| {
            tracing::info_span!(
                "app",
                service = fields.service.as_deref().unwrap_or(""),
                env = fields.env.as_deref().unwrap_or(""),
                version = fields.version.as_deref().unwrap_or("")
            )
            .entered()
        });

        Ok(LoggerGuard {
            inner: Some(Box::new(Inner {
                _root_span_guard: root_span_guard,
            })),
        })
    }
}

fn make_writer(writer: Writer) -> BoxMakeWriter {
    match writer {
        Writer::Stderr => BoxMakeWriter::new(std::io::stderr),
        Writer::Stdout => BoxMakeWriter::new(std::io::stdout),
        Writer::Test => BoxMakeWriter::new(TestWriter::new()),
    }
}
