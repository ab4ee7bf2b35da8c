//! Subscriber set-up: fmt output at a caller-chosen level, written to stderr
//! or captured in a [`LogBufferHandle`] for printing after a report.

use std::io::{self, Write};

use tracing::{Level, Subscriber};
use tracing_subscriber::fmt::MakeWriter;

use crate::log_buffer::{LogBufferHandle, LogBufferWriter};

/// Where formatted log lines end up.
#[derive(Clone, Debug, Default)]
pub enum LogSink {
    #[default]
    Stderr,
    Buffer(LogBufferHandle),
}

/// Per-event writer handed out by [`SinkMakeWriter`].
pub enum SinkWriter {
    Buffer(LogBufferWriter),
    Stderr(io::Stderr),
}

impl Write for SinkWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            SinkWriter::Buffer(w) => w.write(buf),
            SinkWriter::Stderr(s) => s.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            SinkWriter::Buffer(w) => w.flush(),
            SinkWriter::Stderr(s) => s.flush(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct SinkMakeWriter {
    sink: LogSink,
}

impl SinkMakeWriter {
    pub fn new(sink: LogSink) -> Self {
        Self { sink }
    }
}

impl<'a> MakeWriter<'a> for SinkMakeWriter {
    type Writer = SinkWriter;

    fn make_writer(&'a self) -> Self::Writer {
        match &self.sink {
            LogSink::Buffer(handle) => SinkWriter::Buffer(handle.writer()),
            LogSink::Stderr => SinkWriter::Stderr(io::stderr()),
        }
    }
}

/// The fmt subscriber [`init`] installs, for scoped use in tests.
pub fn subscriber(level: Level, sink: LogSink) -> impl Subscriber + Send + Sync + 'static {
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(SinkMakeWriter::new(sink))
        .with_target(false)
        .with_ansi(false)
        .finish()
}

/// Install the global subscriber. Returns `false` when one was already set.
pub fn init(level: Level, sink: LogSink) -> bool {
    tracing::subscriber::set_global_default(subscriber(level, sink)).is_ok()
}
