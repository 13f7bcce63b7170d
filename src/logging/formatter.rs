use std::fmt;
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::{format::Writer, FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

/// Event formatter that wraps each field in brackets.
///
/// Format: `[TIMESTAMP] [LEVEL] [SCOPE] [TARGET: FILE:LINE]: MESSAGE`, where
/// SCOPE is the innermost span (e.g. `load_images_and_labels`) or the last
/// module path segment. The location block is only written when
/// `with_location` is set.
#[derive(Debug, Clone, Copy)]
pub struct BracketedFormatter {
    with_location: bool,
}

impl BracketedFormatter {
    /// Full format, used for log files
    pub fn detailed() -> Self {
        Self { with_location: true }
    }

    /// Without the target/file/line block, used for the terminal
    pub fn compact() -> Self {
        Self {
            with_location: false,
        }
    }
}

impl Default for BracketedFormatter {
    fn default() -> Self {
        Self::detailed()
    }
}

impl<S, N> FormatEvent<S, N> for BracketedFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let meta = event.metadata();

        write!(
            writer,
            "[{}]  [{:5}] ",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.6f%:z"),
            meta.level()
        )?;

        match ctx.event_scope().and_then(|scope| scope.from_root().last()) {
            Some(span) => write!(writer, "[{}] ", span.name())?,
            None => write!(
                writer,
                "[{}] ",
                meta.target().rsplit("::").next().unwrap_or("unknown")
            )?,
        }

        if self.with_location {
            match (meta.file(), meta.line()) {
                (Some(file), Some(line)) => {
                    write!(writer, "[{}: {}:{}]: ", meta.target(), file, line)?
                }
                _ => write!(writer, "[{}]: ", meta.target())?,
            }
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};

    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl io::Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn capture(formatter: BracketedFormatter) -> String {
        let buf = Arc::new(Mutex::new(Vec::new()));
        let sink = buf.clone();
        let subscriber = tracing_subscriber::fmt()
            .event_format(formatter)
            .with_writer(move || SharedBuf(sink.clone()))
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let span = tracing::info_span!("load_images_and_labels");
            let _guard = span.enter();
            tracing::info!("Loaded {} samples", 3);
        });

        let out = buf.lock().unwrap().clone();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_detailed_line_has_span_and_location() {
        let out = capture(BracketedFormatter::detailed());
        assert!(out.contains("INFO"));
        assert!(out.contains("[load_images_and_labels] "));
        assert!(out.contains("formatter.rs:"));
        assert!(out.trim_end().ends_with("Loaded 3 samples"));
    }

    #[test]
    fn test_compact_line_omits_location() {
        let out = capture(BracketedFormatter::compact());
        assert!(out.contains("[load_images_and_labels] Loaded 3 samples"));
        assert!(!out.contains("formatter.rs:"));
    }
}
