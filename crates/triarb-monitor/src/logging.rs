//! Logging setup.

use std::path::Path;
use tracing::Subscriber;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Layer};

/// Setup logging with the given level.
///
/// `RUST_LOG` overrides `level`. When `file` is set, a daily-rotated copy of
/// the log is written next to it in the same format as the console; keep the
/// returned guard alive until exit or buffered lines are lost.
pub fn setup_logging(level: &str, json: bool, file: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let (writer, guard) = match file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let name = path
                .file_name()
                .map(|n| n.to_os_string())
                .unwrap_or_else(|| "triarb.log".into());
            let appender = tracing_appender::rolling::daily(dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(writer), Some(guard))
        }
        None => (None, None),
    };

    let console = if json {
        fmt::layer().json().boxed()
    } else {
        fmt::layer().pretty().boxed()
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(writer.map(|w| file_layer(w, json)))
        .with(console)
        .init();

    guard
}

fn file_layer<S>(writer: NonBlocking, json: bool) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    let layer = fmt::layer().with_ansi(false).with_writer(writer);
    if json {
        layer.json().boxed()
    } else {
        layer.boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn write_one_line(dir: &Path, name: &str, json: bool) -> String {
        let appender = tracing_appender::rolling::never(dir, name);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let subscriber = tracing_subscriber::registry().with(file_layer(writer, json));
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(cycle = 7, "cycle started");
        });
        // Flushes the background writer
        drop(guard);
        std::fs::read_to_string(dir.join(name)).unwrap()
    }

    fn scratch_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("triarb-log-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_file_layer_follows_json_setting() {
        let dir = scratch_dir();

        let text = write_one_line(&dir, "json.log", true);
        let line: serde_json::Value = serde_json::from_str(text.lines().next().unwrap()).unwrap();
        assert_eq!(line["fields"]["message"], "cycle started");
        assert_eq!(line["fields"]["cycle"], 7);

        let text = write_one_line(&dir, "plain.log", false);
        let first = text.lines().next().unwrap();
        assert!(first.contains("cycle started"));
        assert!(serde_json::from_str::<serde_json::Value>(first).is_err());

        std::fs::remove_dir_all(dir).ok();
    }
}
