use std::env;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use anyhow::Result;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const LOG_FILE_NAME: &str = "practice.log";

fn filter() -> EnvFilter {
    EnvFilter::try_from_env("PRACTICE_LOG")
        .unwrap_or_else(|_| default_filter(env::var("DEBUG").is_ok()))
}

/// The binary's own events are under the `practice` target, the library's
/// under `practice_core`.
fn default_filter(debug: bool) -> EnvFilter {
    EnvFilter::new(if debug {
        "practice_core=debug,practice=debug,info"
    } else {
        "practice_core=warn,practice=warn"
    })
}

/// Logs to stderr, compact or JSON depending on `PRACTICE_LOG_FORMAT`.
pub fn init_stderr() {
    let format = env::var("PRACTICE_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());
    let registry = tracing_subscriber::registry().with(filter());

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

/// The TUI owns the terminal, so its logs are appended to a file instead.
pub fn init_file(data_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(data_dir)?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(data_dir.join(LOG_FILE_NAME))?;

    tracing_subscriber::registry()
        .with(filter())
        .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        .init();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use practice_core::repository::PIECES_KEY;
    use practice_core::{MemoryKeyValueRepository, PracticeStore};
    use std::io;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    fn capture(debug: bool, f: impl FnOnce()) -> String {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::registry().with(default_filter(debug)).with(
            fmt::layer()
                .with_ansi(false)
                .with_writer(move || writer.clone()),
        );
        tracing::subscriber::with_default(subscriber, f);
        captured.text()
    }

    #[test]
    fn test_default_filter_keeps_cli_warnings_and_errors() {
        let out = capture(false, || {
            tracing::error!("storage exploded");
            tracing::warn!("slot looked odd");
            tracing::debug!("starting");
        });
        assert!(out.contains("storage exploded"), "captured: {:?}", out);
        assert!(out.contains("slot looked odd"));
        assert!(!out.contains("starting"));
    }

    #[test]
    fn test_default_filter_keeps_core_warnings() {
        let out = capture(false, || {
            let repo = MemoryKeyValueRepository::new().with_slot(PIECES_KEY, "not json");
            let store = PracticeStore::load(repo);
            assert!(store.is_empty());
        });
        assert!(out.contains("could not parse slot"), "captured: {:?}", out);
    }

    #[test]
    fn test_debug_filter_keeps_cli_debug() {
        let out = capture(true, || tracing::debug!("starting"));
        assert!(out.contains("starting"), "captured: {:?}", out);
    }
}
