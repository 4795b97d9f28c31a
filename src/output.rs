//! Result output to stdout or a file.

use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Where command results go.
///
/// With a file configured, results are written there and a one-line
/// confirmation is printed to stdout instead.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputSink {
    file: Option<PathBuf>,
}

/// Pretty JSON (two-space indent) with a trailing newline.
pub fn render_json<T: Serialize + ?Sized>(data: &T) -> Result<String> {
    let mut rendered =
        serde_json::to_string_pretty(data).context("Failed to serialize command output")?;
    rendered.push('\n');
    Ok(rendered)
}

impl OutputSink {
    pub fn new(file: Option<PathBuf>) -> Self {
        Self { file }
    }

    pub fn stdout() -> Self {
        Self::default()
    }

    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    pub fn json<T: Serialize + ?Sized>(&self, data: &T) -> Result<()> {
        let rendered = render_json(data)?;
        self.emit(&rendered, &rendered)
    }

    /// Raw text such as file content or a build log.
    pub fn text(&self, text: &str) -> Result<()> {
        self.emit(text, &format!("{text}\n"))
    }

    fn emit(&self, file_content: &str, stdout_content: &str) -> Result<()> {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        match &self.file {
            Some(path) => {
                write_file(path, file_content)?;
                writeln!(out, "Output written to {}", path.display())?;
            }
            None => out.write_all(stdout_content.as_bytes())?,
        }
        out.flush()?;
        Ok(())
    }
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    std::fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}
