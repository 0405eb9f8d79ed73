pub mod output;
pub mod report;

pub use output::{create_writer, JsonWriter, MarkdownWriter, OutputFormat, OutputWriter};
pub use report::{Report, Section, SectionBody};

use anyhow::Result;
use std::fs;
use std::io::Write;
use std::path::Path;

pub fn write_file(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content)?;
    Ok(())
}

pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Open `path` for writing, or stdout when no path is given.
pub fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    match path {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                ensure_dir(parent)?;
            }
            Ok(Box::new(std::io::BufWriter::new(fs::File::create(path)?)))
        }
        None => Ok(Box::new(std::io::stdout().lock())),
    }
}
