//! File import and export
//!
//! Import accepts one plain-text file, checks type and size, and decodes it
//! as UTF-8. Export renders the current text as `.txt`, `.csv` or `.json`;
//! the JS side turns the returned document into a download.

use serde::{Deserialize, Serialize};

use crate::config::EditorConfig;
use crate::errors::ImportError;
use crate::transforms::split_lines;

const TEXT_MIME: &str = "text/plain";

/// What the browser tells us about a picked or dropped file
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    pub name: String,
    /// MIME type; some browsers leave it empty for `.txt`
    #[serde(default, rename = "type")]
    pub mime_type: String,
    pub size: usize,
}

impl FileInfo {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, size: usize) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            size,
        }
    }

    fn has_text_type(&self) -> bool {
        self.mime_type.is_empty()
            || self.mime_type == TEXT_MIME
            || self.name.to_lowercase().ends_with(".txt")
    }
}

/// Check type and size before reading the file
pub fn validate_file(file: &FileInfo, config: &EditorConfig) -> Result<(), ImportError> {
    if !file.has_text_type() {
        return Err(ImportError::FileTypeRejected(file.name.clone()));
    }
    if file.size > config.max_file_size {
        return Err(ImportError::FileTooLarge {
            size: file.size,
            max: config.max_file_size,
        });
    }
    Ok(())
}

/// Decode file contents as UTF-8, replacing invalid sequences and dropping a
/// leading byte order mark
pub fn decode_text(bytes: &[u8], config: &EditorConfig) -> Result<String, ImportError> {
    if bytes.len() > config.max_text_size {
        return Err(ImportError::TextTooLarge {
            size: bytes.len(),
            max: config.max_text_size,
        });
    }

    let decoded = String::from_utf8_lossy(bytes);
    let text: &str = &decoded;
    Ok(text.strip_prefix('\u{feff}').unwrap_or(text).to_string())
}

/// Validate and decode in one step
pub fn import_file(file: &FileInfo, bytes: &[u8], config: &EditorConfig) -> Result<String, ImportError> {
    validate_file(file, config)
        .and_then(|_| decode_text(bytes, config))
        .map_err(|e| {
            log::warn!("Rejected import of '{}': {}", file.name, e);
            e
        })
}

/// Check pasted or typed text against the size cap
pub fn validate_text(text: &str, config: &EditorConfig) -> Result<(), ImportError> {
    if text.len() > config.max_text_size {
        return Err(ImportError::TextTooLarge {
            size: text.len(),
            max: config.max_text_size,
        });
    }
    Ok(())
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Txt,
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Txt => "txt",
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Txt => "text/plain",
            ExportFormat::Csv => "text/csv",
            ExportFormat::Json => "application/json",
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim_start_matches('.').to_lowercase().as_str() {
            "txt" => Ok(ExportFormat::Txt),
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            other => Err(format!("Unsupported export format: {}", other)),
        }
    }
}

/// A rendered file ready to download
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub file_name: String,
    pub mime_type: &'static str,
    pub content: String,
}

pub fn export_text(text: &str, format: ExportFormat) -> ExportDocument {
    let content = match format {
        ExportFormat::Txt => text.to_string(),
        ExportFormat::Csv => split_lines(text)
            .into_iter()
            .map(|line| format!("\"{}\"", line.replace('"', "\"\"")))
            .collect::<Vec<_>>()
            .join("\n"),
        ExportFormat::Json => {
            let lines: Vec<&str> = split_lines(text)
                .into_iter()
                .filter(|line| !line.trim().is_empty())
                .collect();
            // A list of strings always serializes
            serde_json::to_string_pretty(&lines).unwrap_or_else(|_| "[]".to_string())
        }
    };

    ExportDocument {
        file_name: format!("phrases.{}", format.extension()),
        mime_type: format.mime_type(),
        content,
    }
}
