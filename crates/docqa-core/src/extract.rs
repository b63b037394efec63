//! Text extraction from supported document formats. Dispatch is by file extension,
//! resolved once into a [`Format`].

use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::{debug, instrument};

/// Main body part inside a .docx archive.
const DOCX_BODY: &str = "word/document.xml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Pdf,
    Docx,
    Txt,
}

impl Format {
    /// Format for a bare extension, case-insensitive, without the dot.
    pub fn from_extension(ext: &str) -> Result<Self, ExtractError> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Ok(Format::Pdf),
            "docx" => Ok(Format::Docx),
            "txt" => Ok(Format::Txt),
            _ => Err(ExtractError::UnsupportedFormat(ext.to_string())),
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, ExtractError> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        Self::from_extension(ext)
    }

    pub fn extension(self) -> &'static str {
        match self {
            Format::Pdf => "pdf",
            Format::Docx => "docx",
            Format::Txt => "txt",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Extract the raw text of `path`, read as `format`.
#[instrument(skip_all, fields(path = %path.display(), format = %format))]
pub fn extract(path: &Path, format: Format) -> Result<String, ExtractError> {
    let text = match format {
        Format::Txt => {
            std::fs::read_to_string(path).map_err(|e| ExtractError::Read(path.to_path_buf(), e))?
        }
        Format::Pdf => pdf_text(path)?,
        Format::Docx => {
            let file = File::open(path).map_err(|e| ExtractError::Read(path.to_path_buf(), e))?;
            docx_text(BufReader::new(file))?
        }
    };
    debug!(chars = text.chars().count(), "extracted");
    Ok(text)
}

/// Extract using the format implied by the file extension.
pub fn extract_path(path: &Path) -> Result<String, ExtractError> {
    extract(path, Format::from_path(path)?)
}

/// pdf-extract panics on some malformed files; those become errors too.
fn pdf_text(path: &Path) -> Result<String, ExtractError> {
    match std::panic::catch_unwind(|| pdf_extract::extract_text(path)) {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(ExtractError::Pdf(e.to_string())),
        Err(_) => Err(ExtractError::Pdf(format!(
            "parser panicked on {}",
            path.display()
        ))),
    }
}

/// Paragraph text of a .docx archive, one line per paragraph.
pub fn docx_text<R: Read + std::io::Seek>(reader: R) -> Result<String, ExtractError> {
    let mut archive = zip::ZipArchive::new(reader).map_err(|e| ExtractError::Docx(e.to_string()))?;
    let mut xml = String::new();
    archive
        .by_name(DOCX_BODY)
        .map_err(|e| ExtractError::Docx(format!("{DOCX_BODY}: {e}")))?
        .read_to_string(&mut xml)
        .map_err(|e| ExtractError::Docx(e.to_string()))?;
    document_xml_text(&xml)
}

fn document_xml_text(xml: &str) -> Result<String, ExtractError> {
    let mut reader = Reader::from_str(xml);
    let mut out = String::new();
    let mut in_text = false;
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.name().as_ref() == b"w:t" => in_text = true,
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" => out.push('\n'),
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"w:tab" => out.push('\t'),
                b"w:br" | b"w:cr" => out.push('\n'),
                b"w:p" => out.push('\n'),
                _ => {}
            },
            Ok(Event::Text(t)) if in_text => {
                let text = t.unescape().map_err(|e| ExtractError::Docx(e.to_string()))?;
                out.push_str(&text);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ExtractError::Docx(format!(
                    "at position {}: {e}",
                    reader.buffer_position()
                )))
            }
            _ => {}
        }
    }
    Ok(out)
}

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("unsupported file extension: {0:?}")]
    UnsupportedFormat(String),
    #[error("read error for {0}: {1}")]
    Read(PathBuf, std::io::Error),
    #[error("failed to read PDF: {0}")]
    Pdf(String),
    #[error("failed to read DOCX: {0}")]
    Docx(String),
}
