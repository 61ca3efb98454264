//! Copy configuration
//!

use std::{
    borrow::Cow,
    fs, io,
    path::{Path, PathBuf},
};

use quick_xml::{de::DeError, se::SeError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::logger::Journal;

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="utf-8"?>"#;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Which file to copy and where to copy it to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "configuracao")]
pub struct Config {
    /// The path of the file to copy.
    #[serde(rename = "localDoArquivo")]
    pub source_file: String,

    /// The directory to place the copy in.
    #[serde(rename = "localDeSalvamento")]
    pub destination_directory: String,
}

impl Config {
    /// The instructions written to a new config file in place of real paths.
    pub fn placeholder() -> Self {
        Self {
            source_file: "path of the file to be copied".to_string(),
            destination_directory: "directory the file is saved to".to_string(),
        }
    }

    /// The path of the file to copy.
    pub fn source_path(&self) -> &Path {
        Path::new(&self.source_file)
    }

    /// The path of the directory to copy into.
    pub fn destination_path(&self) -> &Path {
        Path::new(&self.destination_directory)
    }

    /// Tries to load a config from an xml file.
    ///
    /// The file is rewritten as UTF-8 without a byte order mark first if it is
    /// stored in another encoding.
    pub fn load_xml(file_path: &Path, journal: &mut Journal) -> Result<Self, LoadConfigError> {
        if !file_path.exists() {
            return Err(LoadConfigError::NoFile);
        }

        let bytes = fs::read(file_path).map_err(LoadConfigError::Read)?;
        let contents = decode(&bytes);

        if contents.as_bytes() != bytes.as_slice() {
            if let Err(error) = fs::write(file_path, contents.as_bytes()) {
                journal.error(format!("Failed to rewrite the config file as UTF-8: {error}"));
            }
        }

        let config = quick_xml::de::from_str(&contents)?;

        Ok(config)
    }

    /// Save the config as an xml file, UTF-8 without a byte order mark.
    pub fn save_xml(&self, file_path: &Path) -> Result<(), SaveConfigError> {
        let mut contents = String::from(XML_DECLARATION);
        contents.push('\n');

        let mut serializer = quick_xml::se::Serializer::new(&mut contents);
        serializer.indent(' ', 2);
        self.serialize(serializer)?;
        contents.push('\n');

        fs::write(file_path, contents).map_err(|error| SaveConfigError::Write {
            path: file_path.to_path_buf(),
            source: error,
        })?;

        Ok(())
    }

    /// Write a config with placeholder values.
    pub fn create_default(file_path: &Path) -> Result<(), SaveConfigError> {
        Self::placeholder().save_xml(file_path)
    }
}

/// Decode the contents of a config file.
///
/// A UTF-8 byte order mark is dropped. Anything that isn't valid UTF-8 is
/// treated as ISO-8859-1.
fn decode(bytes: &[u8]) -> Cow<'_, str> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

    match core::str::from_utf8(bytes) {
        Ok(contents) => Cow::Borrowed(contents),
        Err(_) => Cow::Owned(bytes.iter().copied().map(char::from).collect()),
    }
}

#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum LoadConfigError {
    #[error("The file does not exist.")]
    NoFile,

    #[error("Failed to read the file:\n{0}")]
    Read(#[source] io::Error),

    #[error("Failed to deserialize the file:\n{0}")]
    Deserialize(#[from] DeError),
}

#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum SaveConfigError {
    #[error("Failed to serialize the config:\n{0}")]
    Serialize(#[from] SeError),

    #[error("Failed to write {path:?}:\n{source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::decode;

    #[test]
    fn decode_strips_bom() {
        let bytes = b"\xEF\xBB\xBF<a>b</a>";
        assert_eq!(decode(bytes), "<a>b</a>");
    }

    #[test]
    fn decode_latin1() {
        let bytes = b"<a>S\xE3o Paulo</a>";
        assert_eq!(decode(bytes), "<a>São Paulo</a>");
    }
}
