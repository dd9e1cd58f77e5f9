//! Sequence sources.
//!
//! Each positional argument names a file to count, except `-`, which stands
//! for standard input. Inputs are read in the order given and their counts
//! summed.
//!
//! ```rust
//! use kfcount::input::Input;
//!
//! let inputs = Input::from_paths(["genome.fa", "-"]);
//! assert_eq!(inputs[0].to_string(), "genome.fa");
//! assert_eq!(inputs[1], Input::Stdin);
//! ```

use std::{
    fs::File,
    io::{self, Read},
    path::{Path, PathBuf},
};

use crate::error::KfcError;

const STDIN_NAME: &str = "<stdin>";

/// A file to count, or standard input.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Input {
    File(PathBuf),
    #[default]
    Stdin,
}

impl Input {
    /// `-` is standard input; anything else is a file path.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.to_str() {
            Some("-") => Self::Stdin,
            _ => Self::File(path.to_path_buf()),
        }
    }

    /// Maps every path with [`from_path`](Self::from_path), keeping order.
    #[must_use]
    pub fn from_paths<I, P>(paths: I) -> Vec<Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        paths
            .into_iter()
            .map(|path| Self::from_path(path.as_ref()))
            .collect()
    }

    /// The file path, used for extension based format detection.
    #[must_use]
    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Self::File(path) => Some(path),
            Self::Stdin => None,
        }
    }

    /// Name reported in errors and logs.
    #[must_use]
    pub fn display_path(&self) -> PathBuf {
        self.as_path()
            .map_or_else(|| PathBuf::from(STDIN_NAME), Path::to_path_buf)
    }

    /// Opens the raw byte stream.
    ///
    /// # Errors
    ///
    /// Returns [`KfcError::SequenceRead`] if the file cannot be opened.
    pub fn open(&self) -> Result<Box<dyn Read + Send>, KfcError> {
        match self {
            Self::File(path) => File::open(path)
                .map(|file| Box::new(file) as Box<dyn Read + Send>)
                .map_err(|source| KfcError::SequenceRead {
                    source,
                    path: path.clone(),
                }),
            Self::Stdin => Ok(Box::new(io::stdin())),
        }
    }
}

impl std::fmt::Display for Input {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.display_path().display().fmt(f)
    }
}
