use camino::Utf8PathBuf;

use crate::Cancelled;

/// Misuse of the tree editing API.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum EditError {
    #[error("the element is not part of a list")]
    NotInList,
    #[error("the element is not part of this tree")]
    NotInTree,
    #[error("index {index} is out of range for a list of {len} elements")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Failure to produce a new tree from changed text.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum ReparseError {
    #[error(transparent)]
    Cancelled(#[from] Cancelled),
    #[error("the tree has no parser attached")]
    NoParser,
}

/// Failure to parse a file from disk.
#[derive(Debug, thiserror::Error)]
pub enum ParseFileError {
    #[error("failed to read `{path}`")]
    Io {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Cancelled(#[from] Cancelled),
}
