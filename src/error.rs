//! Diagnostic error types for visa-counsel.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]`
//! derives, providing error codes and help text. All predictable failure
//! modes are explicit return values; nothing is thrown for control flow.

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type.
#[derive(Debug, Error, Diagnostic)]
pub enum CounselError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Session(#[from] SessionError),
}

/// Result alias for the crate.
pub type CounselResult<T> = std::result::Result<T, CounselError>;

// ---------------------------------------------------------------------------
// Catalogue errors
// ---------------------------------------------------------------------------

/// Errors from loading, parsing or saving the rule catalogue and its
/// configuration documents.
#[derive(Debug, Error, Diagnostic)]
pub enum CatalogError {
    #[error("failed to read {path}")]
    #[diagnostic(
        code(counsel::catalog::read),
        help("Check that the file exists and is readable.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {message}")]
    #[diagnostic(
        code(counsel::catalog::parse),
        help(
            "Every rule needs a non-empty `action` and a `conditions` array; \
             check the document against the expected schema."
        )
    )]
    Parse { path: String, message: String },

    #[error("failed to write {path}")]
    #[diagnostic(
        code(counsel::catalog::write),
        help("Check that the target directory exists and is writable.")
    )]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV import failed: {failed} of {total} rows rejected")]
    #[diagnostic(
        code(counsel::catalog::import),
        help("Fix the reported rows and re-import; nothing was saved.")
    )]
    Import { failed: usize, total: usize },
}

/// Result alias for catalogue operations.
pub type CatalogResult<T> = std::result::Result<T, CatalogError>;

// ---------------------------------------------------------------------------
// Session errors
// ---------------------------------------------------------------------------

/// Recoverable caller-sequence errors from the session façade. Session
/// state is unchanged when one of these is returned.
#[derive(Debug, Error, Diagnostic)]
pub enum SessionError {
    #[error("no question is currently pending")]
    #[diagnostic(
        code(counsel::session::no_current_question),
        help(
            "`answer` is only valid while a question is pending. \
             Call `start` (or `restart`) first, or check `is_complete`."
        )
    )]
    NoCurrentQuestion,

    #[error("session \"{id}\" not found")]
    #[diagnostic(
        code(counsel::session::not_found),
        help("Start a session with this id before driving it.")
    )]
    NotFound { id: String },
}

/// Result alias for session operations.
pub type SessionResult<T> = std::result::Result<T, SessionError>;
