use std::path::PathBuf;
use thiserror::Error;

/// Error taxonomy for the harness core.
///
/// Setup-time conditions (`UnknownLanguage`, `InvalidSchema`, `Json`) and
/// selector conditions (`TestcaseNotFound`) abort a run before any testcase
/// executes. `Spawn` is surfaced per testcase and folded into that
/// testcase's failure; timeouts are not errors at all, they are recorded
/// on the execution output and classified by the result parser.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("testcase '{name}' does not exist under {}", .dir.display())]
    TestcaseNotFound { name: String, dir: PathBuf },

    #[error("failed to spawn {}: {source}", .exe.display())]
    Spawn {
        exe: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no solution function found in {}", .0.display())]
    SignatureNotFound(PathBuf),

    #[error("declaration {} exists but does not define SOLUTION_FUNCTION", .0.display())]
    MalformedDeclaration(PathBuf),

    #[error("invalid results schema: {0}")]
    InvalidSchema(String),

    #[error("language '{0}' is not configured")]
    UnknownLanguage(String),

    #[error("failed to parse {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
