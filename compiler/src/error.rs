use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error at line {line}, column {column}: {msg}")]
    ParseError {
        msg:    String,
        line:   usize,
        column: usize,
    },

    #[error("Unsupported type: {0}")]
    UnsupportedType(String),

    #[error("Unknown type {0}")]
    UnknownType(String),

    #[error("Proto file or directory \"{}\" not found", .0.display())]
    MissingSource(PathBuf),

    #[error("Command `{command}` failed with {}", describe_exit(.code))]
    CompilationFailure {
        command: String,
        code:    Option<i32>,
    },

    #[error("Index {index} is used twice in {owner}")]
    DuplicateIndexOrOrdinal {
        owner: String,
        index: i32,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Descriptor decode error: {0}")]
    DecodeError(String),

    #[error("Verifier error: {0}")]
    VerifierError(String),
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

impl SchemaError {
    /// Exit code reported by a failed compiler run, if any.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            SchemaError::CompilationFailure { code, .. } => *code,
            _ => None,
        }
    }
}
