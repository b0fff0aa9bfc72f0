//! Error types for a generation run.
//!
//! Every failure aborts the run. No script is written once a step has failed.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Errors that can occur while preparing simulator inputs.
#[derive(Debug)]
pub enum PrepError {
    /// A system parameter (or a quantity derived from it) is unusable.
    InvalidParameter { field: &'static str, reason: String },
    /// An external tool failed during the named step.
    Tool { step: String, failure: ToolFailure },
    /// Reading or writing a file failed.
    Io { path: PathBuf, source: io::Error },
}

/// How an external tool invocation failed.
#[derive(Debug)]
pub enum ToolFailure {
    /// The process could not be started or waited on.
    Launch(io::Error),
    /// The process ran but exited unsuccessfully.
    Exit { code: Option<i32>, stderr: String },
    /// The process did not finish in time and was killed.
    TimedOut(Duration),
    /// The process succeeded but its output cannot be used.
    MalformedOutput(String),
}

impl PrepError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        PrepError::InvalidParameter {
            field,
            reason: reason.into(),
        }
    }

    pub fn tool(step: impl Into<String>, failure: ToolFailure) -> Self {
        PrepError::Tool {
            step: step.into(),
            failure,
        }
    }

    pub fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        PrepError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

impl fmt::Display for PrepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrepError::InvalidParameter { field, reason } => {
                write!(f, "invalid parameter `{}`: {}", field, reason)
            }
            PrepError::Tool { step, failure } => write!(f, "{} failed: {}", step, failure),
            PrepError::Io { path, source } => write!(f, "{}: {}", path.display(), source),
        }
    }
}

impl fmt::Display for ToolFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolFailure::Launch(e) => write!(f, "could not run process: {}", e),
            ToolFailure::Exit { code, stderr } => {
                match code {
                    Some(code) => write!(f, "exited with status {}", code)?,
                    None => write!(f, "terminated by signal")?,
                }
                let stderr = stderr.trim();
                if !stderr.is_empty() {
                    write!(f, "\n{}", stderr)?;
                }
                Ok(())
            }
            ToolFailure::TimedOut(limit) => {
                write!(f, "no exit after {:.1} s, process killed", limit.as_secs_f64())
            }
            ToolFailure::MalformedOutput(msg) => write!(f, "unusable output: {}", msg),
        }
    }
}

impl std::error::Error for PrepError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PrepError::Io { source, .. } => Some(source),
            PrepError::Tool {
                failure: ToolFailure::Launch(e),
                ..
            } => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_field_and_step() {
        let err = PrepError::invalid("sigma0", "must be positive, got 0");
        assert_eq!(
            err.to_string(),
            "invalid parameter `sigma0`: must be positive, got 0"
        );

        let err = PrepError::tool(
            "chain generation (file 3)",
            ToolFailure::Exit {
                code: Some(2),
                stderr: "  bad input\n".to_string(),
            },
        );
        assert_eq!(
            err.to_string(),
            "chain generation (file 3) failed: exited with status 2\nbad input"
        );
    }
}
