use std::io::ErrorKind;
use std::path::Path;

use wfcheck_types::{Result, WfcheckError};

use crate::document::WorkflowDocument;
use crate::value::Value;

/// Read and parse a workflow file.
pub fn load(path: impl AsRef<Path>) -> Result<WorkflowDocument> {
    let path = path.as_ref();
    let source = match std::fs::read_to_string(path) {
        Ok(source) => source,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            return Err(WfcheckError::NotFound {
                path: path.to_path_buf(),
            });
        }
        Err(err) => return Err(err.into()),
    };
    let doc = parse_document(&source, Some(path))?;
    tracing::debug!(path = %path.display(), jobs = doc.jobs().len(), "loaded workflow");
    Ok(doc)
}

/// Parse an in-memory workflow document.
pub fn parse(source: &str) -> Result<WorkflowDocument> {
    parse_document(source, None)
}

fn parse_document(source: &str, path: Option<&Path>) -> Result<WorkflowDocument> {
    let mut raw: serde_yaml_ng::Value =
        serde_yaml_ng::from_str(source).map_err(|err| parse_error(&err, path))?;
    // `<<: *anchor` keys are expanded before conversion.
    raw.apply_merge().map_err(|err| parse_error(&err, path))?;
    Ok(WorkflowDocument::from_value(
        Value::from(raw),
        path.map(Path::to_path_buf),
    ))
}

fn parse_error(err: &serde_yaml_ng::Error, path: Option<&Path>) -> WfcheckError {
    let (line, col) = err
        .location()
        .map(|loc| (loc.line(), loc.column()))
        .unwrap_or((1, 1));
    WfcheckError::Parse {
        path: path.map(Path::to_path_buf).unwrap_or_else(|| "<memory>".into()),
        line,
        col,
        message: err.to_string(),
    }
}
