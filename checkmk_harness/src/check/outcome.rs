//! Check function return shapes and the multi-result merge

use super::error::CheckError;
use crate::config::constants::compile_time::check::{MESSAGE_SEPARATOR, NON_OK_MARKER};
use crate::script::ScriptValue;

/// What a check function produced, tagged by its declared contract
#[derive(Debug, Clone, PartialEq)]
pub enum CheckOutcome {
    /// One result table, returned as-is
    Single(ScriptValue),
    /// Partial results of a `multi_result` check, in encounter order
    Multiple(Vec<ScriptValue>),
}

impl CheckOutcome {
    /// Collapse into one raw result
    ///
    /// A merged result always has three elements; the perfdata element is
    /// dropped when `keep_perfdata` is false. Single results and lone
    /// partials are never altered.
    pub fn into_result(self, check: &str, keep_perfdata: bool) -> Result<ScriptValue, CheckError> {
        match self {
            CheckOutcome::Single(result) => Ok(result),
            CheckOutcome::Multiple(partials) => {
                let merged_several = partials.len() > 1;
                let mut result = merge_partial_results(check, partials)?;
                if merged_several && !keep_perfdata {
                    if let ScriptValue::List(items) = &mut result {
                        items.truncate(2);
                    }
                }
                Ok(result)
            }
        }
    }
}

/// Merge the partial results of a multi-result check into one
///
/// - no partials is an error
/// - a single partial is returned unchanged
/// - otherwise the worst status wins, messages are joined with `", "` with
///   `(!!)` appended to every non-OK message, and perfdata lists are
///   concatenated in order
pub fn merge_partial_results(
    check: &str,
    partials: Vec<ScriptValue>,
) -> Result<ScriptValue, CheckError> {
    if partials.is_empty() {
        return Err(CheckError::EmptyMultiResult {
            check: check.to_string(),
        });
    }
    if partials.len() == 1 {
        return Ok(partials.into_iter().next().unwrap_or(ScriptValue::Nil));
    }

    let mut status = 0i64;
    let mut messages = Vec::with_capacity(partials.len());
    let mut perfdata = Vec::new();

    for (index, partial) in partials.into_iter().enumerate() {
        let ScriptValue::List(fields) = partial else {
            return Err(CheckError::malformed_partial(
                check,
                index,
                format!("expected a result list, got {}", partial.type_name()),
            ));
        };

        let partial_status = match fields.first() {
            Some(ScriptValue::Integer(s)) => *s,
            Some(other) => {
                return Err(CheckError::malformed_partial(
                    check,
                    index,
                    format!("status must be an integer, got {}", other.type_name()),
                ))
            }
            None => return Err(CheckError::malformed_partial(check, index, "result is empty")),
        };

        let message = match fields.get(1) {
            Some(ScriptValue::String(m)) => m,
            Some(other) => {
                return Err(CheckError::malformed_partial(
                    check,
                    index,
                    format!("message must be a string, got {}", other.type_name()),
                ))
            }
            None => return Err(CheckError::malformed_partial(check, index, "message is missing")),
        };

        status = status.max(partial_status);
        if partial_status == 0 {
            messages.push(message.clone());
        } else {
            messages.push(format!("{}{}", message, NON_OK_MARKER));
        }

        match fields.get(2) {
            None | Some(ScriptValue::Nil) => {}
            Some(ScriptValue::List(entries)) => perfdata.extend(entries.iter().cloned()),
            Some(other) => {
                return Err(CheckError::malformed_partial(
                    check,
                    index,
                    format!("perfdata must be a list, got {}", other.type_name()),
                ))
            }
        }
    }

    Ok(ScriptValue::List(vec![
        ScriptValue::Integer(status),
        ScriptValue::String(messages.join(MESSAGE_SEPARATOR)),
        ScriptValue::List(perfdata),
    ]))
}
