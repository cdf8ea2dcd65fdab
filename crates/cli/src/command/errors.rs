use ctc_history::HistoryError;
use ctc_protocol::{CommandAction, ErrorEnvelope, NextAction};
use ctc_store::StoreError;
use serde_json::json;
use std::error::Error as StdError;

fn find<'a, T: StdError + 'static>(err: &'a anyhow::Error) -> Option<&'a T> {
    err.chain().find_map(|cause| cause.downcast_ref::<T>())
}

pub fn classify_error(err: &anyhow::Error, action: CommandAction) -> ErrorEnvelope {
    let message = format!("{err:#}");

    if let Some(history) = find::<HistoryError>(err) {
        return match history {
            HistoryError::InvalidIdentity(_) => ErrorEnvelope::new("invalid_identity", message)
                .with_hint("Identities are email addresses, e.g. fleet@example.com."),
            HistoryError::StoreError(_) => storage_error(message),
            HistoryError::UnknownKind(_)
            | HistoryError::UnknownSortMode(_)
            | HistoryError::UnknownTheme(_)
            | HistoryError::UnknownBucketPolicy(_) => {
                ErrorEnvelope::new("invalid_request", message)
            }
        };
    }

    if find::<StoreError>(err).is_some() {
        return storage_error(message);
    }

    if action != CommandAction::Capabilities && find::<serde_json::Error>(err).is_some() {
        return ErrorEnvelope::new("invalid_payload", message)
            .with_hint(format!(
                "Payload does not match the {} action.",
                action.as_str()
            ))
            .with_next_action(NextAction {
                action: CommandAction::Capabilities.as_str().to_string(),
                args: json!({}),
                reason: "Fetch the request schema.".to_string(),
            });
    }

    ErrorEnvelope::new("internal", message)
}

fn storage_error(message: String) -> ErrorEnvelope {
    ErrorEnvelope::new("storage_error", message)
        .with_hint("Check that the data directory is writable (--data-dir or CTC_DATA_DIR).")
}
