use crate::keys::RECENT_QUESTIONS_KEY;
use ctc_store::{read_json_or_default, write_json, Store};

pub const MAX_RECENT_QUESTIONS: usize = 5;
pub const MIN_QUESTION_CHARS: usize = 5;

pub fn recent_questions<S: Store + ?Sized>(store: &S) -> Vec<String> {
    read_json_or_default(store, RECENT_QUESTIONS_KEY)
}

/// Remember an assistant question, newest first. Short questions are ignored and a failed
/// write only logs.
pub fn save_recent_question<S: Store + ?Sized>(store: &mut S, question: &str) -> Vec<String> {
    let question = question.trim();
    let existing = recent_questions(store);
    if question.chars().count() < MIN_QUESTION_CHARS {
        return existing;
    }
    let mut updated = Vec::with_capacity(MAX_RECENT_QUESTIONS);
    updated.push(question.to_string());
    updated.extend(existing.into_iter().filter(|q| q != question));
    updated.truncate(MAX_RECENT_QUESTIONS);
    if let Err(err) = write_json(store, RECENT_QUESTIONS_KEY, &updated) {
        log::warn!("Failed to save recent question: {err}");
    }
    updated
}
