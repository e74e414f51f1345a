//! Provider error classification
//!
//! RPC providers wrap the useful message inside a JSON body of shape
//! `{"error": {"code": ..., "message": ...}}`. `classify` digs it out so the
//! user sees one readable line instead of a transport dump. It never fails:
//! a malformed body degrades to the raw text behind a parse-failure note.

use crate::error::QueryError;

pub fn classify(err: &QueryError) -> String {
    let Some(body) = &err.body else {
        return err.message.clone();
    };

    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(value) => value
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(|m| m.as_str())
            .map(str::to_owned)
            .unwrap_or_else(|| format!("provider error body missing error.message: {body}")),
        Err(_) => format!("unparseable provider error body: {body}"),
    }
}
