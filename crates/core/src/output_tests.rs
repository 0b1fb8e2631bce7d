// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    plain        = { "hello world", OutputKind::Text },
    json_object  = { r#"{"type":"result"}"#, OutputKind::Json },
    json_array   = { "[1,2]", OutputKind::Text },
    broken_json  = { "{not json", OutputKind::Text },
    indented     = { r#"  {"a":1}"#, OutputKind::Json },
)]
fn from_line_classifies(line: &str, kind: OutputKind) {
    let record = JobOutputRecord::from_line(Utc::now(), OutputSource::Stdout, line);
    assert_eq!(record.kind, kind);
    assert_eq!(record.content, line);
}

#[test]
fn session_id_is_read_from_json_records() {
    let line = r#"{"type":"system","session_id":"abc-123"}"#;
    let record = JobOutputRecord::from_line(Utc::now(), OutputSource::Stdout, line);
    assert_eq!(record.session_id().as_deref(), Some("abc-123"));
}

#[test]
fn session_id_ignores_text_and_empty_values() {
    let text = JobOutputRecord::from_line(Utc::now(), OutputSource::Stdout, "session_id abc");
    assert_eq!(text.session_id(), None);

    let empty = JobOutputRecord::from_line(Utc::now(), OutputSource::Stdout, r#"{"session_id":""}"#);
    assert_eq!(empty.session_id(), None);
}

#[test]
fn record_serializes_as_flat_json_line() {
    let ts = DateTime::<Utc>::UNIX_EPOCH;
    let record = JobOutputRecord::new(ts, OutputSource::Stderr, OutputKind::Text, "oops");
    let json = serde_json::to_string(&record).unwrap();
    assert_eq!(
        json,
        r#"{"ts":"1970-01-01T00:00:00Z","source":"stderr","kind":"text","content":"oops"}"#
    );
}
