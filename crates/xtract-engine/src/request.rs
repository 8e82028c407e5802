//! Input normalization
//!
//! Turns a raw request body into the flat [`NormalizedRequest`] the pipelines
//! consume. The transcript is re-serialized with `", "` and `": "` separators so
//! the prompt text matches what the extraction prompts were written against.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_json::ser::Formatter;
use std::io;

use crate::error::XtractError;

/// One dialogue turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub speaker: String,
    pub message: String,
}

impl Turn {
    pub fn new(speaker: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            speaker: speaker.into(),
            message: message.into(),
        }
    }
}

/// A request flattened for the extraction cascade
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRequest {
    /// Echoed verbatim in the response
    pub request_id: Value,
    /// Serialized transcript, ready to be spliced into a prompt
    pub transcript: String,
    pub language: String,
    /// Template key (`out` in the request body)
    pub template: String,
}

impl NormalizedRequest {
    /// `request_id` rendered for log records: strings unquoted, anything else as JSON
    #[must_use]
    pub fn request_label(&self) -> String {
        match &self.request_id {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// Normalize a raw request body.
///
/// Expected shape:
///
/// ```json
/// {"request_id": 1234,
///  "in": {"transcript": [{"speaker": "Doctor", "message": "Hi"}], "language": "english"},
///  "out": "soap_en"}
/// ```
///
/// Extra keys are ignored at every level.
///
/// # Errors
///
/// Returns `XtractError::MalformedInput` naming the first missing or wrongly
/// shaped key.
pub fn normalize(body: &Value) -> Result<NormalizedRequest, XtractError> {
    let root = body
        .as_object()
        .ok_or_else(|| malformed("request body must be a JSON object"))?;

    let request_id = match root.get("request_id") {
        None | Some(Value::Null) => return Err(malformed("missing 'request_id'")),
        Some(id) => id.clone(),
    };

    let input = root
        .get("in")
        .ok_or_else(|| malformed("missing 'in'"))?
        .as_object()
        .ok_or_else(|| malformed("'in' must be an object"))?;

    let turns = input
        .get("transcript")
        .ok_or_else(|| malformed("missing 'in.transcript'"))?
        .as_array()
        .ok_or_else(|| malformed("'in.transcript' must be an array"))?
        .iter()
        .enumerate()
        .map(|(index, turn)| parse_turn(index, turn))
        .collect::<Result<Vec<_>, _>>()?;

    let language = input
        .get("language")
        .ok_or_else(|| malformed("missing 'in.language'"))?
        .as_str()
        .ok_or_else(|| malformed("'in.language' must be a string"))?
        .to_string();

    let template = root
        .get("out")
        .ok_or_else(|| malformed("missing 'out'"))?
        .as_str()
        .ok_or_else(|| malformed("'out' must be a string"))?
        .to_string();

    Ok(NormalizedRequest {
        request_id,
        transcript: serialize_transcript(&turns)?,
        language,
        template,
    })
}

fn parse_turn(index: usize, turn: &Value) -> Result<Turn, XtractError> {
    let object = turn
        .as_object()
        .ok_or_else(|| malformed(format!("'in.transcript[{index}]' must be an object")))?;

    let text = |key: &str| -> Result<String, XtractError> {
        object
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                malformed(format!("'in.transcript[{index}].{key}' must be a string"))
            })
    };

    Ok(Turn {
        speaker: text("speaker")?,
        message: text("message")?,
    })
}

fn malformed(reason: impl Into<String>) -> XtractError {
    XtractError::MalformedInput(reason.into())
}

/// Serialize turns as `[{"speaker": "..", "message": ".."}, ...]`.
///
/// Non-ASCII text is written as UTF-8, not `\u` escaped.
///
/// # Errors
///
/// Serialization into memory cannot fail for `Turn`; an error here is reported
/// as `XtractError::Io`.
pub fn serialize_transcript(turns: &[Turn]) -> Result<String, XtractError> {
    let mut buf = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, SpacedFormatter);
    turns
        .serialize(&mut serializer)
        .map_err(|e| XtractError::Io(io::Error::other(e)))?;
    String::from_utf8(buf).map_err(|e| XtractError::Io(io::Error::other(e)))
}

/// Compact JSON with a space after every `,` and `:`
struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(transcript: Value) -> Value {
        json!({
            "request_id": 1234,
            "in": {"transcript": transcript, "language": "english"},
            "out": "soap_en"
        })
    }

    #[test]
    fn test_normalize_single_turn() {
        let normalized =
            normalize(&request(json!([{"speaker": "Doctor", "message": "Hi"}]))).unwrap();

        assert_eq!(normalized.transcript, r#"[{"speaker": "Doctor", "message": "Hi"}]"#);
        assert_eq!(normalized.request_id, json!(1234));
        assert_eq!(normalized.language, "english");
        assert_eq!(normalized.template, "soap_en");
        assert_eq!(normalized.request_label(), "1234");
    }

    #[test]
    fn test_key_order_is_speaker_then_message() {
        let normalized = normalize(&request(json!([
            {"message": "Hello", "speaker": "Patient", "ts": 3},
            {"speaker": "Doctor", "message": "Hi"}
        ])))
        .unwrap();

        assert_eq!(
            normalized.transcript,
            r#"[{"speaker": "Patient", "message": "Hello"}, {"speaker": "Doctor", "message": "Hi"}]"#
        );
    }

    #[test]
    fn test_empty_transcript_is_allowed() {
        let normalized = normalize(&request(json!([]))).unwrap();
        assert_eq!(normalized.transcript, "[]");
    }

    #[test]
    fn test_escapes_and_unicode() {
        let normalized = normalize(&request(json!([
            {"speaker": "Doctor", "message": "Say \"ah\"\nnow"},
            {"speaker": "Paciente", "message": "Me duele la cabeza, señor"}
        ])))
        .unwrap();

        assert!(normalized.transcript.contains(r#""Say \"ah\"\nnow""#));
        assert!(normalized.transcript.contains("señor"));
    }

    #[test]
    fn test_string_request_id_label() {
        let mut body = request(json!([]));
        body["request_id"] = json!("abc-1");
        assert_eq!(normalize(&body).unwrap().request_label(), "abc-1");
    }

    #[test]
    fn test_malformed_inputs() {
        let cases = [
            (json!([]), "JSON object"),
            (json!({"in": {"transcript": [], "language": "en"}, "out": "soap_en"}), "request_id"),
            (
                json!({"request_id": null, "in": {"transcript": [], "language": "en"}, "out": "soap_en"}),
                "request_id",
            ),
            (json!({"request_id": 1, "out": "soap_en"}), "'in'"),
            (
                json!({"request_id": 1, "in": {"language": "en"}, "out": "soap_en"}),
                "in.transcript",
            ),
            (
                json!({"request_id": 1, "in": {"transcript": "hi", "language": "en"}, "out": "soap_en"}),
                "must be an array",
            ),
            (
                json!({"request_id": 1, "in": {"transcript": [{"speaker": "D"}], "language": "en"}, "out": "soap_en"}),
                "in.transcript[0].message",
            ),
            (
                json!({"request_id": 1, "in": {"transcript": [], "language": 7}, "out": "soap_en"}),
                "in.language",
            ),
            (
                json!({"request_id": 1, "in": {"transcript": [], "language": "en"}}),
                "'out'",
            ),
        ];

        for (body, expected) in cases {
            match normalize(&body) {
                Err(XtractError::MalformedInput(reason)) => {
                    assert!(reason.contains(expected), "{reason} should mention {expected}")
                }
                other => panic!("expected MalformedInput for {body}, got {other:?}"),
            }
        }
    }
}
