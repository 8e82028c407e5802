//! Shared fixtures for integration tests

#![allow(dead_code)]

use serde_json::{Value, json};
use std::sync::Arc;

use xtract::engine::config::LlmConfig;
use xtract::engine::llm::ScriptedBackend;
use xtract::Orchestrator;

/// Orchestrator whose three roles all answer from `backend`
pub(crate) fn scripted_orchestrator(backend: &Arc<ScriptedBackend>) -> Orchestrator {
    Orchestrator::with_backend(&LlmConfig::default(), backend.clone())
}

/// Backend that extracts `extracted` for every field and validates it
pub(crate) fn accepting_backend(extracted: &str) -> ScriptedBackend {
    ScriptedBackend::new()
        .reply_for("complain", extracted)
        .reply_for("complain", "true")
        .reply_for("prescription", extracted)
        .reply_for("prescription", "true")
}

/// A short request against the built-in SOAP template
pub(crate) fn short_request(request_id: Value) -> Value {
    json!({
        "request_id": request_id,
        "in": {
            "transcript": [
                {"speaker": "Doctor", "message": "Hello! How are you today?"},
                {"speaker": "Patient", "message": "Good afternoon, Doctor. I'm doing okay, thanks."}
            ],
            "language": "english"
        },
        "out": "soap_en"
    })
}

/// The full doctor/patient consultation used for end-to-end checks
pub(crate) fn soap_consultation() -> Value {
    json!({
        "request_id": 1234,
        "in": {
            "transcript": [
                {"speaker": "Doctor", "message": "Hello! How are you today?"},
                {"speaker": "Patient", "message": "Good afternoon, Doctor. I'm doing okay, thanks."},
                {"speaker": "Doctor", "message": "Glad to hear that. What brings you in today? Any specific concerns or complaints?"},
                {"speaker": "Patient", "message": "Well, I've been having some headaches and a bit of a sore throat for the past few days."},
                {"speaker": "Doctor", "message": "I'm sorry to hear that. Have the headaches been persistent, or do they come and go?"},
                {"speaker": "Patient", "message": "They come and go, mostly in the afternoon. The sore throat is more constant, though."},
                {"speaker": "Doctor", "message": "Any other symptoms, like a fever or cough?"},
                {"speaker": "Patient", "message": "No fever, but I do have a slight cough, nothing major."},
                {"speaker": "Doctor", "message": "Alright. Have you been experiencing any stress or lack of sleep recently?"},
                {"speaker": "Patient", "message": "A bit stressed, I guess. Work has been hectic, and I've not been sleeping well."},
                {"speaker": "Doctor", "message": "That could be contributing to your headaches. Let's do a quick examination. I'll check your throat and take your temperature."},
                {"speaker": "Patient", "message": "Sure, go ahead."},
                {"speaker": "Doctor", "message": "Your throat looks a little inflamed. No signs of infection, but I'll prescribe something to help with the soreness. For the headaches, it might be good to manage stress and ensure you're getting enough rest."},
                {"speaker": "Patient", "message": "Okay, thank you. What should I take for the sore throat?"},
                {"speaker": "Doctor", "message": "I'll prescribe a mild pain reliever and a throat lozenge. Make sure to stay hydrated and try to rest as much as you can."},
                {"speaker": "Patient", "message": "Got it. Anything else I should do?"},
                {"speaker": "Doctor", "message": "If your symptoms persist for more than a week or worsen, please come back for a follow-up. Otherwise, these measures should help. Take care and feel better soon!"},
                {"speaker": "Patient", "message": "Thanks, Doctor. I'll follow your advice."},
                {"speaker": "Doctor", "message": "You're welcome. Have a good day!"}
            ],
            "language": "english"
        },
        "out": "soap_en"
    })
}
