//! # Intent Interpreter
//!
//! Port to the external language model that turns free text into an
//! [`ActionIntent`]. Its output is untrusted and always re-validated.
//!
//! ## Reply Contract
//! ```json
//! { "isAction": true,  "intent": { "kind": "RecordSale", "confidence": 0.92,
//!                                   "items": [{ "itemName": "Pepsi", "quantity": 5, "sellingPrice": 30 }] } }
//! { "isAction": false, "reason": "This looks like a question, not a command" }
//! ```
//!
//! ## Adapters
//! - [`LlmInterpreter`]: OpenAI-compatible chat completions over HTTPS
//! - [`JsonInterpreter`]: the text itself is the reply (scripted clients, tests)

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::InterpreterSettings;
use crate::error::{AssistError, AssistResult};
use bahi_core::{ActionIntent, Language};

/// What the interpreter made of a piece of text.
#[derive(Debug, Clone, PartialEq)]
pub enum Interpretation {
    Action(ActionIntent),
    NotAnAction { reason: String },
}

/// Turns text into a structured intent.
///
/// `vocabulary` is the owner's inventory item names, so the model can map
/// "coke" onto "Coca-Cola".
#[async_trait]
pub trait IntentInterpreter: Send + Sync {
    async fn interpret(
        &self,
        text: &str,
        vocabulary: &[String],
        language: Language,
    ) -> AssistResult<Interpretation>;
}

// =============================================================================
// Reply Parsing
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OracleReply {
    is_action: bool,
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    intent: Option<serde_json::Value>,
}

const DEFAULT_NOT_ACTION_REASON: &str = "Not an actionable command";

/// Parses a raw model reply into an [`Interpretation`].
///
/// Tolerates prose or code fences around the JSON object.
pub fn parse_reply(raw: &str) -> AssistResult<Interpretation> {
    let json = extract_json(raw)
        .ok_or_else(|| AssistError::Upstream("Reply contained no JSON object".into()))?;

    let reply: OracleReply = serde_json::from_str(json)
        .map_err(|e| AssistError::Upstream(format!("Malformed reply: {}", e)))?;

    if !reply.is_action {
        let reason = reply
            .reason
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_NOT_ACTION_REASON.to_string());
        return Ok(Interpretation::NotAnAction { reason });
    }

    let intent = reply
        .intent
        .ok_or_else(|| AssistError::Upstream("Reply marked as action but has no intent".into()))?;

    serde_json::from_value::<ActionIntent>(intent)
        .map(Interpretation::Action)
        .map_err(|e| AssistError::Upstream(format!("Malformed intent: {}", e)))
}

/// Extracts the outermost JSON object from a response that may contain
/// other text.
fn extract_json(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

// =============================================================================
// LLM Interpreter
// =============================================================================

const SYSTEM_PROMPT: &str = r#"You turn a shopkeeper's message into a ledger command.
Messages may be in English, Hindi, or a mix of both.

Respond with ONLY a JSON object, no prose:
{"isAction": false, "reason": "<short reason>"}
or
{"isAction": true, "intent": <INTENT>}

INTENT is one of:
{"kind": "RecordSale", "confidence": 0.0-1.0,
 "items": [{"itemName": str, "quantity": int, "sellingPrice": number}],
 "paymentMethod": "cash"|"upi"|"card"|"credit", "customer": str}
{"kind": "RecordExpense", "confidence": 0.0-1.0,
 "amount": number, "description": str, "category": str}
{"kind": "AdjustInventory", "confidence": 0.0-1.0,
 "itemName": str, "delta": int, "pricePerUnit": number}
{"kind": "CreateInventoryItem", "confidence": 0.0-1.0,
 "itemName": str, "quantity": int, "pricePerUnit": number, "category": str}

Rules:
- Amounts and prices are in rupees.
- Omit any field the message does not state. Never guess prices.
- Prefer item names from the known items list when the message clearly refers to one.
- A negative delta removes stock (damage, theft, miscount).
- Questions, greetings and reports are not actions."#;

/// OpenAI-compatible chat completions client.
pub struct LlmInterpreter {
    client: Client,
    api_key: String,
    api_url: String,
    model: String,
}

impl LlmInterpreter {
    pub fn new(api_key: String, api_url: String, model: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            api_url,
            model,
        }
    }

    /// Builds a client from settings. Fails if no API key was provided.
    pub fn from_settings(settings: &InterpreterSettings) -> AssistResult<Self> {
        let api_key = settings
            .api_key
            .clone()
            .ok_or_else(|| AssistError::Config("BAHI_LLM_API_KEY not set".into()))?;

        Ok(Self::new(
            api_key,
            settings.api_url.clone(),
            settings.model.clone(),
        ))
    }

    fn user_message(text: &str, vocabulary: &[String], language: Language) -> String {
        let known = if vocabulary.is_empty() {
            "(none)".to_string()
        } else {
            vocabulary.join(", ")
        };
        format!(
            "Known items: {}\nPreferred language: {}\nMessage: {}",
            known,
            language.code(),
            text
        )
    }

    async fn complete(&self, user: String) -> AssistResult<String> {
        let request = ChatRequest {
            model: self.model.clone(),
            temperature: 0.0,
            messages: vec![
                ChatMessage {
                    role: "system".into(),
                    content: SYSTEM_PROMPT.into(),
                },
                ChatMessage {
                    role: "user".into(),
                    content: user,
                },
            ],
        };

        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| AssistError::Upstream(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(%status, body = %error_text, "Interpreter API error");
            return Err(AssistError::Upstream(format!("API error: {}", status)));
        }

        let completion: ChatResponse = response
            .json()
            .await
            .map_err(|e| AssistError::Upstream(e.to_string()))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| AssistError::Upstream("Empty response".into()))
    }
}

#[async_trait]
impl IntentInterpreter for LlmInterpreter {
    async fn interpret(
        &self,
        text: &str,
        vocabulary: &[String],
        language: Language,
    ) -> AssistResult<Interpretation> {
        debug!(model = %self.model, vocabulary = vocabulary.len(), "Calling interpreter");
        let raw = self
            .complete(Self::user_message(text, vocabulary, language))
            .await?;
        parse_reply(&raw)
    }
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    temperature: f32,
    messages: Vec<ChatMessage>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

// =============================================================================
// JSON Interpreter
// =============================================================================

/// Treats the input text as the interpreter's reply.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonInterpreter;

#[async_trait]
impl IntentInterpreter for JsonInterpreter {
    async fn interpret(
        &self,
        text: &str,
        _vocabulary: &[String],
        _language: Language,
    ) -> AssistResult<Interpretation> {
        parse_reply(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bahi_core::{ActionKind, IntentPayload, Money};

    #[test]
    fn test_parse_sale_reply() {
        let raw = r#"{"isAction": true, "intent": {"kind": "RecordSale", "confidence": 0.9,
            "items": [{"itemName": "Pepsi", "quantity": 5, "sellingPrice": 30}]}}"#;

        match parse_reply(raw).unwrap() {
            Interpretation::Action(intent) => {
                assert_eq!(intent.kind(), ActionKind::RecordSale);
                match intent.payload {
                    IntentPayload::RecordSale(draft) => {
                        assert_eq!(draft.items[0].selling_price, Some(Money::from_rupees(30)));
                    }
                    other => panic!("unexpected payload {:?}", other),
                }
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_reply_inside_code_fence() {
        let raw = "Here you go:\n```json\n{\"isAction\": false, \"reason\": \"greeting\"}\n```";
        assert_eq!(
            parse_reply(raw).unwrap(),
            Interpretation::NotAnAction {
                reason: "greeting".to_string()
            }
        );
    }

    #[test]
    fn test_not_action_without_reason() {
        let parsed = parse_reply(r#"{"isAction": false}"#).unwrap();
        assert_eq!(
            parsed,
            Interpretation::NotAnAction {
                reason: DEFAULT_NOT_ACTION_REASON.to_string()
            }
        );
    }

    #[test]
    fn test_garbage_is_upstream_error() {
        assert!(matches!(parse_reply("no idea"), Err(AssistError::Upstream(_))));
        assert!(matches!(parse_reply("{not json}"), Err(AssistError::Upstream(_))));
        assert!(matches!(
            parse_reply(r#"{"isAction": true}"#),
            Err(AssistError::Upstream(_))
        ));
        assert!(matches!(
            parse_reply(r#"{"isAction": true, "intent": {"kind": "FlyToMoon", "confidence": 1}}"#),
            Err(AssistError::Upstream(_))
        ));
    }

    #[test]
    fn test_user_message_lists_vocabulary() {
        let msg = LlmInterpreter::user_message(
            "5 pepsi 30 ke",
            &["Pepsi".to_string(), "Frooti".to_string()],
            Language::Hindi,
        );
        assert!(msg.contains("Known items: Pepsi, Frooti"));
        assert!(msg.contains("Preferred language: hi"));
        assert!(msg.ends_with("Message: 5 pepsi 30 ke"));
    }

    #[test]
    fn test_from_settings_requires_key() {
        let settings = InterpreterSettings::default();
        assert!(matches!(
            LlmInterpreter::from_settings(&settings),
            Err(AssistError::Config(_))
        ));

        let settings = InterpreterSettings {
            api_key: Some("sk-test".to_string()),
            ..InterpreterSettings::default()
        };
        let interpreter = LlmInterpreter::from_settings(&settings).unwrap();
        assert_eq!(interpreter.model, "gpt-4o-mini");
    }

    #[tokio::test]
    async fn test_json_interpreter_passthrough() {
        let interpretation = JsonInterpreter
            .interpret(
                r#"{"isAction": true, "intent": {"kind": "RecordExpense", "confidence": 1.0, "amount": 1200, "category": "Electricity"}}"#,
                &[],
                Language::English,
            )
            .await
            .unwrap();
        assert!(matches!(
            interpretation,
            Interpretation::Action(ref i) if i.kind() == ActionKind::RecordExpense
        ));
    }
}
