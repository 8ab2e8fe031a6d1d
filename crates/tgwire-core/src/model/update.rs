use serde::Serialize;
use serde_json::Value;

use crate::{
    config::DecodeOptions,
    decode::{
        decode_value,
        union::{Variant, VariantTable},
        Decode, Decoder, FieldPath, Object, Step,
    },
    report::{preview, DecodeError, DecodeErrorKind, DecodeReport, Decoded, JsonKind},
};

use super::{
    chat::Chat,
    message::{MaybeInaccessibleMessage, Message},
    user::User,
};

// ============== CallbackQuery ==============

/// A press on an inline keyboard button.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    /// Message with the button; absent for inline-mode messages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<MaybeInaccessibleMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline_message_id: Option<String>,
    /// Identifies the chat the button lives in; useful for high scores in games.
    pub chat_instance: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_short_name: Option<String>,
}

impl Decode for CallbackQuery {
    fn decode(d: &mut Decoder, value: &Value) -> Step<Self> {
        let obj = Object::expect(d, value)?;
        let id = obj.required(d, "id", String::decode);
        let from = obj.required(d, "from", User::decode);
        let message = obj.optional(d, "message", MaybeInaccessibleMessage::decode);
        let inline_message_id = obj.optional(d, "inline_message_id", String::decode);
        let chat_instance = obj.required(d, "chat_instance", String::decode);
        let data = obj.optional(d, "data", String::decode);
        let game_short_name = obj.optional(d, "game_short_name", String::decode);

        Ok(Self {
            id: id?,
            from: from?,
            message: message?,
            inline_message_id: inline_message_id?,
            chat_instance: chat_instance?,
            data: data?,
            game_short_name: game_short_name?,
        })
    }
}

// ============== Update ==============

/// One incoming update. Exactly one payload key is set next to `update_id`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(flatten)]
    pub kind: UpdateKind,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateKind {
    Message(Message),
    EditedMessage(Message),
    ChannelPost(Message),
    EditedChannelPost(Message),
    CallbackQuery(CallbackQuery),
}

impl Update {
    /// The message carried by any of the message-like kinds.
    pub fn message(&self) -> Option<&Message> {
        match &self.kind {
            UpdateKind::Message(m)
            | UpdateKind::EditedMessage(m)
            | UpdateKind::ChannelPost(m)
            | UpdateKind::EditedChannelPost(m) => Some(m),
            UpdateKind::CallbackQuery(q) => q.message.as_ref().and_then(|m| m.accessible()),
        }
    }

    pub fn chat(&self) -> Option<&Chat> {
        match &self.kind {
            UpdateKind::CallbackQuery(q) => q.message.as_ref().map(|m| m.chat()),
            _ => self.message().map(|m| &m.chat),
        }
    }

    /// Who triggered the update, when known.
    pub fn sender(&self) -> Option<&User> {
        match &self.kind {
            UpdateKind::CallbackQuery(q) => Some(&q.from),
            _ => self.message().and_then(|m| m.from.as_ref()),
        }
    }
}

/// The payload key is the discriminator: it must be the only key besides `update_id`.
fn payload_key(d: &mut Decoder, obj: &Object<'_>) -> Step<Option<String>> {
    let mut keys: Vec<&str> = obj
        .keys()
        .filter(|k| *k != "update_id" && obj.field(k).is_present())
        .collect();
    match keys.len() {
        0 => d.fail(
            DecodeErrorKind::MissingDiscriminator {
                union: "Update",
                field: "<payload key>",
            },
            Some(obj.raw()),
        ),
        1 => Ok(Some(keys[0].to_string())),
        _ => {
            keys.sort_unstable();
            d.fail(
                DecodeErrorKind::AmbiguousVariant {
                    union: "Update",
                    keys: keys.into_iter().map(String::from).collect(),
                },
                None,
            )
        }
    }
}

fn message(d: &mut Decoder, obj: &Object<'_>) -> Step<UpdateKind> {
    obj.required(d, "message", Message::decode)
        .map(UpdateKind::Message)
}

fn edited_message(d: &mut Decoder, obj: &Object<'_>) -> Step<UpdateKind> {
    obj.required(d, "edited_message", Message::decode)
        .map(UpdateKind::EditedMessage)
}

fn channel_post(d: &mut Decoder, obj: &Object<'_>) -> Step<UpdateKind> {
    obj.required(d, "channel_post", Message::decode)
        .map(UpdateKind::ChannelPost)
}

fn edited_channel_post(d: &mut Decoder, obj: &Object<'_>) -> Step<UpdateKind> {
    obj.required(d, "edited_channel_post", Message::decode)
        .map(UpdateKind::EditedChannelPost)
}

fn callback_query(d: &mut Decoder, obj: &Object<'_>) -> Step<UpdateKind> {
    obj.required(d, "callback_query", CallbackQuery::decode)
        .map(UpdateKind::CallbackQuery)
}

static UPDATE_KINDS: VariantTable<UpdateKind> = VariantTable {
    union: "Update",
    structural: Some(payload_key),
    tag_field: None,
    exclusive: &[],
    variants: &[
        Variant::new("message", message),
        Variant::new("edited_message", edited_message),
        Variant::new("channel_post", channel_post),
        Variant::new("edited_channel_post", edited_channel_post),
        Variant::new("callback_query", callback_query),
    ],
};

impl Decode for UpdateKind {
    fn decode(d: &mut Decoder, value: &Value) -> Step<Self> {
        UPDATE_KINDS.resolve(d, value)
    }
}

impl Decode for Update {
    fn decode(d: &mut Decoder, value: &Value) -> Step<Self> {
        let obj = Object::expect(d, value)?;
        let update_id = obj.required(d, "update_id", i64::decode);
        let kind = UpdateKind::decode(d, value);
        Ok(Self {
            update_id: update_id?,
            kind: kind?,
        })
    }
}

// ============== Batches ==============

/// Decode result for one element of a `getUpdates` batch.
#[derive(Debug)]
pub struct UpdateOutcome {
    /// `update_id` as read from the raw element, even when the rest failed.
    pub update_id: Option<i64>,
    pub result: Result<Decoded<Update>, DecodeReport>,
}

/// A decoded `getUpdates` result. Each element is decoded on its own.
#[derive(Debug, Default)]
pub struct UpdateBatch {
    pub outcomes: Vec<UpdateOutcome>,
}

impl UpdateBatch {
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn updates(&self) -> impl Iterator<Item = &Update> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok().map(|d| &d.value))
    }

    pub fn failures(&self) -> impl Iterator<Item = (Option<i64>, &DecodeReport)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|r| (o.update_id, r)))
    }

    /// Offset for the next `getUpdates` call: one past the highest id seen.
    ///
    /// Failed updates count too, so a poison update is acknowledged rather
    /// than fetched forever. Saturates at `i64::MAX` instead of wrapping back
    /// to the start of the queue.
    pub fn next_offset(&self) -> Option<i64> {
        self.outcomes
            .iter()
            .filter_map(|o| o.update_id)
            .max()
            .map(|id| id.saturating_add(1))
    }
}

/// Decode every element of a `getUpdates` result array independently.
///
/// Only a non-array input fails as a whole.
pub fn decode_update_batch(
    value: &Value,
    opts: &DecodeOptions,
) -> Result<UpdateBatch, DecodeReport> {
    let Value::Array(items) = value else {
        return Err(DecodeReport::single(DecodeError::new(
            DecodeErrorKind::TypeMismatch {
                expected: "array",
                found: JsonKind::of(value),
            },
            FieldPath::root(),
            Some(preview(value, opts.preview_len)),
        )));
    };

    let outcomes: Vec<UpdateOutcome> = items
        .iter()
        .map(|item| UpdateOutcome {
            update_id: item.get("update_id").and_then(Value::as_i64),
            result: decode_value::<Update>(item, opts),
        })
        .collect();
    let batch = UpdateBatch { outcomes };

    let failed = batch.failures().count();
    if failed > 0 {
        tracing::warn!(
            total = batch.len(),
            failed,
            "dropped updates that failed to decode"
        );
    }
    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{domain::MessageId, model::chat::ChatType};
    use serde_json::json;

    fn message_json(id: i64) -> Value {
        json!({
            "message_id": id,
            "date": 1700000000,
            "chat": {"id": 10, "type": "private"},
            "from": {"id": 10, "is_bot": false, "first_name": "Ann"},
            "text": "/start"
        })
    }

    fn strict(v: &Value) -> Result<Decoded<Update>, DecodeReport> {
        decode_value::<Update>(v, &DecodeOptions::strict())
    }

    #[test]
    fn payload_key_selects_kind() {
        let u = strict(&json!({"update_id": 1, "edited_message": message_json(3)}))
            .unwrap()
            .value;
        assert!(matches!(u.kind, UpdateKind::EditedMessage(_)));
        assert_eq!(u.message().unwrap().message_id, MessageId(3));
        assert_eq!(u.sender().unwrap().first_name, "Ann");
    }

    #[test]
    fn several_payload_keys_are_ambiguous() {
        let err = strict(&json!({
            "update_id": 1, "message": message_json(1), "channel_post": message_json(2)
        }))
        .unwrap_err();
        assert_eq!(
            err.errors[0].kind,
            DecodeErrorKind::AmbiguousVariant {
                union: "Update",
                keys: vec!["channel_post".into(), "message".into()]
            }
        );
    }

    #[test]
    fn unknown_and_missing_payloads_fail() {
        let err = strict(&json!({"update_id": 1, "poll": {}})).unwrap_err();
        assert_eq!(
            err.errors[0].kind,
            DecodeErrorKind::UnknownVariant {
                union: "Update",
                tag: "poll".into()
            }
        );

        let err = strict(&json!({"update_id": 1})).unwrap_err();
        assert!(matches!(
            err.errors[0].kind,
            DecodeErrorKind::MissingDiscriminator { union: "Update", .. }
        ));
    }

    #[test]
    fn best_effort_reports_sibling_errors_with_paths() {
        let v = json!({
            "update_id": 9,
            "message": {
                "message_id": 1,
                "date": 5,
                "from": {"id": 2, "is_bot": false},
                "chat": {"id": 2, "type": "secret"}
            }
        });
        let err = decode_value::<Update>(&v, &DecodeOptions::best_effort()).unwrap_err();
        let paths: Vec<String> = err.errors.iter().map(|e| e.path.to_string()).collect();
        assert_eq!(paths, vec!["message.from.first_name", "message.chat.type"]);

        let err = strict(&v).unwrap_err();
        assert_eq!(err.errors.len(), 1);
    }

    #[test]
    fn callback_query_over_inaccessible_message() {
        let u = strict(&json!({
            "update_id": 4,
            "callback_query": {
                "id": "cb1",
                "from": {"id": 10, "is_bot": false, "first_name": "Ann"},
                "message": {"message_id": 8, "date": 0, "chat": {"id": -5, "type": "group"}},
                "chat_instance": "ci",
                "data": "yes"
            }
        }))
        .unwrap()
        .value;
        assert!(u.message().is_none());
        assert_eq!(u.chat().unwrap().kind, ChatType::Group);
        assert_eq!(u.sender().unwrap().id.0, 10);
    }

    #[test]
    fn batch_isolates_bad_updates() {
        let v = json!([
            {"update_id": 100, "message": message_json(1)},
            {"update_id": 101, "message": {"message_id": 2}},
            {"update_id": 102, "callback_query": {"id": "x"}}
        ]);
        let batch = decode_update_batch(&v, &DecodeOptions::strict()).unwrap();
        assert_eq!(batch.len(), 3);
        assert_eq!(batch.updates().count(), 1);
        let failed: Vec<Option<i64>> = batch.failures().map(|(id, _)| id).collect();
        assert_eq!(failed, vec![Some(101), Some(102)]);
        assert_eq!(batch.next_offset(), Some(103));
    }

    #[test]
    fn next_offset_saturates_at_the_top_id() {
        let v = json!([
            {"update_id": 7, "message": message_json(1)},
            {"update_id": i64::MAX, "poll": {}}
        ]);
        let batch = decode_update_batch(&v, &DecodeOptions::strict()).unwrap();
        assert_eq!(batch.failures().count(), 1);
        assert_eq!(batch.next_offset(), Some(i64::MAX));
    }

    #[test]
    fn batch_must_be_an_array() {
        let err = decode_update_batch(&json!({"ok": true}), &DecodeOptions::strict()).unwrap_err();
        assert!(matches!(
            err.errors[0].kind,
            DecodeErrorKind::TypeMismatch { expected: "array", .. }
        ));
        let empty = decode_update_batch(&json!([]), &DecodeOptions::strict()).unwrap();
        assert!(empty.is_empty());
        assert_eq!(empty.next_offset(), None);
    }

    #[test]
    fn update_serializes_flat() {
        let v = json!({"update_id": 1, "message": message_json(1)});
        let u = strict(&v).unwrap().value;
        assert_eq!(serde_json::to_value(&u).unwrap(), v);
    }
}
