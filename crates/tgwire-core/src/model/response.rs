//! The `{ "ok": ..., "result" | "description" }` envelope around every Bot API reply.

use std::{fmt, time::Duration};

use serde::Serialize;
use serde_json::Value;

use crate::{
    config::DecodeOptions,
    decode::{decode_with, Decode, Decoded, Decoder, Object, Step},
    domain::ChatId,
    errors::Error,
    Result,
};

/// Extra hints attached to a failed request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ResponseParameters {
    /// The group was upgraded to a supergroup with this id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub migrate_to_chat_id: Option<ChatId>,
    /// Seconds to wait before repeating a flood-limited request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<i64>,
}

impl Decode for ResponseParameters {
    fn decode(d: &mut Decoder, value: &Value) -> Step<Self> {
        let obj = Object::expect(d, value)?;
        let migrate_to_chat_id = obj.optional(d, "migrate_to_chat_id", ChatId::decode);
        let retry_after = obj.optional(d, "retry_after", i64::decode);
        Ok(Self {
            migrate_to_chat_id: migrate_to_chat_id?,
            retry_after: retry_after?,
        })
    }
}

/// An `ok: false` reply.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ApiError {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<i64>,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<ResponseParameters>,
}

impl ApiError {
    pub fn retry_after(&self) -> Option<Duration> {
        let secs = self.parameters.as_ref()?.retry_after?;
        u64::try_from(secs).ok().map(Duration::from_secs)
    }

    pub fn migrate_to_chat_id(&self) -> Option<ChatId> {
        self.parameters.as_ref()?.migrate_to_chat_id
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.error_code {
            Some(code) => write!(f, "[{code}] {}", self.description),
            None => f.write_str(&self.description),
        }
    }
}

impl std::error::Error for ApiError {}

/// A decoded envelope.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ApiResponse<T> {
    Ok(T),
    Err(ApiError),
}

impl<T> ApiResponse<T> {
    pub fn into_result(self) -> Result<T> {
        match self {
            ApiResponse::Ok(value) => Ok(value),
            ApiResponse::Err(err) => Err(Error::Api(err)),
        }
    }
}

#[derive(Serialize)]
struct Envelope<'a, T> {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<&'a T>,
    #[serde(flatten)]
    error: Option<&'a ApiError>,
}

impl<T: Serialize> Serialize for ApiResponse<T> {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let envelope = match self {
            ApiResponse::Ok(result) => Envelope {
                ok: true,
                result: Some(result),
                error: None,
            },
            ApiResponse::Err(error) => Envelope {
                ok: false,
                result: None,
                error: Some(error),
            },
        };
        envelope.serialize(serializer)
    }
}

impl<T: Decode> Decode for ApiResponse<T> {
    fn decode(d: &mut Decoder, value: &Value) -> Step<Self> {
        let obj = Object::expect(d, value)?;
        if obj.required(d, "ok", bool::decode)? {
            return obj.required(d, "result", T::decode).map(ApiResponse::Ok);
        }
        let error_code = obj.optional(d, "error_code", i64::decode);
        let description = obj.required(d, "description", String::decode);
        let parameters = obj.optional(d, "parameters", ResponseParameters::decode);
        Ok(ApiResponse::Err(ApiError {
            error_code: error_code?,
            description: description?,
            parameters: parameters?,
        }))
    }
}

/// Decode a raw reply body and unwrap the envelope.
///
/// `ok: false` becomes [`Error::Api`]; a malformed body becomes [`Error::Decode`].
pub fn decode_response<T: Decode>(body: &[u8], opts: &DecodeOptions) -> Result<Decoded<T>> {
    let decoded = decode_with::<ApiResponse<T>>(body, opts)?;
    let Decoded { value, warnings } = decoded;
    match value {
        ApiResponse::Ok(value) => Ok(Decoded { value, warnings }),
        ApiResponse::Err(err) => {
            tracing::debug!(error = %err, "api request failed");
            Err(Error::Api(err))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{message::SentMessageId, user::User};
    use serde_json::json;

    #[test]
    fn ok_envelope_unwraps_result() {
        let body = br#"{"ok":true,"result":{"id":7,"is_bot":true,"first_name":"Bot","can_join_groups":false}}"#;
        let me = decode_response::<User>(body, &DecodeOptions::strict())
            .unwrap()
            .value;
        assert!(me.is_bot);
        assert_eq!(me.can_join_groups, Some(false));
    }

    #[test]
    fn error_envelope_maps_to_api_error() {
        let body = br#"{"ok":false,"error_code":429,"description":"Too Many Requests: retry after 5","parameters":{"retry_after":5}}"#;
        let err = decode_response::<SentMessageId>(body, &DecodeOptions::strict()).unwrap_err();
        let Error::Api(api) = err else {
            panic!("expected api error");
        };
        assert_eq!(api.error_code, Some(429));
        assert_eq!(api.retry_after(), Some(Duration::from_secs(5)));
        assert_eq!(api.to_string(), "[429] Too Many Requests: retry after 5");
    }

    #[test]
    fn migration_hint_is_exposed() {
        let body = br#"{"ok":false,"error_code":400,"description":"migrated","parameters":{"migrate_to_chat_id":-1001234567890}}"#;
        let Err(Error::Api(api)) = decode_response::<Value>(body, &DecodeOptions::strict()) else {
            panic!("expected api error");
        };
        assert_eq!(api.migrate_to_chat_id(), Some(ChatId(-1_001_234_567_890)));
    }

    #[test]
    fn malformed_envelope_is_a_decode_error() {
        let err = decode_response::<User>(br#"{"ok":true}"#, &DecodeOptions::strict()).unwrap_err();
        let Error::Decode(report) = err else {
            panic!("expected decode error");
        };
        assert_eq!(report.errors[0].path.to_string(), "result");

        let err = decode_response::<User>(b"<html>", &DecodeOptions::strict()).unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[test]
    fn envelope_serializes_both_shapes() {
        let ok: ApiResponse<i64> = ApiResponse::Ok(3);
        assert_eq!(
            serde_json::to_value(&ok).unwrap(),
            json!({"ok": true, "result": 3})
        );

        let err: ApiResponse<i64> = ApiResponse::Err(ApiError {
            error_code: Some(403),
            description: "Forbidden".into(),
            parameters: None,
        });
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            json!({"ok": false, "error_code": 403, "description": "Forbidden"})
        );
        assert!(err.into_result().is_err());
    }
}
