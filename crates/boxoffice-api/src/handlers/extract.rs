//! Request body extraction.

use axum::extract::{FromRequest, Request};
use axum::http::{header, StatusCode};
use axum::{Form, Json};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

/// A request body sent either as JSON or as an urlencoded form, chosen by
/// `Content-Type`. Any rejection is a 400 carrying the parse message.
pub struct Payload<T>(pub T);

impl<S, T> FromRequest<S> for Payload<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = (StatusCode, String);

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_form = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));

        if is_form {
            let Form(value) = Form::<T>::from_request(req, state)
                .await
                .map_err(|e| (StatusCode::BAD_REQUEST, e.body_text()))?;
            Ok(Self(value))
        } else {
            let Json(value) = Json::<T>::from_request(req, state)
                .await
                .map_err(|e| (StatusCode::BAD_REQUEST, e.body_text()))?;
            Ok(Self(value))
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Unsigned(u64),
    Signed(i64),
    Float(f64),
}

/// Accept `"100"` or `100`; chaincode arguments are always strings.
pub fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match StringOrNumber::deserialize(deserializer)? {
        StringOrNumber::String(s) => s,
        StringOrNumber::Unsigned(n) => n.to_string(),
        StringOrNumber::Signed(n) => n.to_string(),
        StringOrNumber::Float(n) => n.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Priced {
        #[serde(deserialize_with = "string_or_number")]
        price: String,
    }

    #[test]
    fn numbers_and_strings_become_strings() {
        let p: Priced = serde_json::from_str(r#"{"price": 100}"#).unwrap();
        assert_eq!(p.price, "100");
        let p: Priced = serde_json::from_str(r#"{"price": "100"}"#).unwrap();
        assert_eq!(p.price, "100");
        let p: Priced = serde_json::from_str(r#"{"price": -3}"#).unwrap();
        assert_eq!(p.price, "-3");
        assert!(serde_json::from_str::<Priced>(r#"{"price": null}"#).is_err());
        assert!(serde_json::from_str::<Priced>(r#"{}"#).is_err());
    }
}
