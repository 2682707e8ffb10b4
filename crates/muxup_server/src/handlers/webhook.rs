//! Receiver for Mux webhook notifications.

use crate::{error::HttpError, models::webhook::WebhookEvent, AppError, AppState};
use axum::{body::Bytes, extract::State, http::HeaderMap, Json};
use hmac::{Hmac, Mac};
use serde_json::{json, Value};
use sha2::Sha256;
use std::time::{SystemTime, UNIX_EPOCH};
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying `t=<unix seconds>,v1=<hex signature>`.
pub const SIGNATURE_HEADER: &str = "mux-signature";

/// Maximum age of a signed notification, in seconds.
pub const SIGNATURE_TOLERANCE_SECS: u64 = 300;

/// Hex HMAC-SHA256 of `"{timestamp}.{body}"`, as Mux computes it.
pub fn sign_payload(secret: &str, timestamp: u64, body: &[u8]) -> Result<String, AppError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| AppError::Internal)?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(body);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Check a `Mux-Signature` header value against the raw request body.
///
/// # Errors
/// Returns [`AppError::Unauthorized`] when the header is malformed, stale, or
/// carries no matching signature.
pub fn verify_signature(
    header: &str,
    body: &[u8],
    secret: &str,
    now_unix: u64,
) -> Result<(), AppError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value.parse::<u64>().ok(),
            Some(("v1", value)) => signatures.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp
        .ok_or_else(|| AppError::Unauthorized("Malformed webhook signature".to_string()))?;
    if now_unix.abs_diff(timestamp) > SIGNATURE_TOLERANCE_SECS {
        return Err(AppError::Unauthorized(
            "Webhook signature timestamp outside tolerance".to_string(),
        ));
    }

    let expected = sign_payload(secret, timestamp, body)?;
    let matched = signatures.iter().any(|candidate| {
        candidate.len() == expected.len()
            && bool::from(candidate.as_bytes().ct_eq(expected.as_bytes()))
    });
    if matched {
        Ok(())
    } else {
        Err(AppError::Unauthorized("Invalid webhook signature".to_string()))
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}

/// Apply a Mux notification to the matching asset record.
///
/// Events that match no record, or whose type carries no status change, are
/// acknowledged without writing anything so Mux stops retrying them.
///
/// # Errors
/// Returns 401 on a bad signature (when a signing secret is configured) and
/// 400 when the body is not a webhook event.
pub async fn handle(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, HttpError> {
    if let Some(secret) = state.webhook_secret()? {
        let header = headers
            .get(SIGNATURE_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("Missing webhook signature".to_string()))?;
        if let Err(err) = verify_signature(header, &body, &secret, unix_now()) {
            tracing::warn!("rejected webhook: {}", err);
            return Err(err.into());
        }
    }

    let event: WebhookEvent = serde_json::from_slice(&body)
        .map_err(|err| AppError::BadRequest(format!("Invalid webhook payload: {}", err)))?;

    let Some(update) = event.status_update() else {
        tracing::debug!(kind = %event.kind, "ignoring webhook event");
        return Ok(Json(json!({ "received": true, "updated": null })));
    };

    let mut target = None;
    for lookup in &update.lookups {
        if let Some(record) = state.assets.find_first(lookup)? {
            target = Some(record);
            break;
        }
    }

    let Some(record) = target else {
        tracing::warn!(kind = %event.kind, mux_id = %event.data.id, "no asset record for webhook");
        return Ok(Json(json!({ "received": true, "updated": null })));
    };

    let updated = state.assets.update(record.id, update.changes)?;
    tracing::info!(kind = %event.kind, id = record.id, "asset updated from webhook");
    Ok(Json(json!({
        "received": true,
        "updated": updated.map(|asset| asset.id),
    })))
}

#[cfg(test)]
mod tests {
    use super::{sign_payload, verify_signature, SIGNATURE_TOLERANCE_SECS};

    const SECRET: &str = "whsec";
    const BODY: &[u8] = br#"{"type":"video.asset.ready","data":{"id":"a"}}"#;

    #[test]
    fn valid_signature_is_accepted() {
        let now = 1_700_000_000;
        let header = format!("t={},v1={}", now, sign_payload(SECRET, now, BODY).expect("sign"));
        verify_signature(&header, BODY, SECRET, now + 10).expect("valid signature");
    }

    #[test]
    fn any_matching_v1_entry_is_enough() {
        let now = 1_700_000_000;
        let header = format!(
            "t={},v1=deadbeef,v1={}",
            now,
            sign_payload(SECRET, now, BODY).expect("sign")
        );
        verify_signature(&header, BODY, SECRET, now).expect("second entry matches");
    }

    #[test]
    fn tampered_body_or_wrong_secret_is_rejected() {
        let now = 1_700_000_000;
        let header = format!("t={},v1={}", now, sign_payload(SECRET, now, BODY).expect("sign"));
        assert!(verify_signature(&header, b"{}", SECRET, now).is_err());
        assert!(verify_signature(&header, BODY, "other", now).is_err());
    }

    #[test]
    fn stale_or_malformed_headers_are_rejected() {
        let signed_at = 1_700_000_000;
        let header = format!(
            "t={},v1={}",
            signed_at,
            sign_payload(SECRET, signed_at, BODY).expect("sign")
        );
        let late = signed_at + SIGNATURE_TOLERANCE_SECS + 1;
        assert!(verify_signature(&header, BODY, SECRET, late).is_err());
        assert!(verify_signature("v1=abc", BODY, SECRET, signed_at).is_err());
        assert!(verify_signature("garbage", BODY, SECRET, signed_at).is_err());
    }
}
