//! Constants and URL handling shared by the socket and its channels.

use std::collections::BTreeMap;
use std::time::Duration;

use islands_protocol::{Reply, ReplyStatus};
use url::Url;

use crate::ports::outbound::{PushError, PushResult, TransportError};

pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);
pub const DEFAULT_PUSH_TIMEOUT: Duration = Duration::from_secs(10);

/// Serializer version requested from the server.
pub const PROTOCOL_VSN: &str = "2.0.0";

const TRANSPORT_SEGMENT: &str = "websocket";

/// Build the websocket endpoint: `<base>/websocket?vsn=2.0.0&<params>`.
///
/// `http`/`https` bases are mapped to `ws`/`wss`. A base that already ends in
/// `/websocket` is used as is.
pub fn endpoint_url(base: &str, params: &BTreeMap<String, String>) -> Result<Url, TransportError> {
    let invalid = |reason: String| TransportError::InvalidUrl {
        url: base.to_string(),
        reason,
    };

    let mut url = Url::parse(base).map_err(|e| invalid(e.to_string()))?;

    let scheme = match url.scheme() {
        "ws" | "http" => "ws",
        "wss" | "https" => "wss",
        other => return Err(invalid(format!("unsupported scheme '{other}'"))),
    };
    if url.scheme() != scheme {
        url.set_scheme(scheme)
            .map_err(|_| invalid(format!("cannot switch to scheme '{scheme}'")))?;
    }

    if !url.path().trim_end_matches('/').ends_with(TRANSPORT_SEGMENT) {
        let path = format!("{}/{}", url.path().trim_end_matches('/'), TRANSPORT_SEGMENT);
        url.set_path(&path);
    }

    {
        let mut query = url.query_pairs_mut();
        for (key, value) in params {
            query.append_pair(key, value);
        }
        query.append_pair("vsn", PROTOCOL_VSN);
    }

    Ok(url)
}

/// Map a `phx_reply` envelope to a push result.
pub fn reply_result(reply: Reply) -> PushResult {
    match reply.status {
        ReplyStatus::Ok => Ok(reply.response),
        ReplyStatus::Error => Err(PushError::Rejected(reply.response)),
        ReplyStatus::Timeout => Err(PushError::Timeout),
    }
}
