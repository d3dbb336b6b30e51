use serde::Deserialize;
use url::Url;

use super::error::HubError;

const NEGOTIATE_VERSION: u32 = 1;
const MAX_REDIRECTS: usize = 100;
const WEBSOCKETS: &str = "WebSockets";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NegotiateResponse {
    #[serde(default)]
    pub connection_id: Option<String>,
    #[serde(default)]
    pub connection_token: Option<String>,
    #[serde(default)]
    pub negotiate_version: u32,
    #[serde(default)]
    pub available_transports: Vec<AvailableTransport>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableTransport {
    pub transport: String,
}

impl NegotiateResponse {
    /// Id the socket must present: the token on v1, the bare id on v0.
    pub fn socket_id(&self) -> Option<&str> {
        if self.negotiate_version >= 1 {
            self.connection_token.as_deref()
        } else {
            self.connection_id.as_deref()
        }
    }

    fn supports_websockets(&self) -> bool {
        self.available_transports.is_empty()
            || self
                .available_transports
                .iter()
                .any(|transport| transport.transport == WEBSOCKETS)
    }
}

pub fn parse_hub_url(raw: &str) -> Result<Url, HubError> {
    let url = Url::parse(raw).map_err(|err| HubError::InvalidUrl {
        url: raw.to_string(),
        reason: err.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" | "ws" | "wss" => Ok(url),
        other => Err(HubError::InvalidUrl {
            url: raw.to_string(),
            reason: format!("unsupported scheme `{other}`"),
        }),
    }
}

pub fn negotiate_url(hub: &Url) -> Url {
    let mut url = hub.clone();
    let path = format!("{}/negotiate", url.path().trim_end_matches('/'));
    url.set_path(&path);
    url.query_pairs_mut()
        .append_pair("negotiateVersion", &NEGOTIATE_VERSION.to_string());
    url
}

pub fn websocket_url(hub: &Url, socket_id: Option<&str>) -> Result<Url, HubError> {
    let mut url = hub.clone();
    let scheme = match hub.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => {
            return Err(HubError::InvalidUrl {
                url: hub.to_string(),
                reason: format!("unsupported scheme `{other}`"),
            });
        }
    };
    url.set_scheme(scheme).map_err(|()| HubError::InvalidUrl {
        url: hub.to_string(),
        reason: format!("cannot switch scheme to `{scheme}`"),
    })?;
    if let Some(id) = socket_id {
        url.query_pairs_mut().append_pair("id", id);
    }
    Ok(url)
}

/// Runs the negotiate exchange and returns the URL the socket should open.
pub async fn negotiate(http: &reqwest::Client, hub: &Url) -> Result<Url, HubError> {
    let mut hub = hub.clone();

    for _ in 0..MAX_REDIRECTS {
        let endpoint = negotiate_url(&hub);
        log::debug!("Negotiating with {endpoint}");

        let response: NegotiateResponse = http
            .post(endpoint)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        match resolve(response)? {
            Resolution::Redirect(target) => {
                log::debug!("Negotiation redirected to {target}");
                hub = parse_hub_url(&target)?;
            }
            Resolution::Socket(socket_id) => return websocket_url(&hub, Some(&socket_id)),
        }
    }

    Err(HubError::Negotiate(format!(
        "exceeded {MAX_REDIRECTS} negotiate redirects"
    )))
}

#[derive(Debug, PartialEq, Eq)]
enum Resolution {
    Redirect(String),
    Socket(String),
}

fn resolve(mut response: NegotiateResponse) -> Result<Resolution, HubError> {
    if let Some(error) = response.error.take() {
        return Err(HubError::Negotiate(error));
    }
    if let Some(url) = response.url.take() {
        if response.access_token.is_some() {
            log::warn!("Hub redirect carries an access token; connecting without it");
        }
        return Ok(Resolution::Redirect(url));
    }
    if !response.supports_websockets() {
        return Err(HubError::Negotiate(
            "server does not offer the WebSockets transport".to_string(),
        ));
    }
    let socket_id = response
        .socket_id()
        .ok_or_else(|| HubError::Negotiate("response has no connection id".to_string()))?;
    Ok(Resolution::Socket(socket_id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(json: &str) -> NegotiateResponse {
        serde_json::from_str(json).expect("valid negotiate response")
    }

    #[test]
    fn negotiate_url_appends_segment_and_version() {
        let hub = parse_hub_url("http://localhost:5000/hub").unwrap();
        assert_eq!(
            negotiate_url(&hub).as_str(),
            "http://localhost:5000/hub/negotiate?negotiateVersion=1"
        );
    }

    #[test]
    fn negotiate_url_keeps_existing_query() {
        let hub = parse_hub_url("https://chat.example.com/hub/?tenant=a").unwrap();
        assert_eq!(
            negotiate_url(&hub).as_str(),
            "https://chat.example.com/hub/negotiate?tenant=a&negotiateVersion=1"
        );
    }

    #[test]
    fn websocket_url_switches_scheme_and_adds_id() {
        let hub = parse_hub_url("https://chat.example.com/hub").unwrap();
        let url = websocket_url(&hub, Some("tok en")).unwrap();
        assert_eq!(url.as_str(), "wss://chat.example.com/hub?id=tok+en");

        let hub = parse_hub_url("http://localhost:5000/hub").unwrap();
        let url = websocket_url(&hub, None).unwrap();
        assert_eq!(url.as_str(), "ws://localhost:5000/hub");
    }

    #[test]
    fn rejects_unknown_scheme() {
        assert!(matches!(
            parse_hub_url("ftp://localhost/hub"),
            Err(HubError::InvalidUrl { .. })
        ));
        assert!(matches!(
            parse_hub_url("/hub"),
            Err(HubError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn v1_uses_connection_token() {
        let resolved = resolve(response(
            r#"{"connectionId":"abc","connectionToken":"tok","negotiateVersion":1,
                "availableTransports":[{"transport":"WebSockets","transferFormats":["Text","Binary"]}]}"#,
        ))
        .unwrap();
        assert_eq!(resolved, Resolution::Socket("tok".to_string()));
    }

    #[test]
    fn v0_uses_connection_id() {
        let resolved = resolve(response(r#"{"connectionId":"abc","availableTransports":[]}"#)).unwrap();
        assert_eq!(resolved, Resolution::Socket("abc".to_string()));
    }

    #[test]
    fn redirect_is_followed() {
        let resolved = resolve(response(
            r#"{"url":"https://other.example.com/hub","accessToken":"secret"}"#,
        ))
        .unwrap();
        assert_eq!(
            resolved,
            Resolution::Redirect("https://other.example.com/hub".to_string())
        );
    }

    #[test]
    fn server_error_fails_negotiation() {
        let err = resolve(response(r#"{"error":"Negotiate rejected"}"#)).unwrap_err();
        assert!(matches!(err, HubError::Negotiate(message) if message == "Negotiate rejected"));
    }

    #[test]
    fn missing_websockets_transport_fails() {
        let err = resolve(response(
            r#"{"connectionToken":"tok","negotiateVersion":1,
                "availableTransports":[{"transport":"LongPolling","transferFormats":["Text"]}]}"#,
        ))
        .unwrap_err();
        assert!(matches!(err, HubError::Negotiate(_)));
    }
}
