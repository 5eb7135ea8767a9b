//! MQTT transport backed by `rumqttc`, over websocket or plain TCP.

use std::time::Duration;

use async_trait::async_trait;
use rumqttc::{
    AsyncClient, ConnectReturnCode, Event, EventLoop, MqttOptions, Packet, QoS,
    SubscribeReasonCode, Transport,
};

use super::transport::{BrokerTransport, InboundMessage};
use crate::error::BrokerError;

/// Request queue depth between the client handle and its event loop.
const REQUEST_CAPACITY: usize = 64;

/// How long `close` keeps polling to flush the DISCONNECT packet.
const CLOSE_FLUSH_TIMEOUT: Duration = Duration::from_millis(500);

/// rumqttc refuses keep-alive intervals below five seconds.
const MIN_KEEP_ALIVE: Duration = Duration::from_secs(5);

/// Wire scheme of a broker URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrokerScheme {
    /// `ws://`
    Ws,
    /// `wss://`
    Wss,
    /// `mqtt://` or `tcp://`
    Tcp,
}

/// Parsed broker address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerEndpoint {
    /// Transport scheme.
    pub scheme: BrokerScheme,
    /// Host name or address.
    pub host: String,
    /// TCP port.
    pub port: u16,
    /// The URL as given, used verbatim for websocket transports.
    pub url: String,
}

impl BrokerEndpoint {
    /// Parses `ws://host[:port][/path]`, `wss://...`, `mqtt://host[:port]`
    /// or `tcp://host[:port]`. Missing ports default to 80, 443 and 1883.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError::Connect`] for unknown schemes, empty hosts or
    /// bad ports.
    pub fn parse(url: &str) -> Result<Self, BrokerError> {
        let (scheme, rest) = url
            .split_once("://")
            .ok_or_else(|| BrokerError::Connect(format!("broker url has no scheme: {url}")))?;
        let (scheme, default_port) = match scheme.to_ascii_lowercase().as_str() {
            "ws" => (BrokerScheme::Ws, 80),
            "wss" => (BrokerScheme::Wss, 443),
            "mqtt" | "tcp" => (BrokerScheme::Tcp, 1883),
            other => {
                return Err(BrokerError::Connect(format!(
                    "unsupported broker scheme: {other}"
                )));
            }
        };
        let authority = rest.split('/').next().unwrap_or_default();
        let (host, port) = match authority.rsplit_once(':') {
            Some((host, port)) => {
                let port = port
                    .parse::<u16>()
                    .map_err(|_| BrokerError::Connect(format!("invalid broker port: {port}")))?;
                (host, port)
            }
            None => (authority, default_port),
        };
        if host.is_empty() {
            return Err(BrokerError::Connect(format!("broker url has no host: {url}")));
        }
        Ok(Self {
            scheme,
            host: host.to_string(),
            port,
            url: url.to_string(),
        })
    }

    fn options(&self, client_id: &str, keep_alive: Duration) -> MqttOptions {
        let mut options = match self.scheme {
            BrokerScheme::Ws | BrokerScheme::Wss => {
                MqttOptions::new(client_id, self.url.clone(), self.port)
            }
            BrokerScheme::Tcp => MqttOptions::new(client_id, self.host.clone(), self.port),
        };
        match self.scheme {
            BrokerScheme::Ws => {
                options.set_transport(Transport::Ws);
            }
            BrokerScheme::Wss => {
                options.set_transport(Transport::wss_with_default_config());
            }
            BrokerScheme::Tcp => {}
        }
        options.set_keep_alive(keep_alive.max(MIN_KEEP_ALIVE));
        options.set_clean_session(true);
        options
    }
}

impl std::fmt::Display for BrokerEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.url)
    }
}

/// `rumqttc` client/event-loop pair for one session.
struct Session {
    client: AsyncClient,
    event_loop: EventLoop,
}

/// [`BrokerTransport`] over MQTT.
///
/// Every `connect` builds a fresh clean session; subscriptions are
/// re-issued by the connection manager.
pub struct MqttTransport {
    endpoint: BrokerEndpoint,
    client_id: String,
    keep_alive: Duration,
    session: Option<Session>,
}

impl std::fmt::Debug for MqttTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MqttTransport")
            .field("endpoint", &self.endpoint)
            .field("client_id", &self.client_id)
            .field("keep_alive", &self.keep_alive)
            .field("connected", &self.session.is_some())
            .finish()
    }
}

impl MqttTransport {
    /// Creates a transport for the given endpoint. No I/O happens until
    /// [`BrokerTransport::connect`].
    #[must_use]
    pub fn new(
        endpoint: BrokerEndpoint,
        client_id: impl Into<String>,
        keep_alive: Duration,
    ) -> Self {
        Self {
            endpoint,
            client_id: client_id.into(),
            keep_alive,
            session: None,
        }
    }

    fn session(&mut self) -> Result<&mut Session, BrokerError> {
        self.session
            .as_mut()
            .ok_or_else(|| BrokerError::ConnectionLost("no active session".to_string()))
    }
}

#[async_trait]
impl BrokerTransport for MqttTransport {
    async fn connect(&mut self) -> Result<(), BrokerError> {
        self.session = None;
        let options = self.endpoint.options(&self.client_id, self.keep_alive);
        let (client, mut event_loop) = AsyncClient::new(options, REQUEST_CAPACITY);

        loop {
            match event_loop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                    if ack.code != ConnectReturnCode::Success {
                        return Err(BrokerError::Connect(format!(
                            "broker refused connection: {:?}",
                            ack.code
                        )));
                    }
                    break;
                }
                Ok(_) => {}
                Err(e) => return Err(BrokerError::Connect(e.to_string())),
            }
        }

        self.session = Some(Session { client, event_loop });
        Ok(())
    }

    async fn subscribe(&mut self, filter: &str) -> Result<(), BrokerError> {
        let session = self.session()?;
        session
            .client
            .subscribe(filter, QoS::AtMostOnce)
            .await
            .map_err(|e| BrokerError::Subscribe {
                filter: filter.to_string(),
                reason: e.to_string(),
            })
    }

    async fn unsubscribe(&mut self, filter: &str) -> Result<(), BrokerError> {
        let session = self.session()?;
        session
            .client
            .unsubscribe(filter)
            .await
            .map_err(|e| BrokerError::Subscribe {
                filter: filter.to_string(),
                reason: e.to_string(),
            })
    }

    async fn next_message(&mut self) -> Result<InboundMessage, BrokerError> {
        loop {
            let event = self.session()?.event_loop.poll().await;
            match event {
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    return Ok(InboundMessage {
                        topic: publish.topic,
                        payload: publish.payload.to_vec(),
                    });
                }
                Ok(Event::Incoming(Packet::SubAck(ack))) => {
                    let rejected = ack
                        .return_codes
                        .iter()
                        .filter(|code| matches!(code, SubscribeReasonCode::Failure))
                        .count();
                    if rejected > 0 {
                        tracing::warn!(pkid = ack.pkid, rejected, "broker rejected subscription");
                    }
                }
                Ok(Event::Incoming(Packet::Disconnect)) => {
                    self.session = None;
                    return Err(BrokerError::ConnectionLost(
                        "broker sent DISCONNECT".to_string(),
                    ));
                }
                Ok(_) => {}
                Err(e) => {
                    self.session = None;
                    return Err(BrokerError::ConnectionLost(e.to_string()));
                }
            }
        }
    }

    async fn close(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };
        if session.client.try_disconnect().is_err() {
            return;
        }
        let flush = async {
            loop {
                match session.event_loop.poll().await {
                    Ok(Event::Outgoing(rumqttc::Outgoing::Disconnect)) | Err(_) => break,
                    Ok(_) => {}
                }
            }
        };
        let _ = tokio::time::timeout(CLOSE_FLUSH_TIMEOUT, flush).await;
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn parses_websocket_url_with_path() {
        let Ok(endpoint) = BrokerEndpoint::parse("ws://broker.local:9001/mqtt") else {
            panic!("valid url");
        };
        assert_eq!(endpoint.scheme, BrokerScheme::Ws);
        assert_eq!(endpoint.host, "broker.local");
        assert_eq!(endpoint.port, 9001);
        assert_eq!(endpoint.url, "ws://broker.local:9001/mqtt");
    }

    #[test]
    fn default_ports_per_scheme() {
        let Ok(wss) = BrokerEndpoint::parse("wss://broker.example.com/mqtt") else {
            panic!("valid url");
        };
        assert_eq!(wss.port, 443);

        let Ok(tcp) = BrokerEndpoint::parse("mqtt://10.0.0.5") else {
            panic!("valid url");
        };
        assert_eq!(tcp.scheme, BrokerScheme::Tcp);
        assert_eq!(tcp.port, 1883);
    }

    #[test]
    fn rejects_bad_urls() {
        assert!(BrokerEndpoint::parse("broker.local:9001").is_err());
        assert!(BrokerEndpoint::parse("http://broker.local").is_err());
        assert!(BrokerEndpoint::parse("ws://:9001/mqtt").is_err());
        assert!(BrokerEndpoint::parse("ws://broker:notaport").is_err());
    }

    #[tokio::test]
    async fn operations_without_session_fail() {
        let Ok(endpoint) = BrokerEndpoint::parse("ws://127.0.0.1:9/mqtt") else {
            panic!("valid url");
        };
        let mut transport = MqttTransport::new(endpoint, "test", Duration::from_secs(30));
        assert!(transport.subscribe("a/+").await.is_err());
        assert!(transport.next_message().await.is_err());
        transport.close().await;
    }
}
