/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/2/26
******************************************************************************/

//! Connector builder for fluent configuration.

use crate::callbacks::{MessageHandler, NoOpMessageHandler, SessionHandler};
use crate::connector::Connector;
use gatewire_core::error::{ConfigError, GwError};
use gatewire_session::config::SessionConfig;
use gatewire_store::memory::MemoryStore;
use gatewire_store::traits::SequenceStore;
use gatewire_transport::connection::Endpoint;
use gatewire_transport::reconnect::ReconnectPolicy;
use std::sync::Arc;

/// Builder for configuring a [`Connector`].
pub struct ConnectorBuilder {
    /// Session configuration.
    config: Option<SessionConfig>,
    /// Session lifecycle handler.
    session_handler: Option<Arc<dyn SessionHandler>>,
    /// Message handler.
    message_handler: Arc<dyn MessageHandler>,
    /// Sequence store.
    store: Arc<dyn SequenceStore>,
    /// Reconnect policy.
    reconnect: ReconnectPolicy,
}

impl ConnectorBuilder {
    /// Creates a builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: None,
            session_handler: None,
            message_handler: Arc::new(NoOpMessageHandler),
            store: Arc::new(MemoryStore::new()),
            reconnect: ReconnectPolicy::default(),
        }
    }

    /// Sets the session configuration.
    #[must_use]
    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the session lifecycle handler.
    #[must_use]
    pub fn with_session_handler(mut self, handler: Arc<dyn SessionHandler>) -> Self {
        self.session_handler = Some(handler);
        self
    }

    /// Sets the message handler.
    #[must_use]
    pub fn with_message_handler(mut self, handler: Arc<dyn MessageHandler>) -> Self {
        self.message_handler = handler;
        self
    }

    /// Sets the sequence store.
    #[must_use]
    pub fn with_store(mut self, store: Arc<dyn SequenceStore>) -> Self {
        self.store = store;
        self
    }

    /// Sets the reconnect policy.
    #[must_use]
    pub fn with_reconnect_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.reconnect = policy;
        self
    }

    /// Builds the connector, validating the configuration.
    ///
    /// # Errors
    /// Returns `ConfigError` when the configuration or the session
    /// handler is missing, or an endpoint does not parse.
    pub fn build(self) -> Result<Connector, GwError> {
        let config = self.config.ok_or_else(|| ConfigError::MissingOption {
            key: "config".to_string(),
        })?;
        let session_handler =
            self.session_handler
                .ok_or_else(|| ConfigError::MissingOption {
                    key: "session_handler".to_string(),
                })?;

        let real_time: Endpoint = config.real_time_endpoint.parse()?;
        let recovery = config
            .recovery_endpoint
            .as_deref()
            .map(|s| s.parse::<Endpoint>())
            .transpose()?;

        Ok(Connector::from_parts(
            config,
            real_time,
            recovery,
            session_handler,
            self.message_handler,
            self.store,
            self.reconnect,
        ))
    }
}

impl Default for ConnectorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
