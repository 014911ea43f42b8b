//! Liveness-checked access to the single storage connection of a run.
//!
//! The router has two states. When connected, every access first runs a
//! cheap probe on the held connection; a failing probe closes the stale
//! handle (close errors are ignored), sleeps the fixed backoff and
//! reconnects. When disconnected, the first reconnect attempt is immediate.
//! Reconnect attempts repeat with the same fixed backoff until one succeeds
//! or the optional ceiling in [`RouterConfig`] is reached.

use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::WarehouseError;

/// A connection that can prove it is still usable.
pub trait LiveConnection {
    /// Run a lightweight round trip against the store.
    fn probe(&self) -> Result<(), WarehouseError>;

    /// Release the connection.
    fn close(self) -> Result<(), WarehouseError>;
}

/// Creates fresh connections on demand.
pub trait ConnectionFactory {
    type Connection: LiveConnection;

    fn connect(&self) -> Result<Self::Connection, WarehouseError>;

    /// Human-readable target used in log events.
    fn describe(&self) -> String;
}

/// Reconnect policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouterConfig {
    /// Fixed wait after a failed probe and between failed reconnect attempts.
    pub backoff: Duration,
    /// Give up after this many consecutive failed reconnects. `None` retries forever.
    pub max_reconnect_attempts: Option<u32>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            backoff: Duration::from_secs(1),
            max_reconnect_attempts: None,
        }
    }
}

/// Observable router state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
}

enum Slot<C> {
    Disconnected,
    Connected(C),
}

/// Owns the run's storage connection and hands it out after a liveness check.
pub struct ConnectionRouter<F: ConnectionFactory> {
    factory: F,
    config: RouterConfig,
    slot: Slot<F::Connection>,
}

impl<F: ConnectionFactory> ConnectionRouter<F> {
    /// Create a router in the disconnected state. No connection is opened until first use.
    pub fn new(factory: F, config: RouterConfig) -> Self {
        Self {
            factory,
            config,
            slot: Slot::Disconnected,
        }
    }

    pub fn state(&self) -> ConnectionState {
        match self.slot {
            Slot::Disconnected => ConnectionState::Disconnected,
            Slot::Connected(_) => ConnectionState::Connected,
        }
    }

    pub fn config(&self) -> RouterConfig {
        self.config
    }

    /// Return a connection that just passed the liveness probe.
    ///
    /// Blocks through reconnects. With no reconnect ceiling configured this only
    /// returns once a connection is live.
    pub fn connection(&mut self) -> Result<&F::Connection, WarehouseError> {
        self.ensure_live()?;
        match &self.slot {
            Slot::Connected(connection) => Ok(connection),
            Slot::Disconnected => Err(WarehouseError::ConnectionLost { attempts: 0 }),
        }
    }

    /// Close the held connection, if any.
    pub fn disconnect(&mut self) {
        if let Slot::Connected(connection) =
            std::mem::replace(&mut self.slot, Slot::Disconnected)
        {
            if let Err(error) = connection.close() {
                debug!(%error, "ignoring error while closing storage connection");
            }
        }
    }

    fn ensure_live(&mut self) -> Result<(), WarehouseError> {
        let mut attempts: u32 = 0;
        loop {
            match std::mem::replace(&mut self.slot, Slot::Disconnected) {
                Slot::Connected(connection) => match connection.probe() {
                    Ok(()) => {
                        self.slot = Slot::Connected(connection);
                        return Ok(());
                    }
                    Err(error) => {
                        warn!(
                            target_db = %self.factory.describe(),
                            %error,
                            "storage liveness probe failed; reconnecting"
                        );
                        if let Err(error) = connection.close() {
                            debug!(%error, "ignoring error while closing stale connection");
                        }
                        thread::sleep(self.config.backoff);
                    }
                },
                Slot::Disconnected => {
                    if let Some(max) = self.config.max_reconnect_attempts {
                        if attempts >= max {
                            return Err(WarehouseError::ConnectionLost { attempts });
                        }
                    }
                    if attempts > 0 {
                        thread::sleep(self.config.backoff);
                    }
                    attempts = attempts.saturating_add(1);

                    match self.factory.connect() {
                        Ok(connection) => {
                            info!(target_db = %self.factory.describe(), attempts, "storage connected");
                            self.slot = Slot::Connected(connection);
                        }
                        Err(error) => {
                            warn!(
                                target_db = %self.factory.describe(),
                                attempts,
                                %error,
                                "storage reconnect failed"
                            );
                        }
                    }
                }
            }
        }
    }
}

impl<F: ConnectionFactory> Drop for ConnectionRouter<F> {
    fn drop(&mut self) {
        self.disconnect();
    }
}
