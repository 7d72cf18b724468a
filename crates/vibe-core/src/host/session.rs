//! Owned, lazily (re)initialized connection to the host.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{GradeError, GradeErrorKind};
use crate::host::{HostApi, HostConnector, ResolveHost};

/// Connection state readable without the session, e.g. while a long host
/// call holds the lock the session lives behind.
#[derive(Debug, Clone, Default)]
pub struct SessionStatus(Arc<AtomicBool>);

impl SessionStatus {
    pub fn is_connected(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    fn set(&self, connected: bool) {
        self.0.store(connected, Ordering::Release);
    }
}

/// The single live host connection.
///
/// Not internally synchronized: callers that share a session across
/// requests wrap it in a mutex and hold the lock for a whole apply.
pub struct HostSession {
    connector: Arc<dyn HostConnector>,
    host: Option<Box<dyn ResolveHost>>,
    status: SessionStatus,
}

impl HostSession {
    pub fn new(connector: Arc<dyn HostConnector>) -> Self {
        Self {
            connector,
            host: None,
            status: SessionStatus::default(),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.host.is_some()
    }

    /// Shared handle that tracks [`Self::is_connected`].
    pub fn status(&self) -> SessionStatus {
        self.status.clone()
    }

    /// API flavour of the current connection, if any.
    pub fn api(&self) -> Option<HostApi> {
        self.host.as_ref().map(|h| h.api())
    }

    /// Connect if not already connected. Failures are returned, not retried.
    pub fn connect(&mut self) -> Result<(), GradeError> {
        if self.host.is_none() {
            let host = self.connector.connect()?;
            tracing::info!(api = ?host.api(), "Connected to DaVinci Resolve");
            self.host = Some(host);
            self.status.set(true);
        }
        Ok(())
    }

    /// Run `f` against a connected host.
    ///
    /// A connection-class error from `f` drops the host. If that host was
    /// carried over from an earlier call it may simply have gone stale, so
    /// the session reconnects and runs `f` once more; a fresh connection
    /// that fails is reported as is.
    pub fn with_host<T>(
        &mut self,
        mut f: impl FnMut(&mut dyn ResolveHost) -> Result<T, GradeError>,
    ) -> Result<T, GradeError> {
        let reused = self.host.is_some();
        match self.run(&mut f) {
            Err(e) if reused && e.kind() == GradeErrorKind::Connection => {
                tracing::info!("Reconnecting after stale connection: {e}");
                self.run(&mut f)
            }
            result => result,
        }
    }

    fn run<T>(
        &mut self,
        f: &mut impl FnMut(&mut dyn ResolveHost) -> Result<T, GradeError>,
    ) -> Result<T, GradeError> {
        self.connect()?;
        let Some(host) = self.host.as_mut() else {
            return Err(GradeError::Connection("host connection unavailable".into()));
        };

        let result = f(host.as_mut());
        if let Err(e) = &result
            && e.kind() == GradeErrorKind::Connection
        {
            tracing::warn!("Host connection lost: {e}");
            self.host = None;
            self.status.set(false);
        }
        result
    }
}
