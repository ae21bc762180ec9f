//! SQLite engine with per-thread connections and transactional sessions

use crate::error::SessionError;
use rusqlite::{Connection, OpenFlags};
use std::collections::HashMap;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::{Condvar, Mutex};
use std::thread::{self, ThreadId};
use std::time::Duration;
use tracing::warn;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Where an engine's connections point
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseTarget {
    /// Private in-memory database shared by the engine's connections
    Memory,
    File(PathBuf),
}

impl DatabaseTarget {
    /// Interpret a database URL.
    ///
    /// Accepts `sqlite:///relative.db`, `sqlite:////absolute.db` and plain
    /// paths. An empty path or `:memory:` selects an in-memory database.
    pub fn parse(url: &str) -> Result<Self, SessionError> {
        let path = if let Some(rest) = url.strip_prefix("sqlite:///") {
            rest
        } else if let Some(rest) = url.strip_prefix("sqlite://") {
            rest
        } else if url.contains("://") {
            return Err(SessionError::UnsupportedUrl {
                url: url.to_string(),
            });
        } else {
            url
        };

        match path.trim() {
            "" | ":memory:" => Ok(DatabaseTarget::Memory),
            path => Ok(DatabaseTarget::File(PathBuf::from(path))),
        }
    }
}

/// Connection factory and pool.
///
/// Each thread gets its own connection, checked out for the length of a
/// session and returned afterwards. A connection is never handed to a
/// thread other than the one that last returned it.
///
/// Sessions on an in-memory engine run one at a time. A shared-cache
/// database refuses a second write transaction with `SQLITE_LOCKED`,
/// which the busy timeout does not cover, so other threads wait at the
/// engine instead.
pub struct Engine {
    target: DatabaseTarget,
    uri: String,
    pool: Mutex<HashMap<ThreadId, Connection>>,
    /// Holds a shared in-memory database open while the engine lives
    keepalive: Option<Mutex<Connection>>,
    gate: Option<WriteGate>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("target", &self.target)
            .field("pooled", &self.pooled_connections())
            .finish()
    }
}

impl Engine {
    /// Create an engine from a database URL
    pub fn from_url(url: &str) -> Result<Self, SessionError> {
        Self::new(DatabaseTarget::parse(url)?)
    }

    pub fn new(target: DatabaseTarget) -> Result<Self, SessionError> {
        let (uri, keepalive) = match &target {
            DatabaseTarget::Memory => {
                let uri = format!(
                    "file:pw-{}?mode=memory&cache=shared",
                    uuid::Uuid::new_v4().simple()
                );
                let conn = open_connection(&uri)?;
                (uri, Some(Mutex::new(conn)))
            }
            DatabaseTarget::File(path) => {
                let conn = open_connection(&path.to_string_lossy())?;
                conn.execute_batch("PRAGMA journal_mode=WAL;")?;
                (path.to_string_lossy().into_owned(), None)
            }
        };

        let gate = keepalive.as_ref().map(|_| WriteGate::default());
        Ok(Self {
            target,
            uri,
            pool: Mutex::new(HashMap::new()),
            keepalive,
            gate,
        })
    }

    pub fn target(&self) -> &DatabaseTarget {
        &self.target
    }

    /// File backing the database, if any
    pub fn path(&self) -> Option<&Path> {
        match &self.target {
            DatabaseTarget::File(path) => Some(path),
            DatabaseTarget::Memory => None,
        }
    }

    /// Number of idle connections waiting in the pool
    pub fn pooled_connections(&self) -> usize {
        self.pool.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn checkout(&self) -> Result<Connection, SessionError> {
        let id = thread::current().id();
        let pooled = self
            .pool
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&id);
        match pooled {
            Some(conn) => Ok(conn),
            None => open_connection(&self.uri),
        }
    }

    fn checkin(&self, conn: Connection) {
        let id = thread::current().id();
        self.pool
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id, conn);
    }

    /// Run `f` inside a transaction.
    ///
    /// `Ok` commits. `Err` rolls back and is returned unchanged. A panic in
    /// `f` also rolls back. The connection goes back to the pool in every
    /// case.
    ///
    /// On an in-memory engine this blocks until no other thread is inside a
    /// session, and opening a session from inside another one on the same
    /// thread fails with [`SessionError::Nested`].
    pub fn session<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Session<'_>) -> Result<T, E>,
        E: From<SessionError>,
    {
        // released after the checkout below has rolled back and checked in
        let _pass = self.gate.as_ref().map(WriteGate::enter).transpose()?;
        let mut checkout = Checkout {
            engine: self,
            conn: None,
        };
        let conn: &Connection = checkout.conn.insert(self.checkout()?);

        conn.execute_batch("BEGIN IMMEDIATE").map_err(SessionError::from)?;
        let session = Session { conn };
        let value = f(&session)?;
        conn.execute_batch("COMMIT").map_err(SessionError::from)?;
        Ok(value)
    }

    /// Close every pooled connection
    pub fn dispose(&self) {
        self.pool.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.dispose();
        // last connection to a shared memory database frees it
        self.keepalive.take();
    }
}

fn open_connection(uri: &str) -> Result<Connection, SessionError> {
    let conn = Connection::open_with_flags(
        uri,
        OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    Ok(conn)
}

/// Admits one thread at a time into the sessions of an engine
#[derive(Default)]
struct WriteGate {
    holder: Mutex<Option<ThreadId>>,
    released: Condvar,
}

impl WriteGate {
    fn enter(&self) -> Result<GatePass<'_>, SessionError> {
        let me = thread::current().id();
        let mut holder = self.holder.lock().unwrap_or_else(|e| e.into_inner());
        if *holder == Some(me) {
            return Err(SessionError::Nested);
        }
        while holder.is_some() {
            holder = self
                .released
                .wait(holder)
                .unwrap_or_else(|e| e.into_inner());
        }
        *holder = Some(me);
        Ok(GatePass { gate: self })
    }
}

struct GatePass<'g> {
    gate: &'g WriteGate,
}

impl Drop for GatePass<'_> {
    fn drop(&mut self) {
        *self.gate.holder.lock().unwrap_or_else(|e| e.into_inner()) = None;
        self.gate.released.notify_one();
    }
}

/// A connection inside an open transaction; dereferences to
/// [`rusqlite::Connection`]
pub struct Session<'c> {
    conn: &'c Connection,
}

impl Deref for Session<'_> {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        self.conn
    }
}

/// Returns a checked-out connection to its engine, rolling back whatever
/// transaction is still open
struct Checkout<'e> {
    engine: &'e Engine,
    conn: Option<Connection>,
}

impl Drop for Checkout<'_> {
    fn drop(&mut self) {
        let Some(conn) = self.conn.take() else {
            return;
        };
        if !conn.is_autocommit() {
            if let Err(e) = conn.execute_batch("ROLLBACK") {
                warn!("Rollback failed, discarding connection: {e}");
                return;
            }
        }
        self.engine.checkin(conn);
    }
}
