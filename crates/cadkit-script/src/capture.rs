//! Capture sessions for `import_part`
//!
//! While a script is being imported, its exports are recorded into the
//! innermost session instead of being written out. Sessions nest: a script
//! that imports from a script that imports from a third one holds three.
//!
//! A session is opened with [`CaptureStack::begin`] and lives exactly as long
//! as the returned [`CaptureGuard`]. The guard pops its session when dropped,
//! so errors and early exits cannot leave a stale session behind.

use cadkit_core::Shape;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Exports recorded while one imported script ran
#[derive(Debug)]
pub struct CaptureSession {
    id: u64,
    wanted: String,
    captured: BTreeMap<String, Shape>,
}

impl CaptureSession {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The name the importer asked for
    pub fn wanted(&self) -> &str {
        &self.wanted
    }

    pub fn get(&self, name: &str) -> Option<&Shape> {
        self.captured.get(name)
    }

    pub fn take(&mut self, name: &str) -> Option<Shape> {
        self.captured.remove(name)
    }

    /// Names recorded so far, sorted
    pub fn names(&self) -> Vec<String> {
        self.captured.keys().cloned().collect()
    }
}

/// Signal raised when an import's wanted name is exported.
///
/// Travels through the script as an uncatchable termination value and is
/// only honoured by the import that owns `session`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EarlyExit {
    pub session: u64,
    pub name: String,
}

#[derive(Debug, Default)]
pub struct CaptureStack {
    sessions: Mutex<Vec<CaptureSession>>,
    next_id: AtomicU64,
}

impl CaptureStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a session wanting `name`
    pub fn begin(&self, wanted: impl Into<String>) -> CaptureGuard<'_> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.sessions.lock().push(CaptureSession {
            id,
            wanted: wanted.into(),
            captured: BTreeMap::new(),
        });
        CaptureGuard {
            stack: self,
            id,
            done: false,
        }
    }

    pub fn is_active(&self) -> bool {
        !self.sessions.lock().is_empty()
    }

    pub fn depth(&self) -> usize {
        self.sessions.lock().len()
    }

    /// Whether `id` names the innermost session
    pub fn is_current(&self, id: u64) -> bool {
        self.sessions.lock().last().is_some_and(|s| s.id == id)
    }

    /// Record an export into the innermost session.
    ///
    /// Returns the exit signal when `name` is the one that session wants,
    /// `None` otherwise or when no session is open.
    pub fn record(&self, name: &str, shape: Shape) -> Option<EarlyExit> {
        let mut sessions = self.sessions.lock();
        let session = sessions.last_mut()?;
        session.captured.insert(name.to_string(), shape);
        (session.wanted == name).then(|| EarlyExit {
            session: session.id,
            name: name.to_string(),
        })
    }

    fn remove(&self, id: u64) -> Option<CaptureSession> {
        let mut sessions = self.sessions.lock();
        let pos = sessions.iter().rposition(|s| s.id == id)?;
        Some(sessions.remove(pos))
    }
}

/// Scoped ownership of one capture session
#[derive(Debug)]
pub struct CaptureGuard<'a> {
    stack: &'a CaptureStack,
    id: u64,
    done: bool,
}

impl CaptureGuard<'_> {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Pop the session and hand back what it captured
    pub fn finish(mut self) -> CaptureSession {
        self.done = true;
        self.stack.remove(self.id).unwrap_or(CaptureSession {
            id: self.id,
            wanted: String::new(),
            captured: BTreeMap::new(),
        })
    }
}

impl Drop for CaptureGuard<'_> {
    fn drop(&mut self) {
        if !self.done {
            self.stack.remove(self.id);
        }
    }
}
