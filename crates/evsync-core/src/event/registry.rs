// Evsync Session Registry
// Attached sessions keyed by device number

use indexmap::IndexMap;

use crate::error::RegistryError;
use crate::session::DeviceSession;

/// Maximum number of sessions attached at once
pub const MAX_DEVICES: usize = 40;

/// Owner of every attached device session.
///
/// Keyed by device number (`st_rdev`) so the same node cannot be attached
/// twice. Iteration follows attach order.
#[derive(Debug, Default)]
pub struct SessionManager {
    sessions: IndexMap<u64, DeviceSession>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a session for device number `rdev`
    pub fn attach(&mut self, rdev: u64, session: DeviceSession) -> Result<&mut DeviceSession, RegistryError> {
        if self.sessions.contains_key(&rdev) {
            log::warn!("{}: device {:#x} already attached", session.name(), rdev);
            return Err(RegistryError::Duplicate(rdev));
        }
        if self.sessions.len() >= MAX_DEVICES {
            log::warn!("{}: too many devices, not attaching", session.name());
            return Err(RegistryError::Full(MAX_DEVICES));
        }

        if self.sessions.is_empty() {
            log::debug!("session registry active");
        }
        log::info!("{}: attached as {:#x}", session.name(), rdev);

        let (index, _) = self.sessions.insert_full(rdev, session);
        Ok(&mut self.sessions[index])
    }

    /// Detach and return a session. Pending cycle state is discarded.
    pub fn detach(&mut self, rdev: u64) -> Result<DeviceSession, RegistryError> {
        let mut session = self
            .sessions
            .shift_remove(&rdev)
            .ok_or(RegistryError::UnknownSession(rdev))?;
        session.discard_pending();
        log::info!("{}: detached", session.name());

        if self.sessions.is_empty() {
            log::debug!("session registry idle");
        }
        Ok(session)
    }

    pub fn get(&self, rdev: u64) -> Option<&DeviceSession> {
        self.sessions.get(&rdev)
    }

    pub fn get_mut(&mut self, rdev: u64) -> Option<&mut DeviceSession> {
        self.sessions.get_mut(&rdev)
    }

    pub fn contains(&self, rdev: u64) -> bool {
        self.sessions.contains_key(&rdev)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Whether at least one session is attached
    pub fn is_active(&self) -> bool {
        !self.sessions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u64, &DeviceSession)> {
        self.sessions.iter().map(|(rdev, session)| (*rdev, session))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (u64, &mut DeviceSession)> {
        self.sessions.iter_mut().map(|(rdev, session)| (*rdev, session))
    }
}
