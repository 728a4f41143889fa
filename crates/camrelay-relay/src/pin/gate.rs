//! PIN state machine and access checks.
//!
//! States are `Unset` and `Set(pin)`. `set_pin` and `clear_pin` always
//! succeed (modulo persistence errors). What happens when a client supplies
//! a PIN while the gate is unset is decided by [`UnsetPinPolicy`].

use std::sync::Arc;

use subtle::ConstantTimeEq;
use tokio::sync::{RwLock, RwLockReadGuard};
use tracing::{info, warn};

use camrelay_core::UnsetPinPolicy;

use crate::error::RelayError;
use crate::pin::store::{MemoryPinStore, PinStore};

/// Length of a PIN in ASCII digits.
pub const PIN_LENGTH: usize = 4;

/// A validated 4-digit PIN.
#[derive(Clone, PartialEq, Eq)]
pub struct Pin(String);

impl Pin {
    /// Accept exactly four ASCII decimal digits.
    pub fn parse(raw: &str) -> Result<Self, RelayError> {
        if raw.len() == PIN_LENGTH && raw.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(raw.to_string()))
        } else {
            Err(RelayError::Validation("PIN must be a 4-digit number".into()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Constant-time comparison against a client-supplied value.
    pub fn matches(&self, supplied: &str) -> bool {
        self.0.as_bytes().ct_eq(supplied.as_bytes()).into()
    }
}

impl std::fmt::Debug for Pin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Pin(****)")
    }
}

/// A granted access check.
///
/// Holds the gate's read lock, so the PIN cannot be set or cleared until the
/// guarded operation finishes and this is dropped.
#[must_use = "access is only held while the guard is alive"]
#[derive(Debug)]
pub struct Access<'a> {
    _state: RwLockReadGuard<'a, Option<Pin>>,
}

/// The shared PIN gate.
pub struct PinGate {
    state: RwLock<Option<Pin>>,
    store: Arc<dyn PinStore>,
    unset_policy: UnsetPinPolicy,
}

impl PinGate {
    /// Build a gate, loading any previously persisted PIN from `store`.
    pub fn new(store: Box<dyn PinStore>, unset_policy: UnsetPinPolicy) -> Result<Self, RelayError> {
        let initial = store.load()?;
        if initial.is_some() {
            info!("Restored persisted PIN");
        }
        Ok(Self {
            state: RwLock::new(initial),
            store: Arc::from(store),
            unset_policy,
        })
    }

    /// A gate whose PIN lives only as long as the process.
    pub fn in_memory(unset_policy: UnsetPinPolicy) -> Self {
        Self {
            state: RwLock::new(None),
            store: Arc::new(MemoryPinStore),
            unset_policy,
        }
    }

    pub fn is_durable(&self) -> bool {
        self.store.is_durable()
    }

    /// `Unset | Set -> Set(pin)`.
    pub async fn set_pin(&self, pin: Pin) -> Result<(), RelayError> {
        let mut state = self.state.write().await;
        self.write_through(Some(pin.clone())).await?;
        *state = Some(pin);
        info!("PIN set");
        Ok(())
    }

    /// `Set | Unset -> Unset`.
    pub async fn clear_pin(&self) -> Result<(), RelayError> {
        let mut state = self.state.write().await;
        self.write_through(None).await?;
        *state = None;
        info!("PIN cleared");
        Ok(())
    }

    pub async fn is_set(&self) -> bool {
        self.state.read().await.is_some()
    }

    /// Gate for key registration.
    ///
    /// With a PIN set, `supplied` must match it. With no PIN set, a request
    /// that supplies none is let through; one that supplies a PIN anyway is
    /// handled per the configured [`UnsetPinPolicy`].
    pub async fn check_access(&self, supplied: Option<&str>) -> Result<Access<'_>, RelayError> {
        let state = self.state.read().await;
        let unset_with_pin = match (state.as_ref(), supplied) {
            (Some(pin), Some(supplied)) => {
                verify(pin, supplied)?;
                None
            }
            (Some(_), None) => {
                warn!("PIN required but not provided");
                return Err(RelayError::Unauthorized("PIN required".into()));
            }
            (None, None) => None,
            (None, Some(supplied)) => Some(supplied),
        };
        let Some(supplied) = unset_with_pin else {
            return Ok(Access { _state: state });
        };

        match self.unset_policy {
            UnsetPinPolicy::Reject => {
                warn!("PIN supplied but none is set");
                Err(RelayError::Unauthorized("PIN not set on web interface".into()))
            }
            UnsetPinPolicy::Allow => Ok(Access { _state: state }),
            UnsetPinPolicy::Adopt => {
                drop(state);
                self.adopt(supplied).await
            }
        }
    }

    /// Gate for command submission: a PIN must be active, and a supplied
    /// one must match it.
    pub async fn check_command_access(
        &self,
        supplied: Option<&str>,
    ) -> Result<Access<'_>, RelayError> {
        let state = self.state.read().await;
        match (state.as_ref(), supplied) {
            (None, _) => {
                return Err(RelayError::Unauthorized(
                    "No active connection. Please connect from the mobile app first.".into(),
                ));
            }
            (Some(pin), Some(supplied)) => verify(pin, supplied)?,
            (Some(_), None) => {}
        }
        Ok(Access { _state: state })
    }

    /// Make `supplied` the active PIN unless another request set one first.
    async fn adopt(&self, supplied: &str) -> Result<Access<'_>, RelayError> {
        let pin = Pin::parse(supplied)?;
        let mut state = self.state.write().await;
        if let Some(existing) = state.as_ref() {
            verify(existing, supplied)?;
        } else {
            self.write_through(Some(pin.clone())).await?;
            *state = Some(pin);
            info!("Adopted client-supplied PIN");
        }
        Ok(Access {
            _state: state.downgrade(),
        })
    }

    /// Persist the new state before it becomes visible. File stores write on
    /// the blocking pool; the caller holds the write lock throughout.
    async fn write_through(&self, pin: Option<Pin>) -> Result<(), RelayError> {
        if !self.store.is_durable() {
            return self.store.persist(pin.as_ref());
        }
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || store.persist(pin.as_ref()))
            .await
            .map_err(|e| RelayError::Internal(format!("PIN persistence task failed: {e}")))?
    }
}

fn verify(pin: &Pin, supplied: &str) -> Result<(), RelayError> {
    if pin.matches(supplied) {
        Ok(())
    } else {
        warn!("PIN mismatch");
        Err(RelayError::Unauthorized("Invalid PIN".into()))
    }
}
