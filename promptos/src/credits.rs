//! Credit checks in front of AI actions.
//!
//! A credit is deducted by the backend before the action runs. The backend
//! is the only authority on the balance; `success: false` or any error
//! means "not authorized".

use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::backend::Backend;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionClass {
    Enhance,
    Variations,
    Run,
}

impl fmt::Display for ActionClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ActionClass::Enhance => "enhance",
            ActionClass::Variations => "variations",
            ActionClass::Run => "run",
        };
        f.write_str(label)
    }
}

/// Marks one action class as pending until dropped.
#[derive(Debug)]
pub struct InFlight {
    class: ActionClass,
    pending: Arc<Mutex<HashSet<ActionClass>>>,
    remaining_credits: u32,
}

impl InFlight {
    pub fn class(&self) -> ActionClass {
        self.class
    }

    /// Balance reported by the backend when the credit was taken.
    pub fn remaining_credits(&self) -> u32 {
        self.remaining_credits
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        let mut pending = self
            .pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        pending.remove(&self.class);
    }
}

#[derive(Debug, Clone, Default)]
pub struct CreditGate {
    pending: Arc<Mutex<HashSet<ActionClass>>>,
}

impl CreditGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pending(&self, class: ActionClass) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains(&class)
    }

    /// Reserves `class`, then spends one credit. The reservation is released
    /// again on every failure path.
    pub async fn authorize(&self, backend: &dyn Backend, class: ActionClass) -> Result<InFlight> {
        {
            let mut pending = self
                .pending
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if !pending.insert(class) {
                return Err(Error::Busy(class));
            }
        }
        let mut guard = InFlight {
            class,
            pending: Arc::clone(&self.pending),
            remaining_credits: 0,
        };

        match backend.deduct_credit().await {
            Ok(receipt) if receipt.success => {
                guard.remaining_credits = receipt.ai_credits;
                Ok(guard)
            }
            Ok(_) => Err(Error::LimitReached),
            Err(err) => {
                warn!(%class, error = %err, "credit deduction failed");
                Err(Error::LimitReached)
            }
        }
    }
}
