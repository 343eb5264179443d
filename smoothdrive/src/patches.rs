//! Seam to the platform layer that toggles native host behaviour.
//!
//! The dynamics core only reports which [`NativeOverrides`] it needs; a
//! [`PatchBank`] owned by the integration keeps the registered overrides
//! in step with that.

use crate::error::PatchError;
use log::{error, info};
use shared::NativeOverrides;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchStatus {
    /// Could not be located; apply and revert are no-ops.
    Error,
    Standby,
    Active,
}

pub trait NativeOverride {
    fn name(&self) -> &str;
    fn status(&self) -> PatchStatus;
    fn apply(&mut self) -> Result<(), PatchError>;
    fn revert(&mut self) -> Result<(), PatchError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverrideGroup {
    Runtime,
    Vehicle,
    Gearbox,
    Steering,
}

impl OverrideGroup {
    pub const ALL: [OverrideGroup; 4] = [
        OverrideGroup::Runtime,
        OverrideGroup::Vehicle,
        OverrideGroup::Gearbox,
        OverrideGroup::Steering,
    ];

    pub fn wanted(&self, needs: &NativeOverrides) -> bool {
        match self {
            OverrideGroup::Runtime => needs.runtime,
            OverrideGroup::Vehicle => needs.vehicle,
            OverrideGroup::Gearbox => needs.gearbox,
            OverrideGroup::Steering => needs.steering,
        }
    }
}

#[derive(Default)]
pub struct PatchBank {
    patches: Vec<(OverrideGroup, Box<dyn NativeOverride>)>,
}

impl PatchBank {
    pub fn register(&mut self, group: OverrideGroup, patch: Box<dyn NativeOverride>) {
        if patch.status() == PatchStatus::Error {
            error!("Native override {} is unavailable", patch.name());
        }
        self.patches.push((group, patch));
    }

    pub fn status(&self, group: OverrideGroup) -> Vec<PatchStatus> {
        self.patches
            .iter()
            .filter(|(g, _)| *g == group)
            .map(|(_, p)| p.status())
            .collect()
    }

    /// Applies or reverts each override so it matches `needs`.
    pub fn sync(&mut self, needs: &NativeOverrides) {
        for (group, patch) in self.patches.iter_mut() {
            let wanted = group.wanted(needs);
            let result = match (wanted, patch.status()) {
                (true, PatchStatus::Standby) => patch.apply(),
                (false, PatchStatus::Active) => patch.revert(),
                _ => Ok(()),
            };
            if let Err(e) = result {
                error!("{:?} override {}: {}", group, patch.name(), e);
            }
        }
    }

    pub fn revert_all(&mut self) {
        for (_, patch) in self.patches.iter_mut() {
            if patch.status() == PatchStatus::Active {
                match patch.revert() {
                    Ok(()) => info!("Reverted {}", patch.name()),
                    Err(e) => error!("{}", e),
                }
            }
        }
    }
}

impl Drop for PatchBank {
    fn drop(&mut self) {
        self.revert_all();
    }
}
