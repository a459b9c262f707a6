use std::path::Path;

use aethercast_caster::{AetherConfig, Caster};
use aethercast_common::{Clock, SystemClock};
use aethercast_kernel::SimulationEngine;
use aethercast_ledger::{CostModel, ResourceLedger};
use aethercast_persist::{SessionData, Snapshot};
use anyhow::Context;

/// Resume the session at `path` when the file exists, otherwise start fresh.
pub fn open(path: Option<&Path>, config: AetherConfig) -> anyhow::Result<Caster> {
    match path.filter(|p| p.exists()) {
        Some(path) => resume(path, config, SystemClock),
        None => Ok(Caster::new(config)),
    }
}

/// Rebuild a session from its snapshot under the current configuration.
///
/// Overdue deferred tasks and stale effects are settled before returning.
pub fn resume<C: Clock>(
    path: &Path,
    config: AetherConfig,
    clock: C,
) -> anyhow::Result<Caster<C>> {
    let data = Snapshot::load(path)
        .and_then(|snap| snap.restore())
        .with_context(|| format!("restoring session {}", path.display()))?;
    let engine = SimulationEngine::from_parts(data.state, data.pending, config.engine, clock);
    let ledger = ResourceLedger::restore(config.ledger, data.ledger);
    let mut caster = Caster::from_parts(engine, ledger, CostModel::new(config.cost));
    let settled = caster.tick();
    tracing::info!(path = %path.display(), settled, "resumed session");
    Ok(caster)
}

pub fn save<C: Clock>(path: &Path, caster: &Caster<C>) -> anyhow::Result<()> {
    let engine = caster.engine();
    let session = SessionData {
        state: engine.snapshot(),
        pending: engine.pending_schedule(),
        ledger: caster.ledger().balance(),
    };
    Snapshot::capture(&session, engine.now_ms())?
        .save(path)
        .with_context(|| format!("saving session {}", path.display()))
}
