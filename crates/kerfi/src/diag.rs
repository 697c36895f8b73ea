//! Diagnostics: logger setup plus a read-only debug surface over a [`World`].
//!
//! [`init_logger`] is always available. With the `diagnostics` feature
//! (default) the world also exposes:
//!
//! - [`World::snapshot`]: an entity's live components keyed by type name,
//! - [`World::missing_prerequisites`]: every entity missing a declared
//!   prerequisite of a type it has,
//! - [`World::system_timings`]: per-system durations from the last `run`,
//! - [`World::report`]: all of the above for every entity, as one
//!   serializable value.
//!
//! Everything here is advisory. Nothing feeds back into membership or
//! scheduling.

use std::sync::{Mutex, OnceLock};

#[cfg(feature = "diagnostics")]
use std::collections::BTreeMap;

#[cfg(feature = "diagnostics")]
use serde::Serialize;

#[cfg(feature = "diagnostics")]
use crate::ecs::{ComponentId, Entity, World, registry};

// ── Logger ──────────────────────────────────────────────────────────────

const LOG_RING_CAPACITY: usize = 256;

/// A warning or error captured by [`init_logger`].
#[derive(Clone, Debug)]
pub struct CapturedLog {
    pub level: log::Level,
    pub target: String,
    pub message: String,
}

static LOG_RING: Mutex<Vec<CapturedLog>> = Mutex::new(Vec::new());
static DIAG_LOGGER: OnceLock<DiagLogger> = OnceLock::new();

/// Delegates to env_logger and keeps recent warnings in a ring.
struct DiagLogger {
    inner: env_logger::Logger,
}

impl log::Log for DiagLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        self.inner.enabled(metadata) || metadata.level() <= log::Level::Warn
    }

    fn log(&self, record: &log::Record) {
        if self.inner.enabled(record.metadata()) {
            self.inner.log(record);
        }
        if record.level() > log::Level::Warn {
            return;
        }
        if let Ok(mut ring) = LOG_RING.lock() {
            if ring.len() >= LOG_RING_CAPACITY {
                ring.remove(0);
            }
            ring.push(CapturedLog {
                level: record.level(),
                target: record.target().to_string(),
                message: format!("{}", record.args()),
            });
        }
    }

    fn flush(&self) {
        self.inner.flush();
    }
}

/// Installs an env_logger-backed logger configured from `RUST_LOG`.
///
/// Warnings and errors are also kept for [`drain_warnings`] regardless of
/// the env filter. Does nothing if a logger is already installed.
pub fn init_logger() {
    let inner = env_logger::Builder::new().parse_default_env().build();
    let max_level = inner.filter();
    let logger = DIAG_LOGGER.get_or_init(|| DiagLogger { inner });

    if log::set_logger(logger).is_err() {
        eprintln!("[kerfi] Warning: a logger is already set. Warning capture disabled.");
        return;
    }
    log::set_max_level(max_level.max(log::LevelFilter::Warn));
}

/// Takes up to `max` captured warnings, oldest first.
pub fn drain_warnings(max: usize) -> Vec<CapturedLog> {
    match LOG_RING.lock() {
        Ok(mut ring) => {
            let n = ring.len().min(max);
            ring.drain(..n).collect()
        }
        Err(_) => Vec::new(),
    }
}

// ── Debug surface ───────────────────────────────────────────────────────

/// Duration of one system's tick in the most recent `World::run`.
#[cfg(feature = "diagnostics")]
#[derive(Clone, Debug, Serialize)]
pub struct SystemTiming {
    pub name: String,
    pub phase: &'static str,
    pub duration_us: f64,
}

/// One entity's live components, rendered with `Debug`.
#[cfg(feature = "diagnostics")]
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EntitySnapshot {
    pub entity: u32,
    /// Short type name → `Debug` text.
    pub components: BTreeMap<String, String>,
}

/// An entity carrying `component` without its prerequisite `missing`.
#[cfg(feature = "diagnostics")]
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PrerequisiteGap {
    pub entity: u32,
    pub component: String,
    pub missing: String,
}

/// Everything the debug surface knows about one world.
#[cfg(feature = "diagnostics")]
#[derive(Clone, Debug, Serialize)]
pub struct WorldReport {
    pub frame: u64,
    pub fps: f64,
    pub entity_count: usize,
    pub entities: Vec<EntitySnapshot>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub prerequisite_gaps: Vec<PrerequisiteGap>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub system_timings: Vec<SystemTiming>,
}

#[cfg(feature = "diagnostics")]
fn component_name(id: ComponentId) -> String {
    registry::component_info(id).map_or_else(|| format!("#{}", id.index()), |info| info.short_name())
}

#[cfg(feature = "diagnostics")]
impl EntitySnapshot {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[cfg(feature = "diagnostics")]
impl WorldReport {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[cfg(feature = "diagnostics")]
impl World {
    /// `entity`'s components keyed by short type name, or `None` if dead.
    pub fn snapshot(&self, entity: Entity) -> Option<EntitySnapshot> {
        if !self.is_alive(entity) {
            return None;
        }
        let components = self
            .signature(entity)
            .ones()
            .filter_map(|slot| {
                let id = ComponentId(slot as u32);
                let value = self.storage().get_erased(id, entity)?;
                Some((component_name(id), value.debug_value()))
            })
            .collect();
        Some(EntitySnapshot {
            entity: entity.index(),
            components,
        })
    }

    /// Every entity missing a prerequisite of a type it has.
    ///
    /// Each gap is also logged at warn level.
    pub fn missing_prerequisites(&self) -> Vec<PrerequisiteGap> {
        let mut gaps = Vec::new();
        for entity in self.entities() {
            let signature = self.signature(entity);
            for slot in signature.ones() {
                let id = ComponentId(slot as u32);
                for required in registry::prerequisites_of(id) {
                    if !signature.get(required.slot()) {
                        let gap = PrerequisiteGap {
                            entity: entity.index(),
                            component: component_name(id),
                            missing: component_name(required),
                        };
                        log::warn!(
                            "{entity} has {} but not its prerequisite {}",
                            gap.component,
                            gap.missing
                        );
                        gaps.push(gap);
                    }
                }
            }
        }
        gaps
    }

    /// Per-system durations from the most recent `run`, in execution order.
    pub fn system_timings(&self) -> &[SystemTiming] {
        &self.timings
    }

    /// Snapshot of every live entity plus prerequisite gaps and timings.
    pub fn report(&self) -> WorldReport {
        WorldReport {
            frame: self.clock().frame(),
            fps: self.clock().fps(),
            entity_count: self.entity_count(),
            entities: self.entities().filter_map(|e| self.snapshot(e)).collect(),
            prerequisite_gaps: self.missing_prerequisites(),
            system_timings: self.timings.clone(),
        }
    }
}

#[cfg(all(test, feature = "diagnostics"))]
mod tests {
    use super::*;
    use crate::ecs::{Context, Phase, Placement, System};
    use crate::test_support::{self, Health, Level, Position};

    #[test]
    fn snapshot_lists_components_by_name() {
        let mut world = test_support::world();
        let e = world.create((Position { x: 1.0, y: 2.0 }, Health(3)));
        let snap = world.snapshot(e).unwrap();
        assert_eq!(snap.components["Health"], "Health(3)");
        assert_eq!(snap.components["Position"], "Position { x: 1.0, y: 2.0 }");

        let json = snap.to_json();
        assert!(json.contains("\"Health\":\"Health(3)\""));

        world.destroy(e);
        assert!(world.snapshot(e).is_none());
    }

    #[test]
    fn prerequisite_gaps_are_reported() {
        let mut world = test_support::world();
        // Health declares Position as a prerequisite.
        let lonely = world.create((Health(1),));
        let complete = world.create((Health(1), Position { x: 0.0, y: 0.0 }));

        let gaps = world.missing_prerequisites();
        assert!(gaps.contains(&PrerequisiteGap {
            entity: lonely.index(),
            component: "Health".into(),
            missing: "Position".into(),
        }));
        assert!(gaps.iter().all(|g| g.entity != complete.index()));
    }

    #[test]
    fn timings_follow_schedule() {
        struct Idle;
        impl System for Idle {
            type Query = ();
            type Context = Level;
        }

        let mut world = test_support::world();
        let level: Context<Level> = world.create_context(Level { name: "timed" });
        world.add_system(Phase::RENDER, &level, |_| Idle, Placement::new());
        assert!(world.system_timings().is_empty());

        world.run();
        let timings = world.system_timings();
        assert_eq!(timings.len(), 1);
        assert_eq!(timings[0].name, "Idle");
        assert_eq!(timings[0].phase, "Render");

        let report = world.report();
        assert_eq!(report.system_timings.len(), 1);
        assert!(report.to_json().contains("\"Idle\""));
    }
}
