// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Thread-safe registry of remote build workers: registration,
//! heartbeat tracking, health scoring, and capability-aware selection.

use boe_core::worker::{Capabilities, RemoteWorker, SystemInfo, ToolInfo, WorkerId, WorkerState};
use parking_lot::Mutex;

/// Selection criteria the scheduler passes to [`WorkerRegistry::select`].
#[derive(Debug, Clone, Default)]
pub struct SelectionCriteria {
    pub required_capabilities: Capabilities,
    pub preferred_capabilities: Capabilities,
    pub slots_needed: u32,
    pub prefer_idle: bool,
    pub native_arch: Option<String>,
    pub native_os: Option<String>,
}

impl SelectionCriteria {
    pub fn requiring(capabilities: Capabilities) -> Self {
        Self {
            required_capabilities: capabilities,
            slots_needed: 1,
            ..Self::default()
        }
    }
}

/// Events fired by the registry after its lock has been released, so a
/// subscriber can safely call back into the registry without deadlocking.
pub enum WorkerEvent {
    Registered(WorkerId),
    StateChanged(WorkerId, WorkerState),
    HealthChanged(WorkerId, f64),
}

type Callback = Box<dyn Fn(WorkerEvent) + Send + Sync>;

/// Tracks every worker the coordinator knows about. Order is not
/// observable from the public API -- only `WorkerId` lookups and scored
/// selection are exposed.
pub struct WorkerRegistry {
    workers: Mutex<Vec<RemoteWorker>>,
    heartbeat_timeout_ms: i64,
    max_missed_heartbeats: u32,
    on_event: Mutex<Vec<Callback>>,
}

/// `0.3 * success_rate + 0.2 * latency_term + 0.2 * load_term + 0.2 *
/// heartbeat_term + 0.1 * uptime_term`, matching [`calculate_health`].
/// Latency/CPU/memory/uptime aren't tracked on [`RemoteWorker`] yet, so
/// those terms default to their most favorable value (an idle, freshly
/// connected worker scores as if all were perfect) until dynamic stats
/// reporting lands.
pub fn calculate_health(worker: &RemoteWorker) -> f64 {
    let total_jobs = worker.jobs_completed + worker.jobs_failed;
    let success_rate = if total_jobs == 0 {
        1.0
    } else {
        worker.jobs_completed as f64 / total_jobs as f64
    };
    let latency_term = 1.0; // no latency sample yet: assume favorable
    let load_term = if worker.max_concurrent_jobs == 0 {
        0.0
    } else {
        1.0 - f64::from(worker.running_jobs) / f64::from(worker.max_concurrent_jobs)
    };
    let heartbeat_term = 1.0 - (f64::from(worker.consecutive_missed_heartbeats) / 3.0).min(1.0);
    let uptime_term = 1.0; // no uptime sample yet: assume favorable

    (0.3 * success_rate + 0.2 * latency_term + 0.2 * load_term + 0.2 * heartbeat_term + 0.1 * uptime_term).clamp(0.0, 1.0)
}

impl WorkerRegistry {
    pub fn new(heartbeat_timeout_ms: i64, max_missed_heartbeats: u32) -> Self {
        Self {
            workers: Mutex::new(Vec::new()),
            heartbeat_timeout_ms,
            max_missed_heartbeats,
            on_event: Mutex::new(Vec::new()),
        }
    }

    pub fn on_event(&self, callback: impl Fn(WorkerEvent) + Send + Sync + 'static) {
        self.on_event.lock().push(Box::new(callback));
    }

    fn fire(&self, event: WorkerEvent) {
        // Callbacks run with the worker lock already released by the
        // caller, matching the "callbacks fire outside the lock" rule.
        for callback in self.on_event.lock().iter() {
            callback(event_clone(&event));
        }
    }

    /// Registers a newly-connected worker, assigning `id` and snapshotting
    /// `system_info`/`tools`/`capabilities`. `max_concurrent_jobs` defaults
    /// to the reported CPU count when the caller passes `0`.
    pub fn register(
        &self,
        id: WorkerId,
        system_info: SystemInfo,
        tools: Vec<ToolInfo>,
        capabilities: Capabilities,
        max_concurrent_jobs: u32,
        now_unix_ms: i64,
    ) -> RemoteWorker {
        let max_concurrent_jobs = if max_concurrent_jobs == 0 {
            system_info.cpu_count.max(1)
        } else {
            max_concurrent_jobs
        };
        let mut worker = RemoteWorker::new(id.clone(), system_info, tools, capabilities, max_concurrent_jobs, now_unix_ms);
        worker.state = WorkerState::Online;
        {
            let mut workers = self.workers.lock();
            workers.retain(|w| w.id != id);
            workers.push(worker.clone());
        }
        self.fire(WorkerEvent::Registered(id));
        worker
    }

    pub fn get(&self, id: &WorkerId) -> Option<RemoteWorker> {
        self.workers.lock().iter().find(|w| &w.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.workers.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn all(&self) -> Vec<RemoteWorker> {
        self.workers.lock().clone()
    }

    pub fn remove(&self, id: &WorkerId) -> Option<RemoteWorker> {
        let mut workers = self.workers.lock();
        let index = workers.iter().position(|w| &w.id == id)?;
        Some(workers.remove(index))
    }

    /// Refreshes `id`'s heartbeat clock and clears its missed-heartbeat
    /// counter. Returns `false` if `id` isn't registered.
    pub fn heartbeat(&self, id: &WorkerId, now_unix_ms: i64) -> bool {
        let changed = {
            let mut workers = self.workers.lock();
            match workers.iter_mut().find(|w| &w.id == id) {
                Some(worker) => {
                    worker.record_heartbeat(now_unix_ms);
                    true
                }
                None => false,
            }
        };
        if changed {
            let health = self.get(id).map(|w| calculate_health(&w)).unwrap_or(0.0);
            self.fire(WorkerEvent::HealthChanged(id.clone(), health));
        }
        changed
    }

    /// Increments missed-heartbeat counts for workers overdue per
    /// `heartbeat_timeout_ms`, transitioning any that cross
    /// `max_missed_heartbeats` to [`WorkerState::Offline`]. Returns the ids
    /// that transitioned this call.
    pub fn check_heartbeats(&self, now_unix_ms: i64) -> Vec<WorkerId> {
        let mut transitioned = Vec::new();
        {
            let mut workers = self.workers.lock();
            for worker in workers.iter_mut() {
                if worker.state == WorkerState::Offline {
                    continue;
                }
                if now_unix_ms - worker.last_heartbeat_unix_ms > self.heartbeat_timeout_ms {
                    worker.record_missed_heartbeat();
                    if worker.consecutive_missed_heartbeats >= self.max_missed_heartbeats {
                        worker.state = WorkerState::Offline;
                        transitioned.push(worker.id.clone());
                    }
                }
            }
        }
        for id in &transitioned {
            self.fire(WorkerEvent::StateChanged(id.clone(), WorkerState::Offline));
        }
        transitioned
    }

    /// Adjusts `id`'s running-job count by `delta`, flipping
    /// Online<->Busy at the capacity edge.
    pub fn update_job_count(&self, id: &WorkerId, delta: i32) {
        let new_state = {
            let mut workers = self.workers.lock();
            match workers.iter_mut().find(|w| &w.id == id) {
                Some(worker) => {
                    worker.running_jobs = (i64::from(worker.running_jobs) + i64::from(delta)).max(0) as u32;
                    let previous = worker.state;
                    if matches!(previous, WorkerState::Online | WorkerState::Busy) {
                        worker.state = if worker.running_jobs >= worker.max_concurrent_jobs {
                            WorkerState::Busy
                        } else {
                            WorkerState::Online
                        };
                    }
                    if worker.state != previous {
                        Some(worker.state)
                    } else {
                        None
                    }
                }
                None => None,
            }
        };
        if let Some(state) = new_state {
            self.fire(WorkerEvent::StateChanged(id.clone(), state));
        }
    }

    pub fn record_job_completed(&self, id: &WorkerId) {
        let mut workers = self.workers.lock();
        if let Some(worker) = workers.iter_mut().find(|w| &w.id == id) {
            worker.jobs_completed += 1;
        }
    }

    pub fn record_job_failed(&self, id: &WorkerId) {
        let mut workers = self.workers.lock();
        if let Some(worker) = workers.iter_mut().find(|w| &w.id == id) {
            worker.jobs_failed += 1;
        }
    }

    /// Scores every worker with spare capacity against `criteria`. Workers
    /// missing a required capability, or with fewer free slots than
    /// `slots_needed`, are excluded outright (not merely penalized).
    fn scored_candidates(&self, criteria: &SelectionCriteria) -> Vec<(WorkerId, f64)> {
        self.workers
            .lock()
            .iter()
            .filter(|w| w.state.accepts_jobs() || w.state == WorkerState::Busy)
            .filter_map(|w| {
                let free_slots = w.max_concurrent_jobs.saturating_sub(w.running_jobs);
                if !w.capabilities.contains(criteria.required_capabilities) {
                    return None;
                }
                if free_slots < criteria.slots_needed.max(1) {
                    return None;
                }
                Some((w.id.clone(), score_worker(w, criteria)))
            })
            .collect()
    }

    /// Best single worker for `criteria`, or `None` if no worker has the
    /// required capabilities and enough free slots.
    pub fn select(&self, criteria: &SelectionCriteria) -> Option<WorkerId> {
        self.scored_candidates(criteria)
            .into_iter()
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(id, _)| id)
    }

    /// Top `k` workers for `criteria`, scored and sorted descending.
    pub fn select_many(&self, criteria: &SelectionCriteria, k: usize) -> Vec<WorkerId> {
        let mut candidates = self.scored_candidates(criteria);
        candidates.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        candidates.into_iter().take(k).map(|(id, _)| id).collect()
    }
}

fn score_worker(worker: &RemoteWorker, criteria: &SelectionCriteria) -> f64 {
    let mut score = calculate_health(worker);

    let preferred = criteria.preferred_capabilities;
    if !preferred.is_empty() {
        let matched = (worker.capabilities & preferred).bits().count_ones();
        let total = preferred.bits().count_ones();
        if total > 0 {
            score += 0.2 * (f64::from(matched) / f64::from(total));
        }
    }

    if criteria.prefer_idle {
        let load = if worker.max_concurrent_jobs == 0 {
            0.0
        } else {
            f64::from(worker.running_jobs) / f64::from(worker.max_concurrent_jobs)
        };
        score += 0.3 * (1.0 - load);
    }

    if let Some(arch) = &criteria.native_arch {
        if &worker.system_info.arch == arch {
            score += 0.2;
        }
    }
    if let Some(os) = &criteria.native_os {
        if &worker.system_info.os == os {
            score += 0.1;
        }
    }

    score
}

/// `WorkerEvent` doesn't derive `Clone` (its payloads would force
/// `RemoteWorker` into the hot path); this narrow helper re-wraps the same
/// data for fan-out to multiple callbacks.
fn event_clone(event: &WorkerEvent) -> WorkerEvent {
    match event {
        WorkerEvent::Registered(id) => WorkerEvent::Registered(id.clone()),
        WorkerEvent::StateChanged(id, state) => WorkerEvent::StateChanged(id.clone(), *state),
        WorkerEvent::HealthChanged(id, health) => WorkerEvent::HealthChanged(id.clone(), *health),
    }
}

/// Default worker registry configuration: 30s heartbeat timeout, offline
/// after 3 consecutive missed heartbeats.
impl Default for WorkerRegistry {
    fn default() -> Self {
        Self::new(30_000, 3)
    }
}

#[cfg(test)]
#[path = "worker_registry_tests.rs"]
mod tests;
