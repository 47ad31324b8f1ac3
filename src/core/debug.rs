//! Planner statistics

use std::collections::VecDeque;
use std::time::Duration;

use super::events::GameEvent;

/// Rolling statistics over path planning requests
#[derive(Debug)]
pub struct PlannerStats {
    /// Recent search times for averaging
    plan_times: VecDeque<Duration>,
    /// Maximum samples to keep
    max_samples: usize,
    /// Average search time in milliseconds
    avg_plan_time_ms: f32,
    /// Fastest recent search in milliseconds
    min_plan_time_ms: f32,
    /// Slowest recent search in milliseconds
    max_plan_time_ms: f32,
    /// Paths successfully planned
    total_plans: u64,
    /// Requests that produced no path
    total_failures: u64,
    /// Projectiles that detonated
    total_explosions: u64,
    /// Ticks simulated
    total_ticks: u64,
}

impl PlannerStats {
    /// Create a new stats tracker
    pub fn new() -> Self {
        Self::with_window(120)
    }

    /// Create a tracker that averages over the last `max_samples` searches
    pub fn with_window(max_samples: usize) -> Self {
        let max_samples = max_samples.max(1);
        Self {
            plan_times: VecDeque::with_capacity(max_samples),
            max_samples,
            avg_plan_time_ms: 0.0,
            min_plan_time_ms: 0.0,
            max_plan_time_ms: 0.0,
            total_plans: 0,
            total_failures: 0,
            total_explosions: 0,
            total_ticks: 0,
        }
    }

    /// Record a finished tick
    pub fn record_tick(&mut self) {
        self.total_ticks += 1;
    }

    /// Record a successful search that took `elapsed`
    pub fn record_plan(&mut self, elapsed: Duration) {
        self.total_plans += 1;

        if self.plan_times.len() >= self.max_samples {
            self.plan_times.pop_front();
        }
        self.plan_times.push_back(elapsed);

        self.update_stats();
    }

    /// Record a request that produced no path
    pub fn record_failure(&mut self) {
        self.total_failures += 1;
    }

    /// Update counters from a simulation event
    pub fn observe(&mut self, event: &GameEvent) {
        match event {
            GameEvent::PathPlanned { elapsed, .. } => self.record_plan(*elapsed),
            GameEvent::PathFailed { .. } => self.record_failure(),
            GameEvent::Exploded { .. } => self.total_explosions += 1,
            _ => {}
        }
    }

    fn update_stats(&mut self) {
        if self.plan_times.is_empty() {
            return;
        }

        let mut total = Duration::ZERO;
        let mut min = Duration::MAX;
        let mut max = Duration::ZERO;

        for &dt in &self.plan_times {
            total += dt;
            min = min.min(dt);
            max = max.max(dt);
        }

        let count = self.plan_times.len() as f32;
        self.avg_plan_time_ms = total.as_secs_f32() / count * 1000.0;
        self.min_plan_time_ms = min.as_secs_f32() * 1000.0;
        self.max_plan_time_ms = max.as_secs_f32() * 1000.0;
    }

    /// Average search time in milliseconds
    pub fn avg_plan_time_ms(&self) -> f32 {
        self.avg_plan_time_ms
    }

    /// Fastest recent search in milliseconds
    pub fn min_plan_time_ms(&self) -> f32 {
        self.min_plan_time_ms
    }

    /// Slowest recent search in milliseconds
    pub fn max_plan_time_ms(&self) -> f32 {
        self.max_plan_time_ms
    }

    /// Paths planned so far
    pub fn total_plans(&self) -> u64 {
        self.total_plans
    }

    /// Failed requests so far
    pub fn total_failures(&self) -> u64 {
        self.total_failures
    }

    /// Detonations so far
    pub fn total_explosions(&self) -> u64 {
        self.total_explosions
    }

    /// Ticks simulated so far
    pub fn total_ticks(&self) -> u64 {
        self.total_ticks
    }

    /// Average plans per tick; a value near the agent count means agents
    /// are replanning every tick
    pub fn plans_per_tick(&self) -> f32 {
        if self.total_ticks == 0 {
            0.0
        } else {
            self.total_plans as f32 / self.total_ticks as f32
        }
    }

    /// Get a formatted stats string
    pub fn format_stats(&self) -> String {
        format!(
            "Plans: {} ({} failed, {:.2}/tick) | Search: {:.3}ms (min: {:.3}, max: {:.3})",
            self.total_plans,
            self.total_failures,
            self.plans_per_tick(),
            self.avg_plan_time_ms,
            self.min_plan_time_ms,
            self.max_plan_time_ms
        )
    }
}

impl Default for PlannerStats {
    fn default() -> Self {
        Self::new()
    }
}
