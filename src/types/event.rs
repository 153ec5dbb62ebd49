//! Structured pipeline events.
//!
//! Every stage transition of the resolution pipeline is reported as a
//! [`ResolutionEvent`] through an [`EventSink`]. The default
//! [`TracingSink`] turns events into leveled `tracing` records and metric
//! counters; [`RecordingSink`] keeps them in memory so tests can assert on
//! the exact sequence a failure mode produces.

use std::sync::Mutex;

use tracing::{debug, info, warn};

use super::candidate::DataType;
use super::profile::NutrientSource;
use crate::telemetry;

/// A stage transition in extraction or resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolutionEvent {
    /// Vision extraction returned `items` food items.
    ExtractionCompleted { items: usize },
    /// A nutrition database search is about to be made.
    LookupAttempted { food_name: String },
    /// The search failed or returned nothing usable.
    LookupFailed { food_name: String, reason: String },
    /// Candidates were scored and a winner selected.
    LookupScored {
        food_name: String,
        description: String,
        data_type: DataType,
        score: u32,
        candidates: usize,
    },
    /// The winning record had zero calories and was thrown away.
    ZeroCaloriesDiscarded {
        food_name: String,
        description: String,
    },
    /// A strategy gave up; the next one in the chain takes over.
    FallbackTriggered {
        food_name: String,
        strategy: String,
        reason: String,
    },
    /// An AI estimate is about to be requested.
    EstimationAttempted { food_name: String, quantity: String },
    /// The AI estimate could not be produced.
    EstimationFailed { food_name: String, reason: String },
    /// A cached database profile was reused.
    CacheHit { food_name: String },
    /// The item's final profile is ready.
    ItemResolved {
        food_name: String,
        source: NutrientSource,
        error: bool,
    },
}

impl ResolutionEvent {
    /// Short snake_case name of the event kind.
    pub fn kind(&self) -> &'static str {
        match self {
            ResolutionEvent::ExtractionCompleted { .. } => "extraction_completed",
            ResolutionEvent::LookupAttempted { .. } => "lookup_attempted",
            ResolutionEvent::LookupFailed { .. } => "lookup_failed",
            ResolutionEvent::LookupScored { .. } => "lookup_scored",
            ResolutionEvent::ZeroCaloriesDiscarded { .. } => "zero_calories_discarded",
            ResolutionEvent::FallbackTriggered { .. } => "fallback_triggered",
            ResolutionEvent::EstimationAttempted { .. } => "estimation_attempted",
            ResolutionEvent::EstimationFailed { .. } => "estimation_failed",
            ResolutionEvent::CacheHit { .. } => "cache_hit",
            ResolutionEvent::ItemResolved { .. } => "item_resolved",
        }
    }
}

/// Receiver of pipeline events.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: ResolutionEvent);
}

/// Logs events through `tracing` and updates metric counters.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: ResolutionEvent) {
        let kind = event.kind();
        match event {
            ResolutionEvent::ExtractionCompleted { items } => {
                info!(event = kind, items, "vision extraction completed");
            }
            ResolutionEvent::LookupAttempted { food_name } => {
                debug!(event = kind, %food_name, "database lookup");
            }
            ResolutionEvent::LookupFailed { food_name, reason } => {
                warn!(event = kind, %food_name, %reason, "database lookup failed");
            }
            ResolutionEvent::LookupScored {
                food_name,
                description,
                data_type,
                score,
                candidates,
            } => {
                debug!(
                    event = kind,
                    %food_name,
                    %description,
                    %data_type,
                    score,
                    candidates,
                    "best match selected"
                );
            }
            ResolutionEvent::ZeroCaloriesDiscarded {
                food_name,
                description,
            } => {
                warn!(event = kind, %food_name, %description, "zero-calorie record discarded");
            }
            ResolutionEvent::FallbackTriggered {
                food_name,
                strategy,
                reason,
            } => {
                metrics::counter!(telemetry::FALLBACKS_TOTAL, "strategy" => strategy.clone())
                    .increment(1);
                info!(event = kind, %food_name, %strategy, %reason, "falling back");
            }
            ResolutionEvent::EstimationAttempted {
                food_name,
                quantity,
            } => {
                debug!(event = kind, %food_name, %quantity, "estimating nutrients");
            }
            ResolutionEvent::EstimationFailed { food_name, reason } => {
                warn!(event = kind, %food_name, %reason, "nutrient estimation failed");
            }
            ResolutionEvent::CacheHit { food_name } => {
                debug!(event = kind, %food_name, "lookup cache hit");
            }
            ResolutionEvent::ItemResolved {
                food_name,
                source,
                error,
            } => {
                let status = if error { "error" } else { "ok" };
                metrics::counter!(telemetry::ITEMS_RESOLVED_TOTAL,
                    "source" => source.as_str(),
                    "status" => status,
                )
                .increment(1);
                debug!(event = kind, %food_name, %source, error, "item resolved");
            }
        }
    }
}

/// Keeps every event in memory, in emission order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<ResolutionEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all events recorded so far.
    pub fn events(&self) -> Vec<ResolutionEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Kinds of the recorded events, in order.
    pub fn kinds(&self) -> Vec<&'static str> {
        self.events().iter().map(ResolutionEvent::kind).collect()
    }

    /// Events that concern one food name, in order.
    pub fn kinds_for(&self, food_name: &str) -> Vec<&'static str> {
        self.events()
            .iter()
            .filter(|e| e.food_name() == Some(food_name))
            .map(ResolutionEvent::kind)
            .collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: ResolutionEvent) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event);
    }
}

impl ResolutionEvent {
    /// Food name the event concerns, if it is item-scoped.
    pub fn food_name(&self) -> Option<&str> {
        match self {
            ResolutionEvent::ExtractionCompleted { .. } => None,
            ResolutionEvent::LookupAttempted { food_name }
            | ResolutionEvent::LookupFailed { food_name, .. }
            | ResolutionEvent::LookupScored { food_name, .. }
            | ResolutionEvent::ZeroCaloriesDiscarded { food_name, .. }
            | ResolutionEvent::FallbackTriggered { food_name, .. }
            | ResolutionEvent::EstimationAttempted { food_name, .. }
            | ResolutionEvent::EstimationFailed { food_name, .. }
            | ResolutionEvent::CacheHit { food_name }
            | ResolutionEvent::ItemResolved { food_name, .. } => Some(food_name.as_str()),
        }
    }
}
