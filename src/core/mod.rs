// Core monitoring logic

pub mod alert;
pub mod config;
pub mod feed;
pub mod filter;
pub mod geo;
pub mod input;
pub mod poll;
pub mod store;

// Re-export commonly used items
pub use alert::{AlertController, AlertSettings, AlertState, Sink, StopReason, TriggerOutcome};
pub use config::Config;
pub use feed::{parse_feed, EventRecord, FeedSource, UsgsFeed};
pub use filter::{nearby_events, select_strongest, EvaluatedEvent};
pub use geo::{distance_km, Coordinate};
pub use input::{InputCommand, InputListener, InputSource};
pub use poll::{CycleOutcome, PollLoop, PollSettings};
pub use store::{AlertRecord, DedupStore, EventLog, JsonDedupStore};
