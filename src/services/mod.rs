// TextLens Core Services

pub mod text_processor;
pub mod config_store;
pub mod providers;
pub mod history_store;
pub mod detection;

pub use config_store::{AppConfig, ConfigError, ConfigStore};
pub use providers::{ChatBackend, ProviderClient, ProviderError, ProviderSettings};
pub use history_store::{HistoryStore, JsonFileHistoryStore, MemoryHistoryStore, StoreError};

pub use detection::{
    assemble,
    extract,
    merge,
    merge_spans,
    normalize_score,
    validate_text,
    Analyzer,
    HighlightSpan,
    ScoreRequestDispatcher,
};
