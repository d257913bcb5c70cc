//! Media extraction module
//!
//! This module turns raw page markup and script text into a classified,
//! deduplicated and named list of media references. The pipeline is
//! resolver → classifier → strategies → aggregator, driven by
//! [`MediaExtractor`].

pub mod aggregator;
pub mod candidate;
pub mod classifier;
pub mod engine;
pub mod resolver;
pub mod strategies;
pub mod title;

pub use aggregator::Aggregator;
pub use candidate::{MediaCandidate, MediaItem, ResultSet};
pub use classifier::{Classification, Classifier, MediaKind};
pub use engine::MediaExtractor;
pub use resolver::{Resolved, UrlResolver};
pub use strategies::{ExtractionStrategy, ScanContext, StrategyKind};
pub use title::TitleExtractor;
