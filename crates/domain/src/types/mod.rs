//! Domain types and models

pub mod filter;
pub mod order;
pub mod stats;
pub mod sync;

pub use filter::{
    DateMode, DateRange, FilterMode, FilterPatch, FilterState, QuantityRange, QuickFilter,
    StatusFilter,
};
pub use order::{Factory, OrderRecord, Production, Stage, StageProgress, StageStatus};
pub use stats::{
    DestinationBucket, FactoryBucket, Grouping, GroupingKind, MonthBucket, OrderStatistics,
    ParseStatistics, StatisticsPair, Tally,
};
pub use sync::{
    CachedSnapshot, DataSource, FileFailure, ParsedFile, Provenance, RemoteFile, SyncMode,
    SyncOutcome, SyncReport, SyncState,
};
