//! Record sources: the record store, ad platforms and the calendar.
//!
//! Store reads go through [`fetch_with_fallback`], which never fails: an
//! error or an empty table is logged and replaced by sample records, so the
//! dashboard always has something to show on first run.

pub mod calendar;
pub mod google_ads;
pub mod meta;
pub mod samples;
pub mod store;
pub(crate) mod upstream;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::UpstreamError;

/// A source of real records with a synthetic fallback.
#[async_trait]
pub trait DataSource<T: Send>: Send + Sync {
    /// Entity name used in log lines.
    fn kind(&self) -> &'static str;

    async fn fetch_real(&self) -> Result<Vec<T>, UpstreamError>;

    fn fetch_fallback(&self) -> Vec<T>;
}

/// Which path produced a record list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    Store,
    Fallback,
}

#[derive(Debug, Clone)]
pub struct Fetched<T> {
    pub records: Vec<T>,
    pub origin: Origin,
}

impl<T> Fetched<T> {
    pub fn is_fallback(&self) -> bool {
        self.origin == Origin::Fallback
    }
}

/// Read real records, substituting the fallback on error or when empty.
pub async fn fetch_with_fallback<T, S>(source: &S) -> Fetched<T>
where
    T: Send,
    S: DataSource<T> + ?Sized,
{
    match source.fetch_real().await {
        Ok(records) if !records.is_empty() => {
            debug!("Loaded {} {} from store", records.len(), source.kind());
            Fetched {
                records,
                origin: Origin::Store,
            }
        }
        Ok(_) => {
            info!("No {} in store, using sample data", source.kind());
            Fetched {
                records: source.fetch_fallback(),
                origin: Origin::Fallback,
            }
        }
        Err(e) => {
            warn!("Failed to fetch {}, using sample data: {}", source.kind(), e);
            Fetched {
                records: source.fetch_fallback(),
                origin: Origin::Fallback,
            }
        }
    }
}

// ============================================================================
// Request generations
// ============================================================================

/// Issues increasing tickets so that a response to a superseded request can
/// be recognised and dropped.
#[derive(Debug, Clone, Default)]
pub struct Generations {
    latest: Arc<AtomicU64>,
}

impl Generations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new request; every earlier ticket stops being current.
    pub fn begin(&self) -> Ticket {
        let id = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        Ticket {
            id,
            latest: Arc::clone(&self.latest),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Ticket {
    id: u64,
    latest: Arc<AtomicU64>,
}

impl Ticket {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_current(&self) -> bool {
        self.latest.load(Ordering::SeqCst) == self.id
    }
}
