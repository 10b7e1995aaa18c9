//! Prometheus metrics for the bridge relayer
//!
//! Registered in the default registry and exposed on `/metrics`.

use lazy_static::lazy_static;
use prometheus::{
    register_int_counter, register_int_counter_vec, register_int_gauge, IntCounter,
    IntCounterVec, IntGauge,
};

lazy_static! {
    pub static ref MINTS_SUBMITTED: IntCounter = register_int_counter!(
        "bridge_mints_submitted_total",
        "Total number of Ellipticoin mint transactions submitted"
    ).unwrap();

    pub static ref RELEASES_SIGNED: IntCounterVec = register_int_counter_vec!(
        "bridge_releases_signed_total",
        "Release attestation requests by outcome",
        &["result"]
    ).unwrap();

    pub static ref BLOCKS_PROCESSED: IntCounter = register_int_counter!(
        "bridge_blocks_processed_total",
        "Total number of confirmed Ethereum blocks scanned for deposits"
    ).unwrap();

    pub static ref WATERMARK: IntGauge = register_int_gauge!(
        "bridge_watermark_block",
        "Next Ethereum block the mint pipeline will scan"
    ).unwrap();
}

/// Outcome label for a release request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseResult {
    Signed,
    Rejected,
    Failed,
}

impl ReleaseResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReleaseResult::Signed => "signed",
            ReleaseResult::Rejected => "rejected",
            ReleaseResult::Failed => "failed",
        }
    }
}

/// Record a mint submitted
pub fn record_mint_submitted() {
    MINTS_SUBMITTED.inc();
}

/// Record a release request outcome
pub fn record_release(result: ReleaseResult) {
    RELEASES_SIGNED.with_label_values(&[result.as_str()]).inc();
}

/// Record a scanned range and the new watermark
pub fn record_blocks_processed(count: u64, watermark: u64) {
    BLOCKS_PROCESSED.inc_by(count);
    set_watermark(watermark);
}

pub fn set_watermark(watermark: u64) {
    WATERMARK.set(i64::try_from(watermark).unwrap_or(i64::MAX));
}

/// Counter value for a release outcome
pub fn releases(result: ReleaseResult) -> u64 {
    RELEASES_SIGNED.with_label_values(&[result.as_str()]).get()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_counter_increments() {
        let before = releases(ReleaseResult::Rejected);
        record_release(ReleaseResult::Rejected);
        assert!(releases(ReleaseResult::Rejected) > before);
    }

    #[test]
    fn test_metrics_are_gathered() {
        record_mint_submitted();
        let names: Vec<_> = prometheus::gather()
            .iter()
            .map(|family| family.get_name().to_string())
            .collect();
        assert!(names.contains(&"bridge_mints_submitted_total".to_string()));
    }
}
