//! Helpers shared by the unit tests.

use crate::system::DiffPoly;
use anyhow::Result;

/// One operator per slice, in row-major order.
pub(crate) fn polys(rows: &[&[f64]]) -> Vec<DiffPoly> {
    rows.iter().map(|&c| DiffPoly::from(c)).collect()
}

pub(crate) fn assert_err_contains<T: std::fmt::Debug>(result: Result<T>, needle: &str) {
    let err = result.expect_err("expected error");
    let message = format!("{err}");
    assert!(
        message.contains(needle),
        "expected error to contain \"{needle}\", got \"{message}\""
    );
}
