#[cfg(test)]
mod tests;

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use solution::column::ColumnSignature;
use solution::Column;

/// Store of the columns generated in one planning horizon. Shared by all branching nodes; which
/// columns a node may use is decided by its fixes.
///
/// Pricing workers insert concurrently. The signature set rejects a column that is already
/// present, so each (vehicle, node sequence) is stored once. Between pricing rounds the pool
/// can be cut down with [`ColumnPool::retain_best`], removed columns may be generated again.
#[derive(Default)]
pub struct ColumnPool {
    columns: RwLock<Vec<Arc<Column>>>,
    signatures: Mutex<HashSet<ColumnSignature>>,
}

impl ColumnPool {
    pub fn new() -> ColumnPool {
        ColumnPool::default()
    }

    /// Returns false if the column was already in the pool.
    pub fn insert(&self, column: Column) -> bool {
        if !self.signatures.lock().insert(column.signature()) {
            return false;
        }
        self.columns.write().push(Arc::new(column));
        true
    }

    /// Snapshot of all columns in insertion order.
    pub fn columns(&self) -> Vec<Arc<Column>> {
        self.columns.read().clone()
    }

    pub fn len(&self) -> usize {
        self.columns.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keeps the protected columns and fills up to `limit` columns with the lowest `score`.
    /// Ties keep the older column. Returns the number of removed columns.
    pub fn retain_best(
        &self,
        limit: usize,
        score: impl Fn(&Column) -> f64,
        protected: impl Fn(&Column) -> bool,
    ) -> usize {
        let mut columns = self.columns.write();
        if columns.len() <= limit {
            return 0;
        }
        let mut ranked: Vec<(bool, f64, usize)> = columns
            .iter()
            .enumerate()
            .map(|(idx, column)| (!protected(column), score(column), idx))
            .collect();
        ranked.sort_by(|a, b| {
            a.0.cmp(&b.0)
                .then(a.1.total_cmp(&b.1))
                .then(a.2.cmp(&b.2))
        });
        let protected_count = ranked.iter().filter(|r| !r.0).count();
        let keep: HashSet<usize> = ranked
            .iter()
            .take(limit.max(protected_count))
            .map(|r| r.2)
            .collect();

        let mut signatures = self.signatures.lock();
        let before = columns.len();
        let mut idx = 0;
        columns.retain(|column| {
            let kept = keep.contains(&idx);
            idx += 1;
            if !kept {
                signatures.remove(&column.signature());
            }
            kept
        });
        before - columns.len()
    }
}
