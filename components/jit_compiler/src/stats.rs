//! Pass-wide counters of the typed lowering pass

use std::collections::BTreeMap;

use bytecode_system::EcmaOpcode;
use tracing::info;

/// Statistics about lowering decisions of one method
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoweringStats {
    /// Bytecode gates a strategy exists for
    pub all_typed_op_count: u64,
    /// Bytecode gates without a strategy, or excluded by range
    pub all_non_typed_op_count: u64,
    /// Gates actually specialized
    pub hit_typed_op_count: u64,
    /// Visits per opcode
    pub bytecode_map: BTreeMap<EcmaOpcode, u64>,
    /// Specializations per opcode
    pub bytecode_hit_time_map: BTreeMap<EcmaOpcode, u64>,
}

impl LoweringStats {
    /// Counts a visit of a bytecode gate.
    pub fn add_bytecode_count(&mut self, op: EcmaOpcode) {
        *self.bytecode_map.entry(op).or_insert(0) += 1;
    }

    /// Forgets the visits of an opcode that no strategy handles.
    pub fn delete_bytecode_count(&mut self, op: EcmaOpcode) {
        self.bytecode_map.remove(&op);
    }

    /// Counts a specialization of `op`.
    pub fn add_hit_bytecode_count(&mut self, op: EcmaOpcode) {
        *self.bytecode_hit_time_map.entry(op).or_insert(0) += 1;
        self.hit_typed_op_count += 1;
    }

    /// Visits of `op`.
    pub fn visits(&self, op: EcmaOpcode) -> u64 {
        self.bytecode_map.get(&op).copied().unwrap_or(0)
    }

    /// Specializations of `op`.
    pub fn hits(&self, op: EcmaOpcode) -> u64 {
        self.bytecode_hit_time_map.get(&op).copied().unwrap_or(0)
    }

    /// Share of bytecode gates a strategy exists for.
    ///
    /// # Examples
    ///
    /// ```
    /// use jit_compiler::LoweringStats;
    ///
    /// let stats = LoweringStats { all_typed_op_count: 3, all_non_typed_op_count: 1, ..Default::default() };
    /// assert_eq!(stats.typed_op_rate(), 0.75);
    /// assert_eq!(LoweringStats::default().typed_op_rate(), 0.0);
    /// ```
    pub fn typed_op_rate(&self) -> f64 {
        let total = self.all_typed_op_count + self.all_non_typed_op_count;
        if total == 0 {
            0.0
        } else {
            self.all_typed_op_count as f64 / total as f64
        }
    }

    /// Rows of the hit-rate table: `(opcode, visits, hits, rate)`.
    pub fn hit_rate_rows(&self) -> Vec<(EcmaOpcode, u64, u64, f64)> {
        self.bytecode_map
            .iter()
            .map(|(op, visits)| {
                let hits = self.hits(*op);
                let rate = if *visits == 0 { 0.0 } else { hits as f64 / *visits as f64 };
                (*op, *visits, hits, rate)
            })
            .collect()
    }

    /// Logs the hit-rate table, one line per opcode.
    pub fn print_hit_rates(&self, method_name: &str) {
        info!(method = method_name, "typed lowering hit rates");
        for (op, visits, hits, rate) in self.hit_rate_rows() {
            info!("{:<40} {:>8} {:>8} {:>8.2}%", op.name(), visits, hits, rate * 100.0);
        }
    }
}
