//! Configuration of the typed lowering pass

use serde::{Deserialize, Serialize};

/// Inclusive range of opcode indices excluded from speculation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptBcRange {
    /// First excluded index
    pub start: usize,
    /// Last excluded index
    pub end: usize,
}

impl OptBcRange {
    /// Whether `index` lies in the range.
    pub fn contains(&self, index: usize) -> bool {
        self.start <= index && index <= self.end
    }
}

/// Parses `"a:b,c:d"` into opcode ranges.
///
/// Pieces that are not exactly two base-10 integers separated by `:` are
/// ignored.
///
/// # Examples
///
/// ```
/// use jit_compiler::{parse_opt_bc_range, OptBcRange};
///
/// let ranges = parse_opt_bc_range("3:5,bad,7:7,1:2:3");
/// assert_eq!(ranges, vec![OptBcRange { start: 3, end: 5 }, OptBcRange { start: 7, end: 7 }]);
/// ```
pub fn parse_opt_bc_range(ranges: &str) -> Vec<OptBcRange> {
    ranges.split(',')
        .filter_map(|piece| {
            let mut parts = piece.split(':');
            let start = parts.next()?.trim().parse().ok()?;
            let end = parts.next()?.trim().parse().ok()?;
            if parts.next().is_some() {
                return None;
            }
            Some(OptBcRange { start, end })
        })
        .collect()
}

/// Options of [`TypedBytecodeLowering`](crate::TypedBytecodeLowering)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoweringOptions {
    /// Per-method typed-rate summary
    pub enable_log: bool,
    /// Per-gate debug events
    pub enable_type_log: bool,
    /// Insert a profiling runtime call before each lowered gate and print
    /// the hit-rate table
    pub profiling: bool,
    /// Insert a trace runtime call carrying the opcode index before each
    /// lowered gate
    pub trace_bc: bool,
    /// Omit the guards an unchecked compilation may skip
    pub no_check: bool,
    /// Lower global loads of builtin names to builtin object loads
    pub enable_lowering_builtin: bool,
    /// Merge polymorphic candidates sharing holder and layout
    pub merge_poly: bool,
    /// JIT mode: heap constants for callees and global cells are known
    pub jit_compile: bool,
    /// Opcode ignore ranges, `"a:b,c:d"`
    pub opt_bc_range: String,
    /// Method name for logs
    pub method_name: String,
}

impl LoweringOptions {
    /// Default options
    pub fn new() -> Self {
        Self {
            enable_log: false,
            enable_type_log: false,
            profiling: false,
            trace_bc: false,
            no_check: false,
            enable_lowering_builtin: false,
            merge_poly: true,
            jit_compile: false,
            opt_bc_range: String::new(),
            method_name: String::new(),
        }
    }

    /// Options of a JIT compilation of `method_name`
    pub fn jit(method_name: impl Into<String>) -> Self {
        Self {
            jit_compile: true,
            enable_lowering_builtin: true,
            method_name: method_name.into(),
            ..Self::new()
        }
    }

    /// Options for diagnosing a method: every log and trace channel on
    pub fn diagnostic(method_name: impl Into<String>) -> Self {
        Self {
            enable_log: true,
            enable_type_log: true,
            profiling: true,
            trace_bc: true,
            method_name: method_name.into(),
            ..Self::new()
        }
    }

    /// Loads options from JSON; absent fields keep their defaults.
    ///
    /// # Examples
    ///
    /// ```
    /// use jit_compiler::LoweringOptions;
    ///
    /// let opts = LoweringOptions::from_json(r#"{"no_check": true, "opt_bc_range": "0:4"}"#).unwrap();
    /// assert!(opts.no_check);
    /// assert!(opts.merge_poly);
    /// assert_eq!(opts.bc_ranges().len(), 1);
    /// ```
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Parsed opcode ignore ranges.
    pub fn bc_ranges(&self) -> Vec<OptBcRange> {
        parse_opt_bc_range(&self.opt_bc_range)
    }
}

impl Default for LoweringOptions {
    fn default() -> Self {
        Self::new()
    }
}
