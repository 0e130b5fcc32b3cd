//! Unit tests for lowering options and statistics

use bytecode_system::EcmaOpcode;
use jit_compiler::{parse_opt_bc_range, DeoptType, LoweringOptions, LoweringStats, OptBcRange};

#[cfg(test)]
mod options_tests {
    use super::*;

    #[test]
    fn test_jit_options_enable_builtin_lowering() {
        let opts = LoweringOptions::jit("Foo.bar");
        assert!(opts.jit_compile);
        assert!(opts.enable_lowering_builtin);
        assert!(!opts.no_check);
        assert_eq!(opts.method_name, "Foo.bar");
    }

    #[test]
    fn test_diagnostic_options_turn_on_every_channel() {
        let opts = LoweringOptions::diagnostic("main");
        assert!(opts.enable_log && opts.enable_type_log && opts.profiling && opts.trace_bc);
        assert!(!opts.jit_compile);
    }

    #[test]
    fn test_json_keeps_defaults_for_absent_fields() {
        let opts = LoweringOptions::from_json(r#"{"merge_poly": false}"#).unwrap();
        assert!(!opts.merge_poly);
        assert_eq!(opts, LoweringOptions { merge_poly: false, ..LoweringOptions::new() });
        assert!(LoweringOptions::from_json("{not json").is_err());
    }

    #[test]
    fn test_ranges_ignore_malformed_pieces() {
        assert!(parse_opt_bc_range("").is_empty());
        assert_eq!(parse_opt_bc_range(" 2 : 4 ,x:1"), vec![OptBcRange { start: 2, end: 4 }]);
        assert!(OptBcRange { start: 2, end: 4 }.contains(4));
        assert!(!OptBcRange { start: 2, end: 4 }.contains(5));
    }
}

#[cfg(test)]
mod stats_tests {
    use super::*;

    #[test]
    fn test_hit_rate_rows_only_list_visited_opcodes() {
        let mut stats = LoweringStats::default();
        stats.add_bytecode_count(EcmaOpcode::Add2);
        stats.add_bytecode_count(EcmaOpcode::Add2);
        stats.add_hit_bytecode_count(EcmaOpcode::Add2);
        stats.add_bytecode_count(EcmaOpcode::Jmp);
        stats.delete_bytecode_count(EcmaOpcode::Jmp);

        let rows = stats.hit_rate_rows();
        assert_eq!(rows.len(), 1);
        let (op, visits, hits, rate) = rows[0];
        assert_eq!((op, visits, hits), (EcmaOpcode::Add2, 2, 1));
        assert!((rate - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_deopt_names_are_unique() {
        let mut names: Vec<&str> = DeoptType::ALL.iter().map(|d| d.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), DeoptType::ALL.len());
        assert_eq!(DeoptType::NotNewObj2.to_string(), "NOTNEWOBJ2");
    }
}
