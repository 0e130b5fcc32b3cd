//! Unit tests for the opcode vocabulary

use bytecode_system::{compute_call_argc, EcmaOpcode, NUM_MANDATORY_JSFUNC_ARGS};

#[cfg(test)]
mod opcode_tests {
    use super::*;

    #[test]
    fn test_canonical_order_is_stable() {
        assert_eq!(EcmaOpcode::ALL[0], EcmaOpcode::LdUndefined);
        assert!(EcmaOpcode::Add2.index() < EcmaOpcode::Sub2.index());
        assert!(EcmaOpcode::CallArg0.index() < EcmaOpcode::CallThis0.index());
        assert_eq!(EcmaOpcode::ALL.last(), Some(&EcmaOpcode::Throw));
    }

    #[test]
    fn test_mnemonics_are_unique() {
        let mut names: Vec<&str> = EcmaOpcode::ALL.iter().map(|op| op.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), EcmaOpcode::ALL.len());
    }

    #[test]
    fn test_display_uses_mnemonic() {
        assert_eq!(EcmaOpcode::LdObjByName.to_string(), "LDOBJBYNAME_IMM8_ID16");
    }

    #[test]
    fn test_binary_ops() {
        assert!(EcmaOpcode::StrictEq.is_binary_op());
        assert!(EcmaOpcode::Shr2.is_binary_op());
        assert!(!EcmaOpcode::Neg.is_binary_op());
    }

    #[test]
    fn test_user_argc_per_call_family() {
        let user = |n, op| compute_call_argc(n, op) - NUM_MANDATORY_JSFUNC_ARGS;
        assert_eq!(user(1, EcmaOpcode::CallArg0), 0);
        assert_eq!(user(3, EcmaOpcode::CallArgs2), 2);
        assert_eq!(user(4, EcmaOpcode::CallThis2), 2);
        assert_eq!(user(2, EcmaOpcode::CallThis0), 0);
        assert_eq!(user(6, EcmaOpcode::CallRange), 5);
    }

    #[test]
    fn test_argc_never_drops_below_mandatory_slots() {
        assert_eq!(compute_call_argc(0, EcmaOpcode::CallThis0), 1);
        assert_eq!(compute_call_argc(0, EcmaOpcode::CallArg0), 2);
        assert_eq!(compute_call_argc(1, EcmaOpcode::CallThis0).checked_sub(NUM_MANDATORY_JSFUNC_ARGS), None);
    }
}
