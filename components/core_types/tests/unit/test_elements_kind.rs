//! Unit tests for the elements kind lattice

use core_types::ElementsKind;

#[cfg(test)]
mod elements_kind_tests {
    use super::*;

    #[test]
    fn test_predicates_ignore_hole_bit() {
        assert!(ElementsKind::HOLE_INT.is_int());
        assert!(ElementsKind::HOLE_NUMBER.is_number());
        assert!(ElementsKind::HOLE_OBJECT.is_object());
        assert!(!ElementsKind::NUMBER.is_int());
    }

    #[test]
    fn test_from_bits_masks_unknown_bits() {
        assert_eq!(ElementsKind::from_bits(0xFF), ElementsKind::GENERIC);
        assert_eq!(ElementsKind::from_bits(0x02), ElementsKind::INT);
    }

    #[test]
    fn test_display_names() {
        assert_eq!(ElementsKind::NONE.to_string(), "NONE");
        assert_eq!(ElementsKind::HOLE_TAGGED.to_string(), "GENERIC");
        assert_eq!(format!("{:?}", ElementsKind::INT), "ElementsKind(INT)");
    }
}
