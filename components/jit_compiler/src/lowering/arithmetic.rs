//! Operators, `TONUMERIC`, `TYPEOF` and truth tests

use bytecode_system::EcmaOpcode;
use core_types::{ParamType, TypedBinOp, TypedUnOp};

use super::TypedBytecodeLowering;
use crate::builder::CircuitBuilder;
use crate::circuit::{BranchWeight, CheckKind, GateOp, GateRef};
use crate::deopt::DeoptType;
use crate::error::LoweringResult;
use crate::type_info_accessors::{
    bytecode_info, BinOpTypeInfoAccessor, TypeInfoAccessor, TypeOfTypeInfoAccessor, UnOpTypeInfoAccessor,
};

/// Type a primitive guard enforces for a speculation. Overflowing int
/// arithmetic produces doubles, so its operands are only known to be numbers.
fn guarded_type(param: ParamType) -> ParamType {
    match param {
        ParamType::IntOverflow => ParamType::Number,
        other => other,
    }
}

fn statically_satisfies(known: ParamType, expected: ParamType) -> bool {
    match expected {
        ParamType::Number => known.is_number_type(),
        ParamType::String => known.is_string_type(),
        _ => known == expected,
    }
}

/// Guards every operand not statically known to satisfy `param` and returns
/// the guarded operands in order.
pub(super) fn speculate_primitives(
    b: &mut CircuitBuilder<'_>,
    values: &[GateRef],
    param: ParamType,
) -> LoweringResult<Vec<GateRef>> {
    let expected = guarded_type(param);
    let mut guarded = Vec::with_capacity(values.len());
    for (i, &value) in values.iter().enumerate() {
        let known = b.circuit().trusted_type(value);
        match DeoptType::for_primitive(expected, i) {
            Some(deopt) if !statically_satisfies(known, expected) => {
                guarded.push(b.check(CheckKind::PrimitiveType(expected), vec![value], deopt)?);
            }
            _ => guarded.push(value),
        }
    }
    Ok(guarded)
}

const NOT_STRING: [DeoptType; 2] = [DeoptType::NotString1, DeoptType::NotString2];

impl TypedBytecodeLowering<'_, '_> {
    pub(super) fn lower_typed_bin_op(&mut self, gate: GateRef, op: TypedBinOp) -> LoweringResult<()> {
        let acc = BinOpTypeInfoAccessor::new(self.env, self.circuit, gate)?;
        if op == TypedBinOp::Shr && acc.param_type().is_int_overflow_type() {
            return Ok(());
        }
        if acc.has_number_type() {
            self.speculate_numbers(&acc, op)
        } else if acc.is_intern_string_type() && matches!(op, TypedBinOp::StrictEq | TypedBinOp::StrictNotEq) {
            self.speculate_intern_strings(&acc, op)
        } else if acc.is_string_type() {
            if matches!(op, TypedBinOp::Eq | TypedBinOp::Add) {
                self.speculate_strings(&acc, op)?;
            }
            Ok(())
        } else if acc.is_number_or_string_type() && op == TypedBinOp::Add {
            self.speculate_number_or_string(&acc, op)
        } else {
            Ok(())
        }
    }

    pub(super) fn lower_typed_eq_or_not_eq(&mut self, gate: GateRef, op: TypedBinOp) -> LoweringResult<()> {
        let acc = BinOpTypeInfoAccessor::new(self.env, self.circuit, gate)?;
        if !acc.left_or_right_is_undefined_or_null() {
            return self.lower_typed_bin_op(gate, op);
        }
        self.add_profiling(gate)?;
        let mut b = CircuitBuilder::at(&mut *self.circuit, gate)?;
        let result = b.effect(GateOp::TypedBinaryOp { op, param: acc.param_type() }, vec![acc.left(), acc.right()]);
        b.replace_hir(Some(result))
    }

    fn speculate_numbers(&mut self, acc: &BinOpTypeInfoAccessor, op: TypedBinOp) -> LoweringResult<()> {
        let param = acc.param_type();
        self.add_profiling(acc.gate())?;
        let mut b = CircuitBuilder::at(&mut *self.circuit, acc.gate())?;
        let operands = speculate_primitives(&mut b, &[acc.left(), acc.right()], param)?;
        let result = b.effect(GateOp::TypedBinaryOp { op, param }, operands);
        b.replace_hir(Some(result))
    }

    fn speculate_intern_strings(&mut self, acc: &BinOpTypeInfoAccessor, op: TypedBinOp) -> LoweringResult<()> {
        self.add_profiling(acc.gate())?;
        let mut b = CircuitBuilder::at(&mut *self.circuit, acc.gate())?;
        let mut operands = Vec::with_capacity(2);
        let reasons = [DeoptType::NotInternString1, DeoptType::NotInternString2];
        for (value, deopt) in [acc.left(), acc.right()].into_iter().zip(reasons) {
            if b.circuit().trusted_type(value).is_intern_string_type() {
                operands.push(value);
            } else {
                operands.push(b.check(CheckKind::InternString, vec![value], deopt)?);
            }
        }
        let result = b.effect(GateOp::TypedBinaryOp { op, param: ParamType::InternString }, operands);
        b.replace_hir(Some(result))
    }

    fn speculate_strings(&mut self, acc: &BinOpTypeInfoAccessor, op: TypedBinOp) -> LoweringResult<()> {
        let no_check = self.no_check();
        self.add_profiling(acc.gate())?;
        let mut b = CircuitBuilder::at(&mut *self.circuit, acc.gate())?;
        let mut operands = Vec::with_capacity(2);
        for (value, deopt) in [acc.left(), acc.right()].into_iter().zip(NOT_STRING) {
            if no_check || b.circuit().is_trusted_string(value) {
                operands.push(value);
            } else {
                operands.push(b.check(CheckKind::EcmaString, vec![value], deopt)?);
            }
        }
        let result = b.effect(GateOp::TypedBinaryOp { op, param: ParamType::String }, operands);
        b.replace_hir(Some(result))
    }

    /// `string + number` or `number + string`: the side that is not a
    /// trusted string is converted when it turns out to be a number.
    fn speculate_number_or_string(&mut self, acc: &BinOpTypeInfoAccessor, op: TypedBinOp) -> LoweringResult<()> {
        let (left, right) = (acc.left(), acc.right());
        let convert_right = self.circuit.is_trusted_string(left);
        if !convert_right && !self.circuit.is_trusted_string(right) {
            return Ok(());
        }
        let no_check = self.no_check();
        self.add_profiling(acc.gate())?;
        let mut b = CircuitBuilder::at(&mut *self.circuit, acc.gate())?;
        let operands = if convert_right {
            vec![left, checked_number_to_string(&mut b, right, NOT_STRING[1], no_check)?]
        } else {
            vec![checked_number_to_string(&mut b, left, NOT_STRING[0], no_check)?, right]
        };
        let result = b.effect(GateOp::TypedBinaryOp { op, param: ParamType::String }, operands);
        b.replace_hir(Some(result))
    }

    pub(super) fn lower_typed_un_op(&mut self, gate: GateRef, op: TypedUnOp) -> LoweringResult<()> {
        let acc = UnOpTypeInfoAccessor::new(self.env, self.circuit, gate)?;
        let param = acc.param_type();
        if op == TypedUnOp::Neg && param.is_int_overflow_type() {
            return Ok(());
        }
        if !acc.has_number_type() {
            return Ok(());
        }
        self.add_profiling(gate)?;
        let mut b = CircuitBuilder::at(&mut *self.circuit, gate)?;
        let operands = speculate_primitives(&mut b, &[acc.value()], param)?;
        let result = b.effect(GateOp::TypedUnaryOp { op, param }, operands);
        b.replace_hir(Some(result))
    }

    pub(super) fn lower_to_numeric(&mut self, gate: GateRef) -> LoweringResult<()> {
        let acc = UnOpTypeInfoAccessor::new(self.env, self.circuit, gate)?;
        if !acc.has_number_type() {
            return Ok(());
        }
        self.add_profiling(gate)?;
        let mut b = CircuitBuilder::at(&mut *self.circuit, gate)?;
        let operands = speculate_primitives(&mut b, &[acc.value()], acc.param_type())?;
        let result = b.effect(GateOp::PrimitiveToNumber, operands);
        b.replace_hir(Some(result))
    }

    /// Truth tests specialize on statically typed operands; the
    /// runtime-call variants also trust the profile.
    pub(super) fn lower_is_true_or_false(&mut self, gate: GateRef, op: TypedUnOp) -> LoweringResult<()> {
        let acc = UnOpTypeInfoAccessor::new(self.env, self.circuit, gate)?;
        let value = acc.value();
        let profiled = matches!(
            bytecode_info(self.circuit, gate)?.opcode,
            EcmaOpcode::CallRuntimeIsTrue | EcmaOpcode::CallRuntimeIsFalse
        );
        let param = if self.circuit.is_trusted_boolean(value) || (profiled && acc.is_boolean_type()) {
            ParamType::Boolean
        } else if self.circuit.is_trusted_number(value) || (profiled && acc.has_number_type()) {
            ParamType::Number
        } else {
            return Ok(());
        };
        self.add_profiling(gate)?;
        let mut b = CircuitBuilder::at(&mut *self.circuit, gate)?;
        let operands = speculate_primitives(&mut b, &[value], param)?;
        let result = b.effect(GateOp::TypedUnaryOp { op, param }, operands);
        b.replace_hir(Some(result))
    }

    pub(super) fn lower_type_of(&mut self, gate: GateRef) -> LoweringResult<()> {
        let acc = TypeOfTypeInfoAccessor::new(self.env, self.circuit, gate)?;
        if acc.is_illegal_type() {
            return Ok(());
        }
        let param = acc.param_type();
        let no_check = self.no_check();
        self.add_profiling(gate)?;
        let mut b = CircuitBuilder::at(&mut *self.circuit, gate)?;
        let mut value = acc.value();
        if !no_check && b.circuit().trusted_type(value) != param {
            value = b.check(CheckKind::TypeOf(param), vec![value], DeoptType::InconsistentType1)?;
        }
        let result = b.pure(GateOp::TypedTypeOf(param), vec![value]);
        b.replace_hir(Some(result))
    }
}

/// String view of `value`: numbers are converted, anything else must
/// already be a string.
fn checked_number_to_string(
    b: &mut CircuitBuilder<'_>,
    value: GateRef,
    deopt: DeoptType,
    no_check: bool,
) -> LoweringResult<GateRef> {
    let result = b.new_variable(value);
    let (number, not_number, exit) = (b.new_label(), b.new_label(), b.new_label());
    let is_number = b.pure(GateOp::TaggedIsNumber, vec![value]);
    b.branch(is_number, number, not_number, BranchWeight::default());

    b.bind(number);
    let converted = b.effect(GateOp::NumberToString, vec![value]);
    b.write(result, converted);
    b.jump(exit);

    b.bind(not_number);
    if !no_check {
        let checked = b.check(CheckKind::EcmaString, vec![value], deopt)?;
        b.write(result, checked);
    }
    b.jump(exit);

    b.bind(exit);
    Ok(b.read(result))
}
