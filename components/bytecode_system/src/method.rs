//! Method metadata: literals with call-field bits, per-file method tables,
//! compiled-method flags and object literal buffers.

use std::collections::{HashMap, HashSet};

use core_types::Value;
use thiserror::Error;

/// Identity of a loaded bytecode file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(pub u32);

/// Offset of a method inside its file. Zero is never a valid method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MethodId(pub u32);

impl MethodId {
    /// Whether the id can name a method.
    pub fn is_valid(self) -> bool {
        self.0 != 0
    }
}

/// Errors raised while registering method metadata
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MethodError {
    /// The method was registered twice for the same file
    #[error("method {method:?} already registered in file {file:?}")]
    DuplicateMethod {
        /// Owning file
        file: FileId,
        /// Offending method
        method: MethodId,
    },
    /// The method id zero cannot be registered
    #[error("invalid method id 0 in file {0:?}")]
    InvalidMethodId(FileId),
}

/// Packed call-convention word of a method.
///
/// Layout, low bit first: `have_this`, `have_new_target`, `have_extra`,
/// `have_func`, 28 bits of vreg count, 28 bits of declared argument count,
/// `is_native`, `is_aot_code`, `is_fast_builtin`, `is_fast_call`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct CallField(u64);

impl CallField {
    const HAVE_THIS: u32 = 0;
    const HAVE_NEW_TARGET: u32 = 1;
    const HAVE_EXTRA: u32 = 2;
    const HAVE_FUNC: u32 = 3;
    const NUM_VREGS_SHIFT: u32 = 4;
    const NUM_ARGS_SHIFT: u32 = 32;
    const FIELD_BITS: u32 = 28;
    const IS_NATIVE: u32 = 60;
    const IS_AOT_CODE: u32 = 61;
    const IS_FAST_BUILTIN: u32 = 62;
    const IS_FAST_CALL: u32 = 63;

    /// Raw packed word.
    pub fn bits(self) -> u64 {
        self.0
    }

    fn flag(self, bit: u32) -> bool {
        self.0 & (1 << bit) != 0
    }

    fn set_flag(&mut self, bit: u32, on: bool) {
        if on {
            self.0 |= 1 << bit;
        } else {
            self.0 &= !(1 << bit);
        }
    }

    fn field(self, shift: u32) -> u32 {
        ((self.0 >> shift) & ((1 << Self::FIELD_BITS) - 1)) as u32
    }

    fn set_field(&mut self, shift: u32, value: u32) {
        let mask = ((1u64 << Self::FIELD_BITS) - 1) << shift;
        self.0 = (self.0 & !mask) | ((u64::from(value) << shift) & mask);
    }

    /// Frame has a `this` slot.
    pub fn have_this(self) -> bool {
        self.flag(Self::HAVE_THIS)
    }

    /// Frame has a `new.target` slot.
    pub fn have_new_target(self) -> bool {
        self.flag(Self::HAVE_NEW_TARGET)
    }

    /// Frame has an extra slot (arguments object).
    pub fn have_extra(self) -> bool {
        self.flag(Self::HAVE_EXTRA)
    }

    /// Frame has a callee slot.
    pub fn have_func(self) -> bool {
        self.flag(Self::HAVE_FUNC)
    }

    /// Number of virtual registers.
    pub fn num_vregs(self) -> u32 {
        self.field(Self::NUM_VREGS_SHIFT)
    }

    /// Declared parameter count, implicit slots excluded.
    pub fn num_args(self) -> u32 {
        self.field(Self::NUM_ARGS_SHIFT)
    }

    /// Native (builtin) method.
    pub fn is_native(self) -> bool {
        self.flag(Self::IS_NATIVE)
    }

    /// Method has ahead-of-time code installed.
    pub fn is_aot_code(self) -> bool {
        self.flag(Self::IS_AOT_CODE)
    }

    /// Builtin with a fast stub.
    pub fn is_fast_builtin(self) -> bool {
        self.flag(Self::IS_FAST_BUILTIN)
    }

    /// Method can be entered through the fast-call convention.
    pub fn is_fast_call(self) -> bool {
        self.flag(Self::IS_FAST_CALL)
    }
}

/// Static description of one method.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodLiteral {
    method_id: MethodId,
    name: String,
    call_field: CallField,
    is_typed_call: bool,
}

impl MethodLiteral {
    /// Creates a method with `num_args` declared parameters.
    ///
    /// The frame gets callee, `new.target` and `this` slots, the ordinary
    /// layout of a compiled JS function.
    ///
    /// # Examples
    ///
    /// ```
    /// use bytecode_system::{MethodId, MethodLiteral};
    ///
    /// let m = MethodLiteral::new(MethodId(16), "add", 2);
    /// assert_eq!(m.num_args(), 2);
    /// assert_eq!(m.num_args_with_call_field(), 5);
    /// ```
    pub fn new(method_id: MethodId, name: impl Into<String>, num_args: u32) -> Self {
        let mut call_field = CallField::default();
        call_field.set_flag(CallField::HAVE_FUNC, true);
        call_field.set_flag(CallField::HAVE_NEW_TARGET, true);
        call_field.set_flag(CallField::HAVE_THIS, true);
        call_field.set_field(CallField::NUM_ARGS_SHIFT, num_args);
        Self {
            method_id,
            name: name.into(),
            call_field,
            is_typed_call: true,
        }
    }

    /// Sets the callee/`new.target`/`this` slot bits.
    pub fn with_frame_slots(mut self, func: bool, new_target: bool, this: bool) -> Self {
        self.call_field.set_flag(CallField::HAVE_FUNC, func);
        self.call_field.set_flag(CallField::HAVE_NEW_TARGET, new_target);
        self.call_field.set_flag(CallField::HAVE_THIS, this);
        self
    }

    /// Marks whether call sites may be lowered to typed calls.
    pub fn with_typed_call(mut self, typed: bool) -> Self {
        self.is_typed_call = typed;
        self
    }

    /// Marks the method as enterable through the fast-call convention.
    pub fn with_fast_call(mut self, fast: bool) -> Self {
        self.call_field.set_flag(CallField::IS_FAST_CALL, fast);
        self
    }

    /// Marks the method as native.
    pub fn with_native(mut self, native: bool) -> Self {
        self.call_field.set_flag(CallField::IS_NATIVE, native);
        self
    }

    /// Sets the virtual register count.
    pub fn with_num_vregs(mut self, num_vregs: u32) -> Self {
        self.call_field.set_field(CallField::NUM_VREGS_SHIFT, num_vregs);
        self
    }

    /// Offset of the method in its file.
    pub fn method_id(&self) -> MethodId {
        self.method_id
    }

    /// Method name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Packed call-convention word.
    pub fn call_field(&self) -> CallField {
        self.call_field
    }

    /// Declared parameter count.
    pub fn num_args(&self) -> u32 {
        self.call_field.num_args()
    }

    /// Declared parameters plus one per implicit callee/`new.target`/`this`
    /// slot present in the frame.
    pub fn num_args_with_call_field(&self) -> u32 {
        let cf = self.call_field;
        self.num_args() + u32::from(cf.have_func()) + u32::from(cf.have_new_target()) + u32::from(cf.have_this())
    }

    /// Call sites may be lowered to typed calls.
    pub fn is_typed_call(&self) -> bool {
        self.is_typed_call
    }

    /// Method can be entered through the fast-call convention.
    pub fn is_fast_call(&self) -> bool {
        self.call_field.is_fast_call()
    }
}

#[derive(Debug, Default)]
struct FileMethods {
    name: String,
    methods: Vec<MethodLiteral>,
    by_id: HashMap<MethodId, u32>,
    const_pool: HashMap<MethodId, u32>,
}

/// Methods of every loaded file.
///
/// A method's index is its registration order within its file.
#[derive(Debug, Default)]
pub struct MethodTable {
    files: HashMap<FileId, FileMethods>,
}

impl MethodTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Names a file.
    pub fn set_file_name(&mut self, file: FileId, name: impl Into<String>) {
        self.files.entry(file).or_default().name = name.into();
    }

    /// File name, if the file was named.
    pub fn file_name(&self, file: FileId) -> Option<&str> {
        self.files.get(&file).map(|f| f.name.as_str())
    }

    /// Registers a method belonging to constant pool `const_pool_id` and
    /// returns its method index.
    pub fn add_method(
        &mut self,
        file: FileId,
        literal: MethodLiteral,
        const_pool_id: u32,
    ) -> Result<u32, MethodError> {
        let id = literal.method_id();
        if !id.is_valid() {
            return Err(MethodError::InvalidMethodId(file));
        }
        let entry = self.files.entry(file).or_default();
        if entry.by_id.contains_key(&id) {
            return Err(MethodError::DuplicateMethod { file, method: id });
        }
        let index = entry.methods.len() as u32;
        entry.methods.push(literal);
        entry.by_id.insert(id, index);
        entry.const_pool.insert(id, const_pool_id);
        Ok(index)
    }

    /// Literal of a method.
    pub fn method_literal(&self, file: FileId, method: MethodId) -> Option<&MethodLiteral> {
        let f = self.files.get(&file)?;
        let index = *f.by_id.get(&method)?;
        f.methods.get(index as usize)
    }

    /// Index of a method within its file.
    pub fn method_index(&self, file: FileId, method: MethodId) -> Option<u32> {
        self.files.get(&file)?.by_id.get(&method).copied()
    }

    /// Constant pool a method belongs to.
    pub fn const_pool_id(&self, file: FileId, method: MethodId) -> Option<u32> {
        self.files.get(&file)?.const_pool.get(&method).copied()
    }
}

/// Flags of methods that have compiled code, keyed by `(file, method)`.
#[derive(Debug, Default, Clone)]
pub struct CallMethodFlagMap {
    compiled: HashSet<(FileId, MethodId)>,
    fast_call: HashSet<(FileId, MethodId)>,
    no_gc: HashSet<(FileId, MethodId)>,
}

impl CallMethodFlagMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that the method is compiled in this unit, and how.
    pub fn set_compiled(&mut self, file: FileId, method: MethodId, fast_call: bool, no_gc: bool) {
        let key = (file, method);
        self.compiled.insert(key);
        if fast_call {
            self.fast_call.insert(key);
        }
        if no_gc {
            self.no_gc.insert(key);
        }
    }

    /// The method has compiled code.
    pub fn is_compiled(&self, file: FileId, method: MethodId) -> bool {
        self.compiled.contains(&(file, method))
    }

    /// The compiled code uses the fast-call convention.
    pub fn is_fast_call(&self, file: FileId, method: MethodId) -> bool {
        self.fast_call.contains(&(file, method))
    }

    /// The compiled code never triggers a collection.
    pub fn is_no_gc(&self, file: FileId, method: MethodId) -> bool {
        self.no_gc.contains(&(file, method))
    }
}

/// Literal buffer of an object literal: ordered `(key, value)` pairs.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectLiteral {
    /// Properties in definition order
    pub properties: Vec<(String, Value)>,
}

impl ObjectLiteral {
    /// Creates a literal from its properties.
    pub fn new(properties: Vec<(String, Value)>) -> Self {
        Self { properties }
    }
}

/// Object literal buffers by `(file, literal id)`.
#[derive(Debug, Default)]
pub struct LiteralTable {
    literals: HashMap<(FileId, u32), ObjectLiteral>,
}

impl LiteralTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a literal buffer.
    pub fn insert(&mut self, file: FileId, id: u32, literal: ObjectLiteral) {
        self.literals.insert((file, id), literal);
    }

    /// Looks up a literal buffer.
    pub fn get(&self, file: FileId, id: u32) -> Option<&ObjectLiteral> {
        self.literals.get(&(file, id))
    }
}
