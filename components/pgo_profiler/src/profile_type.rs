//! Profile observations recorded during interpretation.
//!
//! Each bytecode offset of a method carries at most one record: a scalar
//! sample, a read/write shape record or an object definition record.

use bytecode_system::MethodId;
use core_types::{BuiltinTypeId, BuiltinsStubId, ElementsKind, ParamType};
use object_model::HClassId;

/// Which global table a `Globals` profile type indexes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlobalsKind {
    /// Global constant hidden classes
    Constant,
    /// Global environment objects
    Env,
}

/// What a profile type identifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ProfileKind {
    /// Nothing was observed
    #[default]
    None,
    /// A user method (call targets)
    Method(MethodId),
    /// A builtin function (call targets)
    BuiltinFunctionId(BuiltinsStubId),
    /// A builtin receiver; arrays carry their elements kind before and
    /// after the observed transition
    Builtins {
        /// Builtin family
        id: BuiltinTypeId,
        /// Elements kind before the access
        before: ElementsKind,
        /// Elements kind after the access
        after: ElementsKind,
    },
    /// An object of the global environment or constant tables
    Globals {
        /// Table
        kind: GlobalsKind,
        /// Index in the table
        index: u32,
    },
    /// A user hidden class
    Class(HClassId),
}

/// Profile-recorded identity of a shape or callee, tagged with the file it
/// was recorded against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ProfileType {
    /// Id of the file in the profile's file table
    pub abc_id: u32,
    /// Identity
    pub kind: ProfileKind,
}

impl ProfileType {
    /// Profile type of a user hidden class.
    pub fn class(abc_id: u32, hclass: HClassId) -> Self {
        Self { abc_id, kind: ProfileKind::Class(hclass) }
    }

    /// Profile type of a user method.
    pub fn method(abc_id: u32, method: MethodId) -> Self {
        Self { abc_id, kind: ProfileKind::Method(method) }
    }

    /// Profile type of a builtin receiver.
    pub fn builtins(id: BuiltinTypeId) -> Self {
        Self {
            abc_id: 0,
            kind: ProfileKind::Builtins {
                id,
                before: ElementsKind::NONE,
                after: ElementsKind::NONE,
            },
        }
    }

    /// Profile type of a builtin array with its elements kinds.
    pub fn builtins_array(before: ElementsKind, after: ElementsKind) -> Self {
        Self {
            abc_id: 0,
            kind: ProfileKind::Builtins { id: BuiltinTypeId::Array, before, after },
        }
    }

    /// Profile type of a builtin function.
    pub fn builtin_function(id: BuiltinsStubId) -> Self {
        Self { abc_id: 0, kind: ProfileKind::BuiltinFunctionId(id) }
    }

    /// Profile type of a global table entry.
    pub fn globals(kind: GlobalsKind, index: u32) -> Self {
        Self { abc_id: 0, kind: ProfileKind::Globals { kind, index } }
    }

    /// Nothing observed.
    pub fn is_none(&self) -> bool {
        self.kind == ProfileKind::None
    }

    /// Identity depends on a loaded file (user classes and methods).
    pub fn is_file_bound(&self) -> bool {
        matches!(self.kind, ProfileKind::Class(_) | ProfileKind::Method(_))
    }

    /// Hidden class of a user class profile.
    pub fn hclass(&self) -> Option<HClassId> {
        match self.kind {
            ProfileKind::Class(h) => Some(h),
            _ => None,
        }
    }

    /// Method of a call target profile.
    pub fn method_id(&self) -> Option<MethodId> {
        match self.kind {
            ProfileKind::Method(m) => Some(m),
            _ => None,
        }
    }

    /// Builtin function of a call target profile.
    pub fn builtin_function_id(&self) -> Option<BuiltinsStubId> {
        match self.kind {
            ProfileKind::BuiltinFunctionId(id) => Some(id),
            _ => None,
        }
    }

    /// Builtin receiver family.
    pub fn builtin_type(&self) -> Option<BuiltinTypeId> {
        match self.kind {
            ProfileKind::Builtins { id, .. } => Some(id),
            _ => None,
        }
    }

    /// Builtin array receiver.
    pub fn is_builtins_array(&self) -> bool {
        self.builtin_type() == Some(BuiltinTypeId::Array)
    }

    /// Elements kind before the observed transition.
    pub fn elements_kind_before_transition(&self) -> ElementsKind {
        match self.kind {
            ProfileKind::Builtins { before, .. } => before,
            _ => ElementsKind::NONE,
        }
    }

    /// Elements kind after the observed transition.
    pub fn elements_kind_after_transition(&self) -> ElementsKind {
        match self.kind {
            ProfileKind::Builtins { after, .. } => after,
            _ => ElementsKind::NONE,
        }
    }
}

/// Scalar type observations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleKind {
    /// No observation
    None,
    /// int32 only
    Int,
    /// int32 operands with overflowing results
    IntOverflow,
    /// doubles only
    Double,
    /// int32 and doubles
    Number,
    /// booleans
    Boolean,
    /// undefined or null
    UndefinedOrNull,
    /// interned strings
    InternString,
    /// strings
    String,
    /// numbers on one side and strings on the other
    NumberOrString,
    /// heap objects
    HeapObject,
    /// anything
    Any,
}

/// Scalar record: a sample of operand types, or the identity of a callee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PGOSampleType {
    /// Primitive operand types
    Primitive(SampleKind),
    /// Callee or receiver identity
    Profile(ProfileType),
}

impl PGOSampleType {
    /// Primitive sample of `kind`.
    pub fn sample(kind: SampleKind) -> Self {
        PGOSampleType::Primitive(kind)
    }

    fn kind(&self) -> SampleKind {
        match self {
            PGOSampleType::Primitive(k) => *k,
            PGOSampleType::Profile(_) => SampleKind::None,
        }
    }

    /// Nothing observed.
    pub fn is_none(&self) -> bool {
        match self {
            PGOSampleType::Primitive(k) => *k == SampleKind::None,
            PGOSampleType::Profile(pt) => pt.is_none(),
        }
    }

    /// All samples were numbers.
    pub fn is_number(&self) -> bool {
        matches!(
            self.kind(),
            SampleKind::Int | SampleKind::IntOverflow | SampleKind::Double | SampleKind::Number
        )
    }

    /// All samples were int32 and results overflowed.
    pub fn is_int_overflow(&self) -> bool {
        self.kind() == SampleKind::IntOverflow
    }

    /// All samples were strings.
    pub fn is_string(&self) -> bool {
        matches!(self.kind(), SampleKind::String | SampleKind::InternString)
    }

    /// All samples were interned strings.
    pub fn is_intern_string(&self) -> bool {
        self.kind() == SampleKind::InternString
    }

    /// Samples mixed numbers and strings.
    pub fn is_number_or_string(&self) -> bool {
        self.kind() == SampleKind::NumberOrString
    }

    /// All samples were booleans.
    pub fn is_boolean(&self) -> bool {
        self.kind() == SampleKind::Boolean
    }

    /// Identity record, if this is one.
    pub fn profile_type(&self) -> Option<&ProfileType> {
        match self {
            PGOSampleType::Profile(pt) => Some(pt),
            PGOSampleType::Primitive(_) => None,
        }
    }

    /// Speculated type implied by the sample.
    ///
    /// # Examples
    ///
    /// ```
    /// use core_types::ParamType;
    /// use pgo_profiler::{PGOSampleType, SampleKind};
    ///
    /// assert_eq!(PGOSampleType::sample(SampleKind::Double).param_type(), ParamType::Double);
    /// assert_eq!(PGOSampleType::sample(SampleKind::Any).param_type(), ParamType::Any);
    /// ```
    pub fn param_type(&self) -> ParamType {
        match self.kind() {
            SampleKind::Int => ParamType::Int,
            SampleKind::IntOverflow => ParamType::IntOverflow,
            SampleKind::Double => ParamType::Double,
            SampleKind::Number => ParamType::Number,
            SampleKind::Boolean => ParamType::Boolean,
            SampleKind::InternString => ParamType::InternString,
            SampleKind::String => ParamType::String,
            _ => ParamType::Any,
        }
    }
}

/// One observed shape at a property access site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PGOObjectInfo {
    /// Receiver shape
    pub receiver: ProfileType,
    /// Shape of the object holding the property
    pub holder: ProfileType,
    /// Holder shape after the store's transition; equals `holder` when the
    /// store did not transition
    pub holder_transition: ProfileType,
}

impl PGOObjectInfo {
    /// Access whose receiver holds the property.
    pub fn own(receiver: ProfileType) -> Self {
        Self { receiver, holder: receiver, holder_transition: receiver }
    }

    /// Access served by a prototype holder.
    pub fn on_proto(receiver: ProfileType, holder: ProfileType) -> Self {
        Self { receiver, holder, holder_transition: holder }
    }

    /// Store that added the property, moving the receiver to `new_holder`.
    pub fn transition(receiver: ProfileType, new_holder: ProfileType) -> Self {
        Self { receiver, holder: receiver, holder_transition: new_holder }
    }

    /// Profile type that drives element kind queries.
    pub fn profile_type(&self) -> &ProfileType {
        &self.receiver
    }
}

/// Read/write record: every shape observed at the site.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PGORWOpType {
    infos: Vec<PGOObjectInfo>,
}

impl PGORWOpType {
    /// Record with the given observations.
    pub fn new(infos: Vec<PGOObjectInfo>) -> Self {
        Self { infos }
    }

    /// Number of observed shapes.
    pub fn count(&self) -> usize {
        self.infos.len()
    }

    /// Observation `i`.
    pub fn object_info(&self, i: usize) -> Option<&PGOObjectInfo> {
        self.infos.get(i)
    }

    /// All observations.
    pub fn infos(&self) -> &[PGOObjectInfo] {
        &self.infos
    }
}

/// Definition record of an object, array or instance creation site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PGODefineOpType {
    /// Shape created at the site
    pub profile_type: ProfileType,
    /// Elements kind of created arrays
    pub elements_kind: ElementsKind,
    /// Element count of created arrays
    pub elements_length: u32,
    /// Constructor method of `new` sites
    pub ctor: ProfileType,
}

impl PGODefineOpType {
    /// Record of a `new` site creating instances of `hclass` through the
    /// constructor `method`.
    pub fn instance(abc_id: u32, hclass: HClassId, method: MethodId) -> Self {
        Self {
            profile_type: ProfileType::class(abc_id, hclass),
            ctor: ProfileType::method(abc_id, method),
            ..Default::default()
        }
    }
}

/// Prototype transition record; never classified by the recorder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PGOProtoTransitionType {
    /// Hidden class before the transition
    pub base: ProfileType,
    /// Hidden class after the transition
    pub transition: ProfileType,
}

/// Borrowed profile record as delivered by a decoder callback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PgoTypeRef<'a> {
    /// Scalar record
    Sample(&'a PGOSampleType),
    /// Read/write record
    RwOp(&'a PGORWOpType),
    /// Definition record
    DefineOp(&'a PGODefineOpType),
    /// Prototype transition record
    ProtoTransition(&'a PGOProtoTransitionType),
}

impl PgoTypeRef<'_> {
    /// Name of the record kind.
    pub fn kind_name(&self) -> &'static str {
        match self {
            PgoTypeRef::Sample(_) => "sample",
            PgoTypeRef::RwOp(_) => "rw-op",
            PgoTypeRef::DefineOp(_) => "define-op",
            PgoTypeRef::ProtoTransition(_) => "proto-transition",
        }
    }
}

/// Owned profile record held by a profile store.
#[derive(Debug, Clone, PartialEq)]
pub enum PgoTypeRecord {
    /// Scalar record
    Sample(PGOSampleType),
    /// Read/write record
    RwOp(PGORWOpType),
    /// Definition record
    DefineOp(PGODefineOpType),
    /// Prototype transition record
    ProtoTransition(PGOProtoTransitionType),
}

impl PgoTypeRecord {
    /// Borrowed view.
    pub fn as_type_ref(&self) -> PgoTypeRef<'_> {
        match self {
            PgoTypeRecord::Sample(t) => PgoTypeRef::Sample(t),
            PgoTypeRecord::RwOp(t) => PgoTypeRef::RwOp(t),
            PgoTypeRecord::DefineOp(t) => PgoTypeRef::DefineOp(t),
            PgoTypeRecord::ProtoTransition(t) => PgoTypeRef::ProtoTransition(t),
        }
    }

    /// Every profile type the record mentions.
    pub fn profile_types(&self) -> Vec<ProfileType> {
        match self {
            PgoTypeRecord::Sample(s) => s.profile_type().copied().into_iter().collect(),
            PgoTypeRecord::RwOp(rw) => rw
                .infos()
                .iter()
                .flat_map(|i| [i.receiver, i.holder, i.holder_transition])
                .collect(),
            PgoTypeRecord::DefineOp(d) => vec![d.profile_type],
            PgoTypeRecord::ProtoTransition(p) => vec![p.base, p.transition],
        }
    }
}
