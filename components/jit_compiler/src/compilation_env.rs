//! Collaborators of one method compilation
//!
//! A [`CompilationEnv`] bundles everything the lowering pass reads besides
//! the circuit: the locked heap, the profile snapshot of the method and the
//! method tables. It can only be built from a [`HeapReadGuard`], so every
//! read of live object metadata happens while the compilation lock is held.

use std::sync::Arc;

use bytecode_system::{CallMethodFlagMap, FileId, LiteralTable, MethodId, MethodLiteral, MethodTable};
use object_model::{HeapReadGuard, ObjectModel};
use pgo_profiler::{normalize_file_desc, LoadedFiles, PGOTypeRecorder, ProfileDecoder, ProfileType};

/// Read-only inputs of one method compilation
pub struct CompilationEnv<'a> {
    heap: &'a ObjectModel,
    recorder: Arc<PGOTypeRecorder>,
    methods: &'a MethodTable,
    call_flags: &'a CallMethodFlagMap,
    literals: Option<&'a LiteralTable>,
    profile_source: Option<(&'a dyn ProfileDecoder, &'a LoadedFiles)>,
    file: FileId,
    method: MethodId,
}

impl<'a> CompilationEnv<'a> {
    /// Environment for compiling `method` of `file` while `heap` is locked.
    pub fn new(
        heap: &'a HeapReadGuard<'_>,
        recorder: Arc<PGOTypeRecorder>,
        methods: &'a MethodTable,
        call_flags: &'a CallMethodFlagMap,
        file: FileId,
        method: MethodId,
    ) -> Self {
        Self {
            heap,
            recorder,
            methods,
            call_flags,
            literals: None,
            profile_source: None,
            file,
            method,
        }
    }

    /// Object literal buffers of the compiled files.
    pub fn with_literals(mut self, literals: &'a LiteralTable) -> Self {
        self.literals = Some(literals);
        self
    }

    /// Decoder and file registry used to resolve the file of profiled
    /// callees. Without them callees are looked up in the compiled file.
    pub fn with_profile_source(mut self, decoder: &'a dyn ProfileDecoder, loaded: &'a LoadedFiles) -> Self {
        self.profile_source = Some((decoder, loaded));
        self
    }

    /// Locked heap.
    pub fn heap(&self) -> &'a ObjectModel {
        self.heap
    }

    /// Profile snapshot of the method.
    pub fn recorder(&self) -> &PGOTypeRecorder {
        &self.recorder
    }

    /// Method tables.
    pub fn methods(&self) -> &'a MethodTable {
        self.methods
    }

    /// Compiled-method flags.
    pub fn call_flags(&self) -> &'a CallMethodFlagMap {
        self.call_flags
    }

    /// Object literal buffers, if provided.
    pub fn literals(&self) -> Option<&'a LiteralTable> {
        self.literals
    }

    /// File of the compiled method.
    pub fn file(&self) -> FileId {
        self.file
    }

    /// Compiled method.
    pub fn method(&self) -> MethodId {
        self.method
    }

    /// File a profiled identity belongs to, `None` when it is stale or the
    /// file is no longer loaded.
    pub fn callee_file(&self, pt: &ProfileType) -> Option<FileId> {
        if !self.recorder.is_valid_pt(pt) {
            return None;
        }
        match self.profile_source {
            Some((decoder, loaded)) => {
                let name = decoder.abc_name_by_id(pt.abc_id)?;
                loaded.file_id(normalize_file_desc(name))
            }
            None => Some(self.file),
        }
    }

    /// Literal of a method.
    pub fn method_literal(&self, file: FileId, method: MethodId) -> Option<&'a MethodLiteral> {
        self.methods.method_literal(file, method)
    }

    /// Whether `method` of `file` shares the compiled method's constant pool.
    pub fn in_same_const_pool(&self, file: FileId, method: MethodId) -> bool {
        if file != self.file {
            return false;
        }
        let callee = self.methods.const_pool_id(file, method);
        callee.is_some() && callee == self.methods.const_pool_id(self.file, self.method)
    }
}

impl std::fmt::Debug for CompilationEnv<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompilationEnv")
            .field("file", &self.file)
            .field("method", &self.method)
            .field("has_literals", &self.literals.is_some())
            .field("has_profile_source", &self.profile_source.is_some())
            .finish()
    }
}
