//! Reserved names used by the IR builders and the inference engine

pub const DEFAULT_CLASS_NAME: &str = "%dflt";
pub const DEFAULT_METHOD_NAME: &str = "%dflt";
pub const ANONYMOUS_METHOD_PREFIX: &str = "%AM";
pub const UNKNOWN_PROJECT_NAME: &str = "%unk";
pub const UNKNOWN_FILE_NAME: &str = "%unk";
pub const UNKNOWN_CLASS_NAME: &str = "%unk";
pub const UNKNOWN_METHOD_NAME: &str = "%unk";

pub const CONSTRUCTOR_NAME: &str = "constructor";
pub const THIS_NAME: &str = "this";
pub const UNDEFINED_NAME: &str = "undefined";
pub const NULL_NAME: &str = "null";

/// Builtin library symbols the inference engine special-cases
pub mod builtin {
    pub const PROJECT_NAME: &str = "%builtin";
    pub const FILE_NAME: &str = "lib.es.d.ts";

    pub const ARRAY: &str = "Array";
    pub const STRING: &str = "String";
    pub const NUMBER: &str = "Number";
    pub const BOOLEAN: &str = "Boolean";
    pub const PROMISE: &str = "Promise";
    pub const FOR_EACH: &str = "forEach";
    pub const LENGTH: &str = "length";

    pub const ITERATOR_FUNCTION: &str = "[Symbol.iterator]";
    pub const ITERATOR_NEXT: &str = "next";
    pub const ITERATOR_CLASS: &str = "IterableIterator";
    pub const ITERATOR_RESULT: &str = "IteratorResult";
    pub const ITERATOR_RESULT_VALUE: &str = "value";
    pub const ITERATOR_RESULT_DONE: &str = "done";

    /// Callee name of a dynamic `import(...)` expression
    pub const IMPORT: &str = "import";
}

/// UI component names the inference engine recognizes
pub mod component {
    pub const CREATE_FUNCTION: &str = "create";
    pub const POP_FUNCTION: &str = "pop";

    pub const DECORATORS: &[&str] = &["Component", "ComponentV2", "CustomDialog", "Entry", "Builder", "Reusable"];
}

/// Prefix of synthesized dummy-main symbols
pub mod dummy {
    pub const FILE_NAME: &str = "@dummyFile";
    pub const CLASS_NAME: &str = "@dummyClass";
    pub const METHOD_NAME: &str = "@dummyMain";
    pub const COUNT_LOCAL: &str = "count";
}
