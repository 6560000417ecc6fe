//! Error code definitions

/// Lexical and syntax errors (E0xxx)
pub mod syntax {
    pub const UNEXPECTED_CHARACTER: &str = "E0001";
    pub const UNEXPECTED_TOKEN: &str = "E0002";
    pub const UNTERMINATED_STRING: &str = "E0003";
    pub const INVALID_ESCAPE: &str = "E0004";
    pub const INVALID_NUMBER: &str = "E0005";
    pub const UNEXPECTED_EOF: &str = "E0006";
    pub const RESERVED_KEYWORD: &str = "E0007";
    pub const DUPLICATE_CONSTANT: &str = "E0008";
    pub const DUPLICATE_LABEL: &str = "E0009";
    pub const INCLUDE_FAILED: &str = "E0010";
    pub const NESTING_TOO_DEEP: &str = "E0011";
}

/// Runtime errors (E4xxx)
pub mod runtime {
    pub const UNRESOLVED_REFERENCE: &str = "E4001";
    pub const ILLEGAL_REQUEST: &str = "E4002";
    pub const CONSTANT_REASSIGNMENT: &str = "E4003";
    pub const ALREADY_DEFINED: &str = "E4004";
    pub const TYPE_MISMATCH: &str = "E4005";
    pub const DIVISION_BY_ZERO: &str = "E4006";
    pub const ARITY_MISMATCH: &str = "E4007";
    pub const UNKNOWN_INSTRUCTION: &str = "E4008";
    pub const ILLEGAL_ADDRESS: &str = "E4009";
    pub const CONSTANT_OUT_OF_RANGE: &str = "E4010";
    pub const EMPTY_RETURN_STACK: &str = "E4011";
    pub const STALE_SCOPE: &str = "E4012";
    pub const CONTROL_TRANSFER_IN_EXPRESSION: &str = "E4013";
    pub const CONSTANT_SCOPE: &str = "E4014";
    pub const INSTRUCTION_FAILED: &str = "E4015";
}

/// Warnings (W0xxx)
pub mod warnings {
    pub const MISSING_HALT: &str = "W0001";
    pub const DUPLICATE_DEFINITION: &str = "W0002";
    pub const NOT_A_CALL: &str = "W0003";
}
