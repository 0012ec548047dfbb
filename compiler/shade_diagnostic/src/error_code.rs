use std::fmt;

/// Error codes for all compiler diagnostics.
///
/// Format: E#### where first digit indicates phase:
/// - E1xxx: Registration errors (class/signature reflection)
/// - E2xxx: Type errors (matching, instantiation, inference)
/// - E3xxx: Code generation errors
/// - E9xxx: Internal compiler errors
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ErrorCode {
    // Registration Errors (E1xxx)
    /// Nested or local declaration used as a DSL type
    E1001,
    /// Base class not registered
    E1002,
    /// Unsupported type hint
    E1003,
    /// Unknown type name
    E1004,
    /// Type argument count mismatch
    E1005,
    /// Conflicting registration under one name
    E1006,
    /// Invalid builtin type construction (e.g. vector width)
    E1007,
    /// Class type argument violates its declared bound
    E1008,

    // Type Errors (E2xxx)
    /// Type mismatch
    E2001,
    /// Argument count mismatch
    E2002,
    /// Conflicting bindings for a generic parameter
    E2003,
    /// Generic parameter left unbound
    E2004,
    /// No operator overload accepts the operand types
    E2005,
    /// Unknown function
    E2006,
    /// Undefined variable
    E2007,
    /// Recursive instantiation
    E2008,
    /// Generic binding violates its declared bound
    E2009,
    /// Cannot infer type
    E2010,
    /// Unknown field or method
    E2011,

    // Codegen Errors (E3xxx)
    /// Type has no target representation
    E3001,
    /// Function reached the emitter without being fully typed
    E3002,
    /// Expression or statement shape not supported by the emitter
    E3003,

    // Internal Errors (E9xxx)
    /// Internal compiler error
    E9001,
    /// Layout requested for a non-materializable type
    E9002,
}

impl ErrorCode {
    /// Check if this is a registration error (E1xxx range).
    pub fn is_registration_error(&self) -> bool {
        self.as_str().starts_with("E1")
    }

    /// Check if this is a type error (E2xxx range).
    pub fn is_type_error(&self) -> bool {
        self.as_str().starts_with("E2")
    }

    /// Check if this is an internal compiler error (E9xxx range).
    pub fn is_internal(&self) -> bool {
        self.as_str().starts_with("E9")
    }

    /// Get the numeric code as a string (e.g., "E1001").
    pub fn as_str(&self) -> &'static str {
        match self {
            // Registration
            ErrorCode::E1001 => "E1001",
            ErrorCode::E1002 => "E1002",
            ErrorCode::E1003 => "E1003",
            ErrorCode::E1004 => "E1004",
            ErrorCode::E1005 => "E1005",
            ErrorCode::E1006 => "E1006",
            ErrorCode::E1007 => "E1007",
            ErrorCode::E1008 => "E1008",
            // Type
            ErrorCode::E2001 => "E2001",
            ErrorCode::E2002 => "E2002",
            ErrorCode::E2003 => "E2003",
            ErrorCode::E2004 => "E2004",
            ErrorCode::E2005 => "E2005",
            ErrorCode::E2006 => "E2006",
            ErrorCode::E2007 => "E2007",
            ErrorCode::E2008 => "E2008",
            ErrorCode::E2009 => "E2009",
            ErrorCode::E2010 => "E2010",
            ErrorCode::E2011 => "E2011",
            // Codegen
            ErrorCode::E3001 => "E3001",
            ErrorCode::E3002 => "E3002",
            ErrorCode::E3003 => "E3003",
            // Internal
            ErrorCode::E9001 => "E9001",
            ErrorCode::E9002 => "E9002",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_display() {
        assert_eq!(ErrorCode::E1001.to_string(), "E1001");
        assert_eq!(ErrorCode::E2005.as_str(), "E2005");
    }

    #[test]
    fn test_error_code_ranges() {
        assert!(ErrorCode::E1003.is_registration_error());
        assert!(ErrorCode::E2008.is_type_error());
        assert!(!ErrorCode::E3001.is_type_error());
        assert!(ErrorCode::E9002.is_internal());
    }
}
