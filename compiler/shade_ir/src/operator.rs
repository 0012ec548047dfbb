//! Operators and their method-name tables.
//!
//! Every operator in the DSL is sugar for a method call on one of its
//! operands. Binary operators carry a forward method (looked up on the left
//! operand) and a reflected method (looked up on the right operand when the
//! forward lookup fails).

use std::fmt;

/// Binary operators.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    FloorDiv,
    Pow,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
}

impl BinaryOp {
    pub const ALL: [BinaryOp; 18] = [
        BinaryOp::Add,
        BinaryOp::Sub,
        BinaryOp::Mul,
        BinaryOp::Div,
        BinaryOp::Mod,
        BinaryOp::FloorDiv,
        BinaryOp::Pow,
        BinaryOp::Eq,
        BinaryOp::NotEq,
        BinaryOp::Lt,
        BinaryOp::LtEq,
        BinaryOp::Gt,
        BinaryOp::GtEq,
        BinaryOp::BitAnd,
        BinaryOp::BitOr,
        BinaryOp::BitXor,
        BinaryOp::Shl,
        BinaryOp::Shr,
    ];

    /// `(forward, reflected)` method names.
    ///
    /// Comparisons reflect to the mirrored comparison (`a < b` falls back to
    /// `b > a`); equality reflects to itself.
    pub fn method_names(self) -> (&'static str, &'static str) {
        match self {
            BinaryOp::Add => ("__add__", "__radd__"),
            BinaryOp::Sub => ("__sub__", "__rsub__"),
            BinaryOp::Mul => ("__mul__", "__rmul__"),
            BinaryOp::Div => ("__truediv__", "__rtruediv__"),
            BinaryOp::Mod => ("__mod__", "__rmod__"),
            BinaryOp::FloorDiv => ("__floordiv__", "__rfloordiv__"),
            BinaryOp::Pow => ("__pow__", "__rpow__"),
            BinaryOp::Eq => ("__eq__", "__eq__"),
            BinaryOp::NotEq => ("__ne__", "__ne__"),
            BinaryOp::Lt => ("__lt__", "__gt__"),
            BinaryOp::LtEq => ("__le__", "__ge__"),
            BinaryOp::Gt => ("__gt__", "__lt__"),
            BinaryOp::GtEq => ("__ge__", "__le__"),
            BinaryOp::BitAnd => ("__and__", "__rand__"),
            BinaryOp::BitOr => ("__or__", "__ror__"),
            BinaryOp::BitXor => ("__xor__", "__rxor__"),
            BinaryOp::Shl => ("__lshift__", "__rlshift__"),
            BinaryOp::Shr => ("__rshift__", "__rrshift__"),
        }
    }

    #[inline]
    pub fn forward_method(self) -> &'static str {
        self.method_names().0
    }

    #[inline]
    pub fn reflected_method(self) -> &'static str {
        self.method_names().1
    }

    /// Source-level spelling.
    pub fn as_symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::FloorDiv => "//",
            BinaryOp::Pow => "**",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
        }
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq
                | BinaryOp::NotEq
                | BinaryOp::Lt
                | BinaryOp::LtEq
                | BinaryOp::Gt
                | BinaryOp::GtEq
        )
    }

    pub fn is_bitwise(self) -> bool {
        matches!(
            self,
            BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor | BinaryOp::Shl | BinaryOp::Shr
        )
    }

    pub fn is_arithmetic(self) -> bool {
        !self.is_comparison() && !self.is_bitwise()
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_symbol())
    }
}

/// Unary operators.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum UnaryOp {
    Neg,
    Pos,
    Invert,
    Not,
}

impl UnaryOp {
    pub fn method_name(self) -> &'static str {
        match self {
            UnaryOp::Neg => "__neg__",
            UnaryOp::Pos => "__pos__",
            UnaryOp::Invert => "__invert__",
            UnaryOp::Not => "__not__",
        }
    }

    pub fn as_symbol(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Pos => "+",
            UnaryOp::Invert => "~",
            UnaryOp::Not => "not",
        }
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arithmetic_reflects_to_r_method() {
        assert_eq!(BinaryOp::Add.method_names(), ("__add__", "__radd__"));
        assert_eq!(BinaryOp::Div.method_names(), ("__truediv__", "__rtruediv__"));
        assert_eq!(BinaryOp::FloorDiv.method_names(), ("__floordiv__", "__rfloordiv__"));
        assert_eq!(BinaryOp::Pow.method_names(), ("__pow__", "__rpow__"));
    }

    #[test]
    fn comparisons_reflect_to_mirror() {
        assert_eq!(BinaryOp::Lt.method_names(), ("__lt__", "__gt__"));
        assert_eq!(BinaryOp::GtEq.method_names(), ("__ge__", "__le__"));
        assert_eq!(BinaryOp::Eq.method_names(), ("__eq__", "__eq__"));
    }

    #[test]
    fn classification_is_a_partition() {
        for op in BinaryOp::ALL {
            let classes = [op.is_arithmetic(), op.is_comparison(), op.is_bitwise()];
            assert_eq!(classes.iter().filter(|c| **c).count(), 1, "{op}");
        }
    }

    #[test]
    fn unary_methods() {
        assert_eq!(UnaryOp::Neg.method_name(), "__neg__");
        assert_eq!(UnaryOp::Invert.method_name(), "__invert__");
    }
}
