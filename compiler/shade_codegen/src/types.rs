//! C++ spellings of Shade types.
//!
//! The first request for a struct type writes its definition into the
//! cache's definition buffer, after the definitions of every type its
//! fields mention. Definitions therefore always precede their first use.
//! Struct names are the prefixed type code, as in function symbols.

use rustc_hash::FxHashMap;
use shade_types::{ArrayLen, StructType, Type};

use crate::mangle::{encode_type, MANGLE_PREFIX};
use crate::writer::CodeWriter;
use crate::CodegenError;

pub struct TypeCodeGenCache {
    names: FxHashMap<Type, String>,
    defs: CodeWriter,
}

impl TypeCodeGenCache {
    pub fn new(indent_width: usize) -> Self {
        TypeCodeGenCache {
            names: FxHashMap::default(),
            defs: CodeWriter::new(indent_width),
        }
    }

    /// The C++ name of `ty`, emitting any struct definitions it needs.
    pub fn name(&mut self, ty: &Type) -> Result<String, CodegenError> {
        if let Some(name) = self.names.get(ty) {
            tracing::trace!(%ty, %name, "type name cache hit");
            return Ok(name.clone());
        }
        let name = match ty {
            Type::Unit => "void".to_owned(),
            Type::Bool => "bool".to_owned(),
            Type::Int { .. } | Type::Float { .. } => ty.to_string(),
            Type::Vector(v) => format!("vec<{}, {}>", self.name(v.element())?, v.count()),
            Type::Array(a) => {
                let ArrayLen::Known(n) = a.count else {
                    return Err(CodegenError::UnsupportedType { ty: ty.clone() });
                };
                format!("array<{}, {n}>", self.name(&a.element)?)
            }
            Type::Pointer(elem) => format!("{}*", self.name(elem)?),
            Type::Struct(s) => self.define_struct(ty, s)?,
            Type::Bound(b) => self.name(&b.instantiated)?,
            Type::Opaque(name) => name.components().collect::<Vec<_>>().join("_"),
            Type::GenericInt
            | Type::GenericFloat
            | Type::Symbolic(_)
            | Type::Parametric(_)
            | Type::Function(_) => {
                return Err(CodegenError::UnsupportedType { ty: ty.clone() });
            }
        };
        self.names.insert(ty.clone(), name.clone());
        Ok(name)
    }

    fn define_struct(&mut self, ty: &Type, s: &StructType) -> Result<String, CodegenError> {
        let mut name = String::from(MANGLE_PREFIX);
        encode_type(&mut name, ty)?;

        let mut fields = Vec::with_capacity(s.fields.len());
        for (field, ty) in &s.fields {
            fields.push(format!("{} {};", self.name(ty)?, crate::cpp::identifier(field.as_str())));
        }

        tracing::debug!(%name, "emitting struct definition");
        self.defs.writeln(&format!("struct {name} {{"));
        self.defs.indent();
        for field in &fields {
            self.defs.writeln(field);
        }
        self.defs.dedent();
        self.defs.writeln("};");
        self.defs.newline();
        Ok(name)
    }

    /// Definitions emitted so far, in dependency order.
    pub fn definitions(&self) -> &str {
        self.defs.as_str()
    }
}
