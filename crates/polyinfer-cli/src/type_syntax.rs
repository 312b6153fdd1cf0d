//! Parsing of source-syntax type expressions.
//!
//! ```text
//! type       := conjunct ('&' conjunct)*
//! conjunct   := wildcard | primary ('[' ']')*
//! wildcard   := '?' (('extends' | 'super') primary ('[' ']')*)?
//! primary    := name ('<' type (',' type)* '>')?
//! ```

use anyhow::{Result, bail};
use polyinfer_solver::{DefId, PrimitiveKind, TypeId, TypeInterner, TypeParamId};
use rustc_hash::FxHashMap;

/// Type names visible to a scenario: the well-known classes plus every
/// declared class.
pub struct TypeNames {
    classes: FxHashMap<String, DefId>,
}

impl TypeNames {
    pub fn new() -> Self {
        let builtins = [
            ("Object", DefId::OBJECT),
            ("Number", DefId::NUMBER),
            ("Boolean", DefId::BOOLEAN),
            ("Byte", DefId::BYTE),
            ("Short", DefId::SHORT),
            ("Character", DefId::CHARACTER),
            ("Integer", DefId::INTEGER),
            ("Long", DefId::LONG),
            ("Float", DefId::FLOAT),
            ("Double", DefId::DOUBLE),
            ("String", DefId::STRING),
            ("Throwable", DefId::THROWABLE),
            ("Exception", DefId::EXCEPTION),
            ("RuntimeException", DefId::RUNTIME_EXCEPTION),
            ("Error", DefId::ERROR),
        ];
        Self {
            classes: builtins
                .into_iter()
                .map(|(name, def)| (name.to_string(), def))
                .collect(),
        }
    }

    pub fn declare(&mut self, name: &str, def: DefId) -> Result<()> {
        if self.classes.insert(name.to_string(), def).is_some() {
            bail!("class `{name}` is declared twice");
        }
        Ok(())
    }

    pub fn class(&self, name: &str) -> Option<DefId> {
        self.classes.get(name).copied()
    }
}

/// Type parameters in scope, innermost last.
pub type ParamScope = [(String, TypeParamId)];

pub fn parse_type(
    db: &TypeInterner,
    names: &TypeNames,
    params: &ParamScope,
    text: &str,
) -> Result<TypeId> {
    let mut parser = TypeParser {
        db,
        names,
        params,
        text,
        pos: 0,
    };
    let ty = parser.parse_type()?;
    parser.skip_ws();
    if parser.pos != text.len() {
        bail!("unexpected `{}` in type `{text}`", &text[parser.pos..]);
    }
    Ok(ty)
}

struct TypeParser<'a> {
    db: &'a TypeInterner,
    names: &'a TypeNames,
    params: &'a ParamScope,
    text: &'a str,
    pos: usize,
}

impl TypeParser<'_> {
    fn parse_type(&mut self) -> Result<TypeId> {
        let first = self.parse_conjunct()?;
        if !self.eat('&') {
            return Ok(first);
        }
        let mut members = vec![first, self.parse_conjunct()?];
        while self.eat('&') {
            members.push(self.parse_conjunct()?);
        }
        Ok(self.db.intersection(members))
    }

    fn parse_conjunct(&mut self) -> Result<TypeId> {
        if self.eat('?') {
            let checkpoint = self.pos;
            return match self.ident().as_deref() {
                Some("extends") => {
                    let bound = self.parse_array()?;
                    Ok(self.db.wildcard_extends(bound))
                }
                Some("super") => {
                    let bound = self.parse_array()?;
                    Ok(self.db.wildcard_super(bound))
                }
                Some(other) => bail!("expected `extends` or `super` after `?`, found `{other}`"),
                None => {
                    self.pos = checkpoint;
                    Ok(self.db.wildcard())
                }
            };
        }
        self.parse_array()
    }

    fn parse_array(&mut self) -> Result<TypeId> {
        let mut ty = self.parse_primary()?;
        while self.eat('[') {
            if !self.eat(']') {
                bail!("expected `]` in type `{}`", self.text);
            }
            ty = self.db.array(ty);
        }
        Ok(ty)
    }

    fn parse_primary(&mut self) -> Result<TypeId> {
        let Some(name) = self.ident() else {
            bail!("expected a type name in `{}`", self.text);
        };
        if let Some(ty) = self.keyword_type(&name) {
            return Ok(ty);
        }
        if let Some((_, param)) = self.params.iter().rev().find(|(n, _)| *n == name) {
            return Ok(self.db.type_param(*param));
        }
        let Some(def) = self.names.class(&name) else {
            bail!("unknown type `{name}`");
        };
        if !self.eat('<') {
            return Ok(self.db.raw(def));
        }
        let mut args = vec![self.parse_type()?];
        while self.eat(',') {
            args.push(self.parse_type()?);
        }
        if !self.eat('>') {
            bail!("expected `>` in type `{}`", self.text);
        }
        let declared = self.db.defs().get_type_params(def).len();
        if declared != args.len() {
            bail!(
                "`{name}` takes {declared} type argument(s), {} given",
                args.len()
            );
        }
        Ok(self.db.apply(def, &args))
    }

    fn keyword_type(&self, name: &str) -> Option<TypeId> {
        let kind = match name {
            "void" => return Some(TypeId::VOID),
            "null" => return Some(TypeId::NULL),
            "boolean" => PrimitiveKind::Boolean,
            "byte" => PrimitiveKind::Byte,
            "short" => PrimitiveKind::Short,
            "char" => PrimitiveKind::Char,
            "int" => PrimitiveKind::Int,
            "long" => PrimitiveKind::Long,
            "float" => PrimitiveKind::Float,
            "double" => PrimitiveKind::Double,
            _ => return None,
        };
        Some(kind.type_id())
    }

    fn skip_ws(&mut self) {
        let rest = &self.text[self.pos..];
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn eat(&mut self, c: char) -> bool {
        self.skip_ws();
        if self.text[self.pos..].starts_with(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn ident(&mut self) -> Option<String> {
        self.skip_ws();
        let rest = &self.text[self.pos..];
        let len = rest
            .char_indices()
            .find(|&(i, c)| {
                !(c == '_' || c == '$' || c.is_alphabetic() || (i > 0 && c.is_ascii_digit()))
            })
            .map_or(rest.len(), |(i, _)| i);
        if len == 0 {
            return None;
        }
        self.pos += len;
        Some(rest[..len].to_string())
    }
}

#[cfg(test)]
#[path = "../tests/type_syntax_tests.rs"]
mod tests;
