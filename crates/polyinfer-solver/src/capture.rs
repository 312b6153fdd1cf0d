//! Capture conversion.
//!
//! A wildcard-parameterized type such as `List<? extends Number>` is replaced
//! by `List<CAP#1>`, where `CAP#1` is a fresh captured type whose bounds come
//! from the wildcard and from the declared bound of the type parameter.

use crate::intern::TypeInterner;
use crate::types::{CapturedWildcard, TypeData, TypeId, TypeList};
use smallvec::SmallVec;

/// One application of capture conversion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Capture {
    /// The type as written, e.g. `List<? extends Number>`.
    pub wildcard_type: TypeId,
    /// The converted type, e.g. `List<CAP#1>`.
    pub captured: TypeId,
    /// The fresh captured types, in argument order.
    pub fresh: SmallVec<[TypeId; 2]>,
}

/// Capture-convert `ty`. `None` unless `ty` is a class type with at least
/// one wildcard argument.
pub fn capture(db: &TypeInterner, ty: TypeId) -> Option<Capture> {
    let TypeData::Class(class) = db.lookup(ty)? else {
        return None;
    };
    let is_wildcard = |arg: TypeId| matches!(db.lookup(arg), Some(TypeData::Wildcard(_)));
    if !class.args.iter().any(|&arg| is_wildcard(arg)) {
        return None;
    }
    let params = db.defs().get_type_params(class.def);
    if params.len() != class.args.len() {
        return None;
    }
    let mut fresh = SmallVec::new();
    let args: TypeList = class
        .args
        .iter()
        .zip(&params)
        .map(|(&arg, &param)| {
            if !is_wildcard(arg) {
                return arg;
            }
            let captured = db.captured(CapturedWildcard {
                id: db.next_capture_id(),
                wildcard: arg,
                param,
            });
            fresh.push(captured);
            captured
        })
        .collect();
    Some(Capture {
        wildcard_type: ty,
        captured: db.class(class.def, args),
        fresh,
    })
}
