//! Well-known `System` types.
//!
//! Built once, on first use, and shared by every universe so that the same
//! definition (and the same generic parameters) back every reference to,
//! say, `System.Nullable`1`.
//!
//! # Usage
//!
//! ```
//! use detour_types::well_known;
//! use detour_types::Primitive;
//!
//! let int = well_known::primitive(Primitive::Int32);
//! assert_eq!(int.to_string(), "System.Int32");
//! assert_eq!(well_known::nullable_of(int).to_string(), "System.Nullable`1[System.Int32]");
//! ```

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use crate::type_ref::{FieldDef, Primitive, TypeDef, TypeKind, TypeRef};

pub const SYSTEM: &str = "System";

/// Full name of the nullable value-type wrapper definition.
pub const NULLABLE: &str = "System.Nullable`1";

/// Full name of the date-time value type.
pub const DATE_TIME: &str = "System.DateTime";

static PRIMITIVES: LazyLock<HashMap<Primitive, Arc<TypeDef>>> = LazyLock::new(|| {
    Primitive::ALL
        .iter()
        .map(|&p| {
            (
                p,
                Arc::new(TypeDef::new(SYSTEM, p.name(), TypeKind::Primitive(p))),
            )
        })
        .collect()
});

/// `System.Nullable`1`: `{ hasValue: bool, value: T }`.
pub static NULLABLE_DEF: LazyLock<Arc<TypeDef>> = LazyLock::new(|| {
    Arc::new(
        TypeDef::new(SYSTEM, "Nullable", TypeKind::Struct)
            .with_generic_params(["T"])
            .with_fields_from(|params| {
                vec![
                    FieldDef {
                        name: "hasValue".into(),
                        ty: primitive(Primitive::Boolean),
                    },
                    FieldDef {
                        name: "value".into(),
                        ty: TypeRef::param(&params[0]),
                    },
                ]
            }),
    )
});

pub static DATE_TIME_DEF: LazyLock<Arc<TypeDef>> = LazyLock::new(|| {
    Arc::new(
        TypeDef::new(SYSTEM, "DateTime", TypeKind::Struct)
            .with_field("dateData", primitive(Primitive::UInt64)),
    )
});

pub static DAY_OF_WEEK_DEF: LazyLock<Arc<TypeDef>> =
    LazyLock::new(|| Arc::new(TypeDef::new(SYSTEM, "DayOfWeek", TypeKind::Enum)));

/// `System.Collections.Generic.List`1`.
pub static LIST_DEF: LazyLock<Arc<TypeDef>> = LazyLock::new(|| {
    Arc::new(
        TypeDef::new("System.Collections.Generic", "List", TypeKind::Class)
            .with_generic_params(["T"]),
    )
});

pub fn primitive_def(p: Primitive) -> Arc<TypeDef> {
    Arc::clone(&PRIMITIVES[&p])
}

pub fn primitive(p: Primitive) -> TypeRef {
    TypeRef::named(&PRIMITIVES[&p])
}

pub fn void() -> TypeRef {
    primitive(Primitive::Void)
}

pub fn string() -> TypeRef {
    primitive(Primitive::String)
}

pub fn object() -> TypeRef {
    primitive(Primitive::Object)
}

pub fn date_time() -> TypeRef {
    TypeRef::named(&DATE_TIME_DEF)
}

pub fn day_of_week() -> TypeRef {
    TypeRef::named(&DAY_OF_WEEK_DEF)
}

pub fn nullable_of(inner: TypeRef) -> TypeRef {
    TypeRef::generic(&NULLABLE_DEF, vec![inner])
}

pub fn list_of(inner: TypeRef) -> TypeRef {
    TypeRef::generic(&LIST_DEF, vec![inner])
}

/// All well-known definitions, primitives first.
pub fn definitions() -> Vec<Arc<TypeDef>> {
    let mut defs: Vec<Arc<TypeDef>> = Primitive::ALL.iter().map(|&p| primitive_def(p)).collect();
    defs.extend([
        Arc::clone(&*NULLABLE_DEF),
        Arc::clone(&*DATE_TIME_DEF),
        Arc::clone(&*DAY_OF_WEEK_DEF),
        Arc::clone(&*LIST_DEF),
    ]);
    defs
}
