//! Dynamic runtime values passed through indirection behaviors.
//!
//! Behaviors see their arguments as a mutable slice of [`Value`]s. By-reference
//! and output slots are written in place; the receiver of a value-type
//! instance method occupies slot 0 and is written the same way.

use anyhow::{anyhow, Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::type_ref::{Primitive, TypeKind, TypeRef};
use crate::well_known;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// The null reference.
    Null,
    Bool(bool),
    Char(char),
    I8(i8),
    U8(u8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    F32(f32),
    F64(f64),
    IntPtr(isize),
    UIntPtr(usize),
    Decimal { mantissa: i128, scale: u32 },
    String(String),
    DateTime(NaiveDateTime),
    Enum { type_name: String, ordinal: i64 },
    /// Instance of the nullable value-type wrapper; `None` is "no value".
    Nullable(Option<Box<Value>>),
    Struct {
        type_name: String,
        fields: Vec<(String, Value)>,
    },
    /// Instance of a reference type.
    Object {
        type_name: String,
        fields: Vec<(String, Value)>,
    },
    Array(Vec<Value>),
}

/// Smallest representable date-time, 0001-01-01T00:00:00.
pub fn date_time_min() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1, 1, 1)
        .expect("0001-01-01 is a valid date")
        .and_time(NaiveTime::MIN)
}

impl Value {
    /// The zero/default value of a closed type.
    ///
    /// By-reference types yield the zero value of their element. Types that
    /// still mention generic parameters or placeholders have no zero value.
    pub fn zero_of(ty: &TypeRef) -> Result<Value> {
        if !ty.is_closed() {
            return Err(anyhow!("type {} is not closed", ty));
        }
        let value = match ty {
            TypeRef::ByRef(element) => return Self::zero_of(element),
            TypeRef::Pointer(_) => Value::UIntPtr(0),
            TypeRef::Array { .. } => Value::Null,
            TypeRef::Param(_) | TypeRef::Placeholder(_) => unreachable!("rejected by is_closed"),
            TypeRef::Named { def, args } => match def.kind() {
                TypeKind::Primitive(p) => primitive_zero(p),
                TypeKind::Class | TypeKind::Interface | TypeKind::Delegate => Value::Null,
                TypeKind::Enum => Value::Enum {
                    type_name: ty.to_string(),
                    ordinal: 0,
                },
                TypeKind::Struct => {
                    let full_name = def.full_name();
                    if full_name == well_known::NULLABLE {
                        Value::Nullable(None)
                    } else if full_name == well_known::DATE_TIME {
                        Value::DateTime(date_time_min())
                    } else {
                        let params = def.generic_params();
                        let bind = |t: &TypeRef| match t {
                            TypeRef::Param(p) => params
                                .iter()
                                .position(|q| std::sync::Arc::ptr_eq(p, q))
                                .and_then(|i| args.get(i).cloned()),
                            _ => None,
                        };
                        let fields = def
                            .fields()
                            .iter()
                            .map(|f| Ok((f.name.clone(), Self::zero_of(&f.ty.substitute(&bind))?)))
                            .collect::<Result<Vec<_>>>()?;
                        Value::Struct {
                            type_name: ty.to_string(),
                            fields,
                        }
                    }
                }
            },
        };
        Ok(value)
    }

    /// Whether this value can occupy a slot of the closed type `ty`.
    ///
    /// By-reference types are checked against their element. Reference-typed
    /// slots accept `Null`; `System.Object` accepts anything.
    pub fn conforms_to(&self, ty: &TypeRef) -> bool {
        match ty {
            TypeRef::ByRef(element) => self.conforms_to(element),
            TypeRef::Param(_) | TypeRef::Placeholder(_) => false,
            TypeRef::Pointer(_) => matches!(self, Value::IntPtr(_) | Value::UIntPtr(_)),
            TypeRef::Array { element, .. } => match self {
                Value::Null => true,
                Value::Array(items) => items.iter().all(|v| v.conforms_to(element)),
                _ => false,
            },
            TypeRef::Named { def, args } => match def.kind() {
                TypeKind::Primitive(p) => self.conforms_to_primitive(p),
                TypeKind::Class | TypeKind::Interface | TypeKind::Delegate => match self {
                    Value::Null => true,
                    Value::Object { type_name, .. } => *type_name == ty.to_string(),
                    _ => false,
                },
                TypeKind::Enum => {
                    matches!(self, Value::Enum { type_name, .. } if *type_name == ty.to_string())
                }
                TypeKind::Struct => {
                    let full_name = def.full_name();
                    if full_name == well_known::NULLABLE {
                        match (self, args.first()) {
                            (Value::Nullable(None), _) => true,
                            (Value::Nullable(Some(inner)), Some(arg)) => inner.conforms_to(arg),
                            _ => false,
                        }
                    } else if full_name == well_known::DATE_TIME {
                        matches!(self, Value::DateTime(_))
                    } else {
                        matches!(self, Value::Struct { type_name, .. } if *type_name == ty.to_string())
                    }
                }
            },
        }
    }

    fn conforms_to_primitive(&self, p: Primitive) -> bool {
        match p {
            Primitive::Object => true,
            Primitive::Void => matches!(self, Value::Null),
            Primitive::String => matches!(self, Value::Null | Value::String(_)),
            Primitive::Boolean => matches!(self, Value::Bool(_)),
            Primitive::Char => matches!(self, Value::Char(_)),
            Primitive::SByte => matches!(self, Value::I8(_)),
            Primitive::Byte => matches!(self, Value::U8(_)),
            Primitive::Int16 => matches!(self, Value::I16(_)),
            Primitive::UInt16 => matches!(self, Value::U16(_)),
            Primitive::Int32 => matches!(self, Value::I32(_)),
            Primitive::UInt32 => matches!(self, Value::U32(_)),
            Primitive::Int64 => matches!(self, Value::I64(_)),
            Primitive::UInt64 => matches!(self, Value::U64(_)),
            Primitive::Single => matches!(self, Value::F32(_)),
            Primitive::Double => matches!(self, Value::F64(_)),
            Primitive::IntPtr => matches!(self, Value::IntPtr(_)),
            Primitive::UIntPtr => matches!(self, Value::UIntPtr(_)),
            Primitive::Decimal => matches!(self, Value::Decimal { .. }),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

fn primitive_zero(p: Primitive) -> Value {
    match p {
        Primitive::Void | Primitive::String | Primitive::Object => Value::Null,
        Primitive::Boolean => Value::Bool(false),
        Primitive::Char => Value::Char('\0'),
        Primitive::SByte => Value::I8(0),
        Primitive::Byte => Value::U8(0),
        Primitive::Int16 => Value::I16(0),
        Primitive::UInt16 => Value::U16(0),
        Primitive::Int32 => Value::I32(0),
        Primitive::UInt32 => Value::U32(0),
        Primitive::Int64 => Value::I64(0),
        Primitive::UInt64 => Value::U64(0),
        Primitive::Single => Value::F32(0.0),
        Primitive::Double => Value::F64(0.0),
        Primitive::IntPtr => Value::IntPtr(0),
        Primitive::UIntPtr => Value::UIntPtr(0),
        Primitive::Decimal => Value::Decimal {
            mantissa: 0,
            scale: 0,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::type_ref::{open_type, TypeDef};
    use std::sync::Arc;

    #[test]
    fn test_zero_of_primitives_and_references() {
        assert_eq!(Value::zero_of(&well_known::primitive(Primitive::Int32)).unwrap(), Value::I32(0));
        assert_eq!(Value::zero_of(&well_known::string()).unwrap(), Value::Null);
        assert_eq!(
            Value::zero_of(&well_known::list_of(well_known::string())).unwrap(),
            Value::Null
        );
        assert_eq!(
            Value::zero_of(&TypeRef::by_ref(well_known::primitive(Primitive::Boolean))).unwrap(),
            Value::Bool(false)
        );
    }

    #[test]
    fn test_zero_of_well_known_structs() {
        let nullable = well_known::nullable_of(well_known::primitive(Primitive::Int32));
        assert_eq!(Value::zero_of(&nullable).unwrap(), Value::Nullable(None));
        assert_eq!(
            Value::zero_of(&well_known::date_time()).unwrap(),
            Value::DateTime(date_time_min())
        );
        assert_eq!(
            Value::zero_of(&well_known::day_of_week()).unwrap(),
            Value::Enum {
                type_name: "System.DayOfWeek".into(),
                ordinal: 0
            }
        );
    }

    #[test]
    fn test_zero_of_generic_struct_substitutes_fields() {
        let pair = Arc::new(
            TypeDef::new("Tests", "Pair", TypeKind::Struct)
                .with_generic_params(["A"])
                .with_fields_from(|p| {
                    vec![crate::type_ref::FieldDef {
                        name: "first".into(),
                        ty: TypeRef::param(&p[0]),
                    }]
                }),
        );
        let closed = TypeRef::generic(&pair, vec![well_known::primitive(Primitive::Int64)]);
        assert_eq!(
            Value::zero_of(&closed).unwrap(),
            Value::Struct {
                type_name: "Tests.Pair`1[System.Int64]".into(),
                fields: vec![("first".into(), Value::I64(0))],
            }
        );
        assert!(Value::zero_of(&open_type(&pair)).is_err());
    }

    #[test]
    fn test_conformance() {
        let int = well_known::primitive(Primitive::Int32);
        assert!(Value::I32(1).conforms_to(&int));
        assert!(!Value::I64(1).conforms_to(&int));
        assert!(Value::Null.conforms_to(&well_known::string()));
        assert!(Value::I32(3).conforms_to(&well_known::object()));

        let nullable = well_known::nullable_of(int.clone());
        assert!(Value::Nullable(Some(Box::new(Value::I32(42)))).conforms_to(&nullable));
        assert!(!Value::Nullable(Some(Box::new(Value::Bool(true)))).conforms_to(&nullable));
        assert!(Value::Nullable(None).conforms_to(&TypeRef::by_ref(nullable)));
    }
}
