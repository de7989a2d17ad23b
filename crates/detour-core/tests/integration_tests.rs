//! Integration tests for detour-core.
//!
//! These tests drive stubs, default behaviors and scopes together.

use std::sync::Arc;

use detour_core::{
    BehaviorKind, ContextMode, IndirectionConfig, IndirectionError, IndirectionStub,
    IndirectionsContext, StubRegistry,
};
use detour_extractor::MethodMetadata;
use detour_types::{well_known, Primitive, TypeDef, TypeKind, TypeRef, Value};

fn int() -> TypeRef {
    well_known::primitive(Primitive::Int32)
}

fn stub(alias: &str, target: MethodMetadata) -> IndirectionStub {
    IndirectionStub::new(alias, alias, "", target).expect("stub should build")
}

fn lenient() -> IndirectionConfig {
    IndirectionConfig::default().with_strict_scopes(false)
}

/// Default behavior leaves by-reference arguments as passed.
#[test]
fn test_default_behavior_keeps_ref_argument() {
    let bump = MethodMetadata::builder("Bump")
        .param("step", int())
        .ref_param("counter", int())
        .build();
    let stub = stub("Bump", bump);
    assert_eq!(
        stub.indirection_delegate().unwrap().to_string(),
        "Indirection.Delegates.IndirectionRefAction`2[System.Int32,System.Int32]"
    );

    let behavior = stub
        .create_delegate_of_default_behavior(BehaviorKind::DefaultValue, &[], &[])
        .expect("default behavior");
    let mut args = [Value::I32(2), Value::I32(40)];
    assert_eq!(behavior.invoke(&mut args).expect("invoke"), None);
    assert_eq!(args[1], Value::I32(40));
}

/// Default behavior zeroes every output argument.
#[test]
fn test_default_behavior_zeroes_both_outputs() {
    let divide = MethodMetadata::builder("TryDivide")
        .param("a", int())
        .param("b", int())
        .out_param("quotient", int())
        .out_param("remainder", int())
        .returns(well_known::primitive(Primitive::Boolean))
        .build();
    let stub = stub("TryDivide", divide);
    assert_eq!(
        stub.indirection_delegate().unwrap().to_string(),
        "Indirection.Delegates.IndirectionOutOutFunc`5[System.Int32,System.Int32,System.Int32,System.Int32,System.Boolean]"
    );

    let behavior = stub
        .create_delegate_of_default_behavior(BehaviorKind::DefaultValue, &[], &[])
        .expect("default behavior");
    let mut args = [Value::I32(7), Value::I32(2), Value::I32(3), Value::I32(1)];
    assert_eq!(behavior.invoke(&mut args).expect("invoke"), Some(Value::Bool(false)));
    assert_eq!(args[2], Value::I32(0));
    assert_eq!(args[3], Value::I32(0));
    assert_eq!(args[0], Value::I32(7));
}

/// The zero of a user-defined value type zeroes each field.
#[test]
fn test_default_behavior_of_struct_return() {
    let point = Arc::new(
        TypeDef::new("Geometry", "Point", TypeKind::Struct)
            .with_field("X", int())
            .with_field("Y", well_known::primitive(Primitive::Double)),
    );
    let origin = MethodMetadata::builder("Origin")
        .declared_by(&point)
        .returns(TypeRef::named(&point))
        .build();
    let stub = stub("Origin", origin);

    let behavior = stub
        .create_delegate_of_default_behavior(BehaviorKind::DefaultValue, &[], &[])
        .expect("default behavior");
    assert_eq!(
        behavior.invoke(&mut []).expect("invoke"),
        Some(Value::Struct {
            type_name: "Geometry.Point".into(),
            fields: vec![("X".into(), Value::I32(0)), ("Y".into(), Value::F64(0.0))],
        })
    );
}

#[test]
fn test_not_implemented_behavior_fails_in_scope() {
    let stub = Arc::new(stub("NowGet", now_get()));
    let behavior = stub
        .create_delegate_of_default_behavior(BehaviorKind::NotImplemented, &[], &[])
        .expect("behavior");
    assert_eq!(behavior.kind(), Some(BehaviorKind::NotImplemented));
    stub.set_body(behavior).expect("set body");

    let ctx = IndirectionsContext::with_config(lenient());
    let err = stub
        .dispatch(&mut [], |_| Ok(Some(Value::Null)))
        .expect_err("body should fail");
    assert!(matches!(err, IndirectionError::NotImplemented { .. }));
    assert!(err.to_string().starts_with("NOT_IMPLEMENTED"));
    ctx.dispose().expect("dispose");
}

#[test]
fn test_catalog_limit_on_by_value_parameters() {
    let with_params = |n: usize| {
        (0..n)
            .fold(MethodMetadata::builder("Many"), |b, i| b.param(format!("p{}", i), int()))
            .build()
    };

    let widest = stub("Many16", with_params(16));
    let delegate = widest.indirection_delegate().expect("16 parameters resolve");
    assert_eq!(delegate.type_args().len(), 16);
    assert!(delegate.to_string().starts_with("Indirection.Delegates.IndirectionAction`16["));

    let too_wide = stub("Many17", with_params(17));
    assert!(too_wide.indirection_delegate().is_none());
    let err = too_wide
        .create_delegate_of_default_behavior(BehaviorKind::DefaultValue, &[], &[])
        .expect_err("17 parameters are unsupported");
    assert!(matches!(err, IndirectionError::UnsupportedShape { .. }));
    assert!(err
        .to_string()
        .contains("IndirectionAction with more than 16 leading by-value arguments"));
}

#[test]
fn test_nested_scopes_restore_modes() {
    let registry = Arc::new(StubRegistry::new());
    let now = registry.register(stub("NowGet", now_get())).expect("register");
    let fixed = Value::DateTime(detour_types::date_time_min());

    let outer = IndirectionsContext::with_config(lenient()).with_registry(Arc::clone(&registry));
    let default = now
        .create_delegate_of_default_behavior(BehaviorKind::DefaultValue, &[], &[])
        .expect("default behavior");
    now.set_body(default).expect("set body");

    {
        let _original = IndirectionsContext::enter_original();
        assert_eq!(IndirectionsContext::mode(), ContextMode::ExecutingOriginal);
        let inner = IndirectionsContext::with_config(lenient());
        assert_eq!(IndirectionsContext::depth(), 2);
        assert_eq!(
            now.dispatch(&mut [], |_| Ok(None)).expect("dispatch"),
            Some(fixed.clone())
        );
        inner.dispose().expect("inner dispose");
        assert_eq!(now.dispatch(&mut [], |_| Ok(None)).expect("dispatch"), None);
    }

    assert_eq!(IndirectionsContext::mode(), ContextMode::Substituting);
    assert!(now.has_body());
    outer.dispose().expect("outer dispose");
    assert!(!now.has_body());
    assert_eq!(IndirectionsContext::mode(), ContextMode::Inactive);
}

fn now_get() -> MethodMetadata {
    MethodMetadata::builder("get_Now")
        .declared_by(&well_known::DATE_TIME_DEF)
        .returns(well_known::date_time())
        .build()
}
