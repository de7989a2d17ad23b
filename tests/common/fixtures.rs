//! Target method fixtures.
//!
//! Each function builds the metadata of one redirection target. The same
//! targets are described by [`METADATA_JSON`] for provider-based tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use detour_sandbox::extractor::MethodMetadata;
use detour_sandbox::types::{open_type, well_known, Primitive, TypeDef, TypeKind, TypeRef};

pub const FIXTURE_NAMESPACE: &str = "Tests.Fixtures";

/// `Tests.Fixtures.IndirectionStubTest`, the enclosing class of the nested fixtures.
pub static OUTER: LazyLock<Arc<TypeDef>> = LazyLock::new(|| {
    Arc::new(TypeDef::new(FIXTURE_NAMESPACE, "IndirectionStubTest", TypeKind::Class))
});

/// `class C<Bar>`
pub static C_DEF: LazyLock<Arc<TypeDef>> = LazyLock::new(|| {
    Arc::new(
        TypeDef::new("", "C", TypeKind::Class)
            .with_generic_params(["Bar"])
            .nested_in(Arc::clone(&*OUTER)),
    )
});

/// `class D<Baz>`
pub static D_DEF: LazyLock<Arc<TypeDef>> = LazyLock::new(|| {
    Arc::new(
        TypeDef::new("", "D", TypeKind::Class)
            .with_generic_params(["Baz"])
            .nested_in(Arc::clone(&*OUTER)),
    )
});

static HELPERS_DEF: LazyLock<Arc<TypeDef>> =
    LazyLock::new(|| Arc::new(TypeDef::new(FIXTURE_NAMESPACE, "ULHelpers", TypeKind::Class)));

static CONFIGURATION_DEF: LazyLock<Arc<TypeDef>> = LazyLock::new(|| {
    Arc::new(TypeDef::new(FIXTURE_NAMESPACE, "ULConfigurationManager", TypeKind::Class))
});

static NATIVE_DEF: LazyLock<Arc<TypeDef>> =
    LazyLock::new(|| Arc::new(TypeDef::new(FIXTURE_NAMESPACE, "Foo", TypeKind::Class)));

/// `static DateTime DateTime.Now { get; }`
pub fn now_get() -> MethodMetadata {
    MethodMetadata::builder("get_Now")
        .declared_by(&well_known::DATE_TIME_DEF)
        .returns(well_known::date_time())
        .build()
}

/// `Nullable<T>(T value)`
pub fn nullable_ctor() -> MethodMetadata {
    let nullable = Arc::clone(&*well_known::NULLABLE_DEF);
    let t = TypeRef::param(&nullable.generic_params()[0]);
    MethodMetadata::builder(".ctor")
        .declared_by(&nullable)
        .constructor()
        .param("value", t)
        .build()
}

/// `static T ULConfigurationManager.GetProperty<T>(string key, T defaultValue)`
pub fn get_property() -> MethodMetadata {
    let mut builder = MethodMetadata::builder("GetProperty").declared_by(&CONFIGURATION_DEF);
    let t = builder.generic_param("T");
    builder
        .param("key", well_known::string())
        .param("defaultValue", t.clone())
        .returns(t)
        .build()
}

/// `void ULHelpers.GetContractDetails(string s, ref bool b, ref decimal d1, ref decimal d2)`
pub fn get_contract_details() -> MethodMetadata {
    MethodMetadata::builder("GetContractDetails")
        .declared_by(&HELPERS_DEF)
        .instance()
        .param("s", well_known::string())
        .ref_param("b", well_known::primitive(Primitive::Boolean))
        .ref_param("d1", well_known::primitive(Primitive::Decimal))
        .ref_param("d2", well_known::primitive(Primitive::Decimal))
        .build()
}

/// `static extern bool Foo.IsWow64Process(IntPtr processHandle, out bool wow64Process)`
pub fn is_wow64_process() -> MethodMetadata {
    MethodMetadata::builder("IsWow64Process")
        .declared_by(&NATIVE_DEF)
        .platform_invoke()
        .param("processHandle", well_known::primitive(Primitive::IntPtr))
        .out_param("wow64Process", well_known::primitive(Primitive::Boolean))
        .returns(well_known::primitive(Primitive::Boolean))
        .build()
}

/// `C<Bar> C<Bar>.Fuga(C<Bar> result)`
pub fn c_fuga() -> MethodMetadata {
    let c_of_bar = open_type(&C_DEF);
    MethodMetadata::builder("Fuga")
        .declared_by(&C_DEF)
        .instance()
        .param("result", c_of_bar.clone())
        .returns(c_of_bar)
        .build()
}

/// `List<D<Baz>[]>[,] D<Baz>.Fuga(out List<D<Baz>[]>[,] result)`
pub fn d_fuga() -> MethodMetadata {
    let nested = TypeRef::array(
        well_known::list_of(TypeRef::array(open_type(&D_DEF), 1)),
        2,
    );
    MethodMetadata::builder("Fuga")
        .declared_by(&D_DEF)
        .instance()
        .out_param("result", nested.clone())
        .returns(nested)
        .build()
}

/// `int DateTime.CompareTo(object value)`
pub fn compare_to() -> MethodMetadata {
    MethodMetadata::builder("CompareTo")
        .declared_by(&well_known::DATE_TIME_DEF)
        .instance()
        .param("value", well_known::object())
        .returns(well_known::primitive(Primitive::Int32))
        .build()
}

/// `static bool DateTime.TryParse(string s, out DateTime result)`
pub fn try_parse() -> MethodMetadata {
    MethodMetadata::builder("TryParse")
        .declared_by(&well_known::DATE_TIME_DEF)
        .param("s", well_known::string())
        .out_param("result", well_known::date_time())
        .returns(well_known::primitive(Primitive::Boolean))
        .build()
}

/// The fixtures above as a metadata document, keyed by stub alias.
pub const METADATA_JSON: &str = r#"{
    "schema_version": 1,
    "types": [
        { "namespace": "Tests.Fixtures", "name": "IndirectionStubTest", "kind": "class" },
        { "name": "C", "kind": "class", "declaring_type": "Tests.Fixtures.IndirectionStubTest", "generic_params": ["Bar"] },
        { "name": "D", "kind": "class", "declaring_type": "Tests.Fixtures.IndirectionStubTest", "generic_params": ["Baz"] },
        { "namespace": "Tests.Fixtures", "name": "ULHelpers", "kind": "class" },
        { "namespace": "Tests.Fixtures", "name": "ULConfigurationManager", "kind": "class" },
        { "namespace": "Tests.Fixtures", "name": "Foo", "kind": "class" }
    ],
    "methods": [
        {
            "alias": "NowGet",
            "name": "get_Now",
            "declaring_type": "System.DateTime",
            "kind": "static",
            "returns": "System.DateTime"
        },
        {
            "alias": "ConstructorT",
            "name": ".ctor",
            "declaring_type": "System.Nullable`1",
            "kind": "constructor",
            "params": [ { "name": "value", "type": "T" } ]
        },
        {
            "alias": "GetPropertyOfTStringT",
            "name": "GetProperty",
            "declaring_type": "Tests.Fixtures.ULConfigurationManager",
            "kind": "static",
            "generic_params": ["T"],
            "params": [
                { "name": "key", "type": "string" },
                { "name": "defaultValue", "type": "T" }
            ],
            "returns": "T"
        },
        {
            "alias": "GetContractDetailsStringBooleanRefDecimalRefDecimalRef",
            "name": "GetContractDetails",
            "declaring_type": "Tests.Fixtures.ULHelpers",
            "kind": "instance",
            "params": [
                { "name": "s", "type": "System.String" },
                { "name": "b", "type": "System.Boolean&" },
                { "name": "d1", "type": "System.Decimal&" },
                { "name": "d2", "type": "System.Decimal&" }
            ]
        },
        {
            "alias": "IsWow64ProcessIntPtrBooleanRef",
            "name": "IsWow64Process",
            "declaring_type": "Tests.Fixtures.Foo",
            "kind": "static",
            "calling_convention": "platform_invoke",
            "params": [
                { "name": "processHandle", "type": "System.IntPtr" },
                { "name": "wow64Process", "type": "System.Boolean&", "out": true }
            ],
            "returns": "System.Boolean"
        },
        {
            "alias": "FugaIndirectionStubTestCOfBar",
            "name": "Fuga",
            "declaring_type": "Tests.Fixtures.IndirectionStubTest+C`1",
            "kind": "instance",
            "params": [ { "name": "result", "type": "Tests.Fixtures.IndirectionStubTest+C`1[Bar]" } ],
            "returns": "Tests.Fixtures.IndirectionStubTest+C`1[Bar]"
        },
        {
            "alias": "FugaIndirectionStubTestDOfBazRef",
            "name": "Fuga",
            "declaring_type": "Tests.Fixtures.IndirectionStubTest+D`1",
            "kind": "instance",
            "params": [
                { "name": "result", "type": "System.Collections.Generic.List`1[Tests.Fixtures.IndirectionStubTest+D`1[Baz][]][,]&", "out": true }
            ],
            "returns": "System.Collections.Generic.List`1[Tests.Fixtures.IndirectionStubTest+D`1[Baz][]][,]"
        }
    ]
}"#;

/// Write [`METADATA_JSON`] into `dir` and return the file path.
pub fn write_metadata_document(dir: &Path) -> PathBuf {
    let path = dir.join("indirections.json");
    std::fs::write(&path, METADATA_JSON).expect("fixture document should be writable");
    path
}
