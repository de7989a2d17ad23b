//! The closed catalog of indirection delegate templates.
//!
//! Every template is a generic delegate definition in the
//! [`DELEGATES_NAMESPACE`] namespace. A template is picked purely by the
//! shape of the target: how the receiver is passed, the ordered passing
//! modes of the parameters and whether a value is returned.
//!
//! | Family | Receiver | Trailing | Returns |
//! |--------|----------|----------|---------|
//! | `IndirectionAction` / `IndirectionFunc` | none or by value | none | no / yes |
//! | `IndirectionRefThisAction` / `IndirectionRefThisFunc` | by reference | none | no / yes |
//! | `IndirectionOutAction` / `IndirectionOutFunc` | none or by value | `out` | no / yes |
//! | `IndirectionRefAction` / `IndirectionRefFunc` | none or by value | `ref` | no / yes |
//! | `IndirectionOutOutAction` / `IndirectionOutOutFunc` | none or by value | `out, out` | no / yes |
//!
//! A by-value receiver is passed as the first leading by-value argument.
//! Shapes outside this table have no template; that is a normal outcome.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, LazyLock};

use smallvec::SmallVec;

use detour_extractor::{PassingMode, ReceiverMode, ReturnMode, ShapeDescriptor};
use detour_types::{TypeDef, TypeKind};

pub const DELEGATES_NAMESPACE: &str = "Indirection.Delegates";

/// Maximum number of leading by-value arguments (receiver included).
pub const MAX_BY_VALUE_PARAMS: usize = 16;

static GLOBAL: LazyLock<Catalog> = LazyLock::new(Catalog::build);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DelegateFamily {
    Action,
    Func,
    RefThisAction,
    RefThisFunc,
    OutAction,
    OutFunc,
    RefAction,
    RefFunc,
    OutOutAction,
    OutOutFunc,
}

impl DelegateFamily {
    pub const ALL: [DelegateFamily; 10] = [
        DelegateFamily::Action,
        DelegateFamily::Func,
        DelegateFamily::RefThisAction,
        DelegateFamily::RefThisFunc,
        DelegateFamily::OutAction,
        DelegateFamily::OutFunc,
        DelegateFamily::RefAction,
        DelegateFamily::RefFunc,
        DelegateFamily::OutOutAction,
        DelegateFamily::OutOutFunc,
    ];

    pub fn name(self) -> &'static str {
        match self {
            DelegateFamily::Action => "IndirectionAction",
            DelegateFamily::Func => "IndirectionFunc",
            DelegateFamily::RefThisAction => "IndirectionRefThisAction",
            DelegateFamily::RefThisFunc => "IndirectionRefThisFunc",
            DelegateFamily::OutAction => "IndirectionOutAction",
            DelegateFamily::OutFunc => "IndirectionOutFunc",
            DelegateFamily::RefAction => "IndirectionRefAction",
            DelegateFamily::RefFunc => "IndirectionRefFunc",
            DelegateFamily::OutOutAction => "IndirectionOutOutAction",
            DelegateFamily::OutOutFunc => "IndirectionOutOutFunc",
        }
    }

    /// Whether the first argument is a value-type receiver passed by reference.
    pub fn has_ref_this(self) -> bool {
        matches!(self, DelegateFamily::RefThisAction | DelegateFamily::RefThisFunc)
    }

    /// Passing modes that must follow the leading by-value arguments.
    pub fn trailing(self) -> &'static [PassingMode] {
        match self {
            DelegateFamily::Action
            | DelegateFamily::Func
            | DelegateFamily::RefThisAction
            | DelegateFamily::RefThisFunc => &[],
            DelegateFamily::OutAction | DelegateFamily::OutFunc => &[PassingMode::Output],
            DelegateFamily::RefAction | DelegateFamily::RefFunc => &[PassingMode::ByReference],
            DelegateFamily::OutOutAction | DelegateFamily::OutOutFunc => {
                &[PassingMode::Output, PassingMode::Output]
            }
        }
    }

    pub fn returns(self) -> bool {
        matches!(
            self,
            DelegateFamily::Func
                | DelegateFamily::RefThisFunc
                | DelegateFamily::OutFunc
                | DelegateFamily::RefFunc
                | DelegateFamily::OutOutFunc
        )
    }

    fn for_pattern(ref_this: bool, trailing: &[PassingMode], returns: bool) -> Option<Self> {
        DelegateFamily::ALL
            .into_iter()
            .find(|f| f.has_ref_this() == ref_this && f.trailing() == trailing && f.returns() == returns)
    }
}

impl fmt::Display for DelegateFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How one type argument of a template is passed to its invoke method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotMode {
    ByValue,
    ByRef,
    Out,
    /// Value-type receiver, passed by reference.
    RefThis,
}

/// Lookup key derived from a [`ShapeDescriptor`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShapeKey {
    pub receiver: ReceiverMode,
    pub modes: SmallVec<[PassingMode; 8]>,
    pub returns: ReturnMode,
}

impl ShapeKey {
    pub fn of(shape: &ShapeDescriptor) -> Self {
        Self {
            receiver: shape.receiver(),
            modes: shape.modes().collect(),
            returns: shape.return_mode(),
        }
    }

    /// Number of type arguments a template for this key takes.
    pub fn generic_arity(&self) -> usize {
        let receiver = usize::from(self.receiver != ReceiverMode::None);
        let ret = usize::from(self.returns == ReturnMode::ByValue);
        receiver + self.modes.len() + ret
    }
}

impl fmt::Display for ShapeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let receiver = match self.receiver {
            ReceiverMode::None => "static",
            ReceiverMode::ByValue => "this",
            ReceiverMode::ByReference => "ref this",
        };
        write!(f, "{}(", receiver)?;
        for (i, m) in self.modes.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            let m = match m {
                PassingMode::ByValue => "in",
                PassingMode::ByReference => "ref",
                PassingMode::Output => "out",
            };
            write!(f, "{}", m)?;
        }
        write!(f, ")")?;
        if self.returns == ReturnMode::ByValue {
            write!(f, " -> ret")?;
        }
        Ok(())
    }
}

/// One generic delegate template.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    family: DelegateFamily,
    definition: Arc<TypeDef>,
    slots: SmallVec<[SlotMode; 8]>,
}

impl CatalogEntry {
    fn new(family: DelegateFamily, leading: usize) -> Self {
        let mut slots: SmallVec<[SlotMode; 8]> = SmallVec::new();
        if family.has_ref_this() {
            slots.push(SlotMode::RefThis);
        }
        slots.extend(std::iter::repeat(SlotMode::ByValue).take(leading));
        slots.extend(family.trailing().iter().map(|m| match m {
            PassingMode::Output => SlotMode::Out,
            PassingMode::ByReference => SlotMode::ByRef,
            PassingMode::ByValue => SlotMode::ByValue,
        }));

        let mut names: Vec<String> = Vec::with_capacity(slots.len() + 1);
        if family.has_ref_this() {
            names.push("TThis".to_string());
        }
        names.extend((1..=slots.len() - names.len()).map(|i| format!("T{}", i)));
        if family.returns() {
            names.push("TResult".to_string());
        }

        let definition = Arc::new(
            TypeDef::new(DELEGATES_NAMESPACE, family.name(), TypeKind::Delegate)
                .with_generic_params(names),
        );
        Self {
            family,
            definition,
            slots,
        }
    }

    pub fn family(&self) -> DelegateFamily {
        self.family
    }

    pub fn definition(&self) -> &Arc<TypeDef> {
        &self.definition
    }

    pub fn arity(&self) -> usize {
        self.definition.arity()
    }

    /// Passing mode of each argument slot, in invoke order (return excluded).
    pub fn slots(&self) -> &[SlotMode] {
        &self.slots
    }

    pub fn returns(&self) -> bool {
        self.family.returns()
    }
}

/// The fixed set of templates, indexed by shape.
#[derive(Debug)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
    index: HashMap<ShapeKey, usize>,
}

impl Catalog {
    /// The process-wide catalog. Built on first use, read-only afterwards.
    pub fn global() -> &'static Catalog {
        &GLOBAL
    }

    fn build() -> Self {
        let mut entries = Vec::new();
        let mut index = HashMap::new();

        for family in DelegateFamily::ALL {
            for leading in 0..=MAX_BY_VALUE_PARAMS {
                let idx = entries.len();
                entries.push(CatalogEntry::new(family, leading));

                let returns = if family.returns() {
                    ReturnMode::ByValue
                } else {
                    ReturnMode::None
                };
                let params_with = |count: usize| -> SmallVec<[PassingMode; 8]> {
                    std::iter::repeat(PassingMode::ByValue)
                        .take(count)
                        .chain(family.trailing().iter().copied())
                        .collect()
                };

                if family.has_ref_this() {
                    index.insert(
                        ShapeKey {
                            receiver: ReceiverMode::ByReference,
                            modes: params_with(leading),
                            returns,
                        },
                        idx,
                    );
                    continue;
                }
                index.insert(
                    ShapeKey {
                        receiver: ReceiverMode::None,
                        modes: params_with(leading),
                        returns,
                    },
                    idx,
                );
                if leading > 0 {
                    index.insert(
                        ShapeKey {
                            receiver: ReceiverMode::ByValue,
                            modes: params_with(leading - 1),
                            returns,
                        },
                        idx,
                    );
                }
            }
        }

        Self { entries, index }
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn lookup(&self, key: &ShapeKey) -> Option<&CatalogEntry> {
        self.index.get(key).map(|&i| &self.entries[i])
    }

    /// Find a template by family and generic arity.
    #[cfg(test)]
    fn entry(&self, family: DelegateFamily, arity: usize) -> Option<&CatalogEntry> {
        self.entries
            .iter()
            .find(|e| e.family == family && e.arity() == arity)
    }

    /// The family a key would map to if the leading-argument limit did not
    /// apply. Names the near miss in unsupported-shape errors.
    pub fn family_for(key: &ShapeKey) -> Option<DelegateFamily> {
        let split = key
            .modes
            .iter()
            .position(|m| *m != PassingMode::ByValue)
            .unwrap_or(key.modes.len());
        let trailing = &key.modes[split..];
        DelegateFamily::for_pattern(
            key.receiver == ReceiverMode::ByReference,
            trailing,
            key.returns == ReturnMode::ByValue,
        )
    }
}
