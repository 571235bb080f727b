//! Per-run symbol table and best-effort resolution over the syntax model.

mod helpers;
mod platform;
mod resolver;

use std::collections::HashMap;
use std::sync::Arc;

use crate::core::syntax::{Access, CompilationUnit, MethodDecl, TypeDecl};

pub use platform::PLATFORM_SOURCES;
pub use resolver::{LocalScope, Scope, SymbolResolver};

/// Where a type's declaration comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Source under the analyzed project root
    Project,
    /// Source of a dependency on the class path
    Library,
    /// Built-in model of the Java platform
    Platform,
}

/// A type declaration together with the unit and types enclosing it
#[derive(Debug, Clone)]
pub struct TypeHandle {
    pub unit: Arc<CompilationUnit>,
    pub decl: Arc<TypeDecl>,
    /// Enclosing declarations, outermost first
    pub enclosing: Vec<Arc<TypeDecl>>,
    pub origin: Origin,
}

impl TypeHandle {
    pub fn qualified_name(&self) -> &str {
        &self.decl.qualified_name
    }

    pub fn is_local(&self) -> bool {
        self.origin == Origin::Project
    }

    pub fn methods(&self) -> impl Iterator<Item = MethodHandle> + '_ {
        self.decl.methods.iter().map(move |method| self.method(method))
    }

    pub fn method(&self, method: &Arc<MethodDecl>) -> MethodHandle {
        MethodHandle { owner: self.clone(), decl: method.clone() }
    }
}

/// A method declaration together with its declaring type
#[derive(Debug, Clone)]
pub struct MethodHandle {
    pub owner: TypeHandle,
    pub decl: Arc<MethodDecl>,
}

/// Every type visible to the resolver, keyed by qualified name
#[derive(Debug, Default)]
pub struct TypeTable {
    entries: Vec<TypeHandle>,
    by_name: HashMap<String, usize>,
}

impl TypeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers every type declared in `unit`; the first declaration of a name wins
    pub fn register_unit(&mut self, unit: &Arc<CompilationUnit>, origin: Origin) -> usize {
        let mut registered = 0;
        for (enclosing, decl) in unit.all_types() {
            if self.by_name.contains_key(&decl.qualified_name) {
                continue;
            }
            self.by_name.insert(decl.qualified_name.clone(), self.entries.len());
            self.entries.push(TypeHandle { unit: unit.clone(), decl, enclosing, origin });
            registered += 1;
        }
        registered
    }

    pub fn get(&self, qualified_name: &str) -> Option<&TypeHandle> {
        self.by_name.get(qualified_name).map(|index| &self.entries[*index])
    }

    pub fn contains(&self, qualified_name: &str) -> bool {
        self.by_name.contains_key(qualified_name)
    }

    /// Project types in registration order
    pub fn project_types(&self) -> impl Iterator<Item = &TypeHandle> {
        self.entries.iter().filter(|handle| handle.is_local())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A type after name resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedType {
    Primitive(String),
    Reference { name: String, args: Vec<ResolvedType> },
    Variable { name: String, bound: Option<Box<ResolvedType>> },
    Array(Box<ResolvedType>),
    Null,
}

impl ResolvedType {
    pub fn reference<S: Into<String>>(name: S) -> Self {
        ResolvedType::Reference { name: name.into(), args: Vec::new() }
    }

    pub fn primitive(name: &str) -> Self {
        ResolvedType::Primitive(name.to_string())
    }

    /// Type as it appears in signatures, e.g. `java.util.List<garden.Plant>`
    pub fn describe(&self) -> String {
        match self {
            ResolvedType::Primitive(name) => name.clone(),
            ResolvedType::Reference { name, args } if args.is_empty() => name.clone(),
            ResolvedType::Reference { name, args } => format!(
                "{}<{}>",
                name,
                args.iter().map(ResolvedType::describe).collect::<Vec<_>>().join(", ")
            ),
            ResolvedType::Variable { name, .. } => name.clone(),
            ResolvedType::Array(component) => format!("{}[]", component.describe()),
            ResolvedType::Null => "null".to_string(),
        }
    }

    /// Qualified name of the class or interface this type dispatches on
    pub fn erasure(&self) -> Option<&str> {
        match self {
            ResolvedType::Reference { name, .. } => Some(name),
            ResolvedType::Variable { bound: Some(bound), .. } => bound.erasure(),
            ResolvedType::Variable { bound: None, .. } => Some("java.lang.Object"),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedParam {
    pub ty: ResolvedType,
    pub varargs: bool,
}

impl ResolvedParam {
    pub fn describe(&self) -> String {
        if self.varargs {
            format!("{}...", self.ty.describe())
        } else {
            self.ty.describe()
        }
    }

    /// Type of the parameter inside the method body
    pub fn effective_type(&self) -> ResolvedType {
        if self.varargs {
            ResolvedType::Array(Box::new(self.ty.clone()))
        } else {
            self.ty.clone()
        }
    }
}

/// A method declaration with its parameter and return types resolved
#[derive(Debug, Clone)]
pub struct ResolvedMethod {
    pub declaration: MethodHandle,
    pub declaring_type: String,
    pub name: String,
    pub params: Vec<ResolvedParam>,
    pub return_type: Option<ResolvedType>,
    pub access: Access,
    pub is_abstract: bool,
}

impl ResolvedMethod {
    /// `name(paramTypes)`
    pub fn signature(&self) -> String {
        format!(
            "{}({})",
            self.name,
            self.params.iter().map(ResolvedParam::describe).collect::<Vec<_>>().join(", ")
        )
    }

    /// `declaringType.name(paramTypes)`
    pub fn qualified_signature(&self) -> String {
        format!("{}.{}", self.declaring_type, self.signature())
    }

    pub fn is_local(&self) -> bool {
        self.declaration.owner.is_local()
    }

    pub fn is_varargs(&self) -> bool {
        self.params.last().map_or(false, |param| param.varargs)
    }
}
