//! Owned syntax model for one Java compilation unit.
//!
//! The tree-sitter front end lowers its concrete tree into these types so the
//! resolver can hold on to declarations across files without borrowing parser
//! state. Method bodies are kept as flat, textually ordered statement lists.

use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct CompilationUnit {
    pub path: PathBuf,
    pub package: Option<String>,
    pub imports: Vec<Import>,
    pub types: Vec<Arc<TypeDecl>>,
}

impl CompilationUnit {
    /// Qualifies a simple top-level name with this unit's package
    pub fn qualify(&self, simple_name: &str) -> String {
        match &self.package {
            Some(package) => format!("{}.{}", package, simple_name),
            None => simple_name.to_string(),
        }
    }

    /// Every type in the unit, outer types first, each with its enclosing types
    pub fn all_types(&self) -> Vec<(Vec<Arc<TypeDecl>>, Arc<TypeDecl>)> {
        let mut found = Vec::new();
        for decl in &self.types {
            collect_types(Vec::new(), decl, &mut found);
        }
        found
    }
}

fn collect_types(
    enclosing: Vec<Arc<TypeDecl>>,
    decl: &Arc<TypeDecl>,
    found: &mut Vec<(Vec<Arc<TypeDecl>>, Arc<TypeDecl>)>,
) {
    found.push((enclosing.clone(), decl.clone()));
    let mut inner = enclosing;
    inner.push(decl.clone());
    for member in &decl.members {
        collect_types(inner.clone(), member, found);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    /// Imported name without the trailing `.*`
    pub path: String,
    pub is_static: bool,
    pub wildcard: bool,
}

impl Import {
    pub fn simple_name(&self) -> &str {
        self.path.rsplit('.').next().unwrap_or(&self.path)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Class,
    Interface,
    Enum,
    Record,
}

#[derive(Debug, Clone)]
pub struct TypeDecl {
    pub kind: TypeKind,
    pub name: String,
    pub qualified_name: String,
    pub modifiers: Modifiers,
    pub annotations: Vec<Annotation>,
    pub type_params: Vec<TypeParam>,
    /// Superclass for classes, super-interfaces for interfaces
    pub extends: Vec<TypeRef>,
    pub implements: Vec<TypeRef>,
    pub fields: Vec<FieldDecl>,
    pub methods: Vec<Arc<MethodDecl>>,
    pub members: Vec<Arc<TypeDecl>>,
    pub line: usize,
}

impl TypeDecl {
    pub fn is_interface(&self) -> bool {
        self.kind == TypeKind::Interface
    }

    /// Explicit zero-argument constructor, if declared
    pub fn default_constructor(&self) -> Option<&Arc<MethodDecl>> {
        self.methods
            .iter()
            .find(|method| method.is_constructor() && method.params.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Access {
    Public,
    Protected,
    #[default]
    PackagePrivate,
    Private,
}

#[derive(Debug, Clone, Default)]
pub struct Modifiers {
    pub access: Access,
    pub is_abstract: bool,
    pub is_static: bool,
    pub is_default: bool,
}

#[derive(Debug, Clone)]
pub struct TypeParam {
    pub name: String,
    pub bounds: Vec<TypeRef>,
}

/// A type as written in source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRef {
    /// Name as written, possibly dotted (`Map.Entry`, `java.util.List`)
    pub name: String,
    pub args: Vec<TypeRef>,
    pub array_dims: usize,
}

impl TypeRef {
    pub fn named<S: Into<String>>(name: S) -> Self {
        Self { name: name.into(), args: Vec::new(), array_dims: 0 }
    }

    pub fn is_var(&self) -> bool {
        self.name == "var" && self.args.is_empty() && self.array_dims == 0
    }
}

#[derive(Debug, Clone)]
pub struct FieldDecl {
    pub ty: TypeRef,
    pub names: Vec<String>,
    pub modifiers: Modifiers,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    Method,
    Constructor,
}

#[derive(Debug, Clone)]
pub struct MethodDecl {
    pub kind: MethodKind,
    pub name: String,
    pub modifiers: Modifiers,
    pub annotations: Vec<Annotation>,
    pub type_params: Vec<TypeParam>,
    pub params: Vec<Param>,
    /// `None` for constructors
    pub return_type: Option<TypeRef>,
    /// `None` for abstract, interface and native declarations
    pub body: Option<Vec<Stmt>>,
    pub line: usize,
}

impl MethodDecl {
    pub fn is_constructor(&self) -> bool {
        self.kind == MethodKind::Constructor
    }

    pub fn is_varargs(&self) -> bool {
        self.params.last().map_or(false, |param| param.varargs)
    }
}

#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub ty: TypeRef,
    pub varargs: bool,
}

#[derive(Debug, Clone)]
pub struct Annotation {
    /// Name as written, simple or qualified
    pub name: String,
    pub args: AnnotationArgs,
}

impl Annotation {
    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    /// Value of a single-value annotation, or of the `value` key of a normal one
    pub fn value(&self) -> Option<&Expr> {
        match &self.args {
            AnnotationArgs::Single(value) => Some(value),
            AnnotationArgs::Normal(_) => self.member("value"),
            AnnotationArgs::Marker => None,
        }
    }

    pub fn member(&self, key: &str) -> Option<&Expr> {
        match &self.args {
            AnnotationArgs::Normal(pairs) => pairs
                .iter()
                .find(|(name, _)| name == key)
                .map(|(_, value)| value),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum AnnotationArgs {
    Marker,
    Single(Expr),
    Normal(Vec<(String, Expr)>),
}

#[derive(Debug, Clone)]
pub enum Stmt {
    LocalVar(LocalVar),
    Expr(Expr),
}

#[derive(Debug, Clone)]
pub struct LocalVar {
    /// `None` for implicitly typed lambda parameters
    pub ty: Option<TypeRef>,
    pub name: String,
    pub init: Option<Expr>,
}

#[derive(Debug, Clone)]
pub struct MethodCall {
    pub receiver: Option<Box<Expr>>,
    pub name: String,
    pub args: Vec<Expr>,
    /// Source text with whitespace collapsed
    pub text: String,
    pub line: usize,
}

impl MethodCall {
    /// Receiver identifier when the call has the form `identifier.name(args)`
    pub fn receiver_identifier(&self) -> Option<&str> {
        match self.receiver.as_deref() {
            Some(Expr::Name(name)) => Some(name),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Lambda {
    pub params: Vec<LocalVar>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(String),
    Int,
    Long,
    Float,
    Double,
    Bool,
    Char,
    Null,
}

#[derive(Debug, Clone)]
pub enum Expr {
    MethodCall(MethodCall),
    New { ty: TypeRef, args: Vec<Expr> },
    Name(String),
    FieldAccess { target: Box<Expr>, field: String },
    This,
    Super,
    Literal(Literal),
    ClassLiteral(TypeRef),
    Lambda(Lambda),
    Cast { ty: TypeRef, expr: Box<Expr> },
    Binary { op: String, left: Box<Expr>, right: Box<Expr> },
    Unary { op: String, operand: Box<Expr> },
    Assign { target: Box<Expr>, value: Box<Expr> },
    Conditional { condition: Box<Expr>, then: Box<Expr>, otherwise: Box<Expr> },
    InstanceOf { expr: Box<Expr> },
    ArrayAccess { array: Box<Expr>, index: Box<Expr> },
    /// Anything else, lowered to its nested statements in textual order
    Compound(Vec<Stmt>),
}

impl Expr {
    pub fn as_string_literal(&self) -> Option<&str> {
        match self {
            Expr::Literal(Literal::String(value)) => Some(value),
            _ => None,
        }
    }

    /// Dotted name for `a.b.c` chains of plain names
    pub fn dotted_name(&self) -> Option<String> {
        match self {
            Expr::Name(name) => Some(name.clone()),
            Expr::FieldAccess { target, field } => {
                target.dotted_name().map(|prefix| format!("{}.{}", prefix, field))
            }
            _ => None,
        }
    }
}
