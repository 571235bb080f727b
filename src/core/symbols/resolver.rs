use std::collections::{HashMap, HashSet, VecDeque};

use super::{MethodHandle, ResolvedMethod, ResolvedParam, ResolvedType, TypeHandle, TypeTable};
use crate::core::options::LanguageLevel;
use crate::core::syntax::{Expr, Literal, LocalVar, MethodCall, TypeKind, TypeParam, TypeRef};

pub(super) const OBJECT: &str = "java.lang.Object";
const STRING: &str = "java.lang.String";
const CLASS: &str = "java.lang.Class";

const PRIMITIVES: &[&str] = &["byte", "short", "int", "long", "float", "double", "boolean", "char", "void"];

const BOXES: &[(&str, &str)] = &[
    ("boolean", "java.lang.Boolean"),
    ("byte", "java.lang.Byte"),
    ("short", "java.lang.Short"),
    ("char", "java.lang.Character"),
    ("int", "java.lang.Integer"),
    ("long", "java.lang.Long"),
    ("float", "java.lang.Float"),
    ("double", "java.lang.Double"),
];

/// Where a name is being resolved: the enclosing type, method type
/// parameters and, inside bodies, the locals declared so far
#[derive(Clone, Copy)]
pub struct Scope<'s> {
    pub owner: &'s TypeHandle,
    pub type_params: &'s [TypeParam],
    pub locals: Option<&'s LocalScope>,
}

impl<'s> Scope<'s> {
    pub fn of_type(owner: &'s TypeHandle) -> Self {
        Self { owner, type_params: &[], locals: None }
    }

    pub fn of_method(method: &'s MethodHandle) -> Self {
        Self { owner: &method.owner, type_params: &method.decl.type_params, locals: None }
    }

    pub fn with_locals(self, locals: &'s LocalScope) -> Self {
        Self { locals: Some(locals), ..self }
    }
}

/// Locals visible in a method body. A known local of unknown type is kept as
/// `None` so that it still shadows fields of the same name.
#[derive(Debug, Clone, Default)]
pub struct LocalScope {
    vars: HashMap<String, Option<ResolvedType>>,
}

impl LocalScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare(&mut self, name: &str, ty: Option<ResolvedType>) {
        self.vars.insert(name.to_string(), ty);
    }

    pub fn lookup(&self, name: &str) -> Option<&Option<ResolvedType>> {
        self.vars.get(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Strict,
    Loose,
    Varargs,
}

/// Best-effort name, type and call resolution against a [`TypeTable`]
///
/// Every query answers `None` instead of failing; callers fall back to
/// structural heuristics.
pub struct SymbolResolver<'a> {
    types: &'a TypeTable,
    level: LanguageLevel,
}

impl<'a> SymbolResolver<'a> {
    pub fn new(types: &'a TypeTable, level: LanguageLevel) -> Self {
        Self { types, level }
    }

    pub fn types(&self) -> &'a TypeTable {
        self.types
    }

    pub fn level(&self) -> LanguageLevel {
        self.level
    }

    pub fn lookup(&self, qualified_name: &str) -> Option<&'a TypeHandle> {
        self.types.get(qualified_name)
    }

    // ---- type names ----

    /// Qualified name for a type name as written inside `scope`
    pub fn resolve_type_name(&self, name: &str, scope: &Scope<'_>) -> Option<String> {
        let Some((head, rest)) = name.split_once('.') else {
            return self.resolve_simple_name(name, scope.owner);
        };

        if self.types.contains(name) {
            return Some(name.to_string());
        }
        if let Some(head) = self.resolve_simple_name(head, scope.owner) {
            let nested = format!("{}.{}", head, rest);
            if self.types.contains(&nested) {
                return Some(nested);
            }
        }
        // Presumably already qualified, just not on the class path
        Some(name.to_string())
    }

    fn resolve_simple_name(&self, name: &str, owner: &TypeHandle) -> Option<String> {
        let innermost_first = std::iter::once(&owner.decl).chain(owner.enclosing.iter().rev());
        for decl in innermost_first {
            if decl.name == name {
                return Some(decl.qualified_name.clone());
            }
            if let Some(member) = decl.members.iter().find(|member| member.name == name) {
                return Some(member.qualified_name.clone());
            }
        }

        let unit = &owner.unit;
        if let Some(decl) = unit.types.iter().find(|decl| decl.name == name) {
            return Some(decl.qualified_name.clone());
        }

        let single = unit
            .imports
            .iter()
            .find(|import| !import.is_static && !import.wildcard && import.simple_name() == name);
        if let Some(import) = single {
            return Some(import.path.clone());
        }

        let same_package = unit.qualify(name);
        if self.types.contains(&same_package) {
            return Some(same_package);
        }

        let on_demand = unit
            .imports
            .iter()
            .filter(|import| !import.is_static && import.wildcard)
            .map(|import| format!("{}.{}", import.path, name))
            .find(|candidate| self.types.contains(candidate));
        if on_demand.is_some() {
            return on_demand;
        }

        let implicit = format!("java.lang.{}", name);
        self.types.contains(&implicit).then_some(implicit)
    }

    pub fn resolve_type_ref(&self, ty: &TypeRef, scope: &Scope<'_>) -> ResolvedType {
        self.resolve_type_ref_at(ty, scope, 0)
    }

    fn resolve_type_ref_at(&self, ty: &TypeRef, scope: &Scope<'_>, depth: usize) -> ResolvedType {
        let base = if ty.args.is_empty() && PRIMITIVES.contains(&ty.name.as_str()) {
            ResolvedType::Primitive(ty.name.clone())
        } else if let Some(param) = self.type_param(&ty.name, scope) {
            // Bounds are only followed one level deep, `T extends Comparable<T>` would not end
            let bound = if depth == 0 {
                param
                    .bounds
                    .first()
                    .map(|bound| Box::new(self.resolve_type_ref_at(bound, scope, depth + 1)))
            } else {
                None
            };
            ResolvedType::Variable { name: ty.name.clone(), bound }
        } else {
            ResolvedType::Reference {
                name: self.resolve_type_name(&ty.name, scope).unwrap_or_else(|| ty.name.clone()),
                args: ty
                    .args
                    .iter()
                    .map(|arg| self.resolve_type_ref_at(arg, scope, depth))
                    .collect(),
            }
        };

        (0..ty.array_dims).fold(base, |component, _| ResolvedType::Array(Box::new(component)))
    }

    fn type_param<'s>(&self, name: &str, scope: &Scope<'s>) -> Option<&'s TypeParam> {
        let owner = scope.owner;
        scope
            .type_params
            .iter()
            .chain(owner.decl.type_params.iter())
            .chain(owner.enclosing.iter().rev().flat_map(|outer| outer.type_params.iter()))
            .find(|param| param.name == name)
    }

    /// A method declaration with its parameter and return types resolved
    pub fn resolve_declaration(&self, method: &MethodHandle) -> ResolvedMethod {
        let scope = Scope::of_method(method);
        let decl = &method.decl;
        let owner = &method.owner.decl;

        ResolvedMethod {
            declaration: method.clone(),
            declaring_type: owner.qualified_name.clone(),
            name: decl.name.clone(),
            params: decl
                .params
                .iter()
                .map(|param| ResolvedParam {
                    ty: self.resolve_type_ref(&param.ty, &scope),
                    varargs: param.varargs,
                })
                .collect(),
            return_type: decl.return_type.as_ref().map(|ty| self.resolve_type_ref(ty, &scope)),
            access: decl.modifiers.access,
            is_abstract: decl.modifiers.is_abstract
                || (owner.is_interface() && decl.body.is_none() && !decl.modifiers.is_static),
        }
    }

    /// Declared type of a local, inferring `var` from its initializer where the level allows it
    pub fn local_type(&self, local: &LocalVar, scope: &Scope<'_>) -> Option<ResolvedType> {
        match &local.ty {
            Some(ty) if ty.is_var() && self.level.supports_local_type_inference() => local
                .init
                .as_ref()
                .and_then(|init| self.type_of(init, scope)),
            Some(ty) => Some(self.resolve_type_ref(ty, scope)),
            None => None,
        }
    }

    // ---- hierarchy ----

    /// Resolved superclass and directly implemented (or extended) interfaces
    pub fn direct_supertypes(&self, handle: &TypeHandle) -> (Option<String>, Vec<String>) {
        let scope = Scope::of_type(handle);
        let resolve = |ty: &TypeRef| self.resolve_type_name(&ty.name, &scope).unwrap_or_else(|| ty.name.clone());
        let decl = &handle.decl;

        if decl.is_interface() {
            return (None, decl.extends.iter().map(resolve).collect());
        }

        let superclass = decl
            .extends
            .first()
            .map(resolve)
            .or_else(|| (decl.qualified_name != OBJECT).then(|| OBJECT.to_string()));
        (superclass, decl.implements.iter().map(resolve).collect())
    }

    /// The type itself, its superclass chain, then every interface breadth first
    pub fn hierarchy(&self, qualified_name: &str) -> Vec<&'a TypeHandle> {
        let mut visited = HashSet::new();
        let mut ordered = Vec::new();
        let mut interfaces = VecDeque::new();

        let mut next = Some(qualified_name.to_string());
        while let Some(name) = next.take() {
            if !visited.insert(name.clone()) {
                break;
            }
            let Some(handle) = self.types.get(&name) else {
                break;
            };
            let (superclass, implemented) = self.direct_supertypes(handle);
            ordered.push(handle);
            interfaces.extend(implemented);
            next = superclass;
        }

        while let Some(name) = interfaces.pop_front() {
            if !visited.insert(name.clone()) {
                continue;
            }
            if let Some(handle) = self.types.get(&name) {
                let (_, extended) = self.direct_supertypes(handle);
                ordered.push(handle);
                interfaces.extend(extended);
            }
        }

        if visited.insert(OBJECT.to_string()) {
            ordered.extend(self.types.get(OBJECT));
        }
        ordered
    }

    pub fn is_subtype(&self, sub: &str, sup: &str) -> bool {
        sub == sup
            || sup == OBJECT
            || self.hierarchy(sub).iter().any(|handle| handle.qualified_name() == sup)
    }

    // ---- expressions ----

    /// Static type of an expression, if it can be determined
    pub fn type_of(&self, expr: &Expr, scope: &Scope<'_>) -> Option<ResolvedType> {
        match expr {
            Expr::Literal(literal) => Some(match literal {
                Literal::String(_) => ResolvedType::reference(STRING),
                Literal::Int => ResolvedType::primitive("int"),
                Literal::Long => ResolvedType::primitive("long"),
                Literal::Float => ResolvedType::primitive("float"),
                Literal::Double => ResolvedType::primitive("double"),
                Literal::Bool => ResolvedType::primitive("boolean"),
                Literal::Char => ResolvedType::primitive("char"),
                Literal::Null => ResolvedType::Null,
            }),
            Expr::Name(name) => self.type_of_name(name, scope),
            Expr::This => Some(ResolvedType::reference(scope.owner.qualified_name())),
            Expr::Super => self.direct_supertypes(scope.owner).0.map(ResolvedType::reference),
            Expr::FieldAccess { target, field } => self.type_of_field_access(expr, target, field, scope),
            Expr::MethodCall(call) => self.try_resolve_method_call(call, scope)?.return_type,
            Expr::New { ty, .. } | Expr::Cast { ty, .. } => Some(self.resolve_type_ref(ty, scope)),
            Expr::ClassLiteral(ty) => Some(ResolvedType::Reference {
                name: CLASS.to_string(),
                args: vec![self.resolve_type_ref(ty, scope)],
            }),
            Expr::Binary { op, left, right } => self.type_of_binary(op, left, right, scope),
            Expr::Unary { op, operand } => match op.as_str() {
                "!" => Some(ResolvedType::primitive("boolean")),
                _ => self.type_of(operand, scope),
            },
            Expr::Assign { target, .. } => self.type_of(target, scope),
            Expr::Conditional { then, otherwise, .. } => self
                .type_of(then, scope)
                .filter(|ty| *ty != ResolvedType::Null)
                .or_else(|| self.type_of(otherwise, scope)),
            Expr::InstanceOf { .. } => Some(ResolvedType::primitive("boolean")),
            Expr::ArrayAccess { array, .. } => match self.type_of(array, scope)? {
                ResolvedType::Array(component) => Some(*component),
                _ => None,
            },
            Expr::Lambda(_) | Expr::Compound(_) => None,
        }
    }

    fn type_of_name(&self, name: &str, scope: &Scope<'_>) -> Option<ResolvedType> {
        if let Some(local) = scope.locals.and_then(|locals| locals.lookup(name)) {
            return local.clone();
        }

        if let Some(ty) = self.field_type(scope.owner.qualified_name(), name) {
            return Some(ty);
        }
        for outer in scope.owner.enclosing.iter().rev() {
            if let Some(ty) = self.field_type(&outer.qualified_name, name) {
                return Some(ty);
            }
        }

        // A type name used as the receiver of a static member
        let qualified_name = self.resolve_type_name(name, scope)?;
        self.types
            .contains(&qualified_name)
            .then(|| ResolvedType::reference(qualified_name))
    }

    fn field_type(&self, qualified_name: &str, field: &str) -> Option<ResolvedType> {
        for handle in self.hierarchy(qualified_name) {
            let declared = handle
                .decl
                .fields
                .iter()
                .find(|decl| decl.names.iter().any(|name| name == field));
            if let Some(decl) = declared {
                return Some(self.resolve_type_ref(&decl.ty, &Scope::of_type(handle)));
            }
        }
        None
    }

    fn type_of_field_access(
        &self,
        expr: &Expr,
        target: &Expr,
        field: &str,
        scope: &Scope<'_>,
    ) -> Option<ResolvedType> {
        if let Some(target_type) = self.type_of(target, scope) {
            if matches!(target_type, ResolvedType::Array(_)) && field == "length" {
                return Some(ResolvedType::primitive("int"));
            }
            if let Some(handle) = target_type.erasure().and_then(|name| self.types.get(name)) {
                if let Some(ty) = self.field_type(handle.qualified_name(), field) {
                    return Some(ty);
                }
                let nested = format!("{}.{}", handle.qualified_name(), field);
                if self.types.contains(&nested) {
                    return Some(ResolvedType::reference(nested));
                }
                // Enum constants are not lowered as fields
                if handle.decl.kind == TypeKind::Enum {
                    return Some(ResolvedType::reference(handle.qualified_name()));
                }
            }
        }

        let dotted = expr.dotted_name()?;
        let qualified_name = self.resolve_type_name(&dotted, scope)?;
        self.types
            .contains(&qualified_name)
            .then(|| ResolvedType::reference(qualified_name))
    }

    fn type_of_binary(&self, op: &str, left: &Expr, right: &Expr, scope: &Scope<'_>) -> Option<ResolvedType> {
        match op {
            "==" | "!=" | "<" | ">" | "<=" | ">=" | "&&" | "||" => Some(ResolvedType::primitive("boolean")),
            _ => {
                let left = self.type_of(left, scope);
                let right = self.type_of(right, scope);
                let is_string = |ty: &Option<ResolvedType>| ty.as_ref().and_then(ResolvedType::erasure) == Some(STRING);
                if op == "+" && (is_string(&left) || is_string(&right)) {
                    return Some(ResolvedType::reference(STRING));
                }
                let (left, right) = (unboxed(left.as_ref()?)?, unboxed(right.as_ref()?)?);
                if left == "boolean" && right == "boolean" {
                    return Some(ResolvedType::primitive("boolean"));
                }
                let promoted = ["double", "float", "long"]
                    .into_iter()
                    .find(|wide| left == *wide || right == *wide)
                    .unwrap_or("int");
                Some(ResolvedType::primitive(promoted))
            }
        }
    }

    // ---- calls ----

    /// Declaration a call expression binds to, with the receiver's type
    /// arguments substituted into its return type
    pub fn try_resolve_method_call(&self, call: &MethodCall, scope: &Scope<'_>) -> Option<ResolvedMethod> {
        let mut candidates = Vec::new();
        let mut seen = HashSet::new();

        let receiver_type = match call.receiver.as_deref() {
            None => {
                let owners = std::iter::once(scope.owner.qualified_name().to_string())
                    .chain(scope.owner.enclosing.iter().rev().map(|outer| outer.qualified_name.clone()));
                for owner in owners {
                    self.collect_candidates(&owner, &call.name, &mut candidates, &mut seen);
                    if !candidates.is_empty() {
                        break;
                    }
                }
                if candidates.is_empty() {
                    for owner in self.static_import_owners(&call.name, scope.owner) {
                        self.collect_candidates(&owner, &call.name, &mut candidates, &mut seen);
                    }
                }
                None
            }
            Some(Expr::Super) => {
                let (superclass, interfaces) = self.direct_supertypes(scope.owner);
                for owner in superclass.iter().chain(interfaces.iter()) {
                    self.collect_candidates(owner, &call.name, &mut candidates, &mut seen);
                }
                None
            }
            Some(receiver) => {
                let receiver_type = self.type_of(receiver, scope)?;
                let erasure = receiver_type.erasure()?;
                self.collect_candidates(erasure, &call.name, &mut candidates, &mut seen);
                Some(receiver_type)
            }
        };

        let arguments: Vec<Option<ResolvedType>> = call.args.iter().map(|arg| self.type_of(arg, scope)).collect();
        let selected = self.select_overload(&candidates, &arguments)?;
        Some(substitute_receiver_args(self, selected, receiver_type.as_ref()))
    }

    fn collect_candidates(
        &self,
        qualified_name: &str,
        name: &str,
        found: &mut Vec<ResolvedMethod>,
        seen: &mut HashSet<String>,
    ) {
        for handle in self.hierarchy(qualified_name) {
            for method in handle.methods() {
                if method.decl.is_constructor() || method.decl.name != name {
                    continue;
                }
                let resolved = self.resolve_declaration(&method);
                if seen.insert(resolved.signature()) {
                    found.push(resolved);
                }
            }
        }
    }

    fn static_import_owners(&self, name: &str, owner: &TypeHandle) -> Vec<String> {
        owner
            .unit
            .imports
            .iter()
            .filter(|import| import.is_static)
            .filter_map(|import| {
                if import.wildcard {
                    Some(import.path.clone())
                } else if import.simple_name() == name {
                    import.path.rsplit_once('.').map(|(owner, _)| owner.to_string())
                } else {
                    None
                }
            })
            .collect()
    }

    fn select_overload(&self, candidates: &[ResolvedMethod], arguments: &[Option<ResolvedType>]) -> Option<ResolvedMethod> {
        for phase in [Phase::Strict, Phase::Loose, Phase::Varargs] {
            let applicable: Vec<&ResolvedMethod> = candidates
                .iter()
                .filter(|candidate| self.is_applicable(candidate, arguments, phase))
                .collect();
            if applicable.is_empty() {
                continue;
            }

            let most_specific = applicable.iter().find(|candidate| {
                applicable.iter().all(|other| {
                    std::ptr::eq(**candidate, *other) || self.is_more_specific(candidate, other, phase)
                })
            });
            return most_specific.or(applicable.first()).map(|method| (*method).clone());
        }
        None
    }

    fn is_applicable(&self, method: &ResolvedMethod, arguments: &[Option<ResolvedType>], phase: Phase) -> bool {
        let accepts = |argument: &Option<ResolvedType>, param: &ResolvedType, loose: bool| {
            argument.as_ref().map_or(true, |argument| self.is_assignable(argument, param, loose))
        };

        match phase {
            Phase::Strict | Phase::Loose => {
                method.params.len() == arguments.len()
                    && method
                        .params
                        .iter()
                        .zip(arguments)
                        .all(|(param, argument)| accepts(argument, &param.effective_type(), phase == Phase::Loose))
            }
            Phase::Varargs => {
                let Some((variable, fixed)) = method.params.split_last() else {
                    return false;
                };
                variable.varargs
                    && arguments.len() >= fixed.len()
                    && fixed
                        .iter()
                        .zip(arguments)
                        .all(|(param, argument)| accepts(argument, &param.ty, true))
                    && arguments[fixed.len()..]
                        .iter()
                        .all(|argument| accepts(argument, &variable.ty, true))
            }
        }
    }

    fn is_more_specific(&self, method: &ResolvedMethod, other: &ResolvedMethod, phase: Phase) -> bool {
        if phase != Phase::Varargs && method.params.len() != other.params.len() {
            return false;
        }
        method.params.iter().zip(&other.params).all(|(mine, theirs)| {
            let (mine, theirs) = match phase {
                Phase::Varargs => (mine.ty.clone(), theirs.ty.clone()),
                _ => (mine.effective_type(), theirs.effective_type()),
            };
            self.is_assignable(&mine, &theirs, phase != Phase::Strict)
        })
    }

    /// Assignment compatibility, with boxing and unboxing only when `loose`
    pub fn is_assignable(&self, from: &ResolvedType, to: &ResolvedType, loose: bool) -> bool {
        use ResolvedType::*;

        match (from, to) {
            (Primitive(_), Variable { .. }) => loose,
            (_, Variable { .. }) => true,
            (Null, to) => !matches!(to, Primitive(_)),
            (Primitive(from), Primitive(to)) => widens(from, to),
            (Primitive(from), Reference { .. }) => {
                loose && boxed(from).map_or(false, |boxed| self.is_assignable(&ResolvedType::reference(boxed), to, false))
            }
            (Reference { .. }, Primitive(to)) => loose && unboxed(from).map_or(false, |from| widens(from, to)),
            (Variable { bound, .. }, to) => match bound {
                Some(bound) => self.is_assignable(bound, to, loose),
                None => to.erasure() == Some(OBJECT),
            },
            (Reference { name: from, .. }, Reference { name: to, .. }) => self.is_subtype(from, to),
            (Array(from), Array(to)) => match (from.as_ref(), to.as_ref()) {
                (Primitive(from), Primitive(to)) => from == to,
                (from, to) => self.is_assignable(from, to, false),
            },
            (Array(_), Reference { name, .. }) => {
                name == OBJECT || name == "java.lang.Cloneable" || name == "java.io.Serializable"
            }
            _ => false,
        }
    }
}

fn substitute_receiver_args(
    resolver: &SymbolResolver<'_>,
    mut method: ResolvedMethod,
    receiver: Option<&ResolvedType>,
) -> ResolvedMethod {
    let Some(ResolvedType::Reference { name, args }) = receiver else {
        return method;
    };
    if args.is_empty() || *name != method.declaring_type {
        return method;
    }
    let Some(handle) = resolver.lookup(name) else {
        return method;
    };

    let bindings: HashMap<&str, &ResolvedType> = handle
        .decl
        .type_params
        .iter()
        .map(|param| param.name.as_str())
        .zip(args.iter())
        .collect();
    method.return_type = method.return_type.map(|ty| substitute(&ty, &bindings));
    method
}

fn substitute(ty: &ResolvedType, bindings: &HashMap<&str, &ResolvedType>) -> ResolvedType {
    match ty {
        ResolvedType::Variable { name, .. } => match bindings.get(name.as_str()) {
            Some(bound) => (*bound).clone(),
            None => ty.clone(),
        },
        ResolvedType::Reference { name, args } => ResolvedType::Reference {
            name: name.clone(),
            args: args.iter().map(|arg| substitute(arg, bindings)).collect(),
        },
        ResolvedType::Array(component) => ResolvedType::Array(Box::new(substitute(component, bindings))),
        other => other.clone(),
    }
}

fn boxed(primitive: &str) -> Option<&'static str> {
    BOXES.iter().find(|(name, _)| *name == primitive).map(|(_, boxed)| *boxed)
}

fn unboxed(ty: &ResolvedType) -> Option<&str> {
    match ty {
        ResolvedType::Primitive(name) => Some(name),
        ResolvedType::Reference { name, .. } => {
            BOXES.iter().find(|(_, boxed)| boxed == name).map(|(primitive, _)| *primitive)
        }
        _ => None,
    }
}

fn widens(from: &str, to: &str) -> bool {
    if from == to {
        return true;
    }
    let wider: &[&str] = match from {
        "byte" => &["short", "int", "long", "float", "double"],
        "short" | "char" => &["int", "long", "float", "double"],
        "int" => &["long", "float", "double"],
        "long" => &["float", "double"],
        "float" => &["double"],
        _ => &[],
    };
    wider.contains(&to)
}
