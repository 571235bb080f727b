// src/core/call_graph/invocation_resolver.rs
use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use super::automation_target::AutomationTarget;
use super::collector::InvocationCollector;
use super::invocation::{AnalysisReport, ArgumentType, InvokedMethod};
use crate::core::file_index::FileIndex;
use crate::core::parser::ParserContext;
use crate::core::patterns::Patterns;
use crate::core::symbols::{LocalScope, MethodHandle, ResolvedMethod, Scope, SymbolResolver, TypeHandle};
use crate::core::syntax::{CompilationUnit, Expr, Lambda, MethodCall, Stmt};

/// State of the method body currently being walked
struct Body {
    method: MethodHandle,
    locals: LocalScope,
    /// Local variable name to the qualified type of its `new T(...)` initializer
    bindings: HashMap<String, String>,
}

impl Body {
    fn new(method: &MethodHandle, symbols: &SymbolResolver<'_>) -> Self {
        let mut locals = LocalScope::new();
        let resolved = symbols.resolve_declaration(method);
        for (param, ty) in method.decl.params.iter().zip(&resolved.params) {
            locals.declare(&param.name, Some(ty.effective_type()));
        }
        Self { method: method.clone(), locals, bindings: HashMap::new() }
    }

    /// Runtime type recorded for a call of the form `identifier.name(args)`
    fn receiver_binding(&self, call: &MethodCall) -> Option<&str> {
        call.receiver_identifier()
            .and_then(|name| self.bindings.get(name))
            .map(String::as_str)
    }
}

/// Walks entry point bodies and decides, for every call, which method the
/// call steps into
///
/// The resolver never fails: anything it cannot resolve is logged and
/// skipped so the walk of the enclosing body continues.
pub struct InvocationResolver<'r> {
    context: &'r ParserContext,
    file_index: &'r dyn FileIndex,
    patterns: &'r Patterns,
    symbols: SymbolResolver<'r>,
    collector: InvocationCollector,
}

impl<'r> InvocationResolver<'r> {
    pub fn new(
        context: &'r ParserContext,
        file_index: &'r dyn FileIndex,
        patterns: &'r Patterns,
        collector: InvocationCollector,
    ) -> Self {
        Self {
            context,
            file_index,
            patterns,
            symbols: context.symbols(),
            collector,
        }
    }

    pub fn symbols(&self) -> &SymbolResolver<'r> {
        &self.symbols
    }

    pub fn collector(&self) -> &InvocationCollector {
        &self.collector
    }

    pub fn into_report(self) -> AnalysisReport {
        self.collector.into_report()
    }

    /// Records one annotated entry point and the tree reachable from its body
    pub fn trace_method(&mut self, method: &MethodHandle, step_text: &str, automation_target: Option<AutomationTarget>) {
        let signature = self.symbols.resolve_declaration(method).qualified_signature();
        self.collector.begin_root(&signature, step_text, automation_target);
        self.walk_method(method);
        self.collector.end_root();
    }

    /// Records one lambda registration made in `constructor`
    pub fn trace_lambda(&mut self, constructor: &MethodHandle, step_text: &str, lambda: &Lambda) {
        let signature = self.symbols.resolve_declaration(constructor).qualified_signature();
        self.collector.begin_root(&signature, step_text, None);

        let mut body = Body::new(constructor, &self.symbols);
        self.walk_lambda(&mut body, lambda);
        self.collector.end_root();
    }

    fn walk_method(&mut self, method: &MethodHandle) {
        let Some(statements) = method.decl.body.as_ref() else {
            return;
        };
        let mut body = Body::new(method, &self.symbols);
        self.walk_statements(&mut body, statements);
    }

    fn walk_lambda(&mut self, body: &mut Body, lambda: &Lambda) {
        let outer = body.locals.clone();
        for param in &lambda.params {
            let ty = {
                let scope = Scope::of_method(&body.method).with_locals(&body.locals);
                self.symbols.local_type(param, &scope)
            };
            body.locals.declare(&param.name, ty);
        }
        self.walk_statements(body, &lambda.body);
        body.locals = outer;
    }

    fn walk_statements(&mut self, body: &mut Body, statements: &[Stmt]) {
        for statement in statements {
            match statement {
                Stmt::Expr(expr) => self.walk_expr(body, expr),
                Stmt::LocalVar(local) => {
                    if let Some(init) = &local.init {
                        self.walk_expr(body, init);
                    }

                    let (ty, binding) = {
                        let scope = Scope::of_method(&body.method).with_locals(&body.locals);
                        let binding = match &local.init {
                            Some(Expr::New { ty, .. }) => Some(self.symbols.qualified_name_of(ty, &scope)),
                            _ => None,
                        };
                        (self.symbols.local_type(local, &scope), binding)
                    };

                    body.locals.declare(&local.name, ty);
                    match binding {
                        Some(qualified_name) => {
                            body.bindings.insert(local.name.clone(), qualified_name);
                        }
                        None => {
                            body.bindings.remove(&local.name);
                        }
                    }
                }
            }
        }
    }

    fn walk_expr(&mut self, body: &mut Body, expr: &Expr) {
        match expr {
            Expr::MethodCall(call) => self.dispatch(body, call),
            Expr::New { args, .. } => {
                for arg in args {
                    self.walk_expr(body, arg);
                }
            }
            Expr::Lambda(lambda) => self.walk_lambda(body, lambda),
            Expr::FieldAccess { target, .. } => self.walk_expr(body, target),
            Expr::Cast { expr, .. } | Expr::InstanceOf { expr } => self.walk_expr(body, expr),
            Expr::Unary { operand, .. } => self.walk_expr(body, operand),
            Expr::Binary { left, right, .. } => {
                self.walk_expr(body, left);
                self.walk_expr(body, right);
            }
            Expr::Assign { target, value } => {
                self.walk_expr(body, target);
                self.walk_expr(body, value);
            }
            Expr::Conditional { condition, then, otherwise } => {
                self.walk_expr(body, condition);
                self.walk_expr(body, then);
                self.walk_expr(body, otherwise);
            }
            Expr::ArrayAccess { array, index } => {
                self.walk_expr(body, array);
                self.walk_expr(body, index);
            }
            Expr::Compound(statements) => self.walk_statements(body, statements),
            Expr::Name(_) | Expr::This | Expr::Super | Expr::Literal(_) | Expr::ClassLiteral(_) => {}
        }
    }

    // ---- dispatch ----

    fn dispatch(&mut self, body: &Body, call: &MethodCall) {
        let resolved = {
            let scope = Scope::of_method(&body.method).with_locals(&body.locals);
            self.symbols.try_resolve_method_call(call, &scope)
        };

        match resolved {
            Some(method) => self.dispatch_resolved(body, call, &method),
            None => self.dispatch_unresolved(body, call),
        }
    }

    /// Structural fallback: a unique method with the call's name and arity in
    /// the unit of the receiver's bound type, or else the current unit
    fn dispatch_unresolved(&mut self, body: &Body, call: &MethodCall) {
        let unit = body
            .receiver_binding(call)
            .and_then(|qualified_name| self.compilation_unit_of(qualified_name))
            .unwrap_or_else(|| body.method.owner.unit.clone());

        let mut candidates = self.symbols.structural_candidates(&unit, call);
        if candidates.len() == 1 {
            if let Some(method) = candidates.pop() {
                debug!("Matched {} structurally to {}", call.text, method.qualified_signature());
                self.dispatch_resolved(body, call, &method);
                return;
            }
        }
        warn!("⚠️  Unable to resolve suitable type for {}", call.text);
    }

    fn dispatch_resolved(&mut self, body: &Body, call: &MethodCall, method: &ResolvedMethod) {
        if !method.is_local() {
            self.collect_leaf(InvokedMethod::from_resolved(method, Vec::new(), Vec::new()));
            return;
        }

        let arguments = self.extract_arguments(body, call, method);
        let target = &method.declaration.owner;

        match body.receiver_binding(call) {
            Some(runtime) if target.decl.is_interface() => {
                self.dispatch_interface(runtime, method, arguments);
            }
            Some(runtime) if runtime != target.qualified_name() && self.symbols.is_subtype(runtime, target.qualified_name()) => {
                self.dispatch_override(runtime, call, method, arguments);
            }
            _ => self.dispatch_class(call, method, arguments),
        }
    }

    /// Call through an interface-typed variable bound to a concrete class
    fn dispatch_interface(&mut self, runtime: &str, method: &ResolvedMethod, arguments: Vec<ArgumentType>) {
        let signature = method.signature();
        match self.symbols.find_in_hierarchy(runtime, &signature) {
            Some(concrete) if concrete.declaration.decl.body.is_some() => {
                let interface_definitions = self.symbols.interface_definitions_of(&concrete.declaration.owner, &signature);
                self.collect_and_step_into(&concrete, interface_definitions, arguments);
            }
            _ => {
                debug!("No implementation of {} in {}", signature, runtime);
                let interface_definitions = self.symbols.interface_definitions_of(&method.declaration.owner, &signature);
                self.collect_leaf(InvokedMethod::from_resolved(method, interface_definitions, arguments));
            }
        }
    }

    /// Variable statically typed as a supertype but bound to a subtype
    fn dispatch_override(&mut self, runtime: &str, call: &MethodCall, method: &ResolvedMethod, arguments: Vec<ArgumentType>) {
        let signature = method.signature();
        match self.symbols.find_override(runtime, &method.declaring_type, &signature) {
            Some(concrete) => {
                let interface_definitions = self.symbols.interface_definitions_of(&concrete.declaration.owner, &signature);
                self.collect_and_step_into(&concrete, interface_definitions, arguments);
            }
            None => self.dispatch_class(call, method, arguments),
        }
    }

    fn dispatch_class(&mut self, call: &MethodCall, method: &ResolvedMethod, arguments: Vec<ArgumentType>) {
        let target = &method.declaration.owner;
        let signature = method.signature();
        let interface_definitions = self.symbols.interface_definitions_of(target, &signature);

        if method.declaration.decl.body.is_none() {
            if method.is_abstract && !target.decl.is_interface() {
                self.expand_abstract(target, method, arguments);
            } else {
                self.collect_leaf(InvokedMethod::from_resolved(method, interface_definitions, arguments));
            }
            return;
        }

        let actual = self.collector.actual_type_for(&method.declaring_type);
        if actual != method.declaring_type && !self.patterns.is_super_call(&call.text) {
            if let Some(refined) = self.symbols.find_override(&actual, &method.declaring_type, &signature) {
                debug!("Refined {} to {}", method.qualified_signature(), refined.qualified_signature());
                let interface_definitions = self.symbols.interface_definitions_of(&refined.declaration.owner, &signature);
                self.collect_and_step_into(&refined, interface_definitions, arguments);
                return;
            }
        }

        self.collect_and_step_into(method, interface_definitions, arguments);
    }

    /// Steps into the override of an abstract method in every direct subclass
    fn expand_abstract(&mut self, target: &TypeHandle, method: &ResolvedMethod, arguments: Vec<ArgumentType>) {
        let signature = method.signature();
        let overrides: Vec<ResolvedMethod> = self
            .symbols
            .direct_subclasses(target.qualified_name())
            .into_iter()
            .filter_map(|derived| self.symbols.find_declared_method(derived, &signature))
            .collect();

        if overrides.is_empty() {
            debug!("No override of abstract {}", method.qualified_signature());
            self.collect_leaf(InvokedMethod::from_resolved(method, Vec::new(), arguments));
            return;
        }

        for concrete in overrides {
            let interface_definitions = self.symbols.interface_definitions_of(&concrete.declaration.owner, &signature);
            self.collect_and_step_into(&concrete, interface_definitions, arguments.clone());
        }
    }

    fn collect_and_step_into(&mut self, method: &ResolvedMethod, interface_definitions: Vec<String>, arguments: Vec<ArgumentType>) {
        let invoked = InvokedMethod::from_resolved(method, interface_definitions, arguments);
        if !method.is_local() || method.declaration.decl.body.is_none() {
            self.collect_leaf(invoked);
            return;
        }
        if self.collector.is_already_collected(&invoked) {
            debug!("Recursive call to {}", invoked.signature);
            self.collect_leaf(invoked);
            return;
        }

        self.collector.collect(invoked);
        self.walk_method(&method.declaration);
        self.collector.step_out();
    }

    fn collect_leaf(&mut self, invoked: InvokedMethod) {
        self.collector.collect(invoked);
        self.collector.step_out();
    }

    /// Declared and actual type of every argument; the actual type prefers the
    /// `new T(...)` binding of a bare identifier, then the static type
    fn extract_arguments(&self, body: &Body, call: &MethodCall, method: &ResolvedMethod) -> Vec<ArgumentType> {
        let scope = Scope::of_method(&body.method).with_locals(&body.locals);

        call.args
            .iter()
            .enumerate()
            .filter_map(|(index, arg)| {
                let param = method.params.get(index).or_else(|| method.params.last().filter(|last| last.varargs))?;
                let declared = param.ty.describe();

                let bound = match arg {
                    Expr::Name(name) => body.bindings.get(name).cloned(),
                    _ => None,
                };
                let actual = bound
                    .or_else(|| self.symbols.try_resolve_type(arg, &scope).map(|ty| ty.describe()))
                    .unwrap_or_else(|| declared.clone());

                Some(ArgumentType { declared, actual })
            })
            .collect()
    }

    /// Unit declaring a type, located through the file index
    pub fn compilation_unit_of(&self, qualified_name: &str) -> Option<Arc<CompilationUnit>> {
        self.context.find_by_qualified_name(qualified_name, self.file_index)
    }
}
