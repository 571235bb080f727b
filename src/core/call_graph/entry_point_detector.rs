// src/core/call_graph/entry_point_detector.rs
use tracing::{debug, info, warn};

use super::automation_target::{AutomationTarget, OverloadHandling};
use super::invocation_resolver::InvocationResolver;
use super::strategies::{StepKeywordStrategy, StepStrategies};
use crate::core::patterns::Patterns;
use crate::core::symbols::{MethodHandle, Scope, SymbolResolver, TypeHandle};
use crate::core::syntax::{Annotation, Expr, MethodCall, Stmt};

/// Finds step definitions in a type and hands each one to the resolver
///
/// Step methods are recognized either by a WHEN annotation from a step
/// annotation package, or, for types implementing a registration interface,
/// by WHEN registrations made in the default constructor. Types implementing
/// any other interface have no entry points.
pub struct EntryPointDetector<'d> {
    patterns: &'d Patterns,
    strategies: &'d StepStrategies,
}

impl<'d> EntryPointDetector<'d> {
    pub fn new(patterns: &'d Patterns, strategies: &'d StepStrategies) -> Self {
        Self { patterns, strategies }
    }

    /// Traces every entry point declared in a top-level type
    ///
    /// Returns the number of root invocations recorded.
    pub fn detect(&self, ty: &TypeHandle, resolver: &mut InvocationResolver<'_>) -> usize {
        if let Some(language) = self.registration_language(ty, resolver.symbols()) {
            return self.detect_registrations(ty, &language, resolver);
        }
        if !ty.decl.implements.is_empty() {
            debug!("Skipping {}: implements no registration interface", ty.qualified_name());
            return 0;
        }
        self.detect_annotated(ty, resolver)
    }

    /// Language code of the first registration interface the type implements
    fn registration_language(&self, ty: &TypeHandle, symbols: &SymbolResolver<'_>) -> Option<String> {
        let scope = Scope::of_type(ty);
        ty.decl
            .implements
            .iter()
            .flat_map(|implemented| symbols.candidate_names(&implemented.name, &scope))
            .find_map(|qualified_name| self.patterns.registration_language(&qualified_name))
    }

    // ---- annotated step methods ----

    fn detect_annotated(&self, ty: &TypeHandle, resolver: &mut InvocationResolver<'_>) -> usize {
        let mut found = 0;
        for method in ty.methods().filter(|method| !method.decl.is_constructor()) {
            found += self.detect_annotated_method(&method, resolver);
        }

        let nested: Vec<TypeHandle> = ty
            .decl
            .members
            .iter()
            .filter_map(|member| resolver.symbols().lookup(&member.qualified_name))
            .cloned()
            .collect();
        for member in &nested {
            found += self.detect_annotated(member, resolver);
        }
        found
    }

    fn detect_annotated_method(&self, method: &MethodHandle, resolver: &mut InvocationResolver<'_>) -> usize {
        let scope = Scope::of_method(method);
        let symbols = resolver.symbols();

        let mut step = None;
        let mut automation_target = None;
        for annotation in &method.decl.annotations {
            let names = symbols.annotation_names(annotation, &scope);

            if names.iter().any(|name| self.patterns.is_automation_target(name)) {
                automation_target = self.automation_target(annotation, &scope, symbols, resolver);
                continue;
            }

            if step.is_none() && self.is_when_annotation(annotation, &names) {
                step = Some(annotation);
            }
        }

        let Some(step) = step else {
            return 0;
        };

        info!("✅ Found entry point: {}", method.decl.name);
        let step_text = step.value().and_then(Expr::as_string_literal).unwrap_or_default();
        resolver.trace_method(method, step_text, automation_target);
        1
    }

    fn is_when_annotation(&self, annotation: &Annotation, names: &[String]) -> bool {
        let language = names.iter().find_map(|name| {
            name.rsplit_once('.')
                .and_then(|(package, _)| self.patterns.step_language(package))
        });
        let Some(language) = language else {
            return false;
        };

        match self.strategies.for_language(&language) {
            Some(strategy) => strategy.is_when_step(annotation.simple_name()),
            None => {
                warn!("⚠️  No step keyword strategy for language '{}'", language);
                false
            }
        }
    }

    fn automation_target(
        &self,
        annotation: &Annotation,
        scope: &Scope<'_>,
        symbols: &SymbolResolver<'_>,
        resolver: &InvocationResolver<'_>,
    ) -> Option<AutomationTarget> {
        let declaring_type = match annotation.member("declaringType") {
            Some(Expr::ClassLiteral(ty)) => symbols.qualified_name_of(ty, scope),
            _ => {
                warn!("⚠️  Automation target without a declaringType class literal");
                return None;
            }
        };
        let target_method = annotation
            .member("targetMethod")
            .and_then(Expr::as_string_literal)
            .unwrap_or_default();
        let overload_handling = match annotation.member("overloadHandling") {
            Some(Expr::FieldAccess { field, .. }) => OverloadHandling::from_name(field),
            Some(Expr::Name(name)) => OverloadHandling::from_name(name),
            _ => OverloadHandling::default(),
        };

        let target_methods = resolver
            .compilation_unit_of(&declaring_type)
            .map(|unit| symbols.overload_signatures(&unit, target_method))
            .unwrap_or_default();
        debug!("Automation target {}.{} has {} overloads", declaring_type, target_method, target_methods.len());

        Some(AutomationTarget {
            declaring_type,
            target_methods,
            overload_handling,
        })
    }

    // ---- lambda registrations ----

    fn detect_registrations(&self, ty: &TypeHandle, language: &str, resolver: &mut InvocationResolver<'_>) -> usize {
        let Some(strategy) = self.strategies.for_language(language) else {
            warn!("⚠️  No step keyword strategy for language '{}'", language);
            return 0;
        };
        let Some(constructor) = ty.decl.default_constructor() else {
            warn!("⚠️  {} registers steps without a default constructor", ty.qualified_name());
            return 0;
        };
        let constructor = ty.method(constructor);
        let Some(body) = constructor.decl.body.as_ref() else {
            return 0;
        };

        info!("✅ Found entry point: {}", constructor.decl.name);
        let mut calls = Vec::new();
        collect_calls(body, &mut calls);

        let mut found = 0;
        for call in calls {
            if self.trace_registration(strategy, &constructor, call, resolver) {
                found += 1;
            }
        }
        found
    }

    fn trace_registration(
        &self,
        strategy: &dyn StepKeywordStrategy,
        constructor: &MethodHandle,
        call: &MethodCall,
        resolver: &mut InvocationResolver<'_>,
    ) -> bool {
        if !strategy.is_when_step(&call.name) || call.args.len() < 2 {
            return false;
        }

        let step_text = call.args.first().and_then(Expr::as_string_literal);
        let lambda = match call.args.last() {
            Some(Expr::Lambda(lambda)) => Some(lambda),
            _ => None,
        };
        match (step_text, lambda) {
            (Some(step_text), Some(lambda)) => {
                resolver.trace_lambda(constructor, step_text, lambda);
                true
            }
            _ => {
                warn!("⚠️  Used WHEN step notation is not supported: {}", call.text);
                false
            }
        }
    }
}

/// Every call in a body in textual order, without entering lambdas
fn collect_calls<'b>(statements: &'b [Stmt], found: &mut Vec<&'b MethodCall>) {
    for statement in statements {
        match statement {
            Stmt::Expr(expr) => collect_expr_calls(expr, found),
            Stmt::LocalVar(local) => {
                if let Some(init) = &local.init {
                    collect_expr_calls(init, found);
                }
            }
        }
    }
}

fn collect_expr_calls<'b>(expr: &'b Expr, found: &mut Vec<&'b MethodCall>) {
    match expr {
        Expr::MethodCall(call) => {
            if let Some(receiver) = &call.receiver {
                collect_expr_calls(receiver, found);
            }
            found.push(call);
            for arg in &call.args {
                collect_expr_calls(arg, found);
            }
        }
        Expr::New { args, .. } => {
            for arg in args {
                collect_expr_calls(arg, found);
            }
        }
        Expr::FieldAccess { target, .. } => collect_expr_calls(target, found),
        Expr::Cast { expr, .. } | Expr::InstanceOf { expr } => collect_expr_calls(expr, found),
        Expr::Unary { operand, .. } => collect_expr_calls(operand, found),
        Expr::Binary { left, right, .. } => {
            collect_expr_calls(left, found);
            collect_expr_calls(right, found);
        }
        Expr::Assign { target, value } => {
            collect_expr_calls(target, found);
            collect_expr_calls(value, found);
        }
        Expr::Conditional { condition, then, otherwise } => {
            collect_expr_calls(condition, found);
            collect_expr_calls(then, found);
            collect_expr_calls(otherwise, found);
        }
        Expr::ArrayAccess { array, index } => {
            collect_expr_calls(array, found);
            collect_expr_calls(index, found);
        }
        Expr::Compound(statements) => collect_calls(statements, found),
        Expr::Lambda(_) | Expr::Name(_) | Expr::This | Expr::Super | Expr::Literal(_) | Expr::ClassLiteral(_) => {}
    }
}
