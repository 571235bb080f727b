// src/core/languages/java.rs
use std::path::Path;
use std::sync::Arc;
use tracing::debug;
use tree_sitter::{Node, Parser};

use crate::core::syntax::{
    Access, Annotation, AnnotationArgs, CompilationUnit, Expr, FieldDecl, Import, Lambda, Literal,
    LocalVar, MethodCall, MethodDecl, MethodKind, Modifiers, Param, Stmt, TypeDecl, TypeKind,
    TypeParam, TypeRef,
};
use crate::error::{StepTraceError, Result};

/// Java front end: tree-sitter concrete tree in, owned syntax model out
pub struct JavaParser {
    parser: Parser,
}

impl JavaParser {
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        let java_language = tree_sitter_java::language();
        parser.set_language(&java_language)
            .map_err(|e| StepTraceError::Parser(format!("Failed to set Java language: {}", e)))?;

        Ok(Self { parser })
    }

    pub fn parse(&mut self, content: &str, file_path: &Path) -> Result<CompilationUnit> {
        let tree = self.parser.parse(content, None)
            .ok_or_else(|| StepTraceError::Parser(format!("Failed to parse {}", file_path.display())))?;

        let root = tree.root_node();
        if root.has_error() {
            debug!("Syntax errors in {}, continuing with the recovered tree", file_path.display());
        }

        let mut lowering = Lowering { source: content.as_bytes(), package: None };
        Ok(lowering.compilation_unit(root, file_path))
    }
}

const TYPE_DECLARATIONS: &[&str] = &[
    "class_declaration",
    "interface_declaration",
    "enum_declaration",
    "record_declaration",
];

const TYPE_NODES: &[&str] = &[
    "type_identifier",
    "scoped_type_identifier",
    "generic_type",
    "array_type",
    "integral_type",
    "floating_point_type",
    "boolean_type",
    "void_type",
    "annotated_type",
];

const EXPRESSIONS: &[&str] = &[
    "method_invocation",
    "object_creation_expression",
    "identifier",
    "this",
    "super",
    "field_access",
    "string_literal",
    "text_block",
    "decimal_integer_literal",
    "hex_integer_literal",
    "octal_integer_literal",
    "binary_integer_literal",
    "decimal_floating_point_literal",
    "hex_floating_point_literal",
    "true",
    "false",
    "character_literal",
    "null_literal",
    "class_literal",
    "lambda_expression",
    "method_reference",
    "cast_expression",
    "binary_expression",
    "unary_expression",
    "update_expression",
    "assignment_expression",
    "ternary_expression",
    "parenthesized_expression",
    "instanceof_expression",
    "array_access",
    "array_creation_expression",
    "switch_expression",
];

fn is_comment(node: &Node) -> bool {
    matches!(node.kind(), "line_comment" | "block_comment")
}

fn named_children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    let children: Vec<Node<'t>> = node
        .named_children(&mut cursor)
        .filter(|child| !is_comment(child))
        .collect();
    children
}

fn all_children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    let children: Vec<Node<'t>> = node.children(&mut cursor).collect();
    children
}

fn child_of_kind<'t>(node: Node<'t>, kind: &str) -> Option<Node<'t>> {
    all_children(node).into_iter().find(|child| child.kind() == kind)
}

fn line_of(node: Node) -> usize {
    node.start_position().row + 1
}

struct Lowering<'s> {
    source: &'s [u8],
    package: Option<String>,
}

impl<'s> Lowering<'s> {
    fn text(&self, node: Node) -> &'s str {
        node.utf8_text(self.source).unwrap_or("")
    }

    /// Node text without any whitespace, for names and types
    fn compact_text(&self, node: Node) -> String {
        self.text(node).chars().filter(|c| !c.is_whitespace()).collect()
    }

    fn compilation_unit(&mut self, root: Node, path: &Path) -> CompilationUnit {
        let children = named_children(root);

        self.package = children
            .iter()
            .find(|child| child.kind() == "package_declaration")
            .and_then(|declaration| {
                named_children(*declaration)
                    .into_iter()
                    .find(|child| matches!(child.kind(), "scoped_identifier" | "identifier"))
            })
            .map(|name| self.compact_text(name));

        let mut imports = Vec::new();
        let mut types = Vec::new();
        for child in children {
            match child.kind() {
                "import_declaration" => {
                    if let Some(import) = self.import(child) {
                        imports.push(import);
                    }
                }
                kind if TYPE_DECLARATIONS.contains(&kind) => {
                    if let Some(decl) = self.type_decl(child, None) {
                        types.push(Arc::new(decl));
                    }
                }
                _ => {}
            }
        }

        CompilationUnit {
            path: path.to_path_buf(),
            package: self.package.clone(),
            imports,
            types,
        }
    }

    fn import(&self, node: Node) -> Option<Import> {
        let children = all_children(node);
        let name = children
            .iter()
            .find(|child| matches!(child.kind(), "scoped_identifier" | "identifier"))?;

        Some(Import {
            path: self.compact_text(*name),
            is_static: children.iter().any(|child| child.kind() == "static"),
            wildcard: children.iter().any(|child| child.kind() == "asterisk"),
        })
    }

    fn type_decl(&self, node: Node, outer: Option<&str>) -> Option<TypeDecl> {
        let kind = match node.kind() {
            "class_declaration" => TypeKind::Class,
            "interface_declaration" => TypeKind::Interface,
            "enum_declaration" => TypeKind::Enum,
            "record_declaration" => TypeKind::Record,
            _ => return None,
        };
        let name = self.text(node.child_by_field_name("name")?).to_string();
        let qualified_name = match (outer, &self.package) {
            (Some(outer), _) => format!("{}.{}", outer, name),
            (None, Some(package)) => format!("{}.{}", package, name),
            (None, None) => name.clone(),
        };

        let (modifiers, annotations) = child_of_kind(node, "modifiers")
            .map(|modifiers| self.modifiers(modifiers))
            .unwrap_or_default();

        let mut decl = TypeDecl {
            kind,
            name,
            qualified_name,
            modifiers,
            annotations,
            type_params: child_of_kind(node, "type_parameters")
                .map(|params| self.type_params(params))
                .unwrap_or_default(),
            extends: Vec::new(),
            implements: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            members: Vec::new(),
            line: line_of(node),
        };

        for child in all_children(node) {
            match child.kind() {
                "superclass" => {
                    if let Some(ty) = self.first_type(child) {
                        decl.extends.push(ty);
                    }
                }
                "super_interfaces" => decl.implements.extend(self.type_list(child)),
                "extends_interfaces" => decl.extends.extend(self.type_list(child)),
                _ => {}
            }
        }

        if kind == TypeKind::Record {
            if let Some(params) = node.child_by_field_name("parameters") {
                for param in self.formal_parameters(params) {
                    decl.fields.push(FieldDecl {
                        ty: param.ty,
                        names: vec![param.name],
                        modifiers: Modifiers { access: Access::Private, ..Modifiers::default() },
                    });
                }
            }
        }

        if let Some(body) = node.child_by_field_name("body") {
            self.type_body(body, &mut decl);
        }

        Some(decl)
    }

    fn type_body(&self, body: Node, decl: &mut TypeDecl) {
        let in_interface = decl.is_interface();
        for member in named_children(body) {
            match member.kind() {
                "field_declaration" | "constant_declaration" => {
                    if let Some(mut field) = self.field(member) {
                        if in_interface {
                            field.modifiers.access = Access::Public;
                            field.modifiers.is_static = true;
                        }
                        decl.fields.push(field);
                    }
                }
                "method_declaration" => {
                    if let Some(method) = self.method(member, in_interface) {
                        decl.methods.push(Arc::new(method));
                    }
                }
                "constructor_declaration" => {
                    if let Some(constructor) = self.constructor(member) {
                        decl.methods.push(Arc::new(constructor));
                    }
                }
                "enum_body_declarations" => self.type_body(member, decl),
                kind if TYPE_DECLARATIONS.contains(&kind) => {
                    let outer = decl.qualified_name.clone();
                    if let Some(nested) = self.type_decl(member, Some(&outer)) {
                        decl.members.push(Arc::new(nested));
                    }
                }
                _ => {}
            }
        }
    }

    fn modifiers(&self, node: Node) -> (Modifiers, Vec<Annotation>) {
        let mut modifiers = Modifiers::default();
        let mut annotations = Vec::new();

        for child in all_children(node) {
            match child.kind() {
                "public" => modifiers.access = Access::Public,
                "protected" => modifiers.access = Access::Protected,
                "private" => modifiers.access = Access::Private,
                "abstract" => modifiers.is_abstract = true,
                "static" => modifiers.is_static = true,
                "default" => modifiers.is_default = true,
                "marker_annotation" | "annotation" => {
                    if let Some(annotation) = self.annotation(child) {
                        annotations.push(annotation);
                    }
                }
                _ => {}
            }
        }

        (modifiers, annotations)
    }

    fn annotation(&self, node: Node) -> Option<Annotation> {
        let name = self.compact_text(node.child_by_field_name("name")?);

        let args = match node.child_by_field_name("arguments") {
            None => AnnotationArgs::Marker,
            Some(arguments) => {
                let values = named_children(arguments);
                if values.iter().any(|value| value.kind() == "element_value_pair") {
                    let pairs = values
                        .into_iter()
                        .filter(|value| value.kind() == "element_value_pair")
                        .filter_map(|pair| {
                            let key = self.text(pair.child_by_field_name("key")?).to_string();
                            let value = self.expr(pair.child_by_field_name("value")?);
                            Some((key, value))
                        })
                        .collect();
                    AnnotationArgs::Normal(pairs)
                } else if let Some(value) = values.first() {
                    AnnotationArgs::Single(self.expr(*value))
                } else {
                    AnnotationArgs::Normal(Vec::new())
                }
            }
        };

        Some(Annotation { name, args })
    }

    fn type_params(&self, node: Node) -> Vec<TypeParam> {
        named_children(node)
            .into_iter()
            .filter(|param| param.kind() == "type_parameter")
            .filter_map(|param| {
                let children = named_children(param);
                let name = children
                    .iter()
                    .find(|child| matches!(child.kind(), "type_identifier" | "identifier"))?;
                let bounds = children
                    .iter()
                    .find(|child| child.kind() == "type_bound")
                    .map(|bound| {
                        named_children(*bound)
                            .into_iter()
                            .filter(|ty| TYPE_NODES.contains(&ty.kind()))
                            .map(|ty| self.type_ref(ty))
                            .collect()
                    })
                    .unwrap_or_default();
                Some(TypeParam { name: self.text(*name).to_string(), bounds })
            })
            .collect()
    }

    fn first_type(&self, node: Node) -> Option<TypeRef> {
        named_children(node)
            .into_iter()
            .find(|child| TYPE_NODES.contains(&child.kind()))
            .map(|ty| self.type_ref(ty))
    }

    fn type_list(&self, node: Node) -> Vec<TypeRef> {
        let list = child_of_kind(node, "type_list").unwrap_or(node);
        named_children(list)
            .into_iter()
            .filter(|child| TYPE_NODES.contains(&child.kind()))
            .map(|ty| self.type_ref(ty))
            .collect()
    }

    fn type_ref(&self, node: Node) -> TypeRef {
        match node.kind() {
            "generic_type" => {
                let children = named_children(node);
                let name = children
                    .iter()
                    .find(|child| matches!(child.kind(), "type_identifier" | "scoped_type_identifier"))
                    .map(|base| self.compact_text(*base))
                    .unwrap_or_default();
                let args = children
                    .iter()
                    .find(|child| child.kind() == "type_arguments")
                    .map(|arguments| {
                        named_children(*arguments)
                            .into_iter()
                            .map(|argument| self.type_ref(argument))
                            .collect()
                    })
                    .unwrap_or_default();
                TypeRef { name, args, array_dims: 0 }
            }
            "array_type" => {
                let mut element = node
                    .child_by_field_name("element")
                    .map(|element| self.type_ref(element))
                    .unwrap_or_else(|| TypeRef::named("java.lang.Object"));
                let dims = node
                    .child_by_field_name("dimensions")
                    .map(|dims| self.text(dims).matches('[').count())
                    .unwrap_or(1);
                element.array_dims += dims;
                element
            }
            "annotated_type" => named_children(node)
                .into_iter()
                .rev()
                .find(|child| TYPE_NODES.contains(&child.kind()))
                .map(|ty| self.type_ref(ty))
                .unwrap_or_else(|| TypeRef::named(self.compact_text(node))),
            "wildcard" => self
                .first_type(node)
                .unwrap_or_else(|| TypeRef::named("java.lang.Object")),
            _ => TypeRef::named(self.compact_text(node)),
        }
    }

    fn field(&self, node: Node) -> Option<FieldDecl> {
        let ty = self.type_ref(node.child_by_field_name("type")?);
        let (modifiers, _) = child_of_kind(node, "modifiers")
            .map(|modifiers| self.modifiers(modifiers))
            .unwrap_or_default();

        let mut cursor = node.walk();
        let names = node
            .children_by_field_name("declarator", &mut cursor)
            .filter_map(|declarator| declarator.child_by_field_name("name"))
            .map(|name| self.text(name).to_string())
            .collect();

        Some(FieldDecl { ty, names, modifiers })
    }

    fn method(&self, node: Node, in_interface: bool) -> Option<MethodDecl> {
        let name = self.text(node.child_by_field_name("name")?).to_string();
        let (mut modifiers, annotations) = child_of_kind(node, "modifiers")
            .map(|modifiers| self.modifiers(modifiers))
            .unwrap_or_default();
        if in_interface && modifiers.access == Access::PackagePrivate {
            modifiers.access = Access::Public;
        }

        Some(MethodDecl {
            kind: MethodKind::Method,
            name,
            modifiers,
            annotations,
            type_params: child_of_kind(node, "type_parameters")
                .map(|params| self.type_params(params))
                .unwrap_or_default(),
            params: node
                .child_by_field_name("parameters")
                .map(|params| self.formal_parameters(params))
                .unwrap_or_default(),
            return_type: node.child_by_field_name("type").map(|ty| self.type_ref(ty)),
            body: node.child_by_field_name("body").map(|body| self.block(body)),
            line: line_of(node),
        })
    }

    fn constructor(&self, node: Node) -> Option<MethodDecl> {
        let name = self.text(node.child_by_field_name("name")?).to_string();
        let (modifiers, annotations) = child_of_kind(node, "modifiers")
            .map(|modifiers| self.modifiers(modifiers))
            .unwrap_or_default();

        Some(MethodDecl {
            kind: MethodKind::Constructor,
            name,
            modifiers,
            annotations,
            type_params: child_of_kind(node, "type_parameters")
                .map(|params| self.type_params(params))
                .unwrap_or_default(),
            params: node
                .child_by_field_name("parameters")
                .map(|params| self.formal_parameters(params))
                .unwrap_or_default(),
            return_type: None,
            body: Some(
                node.child_by_field_name("body")
                    .map(|body| self.block(body))
                    .unwrap_or_default(),
            ),
            line: line_of(node),
        })
    }

    fn formal_parameters(&self, node: Node) -> Vec<Param> {
        let mut params = Vec::new();
        for param in named_children(node) {
            match param.kind() {
                "formal_parameter" => {
                    let (Some(ty), Some(name)) = (
                        param.child_by_field_name("type"),
                        param.child_by_field_name("name"),
                    ) else {
                        continue;
                    };
                    let mut ty = self.type_ref(ty);
                    if let Some(dims) = param.child_by_field_name("dimensions") {
                        ty.array_dims += self.text(dims).matches('[').count();
                    }
                    params.push(Param { name: self.text(name).to_string(), ty, varargs: false });
                }
                "spread_parameter" => {
                    let Some(ty) = self.first_type(param) else {
                        continue;
                    };
                    let name = child_of_kind(param, "variable_declarator")
                        .and_then(|declarator| declarator.child_by_field_name("name"))
                        .or_else(|| child_of_kind(param, "identifier"))
                        .map(|name| self.text(name).to_string())
                        .unwrap_or_default();
                    params.push(Param { name, ty, varargs: true });
                }
                _ => {}
            }
        }
        params
    }

    fn block(&self, node: Node) -> Vec<Stmt> {
        let mut statements = Vec::new();
        for child in named_children(node) {
            self.statement(child, &mut statements);
        }
        statements
    }

    fn statement(&self, node: Node, out: &mut Vec<Stmt>) {
        match node.kind() {
            "local_variable_declaration" => self.local_variables(node, out),
            "enhanced_for_statement" => {
                if let Some(value) = node.child_by_field_name("value") {
                    out.push(Stmt::Expr(self.expr(value)));
                }
                if let Some(name) = node.child_by_field_name("name") {
                    out.push(Stmt::LocalVar(LocalVar {
                        ty: node.child_by_field_name("type").map(|ty| self.type_ref(ty)),
                        name: self.text(name).to_string(),
                        init: None,
                    }));
                }
                if let Some(body) = node.child_by_field_name("body") {
                    self.statement(body, out);
                }
            }
            "catch_formal_parameter" => {
                if let Some(name) = node.child_by_field_name("name") {
                    let ty = child_of_kind(node, "catch_type").and_then(|types| self.first_type(types));
                    out.push(Stmt::LocalVar(LocalVar {
                        ty,
                        name: self.text(name).to_string(),
                        init: None,
                    }));
                }
            }
            "resource" => match (node.child_by_field_name("type"), node.child_by_field_name("name")) {
                (Some(ty), Some(name)) => out.push(Stmt::LocalVar(LocalVar {
                    ty: Some(self.type_ref(ty)),
                    name: self.text(name).to_string(),
                    init: node.child_by_field_name("value").map(|value| self.expr(value)),
                })),
                _ => {
                    for child in named_children(node) {
                        self.statement(child, out);
                    }
                }
            },
            kind if TYPE_DECLARATIONS.contains(&kind) => {}
            kind if EXPRESSIONS.contains(&kind) => out.push(Stmt::Expr(self.expr(node))),
            _ => {
                for child in named_children(node) {
                    self.statement(child, out);
                }
            }
        }
    }

    fn local_variables(&self, node: Node, out: &mut Vec<Stmt>) {
        let Some(ty) = node.child_by_field_name("type").map(|ty| self.type_ref(ty)) else {
            return;
        };

        let mut cursor = node.walk();
        let declarators: Vec<Node> = node.children_by_field_name("declarator", &mut cursor).collect();
        for declarator in declarators {
            let Some(name) = declarator.child_by_field_name("name") else {
                continue;
            };
            let mut declared = ty.clone();
            if let Some(dims) = declarator.child_by_field_name("dimensions") {
                declared.array_dims += self.text(dims).matches('[').count();
            }
            out.push(Stmt::LocalVar(LocalVar {
                ty: Some(declared),
                name: self.text(name).to_string(),
                init: declarator.child_by_field_name("value").map(|value| self.expr(value)),
            }));
        }
    }

    fn boxed(&self, node: Option<Node>) -> Box<Expr> {
        Box::new(
            node.map(|node| self.expr(node))
                .unwrap_or_else(|| Expr::Compound(Vec::new())),
        )
    }

    fn expr(&self, node: Node) -> Expr {
        match node.kind() {
            "method_invocation" => Expr::MethodCall(self.method_call(node)),
            "object_creation_expression" => Expr::New {
                ty: node
                    .child_by_field_name("type")
                    .map(|ty| self.type_ref(ty))
                    .unwrap_or_else(|| TypeRef::named("java.lang.Object")),
                args: self.arguments(node),
            },
            "identifier" => Expr::Name(self.text(node).to_string()),
            "this" => Expr::This,
            "super" => Expr::Super,
            "field_access" => {
                let target = match node.child_by_field_name("object") {
                    Some(object) => self.expr(object),
                    None => Expr::This,
                };
                let field = node
                    .child_by_field_name("field")
                    .map(|field| self.text(field).to_string())
                    .unwrap_or_default();
                Expr::FieldAccess { target: Box::new(target), field }
            }
            "string_literal" | "text_block" => Expr::Literal(Literal::String(unquote(self.text(node)))),
            "decimal_integer_literal" | "hex_integer_literal" | "octal_integer_literal"
            | "binary_integer_literal" => {
                if self.text(node).ends_with(['l', 'L']) {
                    Expr::Literal(Literal::Long)
                } else {
                    Expr::Literal(Literal::Int)
                }
            }
            "decimal_floating_point_literal" | "hex_floating_point_literal" => {
                if self.text(node).ends_with(['f', 'F']) {
                    Expr::Literal(Literal::Float)
                } else {
                    Expr::Literal(Literal::Double)
                }
            }
            "true" | "false" => Expr::Literal(Literal::Bool),
            "character_literal" => Expr::Literal(Literal::Char),
            "null_literal" => Expr::Literal(Literal::Null),
            "class_literal" => Expr::ClassLiteral(
                self.first_type(node)
                    .unwrap_or_else(|| TypeRef::named(self.compact_text(node).trim_end_matches(".class").to_string())),
            ),
            "lambda_expression" => Expr::Lambda(self.lambda(node)),
            "cast_expression" => Expr::Cast {
                ty: node
                    .child_by_field_name("type")
                    .map(|ty| self.type_ref(ty))
                    .unwrap_or_else(|| TypeRef::named("java.lang.Object")),
                expr: self.boxed(node.child_by_field_name("value")),
            },
            "binary_expression" => Expr::Binary {
                op: node
                    .child_by_field_name("operator")
                    .map(|op| self.text(op).to_string())
                    .unwrap_or_default(),
                left: self.boxed(node.child_by_field_name("left")),
                right: self.boxed(node.child_by_field_name("right")),
            },
            "unary_expression" => Expr::Unary {
                op: node
                    .child_by_field_name("operator")
                    .map(|op| self.text(op).to_string())
                    .unwrap_or_default(),
                operand: self.boxed(node.child_by_field_name("operand")),
            },
            "update_expression" => Expr::Unary {
                op: "++".to_string(),
                operand: self.boxed(named_children(node).into_iter().next()),
            },
            "assignment_expression" => Expr::Assign {
                target: self.boxed(node.child_by_field_name("left")),
                value: self.boxed(node.child_by_field_name("right")),
            },
            "ternary_expression" => Expr::Conditional {
                condition: self.boxed(node.child_by_field_name("condition")),
                then: self.boxed(node.child_by_field_name("consequence")),
                otherwise: self.boxed(node.child_by_field_name("alternative")),
            },
            "parenthesized_expression" => named_children(node)
                .into_iter()
                .next()
                .map(|inner| self.expr(inner))
                .unwrap_or_else(|| Expr::Compound(Vec::new())),
            "instanceof_expression" => Expr::InstanceOf {
                expr: self.boxed(node.child_by_field_name("left")),
            },
            "array_access" => Expr::ArrayAccess {
                array: self.boxed(node.child_by_field_name("array")),
                index: self.boxed(node.child_by_field_name("index")),
            },
            _ => {
                let mut statements = Vec::new();
                for child in named_children(node) {
                    self.statement(child, &mut statements);
                }
                Expr::Compound(statements)
            }
        }
    }

    fn arguments(&self, node: Node) -> Vec<Expr> {
        node.child_by_field_name("arguments")
            .map(|arguments| {
                named_children(arguments)
                    .into_iter()
                    .map(|argument| self.expr(argument))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn method_call(&self, node: Node) -> MethodCall {
        let object = node.child_by_field_name("object");
        let qualified_super = all_children(node)
            .into_iter()
            .any(|child| child.kind() == "super" && Some(child) != object);

        let receiver = if qualified_super {
            Some(Box::new(Expr::Super))
        } else {
            object.map(|object| Box::new(self.expr(object)))
        };

        MethodCall {
            receiver,
            name: node
                .child_by_field_name("name")
                .map(|name| self.text(name).to_string())
                .unwrap_or_default(),
            args: self.arguments(node),
            text: self.text(node).split_whitespace().collect::<Vec<_>>().join(" "),
            line: line_of(node),
        }
    }

    fn lambda(&self, node: Node) -> Lambda {
        let params = match node.child_by_field_name("parameters") {
            Some(params) if params.kind() == "identifier" => vec![LocalVar {
                ty: None,
                name: self.text(params).to_string(),
                init: None,
            }],
            Some(params) if params.kind() == "formal_parameters" => self
                .formal_parameters(params)
                .into_iter()
                .map(|param| LocalVar {
                    ty: (!param.ty.is_var()).then_some(param.ty),
                    name: param.name,
                    init: None,
                })
                .collect(),
            Some(params) => named_children(params)
                .into_iter()
                .filter(|param| param.kind() == "identifier")
                .map(|param| LocalVar { ty: None, name: self.text(param).to_string(), init: None })
                .collect(),
            None => Vec::new(),
        };

        let body = match node.child_by_field_name("body") {
            Some(body) if body.kind() == "block" => self.block(body),
            Some(body) => vec![Stmt::Expr(self.expr(body))],
            None => Vec::new(),
        };

        Lambda { params, body }
    }
}

/// String literal contents with the common escapes decoded
fn unquote(literal: &str) -> String {
    let inner = if let Some(block) = literal.strip_prefix("\"\"\"") {
        block.strip_suffix("\"\"\"").unwrap_or(block).trim_start_matches(['\r', '\n'])
    } else {
        literal
            .strip_prefix('"')
            .and_then(|rest| rest.strip_suffix('"'))
            .unwrap_or(literal)
    };

    let mut value = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            value.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => value.push('\n'),
            Some('t') => value.push('\t'),
            Some('r') => value.push('\r'),
            Some(other) => value.push(other),
            None => value.push('\\'),
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::syntax::{Access, AnnotationArgs};

    fn parse(source: &str) -> CompilationUnit {
        JavaParser::new().unwrap().parse(source, Path::new("Test.java")).unwrap()
    }

    #[test]
    fn lowers_package_imports_and_heritage() {
        let unit = parse(
            r#"
package garden.steps;

import cucumber.api.java.en.When;
import java.util.*;
import static java.util.Objects.requireNonNull;

public class GardenSteps extends BaseSteps implements Person, Comparable<GardenSteps> {
    private Gardener gardener;

    static class Shed {}
}
"#,
        );

        assert_eq!(unit.package.as_deref(), Some("garden.steps"));
        assert_eq!(unit.imports.len(), 3);
        assert_eq!(unit.imports[0].path, "cucumber.api.java.en.When");
        assert!(unit.imports[1].wildcard);
        assert_eq!(unit.imports[1].path, "java.util");
        assert!(unit.imports[2].is_static);

        let steps = &unit.types[0];
        assert_eq!(steps.qualified_name, "garden.steps.GardenSteps");
        assert_eq!(steps.extends[0].name, "BaseSteps");
        assert_eq!(steps.implements.len(), 2);
        assert_eq!(steps.implements[1].args[0].name, "GardenSteps");
        assert_eq!(steps.fields[0].names, vec!["gardener"]);
        assert_eq!(steps.members[0].qualified_name, "garden.steps.GardenSteps.Shed");
    }

    #[test]
    fn lowers_methods_with_annotations_and_parameters() {
        let unit = parse(
            r#"
public abstract class Plant {
    @When("^a plant is watered$")
    @AutomationTarget(declaringType = Gardener.class, targetMethod = "water")
    public void water(Gardener gardener, java.util.List<Plant> others, String... names) {
        gardener.water(this);
    }

    protected abstract void wither();

    <T extends Plant> void harvest(T plant) {}
}
"#,
        );

        let plant = &unit.types[0];
        let water = &plant.methods[0];
        assert_eq!(water.modifiers.access, Access::Public);
        assert_eq!(water.annotations.len(), 2);
        assert_eq!(
            water.annotations[0].value().and_then(Expr::as_string_literal),
            Some("^a plant is watered$")
        );
        match &water.annotations[1].args {
            AnnotationArgs::Normal(pairs) => {
                assert_eq!(pairs[0].0, "declaringType");
                assert!(matches!(pairs[0].1, Expr::ClassLiteral(ref ty) if ty.name == "Gardener"));
            }
            other => panic!("unexpected arguments {:?}", other),
        }
        assert_eq!(water.params.len(), 3);
        assert_eq!(water.params[1].ty.name, "java.util.List");
        assert!(water.params[2].varargs);
        assert_eq!(water.body.as_ref().map(Vec::len), Some(1));

        let wither = &plant.methods[1];
        assert!(wither.modifiers.is_abstract);
        assert!(wither.body.is_none());
        assert_eq!(wither.modifiers.access, Access::Protected);

        let harvest = &plant.methods[2];
        assert_eq!(harvest.type_params[0].name, "T");
        assert_eq!(harvest.type_params[0].bounds[0].name, "Plant");
        assert_eq!(harvest.modifiers.access, Access::PackagePrivate);
    }

    #[test]
    fn interface_members_are_public() {
        let unit = parse("interface Person { void waterPlants(); default void rest() { } }");
        let person = &unit.types[0];
        assert!(person.is_interface());
        assert!(person.methods.iter().all(|m| m.modifiers.access == Access::Public));
        assert!(person.methods[0].body.is_none());
        assert!(person.methods[1].body.is_some());
    }

    #[test]
    fn bodies_keep_calls_in_textual_order() {
        let unit = parse(
            r#"
class Driver {
    void drive() {
        Person p = new MockedGardener();
        if (p.isReady()) {
            p.waterPlants();
        }
        for (Plant plant : garden.plants()) { plant.prune(); }
        super.drive();
        System.out.println("done " + p);
    }
}
"#,
        );

        let body = unit.types[0].methods[0].body.clone().unwrap();

        let calls: Vec<String> = body
            .iter()
            .filter_map(|stmt| match stmt {
                Stmt::Expr(Expr::MethodCall(call)) => Some(call.text.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(
            calls,
            vec![
                "p.isReady()",
                "p.waterPlants()",
                "garden.plants()",
                "plant.prune()",
                "super.drive()",
                "System.out.println(\"done \" + p)",
            ]
        );

        match &body[0] {
            Stmt::LocalVar(local) => {
                assert_eq!(local.name, "p");
                assert!(matches!(local.init, Some(Expr::New { ref ty, .. }) if ty.name == "MockedGardener"));
            }
            other => panic!("expected a local variable, got {:?}", other),
        }
    }

    #[test]
    fn lowers_lambda_registrations() {
        let unit = parse(
            r#"
public class Steps implements En {
    public Steps() {
        When("^the gardener plants$", () -> new Gardener().plantGherkin());
        Als("^iets$", (String name) -> { helper.help(name); });
    }
}
"#,
        );

        let constructor = unit.types[0].default_constructor().unwrap();
        let body = constructor.body.as_ref().unwrap();
        let Stmt::Expr(Expr::MethodCall(when)) = &body[0] else {
            panic!("expected a call");
        };
        assert_eq!(when.name, "When");
        assert_eq!(when.args[0].as_string_literal(), Some("^the gardener plants$"));
        assert!(matches!(&when.args[1], Expr::Lambda(lambda) if lambda.body.len() == 1));

        let Stmt::Expr(Expr::MethodCall(als)) = &body[1] else {
            panic!("expected a call");
        };
        let Expr::Lambda(lambda) = &als.args[1] else {
            panic!("expected a lambda");
        };
        assert_eq!(lambda.params[0].ty.as_ref().map(|ty| ty.name.as_str()), Some("String"));
    }

    #[test]
    fn super_receiver_is_recognized() {
        let unit = parse("class A extends B { void a() { super.grow(); } }");
        let body = unit.types[0].methods[0].body.as_ref().unwrap();
        let Stmt::Expr(Expr::MethodCall(call)) = &body[0] else {
            panic!("expected a call");
        };
        assert!(matches!(call.receiver.as_deref(), Some(Expr::Super)));
    }

    #[test]
    fn unquotes_escapes() {
        assert_eq!(unquote(r#""a \"b\"\n""#), "a \"b\"\n");
        assert_eq!(unquote(r#""^I water (\\d+) plants$""#), r"^I water (\d+) plants$");
    }
}
