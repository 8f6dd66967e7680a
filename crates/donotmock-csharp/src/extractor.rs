//! C# syntax extractor using Tree-sitter.

use std::path::Path;
use tree_sitter::{Language, Node, Parser};

use crate::names::{field_or_kind, literal, name_ref, text, type_arguments, type_syntax};
use crate::syntax::{
    qualify, AttributeSyntax, DeclKind, FileSyntax, Import, Scope, Site, SiteKind, TypeDecl,
};
use donotmock_core::{FrontEndError, Location};

/// Extracts namespaces, usings, type declarations and construction-like
/// sites from C# source.
pub struct CSharpExtractor {
    language: Language,
}

impl CSharpExtractor {
    /// Creates a new C# extractor.
    #[must_use]
    pub fn new() -> Self {
        Self {
            language: tree_sitter_c_sharp::LANGUAGE.into(),
        }
    }

    /// Parses one file.
    ///
    /// A file with syntax errors still yields everything outside the
    /// malformed regions, with the first error recorded in
    /// [`FileSyntax::error`].
    ///
    /// # Errors
    ///
    /// Returns an error if the grammar cannot be loaded or the parser
    /// produces no tree.
    pub fn extract(&self, path: &Path, source: &str) -> Result<FileSyntax, FrontEndError> {
        let mut parser = Parser::new();
        parser
            .set_language(&self.language)
            .map_err(|e| FrontEndError::Language(e.to_string()))?;

        let mut file = FileSyntax {
            path: path.to_path_buf(),
            ..FileSyntax::default()
        };

        let src = source.as_bytes();
        let Some(tree) = parser.parse(src, None) else {
            return Err(FrontEndError::Parse {
                path: path.to_path_buf(),
                message: "parser produced no tree".to_string(),
            });
        };
        let root = tree.root_node();
        if root.has_error() {
            file.error = Some(first_error(&root).map_or_else(
                || "syntax error".to_string(),
                |node| {
                    let at = node.start_position();
                    format!("syntax error at line {}, column {}", at.row + 1, at.column + 1)
                },
            ));
        }

        file.scopes.push(Scope::default());
        let mut walker = Walker { src, file };
        walker.visit_children(&root, &Context::default());
        Ok(walker.file)
    }
}

impl Default for CSharpExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn first_error<'t>(node: &Node<'t>) -> Option<Node<'t>> {
    if node.is_error() || node.is_missing() {
        return Some(*node);
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.has_error() {
            if let Some(found) = first_error(&child) {
                return Some(found);
            }
        }
    }
    None
}

fn decl_kind(node: &Node<'_>) -> Option<DeclKind> {
    match node.kind() {
        "class_declaration" => Some(DeclKind::Class),
        "interface_declaration" => Some(DeclKind::Interface),
        "struct_declaration" => Some(DeclKind::Struct),
        "enum_declaration" => Some(DeclKind::Enum),
        "record_struct_declaration" => Some(DeclKind::RecordStruct),
        "record_declaration" => {
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                if child.kind() == "struct" {
                    return Some(DeclKind::RecordStruct);
                }
            }
            Some(DeclKind::Record)
        }
        _ => None,
    }
}

fn location(path: &Path, node: &Node<'_>) -> Location {
    let start = node.start_position();
    Location::new(path, start.row + 1, start.column + 1)
        .with_span(node.start_byte(), node.end_byte() - node.start_byte())
}

#[derive(Debug, Clone, Default)]
struct Context {
    scope: usize,
    enclosing: Vec<String>,
}

struct Walker<'s> {
    src: &'s [u8],
    file: FileSyntax,
}

impl Walker<'_> {
    fn visit_children(&mut self, node: &Node<'_>, ctx: &Context) {
        let mut ctx = ctx.clone();
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            if child.kind() == "file_scoped_namespace_declaration" {
                // Applies to the rest of the compilation unit.
                ctx.scope = self.enter_namespace(&child, ctx.scope);
                self.visit_namespace_members(&child, &ctx);
            } else {
                self.visit(&child, &ctx);
            }
        }
    }

    fn visit(&mut self, node: &Node<'_>, ctx: &Context) {
        match node.kind() {
            // Malformed region.
            "ERROR" => {}
            "using_directive" => self.using(node, ctx.scope),
            "namespace_declaration" => {
                let scope = self.enter_namespace(node, ctx.scope);
                let inner = Context {
                    scope,
                    enclosing: ctx.enclosing.clone(),
                };
                self.visit_namespace_members(node, &inner);
            }
            "object_creation_expression" => {
                self.creation(node, ctx);
                self.visit_children(node, ctx);
            }
            "invocation_expression" => {
                self.invocation(node, ctx);
                self.visit_children(node, ctx);
            }
            _ => match decl_kind(node) {
                Some(kind) => self.type_decl(node, kind, ctx),
                None => self.visit_children(node, ctx),
            },
        }
    }

    /// Visits a namespace's members, skipping its name.
    fn visit_namespace_members(&mut self, node: &Node<'_>, ctx: &Context) {
        let name = node.child_by_field_name("name");
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            if Some(child) == name {
                continue;
            }
            if child.kind() == "declaration_list" {
                self.visit_children(&child, ctx);
            } else {
                self.visit(&child, ctx);
            }
        }
    }

    fn enter_namespace(&mut self, node: &Node<'_>, parent: usize) -> usize {
        let name = field_or_kind(node, "name", &["identifier", "qualified_name"])
            .map(|n| text(&n, self.src).replace(char::is_whitespace, ""))
            .unwrap_or_default();
        let scope = self.file.scopes[parent].enter(&name);
        self.file.scopes.push(scope);
        self.file.scopes.len() - 1
    }

    fn using(&mut self, node: &Node<'_>, scope: usize) {
        let mut is_global = false;
        let mut is_static = false;
        let mut saw_equals = false;
        let mut before_equals = None;
        let mut after_equals = None;

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "global" => is_global = true,
                "static" => is_static = true,
                "=" => saw_equals = true,
                "name_equals" => {
                    saw_equals = true;
                    before_equals = field_or_kind(&child, "name", &["identifier"]);
                }
                _ if child.is_named() => {
                    if saw_equals {
                        after_equals = Some(child);
                    } else {
                        before_equals = Some(child);
                    }
                }
                _ => {}
            }
        }

        let import = if saw_equals {
            let (Some(alias), Some(target)) = (
                before_equals,
                after_equals.and_then(|n| name_ref(&n, self.src)),
            ) else {
                return;
            };
            Import::Alias {
                alias: text(&alias, self.src).to_string(),
                target,
            }
        } else {
            let Some(target) = before_equals.and_then(|n| name_ref(&n, self.src)) else {
                return;
            };
            if is_static {
                Import::Static(target)
            } else {
                Import::Namespace(target)
            }
        };

        if is_global {
            self.file.global_imports.push(import);
        } else {
            self.file.scopes[scope].import(import);
        }
    }

    fn type_decl(&mut self, node: &Node<'_>, kind: DeclKind, ctx: &Context) {
        let Some(name) = field_or_kind(node, "name", &["identifier"]) else {
            return;
        };
        if name.is_missing() {
            return;
        }
        let name = text(&name, self.src).to_string();
        let prefix = ctx
            .enclosing
            .last()
            .map_or_else(|| self.file.scopes[ctx.scope].namespace(), String::as_str);
        let qualified_name = qualify(prefix, &name);

        let mut attributes = Vec::new();
        let mut bases = Vec::new();
        let mut body = None;

        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            match child.kind() {
                "attribute_list" => self.attributes(&child, &mut attributes),
                "base_list" if kind != DeclKind::Enum => self.bases(&child, &mut bases),
                "declaration_list" => body = Some(child),
                _ => {}
            }
        }

        self.file.types.push(TypeDecl {
            name,
            kind,
            qualified_name: qualified_name.clone(),
            scope: ctx.scope,
            enclosing: ctx.enclosing.clone(),
            bases,
            attributes,
            line: node.start_position().row + 1,
        });

        if let Some(body) = body {
            let mut inner = ctx.clone();
            inner.enclosing.push(qualified_name);
            self.visit_children(&body, &inner);
        }
    }

    fn attributes(&self, list: &Node<'_>, out: &mut Vec<AttributeSyntax>) {
        let mut cursor = list.walk();
        for attribute in list.named_children(&mut cursor) {
            if attribute.kind() != "attribute" {
                continue;
            }
            let Some(name) = attribute
                .child_by_field_name("name")
                .or_else(|| attribute.named_child(0))
                .and_then(|n| name_ref(&n, self.src))
            else {
                continue;
            };

            let mut arguments = Vec::new();
            let mut arg_cursor = attribute.walk();
            for args in attribute.named_children(&mut arg_cursor) {
                if args.kind() == "attribute_argument_list" {
                    self.positional_arguments(&args, &mut arguments);
                }
            }
            out.push(AttributeSyntax { name, arguments });
        }
    }

    /// Positional (and `name:`) arguments; `Name = value` setters are skipped.
    fn positional_arguments(&self, list: &Node<'_>, out: &mut Vec<donotmock_core::AnnotationArg>) {
        let mut cursor = list.walk();
        for argument in list.named_children(&mut cursor) {
            if argument.kind() != "attribute_argument" {
                continue;
            }
            let mut is_setter = false;
            let mut value = None;
            let mut arg_cursor = argument.walk();
            for part in argument.children(&mut arg_cursor) {
                match part.kind() {
                    "=" | "name_equals" => is_setter = true,
                    _ if part.is_named() && part.kind() != "name_colon" => value = Some(part),
                    _ => {}
                }
            }
            if is_setter {
                continue;
            }
            if let Some(value) = value {
                out.push(literal(&value, self.src));
            }
        }
    }

    fn bases(&self, list: &Node<'_>, out: &mut Vec<crate::syntax::TypeSyntax>) {
        let mut cursor = list.walk();
        for entry in list.named_children(&mut cursor) {
            match entry.kind() {
                "argument_list" => {}
                "primary_constructor_base_type" => {
                    if let Some(ty) = entry
                        .child_by_field_name("type")
                        .or_else(|| entry.named_child(0))
                    {
                        out.push(type_syntax(&ty, self.src));
                    }
                }
                _ => out.push(type_syntax(&entry, self.src)),
            }
        }
    }

    fn creation(&mut self, node: &Node<'_>, ctx: &Context) {
        let Some(ty) = node
            .child_by_field_name("type")
            .and_then(|ty| name_ref(&ty, self.src))
        else {
            return;
        };
        self.push_site(SiteKind::Creation { ty }, node, ctx);
    }

    fn invocation(&mut self, node: &Node<'_>, ctx: &Context) {
        let Some(function) = node
            .child_by_field_name("function")
            .or_else(|| node.named_child(0))
        else {
            return;
        };

        let (target, generic) = match function.kind() {
            "member_access_expression" => {
                let Some(name) = function.child_by_field_name("name") else {
                    return;
                };
                let Some(receiver) = function
                    .child_by_field_name("expression")
                    .and_then(|e| name_ref(&e, self.src))
                else {
                    return;
                };
                (Some(receiver), name)
            }
            "generic_name" => (None, function),
            _ => return,
        };
        if generic.kind() != "generic_name" {
            return;
        }

        let Some(method) = field_or_kind(&generic, "name", &["identifier"]) else {
            return;
        };
        let type_args = field_or_kind(&generic, "type_arguments", &["type_argument_list"])
            .map(|list| type_arguments(&list, self.src))
            .unwrap_or_default();

        self.push_site(
            SiteKind::Call {
                target,
                method: text(&method, self.src).to_string(),
                type_args,
            },
            node,
            ctx,
        );
    }

    fn push_site(&mut self, kind: SiteKind, node: &Node<'_>, ctx: &Context) {
        self.file.sites.push(Site {
            kind,
            location: location(&self.file.path, node),
            scope: ctx.scope,
            enclosing: ctx.enclosing.clone(),
        });
    }
}
