//! Scope resolution over the AST.
//!
//! This pass is intentionally thin: it rejects duplicate declarations in
//! the same scope and duplicate function definitions, and logs a warning
//! for identifiers that resolve to no declaration (conditions fed from
//! outside the program are allowed to stay undeclared).

use std::collections::HashSet;

use tracing::warn;

use crate::common::errors::SemanticError;

use super::ast::Ast;

struct Resolver {
    scopes: Vec<HashSet<String>>,
    functions: HashSet<String>,
}

impl Resolver {
    fn new() -> Self {
        Self {
            scopes: Vec::new(),
            functions: HashSet::new(),
        }
    }

    fn declare(&mut self, name: &str) -> Result<(), SemanticError> {
        if self.scopes.is_empty() {
            self.scopes.push(HashSet::new());
        }
        let scope = self.scopes.last_mut().unwrap();
        if !scope.insert(name.to_string()) {
            return Err(SemanticError::DuplicateDeclaration {
                name: name.to_string(),
            });
        }
        Ok(())
    }

    fn is_declared(&self, name: &str) -> bool {
        self.scopes.iter().rev().any(|scope| scope.contains(name))
    }

    fn resolve(&mut self, node: &Ast) -> Result<(), SemanticError> {
        match node {
            Ast::Program { items } => {
                for item in items {
                    self.resolve(item)?;
                }
            }
            Ast::Function { name, body, .. } => {
                if !self.functions.insert(name.clone()) {
                    return Err(SemanticError::DuplicateFunction { name: name.clone() });
                }
                self.scopes.push(HashSet::new());
                self.resolve(body)?;
                self.scopes.pop();
            }
            Ast::Block { stmts } => {
                self.scopes.push(HashSet::new());
                for stmt in stmts {
                    self.resolve(stmt)?;
                }
                self.scopes.pop();
            }
            Ast::VarDecl { name, value, .. } => {
                self.resolve(value)?;
                self.declare(name)?;
            }
            Ast::Call { args, .. } => {
                for arg in args {
                    self.resolve(arg)?;
                }
            }
            Ast::If {
                condition,
                then_block,
                else_block,
            } => {
                self.resolve(condition)?;
                self.resolve(then_block)?;
                if let Some(else_block) = else_block {
                    self.resolve(else_block)?;
                }
            }
            Ast::Binary { left, right, .. } => {
                self.resolve(left)?;
                self.resolve(right)?;
            }
            Ast::Ident(name) => {
                if !self.is_declared(name) {
                    warn!(name, "use of undeclared identifier");
                }
            }
            Ast::Number(_) => {}
        }
        Ok(())
    }
}

/// Run scope resolution over a program AST.
pub fn analyze(ast: &Ast) -> Result<(), SemanticError> {
    Resolver::new().resolve(ast)
}
