//! Abstract syntax tree for the Slate language.

use std::fmt::Write;

use super::token::{Primitive, TokenKind};

/// A node of the abstract syntax tree.
///
/// One variant per node kind; the payload shape is part of the variant,
/// so "which field is valid" is decided by the type system.
#[derive(Debug, Clone, PartialEq)]
pub enum Ast {
    Program {
        items: Vec<Ast>,
    },
    Function {
        name: String,
        return_type: Primitive,
        body: Box<Ast>,
    },
    Block {
        stmts: Vec<Ast>,
    },
    VarDecl {
        name: String,
        ty: Primitive,
        value: Box<Ast>,
    },
    Call {
        name: String,
        args: Vec<Ast>,
    },
    If {
        condition: Box<Ast>,
        then_block: Box<Ast>,
        else_block: Option<Box<Ast>>,
    },
    /// Binary expression. The operator is kept as the raw token kind;
    /// mapping it to an IR opcode happens during lowering.
    Binary {
        op: TokenKind,
        left: Box<Ast>,
        right: Box<Ast>,
    },
    Number(i64),
    Ident(String),
}

impl Ast {
    /// Render the indented AST dump.
    pub fn dump(&self) -> String {
        let mut out = String::from("========== AST ==========\n");
        self.dump_into(&mut out, 0);
        out.push_str("=========================\n");
        out
    }

    fn dump_into(&self, out: &mut String, indent: usize) {
        let pad = "  ".repeat(indent);
        match self {
            Ast::Program { items } => {
                let _ = writeln!(out, "{pad}Program");
                for item in items {
                    item.dump_into(out, indent + 1);
                }
            }
            Ast::Function {
                name,
                return_type,
                body,
            } => {
                let _ = writeln!(out, "{pad}Function {name} -> {return_type}");
                body.dump_into(out, indent + 1);
            }
            Ast::Block { stmts } => {
                let _ = writeln!(out, "{pad}Block");
                for stmt in stmts {
                    stmt.dump_into(out, indent + 1);
                }
            }
            Ast::VarDecl { name, ty, value } => {
                let _ = writeln!(out, "{pad}VarDecl {name}: {ty}");
                value.dump_into(out, indent + 1);
            }
            Ast::Call { name, args } => {
                let _ = writeln!(out, "{pad}Call {name}");
                for arg in args {
                    arg.dump_into(out, indent + 1);
                }
            }
            Ast::If {
                condition,
                then_block,
                else_block,
            } => {
                let _ = writeln!(out, "{pad}If");
                condition.dump_into(out, indent + 1);
                then_block.dump_into(out, indent + 1);
                if let Some(else_block) = else_block {
                    let _ = writeln!(out, "{pad}Else");
                    else_block.dump_into(out, indent + 1);
                }
            }
            Ast::Binary { op, left, right } => {
                let _ = writeln!(out, "{pad}Binary {op}");
                left.dump_into(out, indent + 1);
                right.dump_into(out, indent + 1);
            }
            Ast::Number(value) => {
                let _ = writeln!(out, "{pad}Number {value}");
            }
            Ast::Ident(name) => {
                let _ = writeln!(out, "{pad}Ident {name}");
            }
        }
    }
}
