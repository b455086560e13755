//! AST to three-address IR lowering.
//!
//! Each expression lowers to the register holding its value; statements
//! lower to no value. Variable declarations emit `Store` definitions,
//! identifier reads emit `Load`s of the current value of the name.

use crate::common::errors::LoweringError;
use crate::frontend::ast::Ast;
use crate::frontend::token::TokenKind;

use super::function::{Function, Program};
use super::instruction::{BinaryOp, Instruction, Reg};

struct Lowering {
    program: Program,
}

impl Lowering {
    fn new() -> Self {
        Self {
            program: Program::new(),
        }
    }

    fn lower_function(
        &mut self,
        name: &str,
        body: &Ast,
    ) -> Result<(), LoweringError> {
        let mut func = Function::new(name, self.program.functions.len());
        self.lower_node(&mut func, body)?;
        self.program.push(func);
        Ok(())
    }

    /// Lower one AST node into `func`, returning the value register for
    /// expressions.
    fn lower_node(&mut self, func: &mut Function, node: &Ast) -> Result<Option<Reg>, LoweringError> {
        match node {
            Ast::Program { items } | Ast::Block { stmts: items } => {
                for item in items {
                    self.lower_node(func, item)?;
                }
                Ok(None)
            }
            Ast::Call { args, .. } => {
                // Calls are lowered as an argument sequence only.
                for arg in args {
                    self.lower_node(func, arg)?;
                }
                Ok(None)
            }
            Ast::Function { name, body, .. } => {
                self.lower_function(name, body)?;
                Ok(None)
            }
            Ast::Number(value) => {
                let dst = func.fresh_reg();
                func.emit(Instruction::Const { dst, value: *value });
                Ok(Some(dst))
            }
            Ast::Ident(name) => {
                let dst = func.fresh_reg();
                func.emit(Instruction::Load {
                    name: name.clone(),
                    dst,
                    versioned: None,
                });
                Ok(Some(dst))
            }
            Ast::VarDecl { name, value, .. } => {
                let src = self.lower_value(func, value, "variable initializer")?;
                func.emit(Instruction::Store {
                    name: name.clone(),
                    src,
                    versioned: None,
                });
                Ok(None)
            }
            Ast::Binary { op, left, right } => {
                let lhs = self.lower_value(func, left, "left operand")?;
                let rhs = self.lower_value(func, right, "right operand")?;
                let dst = func.fresh_reg();
                func.emit(Instruction::Binary {
                    op: binary_op(op)?,
                    lhs,
                    rhs,
                    dst,
                });
                Ok(Some(dst))
            }
            Ast::If {
                condition,
                then_block,
                else_block,
            } => {
                let cond = self.lower_value(func, condition, "if condition")?;

                let end_label = func.fresh_label();
                let else_label = else_block.as_ref().map(|_| func.fresh_label());

                func.emit(Instruction::JumpIfFalse {
                    cond,
                    target: else_label.unwrap_or(end_label),
                });

                self.lower_node(func, then_block)?;

                if let (Some(else_block), Some(else_label)) = (else_block, else_label) {
                    func.emit(Instruction::Jump { target: end_label });
                    func.emit(Instruction::Label { label: else_label });
                    self.lower_node(func, else_block)?;
                }

                func.emit(Instruction::Label { label: end_label });
                Ok(None)
            }
        }
    }

    /// Lower a node that must produce a value.
    fn lower_value(
        &mut self,
        func: &mut Function,
        node: &Ast,
        context: &'static str,
    ) -> Result<Reg, LoweringError> {
        self.lower_node(func, node)?
            .ok_or(LoweringError::MissingOperand { context })
    }
}

/// Map an operator token to its IR opcode.
fn binary_op(op: &TokenKind) -> Result<BinaryOp, LoweringError> {
    match op {
        TokenKind::Plus => Ok(BinaryOp::Add),
        TokenKind::Minus => Ok(BinaryOp::Sub),
        TokenKind::Star => Ok(BinaryOp::Mul),
        TokenKind::Slash => Ok(BinaryOp::Div),
        other => Err(LoweringError::InvalidOperator {
            token: other.to_string(),
        }),
    }
}

/// Lower a program AST into IR functions.
pub fn lower_program(ast: &Ast) -> Result<Program, LoweringError> {
    let mut lowering = Lowering::new();
    // Top-level non-function nodes (none are produced by the parser
    // today) would lower into this scratch function and be discarded.
    let mut toplevel = Function::new("<toplevel>", usize::MAX);
    lowering.lower_node(&mut toplevel, ast)?;
    Ok(lowering.program)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::{lexer, parser};
    use crate::ir::instruction::Label;

    fn lower_source(source: &str) -> Program {
        let tokens = lexer::lex(source).unwrap();
        let ast = parser::parse(&tokens).unwrap();
        lower_program(&ast).unwrap()
    }

    #[test]
    fn test_lower_straight_line() {
        let program = lower_source("f():i32 { x:i32 = 1; y:i32 = 2; }");
        assert_eq!(program.functions.len(), 1);

        let insts = &program.functions[0].insts;
        assert_eq!(insts.len(), 4);
        assert!(matches!(
            insts[0],
            Instruction::Const {
                dst: Reg(0),
                value: 1
            }
        ));
        assert!(matches!(&insts[1], Instruction::Store { name, src: Reg(0), .. } if name == "x"));
        assert!(matches!(
            insts[2],
            Instruction::Const {
                dst: Reg(1),
                value: 2
            }
        ));
        assert!(matches!(&insts[3], Instruction::Store { name, src: Reg(1), .. } if name == "y"));
    }

    #[test]
    fn test_lower_binary_operands_then_op() {
        let program = lower_source("f():i32 { x:i32 = 1 + 2; }");
        let insts = &program.functions[0].insts;
        assert!(matches!(insts[0], Instruction::Const { value: 1, .. }));
        assert!(matches!(insts[1], Instruction::Const { value: 2, .. }));
        assert!(matches!(
            insts[2],
            Instruction::Binary {
                op: BinaryOp::Add,
                lhs: Reg(0),
                rhs: Reg(1),
                dst: Reg(2)
            }
        ));
        assert!(matches!(&insts[3], Instruction::Store { src: Reg(2), .. }));
    }

    #[test]
    fn test_lower_if_without_else() {
        let program = lower_source("f():i32 { if c { x:i32 = 1; } }");
        let insts = &program.functions[0].insts;
        // load c; jump_if_false -> end; const; store; label end
        assert!(matches!(&insts[0], Instruction::Load { name, .. } if name == "c"));
        assert!(matches!(
            insts[1],
            Instruction::JumpIfFalse {
                target: Label(0),
                ..
            }
        ));
        assert!(matches!(insts[4], Instruction::Label { label: Label(0) }));
    }

    #[test]
    fn test_lower_if_else_label_protocol() {
        let program = lower_source("f():i32 { if c { x:i32 = 1; } else { x:i32 = 2; } }");
        let insts = &program.functions[0].insts;

        // end label l0 is allocated before else label l1; the branch
        // targets the else label, the then-arm jumps to the end label.
        assert!(matches!(
            insts[1],
            Instruction::JumpIfFalse {
                target: Label(1),
                ..
            }
        ));
        assert!(matches!(insts[4], Instruction::Jump { target: Label(0) }));
        assert!(matches!(insts[5], Instruction::Label { label: Label(1) }));
        assert!(matches!(
            insts.last(),
            Some(Instruction::Label { label: Label(0) })
        ));
    }

    #[test]
    fn test_lower_two_functions() {
        let program = lower_source("f():i32 { x:i32 = 1; } g():i32 { y:i32 = 2; }");
        assert_eq!(program.functions.len(), 2);
        assert_eq!(program.functions[0].name, "f");
        assert_eq!(program.functions[1].name, "g");
        assert_eq!(program.functions[1].index, 1);
    }

    #[test]
    fn test_lower_call_arguments_in_order() {
        let program = lower_source("f():i32 { g(1, 2); }");
        let insts = &program.functions[0].insts;
        assert!(matches!(insts[0], Instruction::Const { value: 1, .. }));
        assert!(matches!(insts[1], Instruction::Const { value: 2, .. }));
        assert_eq!(insts.len(), 2);
    }

    #[test]
    fn test_invalid_operator_is_fatal() {
        let ast = Ast::Program {
            items: vec![Ast::Function {
                name: "f".to_string(),
                return_type: crate::frontend::token::Primitive::I32,
                body: Box::new(Ast::Block {
                    stmts: vec![Ast::VarDecl {
                        name: "x".to_string(),
                        ty: crate::frontend::token::Primitive::I32,
                        value: Box::new(Ast::Binary {
                            op: TokenKind::Comma,
                            left: Box::new(Ast::Number(1)),
                            right: Box::new(Ast::Number(2)),
                        }),
                    }],
                }),
            }],
        };
        let err = lower_program(&ast).unwrap_err();
        assert!(matches!(err, LoweringError::InvalidOperator { .. }));
    }
}
