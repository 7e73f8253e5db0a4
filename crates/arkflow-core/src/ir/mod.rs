//! Intermediate representation
//!
//! Values, expressions and statements in three-address form, together with
//! the types and signatures they refer to. Statements and locals are stored
//! in arenas owned by a method body and referred to by [`StmtId`]/[`LocalId`].

pub mod consts;
mod expr;
mod position;
mod refs;
mod signature;
mod stmt;
mod types;
mod value;

pub use expr::{
    binop_result_type, BinaryOperator, ConditionExpr, Expr, InvokeExpr, InvokeKind, NormalBinaryOperator,
    RelationalBinaryOperator, UnaryOperator,
};
pub use position::{FullPosition, LineColPosition};
pub use refs::Ref;
pub use signature::{
    ClassSignature, FieldSignature, FileSignature, MethodParameter, MethodSignature, MethodSubSignature,
    NamespaceSignature,
};
pub use stmt::{Stmt, StmtId, StmtKind};
pub use types::{LiteralType, Type};
pub use value::{Constant, Local, LocalData, LocalId, LocalTable, Value};
