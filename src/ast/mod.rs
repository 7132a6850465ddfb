pub mod printer;

use serde::Serialize;

use crate::scanner::token::Span;

/// A unique identifier for each expression node, used by the resolver
/// to store variable resolution depths.
pub type ExprId = usize;

/// Top-level program: a list of declarations.
#[derive(Debug, Clone, Serialize)]
pub struct Program {
    pub declarations: Vec<Decl>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum Decl {
    Fun(FunDecl),
    Var(VarDecl),
    Statement(Stmt),
}

#[derive(Debug, Clone, Serialize)]
pub struct FunDecl {
    pub function: Function,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub struct VarDecl {
    pub name: String,
    pub initializer: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub struct Function {
    pub name: String,
    pub params: Vec<String>,
    pub body: Vec<Decl>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum Stmt {
    Expression(ExprStmt),
    Print(PrintStmt),
    Return(ReturnStmt),
    Block(BlockStmt),
    If(IfStmt),
    While(WhileStmt),
}

#[derive(Debug, Clone, Serialize)]
pub struct ExprStmt {
    pub expression: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub struct PrintStmt {
    pub expression: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReturnStmt {
    pub value: Option<Expr>,
    /// Span of the `return` keyword itself, for error reporting.
    pub keyword_span: Span,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub struct BlockStmt {
    pub declarations: Vec<Decl>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub struct IfStmt {
    pub condition: Expr,
    pub then_branch: Box<Stmt>,
    pub else_branch: Option<Box<Stmt>>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub struct WhileStmt {
    pub condition: Expr,
    pub body: Box<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum Expr {
    Binary(BinaryExpr),
    Unary(UnaryExpr),
    Literal(LiteralExpr),
    Grouping(GroupingExpr),
    Variable(VariableExpr),
    Assign(AssignExpr),
    Logical(LogicalExpr),
    Call(CallExpr),
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Self::Binary(e) => e.span,
            Self::Unary(e) => e.span,
            Self::Literal(e) => e.span,
            Self::Grouping(e) => e.span,
            Self::Variable(e) => e.span,
            Self::Assign(e) => e.span,
            Self::Logical(e) => e.span,
            Self::Call(e) => e.span,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BinaryExpr {
    pub id: ExprId,
    pub left: Box<Expr>,
    pub operator: BinaryOp,
    pub right: Box<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
pub enum BinaryOp {
    #[strum(serialize = "+")]
    Add,
    #[strum(serialize = "-")]
    Subtract,
    #[strum(serialize = "*")]
    Multiply,
    #[strum(serialize = "/")]
    Divide,
    #[strum(serialize = "==")]
    Equal,
    #[strum(serialize = "!=")]
    NotEqual,
    #[strum(serialize = "<")]
    Less,
    #[strum(serialize = "<=")]
    LessEqual,
    #[strum(serialize = ">")]
    Greater,
    #[strum(serialize = ">=")]
    GreaterEqual,
    /// Sequence operator: evaluates the left operand for effect, yields the
    /// right.
    #[strum(serialize = ",")]
    Comma,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnaryExpr {
    pub id: ExprId,
    pub operator: UnaryOp,
    pub operand: Box<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
pub enum UnaryOp {
    #[strum(serialize = "-")]
    Negate,
    #[strum(serialize = "!")]
    Not,
}

#[derive(Debug, Clone, Serialize)]
pub struct LiteralExpr {
    pub id: ExprId,
    pub value: LiteralValue,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub enum LiteralValue {
    Number(f64),
    String(String),
    Bool(bool),
    Nil,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupingExpr {
    pub id: ExprId,
    pub expression: Box<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub struct VariableExpr {
    pub id: ExprId,
    pub name: String,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssignExpr {
    pub id: ExprId,
    pub name: String,
    pub value: Box<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum LogicalOp {
    And,
    Or,
}

#[derive(Debug, Clone, Serialize)]
pub struct LogicalExpr {
    pub id: ExprId,
    pub left: Box<Expr>,
    pub operator: LogicalOp,
    pub right: Box<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub struct CallExpr {
    pub id: ExprId,
    pub callee: Box<Expr>,
    pub arguments: Vec<Expr>,
    /// Span of the closing parenthesis; call-site runtime errors (wrong
    /// arity, calling a non-callable) report its line.
    pub paren_span: Span,
    pub span: Span,
}
