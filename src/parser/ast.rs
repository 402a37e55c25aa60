use serde::Serialize;

/// Root node: the ordered top-level statement list of one source file.
#[derive(Debug, Clone, Serialize)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Function {
    pub name: String,
    pub params: Vec<String>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StructDecl {
    pub name: String,
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Field {
    pub name: String,
    pub ty: String,
}

/// A method declares its owning type by name; binding happens at generation
/// time, so a method may precede its type's declaration.
#[derive(Debug, Clone, Serialize)]
pub struct MethodDecl {
    pub struct_name: String,
    pub name: String,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ElseIf {
    pub condition: Expr,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn label(self) -> &'static str {
        match self {
            LogLevel::Info => "[INFO]",
            LogLevel::Warn => "[WARN]",
            LogLevel::Error => "[ERROR]",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HashAlgorithm {
    Sha256,
    Sha1,
    Md5,
}

#[derive(Debug, Clone, Serialize)]
pub enum Stmt {
    Function(Function),
    Struct(StructDecl),
    Method(MethodDecl),
    Decorator {
        name: String,
        function: Function,
    },
    Test {
        name: String,
        body: Vec<Stmt>,
    },
    Return(Option<Expr>),
    Assign {
        name: String,
        value: Expr,
        mutable: bool,
    },
    Reassign {
        name: String,
        value: Expr,
    },
    Unpack {
        names: Vec<String>,
        value: Expr,
        mutable: bool,
    },
    If {
        condition: Expr,
        then_body: Vec<Stmt>,
        else_ifs: Vec<ElseIf>,
        else_body: Vec<Stmt>,
    },
    ForEach {
        var: String,
        start: Expr,
        end: Option<Expr>,
        body: Vec<Stmt>,
    },
    Repeat {
        count: i64,
        body: Vec<Stmt>,
    },
    While {
        condition: Expr,
        body: Vec<Stmt>,
    },
    Skip,
    Stop,
    Say(Expr),
    Print(Expr),
    Pause(Expr),
    WriteFile {
        content: Expr,
        path: Expr,
        append: bool,
    },
    Using {
        name: String,
        value: Expr,
        body: Vec<Stmt>,
    },
    Yield(Expr),
    Log {
        level: LogLevel,
        message: Expr,
    },
    Assert {
        condition: Expr,
        message: Option<Expr>,
    },
    Try {
        body: Vec<Stmt>,
        err_name: String,
        catch_body: Vec<Stmt>,
    },
    Throw(Expr),
    DoTogether(Vec<Stmt>),
    SocketSend {
        message: Expr,
        socket: Expr,
    },
    Expr(Expr),
}

#[derive(Debug, Clone, Serialize)]
pub enum Expr {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Ident(String),
    /// `my field` inside a method body.
    MyField(String),
    FieldAccess {
        object: Box<Expr>,
        field: String,
    },
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
    },
    Slice {
        object: Box<Expr>,
        start: Option<Box<Expr>>,
        end: Option<Box<Expr>>,
    },
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    List(Vec<Expr>),
    ListComp {
        expr: Box<Expr>,
        var: String,
        start: Box<Expr>,
        end: Option<Box<Expr>>,
        filter: Option<Box<Expr>>,
    },
    Tuple(Vec<Expr>),
    Call {
        name: String,
        args: Vec<Expr>,
    },
    /// `value | target`; the target is restricted to a bare callable name at
    /// parse time.
    Pipe {
        value: Box<Expr>,
        target: String,
    },
    ReadFile(Box<Expr>),
    Ask(Option<Box<Expr>>),
    Now,
    Today,
    Clock,
    Env(Box<Expr>),
    RunCommand(Box<Expr>),
    OpenFile(Box<Expr>),
    Fetch(Box<Expr>),
    JsonParse(Box<Expr>),
    JsonStringify(Box<Expr>),
    RegexMatch {
        pattern: Box<Expr>,
        text: Box<Expr>,
    },
    RegexFindAll {
        pattern: Box<Expr>,
        text: Box<Expr>,
    },
    RegexReplace {
        pattern: Box<Expr>,
        text: Box<Expr>,
        replacement: Box<Expr>,
    },
    Hash {
        algorithm: HashAlgorithm,
        value: Box<Expr>,
    },
    Wait(Box<Expr>),
    SocketConnect(Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Ne,
    And,
    Or,
}

impl BinOp {
    /// The operator's spelling in the emitted C++.
    pub fn cpp(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Lt => "<",
            BinOp::Gt => ">",
            BinOp::Le => "<=",
            BinOp::Ge => ">=",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::And => "&&",
            BinOp::Or => "||",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnaryOp {
    Not,
    Neg,
}

impl UnaryOp {
    pub fn cpp(self) -> &'static str {
        match self {
            UnaryOp::Not => "!",
            UnaryOp::Neg => "-",
        }
    }
}
