use std::fmt::Display;

use crate::Span;

/// Node Kinds
///
/// Every construct the parser can produce, statements and expressions alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Module,

    // Expressions
    Identifier,
    Integer,
    Float,
    True,
    False,
    Nil,
    OperatorToken,
    BinaryOperator,
    UnaryOperator,
    ParenthesizedExpression,
    Tuple,
    List,
    Dictionary,
    Pair,
    Set,
    Call,
    ArgumentList,
    KeywordArgument,
    Subscript,
    Slice,
    Attribute,
    ExpressionList,

    // Strings
    String,
    StringContent,
    EscapeSequence,
    Interpolation,
    TypeConversion,
    FormatSpecifier,
    FormatExpression,

    /// The introducing keyword of a declaration or definition, kept as a
    /// leaf so `var`/`let`/`const` and `proc`/`func` stay distinguishable.
    Keyword,

    // Statements
    ExpressionStatement,
    Assignment,
    AugmentedAssignment,
    Declaration,
    DeclarationEntry,
    ExportMarker,
    IfStatement,
    ElifClause,
    ElseClause,
    WhileStatement,
    ForStatement,
    Variables,
    FunctionDefinition,
    Parameters,
    Parameter,
    ReturnStatement,
    PassStatement,
    BreakStatement,
    ContinueStatement,
    ImportStatement,
    ImportFromStatement,
    AliasedImport,
    DottedName,
    Block,

    /// Stands in for a construct the parser could not make sense of; the
    /// matching diagnostic records the expected-vs-found detail.
    Error,
}

impl Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.sexp_name())
    }
}

impl NodeKind {
    /// Lower-snake name used by the s-expression printer.
    pub fn sexp_name(&self) -> &'static str {
        match self {
            NodeKind::Module => "module",
            NodeKind::Identifier => "identifier",
            NodeKind::Integer => "integer",
            NodeKind::Float => "float",
            NodeKind::True => "true",
            NodeKind::False => "false",
            NodeKind::Nil => "nil",
            NodeKind::OperatorToken => "operator",
            NodeKind::BinaryOperator => "binary",
            NodeKind::UnaryOperator => "unary",
            NodeKind::ParenthesizedExpression => "paren",
            NodeKind::Tuple => "tuple",
            NodeKind::List => "list",
            NodeKind::Dictionary => "dictionary",
            NodeKind::Pair => "pair",
            NodeKind::Set => "set",
            NodeKind::Call => "call",
            NodeKind::ArgumentList => "arguments",
            NodeKind::KeywordArgument => "keyword_argument",
            NodeKind::Subscript => "subscript",
            NodeKind::Slice => "slice",
            NodeKind::Attribute => "attribute",
            NodeKind::ExpressionList => "expression_list",
            NodeKind::String => "string",
            NodeKind::StringContent => "string_content",
            NodeKind::EscapeSequence => "escape_sequence",
            NodeKind::Interpolation => "interpolation",
            NodeKind::TypeConversion => "type_conversion",
            NodeKind::FormatSpecifier => "format_specifier",
            NodeKind::FormatExpression => "format_expression",
            NodeKind::Keyword => "keyword",
            NodeKind::ExpressionStatement => "expression_statement",
            NodeKind::Assignment => "assignment",
            NodeKind::AugmentedAssignment => "augmented_assignment",
            NodeKind::Declaration => "declaration",
            NodeKind::DeclarationEntry => "declaration_entry",
            NodeKind::ExportMarker => "export_marker",
            NodeKind::IfStatement => "if_statement",
            NodeKind::ElifClause => "elif_clause",
            NodeKind::ElseClause => "else_clause",
            NodeKind::WhileStatement => "while_statement",
            NodeKind::ForStatement => "for_statement",
            NodeKind::Variables => "variables",
            NodeKind::FunctionDefinition => "function_definition",
            NodeKind::Parameters => "parameters",
            NodeKind::Parameter => "parameter",
            NodeKind::ReturnStatement => "return_statement",
            NodeKind::PassStatement => "pass_statement",
            NodeKind::BreakStatement => "break_statement",
            NodeKind::ContinueStatement => "continue_statement",
            NodeKind::ImportStatement => "import_statement",
            NodeKind::ImportFromStatement => "import_from_statement",
            NodeKind::AliasedImport => "aliased_import",
            NodeKind::DottedName => "dotted_name",
            NodeKind::Block => "block",
            NodeKind::Error => "ERROR",
        }
    }
}

/// Field Names
///
/// Labels for the named children of a node. Not every child is named;
/// unnamed children keep only their position in the child list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldName {
    Left,
    Operator,
    Right,
    Name,
    Alias,
    Value,
    Type,
    Condition,
    Consequence,
    Alternative,
    Body,
    Parameters,
    ReturnType,
    Function,
    Arguments,
    Object,
    Attribute,
    Subscript,
    Key,
    Expression,
    ModuleName,
}

impl Display for FieldName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FieldName::Left => "left",
            FieldName::Operator => "operator",
            FieldName::Right => "right",
            FieldName::Name => "name",
            FieldName::Alias => "alias",
            FieldName::Value => "value",
            FieldName::Type => "type",
            FieldName::Condition => "condition",
            FieldName::Consequence => "consequence",
            FieldName::Alternative => "alternative",
            FieldName::Body => "body",
            FieldName::Parameters => "parameters",
            FieldName::ReturnType => "return_type",
            FieldName::Function => "function",
            FieldName::Arguments => "arguments",
            FieldName::Object => "object",
            FieldName::Attribute => "attribute",
            FieldName::Subscript => "subscript",
            FieldName::Key => "key",
            FieldName::Expression => "expression",
            FieldName::ModuleName => "module_name",
        };
        write!(f, "{}", name)
    }
}

/// A node in the concrete syntax tree.
#[derive(Debug, Clone)]
pub struct SyntaxNode {
    kind: NodeKind,
    span: Span,
    /// Exact source text, for leaf nodes; empty for interior nodes.
    text: String,
    children: Vec<(Option<FieldName>, SyntaxNode)>,
}

impl SyntaxNode {
    /// A leaf carrying its source text.
    pub fn leaf(kind: NodeKind, text: impl Into<String>, span: Span) -> Self {
        SyntaxNode {
            kind,
            span,
            text: text.into(),
            children: Vec::new(),
        }
    }

    /// An interior node; the span should cover all children.
    pub fn new(kind: NodeKind, span: Span, children: Vec<(Option<FieldName>, SyntaxNode)>) -> Self {
        SyntaxNode {
            kind,
            span,
            text: String::new(),
            children,
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Ordered child nodes, named and unnamed alike.
    pub fn children(&self) -> impl Iterator<Item = &SyntaxNode> {
        self.children.iter().map(|(_, child)| child)
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    pub fn child(&self, index: usize) -> Option<&SyntaxNode> {
        self.children.get(index).map(|(_, child)| child)
    }

    /// The first child carrying the given field name.
    pub fn field(&self, name: FieldName) -> Option<&SyntaxNode> {
        self.children
            .iter()
            .find(|(field, _)| *field == Some(name))
            .map(|(_, child)| child)
    }

    /// Every child carrying the given field name, in order (e.g. the
    /// `alternative` clauses of an if statement).
    pub fn fields(&self, name: FieldName) -> impl Iterator<Item = &SyntaxNode> {
        self.children
            .iter()
            .filter(move |(field, _)| *field == Some(name))
            .map(|(_, child)| child)
    }

    /// Whether this subtree contains any error node.
    pub fn has_errors(&self) -> bool {
        self.kind == NodeKind::Error || self.children().any(|child| child.has_errors())
    }

    /// Number of error nodes in this subtree.
    pub fn error_count(&self) -> usize {
        let own = usize::from(self.kind == NodeKind::Error);
        own + self
            .children()
            .map(|child| child.error_count())
            .sum::<usize>()
    }

    /// Compact s-expression rendering, used by tests and debug tooling.
    /// Leaves print their kind and text; interior nodes print their kind and
    /// children, with field names as `name:` prefixes.
    pub fn to_sexp(&self) -> String {
        let mut out = String::new();
        self.write_sexp(&mut out);
        out
    }

    fn write_sexp(&self, out: &mut String) {
        out.push('(');
        out.push_str(self.kind.sexp_name());
        if self.children.is_empty() {
            if !self.text.is_empty() {
                out.push(' ');
                out.push_str(&self.text);
            }
        } else {
            for (field, child) in &self.children {
                out.push(' ');
                if let Some(field) = field {
                    out.push_str(&format!("{}: ", field));
                }
                child.write_sexp(out);
            }
        }
        out.push(')');
    }
}
