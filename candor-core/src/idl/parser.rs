use super::{
    ParseError, Position,
    lexer::{Token, TokenKind},
};
use crate::types::{FuncMode, Label, Primitive};

/// A type expression as written, with names still unresolved.
#[derive(Debug, Clone, PartialEq)]
pub(super) enum Syntax {
    Primitive(Primitive),
    Named(String, Position),
    Opt(Box<Syntax>),
    Vec(Box<Syntax>),
    Blob,
    Record(Vec<FieldSyntax>),
    Variant(Vec<FieldSyntax>),
    Func(FuncSyntax),
    Service(Vec<MethodSyntax>),
}

#[derive(Debug, Clone, PartialEq)]
pub(super) struct FieldSyntax {
    pub label: Label,
    pub ty: Syntax,
    pub at: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub(super) struct FuncSyntax {
    pub args: Vec<Syntax>,
    pub rets: Vec<Syntax>,
    pub mode: FuncMode,
    pub at: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub(super) enum MethodType {
    Func(FuncSyntax),
    Named(String, Position),
}

#[derive(Debug, Clone, PartialEq)]
pub(super) struct MethodSyntax {
    pub name: String,
    pub ty: MethodType,
    pub at: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub(super) struct TypeDecl {
    pub name: String,
    pub ty: Syntax,
    pub at: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub(super) enum ServiceBody {
    Methods(Vec<MethodSyntax>),
    Named(String, Position),
}

#[derive(Debug, Clone, PartialEq)]
pub(super) struct ServiceSyntax {
    pub init_args: Vec<Syntax>,
    pub body: ServiceBody,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub(super) struct Program {
    pub types: Vec<TypeDecl>,
    pub service: Option<ServiceSyntax>,
}

pub(super) struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub(super) fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    pub(super) fn program(mut self) -> Result<Program, ParseError> {
        let mut program = Program::default();
        loop {
            match &self.peek().kind {
                TokenKind::Eof => return Ok(program),
                TokenKind::Semi => {
                    self.advance();
                }
                TokenKind::Ident(word) if word == "type" => {
                    program.types.push(self.type_decl()?);
                }
                TokenKind::Ident(word) if word == "import" => {
                    return Err(ParseError::ImportUnsupported(self.peek().at));
                }
                TokenKind::Ident(word) if word == "service" && program.service.is_none() => {
                    program.service = Some(self.service_decl()?);
                }
                _ => return Err(self.unexpected("a type definition or the service clause")),
            }
        }
    }

    fn peek(&self) -> &Token {
        // The token stream always ends with Eof.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_nth(&self, n: usize) -> &TokenKind {
        let index = (self.pos + n).min(self.tokens.len() - 1);
        &self.tokens[index].kind
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn unexpected(&self, expected: &'static str) -> ParseError {
        let token = self.peek();
        ParseError::Unexpected {
            expected,
            found: token.kind.describe(),
            at: token.at,
        }
    }

    fn expect(&mut self, kind: TokenKind, expected: &'static str) -> Result<Position, ParseError> {
        if self.peek().kind == kind {
            Ok(self.advance().at)
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if &self.peek().kind == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    fn ident(&mut self, expected: &'static str) -> Result<(String, Position), ParseError> {
        match &self.peek().kind {
            TokenKind::Ident(name) => {
                let name = name.clone();
                Ok((name, self.advance().at))
            }
            _ => Err(self.unexpected(expected)),
        }
    }

    /// A method or label name, either an identifier or a quoted string.
    fn name(&mut self, expected: &'static str) -> Result<(String, Position), ParseError> {
        match &self.peek().kind {
            TokenKind::Ident(name) | TokenKind::Text(name) => {
                let name = name.clone();
                Ok((name, self.advance().at))
            }
            _ => Err(self.unexpected(expected)),
        }
    }

    fn type_decl(&mut self) -> Result<TypeDecl, ParseError> {
        self.advance();
        let (name, at) = self.ident("a type name")?;
        self.expect(TokenKind::Equals, "'='")?;
        let ty = self.data_type()?;
        self.expect(TokenKind::Semi, "';'")?;
        Ok(TypeDecl { name, ty, at })
    }

    fn service_decl(&mut self) -> Result<ServiceSyntax, ParseError> {
        self.advance();
        // The service name is documentation only.
        if matches!(self.peek().kind, TokenKind::Ident(_)) {
            self.advance();
        }
        self.expect(TokenKind::Colon, "':'")?;

        let init_args = if self.peek().kind == TokenKind::LParen {
            let args = self.arg_list()?;
            self.expect(TokenKind::Arrow, "'->'")?;
            args
        } else {
            Vec::new()
        };

        let body = match &self.peek().kind {
            TokenKind::LBrace => ServiceBody::Methods(self.service_methods()?),
            TokenKind::Ident(_) => {
                let (name, at) = self.ident("a service type name")?;
                ServiceBody::Named(name, at)
            }
            _ => return Err(self.unexpected("a service body or a service type name")),
        };
        Ok(ServiceSyntax { init_args, body })
    }

    fn service_methods(&mut self) -> Result<Vec<MethodSyntax>, ParseError> {
        self.expect(TokenKind::LBrace, "'{'")?;
        let mut methods = Vec::new();
        while !self.eat(&TokenKind::RBrace) {
            let (name, at) = self.name("a method name")?;
            self.expect(TokenKind::Colon, "':'")?;
            let ty = match &self.peek().kind {
                TokenKind::LParen => MethodType::Func(self.func_signature()?),
                TokenKind::Ident(word) if word == "func" => {
                    self.advance();
                    MethodType::Func(self.func_signature()?)
                }
                TokenKind::Ident(_) => {
                    let (name, at) = self.ident("a function type name")?;
                    MethodType::Named(name, at)
                }
                _ => return Err(self.unexpected("a function signature")),
            };
            methods.push(MethodSyntax { name, ty, at });

            if !self.eat(&TokenKind::Semi) && self.peek().kind != TokenKind::RBrace {
                return Err(self.unexpected("';' or '}'"));
            }
        }
        Ok(methods)
    }

    /// `(args) -> (rets) annotation*`
    fn func_signature(&mut self) -> Result<FuncSyntax, ParseError> {
        let at = self.peek().at;
        let args = self.arg_list()?;
        self.expect(TokenKind::Arrow, "'->'")?;
        let rets = self.arg_list()?;

        let mut mode = FuncMode::Update;
        loop {
            mode = match &self.peek().kind {
                TokenKind::Ident(word) if word == "query" => FuncMode::Query,
                TokenKind::Ident(word) if word == "oneway" => FuncMode::Oneway,
                TokenKind::Ident(word) if word == "composite_query" => FuncMode::CompositeQuery,
                _ => break,
            };
            self.advance();
        }
        Ok(FuncSyntax {
            args,
            rets,
            mode,
            at,
        })
    }

    /// `(T, name : T, ...)`; argument names are skipped.
    fn arg_list(&mut self) -> Result<Vec<Syntax>, ParseError> {
        self.expect(TokenKind::LParen, "'('")?;
        let mut args = Vec::new();
        while !self.eat(&TokenKind::RParen) {
            let named = matches!(self.peek().kind, TokenKind::Ident(_) | TokenKind::Text(_))
                && *self.peek_nth(1) == TokenKind::Colon;
            if named {
                self.advance();
                self.advance();
            }
            args.push(self.data_type()?);

            if !self.eat(&TokenKind::Comma) && self.peek().kind != TokenKind::RParen {
                return Err(self.unexpected("',' or ')'"));
            }
        }
        Ok(args)
    }

    fn data_type(&mut self) -> Result<Syntax, ParseError> {
        let (word, at) = self.ident("a type")?;
        let ty = match word.as_str() {
            "opt" => Syntax::Opt(Box::new(self.data_type()?)),
            "vec" => Syntax::Vec(Box::new(self.data_type()?)),
            "blob" => Syntax::Blob,
            "record" => Syntax::Record(self.fields(false)?),
            "variant" => Syntax::Variant(self.fields(true)?),
            "func" => Syntax::Func(self.func_signature()?),
            "service" => Syntax::Service(self.service_methods()?),
            other => match Primitive::from_keyword(other) {
                Some(p) => Syntax::Primitive(p),
                None => Syntax::Named(word, at),
            },
        };
        Ok(ty)
    }

    /// The fields of a record or variant.
    ///
    /// A field without a label is positional in a record (numbered from the previous
    /// field's id), while in a variant a lone label is an alternative with a `null` payload.
    fn fields(&mut self, variant: bool) -> Result<Vec<FieldSyntax>, ParseError> {
        self.expect(TokenKind::LBrace, "'{'")?;
        let mut fields = Vec::new();
        let mut next_id: u32 = 0;

        while !self.eat(&TokenKind::RBrace) {
            let at = self.peek().at;
            let labelled = *self.peek_nth(1) == TokenKind::Colon;

            let field = match self.peek().kind.clone() {
                TokenKind::Number(n) if labelled || variant => {
                    self.advance();
                    let id = u32::try_from(n).map_err(|_| ParseError::InvalidNumber {
                        text: n.to_string(),
                        at,
                    })?;
                    let ty = self.field_type(labelled)?;
                    FieldSyntax {
                        label: Label::Id(id),
                        ty,
                        at,
                    }
                }
                TokenKind::Ident(name) | TokenKind::Text(name) if labelled || variant => {
                    self.advance();
                    let ty = self.field_type(labelled)?;
                    FieldSyntax {
                        label: Label::Named(name),
                        ty,
                        at,
                    }
                }
                _ => FieldSyntax {
                    label: Label::Unnamed(next_id),
                    ty: self.data_type()?,
                    at,
                },
            };
            next_id = field.label.id().wrapping_add(1);
            fields.push(field);

            if !self.eat(&TokenKind::Semi) && self.peek().kind != TokenKind::RBrace {
                return Err(self.unexpected("';' or '}'"));
            }
        }
        Ok(fields)
    }

    fn field_type(&mut self, labelled: bool) -> Result<Syntax, ParseError> {
        if labelled {
            self.expect(TokenKind::Colon, "':'")?;
            self.data_type()
        } else {
            Ok(Syntax::Primitive(Primitive::Null))
        }
    }
}
