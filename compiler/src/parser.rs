use crate::{
    tokenizer::Token,
    utils::{error, quote},
    error::SchemaError,
};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref IDENTIFIER:      Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
    static ref EQUALS:          Regex = Regex::new(r"^=$").unwrap();
    static ref SEMICOLON:       Regex = Regex::new(r"^;$").unwrap();
    static ref COLON:           Regex = Regex::new(r"^:$").unwrap();
    static ref COMMA:           Regex = Regex::new(r"^,$").unwrap();
    static ref PIPE:            Regex = Regex::new(r"^\|$").unwrap();
    static ref INTEGER:         Regex = Regex::new(r"^-?\d+$").unwrap();
    static ref LEFT_BRACE:      Regex = Regex::new(r"^\{$").unwrap();
    static ref RIGHT_BRACE:     Regex = Regex::new(r"^\}$").unwrap();
    static ref LEFT_PAREN:      Regex = Regex::new(r"^\($").unwrap();
    static ref RIGHT_PAREN:     Regex = Regex::new(r"^\)$").unwrap();
    static ref LEFT_ANGLE:      Regex = Regex::new(r"^<$").unwrap();
    static ref RIGHT_ANGLE:     Regex = Regex::new(r"^>$").unwrap();
    static ref ENUM_KEYWORD:    Regex = Regex::new(r"^enum$").unwrap();
    static ref MODEL_KEYWORD:   Regex = Regex::new(r"^model$").unwrap();
    static ref SERVICE_KEYWORD: Regex = Regex::new(r"^service$").unwrap();
    static ref PACKAGE_KEYWORD: Regex = Regex::new(r"^package$").unwrap();
    static ref RPC_KEYWORD:     Regex = Regex::new(r"^rpc$").unwrap();
    static ref RETURNS_KEYWORD: Regex = Regex::new(r"^returns$").unwrap();
    static ref STREAM_KEYWORD:  Regex = Regex::new(r"^stream$").unwrap();
    static ref EOF:             Regex = Regex::new(r"^$").unwrap();
}

/// Parsed `.pfm` file, before names are resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelFile {
    pub package: Option<String>,
    pub items:   Vec<Item>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Enum(EnumItem),
    Model(ModelItem),
    Service(ServiceItem),
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumItem {
    pub name:    String,
    pub line:    usize,
    pub column:  usize,
    pub members: Vec<(String, i32)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelItem {
    pub name:   String,
    pub line:   usize,
    pub column: usize,
    pub fields: Vec<FieldItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldItem {
    pub name:   String,
    pub line:   usize,
    pub column: usize,
    pub ty:     TypeExpr,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    Path {
        name:   String,
        args:   Vec<TypeExpr>,
        line:   usize,
        column: usize,
    },
    Union(Vec<TypeExpr>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceItem {
    pub name:    String,
    pub line:    usize,
    pub column:  usize,
    pub methods: Vec<RpcItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RpcItem {
    pub name:     String,
    pub line:     usize,
    pub column:   usize,
    pub request:  Payload,
    pub response: Payload,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Payload {
    pub stream: bool,
    /// `None` for an empty payload, `returns ()`.
    pub type_:  Option<(String, usize, usize)>,
}

pub fn parse_schema(tokens: &[Token]) -> Result<ModelFile, SchemaError> {
    let mut items        = Vec::new();
    let mut package_text = None;
    let mut index        = 0;

    if tokens.is_empty() {
        return Ok(ModelFile { package: None, items });
    }

    fn current_token<'a>(tokens: &'a [Token], index: usize) -> &'a Token {
        &tokens[index.min(tokens.len() - 1)]
    }

    fn eat(tokens: &[Token], index: &mut usize, test: &Regex) -> bool {
        if *index < tokens.len() && test.is_match(&current_token(tokens, *index).text) {
            *index += 1;
            true
        } else {
            false
        }
    }

    fn expect(tokens: &[Token], index: &mut usize, test: &Regex, expected: &str) -> Result<(), SchemaError> {
        if !eat(tokens, index, test) {
            let tok = current_token(tokens, *index);
            return Err(error(
                &format!("Expected {} but found {}", expected, quote(&tok.text)),
                tok.line,
                tok.column,
            ));
        }
        Ok(())
    }

    fn unexpected_token(tokens: &[Token], index: usize) -> SchemaError {
        let tok = current_token(tokens, index);
        error(
            &format!("Unexpected token {}", quote(&tok.text)),
            tok.line,
            tok.column,
        )
    }

    fn identifier(tokens: &[Token], index: &mut usize) -> Result<(String, usize, usize), SchemaError> {
        let tok = current_token(tokens, *index);
        expect(tokens, index, &IDENTIFIER, "identifier")?;
        Ok((tok.text.clone(), tok.line, tok.column))
    }

    // type := primary ("|" primary)*
    fn type_expr(tokens: &[Token], index: &mut usize) -> Result<TypeExpr, SchemaError> {
        let mut members = vec![primary(tokens, index)?];
        while eat(tokens, index, &PIPE) {
            members.push(primary(tokens, index)?);
        }
        if members.len() == 1 {
            Ok(members.remove(0))
        } else {
            Ok(TypeExpr::Union(members))
        }
    }

    // primary := identifier ("<" type ("," type)* ">")?
    fn primary(tokens: &[Token], index: &mut usize) -> Result<TypeExpr, SchemaError> {
        let (name, line, column) = identifier(tokens, index)?;
        let mut args = Vec::new();
        if eat(tokens, index, &LEFT_ANGLE) {
            args.push(type_expr(tokens, index)?);
            while eat(tokens, index, &COMMA) {
                args.push(type_expr(tokens, index)?);
            }
            expect(tokens, index, &RIGHT_ANGLE, "\">\"")?;
        }
        Ok(TypeExpr::Path { name, args, line, column })
    }

    // payload := "stream"? identifier?
    fn payload(tokens: &[Token], index: &mut usize) -> Result<Payload, SchemaError> {
        expect(tokens, index, &LEFT_PAREN, "\"(\"")?;
        let stream = eat(tokens, index, &STREAM_KEYWORD);
        let type_ = if eat(tokens, index, &RIGHT_PAREN) {
            None
        } else {
            let ty = identifier(tokens, index)?;
            expect(tokens, index, &RIGHT_PAREN, "\")\"")?;
            Some(ty)
        };
        Ok(Payload { stream, type_ })
    }

    if eat(tokens, &mut index, &PACKAGE_KEYWORD) {
        let (pkg, _, _) = identifier(tokens, &mut index)?;
        package_text = Some(pkg);
        expect(tokens, &mut index, &SEMICOLON, "\";\"")?;
    }

    while index < tokens.len() && !eat(tokens, &mut index, &EOF) {
        if eat(tokens, &mut index, &ENUM_KEYWORD) {
            let (name, line, column) = identifier(tokens, &mut index)?;
            expect(tokens, &mut index, &LEFT_BRACE, "\"{\"")?;

            let mut members = Vec::new();
            while !eat(tokens, &mut index, &RIGHT_BRACE) {
                let (member, _, _) = identifier(tokens, &mut index)?;
                expect(tokens, &mut index, &EQUALS, "\"=\"")?;
                let v_tok = current_token(tokens, index);
                expect(tokens, &mut index, &INTEGER, "integer")?;
                let value = v_tok.text.parse::<i32>().map_err(|_| {
                    error(
                        &format!("Invalid integer {}", quote(&v_tok.text)),
                        v_tok.line,
                        v_tok.column,
                    )
                })?;
                expect(tokens, &mut index, &SEMICOLON, "\";\"")?;
                members.push((member, value));
            }

            items.push(Item::Enum(EnumItem { name, line, column, members }));
        } else if eat(tokens, &mut index, &MODEL_KEYWORD) {
            let (name, line, column) = identifier(tokens, &mut index)?;
            expect(tokens, &mut index, &LEFT_BRACE, "\"{\"")?;

            let mut fields = Vec::new();
            while !eat(tokens, &mut index, &RIGHT_BRACE) {
                let (field, f_line, f_column) = identifier(tokens, &mut index)?;
                expect(tokens, &mut index, &COLON, "\":\"")?;
                let ty = type_expr(tokens, &mut index)?;
                expect(tokens, &mut index, &SEMICOLON, "\";\"")?;
                fields.push(FieldItem {
                    name:   field,
                    line:   f_line,
                    column: f_column,
                    ty,
                });
            }

            items.push(Item::Model(ModelItem { name, line, column, fields }));
        } else if eat(tokens, &mut index, &SERVICE_KEYWORD) {
            let (name, line, column) = identifier(tokens, &mut index)?;
            expect(tokens, &mut index, &LEFT_BRACE, "\"{\"")?;

            let mut methods = Vec::new();
            while !eat(tokens, &mut index, &RIGHT_BRACE) {
                expect(tokens, &mut index, &RPC_KEYWORD, "\"rpc\"")?;
                let (method, m_line, m_column) = identifier(tokens, &mut index)?;
                let request = payload(tokens, &mut index)?;
                expect(tokens, &mut index, &RETURNS_KEYWORD, "\"returns\"")?;
                let response = payload(tokens, &mut index)?;
                expect(tokens, &mut index, &SEMICOLON, "\";\"")?;
                methods.push(RpcItem {
                    name:   method,
                    line:   m_line,
                    column: m_column,
                    request,
                    response,
                });
            }

            items.push(Item::Service(ServiceItem { name, line, column, methods }));
        } else {
            return Err(unexpected_token(tokens, index));
        }
    }

    Ok(ModelFile {
        package: package_text,
        items,
    })
}
