//! Parser for the BinProto schema language

use crate::ast::*;
use crate::{Result, SchemaError};

/// Parse a schema string into an AST
pub fn parse(input: &str) -> Result<Schema> {
    let mut parser = SchemaParser::new();
    parser.tokenize(input)?;
    parser.parse_schema()
}

/// Parse a single type expression, e.g. `BinaryString(size = VarInt)`
pub fn parse_type(input: &str) -> Result<TypeExpr> {
    let mut parser = SchemaParser::new();
    parser.tokenize(input)?;
    let expr = parser.parse_type()?;
    if let Some(token) = parser.peek() {
        return Err(parser.error(format!("Unexpected {token:?} after type expression")));
    }
    Ok(expr)
}

/// Simple hand-written parser for the schema language
struct SchemaParser {
    tokens: Vec<(Token, usize)>,
    position: usize,
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Identifier(String),
    Integer(i64),
    StringLiteral(String),
    Struct,
    True,
    False,
    Colon,
    Semicolon,
    Comma,
    LeftBrace,
    RightBrace,
    LeftParen,
    RightParen,
    Equals,
}

impl SchemaParser {
    fn new() -> Self {
        Self {
            tokens: Vec::new(),
            position: 0,
        }
    }

    fn tokenize(&mut self, input: &str) -> Result<()> {
        self.tokens.clear();
        self.position = 0;

        let chars: Vec<char> = input.chars().collect();
        let mut i = 0;
        let mut line = 1;

        while i < chars.len() {
            match chars[i] {
                '\n' => {
                    line += 1;
                    i += 1;
                }
                ' ' | '\t' | '\r' => i += 1,
                '/' if i + 1 < chars.len() && chars[i + 1] == '/' => {
                    while i < chars.len() && chars[i] != '\n' {
                        i += 1;
                    }
                }
                '/' if i + 1 < chars.len() && chars[i + 1] == '*' => {
                    i += 2;
                    while i + 1 < chars.len() && !(chars[i] == '*' && chars[i + 1] == '/') {
                        if chars[i] == '\n' {
                            line += 1;
                        }
                        i += 1;
                    }
                    if i + 1 >= chars.len() {
                        return Err(SchemaError::Parse(format!(
                            "line {line}: Unterminated block comment"
                        )));
                    }
                    i += 2;
                }
                'a'..='z' | 'A'..='Z' | '_' => {
                    let start = i;
                    while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                        i += 1;
                    }
                    let ident: String = chars[start..i].iter().collect();

                    let token = match ident.as_str() {
                        "struct" => Token::Struct,
                        "true" => Token::True,
                        "false" => Token::False,
                        _ => Token::Identifier(ident),
                    };
                    self.tokens.push((token, line));
                }
                '0'..='9' | '-' => {
                    let start = i;
                    if chars[i] == '-' {
                        i += 1;
                    }
                    while i < chars.len() && chars[i].is_ascii_digit() {
                        i += 1;
                    }
                    let num_str: String = chars[start..i].iter().collect();
                    let num: i64 = num_str.parse().map_err(|_| {
                        SchemaError::Parse(format!("line {line}: Invalid integer `{num_str}`"))
                    })?;
                    self.tokens.push((Token::Integer(num), line));
                }
                '"' => {
                    i += 1;
                    let mut content = String::new();
                    while i < chars.len() && chars[i] != '"' {
                        if chars[i] == '\\' && i + 1 < chars.len() {
                            i += 1;
                        }
                        content.push(chars[i]);
                        i += 1;
                    }
                    if i >= chars.len() {
                        return Err(SchemaError::Parse(format!(
                            "line {line}: Unterminated string literal"
                        )));
                    }
                    self.tokens.push((Token::StringLiteral(content), line));
                    i += 1;
                }
                c => {
                    let token = match c {
                        ':' => Token::Colon,
                        ';' => Token::Semicolon,
                        ',' => Token::Comma,
                        '{' => Token::LeftBrace,
                        '}' => Token::RightBrace,
                        '(' => Token::LeftParen,
                        ')' => Token::RightParen,
                        '=' => Token::Equals,
                        _ => {
                            return Err(SchemaError::Parse(format!(
                                "line {line}: Unexpected character: {c}"
                            )))
                        }
                    };
                    self.tokens.push((token, line));
                    i += 1;
                }
            }
        }
        Ok(())
    }

    fn parse_schema(&mut self) -> Result<Schema> {
        let mut schema = Schema::new();
        while let Some(token) = self.peek() {
            if *token != Token::Struct {
                return Err(self.error("Expected struct".to_string()));
            }
            schema.add_struct(self.parse_struct()?);
        }
        Ok(schema)
    }

    fn parse_struct(&mut self) -> Result<StructDef> {
        self.consume(Token::Struct)?;
        let name = self.consume_identifier()?;
        self.consume(Token::LeftBrace)?;

        let mut fields = Vec::new();
        while !self.at_end() && !self.check(&Token::RightBrace) {
            fields.push(self.parse_field()?);
        }

        self.consume(Token::RightBrace)?;
        Ok(StructDef { name, fields })
    }

    fn parse_field(&mut self) -> Result<Field> {
        let name = self.consume_identifier()?;
        self.consume(Token::Colon)?;
        let type_expr = self.parse_type()?;
        self.consume(Token::Semicolon)?;
        Ok(Field { name, type_expr })
    }

    fn parse_type(&mut self) -> Result<TypeExpr> {
        let selector = self.consume_identifier()?;
        let mut options = Vec::new();

        if self.check(&Token::LeftParen) {
            self.consume(Token::LeftParen)?;
            while !self.at_end() && !self.check(&Token::RightParen) {
                options.push(self.parse_option()?);
                if self.check(&Token::Comma) {
                    self.consume(Token::Comma)?;
                } else {
                    break;
                }
            }
            self.consume(Token::RightParen)?;
        }

        Ok(TypeExpr { selector, options })
    }

    fn parse_option(&mut self) -> Result<TypeOption> {
        let name = self.consume_identifier()?;
        self.consume(Token::Equals)?;

        let value = match self.peek().cloned() {
            Some(Token::Integer(v)) => {
                self.position += 1;
                OptionValue::Integer(v)
            }
            Some(Token::True) => {
                self.position += 1;
                OptionValue::Bool(true)
            }
            Some(Token::False) => {
                self.position += 1;
                OptionValue::Bool(false)
            }
            Some(Token::StringLiteral(s)) => {
                self.position += 1;
                OptionValue::String(s)
            }
            Some(Token::Identifier(_)) => OptionValue::Type(self.parse_type()?),
            _ => {
                return Err(self.error(format!(
                    "Expected value for option `{name}` (type, integer, bool, or string)"
                )))
            }
        };

        Ok(TypeOption { name, value })
    }

    fn at_end(&self) -> bool {
        self.position >= self.tokens.len()
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position).map(|(token, _)| token)
    }

    fn check(&self, expected: &Token) -> bool {
        self.peek() == Some(expected)
    }

    fn error(&self, message: String) -> SchemaError {
        match self.tokens.get(self.position).or_else(|| self.tokens.last()) {
            Some((_, line)) => SchemaError::Parse(format!("line {line}: {message}")),
            None => SchemaError::Parse(message),
        }
    }

    fn consume(&mut self, expected: Token) -> Result<()> {
        match self.peek() {
            None => Err(self.error(format!("Expected {expected:?}, found end of input"))),
            Some(token) if std::mem::discriminant(token) == std::mem::discriminant(&expected) => {
                self.position += 1;
                Ok(())
            }
            Some(token) => {
                let message = format!("Expected {expected:?}, found {token:?}");
                Err(self.error(message))
            }
        }
    }

    fn consume_identifier(&mut self) -> Result<String> {
        match self.peek() {
            Some(Token::Identifier(name)) => {
                let name = name.clone();
                self.position += 1;
                Ok(name)
            }
            None => Err(self.error("Expected identifier, found end of input".to_string())),
            Some(token) => {
                let message = format!("Expected identifier, found {token:?}");
                Err(self.error(message))
            }
        }
    }
}
