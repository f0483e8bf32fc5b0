//! Hand-written lexer and recursive-descent parser for proto3 source text.
//!
//! The parser recognizes exactly the proto3 subset this crate compiles:
//! `syntax`, `package`, `message`, `enum`, `oneof`, `reserved`, and field
//! lines. Every other construct (`option`, `map`, `service`, `import`, ...)
//! is rejected with a parse error naming it, rather than silently skipped.

use crate::ast::{
    Enum, EnumValue, Field, FieldType, Message, MessageItem, Oneof, Package, Reserved, Scalar,
    MAX_FIELD_NUMBER, RESERVED_NUMBER_END, RESERVED_NUMBER_START,
};
use crate::error::Error;

/// Keywords for constructs outside the supported proto3 subset.
const UNSUPPORTED: &[&str] = &[
    "optional",
    "required",
    "extensions",
    "extend",
    "service",
    "option",
    "map",
    "import",
    "group",
];

/// Parse a single proto3 source file into a [`Package`].
pub fn parse(source: &str) -> Result<Package, Error> {
    let tokens = tokenize(source)?;
    Parser { tokens, pos: 0 }.parse_package()
}

#[derive(Debug, Clone, PartialEq)]
enum TokenKind {
    Ident(String),
    Int(u64),
    Str(String),
    Punct(char),
}

#[derive(Debug, Clone)]
struct Token {
    kind: TokenKind,
    line: usize,
    column: usize,
}

fn tokenize(source: &str) -> Result<Vec<Token>, Error> {
    let mut tokens = Vec::new();
    let mut chars = source.chars().peekable();
    let mut line = 1usize;
    let mut column = 1usize;

    macro_rules! bump {
        ($c:expr) => {{
            if $c == '\n' {
                line += 1;
                column = 1;
            } else {
                column += 1;
            }
        }};
    }

    while let Some(&c) = chars.peek() {
        let (tok_line, tok_column) = (line, column);
        if c.is_whitespace() {
            chars.next();
            bump!(c);
        } else if c == '/' {
            chars.next();
            bump!(c);
            match chars.peek() {
                Some('/') => {
                    for c in chars.by_ref() {
                        bump!(c);
                        if c == '\n' {
                            break;
                        }
                    }
                }
                Some('*') => {
                    chars.next();
                    bump!('*');
                    let mut prev = '\0';
                    let mut closed = false;
                    for c in chars.by_ref() {
                        bump!(c);
                        if prev == '*' && c == '/' {
                            closed = true;
                            break;
                        }
                        prev = c;
                    }
                    if !closed {
                        return Err(Error::parse(tok_line, tok_column, "unterminated block comment"));
                    }
                }
                _ => {
                    return Err(Error::parse(tok_line, tok_column, "unexpected character `/`"));
                }
            }
        } else if c.is_ascii_alphabetic() || c == '_' {
            let mut ident = String::new();
            while let Some(&c) = chars.peek() {
                if c.is_ascii_alphanumeric() || c == '_' {
                    ident.push(c);
                    chars.next();
                    bump!(c);
                } else {
                    break;
                }
            }
            tokens.push(Token {
                kind: TokenKind::Ident(ident),
                line: tok_line,
                column: tok_column,
            });
        } else if c.is_ascii_digit() {
            let mut value: u64 = 0;
            while let Some(&c) = chars.peek() {
                if let Some(digit) = c.to_digit(10) {
                    value = value
                        .checked_mul(10)
                        .and_then(|v| v.checked_add(u64::from(digit)))
                        .ok_or_else(|| {
                            Error::parse(tok_line, tok_column, "integer literal overflows")
                        })?;
                    chars.next();
                    bump!(c);
                } else {
                    break;
                }
            }
            tokens.push(Token {
                kind: TokenKind::Int(value),
                line: tok_line,
                column: tok_column,
            });
        } else if c == '"' {
            chars.next();
            bump!(c);
            let mut value = String::new();
            let mut closed = false;
            while let Some(c) = chars.next() {
                bump!(c);
                match c {
                    '"' => {
                        closed = true;
                        break;
                    }
                    '\\' => match chars.next() {
                        Some(escaped) => {
                            bump!(escaped);
                            value.push(escaped);
                        }
                        None => break,
                    },
                    _ => value.push(c),
                }
            }
            if !closed {
                return Err(Error::parse(tok_line, tok_column, "unterminated string literal"));
            }
            tokens.push(Token {
                kind: TokenKind::Str(value),
                line: tok_line,
                column: tok_column,
            });
        } else if "{}=;,.[]()<>-".contains(c) {
            chars.next();
            bump!(c);
            tokens.push(Token {
                kind: TokenKind::Punct(c),
                line: tok_line,
                column: tok_column,
            });
        } else {
            return Err(Error::parse(
                tok_line,
                tok_column,
                format!("unexpected character `{c}`"),
            ));
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&TokenKind> {
        self.tokens.get(self.pos).map(|t| &t.kind)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn error_here(&self, message: impl Into<String>) -> Error {
        match self.tokens.get(self.pos.min(self.tokens.len().saturating_sub(1))) {
            Some(token) if !self.tokens.is_empty() => {
                Error::parse(token.line, token.column, message)
            }
            _ => Error::parse(0, 0, message),
        }
    }

    fn expect_punct(&mut self, punct: char) -> Result<(), Error> {
        match self.peek() {
            Some(TokenKind::Punct(c)) if *c == punct => {
                self.advance();
                Ok(())
            }
            _ => Err(self.error_here(format!("expected `{punct}`"))),
        }
    }

    fn eat_punct(&mut self, punct: char) -> bool {
        if matches!(self.peek(), Some(TokenKind::Punct(c)) if *c == punct) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_ident(&mut self, what: &str) -> Result<String, Error> {
        match self.peek() {
            Some(TokenKind::Ident(_)) => {
                let Some(Token { kind: TokenKind::Ident(ident), .. }) = self.advance() else {
                    unreachable!("peeked an ident");
                };
                Ok(ident)
            }
            _ => Err(self.error_here(format!("expected {what}"))),
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<(), Error> {
        match self.peek() {
            Some(TokenKind::Ident(ident)) if ident == keyword => {
                self.advance();
                Ok(())
            }
            _ => Err(self.error_here(format!("expected `{keyword}`"))),
        }
    }

    fn expect_int(&mut self) -> Result<u64, Error> {
        match self.peek() {
            Some(TokenKind::Int(value)) => {
                let value = *value;
                self.advance();
                Ok(value)
            }
            _ => Err(self.error_here("expected an integer")),
        }
    }

    fn reject_unsupported(&self, ident: &str) -> Result<(), Error> {
        if UNSUPPORTED.contains(&ident) {
            Err(self.error_here(format!("`{ident}` is not supported (proto3 subset)")))
        } else {
            Ok(())
        }
    }

    fn parse_package(mut self) -> Result<Package, Error> {
        // `syntax = "proto3";` is mandatory and must come first.
        self.expect_keyword("syntax")
            .map_err(|_| self.error_here("expected `syntax = \"proto3\";`"))?;
        self.expect_punct('=')?;
        match self.peek() {
            Some(TokenKind::Str(syntax)) if syntax == "proto3" => {
                self.advance();
            }
            Some(TokenKind::Str(other)) => {
                return Err(self.error_here(format!("unsupported syntax `{other}`, only proto3")));
            }
            _ => return Err(self.error_here("expected a syntax string")),
        }
        self.expect_punct(';')?;

        let mut package = Package::default();
        let mut package_declared = false;

        while let Some(kind) = self.peek() {
            match kind {
                TokenKind::Punct(';') => {
                    self.advance();
                }
                TokenKind::Ident(ident) => match ident.as_str() {
                    "package" => {
                        if package_declared {
                            return Err(self.error_here("duplicate `package` declaration"));
                        }
                        self.advance();
                        package.name = self.parse_dotted_name()?;
                        self.expect_punct(';')?;
                        package_declared = true;
                    }
                    "message" => {
                        self.advance();
                        let message = self.parse_message()?;
                        package.messages.push(message);
                    }
                    "enum" => {
                        self.advance();
                        let decl = self.parse_enum()?;
                        package.enums.push(decl);
                    }
                    other => {
                        self.reject_unsupported(other)?;
                        return Err(self.error_here(format!("unexpected `{other}`")));
                    }
                },
                _ => return Err(self.error_here("expected a declaration")),
            }
        }

        Ok(package)
    }

    fn parse_dotted_name(&mut self) -> Result<String, Error> {
        let mut name = self.expect_ident("a name")?;
        while self.eat_punct('.') {
            name.push('.');
            name.push_str(&self.expect_ident("a name component")?);
        }
        Ok(name)
    }

    fn parse_message(&mut self) -> Result<Message, Error> {
        let name = self.expect_ident("a message name")?;
        self.expect_punct('{')?;

        let mut message = Message {
            name,
            ..Message::default()
        };

        loop {
            match self.peek() {
                None => return Err(self.error_here("unclosed message body")),
                Some(TokenKind::Punct('}')) => {
                    self.advance();
                    break;
                }
                Some(TokenKind::Punct(';')) => {
                    self.advance();
                }
                Some(TokenKind::Ident(ident)) => match ident.as_str() {
                    "message" => {
                        self.advance();
                        let nested = self.parse_message()?;
                        message.messages.push(nested);
                    }
                    "enum" => {
                        self.advance();
                        let nested = self.parse_enum()?;
                        message.enums.push(nested);
                    }
                    "oneof" => {
                        self.advance();
                        let oneof = self.parse_oneof()?;
                        message.items.push(MessageItem::Oneof(oneof));
                    }
                    "reserved" => {
                        self.advance();
                        self.parse_reserved(&mut message.reserved)?;
                    }
                    "repeated" => {
                        self.advance();
                        let field = self.parse_field(true)?;
                        message.items.push(MessageItem::Field(field));
                    }
                    other => {
                        self.reject_unsupported(other)?;
                        let field = self.parse_field(false)?;
                        message.items.push(MessageItem::Field(field));
                    }
                },
                Some(TokenKind::Punct('.')) => {
                    // Absolute type reference starts a field line.
                    let field = self.parse_field(false)?;
                    message.items.push(MessageItem::Field(field));
                }
                _ => return Err(self.error_here("expected a field or declaration")),
            }
        }

        Ok(message)
    }

    fn parse_field(&mut self, repeated: bool) -> Result<Field, Error> {
        let ty = self.parse_field_type()?;
        let name = self.expect_ident("a field name")?;
        self.expect_punct('=')?;
        let number = self.parse_field_number()?;
        if self.eat_punct('[') {
            return Err(self.error_here("field options and defaults are not supported"));
        }
        self.expect_punct(';')?;
        Ok(Field {
            name,
            number,
            ty,
            repeated,
        })
    }

    fn parse_field_type(&mut self) -> Result<FieldType, Error> {
        if self.eat_punct('.') {
            let mut reference = String::from(".");
            reference.push_str(&self.parse_dotted_name()?);
            return Ok(FieldType::Named(reference));
        }

        let first = self.expect_ident("a field type")?;
        self.reject_unsupported(&first)?;

        if matches!(self.peek(), Some(TokenKind::Punct('.'))) {
            let mut reference = first;
            while self.eat_punct('.') {
                reference.push('.');
                reference.push_str(&self.expect_ident("a name component")?);
            }
            return Ok(FieldType::Named(reference));
        }

        match Scalar::from_keyword(&first) {
            Some(scalar) => Ok(FieldType::Scalar(scalar)),
            None => Ok(FieldType::Named(first)),
        }
    }

    fn parse_field_number(&mut self) -> Result<u32, Error> {
        let value = self.expect_int()?;
        let number = u32::try_from(value)
            .ok()
            .filter(|n| (1..=MAX_FIELD_NUMBER).contains(n))
            .ok_or_else(|| {
                self.error_here(format!(
                    "field number {value} outside 1..={MAX_FIELD_NUMBER}"
                ))
            })?;
        if (RESERVED_NUMBER_START..=RESERVED_NUMBER_END).contains(&number) {
            return Err(self.error_here(format!(
                "field number {number} is reserved by the protobuf implementation"
            )));
        }
        Ok(number)
    }

    fn parse_oneof(&mut self) -> Result<Oneof, Error> {
        let name = self.expect_ident("a oneof name")?;
        self.expect_punct('{')?;

        let mut fields = Vec::new();
        loop {
            match self.peek() {
                None => return Err(self.error_here("unclosed oneof body")),
                Some(TokenKind::Punct('}')) => {
                    self.advance();
                    break;
                }
                Some(TokenKind::Punct(';')) => {
                    self.advance();
                }
                Some(TokenKind::Ident(ident)) if ident == "repeated" => {
                    return Err(self.error_here("repeated fields are not allowed inside oneof"));
                }
                Some(TokenKind::Ident(ident)) if ident == "oneof" => {
                    return Err(self.error_here("oneof declarations cannot nest"));
                }
                _ => {
                    if let Some(TokenKind::Ident(ident)) = self.peek() {
                        let ident = ident.clone();
                        self.reject_unsupported(&ident)?;
                    }
                    fields.push(self.parse_field(false)?);
                }
            }
        }

        if fields.is_empty() {
            return Err(self.error_here("oneof must declare at least one field"));
        }

        Ok(Oneof { name, fields })
    }

    fn parse_reserved(&mut self, reserved: &mut Vec<Reserved>) -> Result<(), Error> {
        match self.peek() {
            Some(TokenKind::Str(_)) => loop {
                match self.peek() {
                    Some(TokenKind::Str(name)) => {
                        reserved.push(Reserved::Name(name.clone()));
                        self.advance();
                    }
                    _ => return Err(self.error_here("expected a reserved field name")),
                }
                if !self.eat_punct(',') {
                    break;
                }
            },
            Some(TokenKind::Int(_)) => loop {
                let lo = self.parse_field_number_lenient()?;
                if matches!(self.peek(), Some(TokenKind::Ident(ident)) if ident == "to") {
                    self.advance();
                    let hi = match self.peek() {
                        Some(TokenKind::Ident(ident)) if ident == "max" => {
                            self.advance();
                            MAX_FIELD_NUMBER
                        }
                        _ => self.parse_field_number_lenient()?,
                    };
                    if lo > hi {
                        return Err(
                            self.error_here(format!("reserved range {lo} to {hi} is inverted"))
                        );
                    }
                    reserved.push(Reserved::Range(lo, hi));
                } else {
                    reserved.push(Reserved::Number(lo));
                }
                if !self.eat_punct(',') {
                    break;
                }
            },
            _ => return Err(self.error_here("expected reserved names or numbers")),
        }
        self.expect_punct(';')?;
        Ok(())
    }

    /// Reserved numbers may include the implementation-reserved band, so only
    /// the basic range is checked here.
    fn parse_field_number_lenient(&mut self) -> Result<u32, Error> {
        let value = self.expect_int()?;
        u32::try_from(value)
            .ok()
            .filter(|n| (1..=MAX_FIELD_NUMBER).contains(n))
            .ok_or_else(|| {
                self.error_here(format!(
                    "reserved number {value} outside 1..={MAX_FIELD_NUMBER}"
                ))
            })
    }

    fn parse_enum(&mut self) -> Result<Enum, Error> {
        let name = self.expect_ident("an enum name")?;
        self.expect_punct('{')?;

        let mut decl = Enum {
            name,
            ..Enum::default()
        };

        loop {
            match self.peek() {
                None => return Err(self.error_here("unclosed enum body")),
                Some(TokenKind::Punct('}')) => {
                    self.advance();
                    break;
                }
                Some(TokenKind::Punct(';')) => {
                    self.advance();
                }
                Some(TokenKind::Ident(ident)) => {
                    let ident = ident.clone();
                    self.reject_unsupported(&ident)?;
                    self.advance();
                    self.expect_punct('=')?;
                    let negative = self.eat_punct('-');
                    let magnitude = self.expect_int()?;
                    let number = enum_number(negative, magnitude)
                        .ok_or_else(|| self.error_here("enum value outside i32 range"))?;
                    if decl.values.iter().any(|v| v.name == ident) {
                        return Err(self.error_here(format!("duplicate enum value name `{ident}`")));
                    }
                    if decl.values.iter().any(|v| v.number == number) {
                        return Err(
                            self.error_here(format!("duplicate enum value number {number}"))
                        );
                    }
                    self.expect_punct(';')?;
                    decl.values.push(EnumValue {
                        name: ident,
                        number,
                    });
                }
                _ => return Err(self.error_here("expected an enum value")),
            }
        }

        if decl.values.is_empty() {
            return Err(self.error_here(format!("enum `{}` must declare at least one value", decl.name)));
        }
        if !decl.values.iter().any(|v| v.number == 0) {
            return Err(Error::MissingZeroValue {
                name: decl.name.clone(),
            });
        }

        Ok(decl)
    }
}

fn enum_number(negative: bool, magnitude: u64) -> Option<i32> {
    let magnitude = i64::try_from(magnitude).ok()?;
    let value = if negative { -magnitude } else { magnitude };
    i32::try_from(value).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[track_caller]
    fn parse_ok(source: &str) -> Package {
        parse(source).expect("schema should parse")
    }

    #[track_caller]
    fn parse_err(source: &str) -> Error {
        parse(source).expect_err("schema should be rejected")
    }

    #[test]
    fn parses_simple_message() {
        let package = parse_ok(
            r#"
            syntax = "proto3";
            message M {
                int32 n = 1;
                string t = 2;
            }
            "#,
        );

        assert_eq!(package.name, "");
        assert_eq!(package.messages.len(), 1);
        let message = &package.messages[0];
        assert_eq!(message.name, "M");
        assert_eq!(message.items.len(), 2);

        let fields: Vec<_> = message.flattened_fields().collect();
        assert_eq!(fields[0].name, "n");
        assert_eq!(fields[0].number, 1);
        assert_eq!(fields[0].ty, FieldType::Scalar(Scalar::Int32));
        assert!(!fields[0].repeated);
        assert_eq!(fields[1].ty, FieldType::Scalar(Scalar::String));
    }

    #[test]
    fn parses_package_and_nested_types() {
        let package = parse_ok(
            r#"
            syntax = "proto3";
            package com.example;

            message Outer {
                Inner i = 1;
                message Inner { int32 a = 1; }
                enum Kind { KIND_UNSPECIFIED = 0; KIND_OTHER = 1; }
            }
            "#,
        );

        assert_eq!(package.name, "com.example");
        let outer = &package.messages[0];
        assert_eq!(outer.messages[0].name, "Inner");
        assert_eq!(outer.enums[0].name, "Kind");
        let field = outer.flattened_fields().next().unwrap();
        assert_eq!(field.ty, FieldType::Named("Inner".to_string()));
    }

    #[test]
    fn strips_comments() {
        let package = parse_ok(
            "syntax = \"proto3\"; // trailing\n/* block\ncomment */ message M { int32 n = 1; /* inline */ }",
        );
        assert_eq!(package.messages[0].name, "M");
    }

    #[test]
    fn parses_repeated_and_absolute_references() {
        let package = parse_ok(
            r#"
            syntax = "proto3";
            message M {
                repeated int32 xs = 1;
                .other.T t = 2;
            }
            "#,
        );
        let fields: Vec<_> = package.messages[0].flattened_fields().collect();
        assert!(fields[0].repeated);
        assert_eq!(fields[1].ty, FieldType::Named(".other.T".to_string()));
    }

    #[test]
    fn parses_oneof() {
        let package = parse_ok(
            r#"
            syntax = "proto3";
            message M {
                oneof c {
                    int32 a = 1;
                    string b = 2;
                }
            }
            "#,
        );
        let MessageItem::Oneof(oneof) = &package.messages[0].items[0] else {
            panic!("expected a oneof");
        };
        assert_eq!(oneof.name, "c");
        assert_eq!(oneof.fields.len(), 2);
        assert_eq!(oneof.fields[1].number, 2);
    }

    #[test]
    fn parses_reserved_declarations() {
        let package = parse_ok(
            r#"
            syntax = "proto3";
            message M {
                int32 n = 1;
                reserved 2, 4 to 6;
                reserved "old";
            }
            "#,
        );
        let message = &package.messages[0];
        assert_eq!(
            message.reserved,
            vec![
                Reserved::Number(2),
                Reserved::Range(4, 6),
                Reserved::Name("old".to_string()),
            ]
        );
    }

    #[test]
    fn rejects_unsupported_constructs() {
        for source in [
            "syntax = \"proto3\"; service S { }",
            "syntax = \"proto3\"; import \"other.proto\";",
            "syntax = \"proto3\"; option java_package = \"x\";",
            "syntax = \"proto3\"; message M { optional int32 n = 1; }",
            "syntax = \"proto3\"; message M { required int32 n = 1; }",
            "syntax = \"proto3\"; message M { map<string, int32> m = 1; }",
            "syntax = \"proto3\"; message M { extensions 100 to 199; }",
            "syntax = \"proto3\"; extend M { int32 n = 100; }",
            "syntax = \"proto3\"; message M { int32 n = 1 [default = 5]; }",
        ] {
            parse_err(source);
        }
    }

    #[test]
    fn rejects_missing_or_wrong_syntax() {
        parse_err("message M { int32 n = 1; }");
        parse_err("syntax = \"proto2\"; message M { int32 n = 1; }");
    }

    #[test]
    fn rejects_bad_field_numbers() {
        parse_err("syntax = \"proto3\"; message M { int32 n = 0; }");
        parse_err("syntax = \"proto3\"; message M { int32 n = 536870912; }");
        parse_err("syntax = \"proto3\"; message M { int32 n = 19500; }");
    }

    #[test]
    fn rejects_enum_without_zero() {
        let err = parse_err("syntax = \"proto3\"; enum E { ONE = 1; }");
        assert!(matches!(err, Error::MissingZeroValue { ref name } if name == "E"));
    }

    #[test]
    fn rejects_duplicate_enum_values() {
        parse_err("syntax = \"proto3\"; enum E { A = 0; A = 1; }");
        parse_err("syntax = \"proto3\"; enum E { A = 0; B = 0; }");
    }

    #[test]
    fn parses_negative_enum_values() {
        let package = parse_ok("syntax = \"proto3\"; enum E { ZERO = 0; NEG = -5; }");
        assert_eq!(package.enums[0].values[1].number, -5);
    }

    #[test]
    fn rejects_repeated_inside_oneof() {
        parse_err(
            "syntax = \"proto3\"; message M { oneof c { repeated int32 xs = 1; } }",
        );
    }
}
