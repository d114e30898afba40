/// Parser for select specs
///
/// Grammar:
///
/// ```text
/// spec  := item (',' item)*
/// item  := '*'
///        | [alias ':'] name                 -- column
///        | [alias ':'] relation '(' spec ')' -- relationship expansion
/// ```
use super::ast::*;
use super::lexer::{Lexer, LexerError, Token};
use std::fmt;

/// Parser for select specs
pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    /// Create a new parser from select-spec text
    pub fn new(input: &str) -> Result<Self, ParseError> {
        let mut lexer = Lexer::new(input);
        let tokens = lexer.tokenize().map_err(ParseError::LexerError)?;
        Ok(Self {
            tokens,
            position: 0,
        })
    }

    /// Parse the whole input into a projection
    pub fn parse(&mut self) -> Result<Projection, ParseError> {
        let projection = self.parse_spec()?;
        self.expect_token(Token::Eof)?;
        Ok(projection)
    }

    fn parse_spec(&mut self) -> Result<Projection, ParseError> {
        if matches!(self.current_token(), Token::Eof | Token::RightParen) {
            return Err(ParseError::EmptySelectList);
        }

        let mut items = Vec::new();
        loop {
            items.push(self.parse_item()?);

            if self.current_token() == &Token::Comma {
                self.advance();
            } else {
                break;
            }
        }

        Ok(Projection { items })
    }

    fn parse_item(&mut self) -> Result<SelectItem, ParseError> {
        if self.current_token() == &Token::Asterisk {
            self.advance();
            return Ok(SelectItem::Wildcard);
        }

        let first = self.expect_identifier()?;

        let (alias, name) = if self.current_token() == &Token::Colon {
            self.advance();
            (Some(first), self.expect_identifier()?)
        } else {
            (None, first)
        };

        if self.current_token() == &Token::LeftParen {
            self.advance();
            let projection = self.parse_spec()?;
            self.expect_token(Token::RightParen)?;
            return Ok(SelectItem::Embed {
                relation: name,
                alias,
                projection,
            });
        }

        Ok(SelectItem::Column { name, alias })
    }

    fn expect_identifier(&mut self) -> Result<String, ParseError> {
        if let Token::Identifier(name) = self.current_token().clone() {
            self.advance();
            Ok(name)
        } else {
            Err(ParseError::UnexpectedToken {
                expected: "column or relationship name".to_string(),
                found: self.current_token().clone(),
            })
        }
    }

    fn current_token(&self) -> &Token {
        &self.tokens[self.position]
    }

    fn advance(&mut self) {
        if self.position < self.tokens.len() - 1 {
            self.position += 1;
        }
    }

    fn expect_token(&mut self, expected: Token) -> Result<(), ParseError> {
        if self.current_token() == &expected {
            self.advance();
            Ok(())
        } else {
            Err(ParseError::UnexpectedToken {
                expected: format!("{}", expected),
                found: self.current_token().clone(),
            })
        }
    }
}

/// Parses a select spec in one call.
pub fn parse_select(input: &str) -> Result<Projection, ParseError> {
    Parser::new(input)?.parse()
}

/// Parse errors
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    LexerError(LexerError),
    UnexpectedToken { expected: String, found: Token },
    EmptySelectList,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::LexerError(e) => write!(f, "{}", e),
            ParseError::UnexpectedToken { expected, found } => {
                write!(f, "Expected {}, found {}", expected, found)
            }
            ParseError::EmptySelectList => write!(f, "Select list cannot be empty"),
        }
    }
}

impl std::error::Error for ParseError {}

impl From<ParseError> for crate::Error {
    fn from(err: ParseError) -> Self {
        crate::Error::BadRequest(format!("invalid select: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wildcard() {
        assert_eq!(parse_select("*").unwrap(), Projection::wildcard());
    }

    #[test]
    fn test_columns_with_alias() {
        let projection = parse_select("id, title:name").unwrap();
        assert_eq!(
            projection.items,
            vec![
                SelectItem::Column {
                    name: "id".to_string(),
                    alias: None,
                },
                SelectItem::Column {
                    name: "name".to_string(),
                    alias: Some("title".to_string()),
                },
            ]
        );
    }

    #[test]
    fn test_aliased_embed() {
        let projection = parse_select("*, variants:product_variants(*)").unwrap();
        assert_eq!(projection.items.len(), 2);
        match &projection.items[1] {
            SelectItem::Embed {
                relation,
                alias,
                projection,
            } => {
                assert_eq!(relation, "product_variants");
                assert_eq!(alias.as_deref(), Some("variants"));
                assert_eq!(projection, &Projection::wildcard());
            }
            other => panic!("Expected Embed, got {:?}", other),
        }
    }

    #[test]
    fn test_nested_embed() {
        let projection =
            parse_select("id, items:order_items(quantity, product:products(name, slug))").unwrap();
        assert_eq!(
            projection.to_string(),
            "id, items:order_items(quantity, product:products(name, slug))"
        );
    }

    #[test]
    fn test_empty_inputs() {
        assert_eq!(parse_select(""), Err(ParseError::EmptySelectList));
        assert_eq!(parse_select("   "), Err(ParseError::EmptySelectList));
        assert_eq!(parse_select("products()"), Err(ParseError::EmptySelectList));
    }

    #[test]
    fn test_malformed() {
        assert!(parse_select("id,").is_err());
        assert!(parse_select("variants(*").is_err());
        assert!(parse_select("id name").is_err());
        assert!(parse_select("a:b:c").is_err());
        assert!(parse_select(":name").is_err());
    }
}
