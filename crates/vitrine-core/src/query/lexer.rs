/// Lexer for select specs
///
/// Splits text such as `id, name, variants:product_variants(size, stock)`
/// into tokens for the parser.
use std::fmt;

/// Token types produced by the lexer
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Identifiers (bare or double-quoted)
    Identifier(String),

    // Punctuation
    Asterisk,   // *
    Comma,      // ,
    Colon,      // :
    LeftParen,  // (
    RightParen, // )

    // End of input
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Identifier(id) => write!(f, "{}", id),
            Token::Asterisk => write!(f, "*"),
            Token::Comma => write!(f, ","),
            Token::Colon => write!(f, ":"),
            Token::LeftParen => write!(f, "("),
            Token::RightParen => write!(f, ")"),
            Token::Eof => write!(f, "end of input"),
        }
    }
}

/// Lexer state
pub struct Lexer {
    input: Vec<char>,
    position: usize,
}

impl Lexer {
    /// Create a new lexer from input string
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
        }
    }

    /// Get the next token
    pub fn next_token(&mut self) -> Result<Token, LexerError> {
        self.skip_whitespace();

        if self.position >= self.input.len() {
            return Ok(Token::Eof);
        }

        let ch = self.current_char();

        // Single-character tokens
        match ch {
            '*' => {
                self.advance();
                return Ok(Token::Asterisk);
            }
            ',' => {
                self.advance();
                return Ok(Token::Comma);
            }
            ':' => {
                self.advance();
                return Ok(Token::Colon);
            }
            '(' => {
                self.advance();
                return Ok(Token::LeftParen);
            }
            ')' => {
                self.advance();
                return Ok(Token::RightParen);
            }
            '"' => return self.read_quoted(),
            _ => {}
        }

        if ch.is_alphabetic() || ch == '_' {
            return Ok(self.read_identifier());
        }

        Err(LexerError::UnexpectedCharacter(ch, self.position))
    }

    /// Tokenize entire input into vector of tokens
    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexerError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            if token == Token::Eof {
                tokens.push(token);
                break;
            }
            tokens.push(token);
        }
        Ok(tokens)
    }

    fn current_char(&self) -> char {
        self.input[self.position]
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn skip_whitespace(&mut self) {
        while self.position < self.input.len() && self.current_char().is_whitespace() {
            self.advance();
        }
    }

    fn read_quoted(&mut self) -> Result<Token, LexerError> {
        self.advance(); // skip opening quote
        let start = self.position;

        while self.position < self.input.len() && self.current_char() != '"' {
            self.advance();
        }

        if self.position >= self.input.len() {
            return Err(LexerError::UnterminatedQuote);
        }

        let text: String = self.input[start..self.position].iter().collect();
        self.advance(); // skip closing quote

        if text.is_empty() {
            return Err(LexerError::EmptyIdentifier);
        }
        Ok(Token::Identifier(text))
    }

    fn read_identifier(&mut self) -> Token {
        let start = self.position;

        while self.position < self.input.len() {
            let ch = self.current_char();
            if ch.is_alphanumeric() || ch == '_' {
                self.advance();
            } else {
                break;
            }
        }

        Token::Identifier(self.input[start..self.position].iter().collect())
    }
}

/// Lexer errors
#[derive(Debug, Clone, PartialEq)]
pub enum LexerError {
    UnexpectedCharacter(char, usize),
    UnterminatedQuote,
    EmptyIdentifier,
}

impl fmt::Display for LexerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LexerError::UnexpectedCharacter(ch, pos) => {
                write!(f, "Unexpected character '{}' at position {}", ch, pos)
            }
            LexerError::UnterminatedQuote => write!(f, "Unterminated quoted identifier"),
            LexerError::EmptyIdentifier => write!(f, "Empty quoted identifier"),
        }
    }
}

impl std::error::Error for LexerError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wildcard() {
        let mut lexer = Lexer::new("*");
        assert_eq!(lexer.tokenize().unwrap(), vec![Token::Asterisk, Token::Eof]);
    }

    #[test]
    fn test_embed_with_alias() {
        let mut lexer = Lexer::new("id, variants:product_variants(*)");
        let tokens = lexer.tokenize().unwrap();

        assert_eq!(
            tokens,
            vec![
                Token::Identifier("id".to_string()),
                Token::Comma,
                Token::Identifier("variants".to_string()),
                Token::Colon,
                Token::Identifier("product_variants".to_string()),
                Token::LeftParen,
                Token::Asterisk,
                Token::RightParen,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_quoted_identifier() {
        let mut lexer = Lexer::new("\"display name\"");
        assert_eq!(
            lexer.tokenize().unwrap()[0],
            Token::Identifier("display name".to_string())
        );
        assert_eq!(
            Lexer::new("\"open").tokenize(),
            Err(LexerError::UnterminatedQuote)
        );
    }

    #[test]
    fn test_unexpected_character() {
        let mut lexer = Lexer::new("name; drop");
        assert_eq!(
            lexer.tokenize(),
            Err(LexerError::UnexpectedCharacter(';', 4))
        );
    }
}
