use std::fmt::Display;

/// One lexical unit of a pattern. Every source `char` yields exactly one
/// token, so a token's index in the stream is also its char offset.
#[derive(Debug, Hash, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    Literal(char),
    Star,
    Plus,
    Or,
    LParen,
    RParen,
}

impl Token {
    pub fn is_operand_start(&self) -> bool {
        matches!(self, Token::Literal(_) | Token::LParen)
    }

    pub fn is_postfix(&self) -> bool {
        matches!(self, Token::Star | Token::Plus)
    }
}

impl From<char> for Token {
    fn from(c: char) -> Self {
        match c {
            '*' => Token::Star,
            '+' => Token::Plus,
            '|' => Token::Or,
            '(' => Token::LParen,
            ')' => Token::RParen,
            literal => Token::Literal(literal),
        }
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Literal(c) => write!(f, "{}", c),
            Token::Star => write!(f, "*"),
            Token::Plus => write!(f, "+"),
            Token::Or => write!(f, "|"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
        }
    }
}

pub fn tokenize(source: &str) -> Vec<Token> {
    source.chars().map(Token::from).collect()
}
