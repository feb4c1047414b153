use colored::Colorize;
use log::debug;
use std::{error::Error, fmt::Display};

use crate::ast::AstNode;
use crate::lexer::{tokenize, Token};

use self::parser::Parser;

mod parser {
    // we take a token stream and hand out one token at a time

    use std::vec::IntoIter;

    use itertools::{peek_nth, PeekNth};

    use crate::lexer::Token;

    use super::SyntaxError;

    #[derive(Debug)]
    pub struct Parser {
        tokens: PeekNth<IntoIter<Token>>,
        consumed: usize,
    }

    impl Parser {
        pub fn new(tokens: Vec<Token>) -> Parser {
            Parser {
                tokens: peek_nth(tokens.into_iter()),
                consumed: 0,
            }
        }

        pub fn peek(&mut self) -> Option<Token> {
            self.tokens.peek().copied()
        }

        /// Char offset of the next token.
        pub fn position(&self) -> usize {
            self.consumed
        }

        pub fn advance(&mut self) -> Option<Token> {
            let token = self.tokens.next();
            if token.is_some() {
                self.consumed += 1;
            }
            token
        }

        /// Advances past `expected` if it is the next token.
        pub fn consume(&mut self, expected: Token) -> Option<Token> {
            if self.matches(expected) {
                self.advance()
            } else {
                None
            }
        }

        pub fn matches(&mut self, expected: Token) -> bool {
            self.peek() == Some(expected)
        }

        pub fn within_bounds(&mut self) -> bool {
            self.tokens.peek().is_some()
        }

        pub fn can_parse_operand(&mut self) -> bool {
            matches!(self.peek(), Some(token) if token.is_operand_start())
        }

        pub fn can_parse_quantifier(&mut self) -> bool {
            matches!(self.peek(), Some(token) if token.is_postfix())
        }

        pub fn is_empty_group(&mut self) -> bool {
            matches!(self.tokens.peek_nth(0), Some(Token::RParen))
        }
    }
}

/// A malformed pattern. Every variant carries the char offset where the
/// problem was detected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxError {
    EmptyExpression,
    DanglingOperator(usize, Token),
    MissingOperand(usize),
    UnclosedParenthesis(usize),
    UnmatchedParenthesis(usize),
    UnexpectedEOF(usize),
    /// Carries the offset of the first char past [`MAX_PATTERN_LEN`].
    PatternTooLong(usize),
}

impl SyntaxError {
    pub fn position(&self) -> usize {
        match *self {
            Self::EmptyExpression => 0,
            Self::DanglingOperator(position, _)
            | Self::MissingOperand(position)
            | Self::UnclosedParenthesis(position)
            | Self::UnmatchedParenthesis(position)
            | Self::UnexpectedEOF(position)
            | Self::PatternTooLong(position) => position,
        }
    }

    fn code(&self) -> u8 {
        match self {
            Self::EmptyExpression => 1,
            Self::DanglingOperator(_, _) => 2,
            Self::MissingOperand(_) => 3,
            Self::UnclosedParenthesis(_) => 4,
            Self::UnmatchedParenthesis(_) => 5,
            Self::UnexpectedEOF(_) => 6,
            Self::PatternTooLong(_) => 7,
        }
    }

    fn message(&self) -> String {
        match self {
            Self::EmptyExpression => String::from("empty regular expression"),
            Self::DanglingOperator(_, token) => {
                format!("operator '{}' has nothing to repeat", token)
            }
            Self::MissingOperand(_) => String::from("expected an operand"),
            Self::UnclosedParenthesis(_) => String::from("unclosed parenthesis"),
            Self::UnmatchedParenthesis(_) => String::from("unmatched closing parenthesis"),
            Self::UnexpectedEOF(_) => String::from("pattern ends where an operand is expected"),
            Self::PatternTooLong(_) => {
                format!("pattern is longer than {} characters", MAX_PATTERN_LEN)
            }
        }
    }

    /// Coloured diagnostic pointing at the offending character of `source`.
    pub fn render(&self, source: &str) -> String {
        format!(
            "{} {}:\n | {}\n | {}{}",
            format!("[{:0>3}]", self.code()).red().bold(),
            self.message(),
            source,
            " ".repeat(self.position()),
            "^".green()
        )
    }
}

impl Display for SyntaxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            Self::EmptyExpression => write!(f, "{}", self.message()),
            _ => write!(f, "{} at position {}", self.message(), self.position()),
        }
    }
}

impl Error for SyntaxError {}

/// Longest accepted pattern, in chars. Trees are at most this deep, which
/// keeps the recursive passes over them within a thread's stack.
pub const MAX_PATTERN_LEN: usize = 1000;

pub fn run_parse(input: &str) -> Result<AstNode, SyntaxError> {
    parse_tokens(tokenize(input))
}

pub fn parse_tokens(tokens: Vec<Token>) -> Result<AstNode, SyntaxError> {
    if tokens.is_empty() {
        return Err(SyntaxError::EmptyExpression);
    }
    if tokens.len() > MAX_PATTERN_LEN {
        return Err(SyntaxError::PatternTooLong(MAX_PATTERN_LEN));
    }
    let count = tokens.len();
    let mut parser = Parser::new(tokens);
    let expr = parse_expression(&mut parser)?;
    // an expression only stops early at a closing parenthesis
    if parser.within_bounds() {
        return Err(SyntaxError::UnmatchedParenthesis(parser.position()));
    }
    debug!("parsed {} tokens into {} ast nodes", count, expr.size());
    Ok(expr)
}

fn parse_expression(parser: &mut Parser) -> Result<AstNode, SyntaxError> {
    let mut node = parse_concatenation(parser)?;
    while parser.matches(Token::Or) {
        parser.advance();
        let alternative = parse_concatenation(parser)?;
        node = AstNode::or(node, alternative);
    }
    Ok(node)
}

fn parse_concatenation(parser: &mut Parser) -> Result<AstNode, SyntaxError> {
    let mut node = parse_unary(parser)?;
    while parser.can_parse_operand() {
        let next = parse_unary(parser)?;
        node = AstNode::seq(node, next);
    }
    Ok(node)
}

fn parse_unary(parser: &mut Parser) -> Result<AstNode, SyntaxError> {
    let mut node = parse_atom(parser)?;
    while parser.can_parse_quantifier() {
        node = match parser.advance() {
            Some(Token::Star) => AstNode::star(node),
            _ => AstNode::plus(node),
        };
    }
    Ok(node)
}

fn parse_group(parser: &mut Parser) -> Result<AstNode, SyntaxError> {
    let open = parser.position();
    parser.consume(Token::LParen);
    if parser.is_empty_group() {
        return Err(SyntaxError::MissingOperand(parser.position()));
    }
    let expression = parse_expression(parser)?;
    match parser.consume(Token::RParen) {
        Some(_) => Ok(expression),
        None => Err(SyntaxError::UnclosedParenthesis(open)),
    }
}

fn parse_atom(parser: &mut Parser) -> Result<AstNode, SyntaxError> {
    let position = parser.position();
    match parser.peek() {
        Some(Token::Literal(c)) => {
            parser.advance();
            Ok(AstNode::Literal(c))
        }
        Some(Token::LParen) => parse_group(parser),
        Some(token @ (Token::Star | Token::Plus)) => {
            Err(SyntaxError::DanglingOperator(position, token))
        }
        Some(Token::Or) | Some(Token::RParen) => Err(SyntaxError::MissingOperand(position)),
        None => Err(SyntaxError::UnexpectedEOF(position)),
    }
}
