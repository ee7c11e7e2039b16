use super::{Comparison, Expr, Key, Op, SelectionError, Value};

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Int(i64),
    Text(String),
    Cmp(Op),
    And,
    Or,
    Not,
    LParen,
    RParen,
}

#[derive(Debug, Clone, PartialEq)]
struct Spanned {
    token: Token,
    pos: usize,
}

fn syntax(pos: usize, message: impl Into<String>) -> SelectionError {
    SelectionError::Syntax {
        position: pos,
        message: message.into(),
    }
}

fn tokenize(input: &str) -> Result<Vec<Spanned>, SelectionError> {
    let chars: Vec<(usize, char)> = input.char_indices().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let (pos, c) = chars[i];
        let next = chars.get(i + 1).map(|&(_, c)| c);

        let (token, width) = match c {
            c if c.is_whitespace() => {
                i += 1;
                continue;
            }
            '(' => (Token::LParen, 1),
            ')' => (Token::RParen, 1),
            '&' if next == Some('&') => (Token::And, 2),
            '|' if next == Some('|') => (Token::Or, 2),
            '=' if next == Some('=') => (Token::Cmp(Op::Eq), 2),
            '!' if next == Some('=') => (Token::Cmp(Op::Ne), 2),
            '!' => (Token::Not, 1),
            '<' if next == Some('=') => (Token::Cmp(Op::Le), 2),
            '<' => (Token::Cmp(Op::Lt), 1),
            '>' if next == Some('=') => (Token::Cmp(Op::Ge), 2),
            '>' => (Token::Cmp(Op::Gt), 1),
            '\'' | '"' => {
                let close = chars[i + 1..]
                    .iter()
                    .position(|&(_, q)| q == c)
                    .ok_or_else(|| syntax(pos, "unterminated string"))?;
                let text: String = chars[i + 1..i + 1 + close].iter().map(|&(_, c)| c).collect();
                (Token::Text(text), close + 2)
            }
            c if c.is_ascii_digit() || (c == '-' && next.is_some_and(|n| n.is_ascii_digit())) => {
                let len = 1 + chars[i + 1..]
                    .iter()
                    .take_while(|&&(_, d)| d.is_ascii_digit())
                    .count();
                let text: String = chars[i..i + len].iter().map(|&(_, c)| c).collect();
                let value = text
                    .parse()
                    .map_err(|_| syntax(pos, format!("invalid integer '{}'", text)))?;
                (Token::Int(value), len)
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let len = chars[i..]
                    .iter()
                    .take_while(|&&(_, d)| d.is_ascii_alphanumeric() || d == '_')
                    .count();
                let text: String = chars[i..i + len].iter().map(|&(_, c)| c).collect();
                (Token::Ident(text), len)
            }
            other => return Err(syntax(pos, format!("unexpected character '{}'", other))),
        };

        tokens.push(Spanned { token, pos });
        i += width;
    }

    Ok(tokens)
}

/// Deepest run of nested `!` and `(` accepted in one expression.
const MAX_NESTING: usize = 256;

struct Parser {
    tokens: Vec<Spanned>,
    at: usize,
    end: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.at).map(|s| &s.token)
    }

    fn pos(&self) -> usize {
        self.tokens.get(self.at).map_or(self.end, |s| s.pos)
    }

    fn bump(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.at).map(|s| s.token.clone());
        self.at += 1;
        token
    }

    fn or(&mut self) -> Result<Expr, SelectionError> {
        let mut lhs = self.and()?;
        while self.peek() == Some(&Token::Or) {
            self.bump();
            let rhs = self.and()?;
            lhs = Expr::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn and(&mut self) -> Result<Expr, SelectionError> {
        let mut lhs = self.unary()?;
        while self.peek() == Some(&Token::And) {
            self.bump();
            let rhs = self.unary()?;
            lhs = Expr::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn nested<T>(
        &mut self,
        pos: usize,
        inner: impl FnOnce(&mut Self) -> Result<T, SelectionError>,
    ) -> Result<T, SelectionError> {
        if self.depth >= MAX_NESTING {
            return Err(syntax(
                pos,
                format!("expression nested deeper than {} levels", MAX_NESTING),
            ));
        }
        self.depth += 1;
        let result = inner(self);
        self.depth -= 1;
        result
    }

    fn unary(&mut self) -> Result<Expr, SelectionError> {
        let pos = self.pos();
        match self.bump() {
            Some(Token::Not) => {
                let operand = self.nested(pos, Self::unary)?;
                Ok(Expr::Not(Box::new(operand)))
            }
            Some(Token::LParen) => {
                let inner = self.nested(pos, Self::or)?;
                match self.bump() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err(syntax(pos, "unbalanced parenthesis")),
                }
            }
            Some(Token::Ident(word)) => match word.as_str() {
                "all" => Ok(Expr::All),
                "none" => Ok(Expr::None),
                _ => self.comparison(&word, pos),
            },
            Some(other) => Err(syntax(pos, format!("unexpected token {:?}", other))),
            None => Err(syntax(pos, "unexpected end of expression")),
        }
    }

    fn comparison(&mut self, word: &str, pos: usize) -> Result<Expr, SelectionError> {
        let key: Key = word
            .parse()
            .map_err(|_| syntax(pos, format!("unknown keyword '{}'", word)))?;

        let op_pos = self.pos();
        let op = match self.bump() {
            Some(Token::Cmp(op)) => op,
            _ => return Err(syntax(op_pos, format!("expected a comparison after '{}'", word))),
        };

        let value_pos = self.pos();
        let value = match self.bump() {
            Some(Token::Int(v)) => Value::Int(v),
            Some(Token::Text(s)) => Value::Text(s),
            _ => return Err(syntax(value_pos, "expected a number or a quoted string")),
        };

        match (key.is_numeric(), &value) {
            (true, Value::Text(_)) => {
                return Err(syntax(value_pos, format!("'{}' compares against numbers", word)));
            }
            (false, Value::Int(_)) => {
                return Err(syntax(value_pos, format!("'{}' compares against quoted strings", word)));
            }
            (false, _) if !matches!(op, Op::Eq | Op::Ne) => {
                return Err(syntax(op_pos, format!("'{}' only supports == and !=", word)));
            }
            _ => {}
        }

        Ok(Expr::Compare(Comparison { key, op, value }))
    }
}

pub(super) fn parse(input: &str) -> Result<Expr, SelectionError> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(syntax(0, "empty expression"));
    }
    let mut parser = Parser {
        tokens,
        at: 0,
        end: input.len(),
        depth: 0,
    };
    let expr = parser.or()?;
    if parser.at < parser.tokens.len() {
        return Err(syntax(parser.pos(), "unexpected trailing input"));
    }
    Ok(expr)
}
