//! A small boolean expression language for the `if` tag.
//!
//! Grammar, loosest binding first:
//!
//! ```text
//! or         := and (("||" | "or") and)*
//! and        := unary (("&&" | "and") unary)*
//! unary      := ("!" | "not") unary | comparison
//! comparison := primary (("==" | "!=" | "<" | "<=" | ">" | ">=") primary)?
//! primary    := number | string | "true" | "false" | "null" | path | "(" or ")"
//! ```
//!
//! Paths are dotted lookups resolved by the caller; an unknown path is
//! `null`. Nothing is executed.

use std::cmp::Ordering;

use logos::Logos;
use serde_json::Value;
use snailquote::unescape;

use crate::PlaitError;
use crate::PlaitResult;

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
enum RawToken {
	#[token("(")]
	ParenOpen,
	#[token(")")]
	ParenClose,
	#[token("!")]
	Not,
	#[token("&&")]
	And,
	#[token("||")]
	Or,
	#[token("==")]
	Eq,
	#[token("!=")]
	NotEq,
	#[token("<")]
	Lt,
	#[token("<=")]
	LtEq,
	#[token(">")]
	Gt,
	#[token(">=")]
	GtEq,
	#[regex(r"-?[0-9]+(\.[0-9]+)?")]
	Number,
	#[regex(r#""([^"\\]|\\.)*""#)]
	DoubleQuotedString,
	#[regex(r"'([^'\\]|\\.)*'")]
	SingleQuotedString,
	#[regex(r"[A-Za-z_][A-Za-z0-9_\-]*(\.[A-Za-z0-9_\-]+)*")]
	Path,
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
	ParenOpen,
	ParenClose,
	Not,
	And,
	Or,
	Compare(Comparison),
	Literal(Value),
	Path(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Comparison {
	Eq,
	NotEq,
	Lt,
	LtEq,
	Gt,
	GtEq,
}

/// Evaluate `expression` to a boolean. `lookup` resolves dotted paths.
pub(crate) fn evaluate(
	expression: &str,
	lookup: impl Fn(&str) -> Option<Value>,
) -> PlaitResult<bool> {
	let source = decode_entities(expression);
	let tokens = tokenize(&source, expression)?;
	let mut parser = Parser {
		tokens,
		cursor: 0,
		expression,
		lookup: &lookup,
	};

	let value = parser.or()?;
	if parser.cursor < parser.tokens.len() {
		return Err(parser.error("unexpected trailing input"));
	}

	Ok(truthy(&value))
}

/// Whether a value counts as true in a condition.
pub(crate) fn truthy(value: &Value) -> bool {
	match value {
		Value::Null => false,
		Value::Bool(flag) => *flag,
		Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
		Value::String(text) => !text.is_empty(),
		Value::Array(items) => !items.is_empty(),
		Value::Object(map) => !map.is_empty(),
	}
}

fn decode_entities(source: &str) -> String {
	source
		.replace("&lt;", "<")
		.replace("&gt;", ">")
		.replace("&quot;", "\"")
		.replace("&#39;", "'")
		.replace("&apos;", "'")
		.replace("&amp;", "&")
}

fn tokenize(source: &str, expression: &str) -> PlaitResult<Vec<Token>> {
	let invalid = |reason: String| {
		PlaitError::InvalidExpression {
			expression: expression.to_string(),
			reason,
		}
	};

	let mut tokens = Vec::new();
	for (result, span) in RawToken::lexer(source).spanned() {
		let slice = &source[span.clone()];
		let Ok(raw) = result else {
			return Err(invalid(format!("unexpected `{slice}` at offset {}", span.start)));
		};

		let token = match raw {
			RawToken::ParenOpen => Token::ParenOpen,
			RawToken::ParenClose => Token::ParenClose,
			RawToken::Not => Token::Not,
			RawToken::And => Token::And,
			RawToken::Or => Token::Or,
			RawToken::Eq => Token::Compare(Comparison::Eq),
			RawToken::NotEq => Token::Compare(Comparison::NotEq),
			RawToken::Lt => Token::Compare(Comparison::Lt),
			RawToken::LtEq => Token::Compare(Comparison::LtEq),
			RawToken::Gt => Token::Compare(Comparison::Gt),
			RawToken::GtEq => Token::Compare(Comparison::GtEq),
			RawToken::Number => Token::Literal(parse_number(slice).ok_or_else(|| {
				invalid(format!("`{slice}` is not a valid number"))
			})?),
			RawToken::DoubleQuotedString | RawToken::SingleQuotedString => {
				let inner = &slice[1..slice.len() - 1];
				let text = if inner.contains('\\') {
					unescape(inner).map_err(|e| invalid(e.to_string()))?
				} else {
					inner.to_string()
				};
				Token::Literal(Value::String(text))
			}
			RawToken::Path => {
				match slice {
					"true" => Token::Literal(Value::Bool(true)),
					"false" => Token::Literal(Value::Bool(false)),
					"null" => Token::Literal(Value::Null),
					"and" => Token::And,
					"or" => Token::Or,
					"not" => Token::Not,
					_ => Token::Path(slice.to_string()),
				}
			}
		};
		tokens.push(token);
	}

	Ok(tokens)
}

fn parse_number(slice: &str) -> Option<Value> {
	if let Ok(integer) = slice.parse::<i64>() {
		return Some(Value::from(integer));
	}
	let float = slice.parse::<f64>().ok()?;
	serde_json::Number::from_f64(float).map(Value::Number)
}

struct Parser<'a, F: Fn(&str) -> Option<Value>> {
	tokens: Vec<Token>,
	cursor: usize,
	expression: &'a str,
	lookup: &'a F,
}

impl<F: Fn(&str) -> Option<Value>> Parser<'_, F> {
	fn error(&self, reason: &str) -> PlaitError {
		PlaitError::InvalidExpression {
			expression: self.expression.to_string(),
			reason: reason.to_string(),
		}
	}

	fn peek(&self) -> Option<&Token> {
		self.tokens.get(self.cursor)
	}

	fn or(&mut self) -> PlaitResult<Value> {
		let mut left = self.and()?;
		while self.peek() == Some(&Token::Or) {
			self.cursor += 1;
			let right = self.and()?;
			left = Value::Bool(truthy(&left) || truthy(&right));
		}
		Ok(left)
	}

	fn and(&mut self) -> PlaitResult<Value> {
		let mut left = self.unary()?;
		while self.peek() == Some(&Token::And) {
			self.cursor += 1;
			let right = self.unary()?;
			left = Value::Bool(truthy(&left) && truthy(&right));
		}
		Ok(left)
	}

	fn unary(&mut self) -> PlaitResult<Value> {
		if self.peek() == Some(&Token::Not) {
			self.cursor += 1;
			let operand = self.unary()?;
			return Ok(Value::Bool(!truthy(&operand)));
		}
		self.comparison()
	}

	fn comparison(&mut self) -> PlaitResult<Value> {
		let left = self.primary()?;
		let Some(Token::Compare(op)) = self.peek().cloned() else {
			return Ok(left);
		};
		self.cursor += 1;
		let right = self.primary()?;
		Ok(Value::Bool(compare(&left, op, &right)))
	}

	fn primary(&mut self) -> PlaitResult<Value> {
		let Some(token) = self.tokens.get(self.cursor).cloned() else {
			return Err(self.error("unexpected end of expression"));
		};
		self.cursor += 1;

		match token {
			Token::Literal(value) => Ok(value),
			Token::Path(path) => Ok((self.lookup)(&path).unwrap_or(Value::Null)),
			Token::ParenOpen => {
				let value = self.or()?;
				if self.peek() != Some(&Token::ParenClose) {
					return Err(self.error("missing closing parenthesis"));
				}
				self.cursor += 1;
				Ok(value)
			}
			_ => Err(self.error("expected a value")),
		}
	}
}

fn as_number(value: &Value) -> Option<f64> {
	match value {
		Value::Number(number) => number.as_f64(),
		Value::String(text) => text.trim().parse().ok(),
		_ => None,
	}
}

fn compare(left: &Value, op: Comparison, right: &Value) -> bool {
	let ordering = match (left, right) {
		(Value::String(a), Value::String(b)) => Some(a.cmp(b)),
		(Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
		(Value::Null, Value::Null) => Some(Ordering::Equal),
		_ => {
			match (as_number(left), as_number(right)) {
				(Some(a), Some(b)) => a.partial_cmp(&b),
				_ => None,
			}
		}
	};

	match op {
		Comparison::Eq => ordering.map_or_else(|| left == right, Ordering::is_eq),
		Comparison::NotEq => ordering.map_or_else(|| left != right, Ordering::is_ne),
		Comparison::Lt => ordering.is_some_and(Ordering::is_lt),
		Comparison::LtEq => ordering.is_some_and(Ordering::is_le),
		Comparison::Gt => ordering.is_some_and(Ordering::is_gt),
		Comparison::GtEq => ordering.is_some_and(Ordering::is_ge),
	}
}
