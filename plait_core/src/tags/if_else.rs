use std::ops::Range;

use serde_json::Value;

use crate::OutputParams;
use crate::PlaitResult;
use crate::Tag;
use crate::TagBody;
use crate::locator::top_level_spans;
use crate::markup::find_ci;
use crate::tags::expression;

const ELSE_OPEN: &str = "<else>";
const ELSE_CLOSE: &str = "</else>";

/// Conditional branch: `<core:if exp="...">then<else>otherwise</else></core:if>`.
///
/// The branch that is not taken is dropped from the output, so tags inside it
/// are never expanded.
#[derive(Debug, Default)]
pub struct IfElse {
	exp: Option<Value>,
}

impl Tag for IfElse {
	fn set_attribute(&mut self, name: &str, value: Value) -> Option<Value> {
		if name == "exp" {
			self.exp = Some(value);
			return None;
		}
		Some(value)
	}

	fn render(&mut self, body: &TagBody<'_>, output: &mut OutputParams) -> PlaitResult<String> {
		let condition = match &self.exp {
			None => true,
			Some(Value::String(source)) if source.trim().is_empty() => true,
			Some(Value::String(source)) => {
				expression::evaluate(source, |path| body.lookup(output, path).cloned())?
			}
			Some(value) => expression::truthy(value),
		};

		let inner = body.inner;
		let branch = find_else(inner);

		let rendered = if condition {
			match branch {
				Some(else_range) => {
					let mut then = String::with_capacity(inner.len());
					then.push_str(&inner[..else_range.start]);
					then.push_str(&inner[else_range.end..]);
					then.trim().to_string()
				}
				None => inner.trim().to_string(),
			}
		} else {
			match branch {
				Some(else_range) => {
					inner[else_range.start + ELSE_OPEN.len()..else_range.end - ELSE_CLOSE.len()]
						.trim()
						.to_string()
				}
				None => String::new(),
			}
		};

		Ok(rendered)
	}
}

/// Byte range of the first `<else>…</else>` element that belongs to this tag
/// rather than to a nested tag span.
fn find_else(inner: &str) -> Option<Range<usize>> {
	let nested = top_level_spans(inner);
	let outside = |index: usize| !nested.iter().any(|range| range.contains(&index));

	let mut from = 0;
	let start = loop {
		let index = find_ci(inner, ELSE_OPEN, from)?;
		if outside(index) {
			break index;
		}
		from = index + ELSE_OPEN.len();
	};

	let mut from = start + ELSE_OPEN.len();
	let end = loop {
		let index = find_ci(inner, ELSE_CLOSE, from)?;
		if outside(index) {
			break index;
		}
		from = index + ELSE_CLOSE.len();
	};

	Some(start..end + ELSE_CLOSE.len())
}
