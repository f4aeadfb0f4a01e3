use crate::OutputParams;
use crate::PlaitResult;
use crate::Tag;
use crate::TagBody;
use crate::context::scalar_text;

/// Renders an anchor element from the tag's attributes:
/// `<core:link href="/home" class="nav">Home</core:link>` becomes
/// `<a href="/home" class="nav">Home</a>`.
#[derive(Debug, Default)]
pub struct Link;

impl Tag for Link {
	fn render(&mut self, body: &TagBody<'_>, _output: &mut OutputParams) -> PlaitResult<String> {
		let mut anchor = String::from("<a");
		for (name, value) in body.attributes.iter() {
			let text = scalar_text(value).unwrap_or_else(|| value.to_string());
			anchor.push_str(&format!(" {name}=\"{text}\""));
		}
		anchor.push('>');
		anchor.push_str(body.inner);
		anchor.push_str("</a>");
		Ok(anchor)
	}
}
