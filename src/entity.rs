use core::{fmt, num::NonZeroU64};
use web_sys::Element;

/// Opaque identifier of a host entity (a stage).
///
/// `0` never identifies anything; the host uses it as "no id".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(NonZeroU64);

impl EntityId {
	#[must_use]
	pub fn new(id: u64) -> Option<Self> {
		NonZeroU64::new(id).map(Self)
	}

	#[must_use]
	pub fn get(self) -> u64 {
		self.0.get()
	}

	/// Reads an id attribute value the way the host writes it: leading decimal digits after optional
	/// whitespace, with anything after them ignored.
	#[must_use]
	pub fn parse(value: &str) -> Option<Self> {
		let value = value.trim_start();
		let digits = value.find(|c: char| !c.is_ascii_digit()).map_or(value, |end| &value[..end]);
		digits.parse().ok().and_then(Self::new)
	}

	/// Fallback for containers without an id attribute: a tooltip ending in `(<digits>)`,
	/// as in `"Qualified (42)"`.
	///
	/// Anything after the closing parenthesis, including whitespace, means no match.
	#[must_use]
	pub fn from_tooltip(text: &str) -> Option<Self> {
		let (_, digits) = text.strip_suffix(')')?.rsplit_once('(')?;
		if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
			return None;
		}
		digits.parse().ok().and_then(Self::new)
	}

	/// The first of `id_attributes` on `element` that parses.
	#[must_use]
	pub fn from_attributes(element: &Element, id_attributes: &[String]) -> Option<Self> {
		id_attributes.iter().find_map(|name| element.get_attribute(name).as_deref().and_then(Self::parse))
	}

	/// Resolves the id of `element`: the first of `id_attributes` that parses wins,
	/// then the tooltip fallback.
	#[must_use]
	pub fn resolve(element: &Element, id_attributes: &[String], tooltip_attribute: &str) -> Option<Self> {
		Self::from_attributes(element, id_attributes).or_else(|| element.get_attribute(tooltip_attribute).as_deref().and_then(Self::from_tooltip))
	}
}

impl fmt::Display for EntityId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		self.0.fmt(f)
	}
}

/// A CSS color value as configured on the host side.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Color(String);

impl Color {
	/// Hex colors are normalised to carry a leading `#`.
	/// Other values (keywords, `rgb(…)`) pass if they contain nothing but characters valid in them.
	#[must_use]
	pub fn parse(value: &str) -> Option<Self> {
		let value = value.trim();
		let hex = value.strip_prefix('#').unwrap_or(value);
		if matches!(hex.len(), 3 | 4 | 6 | 8) && hex.bytes().all(|b| b.is_ascii_hexdigit()) {
			return Some(Self(format!("#{}", hex)));
		}
		if value.is_empty()
			|| value.starts_with('#')
			|| !value.bytes().all(|b| b.is_ascii_alphanumeric() || b" (),.%-".contains(&b))
		{
			return None;
		}
		Some(Self(value.to_owned()))
	}

	pub(crate) fn white() -> Self {
		Self("#fff".to_owned())
	}

	#[must_use]
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for Color {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// Presentation of one entity. Replaced wholesale on refresh, never patched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityColorRecord {
	pub background: Color,
	pub foreground: Color,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn attribute_ids() {
		assert_eq!(EntityId::parse("5"), EntityId::new(5));
		assert_eq!(EntityId::parse(" 12px"), EntityId::new(12));
		assert_eq!(EntityId::parse("0"), None);
		assert_eq!(EntityId::parse(""), None);
		assert_eq!(EntityId::parse("new"), None);
		assert_eq!(EntityId::parse("-3"), None);
	}

	#[test]
	fn tooltip_fallback() {
		assert_eq!(EntityId::from_tooltip("Qualified (42)"), EntityId::new(42));
		assert_eq!(EntityId::from_tooltip("Proposition (Q3) (7)"), EntityId::new(7));
		assert_eq!(EntityId::from_tooltip("Qualified (42) "), None);
		assert_eq!(EntityId::from_tooltip("Qualified ()"), None);
		assert_eq!(EntityId::from_tooltip("Qualified (x1)"), None);
		assert_eq!(EntityId::from_tooltip("Qualified (0)"), None);
		assert_eq!(EntityId::from_tooltip("Qualified"), None);
	}

	#[test]
	fn colors() {
		assert_eq!(Color::parse("#ff0000").unwrap().as_str(), "#ff0000");
		assert_eq!(Color::parse(" 3498db ").unwrap().as_str(), "#3498db");
		assert_eq!(Color::parse("#FFF").unwrap().as_str(), "#FFF");
		assert_eq!(Color::parse("rgb(10, 20, 30)").unwrap().as_str(), "rgb(10, 20, 30)");
		assert_eq!(Color::parse("rebeccapurple").unwrap().as_str(), "rebeccapurple");
		assert_eq!(Color::parse(""), None);
		assert_eq!(Color::parse("#12345"), None);
		assert_eq!(Color::parse("red; display: none"), None);
	}
}
