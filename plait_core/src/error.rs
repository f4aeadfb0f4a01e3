use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum PlaitError {
	#[error(transparent)]
	#[diagnostic(code(plait::io_error))]
	Io(#[from] std::io::Error),

	#[error("source document `{path}` does not exist")]
	#[diagnostic(
		code(plait::source_missing),
		help("check the path passed to the renderer; it must point at a readable file")
	)]
	SourceMissing { path: String },

	#[error("master template `{path}` does not exist")]
	#[diagnostic(
		code(plait::master_template_missing),
		help("`<page:template file=\"...\" />` paths are relative to the including document")
	)]
	MasterTemplateMissing { path: String },

	#[error("malformed `{element}` directive: {reason}")]
	#[diagnostic(code(plait::malformed_directive))]
	MalformedDirective { element: String, reason: String },

	#[error("tag span is missing the `_tag` attribute")]
	#[diagnostic(
		code(plait::missing_tag_name),
		help("tag spans are produced by the normalizer; hand-written `<plait-tag>` markup needs `_tag=\"prefix:name\"`")
	)]
	MissingTagName,

	#[error("invalid tag name `{0}`")]
	#[diagnostic(code(plait::invalid_tag_name), help("tag names have the form `prefix:name`"))]
	InvalidTagName(String),

	#[error("call to tag `{tag}` with undeclared library prefix `{prefix}`")]
	#[diagnostic(
		code(plait::unknown_tag_library),
		help("declare the library with `<taglib prefix=\"{prefix}\" namespace=\"...\" />` or in plait.toml")
	)]
	UnknownTagLibrary { prefix: String, tag: String },

	#[error("call to undefined tag `{tag}` in namespace `{namespace}`")]
	#[diagnostic(
		code(plait::unknown_tag),
		help("register a tag factory for `{namespace}` before rendering")
	)]
	UnknownTag { tag: String, namespace: String },

	#[error("invalid expression `{expression}`: {reason}")]
	#[diagnostic(
		code(plait::invalid_expression),
		help("expressions support literals, dotted paths, comparisons, `&&`, `||`, `!` and parentheses")
	)]
	InvalidExpression { expression: String, reason: String },

	#[error("failed to parse config file: {0}")]
	#[diagnostic(
		code(plait::config_parse),
		help("check that plait.toml is valid TOML with [taglibs], [data] and/or [params] sections")
	)]
	ConfigParse(String),

	#[error("failed to load data file `{path}`: {reason}")]
	#[diagnostic(code(plait::data_file))]
	DataFile { path: String, reason: String },

	#[error("unsupported data file format: `{0}`")]
	#[diagnostic(
		code(plait::unsupported_format),
		help("supported formats: text, json, toml, yaml, yml, kdl, ini")
	)]
	UnsupportedDataFormat(String),

	#[error("unconvertible float value in data file `{path}`: {value}")]
	#[diagnostic(
		code(plait::unconvertible_float),
		help("NaN and Infinity are not valid JSON numbers")
	)]
	UnconvertibleFloat { path: String, value: String },

	#[error("failed to encode cache entry `{key}`: {reason}")]
	#[diagnostic(code(plait::cache_encode))]
	CacheEncode { key: String, reason: String },
}

pub type PlaitResult<T> = Result<T, PlaitError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;
