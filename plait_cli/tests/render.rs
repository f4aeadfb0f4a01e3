mod common;

use plait_cli::Commands;
use plait_cli::PlaitCli;
use plait_core::AnyEmptyResult;
use plait_core::Fingerprint;
use predicates::prelude::PredicateBooleanExt;

use clap::Parser;

#[test]
fn render_substitutes_variables_from_data_file() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(tmp.path().join("page.html"), "<p>Hello ${user.name}</p>")?;
	std::fs::write(tmp.path().join("data.json"), r#"{"user":{"name":"Ana"}}"#)?;

	let mut cmd = common::plait_cmd();
	let _ = cmd
		.arg("render")
		.arg("page.html")
		.arg("--data")
		.arg("data.json")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout("<p>Hello Ana</p>");

	Ok(())
}

#[test]
fn render_removes_unresolved_variables() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(tmp.path().join("page.html"), "[${missing.value}]")?;

	let mut cmd = common::plait_cmd();
	let _ = cmd
		.arg("render")
		.arg("page.html")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout("[]");

	Ok(())
}

#[test]
fn render_uses_master_template_and_config_data() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(
		tmp.path().join("plait.toml"),
		"[data]\nsite = \"site.toml\"\n",
	)?;
	std::fs::write(tmp.path().join("site.toml"), "title = \"Docs\"\n")?;
	std::fs::write(
		tmp.path().join("layout.html"),
		"<nav><page:contentHolder id=\"nav\" /></nav>",
	)?;
	std::fs::write(
		tmp.path().join("page.html"),
		"<page:template file=\"layout.html\" />\n<page:content id=\"nav\"><core:link \
		 href=\"/\">${site.title}</core:link></page:content>",
	)?;

	let mut cmd = common::plait_cmd();
	let _ = cmd
		.arg("render")
		.arg("page.html")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout("<nav><a href=\"/\">Docs</a></nav>");

	Ok(())
}

#[test]
fn render_writes_output_file() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(
		tmp.path().join("page.html"),
		"<core:if exp=\"count &gt; 2\">many<else>few</else></core:if>",
	)?;
	std::fs::write(tmp.path().join("data.yaml"), "count: 3\n")?;

	let mut cmd = common::plait_cmd();
	let _ = cmd
		.arg("render")
		.arg("page.html")
		.arg("-d")
		.arg("data.yaml")
		.arg("-o")
		.arg("out/page.html")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::is_empty())
		.stderr(predicates::str::contains("rendered"));

	let rendered = std::fs::read_to_string(tmp.path().join("out/page.html"))?;
	similar_asserts::assert_eq!(rendered, "many");

	Ok(())
}

#[test]
fn render_keys_non_object_data_by_file_stem() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(tmp.path().join("page.html"), "${motd}")?;
	std::fs::write(tmp.path().join("motd.txt"), "Welcome")?;

	let mut cmd = common::plait_cmd();
	let _ = cmd
		.arg("render")
		.arg("page.html")
		.arg("--data")
		.arg("motd.txt")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout("Welcome");

	Ok(())
}

#[test]
fn render_writes_compiled_template_to_runtime_dir() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let source = "<p>${title}</p>";
	std::fs::write(tmp.path().join("page.html"), source)?;

	let mut cmd = common::plait_cmd();
	let _ = cmd
		.arg("render")
		.arg("page.html")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success();

	let entry = tmp
		.path()
		.join("_runtime")
		.join(Fingerprint::of(source).as_str());
	assert!(entry.is_file(), "expected cache entry at {}", entry.display());

	Ok(())
}

#[test]
fn render_reads_cached_template_unless_debug() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let source = "fresh";
	std::fs::write(tmp.path().join("page.html"), source)?;

	let runtime_dir = tmp.path().join("_runtime");
	std::fs::create_dir_all(&runtime_dir)?;
	std::fs::write(runtime_dir.join(Fingerprint::of(source).as_str()), "stale")?;

	let mut cmd = common::plait_cmd();
	let _ = cmd
		.arg("render")
		.arg("page.html")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout("stale");

	let mut cmd = common::plait_cmd();
	let _ = cmd
		.arg("render")
		.arg("page.html")
		.arg("--debug")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout("fresh");

	Ok(())
}

#[test]
fn render_honors_configured_runtime_dir() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let source = "cached";
	std::fs::write(tmp.path().join("page.html"), source)?;
	std::fs::write(
		tmp.path().join(".plait.toml"),
		"runtime_dir = \"build/templates\"\n",
	)?;

	let mut cmd = common::plait_cmd();
	let _ = cmd
		.arg("render")
		.arg("page.html")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success();

	assert!(
		tmp.path()
			.join("build/templates")
			.join(Fingerprint::of(source).as_str())
			.is_file()
	);
	assert!(!tmp.path().join("_runtime").exists());

	Ok(())
}

#[test]
fn render_fails_for_missing_source() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	let mut cmd = common::plait_cmd();
	let _ = cmd
		.arg("render")
		.arg("missing.html")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(2)
		.stderr(predicates::str::contains("plait::source_missing"))
		.stderr(predicates::str::contains("missing.html"));

	Ok(())
}

#[test]
fn render_fails_for_unknown_tag() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(
		tmp.path().join("page.html"),
		"<taglib prefix=\"ui\" namespace=\"acme.ui\" /><ui:card />",
	)?;

	let mut cmd = common::plait_cmd();
	let _ = cmd
		.arg("render")
		.arg("page.html")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(2)
		.stderr(predicates::str::contains("plait::unknown_tag"))
		.stdout(predicates::str::contains("ui:card").not());

	Ok(())
}

#[test]
fn render_fails_for_unsupported_data_format() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(tmp.path().join("page.html"), "x")?;
	std::fs::write(tmp.path().join("data.csv"), "a,b")?;

	let mut cmd = common::plait_cmd();
	let _ = cmd
		.arg("render")
		.arg("page.html")
		.arg("--data")
		.arg("data.csv")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(2)
		.stderr(predicates::str::contains("plait::unsupported_format"));

	Ok(())
}

#[test]
fn render_flags_parse() {
	let cli = PlaitCli::parse_from(["plait", "render", "page.html", "--watch", "-d", "a.json"]);
	match cli.command {
		Some(Commands::Render {
			file,
			data,
			output,
			debug,
			watch,
		}) => {
			assert_eq!(file, std::path::PathBuf::from("page.html"));
			assert_eq!(data, vec![std::path::PathBuf::from("a.json")]);
			assert!(output.is_none());
			assert!(!debug);
			assert!(watch);
		}
		_ => panic!("expected Render command"),
	}
}

#[test]
fn no_subcommand_exits_with_usage_hint() {
	let mut cmd = common::plait_cmd();
	let _ = cmd
		.assert()
		.code(1)
		.stderr(predicates::str::contains("plait --help"));
}
