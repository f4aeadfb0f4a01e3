mod common;

use plait_cli::Commands;
use plait_cli::OutputFormat;
use plait_cli::PlaitCli;
use plait_core::AnyEmptyResult;
use plait_core::Fingerprint;
use rstest::rstest;
use serde_json::Value;
use similar_asserts::assert_eq;

use clap::Parser;

#[test]
fn compose_prints_normalized_document() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(
		tmp.path().join("page.html"),
		"<taglib prefix=\"ui\" namespace=\"acme.ui\" /><core:link href=\"/\">${title}</core:link>",
	)?;

	let mut cmd = common::plait_cmd();
	let output = cmd
		.arg("compose")
		.arg("page.html")
		.arg("--path")
		.arg(tmp.path())
		.output()?;
	assert!(output.status.success());
	let stdout = String::from_utf8(output.stdout)?;

	let mut settings = insta::Settings::clone_current();
	settings.add_filter(r"(?m)^.*page\.html$", "[SOURCE]");
	settings.add_filter(r"[0-9a-f]{32}", "[FINGERPRINT]");
	settings.bind(|| {
		insta::assert_snapshot!(stdout, @r#"
		[SOURCE]
		Fingerprint    [FINGERPRINT]

		Tag libraries
		  core         plait.core
		  ui           acme.ui

		Document
		<plait-tag _tag="core:link" href="/">${[FINGERPRINT]:title}</plait-tag>
		"#);
	});

	Ok(())
}

#[test]
fn compose_fingerprint_matches_raw_document() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let source = "<p>${title}</p>";
	std::fs::write(tmp.path().join("page.html"), source)?;
	let fingerprint = Fingerprint::of(source);

	let mut cmd = common::plait_cmd();
	let _ = cmd
		.arg("compose")
		.arg("page.html")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains(format!(
			"Fingerprint    {fingerprint}"
		)))
		.stdout(predicates::str::contains(format!(
			"<p>${{{fingerprint}:title}}</p>"
		)));

	Ok(())
}

#[test]
fn compose_json_reports_taglibs() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(
		tmp.path().join("page.html"),
		"<taglib prefix=\"ui\" namespace=\"acme.ui\" /><ui:card />",
	)?;

	let mut cmd = common::plait_cmd();
	let output = cmd
		.arg("compose")
		.arg("page.html")
		.arg("--format")
		.arg("json")
		.arg("--path")
		.arg(tmp.path())
		.output()?;

	assert!(output.status.success());
	let json: Value = serde_json::from_slice(&output.stdout)?;
	assert_eq!(json["taglibs"]["ui"], "acme.ui");
	assert_eq!(json["taglibs"]["core"], "plait.core");
	assert_eq!(
		json["text"],
		"<plait-tag _tag=\"ui:card\"></plait-tag>"
	);
	assert!(
		json["path"]
			.as_str()
			.is_some_and(|path| path.ends_with("page.html"))
	);

	Ok(())
}

#[test]
fn compose_does_not_write_cache() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(tmp.path().join("page.html"), "plain")?;

	let mut cmd = common::plait_cmd();
	let _ = cmd
		.arg("compose")
		.arg("page.html")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success();

	assert!(!tmp.path().join("_runtime").exists());

	Ok(())
}

#[test]
fn compose_fails_for_missing_master() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(
		tmp.path().join("page.html"),
		"<page:template file=\"nowhere.html\" />",
	)?;

	let mut cmd = common::plait_cmd();
	let _ = cmd
		.arg("compose")
		.arg("page.html")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(2)
		.stderr(predicates::str::contains("plait::master_template_missing"));

	Ok(())
}

#[rstest]
#[case::default(&["plait", "compose", "page.html"], OutputFormat::Text)]
#[case::text(&["plait", "compose", "page.html", "--format", "text"], OutputFormat::Text)]
#[case::json(&["plait", "compose", "page.html", "--format", "json"], OutputFormat::Json)]
fn compose_format_flag_parses(#[case] args: &[&str], #[case] expected: OutputFormat) {
	let cli = PlaitCli::parse_from(args.iter().copied());
	match cli.command {
		Some(Commands::Compose { format, .. }) => {
			assert_eq!(format, expected);
		}
		_ => panic!("expected Compose command"),
	}
}
