mod common;

use plait_core::AnyEmptyResult;

#[test]
fn cache_clear_removes_compiled_templates() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(tmp.path().join("page.html"), "<p>${title}</p>")?;

	let mut cmd = common::plait_cmd();
	let _ = cmd
		.arg("render")
		.arg("page.html")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success();

	let runtime_dir = tmp.path().join("_runtime");
	let entries = std::fs::read_dir(&runtime_dir)?.count();
	assert!(entries > 0, "expected compiled templates after render");

	let mut cmd = common::plait_cmd();
	let _ = cmd
		.arg("cache")
		.arg("clear")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains(format!(
			"Removed {entries} compiled template file(s)"
		)));

	assert_eq!(std::fs::read_dir(&runtime_dir)?.count(), 0);

	Ok(())
}

#[test]
fn cache_clear_without_runtime_dir_succeeds() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	let mut cmd = common::plait_cmd();
	let _ = cmd
		.arg("cache")
		.arg("clear")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("Removed 0 compiled template file(s)"));

	Ok(())
}
