mod common;

use verquiz_core::AnyEmptyResult;

#[test]
fn sanitize_prints_quiz_ready_code() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let file = tmp.path().join("Tiny_DefaultEmpty_Java8.java");
	std::fs::write(&file, common::TINY_SNIPPET)?;

	common::verquiz_cmd()
		.arg("sanitize")
		.arg(&file)
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout("interface I {}\n\npublic class Quiz implements I {}\n");

	Ok(())
}

#[test]
fn sanitize_uses_configured_names() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_file(
		tmp.path(),
		"verquiz.toml",
		"[sanitize]\nquiz_name = \"Puzzle\"\n",
	)?;
	let file = tmp.path().join("Snippet.java");
	std::fs::write(&file, "public class Java21Feature {}\n")?;

	common::verquiz_cmd()
		.arg("sanitize")
		.arg(&file)
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout("public class Puzzle {}\n");

	Ok(())
}

#[test]
fn sanitize_missing_file_fails() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	common::verquiz_cmd()
		.arg("sanitize")
		.arg(tmp.path().join("Missing.java"))
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(2)
		.stderr(predicates::str::contains("failed to read"));

	Ok(())
}
