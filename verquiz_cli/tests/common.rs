#![allow(dead_code)]

use std::path::Path;

use assert_cmd::Command;
use insta_cmd::get_cargo_bin;

pub fn verquiz_cmd() -> Command {
	let mut cmd = Command::new(get_cargo_bin("verquiz"));
	cmd.env("NO_COLOR", "1");
	cmd.env_remove("RUST_LOG");
	cmd
}

pub const VALID_DESCRIPTION: &str = r"## Summary

Records.

## Details

Data carriers.

## Example

```java
// a point
record Point(int x) {}
```

## Historical

Java 16.

## Links

- [JEP 395](https://openjdk.org/jeps/395)
";

pub const TINY_SNIPPET: &str = "package foo;

// Expected Version: 8
interface I {}

public class Tiny_DefaultEmpty_Java8 implements I {}
";

const REGISTRY_SOURCE: &str = r#"public enum JavaFeature {
	AWT(1, true, "java.awt"),
	RECORDS(16, true, "Records");

	JavaFeature(int version, boolean stable, String label) {}
}
"#;

pub fn write_file(root: &Path, relative: &str, content: &str) -> std::io::Result<()> {
	let path = root.join(relative);
	if let Some(parent) = path.parent() {
		std::fs::create_dir_all(parent)?;
	}
	std::fs::write(path, content)
}

/// A project with two snippets, a two-feature registry and one description.
pub fn write_project(root: &Path, base_url: Option<&str>) -> std::io::Result<()> {
	let base_url = base_url
		.map(|url| format!("base_url = \"{url}\"\n\n"))
		.unwrap_or_default();

	write_file(
		root,
		"verquiz.toml",
		&format!(
			"{base_url}[sources]\nroot = \"snippets\"\n\n[registry]\npath = \
			 \"FeatureChecker.java\"\n\n[descriptions]\ndir = \"features\"\n\n[output]\ndir = \
			 \"dist\"\n\n[assets]\ncache_dir = \"cache\"\n"
		),
	)?;
	write_file(root, "FeatureChecker.java", REGISTRY_SOURCE)?;
	write_file(root, "features/RECORDS.md", VALID_DESCRIPTION)?;
	write_file(
		root,
		"snippets/Java16_Records.java",
		"// Required Features: RECORDS\npublic record Java16_Records(int x) {}\n",
	)?;
	write_file(
		root,
		"snippets/Awt.java",
		"// Expected Version: 1\n// Required Features: AWT\npublic class Awt {}\n",
	)?;
	write_file(root, "snippets/NoVersion.java", "public class NoVersion {}\n")
}
