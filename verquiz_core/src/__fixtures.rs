use std::path::Path;

pub(crate) const REGISTRY_SOURCE: &str = r#"package me.bechberger.check;

public class FeatureChecker {

	public enum JavaFeature {
		AWT(1, true, "java.awt"),
		GENERICS(5, true, "Generics"),
		RECORDS(16, true, "Records", "java.lang.Record"),
		SWITCH_EXPRESSIONS(14, true, "Switch \"expressions\""),
		ALPHA3_ARRAY_SYNTAX(-1, false, "Alpha array syntax"),
		RECORDS(17, true, "Duplicate");

		private final int version;

		JavaFeature(int version, boolean stable, String label, String... classes) {
			this.version = version;
		}
	}

	public enum Other {
		NOT_A_FEATURE(3, true, "ignored")
	}
}
"#;

pub(crate) const VALID_DESCRIPTION: &str = r"## Summary

Records are transparent carriers for immutable data.

## Details

A record declares its components in the header.

### Components

Each component becomes a private final field.

## Example

```java
// a point with two components
record Point(int x, int y) {}
```

## Historical

Previewed in Java 14 and finalized in Java 16.

## Links

- [JEP 395: Records](https://openjdk.org/jeps/395)
- [Record classes](https://docs.oracle.com/en/java/javase/17/language/records.html)
";

pub(crate) const HELLO_WORLD: &str = r#"public class HelloWorld {
	public static void main(String[] args) {
		System.out.println("Hello");
	}
}"#;

pub(crate) const TINY_SNIPPET: &str = "package foo;

// Expected Version: 8
// Required Features: DEFAULT_METHODS
interface I {
	default void run() {}
}

public class Tiny_DefaultEmpty_Java8 implements I {}
";

/// Write `content` to `root/relative`, creating parent directories.
pub(crate) fn write_file(root: &Path, relative: &str, content: &str) {
	let path = root.join(relative);
	if let Some(parent) = path.parent() {
		std::fs::create_dir_all(parent)
			.unwrap_or_else(|e| panic!("create {}: {e}", parent.display()));
	}
	std::fs::write(&path, content).unwrap_or_else(|e| panic!("write {}: {e}", path.display()));
}

/// A description document with the given Example and Links section bodies.
pub(crate) fn description_with(example: &str, links: &str) -> String {
	format!(
		"## Summary\n\nShort.\n\n## Details\n\nLonger.\n\n## Example\n\n{example}\n\n## \
		 Historical\n\nOld.\n\n## Links\n\n{links}\n"
	)
}

/// A small project tree: two snippets, a registry and one description.
pub(crate) fn write_project(root: &Path) {
	write_file(
		root,
		"verquiz.toml",
		r#"base_url = "https://quiz.example.com/"

[sources]
root = "snippets"

[registry]
path = "FeatureChecker.java"

[descriptions]
dir = "features"

[output]
dir = "dist"
template = "template.html"

[assets]
cache_dir = "cache"
scripts = [{ name = "LemonadeJS", url = "https://lemonadejs.com/v5/lemonade.js" }]
styles = [{ name = "Prism CSS", url = "https://cdn.example.com/prism.css" }]
"#,
	);
	write_file(root, "FeatureChecker.java", REGISTRY_SOURCE);
	write_file(root, "features/RECORDS.md", VALID_DESCRIPTION);
	write_file(
		root,
		"snippets/records/Java16_Records.java",
		"// Required Features: RECORDS\npublic record Java16_Records(int x) {}\n",
	);
	write_file(
		root,
		"snippets/awt/Awt.java",
		"/* Expected Version: 1 */\n// Required Features: AWT\nimport java.awt.Frame;\npublic class Awt {\n\tFrame frame;\n}\n",
	);
	write_file(
		root,
		"template.html",
		"<html><head><base href=\"{{ base_url }}/\"><style>{{ style }}</style>{{ analytics \
		 }}</head><body data-count=\"{{ entry_count }}\"></body></html>",
	);
}
