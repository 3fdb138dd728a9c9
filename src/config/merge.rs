//! Shallow override merge.
//!
//! Only the `build` table is merged key by key; every other top-level key
//! of the override replaces the default. Nested tables are never merged
//! recursively: `build.path` from an override replaces the whole default
//! `build.path`.

use toml::{Table, Value};

const BUILD_KEY: &str = "build";

/// Apply `overlay` on top of `base`.
pub fn shallow_merge(mut base: Table, overlay: Table) -> Table {
    for (key, value) in overlay {
        match value {
            Value::Table(over) if key == BUILD_KEY => {
                let build = base
                    .entry(key)
                    .or_insert_with(|| Value::Table(Table::new()));
                match build {
                    Value::Table(build) => build.extend(over),
                    other => *other = Value::Table(over),
                }
            }
            value => {
                base.insert(key, value);
            }
        }
    }
    base
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(src: &str) -> Table {
        toml::from_str(src).unwrap()
    }

    #[test]
    fn test_build_keys_replaced_individually() {
        let base = table("[build]\nsrc = \"src\"\ndist = \"dist\"\n");
        let merged = shallow_merge(base, table("[build]\nsrc = \"app\"\n"));

        assert_eq!(merged["build"]["src"].as_str(), Some("app"));
        assert_eq!(merged["build"]["dist"].as_str(), Some("dist"));
    }

    #[test]
    fn test_nested_build_table_replaced_wholesale() {
        let base = table("[build.path]\nstyles = \"a\"\nscripts = \"b\"\n");
        let merged = shallow_merge(base, table("[build.path]\nstyles = \"c\"\n"));

        let path = merged["build"]["path"].as_table().unwrap();
        assert_eq!(path.len(), 1);
        assert_eq!(path["styles"].as_str(), Some("c"));
    }

    #[test]
    fn test_other_top_level_keys_replaced() {
        let base = table("[data]\ntitle = \"a\"\nauthor = \"b\"\n");
        let merged = shallow_merge(base, table("[data]\ntitle = \"c\"\n"));

        let data = merged["data"].as_table().unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(data["title"].as_str(), Some("c"));
    }

    #[test]
    fn test_new_keys_added() {
        let merged = shallow_merge(Table::new(), table("extra = 1\n[build]\nsrc = \"x\"\n"));
        assert_eq!(merged["extra"].as_integer(), Some(1));
        assert_eq!(merged["build"]["src"].as_str(), Some("x"));
    }

    #[test]
    fn test_non_table_build_replaces() {
        let base = table("[build]\nsrc = \"src\"\n");
        let merged = shallow_merge(base, table("build = \"flat\"\n"));
        assert_eq!(merged["build"].as_str(), Some("flat"));
    }
}
