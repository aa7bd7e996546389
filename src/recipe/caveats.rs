// src/recipe/caveats.rs

//! Post-install guidance

use crate::recipe::format::Recipe;
use crate::recipe::plan::template_vars;
use crate::recipe::probe::EnvironmentFacts;
use std::path::{Path, PathBuf};

/// Renders a recipe's `[caveats]` template
pub struct CaveatsRenderer<'a> {
    recipe: &'a Recipe,
    prefix: PathBuf,
}

impl<'a> CaveatsRenderer<'a> {
    pub fn new(recipe: &'a Recipe, prefix: &Path) -> Self {
        Self {
            recipe,
            prefix: prefix.to_path_buf(),
        }
    }

    /// Interpolate the prefix and runtime facts into the template
    ///
    /// Returns `None` when the recipe has no caveats.
    pub fn render(&self, facts: Option<&EnvironmentFacts>) -> Option<String> {
        let caveats = self.recipe.caveats.as_ref()?;
        let vars = template_vars(Path::new(""), &self.prefix, facts);
        let vars: Vec<(&str, &str)> = vars.iter().map(|(k, v)| (*k, v.as_str())).collect();

        let text = self.recipe.substitute(&caveats.text, &vars);
        Some(text.trim_end().to_string() + "\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::parser::parse_recipe;
    use crate::recipe::probe::LibraryLayout;

    const RECIPE: &str = r#"
[package]
name = "demo"
version = "1.0"

[source]
archive = "https://example.com/demo.tgz"
checksum = "sha256:0000000000000000000000000000000000000000000000000000000000000000"

[caveats]
text = """
export DEMO_HOME=%(prefix)s/share/demo
export PYTHONPATH=$PYTHONPATH:%(prefix)s/lib/%(runtime_short_name)s/site-packages
"""
"#;

    #[test]
    fn test_render() {
        let recipe = parse_recipe(RECIPE).unwrap();
        let facts = EnvironmentFacts {
            runtime_version: "2.7".to_string(),
            short_name: "python2.7".to_string(),
            prefix: PathBuf::from("/usr"),
            library: PathBuf::from("/usr/lib/libpython2.7.so"),
            include: PathBuf::from("/usr/include/python2.7"),
            layout: LibraryLayout::Dynamic,
        };

        let text = CaveatsRenderer::new(&recipe, Path::new("/opt/demo"))
            .render(Some(&facts))
            .unwrap();
        assert_eq!(
            text,
            "export DEMO_HOME=/opt/demo/share/demo\n\
             export PYTHONPATH=$PYTHONPATH:/opt/demo/lib/python2.7/site-packages\n"
        );
    }

    #[test]
    fn test_no_caveats() {
        let content = RECIPE.split("[caveats]").next().unwrap();
        let recipe = parse_recipe(content).unwrap();
        assert!(CaveatsRenderer::new(&recipe, Path::new("/opt")).render(None).is_none());
    }
}
