//! Build and assertion helpers shared by model tests.

use feb::{BuildError, Category, Feb, FebError, Model, Options, TypeRegistry};

/// Build a model with the built-in registry and default options.
pub fn build_str(text: &str) -> Result<Model, BuildError> {
    let registry = TypeRegistry::febio();
    Feb::new(&registry).read_str(text)
}

/// Build a model with custom options.
pub fn build_with(text: &str, options: Options) -> Result<Model, BuildError> {
    let registry = TypeRegistry::febio();
    Feb::with_options(&registry, options).read_str(text)
}

/// Build a model, panicking with the locator on failure.
pub fn build_ok(text: &str) -> Model {
    build_str(text).unwrap_or_else(|e| panic!("build failed: {e}"))
}

/// Emit and render a model with the built-in registry.
pub fn render(model: &Model) -> String {
    let registry = TypeRegistry::febio();
    Feb::new(&registry)
        .write_string(model)
        .unwrap_or_else(|e| panic!("emit failed: {e}"))
}

/// Assert a build failed with a dangling reference of `category` to `name`.
pub fn assert_dangling(result: Result<Model, BuildError>, category: Category, name: &str) {
    match result {
        Ok(_) => panic!("expected a dangling {category} reference to '{name}'"),
        Err(err) => assert_eq!(
            err.cause(),
            &FebError::dangling(category, name),
            "unexpected failure at {}",
            err.locator
        ),
    }
}

/// Assert a build failed with a duplicate `category` name or id.
pub fn assert_duplicate(result: Result<Model, BuildError>, category: Category, name: &str) {
    match result {
        Ok(_) => panic!("expected a duplicate {category} '{name}'"),
        Err(err) => assert_eq!(
            err.cause(),
            &FebError::duplicate(category, name),
            "unexpected failure at {}",
            err.locator
        ),
    }
}
