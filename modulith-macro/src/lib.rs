use proc_macro::TokenStream;

mod module;

/// Attribute macro for declaring a composable module and its dependencies
///
/// Expands to a `ModuleMeta` implementation carrying the module identity and
/// the declared dependency list, in declaration order.
///
/// # Example
/// ```ignore
/// use modulith::module;
///
/// #[module(depends_on = [DatabaseModule, CacheModule])]
/// #[derive(Default)]
/// pub struct AppModule;
/// ```
#[proc_macro_attribute]
pub fn module(attr: TokenStream, item: TokenStream) -> TokenStream {
    module::module_attribute(attr, item)
}
