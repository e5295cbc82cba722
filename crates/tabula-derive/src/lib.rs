use proc_macro::TokenStream;

mod entity;
mod util;

/// Derive `tabula::traits::Entity`.
///
/// Container attributes: `#[entity(prefix = "...", identity = "a, b",
/// naming = "pascal")]`. Field attributes: `#[column(name = "...",
/// prefix = "...", identity, exclude, skip, converter = "path::to::fn")]`.
#[proc_macro_derive(Entity, attributes(entity, column))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    entity::derive_entity(input.into()).into()
}
