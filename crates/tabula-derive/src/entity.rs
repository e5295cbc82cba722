use crate::util::{inner_type, is_byte, split_names};
use darling::{FromDeriveInput, FromField, ast::Data, util::Ignored};
use proc_macro2::TokenStream;
use quote::quote;
use syn::{DeriveInput, Ident, Path, Type, ext::IdentExt};

///
/// EntityInput
///

#[derive(Debug, FromDeriveInput)]
#[darling(attributes(entity), supports(struct_named))]
struct EntityInput {
    ident: Ident,
    generics: syn::Generics,
    data: Data<Ignored, EntityField>,

    #[darling(default)]
    prefix: Option<String>,

    #[darling(default, map = "split_names")]
    identity: Vec<String>,

    #[darling(default)]
    naming: Option<String>,
}

///
/// EntityField
///

#[derive(Debug, FromField)]
#[darling(attributes(column))]
struct EntityField {
    ident: Option<Ident>,
    ty: Type,

    #[darling(default)]
    name: Option<String>,

    #[darling(default)]
    prefix: Option<String>,

    #[darling(default)]
    identity: bool,

    #[darling(default)]
    exclude: bool,

    #[darling(default)]
    skip: bool,

    #[darling(default)]
    converter: Option<Path>,
}

///
/// FieldCardinality
///

#[derive(Clone, Copy)]
enum FieldCardinality<'a> {
    One,
    Opt,
    Many(&'a Type),
    OptMany(&'a Type),
}

fn classify_field(ty: &Type) -> FieldCardinality<'_> {
    if let Some(inner) = inner_type(ty, "Option") {
        return collection_item(inner).map_or(FieldCardinality::Opt, FieldCardinality::OptMany);
    }

    collection_item(ty).map_or(FieldCardinality::One, FieldCardinality::Many)
}

// Vec<u8> is a blob scalar, not a collection of bytes
fn collection_item(ty: &Type) -> Option<&Type> {
    inner_type(ty, "Vec").filter(|inner| !is_byte(inner))
}

// derive_entity
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let input: DeriveInput = match syn::parse2(input) {
        Ok(input) => input,
        Err(err) => return err.to_compile_error(),
    };

    let entity = match EntityInput::from_derive_input(&input) {
        Ok(entity) => entity,
        Err(err) => return err.write_errors(),
    };

    match expand(&entity) {
        Ok(tokens) => tokens,
        Err(err) => err.to_compile_error(),
    }
}

fn expand(entity: &EntityInput) -> Result<TokenStream, syn::Error> {
    let ident = &entity.ident;
    let (impl_generics, ty_generics, where_clause) = entity.generics.split_for_impl();

    let Data::Struct(fields) = &entity.data else {
        return Err(syn::Error::new_spanned(
            ident,
            "Entity can only be derived for structs with named fields",
        ));
    };

    let mut identity = entity.identity.clone();
    let mut declarations = Vec::new();

    for field in fields.iter().filter(|field| !field.skip) {
        let Some(field_ident) = field.ident.as_ref() else {
            return Err(syn::Error::new_spanned(&field.ty, "expected a named field"));
        };
        // r#type maps to the `type` column
        let name = field_ident.unraw().to_string();

        if field.identity && !identity.contains(&name) {
            identity.push(name.clone());
        }

        declarations.push(field_declaration(field_ident, &name, field)?);
    }

    let path = quote!(concat!(module_path!(), "::", stringify!(#ident)));
    let mut builder = quote!(::tabula::model::EntityDeclaration::new(#path));
    if let Some(prefix) = &entity.prefix {
        builder = quote!(#builder.prefix(#prefix));
    }
    if let Some(naming) = &entity.naming {
        let convention = naming_variant(ident, naming)?;
        builder = quote!(#builder.naming(::tabula::naming::NamingConvention::#convention));
    }
    if !identity.is_empty() {
        builder = quote!(#builder.identity(&[#(#identity),*]));
    }

    Ok(quote! {
        impl #impl_generics ::tabula::traits::Entity for #ident #ty_generics #where_clause {
            fn declaration() -> ::tabula::model::EntityDeclaration<Self> {
                #builder
                    #(.field(#declarations))*
            }
        }
    })
}

fn field_declaration(
    field_ident: &Ident,
    name: &str,
    field: &EntityField,
) -> Result<TokenStream, syn::Error> {
    let ty = &field.ty;

    let (value_type, getter, setter) = match classify_field(ty) {
        FieldCardinality::One => (
            quote!(Scalar(<#ty as ::tabula::traits::FieldValue>::KIND)),
            quote!(get),
            quote!(assign),
        ),
        FieldCardinality::Opt => (
            quote!(Nullable(<#ty as ::tabula::traits::FieldValue>::KIND)),
            quote!(get),
            quote!(assign),
        ),
        FieldCardinality::Many(inner) => (
            quote!(Enumerable(<#inner as ::tabula::traits::FieldValue>::KIND)),
            quote!(get_list),
            quote!(push),
        ),
        FieldCardinality::OptMany(inner) => (
            quote!(Enumerable(<#inner as ::tabula::traits::FieldValue>::KIND)),
            quote!(get_optional_list),
            quote!(push_optional),
        ),
    };

    let accessor = quote!(::tabula::model::accessor);
    let mut declaration = quote! {
        ::tabula::model::FieldDeclaration::new(
            #name,
            ::tabula::model::ValueType::#value_type,
            |entity: &Self| #accessor::#getter(&entity.#field_ident),
            |entity: &mut Self, value| #accessor::#setter(&mut entity.#field_ident, value),
        )
    };

    if let Some(column) = &field.name {
        if column.trim().is_empty() {
            return Err(syn::Error::new_spanned(field_ident, "column name cannot be empty"));
        }
        declaration = quote!(#declaration.column(#column));
    }
    if let Some(prefix) = &field.prefix {
        declaration = quote!(#declaration.prefix(#prefix));
    }
    if field.exclude {
        declaration = quote!(#declaration.exclude());
    }
    if let Some(converter) = &field.converter {
        declaration = quote!(#declaration.converter(#converter));
    }

    Ok(declaration)
}

const NAMING_CONVENTIONS: &str = "as_is, pascal, camel, snake, upper_snake";

fn naming_variant(ident: &Ident, naming: &str) -> Result<Ident, syn::Error> {
    let variant = match naming {
        "as_is" => "AsIs",
        "pascal" => "Pascal",
        "camel" => "Camel",
        "snake" => "Snake",
        "upper_snake" => "UpperSnake",
        other => {
            return Err(syn::Error::new_spanned(
                ident,
                format!("unknown naming convention '{other}'; expected {NAMING_CONVENTIONS}"),
            ));
        }
    };

    Ok(Ident::new(variant, ident.span()))
}
