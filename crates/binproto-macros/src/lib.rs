//! Procedural macros for BinProto

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, Data, DataStruct, DeriveInput, Fields};

/// Derive the host shape accessors of a struct with named fields
///
/// Generates `HostShape`, `Structure` and `FieldValue` implementations. The
/// struct must also implement `Clone`, `PartialEq` and `Default`, and every
/// field type must implement `FieldValue`. Wire layout is declared separately
/// through `SchemeDefinition`.
#[proc_macro_derive(Structure)]
pub fn derive_structure(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(&input) {
        Ok(tokens) => TokenStream::from(tokens),
        Err(err) => TokenStream::from(err.to_compile_error()),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let fields = match &input.data {
        Data::Struct(DataStruct {
            fields: Fields::Named(fields),
            ..
        }) => &fields.named,
        _ => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "Structure can only be derived on structs with named fields",
            ))
        }
    };

    let name = &input.ident;
    let shape_name = name.to_string();
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let idents: Vec<_> = fields.iter().filter_map(|f| f.ident.as_ref()).collect();
    let names: Vec<_> = idents
        .iter()
        .map(|ident| ident.to_string().trim_start_matches("r#").to_string())
        .collect();

    Ok(quote! {
        impl #impl_generics ::binproto::HostShape for #name #ty_generics #where_clause {
            const NAME: &'static str = #shape_name;
            const FIELDS: &'static [&'static str] = &[#(#names),*];
        }

        impl #impl_generics ::binproto::Structure for #name #ty_generics #where_clause {
            fn shape_name(&self) -> &str {
                <Self as ::binproto::HostShape>::NAME
            }

            fn field(&self, name: &str) -> ::core::option::Option<::binproto::Value> {
                match name {
                    #(#names => ::core::option::Option::Some(
                        ::binproto::FieldValue::to_value(&self.#idents)
                    ),)*
                    _ => ::core::option::Option::None,
                }
            }

            fn set_field(&mut self, name: &str, value: ::binproto::Value) -> ::binproto::Result<()> {
                match name {
                    #(#names => {
                        self.#idents = ::binproto::FieldValue::from_value(value)?;
                        ::core::result::Result::Ok(())
                    })*
                    _ => ::core::result::Result::Err(::binproto::Error::UnknownField {
                        shape: #shape_name.to_string(),
                        field: name.to_string(),
                    }),
                }
            }

            fn as_any(&self) -> &dyn ::core::any::Any {
                self
            }

            fn into_any(self: ::std::boxed::Box<Self>) -> ::std::boxed::Box<dyn ::core::any::Any> {
                self
            }

            fn clone_structure(&self) -> ::std::boxed::Box<dyn ::binproto::Structure> {
                ::std::boxed::Box::new(::core::clone::Clone::clone(self))
            }

            fn eq_structure(&self, other: &dyn ::binproto::Structure) -> bool {
                other
                    .as_any()
                    .downcast_ref::<Self>()
                    .map_or(false, |other| other == self)
            }
        }

        impl #impl_generics ::binproto::FieldValue for #name #ty_generics #where_clause {
            fn to_value(&self) -> ::binproto::Value {
                ::binproto::Value::Struct(::std::boxed::Box::new(::core::clone::Clone::clone(self)))
            }

            fn from_value(value: ::binproto::Value) -> ::binproto::Result<Self> {
                let actual = value.kind();
                match value {
                    ::binproto::Value::Struct(structure) => structure
                        .into_any()
                        .downcast::<Self>()
                        .map(|boxed| *boxed)
                        .map_err(|_| ::binproto::Error::FieldType {
                            expected: #shape_name,
                            actual,
                        }),
                    _ => ::core::result::Result::Err(::binproto::Error::FieldType {
                        expected: #shape_name,
                        actual,
                    }),
                }
            }
        }
    })
}
