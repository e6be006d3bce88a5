use proc_macro::TokenStream;
use proc_macro2::{Ident, Span, TokenStream as TokenStream2};
use proc_macro_crate::{FoundCrate, crate_name};
use quote::quote;
use syn::{Attribute, Data, DeriveInput, Fields, LitStr, parse_macro_input};

#[proc_macro_derive(FormField, attributes(form))]
pub fn derive_form_field(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    if !input.generics.params.is_empty() {
        return syn::Error::new_spanned(
            input.ident,
            "FormField derive currently supports only non-generic enums",
        )
        .to_compile_error()
        .into();
    }

    let field_ident = input.ident;
    let variants = match input.data {
        Data::Enum(data) => data.variants,
        _ => {
            return syn::Error::new_spanned(
                &field_ident,
                "FormField derive is only supported on enums",
            )
            .to_compile_error()
            .into();
        }
    };
    if variants.is_empty() {
        return syn::Error::new_spanned(
            &field_ident,
            "FormField derive requires at least one variant",
        )
        .to_compile_error()
        .into();
    }

    let formgroup = formgroup_path();
    let mut name_arms = Vec::new();
    let mut all_variants = Vec::new();

    for variant in variants {
        if !matches!(variant.fields, Fields::Unit) {
            return syn::Error::new_spanned(
                variant.ident,
                "FormField derive requires fieldless variants",
            )
            .to_compile_error()
            .into();
        }
        let variant_ident = variant.ident;
        let name = match rename_of(&variant.attrs) {
            Ok(Some(name)) => name,
            Ok(None) => to_snake_case(&variant_ident.to_string()),
            Err(error) => return error.to_compile_error().into(),
        };

        name_arms.push(quote! {
            Self::#variant_ident => #name,
        });
        all_variants.push(quote! {
            Self::#variant_ident
        });
    }

    quote! {
        impl #formgroup::form::FieldName for #field_ident {
            fn name(&self) -> &str {
                match self {
                    #(#name_arms)*
                }
            }
        }

        impl #formgroup::form::FormFields for #field_ident {
            fn all() -> &'static [Self] {
                &[#(#all_variants),*]
            }
        }
    }
    .into()
}

fn rename_of(attrs: &[Attribute]) -> syn::Result<Option<String>> {
    let mut rename = None;
    for attr in attrs.iter().filter(|attr| attr.path().is_ident("form")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                let value: LitStr = meta.value()?.parse()?;
                rename = Some(value.value());
                Ok(())
            } else {
                Err(meta.error("unsupported form attribute, expected `rename`"))
            }
        })?;
    }
    Ok(rename)
}

fn formgroup_path() -> TokenStream2 {
    match crate_name("formgroup") {
        Ok(FoundCrate::Name(name)) => {
            let ident = Ident::new(&name, Span::call_site());
            quote!(::#ident)
        }
        Ok(FoundCrate::Itself) => quote!(crate),
        Err(_) => quote!(::formgroup),
    }
}

fn to_snake_case(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::new();
    for (index, ch) in chars.iter().copied().enumerate() {
        if ch.is_ascii_uppercase() {
            let after_lower = index > 0 && chars[index - 1].is_ascii_lowercase();
            let before_lower =
                index > 0 && chars.get(index + 1).is_some_and(char::is_ascii_lowercase);
            if after_lower || before_lower {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::to_snake_case;

    #[test]
    fn snake_case_keeps_acronyms_together() {
        assert_eq!(to_snake_case("Email"), "email");
        assert_eq!(to_snake_case("PasswordConfirmation"), "password_confirmation");
        assert_eq!(to_snake_case("HTTPUrl"), "http_url");
        assert_eq!(to_snake_case("UserID"), "user_id");
        assert_eq!(to_snake_case("Line2Address"), "line2_address");
    }
}
