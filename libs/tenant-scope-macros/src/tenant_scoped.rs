use heck::ToUpperCamelCase;
use proc_macro_error2::abort;
use proc_macro2::{Span, TokenStream};
use quote::quote;
use syn::{Data, DeriveInput, spanned::Spanned};

/// Configuration parsed from `#[tenant_scope(...)]` attributes
#[derive(Default)]
struct TenantScopeConfig {
    locking_col: Option<(String, Span)>,
    no_locking: Option<Span>,
}

#[allow(clippy::needless_pass_by_value)] // DeriveInput is consumed by proc-macro pattern
pub fn expand_derive_tenant_scoped(input: DeriveInput) -> TokenStream {
    if !matches!(&input.data, Data::Struct(_)) {
        abort!(
            input.span(),
            "#[derive(TenantScoped)] can only be applied to structs"
        );
    }

    let config = parse_tenant_scope_attrs(&input);

    if config.locking_col.is_none() && config.no_locking.is_none() {
        abort!(
            input.span(),
            "tenant_scope: missing explicit decision for locking:\n  \
             use `locking_col = \"column_name\"` or `no_locking`"
        );
    }

    let entity_ident = syn::Ident::new("Entity", input.ident.span());

    let locking_body = match &config.locking_col {
        Some((col_name, span)) => {
            let col_ident = syn::Ident::new(&column_variant(col_name), *span);
            quote! { ::core::option::Option::Some(Self::Column::#col_ident) }
        }
        None => quote! { ::core::option::Option::None },
    };

    quote! {
        impl ::tenant_scope::TenantScopedEntity for #entity_ident {
            fn locking_column() -> ::core::option::Option<Self::Column> {
                #locking_body
            }
        }
    }
}

/// Parse all `#[tenant_scope(...)]` attributes with duplicate detection
fn parse_tenant_scope_attrs(input: &DeriveInput) -> TenantScopeConfig {
    let mut config = TenantScopeConfig::default();

    for attr in &input.attrs {
        if !attr.path().is_ident("tenant_scope") {
            continue;
        }

        let result = attr.parse_nested_meta(|meta| {
            let span = meta.path.span();

            if meta.path.is_ident("no_locking") {
                if config.no_locking.is_some() {
                    abort!(span, "duplicate attribute 'no_locking'");
                }
                if config.locking_col.is_some() {
                    abort!(
                        span,
                        "tenant_scope: specify either `locking_col` or `no_locking`, not both"
                    );
                }
                config.no_locking = Some(span);
                return Ok(());
            }

            if meta.path.is_ident("locking_col") {
                let value: String = match meta.value() {
                    Ok(v) => match v.parse::<syn::LitStr>() {
                        Ok(lit) => lit.value(),
                        Err(_) => abort!(span, "Expected string literal"),
                    },
                    Err(_) => abort!(span, "Expected '=' followed by a string value"),
                };
                if value.is_empty() {
                    abort!(span, "locking_col must name a column");
                }
                if config.locking_col.is_some() {
                    abort!(span, "duplicate attribute 'locking_col'");
                }
                if config.no_locking.is_some() {
                    abort!(
                        span,
                        "tenant_scope: specify either `locking_col` or `no_locking`, not both"
                    );
                }
                config.locking_col = Some((value, span));
                return Ok(());
            }

            let key = meta
                .path
                .get_ident()
                .map(ToString::to_string)
                .unwrap_or_default();
            abort!(
                span,
                "Unknown attribute '{}'. Valid attributes: locking_col, no_locking",
                key
            );
        });

        if let Err(err) = result {
            abort!(err.span(), "{}", err);
        }
    }

    config
}

/// `SeaORM` column enum variant for a `snake_case` column name
fn column_variant(column: &str) -> String {
    column.to_upper_camel_case()
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_column_variant() {
        assert_eq!(column_variant("lock_version"), "LockVersion");
        assert_eq!(column_variant("version"), "Version");
        assert_eq!(column_variant("row_lock_counter"), "RowLockCounter");
    }
}
