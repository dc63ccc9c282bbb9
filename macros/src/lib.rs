use proc_macro::TokenStream;
use quote::quote;
use syn::{Ident, ItemFn, LitStr, parse_macro_input, spanned::Spanned};

const USAGE: &str = "rxengine_macro::test only accepts: #[rxengine_macro::test], \
                     #[rxengine_macro::test(local)], #[rxengine_macro::test(shared)], or string \
                     equivalents";

/// Test attribute used across the rxengine test suites.
///
/// Sync functions expand to a plain `#[test]`. Async functions expand to
/// `#[tokio::test]`; `local` selects the current-thread runtime (the default)
/// and `shared` selects the multi-thread runtime, so shared-context tests can
/// observe real cross-thread delivery.
#[proc_macro_attribute]
pub fn test(attr: TokenStream, item: TokenStream) -> TokenStream {
  let input = parse_macro_input!(item as ItemFn);

  let is_async = input.sig.asyncness.is_some();

  let raw_args = proc_macro2::TokenStream::from(attr);
  let tokio_args = if raw_args.is_empty() {
    proc_macro2::TokenStream::new()
  } else {
    if !is_async {
      return TokenStream::from(
        syn::Error::new(
          raw_args.span(),
          "rxengine_macro::test flavor args are only supported for async tests. Use \
           #[rxengine_macro::test] for sync tests, or make the function async.",
        )
        .to_compile_error(),
      );
    }

    let flavor = if let Ok(ident) = syn::parse2::<Ident>(raw_args.clone()) {
      (ident.to_string(), ident.span())
    } else if let Ok(lit) = syn::parse2::<LitStr>(raw_args.clone()) {
      (lit.value(), lit.span())
    } else {
      return TokenStream::from(syn::Error::new(raw_args.span(), USAGE).to_compile_error());
    };

    match flavor.0.as_str() {
      "local" => quote!(flavor = "current_thread"),
      "shared" => quote!(flavor = "multi_thread", worker_threads = 4),
      _ => return TokenStream::from(syn::Error::new(flavor.1, USAGE).to_compile_error()),
    }
  };

  let attr = if is_async { quote!(#[tokio::test(#tokio_args)]) } else { quote!(#[test]) };

  let expanded = quote! {
      #attr
      #input
  };

  TokenStream::from(expanded)
}
