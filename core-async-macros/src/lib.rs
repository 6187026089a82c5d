use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, Ident, ItemFn};

/// Runs an `async fn` test on a fresh current-thread runtime.
///
/// `#[core_async::test(start_paused)]` starts the runtime with a paused clock
/// so timer-driven code can be tested without real sleeps.
#[proc_macro_attribute]
pub fn test(attr: TokenStream, item: TokenStream) -> TokenStream {
    expand(attr, item, MacroKind::Test)
}

/// Runs an `async fn main` on a fresh current-thread runtime.
#[proc_macro_attribute]
pub fn main(attr: TokenStream, item: TokenStream) -> TokenStream {
    expand(attr, item, MacroKind::Main)
}

enum MacroKind {
    Test,
    Main,
}

#[derive(Clone, Copy)]
enum Clock {
    Real,
    Paused,
}

fn parse_clock(attr: TokenStream, kind: &MacroKind) -> Result<Clock, syn::Error> {
    if attr.is_empty() {
        return Ok(Clock::Real);
    }

    let tokens = TokenStream2::from(attr);
    let ident: Ident = syn::parse2(tokens.clone()).map_err(|_| {
        syn::Error::new_spanned(tokens.clone(), "expected `start_paused` or no arguments")
    })?;

    match (ident.to_string().as_str(), kind) {
        ("start_paused", MacroKind::Test) => Ok(Clock::Paused),
        ("start_paused", MacroKind::Main) => Err(syn::Error::new_spanned(
            ident,
            "`start_paused` is only supported on #[core_async::test]",
        )),
        _ => Err(syn::Error::new_spanned(
            ident,
            "unknown argument; expected `start_paused`",
        )),
    }
}

fn expand(attr: TokenStream, item: TokenStream, kind: MacroKind) -> TokenStream {
    let clock = match parse_clock(attr, &kind) {
        Ok(clock) => clock,
        Err(err) => return err.to_compile_error().into(),
    };

    let input = parse_macro_input!(item as ItemFn);

    if input.sig.asyncness.is_none() {
        return syn::Error::new_spanned(
            input.sig.fn_token,
            "core_async attribute macros require `async fn`",
        )
        .to_compile_error()
        .into();
    }

    let mut sync_sig = input.sig.clone();
    sync_sig.asyncness = None;

    let attrs = input.attrs;
    let vis = input.vis;
    let block = input.block;

    let runner = match clock {
        Clock::Real => quote!(core_async::runtime::block_on),
        Clock::Paused => quote!(core_async::runtime::block_on_paused),
    };

    let test_attr = match kind {
        MacroKind::Test => quote!(#[test]),
        MacroKind::Main => quote!(),
    };

    quote! {
        #(#attrs)*
        #test_attr
        #vis #sync_sig {
            #runner(async move #block)
        }
    }
    .into()
}
